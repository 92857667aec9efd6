//! Structures de l'enveloppe SOAP

use crate::SoapVersion;
use crate::fault::SoapFault;

/// Enveloppe SOAP complète
#[derive(Debug, Clone)]
pub struct SoapEnvelope {
    /// Version du protocole, fixée à la construction
    pub version: SoapVersion,

    /// En-tête SOAP optionnel
    pub header: Option<SoapHeader>,

    /// Corps SOAP contenant le fault ou le contenu
    pub body: SoapBody,
}

/// En-tête SOAP
///
/// Le contenu est opaque pour ce crate : il est transporté tel quel et son
/// interprétation revient à l'appelant.
#[derive(Debug, Clone)]
pub struct SoapHeader {
    /// Contenu XML brut de l'en-tête
    pub content: String,
}

/// Corps SOAP
#[derive(Debug, Clone, Default)]
pub struct SoapBody {
    /// Résultat du décodage : vide, fault ou contenu
    pub payload: BodyPayload,
}

/// Résultat du décodage du corps.
///
/// Les trois états sont mutuellement exclusifs ; un corps portant à la fois
/// un fault et du contenu n'est pas représentable.
#[derive(Debug, Clone, Default)]
pub enum BodyPayload {
    /// Corps sans élément enfant
    #[default]
    Empty,

    /// Le corps portait un Fault SOAP
    Fault(SoapFault),

    /// Le corps portait un élément de contenu, décodé dans la destination
    /// fournie par l'appelant
    Content {
        /// Nom local de l'élément de contenu décodé
        element: String,
    },
}

impl SoapEnvelope {
    /// Crée une nouvelle enveloppe SOAP
    pub fn new(version: SoapVersion, body: SoapBody) -> Self {
        Self {
            version,
            header: None,
            body,
        }
    }

    /// Crée une nouvelle enveloppe avec header
    pub fn with_header(version: SoapVersion, header: SoapHeader, body: SoapBody) -> Self {
        Self {
            version,
            header: Some(header),
            body,
        }
    }
}

impl SoapBody {
    /// Fault décodé, s'il y en a un
    pub fn fault(&self) -> Option<&SoapFault> {
        match &self.payload {
            BodyPayload::Fault(fault) => Some(fault),
            _ => None,
        }
    }

    /// Nom local de l'élément de contenu décodé, s'il y en a un
    pub fn content_element(&self) -> Option<&str> {
        match &self.payload {
            BodyPayload::Content { element } => Some(element.as_str()),
            _ => None,
        }
    }

    /// Vrai si le corps ne portait ni fault ni contenu
    pub fn is_empty(&self) -> bool {
        matches!(self.payload, BodyPayload::Empty)
    }
}
