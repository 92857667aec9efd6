//! # pmosoap - Enveloppes SOAP 1.1 / 1.2
//!
//! Ce crate modélise l'enveloppe SOAP (header/body/fault) et décode un corps
//! XML en une seule passe, soit en contenu applicatif typé, soit en Fault
//! standardisé, sous la règle WS-I wrapped document/literal : au plus un
//! élément enfant dans le corps.
//!
//! ## Fonctionnalités
//!
//! - ✅ Décodage streaming d'enveloppes SOAP 1.1 et 1.2
//! - ✅ Dispatch Fault / contenu typé au premier évènement d'ouverture
//! - ✅ Détection des corps multi-éléments (violation de conformité WS-I)
//! - ✅ Construction d'enveloppes (contenu et faults)
//! - ✅ Diagnostics injectables, no-op par défaut
//!
//! ## Architecture
//!
//! - [`SoapEnvelope`] : Enveloppe SOAP complète (version, header, body)
//! - [`SoapDecoder`] : Décodeur streaming du corps
//! - [`SoapFault`] : Erreur SOAP décodée
//! - [`Diagnostics`] : Capacité de traçage optionnelle
//!
//! ## Example
//!
//! ```ignore
//! use pmosoap::decode_envelope_into;
//! use serde::Deserialize;
//!
//! #[derive(Debug, Default, Deserialize)]
//! struct GetPriceResponse {
//!     #[serde(rename = "Price")]
//!     price: f64,
//! }
//!
//! let xml = r#"<?xml version="1.0"?>
//! <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
//!   <s:Body>
//!     <GetPriceResponse><Price>34.5</Price></GetPriceResponse>
//!   </s:Body>
//! </s:Envelope>"#;
//!
//! let mut response = GetPriceResponse::default();
//! let envelope = decode_envelope_into(xml, &mut response).unwrap();
//! assert_eq!(response.price, 34.5);
//! assert_eq!(envelope.body.content_element(), Some("GetPriceResponse"));
//! ```

use std::fmt;

mod builder;
mod decoder;
mod diag;
mod envelope;
mod fault;

pub use builder::{build_envelope, build_envelope_with_header, build_fault_envelope};
pub use decoder::{ContentSink, SoapDecoder, SoapError, TypedSink, decode_envelope_into};
pub use diag::{Diagnostics, NoopDiagnostics, TracingDiagnostics, dump};
pub use envelope::{BodyPayload, SoapBody, SoapEnvelope, SoapHeader};
pub use fault::SoapFault;

/// Namespace d'enveloppe SOAP 1.1
pub const NAMESPACE_SOAP11: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Namespace d'enveloppe SOAP 1.2
pub const NAMESPACE_SOAP12: &str = "http://www.w3.org/2003/05/soap-envelope";

/// Content-Type HTTP associé à SOAP 1.1
pub const CONTENT_TYPE_SOAP11: &str = "text/xml; charset=\"utf-8\"";

/// Content-Type HTTP associé à SOAP 1.2
pub const CONTENT_TYPE_SOAP12: &str = "application/soap+xml; charset=\"utf-8\"";

/// Version du protocole SOAP, déterminée par le namespace de l'enveloppe.
///
/// Ces deux namespaces et les deux Content-Types associés constituent toute
/// la surface de négociation de version exposée à la couche transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoapVersion {
    Soap11,
    Soap12,
}

impl SoapVersion {
    /// Namespace de l'enveloppe pour cette version
    pub fn namespace(self) -> &'static str {
        match self {
            SoapVersion::Soap11 => NAMESPACE_SOAP11,
            SoapVersion::Soap12 => NAMESPACE_SOAP12,
        }
    }

    /// Content-Type HTTP pour cette version
    pub fn content_type(self) -> &'static str {
        match self {
            SoapVersion::Soap11 => CONTENT_TYPE_SOAP11,
            SoapVersion::Soap12 => CONTENT_TYPE_SOAP12,
        }
    }

    /// Numéro de version lisible ("1.1" ou "1.2")
    pub fn as_str(self) -> &'static str {
        match self {
            SoapVersion::Soap11 => "1.1",
            SoapVersion::Soap12 => "1.2",
        }
    }

    /// Retrouve la version depuis un namespace d'enveloppe
    pub fn from_namespace(namespace: &str) -> Option<Self> {
        match namespace {
            NAMESPACE_SOAP11 => Some(SoapVersion::Soap11),
            NAMESPACE_SOAP12 => Some(SoapVersion::Soap12),
            _ => None,
        }
    }
}

impl fmt::Display for SoapVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Codes de fault SOAP 1.1 standards
pub mod fault_codes {
    /// Version d'enveloppe non reconnue par le destinataire
    pub const VERSION_MISMATCH: &str = "VersionMismatch";

    /// En-tête mustUnderstand non compris
    pub const MUST_UNDERSTAND: &str = "MustUnderstand";

    /// Requête mal formée côté client
    pub const CLIENT: &str = "Client";

    /// Échec de traitement côté serveur
    pub const SERVER: &str = "Server";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_from_namespace() {
        assert_eq!(
            SoapVersion::from_namespace("http://schemas.xmlsoap.org/soap/envelope/"),
            Some(SoapVersion::Soap11)
        );
        assert_eq!(
            SoapVersion::from_namespace("http://www.w3.org/2003/05/soap-envelope"),
            Some(SoapVersion::Soap12)
        );
        assert_eq!(SoapVersion::from_namespace("http://example.com/ns"), None);
    }

    #[test]
    fn test_version_surface() {
        assert_eq!(SoapVersion::Soap11.as_str(), "1.1");
        assert_eq!(SoapVersion::Soap12.as_str(), "1.2");
        assert_eq!(
            SoapVersion::Soap11.content_type(),
            "text/xml; charset=\"utf-8\""
        );
        assert_eq!(
            SoapVersion::Soap12.content_type(),
            "application/soap+xml; charset=\"utf-8\""
        );
        assert_eq!(SoapVersion::Soap12.to_string(), "1.2");
    }
}
