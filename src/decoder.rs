//! Décodeur streaming d'enveloppes SOAP
//!
//! Le cœur du crate : une passe avant unique sur les évènements XML du
//! corps, qui tranche entre Fault et contenu applicatif dès l'évènement
//! d'ouverture de chaque élément. Un corps portant plus d'un élément
//! enfant viole la règle WS-I wrapped document/literal et fait échouer le
//! décodage ; les erreurs de syntaxe XML du lecteur sous-jacent sont
//! propagées telles quelles.

use quick_xml::NsReader;
use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::SoapVersion;
use crate::diag::{Diagnostics, NoopDiagnostics, dump};
use crate::envelope::{BodyPayload, SoapBody, SoapEnvelope, SoapHeader};
use crate::fault::SoapFault;

/// Erreur de décodage ou de construction SOAP
#[derive(Debug, Error)]
pub enum SoapError {
    /// Erreur de syntaxe XML ou d'E/S, propagée telle quelle
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Erreur de désérialisation du contenu ou du fault
    #[error("XML deserialization error: {0}")]
    Deserialize(#[from] quick_xml::de::DeError),

    #[error("Missing SOAP Envelope")]
    MissingEnvelope,

    #[error("Unknown SOAP envelope namespace: {0}")]
    UnknownNamespace(String),

    #[error("Missing SOAP Body")]
    MissingBody,

    /// Violation de conformité : le corps porte plus d'un élément
    #[error("found multiple elements inside SOAP body; not wrapped-document/literal WS-I compliant")]
    MultipleBodyElements,

    /// Erreur de configuration : aucune destination de contenu fournie
    #[error("no content sink configured; cannot decode SOAP body content")]
    MissingContentSink,

    /// Échec d'émission XML côté construction
    #[error("XML build error: {0}")]
    Build(#[from] xmltree::Error),
}

/// Destination de contenu pré-allouée, remplie en place par le décodeur.
///
/// Le décodeur ne connaît pas le type concret du contenu attendu : il
/// transmet le fragment XML de l'unique élément du corps (balises
/// comprises) et laisse la destination se désérialiser elle-même.
pub trait ContentSink {
    /// Décode le fragment XML dans la destination
    fn decode_element(&mut self, fragment: &str) -> Result<(), SoapError>;
}

/// Adaptateur [`ContentSink`] pour toute structure `Deserialize`.
///
/// L'appelant garde la propriété de la destination : le décodeur la
/// remplit en place, il ne la remplace jamais.
pub struct TypedSink<'a, T>(pub &'a mut T);

impl<T: DeserializeOwned> ContentSink for TypedSink<'_, T> {
    fn decode_element(&mut self, fragment: &str) -> Result<(), SoapError> {
        *self.0 = quick_xml::de::from_str(fragment)?;
        Ok(())
    }
}

/// Décodeur d'enveloppe SOAP.
///
/// La destination de contenu doit être configurée avant le décodage si un
/// contenu applicatif est attendu ; rencontrer un élément non-Fault sans
/// destination est une erreur de configuration, distincte des violations
/// de conformité. Chaque décodage concurrent doit recevoir sa propre
/// destination : en partager une entre décodages simultanés relève de la
/// responsabilité de l'appelant.
pub struct SoapDecoder<'a> {
    sink: Option<&'a mut dyn ContentSink>,
    diag: &'a dyn Diagnostics,
}

impl Default for SoapDecoder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> SoapDecoder<'a> {
    pub fn new() -> Self {
        Self {
            sink: None,
            diag: &NoopDiagnostics,
        }
    }

    /// Configure la destination du contenu applicatif attendu
    pub fn with_content_sink(mut self, sink: &'a mut dyn ContentSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Injecte une capacité de diagnostics (no-op par défaut)
    pub fn with_diagnostics(mut self, diag: &'a dyn Diagnostics) -> Self {
        self.diag = diag;
        self
    }

    /// Décode une enveloppe SOAP complète depuis un document XML.
    ///
    /// Le namespace de l'élément racine `Envelope` sélectionne la version
    /// du protocole. Le corps est ensuite résolu en exactement un de
    /// {vide, fault, contenu}.
    pub fn decode(mut self, xml: &str) -> Result<SoapEnvelope, SoapError> {
        let mut reader = NsReader::from_str(xml);
        reader.config_mut().trim_text(true);

        // Élément racine : Envelope, dont le namespace donne la version
        let version = loop {
            match reader.read_resolved_event()? {
                (ns, Event::Start(e)) => {
                    if e.local_name().as_ref() != b"Envelope" {
                        return Err(SoapError::MissingEnvelope);
                    }
                    break resolve_version(ns)?;
                }
                (ns, Event::Empty(e)) => {
                    if e.local_name().as_ref() != b"Envelope" {
                        return Err(SoapError::MissingEnvelope);
                    }
                    resolve_version(ns)?;
                    return Err(SoapError::MissingBody);
                }
                (_, Event::Eof) => return Err(SoapError::MissingEnvelope),
                _ => {}
            }
        };

        let mut header: Option<SoapHeader> = None;
        let mut body: Option<SoapBody> = None;

        loop {
            match reader.read_resolved_event()? {
                (ns, Event::Start(e)) => {
                    let in_envelope_ns = lenient_envelope_ns(&ns, version);
                    match e.local_name().as_ref() {
                        b"Header" if in_envelope_ns => {
                            let span = reader.read_to_end(e.name())?;
                            let content = xml[span.start as usize..span.end as usize].to_string();
                            header = Some(SoapHeader { content });
                        }
                        b"Body" if in_envelope_ns => {
                            body = Some(self.decode_body(&mut reader, xml, version)?);
                        }
                        _ => {
                            reader.read_to_end(e.name())?;
                        }
                    }
                }
                (ns, Event::Empty(e)) => {
                    let in_envelope_ns = lenient_envelope_ns(&ns, version);
                    match e.local_name().as_ref() {
                        b"Header" if in_envelope_ns => {
                            header = Some(SoapHeader {
                                content: String::new(),
                            });
                        }
                        b"Body" if in_envelope_ns => {
                            body = Some(SoapBody::default());
                        }
                        _ => {}
                    }
                }
                (_, Event::End(_)) | (_, Event::Eof) => break,
                _ => {}
            }
        }

        let body = body.ok_or(SoapError::MissingBody)?;
        if self.diag.enabled() {
            self.diag
                .trace(&format!("SOAP envelope decoded: version={version}"));
        }

        Ok(SoapEnvelope {
            version,
            header,
            body,
        })
    }

    /// Passe avant unique sur les enfants du Body.
    ///
    /// Le dispatch se fait sur l'évènement d'ouverture, sans lookahead ni
    /// retour arrière : un élément `Fault` qualifié du namespace de
    /// l'enveloppe devient un [`SoapFault`], tout autre élément est confié
    /// à la destination de contenu. Un flux qui se termine sans balise
    /// fermante est traité comme structurellement complet.
    fn decode_body(
        &mut self,
        reader: &mut NsReader<&[u8]>,
        input: &str,
        version: SoapVersion,
    ) -> Result<SoapBody, SoapError> {
        let mut consumed = false;
        let mut payload = BodyPayload::Empty;

        loop {
            let chunk_start = reader.buffer_position() as usize;
            match reader.read_resolved_event()? {
                (ns, Event::Start(e)) => {
                    if consumed {
                        return Err(SoapError::MultipleBodyElements);
                    }
                    let local = e.local_name().as_ref().to_vec();
                    let is_fault = envelope_fault(&ns, &local, version);

                    reader.read_to_end(e.name())?;
                    let fragment = &input[chunk_start..reader.buffer_position() as usize];
                    payload = self.dispatch(is_fault, &local, fragment)?;
                    consumed = true;
                }
                (ns, Event::Empty(e)) => {
                    if consumed {
                        return Err(SoapError::MultipleBodyElements);
                    }
                    let local = e.local_name().as_ref().to_vec();
                    let is_fault = envelope_fault(&ns, &local, version);

                    let fragment = &input[chunk_start..reader.buffer_position() as usize];
                    payload = self.dispatch(is_fault, &local, fragment)?;
                    consumed = true;
                }
                (_, Event::End(_)) | (_, Event::Eof) => break,
                _ => {}
            }
        }

        Ok(SoapBody { payload })
    }

    fn dispatch(
        &mut self,
        is_fault: bool,
        local: &[u8],
        fragment: &str,
    ) -> Result<BodyPayload, SoapError> {
        let fragment = fragment.trim_start();

        if is_fault {
            // La destination de contenu éventuelle est laissée intacte
            let fault: SoapFault = quick_xml::de::from_str(fragment)?;
            dump(self.diag, "soap.fault", &fault);
            return Ok(BodyPayload::Fault(fault));
        }

        let element = String::from_utf8_lossy(local).into_owned();
        let sink = self
            .sink
            .as_deref_mut()
            .ok_or(SoapError::MissingContentSink)?;
        sink.decode_element(fragment)?;
        if self.diag.enabled() {
            self.diag
                .trace(&format!("SOAP body content element: {element}"));
        }

        Ok(BodyPayload::Content { element })
    }
}

/// Décode une enveloppe SOAP dont le contenu attendu est `T`.
///
/// Raccourci pour le cas courant : `content` est une instance vide
/// pré-allouée par l'appelant, remplie en place si le corps porte du
/// contenu. Si le corps porte un Fault, `content` reste intact.
pub fn decode_envelope_into<T: DeserializeOwned>(
    xml: &str,
    content: &mut T,
) -> Result<SoapEnvelope, SoapError> {
    let mut sink = TypedSink(content);
    SoapDecoder::new().with_content_sink(&mut sink).decode(xml)
}

fn resolve_version(ns: ResolveResult<'_>) -> Result<SoapVersion, SoapError> {
    match ns {
        ResolveResult::Bound(ns) => {
            let uri = String::from_utf8_lossy(ns.as_ref());
            SoapVersion::from_namespace(&uri)
                .ok_or_else(|| SoapError::UnknownNamespace(uri.into_owned()))
        }
        _ => Err(SoapError::UnknownNamespace("(none)".to_string())),
    }
}

/// Header et Body sont acceptés dans le namespace de l'enveloppe ou sans
/// namespace (pairs laxistes) ; seul un namespace étranger les disqualifie.
fn lenient_envelope_ns(ns: &ResolveResult<'_>, version: SoapVersion) -> bool {
    match ns {
        ResolveResult::Bound(bound) => bound.as_ref() == version.namespace().as_bytes(),
        _ => true,
    }
}

/// Le dispatch Fault, lui, exige le namespace de l'enveloppe : un `<Fault>`
/// non qualifié est un élément de contenu ordinaire.
fn envelope_fault(ns: &ResolveResult<'_>, local: &[u8], version: SoapVersion) -> bool {
    local == b"Fault"
        && matches!(ns, ResolveResult::Bound(bound) if bound.as_ref() == version.namespace().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Deserialize)]
    struct GetPriceResponse {
        #[serde(rename = "Price")]
        price: f64,
    }

    /// Destination qui accepte n'importe quel fragment, pour les tests de
    /// structure du corps
    #[derive(Default)]
    struct RawSink(Vec<String>);

    impl ContentSink for RawSink {
        fn decode_element(&mut self, fragment: &str) -> Result<(), SoapError> {
            self.0.push(fragment.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_decode_content() {
        let xml = r#"<?xml version="1.0"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body>
    <GetPriceResponse>
      <Price>34.5</Price>
    </GetPriceResponse>
  </s:Body>
</s:Envelope>"#;

        let mut response = GetPriceResponse::default();
        let envelope = decode_envelope_into(xml, &mut response).unwrap();

        assert_eq!(envelope.version, SoapVersion::Soap11);
        assert_eq!(response.price, 34.5);
        assert_eq!(envelope.body.content_element(), Some("GetPriceResponse"));
        assert!(envelope.body.fault().is_none());
    }

    #[test]
    fn test_decode_fault_leaves_content_untouched() {
        let xml = r#"<?xml version="1.0"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body>
    <s:Fault>
      <faultcode>Client</faultcode>
      <faultstring>Bad request</faultstring>
    </s:Fault>
  </s:Body>
</s:Envelope>"#;

        let mut response = GetPriceResponse::default();
        let envelope = decode_envelope_into(xml, &mut response).unwrap();

        let fault = envelope.body.fault().unwrap();
        assert_eq!(fault.fault_code, "Client");
        assert_eq!(fault.fault_string, "Bad request");
        assert_eq!(fault.fault_actor, "");
        assert_eq!(fault.detail, "");

        // La destination n'a pas été touchée
        assert_eq!(response, GetPriceResponse::default());
        assert!(envelope.body.content_element().is_none());
    }

    #[test]
    fn test_decode_fault_without_sink() {
        let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body><s:Fault><faultcode>Server</faultcode></s:Fault></s:Body>
</s:Envelope>"#;

        let envelope = SoapDecoder::new().decode(xml).unwrap();
        assert_eq!(envelope.body.fault().unwrap().fault_code, "Server");
    }

    #[test]
    fn test_multiple_elements_rejected() {
        let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body><A/><B/></s:Body>
</s:Envelope>"#;

        let mut sink = RawSink::default();
        let err = SoapDecoder::new()
            .with_content_sink(&mut sink)
            .decode(xml)
            .unwrap_err();

        assert!(matches!(err, SoapError::MultipleBodyElements));
        assert!(err.to_string().contains("multiple elements"));
    }

    #[test]
    fn test_fault_then_content_rejected() {
        let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body><s:Fault/><GetPriceResponse/></s:Body>
</s:Envelope>"#;

        let mut sink = RawSink::default();
        let err = SoapDecoder::new()
            .with_content_sink(&mut sink)
            .decode(xml)
            .unwrap_err();

        assert!(matches!(err, SoapError::MultipleBodyElements));
        // Le fault a été consommé avant le second élément : la destination
        // n'a jamais été sollicitée
        assert!(sink.0.is_empty());
    }

    #[test]
    fn test_two_faults_rejected() {
        let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body><s:Fault/><s:Fault/></s:Body>
</s:Envelope>"#;

        let err = SoapDecoder::new().decode(xml).unwrap_err();
        assert!(matches!(err, SoapError::MultipleBodyElements));
    }

    #[test]
    fn test_nested_same_name_is_single_element() {
        // L'élément de contenu contient un enfant du même nom : le
        // sous-arbre reste un seul enfant du Body
        let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body><List><Item/><List>inner</List></List></s:Body>
</s:Envelope>"#;

        let mut sink = RawSink::default();
        let envelope = SoapDecoder::new()
            .with_content_sink(&mut sink)
            .decode(xml)
            .unwrap();

        assert_eq!(envelope.body.content_element(), Some("List"));
        assert_eq!(sink.0.len(), 1);
        assert!(sink.0[0].contains("<List>inner</List>"));
    }

    #[test]
    fn test_comment_before_content() {
        let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body><!-- réponse --><GetPriceResponse><Price>34.5</Price></GetPriceResponse></s:Body>
</s:Envelope>"#;

        let mut response = GetPriceResponse::default();
        let envelope = decode_envelope_into(xml, &mut response).unwrap();

        assert_eq!(response.price, 34.5);
        assert_eq!(envelope.body.content_element(), Some("GetPriceResponse"));
    }

    #[test]
    fn test_default_namespace_fault() {
        // Fault qualifié par le namespace par défaut, sans préfixe
        let xml = r#"<Envelope xmlns="http://schemas.xmlsoap.org/soap/envelope/">
  <Body><Fault><faultcode>Client</faultcode></Fault></Body>
</Envelope>"#;

        let envelope = SoapDecoder::new().decode(xml).unwrap();
        assert_eq!(envelope.body.fault().unwrap().fault_code, "Client");
    }

    #[test]
    fn test_empty_body() {
        let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body></s:Body>
</s:Envelope>"#;

        let envelope = SoapDecoder::new().decode(xml).unwrap();
        assert!(envelope.body.is_empty());

        let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body/></s:Envelope>"#;
        let envelope = SoapDecoder::new().decode(xml).unwrap();
        assert!(envelope.body.is_empty());
    }

    #[test]
    fn test_content_without_sink_is_configuration_error() {
        let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body><GetPriceResponse><Price>34.5</Price></GetPriceResponse></s:Body>
</s:Envelope>"#;

        let err = SoapDecoder::new().decode(xml).unwrap_err();
        assert!(matches!(err, SoapError::MissingContentSink));
    }

    #[test]
    fn test_unqualified_fault_is_content() {
        let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body><Fault><faultcode>Client</faultcode></Fault></s:Body>
</s:Envelope>"#;

        let mut sink = RawSink::default();
        let envelope = SoapDecoder::new()
            .with_content_sink(&mut sink)
            .decode(xml)
            .unwrap();

        assert!(envelope.body.fault().is_none());
        assert_eq!(envelope.body.content_element(), Some("Fault"));
        assert_eq!(sink.0.len(), 1);
    }

    #[test]
    fn test_soap12_namespace() {
        let xml = r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope">
  <env:Body/>
</env:Envelope>"#;

        let envelope = SoapDecoder::new().decode(xml).unwrap();
        assert_eq!(envelope.version, SoapVersion::Soap12);
        assert!(envelope.body.is_empty());
    }

    #[test]
    fn test_unknown_namespace() {
        let xml = r#"<s:Envelope xmlns:s="http://example.com/not-soap"><s:Body/></s:Envelope>"#;

        let err = SoapDecoder::new().decode(xml).unwrap_err();
        match err {
            SoapError::UnknownNamespace(ns) => assert_eq!(ns, "http://example.com/not-soap"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_envelope() {
        let xml = r#"<NotAnEnvelope xmlns="http://schemas.xmlsoap.org/soap/envelope/"/>"#;
        let err = SoapDecoder::new().decode(xml).unwrap_err();
        assert!(matches!(err, SoapError::MissingEnvelope));
    }

    #[test]
    fn test_missing_body() {
        let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Header><Token>abc</Token></s:Header>
</s:Envelope>"#;

        let err = SoapDecoder::new().decode(xml).unwrap_err();
        assert!(matches!(err, SoapError::MissingBody));
    }

    #[test]
    fn test_header_captured_opaque() {
        let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Header><Token>abc</Token></s:Header>
  <s:Body/>
</s:Envelope>"#;

        let envelope = SoapDecoder::new().decode(xml).unwrap();
        let header = envelope.header.unwrap();
        assert!(header.content.contains("<Token>abc</Token>"));
    }

    #[test]
    fn test_malformed_xml_propagates() {
        // Balise fermante incohérente : erreur du lecteur, pas de conformité
        let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body><GetPriceResponse></s:Body>
</s:Envelope>"#;

        let mut sink = RawSink::default();
        let err = SoapDecoder::new()
            .with_content_sink(&mut sink)
            .decode(xml)
            .unwrap_err();

        assert!(matches!(err, SoapError::Xml(_)));
    }

    #[test]
    fn test_content_deserialization_error_propagates() {
        let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body><GetPriceResponse><Price>not-a-number</Price></GetPriceResponse></s:Body>
</s:Envelope>"#;

        let mut response = GetPriceResponse::default();
        let err = decode_envelope_into(xml, &mut response).unwrap_err();
        assert!(matches!(err, SoapError::Deserialize(_)));
    }
}
