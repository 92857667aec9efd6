//! Construction d'enveloppes SOAP
//!
//! L'encodage est un assemblage mécanique d'éléments : un squelette
//! `Envelope`/`Body` préfixé `s:`, dont le namespace est celui de la
//! version choisie, autour d'un unique élément de corps fourni par
//! l'appelant ou dérivé d'un [`SoapFault`].

use xmltree::{Element, EmitterConfig, XMLNode};

use crate::SoapVersion;
use crate::decoder::SoapError;
use crate::fault::SoapFault;

/// Construit une enveloppe SOAP autour d'un unique élément de corps
pub fn build_envelope(version: SoapVersion, body_child: Element) -> Result<String, SoapError> {
    build(version, None, body_child)
}

/// Construit une enveloppe avec en-tête
pub fn build_envelope_with_header(
    version: SoapVersion,
    header_child: Element,
    body_child: Element,
) -> Result<String, SoapError> {
    build(version, Some(header_child), body_child)
}

/// Construit une enveloppe portant un Fault.
///
/// Les champs vides du fault sont omis, symétriquement au décodage où un
/// sous-élément absent redevient une chaîne vide.
pub fn build_fault_envelope(version: SoapVersion, fault: &SoapFault) -> Result<String, SoapError> {
    build(version, None, fault_to_element(fault))
}

fn build(
    version: SoapVersion,
    header_child: Option<Element>,
    body_child: Element,
) -> Result<String, SoapError> {
    let mut envelope = Element::new("s:Envelope");
    envelope
        .attributes
        .insert("xmlns:s".to_string(), version.namespace().to_string());

    if let Some(child) = header_child {
        let mut header = Element::new("s:Header");
        header.children.push(XMLNode::Element(child));
        envelope.children.push(XMLNode::Element(header));
    }

    let mut body = Element::new("s:Body");
    body.children.push(XMLNode::Element(body_child));
    envelope.children.push(XMLNode::Element(body));

    let mut buf = Vec::new();
    let config = EmitterConfig::new()
        .write_document_declaration(true)
        .perform_indent(true)
        .indent_string("  ");
    envelope.write_with_config(&mut buf, config)?;

    Ok(String::from_utf8(buf).unwrap())
}

fn fault_to_element(fault: &SoapFault) -> Element {
    let mut elem = Element::new("s:Fault");

    if !fault.fault_code.is_empty() {
        elem.children
            .push(XMLNode::Element(text_child("faultcode", &fault.fault_code)));
    }
    if !fault.fault_string.is_empty() {
        elem.children.push(XMLNode::Element(text_child(
            "faultstring",
            &fault.fault_string,
        )));
    }
    if !fault.fault_actor.is_empty() {
        elem.children.push(XMLNode::Element(text_child(
            "faultactor",
            &fault.fault_actor,
        )));
    }
    if !fault.detail.is_empty() {
        elem.children
            .push(XMLNode::Element(text_child("detail", &fault.detail)));
    }

    elem
}

fn text_child(name: &str, value: &str) -> Element {
    let mut elem = Element::new(name);
    elem.children.push(XMLNode::Text(value.to_string()));
    elem
}
