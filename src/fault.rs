//! SOAP Faults

use std::fmt;

use serde::{Deserialize, Serialize};

/// Erreur SOAP (Fault)
///
/// Tous les champs sont optionnels sur le fil, indépendamment les uns des
/// autres ; un sous-élément absent correspond à une chaîne vide. Une fois
/// décodé, un fault n'est plus modifié.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoapFault {
    /// Code d'erreur (ex: "Client", "Server")
    #[serde(rename = "faultcode", default, skip_serializing_if = "String::is_empty")]
    pub fault_code: String,

    /// Description lisible de l'erreur
    #[serde(
        rename = "faultstring",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub fault_string: String,

    /// Acteur à l'origine du fault
    #[serde(
        rename = "faultactor",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub fault_actor: String,

    /// Détail libre
    #[serde(rename = "detail", default, skip_serializing_if = "String::is_empty")]
    pub detail: String,
}

impl SoapFault {
    /// Crée un fault SOAP simple
    pub fn new(fault_code: impl Into<String>, fault_string: impl Into<String>) -> Self {
        Self {
            fault_code: fault_code.into(),
            fault_string: fault_string.into(),
            ..Self::default()
        }
    }

    /// Crée un fault SOAP complet, avec acteur et détail
    pub fn with_detail(
        fault_code: impl Into<String>,
        fault_string: impl Into<String>,
        fault_actor: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            fault_code: fault_code.into(),
            fault_string: fault_string.into(),
            fault_actor: fault_actor.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for SoapFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fault_string)
    }
}

impl std::error::Error for SoapFault {}
