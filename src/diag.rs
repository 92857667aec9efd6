//! Diagnostics injectables
//!
//! Capacité de traçage optionnelle, injectée dans le décodeur plutôt que
//! portée par un état global : traçage de messages libres d'un côté,
//! déversement structurel de valeurs décodées de l'autre. L'implémentation
//! par défaut ne fait rien, et un échec de déversement n'interrompt jamais
//! l'opération principale.

use serde::Serialize;
use tracing::debug;

/// Capacité de diagnostics
pub trait Diagnostics {
    /// Indique si les diagnostics sont actifs
    fn enabled(&self) -> bool {
        false
    }

    /// Trace un message libre
    fn trace(&self, _message: &str) {}

    /// Reçoit la représentation JSON indentée d'une valeur décodée
    fn dump_value(&self, _label: &str, _pretty: &str) {}
}

/// Implémentation par défaut : tout est no-op
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDiagnostics;

impl Diagnostics for NoopDiagnostics {}

/// Diagnostics relayés vers `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn enabled(&self) -> bool {
        true
    }

    fn trace(&self, message: &str) {
        debug!("{message}");
    }

    fn dump_value(&self, label: &str, pretty: &str) {
        debug!("{label}:\n{pretty}");
    }
}

/// Déverse la représentation structurelle d'une valeur.
///
/// Un échec de sérialisation est avalé et remplacé par une notice d'une
/// ligne.
pub fn dump<T: Serialize>(diag: &dyn Diagnostics, label: &str, value: &T) {
    if !diag.enabled() {
        return;
    }

    match serde_json::to_string_pretty(value) {
        Ok(pretty) => diag.dump_value(label, &pretty),
        Err(_) => diag.trace("could not dump value as JSON"),
    }
}
