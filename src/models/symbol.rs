// ============================================================================
// Structure : Symbol
// ============================================================================
// Symbole boursier saisi par l'utilisateur (ex: "AAPL", "BTC-USD")
//
// CONCEPTS RUST :
// 1. Newtype pattern : un String enveloppé dans un type dédié
//    - Le compilateur distingue un Symbol d'une String quelconque
//    - Un Symbol ne peut exister que normalisé et non vide
// 2. Option<T> pour la construction : None si la saisie est vide
// ============================================================================

use std::fmt;

/// Normalise une saisie brute : majuscules puis suppression des espaces
///
/// Idempotent : `normalize(&normalize(s)) == normalize(s)`
pub fn normalize(raw: &str) -> String {
    raw.to_uppercase().trim().to_string()
}

/// Symbole normalisé et non vide
///
/// Aucune autre validation : un symbole inconnu n'est détecté que par la
/// réponse du fournisseur.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol(String);

impl Symbol {
    /// Construit un Symbol depuis la saisie de l'utilisateur
    ///
    /// Retourne None si la saisie est vide après normalisation
    /// (dans ce cas, aucune recherche n'est lancée).
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = normalize(raw);
        if normalized.is_empty() {
            None
        } else {
            Some(Self(normalized))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
