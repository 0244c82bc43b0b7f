// ============================================================================
// Module : models
// ============================================================================
// Ce module contient toutes les structures de données de l'application
// ============================================================================

pub mod symbol; // Symbole saisi et normalisé
pub mod quote;  // Record fournisseur, cotation, vue formatée

// Re-export des structures principales pour simplifier les imports
// On peut faire : use stockinfo::models::Symbol;
pub use symbol::{normalize, Symbol};
pub use quote::{InfoRecord, QuoteData, QuoteView, Trend};
