// ============================================================================
// Module : api
// ============================================================================
// Appels réseau sortants :
// - probe : sonde de connectivité vers le site du fournisseur
// - yahoo : récupération des métadonnées d'un ticker (Yahoo Finance)
//
// Les deux sont exposés derrière un trait pour que le pipeline puisse être
// testé sans réseau.
// ============================================================================

pub mod probe;  // Sonde de connectivité
pub mod yahoo;  // Client API Yahoo Finance

#[cfg(test)]
pub(crate) mod testing;  // Serveur HTTP local pour les tests

use async_trait::async_trait;

use crate::models::{InfoRecord, Symbol};

// Re-export des types principaux
pub use probe::{ConnectivityResult, HttpProber};
pub use yahoo::{FetchError, YahooProvider};

/// Vérifie que le fournisseur est joignable
#[async_trait]
pub trait Prober: Send + Sync {
    /// Une panne réseau donne `Ok(Unreachable)` ; `Err` est réservé aux
    /// erreurs qui ne viennent pas du réseau (requête impossible à construire).
    async fn probe(&self) -> anyhow::Result<ConnectivityResult>;
}

/// Source des métadonnées d'un ticker
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// `Ok(None)` quand le fournisseur ne renvoie aucun record pour ce symbole
    async fn fetch_info(&self, symbol: &Symbol) -> Result<Option<InfoRecord>, FetchError>;
}
