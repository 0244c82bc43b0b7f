// ============================================================================
// Stock Info Fetcher - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests
// ============================================================================

pub mod api;       // Sonde de connectivité + API Yahoo Finance
pub mod config;    // Configuration appliquée une seule fois au démarrage
pub mod models;    // Structures de données
pub mod pipeline;  // Recherche et classification d'un symbole
pub mod app;       // État de l'application
pub mod ui;        // Interface utilisateur
