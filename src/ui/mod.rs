// ============================================================================
// Module : ui
// ============================================================================
// Gère toute l'interface utilisateur (Terminal User Interface)
// ============================================================================

pub mod events; // Gestion des événements clavier
pub mod page;   // Rendu de la page (titre, saisie, résultat)

// Re-exports pour simplifier les imports
pub use events::{Event, EventHandler};
pub use page::render;
