// ============================================================================
// Configuration
// ============================================================================
// Paramètres du pipeline de recherche, construits une seule fois dans main()
// puis passés aux composants. Aucun état global mutable.
// ============================================================================

use std::time::Duration;

use chrono_tz::Tz;

/// User-Agent navigateur pour éviter le blocage par Yahoo
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Configuration du processus
#[derive(Debug, Clone)]
pub struct Config {
    /// Endpoint visé par la sonde de connectivité
    pub probe_url: String,

    /// Durée maximale de la sonde
    pub probe_timeout: Duration,

    /// Au-delà de ce délai, la connexion est considérée comme lente
    pub slow_threshold: Duration,

    /// Borne de chaque appel au fournisseur de données
    pub fetch_timeout: Duration,

    /// Endpoint qui délivre le cookie de session Yahoo
    pub cookie_url: String,

    /// Endpoint qui délivre le crumb associé au cookie
    pub crumb_url: String,

    /// Endpoint des cotations (v7)
    pub quote_url: String,

    pub user_agent: String,

    /// Fuseau horaire de l'horodatage affiché
    pub timezone: Tz,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            probe_url: "https://finance.yahoo.com".to_string(),
            probe_timeout: Duration::from_secs(5),
            slow_threshold: Duration::from_secs(2),
            fetch_timeout: Duration::from_secs(10),
            cookie_url: "https://fc.yahoo.com".to_string(),
            crumb_url: "https://query1.finance.yahoo.com/v1/test/getcrumb".to_string(),
            quote_url: "https://query1.finance.yahoo.com/v7/finance/quote".to_string(),
            user_agent: BROWSER_USER_AGENT.to_string(),
            timezone: chrono_tz::US::Pacific,
        }
    }
}

impl Config {
    /// Vérifie si une latence de sonde déclenche l'avertissement "connexion lente"
    ///
    /// Strictement supérieur : une sonde de 2.0s pile n'est pas lente.
    pub fn is_slow(&self, latency: Duration) -> bool {
        latency > self.slow_threshold
    }
}
