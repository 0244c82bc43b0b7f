// ============================================================================
// Sonde de connectivité
// ============================================================================
// Envoie un GET borné dans le temps vers le site du fournisseur et mesure
// la durée de la requête.
//
// CONCEPTS RUST :
// 1. std::time::Instant : horloge monotone pour mesurer une durée
// 2. Match guards : Err(e) if e.is_builder() => ...
// ============================================================================

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use crate::api::Prober;
use crate::config::{Config, BROWSER_USER_AGENT};

/// Résultat de la sonde
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityResult {
    /// Le site a répondu ; durée de la requête
    Reachable(Duration),

    /// Panne réseau (DNS, connexion refusée, timeout...) ; la cause n'est pas distinguée
    Unreachable,
}

/// Sonde une URL avec un timeout
///
/// Le statut HTTP n'est pas inspecté : toute réponse signifie "joignable".
/// Pas de retry.
///
/// # Exemple
/// let result = probe("https://finance.yahoo.com", Duration::from_secs(5)).await?;
pub async fn probe(url: &str, timeout: Duration) -> Result<ConnectivityResult> {
    HttpProber::build(url, BROWSER_USER_AGENT, timeout)?.probe().await
}

// ============================================================================
// HttpProber : sonde configurée
// ============================================================================

/// Sonde réelle, construite une fois depuis la configuration
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
    url: String,
}

impl HttpProber {
    pub fn new(config: &Config) -> Result<Self> {
        Self::build(&config.probe_url, &config.user_agent, config.probe_timeout)
    }

    fn build(url: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("Failed to build probe HTTP client")?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl Prober for HttpProber {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn probe(&self) -> Result<ConnectivityResult> {
        let start = Instant::now();

        match self.client.get(&self.url).send().await {
            Ok(response) => {
                let elapsed = start.elapsed();
                debug!(status = %response.status(), elapsed_ms = elapsed.as_millis() as u64, "Probe answered");
                Ok(ConnectivityResult::Reachable(elapsed))
            }
            // URL invalide : ce n'est pas une panne réseau
            Err(e) if e.is_builder() => {
                Err(anyhow::Error::new(e).context(format!("Invalid probe request for {}", self.url)))
            }
            Err(e) => {
                warn!(error = %e, timeout = e.is_timeout(), connect = e.is_connect(), "Probe failed");
                Ok(ConnectivityResult::Unreachable)
            }
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
