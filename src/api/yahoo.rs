// ============================================================================
// API Client : Yahoo Finance
// ============================================================================
// Récupère les métadonnées d'un ticker depuis l'endpoint de cotation v7
//
// Yahoo exige un couple cookie + crumb :
// 1. GET fc.yahoo.com          -> cookie de session (Set-Cookie)
// 2. GET /v1/test/getcrumb     -> crumb lié au cookie
// 3. GET /v7/finance/quote     -> cotation (symbols=<SYM>&crumb=<crumb>)
//
// Le crumb est redemandé à chaque recherche : aucune donnée n'est conservée
// d'une soumission à l'autre.
// ============================================================================

use std::error::Error as StdError;

use async_trait::async_trait;
use reqwest::header;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use urlencoding::encode;

use crate::api::QuoteProvider;
use crate::config::Config;
use crate::models::{InfoRecord, Symbol};

// ============================================================================
// Erreurs du fournisseur
// ============================================================================

/// Échec d'un appel au fournisseur
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request to Yahoo Finance failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Yahoo Finance returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("Failed to decode Yahoo Finance response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Erreur non typée renvoyée dans le corps de la réponse
    #[error("Yahoo Finance error: {0}")]
    Provider(String),

    #[error("Yahoo Finance did not return a session cookie")]
    MissingCookie,
}

impl FetchError {
    /// Vrai si l'échec ressemble à un timeout ou à une connexion impossible
    ///
    /// Les catégories typées de reqwest priment ; la recherche de sous-chaînes
    /// n'est qu'un repli pour les erreurs non typées. Heuristique fragile.
    pub fn is_connection_failure(&self) -> bool {
        if let FetchError::Http(e) = self {
            if e.is_timeout() || e.is_connect() {
                return true;
            }
        }
        message_indicates_connection_failure(&self.full_message())
    }

    /// Message de l'erreur suivi de toutes ses causes
    fn full_message(&self) -> String {
        let mut message = self.to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}

/// Recherche insensible à la casse des signatures de timeout/connexion
pub fn message_indicates_connection_failure(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("failed to establish a new connection") || lower.contains("timed out")
}

// ============================================================================
// Structures pour parser la réponse JSON de Yahoo Finance
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteEnvelope {
    quote_response: QuoteResponse,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    result: Option<Vec<InfoRecord>>,
    error: Option<ProviderErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    code: Option<String>,
    description: Option<String>,
}

/// Décode le corps de la réponse v7 et extrait le premier record
fn parse_quote_response(body: &str) -> Result<Option<InfoRecord>, FetchError> {
    let envelope: QuoteEnvelope = serde_json::from_str(body)?;
    let response = envelope.quote_response;

    if let Some(err) = response.error {
        let message = err
            .description
            .or(err.code)
            .unwrap_or_else(|| "unknown error".to_string());
        return Err(FetchError::Provider(message));
    }

    Ok(response.result.unwrap_or_default().into_iter().next())
}

/// Extrait "nom=valeur" du premier en-tête Set-Cookie
fn extract_cookie(headers: &header::HeaderMap) -> Option<String> {
    headers
        .get(header::SET_COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(';').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Un crumb valide est un jeton court, jamais une page HTML ou un JSON d'erreur
fn validate_crumb(body: &str) -> Result<String, FetchError> {
    let crumb = body.trim();
    if crumb.is_empty() || crumb.contains('<') || crumb.contains('{') {
        return Err(FetchError::Provider("Invalid crumb".to_string()));
    }
    Ok(crumb.to_string())
}

// ============================================================================
// YahooProvider
// ============================================================================

/// Fournisseur Yahoo Finance
#[derive(Debug, Clone)]
pub struct YahooProvider {
    client: reqwest::Client,
    cookie_url: String,
    crumb_url: String,
    quote_url: String,
}

impl YahooProvider {
    /// Crée le client HTTP, borné par `fetch_timeout`
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.fetch_timeout)
            .build()?;

        Ok(Self {
            client,
            cookie_url: config.cookie_url.clone(),
            crumb_url: config.crumb_url.clone(),
            quote_url: config.quote_url.clone(),
        })
    }

    /// Étape 1 : cookie de session
    ///
    /// fc.yahoo.com répond souvent 404 mais pose quand même le cookie :
    /// le statut n'est pas vérifié.
    async fn fetch_cookie(&self) -> Result<String, FetchError> {
        let response = self.client.get(&self.cookie_url).send().await?;
        debug!(status = %response.status(), "Received cookie response");
        extract_cookie(response.headers()).ok_or(FetchError::MissingCookie)
    }

    /// Étape 2 : crumb associé au cookie
    async fn fetch_crumb(&self, cookie: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(&self.crumb_url)
            .header(header::COOKIE, cookie)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            error!(status = %status, "Crumb request rejected");
            return Err(FetchError::Status(status));
        }

        validate_crumb(&response.text().await?)
    }

    fn build_quote_url(&self, symbol: &Symbol, crumb: &str) -> String {
        format!(
            "{}?symbols={}&crumb={}",
            self.quote_url,
            encode(symbol.as_str()),
            encode(crumb)
        )
    }
}

#[async_trait]
impl QuoteProvider for YahooProvider {
    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn fetch_info(&self, symbol: &Symbol) -> Result<Option<InfoRecord>, FetchError> {
        let cookie = self.fetch_cookie().await?;
        let crumb = self.fetch_crumb(&cookie).await?;

        // L'URL porte le crumb de session : elle ne va pas dans les logs
        let url = self.build_quote_url(symbol, &crumb);
        debug!("Sending quote request to Yahoo Finance");

        let response = self
            .client
            .get(&url)
            .header(header::COOKIE, &cookie)
            .send()
            .await?;

        let status = response.status();
        debug!(status = %status, "Received quote response");

        let body = response.text().await?;
        if !status.is_success() {
            // Yahoo renvoie parfois une erreur exploitable avec un statut 4xx
            if let Err(FetchError::Provider(message)) = parse_quote_response(&body) {
                warn!(status = %status, message = %message, "Yahoo Finance rejected quote request");
                return Err(FetchError::Provider(message));
            }
            error!(status = %status, "Yahoo Finance returned error status");
            return Err(FetchError::Status(status));
        }

        let record = parse_quote_response(&body)?;
        info!(found = record.is_some(), "Fetched quote record");
        Ok(record)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
