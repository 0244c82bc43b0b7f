// ============================================================================
// Pipeline de recherche
// ============================================================================
// Transforme une saisie brute en une cotation affichable OU en une erreur
// précise destinée à l'utilisateur.
//
//   saisie -> Symbol -> sonde -> (avertissement lenteur) -> fournisseur -> résultat
//
// Règles :
// - saisie vide : aucun appel réseau, aucun résultat
// - sonde en échec : le fournisseur n'est jamais appelé
// - sonde lente (> 2s) : avertissement, mais la recherche continue
// - toute erreur est convertie en exactement un message ; rien ne remonte
// ============================================================================

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::api::{ConnectivityResult, FetchError, HttpProber, Prober, QuoteProvider, YahooProvider};
use crate::config::Config;
use crate::models::{InfoRecord, QuoteData, Symbol};

// ============================================================================
// Taxonomie des erreurs
// ============================================================================
// CONCEPT RUST : thiserror
// - #[error("...")] génère l'implémentation de Display
// - Le message affiché à l'utilisateur EST le Display de la variante
// ============================================================================

/// Erreur présentée à l'utilisateur pour une recherche
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// La sonde a échoué : aucune recherche tentée
    #[error("❌ Unable to connect to Yahoo Finance. Please check your internet connection and try again.")]
    NetworkUnreachable,

    /// L'appel au fournisseur a échoué sur un timeout / une connexion impossible
    #[error("❌ Connection timeout during data retrieval. Your internet may be slow/unstable.")]
    FetchTimeout,

    /// L'appel au fournisseur a échoué pour une autre raison (détail non affiché)
    #[error("⚠️ An error occurred while fetching data for '{symbol}'. Please try again.")]
    FetchFailed { symbol: String },

    /// Aucun record : symbole probablement invalide
    #[error("⚠️ Error: No data returned for '{symbol}'. It might be an invalid symbol.")]
    EmptyResult { symbol: String },

    /// Record sans nom ou sans prix
    #[error("⚠️ Error: Incomplete data received for '{symbol}' (missing name or price).")]
    IncompleteResult { symbol: String },

    /// Toute autre panne, avec le texte brut de l'erreur
    #[error("⚠️ An unexpected system error occurred: {0}")]
    Unexpected(String),
}

impl LookupError {
    /// Erreurs liées à la connexion : jamais écrasées par une erreur générique
    pub fn is_connection_related(&self) -> bool {
        matches!(self, LookupError::NetworkUnreachable | LookupError::FetchTimeout)
    }
}

/// Avertissement non bloquant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advisory {
    /// Sonde plus lente que le seuil ; durée mesurée
    SlowConnection(Duration),
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::SlowConnection(_) => f.write_str(
                "⚠️ Your internet connection seems slow. Data retrieval may take longer than usual.",
            ),
        }
    }
}

/// Résultat d'une recherche : une cotation OU une erreur
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Quote(QuoteData),
    Error(LookupError),
}

impl LookupOutcome {
    pub fn is_quote(&self) -> bool {
        matches!(self, LookupOutcome::Quote(_))
    }

    pub fn error(&self) -> Option<&LookupError> {
        match self {
            LookupOutcome::Error(e) => Some(e),
            LookupOutcome::Quote(_) => None,
        }
    }
}

/// Tout ce qu'une soumission produit pour la couche d'affichage
#[derive(Debug, Clone, PartialEq)]
pub struct LookupReport {
    pub symbol: Symbol,
    pub advisory: Option<Advisory>,
    pub outcome: LookupOutcome,
}

// ============================================================================
// Classification
// ============================================================================

/// Classe l'échec d'un appel au fournisseur
pub fn classify_fetch_error(err: &FetchError, symbol: &Symbol) -> LookupError {
    if err.is_connection_failure() {
        LookupError::FetchTimeout
    } else {
        LookupError::FetchFailed {
            symbol: symbol.to_string(),
        }
    }
}

/// Classe un record renvoyé par le fournisseur
///
/// Ordre : vide -> incomplet -> cotation.
pub fn classify_record(record: Option<InfoRecord>, symbol: &Symbol) -> LookupOutcome {
    match record {
        Some(record) if record.is_empty() => LookupOutcome::Error(LookupError::EmptyResult {
            symbol: symbol.to_string(),
        }),
        None => LookupOutcome::Error(LookupError::EmptyResult {
            symbol: symbol.to_string(),
        }),
        Some(record) if !record.is_complete() => {
            LookupOutcome::Error(LookupError::IncompleteResult {
                symbol: symbol.to_string(),
            })
        }
        Some(record) => LookupOutcome::Quote(QuoteData::from_record(&record)),
    }
}

/// Conclut une recherche interrompue par une erreur non classée
///
/// Un message lié à la connexion déjà établi est conservé ; sinon l'erreur
/// devient `Unexpected` avec son texte brut.
pub fn settle(current: Option<LookupOutcome>, err: &anyhow::Error) -> LookupOutcome {
    match current {
        Some(LookupOutcome::Error(e)) if e.is_connection_related() => LookupOutcome::Error(e),
        _ => LookupOutcome::Error(LookupError::Unexpected(format!("{:#}", err))),
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Sonde + fournisseur, composés séquentiellement
pub struct Pipeline<P, Q> {
    prober: P,
    provider: Q,
    config: Config,
}

/// Pipeline réel (réseau)
pub type YahooPipeline = Pipeline<HttpProber, YahooProvider>;

impl YahooPipeline {
    /// Construit la sonde et le client Yahoo depuis la configuration
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let prober = HttpProber::new(&config)?;
        let provider = YahooProvider::new(&config)?;
        Ok(Pipeline::new(prober, provider, config))
    }
}

impl<P: Prober, Q: QuoteProvider> Pipeline<P, Q> {
    pub fn new(prober: P, provider: Q, config: Config) -> Self {
        Self {
            prober,
            provider,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Point d'entrée : une saisie brute
    ///
    /// Retourne None (sans aucun appel réseau) si la saisie est vide.
    pub async fn submit(&self, raw: &str) -> Option<LookupReport> {
        match Symbol::parse(raw) {
            Some(symbol) => Some(self.lookup(symbol).await),
            None => {
                debug!("Empty symbol, skipping lookup");
                None
            }
        }
    }

    /// Recherche complète pour un symbole : produit toujours exactement un résultat
    #[instrument(skip(self), fields(symbol = %symbol))]
    pub async fn lookup(&self, symbol: Symbol) -> LookupReport {
        let mut advisory = None;
        let mut outcome = None;

        if let Err(err) = self.run(&symbol, &mut advisory, &mut outcome).await {
            error!(error = ?err, "Lookup failed unexpectedly");
            outcome = Some(settle(outcome, &err));
        }

        let outcome = outcome.unwrap_or_else(|| {
            LookupOutcome::Error(LookupError::Unexpected("lookup produced no result".to_string()))
        });

        match &outcome {
            LookupOutcome::Quote(quote) => info!(price = quote.price, change = quote.change, "Lookup succeeded"),
            LookupOutcome::Error(e) => warn!(error = ?e, "Lookup ended with error"),
        }

        LookupReport {
            symbol,
            advisory,
            outcome,
        }
    }

    async fn run(
        &self,
        symbol: &Symbol,
        advisory: &mut Option<Advisory>,
        outcome: &mut Option<LookupOutcome>,
    ) -> anyhow::Result<()> {
        match self.prober.probe().await? {
            ConnectivityResult::Unreachable => {
                *outcome = Some(LookupOutcome::Error(LookupError::NetworkUnreachable));
                return Ok(());
            }
            ConnectivityResult::Reachable(latency) => {
                debug!(latency_ms = latency.as_millis() as u64, "Provider reachable");
                if self.config.is_slow(latency) {
                    warn!(latency_ms = latency.as_millis() as u64, "Slow connection");
                    *advisory = Some(Advisory::SlowConnection(latency));
                }
            }
        }

        *outcome = Some(self.resolve(symbol).await);
        Ok(())
    }

    /// Interroge le fournisseur et classe sa réponse
    ///
    /// Précondition : la sonde a répondu `Reachable`.
    pub async fn resolve(&self, symbol: &Symbol) -> LookupOutcome {
        match self.provider.fetch_info(symbol).await {
            Ok(record) => classify_record(record, symbol),
            Err(err) => {
                error!(error = %err, "Fetch failed");
                LookupOutcome::Error(classify_fetch_error(&err, symbol))
            }
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::models::QuoteView;

    struct FixedProber {
        result: ConnectivityResult,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Prober for FixedProber {
        async fn probe(&self) -> anyhow::Result<ConnectivityResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.result)
        }
    }

    struct BrokenProber;

    #[async_trait]
    impl Prober for BrokenProber {
        async fn probe(&self) -> anyhow::Result<ConnectivityResult> {
            anyhow::bail!("TLS backend unavailable")
        }
    }

    enum Reply {
        Record(Option<InfoRecord>),
        Fail(&'static str),
    }

    struct FakeProvider {
        reply: Reply,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl QuoteProvider for FakeProvider {
        async fn fetch_info(&self, _symbol: &Symbol) -> Result<Option<InfoRecord>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Reply::Record(record) => Ok(record.clone()),
                Reply::Fail(message) => Err(FetchError::Provider(message.to_string())),
            }
        }
    }

    fn build(
        probe: ConnectivityResult,
        reply: Reply,
    ) -> (Pipeline<FixedProber, FakeProvider>, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let probe_calls = Arc::new(AtomicUsize::new(0));
        let fetch_calls = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new(
            FixedProber {
                result: probe,
                calls: probe_calls.clone(),
            },
            FakeProvider {
                reply,
                calls: fetch_calls.clone(),
            },
            Config::default(),
        );
        (pipeline, probe_calls, fetch_calls)
    }

    fn fast() -> ConnectivityResult {
        ConnectivityResult::Reachable(Duration::from_millis(120))
    }

    fn apple() -> InfoRecord {
        InfoRecord {
            long_name: Some("Apple Inc.".to_string()),
            regular_market_price: Some(150.25),
            regular_market_change: Some(-1.5),
            regular_market_change_percent: Some(-0.99),
        }
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_call() {
        let (pipeline, probe_calls, fetch_calls) = build(fast(), Reply::Record(Some(apple())));

        assert!(pipeline.submit("").await.is_none());
        assert!(pipeline.submit("   ").await.is_none());
        assert_eq!(probe_calls.load(Ordering::SeqCst), 0);
        assert_eq!(fetch_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_quote_apple() {
        let (pipeline, _, _) = build(fast(), Reply::Record(Some(apple())));

        let report = pipeline.submit(" aapl ").await.unwrap();
        assert!(report.advisory.is_none());

        let LookupOutcome::Quote(quote) = &report.outcome else {
            panic!("expected quote, got {:?}", report.outcome);
        };
        let view = QuoteView::new(&report.symbol, quote, chrono::Utc::now(), pipeline.config().timezone);
        assert_eq!(view.heading, "Apple Inc. (AAPL)");
        assert_eq!(view.price_line(), "$150.25 -1.50 (-0.99%)");
    }

    #[tokio::test]
    async fn test_unreachable_skips_provider() {
        let (pipeline, probe_calls, fetch_calls) =
            build(ConnectivityResult::Unreachable, Reply::Record(Some(apple())));

        let report = pipeline.submit("AAPL").await.unwrap();
        assert_eq!(report.outcome, LookupOutcome::Error(LookupError::NetworkUnreachable));
        assert_eq!(probe_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fetch_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_slow_probe_still_resolves() {
        let slow = ConnectivityResult::Reachable(Duration::from_millis(2500));
        let (pipeline, _, fetch_calls) = build(slow, Reply::Record(Some(apple())));

        let report = pipeline.submit("AAPL").await.unwrap();
        assert_eq!(report.advisory, Some(Advisory::SlowConnection(Duration::from_millis(2500))));
        assert!(report.outcome.is_quote());
        assert_eq!(fetch_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_record() {
        let (pipeline, _, _) = build(fast(), Reply::Record(Some(InfoRecord::default())));
        let report = pipeline.submit("zzzz").await.unwrap();

        let err = report.outcome.error().unwrap();
        assert_eq!(err, &LookupError::EmptyResult { symbol: "ZZZZ".to_string() });
        assert!(err.to_string().contains("ZZZZ"));

        let (pipeline, _, _) = build(fast(), Reply::Record(None));
        let report = pipeline.submit("ZZZZ").await.unwrap();
        assert!(matches!(report.outcome.error(), Some(LookupError::EmptyResult { .. })));
    }

    #[tokio::test]
    async fn test_missing_price_is_incomplete() {
        let record = InfoRecord {
            regular_market_price: None,
            ..apple()
        };
        let (pipeline, _, _) = build(fast(), Reply::Record(Some(record)));
        let report = pipeline.submit("AAPL").await.unwrap();

        assert_eq!(
            report.outcome,
            LookupOutcome::Error(LookupError::IncompleteResult { symbol: "AAPL".to_string() })
        );
    }

    #[tokio::test]
    async fn test_timed_out_is_fetch_timeout() {
        let (pipeline, _, _) = build(fast(), Reply::Fail("Read timed out. (read timeout=30)"));
        let report = pipeline.submit("AAPL").await.unwrap();
        assert_eq!(report.outcome, LookupOutcome::Error(LookupError::FetchTimeout));
    }

    #[tokio::test]
    async fn test_other_failure_is_generic() {
        let (pipeline, _, _) = build(fast(), Reply::Fail("Invalid Crumb"));
        let report = pipeline.submit("AAPL").await.unwrap();

        let err = report.outcome.error().unwrap();
        assert_eq!(err, &LookupError::FetchFailed { symbol: "AAPL".to_string() });
        assert!(!err.to_string().contains("Crumb"));
    }

    #[tokio::test]
    async fn test_prober_error_is_unexpected() {
        let pipeline = Pipeline::new(
            BrokenProber,
            FakeProvider {
                reply: Reply::Record(Some(apple())),
                calls: Arc::new(AtomicUsize::new(0)),
            },
            Config::default(),
        );

        let report = pipeline.submit("AAPL").await.unwrap();
        let err = report.outcome.error().unwrap();
        assert_eq!(err, &LookupError::Unexpected("TLS backend unavailable".to_string()));
        assert_eq!(
            err.to_string(),
            "⚠️ An unexpected system error occurred: TLS backend unavailable"
        );
    }

    #[test]
    fn test_settle_keeps_connection_error() {
        let err = anyhow::anyhow!("boom");

        let kept = settle(Some(LookupOutcome::Error(LookupError::FetchTimeout)), &err);
        assert_eq!(kept, LookupOutcome::Error(LookupError::FetchTimeout));

        let replaced = settle(
            Some(LookupOutcome::Error(LookupError::EmptyResult { symbol: "X".to_string() })),
            &err,
        );
        assert_eq!(replaced, LookupOutcome::Error(LookupError::Unexpected("boom".to_string())));

        let fresh = settle(None, &err);
        assert_eq!(fresh, LookupOutcome::Error(LookupError::Unexpected("boom".to_string())));
    }

    #[test]
    fn test_classify_record_zero_change() {
        let symbol = Symbol::parse("FOO").unwrap();
        let record = InfoRecord {
            long_name: Some("Foo".to_string()),
            regular_market_price: Some(10.0),
            regular_market_change: Some(0.0),
            regular_market_change_percent: None,
        };

        let LookupOutcome::Quote(quote) = classify_record(Some(record), &symbol) else {
            panic!("expected quote");
        };
        assert_eq!(quote.percent_change, 0.0);
        assert_eq!(quote.trend().sign(), "+");
    }
}
