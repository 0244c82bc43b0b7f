// ============================================================================
// Structures : InfoRecord, QuoteData, QuoteView
// ============================================================================
// - InfoRecord : métadonnées brutes d'un ticker renvoyées par le fournisseur
// - QuoteData : cotation extraite (nom, prix, variation)
// - QuoteView : chaînes prêtes à afficher (prix, variations signées, couleur)
//
// CONCEPTS RUST :
// 1. Option<T> au lieu de recherches dynamiques dans un dictionnaire
//    - Chaque champ absent du JSON devient None
//    - L'extraction applique une valeur par défaut documentée
// 2. #[serde(rename_all = "camelCase")] : "regularMarketPrice" -> regular_market_price
// ============================================================================

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::models::Symbol;

/// Format de l'horodatage affiché (ex: "Mon Jan 15 12:30:00 PST 2024")
pub const TIMESTAMP_FORMAT: &str = "%a %b %d %H:%M:%S %Z %Y";

/// Nom utilisé si le champ est absent au moment de l'extraction
pub const UNKNOWN_NAME: &str = "N/A";

/// Métadonnées d'un ticker telles que renvoyées par le fournisseur
///
/// Les champs inconnus du JSON sont ignorés.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoRecord {
    /// Nom complet (ex: "Apple Inc.")
    pub long_name: Option<String>,

    /// Dernier prix de marché
    pub regular_market_price: Option<f64>,

    /// Variation absolue depuis la clôture précédente
    pub regular_market_change: Option<f64>,

    /// Variation en pourcentage (déjà multipliée par 100)
    pub regular_market_change_percent: Option<f64>,
}

impl InfoRecord {
    /// Vrai si aucun champ connu n'est présent (équivalent d'un record vide)
    pub fn is_empty(&self) -> bool {
        self.long_name.is_none()
            && self.regular_market_price.is_none()
            && self.regular_market_change.is_none()
            && self.regular_market_change_percent.is_none()
    }

    /// Vrai si le nom et le prix sont présents
    pub fn is_complete(&self) -> bool {
        self.long_name.is_some() && self.regular_market_price.is_some()
    }
}

/// Cotation d'un ticker
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteData {
    pub name: String,
    pub price: f64,
    pub change: f64,
    pub percent_change: f64,
}

impl QuoteData {
    /// Extrait la cotation d'un record
    ///
    /// Valeurs par défaut : nom "N/A", champs numériques 0.0.
    pub fn from_record(record: &InfoRecord) -> Self {
        Self {
            name: record
                .long_name
                .clone()
                .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            price: record.regular_market_price.unwrap_or(0.0),
            change: record.regular_market_change.unwrap_or(0.0),
            percent_change: record.regular_market_change_percent.unwrap_or(0.0),
        }
    }

    /// Tendance du jour (zéro compte comme positif)
    pub fn trend(&self) -> Trend {
        if self.change >= 0.0 {
            Trend::Positive
        } else {
            Trend::Negative
        }
    }
}

/// Indicateur de couleur de la cotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Positive,
    Negative,
}

impl Trend {
    pub fn sign(&self) -> &'static str {
        match self {
            Trend::Positive => "+",
            Trend::Negative => "-",
        }
    }
}

/// Cotation formatée pour l'affichage
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteView {
    /// Horodatage local (ex: "Mon Jan 15 12:30:00 PST 2024")
    pub timestamp: String,

    /// "Apple Inc. (AAPL)"
    pub heading: String,

    /// "$150.25"
    pub price: String,

    /// "-1.50"
    pub change: String,

    /// "-0.99%"
    pub percent: String,

    pub trend: Trend,
}

impl QuoteView {
    /// Formate une cotation
    ///
    /// Le signe de la variation ET du pourcentage suit `change`, les valeurs
    /// affichées sont absolues avec 2 décimales.
    pub fn new(symbol: &Symbol, quote: &QuoteData, now: DateTime<Utc>, tz: Tz) -> Self {
        let trend = quote.trend();
        let sign = trend.sign();

        Self {
            timestamp: format_timestamp(now, tz),
            heading: format!("{} ({})", quote.name, symbol),
            price: format!("${:.2}", quote.price),
            change: format!("{}{:.2}", sign, quote.change.abs()),
            percent: format!("{}{:.2}%", sign, quote.percent_change.abs()),
            trend,
        }
    }

    /// Ligne de prix complète : "$150.25 -1.50 (-0.99%)"
    pub fn price_line(&self) -> String {
        format!("{} {} ({})", self.price, self.change, self.percent)
    }
}

/// Horodatage dans le fuseau donné
pub fn format_timestamp(now: DateTime<Utc>, tz: Tz) -> String {
    now.with_timezone(&tz).format(TIMESTAMP_FORMAT).to_string()
}

// ============================================================================
// Tests unitaires
// ============================================================================
