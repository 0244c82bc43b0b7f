// ============================================================================
// Structure : App
// ============================================================================
// Gère l'état de la page : champ de saisie, recherche en cours, résultat affiché
//
// CONCEPTS RUST :
// 1. State Management : centraliser l'état dans une seule structure
// 2. Mutabilité contrôlée : &mut self pour modifier l'état
//
// PATTERN : "Application State"
// - L'UI lit depuis App
// - Toutes les modifications passent par les méthodes de App
// ============================================================================

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::models::QuoteView;
use crate::pipeline::{LookupError, LookupOutcome, LookupReport};

/// Prompt du champ de saisie
pub const INPUT_PROMPT: &str = "Please enter a stock symbol: ";

// ============================================================================
// Panneau de résultat
// ============================================================================

/// Contenu principal du panneau
#[derive(Debug, Clone, PartialEq)]
pub enum PanelBody {
    /// Cotation formatée (vert/rouge selon la tendance)
    Quote(QuoteView),

    /// Message d'erreur pour l'utilisateur
    Error(String),
}

/// Ce que la page affiche pour la dernière recherche
#[derive(Debug, Clone, PartialEq)]
pub struct ResultPanel {
    /// Avertissement "connexion lente", affiché au-dessus du résultat
    pub advisory: Option<String>,

    pub body: PanelBody,
}

impl ResultPanel {
    /// Convertit un rapport en panneau ; l'horodatage est pris à l'affichage
    pub fn from_report(report: &LookupReport, now: DateTime<Utc>, tz: Tz) -> Self {
        let body = match &report.outcome {
            LookupOutcome::Quote(quote) => PanelBody::Quote(QuoteView::new(&report.symbol, quote, now, tz)),
            LookupOutcome::Error(e) => PanelBody::Error(e.to_string()),
        };

        Self {
            advisory: report.advisory.map(|a| a.to_string()),
            body,
        }
    }
}

// ============================================================================
// App
// ============================================================================

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    /// Two-step quit : première pression d'ESC -> confirmation, seconde -> sortie
    pub confirm_quit: bool,

    /// Une recherche est en cours : les nouvelles soumissions sont ignorées
    pub is_loading: bool,

    pub loading_message: Option<String>,

    /// Contenu du champ de saisie (conservé après soumission)
    pub input_buffer: String,

    /// Résultat de la dernière recherche
    pub result: Option<ResultPanel>,

    /// Fuseau de l'horodatage affiché
    pub timezone: Tz,
}

impl App {
    pub fn new(timezone: Tz) -> Self {
        Self {
            running: true,
            confirm_quit: false,
            is_loading: false,
            loading_message: None,
            input_buffer: String::new(),
            result: None,
            timezone,
        }
    }

    /// Quitte l'application
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Vérifie si l'application doit continuer
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Demande la confirmation de quitter
    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    /// Annule la demande de quit
    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    /// Démarre le chargement avec un message optionnel
    pub fn start_loading(&mut self, message: Option<String>) {
        self.is_loading = true;
        self.loading_message = message;
    }

    /// Termine le chargement
    pub fn stop_loading(&mut self) {
        self.is_loading = false;
        self.loading_message = None;
    }

    pub fn is_loading_data(&self) -> bool {
        self.is_loading
    }

    // ========================================================================
    // Saisie
    // ========================================================================

    /// Ajoute un caractère au buffer d'input
    pub fn append_char(&mut self, c: char) {
        self.input_buffer.push(c);
    }

    /// Supprime le dernier caractère du buffer
    pub fn backspace(&mut self) {
        self.input_buffer.pop();
    }

    /// Retourne la valeur saisie ; le texte reste dans le champ
    pub fn submit_input(&self) -> String {
        self.input_buffer.clone()
    }

    // ========================================================================
    // Résultat
    // ========================================================================

    /// Affiche le rapport d'une recherche et termine le chargement
    ///
    /// Le panneau précédent est remplacé : rien n'est conservé d'une
    /// soumission à l'autre.
    pub fn show_report(&mut self, report: &LookupReport, now: DateTime<Utc>) {
        self.result = Some(ResultPanel::from_report(report, now, self.timezone));
        self.stop_loading();
    }

    /// Affiche une panne survenue hors du pipeline (worker arrêté)
    pub fn show_failure(&mut self, message: String) {
        self.result = Some(ResultPanel {
            advisory: None,
            body: PanelBody::Error(LookupError::Unexpected(message).to_string()),
        });
        self.stop_loading();
    }

    /// Vide le panneau et termine le chargement (saisie vide soumise)
    pub fn clear_result(&mut self) {
        self.result = None;
        self.stop_loading();
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(chrono_tz::US::Pacific)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::TimeZone;

    use crate::models::{QuoteData, Symbol, Trend};
    use crate::pipeline::Advisory;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 20, 30, 0).unwrap()
    }

    #[test]
    fn test_app_creation() {
        let app = App::default();
        assert!(app.is_running());
        assert!(!app.is_loading_data());
        assert!(app.result.is_none());
    }

    #[test]
    fn test_app_quit() {
        let mut app = App::default();
        app.request_quit();
        assert!(app.is_awaiting_quit_confirmation());
        app.cancel_quit();
        assert!(!app.is_awaiting_quit_confirmation());

        app.quit();
        assert!(!app.is_running());
    }

    #[test]
    fn test_input_editing() {
        let mut app = App::default();
        for c in "msft".chars() {
            app.append_char(c);
        }
        app.backspace();
        assert_eq!(app.submit_input(), "msf");
        // La saisie reste dans le champ
        assert_eq!(app.input_buffer, "msf");
    }

    #[test]
    fn test_show_quote_report() {
        let mut app = App::default();
        app.start_loading(Some("Fetching AAPL...".to_string()));

        let report = LookupReport {
            symbol: Symbol::parse("AAPL").unwrap(),
            advisory: Some(Advisory::SlowConnection(Duration::from_secs(3))),
            outcome: LookupOutcome::Quote(QuoteData {
                name: "Apple Inc.".to_string(),
                price: 150.25,
                change: -1.5,
                percent_change: -0.99,
            }),
        };
        app.show_report(&report, now());

        assert!(!app.is_loading_data());
        let panel = app.result.as_ref().unwrap();
        assert!(panel.advisory.as_ref().unwrap().contains("seems slow"));

        let PanelBody::Quote(view) = &panel.body else {
            panic!("expected quote panel");
        };
        assert_eq!(view.timestamp, "Mon Jan 15 12:30:00 PST 2024");
        assert_eq!(view.trend, Trend::Negative);
    }

    #[test]
    fn test_show_error_report_replaces_previous() {
        let mut app = App::default();
        app.result = Some(ResultPanel {
            advisory: None,
            body: PanelBody::Error("old".to_string()),
        });

        let report = LookupReport {
            symbol: Symbol::parse("ZZZZ").unwrap(),
            advisory: None,
            outcome: LookupOutcome::Error(LookupError::EmptyResult {
                symbol: "ZZZZ".to_string(),
            }),
        };
        app.show_report(&report, now());

        let panel = app.result.as_ref().unwrap();
        assert!(panel.advisory.is_none());
        assert_eq!(
            panel.body,
            PanelBody::Error("⚠️ Error: No data returned for 'ZZZZ'. It might be an invalid symbol.".to_string())
        );

        app.start_loading(Some("Fetching data for ...".to_string()));
        app.clear_result();
        assert!(app.result.is_none());
        assert!(!app.is_loading_data());
        assert!(app.loading_message.is_none());
    }

    #[test]
    fn test_show_failure() {
        let mut app = App::default();
        app.start_loading(None);
        app.show_failure("background worker stopped".to_string());

        assert!(!app.is_loading_data());
        assert_eq!(
            app.result.unwrap().body,
            PanelBody::Error("⚠️ An unexpected system error occurred: background worker stopped".to_string())
        );
    }
}
