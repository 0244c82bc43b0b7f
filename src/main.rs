// ============================================================================
// Stock Info Fetcher - Point d'entrée
// ============================================================================
// Page TUI unique : on saisit un symbole, on obtient nom + prix + variation
// depuis Yahoo Finance, ou un message d'erreur précis.
//
// CONCEPTS RUST CLÉS :
// 1. Terminal raw mode : contrôle total du terminal
// 2. Event loop : boucle qui gère événements et rendering
// 3. Worker thread + runtime tokio pour les appels réseau
// ============================================================================

use std::io;
use std::path::PathBuf;
use std::sync::mpsc;

use anyhow::{Context, Result};
use chrono::Utc;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info};

use stockinfo::app::App;
use stockinfo::config::Config;
use stockinfo::models::normalize;
use stockinfo::pipeline::{LookupReport, YahooPipeline};
use stockinfo::ui::{events::EventHandler, render};

// ============================================================================
// AppCommand / AppResult : communication avec le worker
// ============================================================================
// CONCEPT RUST : Command pattern avec channels
// - L'event loop envoie une commande au worker
// - Le worker exécute le pipeline (async) et renvoie le rapport
// ============================================================================

/// Commandes envoyées au worker thread
#[derive(Debug, Clone)]
enum AppCommand {
    /// Rechercher la saisie brute du champ (normalisée par le pipeline)
    Lookup { input: String },
}

/// Résultats renvoyés par le worker thread
#[derive(Debug)]
enum AppResult {
    /// Une recherche est terminée (cotation ou erreur)
    LookupDone(LookupReport),

    /// Saisie vide : aucune recherche lancée
    Skipped,
}

// ============================================================================
// Initialisation du logging
// ============================================================================
// - Les println! ne fonctionnent pas une fois le TUI lancé
// - On log vers un fichier, avec rotation quotidienne
// ============================================================================

/// Répertoire des logs
///
/// - Linux : ~/.local/share/stockinfo/logs
/// - Repli : ./logs
fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("stockinfo").join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

/// Initialise le système de logging vers fichier
///
/// # Utilisation
/// ```bash
/// tail -f ~/.local/share/stockinfo/logs/stockinfo.log.*
/// RUST_LOG=stockinfo=trace cargo run
/// ```
fn init_logging() -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), "stockinfo.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false) // Pas de codes couleur dans le fichier
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .with(
            // Par défaut : debug pour stockinfo, info pour les dépendances
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockinfo=debug,info".into()),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    info!(?log_dir, "Logging initialized");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    init_logging().unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {:#}", e);
        eprintln!("   Continuing without logging...");
    });

    println!("Stock Info Fetcher starting up");
    info!("Stock Info Fetcher starting up");

    // Configuration appliquée une seule fois, hors du pipeline
    let config = Config::default();
    debug!(?config, "Configuration loaded");

    let timezone = config.timezone;
    let pipeline = YahooPipeline::from_config(config).context("Failed to build lookup pipeline")?;

    // Le runtime est créé ici pour que son échec arrête le programme proprement
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    let (command_tx, command_rx) = mpsc::channel::<AppCommand>();
    let (result_tx, result_rx) = mpsc::channel::<AppResult>();

    info!("Spawning background worker thread");
    spawn_background_worker(runtime, pipeline, command_rx, result_tx);

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    let mut app = App::new(timezone);
    let events = EventHandler::new();

    info!("Starting event loop");
    let result = run(&mut terminal, &mut app, &events, command_tx, result_rx);

    // Restaure le terminal (même en cas d'erreur)
    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

// ============================================================================
// Background Worker Thread
// ============================================================================
// - Une commande à la fois : block_on() bloque le worker, pas l'UI
// - Le worker s'arrête quand le channel de commandes est fermé
// ============================================================================

fn spawn_background_worker(
    runtime: tokio::runtime::Runtime,
    pipeline: YahooPipeline,
    command_rx: mpsc::Receiver<AppCommand>,
    result_tx: mpsc::Sender<AppResult>,
) {
    std::thread::spawn(move || {
        while let Ok(command) = command_rx.recv() {
            info!(?command, "Worker received command");

            let result = runtime.block_on(execute(&pipeline, command));
            if result_tx.send(result).is_err() {
                debug!("UI closed before lookup finished");
                break;
            }
        }

        info!("Worker thread exiting (channel closed)");
    });
}

/// Exécute une commande sur le pipeline
async fn execute(pipeline: &YahooPipeline, command: AppCommand) -> AppResult {
    match command {
        AppCommand::Lookup { input } => match pipeline.submit(&input).await {
            Some(report) => AppResult::LookupDone(report),
            None => AppResult::Skipped,
        },
    }
}

// ============================================================================
// Event Loop Principal
// ============================================================================
// À chaque itération :
//   0. Récupérer le résultat du worker (non bloquant)
//   1. Dessiner l'interface
//   2. Traiter l'événement clavier
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
    command_tx: mpsc::Sender<AppCommand>,
    result_rx: mpsc::Receiver<AppResult>,
) -> Result<()> {
    while app.is_running() {
        // 0. RÉSULTATS
        match result_rx.try_recv() {
            Ok(AppResult::LookupDone(report)) => {
                info!(symbol = %report.symbol, quote = report.outcome.is_quote(), "Displaying lookup result");
                // L'horodatage est généré au moment de l'affichage
                app.show_report(&report, Utc::now());
            }
            Ok(AppResult::Skipped) => {
                debug!("Empty ticker symbol, nothing to display");
                app.clear_result();
            }
            Err(mpsc::TryRecvError::Empty) => {}
            Err(mpsc::TryRecvError::Disconnected) => {
                if app.is_loading_data() {
                    error!("Worker thread disconnected during lookup");
                    app.show_failure("background worker stopped".to_string());
                }
            }
        }

        // 1. RENDER
        terminal.draw(|frame| render(frame, app))?;

        // 2. INPUT
        let event = events.next()?;
        handle_event(app, event, &command_tx);
    }

    Ok(())
}

// ============================================================================
// Gestion des événements
// ============================================================================

fn handle_event(app: &mut App, event: stockinfo::ui::events::Event, command_tx: &mpsc::Sender<AppCommand>) {
    use stockinfo::ui::events::{
        get_char_from_event, is_backspace_event, is_enter_event, is_escape_event,
        is_interrupt_event, Event,
    };

    match event {
        Event::Key(_) if is_interrupt_event(&event) => {
            info!("User interrupted");
            app.quit();
        }

        // ESC : quit confirmation two-step
        Event::Key(_) if is_escape_event(&event) => {
            if app.is_awaiting_quit_confirmation() {
                info!("User confirmed quit");
                app.quit();
            } else {
                info!("User requested quit (awaiting confirmation)");
                app.request_quit();
            }
        }

        Event::Key(_) if is_enter_event(&event) => {
            app.cancel_quit();
            submit_lookup(app, command_tx);
        }

        Event::Key(_) if is_backspace_event(&event) => {
            app.cancel_quit();
            app.backspace();
        }

        Event::Key(_) => {
            app.cancel_quit();
            if let Some(c) = get_char_from_event(&event) {
                app.append_char(c);
            }
        }

        Event::Tick => {}
    }
}

/// Soumet le contenu du champ au worker
///
/// - recherche en cours : soumission ignorée (pas d'annulation)
/// - saisie vide : le pipeline ne lance rien et le panneau est vidé
fn submit_lookup(app: &mut App, command_tx: &mpsc::Sender<AppCommand>) {
    if app.is_loading_data() {
        debug!("Lookup already in flight, ignoring submission");
        return;
    }

    let input = app.submit_input();
    info!(input = %input, "User submitted symbol");
    app.start_loading(Some(format!("Fetching data for {}...", normalize(&input))));

    if command_tx.send(AppCommand::Lookup { input }).is_err() {
        error!("Worker thread is gone, cannot run lookup");
        app.show_failure("background worker stopped".to_string());
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================

/// Configure le terminal en mode TUI
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.into())
}

/// Restaure le terminal à son état normal
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use stockinfo::pipeline::LookupError;

    /// Pipeline réel pointé vers un port fermé : la sonde échoue toujours
    fn offline_pipeline() -> YahooPipeline {
        let config = Config {
            probe_url: "http://127.0.0.1:1/".to_string(),
            cookie_url: "http://127.0.0.1:1/".to_string(),
            ..Config::default()
        };
        YahooPipeline::from_config(config).unwrap()
    }

    #[tokio::test]
    async fn test_execute_empty_input_is_skipped() {
        let pipeline = offline_pipeline();
        for input in ["", "   ", "\t"] {
            let result = execute(&pipeline, AppCommand::Lookup { input: input.to_string() }).await;
            assert!(matches!(result, AppResult::Skipped), "input {:?}", input);
        }
    }

    #[tokio::test]
    async fn test_execute_normalizes_input() {
        let pipeline = offline_pipeline();
        let result = execute(&pipeline, AppCommand::Lookup { input: " aapl ".to_string() }).await;

        let AppResult::LookupDone(report) = result else {
            panic!("expected a lookup report");
        };
        assert_eq!(report.symbol.as_str(), "AAPL");
        assert_eq!(report.outcome.error(), Some(&LookupError::NetworkUnreachable));
    }

    #[test]
    fn test_submit_lookup_sends_raw_input() {
        let (tx, rx) = mpsc::channel();
        let mut app = App::default();
        app.input_buffer = " msft".to_string();

        submit_lookup(&mut app, &tx);
        assert!(app.is_loading_data());
        assert_eq!(app.loading_message.as_deref(), Some("Fetching data for MSFT..."));
        assert!(matches!(rx.try_recv(), Ok(AppCommand::Lookup { input }) if input == " msft"));

        // Recherche en cours : la seconde soumission est ignorée
        submit_lookup(&mut app, &tx);
        assert!(rx.try_recv().is_err());
    }
}
