// ============================================================================
// Page - Rendu de l'interface
// ============================================================================
// Dessine la page unique en utilisant les widgets de ratatui :
//
//   ┌ titre + sous-titre ┐
//   ├ champ de saisie    ┤
//   ├ résultat           ┤
//   └ raccourcis         ┘
//
// CONCEPTS RATATUI :
// 1. Frame : surface de dessin
// 2. Layout : découpage de l'espace en zones
// 3. Style : couleurs et attributs de texte
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, PanelBody, ResultPanel, INPUT_PROMPT};
use crate::models::Trend;

const TITLE: &str = "📊 Stock Info Fetcher";
const SUBTITLE: &str =
    "Check real-time stock details by entering a ticker symbol (e.g., AAPL, GOOGL, MSFT).";

/// Dessine l'interface complète
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = create_layout(frame.size());

    render_header(frame, chunks[0]);
    render_input(frame, app, chunks[1]);
    render_result(frame, app, chunks[2]);
    render_footer(frame, app, chunks[3]);
}

/// Crée le layout principal (header, saisie, résultat, footer)
fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header : titre + sous-titre
            Constraint::Length(3), // Saisie
            Constraint::Min(0),    // Résultat : tout le reste
            Constraint::Length(3), // Footer
        ])
        .split(area)
        .to_vec()
}

fn render_header(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let text = vec![
        Line::from(Span::styled(
            TITLE,
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(SUBTITLE, Style::default().fg(Color::Gray))),
    ];

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

/// Champ de saisie : prompt, buffer et curseur
fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    // Bordure grise pendant une recherche : la saisie est ignorée
    let border = if app.is_loading_data() {
        Color::DarkGray
    } else {
        Color::Green
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));

    let line = Line::from(vec![
        Span::styled(
            INPUT_PROMPT,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(app.input_buffer.as_str(), Style::default().fg(Color::White)),
        Span::styled(
            "█", // Curseur
            Style::default().fg(Color::White).add_modifier(Modifier::SLOW_BLINK),
        ),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_result(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let lines = if app.is_loading_data() {
        let message = app
            .loading_message
            .clone()
            .unwrap_or_else(|| "Loading...".to_string());
        vec![Line::from(Span::styled(
            format!("⏳ {}", message),
            Style::default().fg(Color::Yellow),
        ))]
    } else {
        match &app.result {
            Some(panel) => panel_lines(panel),
            None => vec![Line::from(Span::styled(
                "Type a symbol and press Enter.",
                Style::default().fg(Color::Gray),
            ))],
        }
    };

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}

/// Lignes du panneau : avertissement éventuel puis cotation ou erreur
fn panel_lines(panel: &ResultPanel) -> Vec<Line<'_>> {
    let mut lines = Vec::new();

    if let Some(advisory) = &panel.advisory {
        lines.push(Line::from(Span::styled(
            advisory.as_str(),
            Style::default().fg(Color::Yellow),
        )));
        lines.push(Line::from(""));
    }

    match &panel.body {
        PanelBody::Quote(view) => {
            let color = match view.trend {
                Trend::Positive => Color::Green,
                Trend::Negative => Color::Red,
            };

            lines.push(Line::from(format!("🕒 {}", view.timestamp)));
            lines.push(Line::from(Span::styled(
                format!("🏢 {}", view.heading),
                Style::default().add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                view.price_line(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )));
        }
        PanelBody::Error(message) => {
            lines.push(Line::from(Span::styled(
                message.as_str(),
                Style::default().fg(Color::Red),
            )));
        }
    }

    lines
}

/// Dessine le footer avec les raccourcis clavier
fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let shortcuts = if app.is_awaiting_quit_confirmation() {
        Line::from(vec![
            Span::styled(
                "⚠  Press ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "[ESC]",
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
            Span::styled(
                " again to quit, any other key to cancel ⚠",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ])
    } else {
        Line::from(vec![
            Span::styled("[Enter]", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw(" Look up  "),
            Span::styled("[Backspace]", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw(" Edit  "),
            Span::styled("[ESC]", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            Span::raw(" Quit"),
        ])
    };

    let paragraph = Paragraph::new(vec![shortcuts])
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Tests
// ============================================================================
