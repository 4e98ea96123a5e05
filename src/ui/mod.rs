pub mod card;
pub mod plain;

use std::sync::OnceLock;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Popup};
use crate::drug::Outcome;
use crate::form::Phase;
use crate::theme::Theme;
use card::{bundle_cards, DrugCard};

const PLACEHOLDER_QUESTION: &str = "e.g. What is the cheapest generic for Zyrtec?";

// Set once from config at startup; falls back to the built-in palette
static THEME: OnceLock<Theme> = OnceLock::new();

pub fn init_theme(theme: Theme) {
    if THEME.set(theme).is_err() {
        tracing::debug!("Theme already initialized");
    }
}

fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::default)
}

// Helper functions to get theme colors
fn accent() -> Color { theme().accent }
fn inactive() -> Color { theme().inactive }
fn success() -> Color { theme().success }
fn warning() -> Color { theme().warning }
fn danger() -> Color { theme().danger }
fn text() -> Color { theme().text }
fn text_dim() -> Color { theme().text_dim }
fn header() -> Color { theme().header }

pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(2),               // Title + tagline
            Constraint::Length(3),               // Question input
            Constraint::Min(3),                  // Results
            Constraint::Length(1),               // Footer
        ])
        .split(f.area());

    draw_header(f, chunks[0]);
    draw_input(f, app, chunks[1]);
    let (max_scroll, page) = draw_results(f, app, chunks[2]);
    app.results_max_scroll = max_scroll;
    app.results_page = page;
    app.results_scroll = app.results_scroll.min(max_scroll);
    draw_footer(f, app, chunks[3]);

    if app.popup == Popup::Help {
        draw_help_popup(f);
    }
}

fn draw_header(f: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            "💊 MedWise",
            Style::default().fg(accent()).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Ask about brand-name drugs, generic alternatives, and prices.",
            Style::default().fg(text_dim()),
        )),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

fn draw_input(f: &mut Frame, app: &App, area: Rect) {
    let (title, border_color) = match app.form.phase() {
        Phase::Loading => (" Asking... ", warning()),
        Phase::Failed => (" Ask MedWise ", danger()),
        Phase::Idle | Phase::Answered => (" Ask MedWise ", accent()),
    };

    let block = Block::default()
        .title(Span::styled(title, Style::default().fg(border_color).add_modifier(Modifier::BOLD)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let content = if app.form.input.is_empty() {
        Line::from(vec![
            Span::styled("_", Style::default().fg(accent())),
            Span::styled(PLACEHOLDER_QUESTION, Style::default().fg(text_dim())),
        ])
    } else {
        Line::from(vec![
            Span::styled(app.form.input.as_str(), Style::default().fg(text())),
            Span::styled("_", Style::default().fg(accent())),
        ])
    };

    f.render_widget(Paragraph::new(content).block(block), area);
}

/// Draws the results area and returns (max scroll, page size) in rows
fn draw_results(f: &mut Frame, app: &App, area: Rect) -> (u16, u16) {
    if app.form.is_loading() {
        let waiting = Paragraph::new(Line::from(Span::styled(
            "󰔟 Asking...",
            Style::default().fg(warning()),
        )))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(inactive())));
        f.render_widget(waiting, area);
        return (0, 1);
    }

    match app.form.outcome() {
        None => {
            let idle = Paragraph::new(Line::from(Span::styled(
                "Type a question and press Enter",
                Style::default().fg(text_dim()),
            )))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(inactive())));
            f.render_widget(idle, area);
            (0, 1)
        }
        Some(Outcome::Error(message)) => {
            let error = Paragraph::new(Line::from(Span::styled(
                format!("⚠️ {}", message),
                Style::default().fg(danger()),
            )));
            let block = Block::default()
                .title(Span::styled(" Error ", Style::default().fg(danger())))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(danger()));
            draw_panel(f, error, block, app.results_scroll, area)
        }
        Some(Outcome::Answer(answer)) => {
            let panel = Paragraph::new(Line::from(Span::styled(
                answer.as_str(),
                Style::default().fg(text()),
            )));
            let block = Block::default()
                .title(Span::styled(" 🧠 Answer ", Style::default().fg(success()).add_modifier(Modifier::BOLD)))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(success()));
            draw_panel(f, panel, block, app.results_scroll, area)
        }
        Some(Outcome::Bundle(bundle)) => {
            let cards = bundle_cards(bundle);
            let max_scroll = draw_cards(f, &cards, app.results_scroll, area);
            (max_scroll, area.height.saturating_sub(1).max(1))
        }
    }
}

fn rows(n: usize) -> u16 {
    n.min(u16::MAX as usize) as u16
}

/// Bordered, wrapped text scrolled by `scroll` rows
fn draw_panel(f: &mut Frame, text: Paragraph, block: Block, scroll: u16, area: Rect) -> (u16, u16) {
    let text = text.wrap(Wrap { trim: false });
    let view = area.height.saturating_sub(2);
    let max_scroll = rows(text.line_count(area.width.saturating_sub(2).max(1))).saturating_sub(view);

    f.render_widget(text.scroll((scroll.min(max_scroll), 0)).block(block), area);
    (max_scroll, view.saturating_sub(1).max(1))
}

/// Lay cards out as one column `scroll` rows down and draw the visible slice.
/// Returns the largest useful scroll.
fn draw_cards(f: &mut Frame, cards: &[DrugCard], scroll: u16, area: Rect) -> u16 {
    let heights: Vec<u16> = cards.iter().map(|c| c.height(theme(), area.width)).collect();
    let total = heights.iter().fold(0u16, |sum, h| sum.saturating_add(*h));
    let max_scroll = total.saturating_sub(area.height);
    let scroll = scroll.min(max_scroll);
    let view_bottom = scroll.saturating_add(area.height);

    let mut top = 0u16;
    for (card, &height) in cards.iter().zip(&heights) {
        let bottom = top.saturating_add(height);
        let visible_top = top.max(scroll);
        let visible_bottom = bottom.min(view_bottom);

        if visible_top < visible_bottom {
            // Rows of this card above the viewport, border included
            let hidden = scroll.saturating_sub(top);

            let mut borders = Borders::LEFT | Borders::RIGHT;
            let mut block = Block::default().border_style(Style::default().fg(inactive()));
            if hidden == 0 {
                borders |= Borders::TOP;
                block = block.title(Span::styled(
                    format!(" {} ", card.title),
                    Style::default().fg(header()).add_modifier(Modifier::BOLD),
                ));
            }
            if bottom <= view_bottom {
                borders |= Borders::BOTTOM;
            }

            let card_area = Rect::new(
                area.x,
                area.y + (visible_top - scroll),
                area.width,
                visible_bottom - visible_top,
            );
            let widget = card
                .paragraph(theme())
                .scroll((hidden.saturating_sub(1), 0))
                .block(block.borders(borders));
            f.render_widget(widget, card_area);
        }

        top = bottom;
    }

    max_scroll
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    // Status message takes priority over key hints
    let line = if let Some(ref status) = app.status_message {
        Line::from(vec![Span::styled(status.as_str(), Style::default().fg(warning()))])
    } else {
        let mut spans = vec![
            Span::styled("Enter", Style::default().fg(accent())),
            Span::raw(" ask │ "),
        ];
        if app.results_max_scroll > 0 {
            spans.push(Span::styled("↑/↓", Style::default().fg(accent())));
            spans.push(Span::raw(" scroll │ "));
        }
        spans.extend([
            Span::styled("F1", Style::default().fg(accent())),
            Span::raw(" help │ "),
            Span::styled("Esc", Style::default().fg(accent())),
            Span::raw(" clear/quit │ "),
            Span::styled(app.endpoint.as_str(), Style::default().fg(text_dim())),
        ]);
        Line::from(spans)
    };

    let footer = Paragraph::new(line)
        .alignment(Alignment::Center)
        .style(Style::default().fg(text_dim()));
    f.render_widget(footer, area);
}

fn draw_help_popup(f: &mut Frame) {
    let area = centered_rect(60, 50, f.area());
    f.render_widget(Clear, area);

    let key = |k: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<12}", k), Style::default().fg(accent())),
            Span::styled(desc, Style::default().fg(text())),
        ])
    };

    let lines = vec![
        Line::from(""),
        key("Enter", "Ask the question"),
        key("Backspace", "Delete a character"),
        key("Esc", "Clear the question (quit when empty)"),
        key("↑ / ↓", "Scroll one row"),
        key("PgUp / PgDn", "Scroll one page"),
        key("Home / End", "Jump to the top or bottom"),
        key("Ctrl+C", "Quit"),
        Line::from(""),
        Line::from(Span::styled("  Esc closes this window", Style::default().fg(text_dim()))),
    ];

    let help = Paragraph::new(lines).block(
        Block::default()
            .title(Span::styled(" Help ", Style::default().fg(accent())))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(accent())),
    );
    f.render_widget(help, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
