//! Rendering of the review session
//!
//! One frame is made of the instructional pane, the draft pane and, while the
//! session is live, a legend of the key bindings.

use super::keys;
use super::session::{End, Pane, Phase, ReviewSession};
use crate::git::VcsBridge;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};

// Design Token Color Palette
const ACCENT_COLOR: Color = Color::Blue;
const ACCENT_COLOR_ACTIVE: Color = Color::Cyan;
const TEXT_COLOR: Color = Color::White;
const SUBTLE_COLOR: Color = Color::DarkGray;
const BORDER_COLOR: Color = Color::DarkGray;
const SUCCESS_COLOR: Color = Color::Green;
const WARNING_COLOR: Color = Color::Yellow;
const ERROR_COLOR: Color = Color::Red;
const ERROR_BACKGROUND: Color = Color::Rgb(0xb2, 0x00, 0x00);

// Spacing Tokens (in character units)
const SPACING_XS: u16 = 1;
const SPACING_SM: u16 = 2;
const PANE_HEIGHT: u16 = 3;

/// Main UI rendering entry point
pub fn draw_ui<B: VcsBridge>(f: &mut Frame, session: &mut ReviewSession<'_, B>) {
    let chunks = create_layout(f.area(), session);

    draw_pane(f, session, chunks[1]);

    if show_draft(session.phase()) {
        draw_draft(f, session, chunks[2]);
    }

    if !session.is_terminal() {
        draw_help(f, chunks[4]);
    }
}

const fn show_draft(phase: Phase) -> bool {
    !matches!(phase, Phase::Loading | Phase::Terminal(End::Canceled))
}

/// Top padding, pane, draft, filler, help legend
fn create_layout<B: VcsBridge>(area: Rect, session: &ReviewSession<'_, B>) -> Vec<Rect> {
    let draft_height = session.draft_height().saturating_add(SPACING_SM);

    let vertical_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(SPACING_XS),
            Constraint::Length(PANE_HEIGHT),
            Constraint::Length(draft_height),
            Constraint::Min(0),
            Constraint::Length(SPACING_XS),
        ])
        .split(area);

    vertical_layout
        .iter()
        .map(|chunk| {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints([
                    Constraint::Length(SPACING_SM),
                    Constraint::Min(1),
                    Constraint::Length(SPACING_SM),
                ])
                .split(*chunk)[1]
        })
        .collect()
}

fn pane_style(pane: Pane) -> Style {
    let style = Style::default().add_modifier(Modifier::BOLD);
    match pane {
        Pane::Waiting | Pane::Review => style.fg(ACCENT_COLOR),
        Pane::Editing => style.fg(ACCENT_COLOR_ACTIVE),
        Pane::Accepted => style.fg(SUCCESS_COLOR),
        Pane::Canceled | Pane::EditorFailed => style.fg(WARNING_COLOR),
        Pane::Failed => style.fg(Color::White).bg(ERROR_BACKGROUND),
    }
}

fn draw_pane<B: VcsBridge>(f: &mut Frame, session: &ReviewSession<'_, B>, area: Rect) {
    let pane = session.pane();

    let headline = match pane {
        Pane::Waiting => {
            let spinner = session.spinner();
            if spinner.width() > usize::from(area.width) {
                spinner.frame().to_string()
            } else {
                format!("{} {}", spinner.frame(), spinner.message())
            }
        }
        Pane::Failed => session
            .last_error()
            .map_or_else(|| pane.headline().to_string(), |e| failure_headline(&e.to_string())),
        _ => pane.headline().to_string(),
    };

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!(" {headline} "), pane_style(pane))),
    ];

    if pane == Pane::EditorFailed
        && let Some(error) = session.last_error()
    {
        lines.push(Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(SUBTLE_COLOR),
        )));
    }

    let paragraph = Paragraph::new(lines).alignment(Alignment::Left);

    f.render_widget(Clear, area);
    f.render_widget(paragraph, area);
}

/// The label part of a failure message, e.g. `API Error` out of `API Error: rate limited`
fn failure_headline(message: &str) -> String {
    message
        .split_once(':')
        .map_or_else(|| message.to_string(), |(label, _)| format!("{label}:"))
}

fn draw_draft<B: VcsBridge>(f: &mut Frame, session: &mut ReviewSession<'_, B>, area: Rect) {
    let phase = session.phase();
    let is_editing = phase == Phase::Editing;

    let (title, border_color) = match phase {
        Phase::Editing => (" Edit Message ", ACCENT_COLOR_ACTIVE),
        Phase::Terminal(End::Accepted) => (" Last Commit ", SUCCESS_COLOR),
        Phase::Terminal(End::Failed) => (" Error ", ERROR_COLOR),
        _ => (" Commit Message ", BORDER_COLOR),
    };

    let block = Block::default()
        .title(Span::styled(
            title,
            Style::default()
                .fg(if is_editing {
                    ACCENT_COLOR_ACTIVE
                } else {
                    ACCENT_COLOR
                })
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border_color));

    let draft = session.draft_mut();
    draft.set_block(block);
    draft.set_placeholder_text("...");
    draft.set_style(Style::default().fg(TEXT_COLOR));
    draft.set_cursor_line_style(Style::default());
    draft.set_line_number_style(Style::default().fg(SUBTLE_COLOR));
    if is_editing {
        draft.set_cursor_style(Style::default().bg(ACCENT_COLOR_ACTIVE).fg(Color::Black));
    } else {
        draft.set_cursor_style(Style::default());
    }

    f.render_widget(&*draft, area);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let entries = keys::help_entries();

    let spans = entries
        .iter()
        .enumerate()
        .flat_map(|(i, (key, desc))| {
            let mut spans = vec![
                Span::styled(
                    format!(" {key} "),
                    Style::default()
                        .fg(Color::Black)
                        .bg(ACCENT_COLOR_ACTIVE)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!(" {desc} "), Style::default().fg(SUBTLE_COLOR)),
            ];
            if i < entries.len() - 1 {
                spans.push(Span::raw("  "));
            }
            spans
        })
        .collect::<Vec<_>>();

    let legend = Paragraph::new(Line::from(spans)).alignment(Alignment::Left);
    f.render_widget(legend, area);
}
