use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use super::{App, Mode};
use crate::view::{Row, RowKind};

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(f.area());

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[0]);

    render_tree(f, app, panes[0]);
    render_code(f, app, panes[1]);
    render_status(f, app, chunks[1]);

    if app.mode == Mode::Help {
        render_help(f);
    }
}

fn row_style(row: &Row, editing: bool) -> Style {
    match &row.kind {
        _ if editing => Style::default().fg(Color::Black).bg(Color::Yellow),
        RowKind::Node {
            expandable: false, ..
        } => Style::default().fg(Color::DarkGray),
        RowKind::Node { .. } => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
        RowKind::Label { .. } => Style::default().fg(Color::Gray),
        RowKind::Field { editable: true, .. } => Style::default().fg(Color::Green),
        RowKind::Field { .. } | RowKind::Opaque { .. } => Style::default(),
    }
}

fn render_tree(f: &mut Frame, app: &mut App, area: Rect) {
    let items: Vec<ListItem> = app
        .rows
        .iter()
        .map(|row| {
            let editing = app.editing.is_some() && row.field_target() == app.editing.as_ref();
            ListItem::new(format!("{}{}", "  ".repeat(row.depth), row.label()))
                .style(row_style(row, editing))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().title(" Tree ").borders(Borders::ALL))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("▶ ");

    f.render_stateful_widget(list, area, &mut app.list_state);
}

fn render_code(f: &mut Frame, app: &App, area: Rect) {
    let (title, border) = match app.editor.last_error() {
        Some(_) => (" Code (stale) ", Style::default().fg(Color::Red)),
        None => (" Code ", Style::default()),
    };
    let mut lines: Vec<Line> = app.editor.code().lines().map(Line::from).collect();
    if let Some(error) = app.editor.last_error() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        )));
    }
    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border),
    );
    f.render_widget(paragraph, area);
}

fn render_status(f: &mut Frame, app: &App, area: Rect) {
    let hint = match app.mode {
        Mode::Browse => "↑/↓ move  Enter toggle/edit  h help  q quit",
        Mode::Edit => "←/→ choose  ↑/↓ step  type to edit  Space flip  Esc done",
        Mode::Help => "Esc close help",
    };
    let status = Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" {} ", app.status),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(hint, Style::default().fg(Color::DarkGray)),
    ]))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(status, area);
}

fn render_help(f: &mut Frame) {
    let area = f.area();
    let block = Block::default()
        .title(" Treedit Browser - Help ")
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Yellow));

    let help_text = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Treedit Browser Help",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Tree:"),
        Line::from("  ↑/↓        - Move selection"),
        Line::from("  Enter/Space - Expand or collapse a node, or edit a field"),
        Line::from(""),
        Line::from("Editing a field:"),
        Line::from("  ←/→        - Cycle choices"),
        Line::from("  ↑/↓        - Step numbers"),
        Line::from("  typing     - Edit text and number buffers"),
        Line::from("  Space      - Flip a toggle"),
        Line::from("  Esc/Enter  - Finish editing"),
        Line::from(""),
        Line::from("General:"),
        Line::from("  h/F1       - Show this help"),
        Line::from("  q          - Quit"),
        Line::from(""),
        Line::from("Press Esc or q to close this help screen"),
    ];

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .wrap(Wrap { trim: true });

    let popup_area = centered_rect(70, 80, area);
    f.render_widget(Clear, popup_area);
    f.render_widget(paragraph, popup_area);
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
