use edtui::{EditorTheme, EditorView};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::app::{App, Focus};
use crate::theme::Theme;
use crate::view::spinner_char;

/// Render the left column: request editor, agent card, status line.
pub fn render(f: &mut Frame, area: Rect, app: &mut App) {
    let chunks = Layout::vertical([
        Constraint::Min(5),    // editor
        Constraint::Length(3), // agent card
        Constraint::Length(4), // status
    ])
    .split(area);

    render_editor(f, chunks[0], app);
    render_agent(f, chunks[1], app);
    render_status(f, chunks[2], app);
}

fn render_editor(f: &mut Frame, area: Rect, app: &mut App) {
    let focused = app.focus == Focus::Editor;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.border_style(focused))
        .title(" Request ");

    if app.editor.is_blank() && !focused {
        let placeholder = Paragraph::new(Line::from(Span::styled(
            "Candidate, role, contract level, salary...",
            Style::default().fg(app.theme.dim),
        )))
        .block(block);
        f.render_widget(placeholder, area);
        return;
    }

    let show_cursor = focused && !app.show_help;
    let editor_theme = request_editor_theme(&app.theme, block, show_cursor);
    f.render_widget(
        EditorView::new(app.editor.state_mut())
            .theme(editor_theme)
            .wrap(true),
        area,
    );
}

fn request_editor_theme<'a>(theme: &Theme, block: Block<'a>, show_cursor: bool) -> EditorTheme<'a> {
    let base = Style::default().fg(theme.text);
    let cursor = if show_cursor {
        Style::default().fg(theme.header_fg).bg(theme.focused_border)
    } else {
        base
    };
    EditorTheme::default()
        .base(base)
        .cursor_style(cursor)
        .selection_style(Style::default().bg(theme.border))
        .block(block)
        .hide_status_line()
}

fn render_agent(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let line = if app.task.is_loading() {
        Line::from(vec![
            Span::styled(
                format!(" {} ", spinner_char(app.tick)),
                Style::default().fg(theme.spinner),
            ),
            Span::styled(
                "Agent working",
                Style::default().fg(theme.active).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                app.task
                    .task_id
                    .as_ref()
                    .map(|id| format!("  task {id}"))
                    .unwrap_or_default(),
                Style::default().fg(theme.dim),
            ),
        ])
    } else {
        Line::from(Span::styled(
            " Waiting for input...",
            Style::default().fg(theme.dim),
        ))
    };

    let card = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_style(false))
            .title(" Agent "),
    );
    f.render_widget(card, area);
}

fn render_status(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let mut lines = vec![Line::from(vec![
        Span::styled("Status: ", Style::default().fg(theme.dim)),
        Span::styled(
            app.task.status_text(),
            Style::default().fg(theme.phase_color(app.task.phase)),
        ),
    ])];
    if let Some(notice) = &app.clipboard_notice {
        lines.push(Line::from(Span::styled(
            notice.as_str(),
            Style::default().fg(theme.dim),
        )));
    }

    let status = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border_style(false))
                .title(" Session "),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(status, area);
}
