use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use zerohr_core::TaskResult;

use crate::app::{App, Focus};
use crate::theme::Theme;

/// Render the result pane: metrics row, document, feedback.
pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let focused = app.focus == Focus::Result;

    let Some(result) = &app.task.result else {
        let placeholder = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "  The generated document will appear here.",
                Style::default().fg(theme.dim),
            )),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border_style(focused))
                .title(" Result "),
        );
        f.render_widget(placeholder, area);
        return;
    };

    let chunks = Layout::vertical([
        Constraint::Length(3), // score / attempts
        Constraint::Min(5),    // document
        Constraint::Length(5), // feedback
    ])
    .split(area);

    render_metrics(f, chunks[0], result, theme);
    render_document(f, chunks[1], app, result, focused);
    render_feedback(f, chunks[2], result, theme);
}

fn render_metrics(f: &mut Frame, area: Rect, result: &TaskResult, theme: &Theme) {
    let line = Line::from(vec![
        Span::styled(" Score: ", Style::default().fg(theme.dim)),
        Span::styled(
            result.score_label(),
            Style::default()
                .fg(theme.score_color(result.score))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("    Attempts: ", Style::default().fg(theme.dim)),
        Span::styled(
            result.attempts_made.to_string(),
            Style::default().fg(theme.text),
        ),
    ]);
    let metrics = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_style(false))
            .title(" Quality "),
    );
    f.render_widget(metrics, area);
}

fn render_document(f: &mut Frame, area: Rect, app: &App, result: &TaskResult, focused: bool) {
    let theme = &app.theme;
    let lines: Vec<Line> = result
        .document
        .lines()
        .map(|l| Line::from(Span::styled(l, Style::default().fg(theme.text))))
        .collect();

    // Keep at least the last line visible when scrolled past the end.
    let max_scroll = lines.len().saturating_sub(1).min(u16::MAX as usize) as u16;
    let scroll = app.doc_scroll.min(max_scroll);

    let document = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border_style(focused))
                .title(" Document "),
        )
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    f.render_widget(document, area);
}

fn render_feedback(f: &mut Frame, area: Rect, result: &TaskResult, theme: &Theme) {
    let text = if result.feedback.is_empty() {
        Span::styled("-", Style::default().fg(theme.dim))
    } else {
        Span::styled(result.feedback.as_str(), Style::default().fg(theme.text))
    };
    let feedback = Paragraph::new(Line::from(text))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border_style(false))
                .title(" Feedback "),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(feedback, area);
}
