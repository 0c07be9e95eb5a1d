pub mod help;
pub mod request;
pub mod result;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::app::{App, Focus};
use crate::theme::Theme;

/// Spinner frames for animated progress indication.
const SPINNER_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Get the current spinner character based on a tick counter.
pub fn spinner_char(tick: usize) -> char {
    SPINNER_FRAMES[tick % SPINNER_FRAMES.len()]
}

/// Truncate a string to fit in `max_width` columns, appending "…" if truncated.
pub fn truncate(s: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    if s.chars().count() <= max_width {
        return s.to_string();
    }
    let mut truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

/// Render the whole screen: header, request column, result pane, footer.
pub fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();

    let chunks = Layout::vertical([
        Constraint::Length(1), // header
        Constraint::Min(10),   // body
        Constraint::Length(1), // footer
    ])
    .split(area);

    render_header(f, chunks[0], app);

    let body = Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[1]);
    request::render(f, body[0], app);
    result::render(f, body[1], app);

    render_footer(f, chunks[2], app.focus, &app.theme);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let phase = app.task.phase;
    let url_width = (area.width as usize).saturating_sub(30);
    let header = Line::from(vec![
        Span::styled(" ZEROHR ", theme.header_style()),
        Span::styled(" ", Style::default()),
        Span::styled(
            phase.label(),
            Style::default()
                .fg(theme.phase_color(phase))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {}", truncate(&app.backend_url, url_width)),
            Style::default().fg(theme.dim),
        ),
    ]);
    f.render_widget(Paragraph::new(header), area);
}

fn render_footer(f: &mut Frame, area: Rect, focus: Focus, theme: &Theme) {
    let hints = match focus {
        Focus::Editor => " ^S:generate  ^X:cancel  ^L:clear  ^R:reset  Tab:result  F1:help  ^C:quit",
        Focus::Result => " ↑/↓:scroll  PgUp/PgDn:page  ^Y:copy  ^X:cancel  Tab:request  F1:help  ^C:quit",
    };
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(hints, theme.footer_style()))),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use zerohr_core::{ControllerEvent, TaskEvent, TaskId, TaskResult};

    fn rendered(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| app.view(f)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn feed(app: &mut App, event: TaskEvent) {
        app.handle_controller_event(ControllerEvent {
            generation: 1,
            event,
        });
    }

    #[test]
    fn idle_screen_shows_placeholder_and_no_spinner() {
        let mut app = App::new("http://127.0.0.1:8000".into(), None);
        let screen = rendered(&mut app);
        assert!(screen.contains("The generated document will appear here."));
        assert!(screen.contains("Waiting for input..."));
        assert!(screen.contains("Status: Ready"));
        assert!(!screen.contains("Agent working"));
    }

    #[test]
    fn polling_screen_shows_spinner() {
        let mut app = App::new("http://127.0.0.1:8000".into(), Some("Mario Rossi"));
        feed(&mut app, TaskEvent::Submitting);
        feed(
            &mut app,
            TaskEvent::Started {
                task_id: TaskId::new("abc"),
            },
        );
        let screen = rendered(&mut app);
        assert!(screen.contains(&format!("{} Agent working", spinner_char(0))));
        assert!(screen.contains("task abc"));
        assert!(screen.contains("Mario Rossi"));
        assert!(!screen.contains("Waiting for input..."));
    }

    #[test]
    fn completed_screen_shows_document_and_score_out_of_ten() {
        let mut app = App::new("http://127.0.0.1:8000".into(), None);
        feed(&mut app, TaskEvent::Submitting);
        feed(
            &mut app,
            TaskEvent::Started {
                task_id: TaskId::new("abc"),
            },
        );
        feed(
            &mut app,
            TaskEvent::Completed {
                result: TaskResult {
                    document: "DOC...".into(),
                    score: 8.0,
                    attempts_made: 1,
                    feedback: "ok".into(),
                },
            },
        );
        feed(
            &mut app,
            TaskEvent::Finalized {
                outcome: zerohr_core::FinalizeOutcome::Sent,
            },
        );

        let screen = rendered(&mut app);
        assert!(screen.contains("Score: 8 / 10"));
        assert!(screen.contains("Attempts: 1"));
        assert!(screen.contains("DOC..."));
        assert!(!screen.contains("The generated document will appear here."));
        assert!(screen.contains("Waiting for input..."));
    }

    #[test]
    fn truncate_counts_chars() {
        assert_eq!(truncate("Niccolò", 10), "Niccolò");
        assert_eq!(truncate("Niccolò Rossi", 6), "Nicco…");
        assert_eq!(truncate("abc", 0), "");
    }

    #[test]
    fn spinner_wraps() {
        assert_eq!(spinner_char(0), spinner_char(SPINNER_FRAMES.len()));
    }
}
