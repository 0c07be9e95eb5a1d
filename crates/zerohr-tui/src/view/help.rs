use ratatui::Frame;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::theme::Theme;

/// Render the help overlay as a centered popup.
pub fn render(f: &mut Frame, theme: &Theme) {
    let popup = centered_rect(62, 24, f.area());

    let lines = vec![
        Line::from(Span::styled(" Keyboard Shortcuts ", theme.header_style())),
        Line::from(""),
        section_header("Task", theme),
        key_line("Ctrl+s / F5", "Generate document", theme),
        key_line("Ctrl+x / Esc", "Cancel running task", theme),
        key_line("Ctrl+r", "Reset session", theme),
        key_line("Ctrl+y", "Copy document", theme),
        Line::from(""),
        section_header("Request", theme),
        key_line("Enter", "New line", theme),
        key_line("Ctrl+l", "Clear request", theme),
        key_line("Tab", "Switch to result pane", theme),
        Line::from(""),
        section_header("Result", theme),
        key_line("↑ / ↓", "Scroll", theme),
        key_line("Ctrl+u / PgUp", "Page up", theme),
        key_line("Ctrl+d / PgDn", "Page down", theme),
        key_line("Home / End", "Top / bottom", theme),
        Line::from(""),
        section_header("Global", theme),
        key_line("F1", "Toggle this help", theme),
        key_line("Ctrl+c / Ctrl+q", "Quit", theme),
    ];

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.active))
                .title(" Help "),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup);
    f.render_widget(paragraph, popup);
}

fn section_header<'a>(title: &'a str, theme: &Theme) -> Line<'a> {
    Line::from(Span::styled(
        format!("  {title}"),
        Style::default()
            .fg(theme.active)
            .add_modifier(Modifier::BOLD),
    ))
}

fn key_line<'a>(key: &'a str, desc: &'a str, theme: &Theme) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("    {key:<18}"), Style::default().fg(theme.text)),
        Span::styled(desc, Style::default().fg(theme.dim)),
    ])
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .split(area);
    Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .split(vertical[0])[0]
}
