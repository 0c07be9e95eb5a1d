use ratatui::style::{Color, Modifier, Style};

use zerohr_core::Phase;

/// Color theme for the TUI.
pub struct Theme {
    pub ok: Color,
    pub error: Color,
    pub warning: Color,
    pub cancelled: Color,

    pub header_fg: Color,
    pub header_bg: Color,
    pub border: Color,
    pub focused_border: Color,
    pub text: Color,
    pub dim: Color,
    pub active: Color,
    pub spinner: Color,
    pub footer_fg: Color,
    pub footer_bg: Color,
}

impl Theme {
    pub fn zerohr() -> Self {
        Self {
            ok: Color::Green,
            error: Color::Red,
            warning: Color::Yellow,
            cancelled: Color::Magenta,

            header_fg: Color::Black,
            header_bg: Color::Cyan,
            border: Color::DarkGray,
            focused_border: Color::Cyan,
            text: Color::White,
            dim: Color::DarkGray,
            active: Color::Cyan,
            spinner: Color::Cyan,
            footer_fg: Color::DarkGray,
            footer_bg: Color::Reset,
        }
    }

    pub fn phase_color(&self, phase: Phase) -> Color {
        match phase {
            Phase::Idle => self.dim,
            Phase::Submitting | Phase::Polling | Phase::Completing => self.active,
            Phase::Done => self.ok,
            Phase::CancelledByUser => self.cancelled,
            Phase::Error => self.error,
        }
    }

    /// Green at the top of the scale, yellow in the middle, red below.
    pub fn score_color(&self, score: f64) -> Color {
        if score >= 7.0 {
            self.ok
        } else if score >= 5.0 {
            self.warning
        } else {
            self.error
        }
    }

    pub fn header_style(&self) -> Style {
        Style::default()
            .fg(self.header_fg)
            .bg(self.header_bg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border_style(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.focused_border)
        } else {
            Style::default().fg(self.border)
        }
    }

    pub fn footer_style(&self) -> Style {
        Style::default().fg(self.footer_fg).bg(self.footer_bg)
    }
}
