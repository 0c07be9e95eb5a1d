use ratatui::crossterm::event::KeyCode;
use zerohr_core::{ControllerEvent, CoreError, TaskState};

use crate::action::Action;
use crate::model::editor::RequestEditor;
use crate::theme::Theme;

/// Which pane receives navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Editor,
    Result,
}

/// Side effects the event loop performs on behalf of [`App::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Submit(String),
    Cancel,
    Copy(String),
    ResetSession,
}

/// Main application state.
pub struct App {
    pub editor: RequestEditor,
    pub task: TaskState,
    pub focus: Focus,
    pub backend_url: String,
    /// Outcome of the last copy; independent of the task status.
    pub clipboard_notice: Option<String>,
    pub tick: usize,
    pub theme: Theme,
    pub should_quit: bool,
    pub show_help: bool,
    pub doc_scroll: u16,
    /// Height of the document pane (set on resize, used for page up/down).
    pub visible_rows: usize,
}

impl App {
    pub fn new(backend_url: String, question: Option<&str>) -> Self {
        Self {
            editor: question.map(RequestEditor::with_text).unwrap_or_default(),
            task: TaskState::default(),
            focus: Focus::Editor,
            backend_url,
            clipboard_notice: None,
            tick: 0,
            theme: Theme::zerohr(),
            should_quit: false,
            show_help: false,
            doc_scroll: 0,
            visible_rows: 20,
        }
    }

    /// Process a user action. Returns the effect the event loop should carry out, if any.
    pub fn update(&mut self, action: Action) -> Option<Effect> {
        // When help overlay is shown, only allow a few actions through
        if self.show_help {
            match action {
                Action::Quit => self.should_quit = true,
                Action::ToggleHelp | Action::Back => self.show_help = false,
                Action::Tick => self.tick = self.tick.wrapping_add(1),
                Action::Resize(_w, h) => self.resize(h),
                _ => {} // swallow everything else
            }
            return None;
        }

        match action {
            Action::Quit => self.should_quit = true,
            Action::ToggleHelp => self.show_help = true,
            Action::Submit => {
                self.clipboard_notice = None;
                self.doc_scroll = 0;
                return Some(Effect::Submit(self.editor.text()));
            }
            Action::Cancel => return self.cancel(),
            Action::Back => {
                if self.focus == Focus::Result {
                    self.focus = Focus::Editor;
                } else {
                    return self.cancel();
                }
            }
            Action::ClearInput => self.editor.clear(),
            Action::Copy => {
                let document = self.task.result.as_ref()?.document.clone();
                return Some(Effect::Copy(document));
            }
            Action::ResetSession => {
                self.editor.clear();
                self.clipboard_notice = None;
                self.doc_scroll = 0;
                self.focus = Focus::Editor;
                return Some(Effect::ResetSession);
            }
            Action::ToggleFocus => {
                self.focus = match self.focus {
                    Focus::Editor => Focus::Result,
                    Focus::Result => Focus::Editor,
                };
            }
            Action::MoveUp => match self.focus {
                Focus::Editor => self.editor.key(KeyCode::Up),
                Focus::Result => self.doc_scroll = self.doc_scroll.saturating_sub(1),
            },
            Action::MoveDown => match self.focus {
                Focus::Editor => self.editor.key(KeyCode::Down),
                Focus::Result => self.doc_scroll = self.doc_scroll.saturating_add(1),
            },
            Action::PageUp => {
                let page = self.visible_rows.max(1) as u16;
                self.doc_scroll = self.doc_scroll.saturating_sub(page);
            }
            Action::PageDown => {
                let page = self.visible_rows.max(1) as u16;
                self.doc_scroll = self.doc_scroll.saturating_add(page);
            }
            Action::Home => match self.focus {
                Focus::Editor => self.editor.key(KeyCode::Home),
                Focus::Result => self.doc_scroll = 0,
            },
            Action::End => match self.focus {
                Focus::Editor => self.editor.key(KeyCode::End),
                Focus::Result => {
                    self.doc_scroll = u16::MAX; // clamped by view::result
                }
            },
            // Text editing only applies to the request field.
            Action::MoveLeft if self.focus == Focus::Editor => self.editor.key(KeyCode::Left),
            Action::MoveRight if self.focus == Focus::Editor => self.editor.key(KeyCode::Right),
            Action::Insert(c) if self.focus == Focus::Editor => self.editor.key(KeyCode::Char(c)),
            Action::Paste(text) if self.focus == Focus::Editor => self.editor.paste(&text),
            Action::Newline if self.focus == Focus::Editor => self.editor.key(KeyCode::Enter),
            Action::Backspace if self.focus == Focus::Editor => self.editor.key(KeyCode::Backspace),
            Action::Delete if self.focus == Focus::Editor => self.editor.key(KeyCode::Delete),
            Action::Tick => self.tick = self.tick.wrapping_add(1),
            Action::Resize(_w, h) => self.resize(h),
            _ => {}
        }
        None
    }

    fn cancel(&mut self) -> Option<Effect> {
        self.task.can_cancel().then_some(Effect::Cancel)
    }

    fn resize(&mut self, height: u16) {
        // Rough estimate: total height minus header, footer, metrics and borders
        self.visible_rows = (height as usize).saturating_sub(12);
    }

    /// Apply an event from the task controller.
    pub fn handle_controller_event(&mut self, event: ControllerEvent) {
        if self.task.apply(event) && self.task.result.is_none() {
            self.doc_scroll = 0;
        }
    }

    /// Show why a submit was refused locally.
    pub fn submit_rejected(&mut self, error: &CoreError) {
        self.task.reject(error);
    }

    pub fn copy_finished(&mut self, outcome: std::io::Result<()>) {
        self.clipboard_notice = Some(match outcome {
            Ok(()) => "Document copied to clipboard".to_string(),
            Err(e) => {
                log::warn!("clipboard write failed: {e}");
                "Unable to copy to clipboard".to_string()
            }
        });
    }

    /// Render the current screen. Takes `&mut self` because the editor view
    /// keeps its scroll offset in the editor state.
    pub fn view(&mut self, f: &mut ratatui::Frame) {
        crate::view::render(f, self);

        if self.show_help {
            crate::view::help::render(f, &self.theme);
        }
    }
}
