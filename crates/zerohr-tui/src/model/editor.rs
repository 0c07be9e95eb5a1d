use edtui::{EditorEventHandler, EditorMode, EditorState, Lines};
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// The request field: an edtui buffer kept in insert mode.
///
/// Esc never reaches edtui (it means "back" here), so the buffer does not
/// fall into normal mode and keystrokes always edit text.
pub struct RequestEditor {
    state: EditorState,
    events: EditorEventHandler,
}

impl Default for RequestEditor {
    fn default() -> Self {
        Self {
            state: insert_mode_state(),
            events: EditorEventHandler::default(),
        }
    }
}

impl RequestEditor {
    /// Editor holding `text` with the cursor after its last character.
    pub fn with_text(text: &str) -> Self {
        let mut editor = Self::default();
        editor.paste(text);
        editor
    }

    pub fn text(&self) -> String {
        self.state.lines.to_string()
    }

    pub fn is_blank(&self) -> bool {
        self.text().trim().is_empty()
    }

    pub fn clear(&mut self) {
        self.state = insert_mode_state();
    }

    /// Forward one key to the buffer.
    pub fn key(&mut self, code: KeyCode) {
        self.events
            .on_key_event(KeyEvent::new(code, KeyModifiers::NONE), &mut self.state);
    }

    /// Type `text` as if it were keyed in. Line breaks become Enter.
    pub fn paste(&mut self, text: &str) {
        for c in text.chars() {
            match c {
                '\r' => {}
                '\n' => self.key(KeyCode::Enter),
                c => self.key(KeyCode::Char(c)),
            }
        }
    }

    /// Mutable state for [`edtui::EditorView`], which tracks the view offset.
    pub fn state_mut(&mut self) -> &mut EditorState {
        &mut self.state
    }
}

fn insert_mode_state() -> EditorState {
    let mut state = EditorState::new(Lines::from(""));
    state.mode = EditorMode::Insert;
    state
}
