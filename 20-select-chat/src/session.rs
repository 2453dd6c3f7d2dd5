//! Client-side chat state: the scrolling log and the line being typed.
//!
//! Nothing here touches the terminal or the socket. The client loop feeds keyboard input and
//! received payloads in, acts on the returned [`Action`], and renders [`Session::visible_lines`]
//! and [`Session::input`] after every step.

use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers};

use crate::reader::SCRATCH_LEN;

/// Height of the input pane, borders included.
pub const INPUT_PANE_HEIGHT: u16 = 3;

/// Longest line the input buffer holds; one submitted line fits in one read on the far side.
pub const INPUT_CAPACITY: usize = SCRATCH_LEN;

/// Typing exactly this ends the session without sending anything.
pub const QUIT_COMMAND: &str = "quit";

/// Shown in the log when a submitted line could not be sent.
pub const SEND_FAILED_NOTICE: &str = "Couldn't send the message";

/// Rows a bordered pane loses to its top and bottom edges.
const BORDER_ROWS: usize = 2;

/// Punctuation accepted besides ASCII letters and digits.
const SYMBOLS: &str = "!@#$%^&*()_+\\`~=[]{}|;':\",./<>? ";

/// Keyboard and terminal input, reduced to what the session reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Char(char),
    Backspace,
    Submit,
    Left,
    Right,
    Interrupt,
    Resize { rows: u16 },
    Ignored,
}

impl From<&Event> for Input {
    fn from(event: &Event) -> Self {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Release => Input::Ignored,
            Event::Key(key) => match key.code {
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    Input::Interrupt
                }
                KeyCode::Char(_) if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    Input::Ignored
                }
                KeyCode::Char(c) => Input::Char(c),
                KeyCode::Backspace => Input::Backspace,
                KeyCode::Enter => Input::Submit,
                KeyCode::Left => Input::Left,
                KeyCode::Right => Input::Right,
                _ => Input::Ignored,
            },
            Event::Resize(_, rows) => Input::Resize { rows: *rows },
            _ => Input::Ignored,
        }
    }
}

/// What the client loop must do after an input was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Continue,
    Send(String),
    Quit,
}

/// Whether `c` may be typed into the input buffer.
pub fn is_printable(c: char) -> bool {
    c.is_ascii_alphanumeric() || SYMBOLS.contains(c)
}

/// Append-only list of lines plus the index of the first one on screen.
#[derive(Debug, Default)]
pub struct ChatLog {
    lines: Vec<String>,
    offset: usize,
    visible_rows: usize,
}

impl ChatLog {
    pub fn new(visible_rows: usize) -> Self {
        Self {
            lines: Vec::with_capacity(visible_rows),
            offset: 0,
            visible_rows,
        }
    }

    /// Appends a line, scrolling by one if the pane is already full.
    pub fn push(&mut self, line: String) {
        self.lines.push(line);
        if self.lines.len() - self.offset > self.visible_rows {
            self.offset += 1;
        }
    }

    /// Changes the pane size, keeping the newest lines in view.
    pub fn set_visible_rows(&mut self, visible_rows: usize) {
        self.visible_rows = visible_rows;
        self.offset = self.lines.len().saturating_sub(visible_rows);
    }

    /// Makes sure storage can hold at least `rows` lines without reallocating.
    pub fn reserve_rows(&mut self, rows: usize) {
        if self.lines.capacity() < rows {
            self.lines.reserve(rows - self.lines.len());
        }
    }

    pub fn visible(&self) -> &[String] {
        let end = self.lines.len().min(self.offset + self.visible_rows);
        &self.lines[self.offset..end]
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn visible_rows(&self) -> usize {
        self.visible_rows
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lines.capacity()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

/// Bounded single-line editor. Only ASCII is accepted, so byte and char positions agree.
#[derive(Debug)]
pub struct InputLine {
    text: String,
    cursor: usize,
    capacity: usize,
}

impl InputLine {
    pub fn new(capacity: usize) -> Self {
        Self {
            text: String::with_capacity(capacity),
            cursor: 0,
            capacity,
        }
    }

    /// Inserts at the cursor. Returns `false` (and drops the char) when full or not printable.
    pub fn insert(&mut self, c: char) -> bool {
        if !is_printable(c) || self.text.len() >= self.capacity {
            return false;
        }
        self.text.insert(self.cursor, c);
        self.cursor += 1;
        true
    }

    /// Deletes the char before the cursor; nothing happens at the start of the line.
    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        self.text.remove(self.cursor);
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.len());
    }

    /// Empties the buffer, returning what was typed.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Log, input and layout for one connected client.
#[derive(Debug)]
pub struct Session {
    log: ChatLog,
    input: InputLine,
    rows: u16,
}

impl Session {
    /// Creates a session for a terminal `rows` tall.
    pub fn new(rows: u16) -> Self {
        let mut log = ChatLog::new(log_rows(rows));
        log.reserve_rows(usize::from(rows));
        Self {
            log,
            input: InputLine::new(INPUT_CAPACITY),
            rows,
        }
    }

    pub fn apply(&mut self, input: Input) -> Action {
        match input {
            Input::Char(c) => {
                self.input.insert(c);
            }
            Input::Backspace => self.input.backspace(),
            Input::Left => self.input.left(),
            Input::Right => self.input.right(),
            Input::Submit => return self.submit(),
            Input::Interrupt => return Action::Quit,
            Input::Resize { rows } => self.resize(rows),
            Input::Ignored => {}
        }
        Action::Continue
    }

    fn submit(&mut self) -> Action {
        if self.input.is_empty() {
            return Action::Continue;
        }
        if self.input.as_str() == QUIT_COMMAND {
            return Action::Quit;
        }
        Action::Send(self.input.take())
    }

    /// Recomputes the layout for a terminal that is now `rows` tall.
    pub fn resize(&mut self, rows: u16) {
        self.rows = rows;
        self.log.reserve_rows(usize::from(rows));
        self.log.set_visible_rows(log_rows(rows));
    }

    /// Appends one received message as a log line.
    pub fn receive(&mut self, payload: &[u8]) {
        let text = String::from_utf8_lossy(payload);
        self.log.push(text.trim_end_matches(['\r', '\n']).to_string());
    }

    /// Appends a local status line.
    pub fn announce(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
    }

    pub fn send_failed(&mut self) {
        self.announce(SEND_FAILED_NOTICE);
    }

    pub fn visible_lines(&self) -> &[String] {
        self.log.visible()
    }

    pub fn input(&self) -> &str {
        self.input.as_str()
    }

    pub fn cursor(&self) -> usize {
        self.input.cursor()
    }

    pub fn log(&self) -> &ChatLog {
        &self.log
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }
}

/// Text rows available inside the bordered log pane.
fn log_rows(rows: u16) -> usize {
    usize::from(rows.saturating_sub(INPUT_PANE_HEIGHT)).saturating_sub(BORDER_ROWS)
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyEvent;

    use super::*;

    fn type_text(session: &mut Session, text: &str) {
        for c in text.chars() {
            assert_eq!(session.apply(Input::Char(c)), Action::Continue);
        }
    }

    fn key(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn printable_set_matches_allow_list() {
        for c in ['a', 'Z', '7', ' ', '!', '?', '~', '"', '\\', '%', '{'] {
            assert!(is_printable(c), "{c:?} should be accepted");
        }
        for c in ['\t', '\n', '\u{7f}', 'é', '-'] {
            assert!(!is_printable(c), "{c:?} should be rejected");
        }
    }

    #[test]
    fn submit_sends_and_clears() {
        let mut session = Session::new(24);
        type_text(&mut session, "hello");

        assert_eq!(session.apply(Input::Submit), Action::Send("hello".into()));
        assert_eq!(session.input(), "");
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn sender_log_is_unaffected_by_own_message() {
        let mut session = Session::new(24);
        session.announce("Connected to 127.0.0.1");
        type_text(&mut session, "hello");
        session.apply(Input::Submit);

        assert_eq!(session.log().lines(), ["Connected to 127.0.0.1"]);
    }

    #[test]
    fn empty_submit_is_a_no_op() {
        let mut session = Session::new(24);

        assert_eq!(session.apply(Input::Submit), Action::Continue);
        assert!(session.log().is_empty());
        assert_eq!(session.input(), "");
    }

    #[test]
    fn quit_ends_session_without_sending() {
        let mut session = Session::new(24);
        type_text(&mut session, QUIT_COMMAND);
        assert_eq!(session.apply(Input::Submit), Action::Quit);
    }

    #[test]
    fn quit_must_match_exactly() {
        let mut session = Session::new(24);
        type_text(&mut session, "quit now");
        assert_eq!(session.apply(Input::Submit), Action::Send("quit now".into()));

        type_text(&mut session, "Quit");
        assert_eq!(session.apply(Input::Submit), Action::Send("Quit".into()));
    }

    #[test]
    fn backspace_at_start_is_clamped() {
        let mut session = Session::new(24);
        session.apply(Input::Backspace);
        assert_eq!(session.cursor(), 0);

        type_text(&mut session, "ab");
        session.apply(Input::Backspace);
        session.apply(Input::Backspace);
        session.apply(Input::Backspace);
        assert_eq!(session.input(), "");
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn editing_happens_at_the_cursor() {
        let mut session = Session::new(24);
        type_text(&mut session, "helo");
        session.apply(Input::Left);
        type_text(&mut session, "l");
        assert_eq!(session.input(), "hello");
        assert_eq!(session.cursor(), 4);

        session.apply(Input::Right);
        session.apply(Input::Right);
        assert_eq!(session.cursor(), 5);

        session.apply(Input::Left);
        session.apply(Input::Backspace);
        assert_eq!(session.input(), "helo");
    }

    #[test]
    fn overflow_drops_characters() {
        let mut line = InputLine::new(3);
        assert!(line.insert('a'));
        assert!(line.insert('b'));
        assert!(line.insert('c'));
        assert!(!line.insert('d'));
        assert_eq!(line.as_str(), "abc");
        assert_eq!(line.cursor(), 3);
    }

    #[test]
    fn unprintable_characters_are_dropped() {
        let mut session = Session::new(24);
        session.apply(Input::Char('\t'));
        session.apply(Input::Char('é'));
        assert!(session.input().is_empty());
    }

    #[test]
    fn log_scrolls_once_the_pane_is_full() {
        // 10 rows: 3 for input, 2 log borders, 5 visible lines.
        let mut session = Session::new(10);
        for i in 0..5 {
            session.receive(format!("line {i}").as_bytes());
        }
        assert_eq!(session.log().offset(), 0);

        session.receive(b"line 5");
        assert_eq!(session.log().offset(), 1);
        assert_eq!(session.visible_lines().first().map(String::as_str), Some("line 1"));
        assert_eq!(session.visible_lines().last().map(String::as_str), Some("line 5"));
        assert_eq!(session.log().len(), 6);
    }

    #[test]
    fn received_payload_drops_trailing_newlines() {
        let mut session = Session::new(24);
        session.receive(b"hello\r\n");
        assert_eq!(session.visible_lines(), ["hello"]);
    }

    #[test]
    fn resize_recomputes_pane_and_grows_storage() {
        let mut session = Session::new(10);
        for i in 0..8 {
            session.receive(format!("{i}").as_bytes());
        }
        assert_eq!(session.visible_lines().len(), 5);

        session.apply(Input::Resize { rows: 40 });
        assert_eq!(session.rows(), 40);
        assert_eq!(session.log().visible_rows(), 35);
        assert!(session.log().capacity() >= 40);
        assert_eq!(session.log().offset(), 0);
        assert_eq!(session.visible_lines().len(), 8);

        session.apply(Input::Resize { rows: 7 });
        assert_eq!(session.visible_lines(), ["6", "7"]);
        assert!(session.log().offset() <= session.log().len());
    }

    #[test]
    fn tiny_terminal_keeps_offset_in_bounds() {
        let mut session = Session::new(2);
        session.receive(b"a");
        session.receive(b"b");
        assert!(session.visible_lines().is_empty());
        assert_eq!(session.log().offset(), session.log().len());
    }

    #[test]
    fn send_failure_is_logged() {
        let mut session = Session::new(24);
        session.send_failed();
        assert_eq!(session.visible_lines(), [SEND_FAILED_NOTICE]);
    }

    #[test]
    fn terminal_events_map_to_inputs() {
        let none = KeyModifiers::NONE;
        assert_eq!(Input::from(&key(KeyCode::Char('x'), none)), Input::Char('x'));
        assert_eq!(
            Input::from(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Input::Interrupt
        );
        assert_eq!(
            Input::from(&key(KeyCode::Char('a'), KeyModifiers::CONTROL)),
            Input::Ignored
        );
        assert_eq!(Input::from(&key(KeyCode::Enter, none)), Input::Submit);
        assert_eq!(Input::from(&key(KeyCode::Backspace, none)), Input::Backspace);
        assert_eq!(Input::from(&key(KeyCode::Esc, none)), Input::Ignored);
        assert_eq!(Input::from(&Event::Resize(80, 30)), Input::Resize { rows: 30 });
    }
}
