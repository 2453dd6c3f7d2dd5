use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

use crate::session::{INPUT_PANE_HEIGHT, Session};

/// Draws the chat log above a fixed-height input pane.
pub fn render(frame: &mut Frame, session: &Session) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),                    // Chat log
            Constraint::Length(INPUT_PANE_HEIGHT), // Input line
        ])
        .split(frame.area());

    let lines: Vec<ListItem> = session
        .visible_lines()
        .iter()
        .map(|line| ListItem::new(line.as_str()))
        .collect();
    let log = List::new(lines).block(Block::default().borders(Borders::ALL).title("CHAT LOG"));
    frame.render_widget(log, chunks[0]);

    // Input is ASCII, so one character is one column. Scroll so the cursor stays inside.
    let width = usize::from(chunks[1].width.saturating_sub(2));
    let scroll = session.cursor().saturating_sub(width.saturating_sub(1));
    let column = u16::try_from(session.cursor() - scroll).unwrap_or(u16::MAX);

    let input = Paragraph::new(session.input())
        .scroll((0, u16::try_from(scroll).unwrap_or(u16::MAX)))
        .block(Block::default().borders(Borders::ALL).title("CHAT INPUT"));
    frame.render_widget(input, chunks[1]);

    frame.set_cursor_position((chunks[1].x + 1 + column, chunks[1].y + 1));
}
