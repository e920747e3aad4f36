//! Terminal UI rendering with ratatui

use blockfall::board::{BOARD_HEIGHT, BOARD_WIDTH};
use blockfall::snapshot::{PhaseView, Snapshot};
use blockfall::tetromino::TetrominoType;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const EMPTY: &str = "  ";
const BLOCK: &str = "██";
const GHOST: &str = "░░";

/// Total width needed: board(22) + next/stats(16) = 38
const GAME_WIDTH: u16 = 38;
/// Total height needed: board(20) + 2 for borders = 22
const GAME_HEIGHT: u16 = 22;

/// Display color for a piece type
fn color(kind: TetrominoType) -> Color {
    match kind {
        TetrominoType::I => Color::Cyan,
        TetrominoType::O => Color::Yellow,
        TetrominoType::T => Color::Magenta,
        TetrominoType::S => Color::Green,
        TetrominoType::Z => Color::Red,
        TetrominoType::J => Color::Blue,
        TetrominoType::L => Color::Rgb(255, 165, 0), // Orange
    }
}

/// Render one frame of the game
pub fn render_game(frame: &mut Frame, snapshot: &Snapshot, show_ghost: bool) {
    let area = frame.area();

    // Center the game area
    let game_area = center_rect(area, GAME_WIDTH, GAME_HEIGHT);

    // Create main layout: board | next + stats
    let main_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(22), // Board (10*2 + 2 for borders)
            Constraint::Length(16), // Next piece + stats
        ])
        .split(game_area);

    render_board(frame, main_layout[0], snapshot, show_ghost);

    let right_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Next piece (2 rows + borders)
            Constraint::Min(6),    // Stats
        ])
        .split(main_layout[1]);

    render_next(frame, right_layout[0], snapshot);
    render_stats(frame, right_layout[1], snapshot);

    // Overlays
    match snapshot.phase {
        PhaseView::Initial => render_overlay(frame, area, "BLOCKFALL", "Enter to start"),
        PhaseView::Paused => render_overlay(frame, area, "PAUSED", "Press P to resume"),
        PhaseView::Finished => render_overlay(frame, area, "GAME OVER", "R to play again"),
        _ => {}
    }
}

/// Center a rect within another rect
fn center_rect(area: Rect, width: u16, height: u16) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Render the next piece box
fn render_next(frame: &mut Frame, area: Rect, snapshot: &Snapshot) {
    let block = Block::default()
        .title(" NEXT ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let style = Style::default().fg(color(snapshot.next));
    let lines: Vec<Line> = snapshot
        .next_preview
        .iter()
        .map(|row| {
            Line::from(
                row.iter()
                    .map(|&filled| {
                        if filled {
                            Span::styled(BLOCK, style)
                        } else {
                            Span::raw(EMPTY)
                        }
                    })
                    .collect::<Vec<_>>(),
            )
        })
        .collect();

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(paragraph, inner);
}

/// Render the game board
fn render_board(frame: &mut Frame, area: Rect, snapshot: &Snapshot, show_ghost: bool) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let active_style = snapshot
        .active_kind
        .map(|kind| Style::default().fg(color(kind)))
        .unwrap_or_default();
    let struck = snapshot.phase.struck_rows();
    let show_ghost = show_ghost && snapshot.phase.is_playing();

    let mut lines: Vec<Line> = Vec::with_capacity(BOARD_HEIGHT);
    for (row, cells) in snapshot.grid.iter().enumerate() {
        let flashing = struck.contains(&row);
        let mut spans = Vec::with_capacity(BOARD_WIDTH);

        for (col, cell) in cells.iter().enumerate() {
            let (r, c) = (row as i32, col as i32);
            let (text, style) = if snapshot.is_active(r, c) {
                (BLOCK, active_style)
            } else if flashing {
                (BLOCK, Style::default().fg(Color::White).bold())
            } else if cell.is_filled() {
                (BLOCK, Style::default().fg(Color::DarkGray))
            } else if show_ghost && snapshot.is_ghost(r, c) {
                (GHOST, active_style.dim())
            } else {
                (EMPTY, Style::default())
            };
            spans.push(Span::styled(text, style));
        }

        lines.push(Line::from(spans));
    }

    let paragraph = Paragraph::new(lines);
    frame.render_widget(paragraph, inner);
}

/// Render stats panel
fn render_stats(frame: &mut Frame, area: Rect, snapshot: &Snapshot) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = vec![
        Line::from(Span::styled("SCORE", Style::default().fg(Color::Gray))),
        Line::from(Span::styled(
            format!("{}", snapshot.points),
            Style::default().fg(Color::Yellow).bold(),
        )),
        Line::raw(""),
        Line::from(Span::styled("LINES", Style::default().fg(Color::Gray))),
        Line::from(Span::styled(
            format!("{}", snapshot.lines),
            Style::default().fg(Color::Green),
        )),
    ];

    let paragraph = Paragraph::new(lines);
    frame.render_widget(paragraph, inner);
}

/// Render an overlay (for start/pause/game over)
fn render_overlay(frame: &mut Frame, area: Rect, title: &str, subtitle: &str) {
    let popup_width = 24u16;
    let popup_height = 5u16;
    let popup_area = center_rect(area, popup_width, popup_height);

    // Clear the background
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::Black));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let text = vec![
        Line::styled(title, Style::default().fg(Color::Yellow).bold()),
        Line::raw(""),
        Line::styled(subtitle, Style::default().fg(Color::Gray)),
    ];

    let paragraph = Paragraph::new(text).alignment(Alignment::Center);
    frame.render_widget(paragraph, inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockfall::game::{Command, Game, Timing};
    use ratatui::{backend::TestBackend, Terminal};

    fn draw(snapshot: &Snapshot) -> ratatui::buffer::Buffer {
        let mut terminal = Terminal::new(TestBackend::new(60, 26)).unwrap();
        terminal
            .draw(|frame| render_game(frame, snapshot, true))
            .unwrap();
        terminal.backend().buffer().clone()
    }

    fn text(buffer: &ratatui::buffer::Buffer) -> String {
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_center_rect() {
        let area = Rect::new(0, 0, 100, 40);
        assert_eq!(center_rect(area, 38, 22), Rect::new(31, 9, 38, 22));
        // Never larger than the area
        assert_eq!(center_rect(Rect::new(0, 0, 10, 5), 38, 22), Rect::new(0, 0, 10, 5));
    }

    #[test]
    fn test_initial_overlay() {
        let game = Game::new(Timing::default(), 3);
        let rendered = text(&draw(&game.snapshot()));
        assert!(rendered.contains("BLOCKFALL"));
        assert!(rendered.contains("NEXT"));
    }

    #[test]
    fn test_running_has_no_overlay() {
        let mut game = Game::new(Timing::default(), 3);
        game.handle(Command::Start);
        let rendered = text(&draw(&game.snapshot()));
        assert!(!rendered.contains("BLOCKFALL"));
        assert!(rendered.contains("SCORE"));
        // The active piece is drawn
        assert!(rendered.contains('█'));
    }
}
