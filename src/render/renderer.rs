use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};

use crate::game::{GamePhase, GameState, Position};
use crate::metrics::GameMetrics;

/// Everything drawn around the board that is not part of the snapshot
pub struct Hud<'a> {
    pub high_score: u32,
    pub metrics: &'a GameMetrics,
    pub muted: bool,
    /// The round that just ended set a new high score
    pub new_high_score: bool,
}

/// What occupies one board cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Head,
    Body,
    Food,
    Empty,
}

/// Classify a board cell of `state`
pub fn cell_at(state: &GameState, pos: Position) -> Cell {
    if pos == state.snake.head() {
        Cell::Head
    } else if state.is_occupied_by_snake(pos) {
        Cell::Body
    } else if pos == state.food {
        Cell::Food
    } else {
        Cell::Empty
    }
}

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, frame: &mut Frame, state: &GameState, hud: &Hud) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Game area
                Constraint::Length(3), // Footer
            ])
            .split(frame.area());

        let stats = self.render_stats(state, hud);
        frame.render_widget(stats, chunks[0]);

        let game_area = centered(chunks[1], state);

        match state.phase {
            GamePhase::Start => frame.render_widget(self.render_start(hud), game_area),
            GamePhase::Playing => frame.render_widget(self.render_grid(state), game_area),
            GamePhase::GameOver => {
                frame.render_widget(self.render_game_over(state, hud), game_area)
            }
        }

        let controls = self.render_controls(state.phase);
        frame.render_widget(controls, chunks[2]);
    }

    fn render_grid(&self, state: &GameState) -> Paragraph<'_> {
        let mut lines = Vec::with_capacity(state.grid_height);

        for y in 0..state.grid_height {
            let spans: Vec<Span> = (0..state.grid_width)
                .map(|x| match cell_at(state, Position::new(x as i32, y as i32)) {
                    Cell::Head => Span::styled(
                        state.snake.direction.arrow(),
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Cell::Body => Span::styled("■ ", Style::default().fg(Color::Green)),
                    Cell::Food => Span::styled(
                        "● ",
                        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    ),
                    Cell::Empty => Span::styled("· ", Style::default().fg(Color::DarkGray)),
                })
                .collect();

            lines.push(Line::from(spans));
        }

        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Double)
                .border_style(Style::default().fg(Color::White))
                .title(" Snake "),
        )
    }

    fn render_stats(&self, state: &GameState, hud: &Hud) -> Paragraph<'_> {
        let mut spans = vec![
            Span::styled("Score: ", Style::default().fg(Color::Yellow)),
            Span::styled(
                state.score.to_string(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
        ];

        if hud.high_score > 0 {
            spans.push(Span::raw("    "));
            spans.push(Span::styled("High: ", Style::default().fg(Color::Yellow)));
            spans.push(Span::styled(
                hud.high_score.to_string(),
                Style::default().fg(Color::LightYellow),
            ));
        }

        spans.push(Span::raw("    "));
        spans.push(Span::styled("Time: ", Style::default().fg(Color::Yellow)));
        spans.push(Span::styled(
            hud.metrics.format_time(),
            Style::default().fg(Color::White),
        ));

        spans.push(Span::raw("    "));
        spans.push(if hud.muted {
            Span::styled("♪ off", Style::default().fg(Color::DarkGray))
        } else {
            Span::styled("♪ on", Style::default().fg(Color::Green))
        });

        Paragraph::new(vec![Line::from(spans)]).alignment(Alignment::Center)
    }

    fn render_start(&self, hud: &Hud) -> Paragraph<'_> {
        let mut text = vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                "SNAKE",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
        ];

        if hud.high_score > 0 {
            text.push(Line::from(vec![
                Span::styled("High Score: ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    hud.high_score.to_string(),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
            ]));
            text.push(Line::from(""));
        }

        text.push(Line::from("Arrow keys, WASD or drag with the mouse to steer"));
        text.push(Line::from(""));
        text.push(Line::from(vec![
            Span::styled("Press ", Style::default().fg(Color::Gray)),
            Span::styled(
                "Enter",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" to start", Style::default().fg(Color::Gray)),
        ]));

        Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::Green)),
        )
    }

    fn render_game_over(&self, state: &GameState, hud: &Hud) -> Paragraph<'_> {
        let mut text = vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                "GAME OVER",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Final Score: ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    state.score.to_string(),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(vec![
                Span::styled("High Score: ", Style::default().fg(Color::Yellow)),
                Span::styled(hud.high_score.to_string(), Style::default().fg(Color::White)),
            ]),
        ];

        if hud.new_high_score {
            text.push(Line::from(""));
            text.push(Line::from(vec![Span::styled(
                "New high score!",
                Style::default()
                    .fg(Color::LightYellow)
                    .add_modifier(Modifier::BOLD),
            )]));
        }

        text.push(Line::from(""));
        text.push(Line::from(vec![
            Span::styled("Press ", Style::default().fg(Color::Gray)),
            Span::styled(
                "R",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" to play again or ", Style::default().fg(Color::Gray)),
            Span::styled(
                "Q",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Span::styled(" to quit", Style::default().fg(Color::Gray)),
        ]));

        Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        )
    }

    fn render_controls(&self, phase: GamePhase) -> Paragraph<'_> {
        let spans = match phase {
            GamePhase::Playing => vec![
                Span::styled("↑↓←→", Style::default().fg(Color::Cyan)),
                Span::raw(" or "),
                Span::styled("WASD", Style::default().fg(Color::Cyan)),
                Span::raw(" to move | "),
                Span::styled("M", Style::default().fg(Color::Cyan)),
                Span::raw(" mute | "),
                Span::styled("Q", Style::default().fg(Color::Red)),
                Span::raw(" to quit"),
            ],
            _ => vec![
                Span::styled("Enter", Style::default().fg(Color::Cyan)),
                Span::raw(" continue | "),
                Span::styled("M", Style::default().fg(Color::Cyan)),
                Span::raw(" mute | "),
                Span::styled("Q", Style::default().fg(Color::Red)),
                Span::raw(" to quit"),
            ],
        };

        Paragraph::new(vec![Line::from(spans)]).alignment(Alignment::Center)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Area just large enough for the board (two columns per cell plus border), centred
fn centered(area: Rect, state: &GameState) -> Rect {
    let cells_wide = u16::try_from(state.grid_width).unwrap_or(u16::MAX);
    let cells_high = u16::try_from(state.grid_height).unwrap_or(u16::MAX);
    let width = cells_wide.saturating_mul(2).saturating_add(2).min(area.width);
    let height = cells_high.saturating_add(2).min(area.height);

    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Direction, Snake};
    use ratatui::{Terminal, backend::TestBackend};

    fn state(phase: GamePhase) -> GameState {
        let mut state = GameState::new(
            Snake::new(Position::new(5, 5), Direction::Right, 3),
            Position::new(8, 2),
            10,
            10,
            150,
        );
        state.phase = phase;
        state.score = 30;
        state
    }

    fn draw(state: &GameState, high_score: u32, new_high_score: bool) -> String {
        let metrics = GameMetrics::new();
        let hud = Hud {
            high_score,
            metrics: &metrics,
            muted: false,
            new_high_score,
        };
        let mut terminal = Terminal::new(TestBackend::new(60, 24)).unwrap();
        terminal
            .draw(|frame| Renderer::new().render(frame, state, &hud))
            .unwrap();

        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_cell_classification() {
        let state = state(GamePhase::Playing);
        assert_eq!(cell_at(&state, Position::new(5, 5)), Cell::Head);
        assert_eq!(cell_at(&state, Position::new(4, 5)), Cell::Body);
        assert_eq!(cell_at(&state, Position::new(8, 2)), Cell::Food);
        assert_eq!(cell_at(&state, Position::new(0, 0)), Cell::Empty);
    }

    #[test]
    fn test_start_screen() {
        let screen = draw(&state(GamePhase::Start), 90, false);
        assert!(screen.contains("SNAKE"));
        assert!(screen.contains("High Score: 90"));
    }

    #[test]
    fn test_board_shows_score_and_snake() {
        let screen = draw(&state(GamePhase::Playing), 0, false);
        assert!(screen.contains("Score: 30"));
        assert!(!screen.contains("High:"));
        assert!(screen.contains("▶"));
        assert!(screen.contains("●"));
    }

    #[test]
    fn test_game_over_dialog() {
        let screen = draw(&state(GamePhase::GameOver), 30, true);
        assert!(screen.contains("GAME OVER"));
        assert!(screen.contains("Final Score: 30"));
        assert!(screen.contains("New high score!"));
    }

    #[test]
    fn test_centered_board_area() {
        let area = centered(Rect::new(0, 0, 60, 30), &state(GamePhase::Playing));
        assert_eq!(area, Rect::new(19, 9, 22, 12));
    }

    #[test]
    fn test_oversized_board_clipped_to_area() {
        let mut state = state(GamePhase::Playing);
        state.grid_width = 33_000;
        state.grid_height = 70_000;

        let area = centered(Rect::new(0, 0, 80, 24), &state);
        assert_eq!(area, Rect::new(0, 0, 80, 24));
    }
}
