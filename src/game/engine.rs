use super::{
    config::GameConfig,
    direction::Direction,
    state::{CollisionType, GamePhase, GameState, Position, Snake},
};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use tracing::{debug, info};

/// Random draws tried before falling back to scanning the board for free cells
const FOOD_SAMPLE_ATTEMPTS: usize = 1000;

/// Information about a step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepInfo {
    /// Whether the snake ate food this step
    pub ate_food: bool,
    /// Type of collision if one occurred
    pub collision_type: Option<CollisionType>,
    /// The snake filled every cell, so no food could be placed
    pub board_full: bool,
}

/// Result of a game step
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// Snapshot after the step
    pub state: GameState,
    /// Whether the round has ended
    pub terminated: bool,
    /// Additional information about the step
    pub info: StepInfo,
}

/// The game engine that handles all game logic
pub struct GameEngine {
    config: GameConfig,
    rng: StdRng,
}

impl GameEngine {
    /// Create a new game engine with the given configuration
    pub fn new(config: GameConfig) -> Result<Self, String> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create an engine whose food placement is reproducible
    pub fn with_seed(config: GameConfig, seed: u64) -> Result<Self, String> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: GameConfig, rng: StdRng) -> Result<Self, String> {
        config.validate()?;
        Ok(Self { config, rng })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Fresh snapshot in the start phase: snake centred, heading right
    pub fn reset(&mut self) -> GameState {
        let center_x = (self.config.grid_width / 2) as i32;
        let center_y = (self.config.grid_height / 2) as i32;

        let snake = Snake::new(
            Position::new(center_x, center_y),
            Direction::Right,
            self.config.initial_snake_length,
        );

        // A validated config never lets the initial snake cover the board
        let food = self
            .spawn_food(&snake)
            .expect("validated config leaves room for food");

        GameState::new(
            snake,
            food,
            self.config.grid_width,
            self.config.grid_height,
            self.config.initial_tick_ms,
        )
    }

    /// Advance `state` by one tick and return the next snapshot.
    ///
    /// Snapshots outside the playing phase come back unchanged.
    pub fn step(&mut self, state: &GameState) -> StepResult {
        if !state.is_playing() {
            return StepResult {
                state: state.clone(),
                terminated: state.is_over(),
                info: StepInfo::default(),
            };
        }

        let mut next = state.clone();

        // Apply the queued turn (prevent 180° turns)
        if let Some(requested) = next.pending_direction.take() {
            if !next.snake.direction.is_opposite(requested) {
                next.snake.direction = requested;
            }
        }

        // Calculate new head position
        let new_head = next.snake.head().moved_in_direction(next.snake.direction);
        next.steps = next.steps.saturating_add(1);

        // Check for collisions
        if let Some(collision_type) = self.check_collision(&next, new_head) {
            next.phase = GamePhase::GameOver;
            info!(
                ?collision_type,
                score = next.score,
                length = next.snake.len(),
                steps = next.steps,
                "snake crashed"
            );

            return StepResult {
                state: next,
                terminated: true,
                info: StepInfo {
                    collision_type: Some(collision_type),
                    ..StepInfo::default()
                },
            };
        }

        // Check if snake ate food
        let ate_food = new_head == next.food;

        // Move snake (grow if ate food)
        next.snake.move_snake(ate_food);

        if !ate_food {
            return StepResult {
                state: next,
                terminated: false,
                info: StepInfo::default(),
            };
        }

        next.score = next.score.saturating_add(self.config.points_per_food);
        next.tick_interval_ms = self.next_tick_interval(next.tick_interval_ms);
        debug!(
            score = next.score,
            tick_interval_ms = next.tick_interval_ms,
            "food eaten"
        );

        let board_full = match self.spawn_food(&next.snake) {
            Some(food) => {
                next.food = food;
                false
            }
            None => {
                info!(score = next.score, "board full");
                next.phase = GamePhase::GameOver;
                true
            }
        };

        StepResult {
            state: next,
            terminated: board_full,
            info: StepInfo {
                ate_food: true,
                collision_type: None,
                board_full,
            },
        }
    }

    /// Tick delay after one more food: shrinks by `speed_factor`, never below the floor
    pub fn next_tick_interval(&self, current_ms: u64) -> u64 {
        let scaled = (current_ms as f64 * self.config.speed_factor).floor() as u64;
        scaled.max(self.config.min_tick_ms)
    }

    /// Check if the new head position causes a collision
    fn check_collision(&self, state: &GameState, pos: Position) -> Option<CollisionType> {
        // Check wall collision
        if !state.is_in_bounds(pos) {
            return Some(CollisionType::Wall);
        }

        // Check self-collision
        if state.snake.collides_with_body(pos) {
            return Some(CollisionType::SelfCollision);
        }

        None
    }

    /// Pick a random free cell for the food, or `None` when the snake fills the board.
    ///
    /// Cells within `food_margin` of an edge are avoided while any inner cell
    /// is free.
    pub fn spawn_food(&mut self, snake: &Snake) -> Option<Position> {
        let margin = self.config.food_margin;
        let (min_x, max_x) = (margin, self.config.grid_width - 1 - margin);
        let (min_y, max_y) = (margin, self.config.grid_height - 1 - margin);

        for _ in 0..FOOD_SAMPLE_ATTEMPTS {
            let x = self.rng.gen_range(min_x..=max_x) as i32;
            let y = self.rng.gen_range(min_y..=max_y) as i32;
            let pos = Position::new(x, y);

            if !snake.occupies(pos) {
                return Some(pos);
            }
        }

        let inner = self.free_cells(snake, margin);
        if let Some(pos) = inner.choose(&mut self.rng) {
            return Some(*pos);
        }

        let anywhere = self.free_cells(snake, 0);
        let pos = anywhere.choose(&mut self.rng).copied();
        debug!(found = pos.is_some(), "food placed by exhaustive scan");
        pos
    }

    fn free_cells(&self, snake: &Snake, margin: usize) -> Vec<Position> {
        let xs = margin..self.config.grid_width - margin;
        (margin..self.config.grid_height - margin)
            .flat_map(|y| xs.clone().map(move |x| Position::new(x as i32, y as i32)))
            .filter(|pos| !snake.occupies(*pos))
            .collect()
    }
}
