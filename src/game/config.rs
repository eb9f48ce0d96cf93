use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Smallest board `fit_to_terminal` will produce
pub const MIN_FIT_DIMENSION: usize = 10;

/// Largest board side accepted by `validate`
pub const MAX_GRID_DIMENSION: usize = 255;

/// Largest `points_per_food` accepted by `validate`
pub const MAX_POINTS_PER_FOOD: u32 = 1000;

/// Columns and rows taken by the header, footer and board border
const CHROME_COLUMNS: u16 = 4;
const CHROME_ROWS: u16 = 8;

/// Configuration for the game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Width of the game grid
    pub grid_width: usize,
    /// Height of the game grid
    pub grid_height: usize,
    /// Initial length of the snake
    pub initial_snake_length: usize,

    // Pace
    /// Delay between ticks at the start of a round, in milliseconds
    pub initial_tick_ms: u64,
    /// Floor for the tick delay
    pub min_tick_ms: u64,
    /// Multiplier applied to the tick delay each time food is eaten
    pub speed_factor: f64,

    // Scoring
    /// Points awarded per food eaten
    pub points_per_food: u32,
    /// Cells kept free of food along every edge
    pub food_margin: usize,

    /// Minimum mouse drag, in cells, that counts as a swipe
    pub swipe_threshold: u16,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_width: 25,
            grid_height: 25,
            initial_snake_length: 3,
            initial_tick_ms: 150,
            min_tick_ms: 50,
            speed_factor: 0.95,
            points_per_food: 10,
            food_margin: 1,
            swipe_threshold: 2,
        }
    }
}

impl GameConfig {
    /// Create a new configuration with custom grid size
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            grid_width: width,
            grid_height: height,
            ..Default::default()
        }
    }

    /// Create a small grid for testing
    pub fn small() -> Self {
        Self::new(10, 10)
    }

    /// Load a configuration from a JSON file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let config: GameConfig = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        Ok(config)
    }

    /// Shrink the grid so the board fits a terminal of `columns` x `rows`.
    ///
    /// Each cell is drawn two columns wide. The configured size acts as the
    /// upper bound and `MIN_FIT_DIMENSION` as the lower one.
    pub fn fit_to_terminal(&self, columns: u16, rows: u16) -> Self {
        let fit_width = (columns.saturating_sub(CHROME_COLUMNS) / 2) as usize;
        let fit_height = rows.saturating_sub(CHROME_ROWS) as usize;

        Self {
            grid_width: fit_width.clamp(MIN_FIT_DIMENSION, self.grid_width.max(MIN_FIT_DIMENSION)),
            grid_height: fit_height
                .clamp(MIN_FIT_DIMENSION, self.grid_height.max(MIN_FIT_DIMENSION)),
            ..self.clone()
        }
    }

    /// Validate the configuration
    ///
    /// Returns an error describing the first invalid parameter.
    pub fn validate(&self) -> Result<(), String> {
        if self.grid_width < 5 || self.grid_height < 5 {
            return Err(format!(
                "grid must be at least 5x5, got {}x{}",
                self.grid_width, self.grid_height
            ));
        }

        if self.grid_width > MAX_GRID_DIMENSION || self.grid_height > MAX_GRID_DIMENSION {
            return Err(format!(
                "grid cannot exceed {0}x{0}, got {1}x{2}",
                MAX_GRID_DIMENSION, self.grid_width, self.grid_height
            ));
        }

        if self.initial_snake_length == 0 {
            return Err("initial_snake_length must be at least 1".to_string());
        }

        // The snake starts at the centre heading right, its tail stretches left
        if self.initial_snake_length > self.grid_width / 2 + 1 {
            return Err(format!(
                "initial_snake_length ({}) does not fit a grid {} wide",
                self.initial_snake_length, self.grid_width
            ));
        }

        if self.min_tick_ms == 0 {
            return Err("min_tick_ms must be positive".to_string());
        }

        if self.initial_tick_ms < self.min_tick_ms {
            return Err(format!(
                "initial_tick_ms ({}) cannot be below min_tick_ms ({})",
                self.initial_tick_ms, self.min_tick_ms
            ));
        }

        if !(self.speed_factor > 0.0 && self.speed_factor <= 1.0) {
            return Err(format!(
                "speed_factor must be in (0, 1], got {}",
                self.speed_factor
            ));
        }

        if self.points_per_food == 0 || self.points_per_food > MAX_POINTS_PER_FOOD {
            return Err(format!(
                "points_per_food must be in 1..={}, got {}",
                MAX_POINTS_PER_FOOD, self.points_per_food
            ));
        }

        if self.food_margin * 2 >= self.grid_width.min(self.grid_height) {
            return Err(format!(
                "food_margin ({}) leaves no room for food on a {}x{} grid",
                self.food_margin, self.grid_width, self.grid_height
            ));
        }

        Ok(())
    }
}
