//! Core game logic module for Snake
//!
//! This module contains all the game logic without any I/O or rendering dependencies.
//! The session drives a round from the start screen to game over; the engine
//! turns one snapshot into the next.

pub mod config;
pub mod direction;
pub mod engine;
pub mod session;
pub mod state;

// Re-export commonly used types
pub use config::GameConfig;
pub use direction::Direction;
pub use engine::{GameEngine, StepInfo, StepResult};
pub use session::{Session, SessionEvent};
pub use state::{CollisionType, GamePhase, GameState, Position, Snake};
