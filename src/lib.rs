//! Term Snake - Snake in the terminal
//!
//! This library provides:
//! - Core game logic and the round lifecycle (game module)
//! - High score persistence (persistence module)
//! - Keyboard and mouse input mapping (input module)
//! - TUI rendering (render module)
//! - Round timing (metrics module)
//! - The interactive terminal mode (modes module)

pub mod game;
pub mod input;
pub mod logging;
pub mod metrics;
pub mod modes;
pub mod persistence;
pub mod render;
