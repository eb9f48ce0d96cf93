use super::{
    direction::Direction,
    engine::GameEngine,
    state::{CollisionType, GamePhase, GameState},
};
use crate::persistence::HighScoreStore;
use tracing::{info, warn};

/// Something the front end may want to react to (sound, metrics)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A round began
    Started,
    AteFood { score: u32 },
    GameOver {
        score: u32,
        high_score: u32,
        new_high_score: bool,
        collision: Option<CollisionType>,
    },
    /// Back on the start screen after a finished round
    Reset,
}

/// Owns the current snapshot and walks it through start -> playing -> game over -> start.
///
/// The high score is read once from the store on creation and written back
/// only when a round ends with a better score. If that first read fails the
/// store is never written, so an unreadable record cannot be replaced by a
/// lower score.
pub struct Session<S: HighScoreStore> {
    engine: GameEngine,
    state: GameState,
    store: S,
    high_score: u32,
    persist: bool,
}

impl<S: HighScoreStore> Session<S> {
    pub fn new(mut engine: GameEngine, store: S) -> Self {
        let (high_score, persist) = match store.load() {
            Ok(high_score) => (high_score, true),
            Err(err) => {
                warn!(
                    error = %format!("{err:#}"),
                    "could not load high score, starting from 0 without saving"
                );
                (0, false)
            }
        };
        let state = engine.reset();

        Self {
            engine,
            state,
            store,
            high_score,
            persist,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    pub fn engine(&self) -> &GameEngine {
        &self.engine
    }

    /// Begin a round from the start screen
    pub fn start(&mut self) -> Option<SessionEvent> {
        if self.state.phase != GamePhase::Start {
            return None;
        }

        self.state = self.engine.reset().started();
        info!(
            grid_width = self.state.grid_width,
            grid_height = self.state.grid_height,
            "round started"
        );
        Some(SessionEvent::Started)
    }

    /// Queue a turn for the next tick. Ignored outside of play and for reversals.
    pub fn request_direction(&mut self, direction: Direction) {
        self.state = self.state.with_requested_direction(direction);
    }

    /// Advance the round by one tick
    pub fn tick(&mut self) -> Option<SessionEvent> {
        if !self.state.is_playing() {
            return None;
        }

        let result = self.engine.step(&self.state);
        self.state = result.state;

        if result.terminated {
            let score = self.state.score;
            let new_high_score = self.record_score(score);
            return Some(SessionEvent::GameOver {
                score,
                high_score: self.high_score,
                new_high_score,
                collision: result.info.collision_type,
            });
        }

        if result.info.ate_food {
            return Some(SessionEvent::AteFood {
                score: self.state.score,
            });
        }

        None
    }

    /// Return to the start screen after a round has ended
    pub fn replay(&mut self) -> Option<SessionEvent> {
        if self.state.phase != GamePhase::GameOver {
            return None;
        }

        self.state = self.engine.reset();
        Some(SessionEvent::Reset)
    }

    /// Raise the high score if `score` beats it. Returns whether it did.
    fn record_score(&mut self, score: u32) -> bool {
        if score <= self.high_score {
            return false;
        }

        info!(previous = self.high_score, score, "new high score");
        self.high_score = score;
        if !self.persist {
            warn!(score, "high score kept in memory only, the stored record could not be read");
        } else if let Err(err) = self.store.save(score) {
            warn!(error = %format!("{err:#}"), "could not save high score");
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameConfig, Position};
    use crate::persistence::MemoryHighScoreStore;
    use anyhow::{anyhow, Result};

    fn session(high_score: u32) -> Session<MemoryHighScoreStore> {
        let engine = GameEngine::with_seed(GameConfig::small(), 11).unwrap();
        Session::new(engine, MemoryHighScoreStore::new(high_score))
    }

    /// Feed the snake once, then steer it into the right wall
    fn play_round_with_one_food(session: &mut Session<MemoryHighScoreStore>) -> SessionEvent {
        let head = session.state.snake.head();
        session.state.food = head.moved_in_direction(Direction::Right);
        assert!(matches!(session.tick(), Some(SessionEvent::AteFood { score: 10 })));
        // Keep the next food off the row the snake is about to cross
        session.state.food = Position::new(1, 1);

        loop {
            if let Some(event) = session.tick() {
                return event;
            }
        }
    }

    struct FailingStore;

    impl HighScoreStore for FailingStore {
        fn load(&self) -> Result<u32> {
            Err(anyhow!("disk on fire"))
        }

        fn save(&mut self, _high_score: u32) -> Result<()> {
            Err(anyhow!("disk on fire"))
        }
    }

    /// Unreadable record that still accepts writes
    #[derive(Default)]
    struct UnreadableStore {
        saved: Option<u32>,
    }

    impl HighScoreStore for UnreadableStore {
        fn load(&self) -> Result<u32> {
            Err(anyhow!("invalid high score file"))
        }

        fn save(&mut self, high_score: u32) -> Result<()> {
            self.saved = Some(high_score);
            Ok(())
        }
    }

    #[test]
    fn test_lifecycle() {
        let mut session = session(0);
        assert_eq!(session.phase(), GamePhase::Start);

        // Ticks do nothing before the round starts
        let before = session.state().clone();
        assert_eq!(session.tick(), None);
        assert_eq!(session.state(), &before);

        assert_eq!(session.start(), Some(SessionEvent::Started));
        assert_eq!(session.phase(), GamePhase::Playing);
        assert_eq!(session.start(), None);
        assert_eq!(session.replay(), None);

        let event = play_round_with_one_food(&mut session);
        assert!(matches!(event, SessionEvent::GameOver { .. }));
        assert_eq!(session.phase(), GamePhase::GameOver);

        // Frozen
        let frozen = session.state().clone();
        assert_eq!(session.tick(), None);
        assert_eq!(session.state(), &frozen);
        assert_eq!(session.start(), None);

        assert_eq!(session.replay(), Some(SessionEvent::Reset));
        assert_eq!(session.phase(), GamePhase::Start);
        assert_eq!(session.state().score, 0);
    }

    #[test]
    fn test_high_score_raised_on_game_over() {
        let mut session = session(0);
        session.start();

        let event = play_round_with_one_food(&mut session);

        assert_eq!(
            event,
            SessionEvent::GameOver {
                score: 10,
                high_score: 10,
                new_high_score: true,
                collision: Some(CollisionType::Wall),
            }
        );
        assert_eq!(session.high_score(), 10);
        assert_eq!(session.store.load().unwrap(), 10);
    }

    #[test]
    fn test_high_score_never_decreases() {
        let mut session = session(50);
        session.start();

        let event = play_round_with_one_food(&mut session);

        assert!(matches!(
            event,
            SessionEvent::GameOver {
                score: 10,
                high_score: 50,
                new_high_score: false,
                ..
            }
        ));
        assert_eq!(session.high_score(), 50);
        assert_eq!(session.store.load().unwrap(), 50);
    }

    #[test]
    fn test_equal_score_is_not_a_new_high_score() {
        let mut session = session(10);
        session.start();

        let event = play_round_with_one_food(&mut session);

        assert!(matches!(
            event,
            SessionEvent::GameOver {
                new_high_score: false,
                ..
            }
        ));
    }

    #[test]
    fn test_direction_requests_only_while_playing() {
        let mut session = session(0);
        session.request_direction(Direction::Up);
        assert_eq!(session.state().pending_direction, None);

        session.start();
        session.request_direction(Direction::Up);
        assert_eq!(session.state().pending_direction, Some(Direction::Up));

        session.tick();
        assert_eq!(session.state().snake.direction, Direction::Up);

        // Reversal of the new heading is dropped
        session.request_direction(Direction::Down);
        session.tick();
        assert_eq!(session.state().snake.direction, Direction::Up);
    }

    #[test]
    fn test_store_failures_do_not_stop_play() {
        let engine = GameEngine::with_seed(GameConfig::small(), 11).unwrap();
        let mut session = Session::new(engine, FailingStore);
        assert_eq!(session.high_score(), 0);

        session.start();
        session.state.food = Position::new(
            session.state.snake.head().x + 1,
            session.state.snake.head().y,
        );
        session.tick();
        session.state.food = Position::new(1, 1);
        while session.tick().is_none() {}

        assert_eq!(session.high_score(), 10);
        assert_eq!(session.phase(), GamePhase::GameOver);
    }

    #[test]
    fn test_unreadable_record_is_not_overwritten() {
        let engine = GameEngine::with_seed(GameConfig::small(), 11).unwrap();
        let mut session = Session::new(engine, UnreadableStore::default());
        session.start();

        let head = session.state.snake.head();
        session.state.food = head.moved_in_direction(Direction::Right);
        session.tick();
        session.state.food = Position::new(1, 1);
        let event = loop {
            if let Some(event) = session.tick() {
                break event;
            }
        };

        assert!(matches!(
            event,
            SessionEvent::GameOver {
                score: 10,
                new_high_score: true,
                ..
            }
        ));
        assert_eq!(session.high_score(), 10);
        assert_eq!(session.store.saved, None);
    }
}
