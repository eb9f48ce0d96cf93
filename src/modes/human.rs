use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyEventKind},
    execute,
    style::Print,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{Stderr, stderr};
use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval, interval_at};
use tracing::{debug, info};

use crate::game::{GamePhase, Session, SessionEvent};
use crate::input::{InputHandler, KeyAction, SwipeTracker};
use crate::metrics::GameMetrics;
use crate::persistence::HighScoreStore;
use crate::render::{Hud, Renderer};

/// Render at 30 FPS (33ms per frame)
const RENDER_INTERVAL: Duration = Duration::from_millis(33);

pub struct HumanMode<S: HighScoreStore> {
    session: Session<S>,
    metrics: GameMetrics,
    renderer: Renderer,
    input_handler: InputHandler,
    swipe: SwipeTracker,
    muted: bool,
    new_high_score: bool,
    bell_pending: bool,
    should_quit: bool,
}

impl<S: HighScoreStore> HumanMode<S> {
    pub fn new(session: Session<S>) -> Self {
        let swipe = SwipeTracker::new(session.engine().config().swipe_threshold);

        Self {
            session,
            metrics: GameMetrics::new(),
            renderer: Renderer::new(),
            input_handler: InputHandler::new(),
            swipe,
            muted: false,
            new_high_score: false,
            bell_pending: false,
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stderr = stderr();
        execute!(stderr, EnterAlternateScreen, EnableMouseCapture)
            .context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stderr);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        // Run game loop with cleanup
        let result = self.run_game_loop(&mut terminal).await;

        // Cleanup terminal
        self.cleanup_terminal(&mut terminal)?;

        info!(
            games_played = self.metrics.games_played,
            high_score = self.session.high_score(),
            "session ended"
        );
        result
    }

    async fn run_game_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        let mut event_stream = EventStream::new();

        // Game ticks follow the snapshot's interval, which shrinks as food is eaten
        let mut tick_period = self.tick_period();
        let mut tick_timer = tick_timer_for(tick_period);
        let mut was_playing = false;

        let mut render_timer = interval(RENDER_INTERVAL);

        loop {
            tokio::select! {
                // Handle terminal events
                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        self.handle_event(event);
                    }
                }

                // Game logic tick, only while a round is running
                _ = tick_timer.tick(), if self.session.state().is_playing() => {
                    self.update_game();
                }

                // Render frame
                _ = render_timer.tick() => {
                    self.metrics.update();
                    terminal.draw(|frame| {
                        let hud = Hud {
                            high_score: self.session.high_score(),
                            metrics: &self.metrics,
                            muted: self.muted,
                            new_high_score: self.new_high_score,
                        };
                        self.renderer.render(frame, self.session.state(), &hud);
                    }).context("Failed to draw frame")?;

                    if self.bell_pending {
                        self.bell_pending = false;
                        execute!(terminal.backend_mut(), Print('\x07'))
                            .context("Failed to ring bell")?;
                    }
                }

                // Handle Ctrl+C
                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                }
            }

            if self.should_quit {
                break;
            }

            // Re-arm the tick timer when a round starts or the pace changes
            let playing = self.session.state().is_playing();
            let period = self.tick_period();
            if (playing && !was_playing) || period != tick_period {
                debug!(period_ms = period.as_millis() as u64, "tick timer re-armed");
                tick_period = period;
                tick_timer = tick_timer_for(tick_period);
            }
            was_playing = playing;
        }

        Ok(())
    }

    fn tick_period(&self) -> Duration {
        Duration::from_millis(self.session.state().tick_interval_ms)
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            // Only process key press events, not release
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                let action = self.input_handler.handle_key_event(key);
                self.apply(action);
            }
            Event::Mouse(mouse) => {
                if let Some(direction) = self.swipe.handle_mouse_event(mouse) {
                    self.apply(KeyAction::Move(direction));
                }
            }
            _ => {}
        }
    }

    fn apply(&mut self, action: KeyAction) {
        let event = match action {
            KeyAction::Move(direction) => {
                self.session.request_direction(direction);
                None
            }
            KeyAction::Confirm => match self.session.phase() {
                GamePhase::Start => self.session.start(),
                GamePhase::GameOver => self.session.replay(),
                GamePhase::Playing => None,
            },
            KeyAction::Restart => self.session.replay(),
            KeyAction::ToggleMute => {
                self.muted = !self.muted;
                None
            }
            KeyAction::Quit => {
                self.should_quit = true;
                None
            }
            KeyAction::None => None,
        };

        if let Some(event) = event {
            self.on_session_event(event);
        }
    }

    fn update_game(&mut self) {
        if let Some(event) = self.session.tick() {
            self.on_session_event(event);
        }
    }

    fn on_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Started => {
                self.metrics.on_game_start();
                self.new_high_score = false;
            }
            SessionEvent::AteFood { .. } => {
                self.ring();
            }
            SessionEvent::GameOver { new_high_score, .. } => {
                self.metrics.on_game_over();
                self.new_high_score = new_high_score;
                self.swipe.cancel();
                self.ring();
            }
            SessionEvent::Reset => {
                self.new_high_score = false;
            }
        }
    }

    fn ring(&mut self) {
        if !self.muted {
            self.bell_pending = true;
        }
    }

    fn cleanup_terminal(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(
            terminal.backend_mut(),
            DisableMouseCapture,
            LeaveAlternateScreen
        )
        .context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    }
}

/// Interval whose first tick lands one full period from now
fn tick_timer_for(period: Duration) -> Interval {
    let mut timer = interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer
}
