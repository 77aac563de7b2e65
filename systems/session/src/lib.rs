#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Session evaluation: the survival timer, the health floor, and the final
//! verdict.
//!
//! The session is won by keeping floor health at or above the minimum until
//! the timer runs out, and lost the instant health drops below it. Both
//! checks run every tick; the losing check runs first, so at the exact
//! moment the timer expires with health below the minimum the session is a
//! defeat.

use std::time::Duration;

use splashground_core::{Command, Event, SessionOutcome, SessionStats};

/// Configuration parameters required to construct the session system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Time the floor must survive for a victory.
    pub duration: Duration,
    /// Minimum floor health percentage; dropping below it loses instantly.
    pub min_health: f32,
}

impl Config {
    /// Creates a new configuration from a survival time and health floor.
    #[must_use]
    pub const fn new(duration: Duration, min_health: f32) -> Self {
        Self {
            duration,
            min_health,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Duration::from_secs(120), 80.0)
    }
}

/// Pure system that decides the session verdict and gathers run statistics.
#[derive(Debug)]
pub struct Session {
    config: Config,
    elapsed: Duration,
    lowest_health: f32,
    tiles_cleansed: u32,
    decided: bool,
}

impl Session {
    /// Creates a new session evaluator using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            elapsed: Duration::ZERO,
            lowest_health: 100.0,
            tiles_cleansed: 0,
            decided: false,
        }
    }

    /// Time left on the survival timer.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.config.duration.saturating_sub(self.elapsed)
    }

    /// Lowest health percentage observed so far.
    #[must_use]
    pub fn lowest_health(&self) -> f32 {
        self.lowest_health
    }

    /// Consumes events and the current health reading, emitting the verdict.
    pub fn handle(&mut self, events: &[Event], health: f32, out: &mut Vec<Command>) {
        let mut accumulated = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => {
                    accumulated = accumulated.saturating_add(*dt);
                }
                Event::TilesCleansed { count, .. } => {
                    self.tiles_cleansed += count;
                }
                Event::SessionEnded { .. } => {
                    self.decided = true;
                }
                _ => {}
            }
        }

        if self.decided || accumulated.is_zero() {
            return;
        }
        self.elapsed = self.elapsed.saturating_add(accumulated);
        self.lowest_health = self.lowest_health.min(health);

        if health < self.config.min_health {
            self.decide(SessionOutcome::Defeat(self.stats(health)), out);
        } else if self.elapsed >= self.config.duration {
            self.decide(SessionOutcome::Victory(self.stats(health)), out);
        }
    }

    fn stats(&self, health: f32) -> SessionStats {
        SessionStats {
            final_health: health,
            lowest_health: self.lowest_health,
            tiles_cleansed: self.tiles_cleansed,
            elapsed: self.elapsed,
        }
    }

    fn decide(&mut self, outcome: SessionOutcome, out: &mut Vec<Command>) {
        self.decided = true;
        out.push(Command::EndSession { outcome });
    }
}
