#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Spray cadence: fire rate, magazine and reload, and projectile travel.
//!
//! The system turns trigger requests into delayed [`Command::CleanseArea`]
//! impacts. A shot spends `distance / projectile_speed` seconds in flight
//! before its cleanse lands, the magazine holds a fixed number of shots, and
//! an empty magazine reloads automatically.

use std::time::Duration;

use splashground_core::{Command, Event, Position};

/// Configuration parameters required to construct the spraying system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Minimum time between consecutive shots.
    pub fire_interval: Duration,
    /// Number of shots in a full magazine.
    pub ammo_capacity: u32,
    /// Time a reload takes once the magazine runs dry.
    pub reload_time: Duration,
    /// Projectile flight speed in world units per second.
    pub projectile_speed: f32,
    /// Radius of the cleansing impact disc.
    pub spray_radius: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fire_interval: Duration::from_millis(800),
            ammo_capacity: 5,
            reload_time: Duration::from_millis(1_200),
            projectile_speed: 15.0,
            spray_radius: 2.0,
        }
    }
}

/// One trigger pull: where the shot leaves from and where it should land.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SprayRequest {
    /// Muzzle position the projectile starts at.
    pub origin: Position,
    /// Point the projectile is aimed at.
    pub target: Position,
}

/// Temporary shooter modifiers supplied by pickup effects for one tick.
///
/// The neutral default leaves the configured cadence untouched.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SprayBoost {
    /// Divides the fire interval; 4.5 fires four and a half times as fast.
    pub rate_multiplier: f32,
    /// Scales the impact radius of shots fired while active.
    pub radius_multiplier: f32,
    /// Bypasses the magazine entirely: no ammo spent, no reload lockout.
    pub infinite_ammo: bool,
}

impl Default for SprayBoost {
    fn default() -> Self {
        Self {
            rate_multiplier: 1.0,
            radius_multiplier: 1.0,
            infinite_ammo: false,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Impact {
    due: Duration,
    center: Position,
    radius: f32,
}

/// Pure system that converts trigger requests into delayed cleanse impacts.
#[derive(Debug)]
pub struct Spraying {
    config: Config,
    clock: Duration,
    next_shot: Duration,
    ammo: u32,
    reloading_until: Option<Duration>,
    in_flight: Vec<Impact>,
}

impl Spraying {
    /// Creates a new spraying system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            clock: Duration::ZERO,
            next_shot: Duration::ZERO,
            ammo: config.ammo_capacity,
            reloading_until: None,
            in_flight: Vec::new(),
            config,
        }
    }

    /// Shots left in the magazine.
    #[must_use]
    pub fn ammo(&self) -> u32 {
        self.ammo
    }

    /// Whether a reload is currently in progress.
    #[must_use]
    pub fn reloading(&self) -> bool {
        self.reloading_until.is_some()
    }

    /// Consumes events, an optional trigger request, and the tick's boost,
    /// emitting cleanse impacts as their travel delays elapse.
    pub fn handle(
        &mut self,
        events: &[Event],
        request: Option<SprayRequest>,
        boost: SprayBoost,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                self.clock = self.clock.saturating_add(*dt);
            }
        }

        if let Some(until) = self.reloading_until {
            if self.clock >= until {
                self.ammo = self.config.ammo_capacity;
                self.reloading_until = None;
            }
        }

        self.land_due_impacts(out);

        if let Some(request) = request {
            self.try_fire(request, boost);
        }
    }

    fn land_due_impacts(&mut self, out: &mut Vec<Command>) {
        let mut index = 0;
        while index < self.in_flight.len() {
            if self.in_flight[index].due > self.clock {
                index += 1;
                continue;
            }
            let impact = self.in_flight.swap_remove(index);
            out.push(Command::CleanseArea {
                center: impact.center,
                radius: impact.radius,
            });
        }
    }

    fn try_fire(&mut self, request: SprayRequest, boost: SprayBoost) {
        let magazine_blocked = self.reloading_until.is_some() || self.ammo == 0;
        if (magazine_blocked && !boost.infinite_ammo) || self.clock < self.next_shot {
            return;
        }

        let travel = if self.config.projectile_speed > 0.0 {
            Duration::from_secs_f32(request.origin.distance(request.target) / self.config.projectile_speed)
        } else {
            Duration::ZERO
        };
        self.in_flight.push(Impact {
            due: self.clock + travel,
            center: request.target,
            radius: self.config.spray_radius * boost.radius_multiplier.max(0.0),
        });

        let interval = if boost.rate_multiplier > 1.0 {
            self.config.fire_interval.div_f32(boost.rate_multiplier)
        } else {
            self.config.fire_interval
        };
        self.next_shot = self.clock + interval;

        if boost.infinite_ammo {
            return;
        }
        self.ammo -= 1;
        if self.ammo == 0 {
            self.reloading_until = Some(self.clock + self.config.reload_time);
        }
    }
}
