//! Scripted player for headless runs.
//!
//! Drives the session through the same input path a person would use: it
//! walks to a pickup, clicks it, turns toward the creature, holds the primary
//! button until the meter reaches a solved charge and lets go.

use engine_core::Vec3;
use input::{ElementState, InputState, MouseButton};
use rand::rngs::StdRng;
use rand::Rng;

use crate::config::{AutoplayConfig, GameConfig};
use crate::session::{Actor, Session};
use crate::throwable::ThrowableState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Walk to something to pick up and click it.
    Fetch,
    /// Holding; waiting for the mouth to open.
    WaitForMouth,
    /// Button down, meter running.
    Charging,
    /// Thrown; waiting for it to land.
    Watching,
    /// Creature is dead.
    Done,
}

pub struct Autoplay {
    config: AutoplayConfig,
    phase: Phase,
    target_charge: f32,
    rng: StdRng,
}

impl Autoplay {
    pub fn new(config: AutoplayConfig, rng: StdRng) -> Self {
        Self {
            config,
            phase: Phase::Fetch,
            target_charge: 0.0,
            rng,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Decide this frame's button and look changes. Call after
    /// `InputState::begin_frame`.
    pub fn drive(&mut self, session: &mut Session, input: &mut InputState) {
        if session.creature().is_dying() {
            if input.is_mouse_held(MouseButton::Left) {
                input.process_mouse_button(MouseButton::Left, ElementState::Released);
            }
            self.phase = Phase::Done;
            return;
        }

        match self.phase {
            Phase::Fetch => self.fetch(session, input),
            Phase::WaitForMouth => {
                let target = session.creature().mouth_target();
                let (yaw, pitch) = self.look_at(session.actor(), target);
                input.set_look(yaw, pitch);
                if !session.creature().mouth_is_open() {
                    return;
                }
                match solve_launch_force(session.actor(), target, pitch, session.config()) {
                    Some(force) => {
                        let jitter = self.config.charge_jitter.abs();
                        let spread = if jitter > 0.0 {
                            self.rng.gen_range(-jitter..=jitter)
                        } else {
                            0.0
                        };
                        self.target_charge = (force + spread).clamp(5.0, 95.0);
                        log::debug!(
                            "Aiming: solved {:.1}, charging to {:.1}",
                            force,
                            self.target_charge
                        );
                        input.process_mouse_button(MouseButton::Left, ElementState::Pressed);
                        self.phase = Phase::Charging;
                    }
                    None => log::warn!("Mouth out of reach from {:?}", session.actor().feet),
                }
            }
            Phase::Charging => {
                if session.charge().level() >= self.target_charge || !session.charge().is_active()
                {
                    input.process_mouse_button(MouseButton::Left, ElementState::Released);
                    self.phase = Phase::Watching;
                }
            }
            Phase::Watching => {
                if session.throwable().state() != ThrowableState::InFlight {
                    self.phase = Phase::Fetch;
                }
            }
            Phase::Done => {}
        }
    }

    fn fetch(&mut self, session: &mut Session, input: &mut InputState) {
        if session.throwable().state() == ThrowableState::Held {
            if input.is_mouse_held(MouseButton::Left) {
                input.process_mouse_button(MouseButton::Left, ElementState::Released);
            }
            session.actor_mut().feet = Vec3::from_array(self.config.throw_spot);
            self.phase = Phase::WaitForMouth;
            return;
        }
        if input.is_mouse_held(MouseButton::Left) {
            input.process_mouse_button(MouseButton::Left, ElementState::Released);
            return;
        }
        if let Some(spot) = fetch_spot(session) {
            session.actor_mut().feet = Vec3::new(spot.x, 0.0, spot.z);
            input.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        }
    }

    /// Yaw toward `target`, pitched at the configured launch angle.
    fn look_at(&self, actor: &Actor, target: Vec3) -> (f32, f32) {
        let d = target - actor.eye();
        ((-d.x).atan2(-d.z), self.config.pitch_degrees.to_radians())
    }
}

/// Closest thing worth walking to: a settled throwable, else an available spawner.
fn fetch_spot(session: &Session) -> Option<Vec3> {
    if session.throwable().can_pick_up() {
        return session.throwable().body_position(session.scene());
    }
    let feet = session.actor().feet;
    session
        .spawners()
        .iter()
        .filter(|s| s.is_available())
        .filter_map(|s| s.position(session.scene()))
        .min_by(|a, b| a.distance(feet).total_cmp(&b.distance(feet)))
}

/// Charge that carries a throw from `actor` through `target` at elevation
/// `pitch`. Bisects over a point-mass flight integrated with the body's
/// damping and the physics step. `None` when even full charge falls short.
pub fn solve_launch_force(
    actor: &Actor,
    target: Vec3,
    pitch: f32,
    config: &GameConfig,
) -> Option<f32> {
    let eye = actor.eye();
    let flat = Vec3::new(target.x - eye.x, 0.0, target.z - eye.z).normalize_or_zero();
    let aim = Vec3::new(flat.x * pitch.cos(), pitch.sin(), flat.z * pitch.cos());
    let start = Vec3::new(actor.feet.x + aim.x, eye.y + aim.y, actor.feet.z + aim.z);
    let reach = Vec3::new(target.x - start.x, 0.0, target.z - start.z).length();

    let throw = &config.throw;
    let dt = config.physics.fixed_step;
    let gravity = config.physics.gravity;
    let height_at_target = |force: f32| -> Option<f32> {
        let mut v = aim * force * throw.strength_multiplier / throw.mass;
        let mut p = start;
        for _ in 0..(20.0 / dt) as usize {
            v.y += gravity * dt;
            v *= 1.0 / (1.0 + dt * throw.linear_damping);
            p += v * dt;
            if Vec3::new(p.x - start.x, 0.0, p.z - start.z).length() >= reach {
                return Some(p.y);
            }
            if p.y < throw.radius {
                return None;
            }
        }
        None
    };

    let reaches = |force: f32| height_at_target(force).map_or(false, |y| y >= target.y);
    if !reaches(throw.max_force) {
        return None;
    }
    let (mut lo, mut hi) = (0.0, throw.max_force);
    for _ in 0..40 {
        let mid = 0.5 * (lo + hi);
        if reaches(mid) {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    Some(hi)
}
