//! One play session: the player, the throwable, the creature and the spawners,
//! wired together and advanced one frame at a time.

use std::time::Duration;

use engine_core::{Quat, Vec3};
use rand::rngs::StdRng;

use crate::charge::ChargeMeter;
use crate::config::GameConfig;
use crate::creature::TargetCreature;
use crate::cues::Cue;
use crate::hud::Hud;
use crate::scene::{Scene, TimerSlot};
use crate::spawner::RespawnSpawner;
use crate::throwable::{ContactOutcome, Throwable, ThrowableState};

/// The player's body and view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Actor {
    pub feet: Vec3,
    pub eye_height: f32,
    pub look: Quat,
}

impl Actor {
    pub fn eye(&self) -> Vec3 {
        self.feet + Vec3::Y * self.eye_height
    }
}

/// Something the player can pick up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickTarget {
    Spawner(usize),
    Throwable,
}

/// Running totals, mostly for logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub pickups: u32,
    pub throws: u32,
    pub bounces: u32,
    pub smashes: u32,
    pub swallowed: u32,
}

pub struct Session {
    config: GameConfig,
    scene: Scene,
    actor: Actor,
    charge: ChargeMeter,
    throwable: Throwable,
    creature: TargetCreature,
    spawners: Vec<RespawnSpawner>,
    hud: Hud,
    /// Set by the first pickup, which schedules the creature's first mouth opening.
    game_started: bool,
    stats: SessionStats,
}

impl Session {
    pub fn new(config: GameConfig, rng: StdRng) -> Self {
        let mut scene = Scene::new(&config, rng);
        scene.build_static(&config.scene);

        let creature = TargetCreature::spawn(&mut scene, config.creature.clone());
        let throwable = Throwable::spawn(&mut scene, config.throw.clone());
        let spawners = config
            .spawn
            .zones
            .iter()
            .enumerate()
            .map(|(i, zone)| RespawnSpawner::new(&mut scene, i, *zone, &config.spawn))
            .collect();

        let actor = Actor {
            feet: Vec3::from_array(config.autoplay.throw_spot),
            eye_height: config.autoplay.eye_height,
            look: Quat::IDENTITY,
        };

        Self {
            charge: ChargeMeter::new(config.charge.clone()),
            scene,
            actor,
            throwable,
            creature,
            spawners,
            hud: Hud::new(),
            game_started: false,
            stats: SessionStats::default(),
            config,
        }
    }

    // ── Input ───────────────────────────────────────────────────────────

    /// Primary pressed: start charging if holding, otherwise pick up whatever
    /// is in reach.
    pub fn press_primary(&mut self) {
        if self.throwable.state() == ThrowableState::Held {
            self.charge.begin();
            self.hud.begin_charge();
            return;
        }
        if let Some(target) = self.pick_target() {
            self.pick_up(target);
        }
    }

    /// Primary released: throw with the current charge. Releases that don't
    /// end a charge session (e.g. the click that picked something up) do nothing.
    pub fn release_primary(&mut self, aim: Vec3) {
        if self.throwable.state() != ThrowableState::Held {
            return;
        }
        let Some(force) = self.charge.end() else {
            return;
        };
        self.hud.end_charge();
        self.throwable
            .release(&mut self.scene, &self.actor, aim.normalize_or_zero(), force);
        self.stats.throws += 1;
    }

    /// Nearest pickup within reach of the player's feet.
    pub fn pick_target(&self) -> Option<PickTarget> {
        let reach = self.config.throw.pickup_distance;
        let mut best: Option<(f32, PickTarget)> = None;
        let mut consider = |position: Option<Vec3>, target: PickTarget| {
            if let Some(p) = position {
                let d = p.distance(self.actor.feet);
                if d <= reach && best.map_or(true, |(bd, _)| d < bd) {
                    best = Some((d, target));
                }
            }
        };

        for spawner in self.spawners.iter().filter(|s| s.is_available()) {
            consider(
                spawner.position(&self.scene),
                PickTarget::Spawner(spawner.index()),
            );
        }
        if self.throwable.can_pick_up() {
            consider(
                self.throwable.body_position(&self.scene),
                PickTarget::Throwable,
            );
        }
        best.map(|(_, target)| target)
    }

    pub fn pick_up(&mut self, target: PickTarget) {
        if let PickTarget::Spawner(i) = target {
            match self.spawners.get_mut(i) {
                Some(spawner) if spawner.is_available() => spawner.on_picked_up(&mut self.scene),
                _ => return,
            }
        }
        self.throwable.pick_up(&mut self.scene, &self.actor);
        self.stats.pickups += 1;

        if !self.game_started {
            self.game_started = true;
            self.scene
                .timers
                .once(TimerSlot::GameStart, self.config.throw.game_start_delay());
            log::info!("Game starts in {:?}", self.config.throw.game_start_delay());
        }
    }

    // ── Frame ───────────────────────────────────────────────────────────

    /// Advance one frame: charge, held follow, physics and contacts, then timers.
    pub fn tick(&mut self, dt: Duration) {
        let secs = dt.as_secs_f32();

        if let Some(reading) = self.charge.tick(secs) {
            self.hud.update_power(reading);
        }

        self.throwable.follow_actor(&mut self.scene, &self.actor);

        for contact in self.throwable.update(&mut self.scene, secs) {
            match self.throwable.handle_contact(&mut self.scene, &contact) {
                ContactOutcome::Swallowed => {
                    self.stats.swallowed += 1;
                    self.creature.play_close_mouth(&mut self.scene);
                }
                ContactOutcome::Smashed => self.stats.smashes += 1,
                ContactOutcome::Bounced => self.stats.bounces += 1,
                ContactOutcome::Ignored => {}
            }
        }

        for slot in self.scene.advance_timers(dt) {
            self.dispatch(slot);
        }

        self.hud.update_health(self.creature.health());
    }

    fn dispatch(&mut self, slot: TimerSlot) {
        match slot {
            TimerSlot::ParkThrowable => self.throwable.park(&mut self.scene),
            TimerSlot::Respawn(i) => match self.spawners.get_mut(i) {
                Some(spawner) => spawner.on_respawn(&mut self.scene),
                None => log::debug!("Respawn timer for unknown spawner {}", i),
            },
            TimerSlot::GameStart
            | TimerSlot::MouthOpenPhysics
            | TimerSlot::ChewStart
            | TimerSlot::ChewEnd
            | TimerSlot::RecoverHealth => self.creature.on_timer(&mut self.scene, slot),
        }
    }

    /// Presentation cues raised since the last drain.
    pub fn drain_cues(&mut self) -> Vec<Cue> {
        self.scene.cues.drain()
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn actor_mut(&mut self) -> &mut Actor {
        &mut self.actor
    }

    pub fn charge(&self) -> &ChargeMeter {
        &self.charge
    }

    pub fn throwable(&self) -> &Throwable {
        &self.throwable
    }

    pub fn creature(&self) -> &TargetCreature {
        &self.creature
    }

    pub fn spawners(&self) -> &[RespawnSpawner] {
        &self.spawners
    }

    pub fn hud(&self) -> &Hud {
        &self.hud
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn game_started(&self) -> bool {
        self.game_started
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[cfg(test)]
    pub(crate) fn parts_mut(&mut self) -> (&mut Scene, &mut Throwable, &mut TargetCreature) {
        (&mut self.scene, &mut self.throwable, &mut self.creature)
    }
}
