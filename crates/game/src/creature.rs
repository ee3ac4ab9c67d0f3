//! The target creature: a timer-driven stage machine with health, where each
//! stage owns exactly one set of physics bodies.
//!
//! Stage changes all go through [`TargetCreature::enter`], which stops every
//! clip and every creature sound before the new stage starts its own.

use engine_core::{Entity, Name, Quat, Transform, Vec3, Visual};
use physics::{BodyTag, PhysicsBody, PhysicsWorld, StaticBodyDesc};

use crate::animation::{Animator, ClipSpec};
use crate::config::{ColliderConfig, CreatureConfig};
use crate::cues::SoundId;
use crate::scene::{Scene, TimerSlot};

const CREATURE_CLIPS: &[ClipSpec] = &[
    ClipSpec::looping("Chewing"),
    ClipSpec::once("Dying"),
    ClipSpec::looping("Idle_BlinkEyes"),
    ClipSpec::looping("Idle_Breath"),
    ClipSpec::looping("Idle_HandL"),
    ClipSpec::looping("Idle_HandR"),
    ClipSpec::looping("Idle_Head"),
    ClipSpec::once("OpenMouth"),
    ClipSpec::once("OpenMouth_Close"),
    ClipSpec::once("OpenMouth_Loop"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatureStage {
    Idle,
    MouthOpen,
    MouthClosing,
    Chewing,
    /// Terminal.
    Dying,
}

/// Which group of colliders is registered with the physics world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodySet {
    /// Closed-mouth hull.
    Closed,
    /// Open-mouth hull plus the interior sensor.
    Open,
    /// Collapsed pose.
    Dying,
}

/// Body descriptions for each set, resolved to world space once at spawn.
#[derive(Debug, Clone)]
struct BodyLayout {
    closed: Vec<StaticBodyDesc>,
    open: Vec<StaticBodyDesc>,
    dying: Vec<StaticBodyDesc>,
}

impl BodyLayout {
    fn from_config(config: &CreatureConfig) -> Self {
        let origin = config.origin();
        let yaw = config.yaw_degrees.to_radians();
        let desc = |tag: BodyTag, collider: &ColliderConfig, sensor: bool| StaticBodyDesc {
            tag,
            position: origin + Vec3::from_array(collider.offset),
            rotation_y: yaw,
            shape: collider.shape.into(),
            sensor,
        };
        Self {
            closed: vec![desc(BodyTag::CreatureMouthClosed, &config.closed_body, false)],
            open: vec![
                desc(BodyTag::CreatureMouthOpen, &config.open_body, false),
                desc(BodyTag::CreatureInterior, &config.interior_body, true),
            ],
            dying: vec![desc(BodyTag::CreatureDying, &config.dying_body, false)],
        }
    }

    fn descs(&self, set: BodySet) -> &[StaticBodyDesc] {
        match set {
            BodySet::Closed => &self.closed,
            BodySet::Open => &self.open,
            BodySet::Dying => &self.dying,
        }
    }
}

pub struct TargetCreature {
    entity: Entity,
    stage: CreatureStage,
    health: f32,

    // ── Physics ─────────────────────────────────────────────────────────
    layout: BodyLayout,
    body_set: BodySet,
    bodies: Vec<PhysicsBody>,

    audio_position: Vec3,
    config: CreatureConfig,
}

impl TargetCreature {
    /// Place the creature idle, closed-mouthed, with recovery ticking.
    pub fn spawn(scene: &mut Scene, config: CreatureConfig) -> Self {
        let rotation = Quat::from_rotation_y(config.yaw_degrees.to_radians());
        let entity = scene.world.spawn((
            Name("monster"),
            Visual::new("models/monster.glb"),
            Transform::from_position_rotation(config.origin(), rotation),
        ));
        scene
            .world
            .insert_one(entity, Animator::new(entity, CREATURE_CLIPS))
            .ok();

        let layout = BodyLayout::from_config(&config);
        let bodies = register(&mut scene.physics, layout.descs(BodySet::Closed));

        let mut creature = Self {
            entity,
            stage: CreatureStage::Idle,
            health: config.max_health,
            layout,
            body_set: BodySet::Closed,
            bodies,
            audio_position: Vec3::from_array(config.audio_position),
            config,
        };
        creature.enter(scene, CreatureStage::Idle);
        scene
            .timers
            .repeat(TimerSlot::RecoverHealth, creature.config.recovery_interval());
        creature
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn stage(&self) -> CreatureStage {
        self.stage
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn body_set(&self) -> BodySet {
        self.body_set
    }

    pub fn is_dying(&self) -> bool {
        self.stage == CreatureStage::Dying
    }

    /// Open and ready to swallow: the open hull and mouth sensor are live.
    pub fn mouth_is_open(&self) -> bool {
        self.stage == CreatureStage::MouthOpen && self.body_set == BodySet::Open
    }

    /// Centre of the mouth sensor in world space.
    pub fn mouth_target(&self) -> Vec3 {
        self.config.origin() + Vec3::from_array(self.config.interior_body.offset)
    }

    /// Begin a mouth-open cycle. Only from Idle (game start) or after chewing.
    pub fn open_mouth(&mut self, scene: &mut Scene) {
        match self.stage {
            CreatureStage::Idle | CreatureStage::Chewing => {
                self.enter(scene, CreatureStage::MouthOpen)
            }
            other => log::debug!("open_mouth ignored in {:?}", other),
        }
    }

    /// Something landed in the mouth: close it and start chewing shortly after.
    pub fn play_close_mouth(&mut self, scene: &mut Scene) {
        if self.stage != CreatureStage::MouthOpen {
            log::debug!("close_mouth ignored in {:?}", self.stage);
            return;
        }
        self.enter(scene, CreatureStage::MouthClosing);
    }

    /// Dispatch a fired timer. Timers that no longer match the stage are dropped.
    pub fn on_timer(&mut self, scene: &mut Scene, slot: TimerSlot) {
        match slot {
            TimerSlot::GameStart => self.open_mouth(scene),
            TimerSlot::MouthOpenPhysics => {
                if self.stage == CreatureStage::MouthOpen {
                    self.swap_to(&mut scene.physics, BodySet::Open);
                } else {
                    log::debug!("Stale mouth-open physics timer in {:?}", self.stage);
                }
            }
            TimerSlot::ChewStart => {
                if self.stage == CreatureStage::MouthClosing {
                    self.enter(scene, CreatureStage::Chewing);
                } else {
                    log::debug!("Stale chew-start timer in {:?}", self.stage);
                }
            }
            TimerSlot::ChewEnd => {
                if self.stage == CreatureStage::Chewing {
                    self.enter(scene, CreatureStage::MouthOpen);
                } else {
                    log::debug!("Stale chew-end timer in {:?}", self.stage);
                }
            }
            TimerSlot::RecoverHealth => self.recover_tick(),
            TimerSlot::ParkThrowable | TimerSlot::Respawn(_) => {}
        }
    }

    /// Slow regeneration. Does nothing once dead or nearly full.
    pub fn recover_tick(&mut self) {
        if self.health <= 0.0 || self.health >= self.config.recovery_ceiling {
            return;
        }
        self.health = (self.health + self.config.recovery_amount).min(self.config.max_health);
    }

    /// Force the terminal stage. Idempotent.
    pub fn die(&mut self, scene: &mut Scene) {
        if self.stage != CreatureStage::Dying {
            self.enter(scene, CreatureStage::Dying);
        }
    }

    #[cfg(test)]
    pub(crate) fn set_health(&mut self, health: f32) {
        self.health = health;
    }

    /// Stop all clips and creature audio, then run the entry actions of `stage`.
    fn enter(&mut self, scene: &mut Scene, stage: CreatureStage) {
        scene.stop_clips(self.entity);
        for sound in SoundId::ALL.into_iter().filter(|s| s.is_creature()) {
            scene.cues.stop_sound(sound);
        }
        log::info!("Creature {:?} -> {:?} (health {:.1})", self.stage, stage, self.health);
        self.stage = stage;
        let at = Some(self.audio_position);

        match stage {
            CreatureStage::Idle => {
                scene.cues.play_looping(SoundId::CreatureIdle, at);
                scene.play_clip(self.entity, "Idle_BlinkEyes");
            }
            CreatureStage::MouthOpen => {
                scene.cues.play_once(SoundId::MouthOpen, at);
                scene.play_clip(self.entity, "OpenMouth");
                scene.timers.once(
                    TimerSlot::MouthOpenPhysics,
                    self.config.mouth_open_physics_delay(),
                );
            }
            CreatureStage::MouthClosing => {
                scene.timers.cancel(TimerSlot::MouthOpenPhysics);
                self.swap_to(&mut scene.physics, BodySet::Closed);
                scene.cues.play_once(SoundId::MouthClose, at);
                scene.play_clip(self.entity, "OpenMouth_Close");
                scene
                    .timers
                    .once(TimerSlot::ChewStart, self.config.close_to_chew_delay());
            }
            CreatureStage::Chewing => {
                scene.cues.play_looping(SoundId::Chewing, at);
                scene.play_clip(self.entity, "Chewing");
                self.health -= self.config.bite_damage;
                if self.health <= 0.0 {
                    self.enter(scene, CreatureStage::Dying);
                    return;
                }
                let chew = scene.random_duration(self.config.chew_min_ms, self.config.chew_max_ms);
                scene.timers.once(TimerSlot::ChewEnd, chew);
            }
            CreatureStage::Dying => {
                for slot in [
                    TimerSlot::MouthOpenPhysics,
                    TimerSlot::ChewStart,
                    TimerSlot::ChewEnd,
                ] {
                    scene.timers.cancel(slot);
                }
                self.swap_to(&mut scene.physics, BodySet::Dying);
                scene.cues.play_once(SoundId::Dying, at);
                scene.play_clip(self.entity, "Dying");
            }
        }
    }

    /// Remove the outgoing bodies, then register the incoming set.
    fn swap_to(&mut self, physics: &mut PhysicsWorld, set: BodySet) {
        if self.body_set == set && !self.bodies.is_empty() {
            return;
        }
        for body in self.bodies.drain(..) {
            physics.remove_body(body.rigid_body);
        }
        self.bodies = register(physics, self.layout.descs(set));
        log::debug!("Creature bodies {:?} -> {:?}", self.body_set, set);
        self.body_set = set;
    }
}

fn register(physics: &mut PhysicsWorld, descs: &[StaticBodyDesc]) -> Vec<PhysicsBody> {
    descs.iter().map(|d| physics.add_static_body(d)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::cues::{clips_started, sounds_started, Cue};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;

    fn setup() -> (Scene, TargetCreature) {
        let config = GameConfig::default();
        let mut scene = Scene::new(&config, StdRng::seed_from_u64(11));
        let creature = TargetCreature::spawn(&mut scene, config.creature.clone());
        (scene, creature)
    }

    /// Advance timers and feed everything that fired back to the creature.
    fn run(scene: &mut Scene, creature: &mut TargetCreature, ms: u64) {
        for slot in scene.advance_timers(Duration::from_millis(ms)) {
            creature.on_timer(scene, slot);
        }
    }

    fn registered(scene: &Scene) -> [usize; 4] {
        [
            scene.physics.count_tagged(BodyTag::CreatureMouthClosed),
            scene.physics.count_tagged(BodyTag::CreatureMouthOpen),
            scene.physics.count_tagged(BodyTag::CreatureInterior),
            scene.physics.count_tagged(BodyTag::CreatureDying),
        ]
    }

    #[test]
    fn spawns_idle_closed_with_idle_sound_and_blink() {
        let (mut scene, creature) = setup();
        assert_eq!(creature.stage(), CreatureStage::Idle);
        assert_eq!(registered(&scene), [1, 0, 0, 0]);
        let cues = scene.cues.drain();
        assert!(sounds_started(&cues).contains(&SoundId::CreatureIdle));
        assert_eq!(clips_started(&cues), vec!["Idle_BlinkEyes"]);
        assert!(scene.timers.is_pending(TimerSlot::RecoverHealth));
    }

    #[test]
    fn open_mouth_swaps_bodies_after_the_delay() {
        let (mut scene, mut creature) = setup();
        creature.open_mouth(&mut scene);
        assert_eq!(creature.stage(), CreatureStage::MouthOpen);
        run(&mut scene, &mut creature, 829);
        assert_eq!(registered(&scene), [1, 0, 0, 0]);
        run(&mut scene, &mut creature, 1);
        assert_eq!(registered(&scene), [0, 1, 1, 0]);
        assert!(creature.mouth_is_open());
    }

    #[test]
    fn every_stage_change_stops_clips_and_creature_audio_first() {
        let (mut scene, mut creature) = setup();
        scene.cues.drain();
        creature.open_mouth(&mut scene);
        let cues = scene.cues.drain();

        let first_play = cues
            .iter()
            .position(|c| matches!(c, Cue::PlaySound { .. } | Cue::PlayClip { .. }))
            .unwrap();
        assert!(cues[..first_play]
            .iter()
            .any(|c| matches!(c, Cue::StopClip { clip: "Idle_BlinkEyes", .. })));
        assert!(cues[..first_play]
            .iter()
            .any(|c| *c == Cue::StopSound(SoundId::CreatureIdle)));
        assert_eq!(clips_started(&cues), vec!["OpenMouth"]);
    }

    #[test]
    fn close_then_chew_costs_one_bite_and_reopens() {
        let (mut scene, mut creature) = setup();
        scene.timers.cancel(TimerSlot::RecoverHealth);
        creature.open_mouth(&mut scene);
        run(&mut scene, &mut creature, 830);

        creature.play_close_mouth(&mut scene);
        assert_eq!(creature.stage(), CreatureStage::MouthClosing);
        assert_eq!(registered(&scene), [1, 0, 0, 0]);

        run(&mut scene, &mut creature, 233);
        assert_eq!(creature.stage(), CreatureStage::Chewing);
        assert_eq!(creature.health(), 90.0);
        let chew = scene.timers.remaining(TimerSlot::ChewEnd).unwrap();
        assert!(chew >= Duration::from_millis(4000) && chew < Duration::from_millis(7500));

        run(&mut scene, &mut creature, 7500);
        assert_eq!(creature.stage(), CreatureStage::MouthOpen);
    }

    #[test]
    fn close_mouth_outside_mouth_open_is_ignored() {
        let (mut scene, mut creature) = setup();
        creature.play_close_mouth(&mut scene);
        assert_eq!(creature.stage(), CreatureStage::Idle);
        assert!(!scene.timers.is_pending(TimerSlot::ChewStart));
    }

    #[test]
    fn last_bite_kills_and_dying_is_terminal() {
        let (mut scene, mut creature) = setup();
        creature.set_health(5.0);
        creature.open_mouth(&mut scene);
        run(&mut scene, &mut creature, 830);
        creature.play_close_mouth(&mut scene);
        // The first recovery tick lands in this same batch, after the bite.
        run(&mut scene, &mut creature, 233);

        assert_eq!(creature.stage(), CreatureStage::Dying);
        assert_eq!(creature.health(), -5.0);
        assert_eq!(registered(&scene), [0, 0, 0, 1]);
        assert!(!scene.timers.is_pending(TimerSlot::ChewEnd));

        // Nothing moves it out of Dying, and health stays put.
        creature.open_mouth(&mut scene);
        creature.play_close_mouth(&mut scene);
        creature.die(&mut scene);
        run(&mut scene, &mut creature, 60_000);
        assert_eq!(creature.stage(), CreatureStage::Dying);
        assert_eq!(creature.health(), -5.0);
        assert_eq!(registered(&scene), [0, 0, 0, 1]);
    }

    #[test]
    fn recovery_climbs_slowly_and_stops_below_ceiling() {
        let (mut scene, mut creature) = setup();
        creature.set_health(50.0);
        run(&mut scene, &mut creature, 10_000);
        assert!((creature.health() - 52.0).abs() < 1e-3);

        creature.set_health(97.9);
        run(&mut scene, &mut creature, 5_000);
        assert!((creature.health() - 98.1).abs() < 1e-3);
        assert!(creature.health() <= 100.0);
    }

    #[test]
    fn body_sets_never_overlap_through_a_full_cycle() {
        let (mut scene, mut creature) = setup();
        let exclusive = |scene: &Scene| {
            let [closed, open, interior, dying] = registered(scene);
            let sets = [closed > 0, open > 0 || interior > 0, dying > 0];
            sets.iter().filter(|s| **s).count() == 1
        };
        assert!(exclusive(&scene));
        creature.open_mouth(&mut scene);
        for _ in 0..3 {
            run(&mut scene, &mut creature, 830);
            assert!(exclusive(&scene));
            creature.play_close_mouth(&mut scene);
            assert!(exclusive(&scene));
            run(&mut scene, &mut creature, 7_800);
            assert!(exclusive(&scene));
        }
        creature.die(&mut scene);
        assert!(exclusive(&scene));
    }
}
