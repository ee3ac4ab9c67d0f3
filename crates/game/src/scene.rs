//! Shared scene state: ECS world, physics, timers, cues and the session RNG.
//!
//! Gameplay objects own handles into the scene and receive `&mut Scene` when
//! they act. Nothing here knows about throwables or creatures beyond the timer
//! slot names.

use std::time::Duration;

use engine_core::{Entity, Name, Quat, Scheduler, Transform, Vec3, Visual, World};
use physics::PhysicsWorld;
use rand::rngs::StdRng;
use rand::Rng;

use crate::animation::Animator;
use crate::config::{GameConfig, SceneConfig};
use crate::cues::{CueQueue, SoundId};

/// Every timer the session can have pending. Each slot holds at most one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerSlot {
    /// First pickup to the creature's first mouth opening.
    GameStart,
    /// Mouth animation far enough along to swap to the open body set.
    MouthOpenPhysics,
    /// Mouth has closed; chewing begins.
    ChewStart,
    /// Chewing is over; the mouth reopens.
    ChewEnd,
    /// Slow health regeneration.
    RecoverHealth,
    /// Move a smashed throwable out of play.
    ParkThrowable,
    /// Bring spawner `n` back.
    Respawn(usize),
}

pub struct Scene {
    pub world: World,
    pub physics: PhysicsWorld,
    pub timers: Scheduler<TimerSlot>,
    pub cues: CueQueue,
    pub rng: StdRng,
}

impl Scene {
    pub fn new(config: &GameConfig, rng: StdRng) -> Self {
        let physics = PhysicsWorld::with_settings(
            config.physics.gravity,
            config.physics.fixed_step,
            config.physics.max_substeps,
        );
        Self {
            world: World::new(),
            physics,
            timers: Scheduler::new(),
            cues: CueQueue::new(),
            rng,
        }
    }

    /// Register the ground, farm obstacles and their visuals, and start the music.
    pub fn build_static(&mut self, config: &SceneConfig) {
        self.physics.add_ground_plane();
        self.world.spawn((
            Name("farm"),
            Visual::new("models/farm.glb"),
            Transform::default(),
        ));
        self.world.spawn((
            Name("scarecrow"),
            Visual::new("models/scarecrow.glb"),
            Transform::default(),
        ));

        for obstacle in &config.obstacles {
            self.physics.add_static_cuboid(
                Vec3::from_array(obstacle.position),
                obstacle.rotation_y_degrees.to_radians(),
                Vec3::from_array(obstacle.half_extents),
            );
        }
        log::info!(
            "Scene built: ground plane + {} obstacles",
            config.obstacles.len()
        );

        self.cues.play_looping(
            SoundId::Music,
            Some(Vec3::from_array(config.music_position)),
        );
    }

    /// Advance the timer clock. Fired slots come back in fire order, except
    /// that health recovery always runs after everything else that fired in
    /// the same tick.
    pub fn advance_timers(&mut self, dt: Duration) -> Vec<TimerSlot> {
        let (mut fired, recover): (Vec<_>, Vec<_>) = self
            .timers
            .advance(dt)
            .into_iter()
            .partition(|slot| *slot != TimerSlot::RecoverHealth);
        fired.extend(recover);
        fired
    }

    /// Uniform duration in `[min_ms, max_ms)`.
    pub fn random_duration(&mut self, min_ms: u64, max_ms: u64) -> Duration {
        if max_ms <= min_ms {
            return Duration::from_millis(min_ms);
        }
        Duration::from_millis(self.rng.gen_range(min_ms..max_ms))
    }

    /// Random rotation about +Y.
    pub fn random_yaw(&mut self) -> Quat {
        Quat::from_rotation_y(self.rng.gen::<f32>() * std::f32::consts::TAU)
    }

    // ── Entity helpers ──────────────────────────────────────────────────

    pub fn transform(&self, entity: Entity) -> Option<Transform> {
        self.world.get::<&Transform>(entity).ok().map(|t| *t)
    }

    pub fn set_transform(&mut self, entity: Entity, transform: Transform) {
        if let Ok(mut t) = self.world.get::<&mut Transform>(entity) {
            *t = transform;
        }
    }

    pub fn set_position(&mut self, entity: Entity, position: Vec3) {
        if let Ok(mut t) = self.world.get::<&mut Transform>(entity) {
            t.position = position;
        }
    }

    pub fn set_visible(&mut self, entity: Entity, visible: bool) {
        if let Ok(mut v) = self.world.get::<&mut Visual>(entity) {
            v.visible = visible;
        }
    }

    pub fn is_visible(&self, entity: Entity) -> bool {
        self.world
            .get::<&Visual>(entity)
            .map(|v| v.visible)
            .unwrap_or(false)
    }

    /// Stop every clip on `entity`, then play `clip`.
    pub fn play_clip(&mut self, entity: Entity, clip: &str) {
        match self.world.get::<&mut Animator>(entity) {
            Ok(mut animator) => animator.play_exclusive(clip, &mut self.cues),
            Err(_) => log::warn!("{:?} has no animator, can't play '{}'", entity, clip),
        }
    }

    pub fn stop_clips(&mut self, entity: Entity) {
        if let Ok(mut animator) = self.world.get::<&mut Animator>(entity) {
            animator.stop_all(&mut self.cues);
        }
    }

    pub fn is_clip_playing(&self, entity: Entity, clip: &str) -> bool {
        self.world
            .get::<&Animator>(entity)
            .map(|a| a.is_playing(clip))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use physics::BodyTag;
    use rand::SeedableRng;

    fn scene() -> Scene {
        Scene::new(&GameConfig::default(), StdRng::seed_from_u64(7))
    }

    #[test]
    fn recovery_runs_after_other_timers_fired_in_the_same_tick() {
        let mut scene = scene();
        scene.timers.repeat(TimerSlot::RecoverHealth, Duration::from_millis(1000));
        scene.timers.once(TimerSlot::ChewStart, Duration::from_millis(1000));
        scene.timers.once(TimerSlot::Respawn(2), Duration::from_millis(1500));

        let fired = scene.advance_timers(Duration::from_millis(1600));
        assert_eq!(
            fired,
            vec![
                TimerSlot::ChewStart,
                TimerSlot::Respawn(2),
                TimerSlot::RecoverHealth
            ]
        );
    }

    #[test]
    fn static_scene_registers_terrain_and_music() {
        let mut scene = scene();
        let config = SceneConfig::default();
        scene.build_static(&config);
        assert_eq!(
            scene.physics.count_tagged(BodyTag::Terrain),
            1 + config.obstacles.len()
        );
        let cues = scene.cues.drain();
        assert_eq!(crate::cues::sounds_started(&cues), vec![SoundId::Music]);
    }

    #[test]
    fn random_duration_stays_in_range() {
        let mut scene = scene();
        for _ in 0..200 {
            let d = scene.random_duration(4000, 7500);
            assert!(d >= Duration::from_millis(4000) && d < Duration::from_millis(7500));
        }
        assert_eq!(scene.random_duration(500, 500), Duration::from_millis(500));
    }
}
