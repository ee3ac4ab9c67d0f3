//! Pickup points that hand the player a pumpkin and come back later.
//!
//! Each spawner shows a placeholder somewhere random inside its plot. Picking
//! it up hides the placeholder under the ground and schedules its return at a
//! new random spot after a random wait.

use engine_core::{Entity, Name, Transform, Vec3, Visual};
use rand::prelude::*;

use crate::animation::{Animator, ClipSpec};
use crate::config::{SpawnConfig, SpawnZone};
use crate::scene::{Scene, TimerSlot};

const SPAWN_CLIPS: &[ClipSpec] = &[ClipSpec::once("Spawning")];

impl SpawnZone {
    /// Uniform point inside the rectangle at height `y`.
    pub fn random_point<R: Rng + ?Sized>(&self, rng: &mut R, y: f32) -> Vec3 {
        Vec3::new(
            rng.gen::<f32>() * (self.max_x - self.min_x) + self.min_x,
            y,
            rng.gen::<f32>() * (self.max_z - self.min_z) + self.min_z,
        )
    }
}

/// One pickup point bound to a zone.
pub struct RespawnSpawner {
    index: usize,
    zone: SpawnZone,
    entity: Entity,
    /// Placeholder is in its zone and can be picked up.
    available: bool,
    y_offset: f32,
    hidden_y: f32,
    respawn_min_ms: u64,
    respawn_max_ms: u64,
}

impl RespawnSpawner {
    /// Create spawner `index` with its placeholder already showing.
    pub fn new(scene: &mut Scene, index: usize, zone: SpawnZone, config: &SpawnConfig) -> Self {
        let position = zone.random_point(&mut scene.rng, config.y_offset);
        let rotation = scene.random_yaw();
        let entity = scene.world.spawn((
            Name("pumpkin_spawner"),
            Visual::new("models/pumpkin.glb"),
            Transform::from_position_rotation(position, rotation),
        ));
        scene
            .world
            .insert_one(entity, Animator::new(entity, SPAWN_CLIPS))
            .ok();
        scene.play_clip(entity, "Spawning");

        Self {
            index,
            zone,
            entity,
            available: true,
            y_offset: config.y_offset,
            hidden_y: config.hidden_y,
            respawn_min_ms: config.respawn_min_ms,
            respawn_max_ms: config.respawn_max_ms,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn position(&self, scene: &Scene) -> Option<Vec3> {
        scene.transform(self.entity).map(|t| t.position)
    }

    /// The player took this spawner's pumpkin: sink the placeholder and
    /// schedule its return.
    pub fn on_picked_up(&mut self, scene: &mut Scene) {
        if let Some(mut position) = self.position(scene) {
            position.y = self.hidden_y;
            scene.set_position(self.entity, position);
        }
        self.available = false;
        let delay = scene.random_duration(self.respawn_min_ms, self.respawn_max_ms);
        scene.timers.once(TimerSlot::Respawn(self.index), delay);
        log::debug!("Spawner {} respawns in {:?}", self.index, delay);
    }

    /// Timer expiry: reappear somewhere new in the zone.
    pub fn on_respawn(&mut self, scene: &mut Scene) {
        if self.available {
            log::debug!("Stale respawn timer for spawner {}", self.index);
            return;
        }
        let position = self.zone.random_point(&mut scene.rng, self.y_offset);
        let rotation = scene.random_yaw();
        scene.set_transform(
            self.entity,
            Transform::from_position_rotation(position, rotation),
        );
        scene.set_visible(self.entity, true);
        scene.play_clip(self.entity, "Spawning");
        self.available = true;
        log::info!("Spawner {} respawned at {:?}", self.index, position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use rand::rngs::StdRng;
    use std::time::Duration;

    fn setup() -> (Scene, RespawnSpawner, SpawnConfig) {
        let config = GameConfig::default();
        let mut scene = Scene::new(&config, StdRng::seed_from_u64(5));
        let spawn = config.spawn.clone();
        let spawner = RespawnSpawner::new(&mut scene, 2, spawn.zones[2], &spawn);
        (scene, spawner, spawn)
    }

    #[test]
    fn random_points_stay_inside_the_zone() {
        let zone = SpawnZone::new(3.5, 10.5, 6.5, 16.0);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..500 {
            let p = zone.random_point(&mut rng, 0.6);
            assert!(zone.contains(p.x, p.z));
            assert_eq!(p.y, 0.6);
        }
    }

    #[test]
    fn pickup_hides_and_schedules_respawn_in_range() {
        let (mut scene, mut spawner, spawn) = setup();
        assert!(spawner.is_available());
        assert!(spawn.zones[2].contains(
            spawner.position(&scene).unwrap().x,
            spawner.position(&scene).unwrap().z
        ));

        spawner.on_picked_up(&mut scene);
        assert!(!spawner.is_available());
        assert_eq!(spawner.position(&scene).unwrap().y, -5.0);
        let wait = scene.timers.remaining(TimerSlot::Respawn(2)).unwrap();
        assert!(wait >= Duration::from_millis(8000) && wait < Duration::from_millis(24000));
    }

    #[test]
    fn respawn_returns_to_zone_and_replays_spawn_clip() {
        let (mut scene, mut spawner, spawn) = setup();
        spawner.on_picked_up(&mut scene);
        let fired = scene.advance_timers(Duration::from_millis(24_000));
        assert_eq!(fired, vec![TimerSlot::Respawn(2)]);
        scene.cues.drain();

        spawner.on_respawn(&mut scene);
        let p = spawner.position(&scene).unwrap();
        assert!(spawner.is_available());
        assert_eq!(p.y, spawn.y_offset);
        assert!(spawn.zones[2].contains(p.x, p.z));
        assert_eq!(
            crate::cues::clips_started(&scene.cues.drain()),
            vec!["Spawning"]
        );
    }

    #[test]
    fn stale_respawn_leaves_an_available_spawner_alone() {
        let (mut scene, mut spawner, _) = setup();
        let before = spawner.position(&scene).unwrap();
        spawner.on_respawn(&mut scene);
        assert_eq!(spawner.position(&scene).unwrap(), before);
    }
}
