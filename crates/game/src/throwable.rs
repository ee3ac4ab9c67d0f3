//! The throwable pumpkin: held / in-flight lifecycle, contact classification
//! and smash handling.

use engine_core::{Entity, Name, Transform, Vec3, Visual};
use physics::{BallBodyDesc, BodyTag, Contact, PhysicsBody};
use rand::seq::SliceRandom;

use crate::animation::{Animator, ClipSpec};
use crate::config::ThrowConfig;
use crate::cues::SoundId;
use crate::scene::{Scene, TimerSlot};
use crate::session::Actor;

const BODY_CLIPS: &[ClipSpec] = &[ClipSpec::once("Spawning")];
const SMASH_CLIPS: &[ClipSpec] = &[ClipSpec::once("Smashing")];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrowableState {
    /// Out of play at the park position, waiting to be handed to the player.
    Parked,
    /// Attached to the player's view; no physics.
    Held,
    /// Released and simulated.
    InFlight,
    /// Still simulated, but slow enough to glow and be picked up again.
    Resting,
    /// Broken; contacts are ignored until the next pickup.
    Smashed,
}

impl ThrowableState {
    /// States in which the physics world is stepped for this body.
    pub fn is_thrown(self) -> bool {
        matches!(
            self,
            ThrowableState::InFlight | ThrowableState::Resting | ThrowableState::Smashed
        )
    }
}

/// What a single contact did to the throwable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    /// Not in a state that reacts to contacts.
    Ignored,
    /// Hit something soft enough to survive.
    Bounced,
    /// Hit something hard enough to break.
    Smashed,
    /// Landed inside the creature's mouth.
    Swallowed,
}

pub struct Throwable {
    entity: Entity,
    glow: Entity,
    smash: Entity,
    body: PhysicsBody,
    state: ThrowableState,
    /// Force captured at release, used by the first hard contact.
    impact_force: f32,
    last_impulse: Vec3,
    config: ThrowConfig,
}

impl Throwable {
    /// Create the throwable parked out of play with its body asleep.
    pub fn spawn(scene: &mut Scene, config: ThrowConfig) -> Self {
        let park = Vec3::from_array(config.park_position);
        let body = scene.physics.add_ball_body(&BallBodyDesc {
            tag: BodyTag::Throwable,
            position: park,
            radius: config.radius,
            mass: config.mass,
            linear_damping: config.linear_damping,
            angular_damping: config.angular_damping,
            friction: config.friction,
            restitution: config.restitution,
        });
        scene.physics.sleep(body.rigid_body);

        let entity = scene.world.spawn((
            Name("pumpkin"),
            Visual::hidden("models/pumpkin.glb"),
            Transform::from_position(park),
        ));
        scene
            .world
            .insert_one(entity, Animator::new(entity, BODY_CLIPS))
            .ok();

        let glow = scene.world.spawn((
            Name("pumpkin_glow"),
            Visual::new("models/pumpkinGlow.glb"),
            Transform::from_position(park).with_uniform_scale(0.0),
        ));

        let smash = scene.world.spawn((
            Name("pumpkin_smash"),
            Visual::new("models/pumpkinSmash.glb"),
            Transform::from_position(park).with_uniform_scale(0.0),
        ));
        scene
            .world
            .insert_one(smash, Animator::new(smash, SMASH_CLIPS))
            .ok();

        Self {
            entity,
            glow,
            smash,
            body,
            state: ThrowableState::Parked,
            impact_force: 0.0,
            last_impulse: Vec3::ZERO,
            config,
        }
    }

    pub fn state(&self) -> ThrowableState {
        self.state
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn smash_entity(&self) -> Entity {
        self.smash
    }

    pub fn body(&self) -> PhysicsBody {
        self.body
    }

    pub fn impact_force(&self) -> f32 {
        self.impact_force
    }

    /// Impulse applied by the last release.
    pub fn last_impulse(&self) -> Vec3 {
        self.last_impulse
    }

    /// World position of the physics body.
    pub fn body_position(&self, scene: &Scene) -> Option<Vec3> {
        scene
            .physics
            .get_body_transform(self.body.rigid_body)
            .map(|t| t.position)
    }

    pub fn is_glowing(&self, scene: &Scene) -> bool {
        scene
            .transform(self.glow)
            .map(|t| !t.is_collapsed())
            .unwrap_or(false)
    }

    pub fn is_smash_visible(&self, scene: &Scene) -> bool {
        scene
            .transform(self.smash)
            .map(|t| !t.is_collapsed())
            .unwrap_or(false)
    }

    /// A settled throwable can be picked up straight off the ground.
    pub fn can_pick_up(&self) -> bool {
        self.state == ThrowableState::Resting
    }

    /// Take the throwable into the player's hands. Callers check `can_pick_up`
    /// or hand it over from a spawner.
    pub fn pick_up(&mut self, scene: &mut Scene, actor: &Actor) {
        scene.physics.sleep(self.body.rigid_body);
        scene.timers.cancel(TimerSlot::ParkThrowable);
        self.state = ThrowableState::Held;

        self.set_glow(scene, false);
        scene.stop_clips(self.smash);
        self.set_smash_scale(scene, 0.0);
        scene.set_visible(self.entity, true);
        scene.play_clip(self.entity, "Spawning");
        scene.cues.play_once(SoundId::PickUp, None);

        self.follow_actor(scene, actor);
        log::info!("Pumpkin picked up");
    }

    /// Keep a held throwable at its offset in front of the view.
    pub fn follow_actor(&self, scene: &mut Scene, actor: &Actor) {
        if self.state != ThrowableState::Held {
            return;
        }
        let view = Transform::from_position_rotation(actor.eye(), actor.look);
        let position = view.transform_point(Vec3::from_array(self.config.held_offset));
        scene.set_transform(self.entity, Transform { position, ..view });
        self.sync_children(scene, position);
    }

    /// Throw along `aim` with the charge `force`, clamped to the maximum.
    pub fn release(&mut self, scene: &mut Scene, actor: &Actor, aim: Vec3, force: f32) {
        let force = force.clamp(0.0, self.config.max_force);
        self.impact_force = force;
        self.state = ThrowableState::InFlight;

        let handle = self.body.rigid_body;
        scene.physics.wake_up(handle);
        scene.physics.stop_body(handle);

        let start = Vec3::new(
            actor.feet.x + aim.x,
            actor.eye().y + aim.y,
            actor.feet.z + aim.z,
        );
        scene.physics.set_body_position(handle, start);

        let impulse = aim * force * self.config.strength_multiplier;
        scene.physics.apply_impulse_at_point(handle, impulse, start);
        self.last_impulse = impulse;

        scene.set_position(self.entity, start);
        self.sync_children(scene, start);
        scene.cues.play_once(SoundId::Throw, None);
        log::info!("Pumpkin thrown with force {:.1}", force);
    }

    /// Step physics while thrown, copy the body onto the visual and switch the
    /// glow on once it has nearly stopped. Returns contacts that began this tick.
    pub fn update(&mut self, scene: &mut Scene, dt: f32) -> Vec<Contact> {
        if !self.state.is_thrown() {
            return Vec::new();
        }
        let handle = self.body.rigid_body;
        scene.physics.step_elapsed(dt);

        if let Some(body) = scene.physics.get_body_transform(handle) {
            scene.set_transform(self.entity, body);
            self.sync_children(scene, body.position);
        }

        if self.state == ThrowableState::InFlight && !scene.physics.is_sleeping(handle) {
            let tol = self.config.rest_speed_tolerance;
            let settled = scene
                .physics
                .linear_velocity(handle)
                .map(|v| v.abs().cmple(Vec3::splat(tol)).all())
                .unwrap_or(false);
            if settled {
                self.state = ThrowableState::Resting;
                self.set_glow(scene, true);
                log::debug!("Pumpkin settling, glow on");
            }
        }

        scene.physics.take_contacts(self.body.collider)
    }

    /// Classify one contact and react to it.
    pub fn handle_contact(&mut self, scene: &mut Scene, contact: &Contact) -> ContactOutcome {
        if !matches!(
            self.state,
            ThrowableState::InFlight | ThrowableState::Resting
        ) {
            return ContactOutcome::Ignored;
        }

        if contact.other_tag == Some(BodyTag::CreatureInterior) {
            log::info!("Pumpkin landed in the mouth");
            self.smash(scene);
            return ContactOutcome::Swallowed;
        }

        let at = self.body_position(scene);
        if let Some(sound) = SoundId::HIT_GROUND.choose(&mut scene.rng) {
            scene.cues.play_once(*sound, at);
        }
        if self.impact_force > self.config.smash_threshold {
            self.smash(scene);
            ContactOutcome::Smashed
        } else {
            ContactOutcome::Bounced
        }
    }

    /// Break the throwable. Repeated calls do nothing.
    pub fn smash(&mut self, scene: &mut Scene) {
        if self.state == ThrowableState::Smashed {
            return;
        }
        self.state = ThrowableState::Smashed;

        let at = self.body_position(scene);
        scene.cues.play_once(SoundId::Splat, at);
        self.set_glow(scene, false);
        scene.stop_clips(self.entity);
        scene.set_visible(self.entity, false);
        self.set_smash_scale(scene, 1.0);
        scene.play_clip(self.smash, "Smashing");

        scene.physics.stop_body(self.body.rigid_body);
        scene.physics.sleep(self.body.rigid_body);
        scene
            .timers
            .once(TimerSlot::ParkThrowable, self.config.park_delay());
        log::info!("Pumpkin smashed");
    }

    /// Delayed part of a smash: move the body somewhere it can't collide.
    /// Does nothing unless still smashed.
    pub fn park(&mut self, scene: &mut Scene) {
        if self.state != ThrowableState::Smashed {
            log::debug!("Stale park timer ignored ({:?})", self.state);
            return;
        }
        let park = Vec3::from_array(self.config.park_position);
        scene.physics.set_body_position(self.body.rigid_body, park);
        scene.physics.sleep(self.body.rigid_body);
        scene.set_position(self.entity, park);
        self.sync_children(scene, park);
        self.state = ThrowableState::Parked;
        log::debug!("Smashed pumpkin parked at {:?}", park);
    }

    fn set_glow(&self, scene: &mut Scene, on: bool) {
        if let Some(mut t) = scene.transform(self.glow) {
            t.scale = Vec3::splat(if on { 1.0 } else { 0.0 });
            scene.set_transform(self.glow, t);
        }
    }

    fn set_smash_scale(&self, scene: &mut Scene, scale: f32) {
        if let Some(mut t) = scene.transform(self.smash) {
            t.scale = Vec3::splat(scale);
            scene.set_transform(self.smash, t);
        }
    }

    /// Glow and smash models are children of the main model.
    fn sync_children(&self, scene: &mut Scene, position: Vec3) {
        scene.set_position(self.glow, position);
        scene.set_position(self.smash, position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::cues::sounds_started;
    use engine_core::Quat;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn setup() -> (Scene, Throwable, Actor) {
        let config = GameConfig::default();
        let mut scene = Scene::new(&config, StdRng::seed_from_u64(3));
        scene.physics.add_ground_plane();
        let throwable = Throwable::spawn(&mut scene, config.throw.clone());
        let actor = Actor {
            feet: Vec3::new(16.0, 0.0, 28.0),
            eye_height: 1.6,
            look: Quat::IDENTITY,
        };
        (scene, throwable, actor)
    }

    fn terrain_contact(throwable: &Throwable) -> Contact {
        Contact {
            collider: throwable.body().collider,
            other: throwable.body().collider,
            other_tag: Some(BodyTag::Terrain),
            other_mass: 0.0,
            sensor: false,
        }
    }

    #[test]
    fn pick_up_holds_without_simulating() {
        let (mut scene, mut throwable, actor) = setup();
        throwable.pick_up(&mut scene, &actor);
        assert_eq!(throwable.state(), ThrowableState::Held);
        assert!(scene.physics.is_sleeping(throwable.body().rigid_body));
        assert!(scene.is_visible(throwable.entity()));
        assert!(!throwable.is_glowing(&scene));
        assert!(scene.is_clip_playing(throwable.entity(), "Spawning"));
        assert!(throwable.update(&mut scene, 0.5).is_empty());

        let held = scene.transform(throwable.entity()).unwrap().position;
        let expected = actor.eye() + Vec3::new(0.0, -0.65, -1.0);
        assert!((held - expected).length() < 1e-5);
        assert!(sounds_started(&scene.cues.drain()).contains(&SoundId::PickUp));
    }

    #[test]
    fn release_applies_scaled_impulse_along_aim() {
        let (mut scene, mut throwable, actor) = setup();
        throwable.pick_up(&mut scene, &actor);
        let aim = Vec3::new(0.0, 0.6, 0.8);
        throwable.release(&mut scene, &actor, aim, 50.0);

        assert_eq!(throwable.state(), ThrowableState::InFlight);
        assert_eq!(throwable.impact_force(), 50.0);
        assert!((throwable.last_impulse() - aim * 40.0).length() < 1e-5);
        let start = throwable.body_position(&scene).unwrap();
        assert!((start - Vec3::new(16.0, 2.2, 28.8)).length() < 1e-4);
    }

    #[test]
    fn release_clamps_overshooting_charge() {
        let (mut scene, mut throwable, actor) = setup();
        throwable.pick_up(&mut scene, &actor);
        throwable.release(&mut scene, &actor, Vec3::NEG_Z, 104.0);
        assert_eq!(throwable.impact_force(), 100.0);
        assert!((throwable.last_impulse().length() - 80.0).abs() < 1e-4);
    }

    #[test]
    fn hard_hit_on_terrain_smashes_soft_hit_bounces() {
        let (mut scene, mut hard, actor) = setup();
        hard.pick_up(&mut scene, &actor);
        hard.release(&mut scene, &actor, Vec3::NEG_Z, 85.0);
        let outcome = hard.handle_contact(&mut scene, &terrain_contact(&hard));
        assert_eq!(outcome, ContactOutcome::Smashed);
        assert_eq!(hard.state(), ThrowableState::Smashed);

        let (mut scene, mut soft, actor) = setup();
        soft.pick_up(&mut scene, &actor);
        soft.release(&mut scene, &actor, Vec3::NEG_Z, 50.0);
        let outcome = soft.handle_contact(&mut scene, &terrain_contact(&soft));
        assert_eq!(outcome, ContactOutcome::Bounced);
        assert_eq!(soft.state(), ThrowableState::InFlight);
        let sounds = sounds_started(&scene.cues.drain());
        assert!(sounds.iter().any(|s| SoundId::HIT_GROUND.contains(s)));
        assert!(!sounds.contains(&SoundId::Splat));
    }

    #[test]
    fn mouth_contact_swallows_even_a_gentle_throw() {
        let (mut scene, mut throwable, actor) = setup();
        throwable.pick_up(&mut scene, &actor);
        throwable.release(&mut scene, &actor, Vec3::NEG_Z, 10.0);
        let contact = Contact {
            other_tag: Some(BodyTag::CreatureInterior),
            sensor: true,
            ..terrain_contact(&throwable)
        };
        assert_eq!(
            throwable.handle_contact(&mut scene, &contact),
            ContactOutcome::Swallowed
        );
        assert_eq!(throwable.state(), ThrowableState::Smashed);
        // A second contact in the same tick is ignored.
        assert_eq!(
            throwable.handle_contact(&mut scene, &contact),
            ContactOutcome::Ignored
        );
        let splats = sounds_started(&scene.cues.drain())
            .into_iter()
            .filter(|s| *s == SoundId::Splat)
            .count();
        assert_eq!(splats, 1);
    }

    #[test]
    fn smash_shows_debris_and_parks_after_delay() {
        let (mut scene, mut throwable, actor) = setup();
        throwable.pick_up(&mut scene, &actor);
        throwable.release(&mut scene, &actor, Vec3::NEG_Z, 90.0);
        throwable.smash(&mut scene);
        throwable.smash(&mut scene);

        assert!(!scene.is_visible(throwable.entity()));
        assert!(throwable.is_smash_visible(&scene));
        assert!(scene.is_clip_playing(throwable.smash_entity(), "Smashing"));
        assert!(scene.timers.is_pending(TimerSlot::ParkThrowable));

        let fired = scene.advance_timers(std::time::Duration::from_millis(500));
        assert_eq!(fired, vec![TimerSlot::ParkThrowable]);
        throwable.park(&mut scene);
        assert_eq!(throwable.state(), ThrowableState::Parked);
        let pos = throwable.body_position(&scene).unwrap();
        assert!((pos - Vec3::new(16.0, 24.0, 38.0)).length() < 1e-4);
    }

    #[test]
    fn park_after_pickup_is_ignored() {
        let (mut scene, mut throwable, actor) = setup();
        throwable.pick_up(&mut scene, &actor);
        throwable.release(&mut scene, &actor, Vec3::NEG_Z, 90.0);
        throwable.smash(&mut scene);
        throwable.pick_up(&mut scene, &actor);
        assert!(!scene.timers.is_pending(TimerSlot::ParkThrowable));
        throwable.park(&mut scene);
        assert_eq!(throwable.state(), ThrowableState::Held);
    }

    #[test]
    fn main_model_only_knows_its_spawn_clip() {
        let (mut scene, throwable, _) = setup();
        scene.play_clip(throwable.entity(), "Eaten");
        assert!(!scene.is_clip_playing(throwable.entity(), "Eaten"));
        scene.play_clip(throwable.entity(), "Spawning");
        assert!(scene.is_clip_playing(throwable.entity(), "Spawning"));
    }

    #[test]
    fn held_pumpkin_follows_a_turned_view() {
        let (mut scene, mut throwable, mut actor) = setup();
        throwable.pick_up(&mut scene, &actor);
        actor.look = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        throwable.follow_actor(&mut scene, &actor);

        // Turned 90° left, "one metre ahead" points down -X.
        let held = scene.transform(throwable.entity()).unwrap();
        let expected = actor.eye() + Vec3::new(-1.0, -0.65, 0.0);
        assert!((held.position - expected).length() < 1e-5);
        assert_eq!(held.rotation, actor.look);
    }

    #[test]
    fn hard_throw_only_glows_once_it_has_slowed_on_the_ground() {
        let (mut scene, mut throwable, actor) = setup();
        throwable.pick_up(&mut scene, &actor);
        throwable.release(&mut scene, &actor, Vec3::NEG_Z, 40.0);

        for _ in 0..10 {
            throwable.update(&mut scene, 1.0 / 60.0);
            assert_eq!(throwable.state(), ThrowableState::InFlight);
            assert!(!throwable.is_glowing(&scene));
        }

        for _ in 0..900 {
            throwable.update(&mut scene, 1.0 / 60.0);
            if throwable.state() == ThrowableState::Resting {
                break;
            }
        }
        assert_eq!(throwable.state(), ThrowableState::Resting);
        assert!(throwable.is_glowing(&scene));
        assert!(throwable.can_pick_up());
        let y = throwable.body_position(&scene).unwrap().y;
        assert!(y < 0.475 + 0.2, "settled in the air at y={}", y);
    }

    #[test]
    fn sleeping_body_never_starts_glowing() {
        let (mut scene, mut throwable, actor) = setup();
        throwable.pick_up(&mut scene, &actor);
        // Slow enough to count as settled from the first frame.
        throwable.release(&mut scene, &actor, Vec3::NEG_Z, 5.0);
        scene.physics.sleep(throwable.body().rigid_body);

        for _ in 0..5 {
            throwable.update(&mut scene, 1.0 / 60.0);
        }
        assert!(scene.physics.is_sleeping(throwable.body().rigid_body));
        assert_eq!(throwable.state(), ThrowableState::InFlight);
        assert!(!throwable.is_glowing(&scene));

        scene.physics.wake_up(throwable.body().rigid_body);
        throwable.update(&mut scene, 1.0 / 60.0);
        assert_eq!(throwable.state(), ThrowableState::Resting);
        assert!(throwable.is_glowing(&scene));
    }
}
