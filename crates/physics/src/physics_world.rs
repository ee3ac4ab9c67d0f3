//! Physics world management with Rapier3D.

use std::sync::Mutex;

use crate::collision::{
    BallBodyDesc, BodyTag, CollisionGroup, Contact, PhysicsBody, ShapeDesc, StaticBodyDesc,
};
use engine_core::{FixedTimestep, Quat, Transform, Vec3};
use rapier3d::na::{Isometry3, Vector3};
use rapier3d::prelude::*;

/// Collects collision events raised during a pipeline step.
#[derive(Default)]
struct CollisionCollector {
    events: Mutex<Vec<CollisionEvent>>,
}

impl CollisionCollector {
    fn drain(&self) -> Vec<CollisionEvent> {
        let mut events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *events)
    }
}

impl EventHandler for CollisionCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        let mut events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        events.push(event);
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

/// Main physics world containing all simulation state.
pub struct PhysicsWorld {
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub gravity: Vector<Real>,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,
    fixed: FixedTimestep,
    collector: CollisionCollector,
    /// Events from steps whose contacts nobody has taken yet.
    pending_events: Vec<CollisionEvent>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// Create a new physics world with Earth gravity, 60 Hz sub-steps and a cap of 3 per tick.
    pub fn new() -> Self {
        Self::with_settings(-9.82, 1.0 / 60.0, 3)
    }

    pub fn with_settings(gravity_y: f32, fixed_step: f32, max_substeps: u32) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = fixed_step;
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            gravity: vector![0.0, gravity_y, 0.0],
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            fixed: FixedTimestep::new(fixed_step, max_substeps),
            collector: CollisionCollector::default(),
            pending_events: Vec::new(),
        }
    }

    /// Run one fixed physics step.
    pub fn step(&mut self) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &self.collector,
        );
        let events = self.collector.drain();
        self.pending_events.extend(events);
    }

    /// Advance by `elapsed` seconds of frame time in fixed sub-steps, never more
    /// than the configured cap. Returns the number of sub-steps taken.
    pub fn step_elapsed(&mut self, elapsed: f32) -> u32 {
        let steps = self.fixed.consume(elapsed);
        for _ in 0..steps {
            self.step();
        }
        steps
    }

    /// Add a fixed, tagged body with one collider.
    pub fn add_static_body(&mut self, desc: &StaticBodyDesc) -> PhysicsBody {
        let rigid_body = RigidBodyBuilder::fixed()
            .translation(vector![desc.position.x, desc.position.y, desc.position.z])
            .rotation(Vector3::y() * desc.rotation_y)
            .build();
        let body_handle = self.rigid_body_set.insert(rigid_body);

        let groups = if desc.tag.is_creature() {
            CollisionGroup::creature()
        } else {
            CollisionGroup::environment()
        };
        let collider = shape_builder(desc.shape)
            .sensor(desc.sensor)
            .collision_groups(CollisionGroup::interaction_groups(groups))
            .user_data(desc.tag.to_user_data())
            .build();
        let collider_handle =
            self.collider_set
                .insert_with_parent(collider, body_handle, &mut self.rigid_body_set);
        PhysicsBody {
            rigid_body: body_handle,
            collider: collider_handle,
        }
    }

    /// Add a dynamic ball that reports collision events.
    pub fn add_ball_body(&mut self, desc: &BallBodyDesc) -> PhysicsBody {
        let rigid_body = RigidBodyBuilder::dynamic()
            .translation(vector![desc.position.x, desc.position.y, desc.position.z])
            .linear_damping(desc.linear_damping)
            .angular_damping(desc.angular_damping)
            .ccd_enabled(true)
            .build();
        let body_handle = self.rigid_body_set.insert(rigid_body);

        let collider = ColliderBuilder::ball(desc.radius)
            .mass(desc.mass)
            .friction(desc.friction)
            .restitution(desc.restitution)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .collision_groups(CollisionGroup::interaction_groups(CollisionGroup::throwable()))
            .user_data(desc.tag.to_user_data())
            .build();
        let collider_handle =
            self.collider_set
                .insert_with_parent(collider, body_handle, &mut self.rigid_body_set);
        PhysicsBody {
            rigid_body: body_handle,
            collider: collider_handle,
        }
    }

    /// Add a ground plane collider (flat Y=0 half-space) tagged as terrain.
    pub fn add_ground_plane(&mut self) -> ColliderHandle {
        let collider = ColliderBuilder::halfspace(Vector::y_axis())
            .collision_groups(CollisionGroup::interaction_groups(CollisionGroup::environment()))
            .user_data(BodyTag::Terrain.to_user_data())
            .build();
        self.collider_set.insert(collider)
    }

    /// Add a static cuboid collider with no parent body, tagged as terrain.
    /// `translation`: world position of center. `rotation_y_rad`: rotation around Y axis in radians.
    pub fn add_static_cuboid(
        &mut self,
        translation: Vec3,
        rotation_y_rad: f32,
        half_extents: Vec3,
    ) -> ColliderHandle {
        let tra = vector![translation.x, translation.y, translation.z];
        let axisangle = Vector3::y_axis().into_inner() * (rotation_y_rad as Real);
        let position = Isometry3::new(tra, axisangle);
        let collider = ColliderBuilder::cuboid(
            half_extents.x as Real,
            half_extents.y as Real,
            half_extents.z as Real,
        )
        .position(position)
        .collision_groups(CollisionGroup::interaction_groups(CollisionGroup::environment()))
        .user_data(BodyTag::Terrain.to_user_data())
        .build();
        self.collider_set.insert(collider)
    }

    /// Remove a rigid body and its colliders.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) {
        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
    }

    pub fn contains_body(&self, handle: RigidBodyHandle) -> bool {
        self.rigid_body_set.contains(handle)
    }

    /// Number of registered colliders carrying `tag`.
    pub fn count_tagged(&self, tag: BodyTag) -> usize {
        self.collider_set
            .iter()
            .filter(|(_, c)| BodyTag::from_user_data(c.user_data) == Some(tag))
            .count()
    }

    /// Tag of a collider, if it exists and has one.
    pub fn tag_of(&self, collider: ColliderHandle) -> Option<BodyTag> {
        self.collider_set
            .get(collider)
            .and_then(|c| BodyTag::from_user_data(c.user_data))
    }

    /// Get the transform of a rigid body.
    pub fn get_body_transform(&self, handle: RigidBodyHandle) -> Option<Transform> {
        self.rigid_body_set.get(handle).map(|body| {
            let pos = body.translation();
            let rot = body.rotation();
            Transform {
                position: Vec3::new(pos.x, pos.y, pos.z),
                rotation: Quat::from_xyzw(rot.i, rot.j, rot.k, rot.w),
                scale: Vec3::ONE,
            }
        })
    }

    pub fn linear_velocity(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.rigid_body_set.get(handle).map(|body| {
            let v = body.linvel();
            Vec3::new(v.x, v.y, v.z)
        })
    }

    pub fn is_sleeping(&self, handle: RigidBodyHandle) -> bool {
        self.rigid_body_set
            .get(handle)
            .map(|body| body.is_sleeping())
            .unwrap_or(false)
    }

    /// Put a body to sleep: it stays registered but stops moving until woken.
    pub fn sleep(&mut self, handle: RigidBodyHandle) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.sleep();
        }
    }

    pub fn wake_up(&mut self, handle: RigidBodyHandle) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.wake_up(true);
        }
    }

    /// Zero both linear and angular velocity.
    pub fn stop_body(&mut self, handle: RigidBodyHandle) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_linvel(vector![0.0, 0.0, 0.0], false);
            body.set_angvel(vector![0.0, 0.0, 0.0], false);
        }
    }

    /// Teleport a body without waking it. Its colliders move with it right
    /// away, not at the next step.
    pub fn set_body_position(&mut self, handle: RigidBodyHandle, position: Vec3) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_translation(vector![position.x, position.y, position.z], false);
        }
        self.rigid_body_set
            .propagate_modified_body_positions_to_colliders(&mut self.collider_set);
    }

    /// Apply an impulse to a dynamic body at a world-space point.
    pub fn apply_impulse_at_point(&mut self, handle: RigidBodyHandle, impulse: Vec3, point: Vec3) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.apply_impulse_at_point(
                vector![impulse.x, impulse.y, impulse.z],
                point![point.x, point.y, point.z],
                true,
            );
        }
    }

    /// Contacts that started since the last call and involve `collider`.
    /// All other pending events are discarded.
    pub fn take_contacts(&mut self, collider: ColliderHandle) -> Vec<Contact> {
        let events = std::mem::take(&mut self.pending_events);
        events
            .into_iter()
            .filter_map(|event| match event {
                CollisionEvent::Started(a, b, flags) => {
                    let other = if a == collider {
                        b
                    } else if b == collider {
                        a
                    } else {
                        return None;
                    };
                    let contact = Contact {
                        collider,
                        other,
                        other_tag: self.tag_of(other),
                        other_mass: self.parent_mass(other),
                        sensor: flags.contains(CollisionEventFlags::SENSOR),
                    };
                    log::trace!("contact started: {:?}", contact);
                    Some(contact)
                }
                CollisionEvent::Stopped(..) => None,
            })
            .collect()
    }

    fn parent_mass(&self, collider: ColliderHandle) -> f32 {
        self.collider_set
            .get(collider)
            .and_then(|c| c.parent())
            .and_then(|parent| self.rigid_body_set.get(parent))
            .map(|body| body.mass())
            .unwrap_or(0.0)
    }
}

fn shape_builder(shape: ShapeDesc) -> ColliderBuilder {
    match shape {
        ShapeDesc::Ball { radius } => ColliderBuilder::ball(radius),
        ShapeDesc::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ball_at(position: Vec3) -> BallBodyDesc {
        BallBodyDesc {
            tag: BodyTag::Throwable,
            position,
            radius: 0.475,
            mass: 3.0,
            linear_damping: 0.4,
            angular_damping: 0.4,
            friction: 0.25,
            restitution: 0.33,
        }
    }

    #[test]
    fn ball_dropped_on_ground_reports_terrain_contact() {
        let mut world = PhysicsWorld::new();
        world.add_ground_plane();
        let ball = world.add_ball_body(&ball_at(Vec3::new(0.0, 1.5, 0.0)));

        let mut contacts = Vec::new();
        for _ in 0..120 {
            world.step();
            contacts.extend(world.take_contacts(ball.collider));
            if !contacts.is_empty() {
                break;
            }
        }

        assert!(!contacts.is_empty(), "ball never touched the ground");
        assert_eq!(contacts[0].other_tag, Some(BodyTag::Terrain));
        assert_eq!(contacts[0].other_mass, 0.0);
    }

    #[test]
    fn sensor_contact_is_flagged_and_tagged() {
        let mut world = PhysicsWorld::new();
        world.add_static_body(&StaticBodyDesc {
            tag: BodyTag::CreatureInterior,
            position: Vec3::new(0.0, 0.5, 0.0),
            rotation_y: 0.0,
            shape: ShapeDesc::Ball { radius: 0.6 },
            sensor: true,
        });
        let ball = world.add_ball_body(&ball_at(Vec3::new(0.0, 3.0, 0.0)));

        let mut contacts = Vec::new();
        for _ in 0..120 {
            world.step();
            contacts.extend(world.take_contacts(ball.collider));
            if !contacts.is_empty() {
                break;
            }
        }

        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].other_tag, Some(BodyTag::CreatureInterior));
        assert!(contacts[0].sensor);
    }

    #[test]
    fn step_elapsed_respects_substep_cap() {
        let mut world = PhysicsWorld::new();
        assert_eq!(world.step_elapsed(1.0), 3);
        assert_eq!(world.step_elapsed(1.0 / 60.0 + 1e-4), 1);
    }

    #[test]
    fn removing_a_tagged_body_unregisters_its_collider() {
        let mut world = PhysicsWorld::new();
        let body = world.add_static_body(&StaticBodyDesc {
            tag: BodyTag::CreatureMouthClosed,
            position: Vec3::ZERO,
            rotation_y: 0.0,
            shape: ShapeDesc::Cuboid {
                half_extents: Vec3::ONE,
            },
            sensor: false,
        });
        assert_eq!(world.count_tagged(BodyTag::CreatureMouthClosed), 1);
        world.remove_body(body.rigid_body);
        assert_eq!(world.count_tagged(BodyTag::CreatureMouthClosed), 0);
        assert!(!world.contains_body(body.rigid_body));
    }

    #[test]
    fn teleport_moves_the_collider_before_the_next_step() {
        let mut world = PhysicsWorld::new();
        let ball = world.add_ball_body(&ball_at(Vec3::new(7.0, 0.5, 7.0)));
        world.step();

        let park = Vec3::new(16.0, 24.0, 38.0);
        world.set_body_position(ball.rigid_body, park);
        let at = world.collider_set[ball.collider].translation();
        assert!((Vec3::new(at.x, at.y, at.z) - park).length() < 1e-4);
    }

    #[test]
    fn sleeping_body_holds_still_until_woken() {
        let mut world = PhysicsWorld::new();
        let ball = world.add_ball_body(&ball_at(Vec3::new(0.0, 5.0, 0.0)));
        world.sleep(ball.rigid_body);
        for _ in 0..10 {
            world.step();
        }
        let y = world.get_body_transform(ball.rigid_body).unwrap().position.y;
        assert!((y - 5.0).abs() < 1e-4);

        world.wake_up(ball.rigid_body);
        for _ in 0..10 {
            world.step();
        }
        let y = world.get_body_transform(ball.rigid_body).unwrap().position.y;
        assert!(y < 5.0);
    }
}
