//! Collision groups, body tags and contact reports.

use engine_core::Vec3;
use rapier3d::prelude::*;

/// Collision groups for different entity types.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionGroup {
    /// Static environment (ground, farm obstacles)
    Environment = 1 << 0,
    /// The thrown object
    Throwable = 1 << 1,
    /// Creature colliders and the mouth sensor
    Creature = 1 << 2,
}

impl CollisionGroup {
    /// Create a collision group for environment.
    pub fn environment() -> (Group, Group) {
        let membership = Group::from_bits_retain(Self::Environment as u32);
        let filter = Group::ALL;
        (membership, filter)
    }

    /// Create a collision group for the throwable.
    pub fn throwable() -> (Group, Group) {
        let membership = Group::from_bits_retain(Self::Throwable as u32);
        let filter = Group::from_bits_retain(Self::Environment as u32 | Self::Creature as u32);
        (membership, filter)
    }

    /// Create a collision group for creature bodies.
    pub fn creature() -> (Group, Group) {
        let membership = Group::from_bits_retain(Self::Creature as u32);
        let filter = Group::from_bits_retain(Self::Throwable as u32);
        (membership, filter)
    }

    pub fn interaction_groups(pair: (Group, Group)) -> InteractionGroups {
        InteractionGroups::new(pair.0, pair.1)
    }
}

/// Explicit identity carried by every collider in `user_data`.
///
/// Contact classification reads this tag instead of inferring identity from
/// mass or shape.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyTag {
    Terrain = 1,
    Throwable = 2,
    CreatureMouthOpen = 3,
    CreatureMouthClosed = 4,
    CreatureInterior = 5,
    CreatureDying = 6,
}

impl BodyTag {
    pub const ALL: [BodyTag; 6] = [
        BodyTag::Terrain,
        BodyTag::Throwable,
        BodyTag::CreatureMouthOpen,
        BodyTag::CreatureMouthClosed,
        BodyTag::CreatureInterior,
        BodyTag::CreatureDying,
    ];

    pub fn to_user_data(self) -> u128 {
        self as u8 as u128
    }

    /// Untagged colliders (user_data 0 or unknown) map to `None`.
    pub fn from_user_data(data: u128) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.to_user_data() == data)
    }

    /// Whether the tag belongs to one of the creature's body sets.
    pub fn is_creature(self) -> bool {
        matches!(
            self,
            BodyTag::CreatureMouthOpen
                | BodyTag::CreatureMouthClosed
                | BodyTag::CreatureInterior
                | BodyTag::CreatureDying
        )
    }
}

/// Collider shape for bodies built from configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeDesc {
    Ball { radius: f32 },
    Cuboid { half_extents: Vec3 },
}

/// A fixed, tagged body: terrain obstacles and creature body sets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticBodyDesc {
    pub tag: BodyTag,
    pub position: Vec3,
    pub rotation_y: f32,
    pub shape: ShapeDesc,
    /// Sensors report contacts but never push back.
    pub sensor: bool,
}

/// A dynamic sphere with material settings, used for the throwable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallBodyDesc {
    pub tag: BodyTag,
    pub position: Vec3,
    pub radius: f32,
    pub mass: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub friction: f32,
    pub restitution: f32,
}

/// Handles of one registered body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicsBody {
    pub rigid_body: RigidBodyHandle,
    pub collider: ColliderHandle,
}

/// A contact that began during the last step, seen from one collider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// The collider the report was requested for.
    pub collider: ColliderHandle,
    /// The other collider in the pair.
    pub other: ColliderHandle,
    /// Tag of the other collider, if it carries one.
    pub other_tag: Option<BodyTag>,
    /// Mass of the other collider's parent body (0 for fixed bodies).
    pub other_mass: f32,
    /// True when either collider is a sensor.
    pub sensor: bool,
}
