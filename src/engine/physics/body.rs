use super::collision::CollisionGroups;
use crate::game::rig::ColliderShape;
use glam::Vec2;
use rapier2d::prelude::*;

pub use rapier2d::prelude::ColliderHandle;

/// glam -> nalgebra
pub fn to_vector(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

/// nalgebra -> glam
pub fn to_vec2(v: Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

/// Builder for creating rigid bodies with common configurations
pub struct BodyBuilder {
    body_type: RigidBodyType,
    position: Isometry<Real>,
    linvel: Vector<Real>,
    gravity_scale: Real,
    can_sleep: bool,
    ccd: bool,
}

impl BodyBuilder {
    /// Create a new dynamic body (affected by forces and collisions)
    pub fn new_dynamic() -> Self {
        Self {
            body_type: RigidBodyType::Dynamic,
            position: Isometry::identity(),
            linvel: Vector::zeros(),
            gravity_scale: 1.0,
            can_sleep: true,
            ccd: false,
        }
    }

    /// Create a new kinematic position-based body, moved by the rig each tick
    pub fn new_kinematic_position_based() -> Self {
        Self {
            body_type: RigidBodyType::KinematicPositionBased,
            position: Isometry::identity(),
            linvel: Vector::zeros(),
            gravity_scale: 0.0,
            can_sleep: false,
            ccd: false,
        }
    }

    /// Create a new fixed (static) body
    pub fn new_fixed() -> Self {
        Self {
            body_type: RigidBodyType::Fixed,
            position: Isometry::identity(),
            linvel: Vector::zeros(),
            gravity_scale: 0.0,
            can_sleep: false,
            ccd: false,
        }
    }

    pub fn position(mut self, x: Real, y: Real) -> Self {
        self.position = Isometry::translation(x, y);
        self
    }

    pub fn position_rotation(mut self, x: Real, y: Real, angle: Real) -> Self {
        self.position = Isometry::new(vector![x, y], angle);
        self
    }

    pub fn linvel(mut self, x: Real, y: Real) -> Self {
        self.linvel = vector![x, y];
        self
    }

    /// Continuous collision detection for fast, small objects
    pub fn ccd(mut self, enabled: bool) -> Self {
        self.ccd = enabled;
        self
    }

    pub fn build(self) -> RigidBody {
        let mut body = RigidBodyBuilder::new(self.body_type)
            .position(self.position)
            .linvel(self.linvel)
            .gravity_scale(self.gravity_scale)
            .can_sleep(self.can_sleep)
            .ccd_enabled(self.ccd)
            .build();

        if self.body_type == RigidBodyType::Dynamic {
            body.set_linear_damping(0.1);
            body.set_angular_damping(1.0);
        }

        body
    }
}

/// Builder for creating colliders with common configurations
pub struct ColliderBuilder2D {
    shape: SharedShape,
    position: Isometry<Real>,
    collision_groups: CollisionGroups,
    is_sensor: bool,
    friction: Real,
    restitution: Real,
    density: Option<Real>,
    mass: Option<Real>,
    active_events: ActiveEvents,
    active_collision_types: ActiveCollisionTypes,
}

impl ColliderBuilder2D {
    fn with_shape(shape: SharedShape) -> Self {
        Self {
            shape,
            position: Isometry::identity(),
            collision_groups: CollisionGroups::Prop,
            is_sensor: false,
            friction: 0.5,
            restitution: 0.0,
            density: Some(1.0),
            mass: None,
            active_events: ActiveEvents::COLLISION_EVENTS,
            active_collision_types: ActiveCollisionTypes::default(),
        }
    }

    pub fn box_shape(half_width: Real, half_height: Real) -> Self {
        Self::with_shape(SharedShape::cuboid(half_width, half_height))
    }

    pub fn circle(radius: Real) -> Self {
        Self::with_shape(SharedShape::ball(radius))
    }

    /// Capsule lying along the local x axis, like a limb
    pub fn capsule_x(half_length: Real, radius: Real) -> Self {
        Self::with_shape(SharedShape::capsule_x(half_length, radius))
    }

    /// Collider for a rig shape description
    pub fn from_rig_shape(shape: &ColliderShape) -> Self {
        match *shape {
            ColliderShape::Cuboid { half_extents } => Self::box_shape(half_extents.x, half_extents.y),
            ColliderShape::Ball { radius } => Self::circle(radius),
            ColliderShape::Capsule {
                half_length,
                radius,
            } => Self::capsule_x(half_length, radius),
        }
    }

    /// Placement relative to the parent body
    pub fn position(mut self, offset: Vec2, angle: Real) -> Self {
        self.position = Isometry::new(to_vector(offset), angle);
        self
    }

    pub fn collision_groups(mut self, groups: CollisionGroups) -> Self {
        self.collision_groups = groups;
        self
    }

    /// Make this a sensor (detects overlaps but doesn't cause physical response)
    pub fn sensor(mut self, is_sensor: bool) -> Self {
        self.is_sensor = is_sensor;
        self
    }

    pub fn friction(mut self, friction: Real) -> Self {
        self.friction = friction;
        self
    }

    pub fn restitution(mut self, restitution: Real) -> Self {
        self.restitution = restitution;
        self
    }

    /// Set mass directly (overrides density)
    pub fn mass(mut self, mass: Real) -> Self {
        self.mass = Some(mass);
        self.density = None;
        self
    }

    /// Also generate contacts against fixed geometry (kinematic parts on the ground)
    pub fn touch_fixed(mut self) -> Self {
        self.active_collision_types |= ActiveCollisionTypes::KINEMATIC_FIXED;
        self
    }

    pub fn build(self) -> Collider {
        let mut builder = rapier2d::prelude::ColliderBuilder::new(self.shape)
            .position(self.position)
            .collision_groups(self.collision_groups.to_interaction_groups())
            .sensor(self.is_sensor)
            .friction(self.friction)
            .restitution(self.restitution)
            .active_events(self.active_events)
            .active_collision_types(self.active_collision_types);

        if let Some(mass) = self.mass {
            builder = builder.mass(mass);
        } else if let Some(density) = self.density {
            builder = builder.density(density);
        }

        builder.build()
    }
}

/// Common body configurations for the rig and its surroundings
pub mod presets {
    use super::*;

    /// Kinematic carrier for one body part
    pub fn part_body(position: Vec2, angle: Real) -> RigidBody {
        BodyBuilder::new_kinematic_position_based()
            .position_rotation(position.x, position.y, angle)
            .build()
    }

    /// Collider of a body part, placed in the part's local frame
    pub fn part_collider(shape: &ColliderShape, offset: Vec2, angle: Real) -> Collider {
        ColliderBuilder2D::from_rig_shape(shape)
            .position(offset, angle)
            .collision_groups(CollisionGroups::Character)
            .friction(0.5)
            .touch_fixed()
            .build()
    }

    /// Static ground slab centred at (x, y)
    pub fn ground_body(x: Real, y: Real) -> RigidBody {
        BodyBuilder::new_fixed().position(x, y).build()
    }

    pub fn ground_collider(width: Real, height: Real) -> Collider {
        ColliderBuilder2D::box_shape(width / 2.0, height / 2.0)
            .collision_groups(CollisionGroups::Environment)
            .friction(0.8)
            .build()
    }

    /// A thrown or falling object
    pub fn prop_body(position: Vec2, velocity: Vec2) -> RigidBody {
        BodyBuilder::new_dynamic()
            .position(position.x, position.y)
            .linvel(velocity.x, velocity.y)
            .ccd(true)
            .build()
    }

    pub fn prop_collider(radius: Real, mass: Real) -> Collider {
        ColliderBuilder2D::circle(radius)
            .collision_groups(CollisionGroups::Prop)
            .restitution(0.2)
            .mass(mass)
            .build()
    }

    /// Trigger volume of a melee weapon blade
    pub fn weapon_sensor(half_length: Real, half_width: Real, offset: Vec2) -> Collider {
        ColliderBuilder2D::box_shape(half_length, half_width)
            .position(offset, 0.0)
            .collision_groups(CollisionGroups::Weapon)
            .sensor(true)
            .touch_fixed()
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_builder_dynamic() {
        let body = BodyBuilder::new_dynamic()
            .position(10.0, 20.0)
            .linvel(5.0, 0.0)
            .build();

        assert_eq!(body.body_type(), RigidBodyType::Dynamic);
        assert_eq!(body.translation().x, 10.0);
        assert_eq!(body.translation().y, 20.0);
        assert_eq!(body.linvel().x, 5.0);
    }

    #[test]
    fn test_part_preset_is_kinematic_character() {
        let body = presets::part_body(Vec2::new(0.0, 1.0), -1.0);
        let collider = presets::part_collider(
            &ColliderShape::capsule(0.2, 0.05),
            Vec2::new(0.2, 0.0),
            0.0,
        );

        assert_eq!(body.body_type(), RigidBodyType::KinematicPositionBased);
        assert!(!collider.is_sensor());
        assert_eq!(
            collider.collision_groups(),
            CollisionGroups::Character.to_interaction_groups()
        );
        assert!(collider
            .active_collision_types()
            .contains(ActiveCollisionTypes::KINEMATIC_FIXED));
    }

    #[test]
    fn test_weapon_sensor() {
        let collider = presets::weapon_sensor(0.4, 0.03, Vec2::new(0.4, 0.0));
        assert!(collider.is_sensor());
    }

    #[test]
    fn test_vector_conversions() {
        let v = Vec2::new(1.5, -2.0);
        assert_eq!(to_vec2(to_vector(v)), v);
    }
}
