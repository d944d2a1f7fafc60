// Math utilities and helper functions

use glam::Vec2;

/// Fraction of the gap left after `to_target_time` seconds of [`exp_damp`]
const DAMP_RESIDUAL: f32 = 0.01;

/// Linear interpolation
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Frame-rate independent exponential approach of `current` toward `target`.
///
/// After `to_target_time` seconds 99% of the gap is closed, regardless of how
/// that time is split into steps of `dt`. A non-positive time snaps to target.
pub fn exp_damp(current: f32, target: f32, to_target_time: f32, dt: f32) -> f32 {
    if to_target_time <= 0.0 {
        return target;
    }
    let t = 1.0 - DAMP_RESIDUAL.powf(dt / to_target_time);
    lerp(current, target, t)
}

/// Z component of the 3D cross product of two vectors in the XY plane
pub fn cross_z(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Sign that treats zero as positive (1.0 or -1.0)
pub fn sign(value: f32) -> f32 {
    if value >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Unsigned angle between two vectors in degrees. Zero if either is degenerate.
pub fn angle_between_deg(a: Vec2, b: Vec2) -> f32 {
    let denom = (a.length_squared() * b.length_squared()).sqrt();
    if denom < 1e-12 {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Rotate a vector counter-clockwise by `radians`
pub fn rotate(v: Vec2, radians: f32) -> Vec2 {
    Vec2::from_angle(radians).rotate(v)
}

/// Mirror a vector across the vertical axis when `facing` is negative
pub fn mirror_x(v: Vec2, facing: f32) -> Vec2 {
    Vec2::new(v.x * sign(facing), v.y)
}
