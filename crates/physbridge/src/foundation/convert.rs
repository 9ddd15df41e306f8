//! Conversions between renderer and physics conventions
//!
//! The renderer stores a pose as a separate position and orientation while
//! the physics side works with a single rigid [`Iso3`]. Both share nalgebra's
//! unit quaternion, so orientations pass through untouched. Debug colours
//! arrive from the physics side as `rgb` and the renderer wants `rgba`.

use super::math::{Iso3, Point3, Quat, Translation3, Vec3, Vec4};

/// Build a physics transform from a renderer position and orientation
pub fn to_physics(position: &Vec3, orientation: &Quat) -> Iso3 {
    Iso3::from_parts(Translation3::from(*position), *orientation)
}

/// Split a physics transform into a renderer position and orientation
pub fn to_renderer(transform: &Iso3) -> (Vec3, Quat) {
    (transform.translation.vector, transform.rotation)
}

/// Physics points become renderer positions
pub fn point_to_renderer(point: &Point3) -> Vec3 {
    point.coords
}

/// Scale an `rgb` physics debug colour into an opaque renderer colour
pub fn debug_colour(colour: &Vec3, multiplier: f32) -> Vec4 {
    Vec4::new(
        colour.x * multiplier,
        colour.y * multiplier,
        colour.z * multiplier,
        1.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pose_round_trip_through_isometry() {
        let position = Vec3::new(4.0, -1.0, 2.5);
        let orientation = Quat::from_axis_angle(&Vec3::y_axis(), 0.75);

        let (p, q) = to_renderer(&to_physics(&position, &orientation));
        assert_eq!(p, position);
        assert_eq!(q, orientation);
    }

    #[test]
    fn test_debug_colour_keeps_alpha_opaque() {
        let colour = debug_colour(&Vec3::new(0.5, 0.25, 1.0), 2.0);
        assert_eq!(colour, Vec4::new(1.0, 0.5, 2.0, 1.0));
    }
}
