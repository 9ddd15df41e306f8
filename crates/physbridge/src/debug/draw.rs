//! The physics engine's debug-draw callback contract
//!
//! A physics world draws its debug geometry by calling back into an
//! implementation of [`DebugDraw`] while it walks its bodies and contacts.
//! Positions arrive in physics space as points; colours are plain RGB.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::foundation::math::{Iso3, Point3, Vec3};

bitflags! {
    /// What a world should draw; the empty set means debug drawing is off
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct DebugDrawModes: u32 {
        /// Collision shape outlines
        const WIREFRAME = 1;
        /// Axis-aligned bounding boxes
        const AABB = 1 << 1;
        /// Text labels
        const TEXT = 1 << 2;
        /// Contact points and normals
        const CONTACT_POINTS = 1 << 3;
    }
}

impl Default for DebugDrawModes {
    fn default() -> Self {
        Self::WIREFRAME
    }
}

/// Receiver of a physics world's debug geometry
pub trait DebugDraw {
    /// Draw one line segment
    fn draw_line(&mut self, from: &Point3, to: &Point3, colour: &Vec3);

    /// Draw a contact point along its normal, scaled by the penetration distance
    fn draw_contact_point(&mut self, point: &Point3, normal: &Vec3, distance: f32, lifetime: i32, colour: &Vec3);

    /// Report a warning raised while drawing
    fn report_error_warning(&mut self, warning: &str);

    /// Draw a text label
    fn draw_3d_text(&mut self, location: &Point3, text: &str);

    /// Select what to draw
    fn set_debug_mode(&mut self, mode: DebugDrawModes);

    /// What is currently drawn
    fn debug_mode(&self) -> DebugDrawModes;

    /// Draw the twelve edges of an axis-aligned box
    fn draw_aabb(&mut self, min: &Point3, max: &Point3, colour: &Vec3) {
        let corners = [
            Point3::new(min.x, min.y, min.z),
            Point3::new(max.x, min.y, min.z),
            Point3::new(max.x, max.y, min.z),
            Point3::new(min.x, max.y, min.z),
            Point3::new(min.x, min.y, max.z),
            Point3::new(max.x, min.y, max.z),
            Point3::new(max.x, max.y, max.z),
            Point3::new(min.x, max.y, max.z),
        ];
        draw_box_edges(self, &corners, colour);
    }

    /// Draw the twelve edges of a box with the given half extents placed at `transform`
    fn draw_box(&mut self, half_extents: &Vec3, transform: &Iso3, colour: &Vec3) {
        let (x, y, z) = (half_extents.x, half_extents.y, half_extents.z);
        let corners = [
            transform * Point3::new(-x, -y, -z),
            transform * Point3::new(x, -y, -z),
            transform * Point3::new(x, y, -z),
            transform * Point3::new(-x, y, -z),
            transform * Point3::new(-x, -y, z),
            transform * Point3::new(x, -y, z),
            transform * Point3::new(x, y, z),
            transform * Point3::new(-x, y, z),
        ];
        draw_box_edges(self, &corners, colour);
    }
}

/// Corner pairs of a box whose corners are ordered bottom face then top face
const BOX_EDGES: [(usize, usize); 12] = [
    (0, 1), (1, 2), (2, 3), (3, 0),
    (4, 5), (5, 6), (6, 7), (7, 4),
    (0, 4), (1, 5), (2, 6), (3, 7),
];

fn draw_box_edges<D: DebugDraw + ?Sized>(drawer: &mut D, corners: &[Point3; 8], colour: &Vec3) {
    for (a, b) in BOX_EDGES {
        drawer.draw_line(&corners[a], &corners[b], colour);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[derive(Default)]
    struct Recorder {
        lines: Vec<(Point3, Point3)>,
        mode: DebugDrawModes,
    }

    impl DebugDraw for Recorder {
        fn draw_line(&mut self, from: &Point3, to: &Point3, _colour: &Vec3) {
            self.lines.push((*from, *to));
        }

        fn draw_contact_point(&mut self, _: &Point3, _: &Vec3, _: f32, _: i32, _: &Vec3) {}

        fn report_error_warning(&mut self, _: &str) {}

        fn draw_3d_text(&mut self, _: &Point3, _: &str) {}

        fn set_debug_mode(&mut self, mode: DebugDrawModes) {
            self.mode = mode;
        }

        fn debug_mode(&self) -> DebugDrawModes {
            self.mode
        }
    }

    #[test]
    fn test_aabb_has_twelve_unit_edges() {
        let mut recorder = Recorder::default();
        recorder.draw_aabb(&Point3::new(0.0, 0.0, 0.0), &Point3::new(1.0, 1.0, 1.0), &Vec3::x());

        assert_eq!(recorder.lines.len(), 12);
        for (a, b) in &recorder.lines {
            assert_relative_eq!((b - a).norm(), 1.0);
        }
    }

    #[test]
    fn test_box_follows_transform() {
        let mut recorder = Recorder::default();
        let transform = Iso3::translation(0.0, 5.0, 0.0);
        recorder.draw_box(&Vec3::new(1.0, 1.0, 1.0), &transform, &Vec3::y());

        assert_eq!(recorder.lines.len(), 12);
        assert!(recorder.lines.iter().all(|(a, b)| a.y >= 4.0 && b.y <= 6.0));
    }

    #[test]
    fn test_default_mode_is_on() {
        assert!(!DebugDrawModes::default().is_empty());
        assert!(DebugDrawModes::empty().is_empty());
    }
}
