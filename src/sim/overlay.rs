//! Visual overlays mirroring physical bodies
//!
//! The placement math is pure so it can be tested without a DOM; the browser
//! implementation of [`Overlay`] lives in `platform::dom`.

use glam::Vec2;

/// Where a body is after a step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyPose {
    pub position: Vec2,
    /// Radians
    pub angle: f32,
    pub radius: f32,
}

/// Absolute page offset of the element hosting the world
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PageOffset {
    /// Bounding rect left/top (viewport relative)
    pub left: f32,
    pub top: f32,
    pub scroll_x: f32,
    pub scroll_y: f32,
}

/// On-page box for an overlay element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub left: f32,
    pub top: f32,
    pub size: f32,
    /// Radians
    pub rotation: f32,
}

impl Placement {
    /// Page box covering the body's circle, rotated with the body
    pub fn from_pose(pose: &BodyPose, offset: &PageOffset) -> Self {
        Self {
            left: offset.left + offset.scroll_x + pose.position.x - pose.radius,
            top: offset.top + offset.scroll_y + pose.position.y - pose.radius,
            size: pose.radius * 2.0,
            rotation: pose.angle,
        }
    }
}

/// A visual element owned by one balloon
pub trait Overlay {
    /// Move the element to follow the body
    fn place(&mut self, pose: &BodyPose);
    /// Detach and destroy the element
    fn remove(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_placement_includes_offset_and_scroll() {
        let pose = BodyPose {
            position: Vec2::new(400.0, 300.0),
            angle: 0.5,
            radius: 40.0,
        };
        let offset = PageOffset {
            left: 10.0,
            top: 20.0,
            scroll_x: 5.0,
            scroll_y: 100.0,
        };
        let p = Placement::from_pose(&pose, &offset);
        assert_eq!(p.left, 375.0);
        assert_eq!(p.top, 380.0);
        assert_eq!(p.size, 80.0);
        assert_eq!(p.rotation, 0.5);
    }

    proptest! {
        #[test]
        fn prop_placement_centers_on_body(
            x in -1000.0f32..1000.0,
            y in -1000.0f32..1000.0,
            r in 1.0f32..100.0,
            scroll in 0.0f32..5000.0,
        ) {
            let pose = BodyPose { position: Vec2::new(x, y), angle: 0.0, radius: r };
            let offset = PageOffset { left: 0.0, top: 0.0, scroll_x: 0.0, scroll_y: scroll };
            let p = Placement::from_pose(&pose, &offset);
            prop_assert!((p.left + p.size / 2.0 - x).abs() < 1e-2);
            prop_assert!((p.top + p.size / 2.0 - (y + scroll)).abs() < 1e-2);
        }
    }
}
