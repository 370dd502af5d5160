use serde::{
    Deserialize,
    Serialize
};

use super::math::Vector2;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CollisionError {
    #[error("Aabb size must be positive, got {width}x{height}")]
    InvalidArgument {
        width: f32,
        height: f32,
    },
}

/// Axis-aligned bounding box, anchored at its top-left corner.
/// Width and height are always positive.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl std::fmt::Display for Aabb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[({},{}), ({}x{})]", self.x, self.y, self.width, self.height)
    }
}

impl Aabb {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Result<Self, CollisionError> {
        if width <= 0.0 || height <= 0.0 {
            return Err(CollisionError::InvalidArgument { width, height });
        }
        Ok(Self { x, y, width, height })
    }

    pub fn from_position_size(position: Vector2, size: Vector2) -> Result<Self, CollisionError> {
        Self::new(position.x, position.y, size.x, size.y)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Separating-axis overlap test. Touching edges do not count as
    /// an intersection.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    pub fn contains_point(&self, point: &Vector2) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && point.x < self.x + self.width
            && point.y < self.y + self.height
    }
}

#[test]
fn test_aabb_creation() {
    let aabb = Aabb::new(1.0, 2.0, 3.0, 4.0).unwrap();
    assert_eq!(aabb.right(), 4.0);
    assert_eq!(aabb.bottom(), 6.0);
}

#[test]
fn test_aabb_rejects_degenerate_size() {
    assert!(Aabb::new(0.0, 0.0, 0.0, 1.0).is_err());
    assert!(Aabb::new(0.0, 0.0, 1.0, -1.0).is_err());
}

#[test]
fn test_aabb_intersects_overlapping() {
    let a = Aabb::new(0.0, 0.0, 10.0, 10.0).unwrap();
    let b = Aabb::new(5.0, 5.0, 10.0, 10.0).unwrap();
    assert!(a.intersects(&b));
}

#[test]
fn test_aabb_intersects_symmetric() {
    let a = Aabb::new(0.0, 0.0, 10.0, 10.0).unwrap();
    let b = Aabb::new(5.0, 5.0, 10.0, 10.0).unwrap();
    let c = Aabb::new(100.0, 100.0, 5.0, 5.0).unwrap();
    assert_eq!(a.intersects(&b), b.intersects(&a));
    assert_eq!(a.intersects(&c), c.intersects(&a));
}

#[test]
fn test_aabb_separated_boxes() {
    let a = Aabb::new(0.0, 0.0, 10.0, 10.0).unwrap();
    let b = Aabb::new(20.0, 0.0, 10.0, 10.0).unwrap();
    let c = Aabb::new(0.0, 20.0, 10.0, 10.0).unwrap();
    assert!(!a.intersects(&b));
    assert!(!a.intersects(&c));
}

#[test]
fn test_aabb_touching_edges_do_not_intersect() {
    let a = Aabb::new(0.0, 0.0, 10.0, 10.0).unwrap();
    let b = Aabb::new(10.0, 0.0, 10.0, 10.0).unwrap();
    assert!(!a.intersects(&b));
}

#[test]
fn test_aabb_contains_point() {
    let a = Aabb::new(1.0, 0.0, 3.0, 5.0).unwrap();
    assert!(a.contains_point(&Vector2::new(1.0, 0.0)));
    assert!(a.contains_point(&Vector2::new(2.5, 2.5)));
    assert!(!a.contains_point(&Vector2::new(4.0, 0.0)));
    assert!(!a.contains_point(&Vector2::new(1.0, 5.0)));
}
