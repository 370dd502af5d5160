use serde::{
    Deserialize,
    Serialize
};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum MathError {
    #[error("Division by zero")]
    DivisionByZero,
}

/// 2D float vector. Every operation returns a new value, nothing
/// mutates in place except the assign operators.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

impl std::fmt::Display for Vector2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{}]", self.x, self.y)
    }
}

impl Vector2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn magnitude_squared(&self) -> f32 {
        self.x.powi(2) + self.y.powi(2)
    }

    pub fn magnitude(&self) -> f32 {
        self.magnitude_squared().sqrt()
    }

    /// Zero-length vectors normalize to the zero vector rather than NaN.
    pub fn normalize(&self) -> Self {
        let len = self.magnitude();
        if len == 0.0 {
            return Self::zero();
        }
        Self {
            x: self.x / len,
            y: self.y / len,
        }
    }

    pub fn dot(&self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y
    }

    pub fn distance(&self, rhs: Self) -> f32 {
        (rhs - *self).magnitude()
    }

    /// Angle of the vector in radians, measured from positive x axis.
    pub fn angle(&self) -> f32 {
        self.y.atan2(self.x)
    }

    pub fn rotate(&self, radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }

    /// Checked scalar division, unlike `Mul` which cannot fail.
    pub fn divide(&self, scalar: f32) -> Result<Self, MathError> {
        if scalar == 0.0 {
            return Err(MathError::DivisionByZero);
        }
        Ok(Self {
            x: self.x / scalar,
            y: self.y / scalar,
        })
    }
}

impl std::ops::Add for Vector2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y
        }
    }
}

impl std::ops::AddAssign for Vector2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl std::ops::Sub for Vector2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y
        }
    }
}

impl std::ops::Neg for Vector2 {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

impl std::ops::Mul<f32> for Vector2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self::Output {
        Self {
            x: self.x * rhs,
            y: self.y * rhs
        }
    }
}

/// Linear interpolation, deliberately unclamped in `t`.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Cubic Hermite smoothing. The internal parameter is clamped to [0,1]
/// so inputs outside the edges saturate.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = clamp((x - edge0) / (edge1 - edge0), 0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

pub fn ease_in_quad(t: f32) -> f32 {
    t * t
}

pub fn ease_out_quad(t: f32) -> f32 {
    t * (2.0 - t)
}

pub fn ease_in_out_quad(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        -1.0 + (4.0 - 2.0 * t) * t
    }
}

pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

/// Rescale `value` from [in_min, in_max] to [out_min, out_max].
/// A zero-width input range cannot be rescaled.
pub fn map(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> Result<f32, MathError> {
    if in_min == in_max {
        return Err(MathError::DivisionByZero);
    }
    Ok(out_min + (value - in_min) * (out_max - out_min) / (in_max - in_min))
}

#[test]
fn test_vector_creation() {
    let v1 = Vector2::new(1.0, 2.0);
    assert_eq!(v1.x, 1.0);
    assert_eq!(v1.y, 2.0);
}

#[test]
fn test_vector_add_sub() {
    let v1 = Vector2::new(1.0, 2.0);
    let v2 = Vector2::new(10.0, 20.0);
    let v3 = v1 + v2;
    assert_eq!(v3, Vector2::new(11.0, 22.0));
    assert_eq!(v3 - v2, v1);
}

#[test]
fn test_vector_add_assign() {
    let v1 = Vector2::new(1.0, 2.0);
    let mut v2 = Vector2::new(10.0, 20.0);
    v2 += v1;
    assert_eq!(v2.x, 11.0);
    assert_eq!(v2.y, 22.0);
}

#[test]
fn test_vector_negation() {
    let v1 = Vector2::new(1.0, -2.0);
    let v1_neg = -v1;
    assert_eq!(v1_neg.x, -1.0);
    assert_eq!(v1_neg.y, 2.0);
}

#[test]
fn test_vector_mul_scalar() {
    let v1 = Vector2::new(1.0, 2.0);
    let v1_multiplied = v1 * 5.0;
    assert_eq!(v1_multiplied.x, 5.0);
    assert_eq!(v1_multiplied.y, 10.0);
}

#[test]
fn test_vector_divide() {
    let v1 = Vector2::new(4.0, 8.0);
    assert_eq!(v1.divide(2.0).unwrap(), Vector2::new(2.0, 4.0));
    assert_eq!(v1.divide(0.0), Err(MathError::DivisionByZero));
}

#[test]
fn test_vector_magnitude() {
    let v1 = Vector2::new(3.0, 4.0);
    assert_eq!(v1.magnitude(), 5.0);
}

#[test]
fn test_vector_normalize() {
    let v1 = Vector2::new(3.0, 4.0).normalize();
    assert!((v1.magnitude() - 1.0).abs() < 1e-6);

    // Zero vector stays zero instead of producing NaN
    assert_eq!(Vector2::zero().normalize(), Vector2::zero());
}

#[test]
fn test_vector_dot() {
    let v1 = Vector2::new(1.0, 0.0);
    let v2 = Vector2::new(-1.0, 0.0);
    assert_eq!(v1.dot(v2), -1.0);
}

#[test]
fn test_vector_distance() {
    let v1 = Vector2::new(1.0, 1.0);
    let v2 = Vector2::new(4.0, 5.0);
    assert_eq!(v1.distance(v2), 5.0);
}

#[test]
fn test_vector_rotate() {
    let v1 = Vector2::new(1.0, 0.0);
    let rotated = v1.rotate(std::f32::consts::FRAC_PI_2);
    assert!(rotated.x.abs() < 1e-6);
    assert!((rotated.y - 1.0).abs() < 1e-6);
}

#[test]
fn test_vector_angle() {
    let v1 = Vector2::new(0.0, 1.0);
    assert!((v1.angle() - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
}

#[test]
fn test_lerp() {
    assert_eq!(lerp(0.0, 10.0, 0.0), 0.0);
    assert_eq!(lerp(0.0, 10.0, 0.5), 5.0);
    assert_eq!(lerp(0.0, 10.0, 1.0), 10.0);
    // Unclamped on purpose
    assert_eq!(lerp(0.0, 10.0, 1.5), 15.0);
}

#[test]
fn test_smoothstep_edges() {
    assert_eq!(smoothstep(0.0, 10.0, 0.0), 0.0);
    assert_eq!(smoothstep(0.0, 10.0, 10.0), 1.0);
    assert_eq!(smoothstep(0.0, 10.0, -5.0), 0.0);
    assert_eq!(smoothstep(0.0, 10.0, 20.0), 1.0);
}

#[test]
fn test_smoothstep_monotonic() {
    let mut previous = 0.0;
    for step in 0..=100 {
        let x = step as f32 * 0.1;
        let value = smoothstep(0.0, 10.0, x);
        assert!(value >= previous, "smoothstep decreased at x={x}");
        previous = value;
    }
}

#[test]
fn test_easing() {
    assert_eq!(ease_in_quad(0.5), 0.25);
    assert_eq!(ease_out_quad(0.5), 0.75);
    assert_eq!(ease_in_out_quad(0.5), 0.5);
    assert_eq!(ease_in_out_quad(0.0), 0.0);
    assert_eq!(ease_in_out_quad(1.0), 1.0);
}

#[test]
fn test_clamp() {
    assert_eq!(clamp(5.0, 0.0, 10.0), 5.0);
    assert_eq!(clamp(-5.0, 0.0, 10.0), 0.0);
    assert_eq!(clamp(15.0, 0.0, 10.0), 10.0);
}

#[test]
fn test_map() {
    assert_eq!(map(5.0, 0.0, 10.0, 0.0, 100.0).unwrap(), 50.0);
    assert_eq!(map(0.0, 0.0, 0.0, 0.0, 100.0), Err(MathError::DivisionByZero));
}
