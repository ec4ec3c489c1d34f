//! Math utilities and types
//!
//! Provides the fundamental math types for scene composition. All linear
//! units throughout the crate are millimeters; all angles cross the public
//! API in degrees and are converted to radians at the boundary.

pub use nalgebra::{
    Matrix3, Matrix4,
    Quaternion,
    Unit,
    Vector2, Vector3, Vector4,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform representing position, rotation, and scale
///
/// Composes to a matrix as translation, then rotation, then scale, so a
/// node's local axes are rotated before the node is moved into place.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in 3D space (millimeters)
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform from position, XYZ euler degrees, and scale
    pub fn from_position_euler_deg(position: Vec3, rotation_deg: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            rotation: quat_from_euler_deg(rotation_deg),
            scale,
        }
    }

    /// Convert to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: Point3) -> Point3 {
        let matrix = self.to_matrix();
        matrix.transform_point(&point)
    }

    /// Rotation expressed as XYZ euler angles in degrees
    pub fn euler_deg(&self) -> Vec3 {
        let (x, y, z) = self.rotation.euler_angles();
        Vec3::new(x, y, z) * constants::RAD_TO_DEG
    }
}

/// Build a rotation quaternion from intrinsic XYZ euler angles in degrees
///
/// Matches the matrix composition `Rz * Ry * Rx`: the X rotation is applied
/// first, then Y, then Z.
pub fn quat_from_euler_deg(rotation_deg: Vec3) -> Quat {
    Quat::from_euler_angles(
        rotation_deg.x * constants::DEG_TO_RAD,
        rotation_deg.y * constants::DEG_TO_RAD,
        rotation_deg.z * constants::DEG_TO_RAD,
    )
}

/// Extract the translation column of a transformation matrix
pub fn translation_of(matrix: &Mat4) -> Vec3 {
    Vec3::new(matrix.m14, matrix.m24, matrix.m34)
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}
