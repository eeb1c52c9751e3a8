/// A camera projection.
#[derive(Clone, Debug, PartialEq)]
pub enum Projection {
    /// A perspective projection.
    Perspective {
        /// Aspect ratio of the field of view.
        aspect_ratio: Option<f32>,
        /// Vertical field of view in radians.
        yfov: f32,
        /// Distance to the far clipping plane; infinite when absent.
        zfar: Option<f32>,
        /// Distance to the near clipping plane.
        znear: f32,
    },

    /// An orthographic projection.
    Orthographic {
        /// Horizontal magnification.
        xmag: f32,
        /// Vertical magnification.
        ymag: f32,
        /// Distance to the far clipping plane.
        zfar: f32,
        /// Distance to the near clipping plane.
        znear: f32,
    },
}

/// A camera referenced by nodes to view the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraData {
    /// The projection this camera applies.
    pub projection: Projection,
}

impl Default for CameraData {
    fn default() -> Self {
        Self {
            projection: Projection::Perspective {
                aspect_ratio: None,
                yfov: std::f32::consts::FRAC_PI_4,
                zfar: None,
                znear: 0.01,
            },
        }
    }
}
