use crate::validation::Checked;
use crate::{Extras, RawExtensions};
use serde_derive::{Deserialize, Serialize};

/// Selects which projection record applies.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Type {
    /// A perspective projection.
    Perspective = 1,

    /// An orthographic projection.
    Orthographic,
}

wire_str_enum!(Type, "a camera type name", {
    "perspective" => Perspective,
    "orthographic" => Orthographic,
});

/// A camera's projection.
///
/// A node can reference a camera to apply a transform to place the camera in
/// the scene.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Camera {
    /// Optional user-defined name for this object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// An orthographic camera containing properties to create an orthographic
    /// projection matrix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orthographic: Option<Orthographic>,

    /// A perspective camera containing properties to create a perspective
    /// projection matrix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perspective: Option<Perspective>,

    /// Specifies if the camera uses a perspective or orthographic projection.
    #[serde(rename = "type")]
    pub type_: Checked<Type>,

    /// Extension specific data.
    #[serde(default, skip_serializing_if = "RawExtensions::is_empty")]
    pub extensions: RawExtensions,

    /// Optional application specific data.
    #[serde(default, skip_serializing_if = "crate::extras_is_null")]
    pub extras: Extras,
}

/// Values for an orthographic camera projection.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Orthographic {
    /// The horizontal magnification of the view.
    pub xmag: f32,

    /// The vertical magnification of the view.
    pub ymag: f32,

    /// The distance to the far clipping plane.
    pub zfar: f32,

    /// The distance to the near clipping plane.
    pub znear: f32,

    /// Extension specific data.
    #[serde(default, skip_serializing_if = "RawExtensions::is_empty")]
    pub extensions: RawExtensions,

    /// Optional application specific data.
    #[serde(default, skip_serializing_if = "crate::extras_is_null")]
    pub extras: Extras,
}

/// Values for a perspective camera projection.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Perspective {
    /// Aspect ratio of the field of view.
    #[serde(default, rename = "aspectRatio", skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<f32>,

    /// The vertical field of view in radians.
    pub yfov: f32,

    /// The distance to the far clipping plane.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zfar: Option<f32>,

    /// The distance to the near clipping plane.
    pub znear: f32,

    /// Extension specific data.
    #[serde(default, skip_serializing_if = "RawExtensions::is_empty")]
    pub extensions: RawExtensions,

    /// Optional application specific data.
    #[serde(default, skip_serializing_if = "crate::extras_is_null")]
    pub extras: Extras,
}

