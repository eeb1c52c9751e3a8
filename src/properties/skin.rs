/// Joints and inverse-bind matrices.
///
/// Joints, the skeleton root, and the inverse-bind-matrix accessor are edge
/// fields. When the accessor is present its count must equal the joint
/// count; the codec checks this on write.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SkinData;
