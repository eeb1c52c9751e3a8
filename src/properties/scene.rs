/// A set of root nodes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneData;
