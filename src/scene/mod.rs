/// Image handles and sprite frame atlases.
pub mod image;
/// Reference display-node model.
pub mod model;
/// Scene-node read interface.
pub mod node;
