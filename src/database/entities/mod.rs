pub mod categories;
pub mod common_types;
pub mod containers;
pub mod contents;
pub mod factors;
pub mod topics;

pub use common_types::{ContainerKind, Level, LevelEntity};
