//! Template and assessment structures: a four-level hierarchy
//! (category, topic, factor, content) owned by a container, with
//! transactional structure cloning between containers.

pub mod cloning;
pub mod common;
pub mod database;
pub mod errors;
pub mod server;
pub mod services;
