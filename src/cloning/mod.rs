//! Copying a container's four-level structure tree into another container.
//!
//! Levels are cloned in dependency order (category, topic, factor, content)
//! inside one transaction. Every parent reference on a copied row is
//! rewritten through the [`IdentityRemapper`]; a source id never reaches the
//! destination tree.

pub mod level_cloner;
pub mod orchestrator;
pub mod remapper;

pub use level_cloner::{
    clone_level, CategoryCloner, ContentCloner, DetachedReference, DroppedContent, FactorCloner,
    LevelCloner, LevelOutcome, RowPlan, TopicCloner,
};
pub use orchestrator::{CloneSummary, StructureCloner};
pub use remapper::{CloneMappings, IdentityRemapper, ParentRef};
