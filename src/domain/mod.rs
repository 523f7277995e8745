//! Domain layer: entities and hierarchy logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod entities;
pub mod error;
pub mod order;
pub mod queries;

pub use arena::{Forest, ForestNode, ForestShape};
pub use builder::{build_forest, TreeBuilder};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use order::MainCategoryOrder;
pub use queries::category_label_for_level;
