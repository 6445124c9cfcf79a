//! Core types for the sync engine

mod board;
mod entity;
mod ids;
mod scope;
mod task;

pub use board::{Board, Column};
pub use entity::{validate_title, CachedList, Draft, Entity, EntityKind, EntityPatch};
pub use ids::EntityId;
pub use scope::{ParseScopeError, ScopeKey};
pub use task::Task;
