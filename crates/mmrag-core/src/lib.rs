//! # mmrag-core
//!
//! Core types shared across all mmrag crates.
//!
//! - Lifecycle phase enums with state machine transitions
//! - The bearer [`Credential`] and the signed-in [`Account`]
//! - Request/response bodies of the RAG backend

pub mod enums;
pub mod identity;
pub mod wire;

pub use enums::{IndexingPhase, QueryPhase};
pub use identity::{Account, Credential};
pub use wire::{ErrorBody, IndexRequest, IndexSummary, QueryAnswer, QueryRequest};
