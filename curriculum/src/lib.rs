//! Learning pathway model and generation contracts.
//!
//! This crate holds everything about a generated pathway that does not
//! touch the network:
//!
//! - **Types**: [`Pathway`] → [`Step`] → [`Activity`], plus the passages and
//!   video candidates retrieved for a request
//! - **Schema**: [`OutputShape`], the closed set of objects the generator may
//!   produce, with its JSON Schema and post-hoc validation
//! - **Prompt**: [`PromptAssembler`], deterministic system prompt rendering
//!   under a versioned [`RuleSet`]
//! - **Reconcile**: [`UrlReconciler`], which enforces that every video link
//!   belongs to the candidate set actually retrieved
//!
//! # Example
//!
//! ```ignore
//! use curriculum::{OutputShape, PromptAssembler, PromptBrief, UrlReconciler};
//!
//! let prompt = PromptAssembler::default().build_prompt(&PromptBrief::Pathway(&brief), &passages, &videos);
//! let item = OutputShape::Pathway.validate(&raw_output)?;
//! let (pathway, summary) = UrlReconciler::new(&videos).reconcile_pathway(pathway);
//! ```

pub mod prompt;
pub mod reconcile;
pub mod schema;
pub mod types;

// Re-export main types
pub use prompt::{ExistingItem, PromptAssembler, PromptBrief, RuleSet};
pub use reconcile::{reconcile, ReconcileOutcome, ReconcileSummary, UrlReconciler};
pub use schema::{GeneratedItem, OutputShape, SchemaViolation};
pub use types::*;
