//! Pipeline response types.

use serde::{Deserialize, Serialize};

use curriculum::{Activity, Pathway, Step};

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Result of a regeneration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct RegenerationResponse {
    pub success: bool,
    /// Copy of the input pathway with the target replaced
    pub updated_pathway: Pathway,
    /// The replacement, as spliced
    pub regenerated_item: RegeneratedItem,
}

/// The item a regeneration produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(untagged)]
pub enum RegeneratedItem {
    Step(Step),
    Activity(Activity),
}

/// A drafted five-field brief.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct PathwayDetails {
    /// Concise, engaging title
    pub title: String,
    /// Overview of what the pathway covers
    pub description: String,
    pub learning_outcomes: String,
    pub target_audience: String,
    pub why_take_it: String,
}
