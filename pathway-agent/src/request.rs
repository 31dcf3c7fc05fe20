//! Pipeline request types.
//!
//! Inbound shapes are lenient (every field optional) so that absent or
//! malformed fields surface as [`PipelineError`]s instead of deserialization
//! failures.

use serde::{Deserialize, Serialize};

use curriculum::{ItemType, Pathway, PathwayBrief};

use crate::error::PipelineError;

/// Any request the pipelines accept.
#[derive(Debug, Clone)]
pub enum GenerationRequest {
    /// Generate a complete pathway from a brief
    Full(PathwayBrief),
    /// Replace one step or activity of an existing pathway
    Partial(RegenerationRequest),
}

/// Request to replace one item of an existing pathway.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerationRequest {
    #[serde(default)]
    pub pathway: Option<Pathway>,
    /// `step` or `activity`
    #[serde(default)]
    pub item_type: Option<String>,
    /// Index of the step
    #[serde(default)]
    pub item_index: Option<i64>,
    /// Index of the activity within the step, for `activity` requests
    #[serde(default)]
    pub activity_index: Option<i64>,
    /// Free-text guidance for the replacement; may be empty but not absent
    #[serde(default)]
    pub regeneration_prompt: Option<String>,
}

impl RegenerationRequest {
    /// Request to replace the step at `item_index`.
    pub fn step(pathway: Pathway, item_index: i64, prompt: impl Into<String>) -> Self {
        Self {
            pathway: Some(pathway),
            item_type: Some(ItemType::Step.as_str().to_string()),
            item_index: Some(item_index),
            activity_index: None,
            regeneration_prompt: Some(prompt.into()),
        }
    }

    /// Request to replace one activity of the step at `item_index`.
    pub fn activity(
        pathway: Pathway,
        item_index: i64,
        activity_index: i64,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            pathway: Some(pathway),
            item_type: Some(ItemType::Activity.as_str().to_string()),
            item_index: Some(item_index),
            activity_index: Some(activity_index),
            regeneration_prompt: Some(prompt.into()),
        }
    }

    /// Check presence of required fields and resolve the target address.
    ///
    /// Index ranges are not checked here; see [`Target::locate`].
    pub fn validate(&self) -> Result<ValidRegeneration<'_>, PipelineError> {
        let (Some(pathway), Some(item_type), Some(prompt)) = (
            self.pathway.as_ref(),
            self.item_type.as_deref(),
            self.regeneration_prompt.as_deref(),
        ) else {
            return Err(PipelineError::MissingParameters(
                "Missing required parameters".to_string(),
            ));
        };

        let item_type = ItemType::parse(item_type).ok_or_else(|| {
            PipelineError::MissingParameters(format!("Invalid item type: {}", item_type))
        })?;

        let step = self.item_index.ok_or_else(|| {
            PipelineError::MissingParameters("Missing required parameters: itemIndex".to_string())
        })?;

        let target = match item_type {
            ItemType::Step => Target::Step { step },
            ItemType::Activity => Target::Activity {
                step,
                activity: self.activity_index,
            },
        };

        Ok(ValidRegeneration {
            pathway,
            target,
            prompt,
        })
    }
}

/// A regeneration request whose required fields are present.
#[derive(Debug, Clone, Copy)]
pub struct ValidRegeneration<'a> {
    pub pathway: &'a Pathway,
    pub target: Target,
    pub prompt: &'a str,
}

/// Address of the item to replace, as given by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Step { step: i64 },
    Activity { step: i64, activity: Option<i64> },
}

/// Address of an item known to exist in a pathway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Located {
    Step(usize),
    Activity { step: usize, activity: usize },
}

impl Target {
    pub fn item_type(&self) -> ItemType {
        match self {
            Self::Step { .. } => ItemType::Step,
            Self::Activity { .. } => ItemType::Activity,
        }
    }

    /// Resolve against `pathway`, failing on out-of-range indices.
    pub fn locate(&self, pathway: &Pathway) -> Result<Located, PipelineError> {
        let step_index = match self {
            Self::Step { step } | Self::Activity { step, .. } => *step,
        };
        let step = usize::try_from(step_index)
            .ok()
            .filter(|i| *i < pathway.steps.len())
            .ok_or_else(|| {
                PipelineError::InvalidStepIndex(format!(
                    "Invalid step index {} for pathway with {} steps",
                    step_index,
                    pathway.steps.len()
                ))
            })?;

        match self {
            Self::Step { .. } => Ok(Located::Step(step)),
            Self::Activity { activity, .. } => {
                let count = pathway.steps[step].activities.len();
                let activity = activity
                    .and_then(|i| usize::try_from(i).ok())
                    .filter(|i| *i < count)
                    .ok_or_else(|| {
                        PipelineError::InvalidActivityIndex(match activity {
                            Some(i) => format!(
                                "Invalid activity index {} for step with {} activities",
                                i, count
                            ),
                            None => "Missing activity index".to_string(),
                        })
                    })?;
                Ok(Located::Activity { step, activity })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curriculum::{Activity, Step};
    use serde_json::json;

    fn pathway() -> Pathway {
        Pathway::new("Intro to Stoicism", "Basics").with_step(
            Step::new("Foundations", "Core ideas")
                .with_activity(Activity::new("Read", "Read Epictetus"))
                .with_activity(Activity::new("Reflect", "Journal")),
        )
    }

    #[test]
    fn test_deserialize_camel_case() {
        let request: RegenerationRequest = serde_json::from_value(json!({
            "pathway": {"name": "P", "description": "D", "steps": []},
            "itemType": "activity",
            "itemIndex": 0,
            "activityIndex": 1,
            "regenerationPrompt": ""
        }))
        .unwrap();

        let valid = request.validate().unwrap();
        assert_eq!(valid.prompt, "");
        assert_eq!(
            valid.target,
            Target::Activity {
                step: 0,
                activity: Some(1)
            }
        );
    }

    #[test]
    fn test_absent_prompt_is_missing() {
        let mut request = RegenerationRequest::step(pathway(), 0, "");
        request.regeneration_prompt = None;
        assert_eq!(request.validate().unwrap_err().kind(), "MissingParameters");
    }

    #[test]
    fn test_unknown_item_type_is_missing() {
        let mut request = RegenerationRequest::step(pathway(), 0, "x");
        request.item_type = Some("quiz".to_string());
        let error = request.validate().unwrap_err();
        assert_eq!(error.kind(), "MissingParameters");
        assert!(error.to_string().contains("quiz"));
    }

    #[test]
    fn test_locate_out_of_range() {
        let pathway = pathway();

        let error = Target::Activity {
            step: 0,
            activity: Some(99),
        }
        .locate(&pathway)
        .unwrap_err();
        assert_eq!(error.kind(), "InvalidActivityIndex");

        let error = Target::Activity {
            step: 0,
            activity: Some(-1),
        }
        .locate(&pathway)
        .unwrap_err();
        assert_eq!(error.kind(), "InvalidActivityIndex");

        let error = Target::Activity {
            step: 0,
            activity: None,
        }
        .locate(&pathway)
        .unwrap_err();
        assert_eq!(error.kind(), "InvalidActivityIndex");

        let error = Target::Step { step: 3 }.locate(&pathway).unwrap_err();
        assert_eq!(error.kind(), "InvalidStepIndex");
    }

    #[test]
    fn test_locate_in_range() {
        let pathway = pathway();
        assert_eq!(
            Target::Activity {
                step: 0,
                activity: Some(1)
            }
            .locate(&pathway)
            .unwrap(),
            Located::Activity {
                step: 0,
                activity: 1
            }
        );
        assert_eq!(Target::Step { step: 0 }.locate(&pathway).unwrap(), Located::Step(0));
    }
}
