//! Replacement of a single step or activity inside an existing pathway.

use std::sync::Arc;

use tracing::{info, warn};

use curriculum::{
    ExistingItem, GeneratedItem, Pathway, PromptAssembler, PromptBrief, ReconcileSummary,
    UrlReconciler,
};

use crate::backend::LlmBackend;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::request::{Located, RegenerationRequest};
use crate::response::{RegeneratedItem, RegenerationResponse};
use crate::retrieval::ContextRetriever;
use crate::stage::{enter, generate_structured, Deadline, Stage};

/// Regenerates one item and splices it into a copy of the pathway.
///
/// The caller's pathway is never mutated. Index errors are reported before
/// any external service is called.
#[derive(Clone)]
pub struct RegenerationOrchestrator {
    backend: Arc<dyn LlmBackend>,
    retriever: ContextRetriever,
    assembler: PromptAssembler,
    config: Arc<PipelineConfig>,
}

impl RegenerationOrchestrator {
    pub fn new(
        backend: Arc<dyn LlmBackend>,
        retriever: ContextRetriever,
        config: Arc<PipelineConfig>,
    ) -> Self {
        Self {
            backend,
            retriever,
            assembler: PromptAssembler::new(config.rule_set),
            config,
        }
    }

    pub async fn regenerate(
        &self,
        request: &RegenerationRequest,
    ) -> Result<RegenerationResponse, PipelineError> {
        let request_id = uuid::Uuid::new_v4().to_string();
        let deadline = Deadline::after(self.config.request_timeout());

        enter(&request_id, Stage::ValidatingInput);
        let valid = request.validate()?;
        let pathway = valid.pathway;

        enter(&request_id, Stage::LocatingTarget);
        let located = valid.target.locate(pathway)?;
        let existing = match located {
            Located::Step(step) => ExistingItem::Step(&pathway.steps[step]),
            Located::Activity { step, activity } => ExistingItem::Activity {
                step: &pathway.steps[step],
                activity: &pathway.steps[step].activities[activity],
            },
        };

        enter(&request_id, Stage::Retrieving);
        let query = format!("{} {} {}", pathway.name, pathway.description, valid.prompt);
        let context = deadline
            .within(
                Stage::Retrieving,
                self.retriever
                    .retrieve(&query, self.config.regeneration.top_k),
            )
            .await?;

        enter(&request_id, Stage::Prompting);
        let brief = PromptBrief::Replace {
            pathway,
            existing,
            request: valid.prompt,
        };
        let prompt = self
            .assembler
            .build_prompt(&brief, &context.passages, &context.videos);

        let item = generate_structured(
            self.backend.as_ref(),
            &request_id,
            prompt,
            brief.shape(),
            &self.config.regeneration.completion,
            &deadline,
        )
        .await?;

        enter(&request_id, Stage::Reconciling);
        let reconciler = UrlReconciler::new(&context.videos);
        let (regenerated, summary) = match item {
            GeneratedItem::Step(step) => {
                let (step, summary) = reconciler.reconcile_step(step);
                (RegeneratedItem::Step(step), summary)
            }
            GeneratedItem::Activity(activity) => {
                let (activity, outcome) = reconciler.reconcile(activity);
                let mut summary = ReconcileSummary::default();
                summary.record(outcome);
                (RegeneratedItem::Activity(activity), summary)
            }
            GeneratedItem::Pathway(_) => {
                return Err(PipelineError::GenerationFailed(
                    "expected a step or activity, got a pathway".to_string(),
                ))
            }
        };
        if summary.repaired_any() {
            warn!(
                request_id = %request_id,
                dropped = summary.dropped,
                fallbacks = summary.fallbacks,
                "Replaced video URLs outside the candidate set"
            );
        }

        enter(&request_id, Stage::Splicing);
        let updated = splice(pathway, located, &regenerated)?;

        enter(&request_id, Stage::Done);
        info!(
            request_id = %request_id,
            item_type = valid.target.item_type().as_str(),
            activities = summary.activities,
            videos_kept = summary.kept,
            videos_dropped = summary.dropped,
            elapsed_ms = deadline.elapsed_ms(),
            "Regenerated pathway item"
        );

        Ok(RegenerationResponse {
            success: true,
            updated_pathway: updated,
            regenerated_item: regenerated,
        })
    }
}

/// Copy `pathway` and replace the located item with `item`.
pub fn splice(
    pathway: &Pathway,
    located: Located,
    item: &RegeneratedItem,
) -> Result<Pathway, PipelineError> {
    let mut updated = pathway.clone();
    match (located, item) {
        (Located::Step(step), RegeneratedItem::Step(replacement)) => {
            updated.steps[step] = replacement.clone();
        }
        (Located::Activity { step, activity }, RegeneratedItem::Activity(replacement)) => {
            updated.steps[step].activities[activity] = replacement.clone();
        }
        _ => {
            return Err(PipelineError::GenerationFailed(
                "regenerated item does not match the target".to_string(),
            ))
        }
    }
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use curriculum::{Activity, Step};

    fn pathway() -> Pathway {
        Pathway::new("P", "D")
            .with_step(
                Step::new("S0", "D")
                    .with_activity(Activity::new("A0", "D"))
                    .with_activity(Activity::new("A1", "D")),
            )
            .with_step(Step::new("S1", "D").with_activity(Activity::new("B0", "D")))
    }

    #[test]
    fn test_splice_activity_leaves_input_untouched() {
        let original = pathway();
        let snapshot = original.clone();
        let replacement = RegeneratedItem::Activity(Activity::new("New", "Fresh"));

        let updated = splice(
            &original,
            Located::Activity {
                step: 0,
                activity: 1,
            },
            &replacement,
        )
        .unwrap();

        assert_eq!(original, snapshot);
        assert_eq!(updated.steps[0].activities[1].name, "New");
        assert_eq!(updated.steps[0].activities[0], original.steps[0].activities[0]);
        assert_eq!(updated.steps[1], original.steps[1]);
    }

    #[test]
    fn test_splice_step() {
        let original = pathway();
        let replacement = RegeneratedItem::Step(Step::new("Fresh", "D"));

        let updated = splice(&original, Located::Step(1), &replacement).unwrap();

        assert_eq!(updated.steps[1].name, "Fresh");
        assert_eq!(updated.steps[0], original.steps[0]);
        assert_eq!(updated.steps.len(), 2);
    }

    #[test]
    fn test_splice_mismatched_item() {
        let error = splice(
            &pathway(),
            Located::Step(0),
            &RegeneratedItem::Activity(Activity::new("A", "D")),
        )
        .unwrap_err();
        assert_eq!(error.kind(), "GenerationFailed");
    }
}
