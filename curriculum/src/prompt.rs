//! System prompt assembly for pathway generation.
//!
//! Renders the brief (or the item being replaced), a numbered rule list,
//! the retrieved passages and the video candidates into one deterministic
//! system prompt. The same inputs always yield the same prompt.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::schema::OutputShape;
use crate::types::{Activity, Pathway, PathwayBrief, RetrievedPassage, Step, VideoReference};

/// Versioned rule sets for the generator.
///
/// `Core` carries the structural and field-usage rules. `Cited` adds the
/// activity-type taxonomy and the page citation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSet {
    Core,
    #[default]
    Cited,
}

impl RuleSet {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Cited => "cited",
        }
    }
}

/// The item a regeneration replaces, with the context it sits in.
#[derive(Debug, Clone, Copy)]
pub enum ExistingItem<'a> {
    Step(&'a Step),
    Activity {
        step: &'a Step,
        activity: &'a Activity,
    },
}

impl ExistingItem<'_> {
    /// Shape the replacement must have.
    pub fn shape(&self) -> OutputShape {
        match self {
            Self::Step(_) => OutputShape::Step,
            Self::Activity { .. } => OutputShape::Activity,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Step(_) => "step",
            Self::Activity { .. } => "activity",
        }
    }

    fn to_pretty_json(self) -> String {
        match self {
            Self::Step(step) => serde_json::to_string_pretty(step).unwrap_or_default(),
            Self::Activity { activity, .. } => {
                serde_json::to_string_pretty(activity).unwrap_or_default()
            }
        }
    }
}

/// What the prompt asks the generator to produce.
#[derive(Debug, Clone, Copy)]
pub enum PromptBrief<'a> {
    /// A complete pathway from a five-field brief
    Pathway(&'a PathwayBrief),
    /// A replacement for one item of an existing pathway
    Replace {
        pathway: &'a Pathway,
        existing: ExistingItem<'a>,
        request: &'a str,
    },
}

impl PromptBrief<'_> {
    pub fn shape(&self) -> OutputShape {
        match self {
            Self::Pathway(_) => OutputShape::Pathway,
            Self::Replace { existing, .. } => existing.shape(),
        }
    }
}

/// Assembles generator system prompts.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptAssembler {
    rules: RuleSet,
}

impl PromptAssembler {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> RuleSet {
        self.rules
    }

    /// Build the complete system prompt.
    pub fn build_prompt(
        &self,
        brief: &PromptBrief<'_>,
        passages: &[RetrievedPassage],
        videos: &[VideoReference],
    ) -> String {
        let mut prompt = String::new();

        match brief {
            PromptBrief::Pathway(brief) => {
                prompt.push_str(
                    "Your role is to flesh out a learning pathway. I'm going to give you details for a pathway, \
                     and I need you to provide a series of steps and activities that the user can take to \
                     achieve the learning goals.\n\n",
                );
                prompt.push_str(&format!("Pathway name: {}\n", brief.name));
                prompt.push_str(&format!("Pathway overview: {}\n", brief.overview));
                prompt.push_str(&format!(
                    "Pathway learning outcomes: {}\n",
                    brief.learning_outcomes
                ));
                prompt.push_str(&format!("Pathway audience: {}\n", brief.audience));
                prompt.push_str(&format!("Pathway rationale: {}\n\n", brief.rationale));
                prompt.push_str("IMPORTANT RULES:\n");
            }
            PromptBrief::Replace {
                pathway,
                existing,
                request,
            } => {
                prompt.push_str(&format!(
                    "Your role is to regenerate {} in a learning pathway based on user feedback.\n\n",
                    match existing {
                        ExistingItem::Step(_) => "a step",
                        ExistingItem::Activity { .. } => "an activity in a learning pathway step",
                    }
                ));
                prompt.push_str(&format!("Current pathway: {}\n", pathway.name));
                prompt.push_str(&format!("Pathway description: {}\n", pathway.description));
                if let ExistingItem::Activity { step, .. } = existing {
                    prompt.push_str(&format!("Current step: {}\n", step.name));
                    prompt.push_str(&format!("Step description: {}\n", step.description));
                }
                prompt.push_str(&format!("User's regeneration request: {}\n\n", request));
                prompt.push_str("INSTRUCTIONS:\n");
            }
        }

        for (i, rule) in self.rule_list(brief.shape()).iter().enumerate() {
            prompt.push_str(&format!("{}. {}\n", i + 1, rule));
        }

        if let PromptBrief::Replace { existing, .. } = brief {
            let label = existing.label();
            prompt.push_str(&format!("\nCURRENT {} TO REPLACE:\n", label.to_uppercase()));
            prompt.push_str(&existing.to_pretty_json());
            prompt.push_str(&format!(
                "\n\nReturn exactly one {} that replaces the {} above. Keep the same structure \
                 and fields, changing the content as the user's request asks.\n",
                label, label
            ));
        }

        prompt.push_str("\nCONTEXT:\n");
        prompt.push_str("Use the following context to generate the content:\n");
        if passages.is_empty() {
            prompt.push_str("(no reference passages were found)\n");
        }
        for passage in passages {
            prompt.push_str(&format!(
                "{} (Document: {}, Page: {})\n",
                passage.text, passage.metadata.document, passage.metadata.page
            ));
        }

        prompt.push_str("\nVIDEOS - USE ONLY THESE EXACT URLS FOR VIDEO ACTIVITIES:\n");
        if videos.is_empty() {
            prompt.push_str("(no videos are available; do not include any video URLs)\n");
        }
        let rendered: Vec<String> = videos
            .iter()
            .map(|video| {
                format!(
                    "Title: {}\nURL: {}\nDescription: {}",
                    video.title, video.url, video.description
                )
            })
            .collect();
        prompt.push_str(&rendered.join("\n\n"));
        if !videos.is_empty() {
            prompt.push('\n');
        }

        prompt.push_str(
            "\nYOU MUST ONLY USE THESE EXACT VIDEO URLS IN YOUR GENERATED CONTENT. DO NOT CREATE YOUR OWN URLS.\n",
        );

        prompt
    }

    /// The numbered rules for a given output shape, in order.
    pub fn rule_list(&self, shape: OutputShape) -> Vec<String> {
        let mut rules: Vec<String> = Vec::new();

        match shape {
            OutputShape::Pathway => rules.push(
                "Structure the pathway as follows: A Pathway contains Steps, and each Step contains Activities."
                    .to_string(),
            ),
            OutputShape::Step => {
                rules.push("Create a new step to replace the existing one based on the user's request.".to_string());
                rules.push(
                    "The step should have a name, description, and activities that fit within the overall pathway structure."
                        .to_string(),
                );
            }
            OutputShape::Activity => rules.push(
                "Create a new activity to replace the existing one based on the user's request.".to_string(),
            ),
        }

        rules.push("Each Activity must have a name and description.".to_string());

        if self.rules == RuleSet::Cited {
            rules.push(
                "Each Activity is one of these types: Read (text in \"readData\"), Watch (a link in \"videoUrls\"), \
                 Quiz (questions in \"quiz\"), or Reflect (an open-ended prompt in the description)."
                    .to_string(),
            );
        }

        rules.push("For reading activities, include relevant text in the \"readData\" field.".to_string());
        rules.push(
            "If an Activity should link to a PDF document, include URLs in the \"pdfUrls\" array.".to_string(),
        );
        rules.push(
            "For video activities, ONLY USE THE EXACT URLs listed under VIDEOS in the \"videoUrls\" array. \
             DO NOT generate your own URLs or placeholders."
                .to_string(),
        );
        rules.push(
            "For quiz activities, create appropriate questions in the \"quiz\" array. Each question has a \"type\" \
             of \"subjective\" (open-ended) or \"objective\" (multiple choice). Objective questions include an \
             \"options\" array and a \"correctOptions\" array drawn from those options. Assign a \"points\" value \
             to each question."
                .to_string(),
        );

        if shape != OutputShape::Activity {
            rules.push(
                "Don't include step numbers in names like \"Step 1\", \"Step 2\", etc. Just use descriptive titles."
                    .to_string(),
            );
        }

        rules.push("Include sources where relevant, and format document names to be reader-friendly.".to_string());

        if self.rules == RuleSet::Cited {
            rules.push(
                "When a reading activity cites a document, give the document name and the page range it covers, \
                 for example (Document: Enchiridion, Pages: 3-5)."
                    .to_string(),
            );
            rules.push(match shape {
                OutputShape::Pathway => {
                    "Reading activities must not cite overlapping page ranges of the same document.".to_string()
                }
                _ => "Reading activities must not cite page ranges of a document that overlap pages already cited \
                      elsewhere in the pathway."
                    .to_string(),
            });
        }

        match shape {
            OutputShape::Pathway => {
                rules.push("Each pathway should have 5-7 steps, with 3-4 activities per step.".to_string())
            }
            OutputShape::Step => rules.push("The step should have 3-4 activities.".to_string()),
            OutputShape::Activity => {}
        }

        rules.push(
            "IMPORTANT: For any video-based activities, you MUST ONLY use the exact video URLs provided below. \
             DO NOT create or invent URLs."
                .to_string(),
        );

        rules
    }

    /// Short, stable fingerprint of a prompt for log correlation.
    pub fn digest(prompt: &str) -> String {
        let hash = Sha256::digest(prompt.as_bytes());
        hex::encode(&hash[..8])
    }

    /// Estimate token count for a prompt (rough approximation).
    ///
    /// Uses 4 characters per token as a rough estimate.
    pub fn estimate_tokens(prompt: &str) -> usize {
        prompt.len() / 4
    }
}
