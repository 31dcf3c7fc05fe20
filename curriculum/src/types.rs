//! Learning pathway document model.
//!
//! A [`Pathway`] holds ordered [`Step`]s, each holding ordered [`Activity`]s.
//! Field names serialize in camelCase to match the pathway documents the
//! Nuxt frontend stores and renders.
//!
//! With the `typescript` feature enabled, these types can be exported to
//! TypeScript using ts-rs.

use std::fmt;

use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Top-level learning pathway document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Pathway {
    /// Title of the pathway
    pub name: String,
    /// What the pathway covers
    pub description: String,
    /// Ordered stages of the pathway
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Provenance recorded when the pathway was generated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PathwayMetadata>,
}

impl Pathway {
    /// Create a pathway with no steps.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            steps: Vec::new(),
            metadata: None,
        }
    }

    /// Append a step.
    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Iterate over every activity in every step.
    pub fn activities(&self) -> impl Iterator<Item = &Activity> {
        self.steps.iter().flat_map(|step| step.activities.iter())
    }
}

/// An ordered stage within a pathway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

impl Step {
    /// Create a step with no activities.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            activities: Vec::new(),
        }
    }

    /// Append an activity.
    pub fn with_activity(mut self, activity: Activity) -> Self {
        self.activities.push(activity);
        self
    }
}

/// Atomic unit of work inside a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub name: String,
    pub description: String,
    /// Text for reading activities
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_urls: Option<Vec<String>>,
    /// Must only contain URLs from the request's video candidate set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_urls: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz: Option<Vec<QuizQuestion>>,
    /// Attached by link reconciliation, never by the generator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_videos: Option<Vec<VideoReference>>,
}

impl Activity {
    /// Create an activity with only the required fields.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            read_data: None,
            pdf_urls: None,
            video_urls: None,
            quiz: None,
            youtube_videos: None,
        }
    }

    /// Set reading text.
    pub fn with_read_data(mut self, text: impl Into<String>) -> Self {
        self.read_data = Some(text.into());
        self
    }

    /// Set video URLs.
    pub fn with_video_urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.video_urls = Some(urls.into_iter().map(Into::into).collect());
        self
    }

    /// Set quiz questions.
    pub fn with_quiz(mut self, quiz: Vec<QuizQuestion>) -> Self {
        self.quiz = Some(quiz);
        self
    }

    /// Video URLs, or an empty slice when absent.
    pub fn video_urls(&self) -> &[String] {
        self.video_urls.as_deref().unwrap_or(&[])
    }
}

/// Kind of quiz question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    /// Open-ended answer
    Subjective,
    /// Multiple choice
    Objective,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subjective => "subjective",
            Self::Objective => "objective",
        }
    }

    /// Parse from the wire representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "subjective" => Some(Self::Subjective),
            "objective" => Some(Self::Objective),
            _ => None,
        }
    }
}

/// A quiz question attached to an activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<f64>,
}

impl QuizQuestion {
    /// Whether an objective question's answer key is a non-empty subset of
    /// its options. Subjective questions always pass.
    pub fn has_consistent_answer_key(&self) -> bool {
        match self.question_type {
            QuestionType::Subjective => true,
            QuestionType::Objective => {
                let options = self.options.as_deref().unwrap_or(&[]);
                match self.correct_options.as_deref() {
                    Some(correct) if !correct.is_empty() => {
                        correct.iter().all(|answer| options.contains(answer))
                    }
                    _ => false,
                }
            }
        }
    }
}

/// A candidate video offered to the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct VideoReference {
    pub title: String,
    pub url: String,
    pub description: String,
}

impl VideoReference {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            description: description.into(),
        }
    }
}

/// Page of a source document: a number, or free text such as "12-14".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(untagged)]
pub enum PageRef {
    Number(i64),
    Text(String),
}

impl PageRef {
    /// Read a page from untyped index metadata.
    ///
    /// Vector stores commonly round-trip integers as floats, so whole-number
    /// floats are normalised to [`PageRef::Number`].
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Self::Number(i))
                } else {
                    let f = n.as_f64()?;
                    if f.fract() == 0.0 && f.is_finite() {
                        Some(Self::Number(f as i64))
                    } else {
                        Some(Self::Text(n.to_string()))
                    }
                }
            }
            serde_json::Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for PageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Where a retrieved passage came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct PassageSource {
    pub document: String,
    pub page: PageRef,
}

/// A chunk of reference text returned by similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub text: String,
    pub metadata: PassageSource,
}

impl RetrievedPassage {
    pub fn new(text: impl Into<String>, document: impl Into<String>, page: PageRef) -> Self {
        Self {
            text: text.into(),
            metadata: PassageSource {
                document: document.into(),
                page,
            },
        }
    }
}

/// Provenance attached to a generated pathway.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct PathwayMetadata {
    /// Source of every passage used as context
    #[serde(default)]
    pub sources: Vec<PassageSource>,
    /// Every video candidate offered to the generator, used or not
    #[serde(default, alias = "youtubeVideos")]
    pub videos: Vec<VideoReference>,
}

/// The five-field brief a full pathway is generated from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct PathwayBrief {
    #[serde(default, alias = "pathway_name")]
    pub name: String,
    #[serde(default, alias = "pathway_overview")]
    pub overview: String,
    #[serde(default, alias = "pathway_learning_outcomes")]
    pub learning_outcomes: String,
    #[serde(default)]
    pub audience: String,
    #[serde(default)]
    pub rationale: String,
}

impl PathwayBrief {
    /// Names of brief fields that are empty or blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("overview", &self.overview),
            ("learningOutcomes", &self.learning_outcomes),
            ("audience", &self.audience),
            ("rationale", &self.rationale),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }
}

/// Which kind of pathway item a regeneration replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Step,
    Activity,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Step => "step",
            Self::Activity => "activity",
        }
    }

    /// Parse from the wire representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "step" => Some(Self::Step),
            "activity" => Some(Self::Activity),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_serializes_camel_case_and_skips_absent() {
        let activity = Activity::new("Watch", "Watch the lecture")
            .with_video_urls(["https://www.youtube.com/watch?v=abc"]);

        let json = serde_json::to_value(&activity).unwrap();
        assert_eq!(json["videoUrls"][0], "https://www.youtube.com/watch?v=abc");
        assert!(json.get("readData").is_none());
        assert!(json.get("youtubeVideos").is_none());
    }

    #[test]
    fn test_quiz_question_type_field() {
        let json = serde_json::json!({
            "question": "Who wrote Meditations?",
            "type": "objective",
            "options": ["Seneca", "Marcus Aurelius"],
            "correctOptions": ["Marcus Aurelius"],
            "points": 5
        });

        let question: QuizQuestion = serde_json::from_value(json).unwrap();
        assert_eq!(question.question_type, QuestionType::Objective);
        assert_eq!(question.points, Some(5.0));
        assert!(question.has_consistent_answer_key());
    }

    #[test]
    fn test_answer_key_outside_options_is_inconsistent() {
        let question = QuizQuestion {
            question: "Pick one".to_string(),
            question_type: QuestionType::Objective,
            options: Some(vec!["A".to_string(), "B".to_string()]),
            correct_options: Some(vec!["C".to_string()]),
            points: None,
        };
        assert!(!question.has_consistent_answer_key());

        let empty_key = QuizQuestion {
            correct_options: Some(vec![]),
            ..question.clone()
        };
        assert!(!empty_key.has_consistent_answer_key());

        let subjective = QuizQuestion {
            question_type: QuestionType::Subjective,
            ..question
        };
        assert!(subjective.has_consistent_answer_key());
    }

    #[test]
    fn test_page_ref_from_index_metadata() {
        assert_eq!(
            PageRef::from_json(&serde_json::json!(12.0)),
            Some(PageRef::Number(12))
        );
        assert_eq!(
            PageRef::from_json(&serde_json::json!(7)),
            Some(PageRef::Number(7))
        );
        assert_eq!(
            PageRef::from_json(&serde_json::json!("12-14")),
            Some(PageRef::Text("12-14".to_string()))
        );
        assert_eq!(PageRef::from_json(&serde_json::Value::Null), None);
        assert_eq!(PageRef::Number(3).to_string(), "3");
    }

    #[test]
    fn test_metadata_accepts_legacy_video_key() {
        let json = serde_json::json!({
            "sources": [{"document": "stoicism.pdf", "page": 4}],
            "youtubeVideos": [{"title": "T", "url": "https://v/1", "description": "D"}]
        });

        let metadata: PathwayMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(metadata.videos.len(), 1);
        assert_eq!(metadata.sources[0].page, PageRef::Number(4));

        let back = serde_json::to_value(&metadata).unwrap();
        assert!(back.get("videos").is_some());
    }

    #[test]
    fn test_brief_missing_fields() {
        let brief = PathwayBrief {
            name: "Intro to Stoicism".to_string(),
            overview: "  ".to_string(),
            learning_outcomes: "Understand the dichotomy of control".to_string(),
            audience: String::new(),
            rationale: "Resilience".to_string(),
        };

        assert_eq!(brief.missing_fields(), vec!["overview", "audience"]);
    }

    #[test]
    fn test_brief_accepts_query_parameter_names() {
        let brief: PathwayBrief = serde_json::from_value(serde_json::json!({
            "pathway_name": "N",
            "pathway_overview": "O",
            "pathway_learning_outcomes": "L",
            "audience": "A",
            "rationale": "R"
        }))
        .unwrap();

        assert!(brief.missing_fields().is_empty());
        assert_eq!(brief.learning_outcomes, "L");
    }
}
