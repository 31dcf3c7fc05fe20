//! Output shape contract for generated content.
//!
//! [`OutputShape`] is the closed set of objects the generator may be asked
//! to produce. Each shape yields the JSON Schema declared to the completion
//! service and validates the object that comes back. Validation walks the
//! raw JSON, keeps only fields the shape declares and rejects anything
//! structurally unusable.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::types::{Activity, Pathway, QuestionType, QuizQuestion, Step};

/// Shape violations found while validating generator output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaViolation {
    #[error("{path}: expected an object")]
    NotAnObject { path: String },

    #[error("{path}: required field is missing")]
    MissingField { path: String },

    #[error("{path}: required field is blank")]
    BlankField { path: String },

    #[error("{path}: list must not be empty")]
    EmptyList { path: String },

    #[error("{path}: expected {expected}")]
    WrongType { path: String, expected: &'static str },

    #[error("{path}: unknown question type {found:?}")]
    UnknownQuestionType { path: String, found: String },
}

/// The object a single generation call must produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputShape {
    Pathway,
    Step,
    Activity,
}

impl OutputShape {
    /// Name of the function the generator is forced to call.
    pub fn function_name(&self) -> &'static str {
        match self {
            Self::Pathway => "generateLearningPathway",
            Self::Step => "generateStep",
            Self::Activity => "generateActivity",
        }
    }

    pub fn function_description(&self) -> &'static str {
        match self {
            Self::Pathway => {
                "Generates a learning pathway with steps and activities according to the schema."
            }
            Self::Step => "Generates a new step for the learning pathway.",
            Self::Activity => "Generates a new activity for a step in the learning pathway.",
        }
    }

    /// JSON Schema for the function parameters.
    pub fn json_schema(&self) -> Value {
        match self {
            Self::Pathway => pathway_schema(),
            Self::Step => step_schema(),
            Self::Activity => activity_schema(),
        }
    }

    /// Validate raw generator output against this shape.
    pub fn validate(&self, value: &Value) -> Result<GeneratedItem, SchemaViolation> {
        match self {
            Self::Pathway => validate_pathway(value).map(GeneratedItem::Pathway),
            Self::Step => validate_step(value, "").map(GeneratedItem::Step),
            Self::Activity => validate_activity(value, "").map(GeneratedItem::Activity),
        }
    }
}

/// A validated generation result, tagged by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedItem {
    Pathway(Pathway),
    Step(Step),
    Activity(Activity),
}

impl GeneratedItem {
    pub fn shape(&self) -> OutputShape {
        match self {
            Self::Pathway(_) => OutputShape::Pathway,
            Self::Step(_) => OutputShape::Step,
            Self::Activity(_) => OutputShape::Activity,
        }
    }

    /// Every activity contained in the item.
    pub fn activities(&self) -> Vec<&Activity> {
        match self {
            Self::Pathway(pathway) => pathway.activities().collect(),
            Self::Step(step) => step.activities.iter().collect(),
            Self::Activity(activity) => vec![activity],
        }
    }
}

// ============================================================================
// Schema declarations
// ============================================================================

fn string_list(description: &str) -> Value {
    json!({
        "type": "array",
        "items": { "type": "string" },
        "description": description,
    })
}

fn quiz_question_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "question": {
                "type": "string",
                "description": "The quiz question text.",
            },
            "type": {
                "type": "string",
                "enum": ["subjective", "objective"],
                "description": "Type of question: subjective (open-ended) or objective (multiple choice).",
            },
            "options": string_list("Answer options for multiple choice questions."),
            "correctOptions": string_list("Correct answer options for multiple choice questions."),
            "points": {
                "type": "number",
                "description": "Points awarded for correctly answering this question.",
            },
        },
        "required": ["question", "type"],
    })
}

fn activity_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": {
                "type": "string",
                "description": "A concise title for the activity.",
            },
            "description": {
                "type": "string",
                "description": "Instructions or details for the activity.",
            },
            "readData": {
                "type": "string",
                "description": "Text content for reading activities.",
            },
            "pdfUrls": string_list("URLs to PDF resources for this activity."),
            "videoUrls": string_list("URLs to video resources for this activity."),
            "quiz": {
                "type": "array",
                "description": "Quiz questions for this activity.",
                "items": quiz_question_schema(),
            },
        },
        "required": ["name", "description"],
    })
}

fn step_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": {
                "type": "string",
                "description": "The name or title of the step.",
            },
            "description": {
                "type": "string",
                "description": "A detailed description of the step.",
            },
            "activities": {
                "type": "array",
                "description": "A list of activities under this step.",
                "items": activity_schema(),
            },
        },
        "required": ["name", "description", "activities"],
    })
}

fn pathway_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": {
                "type": "string",
                "description": "The name or title of the pathway.",
            },
            "description": {
                "type": "string",
                "description": "A comprehensive description of the pathway.",
            },
            "steps": {
                "type": "array",
                "description": "List of steps in the learning pathway.",
                "items": step_schema(),
            },
        },
        "required": ["name", "description", "steps"],
    })
}

// ============================================================================
// Validation
// ============================================================================

fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

fn as_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, SchemaViolation> {
    value.as_object().ok_or_else(|| SchemaViolation::NotAnObject {
        path: if path.is_empty() { "$".to_string() } else { path.to_string() },
    })
}

/// Fetch a field, treating JSON null as absent.
fn field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

fn required_str(obj: &Map<String, Value>, key: &str, parent: &str) -> Result<String, SchemaViolation> {
    let path = child_path(parent, key);
    let value = field(obj, key).ok_or_else(|| SchemaViolation::MissingField { path: path.clone() })?;
    let text = value.as_str().ok_or_else(|| SchemaViolation::WrongType {
        path: path.clone(),
        expected: "a string",
    })?;
    if text.trim().is_empty() {
        return Err(SchemaViolation::BlankField { path });
    }
    Ok(text.to_string())
}

fn optional_str(obj: &Map<String, Value>, key: &str, parent: &str) -> Result<Option<String>, SchemaViolation> {
    match field(obj, key) {
        None => Ok(None),
        Some(value) => value.as_str().map(|s| Some(s.to_string())).ok_or_else(|| {
            SchemaViolation::WrongType {
                path: child_path(parent, key),
                expected: "a string",
            }
        }),
    }
}

fn optional_string_list(
    obj: &Map<String, Value>,
    key: &str,
    parent: &str,
) -> Result<Option<Vec<String>>, SchemaViolation> {
    let path = child_path(parent, key);
    let Some(value) = field(obj, key) else {
        return Ok(None);
    };
    let items = value.as_array().ok_or_else(|| SchemaViolation::WrongType {
        path: path.clone(),
        expected: "an array of strings",
    })?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_str().map(str::to_string).ok_or_else(|| SchemaViolation::WrongType {
                path: format!("{}[{}]", path, i),
                expected: "a string",
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn required_list<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    parent: &str,
) -> Result<&'a Vec<Value>, SchemaViolation> {
    let path = child_path(parent, key);
    let value = field(obj, key).ok_or_else(|| SchemaViolation::MissingField { path: path.clone() })?;
    let items = value.as_array().ok_or_else(|| SchemaViolation::WrongType {
        path: path.clone(),
        expected: "an array",
    })?;
    if items.is_empty() {
        return Err(SchemaViolation::EmptyList { path });
    }
    Ok(items)
}

fn validate_pathway(value: &Value) -> Result<Pathway, SchemaViolation> {
    let obj = as_object(value, "")?;
    let name = required_str(obj, "name", "")?;
    let description = required_str(obj, "description", "")?;
    let steps = required_list(obj, "steps", "")?
        .iter()
        .enumerate()
        .map(|(i, step)| validate_step(step, &format!("steps[{}]", i)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Pathway {
        name,
        description,
        steps,
        metadata: None,
    })
}

fn validate_step(value: &Value, path: &str) -> Result<Step, SchemaViolation> {
    let obj = as_object(value, path)?;
    let name = required_str(obj, "name", path)?;
    let description = required_str(obj, "description", path)?;
    let activities_path = child_path(path, "activities");
    let activities = required_list(obj, "activities", path)?
        .iter()
        .enumerate()
        .map(|(i, activity)| validate_activity(activity, &format!("{}[{}]", activities_path, i)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Step {
        name,
        description,
        activities,
    })
}

fn validate_activity(value: &Value, path: &str) -> Result<Activity, SchemaViolation> {
    let obj = as_object(value, path)?;
    let name = required_str(obj, "name", path)?;
    let description = required_str(obj, "description", path)?;

    let quiz = match field(obj, "quiz") {
        None => None,
        Some(value) => {
            let quiz_path = child_path(path, "quiz");
            let items = value.as_array().ok_or_else(|| SchemaViolation::WrongType {
                path: quiz_path.clone(),
                expected: "an array",
            })?;
            Some(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, q)| validate_question(q, &format!("{}[{}]", quiz_path, i)))
                    .collect::<Result<Vec<_>, _>>()?,
            )
        }
    };

    // youtubeVideos is attached by reconciliation and never taken from the generator.
    Ok(Activity {
        name,
        description,
        read_data: optional_str(obj, "readData", path)?,
        pdf_urls: optional_string_list(obj, "pdfUrls", path)?,
        video_urls: optional_string_list(obj, "videoUrls", path)?,
        quiz,
        youtube_videos: None,
    })
}

fn validate_question(value: &Value, path: &str) -> Result<QuizQuestion, SchemaViolation> {
    let obj = as_object(value, path)?;
    let question = required_str(obj, "question", path)?;

    let type_path = child_path(path, "type");
    let raw_type = field(obj, "type")
        .ok_or_else(|| SchemaViolation::MissingField { path: type_path.clone() })?
        .as_str()
        .ok_or_else(|| SchemaViolation::WrongType {
            path: type_path.clone(),
            expected: "a string",
        })?;
    let question_type = QuestionType::parse(raw_type).ok_or_else(|| {
        SchemaViolation::UnknownQuestionType {
            path: type_path,
            found: raw_type.to_string(),
        }
    })?;

    let points = match field(obj, "points") {
        None => None,
        Some(value) => Some(value.as_f64().ok_or_else(|| SchemaViolation::WrongType {
            path: child_path(path, "points"),
            expected: "a number",
        })?),
    };

    Ok(QuizQuestion {
        question,
        question_type,
        options: optional_string_list(obj, "options", path)?,
        correct_options: optional_string_list(obj, "correctOptions", path)?,
        points,
    })
}
