//! Reply data model and model-output parsing.
//!
//! The language model answers with a JSON array of at most two reply lines,
//! optionally wrapped in `{"messages": [...]}`. Each line becomes a
//! [`ReplyBundle`] once speech and lip-sync data are attached.

use crate::{OdysseaError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Upper bound on reply lines per generated response
pub const MAX_REPLY_LINES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FacialExpression {
    #[serde(rename = "smile")]
    Smile,
    #[serde(rename = "sad")]
    Sad,
    #[serde(rename = "angry")]
    Angry,
    #[serde(rename = "funnyFace")]
    FunnyFace,
    #[serde(rename = "default")]
    #[default]
    Default,
}

impl FacialExpression {
    pub const ALL: [FacialExpression; 5] = [
        FacialExpression::Smile,
        FacialExpression::Sad,
        FacialExpression::Angry,
        FacialExpression::FunnyFace,
        FacialExpression::Default,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FacialExpression::Smile => "smile",
            FacialExpression::Sad => "sad",
            FacialExpression::Angry => "angry",
            FacialExpression::FunnyFace => "funnyFace",
            FacialExpression::Default => "default",
        }
    }
}

impl fmt::Display for FacialExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FacialExpression {
    type Err = OdysseaError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| OdysseaError::InvalidModelOutput(format!("unknown facial expression '{s}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Animation {
    #[serde(rename = "Talking_0")]
    Talking0,
    #[serde(rename = "Talking_1")]
    Talking1,
    #[serde(rename = "Talking_2")]
    Talking2,
    Crying,
    Laughing,
    Rumba,
    #[default]
    Idle,
    Terrified,
    Angry,
}

impl Animation {
    pub const ALL: [Animation; 9] = [
        Animation::Talking0,
        Animation::Talking1,
        Animation::Talking2,
        Animation::Crying,
        Animation::Laughing,
        Animation::Rumba,
        Animation::Idle,
        Animation::Terrified,
        Animation::Angry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Animation::Talking0 => "Talking_0",
            Animation::Talking1 => "Talking_1",
            Animation::Talking2 => "Talking_2",
            Animation::Crying => "Crying",
            Animation::Laughing => "Laughing",
            Animation::Rumba => "Rumba",
            Animation::Idle => "Idle",
            Animation::Terrified => "Terrified",
            Animation::Angry => "Angry",
        }
    }
}

impl fmt::Display for Animation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Animation {
    type Err = OdysseaError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| OdysseaError::InvalidModelOutput(format!("unknown animation '{s}'")))
    }
}

/// One unit of avatar speech as produced by the language model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyLine {
    pub text: String,
    pub facial_expression: FacialExpression,
    pub animation: Animation,
}

impl ReplyLine {
    pub fn new(
        text: impl Into<String>,
        facial_expression: FacialExpression,
        animation: Animation,
    ) -> Self {
        Self {
            text: text.into(),
            facial_expression,
            animation,
        }
    }
}

/// Synthesized audio (base64 WAV) paired with its phoneme-timing document
#[derive(Debug, Clone, PartialEq)]
pub struct Media {
    pub audio_base64: String,
    pub lipsync: Value,
}

/// A reply line plus its media. `audio` and `lipsync` are either both set
/// or both null; the fields are private so the pair cannot be split.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplyBundle {
    #[serde(flatten)]
    line: ReplyLine,
    audio: Option<String>,
    lipsync: Option<Value>,
}

impl ReplyBundle {
    pub fn new(line: ReplyLine, media: Option<Media>) -> Self {
        match media {
            Some(m) => Self::with_media(line, m),
            None => Self::without_media(line),
        }
    }

    pub fn with_media(line: ReplyLine, media: Media) -> Self {
        Self {
            line,
            audio: Some(media.audio_base64),
            lipsync: Some(media.lipsync),
        }
    }

    pub fn without_media(line: ReplyLine) -> Self {
        Self {
            line,
            audio: None,
            lipsync: None,
        }
    }

    pub fn line(&self) -> &ReplyLine {
        &self.line
    }

    pub fn text(&self) -> &str {
        &self.line.text
    }

    pub fn audio(&self) -> Option<&str> {
        self.audio.as_deref()
    }

    pub fn lipsync(&self) -> Option<&Value> {
        self.lipsync.as_ref()
    }

    pub fn has_media(&self) -> bool {
        self.audio.is_some()
    }
}

/// Body of a successful `/chat` response
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct ChatResponse {
    pub messages: Vec<ReplyBundle>,
}

/// Loosely-typed view of one model entry, validated in [`parse_model_output`]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReplyLine {
    text: Option<Value>,
    facial_expression: Option<Value>,
    animation: Option<Value>,
}

/// Parse the raw model text into reply lines.
///
/// Accepts a bare JSON array or an object wrapping a `messages` array, with
/// an optional Markdown code fence around it. Every entry needs a string
/// `text`; a missing or unknown `facialExpression` falls back to `default`
/// and a missing or unknown `animation` to `Idle`. Entries past
/// [`MAX_REPLY_LINES`] are dropped.
pub fn parse_model_output(raw: &str) -> Result<Vec<ReplyLine>> {
    let body = strip_code_fence(raw.trim());
    let value: Value = serde_json::from_str(body)
        .map_err(|e| OdysseaError::InvalidModelOutput(format!("not valid JSON: {e}")))?;

    let entries = match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("messages") {
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(OdysseaError::InvalidModelOutput(
                    "'messages' is not an array".into(),
                ))
            }
            None => {
                return Err(OdysseaError::InvalidModelOutput(
                    "expected an array or an object with a 'messages' array".into(),
                ))
            }
        },
        other => {
            return Err(OdysseaError::InvalidModelOutput(format!(
                "expected an array, got {}",
                json_kind(&other)
            )))
        }
    };

    if entries.len() > MAX_REPLY_LINES {
        warn!(
            target: "orchestrator",
            count = entries.len(),
            max = MAX_REPLY_LINES,
            "Model returned too many reply lines; truncating"
        );
    }

    entries
        .into_iter()
        .take(MAX_REPLY_LINES)
        .enumerate()
        .map(|(i, entry)| to_reply_line(i, entry))
        .collect()
}

fn to_reply_line(index: usize, entry: Value) -> Result<ReplyLine> {
    if !entry.is_object() {
        return Err(OdysseaError::InvalidModelOutput(format!(
            "entry {index} is {}, expected an object",
            json_kind(&entry)
        )));
    }
    let raw: RawReplyLine = serde_json::from_value(entry)
        .map_err(|e| OdysseaError::InvalidModelOutput(format!("entry {index}: {e}")))?;

    let text = match raw.text {
        Some(Value::String(s)) => s,
        Some(other) => {
            return Err(OdysseaError::InvalidModelOutput(format!(
                "entry {index}: 'text' is {}, expected a string",
                json_kind(&other)
            )))
        }
        None => {
            return Err(OdysseaError::InvalidModelOutput(format!(
                "entry {index}: missing 'text'"
            )))
        }
    };

    let facial_expression = raw
        .facial_expression
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            warn!(target: "orchestrator", index, value = ?raw.facial_expression, "Unrecognised facialExpression; using default");
            FacialExpression::Default
        });

    let animation = raw
        .animation
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            warn!(target: "orchestrator", index, value = ?raw.animation, "Unrecognised animation; using Idle");
            Animation::Idle
        });

    Ok(ReplyLine {
        text,
        facial_expression,
        animation,
    })
}

fn strip_code_fence(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    // Drop an optional language tag on the opening fence line
    let rest = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    rest.trim_end()
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
