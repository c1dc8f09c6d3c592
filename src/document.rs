//! Input documents: dump synsets, suggestions and votes.
//!
//! All three arrive as JSON lines, optionally wrapped in a search-index
//! `{"_source": {...}}` envelope. Suggestion actions are parsed into a closed
//! [`Action`] type at the boundary, so the engines never dispatch on strings.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DocumentError, DocumentResult};

// ---------------------------------------------------------------------------
// Attributes and actions
// ---------------------------------------------------------------------------

/// A lexical attribute of a synset, shared by the dump and the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Attribute {
    #[serde(rename = "word_pt")]
    Word,
    #[serde(rename = "gloss_pt")]
    Gloss,
    #[serde(rename = "example_pt")]
    Example,
}

impl Attribute {
    pub const ALL: [Attribute; 3] = [Attribute::Word, Attribute::Gloss, Attribute::Example];

    /// Field name in the dump documents.
    pub fn field(self) -> &'static str {
        match self {
            Attribute::Word => "word_pt",
            Attribute::Gloss => "gloss_pt",
            Attribute::Example => "example_pt",
        }
    }

    /// Action adding `value` to this attribute.
    pub fn add(self, value: String) -> Action {
        match self {
            Attribute::Word => Action::AddWord(value),
            Attribute::Gloss => Action::AddGloss(value),
            Attribute::Example => Action::AddExample(value),
        }
    }

    /// Action removing `value` from this attribute.
    pub fn remove(self, value: String) -> Action {
        match self {
            Attribute::Word => Action::RemoveWord(value),
            Attribute::Gloss => Action::RemoveGloss(value),
            Attribute::Example => Action::RemoveExample(value),
        }
    }
}

/// Wire name of an edit action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionKind {
    AddWord,
    AddGloss,
    AddExample,
    RemoveWord,
    RemoveGloss,
    RemoveExample,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::AddWord => "add-word-pt",
            ActionKind::AddGloss => "add-gloss-pt",
            ActionKind::AddExample => "add-example-pt",
            ActionKind::RemoveWord => "remove-word-pt",
            ActionKind::RemoveGloss => "remove-gloss-pt",
            ActionKind::RemoveExample => "remove-example-pt",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "add-word-pt" => ActionKind::AddWord,
            "add-gloss-pt" => ActionKind::AddGloss,
            "add-example-pt" => ActionKind::AddExample,
            "remove-word-pt" => ActionKind::RemoveWord,
            "remove-gloss-pt" => ActionKind::RemoveGloss,
            "remove-example-pt" => ActionKind::RemoveExample,
            _ => return None,
        })
    }

    pub fn is_addition(self) -> bool {
        matches!(
            self,
            ActionKind::AddWord | ActionKind::AddGloss | ActionKind::AddExample
        )
    }

    /// Application rank among actions sharing a date: removals first.
    pub fn rank(self) -> u8 {
        match self {
            ActionKind::RemoveWord => 0,
            ActionKind::RemoveGloss => 1,
            ActionKind::RemoveExample => 2,
            ActionKind::AddWord => 3,
            ActionKind::AddGloss => 4,
            ActionKind::AddExample => 5,
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An edit to one synset, carrying its lexical payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    AddWord(String),
    AddGloss(String),
    AddExample(String),
    RemoveWord(String),
    RemoveGloss(String),
    RemoveExample(String),
}

impl Action {
    pub fn new(kind: ActionKind, param: String) -> Self {
        match kind {
            ActionKind::AddWord => Action::AddWord(param),
            ActionKind::AddGloss => Action::AddGloss(param),
            ActionKind::AddExample => Action::AddExample(param),
            ActionKind::RemoveWord => Action::RemoveWord(param),
            ActionKind::RemoveGloss => Action::RemoveGloss(param),
            ActionKind::RemoveExample => Action::RemoveExample(param),
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::AddWord(_) => ActionKind::AddWord,
            Action::AddGloss(_) => ActionKind::AddGloss,
            Action::AddExample(_) => ActionKind::AddExample,
            Action::RemoveWord(_) => ActionKind::RemoveWord,
            Action::RemoveGloss(_) => ActionKind::RemoveGloss,
            Action::RemoveExample(_) => ActionKind::RemoveExample,
        }
    }

    pub fn param(&self) -> &str {
        match self {
            Action::AddWord(p)
            | Action::AddGloss(p)
            | Action::AddExample(p)
            | Action::RemoveWord(p)
            | Action::RemoveGloss(p)
            | Action::RemoveExample(p) => p,
        }
    }
}

impl Serialize for Action {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("Action", 2)?;
        state.serialize_field("action", self.kind().as_str())?;
        state.serialize_field("params", self.param())?;
        state.end()
    }
}

// ---------------------------------------------------------------------------
// Suggestions and votes
// ---------------------------------------------------------------------------

/// What a suggestion asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionAction {
    Edit(Action),
    Comment,
    /// An action name outside the known set; logged and skipped when applied.
    Unrecognized(String),
}

impl SuggestionAction {
    fn parse(name: &str, params: String) -> Self {
        match ActionKind::parse(name) {
            Some(kind) => SuggestionAction::Edit(Action::new(kind, params)),
            None if name == "comment" => SuggestionAction::Comment,
            None => SuggestionAction::Unrecognized(name.to_string()),
        }
    }
}

/// Suggestion timestamp: epoch number or ISO text, compared within its kind.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SuggestionDate {
    Epoch(i64),
    Text(String),
}

impl Default for SuggestionDate {
    fn default() -> Self {
        SuggestionDate::Epoch(0)
    }
}

/// A proposed edit from the collaborative editor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawSuggestion")]
pub struct Suggestion {
    pub id: String,
    pub doc_id: String,
    pub action: SuggestionAction,
    pub user: String,
    pub status: String,
    pub date: SuggestionDate,
}

impl Suggestion {
    pub fn is_new(&self) -> bool {
        self.status == "new"
    }
}

#[derive(Deserialize)]
struct RawSuggestion {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    #[serde(deserialize_with = "string_or_number")]
    doc_id: String,
    action: String,
    #[serde(default, deserialize_with = "string_or_number")]
    params: String,
    #[serde(default)]
    user: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    date: Option<Value>,
}

impl TryFrom<RawSuggestion> for Suggestion {
    type Error = String;

    fn try_from(raw: RawSuggestion) -> Result<Self, Self::Error> {
        let date = match raw.date {
            None | Some(Value::Null) => SuggestionDate::default(),
            Some(Value::Number(n)) => SuggestionDate::Epoch(
                n.as_i64()
                    .or_else(|| n.as_f64().map(|f| f as i64))
                    .ok_or_else(|| format!("suggestion {}: unsupported date {n}", raw.id))?,
            ),
            Some(Value::String(s)) => SuggestionDate::Text(s),
            Some(other) => return Err(format!("suggestion {}: unsupported date {other}", raw.id)),
        };
        Ok(Suggestion {
            action: SuggestionAction::parse(&raw.action, raw.params),
            id: raw.id,
            doc_id: raw.doc_id,
            user: raw.user,
            status: raw.status,
            date,
        })
    }
}

/// A signed score attached to a suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Vote {
    #[serde(deserialize_with = "string_or_number")]
    pub suggestion_id: String,
    pub value: i64,
}

// ---------------------------------------------------------------------------
// Dump synsets
// ---------------------------------------------------------------------------

/// One synset from the dump snapshot.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DumpSynset {
    #[serde(deserialize_with = "string_or_number")]
    pub doc_id: String,
    #[serde(default)]
    pub word_pt: Vec<String>,
    #[serde(default)]
    pub gloss_pt: Vec<String>,
    #[serde(default)]
    pub example_pt: Vec<String>,
    /// Every other field, pointer lists included.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// One entry of a dump pointer list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DumpPointer {
    #[serde(default)]
    pub source_word: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub target_synset: String,
    #[serde(default)]
    pub target_word: Option<String>,
}

impl DumpSynset {
    /// Values of a lexical attribute.
    pub fn values(&self, attribute: Attribute) -> &[String] {
        match attribute {
            Attribute::Word => &self.word_pt,
            Attribute::Gloss => &self.gloss_pt,
            Attribute::Example => &self.example_pt,
        }
    }

    /// Entries of the pointer list named `name`; empty when absent.
    pub fn pointers(&self, name: &str) -> DocumentResult<Vec<DumpPointer>> {
        match self.extra.get(name) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
                DocumentError::MalformedPointers {
                    doc_id: self.doc_id.clone(),
                    pointer: name.to_string(),
                    message: e.to_string(),
                }
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// JSON lines
// ---------------------------------------------------------------------------

/// Read every document of a JSON lines file.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> DocumentResult<Vec<T>> {
    let file = File::open(path).map_err(|e| DocumentError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let origin = path.display().to_string();
    let mut documents = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| DocumentError::Io {
            path: origin.clone(),
            source: e,
        })?;
        if let Some(document) = parse_line(&line, &origin, index + 1)? {
            documents.push(document);
        }
    }
    tracing::info!(path = %origin, documents = documents.len(), "loaded documents");
    Ok(documents)
}

/// Parse JSON lines text. `origin` names the source in errors.
pub fn parse_jsonl<T: DeserializeOwned>(text: &str, origin: &str) -> DocumentResult<Vec<T>> {
    let mut documents = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if let Some(document) = parse_line(line, origin, index + 1)? {
            documents.push(document);
        }
    }
    Ok(documents)
}

fn parse_line<T: DeserializeOwned>(line: &str, origin: &str, number: usize) -> DocumentResult<Option<T>> {
    if line.trim().is_empty() {
        return Ok(None);
    }
    let parse_error = |message: String| DocumentError::Parse {
        path: origin.to_string(),
        line: number,
        message,
    };
    let mut value: Value = serde_json::from_str(line).map_err(|e| parse_error(e.to_string()))?;
    if let Some(source) = value.get_mut("_source") {
        value = source.take();
    }
    serde_json::from_value(value)
        .map(Some)
        .map_err(|e| parse_error(e.to_string()))
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(de::Error::custom(format!(
            "expected a string or number, got {other}"
        ))),
    }
}
