//! Intent tools offered to the primary model.
//!
//! Each tool is a side-effect-free intent capture: the model picks one by
//! name and fills in its arguments, and the pipeline hands the pair to the
//! caller. Persisting the intent (the expense row, the task, ...) belongs to
//! the downstream gateway.
//!
//! The set is closed. [`Intent`] enumerates it and [`Intent::from_tool`] is
//! the only mapping from a model-chosen name to an intent.

mod intents;

pub use intents::DESCRIPTORS;

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value, json};
use thiserror::Error;

/// Errors from capturing an intent.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntentError {
    /// The model named a tool that is not registered.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// A required argument was not supplied.
    #[error("{tool} is missing required argument '{argument}'")]
    MissingArgument {
        /// Tool name.
        tool: String,
        /// Argument name.
        argument: String,
    },
}

/// The intents a model can choose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Save a social media draft.
    SaveDraft,
    /// Record an expense.
    RecordExpense,
    /// Create a task.
    CreateTask,
    /// Track a job application.
    TrackJob,
}

impl Intent {
    /// Map a tool name to its intent.
    #[must_use]
    pub fn from_tool(name: &str) -> Option<Self> {
        match name {
            "create_social_draft" => Some(Self::SaveDraft),
            "record_expense" => Some(Self::RecordExpense),
            "create_task" => Some(Self::CreateTask),
            "track_job_application" => Some(Self::TrackJob),
            _ => None,
        }
    }

    /// The descriptor registered for this intent.
    #[must_use]
    pub fn descriptor(self) -> &'static ToolDescriptor {
        let index = match self {
            Self::SaveDraft => 0,
            Self::RecordExpense => 1,
            Self::CreateTask => 2,
            Self::TrackJob => 3,
        };
        &DESCRIPTORS[index]
    }
}

/// JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Number,
}

impl ParamType {
    fn json_name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
        }
    }
}

/// One parameter of a tool.
#[derive(Debug, Clone, Copy)]
pub struct ToolParam {
    pub name: &'static str,
    pub kind: ParamType,
    pub description: &'static str,
    /// Value used when the model omits the argument. `None` means required.
    pub default: Option<&'static str>,
}

/// A named tool with its parameter schema.
#[derive(Debug, Clone, Copy)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub intent: Intent,
    pub params: &'static [ToolParam],
}

impl ToolDescriptor {
    /// Parameter schema in JSON Schema form.
    #[must_use]
    pub fn schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .params
            .iter()
            .map(|p| {
                let mut prop = json!({
                    "type": p.kind.json_name(),
                    "description": p.description,
                });
                if let Some(default) = p.default {
                    prop["default"] = Value::String(default.to_string());
                }
                (p.name.to_string(), prop)
            })
            .collect();
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.default.is_none())
            .map(|p| p.name)
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Build the intent record for the given arguments.
    ///
    /// Supplied arguments are kept verbatim, including ones the schema does
    /// not name; omitted optional ones take their default.
    pub fn capture(&self, arguments: &Map<String, Value>) -> Result<IntentRecord, IntentError> {
        let mut fields = arguments.clone();
        for p in self.params {
            if fields.contains_key(p.name) {
                continue;
            }
            match p.default {
                Some(default) => {
                    fields.insert(p.name.to_string(), Value::String(default.to_string()));
                }
                None => {
                    return Err(IntentError::MissingArgument {
                        tool: self.name.to_string(),
                        argument: p.name.to_string(),
                    });
                }
            }
        }
        Ok(IntentRecord {
            intent: self.intent,
            fields,
        })
    }
}

/// A captured intent: its tag plus the supplied and defaulted arguments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntentRecord {
    pub intent: Intent,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Read-only registry of the intent tools, shared across requests.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: Arc<[&'static ToolDescriptor]>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ToolRegistry {
    /// The four built-in intent tools.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            tools: DESCRIPTORS.iter().collect(),
        }
    }

    /// Registered descriptors, in registration order.
    pub fn tools(&self) -> impl Iterator<Item = &'static ToolDescriptor> + '_ {
        self.tools.iter().copied()
    }

    /// Look up a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'static ToolDescriptor> {
        let intent = Intent::from_tool(name)?;
        self.tools().find(|t| t.intent == intent)
    }

    /// Tools in OpenAI function schema format.
    #[must_use]
    pub fn openai_tools_json(&self) -> Vec<Value> {
        self.tools()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.schema(),
                    }
                })
            })
            .collect()
    }

    /// Capture the intent behind a model's tool choice.
    pub fn capture(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<IntentRecord, IntentError> {
        self.get(name)
            .ok_or_else(|| IntentError::UnknownTool(name.to_string()))?
            .capture(arguments)
    }
}
