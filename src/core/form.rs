use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::config::DEFAULT_LANG;

/// A free-text description of the form the user wants.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRequest {
    pub prompt: String,
    pub lang: String,
}

impl UserRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), lang: DEFAULT_LANG.to_string() }
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }
}

/// Form.io component types a blueprint field may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    #[serde(alias = "text")]
    Textfield,
    Textarea,
    Email,
    #[serde(alias = "phone")]
    PhoneNumber,
    Number,
    Checkbox,
    Date,
    Select,
    Radio,
    File,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldSpec {
    #[schemars(description = "camelCase key, unique within the blueprint.")]
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
}

/// A conditional or advanced logic rule requested for the form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LogicRule {
    #[serde(rename = "type")]
    #[schemars(description = "Either 'conditional' or 'logic'.")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Key of the field this rule shows or hides.")]
    pub show: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Key of the field whose value triggers the rule.")]
    pub when: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub eq: Option<Value>,
    #[serde(flatten)]
    #[schemars(skip)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Blueprint {
    #[schemars(description = "Short form title.")]
    pub title: String,
    #[serde(default)]
    #[schemars(description = "Short purpose of the form.")]
    pub description: String,
    pub fields: Vec<FieldSpec>,
    #[serde(default)]
    pub logic: Vec<LogicRule>,
}

/// The validator's judgement of a request.
///
/// `blueprint` is kept exactly as the model produced it: an object for a
/// valid prompt, usually an empty string or null otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationVerdict {
    pub valid: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    #[schemars(with = "String", description = "Why the prompt was accepted or rejected.")]
    pub reason: String,
    #[serde(default)]
    #[schemars(
        with = "Option<Blueprint>",
        description = "Blueprint for the builder. Leave empty when valid is false."
    )]
    pub blueprint: Value,
}

impl ValidationVerdict {
    /// Typed view of the blueprint, if the model produced a well-formed one.
    pub fn draft(&self) -> Option<Blueprint> {
        if is_empty_blueprint(&self.blueprint) {
            return None;
        }
        match serde_json::from_value(self.blueprint.clone()) {
            Ok(blueprint) => Some(blueprint),
            Err(e) => {
                log::debug!("Blueprint does not match the expected shape: {e}");
                None
            }
        }
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn is_empty_blueprint(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// A Form.io form definition. Opaque apart from the `components` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormSchema(pub Value);

impl FormSchema {
    pub fn components(&self) -> &[Value] {
        self.0
            .get("components")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn component_keys(&self) -> Vec<&str> {
        self.components()
            .iter()
            .filter_map(|c| c.get("key").and_then(Value::as_str))
            .collect()
    }

    pub fn to_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| self.0.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdjustmentRequest {
    pub existing_schema: FormSchema,
    pub instruction: String,
}
