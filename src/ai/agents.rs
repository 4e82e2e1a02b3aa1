use super::client::{ChatMessage, CompletionClient};
use super::prompts;
use super::schema_utils;
use crate::core::form::{AdjustmentRequest, FormSchema, UserRequest, ValidationVerdict};
use crate::error::{FormError, Result, Stage};
use schemars::schema_for;
use serde_json::Value;

/// The validator, builder and adjuster stages over one completion client.
pub struct FormAgents<C> {
    client: C,
}

impl<C: CompletionClient> FormAgents<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Asks the model whether the request is specific enough to become a form.
    ///
    /// Returns the parsed document untouched; deciding whether it is a
    /// well-formed verdict is left to the caller.
    pub async fn validate(&self, request: &UserRequest) -> Result<Value> {
        let schema_text = schema_utils::schema_text(schema_for!(ValidationVerdict))
            .map_err(|source| FormError::Encode { stage: Stage::Validator, source })?;
        let system = format!(
            "{}\nREQUIRED OUTPUT SCHEMA:\n{}",
            prompts::VALIDATOR_PROMPT,
            schema_text
        );
        let messages = [
            ChatMessage::system(system),
            ChatMessage::user(prompts::validator_user_message(&request.lang, &request.prompt)),
        ];

        let text = self.client.complete(&messages).await?;
        parse_stage_output(Stage::Validator, &text)
    }

    /// Expands a blueprint into a full Form.io schema.
    pub async fn build(&self, blueprint: &Value, lang: &str) -> Result<FormSchema> {
        let blueprint_json = serde_json::to_string_pretty(blueprint)
            .map_err(|source| FormError::Encode { stage: Stage::Builder, source })?;
        let messages = [
            ChatMessage::system(prompts::render(prompts::BUILDER_PROMPT, &[("lang", lang)])),
            ChatMessage::user(prompts::builder_user_message(&blueprint_json)),
        ];

        let text = self.client.complete(&messages).await?;
        parse_stage_output(Stage::Builder, &text).map(FormSchema)
    }

    /// Applies a natural-language change to an existing schema.
    ///
    /// The adjusted document is returned directly. A model answer shaped as
    /// `{"adjustedSchema": {...}}` is unwrapped to the same contract.
    pub async fn adjust(&self, request: &AdjustmentRequest) -> Result<FormSchema> {
        let schema_json = serde_json::to_string(&request.existing_schema)
            .map_err(|source| FormError::Encode { stage: Stage::Adjuster, source })?;
        let messages = [
            ChatMessage::system(prompts::ADJUSTER_PROMPT),
            ChatMessage::user(prompts::adjuster_user_message(&request.instruction, &schema_json)),
        ];

        let text = self.client.complete(&messages).await?;
        let document = parse_stage_output(Stage::Adjuster, &text)?;
        Ok(FormSchema(unwrap_adjusted(document)))
    }
}

/// Strict JSON parse of a stage answer. Fenced or empty text fails too.
pub fn parse_stage_output(stage: Stage, text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|source| {
        log::error!("{} ({source}). Content was: {}", stage.parse_failure(), truncate(text));
        FormError::Parse { stage, source }
    })
}

fn unwrap_adjusted(document: Value) -> Value {
    match document {
        Value::Object(mut map) if map.len() == 1 && map.contains_key("adjustedSchema") => {
            map.remove("adjustedSchema").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn truncate(text: &str) -> String {
    const LIMIT: usize = 300;
    if text.chars().count() > LIMIT {
        let head: String = text.chars().take(LIMIT).collect();
        format!("{head}... (len: {})", text.len())
    } else {
        text.to_string()
    }
}
