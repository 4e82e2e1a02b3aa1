use crate::ai::agents::FormAgents;
use crate::ai::client::CompletionClient;
use crate::config::BuildPolicy;
use crate::core::checks;
use crate::core::form::{AdjustmentRequest, FormSchema, UserRequest, ValidationVerdict};
use crate::error::{FormError, Result};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum FormCreationOutcome {
    Rejected { verdict: ValidationVerdict },
    Success { verdict: ValidationVerdict, schema: FormSchema },
}

pub struct Orchestrator<C> {
    agents: FormAgents<C>,
    policy: BuildPolicy,
}

impl<C: CompletionClient> Orchestrator<C> {
    pub fn new(client: C, policy: BuildPolicy) -> Self {
        Self { agents: FormAgents::new(client), policy }
    }

    pub async fn create_form(&self, request: &UserRequest) -> Result<FormCreationOutcome> {
        log::info!("🔎 Phase 1: Validation");
        let raw = self.agents.validate(request).await?;

        let built = match self.policy {
            BuildPolicy::Eager => {
                // Builds from the raw blueprint before the verdict is known.
                let blueprint = raw.get("blueprint").cloned().unwrap_or(Value::Null);
                Some(self.build(&blueprint, &request.lang).await?)
            }
            BuildPolicy::OnlyIfValid => None,
        };

        let verdict = read_verdict(raw)?;
        if !verdict.valid {
            log::info!("   -> Rejected: {}", verdict.reason);
            if built.is_some() {
                log::debug!("   -> Discarding schema built for a rejected prompt");
            }
            return Ok(FormCreationOutcome::Rejected { verdict });
        }

        let draft = verdict.draft();
        match &draft {
            Some(blueprint) => {
                log::info!("   -> Accepted: '{}' with {} field(s)", blueprint.title, blueprint.fields.len());
                for finding in checks::check_blueprint(blueprint) {
                    log::warn!("   ⚠️  Blueprint: {finding}");
                }
            }
            None => log::warn!("   ⚠️  Blueprint does not follow the expected structure"),
        }

        let schema = match built {
            Some(schema) => schema,
            None => self.build(&verdict.blueprint, &request.lang).await?,
        };

        if let Some(blueprint) = &draft {
            for finding in checks::check_schema_against_blueprint(&schema, blueprint) {
                log::warn!("   ⚠️  Schema: {finding}");
            }
        }

        Ok(FormCreationOutcome::Success { verdict, schema })
    }

    pub async fn adjust_form(&self, request: &AdjustmentRequest) -> Result<FormSchema> {
        log::info!("✏️  Phase 3: Adjustment");
        let adjusted = self.agents.adjust(request).await?;

        let changed = checks::changed_component_keys(&request.existing_schema, &adjusted);
        log::info!("   -> {} component(s) changed", changed.len());
        log::debug!("   -> Changed keys: {changed:?}");
        Ok(adjusted)
    }

    async fn build(&self, blueprint: &Value, lang: &str) -> Result<FormSchema> {
        log::info!("🏗️  Phase 2: Building");
        let schema = self.agents.build(blueprint, lang).await?;
        log::info!("   -> Generated {} component(s)", schema.components().len());
        Ok(schema)
    }
}

/// The validator's document must be an object carrying a boolean `valid`.
fn read_verdict(raw: Value) -> Result<ValidationVerdict> {
    match raw.get("valid") {
        Some(Value::Bool(_)) => {}
        Some(other) => {
            return Err(FormError::MalformedOutput(format!("'valid' is not a boolean: {other}")));
        }
        None if raw.is_object() => {
            return Err(FormError::MalformedOutput("missing 'valid' field".into()));
        }
        None => return Err(FormError::MalformedOutput("expected a JSON object".into())),
    }
    serde_json::from_value(raw).map_err(|e| FormError::MalformedOutput(e.to_string()))
}
