use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use dialoguer::{Confirm, Input};

use crate::ai::client::CompletionClient;
use crate::core::form::{AdjustmentRequest, FormSchema, UserRequest};
use crate::error::Result;
use crate::orchestrator::{FormCreationOutcome, Orchestrator};

/// Where the shell gets its answers from.
pub trait Prompter {
    fn input(&self, message: &str) -> Result<String>;
    fn confirm(&self, message: &str, default: bool) -> Result<bool>;
}

pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn input(&self, message: &str) -> Result<String> {
        Ok(Input::<String>::new().with_prompt(message).interact_text()?)
    }

    fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        Ok(Confirm::new().with_prompt(message).default(default).interact()?)
    }
}

pub struct Shell<C, P, W> {
    orchestrator: Orchestrator<C>,
    prompter: P,
    out: W,
    lang: String,
    output_dir: PathBuf,
}

impl<C, P, W> Shell<C, P, W>
where
    C: CompletionClient,
    P: Prompter,
    W: Write,
{
    pub fn new(orchestrator: Orchestrator<C>, prompter: P, out: W, lang: String, output_dir: PathBuf) -> Self {
        Self { orchestrator, prompter, out, lang, output_dir }
    }

    /// Describe, optionally adjust, optionally save. Returns the saved path, if any.
    pub async fn run(&mut self) -> Result<Option<PathBuf>> {
        writeln!(self.out, "🛠️  FormBuilder CLI")?;

        let prompt = self.prompter.input("Describe the form you want to create:")?;
        let request = UserRequest::new(prompt).with_lang(self.lang.clone());
        let outcome = self.orchestrator.create_form(&request).await?;

        let mut schema = match outcome {
            FormCreationOutcome::Rejected { verdict } => {
                writeln!(self.out, "\nPrompt was rejected:\n{}", verdict.reason)?;
                return Ok(None);
            }
            FormCreationOutcome::Success { verdict, schema } => {
                writeln!(self.out, "\nPrompt validated!")?;
                writeln!(self.out, "Summary:")?;
                writeln!(self.out, "{}", pretty(&verdict.blueprint))?;
                writeln!(self.out, "\nGenerated Form.io schema:")?;
                writeln!(self.out, "{}", schema.to_pretty())?;
                schema
            }
        };

        if self.prompter.confirm("Would you like to make adjustments?", false)? {
            let instruction = self.prompter.input("✏️  What should be changed?")?;
            schema = self
                .orchestrator
                .adjust_form(&AdjustmentRequest { existing_schema: schema, instruction })
                .await?;
            writeln!(self.out, "\nAdjusted schema:")?;
            writeln!(self.out, "{}", schema.to_pretty())?;
        }

        if !self.prompter.confirm("Save final schema to a JSON file?", false)? {
            return Ok(None);
        }

        let path = save_schema(&schema, &self.output_dir)?;
        writeln!(self.out, "Saved to {}", path.display())?;
        Ok(Some(path))
    }
}

/// Writes `formio-schema-<unix millis>.json` into `dir`.
pub fn save_schema(schema: &FormSchema, dir: &Path) -> Result<PathBuf> {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let path = dir.join(format!("formio-schema-{millis}.json"));
    std::fs::write(&path, schema.to_pretty())?;
    log::info!("💾 Schema written to '{}'", path.display());
    Ok(path)
}

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::agents::testing::ScriptedClient;
    use crate::config::BuildPolicy;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use std::cell::RefCell;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct ScriptedPrompter {
        inputs: RefCell<VecDeque<String>>,
        confirms: RefCell<VecDeque<bool>>,
    }

    impl ScriptedPrompter {
        fn new(inputs: &[&str], confirms: &[bool]) -> Self {
            Self {
                inputs: RefCell::new(inputs.iter().map(|s| s.to_string()).collect()),
                confirms: RefCell::new(confirms.iter().copied().collect()),
            }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn input(&self, _message: &str) -> Result<String> {
            Ok(self.inputs.borrow_mut().pop_front().unwrap_or_default())
        }

        fn confirm(&self, _message: &str, default: bool) -> Result<bool> {
            Ok(self.confirms.borrow_mut().pop_front().unwrap_or(default))
        }
    }

    fn verdict() -> String {
        json!({
            "valid": true,
            "reason": "ok",
            "blueprint": {
                "title": "Contact",
                "description": "Contact us",
                "fields": [
                    { "key": "fullName", "label": "Name", "type": "textfield", "required": true },
                    { "key": "email", "label": "Email", "type": "email", "required": true }
                ]
            }
        })
        .to_string()
    }

    fn schema() -> Value {
        json!({ "components": [
            { "key": "fullName", "type": "textfield" },
            { "key": "email", "type": "email" }
        ]})
    }

    #[test]
    fn saved_file_is_timestamped_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_schema(&FormSchema(schema()), dir.path()).unwrap();

        let name = path.file_name().unwrap().to_str().unwrap();
        let millis = name
            .strip_prefix("formio-schema-")
            .and_then(|s| s.strip_suffix(".json"))
            .unwrap();
        assert!(millis.parse::<u128>().is_ok());

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains('\n'));
        assert_eq!(serde_json::from_str::<Value>(&written).unwrap(), schema());
    }

    #[tokio::test]
    async fn rejected_prompt_ends_the_run() {
        let client = ScriptedClient::new([r#"{"valid": false, "reason": "Te vaag", "blueprint": ""}"#]);
        let dir = tempfile::tempdir().unwrap();
        let mut out = Vec::new();
        let mut shell = Shell::new(
            Orchestrator::new(&client, BuildPolicy::OnlyIfValid),
            ScriptedPrompter::new(&["iets"], &[]),
            &mut out,
            "nl".into(),
            dir.path().to_path_buf(),
        );

        assert_eq!(shell.run().await.unwrap(), None);
        drop(shell);

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Prompt was rejected:\nTe vaag"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn adjusted_schema_is_what_gets_saved() {
        let mut adjusted = schema();
        adjusted["components"][1]["validate"] = json!({ "required": true });
        let client = ScriptedClient::new([verdict(), schema().to_string(), adjusted.to_string()]);
        let dir = tempfile::tempdir().unwrap();
        let mut out = Vec::new();
        let mut shell = Shell::new(
            Orchestrator::new(&client, BuildPolicy::Eager),
            ScriptedPrompter::new(&["A contact form", "Make email required"], &[true, true]),
            &mut out,
            "en".into(),
            dir.path().to_path_buf(),
        );

        let path = shell.run().await.unwrap().unwrap();
        drop(shell);

        let saved: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved, adjusted);
        assert!(client.user_message(0).starts_with("Language: en"));
        assert!(client.user_message(2).contains("Make email required"));

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Prompt validated!"));
        assert!(printed.contains("Adjusted schema:"));
        assert!(printed.contains("Saved to "));
    }

    #[tokio::test]
    async fn declining_both_steps_saves_nothing() {
        let client = ScriptedClient::new([verdict(), schema().to_string()]);
        let dir = tempfile::tempdir().unwrap();
        let mut shell = Shell::new(
            Orchestrator::new(&client, BuildPolicy::Eager),
            ScriptedPrompter::new(&["A contact form"], &[false, false]),
            std::io::sink(),
            "en".into(),
            dir.path().to_path_buf(),
        );

        assert_eq!(shell.run().await.unwrap(), None);
        assert_eq!(client.requests().len(), 2);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn pipeline_errors_reach_the_caller() {
        let client = ScriptedClient::new(["no json here"]);
        let mut shell = Shell::new(
            Orchestrator::new(&client, BuildPolicy::Eager),
            ScriptedPrompter::new(&["A contact form"], &[]),
            std::io::sink(),
            "en".into(),
            PathBuf::from("."),
        );

        let err = shell.run().await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to parse JSON from validator response");
    }
}
