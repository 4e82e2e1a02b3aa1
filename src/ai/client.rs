use super::streaming::{SseDecoder, SseEvent};
use crate::config::Config;
use crate::error::{FormError, Result};
use futures_util::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::future::Future;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// Something that turns an ordered list of messages into completion text.
pub trait CompletionClient: Send + Sync {
    fn complete(&self, messages: &[ChatMessage]) -> impl Future<Output = Result<String>> + Send;
}

impl<C: CompletionClient> CompletionClient for &C {
    fn complete(&self, messages: &[ChatMessage]) -> impl Future<Output = Result<String>> + Send {
        (**self).complete(messages)
    }
}

/// Receives each streamed token chunk as it arrives.
pub type PartialOutput = Box<dyn Fn(&str) + Send + Sync>;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    temperature: f32,
    stream: bool,
    partial_output: Option<PartialOutput>,
}

impl OpenAiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            api_key: SecretString::from(config.api_key.expose_secret().to_string()),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            stream: config.stream,
            partial_output: None,
        })
    }

    /// Token chunks are forwarded here while streaming is enabled.
    pub fn with_partial_output(mut self, sink: PartialOutput) -> Self {
        self.partial_output = Some(sink);
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn send(&self, messages: &[ChatMessage]) -> Result<reqwest::Response> {
        let payload = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages,
            stream: self.stream,
        };
        log::debug!(
            "POST {} (model: {}, messages: {}, stream: {})",
            self.endpoint(),
            self.model,
            messages.len(),
            self.stream
        );

        let res = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose_secret())
            .json(&payload)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            log::error!("API Error {status}: {body}");
            return Err(FormError::Api { status, body });
        }
        Ok(res)
    }

    /// A reply without choice text yields an empty string, which the stage
    /// parser then rejects like any other non-JSON answer.
    async fn complete_buffered(&self, messages: &[ChatMessage]) -> Result<String> {
        let body: ChatResponse = self.send(messages).await?.json().await?;
        Ok(body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }

    async fn complete_streaming(&self, messages: &[ChatMessage]) -> Result<String> {
        let mut body = self.send(messages).await?.bytes_stream();
        let mut decoder = SseDecoder::new();
        let mut text = String::new();

        'read: while let Some(chunk) = body.next().await {
            for event in decoder.push(&chunk?)? {
                match event {
                    SseEvent::Delta(delta) => self.emit(&delta, &mut text),
                    SseEvent::Done => break 'read,
                }
            }
        }
        for event in decoder.finish()? {
            if let SseEvent::Delta(delta) = event {
                self.emit(&delta, &mut text);
            }
        }

        if text.is_empty() {
            log::warn!("Stream ended without any text content");
        }
        Ok(text)
    }

    fn emit(&self, delta: &str, text: &mut String) {
        if let Some(sink) = &self.partial_output {
            sink(delta);
        }
        text.push_str(delta);
    }
}

impl CompletionClient for OpenAiClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        if self.stream {
            self.complete_streaming(messages).await
        } else {
            self.complete_buffered(messages).await
        }
    }
}
