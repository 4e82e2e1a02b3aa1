use crate::error::{FormError, Result};
use secrecy::SecretString;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_LANG: &str = "nl";

/// Whether the builder runs before or after the verdict is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildPolicy {
    /// Build from whatever blueprint came back, then inspect the verdict.
    #[default]
    Eager,
    /// Skip the builder entirely when the prompt is rejected.
    OnlyIfValid,
}

impl FromStr for BuildPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eager" => Ok(BuildPolicy::Eager),
            "only-if-valid" | "only_if_valid" => Ok(BuildPolicy::OnlyIfValid),
            other => Err(format!("unknown build policy '{other}'")),
        }
    }
}

#[derive(Debug)]
pub struct Config {
    pub api_key: SecretString,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub stream: bool,
    pub lang: String,
    pub build_policy: BuildPolicy,
    pub output_dir: PathBuf,
    pub timeout: Duration,
}

impl Config {
    /// Reads the process environment once. Call after `dotenv()`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("OPENAI_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| FormError::Config("OPENAI_API_KEY must be set".into()))?;

        let temperature: f32 = parse_or(&lookup, "FORMGEN_TEMPERATURE", DEFAULT_TEMPERATURE)?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(FormError::Config(format!(
                "FORMGEN_TEMPERATURE must be between 0.0 and 2.0, got {temperature}"
            )));
        }

        let stream = match lookup("FORMGEN_STREAM") {
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| FormError::Config(format!("FORMGEN_STREAM: invalid boolean '{raw}'")))?,
            None => true,
        };

        let build_policy = match lookup("FORMGEN_BUILD_POLICY") {
            Some(raw) => raw
                .parse()
                .map_err(|e| FormError::Config(format!("FORMGEN_BUILD_POLICY: {e}")))?,
            None => BuildPolicy::default(),
        };

        let timeout_secs: u64 = parse_or(&lookup, "FORMGEN_TIMEOUT_SECS", 300)?;

        Ok(Self {
            api_key: SecretString::from(api_key),
            base_url: lookup("OPENAI_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: lookup("FORMGEN_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature,
            stream,
            lang: lookup("FORMGEN_LANG").unwrap_or_else(|| DEFAULT_LANG.to_string()),
            build_policy,
            output_dir: lookup("FORMGEN_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| FormError::Config(format!("{key}: invalid value '{raw}': {e}"))),
        None => Ok(default),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let config = Config::from_lookup(lookup_from(&[("OPENAI_API_KEY", "sk-test")])).unwrap();

        assert_eq!(config.api_key.expose_secret(), "sk-test");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, "gpt-4");
        assert_eq!(config.temperature, 0.3);
        assert!(config.stream);
        assert_eq!(config.lang, "nl");
        assert_eq!(config.build_policy, BuildPolicy::Eager);
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert_eq!(config.timeout, Duration::from_secs(300));
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, FormError::Config(msg) if msg.contains("OPENAI_API_KEY")));

        let err = Config::from_lookup(lookup_from(&[("OPENAI_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, FormError::Config(_)));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:8080/v1/"),
            ("FORMGEN_MODEL", "gpt-4o"),
            ("FORMGEN_TEMPERATURE", "0"),
            ("FORMGEN_STREAM", "off"),
            ("FORMGEN_LANG", "en"),
            ("FORMGEN_BUILD_POLICY", "only-if-valid"),
            ("FORMGEN_OUTPUT_DIR", "/tmp/forms"),
            ("FORMGEN_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.temperature, 0.0);
        assert!(!config.stream);
        assert_eq!(config.lang, "en");
        assert_eq!(config.build_policy, BuildPolicy::OnlyIfValid);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/forms"));
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let cases = [
            ("FORMGEN_TEMPERATURE", "hot"),
            ("FORMGEN_TEMPERATURE", "3.5"),
            ("FORMGEN_STREAM", "maybe"),
            ("FORMGEN_BUILD_POLICY", "lazy"),
            ("FORMGEN_TIMEOUT_SECS", "-1"),
        ];
        for (key, value) in cases {
            let err = Config::from_lookup(lookup_from(&[("OPENAI_API_KEY", "sk"), (key, value)]))
                .unwrap_err();
            match err {
                FormError::Config(msg) => assert!(msg.contains(key), "{msg}"),
                other => panic!("expected config error, got {other:?}"),
            }
        }
    }
}
