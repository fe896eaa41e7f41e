//! `AppConfig` loader: reads environment variables once at process start,
//! validates eagerly, and is handed out read-only from then on (§4.10).

use std::collections::HashSet;
use std::time::Duration;

use llm_stream::LlmKind;
use thiserror::Error;

/// Config-load failures: each is a distinct, named error naming the
/// offending variable, raised before the HTTP listener binds.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("invalid number in {var}: {reason}")]
    InvalidNumber { var: &'static str, reason: &'static str },

    #[error("invalid value in {var}: {reason}")]
    InvalidFormat { var: &'static str, reason: &'static str },

    #[error("unsupported LLM_KIND: {0}")]
    UnsupportedLlmKind(String),
}

type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_keys: HashSet<String>,
    pub webhooks_enabled: bool,
    pub idempotency_ttl: Duration,
    pub status_ttl: Duration,
    pub workers_per_mode: usize,
    pub confidence_threshold: f32,
    pub max_issues_per_file: usize,
    pub job_deadline: Duration,

    pub llm_kind: LlmKind,
    pub llm_endpoint: String,
    pub llm_model: String,
    pub llm_api_key: Option<String>,

    pub github_api_base: String,
    pub github_token: String,
    pub gitlab_api_base: String,
    pub gitlab_token: String,

    pub bind_addr: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_keys: env_csv_set("REVIEW_GATEWAY_API_KEYS"),
            webhooks_enabled: env_bool("REVIEW_GATEWAY_WEBHOOKS_ENABLED", true)?,
            idempotency_ttl: Duration::from_secs(env_u64("REVIEW_GATEWAY_IDEMPOTENCY_TTL_SECS", 86_400)?),
            status_ttl: Duration::from_secs(env_u64("REVIEW_GATEWAY_STATUS_TTL_SECS", 3_600)?),
            workers_per_mode: env_u64("REVIEW_GATEWAY_WORKERS_PER_MODE", 4)? as usize,
            confidence_threshold: env_f32("REVIEW_GATEWAY_CONFIDENCE_THRESHOLD", 0.5)?,
            max_issues_per_file: env_u64("REVIEW_GATEWAY_MAX_ISSUES_PER_FILE", 10)? as usize,
            job_deadline: Duration::from_secs(env_u64("REVIEW_GATEWAY_JOB_DEADLINE_SECS", 300)?),

            llm_kind: env_llm_kind("LLM_KIND")?,
            llm_endpoint: must_env("LLM_ENDPOINT")?,
            llm_model: must_env("LLM_MODEL")?,
            llm_api_key: env_opt("LLM_API_KEY"),

            github_api_base: env_or("GITHUB_API_BASE", "https://api.github.com"),
            github_token: env_or("GITHUB_TOKEN", ""),
            gitlab_api_base: env_or("GITLAB_API_BASE", "https://gitlab.com/api/v4"),
            gitlab_token: env_or("GITLAB_TOKEN", ""),

            bind_addr: env_or("BIND_ADDR", "0.0.0.0:8080"),
        })
    }

    pub fn is_known_api_key(&self, candidate: &str) -> bool {
        !candidate.trim().is_empty() && self.api_keys.contains(candidate)
    }

    pub fn scm_config(&self) -> scm::ScmConfig {
        scm::ScmConfig {
            github_api_base: self.github_api_base.clone(),
            github_token: self.github_token.clone(),
            gitlab_api_base: self.gitlab_api_base.clone(),
            gitlab_token: self.gitlab_token.clone(),
        }
    }

    pub fn llm_config(&self) -> llm_stream::LlmConfig {
        llm_stream::LlmConfig {
            kind: self.llm_kind,
            endpoint: self.llm_endpoint.clone(),
            model: self.llm_model.clone(),
            api_key: self.llm_api_key.clone(),
            temperature: 0.2,
            top_p: 0.9,
            max_tokens: None,
        }
    }

    pub fn accumulator_config(&self) -> review_accumulator::AccumulatorConfig {
        review_accumulator::AccumulatorConfig { confidence_threshold: self.confidence_threshold, max_issues_per_file: self.max_issues_per_file }
    }
}

fn must_env(name: &'static str) -> Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingVar(name)),
    }
}

fn env_opt(name: &'static str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(name: &'static str, default: &str) -> String {
    env_opt(name).unwrap_or_else(|| default.to_string())
}

fn env_csv_set(name: &'static str) -> HashSet<String> {
    env_opt(name).map(|v| v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()).unwrap_or_default()
}

fn env_bool(name: &'static str, default: bool) -> Result<bool> {
    match env_opt(name) {
        None => Ok(default),
        Some(v) => match v.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::InvalidFormat { var: name, reason: "expected a boolean" }),
        },
    }
}

fn env_u64(name: &'static str, default: u64) -> Result<u64> {
    match env_opt(name) {
        None => Ok(default),
        Some(v) => v.parse::<u64>().map_err(|_| ConfigError::InvalidNumber { var: name, reason: "expected a non-negative integer" }),
    }
}

fn env_f32(name: &'static str, default: f32) -> Result<f32> {
    match env_opt(name) {
        None => Ok(default),
        Some(v) => {
            let parsed = v.parse::<f32>().map_err(|_| ConfigError::InvalidNumber { var: name, reason: "expected a floating-point number" })?;
            if !(0.0..=1.0).contains(&parsed) {
                return Err(ConfigError::InvalidFormat { var: name, reason: "expected a value in 0.0..=1.0" });
            }
            Ok(parsed)
        }
    }
}

fn env_llm_kind(name: &'static str) -> Result<LlmKind> {
    let raw = must_env(name)?;
    LlmKind::parse(&raw).ok_or(ConfigError::UnsupportedLlmKind(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_confidence_threshold_is_rejected() {
        unsafe { std::env::set_var("TEST_CONFIDENCE_OOR", "1.5") };
        assert!(env_f32("TEST_CONFIDENCE_OOR", 0.5).is_err());
        unsafe { std::env::remove_var("TEST_CONFIDENCE_OOR") };
    }

    #[test]
    fn unset_var_falls_back_to_default() {
        assert_eq!(env_f32("UNSET_VAR_FOR_TEST_XYZ", 0.5).unwrap(), 0.5);
    }

    #[test]
    fn csv_set_trims_and_drops_empties() {
        unsafe { std::env::set_var("TEST_API_KEYS_CSV", "a, b ,,c") };
        let set = env_csv_set("TEST_API_KEYS_CSV");
        assert_eq!(set, HashSet::from(["a".to_string(), "b".to_string(), "c".to_string()]));
        unsafe { std::env::remove_var("TEST_API_KEYS_CSV") };
    }
}
