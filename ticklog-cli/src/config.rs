use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use ticklog_core::filter::{DEFAULT_EXCLUDED_ISSUE_TYPES, DEFAULT_EXCLUDED_STATUSES};
use ticklog_core::{CandidateFilter, PreliminaryRanker, Thresholds, DEFAULT_TOP_N};
use ticklog_match::cascade::{DEFAULT_FALLBACK_MODELS, DEFAULT_PRIMARY_MODEL};
use ticklog_match::OracleConfig;

use crate::state::ensure_ticklog_home;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gemini: GeminiSection,
    pub jira: JiraSection,
    pub matching: MatchingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiSection {
    /// `GEMINI_API_KEY` wins when set.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub fallback_models: Vec<String>,
    pub temperature: f32,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub batch_timeout_secs: u64,
    pub single_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JiraSection {
    /// e.g. https://example.atlassian.net
    pub base_url: String,
    pub email: String,
    /// `JIRA_API_TOKEN` wins when set.
    pub api_token: Option<String>,
    pub jql: String,
    pub page_size: usize,
    pub max_pages: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingSection {
    pub use_ai: bool,
    pub minimum: f64,
    pub choice: f64,
    pub high_confidence: f64,
    pub top_n: usize,
    pub excluded_issue_types: Vec<String>,
    pub excluded_statuses: Vec<String>,
}

impl Default for GeminiSection {
    fn default() -> Self {
        let oracle = OracleConfig::default();
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: DEFAULT_PRIMARY_MODEL.to_string(),
            fallback_models: DEFAULT_FALLBACK_MODELS.iter().map(|m| m.to_string()).collect(),
            temperature: 0.2,
            max_retries: oracle.max_retries,
            base_delay_ms: oracle.base_delay.as_millis() as u64,
            max_delay_ms: oracle.max_delay.as_millis() as u64,
            batch_timeout_secs: oracle.batch_timeout.as_secs(),
            single_timeout_secs: oracle.single_timeout.as_secs(),
        }
    }
}

impl Default for JiraSection {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            email: String::new(),
            api_token: None,
            jql: "assignee = currentUser() AND statusCategory != Done ORDER BY updated DESC".to_string(),
            page_size: 100,
            max_pages: 5,
        }
    }
}

impl Default for MatchingSection {
    fn default() -> Self {
        let t = Thresholds::default();
        Self {
            use_ai: true,
            minimum: t.minimum,
            choice: t.choice,
            high_confidence: t.high_confidence,
            top_n: DEFAULT_TOP_N,
            excluded_issue_types: DEFAULT_EXCLUDED_ISSUE_TYPES.iter().map(|s| s.to_string()).collect(),
            excluded_statuses: DEFAULT_EXCLUDED_STATUSES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl GeminiSection {
    pub fn resolved_api_key(&self) -> Option<String> {
        env_secret("GEMINI_API_KEY").or_else(|| self.api_key.clone().filter(|k| !k.trim().is_empty()))
    }

    pub fn oracle_config(&self) -> OracleConfig {
        OracleConfig {
            primary_model: self.model.clone(),
            fallback_models: self.fallback_models.clone(),
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            batch_timeout: Duration::from_secs(self.batch_timeout_secs),
            single_timeout: Duration::from_secs(self.single_timeout_secs),
        }
    }
}

impl JiraSection {
    pub fn resolved_api_token(&self) -> Option<String> {
        env_secret("JIRA_API_TOKEN").or_else(|| self.api_token.clone().filter(|t| !t.trim().is_empty()))
    }
}

impl MatchingSection {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            minimum: self.minimum,
            choice: self.choice,
            high_confidence: self.high_confidence,
        }
    }

    pub fn ranker(&self) -> PreliminaryRanker {
        PreliminaryRanker::new(
            CandidateFilter::new(&self.excluded_issue_types, &self.excluded_statuses),
            self.top_n,
        )
    }
}

fn env_secret(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_ticklog_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).context("parse config.toml")
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

fn mask(secret: &Option<String>) -> Option<String> {
    secret.as_ref().map(|s| {
        let tail: String = s.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
        format!("****{tail}")
    })
}

/// The config as TOML, with secrets masked.
pub fn render_masked(cfg: &Config) -> Result<String> {
    let mut shown = cfg.clone();
    shown.gemini.api_key = mask(&cfg.gemini.api_key);
    shown.jira.api_token = mask(&cfg.jira.api_token);
    toml::to_string_pretty(&shown).context("serialize config")
}
