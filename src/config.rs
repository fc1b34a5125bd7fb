use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::prompt::PromptTemplate;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "gemma3n:e4b";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoint: String,
    pub model: String,
    pub prompt_template: Option<String>,
    pub timeout_secs: u64,
    pub stream: bool,
    pub copy_result: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            prompt_template: None,
            timeout_secs: 30,
            stream: true,
            copy_result: false,
        }
    }
}

impl Config {
    pub fn path() -> PathBuf {
        let exe = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("."));
        let dir = exe.parent().unwrap_or(Path::new("."));
        dir.join("config.json")
    }

    /// Loads `config.json` next to the executable, falling back to defaults.
    pub fn load() -> Self {
        let path = Self::path();
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "ignoring unreadable config");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path)?;
        Ok(serde_json::from_str::<Config>(&s)?)
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `LAI_*` overrides (and `OLLAMA_HOST`) from `lookup`. Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("LAI_ENDPOINT") {
            self.endpoint = v;
        } else if let Some(v) = get("OLLAMA_HOST") {
            self.endpoint = normalize_host(&v);
        }
        if let Some(v) = get("LAI_MODEL") {
            self.model = v;
        }
        if let Some(v) = get("LAI_TIMEOUT_SECS") {
            match v.trim().parse() {
                Ok(secs) => self.timeout_secs = secs,
                Err(_) => tracing::warn!(value = %v, "ignoring invalid LAI_TIMEOUT_SECS"),
            }
        }
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn template(&self) -> PromptTemplate {
        self.prompt_template
            .as_deref()
            .map(PromptTemplate::new)
            .unwrap_or_default()
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim();
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{host}")
    }
}
