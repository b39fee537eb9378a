use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_workers() -> usize {
    4
}

fn default_rule_timeout_ms() -> u64 {
    1000
}

/// Tunables for the scoring fan-out. Rule thresholds themselves are
/// part of the cascade and stay fixed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_rule_timeout_ms")]
    pub rule_timeout_ms: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            workers: default_workers(),
            rule_timeout_ms: default_rule_timeout_ms(),
        }
    }
}

impl ClassifierConfig {
    pub fn rule_timeout(&self) -> Duration {
        Duration::from_millis(self.rule_timeout_ms)
    }
}

pub fn load(path: Option<&str>) -> anyhow::Result<ClassifierConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}
