use crate::classifier::ThemeClassifier;
use crate::config::ClassifierConfig;
use crate::models::SubthemeResult;
use crate::pool::WorkerPool;
use crate::rules::RuleSet;
use crate::themes::Theme;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Top-level entry point. Maps a primary-theme name to its classifier,
/// building built-in classifiers lazily on first use and reusing them
/// afterward so pattern compilation is paid once.
pub struct Dispatcher {
    pool: Arc<WorkerPool>,
    rule_timeout: Duration,
    builtin: Mutex<HashMap<Theme, Arc<ThemeClassifier>>>,
    custom: Mutex<HashMap<String, Arc<ThemeClassifier>>>,
}

impl Dispatcher {
    pub fn new(config: ClassifierConfig) -> Self {
        Dispatcher {
            pool: Arc::new(WorkerPool::new(config.workers)),
            rule_timeout: config.rule_timeout(),
            builtin: Mutex::new(HashMap::new()),
            custom: Mutex::new(HashMap::new()),
        }
    }

    /// Register a user-authored theme alongside the built-ins. The
    /// classifier is compiled immediately; registration implies use.
    pub fn with_rule_set(self, rules: RuleSet) -> Self {
        let classifier = Arc::new(ThemeClassifier::new(
            &rules,
            Arc::clone(&self.pool),
            self.rule_timeout,
        ));
        self.custom
            .lock()
            .insert(rules.theme.to_lowercase(), classifier);
        self
    }

    pub fn classify(
        &self,
        text: &str,
        primary_theme: &str,
        metadata: Option<&HashMap<String, String>>,
    ) -> SubthemeResult {
        match self.classifier_for(primary_theme) {
            Some(classifier) => classifier.classify(text, metadata),
            None => SubthemeResult::empty(primary_theme, "no_classifier_available"),
        }
    }

    /// Theme names with a usable classifier: built-ins first, then any
    /// registered custom themes.
    pub fn supported_themes(&self) -> Vec<String> {
        let mut themes: Vec<String> = Theme::ALL
            .into_iter()
            .filter(|t| t.rule_set().is_some())
            .map(|t| t.name().to_string())
            .collect();
        let mut custom: Vec<String> = self
            .custom
            .lock()
            .values()
            .map(|c| c.theme().to_string())
            .collect();
        custom.sort();
        themes.extend(custom);
        themes
    }

    /// Subtheme categories for a theme; empty for unknown themes.
    pub fn subthemes_for_theme(&self, theme: &str) -> Vec<String> {
        self.classifier_for(theme)
            .map(|c| c.subthemes())
            .unwrap_or_default()
    }

    fn classifier_for(&self, name: &str) -> Option<Arc<ThemeClassifier>> {
        if let Some(theme) = Theme::from_name(name) {
            let mut builtin = self.builtin.lock();
            if let Some(existing) = builtin.get(&theme) {
                return Some(Arc::clone(existing));
            }
            let rules = theme.rule_set()?;
            debug!(theme = theme.name(), "building theme classifier");
            let classifier = Arc::new(ThemeClassifier::new(
                rules,
                Arc::clone(&self.pool),
                self.rule_timeout,
            ));
            builtin.insert(theme, Arc::clone(&classifier));
            return Some(classifier);
        }
        self.custom.lock().get(&name.to_lowercase()).cloned()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Dispatcher::new(ClassifierConfig::default())
    }
}
