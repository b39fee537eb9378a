use crate::compiler::{self, CompiledRuleSet};
use crate::models::{MatchDetail, Method, SubthemeResult};
use crate::pool::{TaskOutcome, WorkerPool};
use crate::rules::RuleSet;
use crate::scorer;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Rules below this confidence are not published.
pub const PUBLISH_THRESHOLD: f64 = 0.40;
const MIN_TEXT_LEN: usize = 10;

/// Owns one theme's compiled rules and fans the cascade scorer out
/// across them. Compiled data is read-only, so one instance may serve
/// concurrent `classify` calls.
pub struct ThemeClassifier {
    compiled: Arc<CompiledRuleSet>,
    pool: Arc<WorkerPool>,
    rule_timeout: Duration,
}

impl ThemeClassifier {
    pub fn new(rules: &RuleSet, pool: Arc<WorkerPool>, rule_timeout: Duration) -> Self {
        let compiled = Arc::new(compiler::compile(rules));
        debug!(
            theme = %compiled.theme,
            rules = compiled.rules.len(),
            "theme classifier ready"
        );
        ThemeClassifier {
            compiled,
            pool,
            rule_timeout,
        }
    }

    pub fn theme(&self) -> &str {
        &self.compiled.theme
    }

    /// Subtheme categories known to this classifier, sorted.
    pub fn subthemes(&self) -> Vec<String> {
        self.compiled.categories.keys().cloned().collect()
    }

    /// Rule names grouped under one category, in declaration order.
    pub fn rules_in_category(&self, category: &str) -> Vec<String> {
        self.compiled
            .categories
            .get(category)
            .cloned()
            .unwrap_or_default()
    }

    pub fn classify(
        &self,
        text: &str,
        metadata: Option<&HashMap<String, String>>,
    ) -> SubthemeResult {
        if text.trim().len() < MIN_TEXT_LEN {
            return SubthemeResult::empty(self.theme(), "insufficient_text");
        }

        // Normalize once; every rule task shares the same buffers.
        let lowered: Arc<str> = text.to_lowercase().into();
        let filename: Arc<str> = metadata
            .and_then(|m| m.get("filename"))
            .map(|f| f.to_lowercase())
            .unwrap_or_default()
            .into();

        let handles: Vec<_> = (0..self.compiled.rules.len())
            .map(|idx| {
                let compiled = Arc::clone(&self.compiled);
                let text = Arc::clone(&lowered);
                let filename = Arc::clone(&filename);
                self.pool
                    .submit(move || scorer::score_rule(&compiled.rules[idx], &text, &filename))
            })
            .collect();

        // Collect in declaration order; that order is the tie-break for
        // equal confidences after the stable sort below.
        let mut scored: Vec<(usize, f64, MatchDetail)> = Vec::new();
        for (idx, handle) in handles.iter().enumerate() {
            let rule_name = self.compiled.rules[idx].name.as_str();
            match handle.join_within(self.rule_timeout) {
                TaskOutcome::Done((confidence, detail)) => {
                    if confidence > 0.0 {
                        scored.push((idx, confidence, detail));
                    }
                }
                TaskOutcome::TimedOut => {
                    warn!(theme = %self.theme(), rule = rule_name, "rule evaluation timed out")
                }
                TaskOutcome::Failed => {
                    warn!(theme = %self.theme(), rule = rule_name, "rule evaluation failed")
                }
            }
        }

        if scored.is_empty() {
            return SubthemeResult::empty(self.theme(), "no_matches");
        }

        let total_matches = scored.len();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.retain(|(_, confidence, _)| *confidence >= PUBLISH_THRESHOLD);
        if scored.is_empty() {
            return SubthemeResult::empty(self.theme(), "below_threshold");
        }

        self.build_result(scored, total_matches)
    }

    fn build_result(
        &self,
        surviving: Vec<(usize, f64, MatchDetail)>,
        total_matches: usize,
    ) -> SubthemeResult {
        let mut subclassifications = Vec::with_capacity(surviving.len());
        let mut subthemes = Vec::new();
        let mut confidence_scores = BTreeMap::new();
        let mut category_mapping = BTreeMap::new();
        let mut matched_patterns = BTreeMap::new();

        for (idx, confidence, detail) in &surviving {
            let rule = &self.compiled.rules[*idx];
            subclassifications.push(rule.display_name.clone());
            if !subthemes.contains(&rule.subtheme_category) {
                subthemes.push(rule.subtheme_category.clone());
            }
            confidence_scores.insert(rule.display_name.clone(), *confidence);
            category_mapping.insert(rule.display_name.clone(), rule.subtheme_category.clone());
            matched_patterns.insert(rule.display_name.clone(), detail.clone());
        }
        subthemes.sort();

        let (top_idx, top_confidence, _) = &surviving[0];
        let top_rule = &self.compiled.rules[*top_idx];

        let mut metadata = BTreeMap::new();
        metadata.insert(
            "total_matches".to_string(),
            serde_json::Value::from(total_matches),
        );
        metadata.insert(
            "filtered_matches".to_string(),
            serde_json::Value::from(surviving.len()),
        );
        metadata.insert(
            "highest_confidence".to_string(),
            serde_json::Value::from(*top_confidence),
        );

        SubthemeResult {
            primary_theme: self.theme().to_string(),
            subthemes,
            primary_subtheme: Some(top_rule.subtheme_category.clone()),
            primary_subclassification: Some(top_rule.display_name.clone()),
            subclassification_confidence: Some(*top_confidence),
            subclassifications,
            confidence_scores,
            category_mapping,
            matched_patterns,
            subclassification_method: Some(Method::from_confidence(*top_confidence)),
            metadata,
        }
    }
}
