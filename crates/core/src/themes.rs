//! Built-in themes and their embedded rule sets.

use crate::rules::RuleSet;
use once_cell::sync::Lazy;
use tracing::warn;

const FINANCIAL_TOML: &str = include_str!("themes/financial.toml");
const HEALTHCARE_TOML: &str = include_str!("themes/healthcare.toml");
const LEGAL_TOML: &str = include_str!("themes/legal.toml");

/// Closed set of built-in primary themes. Custom themes register
/// through the dispatcher instead of extending this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Theme {
    Financial,
    Healthcare,
    Legal,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::Financial, Theme::Healthcare, Theme::Legal];

    pub fn name(self) -> &'static str {
        match self {
            Theme::Financial => "Financial",
            Theme::Healthcare => "Healthcare",
            Theme::Legal => "Legal",
        }
    }

    pub fn from_name(name: &str) -> Option<Theme> {
        Theme::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }

    /// The embedded rule set, parsed once. A parse failure in the
    /// embedded data is logged and surfaces as an unavailable theme.
    pub fn rule_set(self) -> Option<&'static RuleSet> {
        match self {
            Theme::Financial => FINANCIAL_SET.as_ref(),
            Theme::Healthcare => HEALTHCARE_SET.as_ref(),
            Theme::Legal => LEGAL_SET.as_ref(),
        }
    }
}

static FINANCIAL_SET: Lazy<Option<RuleSet>> = Lazy::new(|| load_embedded("financial", FINANCIAL_TOML));
static HEALTHCARE_SET: Lazy<Option<RuleSet>> =
    Lazy::new(|| load_embedded("healthcare", HEALTHCARE_TOML));
static LEGAL_SET: Lazy<Option<RuleSet>> = Lazy::new(|| load_embedded("legal", LEGAL_TOML));

fn load_embedded(which: &str, raw: &str) -> Option<RuleSet> {
    match RuleSet::from_toml_str(raw) {
        Ok(set) => Some(set),
        Err(err) => {
            warn!(theme = which, %err, "embedded rule set failed to load");
            None
        }
    }
}
