use serde::Serialize;
use std::collections::BTreeMap;

/// Which cascade tier produced a rule's final confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Primary,
    Secondary,
    CombinedPrimarySecondary,
    CombinedSecondaryTertiary,
    Tertiary,
    #[default]
    #[serde(rename = "")]
    None,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Primary => "primary",
            Tier::Secondary => "secondary",
            Tier::CombinedPrimarySecondary => "combined_primary_secondary",
            Tier::CombinedSecondaryTertiary => "combined_secondary_tertiary",
            Tier::Tertiary => "tertiary",
            Tier::None => "",
        }
    }
}

/// Overall strength class of a classification, derived from the
/// highest surviving confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Primary,
    Secondary,
    Tertiary,
}

impl Method {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.85 {
            Method::Primary
        } else if confidence >= 0.60 {
            Method::Secondary
        } else {
            Method::Tertiary
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Primary => "primary",
            Method::Secondary => "secondary",
            Method::Tertiary => "tertiary",
        }
    }
}

/// Per-rule diagnostic record: which signals fired and at what strength.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchDetail {
    pub confidence: f64,
    pub tier: Tier,
    pub primary_matches: Vec<String>,
    pub structure_matches: Vec<String>,
    pub filename_matches: Vec<String>,
    pub keyword_matches: Vec<String>,
    pub primary_score: f64,
    pub secondary_score: f64,
    pub tertiary_score: f64,
}

/// Immutable classification output, created fresh per `classify()` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubthemeResult {
    pub primary_theme: String,
    pub subthemes: Vec<String>,
    pub primary_subtheme: Option<String>,
    pub subclassifications: Vec<String>,
    pub primary_subclassification: Option<String>,
    pub subclassification_confidence: Option<f64>,
    pub confidence_scores: BTreeMap<String, f64>,
    pub category_mapping: BTreeMap<String, String>,
    pub matched_patterns: BTreeMap<String, MatchDetail>,
    pub subclassification_method: Option<Method>,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl SubthemeResult {
    /// A result carrying no classification, only a `reason` diagnostic.
    pub fn empty(primary_theme: &str, reason: &str) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert("reason".to_string(), serde_json::Value::from(reason));
        SubthemeResult {
            primary_theme: primary_theme.to_string(),
            subthemes: Vec::new(),
            primary_subtheme: None,
            subclassifications: Vec::new(),
            primary_subclassification: None,
            subclassification_confidence: None,
            confidence_scores: BTreeMap::new(),
            category_mapping: BTreeMap::new(),
            matched_patterns: BTreeMap::new(),
            subclassification_method: None,
            metadata,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        self.metadata.get("reason").and_then(|v| v.as_str())
    }
}
