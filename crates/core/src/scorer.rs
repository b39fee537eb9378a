//! Cascade scorer: pure function from one compiled rule plus lowercased
//! text/filename to a confidence and a match-detail record.
//!
//! Tiers, strongest first: primary (near-unique regexes, definitive
//! phrases, form numbers), secondary (structural boilerplate, normalized
//! weights compressed into [0.60, 0.80]), tertiary (filename substrings
//! and keyword overlap). Exclusion signals veto the rule outright.

use crate::compiler::CompiledRule;
use crate::models::{MatchDetail, Tier};
use std::collections::HashSet;

/// Keyword evidence only counts from this many distinct matches.
const KEYWORD_MATCH_FLOOR: usize = 3;
/// Tertiary contributions never exceed this.
const TERTIARY_CAP: f64 = 0.70;
const FILENAME_DAMPING: f64 = 0.7;

/// Score one rule against pre-lowercased text and filename.
pub fn score_rule(rule: &CompiledRule, text: &str, filename: &str) -> (f64, MatchDetail) {
    // Absolute veto: any exclusion hit zeroes the rule.
    if rule.exclude_patterns.iter().any(|re| re.is_match(text))
        || rule
            .exclude_phrases
            .iter()
            .any(|phrase| text.contains(phrase.as_str()))
    {
        return (0.0, MatchDetail::default());
    }

    let (primary, primary_matches) = primary_score(rule, text);
    let (secondary, structure_matches) = secondary_score(rule, text);
    let (tertiary, filename_matches, keyword_matches) = tertiary_score(rule, text, filename);

    let (confidence, tier) = combine(primary, secondary, tertiary);
    let confidence = confidence.clamp(0.0, 1.0);

    let detail = MatchDetail {
        confidence,
        tier,
        primary_matches,
        structure_matches,
        filename_matches,
        keyword_matches,
        primary_score: primary,
        secondary_score: secondary,
        tertiary_score: tertiary,
    };
    (confidence, detail)
}

fn primary_score(rule: &CompiledRule, text: &str) -> (f64, Vec<String>) {
    let mut best: f64 = 0.0;
    let mut hits = Vec::new();
    for p in &rule.unique_patterns {
        if p.regex.is_match(text) {
            hits.push(format!("pattern:{}", p.label));
            best = best.max(p.confidence);
        }
    }
    for (phrase, confidence) in &rule.definitive_phrases {
        if text.contains(phrase.as_str()) {
            hits.push(format!("phrase:{phrase}"));
            best = best.max(*confidence);
        }
    }
    for (code, confidence) in &rule.form_numbers {
        if text.contains(code.as_str()) {
            hits.push(format!("form:{code}"));
            best = best.max(*confidence);
        }
    }
    (best, hits)
}

fn secondary_score(rule: &CompiledRule, text: &str) -> (f64, Vec<String>) {
    if rule.structure_weight_total <= 0.0 {
        return (0.0, Vec::new());
    }
    let mut matched_weight = 0.0;
    let mut hits = Vec::new();
    for s in &rule.structure_patterns {
        if s.regex.is_match(text) {
            matched_weight += s.weight;
            hits.push(s.regex.as_str().to_string());
        }
    }
    if hits.is_empty() {
        return (0.0, hits);
    }
    // Normalize against the rule's full structure weight, then compress
    // into [0.60, 0.80] so any structural evidence clears the secondary
    // tier floor.
    let raw_score = matched_weight / rule.structure_weight_total;
    (0.60 + raw_score * 0.20, hits)
}

fn tertiary_score(rule: &CompiledRule, text: &str, filename: &str) -> (f64, Vec<String>, Vec<String>) {
    let mut filename_confidence: f64 = 0.0;
    let mut filename_hits = Vec::new();
    if !filename.is_empty() {
        for (fragment, confidence) in &rule.filename_patterns {
            if filename.contains(fragment.as_str()) {
                filename_hits.push(fragment.clone());
                filename_confidence =
                    filename_confidence.max((confidence * FILENAME_DAMPING).min(TERTIARY_CAP));
            }
        }
    }

    let mut keyword_hits: Vec<String> = words(text)
        .into_iter()
        .filter(|w| rule.keywords.contains(*w))
        .map(str::to_string)
        .collect();
    keyword_hits.sort();

    let keyword_confidence = if keyword_hits.len() >= KEYWORD_MATCH_FLOOR && !rule.keywords.is_empty()
    {
        let ratio = keyword_hits.len() as f64 / rule.keywords.len() as f64;
        (keyword_bucket(keyword_hits.len()) * (1.0 + ratio * 0.2)).min(TERTIARY_CAP)
    } else {
        0.0
    };

    (
        filename_confidence.max(keyword_confidence),
        filename_hits,
        keyword_hits,
    )
}

fn keyword_bucket(matches: usize) -> f64 {
    match matches {
        n if n >= 10 => 0.70,
        n if n >= 7 => 0.60,
        n if n >= 5 => 0.50,
        n if n >= KEYWORD_MATCH_FLOOR => 0.45,
        _ => 0.40,
    }
}

/// All alphabetic tokens of length >= 3.
fn words(text: &str) -> HashSet<&str> {
    text.split(|c: char| !c.is_alphabetic())
        .filter(|w| w.len() >= 3)
        .collect()
}

/// Tier combination; first matching branch wins.
pub(crate) fn combine(primary: f64, secondary: f64, tertiary: f64) -> (f64, Tier) {
    if primary >= 0.85 {
        (primary, Tier::Primary)
    } else if secondary >= 0.60 {
        (secondary, Tier::Secondary)
    } else if primary > 0.0 && secondary > 0.0 {
        ((primary * 0.7 + secondary * 0.3).min(0.95), Tier::CombinedPrimarySecondary)
    } else if primary > 0.0 {
        (primary, Tier::Primary)
    } else if secondary > 0.0 && tertiary > 0.0 {
        ((secondary * 0.8 + tertiary * 0.2).min(0.80), Tier::CombinedSecondaryTertiary)
    } else if secondary > 0.0 {
        (secondary, Tier::Secondary)
    } else if tertiary > 0.0 {
        (tertiary, Tier::Tertiary)
    } else {
        (0.0, Tier::None)
    }
}
