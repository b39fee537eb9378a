use std::collections::HashMap;
use subtheme_core::dispatcher::Dispatcher;
use subtheme_core::models::Method;

fn metadata(filename: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    map.insert("filename".to_string(), filename.to_string());
    map
}

#[test]
fn bank_statement_classifies_with_high_confidence() {
    let dispatcher = Dispatcher::default();
    let text = "Checking account statement for June. Routing number: 123456789. \
                Beginning balance $1,200.00, ending balance $1,350.00.";
    let result = dispatcher.classify(text, "Financial", Some(&metadata("june_statement.pdf")));

    assert_eq!(
        result.primary_subclassification.as_deref(),
        Some("Bank Statement")
    );
    assert_eq!(result.primary_subtheme.as_deref(), Some("Banking"));
    assert!(result.subclassification_confidence.unwrap() >= 0.85);
    assert_eq!(result.subclassification_method, Some(Method::Primary));
    assert!(result.subthemes.contains(&"Banking".to_string()));
    assert_eq!(
        result.category_mapping["Bank Statement"],
        "Banking".to_string()
    );
}

#[test]
fn exclusion_steers_credit_card_text_away_from_bank_statement() {
    let dispatcher = Dispatcher::default();
    let text = "Your credit card account summary. Minimum payment due: $35.00. \
                Credit limit: $5,000. Payment due date is August 15.";
    let result = dispatcher.classify(text, "Financial", None);

    assert_eq!(
        result.primary_subclassification.as_deref(),
        Some("Credit Card Statement")
    );
    // The bank-statement rule is vetoed outright by its exclusions.
    assert!(!result
        .subclassifications
        .contains(&"Bank Statement".to_string()));
    assert!(!result.matched_patterns.contains_key("Bank Statement"));
}

#[test]
fn tiny_text_is_insufficient() {
    let dispatcher = Dispatcher::default();
    let result = dispatcher.classify("hi!!?", "Financial", None);
    assert!(result.subclassifications.is_empty());
    assert_eq!(result.reason(), Some("insufficient_text"));
}

#[test]
fn weak_keyword_overlap_produces_no_classification() {
    let dispatcher = Dispatcher::default();
    // Two generic financial keywords at most per rule, no structural or
    // primary signals.
    let text = "Please review the payment amount with the finance team soon.";
    let result = dispatcher.classify(text, "Financial", None);
    assert!(result.subclassifications.is_empty());
    assert!(matches!(
        result.reason(),
        Some("no_matches") | Some("below_threshold")
    ));
}

#[test]
fn unknown_theme_reports_no_classifier() {
    let dispatcher = Dispatcher::default();
    let result = dispatcher.classify("a long enough piece of text", "Unknown", None);
    assert_eq!(result.reason(), Some("no_classifier_available"));
    assert!(result.subthemes.is_empty());
    assert!(result.subclassifications.is_empty());
    assert!(result.confidence_scores.is_empty());
    assert!(result.primary_subclassification.is_none());
    assert!(result.subclassification_confidence.is_none());
}

#[test]
fn all_confidences_are_within_unit_interval() {
    let dispatcher = Dispatcher::default();
    let samples = [
        (
            "Financial",
            "Checking account statement with routing number: 123456789 and direct deposit activity.",
        ),
        (
            "Healthcare",
            "History of present illness: patient reports fatigue. Vital signs stable. \
             Assessment and plan documented.",
        ),
        (
            "Legal",
            "This Agreement is entered into by the parties. Governing law: Delaware. \
             In witness whereof, the parties execute below.",
        ),
    ];
    for (theme, text) in samples {
        let result = dispatcher.classify(text, theme, None);
        for (name, confidence) in &result.confidence_scores {
            assert!(
                (0.0..=1.0).contains(confidence),
                "{theme}/{name} confidence {confidence} out of range"
            );
        }
        if let Some(c) = result.subclassification_confidence {
            assert!((0.0..=1.0).contains(&c));
        }
    }
}

#[test]
fn classification_is_idempotent() {
    let dispatcher = Dispatcher::default();
    let text = "Portfolio summary for your brokerage account: market value, dividends and \
                interest, unrealized gain detail.";
    let first = dispatcher.classify(text, "Financial", Some(&metadata("portfolio_q3.pdf")));
    let second = dispatcher.classify(text, "Financial", Some(&metadata("portfolio_q3.pdf")));
    assert_eq!(first, second);
}

#[test]
fn subclassifications_are_ordered_by_confidence() {
    let dispatcher = Dispatcher::default();
    let text = "Laboratory report. Physical examination was unremarkable. Reference range \
                noted beside each result, specimen collected this morning.";
    let result = dispatcher.classify(text, "Healthcare", None);
    assert!(result.subclassifications.len() >= 2);
    let ordered: Vec<f64> = result
        .subclassifications
        .iter()
        .map(|name| result.confidence_scores[name])
        .collect();
    let mut sorted = ordered.clone();
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap());
    assert_eq!(ordered, sorted);
    assert_eq!(
        result.primary_subclassification.as_deref(),
        result.subclassifications.first().map(String::as_str)
    );
}

#[test]
fn dispatcher_introspection() {
    let dispatcher = Dispatcher::default();
    let themes = dispatcher.supported_themes();
    for expected in ["Financial", "Healthcare", "Legal"] {
        assert!(themes.contains(&expected.to_string()));
    }
    let subthemes = dispatcher.subthemes_for_theme("Financial");
    assert!(subthemes.contains(&"Banking".to_string()));
    assert!(subthemes.contains(&"Taxes".to_string()));
    assert!(dispatcher.subthemes_for_theme("Unknown").is_empty());
}

#[test]
fn healthcare_eob_beats_medical_bill() {
    let dispatcher = Dispatcher::default();
    let text = "Explanation of benefits. This is not a bill. Allowed amount $120, \
                patient responsibility $20.";
    let result = dispatcher.classify(text, "Healthcare", None);
    assert_eq!(
        result.primary_subclassification.as_deref(),
        Some("Insurance Claim")
    );
    // Medical-bill rule excludes EOB phrasing.
    assert!(!result
        .subclassifications
        .contains(&"Medical Bill".to_string()));
}

#[test]
fn legal_will_is_not_a_generic_contract() {
    let dispatcher = Dispatcher::default();
    let text = "Last will and testament. Being of sound mind, I bequeath my residuary \
                estate to my heirs and revoke all prior wills.";
    let result = dispatcher.classify(text, "legal", None);
    assert_eq!(
        result.primary_subclassification.as_deref(),
        Some("Will & Testament")
    );
    assert_eq!(result.primary_subtheme.as_deref(), Some("Estate"));
    assert!(!result.subclassifications.contains(&"Contract".to_string()));
}
