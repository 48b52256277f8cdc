//! Parsing of model output into the extraction payload.
//!
//! The model is instructed to return bare JSON, but in practice wraps it in
//! a markdown fence often enough that the parser has to look for one first.
//! Validation is two-phase so the caller can tell a malformed response
//! (unparseable JSON) apart from a schema mismatch (parseable, but missing
//! required top-level keys).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::models::{
    ApprovalClue, ExtractedObjection, ExtractedQuote, ExtractedRelationship, ExtractedRisk,
    ExtractedStakeholder,
};

use super::pipeline::ExtractionError;

/// Top-level keys every extraction response must carry.
const REQUIRED_KEYS: [&str; 5] = [
    "stakeholders",
    "quotes",
    "objections",
    "risks",
    "approval_clues",
];

/// The full structured result of one extraction.
///
/// `relationships` is optional: prompt versions before relationship
/// inference never emitted the key, and their responses must still parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedPayload {
    pub stakeholders: Vec<ExtractedStakeholder>,
    pub quotes: Vec<ExtractedQuote>,
    pub objections: Vec<ExtractedObjection>,
    pub risks: Vec<ExtractedRisk>,
    pub approval_clues: Vec<ApprovalClue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<Vec<ExtractedRelationship>>,
}

/// Pull the JSON body out of a possibly-fenced model response.
///
/// Tries a ```json fence, then a bare ``` fence, then falls back to the
/// raw content.
fn extract_json_block(content: &str) -> &str {
    static JSON_FENCE: OnceLock<Regex> = OnceLock::new();
    static BARE_FENCE: OnceLock<Regex> = OnceLock::new();

    let json_fence =
        JSON_FENCE.get_or_init(|| Regex::new(r"(?s)```json\s*\n(.*?)\n```").unwrap());
    let bare_fence = BARE_FENCE.get_or_init(|| Regex::new(r"(?s)```\s*\n(.*?)\n```").unwrap());

    if let Some(caps) = json_fence.captures(content) {
        return caps.get(1).unwrap().as_str();
    }
    if let Some(caps) = bare_fence.captures(content) {
        return caps.get(1).unwrap().as_str();
    }
    content
}

/// Parse and validate a model response.
pub fn parse_extraction(content: &str) -> Result<ExtractedPayload, ExtractionError> {
    let block = extract_json_block(content).trim();

    let value: serde_json::Value =
        serde_json::from_str(block).map_err(|_| ExtractionError::MalformedResponse)?;

    let missing: Vec<&str> = REQUIRED_KEYS
        .iter()
        .filter(|key| value.get(**key).is_none())
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(ExtractionError::SchemaMismatch(missing.join(", ")));
    }

    serde_json::from_value(value).map_err(|_| ExtractionError::MalformedResponse)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "stakeholders": [{"name": "Sarah Chen", "role_title": "VP Engineering"}],
        "quotes": [],
        "objections": [],
        "risks": [{"risk_description": "Budget timeline concern", "severity": "medium"}],
        "approval_clues": []
    }"#;

    #[test]
    fn test_fenced_and_bare_parse_identically() {
        let bare = parse_extraction(MINIMAL).unwrap();
        let json_fenced = parse_extraction(&format!("```json\n{}\n```", MINIMAL)).unwrap();
        let plain_fenced = parse_extraction(&format!("```\n{}\n```", MINIMAL)).unwrap();

        for parsed in [&bare, &json_fenced, &plain_fenced] {
            assert_eq!(parsed.stakeholders.len(), 1);
            assert_eq!(parsed.stakeholders[0].name, "Sarah Chen");
            assert_eq!(parsed.risks.len(), 1);
        }
    }

    #[test]
    fn test_fence_with_surrounding_prose() {
        let content = format!(
            "Here is the extracted information:\n\n```json\n{}\n```\n\nLet me know if you need more.",
            MINIMAL
        );
        let parsed = parse_extraction(&content).unwrap();
        assert_eq!(parsed.stakeholders[0].role_title, "VP Engineering");
    }

    #[test]
    fn test_unparseable_json_is_malformed() {
        let err = parse_extraction("I could not process these notes.").unwrap_err();
        assert!(matches!(err, ExtractionError::MalformedResponse));

        let err = parse_extraction("```json\n{not json}\n```").unwrap_err();
        assert!(matches!(err, ExtractionError::MalformedResponse));
    }

    #[test]
    fn test_missing_required_key_is_schema_mismatch() {
        let content = r#"{
            "stakeholders": [], "quotes": [], "objections": [], "approval_clues": []
        }"#;
        let err = parse_extraction(content).unwrap_err();
        match err {
            ExtractionError::SchemaMismatch(keys) => assert_eq!(keys, "risks"),
            other => panic!("expected SchemaMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_relationships_is_tolerated() {
        let parsed = parse_extraction(MINIMAL).unwrap();
        assert!(parsed.relationships.is_none());
    }

    #[test]
    fn test_relationships_parse_when_present() {
        let content = r#"{
            "stakeholders": [], "quotes": [], "objections": [], "risks": [],
            "approval_clues": [],
            "relationships": [
                {"from_name": "Sarah Chen", "to_name": "John Doe",
                 "relationship_type": "reports_to", "confidence": 0.9}
            ]
        }"#;
        let parsed = parse_extraction(content).unwrap();
        let rels = parsed.relationships.unwrap();
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].relationship_type, "reports_to");
        assert_eq!(rels[0].confidence, Some(0.9));
    }
}
