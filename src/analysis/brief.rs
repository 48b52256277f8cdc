//! Prep brief generation.
//!
//! Aggregates the deal's stakeholders, recent meetings, risks, and
//! objections into a coaching prompt and asks the gateway for a
//! structured brief. The brief itself stays model-shaped JSON; only the
//! deal snapshot around it is typed.

use std::sync::Arc;

use crate::llm::{ChatMessage, CompletionBackend, CompletionParams};
use crate::models::{Deal, Meeting, Power, Stakeholder};
use crate::repository::{DealRepository, MeetingRepository, StakeholderRepository};

use super::AnalysisError;

/// How many recent meetings feed the brief.
const MEETING_WINDOW: i64 = 3;
/// Caps on aggregated context so the prompt stays focused.
const MAX_RISKS: usize = 5;
const MAX_OBJECTIONS: usize = 3;

/// A generated brief plus the deal snapshot it was built from.
#[derive(Debug, Clone)]
pub struct PrepBriefResult {
    pub brief: serde_json::Value,
    pub deal: Deal,
}

/// Generates meeting prep briefs for a deal.
#[derive(Clone)]
pub struct BriefGenerator {
    deals: DealRepository,
    stakeholders: StakeholderRepository,
    meetings: MeetingRepository,
    backend: Arc<dyn CompletionBackend>,
}

impl BriefGenerator {
    pub fn new(
        deals: DealRepository,
        stakeholders: StakeholderRepository,
        meetings: MeetingRepository,
        backend: Arc<dyn CompletionBackend>,
    ) -> Self {
        Self {
            deals,
            stakeholders,
            meetings,
            backend,
        }
    }

    /// Generate a prep brief for the deal.
    pub async fn generate(&self, deal_id: &str) -> Result<PrepBriefResult, AnalysisError> {
        let deal = self
            .deals
            .get(deal_id)
            .await?
            .ok_or_else(|| AnalysisError::DealNotFound(deal_id.to_string()))?;

        let mut stakeholders = self.stakeholders.list_for_deal(deal_id).await?;
        stakeholders.sort_by_key(|s| std::cmp::Reverse(power_rank(s)));

        let meetings = self.meetings.recent_for_deal(deal_id, MEETING_WINDOW).await?;

        let prompt = build_prompt(&deal, &stakeholders, &meetings);
        let content = self
            .backend
            .complete(
                vec![ChatMessage::system(prompt)],
                CompletionParams {
                    temperature: 0.7,
                    json_object: true,
                },
            )
            .await?;

        if content.trim().is_empty() {
            return Err(AnalysisError::EmptyResponse);
        }
        let brief =
            serde_json::from_str(&content).map_err(|_| AnalysisError::MalformedResponse)?;

        Ok(PrepBriefResult { brief, deal })
    }
}

fn power_rank(s: &Stakeholder) -> u8 {
    match s.power {
        Some(Power::High) => 3,
        Some(Power::Medium) => 2,
        Some(Power::Low) => 1,
        None => 0,
    }
}

fn build_prompt(deal: &Deal, stakeholders: &[Stakeholder], meetings: &[Meeting]) -> String {
    let stakeholder_context = if stakeholders.is_empty() {
        "No stakeholders identified yet".to_string()
    } else {
        stakeholders
            .iter()
            .map(|s| {
                format!(
                    "{} ({}{}):\n- Stance: {}\n- Power: {}\n- Communication Style: {}",
                    s.name,
                    s.role_title,
                    s.department
                        .as_deref()
                        .map(|d| format!(", {}", d))
                        .unwrap_or_default(),
                    s.stance.map(|v| v.as_str()).unwrap_or("unknown"),
                    s.power.map(|v| v.as_str()).unwrap_or("unknown"),
                    s.communication_style.as_deref().unwrap_or("not specified"),
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    let last_meeting_summary = meetings.first().map_or_else(
        || "No previous meetings recorded".to_string(),
        |m| {
            let notes_preview: String = m.raw_notes.chars().take(500).collect();
            format!(
                "Date: {}\nTitle: {}\nNotes: {}...\nKey Quotes: {}",
                m.meeting_date,
                m.title,
                notes_preview,
                serde_json::to_string(&m.quotes.iter().take(3).collect::<Vec<_>>())
                    .unwrap_or_else(|_| "[]".to_string()),
            )
        },
    );

    let risks: Vec<String> = meetings
        .iter()
        .flat_map(|m| m.risks.iter())
        .take(MAX_RISKS)
        .map(|r| format!("[{}] {}", r.severity, r.risk_description))
        .collect();
    let risks_summary = if risks.is_empty() {
        "No risks identified".to_string()
    } else {
        risks.join("\n")
    };

    let objections: Vec<String> = meetings
        .iter()
        .flat_map(|m| m.objections.iter())
        .take(MAX_OBJECTIONS)
        .map(|o| {
            format!(
                "{}: {} (from: {})",
                o.topic,
                o.description,
                o.stakeholder.as_deref().unwrap_or("unknown"),
            )
        })
        .collect();
    let objections_summary = if objections.is_empty() {
        "No objections recorded".to_string()
    } else {
        objections.join("\n")
    };

    format!(
        r#"You are a sales coach preparing a sales representative for an upcoming meeting.

Deal Context:
- Company: {account_name}
- Deal Value: {deal_value} {currency}
- Stage: {stage}
- Expected Close: {expected_close}

Stakeholders:
{stakeholder_context}

Last Meeting Summary:
{last_meeting_summary}

Identified Risks:
{risks_summary}

Previous Objections:
{objections_summary}

Generate a comprehensive prep brief in JSON format with the following structure:

{{
  "executive_summary": "2-3 sentence overview of the deal status and meeting readiness",
  "stakeholder_summary": [
    {{
      "name": "string",
      "role": "string",
      "stance": "string",
      "key_point": "one key thing to remember about this person"
    }}
  ],
  "risks_to_address": [
    {{
      "risk": "description",
      "severity": "high|medium|low",
      "mitigation": "suggested approach to handle this"
    }}
  ],
  "last_meeting_key_takeaways": ["takeaway 1", "takeaway 2", "takeaway 3"],
  "recommended_questions": [
    {{
      "question": "the question to ask",
      "purpose": "why this question matters",
      "stakeholder": "who to ask (if specific)"
    }}
  ],
  "meeting_objectives": ["objective 1", "objective 2", "objective 3"],
  "prep_notes": ["quick tip 1", "quick tip 2"]
}}

Be specific, actionable, and strategic. Focus on moving the deal forward."#,
        account_name = deal.account_name,
        deal_value = deal.deal_value,
        currency = deal.currency,
        stage = deal.stage,
        expected_close = deal.expected_close_month.as_deref().unwrap_or("not set"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Deal;

    #[test]
    fn test_prompt_handles_empty_deal() {
        let deal = Deal::new(
            "user-1".to_string(),
            "Acme Corp".to_string(),
            100_000.0,
            "USD".to_string(),
        );
        let prompt = build_prompt(&deal, &[], &[]);
        assert!(prompt.contains("Acme Corp"));
        assert!(prompt.contains("No stakeholders identified yet"));
        assert!(prompt.contains("No previous meetings recorded"));
        assert!(prompt.contains("No risks identified"));
    }

    #[test]
    fn test_power_ordering() {
        let mut a = Stakeholder::new("d".into(), "u".into(), "A".into(), "Analyst".into());
        let mut b = Stakeholder::new("d".into(), "u".into(), "B".into(), "CFO".into());
        b.power = Some(Power::High);
        a.power = Some(Power::Low);
        let mut list = vec![a, b];
        list.sort_by_key(|s| std::cmp::Reverse(power_rank(s)));
        assert_eq!(list[0].name, "B");
    }
}
