//! Stakeholder insight updates from accumulated meeting history.
//!
//! After a meeting is enriched, the model re-reads recent history and
//! proposes stance/power/communication-style updates per stakeholder.
//! Updates apply best-effort: an unknown stakeholder id or a bad value is
//! skipped, never fatal.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::llm::{ChatMessage, CompletionBackend, CompletionParams};
use crate::models::{Power, Stance};
use crate::repository::{MeetingRepository, StakeholderRepository};

use super::AnalysisError;

/// How many recent meetings feed the analysis.
const HISTORY_WINDOW: i64 = 5;

/// One proposed update for a stakeholder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakeholderUpdate {
    pub stakeholder_id: String,
    #[serde(default)]
    pub stance: Option<String>,
    #[serde(default)]
    pub power: Option<String>,
    #[serde(default)]
    pub communication_style: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdatesResponse {
    #[serde(default)]
    updates: Vec<StakeholderUpdate>,
}

/// Applies model-proposed insight updates to a deal's stakeholders.
#[derive(Clone)]
pub struct InsightsUpdater {
    meetings: MeetingRepository,
    stakeholders: StakeholderRepository,
    backend: Arc<dyn CompletionBackend>,
}

impl InsightsUpdater {
    pub fn new(
        meetings: MeetingRepository,
        stakeholders: StakeholderRepository,
        backend: Arc<dyn CompletionBackend>,
    ) -> Self {
        Self {
            meetings,
            stakeholders,
            backend,
        }
    }

    /// Update stakeholder insights from a deal's recent meeting history.
    ///
    /// Returns the updates that were actually applied, or `None` when the
    /// deal has no stakeholders to analyze at all.
    pub async fn update(
        &self,
        meeting_id: &str,
        deal_id: &str,
    ) -> Result<Option<Vec<StakeholderUpdate>>, AnalysisError> {
        self.meetings
            .get(meeting_id)
            .await?
            .ok_or_else(|| AnalysisError::MeetingNotFound(meeting_id.to_string()))?;

        let stakeholders = self.stakeholders.list_for_deal(deal_id).await?;
        if stakeholders.is_empty() {
            info!(deal_id, "no stakeholders to update");
            return Ok(None);
        }

        let history = self.meetings.recent_for_deal(deal_id, HISTORY_WINDOW).await?;

        let current = stakeholders
            .iter()
            .map(|s| {
                format!(
                    "- {} ({}) [id: {}]: Current stance={}, power={}",
                    s.name,
                    s.role_title,
                    s.id,
                    s.stance.map(|v| v.as_str()).unwrap_or("unknown"),
                    s.power.map(|v| v.as_str()).unwrap_or("unknown"),
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let meeting_history = history
            .iter()
            .map(|m| {
                format!(
                    "Date: {}\nNotes: {}\nQuotes: {}\nObjections: {}",
                    m.meeting_date,
                    m.raw_notes,
                    serde_json::to_string(&m.quotes).unwrap_or_else(|_| "[]".to_string()),
                    serde_json::to_string(&m.objections).unwrap_or_else(|_| "[]".to_string()),
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = format!(
            r#"You are analyzing meeting notes to update stakeholder intelligence in a B2B sales context.

Based on the meeting history, update each stakeholder's:
1. **stance**: "positive" (supportive/champion), "neutral" (needs convincing), or "negative" (opposes/blocker)
2. **power**: "low" (influencer), "medium" (decision maker), or "high" (executive sponsor/blocker)
3. **communication_style**: brief description of how they communicate

Current Stakeholders:
{current}

Meeting History:
{meeting_history}

Return a JSON object with updates ONLY for stakeholders mentioned or implied in the meetings. Format:
{{
  "updates": [
    {{
      "stakeholder_id": "uuid",
      "stance": "positive|neutral|negative",
      "power": "low|medium|high",
      "communication_style": "brief description",
      "reasoning": "why these changes were made"
    }}
  ]
}}

Only include stakeholders that have new information from the meetings. If no updates are needed, return empty updates array."#,
        );

        let content = self
            .backend
            .complete(
                vec![ChatMessage::system(prompt)],
                CompletionParams {
                    temperature: 0.5,
                    json_object: true,
                },
            )
            .await?;

        let parsed: UpdatesResponse =
            serde_json::from_str(&content).map_err(|_| AnalysisError::MalformedResponse)?;

        let mut applied = Vec::new();
        for update in parsed.updates {
            if !stakeholders.iter().any(|s| s.id == update.stakeholder_id) {
                warn!(
                    stakeholder_id = %update.stakeholder_id,
                    "model proposed update for unknown stakeholder, skipping"
                );
                continue;
            }

            // Unknown enum values from the model degrade to "no change".
            let stance = update.stance.as_deref().and_then(Stance::from_str);
            let power = update.power.as_deref().and_then(Power::from_str);

            let result = self
                .stakeholders
                .update_insights(
                    &update.stakeholder_id,
                    stance.map(|s| s.as_str()),
                    power.map(|p| p.as_str()),
                    update.communication_style.as_deref(),
                )
                .await;
            match result {
                Ok(()) => applied.push(update),
                Err(e) => warn!(
                    stakeholder_id = %update.stakeholder_id,
                    error = %e,
                    "failed to apply stakeholder update"
                ),
            }
        }

        Ok(Some(applied))
    }
}
