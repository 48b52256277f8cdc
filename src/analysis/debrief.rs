//! Simulation debrief generation.

use std::sync::Arc;

use crate::llm::{ChatMessage, CompletionBackend, CompletionParams};
use crate::models::{Debrief, TranscriptRole};
use crate::repository::{DealRepository, SimulationRepository};

use super::AnalysisError;

/// Turns a finished roleplay transcript into a structured debrief and
/// closes out the simulation.
#[derive(Clone)]
pub struct DebriefGenerator {
    simulations: SimulationRepository,
    deals: DealRepository,
    backend: Arc<dyn CompletionBackend>,
}

impl DebriefGenerator {
    pub fn new(
        simulations: SimulationRepository,
        deals: DealRepository,
        backend: Arc<dyn CompletionBackend>,
    ) -> Self {
        Self {
            simulations,
            deals,
            backend,
        }
    }

    /// Generate and persist the debrief for a simulation.
    pub async fn generate(&self, simulation_id: &str) -> Result<Debrief, AnalysisError> {
        let simulation = self
            .simulations
            .get(simulation_id)
            .await?
            .ok_or_else(|| AnalysisError::SimulationNotFound(simulation_id.to_string()))?;
        let deal = self
            .deals
            .get(&simulation.deal_id)
            .await?
            .ok_or_else(|| AnalysisError::DealNotFound(simulation.deal_id.clone()))?;

        let conversation = simulation
            .transcript
            .iter()
            .map(|turn| {
                let speaker = match turn.role {
                    TranscriptRole::User => "Sales Rep",
                    TranscriptRole::Assistant => "Stakeholder(s)",
                };
                format!("{}: {}", speaker, turn.content)
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let goal_line = simulation
            .meeting_goal
            .as_deref()
            .map(|g| format!("\nMeeting Goal: {}", g))
            .unwrap_or_default();

        let prompt = format!(
            r#"You are an expert sales coach analyzing a roleplay simulation.

Deal Context:
- Company: {account_name}
- Deal Value: {deal_value} {currency}
- Stage: {stage}{goal_line}

Analyze the following sales conversation and provide a structured debrief in JSON format:

{{
  "what_went_well": ["point 1", "point 2", ...],
  "what_didnt": ["point 1", "point 2", ...],
  "likely_outcomes": ["outcome 1", "outcome 2", ...],
  "next_steps": ["step 1", "step 2", ...]
}}

Be specific, actionable, and realistic. Focus on:
- Communication style and rapport building
- Objection handling and responses
- Value proposition clarity
- Question quality and active listening
- Alignment with stakeholder concerns
- Next action clarity

Conversation:
{conversation}"#,
            account_name = deal.account_name,
            deal_value = deal.deal_value,
            currency = deal.currency,
            stage = deal.stage,
        );

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
        let debrief: Debrief =
            serde_json::from_str(&content).map_err(|_| AnalysisError::MalformedResponse)?;

        self.simulations
            .complete_with_debrief(simulation_id, &debrief)
            .await?;

        Ok(debrief)
    }
}
