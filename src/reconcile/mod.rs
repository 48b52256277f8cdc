//! Reconciliation of extracted entities into persisted ones.
//!
//! Runs after an extraction has already been durably saved on the meeting,
//! which drives the error policy here: nothing in this module propagates a
//! failure. A half-applied reconciliation is worth more than a rolled-back
//! one, so every error is logged and the pass moves on.

use std::collections::HashMap;

use tracing::{debug, error};

use crate::models::{
    ExtractedRelationship, ExtractedStakeholder, RelationshipType, StakeholderRelationship,
};
use crate::repository::StakeholderRepository;

/// Confidence recorded for inferred relationships when the model omits one.
const DEFAULT_RELATIONSHIP_CONFIDENCE: f64 = 0.5;

/// Merges extracted stakeholders and relationships into the deal's records.
#[derive(Clone)]
pub struct Reconciler {
    stakeholders: StakeholderRepository,
}

impl Reconciler {
    pub fn new(stakeholders: StakeholderRepository) -> Self {
        Self { stakeholders }
    }

    /// Reconcile one extraction batch against the deal.
    ///
    /// Infallible by contract: the extraction that produced this batch is
    /// already completed, and no linking failure may undo that.
    pub async fn reconcile(
        &self,
        deal_id: &str,
        user_id: &str,
        meeting_id: &str,
        extracted: &[ExtractedStakeholder],
        relationships: &[ExtractedRelationship],
    ) {
        self.upsert_stakeholders(deal_id, user_id, meeting_id, extracted)
            .await;
        if !relationships.is_empty() {
            self.infer_relationships(deal_id, relationships).await;
        }
    }

    /// Create-or-reuse each extracted stakeholder and link it to the meeting.
    async fn upsert_stakeholders(
        &self,
        deal_id: &str,
        user_id: &str,
        meeting_id: &str,
        extracted: &[ExtractedStakeholder],
    ) {
        for person in extracted {
            let name = person.name.trim();
            let role_title = person.role_title.trim();
            if name.is_empty() || role_title.is_empty() {
                debug!("skipping extracted stakeholder with empty name or role");
                continue;
            }

            let stakeholder = match self
                .stakeholders
                .find_or_create(deal_id, user_id, name, role_title)
                .await
            {
                Ok(s) => s,
                Err(e) => {
                    error!(
                        deal_id,
                        name, error = %e,
                        "failed to create stakeholder during reconciliation"
                    );
                    continue;
                }
            };

            if let Err(e) = self
                .stakeholders
                .link_mention(&stakeholder.id, meeting_id)
                .await
            {
                error!(
                    meeting_id,
                    stakeholder_id = %stakeholder.id,
                    error = %e,
                    "failed to link stakeholder mention"
                );
            }
        }
    }

    /// Persist inferred relationship edges between known stakeholders.
    ///
    /// Names are resolved case-insensitively against every stakeholder on
    /// the deal, not just this batch; an edge whose ends don't both resolve
    /// is dropped without comment since inference is best-effort.
    async fn infer_relationships(&self, deal_id: &str, relationships: &[ExtractedRelationship]) {
        let all = match self.stakeholders.list_for_deal(deal_id).await {
            Ok(list) => list,
            Err(e) => {
                error!(deal_id, error = %e, "failed to load stakeholders for relationship inference");
                return;
            }
        };

        let by_name: HashMap<String, String> = all
            .iter()
            .map(|s| (s.name.trim().to_lowercase(), s.id.clone()))
            .collect();

        for rel in relationships {
            let from_name = rel.from_name.trim();
            let to_name = rel.to_name.trim();
            if from_name.is_empty() || to_name.is_empty() || rel.relationship_type.is_empty() {
                continue;
            }
            let Some(relationship_type) = RelationshipType::from_str(&rel.relationship_type)
            else {
                debug!(
                    relationship_type = %rel.relationship_type,
                    "skipping relationship with unknown type"
                );
                continue;
            };

            let from_id = by_name.get(&from_name.to_lowercase());
            let to_id = by_name.get(&to_name.to_lowercase());
            let (Some(from_id), Some(to_id)) = (from_id, to_id) else {
                continue;
            };
            if from_id == to_id {
                continue;
            }

            let edge = StakeholderRelationship::new(
                deal_id.to_string(),
                from_id.clone(),
                to_id.clone(),
                relationship_type,
                rel.confidence.unwrap_or(DEFAULT_RELATIONSHIP_CONFIDENCE),
            );
            if let Err(e) = self.stakeholders.add_relationship(&edge).await {
                error!(deal_id, error = %e, "failed to persist inferred relationship");
            }
        }
    }
}
