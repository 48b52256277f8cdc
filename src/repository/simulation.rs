//! Simulation repository.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::models::{Debrief, Simulation, SimulationStatus, TranscriptEntry};
use crate::schema::simulations;

use super::pool::{AsyncSqlitePool, DieselError};
use super::records::{NewSimulation, SimulationRecord};

/// Repository for simulation rows.
#[derive(Clone)]
pub struct SimulationRepository {
    pool: AsyncSqlitePool,
}

impl SimulationRepository {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a simulation.
    pub async fn save(&self, simulation: &Simulation) -> Result<(), DieselError> {
        let stakeholder_ids = serde_json::to_string(&simulation.stakeholder_ids)
            .unwrap_or_else(|_| "[]".to_string());
        let transcript =
            serde_json::to_string(&simulation.transcript).unwrap_or_else(|_| "[]".to_string());
        let debrief = simulation
            .debrief
            .as_ref()
            .and_then(|d| serde_json::to_string(d).ok());
        let created_at = simulation.created_at.to_rfc3339();
        let ended_at = simulation.ended_at.map(|dt| dt.to_rfc3339());

        let record = NewSimulation {
            id: &simulation.id,
            deal_id: &simulation.deal_id,
            user_id: &simulation.user_id,
            stakeholder_ids: &stakeholder_ids,
            meeting_goal: simulation.meeting_goal.as_deref(),
            transcript: &transcript,
            debrief: debrief.as_deref(),
            status: simulation.status.as_str(),
            created_at: &created_at,
            ended_at: ended_at.as_deref(),
        };

        let mut conn = self.pool.get().await?;
        diesel::insert_into(simulations::table)
            .values(&record)
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    /// Get a simulation by id.
    pub async fn get(&self, id: &str) -> Result<Option<Simulation>, DieselError> {
        let mut conn = self.pool.get().await?;
        simulations::table
            .find(id)
            .first::<SimulationRecord>(&mut conn)
            .await
            .optional()
            .map(|r| r.map(Simulation::from))
    }

    /// Replace the stored transcript.
    pub async fn update_transcript(
        &self,
        id: &str,
        transcript: &[TranscriptEntry],
    ) -> Result<(), DieselError> {
        let json = serde_json::to_string(transcript).unwrap_or_else(|_| "[]".to_string());
        let mut conn = self.pool.get().await?;
        diesel::update(simulations::table.find(id))
            .set(simulations::transcript.eq(json))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    /// Store the debrief and close out the simulation.
    pub async fn complete_with_debrief(
        &self,
        id: &str,
        debrief: &Debrief,
    ) -> Result<(), DieselError> {
        let json = serde_json::to_string(debrief).unwrap_or_else(|_| "{}".to_string());
        let mut conn = self.pool.get().await?;
        diesel::update(simulations::table.find(id))
            .set((
                simulations::debrief.eq(Some(json)),
                simulations::status.eq(SimulationStatus::Completed.as_str()),
                simulations::ended_at.eq(Some(Utc::now().to_rfc3339())),
            ))
            .execute(&mut conn)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::context::DbContext;
    use super::*;
    use crate::models::{TranscriptRole, TranscriptEntry};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_simulation_transcript_and_debrief() {
        let dir = tempdir().unwrap();
        let ctx = DbContext::from_path(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        let mut deal = crate::models::Deal::new(
            "user-1".to_string(),
            "Acme Corp".to_string(),
            0.0,
            "USD".to_string(),
        );
        deal.id = "deal-1".to_string();
        ctx.deals().save(&deal).await.unwrap();
        let repo = ctx.simulations();

        let sim = Simulation::new(
            "deal-1".to_string(),
            "user-1".to_string(),
            vec!["s-1".to_string()],
        );
        repo.save(&sim).await.unwrap();

        let transcript = vec![
            TranscriptEntry::new(TranscriptRole::User, "Hi Sarah".to_string()),
            TranscriptEntry::new(TranscriptRole::Assistant, "Hello".to_string()),
        ];
        repo.update_transcript(&sim.id, &transcript).await.unwrap();

        let fetched = repo.get(&sim.id).await.unwrap().unwrap();
        assert_eq!(fetched.transcript.len(), 2);
        assert_eq!(fetched.status, SimulationStatus::Active);

        let debrief = Debrief {
            what_went_well: vec!["rapport".to_string()],
            ..Default::default()
        };
        repo.complete_with_debrief(&sim.id, &debrief).await.unwrap();

        let fetched = repo.get(&sim.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, SimulationStatus::Completed);
        assert!(fetched.ended_at.is_some());
        assert_eq!(fetched.debrief.unwrap().what_went_well, vec!["rapport"]);
    }
}
