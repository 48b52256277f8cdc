//! Model-backed analysis over stored deal data: prep briefs, simulation
//! debriefs, and stakeholder insight updates.

mod brief;
mod debrief;
mod insights;

pub use brief::{BriefGenerator, PrepBriefResult};
pub use debrief::DebriefGenerator;
pub use insights::{InsightsUpdater, StakeholderUpdate};

use thiserror::Error;

use crate::llm::LlmError;
use crate::repository::DieselError;

/// Failure modes shared by the analysis generators.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Deal not found: {0}")]
    DealNotFound(String),
    #[error("Simulation not found: {0}")]
    SimulationNotFound(String),
    #[error("Meeting not found: {0}")]
    MeetingNotFound(String),
    #[error("No content generated")]
    EmptyResponse,
    #[error("Failed to parse AI response as JSON")]
    MalformedResponse,
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("Database error: {0}")]
    Db(#[from] DieselError),
}
