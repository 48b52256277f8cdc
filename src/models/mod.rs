//! Data models for the deal intelligence service.

mod deal;
mod meeting;
mod simulation;
mod stakeholder;

pub use deal::{Deal, DealStatus};
pub use meeting::{
    ApprovalClue, ExtractedObjection, ExtractedQuote, ExtractedRisk, ExtractedStakeholder,
    ExtractionStatus, Meeting,
};
pub use simulation::{Debrief, Simulation, SimulationStatus, TranscriptEntry, TranscriptRole};
pub use stakeholder::{
    ExtractedRelationship, Power, RelationshipType, Stakeholder, StakeholderRelationship, Stance,
};
