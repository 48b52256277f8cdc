//! The enrichment pipeline: notes in, structured intelligence out.
//!
//! One run drives a meeting through processing to a terminal state. The
//! model is called exactly once per run; a failed attempt is recorded on
//! the meeting and never retried automatically.

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info};

use crate::llm::{ChatMessage, CompletionBackend, CompletionParams, LlmError};
use crate::models::ExtractionStatus;
use crate::reconcile::Reconciler;
use crate::repository::{DieselError, MeetingRepository};

use super::parser::{parse_extraction, ExtractedPayload};

/// Upper bound on raw notes accepted for extraction.
pub const MAX_RAW_NOTES_CHARS: usize = 50_000;

/// Sampling temperature for extraction; low to favor deterministic
/// structure over creative variation.
const EXTRACTION_TEMPERATURE: f32 = 0.3;

/// Central extraction prompt.
const EXTRACTION_PROMPT: &str = r#"You are an AI assistant that extracts key information from enterprise sales meeting notes.

Analyze the provided meeting notes and extract the following information in a structured format:

1. **Stakeholders**: People mentioned in the meeting with their details
   - name: Full name
   - role_title: Job title/role
   - sentiment: "positive", "neutral", or "negative" based on their attitude
   - influence: "high", "medium", or "low" - their decision-making power
   - notes: Key information about them

2. **Quotes**: Direct quotes or paraphrased statements from stakeholders
   - speaker: Who said it
   - quote: The actual quote or paraphrase
   - context: Brief context about when/why this was said

3. **Objections**: Concerns or objections raised during the meeting
   - topic: What the objection is about
   - severity: "high", "medium", or "low"
   - stakeholder: Who raised it (if known)
   - description: Details about the objection

4. **Risks**: Potential risks or red flags identified
   - category: e.g., "budget", "timeline", "technical", "political"
   - severity: "high", "medium", or "low"
   - risk_description: Description of the risk
   - mitigation: Potential mitigation strategy (if mentioned)

5. **Approval Clues**: Signs of buying signals or approval process information
   - type: e.g., "budget_approval", "timeline_confirmed", "champion_identified"
   - description: Details about the approval signal
   - stakeholder: Who provided this signal (if applicable)

6. **Relationships**: How stakeholders relate to each other, when the notes make it clear
   - from_name: Full name of the first stakeholder
   - to_name: Full name of the second stakeholder
   - relationship_type: "reports_to", "influences", or "collaborates_with"
   - confidence: 0.0 to 1.0, how certain you are

Return ONLY a valid JSON object with these exact keys: stakeholders, quotes, objections, risks, approval_clues, relationships
Each key should be an array of objects following the structures described above.
If a category has no items, return an empty array for that key."#;

/// Failure modes of one extraction run.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Meeting notes exceed the {MAX_RAW_NOTES_CHARS} character limit")]
    NotesTooLong,
    #[error("Meeting not found: {0}")]
    MeetingNotFound(String),
    #[error("Failed to parse AI response as JSON")]
    MalformedResponse,
    #[error("AI response missing required keys: {0}")]
    SchemaMismatch(String),
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("Database error: {0}")]
    Db(#[from] DieselError),
}

impl ExtractionError {
    /// Message safe to store on the meeting and show to the user.
    ///
    /// Gateway/API details stay in the server log; pollers only see a
    /// generic failure for those.
    pub fn public_message(&self) -> String {
        match self {
            Self::Llm(LlmError::RateLimited) | Self::Llm(LlmError::CreditsExhausted) => {
                self.to_string()
            }
            Self::Llm(_) => "AI extraction failed".to_string(),
            other => other.to_string(),
        }
    }
}

/// Drives extraction for meetings.
#[derive(Clone)]
pub struct ExtractionPipeline {
    meetings: MeetingRepository,
    reconciler: Reconciler,
    backend: Arc<dyn CompletionBackend>,
}

impl ExtractionPipeline {
    pub fn new(
        meetings: MeetingRepository,
        reconciler: Reconciler,
        backend: Arc<dyn CompletionBackend>,
    ) -> Self {
        Self {
            meetings,
            reconciler,
            backend,
        }
    }

    /// Run extraction for one meeting.
    ///
    /// Oversized notes are rejected up front, before any state change or
    /// model call. Every failure after the processing write is recorded on
    /// the meeting best-effort, so pollers always land on a terminal state
    /// with a readable error.
    pub async fn run(
        &self,
        meeting_id: &str,
        raw_notes: &str,
    ) -> Result<ExtractedPayload, ExtractionError> {
        if raw_notes.chars().count() > MAX_RAW_NOTES_CHARS {
            return Err(ExtractionError::NotesTooLong);
        }

        match self.attempt(meeting_id, raw_notes).await {
            Ok(payload) => Ok(payload),
            Err(e) => {
                if let Err(write_err) = self
                    .meetings
                    .mark_failed(meeting_id, &e.public_message())
                    .await
                {
                    error!(
                        meeting_id,
                        error = %write_err,
                        "failed to record extraction failure"
                    );
                }
                Err(e)
            }
        }
    }

    async fn attempt(
        &self,
        meeting_id: &str,
        raw_notes: &str,
    ) -> Result<ExtractedPayload, ExtractionError> {
        let meeting = self
            .meetings
            .get(meeting_id)
            .await?
            .ok_or_else(|| ExtractionError::MeetingNotFound(meeting_id.to_string()))?;

        // Pollers must see work-in-progress before the model call starts.
        self.meetings
            .set_status(meeting_id, ExtractionStatus::Processing)
            .await?;
        info!(meeting_id, "starting extraction");

        let messages = vec![
            ChatMessage::system(EXTRACTION_PROMPT),
            ChatMessage::user(format!(
                "Here are the meeting notes to analyze:\n\n{raw_notes}"
            )),
        ];
        let content = self
            .backend
            .complete(
                messages,
                CompletionParams {
                    temperature: EXTRACTION_TEMPERATURE,
                    json_object: false,
                },
            )
            .await?;

        let payload = parse_extraction(&content)?;

        self.meetings
            .mark_completed(
                meeting_id,
                &payload.stakeholders,
                &payload.quotes,
                &payload.objections,
                &payload.risks,
                &payload.approval_clues,
            )
            .await?;
        info!(
            meeting_id,
            stakeholders = payload.stakeholders.len(),
            risks = payload.risks.len(),
            "extraction completed"
        );

        // The extraction result above is already durable; reconciliation
        // failures stay inside the reconciler and cannot undo it.
        self.reconciler
            .reconcile(
                &meeting.deal_id,
                &meeting.user_id,
                meeting_id,
                &payload.stakeholders,
                payload.relationships.as_deref().unwrap_or(&[]),
            )
            .await;

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::DbContext;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    enum StubReply {
        Content(String),
        RateLimited,
        CreditsExhausted,
    }

    struct StubBackend {
        reply: StubReply,
        calls: AtomicUsize,
    }

    impl StubBackend {
        fn content(content: &str) -> Self {
            Self {
                reply: StubReply::Content(content.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(reply: StubReply) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl CompletionBackend for StubBackend {
        async fn complete(
            &self,
            _messages: Vec<ChatMessage>,
            _params: CompletionParams,
        ) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                StubReply::Content(c) => Ok(c.clone()),
                StubReply::RateLimited => Err(LlmError::RateLimited),
                StubReply::CreditsExhausted => Err(LlmError::CreditsExhausted),
            }
        }

        async fn stream(
            &self,
            _messages: Vec<ChatMessage>,
            _params: CompletionParams,
        ) -> Result<crate::llm::ContentStream, LlmError> {
            Err(LlmError::Parse("stub does not stream".to_string()))
        }
    }

    const SCENARIO_RESPONSE: &str = r#"{
        "stakeholders": [
            {"name": "Sarah Chen", "role_title": "VP Engineering"},
            {"name": "John Doe", "role_title": "CFO"}
        ],
        "quotes": [],
        "objections": [],
        "risks": [{"risk_description": "Budget timeline concern", "severity": "medium"}],
        "approval_clues": []
    }"#;

    struct Harness {
        ctx: DbContext,
        backend: Arc<StubBackend>,
        pipeline: ExtractionPipeline,
        _dir: tempfile::TempDir,
    }

    async fn setup(backend: StubBackend) -> Harness {
        let dir = tempdir().unwrap();
        let ctx = DbContext::from_path(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        let backend = Arc::new(backend);
        let pipeline = ExtractionPipeline::new(
            ctx.meetings(),
            Reconciler::new(ctx.stakeholders()),
            backend.clone(),
        );
        Harness {
            ctx,
            backend,
            pipeline,
            _dir: dir,
        }
    }

    async fn seed_meeting(ctx: &DbContext, raw_notes: &str) -> crate::models::Meeting {
        let mut deal = crate::models::Deal::new(
            "user-1".to_string(),
            "Acme Corp".to_string(),
            0.0,
            "USD".to_string(),
        );
        deal.id = "deal-1".to_string();
        ctx.deals().save(&deal).await.unwrap();
        let meeting = crate::models::Meeting::new(
            "deal-1".to_string(),
            "user-1".to_string(),
            "Discovery call".to_string(),
            "call".to_string(),
            NaiveDate::from_ymd_opt(2025, 6, 12).unwrap(),
            raw_notes.to_string(),
        );
        ctx.meetings().save(&meeting).await.unwrap();
        meeting
    }

    #[tokio::test]
    async fn test_successful_extraction_end_to_end() {
        let h = setup(StubBackend::content(SCENARIO_RESPONSE)).await;
        let notes = "Sarah Chen (VP Eng) is excited about the integration. \
                     John Doe (CFO) is worried about budget timeline.";
        let meeting = seed_meeting(&h.ctx, notes).await;

        let payload = h.pipeline.run(&meeting.id, notes).await.unwrap();
        assert_eq!(payload.stakeholders.len(), 2);

        let stored = h.ctx.meetings().get(&meeting.id).await.unwrap().unwrap();
        assert_eq!(stored.extraction_status, ExtractionStatus::Completed);
        assert!(stored.extraction_error.is_none());
        assert_eq!(stored.risks.len(), 1);

        // Reconciliation ran synchronously: two rows, two mentions.
        let stakeholders = h.ctx.stakeholders().list_for_deal("deal-1").await.unwrap();
        assert_eq!(stakeholders.len(), 2);
        assert_eq!(
            h.ctx
                .stakeholders()
                .mention_count_for_meeting(&meeting.id)
                .await
                .unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn test_oversized_notes_rejected_before_model_call() {
        let h = setup(StubBackend::content(SCENARIO_RESPONSE)).await;
        let meeting = seed_meeting(&h.ctx, "short").await;

        let long_notes = "x".repeat(MAX_RAW_NOTES_CHARS + 1);
        let err = h.pipeline.run(&meeting.id, &long_notes).await.unwrap_err();
        assert!(matches!(err, ExtractionError::NotesTooLong));
        assert_eq!(h.backend.call_count(), 0, "no model call may be attempted");

        // Rejected before any side effect: the meeting was never touched.
        let stored = h.ctx.meetings().get(&meeting.id).await.unwrap().unwrap();
        assert_eq!(stored.extraction_status, ExtractionStatus::Pending);
    }

    #[tokio::test]
    async fn test_upstream_rate_limit_marks_meeting_failed() {
        let h = setup(StubBackend::failing(StubReply::RateLimited)).await;
        let meeting = seed_meeting(&h.ctx, "notes").await;

        let err = h.pipeline.run(&meeting.id, "notes").await.unwrap_err();
        assert!(matches!(err, ExtractionError::Llm(LlmError::RateLimited)));

        let stored = h.ctx.meetings().get(&meeting.id).await.unwrap().unwrap();
        assert_eq!(stored.extraction_status, ExtractionStatus::Failed);
        assert!(stored
            .extraction_error
            .unwrap()
            .contains("Rate limit exceeded"));
    }

    #[tokio::test]
    async fn test_credits_exhausted_marks_meeting_failed() {
        let h = setup(StubBackend::failing(StubReply::CreditsExhausted)).await;
        let meeting = seed_meeting(&h.ctx, "notes").await;

        h.pipeline.run(&meeting.id, "notes").await.unwrap_err();
        let stored = h.ctx.meetings().get(&meeting.id).await.unwrap().unwrap();
        assert_eq!(stored.extraction_status, ExtractionStatus::Failed);
        assert!(stored.extraction_error.unwrap().contains("credits exhausted"));
    }

    #[tokio::test]
    async fn test_malformed_response_is_terminal() {
        let h = setup(StubBackend::content("I had trouble with these notes.")).await;
        let meeting = seed_meeting(&h.ctx, "notes").await;

        let err = h.pipeline.run(&meeting.id, "notes").await.unwrap_err();
        assert!(matches!(err, ExtractionError::MalformedResponse));
        assert_eq!(h.backend.call_count(), 1, "parse failures are not retried");

        let stored = h.ctx.meetings().get(&meeting.id).await.unwrap().unwrap();
        assert_eq!(stored.extraction_status, ExtractionStatus::Failed);
    }

    #[tokio::test]
    async fn test_missing_required_key_fails_schema_validation() {
        let response = r#"{"stakeholders": [], "quotes": [], "objections": [], "approval_clues": []}"#;
        let h = setup(StubBackend::content(response)).await;
        let meeting = seed_meeting(&h.ctx, "notes").await;

        let err = h.pipeline.run(&meeting.id, "notes").await.unwrap_err();
        assert!(matches!(err, ExtractionError::SchemaMismatch(_)));

        let stored = h.ctx.meetings().get(&meeting.id).await.unwrap().unwrap();
        assert_eq!(stored.extraction_status, ExtractionStatus::Failed);
        assert!(stored.extraction_error.unwrap().contains("risks"));
    }

    #[tokio::test]
    async fn test_relationships_persisted_when_present() {
        let response = r#"{
            "stakeholders": [
                {"name": "Sarah Chen", "role_title": "VP Engineering"},
                {"name": "John Doe", "role_title": "CFO"}
            ],
            "quotes": [], "objections": [], "risks": [], "approval_clues": [],
            "relationships": [
                {"from_name": "Sarah Chen", "to_name": "John Doe",
                 "relationship_type": "influences", "confidence": 0.7}
            ]
        }"#;
        let h = setup(StubBackend::content(response)).await;
        let meeting = seed_meeting(&h.ctx, "notes").await;

        h.pipeline.run(&meeting.id, "notes").await.unwrap();

        let edges = h
            .ctx
            .stakeholders()
            .relationships_for_deal("deal-1")
            .await
            .unwrap();
        assert_eq!(edges.len(), 1);
        assert!((edges[0].confidence - 0.7).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_unresolved_relationship_does_not_fail_extraction() {
        let response = r#"{
            "stakeholders": [{"name": "Sarah Chen", "role_title": "VP Engineering"}],
            "quotes": [], "objections": [], "risks": [], "approval_clues": [],
            "relationships": [
                {"from_name": "Unknown Person", "to_name": "Sarah Chen",
                 "relationship_type": "reports_to"}
            ]
        }"#;
        let h = setup(StubBackend::content(response)).await;
        let meeting = seed_meeting(&h.ctx, "notes").await;

        h.pipeline.run(&meeting.id, "notes").await.unwrap();

        let stored = h.ctx.meetings().get(&meeting.id).await.unwrap().unwrap();
        assert_eq!(stored.extraction_status, ExtractionStatus::Completed);
        assert!(h
            .ctx
            .stakeholders()
            .relationships_for_deal("deal-1")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_fenced_response_extracts_like_bare() {
        let fenced = format!("```json\n{}\n```", SCENARIO_RESPONSE);
        let h = setup(StubBackend::content(&fenced)).await;
        let meeting = seed_meeting(&h.ctx, "notes").await;

        let payload = h.pipeline.run(&meeting.id, "notes").await.unwrap();
        assert_eq!(payload.stakeholders.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_meeting_is_an_error() {
        let h = setup(StubBackend::content(SCENARIO_RESPONSE)).await;
        let err = h.pipeline.run("no-such-meeting", "notes").await.unwrap_err();
        assert!(matches!(err, ExtractionError::MeetingNotFound(_)));
        assert_eq!(h.backend.call_count(), 0);
    }
}
