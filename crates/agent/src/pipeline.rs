//! The coach pipeline: one request from input to outcome.
//!
//! Every mode follows the same sequence:
//!
//! 1. **Validate** the input (terminal on failure, nothing charged)
//! 2. **Check budget** against the mode's threshold (terminal, no model call)
//! 3. **Gather** the user snapshot
//! 4. **Compile** the prompt
//! 5. **Invoke** the model under the mode's timeout
//! 6. **Validate/map** the reply; provider and schema failures route to the
//!    deterministic fallback
//! 7. **Debit** the tokens the model actually used
//! 8. **Record** the outcome

use crate::context::ContextAggregator;
use crate::fallback::FallbackStrategy;
use crate::invoke::ModelClient;
use crate::ledger_guard::LedgerGuard;
use crate::prompt::{AnalysisVariant, Phase, PromptCompiler, PromptRequest};
use crate::validate::ResponseValidator;
use habitcoach_config::{AppConfig, InputLimits, RequiredTokens};
use habitcoach_core::api::{
    AnalyzeData, AnalyzeRequest, AnalyzeResponse, ConverseData, ConverseRequest, ConverseResponse,
    RecommendMetadata, RecommendRequest, RecommendResponse, ReplyMetadata, TokenReport,
};
use habitcoach_core::catalog::ExerciseCatalog;
use habitcoach_core::error::{Error, SchemaError};
use habitcoach_core::ledger::TokenLedger;
use habitcoach_core::message::{recent_window, ConversationTurn};
use habitcoach_core::outcome::{CoachMode, CoachOutcome, FallbackReason};
use habitcoach_core::provider::Provider;
use habitcoach_core::recommendation::RecommendationSet;
use habitcoach_core::snapshot::UserContextSnapshot;
use habitcoach_telemetry::{OutcomeEvent, OutcomeKind, TelemetryEngine};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// A finished request: the outcome plus what it cost.
#[derive(Debug, Clone)]
pub struct CoachResponse<T> {
    pub outcome: CoachOutcome<T>,
    /// `None` when the post-call ledger update failed.
    pub tokens: Option<TokenReport>,
    /// Tokens the model call cost (0 when no reply came back).
    pub tokens_used: u64,
    pub model: String,
    pub phase: Option<Phase>,
    pub variant: Option<AnalysisVariant>,
}

impl<T> CoachResponse<T> {
    pub fn is_ai(&self) -> bool {
        self.outcome.is_ai()
    }

    fn reply_metadata(&self) -> ReplyMetadata {
        ReplyMetadata {
            tokens_used: self.tokens_used,
            model: self.model.clone(),
            fallback: !self.outcome.is_ai(),
            fallback_reason: self.outcome.reason(),
            phase: self.phase.map(|p| p.to_string()),
            variant: self.variant.map(|v| v.to_string()),
        }
    }
}

impl CoachResponse<RecommendationSet> {
    pub fn into_recommend_response(self) -> RecommendResponse {
        let fallback_reason = self.outcome.reason();
        let tokens_used = (self.tokens_used > 0).then_some(self.tokens_used);
        let set = self.outcome.into_payload();
        RecommendResponse {
            success: true,
            recommendations: set.recommendations,
            metadata: RecommendMetadata {
                overall_focus_theme: set.overall_focus_theme,
                coach_note: set.coach_note,
                tokens_used,
                fallback: fallback_reason.is_some(),
                fallback_reason,
            },
            tokens: self.tokens,
        }
    }
}

impl CoachResponse<String> {
    pub fn into_converse_response(self) -> ConverseResponse {
        let metadata = self.reply_metadata();
        ConverseResponse {
            success: true,
            data: ConverseData {
                response: self.outcome.into_payload(),
                metadata,
            },
            tokens: self.tokens,
        }
    }

    pub fn into_analyze_response(self) -> AnalyzeResponse {
        let metadata = self.reply_metadata();
        AnalyzeResponse {
            success: true,
            data: AnalyzeData {
                analysis: self.outcome.into_payload(),
                metadata,
            },
            tokens: self.tokens,
        }
    }
}

/// Per-request inputs shared by all modes.
struct Turn<'a> {
    mode: CoachMode,
    user_id: &'a str,
    request: PromptRequest,
    /// Client-supplied history that replaces the stored window.
    history: Option<&'a [ConversationTurn]>,
    started: Instant,
}

/// Wires the orchestration components together. Cheap to share behind an
/// `Arc`; holds no per-request state.
pub struct CoachPipeline {
    aggregator: ContextAggregator,
    guard: LedgerGuard,
    compiler: PromptCompiler,
    client: ModelClient,
    validator: ResponseValidator,
    fallback: FallbackStrategy,
    required: RequiredTokens,
    limits: InputLimits,
    window: usize,
    telemetry: Option<Arc<TelemetryEngine>>,
}

impl CoachPipeline {
    pub fn new(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        store: Arc<dyn habitcoach_core::store::UserDataStore>,
        ledger: Arc<dyn TokenLedger>,
        catalog: Arc<ExerciseCatalog>,
    ) -> Self {
        let window = config.context.conversation_turns;
        Self {
            aggregator: ContextAggregator::new(store, config.context.clone()),
            guard: LedgerGuard::new(ledger, config.ledger.overdraft),
            compiler: PromptCompiler::new(catalog.clone(), config.modes.clone(), window),
            client: ModelClient::new(provider, config.active_model()),
            validator: ResponseValidator::new(catalog.clone()),
            fallback: FallbackStrategy::new(catalog),
            required: config.ledger.required.clone(),
            limits: config.limits.clone(),
            window,
            telemetry: None,
        }
    }

    /// Record every outcome in `telemetry`.
    pub fn with_telemetry(mut self, telemetry: Arc<TelemetryEngine>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn telemetry(&self) -> Option<&Arc<TelemetryEngine>> {
        self.telemetry.as_ref()
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    pub fn provider_name(&self) -> &str {
        self.client.provider_name()
    }

    // ── Modes ─────────────────────────────────────────────────────────────

    pub async fn recommend(&self, req: &RecommendRequest) -> Result<CoachResponse<RecommendationSet>, Error> {
        let started = Instant::now();
        if let Err(e) = req.validate(self.limits.max_recommendations) {
            self.reject_invalid(CoachMode::Recommend, &req.user_id, started);
            return Err(e.into());
        }
        let count = req.requested_count;
        self.execute(
            Turn {
                mode: CoachMode::Recommend,
                user_id: &req.user_id,
                request: PromptRequest::Recommend { count },
                history: None,
                started,
            },
            |raw| self.validator.validate_recommendations(raw, count).map(|v| v.set),
            |snapshot, reason| self.fallback.recommend(snapshot, count, reason),
        )
        .await
    }

    pub async fn converse(&self, req: &ConverseRequest) -> Result<CoachResponse<String>, Error> {
        let started = Instant::now();
        if let Err(e) = req.validate(&self.limits.converse()) {
            self.reject_invalid(CoachMode::Converse, &req.user_id, started);
            return Err(e.into());
        }
        self.execute(
            Turn {
                mode: CoachMode::Converse,
                user_id: &req.user_id,
                request: PromptRequest::Converse {
                    message: req.message.clone(),
                    context: req.context.clone(),
                    user_goals: req.user_goals.clone(),
                },
                history: Some(&req.past_messages),
                started,
            },
            |raw| self.validator.validate_text(raw),
            |_, reason| self.fallback.converse(reason),
        )
        .await
    }

    pub async fn analyze(&self, req: &AnalyzeRequest) -> Result<CoachResponse<String>, Error> {
        let started = Instant::now();
        if let Err(e) = req.validate(self.limits.max_analyze_chars) {
            self.reject_invalid(CoachMode::Analyze, &req.user_id, started);
            return Err(e.into());
        }
        self.execute(
            Turn {
                mode: CoachMode::Analyze,
                user_id: &req.user_id,
                request: PromptRequest::Analyze {
                    text: req.text.clone(),
                    context_tag: req.context.clone(),
                    max_tokens: req.max_tokens,
                },
                history: None,
                started,
            },
            |raw| self.validator.validate_text(raw),
            |_, reason| self.fallback.analyze(reason),
        )
        .await
    }

    // ── Shared flow ───────────────────────────────────────────────────────

    async fn execute<T>(
        &self,
        turn: Turn<'_>,
        accept: impl Fn(&str) -> Result<T, SchemaError>,
        substitute: impl Fn(&UserContextSnapshot, FallbackReason) -> T,
    ) -> Result<CoachResponse<T>, Error> {
        let Turn {
            mode,
            user_id,
            request,
            history,
            started,
        } = turn;
        let required = self.required.for_mode(mode);

        if let Err(e) = self.guard.ensure_budget(user_id, required).await {
            match &e {
                Error::BudgetExhausted { .. } => {
                    self.record(OutcomeEvent::new(mode, user_id, OutcomeKind::BudgetRejected), started);
                }
                other => warn!(mode = %mode, user = %user_id, error = %other, "Budget check failed; refusing request"),
            }
            return Err(e);
        }

        let mut snapshot = self.aggregator.gather(user_id).await;
        if let Some(history) = history.filter(|h| !h.is_empty()) {
            snapshot.conversation_window = recent_window(history, self.window);
        }
        for turn in &mut snapshot.conversation_window {
            turn.clip(self.limits.max_turn_chars);
        }

        let prompt = self.compiler.compile(&snapshot, &request);

        let (outcome, tokens_used, model) = match self.client.invoke(&prompt).await {
            Ok(reply) => {
                let outcome = match accept(&reply.raw_text) {
                    Ok(payload) => CoachOutcome::ai(payload),
                    Err(e) => {
                        warn!(mode = %mode, user = %user_id, error = %e, "Model output rejected; serving fallback");
                        let reason = FallbackReason::SchemaError;
                        CoachOutcome::fallback(substitute(&snapshot, reason), reason)
                    }
                };
                (outcome, reply.tokens_used, reply.model)
            }
            Err(e) => {
                let reason = if e.is_timeout() {
                    FallbackReason::Timeout
                } else {
                    FallbackReason::ProviderError
                };
                warn!(mode = %mode, user = %user_id, error = %e, reason = %reason, "Model call failed; serving fallback");
                (
                    CoachOutcome::fallback(substitute(&snapshot, reason), reason),
                    0,
                    self.client.model().to_string(),
                )
            }
        };

        // A completed call is charged even when its output was rejected.
        let tokens = self
            .guard
            .debit(user_id, tokens_used)
            .await
            .map(|remaining| TokenReport {
                used: tokens_used,
                remaining,
            });

        let kind = match outcome.reason() {
            None => OutcomeKind::Ai,
            Some(reason) => OutcomeKind::Fallback { reason },
        };
        let mut event = OutcomeEvent::new(mode, user_id, kind);
        match tokens {
            Some(_) => event = event.with_tokens(tokens_used),
            None => event = event.with_ledger_failure(),
        }
        self.record(event, started);

        info!(
            mode = %mode,
            user = %user_id,
            outcome = %kind,
            tokens_used,
            remaining = tokens.map(|t| t.remaining),
            "Coach request complete"
        );

        Ok(CoachResponse {
            outcome,
            tokens,
            tokens_used,
            model,
            phase: prompt.phase,
            variant: prompt.variant,
        })
    }

    fn reject_invalid(&self, mode: CoachMode, user_id: &str, started: Instant) {
        self.record(OutcomeEvent::new(mode, user_id, OutcomeKind::Invalid), started);
    }

    fn record(&self, event: OutcomeEvent, started: Instant) {
        if let Some(telemetry) = &self.telemetry {
            telemetry.record(event.with_duration_ms(started.elapsed().as_millis() as u64));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{reply, BrokenLedger, ScriptedProvider};
    use chrono::{Duration as ChronoDuration, Utc};
    use habitcoach_core::error::ProviderError;
    use habitcoach_core::ledger::OverdraftPolicy;
    use habitcoach_store::{InMemoryLedger, InMemoryStore, UserRecords};
    use serde_json::json;
    use std::time::Duration;

    struct Harness {
        pipeline: CoachPipeline,
        provider: Arc<ScriptedProvider>,
        ledger: Arc<InMemoryLedger>,
        telemetry: Arc<TelemetryEngine>,
    }

    async fn harness(script: Vec<Result<habitcoach_core::provider::ProviderResponse, ProviderError>>, balance: u64) -> Harness {
        let store = InMemoryStore::new();
        store
            .insert_user(
                "u1",
                UserRecords {
                    favorites: vec!["brisk-walk".into(), "box-breathing".into()],
                    ..Default::default()
                },
            )
            .await;
        let provider = Arc::new(ScriptedProvider::new(script));
        let ledger = Arc::new(InMemoryLedger::new().with_balance("u1", balance));
        let telemetry = Arc::new(TelemetryEngine::new());
        let pipeline = CoachPipeline::new(
            &AppConfig::default(),
            provider.clone(),
            Arc::new(store),
            ledger.clone(),
            Arc::new(ExerciseCatalog::builtin()),
        )
        .with_telemetry(telemetry.clone());
        Harness {
            pipeline,
            provider,
            ledger,
            telemetry,
        }
    }

    fn recommend_req(count: usize) -> RecommendRequest {
        RecommendRequest {
            user_id: "u1".into(),
            requested_count: count,
        }
    }

    fn converse_req(message: &str) -> ConverseRequest {
        ConverseRequest {
            message: message.into(),
            user_id: "u1".into(),
            ..Default::default()
        }
    }

    fn three_items() -> String {
        let item = |id: &str, score: u8| {
            json!({
                "exercise_id": id,
                "priority_score": score,
                "reasoning": "r",
                "personalization": "p",
                "expected_benefit": "b"
            })
        };
        json!({
            "recommendations": [item("body-scan", 90), item("excuse-audit", 80), item("tomorrow-top3", 70)],
            "overall_focus_theme": "Follow-through",
            "coach_note": "Stop negotiating with yourself."
        })
        .to_string()
    }

    async fn balance(ledger: &InMemoryLedger) -> u64 {
        ledger.balance("u1").await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn three_valid_items_are_served_as_ai() {
        let h = harness(vec![reply(&three_items(), 640)], 5000).await;
        let out = h.pipeline.recommend(&recommend_req(3)).await.unwrap();

        assert!(out.is_ai());
        assert_eq!(out.outcome.payload().len(), 3);
        assert!(out.outcome.payload().recommendations.iter().all(|r| r.is_ai_powered));
        assert_eq!(out.tokens, Some(TokenReport { used: 640, remaining: 4360 }));
        assert_eq!(balance(&h.ledger).await, 4360);

        let wire = out.into_recommend_response();
        assert!(!wire.metadata.fallback);
        assert_eq!(wire.metadata.tokens_used, Some(640));
        assert_eq!(wire.metadata.overall_focus_theme.as_deref(), Some("Follow-through"));
    }

    #[tokio::test]
    async fn malformed_json_serves_favorites_and_still_debits() {
        let h = harness(vec![reply("Here are my picks: box breathing!", 300)], 5000).await;
        let out = h.pipeline.recommend(&recommend_req(3)).await.unwrap();

        assert_eq!(out.outcome.reason(), Some(FallbackReason::SchemaError));
        let ids: Vec<_> = out.outcome.payload().exercise_ids().collect();
        assert_eq!(ids, vec!["box-breathing", "brisk-walk"]);
        assert!(out.outcome.payload().recommendations.iter().all(|r| !r.is_ai_powered));
        assert_eq!(balance(&h.ledger).await, 4700);

        let usage = h.telemetry.usage_snapshot();
        assert_eq!(usage.fallback_by_reason[&FallbackReason::SchemaError], 1);
        assert_eq!(usage.tokens_debited, 300);
    }

    #[tokio::test]
    async fn low_balance_never_reaches_the_provider() {
        let h = harness(vec![reply("unused", 10)], 500).await;
        let err = h.pipeline.converse(&converse_req("help")).await.unwrap_err();

        match err {
            Error::BudgetExhausted { balance, required } => {
                assert_eq!(balance, 500);
                assert_eq!(required, 1000);
            }
            other => panic!("expected BudgetExhausted, got {other:?}"),
        }
        assert_eq!(h.provider.call_count(), 0);
        assert_eq!(balance(&h.ledger).await, 500);
        assert_eq!(h.telemetry.usage_snapshot().budget_rejections, 1);
    }

    #[tokio::test]
    async fn invalid_input_is_terminal_and_free() {
        let h = harness(vec![], 5000).await;
        let err = h.pipeline.converse(&converse_req("   ")).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.is_terminal());
        assert_eq!(h.provider.call_count(), 0);

        let err = h.pipeline.recommend(&recommend_req(0)).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(h.telemetry.usage_snapshot().per_mode[&CoachMode::Recommend].invalid, 1);
    }

    #[tokio::test]
    async fn twenty_past_messages_send_only_six() {
        let h = harness(vec![reply("What stopped you yesterday?", 200)], 5000).await;
        let base = Utc::now() - ChronoDuration::hours(1);
        let mut req = converse_req("I failed again");
        req.past_messages = (0..20)
            .map(|i| ConversationTurn::user(format!("old {i}"), base + ChronoDuration::seconds(i)))
            .collect();

        let out = h.pipeline.converse(&req).await.unwrap();
        assert!(out.is_ai());

        let sent = h.provider.last_request().unwrap();
        // System prompt, six history turns, the new message.
        assert_eq!(sent.messages.len(), 8);
        assert_eq!(sent.messages[1].content, "old 14");
        assert_eq!(sent.messages[6].content, "old 19");
        assert_eq!(sent.messages[7].content, "I failed again");
    }

    #[tokio::test]
    async fn oversized_history_is_clipped_before_the_prompt() {
        let h = harness(vec![reply("Short answer.", 200)], 5000).await;
        let base = Utc::now() - ChronoDuration::hours(1);
        let mut req = converse_req("Still here");
        req.past_messages = (0..6)
            .map(|i| ConversationTurn::user("z".repeat(10_000), base + ChronoDuration::seconds(i)))
            .collect();

        h.pipeline.converse(&req).await.unwrap();

        let sent = h.provider.last_request().unwrap();
        let max_turn = AppConfig::default().limits.max_turn_chars;
        assert!(sent.messages[1..7].iter().all(|m| m.content.chars().count() == max_turn));
    }

    #[tokio::test]
    async fn oversized_goal_is_rejected_before_any_call() {
        let h = harness(vec![reply("unused", 1)], 5000).await;
        let mut req = converse_req("Still here");
        req.user_goals = vec!["g".repeat(20_000)];

        let err = h.pipeline.converse(&req).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(h.provider.call_count(), 0);
        assert_eq!(balance(&h.ledger).await, 5000);
    }

    #[tokio::test]
    async fn all_unknown_ids_serve_favorites_as_schema_error() {
        let reply_json = json!({
            "recommendations": [{
                "exercise_id": "cold-plunge",
                "priority_score": 99,
                "reasoning": "r",
                "personalization": "p",
                "expected_benefit": "b"
            }]
        })
        .to_string();
        let h = harness(vec![reply(&reply_json, 300)], 5000).await;

        let out = h.pipeline.recommend(&recommend_req(3)).await.unwrap();
        assert_eq!(out.outcome.reason(), Some(FallbackReason::SchemaError));
        let ids: Vec<_> = out
            .outcome
            .payload()
            .recommendations
            .iter()
            .map(|r| r.exercise_id.as_str())
            .collect();
        assert_eq!(ids, vec!["box-breathing", "brisk-walk"]);
        assert_eq!(out.tokens, Some(TokenReport { used: 300, remaining: 4700 }));
    }

    #[tokio::test]
    async fn provider_error_falls_back_without_charge() {
        let h = harness(
            vec![Err(ProviderError::ApiError {
                status_code: 502,
                message: "bad gateway".into(),
            })],
            5000,
        )
        .await;
        let out = h.pipeline.converse(&converse_req("hello")).await.unwrap();
        assert_eq!(out.outcome.reason(), Some(FallbackReason::ProviderError));
        assert_eq!(out.tokens, Some(TokenReport { used: 0, remaining: 5000 }));

        let wire = out.into_converse_response();
        assert!(wire.data.metadata.fallback);
        assert_eq!(wire.data.metadata.phase.as_deref(), Some("questioning"));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_its_own_reason() {
        let store = Arc::new(InMemoryStore::new());
        let provider = Arc::new(ScriptedProvider::new(vec![reply("late", 10)]).with_delay(Duration::from_secs(120)));
        let ledger = Arc::new(InMemoryLedger::new().with_balance("u1", 5000));
        let pipeline = CoachPipeline::new(
            &AppConfig::default(),
            provider,
            store,
            ledger,
            Arc::new(ExerciseCatalog::builtin()),
        );
        let out = pipeline
            .analyze(&AnalyzeRequest {
                text: "I want to get fit".into(),
                context: Some("goal_quality".into()),
                max_tokens: None,
                user_id: "u1".into(),
            })
            .await
            .unwrap();
        assert_eq!(out.outcome.reason(), Some(FallbackReason::Timeout));
        assert_eq!(out.variant, Some(AnalysisVariant::GoalQuality));
        assert!(out.outcome.payload().contains("too long"));
    }

    #[tokio::test]
    async fn fallback_is_deterministic() {
        let a = harness(vec![reply("not json", 100)], 5000).await;
        let b = harness(vec![reply("also not json", 100)], 5000).await;
        let x = a.pipeline.recommend(&recommend_req(3)).await.unwrap();
        let y = b.pipeline.recommend(&recommend_req(3)).await.unwrap();
        assert_eq!(x.outcome, y.outcome);
    }

    #[tokio::test]
    async fn failed_debit_keeps_response_with_null_tokens() {
        let provider = Arc::new(ScriptedProvider::new(vec![reply("Do ten push-ups now.", 250)]));
        let telemetry = Arc::new(TelemetryEngine::new());
        let pipeline = CoachPipeline::new(
            &AppConfig::default(),
            provider,
            Arc::new(InMemoryStore::new()),
            Arc::new(BrokenLedger::undebitable(5000)),
            Arc::new(ExerciseCatalog::builtin()),
        )
        .with_telemetry(telemetry.clone());

        let out = pipeline.converse(&converse_req("hi")).await.unwrap();
        assert!(out.is_ai());
        assert_eq!(out.tokens, None);
        assert_eq!(out.tokens_used, 250);
        assert_eq!(telemetry.usage_snapshot().ledger_failures, 1);

        let wire = serde_json::to_value(out.into_converse_response()).unwrap();
        assert!(wire["tokens"].is_null());
        assert_eq!(wire["data"]["metadata"]["tokensUsed"], 250);
    }

    #[tokio::test]
    async fn unreachable_ledger_fails_closed() {
        let provider = Arc::new(ScriptedProvider::new(vec![reply("x", 1)]));
        let pipeline = CoachPipeline::new(
            &AppConfig::default(),
            provider.clone(),
            Arc::new(InMemoryStore::new()),
            Arc::new(BrokenLedger::unreadable()),
            Arc::new(ExerciseCatalog::builtin()),
        );
        let err = pipeline.converse(&converse_req("hi")).await.unwrap_err();
        assert!(matches!(err, Error::Ledger(_)));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn overdraft_drains_balance_and_blocks_the_next_call() {
        let mut config = AppConfig::default();
        config.ledger.overdraft = OverdraftPolicy::Reject;
        config.ledger.required.converse = 1000;
        let provider = Arc::new(ScriptedProvider::new(vec![reply("Go.", 1500), reply("Again.", 1500)]));
        let ledger = Arc::new(InMemoryLedger::new().with_balance("u1", 1000));
        let pipeline = CoachPipeline::new(
            &config,
            provider.clone(),
            Arc::new(InMemoryStore::new()),
            ledger.clone(),
            Arc::new(ExerciseCatalog::builtin()),
        );

        let first = pipeline.converse(&converse_req("hi")).await.unwrap();
        assert!(first.is_ai());
        assert_eq!(first.tokens, Some(TokenReport { used: 1500, remaining: 0 }));
        assert_eq!(balance(&ledger).await, 0);

        let second = pipeline.converse(&converse_req("hi again")).await.unwrap_err();
        assert!(matches!(second, Error::BudgetExhausted { balance: 0, required: 1000 }));
        assert_eq!(provider.call_count(), 1);
    }
}
