//! The app-side dispatcher.
//!
//! Every request passes three local gates before it leaves the device:
//! required fields, a minimum gap since the last request of the same kind,
//! and a bounded wait for the answer. In-flight requests can be cancelled
//! as a group, e.g. when the user leaves the screen.

use crate::error::DispatchError;
use crate::transport::{CoachReply, CoachRequest, HttpTransport, Transport};
use habitcoach_config::ClientConfig;
use habitcoach_core::outcome::CoachMode;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, warn};

pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    min_interval: Duration,
    config: ClientConfig,
    last_sent: Mutex<HashMap<CoachMode, Instant>>,
    cancel: Notify,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
        Self {
            transport,
            min_interval: Duration::from_millis(config.min_interval_ms),
            config,
            last_sent: Mutex::new(HashMap::new()),
            cancel: Notify::new(),
        }
    }

    /// A dispatcher speaking HTTP to `config.base_url`.
    pub fn http(config: ClientConfig) -> Self {
        let transport = Arc::new(HttpTransport::new(&config.base_url));
        Self::new(transport, config)
    }

    pub fn timeout_for(&self, mode: CoachMode) -> Duration {
        Duration::from_secs(self.config.timeout_secs.for_mode(mode))
    }

    pub async fn dispatch(&self, mut request: CoachRequest) -> Result<CoachReply, DispatchError> {
        request.check_required()?;
        let mode = request.mode();

        if let CoachRequest::Analyze(r) = &mut request {
            let cap = self.config.analyze_max_tokens;
            r.max_tokens = Some(r.max_tokens.map_or(cap, |asked| asked.min(cap)));
        }

        self.claim_slot(mode)?;

        let after = self.timeout_for(mode);
        let cancelled = self.cancel.notified();
        tokio::pin!(cancelled);

        tokio::select! {
            biased;
            _ = &mut cancelled => {
                debug!(mode = %mode, "Dispatch cancelled");
                Err(DispatchError::Cancelled)
            }
            result = tokio::time::timeout(after, self.transport.send(&request)) => match result {
                Ok(reply) => reply,
                Err(_) => {
                    warn!(mode = %mode, timeout_secs = after.as_secs(), "Coach request timed out");
                    Err(DispatchError::TimedOut { mode, after })
                }
            },
        }
    }

    /// Abort every dispatch currently waiting for an answer.
    pub fn cancel_pending(&self) {
        self.cancel.notify_waiters();
    }

    /// Record a send for `mode`, or say how long to wait.
    fn claim_slot(&self, mode: CoachMode) -> Result<(), DispatchError> {
        let now = Instant::now();
        let mut last_sent = self.last_sent.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(prev) = last_sent.get(&mode) {
            let elapsed = now.duration_since(*prev);
            if elapsed < self.min_interval {
                return Err(DispatchError::TooSoon {
                    mode,
                    retry_after: self.min_interval - elapsed,
                });
            }
        }
        last_sent.insert(mode, now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use habitcoach_core::api::{
        AnalyzeRequest, ConverseData, ConverseRequest, ConverseResponse, RecommendRequest, ReplyMetadata,
    };

    /// Answers every request after `delay`, remembering what it was sent.
    struct MockTransport {
        delay: Duration,
        sent: Mutex<Vec<CoachRequest>>,
    }

    impl MockTransport {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                delay,
                sent: Mutex::new(Vec::new()),
            })
        }

        fn sent(&self) -> Vec<CoachRequest> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&self, request: &CoachRequest) -> Result<CoachReply, DispatchError> {
            self.sent.lock().unwrap().push(request.clone());
            tokio::time::sleep(self.delay).await;
            Ok(CoachReply::Converse(ConverseResponse {
                success: true,
                data: ConverseData {
                    response: "Go for a walk.".into(),
                    metadata: ReplyMetadata::default(),
                },
                tokens: None,
            }))
        }
    }

    fn converse(message: &str) -> CoachRequest {
        CoachRequest::Converse(ConverseRequest {
            message: message.into(),
            user_id: "u1".into(),
            ..Default::default()
        })
    }

    fn dispatcher(transport: Arc<MockTransport>) -> Dispatcher {
        Dispatcher::new(transport, ClientConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn second_request_too_soon_is_local() {
        let transport = MockTransport::new(Duration::from_millis(10));
        let d = dispatcher(transport.clone());

        d.dispatch(converse("one")).await.unwrap();
        tokio::time::advance(Duration::from_millis(500)).await;
        match d.dispatch(converse("two")).await {
            Err(DispatchError::TooSoon { mode, retry_after }) => {
                assert_eq!(mode, CoachMode::Converse);
                assert!(retry_after <= Duration::from_millis(1500));
                assert!(retry_after > Duration::from_millis(1000));
            }
            other => panic!("expected TooSoon, got {other:?}"),
        }
        assert_eq!(transport.sent().len(), 1);

        // Other kinds have their own interval.
        let rec = CoachRequest::Recommend(RecommendRequest {
            user_id: "u1".into(),
            requested_count: 3,
        });
        d.dispatch(rec).await.unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        d.dispatch(converse("three")).await.unwrap();
        assert_eq!(transport.sent().len(), 3);
    }

    #[tokio::test]
    async fn blank_fields_never_sent() {
        let transport = MockTransport::new(Duration::ZERO);
        let d = dispatcher(transport.clone());
        let err = d.dispatch(converse("   ")).await.unwrap_err();
        assert!(matches!(err, DispatchError::Validation(_)));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_answer_times_out() {
        let transport = MockTransport::new(Duration::from_secs(120));
        let d = dispatcher(transport);
        let err = d.dispatch(converse("hello")).await.unwrap_err();
        assert_eq!(
            err,
            DispatchError::TimedOut {
                mode: CoachMode::Converse,
                after: Duration::from_secs(45)
            }
        );
        assert!(err.to_string().contains("taking too long"));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_pending_aborts_in_flight() {
        let transport = MockTransport::new(Duration::from_secs(30));
        let d = Arc::new(dispatcher(transport));

        let worker = {
            let d = d.clone();
            tokio::spawn(async move { d.dispatch(converse("hello")).await })
        };
        // Let the dispatch reach its await point.
        tokio::time::sleep(Duration::from_millis(10)).await;
        d.cancel_pending();

        assert_eq!(worker.await.unwrap(), Err(DispatchError::Cancelled));
    }

    #[tokio::test]
    async fn analyze_output_capped() {
        let transport = MockTransport::new(Duration::ZERO);
        let d = dispatcher(transport.clone());
        let req = CoachRequest::Analyze(AnalyzeRequest {
            text: "journal".into(),
            user_id: "u1".into(),
            max_tokens: Some(2000),
            ..Default::default()
        });
        d.dispatch(req).await.unwrap();
        match &transport.sent()[0] {
            CoachRequest::Analyze(r) => assert_eq!(r.max_tokens, Some(500)),
            other => panic!("unexpected {other:?}"),
        }
    }
}
