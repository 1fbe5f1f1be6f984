//! Transports carry a [`CoachRequest`] to the gateway and bring back the reply.

use crate::error::DispatchError;
use async_trait::async_trait;
use habitcoach_core::api::{
    AnalyzeRequest, AnalyzeResponse, ConverseRequest, ConverseResponse, ErrorBody, RecommendRequest,
    RecommendResponse,
};
use habitcoach_core::error::ValidationError;
use habitcoach_core::outcome::CoachMode;
use serde::de::DeserializeOwned;
use tracing::debug;

/// One request to the coach API.
#[derive(Debug, Clone, PartialEq)]
pub enum CoachRequest {
    Recommend(RecommendRequest),
    Converse(ConverseRequest),
    Analyze(AnalyzeRequest),
}

impl CoachRequest {
    pub fn mode(&self) -> CoachMode {
        match self {
            Self::Recommend(_) => CoachMode::Recommend,
            Self::Converse(_) => CoachMode::Converse,
            Self::Analyze(_) => CoachMode::Analyze,
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            Self::Recommend(r) => &r.user_id,
            Self::Converse(r) => &r.user_id,
            Self::Analyze(r) => &r.user_id,
        }
    }

    /// Required-field checks only; range limits are the server's call.
    pub fn check_required(&self) -> Result<(), ValidationError> {
        let blank = |field: &str, value: &str| {
            if value.trim().is_empty() {
                Err(ValidationError::BlankField(field.into()))
            } else {
                Ok(())
            }
        };
        blank("userId", self.user_id())?;
        match self {
            Self::Recommend(_) => Ok(()),
            Self::Converse(r) => blank("message", &r.message),
            Self::Analyze(r) => blank("text", &r.text),
        }
    }

    fn path(&self) -> &'static str {
        match self {
            Self::Recommend(_) => "/v1/recommend",
            Self::Converse(_) => "/v1/converse",
            Self::Analyze(_) => "/v1/analyze",
        }
    }
}

/// The gateway's answer to a [`CoachRequest`].
#[derive(Debug, Clone, PartialEq)]
pub enum CoachReply {
    Recommend(RecommendResponse),
    Converse(ConverseResponse),
    Analyze(AnalyzeResponse),
}

impl CoachReply {
    /// Whether the gateway served a fallback instead of a model answer.
    pub fn is_fallback(&self) -> bool {
        match self {
            Self::Recommend(r) => r.metadata.fallback,
            Self::Converse(r) => r.data.metadata.fallback,
            Self::Analyze(r) => r.data.metadata.fallback,
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &CoachRequest) -> Result<CoachReply, DispatchError>;
}

// ── HTTP ──────────────────────────────────────────────────────────────────

/// Talks JSON over HTTP to a running gateway.
///
/// The client has no request timeout of its own; the dispatcher bounds
/// every call.
pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B: serde::Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        user_id: &str,
        body: &B,
    ) -> Result<R, DispatchError> {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "Dispatching coach request");

        let response = self
            .client
            .post(&url)
            .header("X-User-Id", user_id)
            .json(body)
            .send()
            .await
            .map_err(|e| DispatchError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| DispatchError::Network(e.to_string()))?;
        decode_response(status, &text)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &CoachRequest) -> Result<CoachReply, DispatchError> {
        let path = request.path();
        let user = request.user_id();
        match request {
            CoachRequest::Recommend(r) => self.post(path, user, r).await.map(CoachReply::Recommend),
            CoachRequest::Converse(r) => self.post(path, user, r).await.map(CoachReply::Converse),
            CoachRequest::Analyze(r) => self.post(path, user, r).await.map(CoachReply::Analyze),
        }
    }
}

/// Turn a gateway status and body into a reply or a typed error.
pub fn decode_response<R: DeserializeOwned>(status: u16, body: &str) -> Result<R, DispatchError> {
    if (200..300).contains(&status) {
        return serde_json::from_str(body).map_err(|e| DispatchError::Decode(e.to_string()));
    }

    let error_body: Option<ErrorBody> = serde_json::from_str(body).ok();
    match (status, error_body) {
        (
            403,
            Some(ErrorBody {
                tokens: Some(balance),
                required: Some(required),
                ..
            }),
        ) => Err(DispatchError::BudgetExhausted { balance, required }),
        (429, _) => Err(DispatchError::RateLimited),
        (status, Some(e)) => Err(DispatchError::Server {
            status,
            message: e.error,
        }),
        (status, None) => Err(DispatchError::Server {
            status,
            message: body.chars().take(200).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_403_is_typed() {
        let err = decode_response::<ConverseResponse>(
            403,
            r#"{"success":false,"error":"Insufficient tokens","tokens":500,"required":1000}"#,
        )
        .unwrap_err();
        assert_eq!(err, DispatchError::BudgetExhausted { balance: 500, required: 1000 });
    }

    #[test]
    fn other_errors_keep_status_and_message() {
        let err = decode_response::<ConverseResponse>(400, r#"{"success":false,"error":"field must not be blank: message"}"#)
            .unwrap_err();
        assert_eq!(
            err,
            DispatchError::Server {
                status: 400,
                message: "field must not be blank: message".into()
            }
        );
        assert_eq!(
            decode_response::<ConverseResponse>(429, "").unwrap_err(),
            DispatchError::RateLimited
        );
        assert!(matches!(
            decode_response::<ConverseResponse>(502, "<html>bad gateway</html>"),
            Err(DispatchError::Server { status: 502, .. })
        ));
    }

    #[test]
    fn success_body_decodes() {
        let body = r#"{"success":true,"data":{"response":"Go.","metadata":{"tokensUsed":10,"model":"m","fallback":false}},"tokens":{"used":10,"remaining":90}}"#;
        let reply: ConverseResponse = decode_response(200, body).unwrap();
        assert_eq!(reply.data.response, "Go.");
        assert_eq!(reply.tokens.unwrap().remaining, 90);

        assert!(matches!(
            decode_response::<ConverseResponse>(200, "{}"),
            Err(DispatchError::Decode(_))
        ));
    }

    #[test]
    fn required_fields_checked() {
        let req = CoachRequest::Converse(ConverseRequest {
            message: " ".into(),
            user_id: "u1".into(),
            ..Default::default()
        });
        assert_eq!(
            req.check_required(),
            Err(ValidationError::BlankField("message".into()))
        );
        let req = CoachRequest::Recommend(RecommendRequest::default());
        assert_eq!(
            req.check_required(),
            Err(ValidationError::BlankField("userId".into()))
        );
    }
}
