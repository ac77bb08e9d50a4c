/// Content moderation gateway
///
/// Builds a classification prompt, asks an external text classifier for a
/// verdict and parses the reply into a `ModerationVerdict`. Every failure of
/// the classifier (transport, timeout, empty or malformed reply) becomes an
/// `error` verdict plus a `ModerationError`; nothing escapes as a panic or an
/// untyped value.
pub mod client;
pub mod prompt;
pub mod verdict;

pub use client::HttpTextClassifier;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{ModerationVerdict, VerdictStatus};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModerationError {
    #[error("classifier request failed: {0}")]
    Classifier(String),

    #[error("classifier timed out after {0:?}")]
    Timeout(Duration),

    #[error("classifier returned no content")]
    EmptyResponse,

    #[error("classifier response is not valid JSON: {0}")]
    Unparseable(String),

    #[error("classifier response has an unexpected shape: {0}")]
    InvalidShape(String),
}

/// External text-generation capability used for classification
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextClassifier: Send + Sync {
    /// Single request/response completion for `prompt`
    async fn generate(&self, prompt: &str) -> Result<String, ModerationError>;
}

/// Verdict plus the reason the classifier could not be consulted, if any.
///
/// `error` is `Some` exactly when `verdict.status` is `Error`, which lets the
/// caller tell "classifier says problem" apart from "classifier unavailable".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub verdict: ModerationVerdict,
    pub error: Option<ModerationError>,
}

impl Evaluation {
    fn decided(verdict: ModerationVerdict) -> Self {
        Self {
            verdict,
            error: None,
        }
    }

    fn failed(error: ModerationError) -> Self {
        Self {
            verdict: ModerationVerdict::error(error.to_string()),
            error: Some(error),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        self.verdict.status == VerdictStatus::Error
    }
}

#[derive(Clone)]
pub struct ModerationGateway {
    classifier: Arc<dyn TextClassifier>,
    timeout: Duration,
}

impl ModerationGateway {
    pub fn new(classifier: Arc<dyn TextClassifier>, timeout: Duration) -> Self {
        Self {
            classifier,
            timeout,
        }
    }

    /// Classify `content`. Never fails; see `Evaluation`.
    pub async fn evaluate(&self, content: &str) -> Evaluation {
        let prompt = prompt::build_prompt(content);

        let raw = match tokio::time::timeout(self.timeout, self.classifier.generate(&prompt)).await
        {
            Ok(Ok(raw)) => raw,
            Ok(Err(err)) => {
                warn!(error = %err, "Moderation classifier call failed");
                return Evaluation::failed(err);
            }
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "Moderation classifier timed out");
                return Evaluation::failed(ModerationError::Timeout(self.timeout));
            }
        };

        if raw.trim().is_empty() {
            warn!("Moderation classifier returned an empty response");
            return Evaluation::failed(ModerationError::EmptyResponse);
        }

        match verdict::parse_verdict(&raw) {
            Ok(verdict) => {
                debug!(
                    status = verdict.status.as_str(),
                    issues = verdict.issues.len(),
                    "Moderation verdict parsed"
                );
                Evaluation::decided(verdict)
            }
            Err(err) => {
                warn!(error = %err, raw_response = %raw, "Moderation response rejected");
                Evaluation::failed(err)
            }
        }
    }
}
