//! Request Orchestrator: runs one AI request against an ordered candidate list.
//!
//! Candidates are attempted strictly one at a time, in list order. The first
//! success wins. A failed attempt is classified (for operators, not for control
//! flow), then the orchestrator sleeps per the use case's backoff and moves on.
//! When the last candidate fails the caller receives a single `TerminalError`.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::ai::catalog::{find_model, UseCase};

const RATE_LIMIT_MARKERS: [&str; 4] = ["rate", "quota", "limit", "usage"];
const SERVER_ERROR_MARKERS: [&str; 4] = ["server", "503", "502", "timeout"];

/// Diagnostic classification of one failed attempt.
///
/// Heuristic: derived from provider error wording, which is not a stable contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    RateLimited,
    ServerError,
    Other,
}

/// Case-insensitive substring classification of a provider error message.
/// `ServerError` is only distinguished for the feedback use case.
pub fn classify_failure(use_case: UseCase, message: &str) -> FailureKind {
    let lower = message.to_lowercase();
    if RATE_LIMIT_MARKERS.iter().any(|m| lower.contains(m)) {
        FailureKind::RateLimited
    } else if use_case == UseCase::Feedback
        && SERVER_ERROR_MARKERS.iter().any(|m| lower.contains(m))
    {
        FailureKind::ServerError
    } else {
        FailureKind::Other
    }
}

/// Delay inserted between a failed candidate and the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed(Duration),
    /// `min(base * 2^min(index, max_exponent), cap)`
    Exponential {
        base: Duration,
        max_exponent: u32,
        cap: Duration,
    },
}

impl Backoff {
    pub fn for_use_case(use_case: UseCase) -> Self {
        match use_case {
            UseCase::Chat => Backoff::Fixed(Duration::from_millis(500)),
            UseCase::Feedback => Backoff::Exponential {
                base: Duration::from_millis(1000),
                max_exponent: 4,
                cap: Duration::from_millis(5000),
            },
        }
    }

    /// `attempt_index` is the zero-based position of the candidate that just failed.
    pub fn delay_after(&self, attempt_index: usize) -> Duration {
        match *self {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential {
                base,
                max_exponent,
                cap,
            } => {
                let exponent = (attempt_index as u32).min(max_exponent);
                base.saturating_mul(1 << exponent).min(cap)
            }
        }
    }
}

/// One failed candidate, as seen by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptFailure {
    pub model: String,
    pub kind: FailureKind,
    pub message: String,
}

/// Every candidate failed. The only error `execute` ever returns.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TerminalError {
    pub use_case: UseCase,
    pub message: &'static str,
    pub attempts: Vec<AttemptFailure>,
}

impl TerminalError {
    fn exhausted(use_case: UseCase, attempts: Vec<AttemptFailure>) -> Self {
        let message = match use_case {
            UseCase::Chat => "AI service temporarily unavailable",
            UseCase::Feedback => "Resume analysis temporarily unavailable",
        };
        Self {
            use_case,
            message,
            attempts,
        }
    }

    /// The underlying failure of the final candidate.
    pub fn last_error(&self) -> Option<&AttemptFailure> {
        self.attempts.last()
    }
}

/// A successful orchestration, with the failures absorbed along the way.
#[derive(Debug)]
pub struct Completion<R> {
    pub response: R,
    pub model: String,
    pub failures: Vec<AttemptFailure>,
}

/// Stateless between calls; one value can serve any number of concurrent `execute`s.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    use_case: UseCase,
    backoff: Backoff,
    attempt_timeout: Option<Duration>,
}

impl Orchestrator {
    pub fn new(use_case: UseCase) -> Self {
        Self {
            use_case,
            backoff: Backoff::for_use_case(use_case),
            attempt_timeout: None,
        }
    }

    /// Bounds each attempt. An attempt that runs over counts as a `ServerError`.
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    pub fn use_case(&self) -> UseCase {
        self.use_case
    }

    /// Attempts each candidate in order through `send` until one succeeds.
    ///
    /// `send` performs exactly one outbound call for the given model; the payload
    /// is whatever the closure captured. Each model is attempted at most once.
    pub async fn execute<R, E, F, Fut>(
        &self,
        candidates: &[String],
        mut send: F,
    ) -> Result<Completion<R>, TerminalError>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: Display,
    {
        let label = self.use_case.label();
        let total = candidates.len();
        let mut failures: Vec<AttemptFailure> = Vec::new();

        for (index, model) in candidates.iter().enumerate() {
            let descriptor = find_model(model);
            let provider = descriptor.map(|d| d.provider).unwrap_or("custom");
            let tier = descriptor.map_or("uncatalogued", |d| d.tier.as_str());
            info!(
                "[{label}] Attempting {provider} {model} ({tier}) - {}/{total}",
                index + 1
            );

            let outcome = match self.attempt_timeout {
                Some(limit) => match tokio::time::timeout(limit, send(model.clone())).await {
                    Ok(result) => result.map_err(|e| self.failure(model, e.to_string())),
                    Err(_) => Err(AttemptFailure {
                        model: model.clone(),
                        kind: FailureKind::ServerError,
                        message: format!(
                            "timeout after {}ms waiting for {model}",
                            limit.as_millis()
                        ),
                    }),
                },
                None => send(model.clone())
                    .await
                    .map_err(|e| self.failure(model, e.to_string())),
            };

            let failure = match outcome {
                Ok(response) => {
                    info!("[{label}] Successfully connected to {provider} {model}");
                    return Ok(Completion {
                        response,
                        model: model.clone(),
                        failures,
                    });
                }
                Err(failure) => failure,
            };

            warn!(
                kind = ?failure.kind,
                "[{label}] {provider} {model} failed: {}",
                failure.message
            );
            match failure.kind {
                FailureKind::RateLimited => {
                    info!("[{label}] Rate limit reached for {model}, switching to backup model")
                }
                FailureKind::ServerError => {
                    info!("[{label}] Server error detected for {model}, trying alternative service")
                }
                FailureKind::Other => {
                    info!("[{label}] Connection failed for {model}, trying alternative provider")
                }
            }
            failures.push(failure);

            if index + 1 < total {
                let delay = self.backoff.delay_after(index);
                debug!("[{label}] Waiting {}ms before next candidate", delay.as_millis());
                tokio::time::sleep(delay).await;
            }
        }

        match failures.last() {
            Some(last) => error!(
                "[{label}] All AI providers exhausted. Final error from {}: {}",
                last.model, last.message
            ),
            None => error!("[{label}] No candidate models to attempt"),
        }
        Err(TerminalError::exhausted(self.use_case, failures))
    }

    fn failure(&self, model: &str, message: String) -> AttemptFailure {
        AttemptFailure {
            model: model.to_string(),
            kind: classify_failure(self.use_case, &message),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;

    fn candidates(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    /// Runs `execute` with a scripted transport and returns (result, calls with
    /// their offsets from the start).
    async fn run_scripted(
        orchestrator: &Orchestrator,
        list: &[String],
        script: fn(&str) -> Result<&'static str, String>,
    ) -> (
        Result<Completion<&'static str>, TerminalError>,
        Vec<(String, Duration)>,
    ) {
        let start = Instant::now();
        let mut calls = Vec::new();
        let result = orchestrator
            .execute(list, |model| {
                calls.push((model.clone(), start.elapsed()));
                let outcome = script(&model);
                async move { outcome }
            })
            .await;
        (result, calls)
    }

    fn delays(calls: &[(String, Duration)]) -> Vec<u128> {
        calls
            .windows(2)
            .map(|w| (w[1].1 - w[0].1).as_millis())
            .collect()
    }

    #[test]
    fn test_classify_rate_limit() {
        assert_eq!(
            classify_failure(UseCase::Feedback, "Rate limit exceeded"),
            FailureKind::RateLimited
        );
        assert_eq!(
            classify_failure(UseCase::Chat, "Monthly QUOTA reached"),
            FailureKind::RateLimited
        );
        assert_eq!(
            classify_failure(UseCase::Chat, "usage cap hit"),
            FailureKind::RateLimited
        );
    }

    #[test]
    fn test_classify_server_error_feedback_only() {
        assert_eq!(
            classify_failure(UseCase::Feedback, "503 Service Unavailable"),
            FailureKind::ServerError
        );
        assert_eq!(
            classify_failure(UseCase::Feedback, "gateway timeout"),
            FailureKind::ServerError
        );
        assert_eq!(
            classify_failure(UseCase::Chat, "503 Service Unavailable"),
            FailureKind::Other
        );
    }

    #[test]
    fn test_classify_rate_limit_wins_over_server_error() {
        assert_eq!(
            classify_failure(UseCase::Feedback, "502 from server: rate limited"),
            FailureKind::RateLimited
        );
    }

    #[test]
    fn test_classify_other() {
        assert_eq!(
            classify_failure(UseCase::Feedback, "invalid request"),
            FailureKind::Other
        );
    }

    #[test]
    fn test_feedback_backoff_schedule() {
        let backoff = Backoff::for_use_case(UseCase::Feedback);
        let schedule: Vec<u128> = (0..7).map(|i| backoff.delay_after(i).as_millis()).collect();
        assert_eq!(schedule, vec![1000, 2000, 4000, 5000, 5000, 5000, 5000]);
    }

    #[test]
    fn test_chat_backoff_is_fixed() {
        let backoff = Backoff::for_use_case(UseCase::Chat);
        for i in 0..12 {
            assert_eq!(backoff.delay_after(i), Duration::from_millis(500));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_success_wins_in_order() {
        let list = candidates(&["a", "b", "c", "d"]);
        let (result, calls) = run_scripted(&Orchestrator::new(UseCase::Chat), &list, |m| match m {
            "a" | "b" => Err("invalid request".to_string()),
            _ => Ok("from-c-or-later"),
        })
        .await;

        let completion = result.unwrap();
        assert_eq!(completion.model, "c");
        assert_eq!(completion.response, "from-c-or-later");
        assert_eq!(completion.failures.len(), 2);
        let order: Vec<_> = calls.iter().map(|(m, _)| m.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_candidate_makes_one_call() {
        let list = candidates(&["a", "b"]);
        let (result, calls) =
            run_scripted(&Orchestrator::new(UseCase::Feedback), &list, |_| Ok("ok")).await;
        assert!(result.unwrap().failures.is_empty());
        assert_eq!(calls.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_calls_each_candidate_once() {
        let list = candidates(&["a", "b", "c"]);
        let (result, calls) = run_scripted(&Orchestrator::new(UseCase::Chat), &list, |m| {
            Err(format!("{m} exploded"))
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(calls.len(), 3);
        assert_eq!(err.attempts.len(), 3);
        assert_eq!(err.last_error().unwrap().message, "c exploded");
        assert_eq!(err.to_string(), "AI service temporarily unavailable");
        // No delay after the final failure
        assert_eq!(delays(&calls), vec![500, 500]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_feedback_delays_follow_exponential_schedule() {
        let list = candidates(&["a", "b", "c", "d", "e", "f", "g"]);
        let (result, calls) = run_scripted(&Orchestrator::new(UseCase::Feedback), &list, |_| {
            Err("503".to_string())
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "Resume analysis temporarily unavailable");
        assert_eq!(delays(&calls), vec![1000, 2000, 4000, 5000, 5000, 5000]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_to_end_rate_limit_then_server_error_then_success() {
        let list = candidates(&["m1", "m2", "m3"]);
        let (result, calls) = run_scripted(&Orchestrator::new(UseCase::Feedback), &list, |m| {
            match m {
                "m1" => Err("429 rate limit".to_string()),
                "m2" => Err("upstream 503 timeout".to_string()),
                _ => Ok("ok"),
            }
        })
        .await;

        let completion = result.unwrap();
        assert_eq!(completion.response, "ok");
        assert_eq!(calls.len(), 3);
        assert_eq!(delays(&calls), vec![1000, 2000]);
        let kinds: Vec<_> = completion.failures.iter().map(|f| f.kind).collect();
        assert_eq!(kinds, vec![FailureKind::RateLimited, FailureKind::ServerError]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_candidate_list_is_terminal() {
        let (result, calls) =
            run_scripted(&Orchestrator::new(UseCase::Chat), &[], |_| Ok("never")).await;
        let err = result.unwrap_err();
        assert!(err.attempts.is_empty());
        assert!(calls.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_timeout_moves_to_next_candidate() {
        let orchestrator =
            Orchestrator::new(UseCase::Chat).with_attempt_timeout(Duration::from_secs(5));
        let list = candidates(&["slow", "fast"]);

        let result = orchestrator
            .execute(&list, |model| async move {
                if model == "slow" {
                    tokio::time::sleep(Duration::from_secs(600)).await;
                }
                Ok::<_, String>(model)
            })
            .await;

        let completion = result.unwrap();
        assert_eq!(completion.response, "fast");
        assert_eq!(completion.failures[0].kind, FailureKind::ServerError);
        assert!(completion.failures[0].message.contains("timeout"));
    }
}
