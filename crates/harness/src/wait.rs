//! Wait-until-predicate primitive
//!
//! Animation-dependent assertions (opacity, transforms, scroll position)
//! must poll until the predicate holds or the budget elapses. A timeout with
//! the predicate still false is an assertion failure, not an error; fixed
//! sleeps are never used.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use sitecheck_common::Result;

/// Outcome of a wait loop, carrying the last observed value for diagnostics.
#[derive(Debug)]
pub enum WaitOutcome {
    Satisfied(serde_json::Value),
    TimedOut(serde_json::Value),
}

/// Poll `probe` every `interval` until it reports satisfied or `budget`
/// elapses. The probe always runs at least once; probe errors propagate.
pub async fn wait_until<F, Fut>(
    budget: Duration,
    interval: Duration,
    mut probe: F,
) -> Result<WaitOutcome>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(bool, serde_json::Value)>>,
{
    let start = Instant::now();
    loop {
        let (satisfied, observed) = probe().await?;
        if satisfied {
            return Ok(WaitOutcome::Satisfied(observed));
        }
        if start.elapsed() >= budget {
            return Ok(WaitOutcome::TimedOut(observed));
        }
        sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn test_satisfied_on_later_poll() {
        let mut calls = 0;
        let outcome = wait_until(
            Duration::from_millis(500),
            Duration::from_millis(100),
            || {
                calls += 1;
                let ready = calls >= 3;
                async move { Ok((ready, json!(ready))) }
            },
        )
        .await
        .unwrap();

        assert!(matches!(outcome, WaitOutcome::Satisfied(v) if v == json!(true)));
        assert_eq!(calls, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_reports_last_observation() {
        let outcome = wait_until(
            Duration::from_millis(300),
            Duration::from_millis(100),
            || async { Ok((false, json!("still-french"))) },
        )
        .await
        .unwrap();

        assert!(matches!(outcome, WaitOutcome::TimedOut(v) if v == json!("still-french")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_runs_at_least_once_with_zero_budget() {
        let outcome = wait_until(Duration::ZERO, Duration::from_millis(50), || async {
            Ok((true, json!(1)))
        })
        .await
        .unwrap();

        assert!(matches!(outcome, WaitOutcome::Satisfied(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_error_propagates() {
        let err = wait_until(
            Duration::from_millis(100),
            Duration::from_millis(10),
            || async {
                Err::<(bool, serde_json::Value), _>(sitecheck_common::Error::Browser(
                    "gone".into(),
                ))
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, sitecheck_common::Error::Browser(_)));
    }
}
