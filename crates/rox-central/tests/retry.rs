use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use reqwest::Method;
use rox_central::RemoteError;
use rox_central::rest::retry_policy;
use rox_central::retry::{RetryConfig, RetryPolicy, retry_with_backoff, retry_with_policy};

fn fast(attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts: attempts,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(2),
        backoff_multiplier: 2.0,
    }
}

#[tokio::test]
async fn retries_transient_failures_until_success() {
    let calls = AtomicU32::new(0);
    let result = retry_with_backoff(&fast(3), "test", || async {
        if calls.fetch_add(1, Ordering::SeqCst) < 2 {
            Err(RemoteError::Unavailable("try again".into()))
        } else {
            Ok("done")
        }
    })
    .await;
    assert_eq!(result.unwrap(), "done");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn gives_up_after_max_attempts() {
    let calls = AtomicU32::new(0);
    let result: Result<(), _> = retry_with_backoff(&fast(3), "test", || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(RemoteError::Transport("connection reset".into()))
    })
    .await;
    assert!(matches!(result, Err(RemoteError::Transport(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn does_not_retry_terminal_errors() {
    let calls = AtomicU32::new(0);
    let result: Result<(), _> = retry_with_backoff(&fast(5), "test", || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(RemoteError::NotFound("gone".into()))
    })
    .await;
    assert!(matches!(result, Err(RemoteError::NotFound(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn non_idempotent_calls_are_not_resent_after_reaching_central() {
    let created = AtomicU32::new(0);
    let result: Result<(), _> =
        retry_with_policy(&fast(3), RetryPolicy::NonIdempotent, "PostCluster", || async {
            created.fetch_add(1, Ordering::SeqCst);
            Err(RemoteError::Transport("error decoding response body".into()))
        })
        .await;
    assert!(matches!(result, Err(RemoteError::Transport(_))));
    assert_eq!(created.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn non_idempotent_calls_are_resent_when_never_delivered() {
    let calls = AtomicU32::new(0);
    let result = retry_with_policy(&fast(3), RetryPolicy::NonIdempotent, "PostCluster", || async {
        if calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(RemoteError::Connect("connection refused".into()))
        } else {
            Ok("created")
        }
    })
    .await;
    assert_eq!(result.unwrap(), "created");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn retry_policy_follows_http_method() {
    assert_eq!(retry_policy(&Method::GET), RetryPolicy::Idempotent);
    assert_eq!(retry_policy(&Method::PUT), RetryPolicy::Idempotent);
    assert_eq!(retry_policy(&Method::DELETE), RetryPolicy::Idempotent);
    assert_eq!(retry_policy(&Method::POST), RetryPolicy::NonIdempotent);
    assert_eq!(retry_policy(&Method::PATCH), RetryPolicy::NonIdempotent);

    let gateway = RemoteError::Unavailable("502 bad gateway".into());
    assert!(RetryPolicy::Idempotent.allows(&gateway));
    assert!(!RetryPolicy::NonIdempotent.allows(&gateway));
}
