use crate::core::retry::{calculate_delay, BackoffPolicy, RetryConfig, RetryPolicy};
use crate::core::ScraperError;
use crate::parser::ParseError;
use crate::stats::StatsTracker;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn fast_policy(max_attempts: usize) -> RetryPolicy {
    RetryPolicy::new(
        RetryConfig::default()
            .with_max_attempts(max_attempts)
            .with_base_delay(Duration::from_millis(1)),
    )
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let calls = Arc::new(RwLock::new(0usize));
    let policy = fast_policy(10);

    let counter = Arc::clone(&calls);
    let result = policy
        .run("history", || {
            let counter = Arc::clone(&counter);
            async move {
                let mut count = counter.write();
                *count += 1;
                if *count < 3 {
                    Err(ScraperError::transient("history", "table empty"))
                } else {
                    Ok(vec![1, 2, 3])
                }
            }
        })
        .await
        .unwrap();

    assert_eq!(result, vec![1, 2, 3]);
    assert_eq!(*calls.read(), 3);
}

#[tokio::test]
async fn test_exhaustion_reports_operation_and_attempts() {
    let calls = Arc::new(RwLock::new(0usize));
    let policy = fast_policy(4);

    let counter = Arc::clone(&calls);
    let error = policy
        .run("fixtures", || {
            let counter = Arc::clone(&counter);
            async move {
                *counter.write() += 1;
                Err::<(), _>(ScraperError::transient("fixtures", "tbody missing"))
            }
        })
        .await
        .unwrap_err();

    assert_eq!(*calls.read(), 4);
    match error {
        ScraperError::ExtractionExhausted {
            operation,
            attempts,
            last_error,
        } => {
            assert_eq!(operation, "fixtures");
            assert_eq!(attempts, 4);
            assert!(last_error.is_transient());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_parse_errors_are_not_retried() {
    let calls = Arc::new(RwLock::new(0usize));
    let policy = fast_policy(10);

    let counter = Arc::clone(&calls);
    let error = policy
        .run("season_stats", || {
            let counter = Arc::clone(&counter);
            async move {
                *counter.write() += 1;
                Err::<(), _>(ScraperError::Parse(ParseError::ColumnCount {
                    table: "gameweek_stats",
                    expected: 29,
                    actual: 12,
                }))
            }
        })
        .await
        .unwrap_err();

    assert_eq!(*calls.read(), 1);
    assert!(matches!(error, ScraperError::Parse(_)));
}

#[tokio::test]
async fn test_linear_backoff_waits_between_attempts() {
    let policy = RetryPolicy::new(
        RetryConfig::default()
            .with_max_attempts(3)
            .with_base_delay(Duration::from_millis(20)),
    );

    let start = Instant::now();
    let _ = policy
        .run("summary", || async {
            Err::<(), _>(ScraperError::transient("summary", "not yet"))
        })
        .await;

    // 20ms before the 2nd attempt, 40ms before the 3rd
    assert!(start.elapsed() >= Duration::from_millis(60));
}

#[tokio::test]
async fn test_retries_are_recorded_in_stats() {
    let stats = Arc::new(StatsTracker::new());
    let policy = fast_policy(3).with_stats(Arc::clone(&stats));

    let _ = policy
        .run("fixtures", || async {
            Err::<(), _>(ScraperError::transient("fixtures", "not yet"))
        })
        .await;

    let snapshot = stats.get_stats();
    assert_eq!(snapshot.retry_count, 2);
    assert_eq!(snapshot.retry_reasons.get("fixtures"), Some(&2));
}

#[test]
fn test_delay_calculation() {
    let linear = RetryConfig::default().with_base_delay(Duration::from_millis(100));
    assert_eq!(calculate_delay(&linear, 1), Duration::from_millis(100));
    assert_eq!(calculate_delay(&linear, 4), Duration::from_millis(400));

    let capped = linear.clone().with_max_delay(Duration::from_millis(250));
    assert_eq!(calculate_delay(&capped, 9), Duration::from_millis(250));

    let constant = linear.clone().with_backoff(BackoffPolicy::Constant);
    assert_eq!(calculate_delay(&constant, 5), Duration::from_millis(100));

    let exponential = linear.with_backoff(BackoffPolicy::Exponential { factor: 2.0 });
    let third = calculate_delay(&exponential, 3).as_millis();
    assert!((399..=401).contains(&third));
}
