//! Fan-out to several alert backends.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;

use crate::alert::{Alert, AlertError, AlertSink};

/// Sends each alert to every backend concurrently.
///
/// Every backend is attempted regardless of the others' results; failures
/// are logged individually and reported together as [`AlertError::Partial`].
pub struct FanoutSink {
    backends: Vec<Arc<dyn AlertSink>>,
}

impl FanoutSink {
    pub fn new(backends: Vec<Arc<dyn AlertSink>>) -> Self {
        Self { backends }
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

#[async_trait]
impl AlertSink for FanoutSink {
    async fn send_alert(&self, alert: &Alert) -> Result<(), AlertError> {
        let results = join_all(self.backends.iter().map(|b| b.send_alert(alert))).await;

        let errors: Vec<String> = results
            .into_iter()
            .filter_map(|r| r.err())
            .map(|e| {
                tracing::warn!(error = %e, subject = %alert.subject, "Alert backend failed");
                e.to_string()
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AlertError::Partial {
                failed: errors.len(),
                total: self.backends.len(),
                errors,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting(AtomicUsize);

    #[async_trait]
    impl AlertSink for Counting {
        async fn send_alert(&self, _alert: &Alert) -> Result<(), AlertError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Broken;

    #[async_trait]
    impl AlertSink for Broken {
        async fn send_alert(&self, _alert: &Alert) -> Result<(), AlertError> {
            Err(AlertError::Status { backend: "broken", status: 503 })
        }
    }

    #[tokio::test]
    async fn test_failure_does_not_suppress_other_backends() {
        let healthy = Arc::new(Counting(AtomicUsize::new(0)));
        let sink = FanoutSink::new(vec![
            Arc::new(Broken) as Arc<dyn AlertSink>,
            healthy.clone() as Arc<dyn AlertSink>,
        ]);

        let err = sink.send_alert(&Alert::new("s", "b")).await.unwrap_err();

        assert_eq!(healthy.0.load(Ordering::SeqCst), 1);
        match err {
            AlertError::Partial { failed, total, errors } => {
                assert_eq!(failed, 1);
                assert_eq!(total, 2);
                assert!(errors[0].contains("503"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_all_backends_succeed() {
        let a = Arc::new(Counting(AtomicUsize::new(0)));
        let b = Arc::new(Counting(AtomicUsize::new(0)));
        let sink = FanoutSink::new(vec![a.clone() as Arc<dyn AlertSink>, b.clone() as Arc<dyn AlertSink>]);

        sink.send_alert(&Alert::new("s", "b")).await.unwrap();

        assert_eq!(a.0.load(Ordering::SeqCst), 1);
        assert_eq!(b.0.load(Ordering::SeqCst), 1);
    }
}
