use serde_json::{Map, Value};
use std::error::Error;
use std::sync::Arc;

/// Diagnostic sink: `(message, error, context)`.
///
/// Invoked when the store fails while starting, loading, saving or destroying a
/// session. The failure is still propagated to the caller afterwards.
pub type ReportHook = Arc<dyn Fn(&str, &(dyn Error + Send + Sync), Value) + Send + Sync>;

/// Report hook used when none is configured; logs through `tracing`.
pub fn default_report() -> ReportHook {
    Arc::new(|message: &str, err: &(dyn Error + Send + Sync), context: Value| {
        tracing::error!(context = %context, "{}: {}", message, err);
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    Loaded,
}

pub(crate) fn empty_payload() -> Value {
    Value::Object(Map::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;
    use std::sync::Mutex;

    #[test]
    fn test_empty_payload_is_object() {
        assert_eq!(empty_payload(), serde_json::json!({}));
    }

    #[test]
    fn test_report_hook_receives_arguments() {
        // Given a hook capturing its calls
        let calls: Arc<Mutex<Vec<(String, String, Value)>>> = Arc::new(Mutex::new(Vec::new()));
        let captured = calls.clone();
        let hook: ReportHook = Arc::new(
            move |message: &str, err: &(dyn Error + Send + Sync), context: Value| {
                captured
                    .lock()
                    .unwrap()
                    .push((message.to_string(), err.to_string(), context));
            },
        );

        // When invoking it
        let err = StorageError::Storage("down".to_string());
        hook("Failed", &err, serde_json::json!({"sid": "x"}));

        // Then the arguments are passed through
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "Failed");
        assert_eq!(calls[0].1, "Storage error: down");
        assert_eq!(calls[0].2["sid"], "x");
    }

    #[test]
    fn test_default_report_does_not_panic() {
        let hook = default_report();
        hook(
            "Failed to load session from cache",
            &StorageError::Storage("down".to_string()),
            Value::Null,
        );
    }
}
