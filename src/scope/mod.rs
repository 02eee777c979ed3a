//! Request-scoped context (the logging-context counterpart).
//!
//! # Data Flow
//! ```text
//! Request begin
//!     → layer.rs (open scope, span carries the transaction id)
//!     → registered ScopeItems begin, in registration order
//!     → handler chain runs inside the span
//! Request complete (success, error, or cancellation)
//!     → ScopeItems end, in reverse order, exactly once
//! ```
//!
//! # Design Decisions
//! - The context is an explicit per-request object owned by the request
//!   future, never ambient thread-local state; pooled workers cannot leak
//!   one request's context into the next by construction
//! - Cleanup rides a drop guard so error and cancellation paths are covered

pub mod layer;
pub mod transaction;

use std::sync::Arc;

use axum::http::Extensions;

pub use layer::RequestScopeLayer;
pub use transaction::{TransactionId, TransactionIdItem};

/// Per-request key-value context, alive from request begin to completion.
#[derive(Debug, Default)]
pub struct ScopeContext {
    values: Extensions,
}

impl ScopeContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.values.insert(value)
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.values.get()
    }

    pub fn remove<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.values.remove()
    }
}

/// A named participant in the request scope.
///
/// Items are invoked inside the same begin/complete window as the request:
/// `begin` in registration order when the request starts, `end` in reverse
/// order when it completes. `end` runs exactly once per request, on every
/// exit path.
pub trait ScopeItem: Send + Sync {
    fn begin(&self, cx: &mut ScopeContext);
    fn end(&self, cx: &mut ScopeContext);
}

/// An ordered registry of scope items.
#[derive(Clone, Default)]
pub struct RequestScope {
    items: Arc<Vec<(String, Arc<dyn ScopeItem>)>>,
}

impl RequestScope {
    pub fn new(items: Vec<(String, Arc<dyn ScopeItem>)>) -> Self {
        Self {
            items: Arc::new(items),
        }
    }

    /// Registered item names, in registration order.
    pub fn item_names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|(name, _)| name.as_str())
    }

    /// Begin all items and return the guard that ends them.
    pub fn open(&self) -> ActiveScope {
        let mut cx = ScopeContext::new();
        for (_, item) in self.items.iter() {
            item.begin(&mut cx);
        }
        ActiveScope {
            scope: self.clone(),
            cx: Some(cx),
        }
    }
}

/// An open request scope. Dropping it runs every item's `end` exactly once,
/// in reverse registration order.
pub struct ActiveScope {
    scope: RequestScope,
    cx: Option<ScopeContext>,
}

impl ActiveScope {
    pub fn context(&self) -> &ScopeContext {
        // The context is only taken on close, which consumes self via Drop.
        self.cx.as_ref().unwrap()
    }
}

impl Drop for ActiveScope {
    fn drop(&mut self) {
        if let Some(mut cx) = self.cx.take() {
            for (_, item) in self.scope.items.iter().rev() {
                item.end(&mut cx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl ScopeItem for Recorder {
        fn begin(&self, _cx: &mut ScopeContext) {
            self.log.lock().unwrap().push(format!("{}:begin", self.name));
        }

        fn end(&self, _cx: &mut ScopeContext) {
            self.log.lock().unwrap().push(format!("{}:end", self.name));
        }
    }

    fn recording_scope(log: &Arc<Mutex<Vec<String>>>) -> RequestScope {
        RequestScope::new(vec![
            (
                "a".to_string(),
                Arc::new(Recorder {
                    name: "a",
                    log: log.clone(),
                }) as Arc<dyn ScopeItem>,
            ),
            (
                "b".to_string(),
                Arc::new(Recorder {
                    name: "b",
                    log: log.clone(),
                }) as Arc<dyn ScopeItem>,
            ),
        ])
    }

    #[test]
    fn test_begin_in_order_end_in_reverse() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let scope = recording_scope(&log);

        let active = scope.open();
        drop(active);

        let entries = log.lock().unwrap();
        assert_eq!(*entries, vec!["a:begin", "b:begin", "b:end", "a:end"]);
    }

    #[test]
    fn test_every_end_runs_once_per_request() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let scope = recording_scope(&log);

        for _ in 0..3 {
            drop(scope.open());
        }

        let entries = log.lock().unwrap();
        assert_eq!(entries.len(), 12);
        let ends = entries.iter().filter(|e| e.ends_with(":end")).count();
        assert_eq!(ends, 6);
    }

    #[test]
    fn test_context_values_visible_while_active() {
        let scope = RequestScope::new(vec![(
            "transaction".to_string(),
            Arc::new(TransactionIdItem) as Arc<dyn ScopeItem>,
        )]);

        let active = scope.open();
        assert!(active.context().get::<TransactionId>().is_some());
    }
}
