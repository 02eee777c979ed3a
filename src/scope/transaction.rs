//! Per-request transaction ids.

use std::fmt;

use uuid::Uuid;

use crate::scope::{ScopeContext, ScopeItem};

/// An opaque id unique to one request.
///
/// Generated at request begin, visible to handlers through the request
/// extensions and to logs through the request span, and gone when the
/// request completes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The built-in scope item issuing a fresh [`TransactionId`] per request.
pub struct TransactionIdItem;

impl ScopeItem for TransactionIdItem {
    fn begin(&self, cx: &mut ScopeContext) {
        cx.insert(TransactionId::generate());
    }

    fn end(&self, cx: &mut ScopeContext) {
        cx.remove::<TransactionId>();
    }
}
