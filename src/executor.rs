//! Target invocation
//!
//! Calls a bound target with a case's raw input. Whatever goes wrong inside
//! the target, an `Err` or a panic, comes back as an [`InvocationFailure`];
//! nothing propagates to the caller. No retries, no caching.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::registry::Target;
use crate::value::ValueMap;

/// How a target invocation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The target returned an error
    Error,
    /// The target panicked
    Panic,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Error => write!(f, "error"),
            FailureKind::Panic => write!(f, "panic"),
        }
    }
}

/// Summary of a failed invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl fmt::Display for InvocationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Invoke a target with exactly the given input
pub fn invoke(target: &dyn Target, input: &str) -> Result<ValueMap, InvocationFailure> {
    match panic::catch_unwind(AssertUnwindSafe(|| target.invoke(input))) {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(InvocationFailure {
            kind: FailureKind::Error,
            message: error_chain(&*e),
        }),
        Err(payload) => Err(InvocationFailure {
            kind: FailureKind::Panic,
            message: panic_message(&*payload),
        }),
    }
}

/// Render an error with its sources, outermost first
fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "target panicked with a non-string payload".to_string()
    }
}
