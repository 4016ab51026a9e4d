//! Portable error values
//!
//! Errors cross the serialization boundary as [`ThrowableValue`]: the error's
//! type name, its message and the chain of causes, outermost first.

use std::error::Error as StdError;
use std::fmt;

/// Serializable capture of an error and its cause chain
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThrowableValue {
    type_name: String,
    message: Option<String>,
    cause: Option<Box<ThrowableValue>>,
}

impl ThrowableValue {
    /// Build a throwable with no cause
    pub fn new(type_name: impl Into<String>, message: Option<String>) -> Self {
        ThrowableValue {
            type_name: type_name.into(),
            message,
            cause: None,
        }
    }

    /// Attach a cause
    pub fn with_cause(mut self, cause: ThrowableValue) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Capture an error and everything reachable through `source()`
    ///
    /// A sized `E` is labelled with its type name. Trait objects and every
    /// link of the source chain use their `Debug` head instead, since the
    /// concrete type behind a `dyn Error` is not recoverable.
    pub fn capture<E: StdError + ?Sized>(error: &E) -> Self {
        let outer = std::any::type_name::<E>();
        let label = if outer.starts_with("dyn ") {
            debug_label(error)
        } else {
            outer.to_string()
        };
        let mut chain = vec![ThrowableValue::new(label, Some(error.to_string()))];
        let mut source = error.source();
        while let Some(cause) = source {
            chain.push(ThrowableValue::new(debug_label(cause), Some(cause.to_string())));
            source = cause.source();
        }
        let mut iter = chain.into_iter().rev();
        let mut current = iter.next().unwrap_or_else(|| ThrowableValue::new("unknown", None));
        for outer in iter {
            current = outer.with_cause(current);
        }
        current
    }

    /// Error type label
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Error message
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Direct cause
    pub fn cause(&self) -> Option<&ThrowableValue> {
        self.cause.as_deref()
    }

    /// This throwable followed by its causes
    pub fn chain(&self) -> impl Iterator<Item = &ThrowableValue> {
        std::iter::successors(Some(self), |t| t.cause.as_deref())
    }
}

fn debug_label<E: fmt::Debug + ?Sized>(error: &E) -> String {
    let debug = format!("{:?}", error);
    debug
        .split(|c: char| !(c.is_alphanumeric() || c == '_' || c == ':'))
        .next()
        .filter(|head| !head.is_empty())
        .unwrap_or("error")
        .to_string()
}

impl fmt::Display for ThrowableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.type_name, message)?,
            None => f.write_str(&self.type_name)?,
        }
        if let Some(cause) = &self.cause {
            write!(f, "; caused by {}", cause)?;
        }
        Ok(())
    }
}

impl StdError for ThrowableValue {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_deref().map(|c| c as &(dyn StdError + 'static))
    }
}
