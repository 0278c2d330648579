use thiserror::Error;

#[derive(Error, Debug)]
pub enum JscopeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parsing error: {0}")]
    Parsing(String),
    #[error("Structure error: {0}")]
    Structure(#[from] StructureError),
    #[error("Class info unavailable: {0}")]
    ClassInfo(String),
    #[error("Class path error: {0}")]
    ClassPath(String),
}

/// Violations of the scope discipline detected while building a source tree.
///
/// These indicate a grammar that emitted an inconsistent event stream; they are
/// never raised for malformed Java input, which is reported through error events.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error("scope stack underflow while handling {event}")]
    ScopeUnderflow { event: &'static str },
    #[error("{kind} node would end at {end}, before its start at {start}")]
    NegativeSpan {
        kind: &'static str,
        start: usize,
        end: usize,
    },
    #[error("unexpected {event}: {reason}")]
    UnexpectedEvent { event: &'static str, reason: String },
    #[error("{open} scope(s) still open at the end of the compilation unit")]
    UnbalancedScopes { open: usize },
    #[error("{kind} node at {offset}: {detail}")]
    Containment {
        kind: &'static str,
        offset: usize,
        detail: String,
    },
}

pub type Result<T> = std::result::Result<T, JscopeError>;
