use crate::ast::Location;
use serde::Serialize;

/// A failure to parse or link a set of `.thrift` files.
///
/// There is no partial success: the first error aborts the whole load.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ThriftError {
    /// Malformed input in a single file.
    #[error("Syntax error in {location}: {message}")]
    Syntax { location: Location, message: String },

    /// Unresolved symbol, duplicate name, circular typedef or include, or
    /// an otherwise ill-formed program.
    #[error("Link error in {location}: {message}")]
    Link { location: Location, message: String },

    /// A source file could not be located or read.
    #[error("cannot read {path}: {message}")]
    Io { path: String, message: String },
}

impl ThriftError {
    pub fn syntax(location: Location, message: impl Into<String>) -> Self {
        ThriftError::Syntax {
            location,
            message: message.into(),
        }
    }

    pub fn link(location: &Location, message: impl Into<String>) -> Self {
        ThriftError::Link {
            location: location.clone(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<String>, err: &std::io::Error) -> Self {
        ThriftError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ThriftError::Syntax { message, .. }
            | ThriftError::Link { message, .. }
            | ThriftError::Io { message, .. } => message,
        }
    }

    pub fn location(&self) -> Option<&Location> {
        match self {
            ThriftError::Syntax { location, .. } | ThriftError::Link { location, .. } => {
                Some(location)
            }
            ThriftError::Io { .. } => None,
        }
    }

    /// Flat JSON form for tooling. Always includes every key, `null` when
    /// the error has no source position.
    pub fn to_json_value(&self) -> serde_json::Value {
        let kind = match self {
            ThriftError::Syntax { .. } => "syntax",
            ThriftError::Link { .. } => "link",
            ThriftError::Io { .. } => "io",
        };
        let (file, line, column) = match self {
            ThriftError::Syntax { location, .. } | ThriftError::Link { location, .. } => (
                Some(location.file.clone()),
                Some(location.line),
                Some(location.column),
            ),
            ThriftError::Io { path, .. } => (Some(path.clone()), None, None),
        };
        serde_json::json!({
            "column":  column,
            "file":    file,
            "kind":    kind,
            "line":    line,
            "message": self.message(),
        })
    }
}
