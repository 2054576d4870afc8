//! Error types for the XFA field mapper.
//!
//! This module defines all error types that can occur while building
//! skeletons, classifying fields, translating paths, and moving values
//! between field trees and XFA data trees.

/// Result type alias for field mapper operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during XFA field mapping.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Template stream lacks a resolvable root binding or is not well-formed
    #[error("Malformed XFA template: {0}")]
    MalformedXfaTemplate(String),

    /// An intermediate path segment is not defined by the supplied template
    #[error("Path not found in template schema: {path}")]
    PathNotFoundInSchema {
        /// Offending JSON-style path
        path: String,
    },

    /// Field tree top-level key disagrees with the data tree root
    #[error("Base tag mismatch: expected '{expected}', found '{found}'")]
    BaseTagMismatch {
        /// Base tag the caller asked for
        expected: String,
        /// Base tag actually present
        found: String,
    },

    /// A choice/date/time control is missing its option list or picture clause
    #[error("Cannot infer field type at {path}: {reason}")]
    TypeInferenceFailure {
        /// Path of the affected leaf
        path: String,
        /// What metadata was missing
        reason: String,
    },

    /// Negative or otherwise invalid index in a path
    #[error("Index out of range in '{path}': {index}")]
    IndexOutOfRange {
        /// Path containing the index
        path: String,
        /// The rejected index text
        index: String,
    },

    /// Path text does not follow the JSON or XFA path grammar
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Field tree does not have the expected wire shape
    #[error("Invalid field tree: {0}")]
    InvalidFieldTree(String),

    /// XML parse or serialization failure
    #[error("XML error: {0}")]
    Xml(String),

    /// Requested XFA packet is not present in the container
    #[error("XFA packet not found: {0}")]
    MissingPacket(String),

    /// Packet name outside the known set
    #[error("Unknown XFA packet name: {0}")]
    UnknownPacket(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 decoding error
    #[error("UTF-8 decoding error: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_tag_mismatch_error() {
        let err = Error::BaseTagMismatch {
            expected: "form1".to_string(),
            found: "IMM_0800".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("form1"));
        assert!(msg.contains("IMM_0800"));
    }

    #[test]
    fn test_path_not_found_error() {
        let err = Error::PathNotFoundInSchema {
            path: "form1.Page9.Name".to_string(),
        };
        assert!(format!("{}", err).contains("form1.Page9.Name"));
    }

    #[test]
    fn test_index_out_of_range_error() {
        let err = Error::IndexOutOfRange {
            path: "Items[-1]".to_string(),
            index: "-1".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Items[-1]"));
        assert!(msg.contains("-1"));
    }

    #[test]
    fn test_type_inference_failure_error() {
        let err = Error::TypeInferenceFailure {
            path: "form1.Country".to_string(),
            reason: "choice list has no items".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("form1.Country"));
        assert!(msg.contains("no items"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
