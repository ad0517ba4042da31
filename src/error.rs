//! Error types for loading and comparing arrays

use std::path::PathBuf;

/// Errors raised while decoding an NPY stream
#[derive(thiserror::Error, Debug)]
pub enum NpyError {
    /// Stream does not start with `\x93NUMPY`
    #[error("Invalid NPY magic number")]
    InvalidMagic,
    /// Format version other than 1.x, 2.x or 3.x
    #[error("Unsupported NPY version: {0}.{1}")]
    UnsupportedVersion(u8, u8),
    /// Header dictionary could not be parsed
    #[error("Malformed NPY header: {0}")]
    MalformedHeader(String),
    /// Element type is not a plain numeric dtype
    #[error("Unsupported dtype: {0}")]
    UnsupportedDtype(String),
    /// Fewer data bytes than the header promises
    #[error("Truncated data: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
    /// Underlying read failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fatal errors that prevent a comparison from producing a verdict
#[derive(thiserror::Error, Debug)]
pub enum ComparisonError {
    /// An input path does not exist
    #[error("File not found: {0:?}")]
    FileNotFound(PathBuf),
    /// Any other read failure
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Non-numeric token in a text file
    #[error("Parse error in {path:?} at line {line}: invalid number {token:?}")]
    Parse {
        path: PathBuf,
        line: usize,
        token: String,
    },
    /// Reference file is not a readable NPY array
    #[error("Failed to decode NPY file {path:?}: {source}")]
    Npy {
        path: PathBuf,
        #[source]
        source: NpyError,
    },
    /// Flattened element counts differ
    #[error("Shape mismatch: reference has {reference} elements, candidate has {candidate}")]
    ShapeMismatch { reference: usize, candidate: usize },
    /// Both arrays have zero elements
    #[error("Nothing to compare: both arrays are empty")]
    EmptyInput,
}

impl ComparisonError {
    /// Classify an error from opening or reading `path`
    pub(crate) fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            ComparisonError::FileNotFound(path)
        } else {
            ComparisonError::Io { path, source }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_not_found_is_classified() {
        let err = ComparisonError::from_io("missing.npy", io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, ComparisonError::FileNotFound(ref p) if p.ends_with("missing.npy")));
    }

    #[test]
    fn test_other_io_errors_keep_source() {
        let err = ComparisonError::from_io(
            "locked.txt",
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(err, ComparisonError::Io { .. }));
        assert!(err.to_string().contains("locked.txt"));
    }

    #[test]
    fn test_shape_mismatch_message() {
        let err = ComparisonError::ShapeMismatch { reference: 5, candidate: 3 };
        assert_eq!(
            err.to_string(),
            "Shape mismatch: reference has 5 elements, candidate has 3"
        );
    }
}
