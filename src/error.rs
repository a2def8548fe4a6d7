//! Failures of the lazy open protocol.
//!
//! A [`FileError`] is produced once by an initializer and then handed out on
//! every later call, so it is `Clone` and keeps its I/O cause behind an `Arc`.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, thiserror::Error)]
pub enum FileError {
    /// The read side could not be opened.
    #[error("failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },
    #[error("failed to create directory {dir:?}: {source}")]
    CreateDir {
        dir: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },
    #[error("failed to create file: {source}")]
    CreateFile {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },
    /// An initializer reported success without producing a destination.
    #[error("unexpected writer is nil")]
    MissingWriter,
    #[error(transparent)]
    Io(Arc<io::Error>),
}

impl FileError {
    pub fn open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        FileError::Open {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    pub fn create_dir(dir: impl Into<PathBuf>, source: io::Error) -> Self {
        FileError::CreateDir {
            dir: dir.into(),
            source: Arc::new(source),
        }
    }

    pub fn create_file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        FileError::CreateFile {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    /// The underlying I/O error, if there is one.
    pub fn io_error(&self) -> Option<&io::Error> {
        self.shared().map(Arc::as_ref)
    }

    pub fn kind(&self) -> Option<io::ErrorKind> {
        self.io_error().map(io::Error::kind)
    }

    /// True for a read side that does not exist.
    /// `exists` turns exactly these failures into `false`.
    pub fn is_not_found(&self) -> bool {
        match self {
            FileError::Open { source, .. } | FileError::Io(source) => {
                source.kind() == io::ErrorKind::NotFound
            }
            _ => false,
        }
    }

    /// True if both values are the same cached failure rather than two
    /// failures that merely look alike.
    pub fn is_same(&self, other: &FileError) -> bool {
        match (self, other) {
            (FileError::MissingWriter, FileError::MissingWriter) => true,
            (a, b) => match (a.shared(), b.shared()) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                _ => false,
            },
        }
    }

    fn shared(&self) -> Option<&Arc<io::Error>> {
        match self {
            FileError::Open { source, .. }
            | FileError::CreateDir { source, .. }
            | FileError::CreateFile { source, .. }
            | FileError::Io(source) => Some(source),
            FileError::MissingWriter => None,
        }
    }
}

impl From<io::Error> for FileError {
    fn from(err: io::Error) -> Self {
        FileError::Io(Arc::new(err))
    }
}

/// Both sides of a handle failed to release.
#[derive(Debug, thiserror::Error)]
#[error("failed to close reader: {reader}; failed to close writer: {writer}")]
pub struct CloseError {
    reader: io::Error,
    writer: io::Error,
}

impl CloseError {
    pub(crate) fn new(reader: io::Error, writer: io::Error) -> Self {
        Self { reader, writer }
    }

    pub fn reader(&self) -> &io::Error {
        &self.reader
    }

    pub fn writer(&self) -> &io::Error {
        &self.writer
    }

    /// True if either release failed with `kind`.
    pub fn contains_kind(&self, kind: io::ErrorKind) -> bool {
        self.reader.kind() == kind || self.writer.kind() == kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        let missing = FileError::open("a.txt", io::ErrorKind::NotFound.into());
        assert!(missing.is_not_found());
        assert_eq!(missing.kind(), Some(io::ErrorKind::NotFound));

        let injected = FileError::from(io::Error::from(io::ErrorKind::NotFound));
        assert!(injected.is_not_found());

        let denied = FileError::open("a.txt", io::ErrorKind::PermissionDenied.into());
        assert!(!denied.is_not_found());

        let dir = FileError::create_dir("logs", io::ErrorKind::NotFound.into());
        assert!(!dir.is_not_found());
        assert!(!FileError::MissingWriter.is_not_found());
    }

    #[test]
    fn test_messages() {
        let err = FileError::create_dir("logs", io::Error::other("boom"));
        assert_eq!(err.to_string(), "failed to create directory \"logs\": boom");

        let err = FileError::create_file("logs/out.log", io::Error::other("boom"));
        assert_eq!(err.to_string(), "failed to create file: boom");

        assert_eq!(
            FileError::MissingWriter.to_string(),
            "unexpected writer is nil"
        );

        let err = FileError::from(io::Error::other("injected"));
        assert_eq!(err.to_string(), "injected");
    }

    #[test]
    fn test_clone_is_same() {
        let err = FileError::create_file("out.log", io::Error::other("boom"));
        let copy = err.clone();
        assert!(err.is_same(&copy));

        let lookalike = FileError::create_file("out.log", io::Error::other("boom"));
        assert!(!err.is_same(&lookalike));
    }

    #[test]
    fn test_source_chain() {
        let err = anyhow::Error::from(FileError::create_dir("logs", io::Error::other("boom")));
        let file_error = err.downcast_ref::<FileError>().unwrap();
        assert_eq!(file_error.io_error().unwrap().to_string(), "boom");
        assert_eq!(err.chain().count(), 2);
    }

    #[test]
    fn test_close_error_keeps_both_causes() {
        let err = CloseError::new(
            io::Error::from(io::ErrorKind::BrokenPipe),
            io::Error::from(io::ErrorKind::TimedOut),
        );
        assert_eq!(err.reader().kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(err.writer().kind(), io::ErrorKind::TimedOut);
        assert!(err.contains_kind(io::ErrorKind::BrokenPipe));
        assert!(err.contains_kind(io::ErrorKind::TimedOut));
        assert!(!err.contains_kind(io::ErrorKind::NotFound));
    }
}
