use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;

use crate::core::Source;
use crate::error::FileError;
use crate::lazy::Lazy;

/// The opened source. Emptied when the handle is closed.
pub(crate) type SharedSource = Arc<Mutex<Option<Box<dyn Source>>>>;

/// Opens the read side of a handle at most once.
pub(crate) struct ReaderInit {
    opened: Lazy<Result<SharedSource, FileError>>,
}

impl ReaderInit {
    /// Opens `path` for reading on first use.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        Self::from_fn(move || open_file(path))
    }

    /// Hands out `source` on first use.
    pub fn from_source<S: Source + 'static>(source: S) -> Self {
        Self::from_fn(move || Ok(source))
    }

    pub fn from_error(err: FileError) -> Self {
        Self {
            opened: Lazy::ready(Err(err)),
        }
    }

    pub fn from_fn<S, F>(producer: F) -> Self
    where
        S: Source + 'static,
        F: FnOnce() -> Result<S, FileError> + Send + 'static,
    {
        Self {
            opened: Lazy::new(move || {
                let source = producer()?;
                Ok(Arc::new(Mutex::new(Some(Box::new(source) as Box<dyn Source>))))
            }),
        }
    }

    /// Every caller gets the same source, or a clone of the same failure.
    pub fn get(&self) -> Result<SharedSource, FileError> {
        self.opened.get().clone()
    }
}

fn open_file(path: PathBuf) -> Result<File, FileError> {
    debug!("opening {:?} for reading", path);
    File::open(&path).map_err(|e| FileError::open(path, e))
}
