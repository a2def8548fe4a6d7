//! The write side of a [`LazyFile`](crate::LazyFile).
//!
//! Opening a file for writing is split in two once-only stages: the parent
//! directory is ensured first, then the file itself is created. Each stage
//! caches its own failure, so a directory problem and a file problem are
//! reported differently and neither stage is ever repeated.

use std::fs::{DirBuilder, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;

use crate::core::{Sink, utils};
use crate::error::FileError;
use crate::lazy::Lazy;

/// Where the output of a handle lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    dir: PathBuf,
    file_name: String,
    path: PathBuf,
}

impl Location {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let (dir, file_name) = utils::split(path);
        Self {
            dir,
            file_name,
            path: path.to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// An opened write target: its [`Location`] plus the sink bytes go to.
pub struct Destination {
    location: Location,
    sink: Box<dyn Sink>,
}

impl Destination {
    pub fn new<P: AsRef<Path>, S: Sink + 'static>(path: P, sink: S) -> Self {
        Self {
            location: Location::new(path),
            sink: Box::new(sink),
        }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }
}

impl Write for Destination {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.sink.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}

impl Sink for Destination {
    fn close(&mut self) -> Option<io::Result<()>> {
        self.sink.close()
    }
}

impl std::fmt::Debug for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Destination")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

/// How the write side is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Permission bits for created directories, before the umask.
    /// Ignored outside unix.
    pub dir_mode: u32,
    /// Truncate an existing file; `false` appends to it instead.
    pub truncate: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            dir_mode: 0o777,
            truncate: true,
        }
    }
}

/// The opened destination. Emptied when the handle is closed.
pub(crate) type SharedDestination = Arc<Mutex<Option<Destination>>>;

type Opened = Result<Option<SharedDestination>, FileError>;

pub(crate) struct WriterInit {
    dir: Lazy<Result<(), FileError>>,
    file: Lazy<Opened>,
}

impl WriterInit {
    /// Ensures the parent directory of `path`, then creates `path`, each on
    /// first use.
    pub fn create<P: AsRef<Path>>(path: P, options: WriteOptions) -> Self {
        let location = Location::new(path);
        let dir = location.dir().to_path_buf();
        Self {
            dir: Lazy::new(move || ensure_dir(dir, options)),
            file: Lazy::new(move || create_file(location, options).map(Some)),
        }
    }

    /// Writes into `sink`. `path` only names the [`Location`].
    pub fn from_sink<P: AsRef<Path>, S: Sink + 'static>(sink: S, path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        Self::from_fn(move || Ok(Some(Destination::new(path, sink))))
    }

    pub fn from_error(err: FileError) -> Self {
        Self {
            dir: Lazy::ready(Ok(())),
            file: Lazy::ready(Err(err)),
        }
    }

    /// `Ok(None)` from `producer` is reported by the handle as a missing
    /// writer.
    pub fn from_fn<F>(producer: F) -> Self
    where
        F: FnOnce() -> Result<Option<Destination>, FileError> + Send + 'static,
    {
        Self {
            dir: Lazy::ready(Ok(())),
            file: Lazy::new(move || {
                let destination = producer()?;
                Ok(destination.map(|d| Arc::new(Mutex::new(Some(d)))))
            }),
        }
    }

    /// Runs the directory stage; its failure is final.
    pub fn prepare(&self) -> Result<(), FileError> {
        self.dir.get().clone()
    }

    /// Runs both stages. The file stage never runs if the directory stage
    /// failed.
    pub fn get(&self) -> Opened {
        self.prepare()?;
        self.file.get().clone()
    }
}

fn ensure_dir(dir: PathBuf, options: WriteOptions) -> Result<(), FileError> {
    debug!("ensuring directory {:?}", dir);
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(options.dir_mode);
    }
    #[cfg(not(unix))]
    let _ = options;
    builder
        .create(&dir)
        .map_err(|e| FileError::create_dir(dir, e))
}

fn create_file(location: Location, options: WriteOptions) -> Result<SharedDestination, FileError> {
    debug!("creating {:?} for writing", location.path());
    let mut open = OpenOptions::new();
    if options.truncate {
        open.write(true).create(true).truncate(true);
    } else {
        open.append(true).create(true);
    }
    let file = open
        .open(location.path())
        .map_err(|e| FileError::create_file(location.path(), e))?;
    Ok(Arc::new(Mutex::new(Some(Destination {
        location,
        sink: Box::new(file),
    }))))
}
