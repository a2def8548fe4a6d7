//! This module provides [`LazyFile`], a handle to a file that is opened only when it is first
//! read from or written to.
//!
//! ### Key Features:
//! - **Deferred open**: neither side touches the filesystem until the first operation on it.
//! - **Once-only**: each side is opened at most once, even under concurrent first access.
//! - **Cached failures**: a failed open is returned identically on every later call.
//! - **Independent sides**: opening the read side never opens the write side, and vice versa.
//! - **Directory creation**: the first write creates the missing parent directories.

use std::fmt;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, warn};
use parking_lot::Mutex;

use crate::core::{Result, Sink, Source};
use crate::error::{CloseError, FileError};
use crate::file::reader::{ReaderInit, SharedSource};
use crate::file::writer::{Destination, Location, SharedDestination, WriteOptions, WriterInit};

/// A file that will eventually be read from or written to.
///
/// `LazyFile` owns one reader initializer and one writer initializer (either may be absent).
/// The first successful `exists`/`read` materializes the source, the first successful `write`
/// materializes the destination; later operations of the same kind reuse them.
///
/// ### Usage notes:
/// - All operations take `&self`; the handle is `Send + Sync` and may be shared between threads.
/// - Reads and writes go through separate descriptors, so a `read` after `write` sees what was
///   written.
/// - Nothing is retried. Build a new handle to retry a failed open.
/// - The only exception: `exists` re-arms the reader after a not-found result, `read` does not.
/// - `close` drops both sides. Later reads, writes and flushes fail with "file already closed".
///
/// ### Example:
/// ```
/// use lazy_file::LazyFile;
///
/// let path = std::env::temp_dir().join("lazy_file_doc").join("note.txt");
/// let file = LazyFile::new(&path);
///
/// file.write(b"Hello").unwrap(); // creates the directory and the file
/// assert!(file.exists().unwrap());
/// assert_eq!(file.read().unwrap(), b"Hello");
///
/// file.close().unwrap();
/// # std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
/// ```
pub struct LazyFile {
    path: Option<PathBuf>,
    reader: Mutex<ReadSide>,
    writer: Mutex<WriteSide>,
}

struct ReadSide {
    init: Option<Arc<ReaderInit>>,
    source: Option<SharedSource>,
}

struct WriteSide {
    init: Option<Arc<WriterInit>>,
    destination: Option<SharedDestination>,
    location: Option<Location>,
}

impl LazyFile {
    /// Creates a handle bound to `path`, lazily readable and writable.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self::with_options(path, WriteOptions::default())
    }

    /// Like [`LazyFile::new`] with explicit [`WriteOptions`].
    pub fn with_options<P: AsRef<Path>>(path: P, options: WriteOptions) -> Self {
        let path = path.as_ref();
        Self::from_parts(
            Some(path.to_path_buf()),
            Some(ReaderInit::open(path)),
            Some(WriterInit::create(path, options)),
        )
    }

    /// Creates a handle meant for writing to `path`.
    /// The reader stays armed on the same path, so the output can be read back.
    pub fn writer<P: AsRef<Path>>(path: P) -> Self {
        Self::new(path)
    }

    /// Read-only handle over an already available source.
    pub fn from_reader<S: Source + 'static>(source: S) -> Self {
        Self::from_parts(None, Some(ReaderInit::from_source(source)), None)
    }

    /// Read-only handle whose every read fails with `err`.
    pub fn from_read_error<E: Into<FileError>>(err: E) -> Self {
        Self::from_parts(None, Some(ReaderInit::from_error(err.into())), None)
    }

    /// Read-only handle opened by `producer` on first use.
    pub fn from_read_fn<S, F>(producer: F) -> Self
    where
        S: Source + 'static,
        F: FnOnce() -> std::result::Result<S, FileError> + Send + 'static,
    {
        Self::from_parts(None, Some(ReaderInit::from_fn(producer)), None)
    }

    /// Write-only handle over `sink`. `path` is only used for the [`Location`];
    /// no directory is created.
    pub fn from_writer<P: AsRef<Path>, S: Sink + 'static>(sink: S, path: P) -> Self {
        let path = path.as_ref();
        Self::from_parts(
            Some(path.to_path_buf()),
            None,
            Some(WriterInit::from_sink(sink, path)),
        )
    }

    /// Write-only handle whose every write fails with `err`.
    pub fn from_write_error<E: Into<FileError>>(err: E) -> Self {
        Self::from_parts(None, None, Some(WriterInit::from_error(err.into())))
    }

    /// Write-only handle opened by `producer` on first use.
    /// A producer that returns `Ok(None)` makes writes fail with [`FileError::MissingWriter`].
    pub fn from_write_fn<P, F>(path: P, producer: F) -> Self
    where
        P: AsRef<Path>,
        F: FnOnce() -> std::result::Result<Option<Destination>, FileError> + Send + 'static,
    {
        Self::from_parts(
            Some(path.as_ref().to_path_buf()),
            None,
            Some(WriterInit::from_fn(producer)),
        )
    }

    /// Returns a factory binding new handles to paths.
    pub fn opener<P: AsRef<Path>>() -> impl Fn(P) -> LazyFile {
        |path: P| LazyFile::new(path)
    }

    /// Rebinds the handle's path. Initializers are kept; the path is what `exists`
    /// re-arms the reader with.
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    fn from_parts(
        path: Option<PathBuf>,
        reader: Option<ReaderInit>,
        writer: Option<WriterInit>,
    ) -> Self {
        Self {
            path,
            reader: Mutex::new(ReadSide {
                init: reader.map(Arc::new),
                source: None,
            }),
            writer: Mutex::new(WriteSide {
                init: writer.map(Arc::new),
                destination: None,
                location: None,
            }),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Where the output landed, once the write side is open. Kept after `close`.
    pub fn location(&self) -> Option<Location> {
        self.writer.lock().location.clone()
    }

    /// Checks whether the read side can be opened.
    ///
    /// A not-found failure yields `Ok(false)` and arms a fresh reader, so a later `exists` or
    /// `read` looks at the filesystem again. Any other failure is returned as is. Once the
    /// source was opened, the answer stays `true`, also after `close`.
    pub fn exists(&self) -> Result<bool> {
        if self.reader.lock().source.is_some() {
            return Ok(true);
        }
        let init = self.reader_init()?;
        match init.get() {
            Ok(source) => {
                self.materialize_source(source);
                Ok(true)
            }
            Err(err) if err.is_not_found() => {
                self.rearm_reader(&init);
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Reads the source to its end.
    ///
    /// Open failures, not-found included, are returned every time without reopening.
    /// A drained source yields an empty vector.
    pub fn read(&self) -> Result<Vec<u8>> {
        let existing = self.reader.lock().source.clone();
        let source = match existing {
            Some(source) => source,
            None => {
                let source = self.reader_init()?.get()?;
                self.materialize_source(source)
            }
        };
        let mut content = Vec::new();
        source
            .lock()
            .as_mut()
            .ok_or_else(closed)?
            .read_to_end(&mut content)?;
        Ok(content)
    }

    /// Writes `buf` to the destination, opening it first if needed.
    ///
    /// Writes accumulate: the file is truncated only when it is opened.
    /// An open failure is returned on every call and nothing is materialized.
    pub fn write(&self, buf: &[u8]) -> Result<usize> {
        let existing = self.writer.lock().destination.clone();
        let destination = match existing {
            Some(destination) => destination,
            None => match self.writer_init()?.get()? {
                Some(destination) => self.materialize_destination(destination),
                None => return Err(FileError::MissingWriter.into()),
            },
        };
        let n = destination.lock().as_mut().ok_or_else(closed)?.write(buf)?;
        Ok(n)
    }

    /// Flushes the destination if it is open.
    pub fn flush(&self) -> Result<()> {
        let existing = self.writer.lock().destination.clone();
        if let Some(destination) = existing {
            destination.lock().as_mut().ok_or_else(closed)?.flush()?;
        }
        Ok(())
    }

    /// Releases the open source and destination.
    ///
    /// Each side is taken out of the handle, its `close` hook runs, then it is dropped, which
    /// gives file descriptors back. Both sides are released even if the first one fails. When
    /// both fail, the error is a [`CloseError`] carrying both causes. Closing an unopened or
    /// already closed handle does nothing.
    pub fn close(&self) -> Result<()> {
        let source = self.reader.lock().source.clone();
        let destination = self.writer.lock().destination.clone();
        let source = source.and_then(|source| source.lock().take());
        let destination = destination.and_then(|destination| destination.lock().take());
        if source.is_some() || destination.is_some() {
            debug!("closing {:?}", self.path);
        }

        let reader_err = source
            .and_then(|mut source| source.close())
            .and_then(|res| res.err());
        let writer_err = destination
            .and_then(|mut destination| destination.close())
            .and_then(|res| res.err());

        match (reader_err, writer_err) {
            (None, None) => Ok(()),
            (Some(reader), Some(writer)) => {
                warn!("failed to close {:?}: {}; {}", self.path, reader, writer);
                Err(CloseError::new(reader, writer).into())
            }
            (Some(err), None) | (None, Some(err)) => {
                warn!("failed to close {:?}: {}", self.path, err);
                Err(err.into())
            }
        }
    }

    fn reader_init(&self) -> std::result::Result<Arc<ReaderInit>, FileError> {
        self.reader
            .lock()
            .init
            .clone()
            .ok_or_else(|| unsupported("handle has no reader"))
    }

    fn writer_init(&self) -> std::result::Result<Arc<WriterInit>, FileError> {
        self.writer
            .lock()
            .init
            .clone()
            .ok_or_else(|| unsupported("handle has no writer"))
    }

    fn materialize_source(&self, source: SharedSource) -> SharedSource {
        self.reader.lock().source.get_or_insert(source).clone()
    }

    fn materialize_destination(&self, destination: SharedDestination) -> SharedDestination {
        let location = destination.lock().as_ref().map(|d| d.location().clone());
        let mut side = self.writer.lock();
        if side.destination.is_none() {
            side.location = location;
        }
        side.destination.get_or_insert(destination).clone()
    }

    /// Replaces `failed` with a fresh reader, unless another caller already did.
    fn rearm_reader(&self, failed: &Arc<ReaderInit>) {
        let Some(path) = &self.path else {
            return;
        };
        let mut side = self.reader.lock();
        if side.init.as_ref().is_some_and(|init| Arc::ptr_eq(init, failed)) {
            debug!("{:?} not found, re-arming reader", path);
            side.init = Some(Arc::new(ReaderInit::open(path)));
        }
    }
}

fn closed() -> io::Error {
    io::Error::other("file already closed")
}

fn unsupported(msg: &str) -> FileError {
    io::Error::new(io::ErrorKind::Unsupported, msg.to_string()).into()
}

fn into_io_error(err: anyhow::Error) -> io::Error {
    let err = match err.downcast::<io::Error>() {
        Ok(err) => return err,
        Err(err) => err,
    };
    match err.downcast::<FileError>() {
        Ok(err) => io::Error::new(err.kind().unwrap_or(io::ErrorKind::Other), err),
        Err(err) => io::Error::other(err),
    }
}

impl Write for &LazyFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        LazyFile::write(self, buf).map_err(into_io_error)
    }

    fn flush(&mut self) -> io::Result<()> {
        LazyFile::flush(self).map_err(into_io_error)
    }
}

impl Write for LazyFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        <&LazyFile as Write>::write(&mut &*self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        <&LazyFile as Write>::flush(&mut &*self)
    }
}

fn is_open<T>(slot: &Option<Arc<Mutex<Option<T>>>>) -> bool {
    slot.as_ref().is_some_and(|shared| shared.lock().is_some())
}

impl fmt::Debug for LazyFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyFile")
            .field("path", &self.path)
            .field("reader_open", &is_open(&self.reader.lock().source))
            .field("writer_open", &is_open(&self.writer.lock().destination))
            .finish()
    }
}
