use std::fs::File;
use std::io::{self, BufReader, BufWriter, Cursor, Read, Write};

/// A readable byte source a [`LazyFile`](crate::LazyFile) can materialize.
///
/// `close` is an optional capability: sources that have nothing to release
/// keep the default and return `None`.
pub trait Source: Read + Send {
    fn close(&mut self) -> Option<io::Result<()>> {
        None
    }
}

/// A writable byte sink a [`LazyFile`](crate::LazyFile) can materialize.
///
/// Same contract as [`Source::close`].
pub trait Sink: Write + Send {
    fn close(&mut self) -> Option<io::Result<()>> {
        None
    }
}

pub type Result<T> = std::result::Result<T, anyhow::Error>;

// The descriptor itself is released on drop, there is nothing to report.
impl Source for File {}

impl<T: AsRef<[u8]> + Send> Source for Cursor<T> {}

impl Source for &'static [u8] {}

impl Source for io::Empty {}

impl<R: Source> Source for BufReader<R> {
    fn close(&mut self) -> Option<io::Result<()>> {
        self.get_mut().close()
    }
}

impl Sink for File {
    fn close(&mut self) -> Option<io::Result<()>> {
        Some(self.sync_all())
    }
}

impl Sink for Vec<u8> {}

impl Sink for Cursor<Vec<u8>> {}

impl Sink for io::Sink {}

impl<W: Sink> Sink for BufWriter<W> {
    fn close(&mut self) -> Option<io::Result<()>> {
        if let Err(e) = self.flush() {
            return Some(Err(e));
        }
        Some(self.get_mut().close().unwrap_or(Ok(())))
    }
}

pub(crate) mod utils {
    use std::path::{Path, PathBuf};

    /// Splits `path` into its directory and its last element.
    /// A bare file name lives in `"."`, and so does the empty path.
    pub fn split(path: &Path) -> (PathBuf, String) {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            None if path.has_root() => path.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let name = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None if path.as_os_str().is_empty() => ".".to_string(),
            None => path.to_string_lossy().into_owned(),
        };
        (dir, name)
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain(Vec<u8>);

    impl Write for Plain {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Sink for Plain {}

    #[test]
    fn test_default_close_is_absent() {
        let mut sink = Plain(Vec::new());
        assert!(sink.close().is_none());

        let mut source = Cursor::new(b"abc".to_vec());
        assert!(Source::close(&mut source).is_none());
    }

    #[test]
    fn test_buf_writer_close_flushes() {
        let mut sink = BufWriter::new(Vec::new());
        sink.write_all(b"buffered").unwrap();

        assert!(matches!(sink.close(), Some(Ok(()))));
        assert_eq!(sink.get_ref(), b"buffered");
    }
}
