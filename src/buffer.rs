use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::Sink;

/// An in-memory sink that stays readable after it was handed to a handle.
/// Clones share the same bytes.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.bytes.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.bytes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.lock().is_empty()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Sink for SharedBuffer {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_bytes() {
        let buffer = SharedBuffer::new();
        let mut writer = buffer.clone();

        writer.write_all(b"Hello, ").unwrap();
        writer.write_all(b"World!").unwrap();

        assert_eq!(buffer.contents(), b"Hello, World!");
        assert_eq!(buffer.len(), 13);
        assert!(!buffer.is_empty());
    }

    #[test]
    fn test_empty() {
        let buffer = SharedBuffer::new();
        assert!(buffer.is_empty());
        assert!(buffer.contents().is_empty());
    }
}
