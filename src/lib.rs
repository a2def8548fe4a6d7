//! File handles that open lazily, exactly once.
//!
//! ### Overview
//!
//! A [`LazyFile`] stands for "a file that will eventually be read from or written to". Neither
//! the read source nor the write destination is opened until it is first used, and each is
//! opened at most once, no matter how many operations or threads touch the handle.
//!
//! **Key ideas**:
//! - **Laziness**: constructing a handle performs no I/O.
//! - **Once-only**: opening is memoized by [`Lazy`]; concurrent first callers share one attempt.
//! - **Sticky failures**: a failed open is returned identically on every later call, nothing is
//!   retried. `exists` is the single exception and re-checks after "not found".
//! - **Fault injection**: handles can be built from in-memory sources and sinks or from a fixed
//!   error, which makes callers easy to test.
//!
//! ```
//! use lazy_file::{LazyFile, SharedBuffer};
//!
//! let buffer = SharedBuffer::new();
//! let file = LazyFile::from_writer(buffer.clone(), "logs/output.log");
//!
//! file.write(b"Hello, World!").unwrap();
//! assert_eq!(buffer.contents(), b"Hello, World!");
//! assert_eq!(file.location().unwrap().file_name(), "output.log");
//! ```

mod buffer;
mod core;
mod error;
mod file;
mod lazy;

pub use buffer::SharedBuffer;
pub use crate::core::{Result, Sink, Source};
pub use error::{CloseError, FileError};
pub use file::{Destination, LazyFile, Location, WriteOptions};
pub use lazy::Lazy;
