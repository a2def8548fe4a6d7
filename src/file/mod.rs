mod lazy_file;
mod reader;
mod writer;

pub use lazy_file::LazyFile;
pub use writer::{Destination, Location, WriteOptions};
