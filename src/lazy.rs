//! A call-once memoizing cell.
//!
//! [`Lazy`] holds a producer and runs it the first time [`Lazy::get`] is
//! called. Concurrent first callers block until that single run finishes and
//! then all observe its value. The value is kept forever; a producer that
//! returns a `Result` therefore caches its failure just like a success.

use std::fmt;
use std::sync::OnceLock;

use parking_lot::Mutex;

type Producer<T> = Box<dyn FnOnce() -> T + Send>;

pub struct Lazy<T> {
    value: OnceLock<T>,
    producer: Mutex<Option<Producer<T>>>,
}

impl<T> Lazy<T> {
    pub fn new<F>(producer: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        Self {
            value: OnceLock::new(),
            producer: Mutex::new(Some(Box::new(producer))),
        }
    }

    /// A cell that is already resolved to `value`.
    pub fn ready(value: T) -> Self {
        Self {
            value: OnceLock::from(value),
            producer: Mutex::new(None),
        }
    }

    /// Returns the memoized value, running the producer if nobody has yet.
    ///
    /// # Panics
    /// If the producer panicked on an earlier call, every later call panics
    /// too, like a poisoned `std::sync::LazyLock`.
    pub fn get(&self) -> &T {
        self.value.get_or_init(|| {
            let producer = self.producer.lock().take();
            match producer {
                Some(producer) => producer(),
                None => panic!("Lazy instance has previously been poisoned"),
            }
        })
    }

    /// True once the producer has run to completion.
    pub fn is_resolved(&self) -> bool {
        self.value.get().is_some()
    }
}

impl<T: fmt::Debug> fmt::Debug for Lazy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value.get() {
            Some(value) => f.debug_tuple("Lazy").field(value).finish(),
            None => f.write_str("Lazy(<unresolved>)"),
        }
    }
}
