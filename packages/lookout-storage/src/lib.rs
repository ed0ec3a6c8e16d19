pub mod file;
pub mod kv;
pub mod memory;
pub mod session;

mod error;

pub use error::Error;
pub use file::FileStore;
pub use kv::{KeyValueStore, ScopedStorage};
pub use memory::MemoryStore;
pub use session::{MemorySessionFlags, SessionFlags};

use std::{future::Future, pin::Pin};

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
