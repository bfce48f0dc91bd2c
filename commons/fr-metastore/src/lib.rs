pub mod error;
pub mod traits;

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "redb")]
pub mod redb_store;

pub use error::*;
pub use traits::*;

#[cfg(feature = "memory")]
pub use memory::MemoryMetaStore;

#[cfg(feature = "redb")]
pub use redb_store::RedbMetaStore;
