pub mod ledger;
pub mod memory;
pub mod storage_traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

// Re-export the main types for convenience
pub use ledger::CustodyLedger;
pub use memory::{MemoryCustodyIterator, MemoryCustodyStorage};
pub use storage_traits::{CustodyStorage, CustodyStorageIterator};

// Re-export the storage implementations
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteCustodyIterator, SqliteCustodyStorage};
