pub mod config;
pub mod environment;
pub mod gateway;
mod journal;
pub mod mock_environment;
pub mod receiver;
pub mod supply;
pub mod vault;

// Re-export the main types for convenience
pub use config::{ConfigError, VaultConfig};
pub use environment::{
    AssetTransfers, ClaimRegistry, Environment, EventSink, FungibleTransfers, MultiTransfers,
    NativeCurrency, Transactional, UniqueTransfers,
};
pub use gateway::AssetTransferGateway;
pub use mock_environment::{Call, MockEnvironment, ReceiverHook};
pub use receiver::{supports_interface, Selector, TokenReceiver};
pub use supply::{Reservation, SupplyGuard};
pub use vault::BundleVault;
