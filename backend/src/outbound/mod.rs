//! Outbound adapters implementing domain ports.
//!
//! - **jwt**: HS256 token verification for the `CredentialVerifier` port.
//! - **ledger**: process-local `LedgerStore` for a party's confirmed rows.
//!
//! Adapters translate between external representations and domain types and
//! contain no relay logic.

pub mod jwt;
pub mod ledger;

pub use jwt::JwtCredentialVerifier;
pub use ledger::InMemoryLedgerStore;
