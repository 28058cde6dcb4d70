//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod credential_verifier;
mod ledger_store;

#[cfg(test)]
pub use credential_verifier::MockCredentialVerifier;
pub use credential_verifier::{CredentialVerifier, CredentialVerifierError, VerifiedClaims};
#[cfg(test)]
pub use ledger_store::MockLedgerStore;
pub use ledger_store::{LedgerEntry, LedgerStore, LedgerStoreError};
