/// Credential hashing seam
use crate::error::Result;

/// Produces and checks opaque password credentials
///
/// The hashing scheme is not part of the ledger; implementations live with
/// the application (see `ledger-sync`'s bcrypt verifier).
pub trait CredentialVerifier: Send + Sync {
    /// Hash a plaintext password
    ///
    /// # Errors
    /// Returns `LedgerError::Credential` if the backend fails
    fn hash_password(&self, password: &str) -> Result<String>;

    /// Check a plaintext password against a stored credential
    ///
    /// A malformed stored credential is a mismatch, not an error.
    fn verify_password(&self, password: &str, credential: &str) -> Result<bool>;
}
