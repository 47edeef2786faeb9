use std::collections::HashMap;

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use parking_lot::RwLock;
use password_hash::{PasswordHash, SaltString};
use uuid::Uuid;

use crate::error::{MallError, MallResult};

use super::principal::Identity;

/// External auth capability. The production backend is a hosted BaaS; the
/// core only depends on this seam.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn create_account(&self, email: &str, password: &str) -> MallResult<Identity>;
    async fn sign_in(&self, email: &str, password: &str) -> MallResult<Identity>;
    async fn sign_out(&self) -> MallResult<()>;
}

struct Account {
    uid: String,
    password_phc: String,
}

/// In-memory identity store used by the demo CLI and tests. Passwords are
/// stored as Argon2 PHC strings, never in the clear.
#[derive(Default)]
pub struct LocalIdentityStore {
    // keyed by lowercased email
    accounts: RwLock<HashMap<String, Account>>,
}

fn hash_password(password: &str) -> MallResult<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes)
        .map_err(|e| MallError::auth("salt_failed", e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| MallError::auth("salt_failed", e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| MallError::auth("hash_failed", e.to_string()))?
        .to_string();
    Ok(phc)
}

fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
    } else {
        false
    }
}

impl LocalIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered accounts. Handy for asserting that validation
    /// failures never reached the store.
    pub fn account_count(&self) -> usize {
        self.accounts.read().len()
    }
}

#[async_trait]
impl IdentityStore for LocalIdentityStore {
    async fn create_account(&self, email: &str, password: &str) -> MallResult<Identity> {
        if email.trim().is_empty() || !email.contains('@') {
            return Err(MallError::auth("invalid_email", "A valid email is required."));
        }
        if password.len() < 6 {
            return Err(MallError::auth(
                "weak_password",
                "Password should be at least 6 characters.",
            ));
        }
        let key = email.trim().to_lowercase();
        let mut accounts = self.accounts.write();
        if accounts.contains_key(&key) {
            return Err(MallError::auth("email_in_use", "Email is already in use."));
        }
        let uid = Uuid::new_v4().to_string();
        let phc = hash_password(password)?;
        accounts.insert(key, Account { uid: uid.clone(), password_phc: phc });
        Ok(Identity::new(uid, email.trim().to_string()))
    }

    async fn sign_in(&self, email: &str, password: &str) -> MallResult<Identity> {
        let key = email.trim().to_lowercase();
        let accounts = self.accounts.read();
        let Some(account) = accounts.get(&key) else {
            return Err(MallError::auth("invalid_credentials", "Invalid email or password."));
        };
        if !verify_password(&account.password_phc, password) {
            return Err(MallError::auth("invalid_credentials", "Invalid email or password."));
        }
        Ok(Identity::new(account.uid.clone(), email.trim().to_string()))
    }

    async fn sign_out(&self) -> MallResult<()> {
        // Nothing server-side to revoke for the local store.
        Ok(())
    }
}
