//! Encryption key bootstrap for stored OAuth tokens
//!
//! Tokens are sensitive, so they are encrypted with a random key and only the
//! key is kept in the platform secret store (gnome-keyring or any other
//! Secret Service provider). Without a secret store no key survives between
//! runs, and a token stored by one process cannot be read by the next.

mod token;

pub use token::TokenStore;

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use sysinfo::{Uid, Users};
use tracing::{debug, info, warn};

use crate::error::{SecretError, SecretResult};

/// Secret store service name holding the key
pub const SERVICE: &str = "barista-github";

/// Length of the random encryption key
pub const KEY_LEN: usize = 64;

/// A credential vault keyed by service and user name
pub trait SecretStore {
    fn get(&self, service: &str, user: &str) -> SecretResult<String>;
    fn set(&self, service: &str, user: &str, secret: &str) -> SecretResult<()>;
}

/// The platform secret store, through the `keyring` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringStore;

impl SecretStore for KeyringStore {
    fn get(&self, service: &str, user: &str) -> SecretResult<String> {
        let entry = keyring::Entry::new(service, user)?;
        Ok(entry.get_password()?)
    }

    fn set(&self, service: &str, user: &str, secret: &str) -> SecretResult<()> {
        let entry = keyring::Entry::new(service, user)?;
        entry.set_password(secret)?;
        Ok(())
    }
}

/// Key protecting the token store
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey([u8; KEY_LEN]);

impl EncryptionKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Decode a key in its stored form (base64 URL-safe, no padding)
    pub fn decode(encoded: &str) -> SecretResult<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(encoded.trim())?;
        let actual = bytes.len();
        let bytes: [u8; KEY_LEN] = bytes.try_into().map_err(|_| SecretError::KeyLength {
            expected: KEY_LEN,
            actual,
        })?;
        Ok(Self(bytes))
    }

    pub fn encode(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(..)")
    }
}

/// Login name of the process owner from the user database, or `user-<uid>`
/// when the uid has no entry.
pub fn current_username() -> String {
    let uid = rustix::process::getuid().as_raw();
    username_for_uid(&Users::new_with_refreshed_list(), uid)
        .unwrap_or_else(|| format!("user-{}", uid))
}

fn username_for_uid(users: &Users, uid: u32) -> Option<String> {
    let uid = Uid::try_from(uid as usize).ok()?;
    users.get_user_by_id(&uid).map(|user| user.name().to_string())
}

/// Load the encryption key from `store`, generating and storing a new one
/// when it is missing or unreadable.
///
/// A valid stored key is returned as is and never rewritten. Failing to write
/// a new key back is logged; the key is still used for this process. Failing
/// to get random bytes is an error.
pub fn bootstrap_key<S, R>(store: &S, user: &str, rng: &mut R) -> SecretResult<EncryptionKey>
where
    S: SecretStore + ?Sized,
    R: RngCore + ?Sized,
{
    match store
        .get(SERVICE, user)
        .and_then(|secret| EncryptionKey::decode(&secret))
    {
        Ok(key) => {
            debug!(service = SERVICE, user = %user, "Loaded token encryption key");
            return Ok(key);
        }
        Err(e) => {
            info!(reason = %e, service = SERVICE, user = %user, "Generating new token encryption key");
        }
    }

    let mut bytes = [0u8; KEY_LEN];
    rng.try_fill_bytes(&mut bytes)?;
    let key = EncryptionKey(bytes);

    if let Err(e) = store.set(SERVICE, user, &key.encode()) {
        warn!(
            error = %e,
            "Could not save encryption key, stored tokens will not survive a restart"
        );
    }

    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[test]
    fn test_username_looked_up_by_uid() {
        let users = Users::new_with_refreshed_list();
        if let Some(user) = users.list().first() {
            let uid = **user.id();
            assert_eq!(
                username_for_uid(&users, uid).as_deref(),
                users.get_user_by_id(user.id()).map(|u| u.name())
            );
        }
        assert_eq!(username_for_uid(&users, u32::MAX - 1), None);
    }

    #[test]
    fn test_current_username_from_user_database() {
        let uid = rustix::process::getuid().as_raw();
        let name = current_username();
        let expected = username_for_uid(&Users::new_with_refreshed_list(), uid)
            .unwrap_or_else(|| format!("user-{}", uid));
        assert_eq!(name, expected);
    }

    #[derive(Default)]
    struct MemoryStore {
        entries: RefCell<HashMap<(String, String), String>>,
        writes: RefCell<usize>,
        fail_writes: bool,
    }

    impl MemoryStore {
        fn with(user: &str, secret: &str) -> Self {
            let store = Self::default();
            store
                .entries
                .borrow_mut()
                .insert((SERVICE.to_string(), user.to_string()), secret.to_string());
            store
        }

        fn stored(&self, user: &str) -> Option<String> {
            self.entries
                .borrow()
                .get(&(SERVICE.to_string(), user.to_string()))
                .cloned()
        }
    }

    impl SecretStore for MemoryStore {
        fn get(&self, service: &str, user: &str) -> SecretResult<String> {
            self.entries
                .borrow()
                .get(&(service.to_string(), user.to_string()))
                .cloned()
                .ok_or_else(|| SecretError::Store("no entry".to_string()))
        }

        fn set(&self, service: &str, user: &str, secret: &str) -> SecretResult<()> {
            *self.writes.borrow_mut() += 1;
            if self.fail_writes {
                return Err(SecretError::Store("locked".to_string()));
            }
            self.entries
                .borrow_mut()
                .insert((service.to_string(), user.to_string()), secret.to_string());
            Ok(())
        }
    }

    struct BrokenRng;

    impl RngCore for BrokenRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, _dest: &mut [u8]) {}

        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
            Err(rand::Error::new(std::io::Error::new(
                std::io::ErrorKind::Other,
                "entropy source unavailable",
            )))
        }
    }

    fn rng() -> StepRng {
        StepRng::new(7, 13)
    }

    #[test]
    fn test_existing_key_is_left_unchanged() {
        let existing = EncryptionKey::from_bytes([42u8; KEY_LEN]).encode();
        let store = MemoryStore::with("alice", &existing);

        let key = bootstrap_key(&store, "alice", &mut rng()).unwrap();

        assert_eq!(key.as_bytes(), &[42u8; KEY_LEN]);
        assert_eq!(*store.writes.borrow(), 0);
        assert_eq!(store.stored("alice").as_deref(), Some(existing.as_str()));
    }

    #[test]
    fn test_missing_key_is_generated_and_stored() {
        let store = MemoryStore::default();

        let key = bootstrap_key(&store, "bob", &mut rng()).unwrap();

        assert_eq!(*store.writes.borrow(), 1);
        let stored = store.stored("bob").unwrap();
        assert_eq!(EncryptionKey::decode(&stored).unwrap(), key);
    }

    #[test]
    fn test_undecodable_key_is_replaced() {
        let store = MemoryStore::with("carol", "this is not base64!!");

        let key = bootstrap_key(&store, "carol", &mut rng()).unwrap();

        assert_eq!(*store.writes.borrow(), 1);
        assert_eq!(store.stored("carol").unwrap(), key.encode());
    }

    #[test]
    fn test_short_key_is_replaced() {
        let short = URL_SAFE_NO_PAD.encode([1u8; 16]);
        let store = MemoryStore::with("dave", &short);

        let key = bootstrap_key(&store, "dave", &mut rng()).unwrap();

        assert_eq!(*store.writes.borrow(), 1);
        assert_ne!(store.stored("dave").unwrap(), short);
        assert_eq!(store.stored("dave").unwrap(), key.encode());
    }

    #[test]
    fn test_write_failure_still_yields_key() {
        let store = MemoryStore {
            fail_writes: true,
            ..MemoryStore::default()
        };

        let key = bootstrap_key(&store, "erin", &mut rng());

        assert!(key.is_ok());
        assert_eq!(*store.writes.borrow(), 1);
        assert!(store.stored("erin").is_none());
    }

    #[test]
    fn test_randomness_failure_is_an_error() {
        let store = MemoryStore::default();

        let result = bootstrap_key(&store, "frank", &mut BrokenRng);

        assert!(matches!(result, Err(SecretError::Random(_))));
        assert_eq!(*store.writes.borrow(), 0);
    }

    #[test]
    fn test_encoding_is_url_safe_without_padding() {
        let key = EncryptionKey::from_bytes([0xfb; KEY_LEN]);
        let encoded = key.encode();
        assert!(!encoded.contains('='));
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
        assert_eq!(EncryptionKey::decode(&encoded).unwrap(), key);
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let key = EncryptionKey::from_bytes([9u8; KEY_LEN]);
        assert_eq!(format!("{:?}", key), "EncryptionKey(..)");
    }
}
