// Encrypted on-disk storage for a single OAuth token

use std::fs;
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::debug;

use super::EncryptionKey;
use crate::error::{SecretError, SecretResult};

const NONCE_LEN: usize = 24;
const CIPHER_KEY_LEN: usize = 32;

/// Token file, encrypted with XChaCha20-Poly1305 under the bootstrapped key.
///
/// File content is `base64url(nonce || ciphertext)`.
pub struct TokenStore {
    path: PathBuf,
    cipher: XChaCha20Poly1305,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>, key: &EncryptionKey) -> SecretResult<Self> {
        let cipher = XChaCha20Poly1305::new_from_slice(&key.as_bytes()[..CIPHER_KEY_LEN])
            .map_err(|_| SecretError::KeyLength {
                expected: CIPHER_KEY_LEN,
                actual: key.as_bytes().len(),
            })?;

        Ok(Self {
            path: path.into(),
            cipher,
        })
    }

    /// `$XDG_DATA_HOME/i3-statusline/<name>`
    pub fn default_path(name: &str) -> SecretResult<PathBuf> {
        let data_dir = dirs::data_dir().ok_or(SecretError::NoDataDir)?;
        Ok(data_dir.join("i3-statusline").join(name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and decrypt the token; `None` when nothing has been stored yet
    pub fn load(&self) -> SecretResult<Option<String>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No token stored");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let sealed = URL_SAFE_NO_PAD.decode(content.trim())?;
        if sealed.len() < NONCE_LEN {
            return Err(SecretError::Decrypt);
        }

        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let plain = self
            .cipher
            .decrypt(XNonce::from_slice(nonce), ciphertext)
            .map_err(|_| SecretError::Decrypt)?;

        String::from_utf8(plain)
            .map(Some)
            .map_err(|_| SecretError::Decrypt)
    }

    /// Encrypt and write the token, readable by the owner only
    pub fn save(&self, token: &str) -> SecretResult<()> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.try_fill_bytes(&mut nonce)?;

        let ciphertext = self
            .cipher
            .encrypt(XNonce::from_slice(&nonce), token.as_bytes())
            .map_err(|_| SecretError::Encrypt)?;

        let mut sealed = nonce.to_vec();
        sealed.extend_from_slice(&ciphertext);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(&self.path)?;
        writeln!(file, "{}", URL_SAFE_NO_PAD.encode(sealed))?;

        debug!(path = %self.path.display(), "Token stored");
        Ok(())
    }
}
