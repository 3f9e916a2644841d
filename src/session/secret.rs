// Cookie sealing: OS keychain first, AES-GCM vault as fallback
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::{CopilotError, Result};
use crate::KEYRING_SERVICE_NAME;

const KEYRING_PREFIX: &str = "KEYRING:";
const VAULT_PREFIX: &str = "v2:";
const LEGACY_PREFIX: &str = "v1:";
const NONCE_LEN: usize = 12;

/// How a stored cookie value is protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SealedCookie<'a> {
    /// Secret lives in the OS keychain under this account name
    Keyring(&'a str),
    /// AES-256-GCM payload, base64
    Vault(&'a str),
    /// XOR-obfuscated payload written by old versions, base64
    Legacy(&'a str),
    Plain(&'a str),
}

impl<'a> SealedCookie<'a> {
    pub fn classify(sealed: &'a str) -> Self {
        if let Some(account) = sealed.strip_prefix(KEYRING_PREFIX) {
            SealedCookie::Keyring(account)
        } else if let Some(payload) = sealed.strip_prefix(VAULT_PREFIX) {
            SealedCookie::Vault(payload)
        } else if let Some(payload) = sealed.strip_prefix(LEGACY_PREFIX) {
            SealedCookie::Legacy(payload)
        } else {
            SealedCookie::Plain(sealed)
        }
    }

    /// Old formats get re-sealed the next time the session is saved.
    pub fn needs_reseal(&self) -> bool {
        matches!(self, SealedCookie::Legacy(_) | SealedCookie::Plain(_))
    }
}

/// OS credential storage.
pub trait KeychainBackend: Send + Sync {
    fn set(&self, account: &str, secret: &str) -> Result<()>;
    fn get(&self, account: &str) -> Result<Option<String>>;
    fn delete(&self, account: &str) -> Result<()>;
}

/// Windows Credential Manager, macOS Keychain or the Linux kernel keyring.
pub struct OsKeychain;

impl OsKeychain {
    fn entry(account: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(KEYRING_SERVICE_NAME, account)
            .map_err(|e| CopilotError::Secret(format!("keychain entry {}: {}", account, e)))
    }
}

impl KeychainBackend for OsKeychain {
    fn set(&self, account: &str, secret: &str) -> Result<()> {
        Self::entry(account)?
            .set_password(secret)
            .map_err(|e| CopilotError::Secret(format!("keychain write failed: {}", e)))
    }

    fn get(&self, account: &str) -> Result<Option<String>> {
        match Self::entry(account)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(CopilotError::Secret(format!("keychain read failed: {}", e))),
        }
    }

    fn delete(&self, account: &str) -> Result<()> {
        match Self::entry(account)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(CopilotError::Secret(format!("keychain delete failed: {}", e))),
        }
    }
}

pub struct CookieSealer {
    keychain: Option<Box<dyn KeychainBackend>>,
    machine_key: [u8; 32],
}

impl CookieSealer {
    /// Sealer backed by the OS keychain and a key derived from this machine.
    pub fn new() -> Self {
        Self::with_parts(Some(Box::new(OsKeychain)), machine_key())
    }

    pub fn with_parts(keychain: Option<Box<dyn KeychainBackend>>, machine_key: [u8; 32]) -> Self {
        Self { keychain, machine_key }
    }

    pub fn account_name(user_id: u64) -> String {
        format!("session_{}", user_id)
    }

    pub fn seal(&self, user_id: u64, cookie: &str) -> Result<String> {
        if let Some(keychain) = &self.keychain {
            let account = Self::account_name(user_id);
            // Replace rather than update, Windows keeps duplicates otherwise
            let stored = keychain
                .delete(&account)
                .and_then(|_| keychain.set(&account, cookie));
            match stored {
                Ok(()) => return Ok(format!("{}{}", KEYRING_PREFIX, account)),
                Err(e) => warn!("⚠️ Keychain storage failed, using local vault: {}", e),
            }
        }

        vault_encrypt(&self.machine_key, cookie)
    }

    /// `Ok(None)` when the secret is gone from the keychain.
    pub fn unseal(&self, sealed: &str) -> Result<Option<String>> {
        match SealedCookie::classify(sealed) {
            SealedCookie::Keyring(account) => match &self.keychain {
                Some(keychain) => keychain.get(account),
                None => Err(CopilotError::Secret("cookie is in the keychain but no keychain is available".into())),
            },
            SealedCookie::Vault(payload) => vault_decrypt(&self.machine_key, payload).map(Some),
            SealedCookie::Legacy(payload) => legacy_decode(&self.machine_key, payload).map(Some),
            SealedCookie::Plain(cookie) => {
                warn!("⚠️ Found a plaintext session cookie, it will be encrypted on next save");
                Ok(Some(cookie.to_string()))
            }
        }
    }

    /// Drop the keychain entry behind a sealed value, if there is one.
    pub fn forget(&self, sealed: &str) -> Result<()> {
        if let (SealedCookie::Keyring(account), Some(keychain)) = (SealedCookie::classify(sealed), &self.keychain) {
            keychain.delete(account)?;
        }
        Ok(())
    }
}

impl Default for CookieSealer {
    fn default() -> Self {
        Self::new()
    }
}

/// Key for this machine: host name, login name and OS family, the same
/// inputs the `v1:` cookies were sealed with.
pub fn machine_key() -> [u8; 32] {
    let host = gethostname::gethostname().to_string_lossy().into_owned();
    let login = whoami::username();
    derive_machine_key(&host, &login, os_family(std::env::consts::OS))
}

pub fn derive_machine_key(host: &str, login: &str, os_family: &str) -> [u8; 32] {
    let machine_id = format!("{}{}{}", host, login, os_family);
    Sha256::digest(machine_id.as_bytes()).into()
}

/// OS family as written into legacy keys (`Linux`, `Windows`, `Darwin`).
pub fn os_family(os: &str) -> &str {
    match os {
        "linux" | "android" => "Linux",
        "windows" => "Windows",
        "macos" | "ios" => "Darwin",
        "freebsd" => "FreeBSD",
        "openbsd" => "OpenBSD",
        "netbsd" => "NetBSD",
        other => other,
    }
}

fn vault_encrypt(key: &[u8; 32], plaintext: &str) -> Result<String> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|_| CopilotError::Secret("cookie encryption failed".into()))?;

    let mut payload = nonce.to_vec();
    payload.extend_from_slice(&ciphertext);
    Ok(format!("{}{}", VAULT_PREFIX, STANDARD.encode(payload)))
}

fn vault_decrypt(key: &[u8; 32], payload: &str) -> Result<String> {
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| CopilotError::Secret(format!("vault payload is not base64: {}", e)))?;
    if bytes.len() <= NONCE_LEN {
        return Err(CopilotError::Secret("vault payload too short".into()));
    }

    let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CopilotError::Secret("cookie decryption failed (sealed on another machine?)".into()))?;

    String::from_utf8(plaintext).map_err(|_| CopilotError::Secret("decrypted cookie is not UTF-8".into()))
}

fn legacy_decode(key: &[u8; 32], payload: &str) -> Result<String> {
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| CopilotError::Secret(format!("legacy payload is not base64: {}", e)))?;
    let decoded: Vec<u8> = bytes
        .iter()
        .enumerate()
        .map(|(i, b)| b ^ key[i % key.len()])
        .collect();
    String::from_utf8(decoded).map_err(|_| CopilotError::Secret("legacy cookie is not UTF-8".into()))
}
