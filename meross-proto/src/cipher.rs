//! Onboarding key derivation and credential cipher
//!
//! The device derives its key from public identity fields, so this is a
//! compatibility layer rather than a secret channel:
//!
//! - key: the 32 ASCII characters of `md5_hex(type + uuid + macAddress)`,
//!   used as raw key bytes (which selects AES-256)
//! - iv: sixteen ASCII `'0'` characters, never random
//! - padding: `0x00` bytes, and an already aligned plaintext still gets a
//!   full extra block
//!
//! Firmware unpads by stripping trailing NULs, so the same rule is applied on
//! decrypt.

use aes::Aes256;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use data_encoding::BASE64;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const BLOCK_SIZE: usize = 16;

/// Sixteen ASCII zeros, not NUL bytes.
pub const FIXED_IV: [u8; BLOCK_SIZE] = [b'0'; BLOCK_SIZE];

/// Identity fields from an `Appliance.System.Hardware` response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceIdentity {
    #[serde(rename = "type")]
    pub device_type: String,
    pub uuid: String,
    pub mac_address: String,
}

/// Lowercase hex MD5 digest, used verbatim as the AES key.
#[derive(Clone, PartialEq, Eq)]
pub struct DerivedKey([u8; 32]);

impl DerivedKey {
    /// MD5 hex of an arbitrary secret string.
    pub fn from_secret(secret: &str) -> Self {
        let digest = Md5::digest(secret.as_bytes());
        let mut key = [0u8; 32];
        data_encoding::HEXLOWER.encode_mut(&digest, &mut key);
        Self(key)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        // hex digits only
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl std::fmt::Display for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

/// `md5_hex(type + uuid + macAddress)`, no separators, no salt.
pub fn derive_key(identity: &DeviceIdentity) -> DerivedKey {
    DerivedKey::from_secret(&format!(
        "{}{}{}",
        identity.device_type, identity.uuid, identity.mac_address
    ))
}

/// Base64 encoded iv and ciphertext.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CipherPayload {
    pub iv: String,
    pub ciphertext: String,
}

/// Right-pad with NULs to `len + (BLOCK_SIZE - len % BLOCK_SIZE)`.
///
/// Aligned input grows by a whole block; the firmware expects exactly this.
pub fn null_pad(plaintext: &[u8]) -> Vec<u8> {
    let padded_len = (BLOCK_SIZE - plaintext.len() % BLOCK_SIZE) + plaintext.len();
    let mut buf = plaintext.to_vec();
    buf.resize(padded_len, 0);
    buf
}

/// Multi-block form for secrets of any length.
pub fn encrypt_credential(key: &DerivedKey, plaintext: &str) -> CipherPayload {
    let mut buf = null_pad(plaintext.as_bytes());
    cbc_encrypt(key, &FIXED_IV, &mut buf);
    CipherPayload {
        iv: BASE64.encode(&FIXED_IV),
        ciphertext: BASE64.encode(&buf),
    }
}

/// Decrypt and strip every trailing NUL.
///
/// Plaintexts that genuinely end in NUL bytes lose them; the device has the
/// same limitation.
pub fn decrypt_credential(key: &DerivedKey, iv: &str, ciphertext: &str) -> Result<Vec<u8>> {
    let iv = BASE64.decode(iv.as_bytes())?;
    let iv: [u8; BLOCK_SIZE] = iv
        .as_slice()
        .try_into()
        .map_err(|_| Error::InvalidIv { len: iv.len() })?;

    let mut buf = BASE64.decode(ciphertext.as_bytes())?;
    if buf.len() % BLOCK_SIZE != 0 {
        return Err(Error::UnalignedCiphertext { len: buf.len() });
    }

    cbc_decrypt(key, &iv, &mut buf);
    let end = buf.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    buf.truncate(end);
    Ok(buf)
}

/// Single-block form used for the `password` field of `Appliance.Config.WifiX`.
///
/// Shorter passwords are NUL padded to one block, longer ones are encrypted
/// as is and must already be block aligned. Returns the base64 ciphertext.
pub fn wifix_password(key: &DerivedKey, password: &str) -> Result<String> {
    let mut buf = password.as_bytes().to_vec();
    if buf.len() < BLOCK_SIZE {
        buf.resize(BLOCK_SIZE, 0);
    }
    if buf.len() % BLOCK_SIZE != 0 {
        return Err(Error::UnalignedPlaintext { len: buf.len() });
    }

    cbc_encrypt(key, &FIXED_IV, &mut buf);
    Ok(BASE64.encode(&buf))
}

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// `buf` must be block aligned.
fn cbc_encrypt(key: &DerivedKey, iv: &[u8; BLOCK_SIZE], buf: &mut [u8]) {
    let mut cipher = Aes256CbcEnc::new(key.as_bytes().into(), iv.into());
    for block in buf.chunks_exact_mut(BLOCK_SIZE) {
        cipher.encrypt_block_mut(block.into());
    }
}

fn cbc_decrypt(key: &DerivedKey, iv: &[u8; BLOCK_SIZE], buf: &mut [u8]) {
    let mut cipher = Aes256CbcDec::new(key.as_bytes().into(), iv.into());
    for block in buf.chunks_exact_mut(BLOCK_SIZE) {
        cipher.decrypt_block_mut(block.into());
    }
}
