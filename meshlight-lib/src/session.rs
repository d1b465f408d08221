//! Session key derivation
//!
//! After a successful pairing exchange both sides hold the mesh credentials,
//! the host's 8-byte session random and the bulb's 8-byte response random. The
//! session key is a single reversed-AES block: the concatenated randoms
//! encrypted under name XOR password.

use std::fmt;

use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::cipher::encrypt_block;
use crate::constants::{BLOCK_SIZE, RANDOM_SIZE};
use crate::credentials::MeshCredentials;

/// Host-generated random sent in the pairing packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionRandom(pub [u8; RANDOM_SIZE]);

impl SessionRandom {
    /// Draw a fresh random from the OS CSPRNG. Use one per connection attempt.
    pub fn generate() -> Self {
        let mut bytes = [0u8; RANDOM_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; RANDOM_SIZE] {
        &self.0
    }
}

/// Random returned by the bulb when it accepts the pairing packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseRandom(pub [u8; RANDOM_SIZE]);

impl ResponseRandom {
    pub fn as_bytes(&self) -> &[u8; RANDOM_SIZE] {
        &self.0
    }
}

/// AES key for one connection.
///
/// Owned by the connection that derived it and zeroized on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey([u8; BLOCK_SIZE]);

impl SessionKey {
    pub fn from_bytes(key: [u8; BLOCK_SIZE]) -> Self {
        Self(key)
    }

    /// Get the raw key bytes.
    ///
    /// # Security
    /// Handle with care - this exposes sensitive key material.
    pub fn as_bytes(&self) -> &[u8; BLOCK_SIZE] {
        &self.0
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey(<redacted>)")
    }
}

/// Derive the session key for a connection.
pub fn derive_session_key(
    credentials: &MeshCredentials,
    session_random: &SessionRandom,
    response_random: &ResponseRandom,
) -> SessionKey {
    let mut block = [0u8; BLOCK_SIZE];
    block[..RANDOM_SIZE].copy_from_slice(session_random.as_bytes());
    block[RANDOM_SIZE..].copy_from_slice(response_random.as_bytes());

    let key_material = credentials.key_material();
    let key = SessionKey(encrypt_block(key_material.as_bytes(), &block));
    block.zeroize();
    key
}

/// [`derive_session_key`] over raw name/password byte strings.
pub fn derive_session_key_from(
    mesh_name: &[u8],
    mesh_password: &[u8],
    session_random: [u8; RANDOM_SIZE],
    response_random: [u8; RANDOM_SIZE],
) -> SessionKey {
    derive_session_key(
        &MeshCredentials::new(mesh_name, mesh_password),
        &SessionRandom(session_random),
        &ResponseRandom(response_random),
    )
}
