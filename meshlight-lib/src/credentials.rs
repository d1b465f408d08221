//! Mesh credentials and the key material derived from them

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::cipher::{pad_block, xor_block};
use crate::constants::{BLOCK_SIZE, DEFAULT_MESH_NAME, DEFAULT_MESH_PASSWORD};

/// The name/password pair shared by every bulb in a mesh.
///
/// Both fields are zero-padded or truncated to 16 bytes on construction, so
/// every party that shares the credential sees identical bytes.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct MeshCredentials {
    name: [u8; BLOCK_SIZE],
    password: [u8; BLOCK_SIZE],
}

impl MeshCredentials {
    pub fn new(name: impl AsRef<[u8]>, password: impl AsRef<[u8]>) -> Self {
        Self {
            name: pad_block(name.as_ref()),
            password: pad_block(password.as_ref()),
        }
    }

    /// Padded mesh name
    pub fn name(&self) -> &[u8; BLOCK_SIZE] {
        &self.name
    }

    /// Padded mesh password
    pub fn password(&self) -> &[u8; BLOCK_SIZE] {
        &self.password
    }

    /// Byte-wise XOR of the padded name and password.
    pub fn key_material(&self) -> KeyMaterial {
        KeyMaterial(xor_block(&self.name, &self.password))
    }

    /// Mesh name with the zero padding stripped, for display.
    pub fn display_name(&self) -> String {
        let len = self.name.iter().position(|&b| b == 0).unwrap_or(BLOCK_SIZE);
        String::from_utf8_lossy(&self.name[..len]).to_string()
    }
}

impl Default for MeshCredentials {
    /// Credentials of a factory-fresh bulb
    fn default() -> Self {
        Self::new(DEFAULT_MESH_NAME, DEFAULT_MESH_PASSWORD)
    }
}

impl fmt::Debug for MeshCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeshCredentials")
            .field("name", &self.display_name())
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Name XOR password. Used only as an encryption key during pairing and key
/// derivation, never sent over the air.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial([u8; BLOCK_SIZE]);

impl KeyMaterial {
    pub fn as_bytes(&self) -> &[u8; BLOCK_SIZE] {
        &self.0
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyMaterial(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padding() {
        let creds = MeshCredentials::new("unpaired", "1234");
        assert_eq!(&creds.name()[..8], b"unpaired");
        assert!(creds.name()[8..].iter().all(|&b| b == 0));
        assert_eq!(&creds.password()[..4], b"1234");
        assert!(creds.password()[4..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_truncation() {
        let creds = MeshCredentials::new("a-very-long-mesh-name-indeed", "pw");
        assert_eq!(creds.name(), b"a-very-long-mesh");
        assert_eq!(creds.display_name(), "a-very-long-mesh");
    }

    #[test]
    fn test_key_material_for_default_credentials() {
        let creds = MeshCredentials::default();
        assert_eq!(hex::encode(creds.key_material().as_bytes()), "445c4355697265640000000000000000");
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = MeshCredentials::new("home", "secret");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("home"));
        assert!(!debug.contains("secret"));
        assert_eq!(format!("{:?}", creds.key_material()), "KeyMaterial(<redacted>)");
    }
}
