//! Pairing handshake and mesh reconfiguration packets
//!
//! # Pairing Flow
//!
//! 1. Write the 17-byte pair packet (`0x0C ‖ session random ‖ tag`) to the pair
//!    characteristic
//! 2. Write `0x01` to the status characteristic
//! 3. Read the pair characteristic: `0x0D ‖ response random` means accepted,
//!    `0x0E` means the mesh name/password were rejected
//!
//! # Mesh Reconfiguration
//!
//! With a session key in hand, the bulb can be moved to a new mesh by writing
//! `0x04 ‖ E(name)`, `0x05 ‖ E(password)` and `0x06 ‖ E(long-term key)` to the
//! pair characteristic, committing with `0x01` on the status characteristic and
//! reading back `0x07` on success.

use tracing::debug;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::cipher::{encrypt_block, pad_block};
use crate::constants::{
    BLOCK_SIZE, MESH_UPDATE_PACKET_SIZE, PAIR_OP_ACCEPTED, PAIR_OP_MESH_UPDATED, PAIR_OP_REJECTED, PAIR_OP_REQUEST,
    PAIR_OP_SET_MESH_LTK, PAIR_OP_SET_MESH_NAME, PAIR_OP_SET_MESH_PASSWORD, PAIR_PACKET_SIZE, RANDOM_SIZE,
};
use crate::credentials::MeshCredentials;
use crate::error::MeshError;
use crate::session::{ResponseRandom, SessionKey, SessionRandom};

/// Pairing request written to the pair characteristic (17 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct PairPacket {
    pub opcode: u8,
    pub session_random: [u8; RANDOM_SIZE],
    pub tag: [u8; 8],
}

impl PairPacket {
    pub fn to_bytes(&self) -> [u8; PAIR_PACKET_SIZE] {
        let mut out = [0u8; PAIR_PACKET_SIZE];
        out.copy_from_slice(self.as_bytes());
        out
    }
}

/// Build the pairing request proving knowledge of the mesh credentials.
///
/// The tag encrypts name XOR password under the zero-padded session random.
/// Note the key and plaintext are the other way round from session key
/// derivation; the bulbs expect exactly this.
pub fn build_pair_packet(credentials: &MeshCredentials, session_random: &SessionRandom) -> PairPacket {
    let key = pad_block(session_random.as_bytes());
    let key_material = credentials.key_material();
    let encrypted = encrypt_block(&key, key_material.as_bytes());

    let mut tag = [0u8; 8];
    tag.copy_from_slice(&encrypted[..8]);

    PairPacket {
        opcode: PAIR_OP_REQUEST,
        session_random: session_random.0,
        tag,
    }
}

/// Leading part of an accepted pairing response
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
struct PairResponseRaw {
    code: u8,
    response_random: [u8; RANDOM_SIZE],
}

/// Outcome of the pairing exchange, read back from the pair characteristic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairResponse {
    Accepted(ResponseRandom),
    Rejected,
}

impl PairResponse {
    pub fn parse(bytes: &[u8]) -> Result<Self, MeshError> {
        match bytes.first() {
            Some(&PAIR_OP_ACCEPTED) => {
                let (raw, _) = PairResponseRaw::ref_from_prefix(bytes).map_err(|_| MeshError::ResponseLength {
                    expected: 1 + RANDOM_SIZE,
                    actual: bytes.len(),
                })?;
                debug!(len = bytes.len(), "Pairing accepted");
                Ok(PairResponse::Accepted(ResponseRandom(raw.response_random)))
            }
            Some(&PAIR_OP_REJECTED) => Ok(PairResponse::Rejected),
            _ => Err(MeshError::UnexpectedResponse {
                stage: "pairing",
                raw: bytes.to_vec(),
            }),
        }
    }
}

/// One write of the mesh reconfiguration sequence (17 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct MeshUpdatePacket {
    pub opcode: u8,
    pub value: [u8; BLOCK_SIZE],
}

impl MeshUpdatePacket {
    fn new(key: &SessionKey, opcode: u8, value: &[u8; BLOCK_SIZE]) -> Self {
        Self {
            opcode,
            value: encrypt_block(key.as_bytes(), value),
        }
    }

    pub fn to_bytes(&self) -> [u8; MESH_UPDATE_PACKET_SIZE] {
        let mut out = [0u8; MESH_UPDATE_PACKET_SIZE];
        out.copy_from_slice(self.as_bytes());
        out
    }
}

/// Build the name, password and long-term key writes, in that order.
pub fn build_mesh_update_packets(
    key: &SessionKey,
    new_credentials: &MeshCredentials,
    long_term_key: &[u8],
) -> [MeshUpdatePacket; 3] {
    [
        MeshUpdatePacket::new(key, PAIR_OP_SET_MESH_NAME, new_credentials.name()),
        MeshUpdatePacket::new(key, PAIR_OP_SET_MESH_PASSWORD, new_credentials.password()),
        MeshUpdatePacket::new(key, PAIR_OP_SET_MESH_LTK, &pad_block(long_term_key)),
    ]
}

/// Check the pair characteristic after a mesh reconfiguration.
pub fn check_mesh_update_response(bytes: &[u8]) -> Result<(), MeshError> {
    match bytes.first() {
        Some(&PAIR_OP_MESH_UPDATED) => Ok(()),
        _ => Err(MeshError::MeshUpdateRejected { raw: bytes.to_vec() }),
    }
}
