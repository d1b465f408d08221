//! Packet checksum (MAC)
//!
//! A CBC-MAC over the payload, seeded with an encrypted block holding the
//! nonce and the payload length. Only the first two bytes go over the air.

use crate::cipher::{encrypt_block, pad_block, xor_block};
use crate::constants::{BLOCK_SIZE, MAX_CHECKSUM_PAYLOAD, NONCE_SIZE};
use crate::error::MeshError;

/// Compute the 16-byte checksum of `payload` under `key` and `nonce`.
///
/// The payload length is encoded in one byte, so at most 255 bytes are accepted.
pub fn compute_checksum(
    key: &[u8; BLOCK_SIZE],
    nonce: &[u8; NONCE_SIZE],
    payload: &[u8],
) -> Result<[u8; BLOCK_SIZE], MeshError> {
    if payload.len() > MAX_CHECKSUM_PAYLOAD {
        return Err(MeshError::PayloadTooLong {
            len: payload.len(),
            max: MAX_CHECKSUM_PAYLOAD,
        });
    }

    let mut initial = [0u8; BLOCK_SIZE];
    initial[..NONCE_SIZE].copy_from_slice(nonce);
    initial[NONCE_SIZE] = payload.len() as u8;

    let mut check = encrypt_block(key, &initial);
    for chunk in payload.chunks(BLOCK_SIZE) {
        check = encrypt_block(key, &xor_block(&check, &pad_block(chunk)));
    }

    Ok(check)
}
