//! Counter-mode payload cipher
//!
//! The keystream is the reversed-AES encryption of `counter ‖ nonce ‖ 0…0`,
//! with a one-byte counter starting at zero. Encryption and decryption are the
//! same operation.

use crate::cipher::encrypt_block;
use crate::constants::{BLOCK_SIZE, MAX_STREAM_PAYLOAD, NONCE_SIZE};
use crate::error::MeshError;

/// Encrypt or decrypt `payload`, returning a buffer of the same length.
pub fn crypt_payload(
    key: &[u8; BLOCK_SIZE],
    nonce: &[u8; NONCE_SIZE],
    payload: &[u8],
) -> Result<Vec<u8>, MeshError> {
    let mut output = payload.to_vec();
    crypt_payload_in_place(key, nonce, &mut output)?;
    Ok(output)
}

/// In-place variant of [`crypt_payload`].
///
/// Payloads longer than 4080 bytes are rejected: past 255 blocks the counter
/// byte would wrap and repeat keystream.
pub fn crypt_payload_in_place(
    key: &[u8; BLOCK_SIZE],
    nonce: &[u8; NONCE_SIZE],
    payload: &mut [u8],
) -> Result<(), MeshError> {
    if payload.len() > MAX_STREAM_PAYLOAD {
        return Err(MeshError::PayloadTooLong {
            len: payload.len(),
            max: MAX_STREAM_PAYLOAD,
        });
    }

    let mut counter: u8 = 0;
    let mut block = [0u8; BLOCK_SIZE];
    block[1..=NONCE_SIZE].copy_from_slice(nonce);

    for chunk in payload.chunks_mut(BLOCK_SIZE) {
        block[0] = counter;
        let keystream = encrypt_block(key, &block);
        for (byte, k) in chunk.iter_mut().zip(keystream) {
            *byte ^= k;
        }
        counter = counter.wrapping_add(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 16] = [
        0x05, 0xa4, 0x07, 0x0b, 0xbc, 0x61, 0x8a, 0xb1, 0xee, 0xb7, 0x25, 0x5f, 0x7e, 0x16, 0x43, 0x92,
    ];
    const NONCE: [u8; 8] = [0x56, 0x34, 0x12, 0x38, 0x01, 0x01, 0x02, 0x03];

    #[test]
    fn test_power_on_ciphertext() {
        let payload = hex::decode("0000d0600101000000000000000000").unwrap();
        let ciphertext = crypt_payload(&KEY, &NONCE, &payload).unwrap();
        assert_eq!(hex::encode(ciphertext), "aaab8e41342410259420ff19a82d2f");
    }

    #[test]
    fn test_involution() {
        for len in 0..=255usize {
            let payload: Vec<u8> = (0..len).map(|i| (i * 13 + len) as u8).collect();
            let ciphertext = crypt_payload(&KEY, &NONCE, &payload).unwrap();
            assert_eq!(ciphertext.len(), len);
            assert_eq!(crypt_payload(&KEY, &NONCE, &ciphertext).unwrap(), payload, "len {}", len);
        }
    }

    #[test]
    fn test_counter_advances_per_block() {
        // Two identical plaintext blocks must not produce identical ciphertext blocks
        let ciphertext = crypt_payload(&KEY, &NONCE, &[0u8; 32]).unwrap();
        assert_ne!(ciphertext[..16], ciphertext[16..]);

        let mut second = [0u8; 16];
        second[0] = 1;
        second[1..9].copy_from_slice(&NONCE);
        assert_eq!(ciphertext[16..], encrypt_block(&KEY, &second));
    }

    #[test]
    fn test_in_place_matches() {
        let payload = *b"in place stream cipher check!";
        let mut buf = payload;
        crypt_payload_in_place(&KEY, &NONCE, &mut buf).unwrap();
        assert_eq!(buf.to_vec(), crypt_payload(&KEY, &NONCE, &payload).unwrap());
    }

    #[test]
    fn test_max_payload() {
        assert_eq!(crypt_payload(&KEY, &NONCE, &[0u8; 4080]).unwrap().len(), 4080);
        assert!(matches!(
            crypt_payload(&KEY, &NONCE, &[0u8; 4081]),
            Err(MeshError::PayloadTooLong { len: 4081, max: 4080 })
        ));
    }
}
