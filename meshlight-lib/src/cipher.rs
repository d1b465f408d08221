//! Block cipher adapter
//!
//! Every primitive in the mesh protocol is built from a single AES-128 block
//! encryption with one quirk: the key, the input block and the output block are
//! all byte-reversed relative to standard AES. The bulbs' radio firmware feeds
//! its hardware AES engine this way, so we have to match it exactly.

use aes::Aes128;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};

use crate::constants::BLOCK_SIZE;
use crate::error::MeshError;

/// Encrypt a single block under `key` using the protocol's reversed byte order.
pub fn encrypt_block(key: &[u8; BLOCK_SIZE], block: &[u8; BLOCK_SIZE]) -> [u8; BLOCK_SIZE] {
    let key = reversed(key);
    let cipher = Aes128::new((&key).into());
    let mut output = reversed(block);
    cipher.encrypt_block(output.as_mut_slice().into());
    output.reverse();
    output
}

/// Inverse of [`encrypt_block`].
pub fn decrypt_block(key: &[u8; BLOCK_SIZE], block: &[u8; BLOCK_SIZE]) -> [u8; BLOCK_SIZE] {
    let key = reversed(key);
    let cipher = Aes128::new((&key).into());
    let mut output = reversed(block);
    cipher.decrypt_block(output.as_mut_slice().into());
    output.reverse();
    output
}

/// Slice entry point for [`encrypt_block`], for buffers read off the wire.
///
/// Both inputs must be exactly 16 bytes; nothing is padded or truncated.
pub fn encrypt_block_slice(key: &[u8], block: &[u8]) -> Result<[u8; BLOCK_SIZE], MeshError> {
    Ok(encrypt_block(&to_block(key)?, &to_block(block)?))
}

/// Zero-fill (or truncate) `bytes` into a 16-byte block.
pub fn pad_block(bytes: &[u8]) -> [u8; BLOCK_SIZE] {
    let mut block = [0u8; BLOCK_SIZE];
    let len = bytes.len().min(BLOCK_SIZE);
    block[..len].copy_from_slice(&bytes[..len]);
    block
}

pub(crate) fn xor_block(a: &[u8; BLOCK_SIZE], b: &[u8; BLOCK_SIZE]) -> [u8; BLOCK_SIZE] {
    let mut out = [0u8; BLOCK_SIZE];
    for (o, (x, y)) in out.iter_mut().zip(a.iter().zip(b)) {
        *o = x ^ y;
    }
    out
}

fn to_block(bytes: &[u8]) -> Result<[u8; BLOCK_SIZE], MeshError> {
    bytes.try_into().map_err(|_| MeshError::InvalidLength {
        expected: BLOCK_SIZE,
        actual: bytes.len(),
    })
}

fn reversed(bytes: &[u8; BLOCK_SIZE]) -> [u8; BLOCK_SIZE] {
    let mut out = *bytes;
    out.reverse();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_key_vector() {
        // Standard AES-128(0, 0) is 66e94bd4..., byte-reversed on the way out
        let out = encrypt_block(&[0u8; 16], &[0u8; 16]);
        assert_eq!(hex::encode(out), "2e2b34ca59fa4c883b2c8aefd44be966");
    }

    #[test]
    fn test_counting_vector() {
        let key: [u8; 16] = std::array::from_fn(|i| i as u8);
        let block: [u8; 16] = std::array::from_fn(|i| (i + 16) as u8);
        let out = encrypt_block(&key, &block);
        assert_eq!(hex::encode(out), "61b04d2d3166e91a0e6c16cae8bbc0f6");
    }

    #[test]
    fn test_reversal_matches_plain_aes() {
        let key: [u8; 16] = std::array::from_fn(|i| (i * 7) as u8);
        let block: [u8; 16] = std::array::from_fn(|i| (0xf0 - i) as u8);

        let reversed_key = reversed(&key);
        let cipher = Aes128::new((&reversed_key).into());
        let mut expected = reversed(&block);
        cipher.encrypt_block(expected.as_mut_slice().into());
        expected.reverse();

        assert_eq!(encrypt_block(&key, &block), expected);
    }

    #[test]
    fn test_decrypt_inverts_encrypt() {
        let key: [u8; 16] = *b"0123456789abcdef";
        for seed in 0..8u8 {
            let block: [u8; 16] = std::array::from_fn(|i| seed.wrapping_mul(31).wrapping_add(i as u8));
            let ciphertext = encrypt_block(&key, &block);
            assert_ne!(ciphertext, block);
            assert_eq!(decrypt_block(&key, &ciphertext), block);
        }
    }

    #[test]
    fn test_slice_entry_rejects_bad_lengths() {
        let key = [0u8; 16];
        assert!(matches!(
            encrypt_block_slice(&key, &[0u8; 15]),
            Err(MeshError::InvalidLength { expected: 16, actual: 15 })
        ));
        assert!(matches!(
            encrypt_block_slice(&[0u8; 17], &key),
            Err(MeshError::InvalidLength { expected: 16, actual: 17 })
        ));
        assert_eq!(encrypt_block_slice(&key, &key).unwrap(), encrypt_block(&key, &key));
    }

    #[test]
    fn test_pad_block() {
        assert_eq!(&pad_block(b"1234")[..5], b"1234\0");
        assert_eq!(pad_block(b"0123456789abcdefXYZ"), *b"0123456789abcdef");
        assert_eq!(pad_block(&[]), [0u8; 16]);
    }
}
