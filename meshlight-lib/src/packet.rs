//! Command packet assembly
//!
//! ```text
//! nonce   = reversed address (4) | 0x01 | sequence (3)
//! payload = dest_id | 0x00 | opcode | 0x60 | 0x01 | data (10, zero padded)
//! packet  = sequence (3) | checksum[0..2] | encrypted payload (15)
//! ```

use num_enum::FromPrimitive;
use rand::RngCore;
use rand::rngs::OsRng;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::address::DeviceAddress;
use crate::checksum::compute_checksum;
use crate::command::Opcode;
use crate::constants::{
    CHECKSUM_PREFIX_SIZE, COMMAND_PACKET_SIZE, MAX_COMMAND_DATA, NONCE_MARKER, NONCE_SIZE, PAYLOAD_SIZE,
    PAYLOAD_VENDOR_ID, SEQUENCE_SIZE,
};
use crate::error::MeshError;
use crate::session::SessionKey;
use crate::stream::crypt_payload_in_place;

/// Per-packet nonce binding a packet to a device address and sequence value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nonce(pub [u8; NONCE_SIZE]);

impl Nonce {
    pub fn new(address: &DeviceAddress, sequence: &[u8; SEQUENCE_SIZE]) -> Self {
        let mut nonce = [0u8; NONCE_SIZE];
        nonce[..4].copy_from_slice(&address.nonce_prefix());
        nonce[4] = NONCE_MARKER;
        nonce[5..].copy_from_slice(sequence);
        Nonce(nonce)
    }

    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }
}

/// Plaintext command payload (15 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct CommandPayload {
    /// Mesh id of the target bulb, 0 for the connected bulb
    pub dest_id: u8,
    pub reserved: u8,
    pub opcode: u8,
    /// Always 0x60 0x01
    pub vendor: [u8; 2],
    /// Command data, zero padded
    pub data: [u8; MAX_COMMAND_DATA],
}

impl CommandPayload {
    pub fn new(dest_id: u8, opcode: impl Into<u8>, data: &[u8]) -> Result<Self, MeshError> {
        if data.len() > MAX_COMMAND_DATA {
            return Err(MeshError::DataTooLong {
                len: data.len(),
                max: MAX_COMMAND_DATA,
            });
        }

        let mut padded = [0u8; MAX_COMMAND_DATA];
        padded[..data.len()].copy_from_slice(data);

        Ok(Self {
            dest_id,
            reserved: 0,
            opcode: opcode.into(),
            vendor: PAYLOAD_VENDOR_ID,
            data: padded,
        })
    }

    pub fn opcode(&self) -> Opcode {
        Opcode::from_primitive(self.opcode)
    }

    pub fn to_bytes(&self) -> [u8; PAYLOAD_SIZE] {
        let mut out = [0u8; PAYLOAD_SIZE];
        out.copy_from_slice(self.as_bytes());
        out
    }
}

/// Encrypted command as written to the command characteristic (20 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct CommandPacket {
    pub sequence: [u8; SEQUENCE_SIZE],
    pub checksum: [u8; CHECKSUM_PREFIX_SIZE],
    pub ciphertext: [u8; PAYLOAD_SIZE],
}

impl CommandPacket {
    pub fn to_bytes(&self) -> [u8; COMMAND_PACKET_SIZE] {
        let mut out = [0u8; COMMAND_PACKET_SIZE];
        out.copy_from_slice(self.as_bytes());
        out
    }
}

impl TryFrom<&[u8]> for CommandPacket {
    type Error = MeshError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        CommandPacket::read_from_bytes(bytes).map_err(|_| MeshError::InvalidLength {
            expected: COMMAND_PACKET_SIZE,
            actual: bytes.len(),
        })
    }
}

/// Build a command packet with a fresh random sequence value.
///
/// Sequence values are drawn from the OS CSPRNG and are not checked for
/// uniqueness against earlier packets.
pub fn build_command_packet(
    key: &SessionKey,
    address: &DeviceAddress,
    dest_id: u8,
    opcode: impl Into<u8>,
    data: &[u8],
) -> Result<CommandPacket, MeshError> {
    let mut sequence = [0u8; SEQUENCE_SIZE];
    OsRng.fill_bytes(&mut sequence);
    build_command_packet_with_sequence(key, address, dest_id, opcode, data, sequence)
}

/// Build a command packet with a caller-chosen sequence value.
pub fn build_command_packet_with_sequence(
    key: &SessionKey,
    address: &DeviceAddress,
    dest_id: u8,
    opcode: impl Into<u8>,
    data: &[u8],
    sequence: [u8; SEQUENCE_SIZE],
) -> Result<CommandPacket, MeshError> {
    let nonce = Nonce::new(address, &sequence);
    let mut payload = CommandPayload::new(dest_id, opcode, data)?.to_bytes();

    let check = compute_checksum(key.as_bytes(), nonce.as_bytes(), &payload)?;
    crypt_payload_in_place(key.as_bytes(), nonce.as_bytes(), &mut payload)?;

    Ok(CommandPacket {
        sequence,
        checksum: [check[0], check[1]],
        ciphertext: payload,
    })
}

/// Decrypt a command packet and verify its checksum.
pub fn open_command_packet(
    key: &SessionKey,
    address: &DeviceAddress,
    packet: &CommandPacket,
) -> Result<CommandPayload, MeshError> {
    let nonce = Nonce::new(address, &packet.sequence);
    let mut plaintext = packet.ciphertext;
    crypt_payload_in_place(key.as_bytes(), nonce.as_bytes(), &mut plaintext)?;

    let check = compute_checksum(key.as_bytes(), nonce.as_bytes(), &plaintext)?;
    if check[..CHECKSUM_PREFIX_SIZE] != packet.checksum {
        return Err(MeshError::ChecksumMismatch);
    }

    CommandPayload::read_from_bytes(&plaintext[..]).map_err(|_| MeshError::InvalidLength {
        expected: PAYLOAD_SIZE,
        actual: plaintext.len(),
    })
}
