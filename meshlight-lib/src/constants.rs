// Protocol constants for the AwoX / Telink mesh light protocol

/// Size of an AES block and of every key in the protocol (16 bytes)
pub const BLOCK_SIZE: usize = 16;

/// Size of the session and response randoms exchanged during pairing (8 bytes)
pub const RANDOM_SIZE: usize = 8;

/// Size of the per-packet nonce (8 bytes)
pub const NONCE_SIZE: usize = 8;

/// Size of the random sequence value prefixed to every command packet (3 bytes)
pub const SEQUENCE_SIZE: usize = 3;

/// Number of checksum bytes carried on the wire (2 bytes)
pub const CHECKSUM_PREFIX_SIZE: usize = 2;

/// Size of the plaintext command payload (15 bytes)
pub const PAYLOAD_SIZE: usize = 15;

/// Size of a complete command packet: sequence + checksum prefix + ciphertext
pub const COMMAND_PACKET_SIZE: usize = SEQUENCE_SIZE + CHECKSUM_PREFIX_SIZE + PAYLOAD_SIZE;

/// Maximum command data carried in a payload (10 bytes)
pub const MAX_COMMAND_DATA: usize = 10;

/// Size of the pairing packet: opcode + session random + tag prefix
pub const PAIR_PACKET_SIZE: usize = 1 + RANDOM_SIZE + 8;

/// Size of one mesh reconfiguration write: opcode + encrypted value
pub const MESH_UPDATE_PACKET_SIZE: usize = 1 + BLOCK_SIZE;

/// The checksum encodes the payload length in a single byte
pub const MAX_CHECKSUM_PAYLOAD: usize = 255;

/// The keystream counter is one byte; 255 blocks is the most it covers without reuse
pub const MAX_STREAM_PAYLOAD: usize = 255 * BLOCK_SIZE;

/// Fixed byte between the address and the sequence in every nonce
pub const NONCE_MARKER: u8 = 0x01;

/// Fixed payload bytes following the opcode
pub const PAYLOAD_VENDOR_ID: [u8; 2] = [0x60, 0x01];

/// Pairing characteristic: pairing request
pub const PAIR_OP_REQUEST: u8 = 0x0C;

/// Pairing characteristic: credentials accepted
pub const PAIR_OP_ACCEPTED: u8 = 0x0D;

/// Pairing characteristic: credentials rejected
pub const PAIR_OP_REJECTED: u8 = 0x0E;

/// Pairing characteristic: set mesh name
pub const PAIR_OP_SET_MESH_NAME: u8 = 0x04;

/// Pairing characteristic: set mesh password
pub const PAIR_OP_SET_MESH_PASSWORD: u8 = 0x05;

/// Pairing characteristic: set mesh long-term key
pub const PAIR_OP_SET_MESH_LTK: u8 = 0x06;

/// Pairing characteristic: mesh settings accepted
pub const PAIR_OP_MESH_UPDATED: u8 = 0x07;

/// Byte written to the status characteristic to commit a pairing step
pub const STATUS_COMMIT: u8 = 0x01;

/// Mesh name a factory-fresh bulb answers to
pub const DEFAULT_MESH_NAME: &str = "unpaired";

/// Mesh password a factory-fresh bulb answers to
pub const DEFAULT_MESH_PASSWORD: &str = "1234";

/// Destination id addressing the connected bulb itself
pub const DEFAULT_DEST_ID: u8 = 0;
