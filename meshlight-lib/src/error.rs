use std::io;
use thiserror::Error;

/// The primary error type for the `meshlight` library.
#[derive(Error, Debug)]
pub enum MeshError {
    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Payload too long: {len} bytes exceeds the limit of {max}")]
    PayloadTooLong { len: usize, max: usize },

    #[error("Command data too long: {len} bytes exceeds the limit of {max}")]
    DataTooLong { len: usize, max: usize },

    #[error("Invalid device address: {0}")]
    InvalidAddress(String),

    #[error("Mesh credentials rejected by the device")]
    CredentialsRejected,

    #[error("Mesh update rejected by the device (response {})", hex::encode(.raw))]
    MeshUpdateRejected { raw: Vec<u8> },

    #[error("Unexpected {stage} response: {}", hex::encode(.raw))]
    UnexpectedResponse { stage: &'static str, raw: Vec<u8> },

    #[error("Response too short: expected at least {expected} bytes, got {actual}")]
    ResponseLength { expected: usize, actual: usize },

    #[error("Packet checksum mismatch")]
    ChecksumMismatch,

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Characteristic {0} not found on device")]
    CharacteristicNotFound(uuid::Uuid),

    #[error("Transport error: {0}")]
    Transport(String),

    #[cfg(feature = "ble")]
    #[error("BLE error: {0}")]
    Ble(#[from] btleplug::Error),

    #[error("Timeout during BLE operation: {0}")]
    Timeout(#[from] tokio::time::error::Elapsed),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
