pub mod address;
pub mod checksum;
pub mod cipher;
pub mod command;
pub mod config;
pub mod connection;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod packet;
pub mod pair;
pub mod session;
pub mod stream;
pub mod transport;

#[cfg(feature = "ble")]
pub mod ble;

// Re-export the main types for easy access
pub use address::DeviceAddress;
pub use command::Opcode;
pub use config::{ConnectionOptions, MeshConfig};
pub use connection::Connection;
pub use credentials::MeshCredentials;
pub use error::MeshError;
pub use packet::{CommandPacket, build_command_packet};
pub use pair::{PairPacket, build_pair_packet};
pub use session::{SessionKey, derive_session_key};
