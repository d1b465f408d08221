//! Common test utilities and shared imports

// Allow unused imports and dead code since this is a shared module
// used across multiple test files - not all items are used in every test file
#[allow(unused_imports)]
pub use bytes::Bytes;
#[allow(unused_imports)]
pub use hex;
#[allow(unused_imports)]
pub use meshlight_lib::session::{ResponseRandom, SessionRandom};
#[allow(unused_imports)]
pub use meshlight_lib::transport::{
    COMMAND_CHAR_UUID, Link, PAIR_CHAR_UUID, SERVICE_UUID, STATUS_CHAR_UUID, Transport, WriteMode,
};
#[allow(unused_imports)]
pub use meshlight_lib::{
    CommandPacket, Connection, ConnectionOptions, DeviceAddress, MeshCredentials, MeshError, Opcode, SessionKey,
};

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// Fixed session random used by the golden vectors
#[allow(dead_code)]
pub const SESSION_RANDOM: [u8; 8] = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];

/// Fixed response random used by the golden vectors
#[allow(dead_code)]
pub const RESPONSE_RANDOM: [u8; 8] = [0xa1, 0xa2, 0xa3, 0xa4, 0xa5, 0xa6, 0xa7, 0xa8];

/// Session key for "unpaired"/"1234" with the randoms above
#[allow(dead_code)]
pub const GOLDEN_SESSION_KEY: &str = "05a4070bbc618ab1eeb7255f7e164392";

#[allow(dead_code)]
pub const GOLDEN_ADDRESS: &str = "A4:C1:38:12:34:56";

#[allow(dead_code)]
pub fn golden_address() -> DeviceAddress {
    GOLDEN_ADDRESS.parse().expect("valid address")
}

#[allow(dead_code)]
pub fn golden_key() -> SessionKey {
    let mut bytes = [0u8; 16];
    hex::decode_to_slice(GOLDEN_SESSION_KEY, &mut bytes).expect("valid hex");
    SessionKey::from_bytes(bytes)
}

/// Route connection logs to the test harness; `RUST_LOG=debug` to see them
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Short timeouts so a stuck test fails fast
#[allow(dead_code)]
pub fn test_options() -> ConnectionOptions {
    ConnectionOptions {
        op_timeout: Duration::from_millis(500),
        mesh_update_settle: Duration::from_millis(1),
    }
}

/// A characteristic write observed by [`ScriptedLink`]
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub struct Write {
    pub service: Uuid,
    pub characteristic: Uuid,
    pub value: Vec<u8>,
    pub mode: WriteMode,
}

#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct LinkLog {
    pub writes: Vec<Write>,
    pub reads: Vec<Uuid>,
    pub disconnected: bool,
}

/// In-memory link that replays scripted read responses and records writes
#[allow(dead_code)]
#[derive(Debug, Clone, Default)]
pub struct ScriptedLink {
    pub reads: Arc<Mutex<VecDeque<Vec<u8>>>>,
    pub log: Arc<Mutex<LinkLog>>,
    /// Never answer reads, to exercise timeouts
    pub stall_reads: bool,
}

#[allow(dead_code)]
impl ScriptedLink {
    pub fn with_reads(reads: &[&[u8]]) -> Self {
        let link = Self::default();
        link.reads
            .lock()
            .unwrap()
            .extend(reads.iter().map(|r| r.to_vec()));
        link
    }

    pub fn writes(&self) -> Vec<Write> {
        self.log.lock().unwrap().writes.clone()
    }

    pub fn disconnected(&self) -> bool {
        self.log.lock().unwrap().disconnected
    }
}

#[allow(dead_code)]
impl Link for ScriptedLink {
    async fn read_characteristic(&mut self, _service: Uuid, characteristic: Uuid) -> Result<Bytes, MeshError> {
        if self.stall_reads {
            std::future::pending::<()>().await;
        }
        self.log.lock().unwrap().reads.push(characteristic);
        let next = self.reads.lock().unwrap().pop_front();
        next.map(Bytes::from)
            .ok_or_else(|| MeshError::Transport("no scripted response left".to_string()))
    }

    async fn write_characteristic(
        &mut self,
        service: Uuid,
        characteristic: Uuid,
        value: &[u8],
        mode: WriteMode,
    ) -> Result<(), MeshError> {
        self.log.lock().unwrap().writes.push(Write {
            service,
            characteristic,
            value: value.to_vec(),
            mode,
        });
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), MeshError> {
        self.log.lock().unwrap().disconnected = true;
        Ok(())
    }
}

/// Hands out clones of one scripted link, or fails to connect
#[allow(dead_code)]
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    pub link: Option<ScriptedLink>,
}

#[allow(dead_code)]
impl Transport for ScriptedTransport {
    type Link = ScriptedLink;

    async fn connect(&self, address: &DeviceAddress) -> Result<ScriptedLink, MeshError> {
        self.link
            .clone()
            .ok_or_else(|| MeshError::DeviceNotFound(address.to_string()))
    }
}
