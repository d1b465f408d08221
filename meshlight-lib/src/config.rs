use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::address::DeviceAddress;
use crate::constants::{DEFAULT_DEST_ID, DEFAULT_MESH_NAME, DEFAULT_MESH_PASSWORD};
use crate::credentials::MeshCredentials;
use crate::error::MeshError;

/// Settings for talking to a mesh, usually loaded from a JSON file.
///
/// ```json
/// { "mesh_name": "home", "mesh_password": "s3cret", "address": "A4:C1:38:12:34:56" }
/// ```
///
/// Missing fields take the factory defaults.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    pub mesh_name: String,
    pub mesh_password: String,
    /// Bulb to connect to
    pub address: Option<DeviceAddress>,
    /// Mesh id commands are addressed to
    pub dest_id: u8,
    /// Per-operation BLE timeout in milliseconds
    pub timeout_ms: u64,
    /// Wait between committing a mesh update and reading the result
    pub mesh_update_settle_ms: u64,
    /// How long to scan for the bulb before connecting
    pub scan_secs: u64,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            mesh_name: DEFAULT_MESH_NAME.to_string(),
            mesh_password: DEFAULT_MESH_PASSWORD.to_string(),
            address: None,
            dest_id: DEFAULT_DEST_ID,
            timeout_ms: 5000,
            mesh_update_settle_ms: 1000,
            scan_secs: 5,
        }
    }
}

impl MeshConfig {
    pub fn from_json(json: &str) -> Result<Self, MeshError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MeshError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading mesh config");
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn credentials(&self) -> MeshCredentials {
        MeshCredentials::new(&self.mesh_name, &self.mesh_password)
    }

    pub fn connection_options(&self) -> ConnectionOptions {
        ConnectionOptions {
            op_timeout: Duration::from_millis(self.timeout_ms),
            mesh_update_settle: Duration::from_millis(self.mesh_update_settle_ms),
        }
    }

    pub fn scan_duration(&self) -> Duration {
        Duration::from_secs(self.scan_secs)
    }
}

impl fmt::Debug for MeshConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeshConfig")
            .field("mesh_name", &self.mesh_name)
            .field("mesh_password", &"<redacted>")
            .field("address", &self.address)
            .field("dest_id", &self.dest_id)
            .field("timeout_ms", &self.timeout_ms)
            .field("mesh_update_settle_ms", &self.mesh_update_settle_ms)
            .field("scan_secs", &self.scan_secs)
            .finish()
    }
}

/// Timing knobs for a [`Connection`](crate::connection::Connection)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionOptions {
    pub op_timeout: Duration,
    pub mesh_update_settle: Duration,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        MeshConfig::default().connection_options()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MeshConfig::default();
        assert_eq!(config.credentials(), MeshCredentials::new("unpaired", "1234"));
        assert_eq!(config.dest_id, 0);
        assert_eq!(config.connection_options().mesh_update_settle, Duration::from_secs(1));
    }

    #[test]
    fn test_partial_json() {
        let config = MeshConfig::from_json(r#"{ "mesh_name": "home", "address": "A4:C1:38:12:34:56" }"#).unwrap();
        assert_eq!(config.mesh_name, "home");
        assert_eq!(config.mesh_password, "1234");
        assert_eq!(config.address, Some("A4:C1:38:12:34:56".parse().unwrap()));
        assert_eq!(config.timeout_ms, 5000);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(MeshConfig::from_json("{ \"dest_id\": 300 }"), Err(MeshError::Config(_))));
        assert!(matches!(MeshConfig::from_json("{ \"address\": \"nope\" }"), Err(MeshError::Config(_))));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            MeshConfig::from_file("/nonexistent/meshlight.json"),
            Err(MeshError::Io(_))
        ));
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = MeshConfig {
            mesh_password: "hunter2".to_string(),
            ..Default::default()
        };
        assert!(!format!("{:?}", config).contains("hunter2"));
    }
}
