use std::future::Future;

use bytes::Bytes;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::address::DeviceAddress;
use crate::config::ConnectionOptions;
use crate::constants::STATUS_COMMIT;
use crate::credentials::MeshCredentials;
use crate::error::MeshError;
use crate::packet::{CommandPacket, build_command_packet};
use crate::pair::{PairResponse, build_mesh_update_packets, build_pair_packet, check_mesh_update_response};
use crate::session::{SessionKey, SessionRandom, derive_session_key};
use crate::transport::{COMMAND_CHAR_UUID, Link, PAIR_CHAR_UUID, SERVICE_UUID, STATUS_CHAR_UUID, Transport, WriteMode};

/// A paired connection to one bulb.
///
/// Only constructed by a successful pairing handshake. Owns the session key for
/// its lifetime; the key is zeroized when the connection is dropped.
pub struct Connection<L: Link> {
    link: L,
    address: DeviceAddress,
    key: SessionKey,
    options: ConnectionOptions,
}

impl<L: Link> Connection<L> {
    /// Connect to `address` through `transport` and pair with it.
    pub async fn establish<T>(
        transport: &T,
        address: DeviceAddress,
        credentials: &MeshCredentials,
        options: ConnectionOptions,
    ) -> Result<Self, MeshError>
    where
        T: Transport<Link = L>,
    {
        info!(%address, "Connecting to bulb...");
        let link = timeout(options.op_timeout, transport.connect(&address)).await??;
        Self::pair(link, address, credentials, options).await
    }

    /// Pair over an already-connected link using a fresh session random.
    pub async fn pair(
        link: L,
        address: DeviceAddress,
        credentials: &MeshCredentials,
        options: ConnectionOptions,
    ) -> Result<Self, MeshError> {
        Self::pair_with_random(link, address, credentials, SessionRandom::generate(), options).await
    }

    /// Pair with a caller-chosen session random.
    pub async fn pair_with_random(
        mut link: L,
        address: DeviceAddress,
        credentials: &MeshCredentials,
        session_random: SessionRandom,
        options: ConnectionOptions,
    ) -> Result<Self, MeshError> {
        info!(%address, mesh = %credentials.display_name(), "--- Starting Pairing Handshake ---");

        match handshake(&mut link, credentials, &session_random, &options).await {
            Ok(key) => {
                info!(%address, "Paired, session key established");
                Ok(Self {
                    link,
                    address,
                    key,
                    options,
                })
            }
            Err(e) => {
                warn!(%address, error = %e, "Pairing failed, disconnecting");
                if let Err(disconnect_err) = link.disconnect().await {
                    warn!(error = %disconnect_err, "Disconnect after failed pairing also failed");
                }
                Err(e)
            }
        }
    }

    pub fn address(&self) -> &DeviceAddress {
        &self.address
    }

    pub fn session_key(&self) -> &SessionKey {
        &self.key
    }

    /// Encrypt a command and write it to the command characteristic.
    pub async fn send_command(
        &mut self,
        dest_id: u8,
        opcode: impl Into<u8>,
        data: &[u8],
    ) -> Result<CommandPacket, MeshError> {
        let opcode = opcode.into();
        let packet = build_command_packet(&self.key, &self.address, dest_id, opcode, data)?;
        debug!(
            dest_id,
            opcode = format_args!("{:#04x}", opcode),
            data = %hex::encode(data),
            "Writing command"
        );

        let bytes = packet.to_bytes();
        with_timeout(
            &self.options,
            self.link
                .write_characteristic(SERVICE_UUID, COMMAND_CHAR_UUID, &bytes, WriteMode::WithoutResponse),
        )
        .await?;
        Ok(packet)
    }

    /// Move the bulb to a new mesh name, password and long-term key.
    ///
    /// The current session key stays valid; later connections must pair with
    /// the new credentials.
    pub async fn set_mesh(
        &mut self,
        new_credentials: &MeshCredentials,
        long_term_key: &[u8],
    ) -> Result<(), MeshError> {
        info!(mesh = %new_credentials.display_name(), "--- Updating Mesh Settings ---");

        for packet in build_mesh_update_packets(&self.key, new_credentials, long_term_key) {
            let bytes = packet.to_bytes();
            debug!(opcode = format_args!("{:#04x}", packet.opcode), "Writing mesh update");
            with_timeout(
                &self.options,
                self.link
                    .write_characteristic(SERVICE_UUID, PAIR_CHAR_UUID, &bytes, WriteMode::WithResponse),
            )
            .await?;
        }

        commit_status(&mut self.link, &self.options).await?;
        tokio::time::sleep(self.options.mesh_update_settle).await;

        let response = read_pair(&mut self.link, &self.options).await?;
        check_mesh_update_response(&response)?;
        info!("Mesh network settings accepted");
        Ok(())
    }

    /// Close the link. The session key is dropped with the connection.
    pub async fn disconnect(mut self) -> Result<(), MeshError> {
        info!(address = %self.address, "Disconnecting");
        self.link.disconnect().await
    }
}

async fn handshake<L: Link>(
    link: &mut L,
    credentials: &MeshCredentials,
    session_random: &SessionRandom,
    options: &ConnectionOptions,
) -> Result<SessionKey, MeshError> {
    let pair_packet = build_pair_packet(credentials, session_random).to_bytes();
    with_timeout(
        options,
        link.write_characteristic(SERVICE_UUID, PAIR_CHAR_UUID, &pair_packet, WriteMode::WithResponse),
    )
    .await?;

    commit_status(link, options).await?;

    let response = read_pair(link, options).await?;
    match PairResponse::parse(&response)? {
        PairResponse::Accepted(response_random) => {
            Ok(derive_session_key(credentials, session_random, &response_random))
        }
        PairResponse::Rejected => Err(MeshError::CredentialsRejected),
    }
}

async fn commit_status<L: Link>(link: &mut L, options: &ConnectionOptions) -> Result<(), MeshError> {
    with_timeout(
        options,
        link.write_characteristic(SERVICE_UUID, STATUS_CHAR_UUID, &[STATUS_COMMIT], WriteMode::WithResponse),
    )
    .await
}

async fn read_pair<L: Link>(link: &mut L, options: &ConnectionOptions) -> Result<Bytes, MeshError> {
    let response = with_timeout(options, link.read_characteristic(SERVICE_UUID, PAIR_CHAR_UUID)).await?;
    debug!(response = %hex::encode(&response), "Pair characteristic");
    Ok(response)
}

async fn with_timeout<T>(
    options: &ConnectionOptions,
    fut: impl Future<Output = Result<T, MeshError>>,
) -> Result<T, MeshError> {
    timeout(options.op_timeout, fut).await?
}
