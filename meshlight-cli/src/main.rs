use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use tracing::{debug, error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use meshlight_lib::packet::{build_command_packet_with_sequence, open_command_packet};
use meshlight_lib::session::{ResponseRandom, SessionRandom};
use meshlight_lib::{
    CommandPacket, DeviceAddress, MeshConfig, Opcode, SessionKey, build_command_packet, build_pair_packet,
    derive_session_key,
};

/// Encrypted command tool for AwoX / Telink mesh bulbs.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON config file with mesh credentials, address and timeouts
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Mesh name (overrides the config file)
    #[arg(long, global = true)]
    mesh_name: Option<String>,
    /// Mesh password (overrides the config file)
    #[arg(long, global = true)]
    mesh_password: Option<String>,
    /// Bulb address, e.g. A4:C1:38:12:34:56 (overrides the config file)
    #[arg(short, long, global = true)]
    address: Option<String>,
    /// Destination mesh id (overrides the config file)
    #[arg(short, long, global = true)]
    dest: Option<u8>,
    /// Optional path to a file to write logs to, in addition to the console.
    #[arg(short, long, global = true)]
    log_file: Option<PathBuf>,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Derive the session key from the credentials and both randoms
    SessionKey {
        /// 8-byte session random, hex
        #[arg(long)]
        session_random: String,
        /// 8-byte response random, hex
        #[arg(long)]
        response_random: String,
    },
    /// Build the pairing request packet
    PairPacket {
        /// 8-byte session random, hex (random if omitted)
        #[arg(long)]
        session_random: Option<String>,
    },
    /// Encrypt a command packet offline
    Encode {
        /// 16-byte session key, hex
        #[arg(long)]
        key: String,
        /// Opcode byte, hex (e.g. d0)
        opcode: String,
        /// Command data, hex, up to 10 bytes
        #[arg(default_value = "")]
        data: String,
        /// 3-byte sequence, hex (random if omitted)
        #[arg(long)]
        sequence: Option<String>,
    },
    /// Verify and decrypt a 20-byte command packet
    Decode {
        /// 16-byte session key, hex
        #[arg(long)]
        key: String,
        /// 20-byte packet, hex
        packet: String,
    },
    /// Switch the bulb on or off
    #[cfg(feature = "ble")]
    Power {
        #[arg(value_enum)]
        state: PowerState,
    },
    /// Send an arbitrary command to the bulb
    #[cfg(feature = "ble")]
    Send {
        /// Opcode byte, hex
        opcode: String,
        /// Command data, hex, up to 10 bytes
        #[arg(default_value = "")]
        data: String,
    },
    /// Move the bulb to a new mesh name and password
    #[cfg(feature = "ble")]
    SetMesh {
        #[arg(long)]
        new_name: String,
        #[arg(long)]
        new_password: String,
        /// Long-term key, hex, up to 16 bytes
        #[arg(long, default_value = "")]
        long_term_key: String,
    },
}

#[cfg(feature = "ble")]
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PowerState {
    On,
    Off,
}

fn setup_logging(log_file_path: Option<PathBuf>, verbosity: &Verbosity<InfoLevel>) -> Result<Option<WorkerGuard>> {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .without_time();

    let (file_layer, guard) = if let Some(ref path) = log_file_path {
        let log_file = File::create(path).with_context(|| format!("Failed to create log file at: {:?}", path))?;
        let (non_blocking_writer, guard) = tracing_appender::non_blocking(log_file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking_writer)
            .with_ansi(false)
            .with_target(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    // INFO by default, DEBUG with -v, TRACE with -vv
    let filter = EnvFilter::builder()
        .with_default_directive(verbosity.tracing_level_filter().into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    if let Some(path) = log_file_path {
        info!("Logging to file: {:?}", path);
    }

    Ok(guard)
}

/// Config file (or defaults) with command-line overrides applied.
fn load_config(cli: &Cli) -> Result<MeshConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            MeshConfig::from_file(path).with_context(|| format!("Failed to load config from {:?}", path))?
        }
        None => MeshConfig::default(),
    };

    if let Some(name) = &cli.mesh_name {
        config.mesh_name = name.clone();
    }
    if let Some(password) = &cli.mesh_password {
        config.mesh_password = password.clone();
    }
    if let Some(address) = &cli.address {
        config.address = Some(parse_address(address)?);
    }
    if let Some(dest) = cli.dest {
        config.dest_id = dest;
    }

    debug!(?config, "Effective configuration");
    Ok(config)
}

fn parse_address(s: &str) -> Result<DeviceAddress> {
    s.parse().with_context(|| format!("Invalid bulb address '{}'", s))
}

fn parse_hex<const N: usize>(what: &str, s: &str) -> Result<[u8; N]> {
    let bytes = hex::decode(s.trim_start_matches("0x")).with_context(|| format!("{} is not valid hex", what))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| anyhow!("{} must be {} bytes, got {}", what, N, b.len()))
}

fn parse_data(s: &str) -> Result<Vec<u8>> {
    hex::decode(s).context("Command data is not valid hex")
}

fn parse_opcode(s: &str) -> Result<u8> {
    let [opcode] = parse_hex::<1>("Opcode", s)?;
    Ok(opcode)
}

fn required_address(config: &MeshConfig) -> Result<DeviceAddress> {
    config
        .address
        .ok_or_else(|| anyhow!("No bulb address given; use --address or set it in the config file"))
}

fn print_packet(packet: &CommandPacket) {
    println!("{}", hex::encode(packet.to_bytes()));
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let guard = setup_logging(cli.log_file.clone(), &cli.verbose)?;

    let status = finish(run(cli).await, guard);
    Ok(ExitCode::from(status))
}

/// Log the outcome and flush the log file before the process exits.
fn finish(result: Result<()>, guard: Option<WorkerGuard>) -> u8 {
    let status = match result {
        Ok(()) => 0,
        Err(e) => {
            error!("{:?}", e);
            1
        }
    };
    drop(guard);
    status
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let credentials = config.credentials();

    match cli.command {
        Command::SessionKey {
            ref session_random,
            ref response_random,
        } => {
            let session_random = SessionRandom(parse_hex("Session random", session_random)?);
            let response_random = ResponseRandom(parse_hex("Response random", response_random)?);
            let key = derive_session_key(&credentials, &session_random, &response_random);
            println!("{}", hex::encode(key.as_bytes()));
        }
        Command::PairPacket { ref session_random } => {
            let session_random = match session_random {
                Some(s) => SessionRandom(parse_hex("Session random", s)?),
                None => SessionRandom::generate(),
            };
            let packet = build_pair_packet(&credentials, &session_random);
            println!("{}", hex::encode(packet.to_bytes()));
        }
        Command::Encode {
            ref key,
            ref opcode,
            ref data,
            ref sequence,
        } => {
            let key = SessionKey::from_bytes(parse_hex("Session key", key)?);
            let address = required_address(&config)?;
            let opcode = parse_opcode(opcode)?;
            let data = parse_data(data)?;

            let packet = match sequence {
                Some(s) => build_command_packet_with_sequence(
                    &key,
                    &address,
                    config.dest_id,
                    opcode,
                    &data,
                    parse_hex("Sequence", s)?,
                )?,
                None => build_command_packet(&key, &address, config.dest_id, opcode, &data)?,
            };
            print_packet(&packet);
        }
        Command::Decode { ref key, ref packet } => {
            let key = SessionKey::from_bytes(parse_hex("Session key", key)?);
            let address = required_address(&config)?;
            let bytes: [u8; 20] = parse_hex("Packet", packet)?;
            let packet = CommandPacket::try_from(&bytes[..])?;

            let payload = open_command_packet(&key, &address, &packet).context("Packet failed verification")?;
            println!("sequence: {}", hex::encode(packet.sequence));
            println!("dest_id:  {}", payload.dest_id);
            match payload.opcode() {
                Opcode::Unknown(op) => println!("opcode:   {:#04x}", op),
                op => println!("opcode:   {:#04x} ({})", u8::from(op), op),
            }
            println!("data:     {}", hex::encode(payload.data));
        }
        #[cfg(feature = "ble")]
        Command::Power { state } => {
            let data = match state {
                PowerState::On => [0x01],
                PowerState::Off => [0x00],
            };
            live::send(&config, Opcode::Power.into(), &data).await?;
        }
        #[cfg(feature = "ble")]
        Command::Send { ref opcode, ref data } => {
            live::send(&config, parse_opcode(opcode)?, &parse_data(data)?).await?;
        }
        #[cfg(feature = "ble")]
        Command::SetMesh {
            ref new_name,
            ref new_password,
            ref long_term_key,
        } => {
            let long_term_key = parse_data(long_term_key)?;
            if long_term_key.len() > 16 {
                anyhow::bail!("Long-term key must be at most 16 bytes, got {}", long_term_key.len());
            }
            let new_credentials = meshlight_lib::MeshCredentials::new(new_name, new_password);
            live::set_mesh(&config, &new_credentials, &long_term_key).await?;
        }
    }

    Ok(())
}

#[cfg(feature = "ble")]
mod live {
    use anyhow::{Context, Result};
    use tracing::info;

    use meshlight_lib::ble::{BleLink, BleTransport};
    use meshlight_lib::{Connection, MeshConfig, MeshCredentials};

    use super::required_address;

    async fn connect(config: &MeshConfig) -> Result<Connection<BleLink>> {
        let address = required_address(config)?;
        let transport = BleTransport::new(config.scan_duration())
            .await
            .context("Failed to open Bluetooth adapter")?;
        Connection::establish(&transport, address, &config.credentials(), config.connection_options())
            .await
            .with_context(|| format!("Failed to pair with {}", address))
    }

    pub async fn send(config: &MeshConfig, opcode: u8, data: &[u8]) -> Result<()> {
        let mut connection = connect(config).await?;
        let packet = connection.send_command(config.dest_id, opcode, data).await;
        connection.disconnect().await.context("Failed to disconnect")?;

        let packet = packet.context("Failed to send command")?;
        info!(packet = %hex::encode(packet.to_bytes()), "Command sent");
        Ok(())
    }

    pub async fn set_mesh(config: &MeshConfig, new_credentials: &MeshCredentials, long_term_key: &[u8]) -> Result<()> {
        let mut connection = connect(config).await?;
        let result = connection.set_mesh(new_credentials, long_term_key).await;
        connection.disconnect().await.context("Failed to disconnect")?;

        result.context("Mesh update failed")?;
        info!(mesh = %new_credentials.display_name(), "Bulb moved to new mesh");
        Ok(())
    }
}
