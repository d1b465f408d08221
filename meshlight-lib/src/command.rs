use num_enum::{FromPrimitive, IntoPrimitive};
use strum_macros::Display;

/// Command opcodes understood by the bulbs.
///
/// Only the opcode byte is defined here; encoding of the data bytes for each
/// opcode is up to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum Opcode {
    /// 3 bytes
    MeshGroup = 0xd7,
    /// New mesh id, u16 little-endian
    MeshAddress = 0xe0,
    /// Restore default mesh name and password
    MeshReset = 0xe3,
    /// 0x00 off, 0x01 on
    Power = 0xd0,
    LightMode = 0x33,
    /// Preset sequence 0..=6
    Preset = 0xc8,
    /// 0..=0x7f
    WhiteTemperature = 0xf0,
    /// 1..=0x7f
    WhiteBrightness = 0xf1,
    /// 0x04, red, green, blue
    Color = 0xe2,
    /// 0x0a..=0x64
    ColorBrightness = 0xf2,
    /// Milliseconds, u32 little-endian
    SequenceColorDuration = 0xf5,
    /// Milliseconds, u32 little-endian
    SequenceFadeDuration = 0xf6,
    /// 7 bytes
    Time = 0xe4,
    /// 10 bytes
    Alarms = 0xe5,

    #[num_enum(catch_all)]
    Unknown(u8),
}
