//! Declarative control map
//!
//! The map describes where every logical control lives inside a frame: byte
//! offset, bit mask or matched value, and the output code emitted when the
//! control changes. The schema stays plain serde data so a layout can be
//! stored as a portable asset; bounds are validated once when the layout is
//! turned into a [`ControlMap`], never during diffing.

use crate::{PAYLOAD_LEN, ProtocolError, ProtocolResult};
use serde::{Deserialize, Serialize};

/// Sentinel output code for controls that participate in diffing but never
/// emit.
pub const OUTPUT_NONE: u16 = 0;

/// A momentary button backed by a single bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ButtonDef {
    /// Source byte offset in the frame payload.
    pub byte: u8,
    /// One-hot bit mask.
    pub mask: u8,
    /// Output code, or [`OUTPUT_NONE`].
    pub code: u16,
}

impl ButtonDef {
    pub const fn new(byte: u8, mask: u8, code: u16) -> Self {
        Self { byte, mask, code }
    }
}

/// One position of a multi-state selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelectorState {
    /// Byte value the selector reports while in this position.
    pub value: u8,
    /// Whether entering/leaving this position behaves like a button edge.
    /// Positions without this flag are pure polled status and never emit.
    pub as_button: bool,
    /// Output code, or [`OUTPUT_NONE`].
    pub code: u16,
}

impl SelectorState {
    pub const fn new(value: u8, as_button: bool, code: u16) -> Self {
        Self {
            value,
            as_button,
            code,
        }
    }
}

/// A selector switch whose position is reported as one byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelectorDef {
    /// Source byte offset in the frame payload.
    pub byte: u8,
    pub states: Vec<SelectorState>,
}

impl SelectorDef {
    pub fn new(byte: u8, states: Vec<SelectorState>) -> Self {
        Self { byte, states }
    }
}

/// Number of contiguous payload bytes an encoder counter occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncoderWidth {
    One,
    Two,
}

impl EncoderWidth {
    pub const fn byte_len(self) -> usize {
        match self {
            EncoderWidth::One => 1,
            EncoderWidth::Two => 2,
        }
    }
}

/// A relative encoder exposed as a free-running big-endian counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EncoderDef {
    /// Offset of the counter's most significant byte.
    pub byte: u8,
    pub width: EncoderWidth,
    /// Synthesize a press+release pulse per detected tick. When unset the
    /// encoder participates in diffing but emits nothing.
    pub pulse_on_turn: bool,
    /// Output code for counter decreases, or [`OUTPUT_NONE`].
    pub left_code: u16,
    /// Output code for counter increases, or [`OUTPUT_NONE`].
    pub right_code: u16,
}

impl EncoderDef {
    pub const fn new(
        byte: u8,
        width: EncoderWidth,
        pulse_on_turn: bool,
        left_code: u16,
        right_code: u16,
    ) -> Self {
        Self {
            byte,
            width,
            pulse_on_turn,
            left_code,
            right_code,
        }
    }
}

/// The jog wheel: one status byte carrying moving / direction / pressed bits.
///
/// Bit layout of the status byte: `0x08` moving, `0x04` direction,
/// `0x02` wheel pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JogDef {
    /// Source byte offset in the frame payload.
    pub byte: u8,
    /// Translate sustained motion into held left/right keys. When unset the
    /// motion bits are ignored and only the pressed bit emits.
    pub pulse_on_turn: bool,
    /// Output code for the wheel's pressed bit, or [`OUTPUT_NONE`].
    pub button_code: u16,
    pub left_code: u16,
    pub right_code: u16,
}

impl JogDef {
    pub const fn new(
        byte: u8,
        pulse_on_turn: bool,
        button_code: u16,
        left_code: u16,
        right_code: u16,
    ) -> Self {
        Self {
            byte,
            pulse_on_turn,
            button_code,
            left_code,
            right_code,
        }
    }
}

/// Unvalidated control layout as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapLayout {
    #[serde(default)]
    pub buttons: Vec<ButtonDef>,
    #[serde(default)]
    pub selectors: Vec<SelectorDef>,
    #[serde(default)]
    pub encoders: Vec<EncoderDef>,
    #[serde(default)]
    pub jogs: Vec<JogDef>,
}

/// Validated, immutable control map.
///
/// Every byte offset referenced by the layout is known to lie inside the
/// frame payload, so the differ can index frames without per-pass checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlMap {
    layout: MapLayout,
}

impl ControlMap {
    /// Validate a layout and freeze it into a map.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::OffsetOutOfBounds`] for any definition that
    /// reaches past the frame payload (the checksum trailer is not
    /// addressable by controls).
    pub fn new(layout: MapLayout) -> ProtocolResult<Self> {
        for button in &layout.buttons {
            check_offset("button", button.byte, 1)?;
        }
        for selector in &layout.selectors {
            check_offset("selector", selector.byte, 1)?;
        }
        for encoder in &layout.encoders {
            check_offset("encoder", encoder.byte, encoder.width.byte_len())?;
        }
        for jog in &layout.jogs {
            check_offset("jog", jog.byte, 1)?;
        }
        Ok(Self { layout })
    }

    pub fn buttons(&self) -> &[ButtonDef] {
        &self.layout.buttons
    }

    pub fn selectors(&self) -> &[SelectorDef] {
        &self.layout.selectors
    }

    pub fn encoders(&self) -> &[EncoderDef] {
        &self.layout.encoders
    }

    pub fn jogs(&self) -> &[JogDef] {
        &self.layout.jogs
    }

    /// Every mapped button output code, in layout order.
    ///
    /// Sinks use this to declare capability for the codes they will receive
    /// before the first emission.
    pub fn button_codes(&self) -> impl Iterator<Item = u16> + '_ {
        self.layout
            .buttons
            .iter()
            .map(|button| button.code)
            .filter(|&code| code != OUTPUT_NONE)
    }

    pub fn layout(&self) -> &MapLayout {
        &self.layout
    }
}

impl TryFrom<MapLayout> for ControlMap {
    type Error = ProtocolError;

    fn try_from(layout: MapLayout) -> ProtocolResult<Self> {
        Self::new(layout)
    }
}

fn check_offset(control: &'static str, byte: u8, span: usize) -> ProtocolResult<()> {
    if usize::from(byte) + span > PAYLOAD_LEN {
        return Err(ProtocolError::OffsetOutOfBounds {
            control,
            byte,
            limit: PAYLOAD_LEN,
        });
    }
    Ok(())
}
