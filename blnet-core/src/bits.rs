//! Byte and bit helpers for the BL-NET/D-LOGG binary protocol
//!
//! Multi-byte fields in the data frames are little-endian. Analog inputs are
//! 16-bit words that pack a 12-bit two's-complement magnitude, a 3-bit input
//! type tag (bits 4-6 of the high byte) and a sign flag (bit 7 of the high
//! byte) into one word.

/// Sign flag in the high byte of an input word
pub const SIGN_BIT: u8 = 0x80;
/// Input type tag in the high byte of an input word
pub const UNIT_MASK: u8 = 0x70;
/// Magnitude nibble in the high byte of an input word
pub const HIGH_NIBBLE_MASK: u8 = 0x0F;

/// Combine a low and a high byte into a 16-bit word
pub fn combine16(lo: u8, hi: u8) -> u16 {
    (u16::from(hi) << 8) | u16::from(lo)
}

/// Combine four bytes (least significant first) into a 32-bit word
pub fn combine32(b0: u8, b1: u8, b2: u8, b3: u8) -> u32 {
    u32::from(combine16(b0, b1)) | (u32::from(combine16(b2, b3)) << 16)
}

/// Decoded analog input word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signed12 {
    /// Signed magnitude (-4096..=4095)
    pub value: i16,
    /// Input type tag, still in place (0x00, 0x10, ... 0x70)
    pub unit_bits: u8,
    /// The word as received
    pub raw: u16,
}

impl Signed12 {
    /// Bit 15 of the received word
    pub fn sign_flag(&self) -> bool {
        self.raw & 0x8000 != 0
    }
}

/// Decode a 12-bit signed magnitude with an embedded type tag
///
/// The type tag sits between the sign flag and the magnitude, so a plain
/// sign extension of bit 11 gives wrong results. The tag bits are cleared
/// first; negative values get bits 12-15 restored before the two's
/// complement is taken.
pub fn decode_signed12(word: u16) -> Signed12 {
    let high = (word >> 8) as u8;
    let low = (word & 0xFF) as u8;
    let sign = high & SIGN_BIT;
    let unit_bits = high & UNIT_MASK;

    let mut magnitude = combine16(low, high & HIGH_NIBBLE_MASK);
    let value = if sign != 0 {
        magnitude |= 0xF000;
        let complement = (!magnitude).wrapping_add(1);
        -(i32::from(complement)) as i16
    } else {
        magnitude as i16
    };

    Signed12 {
        value,
        unit_bits,
        raw: word,
    }
}

/// Pack a signed magnitude and a type tag back into an input word
///
/// Inverse of [`decode_signed12`] for values in -4096..=4095.
pub fn encode_signed12(value: i16, unit_bits: u8) -> u16 {
    let sign = if value < 0 { SIGN_BIT } else { 0 };
    let magnitude = (value as u16) & 0x0FFF;
    let high = sign | (unit_bits & UNIT_MASK) | ((magnitude >> 8) as u8);
    combine16((magnitude & 0xFF) as u8, high)
}
