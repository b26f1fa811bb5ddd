//! Output sample formats and repacking from canonical buffers.

use morsesrc_cw::{SampleBuffer, SampleEncoding};
use phf::phf_map;

use crate::error::FormatError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    pub const NATIVE: Endianness = if cfg!(target_endian = "little") {
        Endianness::Little
    } else {
        Endianness::Big
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleKind {
    Signed,
    Unsigned,
    Float,
}

/// Layout of one sample on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WireFormat {
    name: &'static str,
    kind: SampleKind,
    /// Storage bits per sample.
    width: u8,
    /// Significant bits per sample.
    depth: u8,
    endianness: Endianness,
}

const fn int(
    name: &'static str,
    signed: bool,
    width: u8,
    depth: u8,
    endianness: Endianness,
) -> WireFormat {
    WireFormat {
        name,
        kind: if signed {
            SampleKind::Signed
        } else {
            SampleKind::Unsigned
        },
        width,
        depth,
        endianness,
    }
}

const fn float(name: &'static str, width: u8, endianness: Endianness) -> WireFormat {
    WireFormat {
        name,
        kind: SampleKind::Float,
        width,
        depth: width,
        endianness,
    }
}

use Endianness::{Big as BE, Little as LE};

static FORMATS: phf::Map<&'static str, WireFormat> = phf_map! {
    "S8" => int("S8", true, 8, 8, LE),
    "U8" => int("U8", false, 8, 8, LE),
    "S16LE" => int("S16LE", true, 16, 16, LE),
    "S16BE" => int("S16BE", true, 16, 16, BE),
    "U16LE" => int("U16LE", false, 16, 16, LE),
    "U16BE" => int("U16BE", false, 16, 16, BE),
    "S24_32LE" => int("S24_32LE", true, 32, 24, LE),
    "S24_32BE" => int("S24_32BE", true, 32, 24, BE),
    "U24_32LE" => int("U24_32LE", false, 32, 24, LE),
    "U24_32BE" => int("U24_32BE", false, 32, 24, BE),
    "S32LE" => int("S32LE", true, 32, 32, LE),
    "S32BE" => int("S32BE", true, 32, 32, BE),
    "U32LE" => int("U32LE", false, 32, 32, LE),
    "U32BE" => int("U32BE", false, 32, 32, BE),
    "S24LE" => int("S24LE", true, 24, 24, LE),
    "S24BE" => int("S24BE", true, 24, 24, BE),
    "U24LE" => int("U24LE", false, 24, 24, LE),
    "U24BE" => int("U24BE", false, 24, 24, BE),
    "S20LE" => int("S20LE", true, 24, 20, LE),
    "S20BE" => int("S20BE", true, 24, 20, BE),
    "U20LE" => int("U20LE", false, 24, 20, LE),
    "U20BE" => int("U20BE", false, 24, 20, BE),
    "S18LE" => int("S18LE", true, 24, 18, LE),
    "S18BE" => int("S18BE", true, 24, 18, BE),
    "U18LE" => int("U18LE", false, 24, 18, LE),
    "U18BE" => int("U18BE", false, 24, 18, BE),
    "F32LE" => float("F32LE", 32, LE),
    "F32BE" => float("F32BE", 32, BE),
    "F64LE" => float("F64LE", 64, LE),
    "F64BE" => float("F64BE", 64, BE),
};

impl WireFormat {
    /// Parse a format name such as `S16LE` or `f32be`. Names without a byte
    /// order suffix resolve to native byte order.
    pub fn from_name(name: &str) -> Result<Self, FormatError> {
        let upper = name.trim().to_ascii_uppercase();
        if let Some(format) = FORMATS.get(upper.as_str()) {
            return Ok(*format);
        }

        let suffix = match Endianness::NATIVE {
            Endianness::Little => "LE",
            Endianness::Big => "BE",
        };
        FORMATS
            .get(format!("{upper}{suffix}").as_str())
            .copied()
            .ok_or_else(|| FormatError::UnknownFormat(name.to_string()))
    }

    /// Native-endian 16-bit signed, the default output format.
    pub fn native_s16() -> Self {
        match Endianness::NATIVE {
            Endianness::Little => int("S16LE", true, 16, 16, LE),
            Endianness::Big => int("S16BE", true, 16, 16, BE),
        }
    }

    /// Native-endian 32-bit float.
    pub fn native_f32() -> Self {
        match Endianness::NATIVE {
            Endianness::Little => float("F32LE", 32, LE),
            Endianness::Big => float("F32BE", 32, BE),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> SampleKind {
        self.kind
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.width as usize / 8
    }

    /// The canonical encoding the synthesizer renders for this format, and
    /// whether the result must be repacked afterwards.
    pub fn canonical(&self) -> (SampleEncoding, bool) {
        let native = self.endianness == Endianness::NATIVE;
        match (self.kind, self.width, self.depth) {
            (SampleKind::Signed, 16, 16) if native => (SampleEncoding::I16, false),
            (SampleKind::Signed, 32, 32) if native => (SampleEncoding::I32, false),
            (SampleKind::Float, 32, _) if native => (SampleEncoding::F32, false),
            (SampleKind::Float, 64, _) if native => (SampleEncoding::F64, false),
            (SampleKind::Float, _, _) => (SampleEncoding::F64, true),
            _ => (SampleEncoding::I32, true),
        }
    }
}

impl std::fmt::Display for WireFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

/// A negotiated output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioInfo {
    pub format: WireFormat,
    pub rate: u32,
    pub channels: u16,
}

impl AudioInfo {
    pub fn new(format: WireFormat, rate: u32, channels: u16) -> Result<Self, FormatError> {
        if rate == 0 {
            return Err(FormatError::ZeroRate);
        }
        if channels == 0 {
            return Err(FormatError::ZeroChannels);
        }
        Ok(Self {
            format,
            rate,
            channels,
        })
    }

    pub fn bytes_per_frame(&self) -> usize {
        self.format.bytes_per_sample() * self.channels as usize
    }
}

/// Convert a canonical buffer into the wire layout of `format`.
pub fn pack(samples: &SampleBuffer, format: &WireFormat) -> Vec<u8> {
    match (format.canonical(), samples) {
        ((_, false), _) => samples.to_ne_bytes(),
        (_, SampleBuffer::I32(values)) => pack_int(values, format),
        (_, SampleBuffer::F64(values)) => pack_float(values, format),
        // Only I32 and F64 are ever repacked.
        (_, other) => other.to_ne_bytes(),
    }
}

fn pack_int(values: &[i32], format: &WireFormat) -> Vec<u8> {
    let depth = format.depth as u32;
    let bytes = format.bytes_per_sample();
    let depth_mask = if depth >= 32 {
        u32::MAX
    } else {
        (1u32 << depth) - 1
    };
    let mut out = Vec::with_capacity(values.len() * bytes);

    for &value in values {
        let shifted = value >> (32 - depth);
        let bits = match format.kind {
            SampleKind::Unsigned => ((shifted as u32) ^ (1 << (depth - 1))) & depth_mask,
            _ => shifted as u32,
        };
        match format.endianness {
            Endianness::Little => out.extend_from_slice(&bits.to_le_bytes()[..bytes]),
            Endianness::Big => out.extend_from_slice(&bits.to_be_bytes()[4 - bytes..]),
        }
    }

    out
}

fn pack_float(values: &[f64], format: &WireFormat) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * format.bytes_per_sample());
    for &value in values {
        match (format.width, format.endianness) {
            (32, Endianness::Little) => out.extend_from_slice(&(value as f32).to_le_bytes()),
            (32, Endianness::Big) => out.extend_from_slice(&(value as f32).to_be_bytes()),
            (_, Endianness::Little) => out.extend_from_slice(&value.to_le_bytes()),
            (_, Endianness::Big) => out.extend_from_slice(&value.to_be_bytes()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(name: &str) -> WireFormat {
        WireFormat::from_name(name).expect("known format")
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!(fmt("s16le").name(), "S16LE");
        assert_eq!(fmt(" F64BE ").name(), "F64BE");
        assert_eq!(fmt("S16"), WireFormat::native_s16());
        assert_eq!(fmt("F32"), WireFormat::native_f32());
        assert_eq!(fmt("U8").bytes_per_sample(), 1);
        assert!(matches!(
            WireFormat::from_name("MP3"),
            Err(FormatError::UnknownFormat(name)) if name == "MP3"
        ));
    }

    #[test]
    fn all_formats_map_to_a_canonical_encoding() {
        for (name, format) in FORMATS.entries() {
            let (encoding, repack) = format.canonical();
            match format.kind() {
                SampleKind::Float if repack => assert_eq!(encoding, SampleEncoding::F64, "{name}"),
                SampleKind::Float => {
                    assert!(matches!(encoding, SampleEncoding::F32 | SampleEncoding::F64))
                }
                _ if repack => assert_eq!(encoding, SampleEncoding::I32, "{name}"),
                _ => assert!(matches!(encoding, SampleEncoding::I16 | SampleEncoding::I32)),
            }
        }
    }

    #[test]
    fn native_formats_render_directly() {
        assert_eq!(WireFormat::native_s16().canonical(), (SampleEncoding::I16, false));
        assert_eq!(WireFormat::native_f32().canonical(), (SampleEncoding::F32, false));
        assert_eq!(fmt("S32").canonical(), (SampleEncoding::I32, false));
        assert_eq!(fmt("F64").canonical(), (SampleEncoding::F64, false));
        assert_eq!(fmt("U16LE").canonical(), (SampleEncoding::I32, true));
        assert_eq!(fmt("S24LE").canonical(), (SampleEncoding::I32, true));
    }

    #[test]
    fn packs_signed_24_bit_little_endian() {
        let samples = SampleBuffer::I32(vec![0x1234_5678, -0x100]);
        assert_eq!(pack(&samples, &fmt("S24LE")), vec![0x56, 0x34, 0x12, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn packs_signed_24_bit_big_endian() {
        let samples = SampleBuffer::I32(vec![0x1234_5678]);
        assert_eq!(pack(&samples, &fmt("S24BE")), vec![0x12, 0x34, 0x56]);
    }

    #[test]
    fn packs_unsigned_with_offset() {
        let samples = SampleBuffer::I32(vec![0, i32::MIN, i32::MAX]);
        assert_eq!(pack(&samples, &fmt("U8")), vec![0x80, 0x00, 0xFF]);
        assert_eq!(
            pack(&samples, &fmt("U16BE")),
            vec![0x80, 0x00, 0x00, 0x00, 0xFF, 0xFF]
        );
    }

    #[test]
    fn packs_24_in_32_sign_extended() {
        let samples = SampleBuffer::I32(vec![-256]);
        assert_eq!(pack(&samples, &fmt("S24_32LE")), vec![0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(pack(&samples, &fmt("U24_32LE")), vec![0xFF, 0xFF, 0x7F, 0x00]);
    }

    #[test]
    fn packs_20_and_18_bit() {
        let samples = SampleBuffer::I32(vec![i32::MAX]);
        assert_eq!(pack(&samples, &fmt("S20LE")), vec![0xFF, 0xFF, 0x07]);
        assert_eq!(pack(&samples, &fmt("S18BE")), vec![0x01, 0xFF, 0xFF]);
    }

    #[test]
    fn packs_foreign_endian_float() {
        let samples = SampleBuffer::F64(vec![0.5]);
        assert_eq!(pack(&samples, &fmt("F32BE")), 0.5f32.to_be_bytes().to_vec());
        assert_eq!(pack(&samples, &fmt("F64BE")), 0.5f64.to_be_bytes().to_vec());
    }

    #[test]
    fn audio_info_rejects_degenerate_formats() {
        assert_eq!(AudioInfo::new(fmt("S16"), 0, 1), Err(FormatError::ZeroRate));
        assert_eq!(AudioInfo::new(fmt("S16"), 8_000, 0), Err(FormatError::ZeroChannels));
        let info = AudioInfo::new(fmt("S24LE"), 8_000, 2).expect("valid");
        assert_eq!(info.bytes_per_frame(), 6);
    }
}
