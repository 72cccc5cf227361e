//! Endianness detection and the header framing shared by every serialized stream.
//!
//! All on-disk values are written in the host's endianness at the time of writing, tagged with
//! a single byte so a reader on a different-endian host can detect the mismatch and swap every
//! multi-byte value back (`examples/original_source/kche-tree/endianness.h`'s
//! `Endianness`/`EndiannessSwapper` pair, adapted to a tag-byte-plus-swap-on-read scheme rather
//! than a compile-time swapper type, since Rust has no portable way to select an `Endianness`
//! type at compile time the way the C++ original did with template specialization).
use crate::error::DeserializationError;
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

pub const BIG_ENDIAN_TAG: u8 = 0x00;
pub const LITTLE_ENDIAN_TAG: u8 = 0x01;
pub const FORMAT_MAJOR: u16 = 1;
pub const FORMAT_MINOR: u16 = 0;
pub const TRAILING_SIGNATURE: u16 = 0xCAFE;

/// Whether the host this process is running on is little-endian.
#[inline]
pub fn host_is_little_endian() -> bool {
    cfg!(target_endian = "little")
}

/// Writes the endianness tag byte for the current host.
pub fn write_endianness_tag<W: Write>(out: &mut W) -> io::Result<()> {
    let tag = if host_is_little_endian() {
        LITTLE_ENDIAN_TAG
    } else {
        BIG_ENDIAN_TAG
    };
    out.write_u8(tag)
}

/// Reads the endianness tag byte and returns whether the stream needs swapping to match the
/// host (i.e. the stream's endianness differs from ours).
pub fn read_needs_swap<R: Read>(input: &mut R) -> Result<bool, DeserializationError> {
    let tag = input
        .read_u8()
        .map_err(|_| DeserializationError::TruncatedStream { read: 0, needed: 1 })?;
    let stream_is_little = match tag {
        LITTLE_ENDIAN_TAG => true,
        BIG_ENDIAN_TAG => false,
        other => return Err(DeserializationError::BadEndiannessTag(other)),
    };
    Ok(stream_is_little != host_is_little_endian())
}

/// Writes the two-part (major, minor) version in host endianness.
pub fn write_version<W: WriteBytesExt>(out: &mut W) -> io::Result<()> {
    write_u16_host(out, FORMAT_MAJOR)?;
    write_u16_host(out, FORMAT_MINOR)
}

/// Reads and validates the version, swapping bytes first if `needs_swap`.
pub fn read_version<R: ReadBytesExt>(
    input: &mut R,
    needs_swap: bool,
) -> Result<(), DeserializationError> {
    let major = read_u16_host(input, needs_swap)?;
    let minor = read_u16_host(input, needs_swap)?;
    if major != FORMAT_MAJOR || minor != FORMAT_MINOR {
        return Err(DeserializationError::UnsupportedVersion { major, minor });
    }
    Ok(())
}

/// Writes a length-prefixed ASCII type tag (spec §6 item 3).
pub fn write_type_tag<W: WriteBytesExt>(out: &mut W, tag: &str) -> io::Result<()> {
    write_u16_host(out, tag.len() as u16)?;
    out.write_all(tag.as_bytes())
}

/// Reads a length-prefixed ASCII type tag and checks it against `expected`.
pub fn read_type_tag<R: ReadBytesExt>(
    input: &mut R,
    needs_swap: bool,
    expected: &'static str,
) -> Result<(), DeserializationError> {
    let len = read_u16_host(input, needs_swap)? as usize;
    let mut raw = vec![0u8; len];
    input
        .read_exact(&mut raw)
        .map_err(|_| DeserializationError::TruncatedStream {
            read: 0,
            needed: len,
        })?;
    let found = String::from_utf8_lossy(&raw).into_owned();
    if found != expected {
        return Err(DeserializationError::TypeTagMismatch { found, expected });
    }
    Ok(())
}

pub fn write_u16_host<W: WriteBytesExt>(out: &mut W, v: u16) -> io::Result<()> {
    if host_is_little_endian() {
        out.write_u16::<byteorder::LittleEndian>(v)
    } else {
        out.write_u16::<byteorder::BigEndian>(v)
    }
}

pub fn read_u16_host<R: ReadBytesExt>(
    input: &mut R,
    needs_swap: bool,
) -> Result<u16, DeserializationError> {
    let v = input
        .read_u16::<byteorder::NativeEndian>()
        .map_err(|_| DeserializationError::TruncatedStream { read: 0, needed: 2 })?;
    Ok(if needs_swap { v.swap_bytes() } else { v })
}

pub fn write_u32_host<W: WriteBytesExt>(out: &mut W, v: u32) -> io::Result<()> {
    out.write_u32::<byteorder::NativeEndian>(v)
}

pub fn read_u32_host<R: ReadBytesExt>(
    input: &mut R,
    needs_swap: bool,
) -> Result<u32, DeserializationError> {
    let v = input
        .read_u32::<byteorder::NativeEndian>()
        .map_err(|_| DeserializationError::TruncatedStream { read: 0, needed: 4 })?;
    Ok(if needs_swap { v.swap_bytes() } else { v })
}

/// Writes the trailing 16-bit signature that closes every stream.
pub fn write_signature<W: WriteBytesExt>(out: &mut W) -> io::Result<()> {
    write_u16_host(out, TRAILING_SIGNATURE)
}

/// Reads and checks the trailing signature.
pub fn read_signature<R: ReadBytesExt>(
    input: &mut R,
    needs_swap: bool,
) -> Result<(), DeserializationError> {
    let found = read_u16_host(input, needs_swap)?;
    if found != TRAILING_SIGNATURE {
        return Err(DeserializationError::BadSignature { found });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn endianness_tag_round_trips() {
        let mut buf = Vec::new();
        write_endianness_tag(&mut buf).unwrap();
        let mut cursor = Cursor::new(buf);
        assert!(!read_needs_swap(&mut cursor).unwrap());
    }

    #[test]
    fn bad_tag_is_rejected() {
        let mut cursor = Cursor::new(vec![0x7Fu8]);
        assert!(matches!(
            read_needs_swap(&mut cursor),
            Err(DeserializationError::BadEndiannessTag(0x7F))
        ));
    }

    #[test]
    fn version_round_trips() {
        let mut buf = Vec::new();
        write_version(&mut buf).unwrap();
        let mut cursor = Cursor::new(buf);
        assert!(read_version(&mut cursor, false).is_ok());
    }

    #[test]
    fn type_tag_mismatch_is_detected() {
        let mut buf = Vec::new();
        write_type_tag(&mut buf, "f32").unwrap();
        let mut cursor = Cursor::new(buf);
        let err = read_type_tag(&mut cursor, false, "f64").unwrap_err();
        assert!(matches!(err, DeserializationError::TypeTagMismatch { .. }));
    }

    #[test]
    fn signature_round_trips() {
        let mut buf = Vec::new();
        write_signature(&mut buf).unwrap();
        let mut cursor = Cursor::new(buf);
        assert!(read_signature(&mut cursor, false).is_ok());
    }
}
