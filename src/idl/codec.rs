//! Binary encoding of argument values
//!
//! Everything Borsh defines (little-endian integers and floats, one-byte
//! bools, 32-byte keys, u32-prefixed strings and byte vectors, u8-tagged
//! options) is written with [`borsh`]. The Codama extensions on top of it
//! are written here: big-endian numbers, shortU16, other length prefix
//! widths and prefix-less (remainder) strings and bytes.

use super::types::{ArgumentValue, Endian, NumberFormat, SizePrefix, TypeDescriptor};
use crate::{Error, Result};
use borsh::BorshSerialize;

/// Encode `value` as declared by `ty`. `name` is used in error messages.
pub fn encode_value(name: &str, ty: &TypeDescriptor, value: &ArgumentValue) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    write_value(name, ty, value, &mut out)?;
    Ok(out)
}

/// Append the Borsh encoding of `value`
fn write_borsh<T: BorshSerialize>(name: &str, value: &T, out: &mut Vec<u8>) -> Result<()> {
    borsh::to_writer(&mut *out, value)
        .map_err(|e| Error::invalid_argument(name, format!("borsh encoding failed: {}", e)))
}

const BORSH_LENGTH: SizePrefix = SizePrefix::Prefixed {
    format: NumberFormat::U32,
};

fn write_value(
    name: &str,
    ty: &TypeDescriptor,
    value: &ArgumentValue,
    out: &mut Vec<u8>,
) -> Result<()> {
    let mismatch = || {
        Error::invalid_argument(
            name,
            format!("expected {}, got {}", ty, value.kind_name()),
        )
    };

    match (ty, value) {
        (TypeDescriptor::Number { format, endian }, _) => {
            write_number(name, *format, *endian, value, out)
        }
        (TypeDescriptor::Boolean, ArgumentValue::Bool(b)) => write_borsh(name, b, out),
        (TypeDescriptor::PublicKey, ArgumentValue::PublicKey(key)) => {
            write_borsh(name, &key.to_bytes(), out)
        }
        (TypeDescriptor::String { size }, ArgumentValue::String(s)) if *size == BORSH_LENGTH => {
            write_borsh(name, s, out)
        }
        (TypeDescriptor::String { size }, ArgumentValue::String(s)) => {
            write_sized(name, *size, s.as_bytes(), out)
        }
        (TypeDescriptor::Bytes { size }, ArgumentValue::Bytes(bytes)) if *size == BORSH_LENGTH => {
            write_borsh(name, bytes, out)
        }
        (TypeDescriptor::Bytes { size }, ArgumentValue::Bytes(bytes)) => {
            write_sized(name, *size, bytes, out)
        }
        (TypeDescriptor::FixedBytes { len }, ArgumentValue::Bytes(bytes)) => {
            if bytes.len() != *len {
                return Err(Error::invalid_argument(
                    name,
                    format!("expected {} bytes, got {}", len, bytes.len()),
                ));
            }
            out.extend_from_slice(bytes);
            Ok(())
        }
        (TypeDescriptor::Option { prefix, .. }, ArgumentValue::None) => {
            write_number(name, *prefix, Endian::Little, &ArgumentValue::Unsigned(0), out)
        }
        (TypeDescriptor::Option { inner, prefix }, ArgumentValue::Some(v)) => {
            write_number(name, *prefix, Endian::Little, &ArgumentValue::Unsigned(1), out)?;
            write_value(name, inner, v, out)
        }
        // A bare value for an optional type means "present"
        (TypeDescriptor::Option { inner, prefix }, v) => {
            write_number(name, *prefix, Endian::Little, &ArgumentValue::Unsigned(1), out)?;
            write_value(name, inner, v, out)
        }
        _ => Err(mismatch()),
    }
}

/// Strings and bytes whose length prefix is not Borsh's u32
fn write_sized(name: &str, size: SizePrefix, bytes: &[u8], out: &mut Vec<u8>) -> Result<()> {
    if let SizePrefix::Prefixed { format } = size {
        let len = ArgumentValue::Unsigned(bytes.len() as u128);
        write_number(name, format, Endian::Little, &len, out)?;
    }
    out.extend_from_slice(bytes);
    Ok(())
}

macro_rules! put_int {
    ($name:expr, $ty:ty, $v:expr, $endian:expr, $out:expr) => {{
        let v = <$ty>::try_from($v).map_err(|_| {
            Error::invalid_argument($name, format!("{} out of range for {}", $v, stringify!($ty)))
        })?;
        match $endian {
            Endian::Little => write_borsh($name, &v, $out)?,
            Endian::Big => $out.extend_from_slice(&v.to_be_bytes()),
        }
    }};
}

fn write_number(
    name: &str,
    format: NumberFormat,
    endian: Endian,
    value: &ArgumentValue,
    out: &mut Vec<u8>,
) -> Result<()> {
    if format.is_float() {
        let v = match value {
            ArgumentValue::Float(f) => *f,
            ArgumentValue::Unsigned(u) => *u as f64,
            ArgumentValue::Signed(i) => *i as f64,
            other => {
                return Err(Error::invalid_argument(
                    name,
                    format!("expected {}, got {}", format, other.kind_name()),
                ))
            }
        };
        // borsh rejects NaN
        match (format, endian) {
            (NumberFormat::F32, Endian::Little) => write_borsh(name, &(v as f32), out)?,
            (NumberFormat::F32, Endian::Big) => out.extend_from_slice(&(v as f32).to_be_bytes()),
            (_, Endian::Little) => write_borsh(name, &v, out)?,
            (_, Endian::Big) => out.extend_from_slice(&v.to_be_bytes()),
        }
        return Ok(());
    }

    // Widen to i128 first so range checks happen per target width
    let wide: i128 = match value {
        ArgumentValue::Signed(i) => *i,
        ArgumentValue::Unsigned(u) if format == NumberFormat::U128 => {
            // u128 values above i128::MAX would not survive the widening
            match endian {
                Endian::Little => write_borsh(name, u, out)?,
                Endian::Big => out.extend_from_slice(&u.to_be_bytes()),
            }
            return Ok(());
        }
        ArgumentValue::Unsigned(u) => i128::try_from(*u).map_err(|_| {
            Error::invalid_argument(name, format!("{} out of range for {}", u, format))
        })?,
        other => {
            return Err(Error::invalid_argument(
                name,
                format!("expected {}, got {}", format, other.kind_name()),
            ))
        }
    };

    match format {
        NumberFormat::U8 => put_int!(name, u8, wide, endian, out),
        NumberFormat::U16 => put_int!(name, u16, wide, endian, out),
        NumberFormat::U32 => put_int!(name, u32, wide, endian, out),
        NumberFormat::U64 => put_int!(name, u64, wide, endian, out),
        NumberFormat::U128 => put_int!(name, u128, wide, endian, out),
        NumberFormat::I8 => put_int!(name, i8, wide, endian, out),
        NumberFormat::I16 => put_int!(name, i16, wide, endian, out),
        NumberFormat::I32 => put_int!(name, i32, wide, endian, out),
        NumberFormat::I64 => put_int!(name, i64, wide, endian, out),
        NumberFormat::I128 => {
            match endian {
                Endian::Little => write_borsh(name, &wide, out)?,
                Endian::Big => out.extend_from_slice(&wide.to_be_bytes()),
            }
        }
        NumberFormat::ShortU16 => {
            let v = u16::try_from(wide).map_err(|_| {
                Error::invalid_argument(name, format!("{} out of range for shortU16", wide))
            })?;
            write_short_u16(v, out);
        }
        NumberFormat::F32 | NumberFormat::F64 => unreachable!("floats handled above"),
    }
    Ok(())
}

/// Compact-u16: 7 bits per byte, high bit set while more bytes follow
fn write_short_u16(mut v: u16, out: &mut Vec<u8>) {
    loop {
        let mut byte = (v & 0x7f) as u8;
        v >>= 7;
        if v == 0 {
            out.push(byte);
            return;
        }
        byte |= 0x80;
        out.push(byte);
    }
}
