//! Argument type descriptors and typed argument values

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::fmt;

/// Declared type of an argument (or of a variable PDA seed)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TypeDescriptor {
    /// Integer or float
    Number {
        /// Width and signedness
        format: NumberFormat,
        /// Byte order
        #[serde(default)]
        endian: Endian,
    },
    /// Single byte, 0 or 1
    Boolean,
    /// 32-byte address
    PublicKey,
    /// UTF-8 string
    String {
        /// Length prefix
        #[serde(default)]
        size: SizePrefix,
    },
    /// Variable-length bytes
    Bytes {
        /// Length prefix
        #[serde(default)]
        size: SizePrefix,
    },
    /// Exactly `len` bytes
    FixedBytes {
        /// Byte count
        len: usize,
    },
    /// Optional value with a numeric presence tag
    Option {
        /// Inner type
        inner: Box<TypeDescriptor>,
        /// Presence tag format (default: u8)
        #[serde(default = "NumberFormat::option_tag")]
        prefix: NumberFormat,
    },
}

impl TypeDescriptor {
    /// Little-endian number of the given format
    pub fn number(format: NumberFormat) -> Self {
        TypeDescriptor::Number {
            format,
            endian: Endian::Little,
        }
    }

    /// Borsh-style string (u32 length prefix)
    pub fn string() -> Self {
        TypeDescriptor::String {
            size: SizePrefix::default(),
        }
    }

    /// String without a length prefix, as PDA seeds use it
    pub fn raw_string() -> Self {
        TypeDescriptor::String {
            size: SizePrefix::Remainder,
        }
    }

    /// Borsh-style byte vector (u32 length prefix)
    pub fn bytes() -> Self {
        TypeDescriptor::Bytes {
            size: SizePrefix::default(),
        }
    }

    /// Bytes without a length prefix
    pub fn raw_bytes() -> Self {
        TypeDescriptor::Bytes {
            size: SizePrefix::Remainder,
        }
    }

    /// Optional value with a u8 presence tag
    pub fn option(inner: TypeDescriptor) -> Self {
        TypeDescriptor::Option {
            inner: Box::new(inner),
            prefix: NumberFormat::U8,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Number { format, .. } => write!(f, "{}", format),
            TypeDescriptor::Boolean => write!(f, "bool"),
            TypeDescriptor::PublicKey => write!(f, "publicKey"),
            TypeDescriptor::String { .. } => write!(f, "string"),
            TypeDescriptor::Bytes { .. } => write!(f, "bytes"),
            TypeDescriptor::FixedBytes { len } => write!(f, "[u8; {}]", len),
            TypeDescriptor::Option { inner, .. } => write!(f, "option<{}>", inner),
        }
    }
}

/// Numeric width and signedness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberFormat {
    U8,
    U16,
    U32,
    U64,
    U128,
    I8,
    I16,
    I32,
    I64,
    I128,
    F32,
    F64,
    /// Compact 1-3 byte encoding of a u16
    #[serde(rename = "shortU16")]
    ShortU16,
}

impl NumberFormat {
    fn option_tag() -> Self {
        NumberFormat::U8
    }

    /// Whether negative values are allowed
    pub fn is_signed(self) -> bool {
        matches!(
            self,
            NumberFormat::I8
                | NumberFormat::I16
                | NumberFormat::I32
                | NumberFormat::I64
                | NumberFormat::I128
                | NumberFormat::F32
                | NumberFormat::F64
        )
    }

    /// Whether this is a floating point format
    pub fn is_float(self) -> bool {
        matches!(self, NumberFormat::F32 | NumberFormat::F64)
    }

    /// Parse an Anchor/Codama primitive name (`u64`, `i16`, ...)
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "u8" => NumberFormat::U8,
            "u16" => NumberFormat::U16,
            "u32" => NumberFormat::U32,
            "u64" => NumberFormat::U64,
            "u128" => NumberFormat::U128,
            "i8" => NumberFormat::I8,
            "i16" => NumberFormat::I16,
            "i32" => NumberFormat::I32,
            "i64" => NumberFormat::I64,
            "i128" => NumberFormat::I128,
            "f32" => NumberFormat::F32,
            "f64" => NumberFormat::F64,
            "shortU16" => NumberFormat::ShortU16,
            _ => return None,
        })
    }
}

impl fmt::Display for NumberFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NumberFormat::U8 => "u8",
            NumberFormat::U16 => "u16",
            NumberFormat::U32 => "u32",
            NumberFormat::U64 => "u64",
            NumberFormat::U128 => "u128",
            NumberFormat::I8 => "i8",
            NumberFormat::I16 => "i16",
            NumberFormat::I32 => "i32",
            NumberFormat::I64 => "i64",
            NumberFormat::I128 => "i128",
            NumberFormat::F32 => "f32",
            NumberFormat::F64 => "f64",
            NumberFormat::ShortU16 => "shortU16",
        };
        f.write_str(name)
    }
}

/// Byte order of multi-byte numbers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Endian {
    #[default]
    #[serde(rename = "le")]
    Little,
    #[serde(rename = "be")]
    Big,
}

/// How the length of a string or byte vector is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SizePrefix {
    /// Length written as a little-endian number first
    Prefixed {
        /// Length format
        format: NumberFormat,
    },
    /// No length; the value takes the remaining bytes
    Remainder,
}

impl Default for SizePrefix {
    fn default() -> Self {
        SizePrefix::Prefixed {
            format: NumberFormat::U32,
        }
    }
}

/// Typed argument value, as validated by the form layer
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentValue {
    /// Non-negative integer
    Unsigned(u128),
    /// Possibly negative integer
    Signed(i128),
    /// Floating point
    Float(f64),
    /// Boolean
    Bool(bool),
    /// Address
    PublicKey(Pubkey),
    /// Text
    String(String),
    /// Bytes
    Bytes(Vec<u8>),
    /// Absent optional
    None,
    /// Present optional
    Some(Box<ArgumentValue>),
}

impl ArgumentValue {
    /// Name of the value's kind, for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            ArgumentValue::Unsigned(_) => "unsigned integer",
            ArgumentValue::Signed(_) => "signed integer",
            ArgumentValue::Float(_) => "float",
            ArgumentValue::Bool(_) => "bool",
            ArgumentValue::PublicKey(_) => "publicKey",
            ArgumentValue::String(_) => "string",
            ArgumentValue::Bytes(_) => "bytes",
            ArgumentValue::None => "none",
            ArgumentValue::Some(_) => "some",
        }
    }

    /// Parse raw form input for a field of type `ty`.
    ///
    /// Returns `Ok(None)` for empty input, which means the field was left
    /// blank rather than set to a zero value.
    pub fn parse(ty: &TypeDescriptor, input: &str) -> Result<Option<Self>> {
        if input.is_empty() {
            return Ok(None);
        }
        let invalid = |reason: String| Error::invalid_argument(ty.to_string(), reason);

        let value = match ty {
            TypeDescriptor::Number { format, .. } if format.is_float() => input
                .parse::<f64>()
                .map(ArgumentValue::Float)
                .map_err(|e| invalid(format!("{:?}: {}", input, e)))?,
            TypeDescriptor::Number { format, .. } => {
                if let Some(digits) = input.strip_prefix('-') {
                    if !format.is_signed() {
                        return Err(invalid(format!("{:?} is negative", input)));
                    }
                    if digits.is_empty() {
                        return Ok(None);
                    }
                    input
                        .parse::<i128>()
                        .map(ArgumentValue::Signed)
                        .map_err(|e| invalid(format!("{:?}: {}", input, e)))?
                } else {
                    input
                        .parse::<u128>()
                        .map(ArgumentValue::Unsigned)
                        .map_err(|e| invalid(format!("{:?}: {}", input, e)))?
                }
            }
            TypeDescriptor::Boolean => match input {
                "true" => ArgumentValue::Bool(true),
                "false" => ArgumentValue::Bool(false),
                _ => return Err(invalid(format!("{:?} is not true/false", input))),
            },
            TypeDescriptor::PublicKey => ArgumentValue::PublicKey(crate::idl::parse_address(input)?),
            TypeDescriptor::String { .. } => ArgumentValue::String(input.to_string()),
            TypeDescriptor::Bytes { .. } | TypeDescriptor::FixedBytes { .. } => {
                let bytes = hex::decode(input.trim_start_matches("0x"))
                    .map_err(|e| invalid(format!("{:?} is not hex: {}", input, e)))?;
                ArgumentValue::Bytes(bytes)
            }
            TypeDescriptor::Option { inner, .. } => match Self::parse(inner, input)? {
                Some(value) => ArgumentValue::Some(Box::new(value)),
                None => ArgumentValue::None,
            },
        };
        Ok(Some(value))
    }

    /// Convert a JSON value into a typed value for `ty`
    pub fn from_json(ty: &TypeDescriptor, value: &serde_json::Value) -> Result<Self> {
        use serde_json::Value as Json;
        let invalid = |reason: String| Error::invalid_argument(ty.to_string(), reason);

        match (ty, value) {
            (TypeDescriptor::Option { .. }, Json::Null) => Ok(ArgumentValue::None),
            (TypeDescriptor::Option { inner, .. }, v) => {
                Ok(ArgumentValue::Some(Box::new(Self::from_json(inner, v)?)))
            }
            (TypeDescriptor::Number { format, .. }, Json::Number(n)) => {
                if format.is_float() {
                    n.as_f64()
                        .map(ArgumentValue::Float)
                        .ok_or_else(|| invalid(format!("{} is not a float", n)))
                } else if let Some(u) = n.as_u64() {
                    Ok(ArgumentValue::Unsigned(u as u128))
                } else if let Some(i) = n.as_i64() {
                    Ok(ArgumentValue::Signed(i as i128))
                } else {
                    Err(invalid(format!("{} is not an integer", n)))
                }
            }
            // 128-bit values and form input arrive as strings
            (TypeDescriptor::Number { .. }, Json::String(s))
            | (TypeDescriptor::PublicKey, Json::String(s))
            | (TypeDescriptor::Boolean, Json::String(s)) => Self::parse(ty, s)?
                .ok_or_else(|| Error::invalid_argument(ty.to_string(), "empty value")),
            (TypeDescriptor::Boolean, Json::Bool(b)) => Ok(ArgumentValue::Bool(*b)),
            (TypeDescriptor::String { .. }, Json::String(s)) => Ok(ArgumentValue::String(s.clone())),
            (TypeDescriptor::Bytes { .. } | TypeDescriptor::FixedBytes { .. }, Json::Array(items)) => {
                items
                    .iter()
                    .map(|item| {
                        item.as_u64()
                            .and_then(|b| u8::try_from(b).ok())
                            .ok_or_else(|| invalid(format!("{} is not a byte", item)))
                    })
                    .collect::<Result<Vec<u8>>>()
                    .map(ArgumentValue::Bytes)
            }
            (TypeDescriptor::Bytes { .. } | TypeDescriptor::FixedBytes { .. }, Json::String(s)) => {
                Self::parse(ty, s)?.ok_or_else(|| invalid("empty value".to_string()))
            }
            (_, other) => Err(invalid(format!("unexpected JSON value {}", other))),
        }
    }
}

impl From<u64> for ArgumentValue {
    fn from(v: u64) -> Self {
        ArgumentValue::Unsigned(v as u128)
    }
}

impl From<i64> for ArgumentValue {
    fn from(v: i64) -> Self {
        ArgumentValue::Signed(v as i128)
    }
}

impl From<bool> for ArgumentValue {
    fn from(v: bool) -> Self {
        ArgumentValue::Bool(v)
    }
}

impl From<Pubkey> for ArgumentValue {
    fn from(v: Pubkey) -> Self {
        ArgumentValue::PublicKey(v)
    }
}

impl From<&str> for ArgumentValue {
    fn from(v: &str) -> Self {
        ArgumentValue::String(v.to_string())
    }
}

impl From<String> for ArgumentValue {
    fn from(v: String) -> Self {
        ArgumentValue::String(v)
    }
}

impl From<Vec<u8>> for ArgumentValue {
    fn from(v: Vec<u8>) -> Self {
        ArgumentValue::Bytes(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numbers() {
        let u64_ty = TypeDescriptor::number(NumberFormat::U64);
        assert_eq!(
            ArgumentValue::parse(&u64_ty, "42").unwrap(),
            Some(ArgumentValue::Unsigned(42))
        );
        assert!(ArgumentValue::parse(&u64_ty, "-1").is_err());
        assert_eq!(ArgumentValue::parse(&u64_ty, "").unwrap(), None);

        let i32_ty = TypeDescriptor::number(NumberFormat::I32);
        assert_eq!(
            ArgumentValue::parse(&i32_ty, "-7").unwrap(),
            Some(ArgumentValue::Signed(-7))
        );
        // A lone minus sign is still being typed
        assert_eq!(ArgumentValue::parse(&i32_ty, "-").unwrap(), None);

        let f64_ty = TypeDescriptor::number(NumberFormat::F64);
        assert_eq!(
            ArgumentValue::parse(&f64_ty, "1.5").unwrap(),
            Some(ArgumentValue::Float(1.5))
        );
    }

    #[test]
    fn test_parse_bool_and_pubkey() {
        assert_eq!(
            ArgumentValue::parse(&TypeDescriptor::Boolean, "true").unwrap(),
            Some(ArgumentValue::Bool(true))
        );
        assert!(ArgumentValue::parse(&TypeDescriptor::Boolean, "yes").is_err());

        let key = ArgumentValue::parse(
            &TypeDescriptor::PublicKey,
            "11111111111111111111111111111111",
        )
        .unwrap();
        assert_eq!(
            key,
            Some(ArgumentValue::PublicKey(Pubkey::new_from_array([0; 32])))
        );
        assert!(matches!(
            ArgumentValue::parse(&TypeDescriptor::PublicKey, "nope"),
            Err(Error::InvalidAddress { .. })
        ));
    }

    #[test]
    fn test_from_json() {
        let ty = TypeDescriptor::option(TypeDescriptor::number(NumberFormat::U16));
        assert_eq!(
            ArgumentValue::from_json(&ty, &serde_json::json!(null)).unwrap(),
            ArgumentValue::None
        );
        assert_eq!(
            ArgumentValue::from_json(&ty, &serde_json::json!(9)).unwrap(),
            ArgumentValue::Some(Box::new(ArgumentValue::Unsigned(9)))
        );

        let big = TypeDescriptor::number(NumberFormat::U128);
        assert_eq!(
            ArgumentValue::from_json(&big, &serde_json::json!("340282366920938463463374607431768211455"))
                .unwrap(),
            ArgumentValue::Unsigned(u128::MAX)
        );

        assert!(ArgumentValue::from_json(&TypeDescriptor::Boolean, &serde_json::json!(1)).is_err());
    }

    #[test]
    fn test_type_descriptor_json() {
        let ty: TypeDescriptor =
            serde_json::from_str(r#"{"kind":"number","format":"u64"}"#).unwrap();
        assert_eq!(ty, TypeDescriptor::number(NumberFormat::U64));

        let ty: TypeDescriptor = serde_json::from_str(r#"{"kind":"string"}"#).unwrap();
        assert_eq!(ty, TypeDescriptor::string());

        let ty: TypeDescriptor =
            serde_json::from_str(r#"{"kind":"string","size":{"kind":"remainder"}}"#).unwrap();
        assert_eq!(ty, TypeDescriptor::raw_string());
    }
}
