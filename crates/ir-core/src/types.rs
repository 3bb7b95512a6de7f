// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Scalar and vector value types of the IR.
//!
//! A `Type` is a base kind (`Int`, `UInt`, `Float`, `Handle`), a bit width and
//! a lane count. Booleans are `UInt(1)`. The textual form is `int32`,
//! `uint8x4`, `float64`, `bool`, `boolx8`, `handle`.

use crate::error::IrError;
use std::{fmt, str::FromStr};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeCode {
    Int,
    UInt,
    Float,
    Handle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Type {
    code: TypeCode,
    bits: u8,
    lanes: u16,
}

impl Type {
    pub const fn new(code: TypeCode, bits: u8, lanes: u16) -> Self {
        Self { code, bits, lanes }
    }

    pub const fn int(bits: u8) -> Self {
        Self::new(TypeCode::Int, bits, 1)
    }

    pub const fn uint(bits: u8) -> Self {
        Self::new(TypeCode::UInt, bits, 1)
    }

    pub const fn float(bits: u8) -> Self {
        Self::new(TypeCode::Float, bits, 1)
    }

    pub const fn boolean() -> Self {
        Self::new(TypeCode::UInt, 1, 1)
    }

    pub const fn handle() -> Self {
        Self::new(TypeCode::Handle, 64, 1)
    }

    pub fn code(&self) -> TypeCode {
        self.code
    }

    pub fn bits(&self) -> u8 {
        self.bits
    }

    pub fn lanes(&self) -> u16 {
        self.lanes
    }

    pub fn with_lanes(&self, lanes: u16) -> Self {
        Self::new(self.code, self.bits, lanes)
    }

    pub fn with_code(&self, code: TypeCode) -> Self {
        Self::new(code, self.bits, self.lanes)
    }

    pub fn with_bits(&self, bits: u8) -> Self {
        Self::new(self.code, bits, self.lanes)
    }

    /// The scalar type of a single lane.
    pub fn element_of(&self) -> Self {
        self.with_lanes(1)
    }

    pub fn is_int(&self) -> bool {
        self.code == TypeCode::Int
    }

    pub fn is_uint(&self) -> bool {
        self.code == TypeCode::UInt
    }

    pub fn is_float(&self) -> bool {
        self.code == TypeCode::Float
    }

    pub fn is_handle(&self) -> bool {
        self.code == TypeCode::Handle
    }

    pub fn is_bool(&self) -> bool {
        self.code == TypeCode::UInt && self.bits == 1
    }

    pub fn is_scalar(&self) -> bool {
        self.lanes == 1
    }

    pub fn is_vector(&self) -> bool {
        self.lanes > 1
    }

    /// Largest value of a signed integer type, saturated to `i64`.
    pub fn imax(&self) -> i64 {
        debug_assert!(self.is_int());
        if self.bits >= 64 {
            i64::MAX
        } else {
            (1i64 << (self.bits - 1)) - 1
        }
    }

    /// Smallest value of a signed integer type.
    pub fn imin(&self) -> i64 {
        debug_assert!(self.is_int());
        if self.bits >= 64 {
            i64::MIN
        } else {
            -(1i64 << (self.bits - 1))
        }
    }

    /// Largest value of an unsigned integer type.
    pub fn umax(&self) -> u64 {
        debug_assert!(self.is_uint());
        if self.bits >= 64 {
            u64::MAX
        } else {
            (1u64 << self.bits) - 1
        }
    }

    /// Whether `x` is exactly the maximum value of this type.
    pub fn is_max(&self, x: i64) -> bool {
        match self.code {
            TypeCode::Int => x == self.imax(),
            TypeCode::UInt => x >= 0 && x as u64 == self.umax(),
            _ => false,
        }
    }

    pub fn is_max_uint(&self, x: u64) -> bool {
        match self.code {
            TypeCode::Int => x <= i64::MAX as u64 && x as i64 == self.imax(),
            TypeCode::UInt => x == self.umax(),
            _ => false,
        }
    }

    /// Whether `x` is exactly the minimum value of this type.
    pub fn is_min(&self, x: i64) -> bool {
        match self.code {
            TypeCode::Int => x == self.imin(),
            TypeCode::UInt => x == 0,
            _ => false,
        }
    }

    pub fn is_min_uint(&self, x: u64) -> bool {
        match self.code {
            TypeCode::Int => x <= i64::MAX as u64 && x as i64 == self.imin(),
            TypeCode::UInt => x == 0,
            _ => false,
        }
    }

    pub fn can_represent(&self, x: i64) -> bool {
        match self.code {
            TypeCode::Int => x >= self.imin() && x <= self.imax(),
            TypeCode::UInt => x >= 0 && (x as u64) <= self.umax(),
            TypeCode::Float => match self.bits {
                32 => (x as f32) as i64 == x,
                _ => (x as f64) as i64 == x,
            },
            TypeCode::Handle => false,
        }
    }

    pub fn can_represent_uint(&self, x: u64) -> bool {
        match self.code {
            TypeCode::Int => x <= self.imax() as u64,
            TypeCode::UInt => x <= self.umax(),
            TypeCode::Float => match self.bits {
                32 => (x as f32) as u64 == x,
                _ => (x as f64) as u64 == x,
            },
            TypeCode::Handle => false,
        }
    }

    pub fn can_represent_float(&self, x: f64) -> bool {
        match self.code {
            TypeCode::Int => {
                x.trunc() == x && x >= self.imin() as f64 && x <= self.imax() as f64
            },
            TypeCode::UInt => x.trunc() == x && x >= 0.0 && x <= self.umax() as f64,
            TypeCode::Float => match self.bits {
                32 => (x as f32) as f64 == x || x.is_nan(),
                _ => true,
            },
            TypeCode::Handle => false,
        }
    }

    /// Whether values of `other` all fit in this type without loss.
    pub fn can_represent_type(&self, other: &Type) -> bool {
        if self.lanes != other.lanes {
            return false;
        }
        match (self.code, other.code) {
            (a, b) if a == b => self.bits >= other.bits,
            (TypeCode::Int, TypeCode::UInt) => self.bits > other.bits,
            (TypeCode::Float, TypeCode::Int) | (TypeCode::Float, TypeCode::UInt) => {
                let mantissa = if self.bits == 32 { 24 } else { 53 };
                other.bits <= mantissa
            },
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.code {
            _ if self.is_bool() => write!(f, "bool")?,
            TypeCode::Int => write!(f, "int{}", self.bits)?,
            TypeCode::UInt => write!(f, "uint{}", self.bits)?,
            TypeCode::Float => write!(f, "float{}", self.bits)?,
            TypeCode::Handle => write!(f, "handle")?,
        }
        if self.lanes > 1 {
            write!(f, "x{}", self.lanes)?;
        }
        Ok(())
    }
}

impl FromStr for Type {
    type Err = IrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || IrError::InvalidType(s.to_string());
        let (base, lanes) = match s.rsplit_once('x') {
            Some((base, lanes)) if !lanes.is_empty() && lanes.bytes().all(|b| b.is_ascii_digit()) => {
                (base, lanes.parse::<u16>().map_err(|_| invalid())?)
            },
            _ => (s, 1),
        };
        if lanes == 0 {
            return Err(invalid());
        }
        let scalar = if base == "bool" {
            Type::boolean()
        } else if base == "handle" {
            Type::handle()
        } else {
            let (code, bits) = if let Some(bits) = base.strip_prefix("uint") {
                (TypeCode::UInt, bits)
            } else if let Some(bits) = base.strip_prefix("int") {
                (TypeCode::Int, bits)
            } else if let Some(bits) = base.strip_prefix("float") {
                (TypeCode::Float, bits)
            } else {
                return Err(invalid());
            };
            let bits = bits.parse::<u8>().map_err(|_| invalid())?;
            let valid = match code {
                TypeCode::Int => matches!(bits, 8 | 16 | 32 | 64),
                TypeCode::UInt => matches!(bits, 1 | 8 | 16 | 32 | 64),
                TypeCode::Float => matches!(bits, 32 | 64),
                TypeCode::Handle => false,
            };
            if !valid {
                return Err(invalid());
            }
            Type::new(code, bits, 1)
        };
        Ok(scalar.with_lanes(lanes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits() {
        assert_eq!(Type::int(8).imax(), 127);
        assert_eq!(Type::int(8).imin(), -128);
        assert_eq!(Type::int(64).imin(), i64::MIN);
        assert_eq!(Type::uint(16).umax(), 65535);
        assert!(Type::uint(16).is_max(65535));
        assert!(Type::int(32).is_min(i32::MIN as i64));
    }

    #[test]
    fn test_can_represent() {
        assert!(Type::int(8).can_represent(-128));
        assert!(!Type::int(8).can_represent(128));
        assert!(!Type::uint(32).can_represent(-1));
        assert!(Type::uint(32).can_represent(4_000_000_000));
        assert!(Type::float(32).can_represent(1 << 24));
        assert!(!Type::float(32).can_represent((1 << 24) + 1));
        assert!(Type::int(32).can_represent_type(&Type::uint(16)));
        assert!(!Type::int(32).can_represent_type(&Type::uint(32)));
    }

    #[test]
    fn test_parse_and_display() {
        for text in ["int32", "uint8x4", "float64", "bool", "boolx8", "int16x64", "handle"] {
            let ty: Type = text.parse().unwrap();
            assert_eq!(ty.to_string(), text);
        }
        assert_eq!("int32x4".parse::<Type>().unwrap().lanes(), 4);
        assert!("int7".parse::<Type>().is_err());
        assert!("vec4".parse::<Type>().is_err());
        assert!("int32x0".parse::<Type>().is_err());
    }
}
