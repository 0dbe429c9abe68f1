//! Byte order selection and the fixed-width primitives that honour it.

use core::str::FromStr;

use bytemuck::Pod;

use crate::BufferError;

/// Byte order used for multi-byte numerics.
///
/// The default is big-endian. Layouts that are little-endian on the wire have to
/// ask for it explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ByteOrder {
    #[default]
    Big,
    Little,
}

impl ByteOrder {
    /// Byte order of the running machine.
    #[cfg(target_endian = "little")]
    pub const NATIVE: ByteOrder = ByteOrder::Little;
    #[cfg(target_endian = "big")]
    pub const NATIVE: ByteOrder = ByteOrder::Big;

    #[inline]
    pub fn is_little(self) -> bool {
        self == ByteOrder::Little
    }

    #[inline]
    pub fn is_native(self) -> bool {
        self == Self::NATIVE
    }
}

/// `true` selects little-endian, `false` big-endian.
impl From<bool> for ByteOrder {
    fn from(little: bool) -> Self {
        if little {
            ByteOrder::Little
        } else {
            ByteOrder::Big
        }
    }
}

impl FromStr for ByteOrder {
    type Err = BufferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "le" | "little" => Ok(ByteOrder::Little),
            "be" | "big" => Ok(ByteOrder::Big),
            _ => Err(BufferError::UnknownOrder(s.to_string())),
        }
    }
}

/// A fixed-width numeric that can be stored in either byte order.
///
/// Values are kept in native order in memory; [`Primitive::reorder`] converts
/// between native and a requested order. The conversion is its own inverse, so
/// the same call is used for reading and for writing.
pub trait Primitive: Pod {
    /// Width in bytes.
    const WIDTH: usize = core::mem::size_of::<Self>();

    /// Reverse the byte representation.
    fn swap(self) -> Self;

    #[inline]
    fn reorder(self, order: ByteOrder) -> Self {
        if order.is_native() { self } else { self.swap() }
    }
}

macro_rules! impl_primitive_int {
    ($($t:ty),*) => {
        $(
            impl Primitive for $t {
                #[inline]
                fn swap(self) -> Self {
                    self.swap_bytes()
                }
            }
        )*
    };
}

macro_rules! impl_primitive_float {
    ($($t:ty),*) => {
        $(
            impl Primitive for $t {
                #[inline]
                fn swap(self) -> Self {
                    <$t>::from_bits(self.to_bits().swap_bytes())
                }
            }
        )*
    };
}

impl_primitive_int!(u8, u16, u32, u64, i8, i16, i32, i64);
impl_primitive_float!(f32, f64);
