//! Fixed-width element types that can travel through a collective.

use crate::error::{HypercastError, Result};

/// A value with a fixed little-endian wire representation.
pub trait Element: Copy + Send + Sync + 'static {
    /// Encoded width in bytes.
    const WIDTH: usize;

    /// Append the encoding of `self` to `out`.
    fn write_le(self, out: &mut Vec<u8>);

    /// Decode one value from exactly `Self::WIDTH` bytes.
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! impl_element {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Element for $ty {
                const WIDTH: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn read_le(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(raw)
                }
            }
        )*
    };
}

impl_element!(i8, u8, i16, u16, i32, u32, i64, u64, i128, u128, f32, f64);

/// Encode a slice of elements.
pub fn encode<T: Element>(values: &[T]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * T::WIDTH);
    for &v in values {
        v.write_le(&mut out);
    }
    out
}

/// Decode exactly `count` elements.
pub fn decode<T: Element>(bytes: &[u8], count: usize) -> Result<Vec<T>> {
    if bytes.len() % T::WIDTH != 0 {
        return Err(HypercastError::DecodeFailed(format!(
            "{} bytes is not a whole number of {}-byte elements",
            bytes.len(),
            T::WIDTH
        )));
    }
    let actual = bytes.len() / T::WIDTH;
    if actual != count {
        return Err(HypercastError::BufferSizeMismatch {
            expected: count,
            actual,
        });
    }
    Ok(bytes.chunks_exact(T::WIDTH).map(T::read_le).collect())
}
