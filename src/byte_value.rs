//! Owned byte buffers holding literal values and set-membership offsets.

use std::mem::size_of;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    datatype::Datatype,
    error::{CastError, ConstructionError},
};

/// Width of a single offset entry.
pub(crate) const OFFSET_WIDTH: usize = size_of::<u64>();

/// Resizable owned byte buffer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct ByteValue {
    bytes: Vec<u8>,
}

impl ByteValue {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a buffer of `len` zero bytes.
    #[must_use]
    pub fn zeroed(len: usize) -> Self {
        Self {
            bytes: vec![0; len],
        }
    }

    /// Builds an offsets buffer from native-endian `u64` entries.
    #[must_use]
    pub fn from_offsets(offsets: &[u64]) -> Self {
        let mut value = Self {
            bytes: Vec::with_capacity(offsets.len() * OFFSET_WIDTH),
        };
        for offset in offsets {
            value.push_offset(*offset);
        }
        value
    }

    /// Encodes an enumeration index as a single value of `datatype`.
    pub fn from_index(index: u64, datatype: Datatype) -> Result<Self, CastError> {
        macro_rules! cast {
            ($ty:ty) => {
                <$ty>::try_from(index)
                    .map(|v| v.to_ne_bytes().to_vec())
                    .map_err(|_| CastError::OutOfRange { index, datatype })?
            };
        }

        let bytes = match datatype {
            Datatype::Bool | Datatype::UInt8 => cast!(u8),
            Datatype::Int8 => cast!(i8),
            Datatype::UInt16 => cast!(u16),
            Datatype::Int16 => cast!(i16),
            Datatype::UInt32 => cast!(u32),
            Datatype::Int32 => cast!(i32),
            Datatype::UInt64 => index.to_ne_bytes().to_vec(),
            Datatype::Int64 => cast!(i64),
            other => return Err(CastError::NonIntegral(other)),
        };
        Ok(Self { bytes })
    }

    /// Returns the raw bytes.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of bytes held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true when no bytes are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Appends raw bytes.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Appends a native-endian `u64` offset entry.
    pub fn push_offset(&mut self, offset: u64) {
        self.bytes.extend_from_slice(&offset.to_ne_bytes());
    }

    /// Iterates the buffer as native-endian `u64` entries; trailing partial entries are ignored.
    pub fn offsets(&self) -> impl Iterator<Item = u64> + '_ {
        self.bytes.chunks_exact(OFFSET_WIDTH).map(|chunk| {
            let mut entry = [0u8; OFFSET_WIDTH];
            entry.copy_from_slice(chunk);
            u64::from_ne_bytes(entry)
        })
    }
}

/// Checks that `offsets` are non-decreasing and stay within `data_size`.
pub(crate) fn check_offsets<I>(data_size: usize, offsets: I) -> Result<(), ConstructionError>
where
    I: IntoIterator<Item = u64>,
{
    let data_size = data_size as u64;
    let mut previous = 0u64;
    for (index, offset) in offsets.into_iter().enumerate() {
        if offset < previous {
            return Err(ConstructionError::OffsetsNotOrdered { index, offset });
        }
        if offset > data_size {
            return Err(ConstructionError::OffsetOutOfBounds { offset, data_size });
        }
        previous = offset;
    }
    Ok(())
}

/// Slices `data` into the members delimited by `offsets`.
///
/// Member `i` spans `offsets[i]..offsets[i + 1]`; the last one runs to the end of `data`.
/// Offsets must already have passed [`check_offsets`].
pub(crate) fn split_members<'a>(data: &'a [u8], offsets: &[u64]) -> Vec<&'a [u8]> {
    offsets
        .iter()
        .enumerate()
        .map(|(i, start)| {
            let end = offsets.get(i + 1).copied().unwrap_or(data.len() as u64);
            &data[*start as usize..end as usize]
        })
        .collect()
}

impl From<Vec<u8>> for ByteValue {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl From<&[u8]> for ByteValue {
    fn from(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }
}

impl AsRef<[u8]> for ByteValue {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}
