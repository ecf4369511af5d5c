//! Dictionaries mapping categorical values to the integer codes stored in attributes.

use std::collections::HashMap;

use super::CellValNum;
use crate::{
    byte_value::{check_offsets, split_members},
    datatype::Datatype,
    error::EnumerationError,
};

/// Ordered list of unique values; a value's position is the code stored in the attribute.
#[derive(Clone, Debug)]
pub struct Enumeration {
    name: String,
    datatype: Datatype,
    cell_val_num: CellValNum,
    ordered: bool,
    values: Vec<Vec<u8>>,
    index: HashMap<Vec<u8>, u64>,
}

impl Enumeration {
    /// Builds an enumeration from its raw value buffer.
    ///
    /// Variable sized enumerations require `offsets` delimiting each value;
    /// fixed sized ones split `data` every `datatype.size() * cell_val_num` bytes.
    pub fn new(
        name: impl Into<String>,
        datatype: Datatype,
        cell_val_num: CellValNum,
        ordered: bool,
        data: &[u8],
        offsets: Option<&[u64]>,
    ) -> Result<Self, EnumerationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(EnumerationError::EmptyName(name));
        }
        if datatype == Datatype::Any {
            return Err(EnumerationError::UnsupportedDatatype { name, datatype });
        }

        let values: Vec<Vec<u8>> = match (cell_val_num, offsets) {
            (CellValNum::Var, Some(offsets)) => {
                if let Err(source) = check_offsets(data.len(), offsets.iter().copied()) {
                    return Err(EnumerationError::Offsets { name, source });
                }
                split_members(data, offsets)
                    .into_iter()
                    .map(<[u8]>::to_vec)
                    .collect()
            }
            (CellValNum::Var, None) => return Err(EnumerationError::MissingOffsets(name)),
            (CellValNum::Fixed(_), Some(_)) => {
                return Err(EnumerationError::UnexpectedOffsets(name))
            }
            (CellValNum::Fixed(n), None) => {
                let value_size = datatype.size() * u64::from(n);
                if value_size == 0 || data.len() as u64 % value_size != 0 {
                    return Err(EnumerationError::DataSize {
                        name,
                        size: data.len(),
                        value_size,
                    });
                }
                data.chunks_exact(value_size as usize)
                    .map(<[u8]>::to_vec)
                    .collect()
            }
        };

        let mut index = HashMap::with_capacity(values.len());
        for (position, value) in values.iter().enumerate() {
            if index.insert(value.clone(), position as u64).is_some() {
                return Err(EnumerationError::DuplicateValue(name));
            }
        }

        Ok(Self {
            name,
            datatype,
            cell_val_num,
            ordered,
            values,
            index,
        })
    }

    /// Builds a variable sized UTF-8 enumeration from string values.
    pub fn from_strings<I, S>(
        name: impl Into<String>,
        ordered: bool,
        values: I,
    ) -> Result<Self, EnumerationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut data = Vec::new();
        let mut offsets = Vec::new();
        for value in values {
            offsets.push(data.len() as u64);
            data.extend_from_slice(value.as_ref().as_bytes());
        }
        Self::new(
            name,
            Datatype::StringUtf8,
            CellValNum::Var,
            ordered,
            &data,
            Some(offsets.as_slice()),
        )
    }

    /// Builds a single-valued fixed width enumeration.
    pub fn from_fixed(
        name: impl Into<String>,
        datatype: Datatype,
        ordered: bool,
        data: &[u8],
    ) -> Result<Self, EnumerationError> {
        Self::new(name, datatype, CellValNum::SINGLE, ordered, data, None)
    }

    /// Enumeration name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Datatype of the enumerated values.
    #[must_use]
    pub fn datatype(&self) -> Datatype {
        self.datatype
    }

    /// Values per enumerated entry.
    #[must_use]
    pub fn cell_val_num(&self) -> CellValNum {
        self.cell_val_num
    }

    /// Returns true when value order carries meaning, so range comparisons are allowed.
    #[must_use]
    pub fn ordered(&self) -> bool {
        self.ordered
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true when the enumeration holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value stored at `index`.
    #[must_use]
    pub fn value(&self, index: u64) -> Option<&[u8]> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.values.get(i))
            .map(Vec::as_slice)
    }

    /// Position of `value`, or `None` when it is not part of the enumeration.
    #[must_use]
    pub fn index_of(&self, value: &[u8]) -> Option<u64> {
        self.index.get(value).copied()
    }
}
