//! The array schema surface that query conditions are checked and rewritten against.
//!
//! Conditions only name their fields; dimensions, attributes and enumerations
//! are resolved through [`Schema`] when a tree is validated, rewritten or
//! evaluated. [`ArraySchema`] is a plain in-memory implementation.

pub mod enumeration;

use std::collections::HashMap;

pub use enumeration::Enumeration;

use crate::{datatype::Datatype, error::SchemaError};

/// Lookup interface supplied by the storage layer.
pub trait Schema {
    /// Returns the dimension or attribute named `name`.
    fn field(&self, name: &str) -> Option<&Field>;

    /// Returns the loaded enumeration named `name`.
    fn enumeration(&self, name: &str) -> Option<&Enumeration>;

    /// Returns true when `name` is a dimension or attribute.
    fn is_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Returns true when `name` is an attribute.
    fn is_attr(&self, name: &str) -> bool {
        self.field(name).is_some_and(Field::is_attribute)
    }
}

/// Whether a field is a dimension or an attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Coordinate axis.
    Dimension,
    /// Stored value.
    Attribute,
}

/// Number of values stored per cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellValNum {
    /// Exactly this many values.
    Fixed(u32),
    /// Variable number of values.
    Var,
}

impl CellValNum {
    /// One value per cell.
    pub const SINGLE: CellValNum = CellValNum::Fixed(1);

    /// Returns true for variable sized cells.
    #[must_use]
    pub fn is_var(self) -> bool {
        matches!(self, CellValNum::Var)
    }
}

impl Default for CellValNum {
    fn default() -> Self {
        Self::SINGLE
    }
}

/// A dimension or attribute as seen by query conditions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    name: String,
    kind: FieldKind,
    datatype: Datatype,
    cell_val_num: CellValNum,
    nullable: bool,
    enumeration: Option<String>,
}

impl Field {
    fn new(name: impl Into<String>, kind: FieldKind, datatype: Datatype) -> Self {
        Self {
            name: name.into(),
            kind,
            datatype,
            cell_val_num: CellValNum::SINGLE,
            nullable: false,
            enumeration: None,
        }
    }

    /// Creates a single-valued, non-nullable dimension.
    #[must_use]
    pub fn dimension(name: impl Into<String>, datatype: Datatype) -> Self {
        Self::new(name, FieldKind::Dimension, datatype)
    }

    /// Creates a single-valued, non-nullable attribute.
    #[must_use]
    pub fn attribute(name: impl Into<String>, datatype: Datatype) -> Self {
        Self::new(name, FieldKind::Attribute, datatype)
    }

    /// Sets the number of values per cell.
    #[must_use]
    pub fn with_cell_val_num(mut self, cell_val_num: CellValNum) -> Self {
        self.cell_val_num = cell_val_num;
        self
    }

    /// Marks the field as variable sized.
    #[must_use]
    pub fn var_sized(self) -> Self {
        self.with_cell_val_num(CellValNum::Var)
    }

    /// Sets nullability.
    #[must_use]
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Associates the field with the enumeration named `name`.
    #[must_use]
    pub fn with_enumeration(mut self, name: impl Into<String>) -> Self {
        self.enumeration = Some(name.into());
        self
    }

    /// Field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dimension or attribute.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Returns true for attributes.
    #[must_use]
    pub fn is_attribute(&self) -> bool {
        self.kind() == FieldKind::Attribute
    }

    /// Storage datatype.
    #[must_use]
    pub fn datatype(&self) -> Datatype {
        self.datatype
    }

    /// Values per cell.
    #[must_use]
    pub fn cell_val_num(&self) -> CellValNum {
        self.cell_val_num
    }

    /// Returns true when cells may be null.
    #[must_use]
    pub fn nullable(&self) -> bool {
        self.nullable
    }

    /// Returns true when cells hold a variable number of values.
    #[must_use]
    pub fn var_size(&self) -> bool {
        self.cell_val_num.is_var()
    }

    /// Bytes per cell, or `None` when variable sized.
    #[must_use]
    pub fn cell_size(&self) -> Option<u64> {
        match self.cell_val_num {
            CellValNum::Fixed(n) => Some(self.datatype.size() * u64::from(n)),
            CellValNum::Var => None,
        }
    }

    /// Name of the associated enumeration, if any.
    #[must_use]
    pub fn enumeration_name(&self) -> Option<&str> {
        self.enumeration.as_deref()
    }
}

/// In-memory schema holding fields and the enumerations loaded for them.
#[derive(Clone, Debug, Default)]
pub struct ArraySchema {
    fields: Vec<Field>,
    enumerations: HashMap<String, Enumeration>,
}

impl ArraySchema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field, consuming and returning the schema.
    pub fn with_field(mut self, field: Field) -> Result<Self, SchemaError> {
        self.add_field(field)?;
        Ok(self)
    }

    /// Adds a loaded enumeration, consuming and returning the schema.
    pub fn with_enumeration(mut self, enumeration: Enumeration) -> Result<Self, SchemaError> {
        self.add_enumeration(enumeration)?;
        Ok(self)
    }

    /// Adds a field after checking it against the schema rules.
    pub fn add_field(&mut self, field: Field) -> Result<(), SchemaError> {
        if self.fields.iter().any(|f| f.name == field.name) {
            return Err(SchemaError::DuplicateField(field.name));
        }
        if field.cell_val_num == CellValNum::Fixed(0) {
            return Err(SchemaError::ZeroCellValNum(field.name));
        }
        match field.kind() {
            FieldKind::Dimension => {
                if field.nullable {
                    return Err(SchemaError::NullableDimension(field.name));
                }
                if field.enumeration.is_some() {
                    return Err(SchemaError::EnumeratedDimension(field.name));
                }
            }
            FieldKind::Attribute => {
                if field.enumeration.is_some() && !field.datatype.is_index_type() {
                    return Err(SchemaError::EnumeratedNonIntegral {
                        datatype: field.datatype,
                        field: field.name,
                    });
                }
            }
        }
        self.fields.push(field);
        Ok(())
    }

    /// Registers an enumeration as loaded.
    pub fn add_enumeration(&mut self, enumeration: Enumeration) -> Result<(), SchemaError> {
        if self.enumerations.contains_key(enumeration.name()) {
            return Err(SchemaError::DuplicateEnumeration(
                enumeration.name().to_string(),
            ));
        }
        self.enumerations
            .insert(enumeration.name().to_string(), enumeration);
        Ok(())
    }

    /// Iterates fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }
}

impl Schema for ArraySchema {
    fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn enumeration(&self, name: &str) -> Option<&Enumeration> {
        self.enumerations.get(name)
    }
}
