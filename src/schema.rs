//! Field descriptors and the fixed schema conventions of a record file.

use serde::{Deserialize, Serialize};

// Field types are not stored in the file format; they are assigned by
// ordinal position. Reordering the schema silently breaks this mapping,
// a known limitation of the format.
const NUMBER_ORDINALS: [usize; 2] = [3, 5];
const MONEY_ORDINAL: usize = 4;

/// Ordinals of the two identity fields whose concatenation forms a
/// record's unique key.
pub const KEY_ORDINALS: (usize, usize) = (0, 1);

const KEY_SEPARATOR: char = '_';

/// Data type of a field, for presentation and input validation above
/// this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    /// Plain text.
    Text,
    /// A whole number.
    Number,
    /// An amount with a leading currency symbol, e.g. `$90.00`.
    Money,
}

impl FieldType {
    pub(crate) fn for_ordinal(index: usize) -> FieldType {
        if NUMBER_ORDINALS.contains(&index) {
            FieldType::Number
        } else if MONEY_ORDINAL == index {
            FieldType::Money
        } else {
            FieldType::Text
        }
    }
}

/// A field/column definition parsed from the file header. Immutable for
/// the lifetime of the open file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Ordinal position within a record.
    pub index: usize,
    /// Field name as stored in the header.
    pub name: String,
    /// Fixed width of the field in bytes.
    pub max_length: u16,
    /// Type derived from the ordinal convention.
    pub field_type: FieldType,
}

/// Builds the composite uniqueness key from a record's field values.
/// Callers must have verified the field shape first.
pub(crate) fn composite_key(values: &[String]) -> String {
    format!(
        "{}{}{}",
        values[KEY_ORDINALS.0], KEY_SEPARATOR, values[KEY_ORDINALS.1]
    )
}
