use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    si, CatalogError, CatalogResult, DefinitionId, SiPrefix, SubjectId, ValueId,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[repr(i16)]
pub enum DataType {
    Decimal = 1,
    Integer = 2,
    Str = 3,
    Bool = 4,
    Range = 5,
    Select = 6,
    MultiSelect = 7,
}

impl DataType {
    pub fn as_i16(self) -> i16 {
        self as i16
    }

    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            1 => Some(DataType::Decimal),
            2 => Some(DataType::Integer),
            3 => Some(DataType::Str),
            4 => Some(DataType::Bool),
            5 => Some(DataType::Range),
            6 => Some(DataType::Select),
            7 => Some(DataType::MultiSelect),
            _ => None,
        }
    }

    /// Types whose values carry a unit-scaled numeric payload.
    pub fn is_numeric(self) -> bool {
        matches!(self, DataType::Decimal | DataType::Integer | DataType::Range)
    }

    /// Types constrained to an enumerated value list.
    pub fn is_enumerated(self) -> bool {
        matches!(self, DataType::Select | DataType::MultiSelect)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[repr(i16)]
pub enum SubjectKind {
    Component = 1,
    Part = 2,
}

impl SubjectKind {
    pub fn as_i16(self) -> i16 {
        self as i16
    }

    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            1 => Some(SubjectKind::Component),
            2 => Some(SubjectKind::Part),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[repr(i16)]
pub enum Scope {
    Component = 1,
    Part = 2,
    Both = 3,
}

impl Scope {
    pub fn as_i16(self) -> i16 {
        self as i16
    }

    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            1 => Some(Scope::Component),
            2 => Some(Scope::Part),
            3 => Some(Scope::Both),
            _ => None,
        }
    }

    /// Whether a definition with this scope may be attached to the given
    /// subject kind. `Both` is visible in either context.
    pub fn accepts(self, kind: SubjectKind) -> bool {
        match self {
            Scope::Component => kind == SubjectKind::Component,
            Scope::Part => kind == SubjectKind::Part,
            Scope::Both => true,
        }
    }
}

/// A typed attribute value as the caller sees it: numeric payloads carry the
/// display value plus the SI prefix it was entered with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Decimal { value: Decimal, prefix: SiPrefix },
    Integer { value: Decimal, prefix: SiPrefix },
    Range {
        min: Decimal,
        max: Decimal,
        prefix: SiPrefix,
    },
    Str(String),
    Bool(bool),
    Select(String),
    MultiSelect(Vec<String>),
}

impl AttrValue {
    pub fn data_type(&self) -> DataType {
        match self {
            AttrValue::Decimal { .. } => DataType::Decimal,
            AttrValue::Integer { .. } => DataType::Integer,
            AttrValue::Range { .. } => DataType::Range,
            AttrValue::Str(_) => DataType::Str,
            AttrValue::Bool(_) => DataType::Bool,
            AttrValue::Select(_) => DataType::Select,
            AttrValue::MultiSelect(_) => DataType::MultiSelect,
        }
    }

    /// Canonical column payload for persistence. Numeric payloads normalize
    /// into base units, booleans store both spellings, multi-selects encode
    /// the choice set as a JSON array.
    pub fn normalize(&self) -> CatalogResult<NormalizedPayload> {
        let mut payload = NormalizedPayload::default();
        match self {
            AttrValue::Decimal { value, prefix } | AttrValue::Integer { value, prefix } => {
                payload.normalized_value = Some(si::normalize(*value, *prefix)?);
                payload.prefix = *prefix;
            }
            AttrValue::Range { min, max, prefix } => {
                payload.normalized_min = Some(si::normalize(*min, *prefix)?);
                payload.normalized_max = Some(si::normalize(*max, *prefix)?);
                payload.prefix = *prefix;
            }
            AttrValue::Str(text) => {
                payload.string_value = Some(text.clone());
            }
            AttrValue::Bool(flag) => {
                payload.normalized_value = Some(if *flag { Decimal::ONE } else { Decimal::ZERO });
                payload.string_value = Some(if *flag { "true" } else { "false" }.to_string());
            }
            AttrValue::Select(choice) => {
                payload.string_value = Some(choice.clone());
            }
            AttrValue::MultiSelect(choices) => {
                let encoded = serde_json::to_string(choices)
                    .map_err(|err| CatalogError::storage(err.to_string()))?;
                payload.string_value = Some(encoded);
            }
        }
        Ok(payload)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NormalizedPayload {
    pub normalized_value: Option<Decimal>,
    pub normalized_min: Option<Decimal>,
    pub normalized_max: Option<Decimal>,
    pub string_value: Option<String>,
    pub prefix: SiPrefix,
}

/// One persisted attribute value row, always attached to exactly one subject.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributeValue {
    pub value_id: ValueId,
    pub definition_id: DefinitionId,
    pub subject_id: SubjectId,
    pub subject_kind: SubjectKind,
    pub normalized_value: Option<Decimal>,
    pub normalized_min: Option<Decimal>,
    pub normalized_max: Option<Decimal>,
    pub prefix: SiPrefix,
    pub string_value: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl AttributeValue {
    pub fn single(&self) -> CatalogResult<Decimal> {
        self.normalized_value
            .ok_or_else(|| CatalogError::storage("value row missing numeric payload"))
    }

    pub fn bounds(&self) -> CatalogResult<(Decimal, Decimal)> {
        match (self.normalized_min, self.normalized_max) {
            (Some(min), Some(max)) => Ok((min, max)),
            _ => Err(CatalogError::storage("value row missing range payload")),
        }
    }

    pub fn text(&self) -> CatalogResult<&str> {
        self.string_value
            .as_deref()
            .ok_or_else(|| CatalogError::storage("value row missing string payload"))
    }

    /// Decode the stored JSON choice set of a multi-select value.
    pub fn choices(&self) -> CatalogResult<Vec<String>> {
        serde_json::from_str(self.text()?)
            .map_err(|err| CatalogError::storage(format!("invalid choice set: {err}")))
    }

    /// Reconstruct the caller-facing typed value, denormalizing numeric
    /// payloads with the prefix the value was entered with.
    pub fn display_value(&self, data_type: DataType) -> CatalogResult<AttrValue> {
        Ok(match data_type {
            DataType::Decimal => AttrValue::Decimal {
                value: si::denormalize(self.single()?, self.prefix)?,
                prefix: self.prefix,
            },
            DataType::Integer => AttrValue::Integer {
                value: si::denormalize(self.single()?, self.prefix)?,
                prefix: self.prefix,
            },
            DataType::Range => {
                let (min, max) = self.bounds()?;
                AttrValue::Range {
                    min: si::denormalize(min, self.prefix)?,
                    max: si::denormalize(max, self.prefix)?,
                    prefix: self.prefix,
                }
            }
            DataType::Str => AttrValue::Str(self.text()?.to_string()),
            DataType::Bool => AttrValue::Bool(self.text()? == "true"),
            DataType::Select => AttrValue::Select(self.text()?.to_string()),
            DataType::MultiSelect => AttrValue::MultiSelect(self.choices()?),
        })
    }
}
