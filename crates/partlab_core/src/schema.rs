use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{
    AttrValue, CatalogError, CatalogResult, CategoryId, DataType, DefinitionId, Scope, SiPrefix,
    SubjectId, SubjectKind, UserId,
};

/// Who is performing a mutation. Supplied by the caller's auth layer and only
/// recorded for audit attribution, never interpreted here.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActorContext {
    pub user_id: UserId,
    pub role: String,
}

/// Locale-keyed text, e.g. `{"en": "Resistance", "de": "Widerstand"}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalizedText(pub BTreeMap<String, String>);

impl LocalizedText {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn single(locale: impl Into<String>, text: impl Into<String>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(locale.into(), text.into());
        Self(map)
    }

    /// Requested locale first, then `en`, then any non-empty entry.
    pub fn resolve(&self, locale: &str) -> Option<&str> {
        let non_empty = |text: &&String| !text.trim().is_empty();
        self.0
            .get(locale)
            .filter(non_empty)
            .or_else(|| self.0.get("en").filter(non_empty))
            .or_else(|| self.0.values().find(non_empty))
            .map(String::as_str)
    }

    pub fn is_blank(&self) -> bool {
        self.0.values().all(|text| text.trim().is_empty())
    }
}

/// Maximum category level; the tree holds at most five levels, root = 0.
pub const MAX_CATEGORY_LEVEL: i16 = 4;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub category_id: CategoryId,
    pub parent_id: Option<CategoryId>,
    pub level: i16,
    pub name: String,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub definition_id: DefinitionId,
    pub category_id: CategoryId,
    /// Internal name, unique within the owning category.
    pub name: String,
    pub display_name: LocalizedText,
    pub unit: Option<String>,
    pub data_type: DataType,
    pub scope: Scope,
    pub is_filterable: bool,
    pub is_required: bool,
    pub is_label: bool,
    pub allowed_prefixes: Vec<SiPrefix>,
    pub allowed_values: Vec<String>,
    pub sort_order: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

impl AttributeDefinition {
    /// Structural invariants, checked on create and on the merged state of
    /// every update.
    pub fn validate_shape(&self) -> CatalogResult<()> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::invalid("definition name must not be empty"));
        }
        if self.is_label && !self.is_required {
            return Err(CatalogError::invalid(
                "a label attribute must also be required",
            ));
        }
        if self.data_type.is_enumerated() {
            if self.allowed_values.is_empty() {
                return Err(CatalogError::invalid(format!(
                    "{:?} definitions need a non-empty allowed value list",
                    self.data_type
                )));
            }
            if self.allowed_values.iter().any(|value| value.trim().is_empty()) {
                return Err(CatalogError::invalid("allowed values must not be blank"));
            }
            let distinct: HashSet<&str> =
                self.allowed_values.iter().map(String::as_str).collect();
            if distinct.len() != self.allowed_values.len() {
                return Err(CatalogError::invalid("allowed values must be distinct"));
            }
        } else if !self.allowed_values.is_empty() {
            return Err(CatalogError::invalid(format!(
                "allowed values are only meaningful for SELECT/MULTISELECT, not {:?}",
                self.data_type
            )));
        }
        if !self.data_type.is_numeric() && !self.allowed_prefixes.is_empty() {
            return Err(CatalogError::invalid(format!(
                "allowed prefixes are only meaningful for numeric types, not {:?}",
                self.data_type
            )));
        }
        Ok(())
    }

    /// Validate one typed value against this definition: data type match,
    /// enum membership, prefix whitelist, range ordering.
    pub fn validate_value(&self, value: &AttrValue) -> CatalogResult<()> {
        if value.data_type() != self.data_type {
            return Err(CatalogError::invalid(format!(
                "value for '{}' must be {:?}, got {:?}",
                self.name,
                self.data_type,
                value.data_type()
            )));
        }
        match value {
            AttrValue::Decimal { prefix, .. } | AttrValue::Integer { prefix, .. } => {
                self.check_prefix(*prefix)?;
            }
            AttrValue::Range { min, max, prefix } => {
                self.check_prefix(*prefix)?;
                if min > max {
                    return Err(CatalogError::invalid(format!(
                        "range for '{}' has min {min} above max {max}",
                        self.name
                    )));
                }
            }
            AttrValue::Select(choice) => {
                if !self.allowed_values.iter().any(|allowed| allowed == choice) {
                    return Err(CatalogError::invalid(format!(
                        "'{choice}' is not an allowed value of '{}'",
                        self.name
                    )));
                }
            }
            AttrValue::MultiSelect(choices) => {
                if choices.is_empty() {
                    return Err(CatalogError::invalid(format!(
                        "multi-select value for '{}' needs at least one choice",
                        self.name
                    )));
                }
                for choice in choices {
                    if !self.allowed_values.iter().any(|allowed| allowed == choice) {
                        return Err(CatalogError::invalid(format!(
                            "'{choice}' is not an allowed value of '{}'",
                            self.name
                        )));
                    }
                }
            }
            AttrValue::Str(_) | AttrValue::Bool(_) => {}
        }
        Ok(())
    }

    fn check_prefix(&self, prefix: SiPrefix) -> CatalogResult<()> {
        if !self.allowed_prefixes.is_empty() && !self.allowed_prefixes.contains(&prefix) {
            return Err(CatalogError::invalid(format!(
                "prefix '{}' is not allowed on '{}'",
                prefix.symbol(),
                self.name
            )));
        }
        Ok(())
    }
}

/// A component or manufacturer part that attribute values attach to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub subject_id: SubjectId,
    pub kind: SubjectKind,
    pub category_id: CategoryId,
    pub name: LocalizedText,
    pub slug: String,
    pub package_name: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}
