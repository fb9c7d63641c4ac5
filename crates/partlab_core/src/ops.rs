use serde::{Deserialize, Serialize};

use crate::{
    AttrValue, CategoryId, DataType, DefinitionId, LocalizedText, Scope, SiPrefix, SubjectKind,
};

/// Create a new category under an optional parent.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateCategoryInput {
    pub name: String,
    pub parent_id: Option<CategoryId>,
    pub sort_order: i32,
    pub is_active: bool,
}

/// Partial category update; `parent_id` carries the new parent explicitly,
/// `Some(None)` moves the category to the root.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub parent_id: Option<Option<CategoryId>>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateDefinitionInput {
    pub category_id: CategoryId,
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
}

/// Partial definition update, merged over the stored state before the merged
/// result is re-validated.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DefinitionPatch {
    pub name: Option<String>,
    pub display_name: Option<LocalizedText>,
    pub unit: Option<Option<String>>,
    pub data_type: Option<DataType>,
    pub scope: Option<Scope>,
    pub is_filterable: Option<bool>,
    pub is_required: Option<bool>,
    pub is_label: Option<bool>,
    pub allowed_prefixes: Option<Vec<SiPrefix>>,
    pub allowed_values: Option<Vec<String>>,
    pub sort_order: Option<i32>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateSubjectInput {
    pub kind: SubjectKind,
    pub category_id: CategoryId,
    pub name: LocalizedText,
    pub slug: String,
    pub package_name: Option<String>,
}

/// One value to attach in a `set_values` batch.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValueWrite {
    pub definition_id: DefinitionId,
    pub value: AttrValue,
}
