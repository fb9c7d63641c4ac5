use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use partlab_core::{
    ActorContext, AttributeDefinition, AttributeValue, CatalogResult, Category, CategoryId,
    CategoryPatch, CreateCategoryInput, CreateDefinitionInput, CreateSubjectInput, DefinitionId,
    DefinitionPatch, FilterClause, Subject, SubjectId, SubjectKind, ValueWrite,
};

/// Category tree primitives. Nothing else in the engine performs ad hoc
/// parent walks; every other component reasons about the hierarchy through
/// these operations.
#[async_trait]
pub trait HierarchyApi {
    async fn create_category(
        &self,
        ctx: &ActorContext,
        input: CreateCategoryInput,
    ) -> CatalogResult<CategoryId>;

    async fn update_category(
        &self,
        ctx: &ActorContext,
        category_id: CategoryId,
        patch: CategoryPatch,
    ) -> CatalogResult<()>;

    async fn delete_category(
        &self,
        ctx: &ActorContext,
        category_id: CategoryId,
    ) -> CatalogResult<()>;

    async fn get_category(&self, category_id: CategoryId) -> CatalogResult<Category>;

    async fn list_children(&self, category_id: CategoryId) -> CatalogResult<Vec<Category>>;

    /// Ordered ids from the category itself up to the root.
    async fn ancestor_chain(&self, category_id: CategoryId) -> CatalogResult<Vec<CategoryId>>;

    /// The category plus all transitive children of active categories; used
    /// to widen a catalog search to a whole subtree.
    async fn descendant_ids(
        &self,
        category_id: CategoryId,
    ) -> CatalogResult<HashSet<CategoryId>>;

    /// Whether re-parenting `category_id` under `proposed_parent_id` would
    /// close a cycle. Checked inside the re-parenting transaction as well.
    async fn would_create_cycle(
        &self,
        category_id: CategoryId,
        proposed_parent_id: CategoryId,
    ) -> CatalogResult<bool>;
}

/// How `list_definitions` expands and filters a category's definitions.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct ListDefinitionsOptions {
    pub include_inherited: bool,
    /// When set, keeps definitions whose scope admits this subject kind;
    /// BOTH-scoped definitions are always kept.
    pub scope: Option<SubjectKind>,
}

#[async_trait]
pub trait DefinitionApi {
    async fn create_definition(
        &self,
        ctx: &ActorContext,
        input: CreateDefinitionInput,
    ) -> CatalogResult<DefinitionId>;

    async fn update_definition(
        &self,
        ctx: &ActorContext,
        definition_id: DefinitionId,
        patch: DefinitionPatch,
    ) -> CatalogResult<()>;

    async fn delete_definition(
        &self,
        ctx: &ActorContext,
        definition_id: DefinitionId,
    ) -> CatalogResult<()>;

    async fn get_definition(
        &self,
        definition_id: DefinitionId,
    ) -> CatalogResult<AttributeDefinition>;

    async fn list_definitions(
        &self,
        category_id: CategoryId,
        options: ListDefinitionsOptions,
    ) -> CatalogResult<Vec<AttributeDefinition>>;
}

#[async_trait]
pub trait SubjectApi {
    /// Create a subject together with its initial value set, in one
    /// transaction. A blank name is only accepted when the category tree
    /// contributes at least one label attribute for the subject's kind.
    async fn create_subject(
        &self,
        ctx: &ActorContext,
        input: CreateSubjectInput,
        values: Vec<ValueWrite>,
    ) -> CatalogResult<SubjectId>;

    async fn get_subject(&self, subject_id: SubjectId) -> CatalogResult<Subject>;

    async fn delete_subject(
        &self,
        ctx: &ActorContext,
        subject_id: SubjectId,
    ) -> CatalogResult<()>;
}

/// One stored value joined with its definition, as returned by `get_values`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValueWithDefinition {
    pub definition: AttributeDefinition,
    pub value: AttributeValue,
}

#[async_trait]
pub trait ValueApi {
    /// Replace the subject's entire value set. Every entry is validated
    /// before any write; the replacement itself is a single delete-then-
    /// insert transaction, so a failure leaves the old set untouched.
    async fn set_values(
        &self,
        ctx: &ActorContext,
        subject_id: SubjectId,
        values: Vec<ValueWrite>,
    ) -> CatalogResult<()>;

    /// Stored values joined with their definitions, ordered by definition
    /// sort order then name.
    async fn get_values(&self, subject_id: SubjectId)
        -> CatalogResult<Vec<ValueWithDefinition>>;
}

#[async_trait]
pub trait SearchApi {
    /// Conjunctive filter evaluation over the value store. Every clause is
    /// validated before any candidate work; an optional category widens to
    /// its subtree. Returns candidate subject ids in a deterministic order.
    async fn search(
        &self,
        kind: SubjectKind,
        category_id: Option<CategoryId>,
        clauses: Vec<FilterClause>,
    ) -> CatalogResult<Vec<SubjectId>>;
}

#[async_trait]
pub trait DisplayApi {
    /// Human-readable label for a subject: explicit name, label attributes
    /// in sort order, package name, slug fallback.
    async fn display_name(&self, subject_id: SubjectId, locale: &str) -> CatalogResult<String>;
}

pub trait CatalogApi:
    HierarchyApi + DefinitionApi + SubjectApi + ValueApi + SearchApi + DisplayApi + Send + Sync
{
}

impl<T> CatalogApi for T where
    T: HierarchyApi + DefinitionApi + SubjectApi + ValueApi + SearchApi + DisplayApi + Send + Sync
{
}
