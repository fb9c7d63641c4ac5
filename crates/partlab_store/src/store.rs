use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::sea_query;
use sea_orm::sea_query::{
    Expr, ExprTrait, MysqlQueryBuilder, Order, PostgresQueryBuilder, Query, QueryStatementWriter,
    SqliteQueryBuilder, Value as SeaValue,
};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, QueryResult,
    Statement, TransactionTrait,
};
use sea_orm_migration::MigratorTrait;
use serde::Serialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use partlab_core::{
    clause_matches, compose_display_name, now_micros, validate_clause, ActorContext,
    AttributeDefinition, AttributeValue, CatalogError, CatalogResult, Category, CategoryId,
    CategoryPatch, CreateCategoryInput, CreateDefinitionInput, CreateSubjectInput, DataType,
    DefinitionId, DefinitionPatch, FilterClause, Id, LocalizedText, Scope, SiPrefix, Subject,
    SubjectId, SubjectKind, ValueId, ValueWrite, MAX_CATEGORY_LEVEL,
};

use crate::api::{
    DefinitionApi, DisplayApi, HierarchyApi, ListDefinitionsOptions, SearchApi, SubjectApi,
    ValueApi, ValueWithDefinition,
};
use crate::audit::{AuditEvent, AuditSink, LogAuditSink};
use crate::config::CatalogConfig;
use crate::db::*;
use crate::migration::Migrator;

const AUDIT_CATEGORY: &str = "category";
const AUDIT_DEFINITION: &str = "attribute_definition";
const AUDIT_SUBJECT: &str = "subject";
const AUDIT_VALUES: &str = "attribute_values";

/// The catalog service. One instance per storage handle; stateless across
/// requests, every read is a fresh query.
#[derive(Clone)]
pub struct CatalogStore {
    conn: DatabaseConnection,
    backend: DatabaseBackend,
    audit: Arc<dyn AuditSink>,
}

impl CatalogStore {
    pub async fn connect(config: &CatalogConfig, base_dir: &Path) -> CatalogResult<Self> {
        let url = build_connection_url(config, base_dir)?;
        let mut options = ConnectOptions::new(url);
        if let Some(pool) = &config.pool {
            if let Some(max) = pool.max_connections {
                options.max_connections(max);
            }
            if let Some(min) = pool.min_connections {
                options.min_connections(min);
            }
            if let Some(timeout_ms) = pool.connect_timeout_ms {
                options.connect_timeout(Duration::from_millis(timeout_ms));
            }
            if let Some(timeout_ms) = pool.acquire_timeout_ms {
                options.acquire_timeout(Duration::from_millis(timeout_ms));
            }
            if let Some(timeout_ms) = pool.idle_timeout_ms {
                options.idle_timeout(Duration::from_millis(timeout_ms));
            }
        }
        let conn = Database::connect(options).await.map_err(CatalogError::from)?;
        let backend = conn.get_database_backend();
        let store = Self {
            conn,
            backend,
            audit: Arc::new(LogAuditSink),
        };
        Migrator::up(&store.conn, None)
            .await
            .map_err(CatalogError::from)?;
        Ok(store)
    }

    pub async fn connect_sqlite(path: &Path) -> CatalogResult<Self> {
        let config = CatalogConfig::default_sqlite(path.to_string_lossy());
        Self::connect(&config, path.parent().unwrap_or_else(|| Path::new("."))).await
    }

    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = sink;
        self
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    fn emit_audit(
        &self,
        ctx: &ActorContext,
        entity_type: &str,
        entity_id: Id,
        before: Option<JsonValue>,
        after: Option<JsonValue>,
    ) {
        self.audit.record(AuditEvent {
            entity_type: entity_type.to_string(),
            entity_id,
            before,
            after,
            user_id: ctx.user_id,
        });
    }

    async fn fetch_category<C: ConnectionTrait>(
        &self,
        conn: &C,
        category_id: CategoryId,
    ) -> CatalogResult<Category> {
        let select = Query::select()
            .from(PartlabCategories::Table)
            .columns([
                PartlabCategories::CategoryId,
                PartlabCategories::ParentId,
                PartlabCategories::Level,
                PartlabCategories::Name,
                PartlabCategories::SortOrder,
                PartlabCategories::IsActive,
                PartlabCategories::CreatedAt,
                PartlabCategories::UpdatedAt,
            ])
            .and_where(
                Expr::col(PartlabCategories::CategoryId)
                    .eq(id_value(self.backend, category_id.0)),
            )
            .limit(1)
            .to_owned();
        let row = query_one(conn, &select).await?;
        let Some(row) = row else {
            return Err(CatalogError::not_found("category not found"));
        };
        read_category(&row)
    }

    async fn fetch_definition<C: ConnectionTrait>(
        &self,
        conn: &C,
        definition_id: DefinitionId,
    ) -> CatalogResult<AttributeDefinition> {
        let select = definition_select()
            .and_where(
                Expr::col(PartlabDefinitions::DefinitionId)
                    .eq(id_value(self.backend, definition_id.0)),
            )
            .limit(1)
            .to_owned();
        let row = query_one(conn, &select).await?;
        let Some(row) = row else {
            return Err(CatalogError::not_found("definition not found"));
        };
        read_definition(&row)
    }

    async fn fetch_subject<C: ConnectionTrait>(
        &self,
        conn: &C,
        subject_id: SubjectId,
    ) -> CatalogResult<Subject> {
        let select = Query::select()
            .from(PartlabSubjects::Table)
            .columns([
                PartlabSubjects::SubjectId,
                PartlabSubjects::SubjectKind,
                PartlabSubjects::CategoryId,
                PartlabSubjects::NameJson,
                PartlabSubjects::Slug,
                PartlabSubjects::PackageName,
                PartlabSubjects::CreatedAt,
                PartlabSubjects::UpdatedAt,
            ])
            .and_where(
                Expr::col(PartlabSubjects::SubjectId).eq(id_value(self.backend, subject_id.0)),
            )
            .limit(1)
            .to_owned();
        let row = query_one(conn, &select).await?;
        let Some(row) = row else {
            return Err(CatalogError::not_found("subject not found"));
        };
        read_subject(&row)
    }

    /// Walk parent links from `category_id` up to the root. The walk is
    /// bounded by the depth invariant: a visited id or an over-long chain
    /// means corrupted hierarchy data and surfaces as a storage error
    /// instead of an endless loop.
    async fn walk_ancestors<C: ConnectionTrait>(
        &self,
        conn: &C,
        category_id: CategoryId,
    ) -> CatalogResult<Vec<CategoryId>> {
        let mut current = self.fetch_category(conn, category_id).await?;
        let mut chain = vec![current.category_id];
        let mut visited: HashSet<CategoryId> = chain.iter().copied().collect();
        while let Some(parent_id) = current.parent_id {
            if !visited.insert(parent_id) || chain.len() > MAX_CATEGORY_LEVEL as usize {
                return Err(CatalogError::storage("category hierarchy contains a cycle"));
            }
            current = self.fetch_category(conn, parent_id).await.map_err(|err| {
                match err {
                    CatalogError::NotFound { .. } => {
                        CatalogError::storage("category parent link is dangling")
                    }
                    other => other,
                }
            })?;
            chain.push(current.category_id);
        }
        Ok(chain)
    }

    /// Collect the subtree rooted at `root` as (id, level) pairs, root
    /// included. When `include_inactive` is false, inactive children are
    /// neither collected nor expanded; the cycle guard always walks with
    /// `include_inactive` so a cycle through an inactive node cannot slip
    /// past it.
    async fn collect_subtree<C: ConnectionTrait>(
        &self,
        conn: &C,
        root: CategoryId,
        include_inactive: bool,
    ) -> CatalogResult<Vec<(CategoryId, i16)>> {
        let root_row = self.fetch_category(conn, root).await?;
        let mut collected = vec![(root_row.category_id, root_row.level)];
        let mut visited: HashSet<CategoryId> = [root_row.category_id].into_iter().collect();
        let mut queue = vec![root_row.category_id];
        while let Some(current) = queue.pop() {
            let mut select = Query::select()
                .from(PartlabCategories::Table)
                .columns([PartlabCategories::CategoryId, PartlabCategories::Level])
                .and_where(
                    Expr::col(PartlabCategories::ParentId).eq(id_value(self.backend, current.0)),
                )
                .to_owned();
            if !include_inactive {
                select.and_where(Expr::col(PartlabCategories::IsActive).eq(true));
            }
            let rows = query_all(conn, &select).await?;
            for row in rows {
                let child = CategoryId(read_id(&row, PartlabCategories::CategoryId)?);
                let level: i16 = row.try_get("", &col_name(PartlabCategories::Level))?;
                if visited.insert(child) {
                    collected.push((child, level));
                    queue.push(child);
                }
            }
        }
        Ok(collected)
    }

    async fn load_definitions_for_categories<C: ConnectionTrait>(
        &self,
        conn: &C,
        categories: &[CategoryId],
    ) -> CatalogResult<Vec<AttributeDefinition>> {
        if categories.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<SeaValue> = categories
            .iter()
            .map(|id| id_value(self.backend, id.0))
            .collect();
        let select = definition_select()
            .and_where(Expr::col(PartlabDefinitions::CategoryId).is_in(ids))
            .to_owned();
        let rows = query_all(conn, &select).await?;
        rows.iter().map(read_definition).collect()
    }

    async fn definition_has_values<C: ConnectionTrait>(
        &self,
        conn: &C,
        definition_id: DefinitionId,
    ) -> CatalogResult<bool> {
        let select = Query::select()
            .from(PartlabValues::Table)
            .column(PartlabValues::ValueId)
            .and_where(
                Expr::col(PartlabValues::DefinitionId)
                    .eq(id_value(self.backend, definition_id.0)),
            )
            .limit(1)
            .to_owned();
        Ok(query_one(conn, &select).await?.is_some())
    }

    async fn load_values<C: ConnectionTrait>(
        &self,
        conn: &C,
        subject_id: SubjectId,
    ) -> CatalogResult<Vec<AttributeValue>> {
        let select = value_select()
            .and_where(Expr::col(PartlabValues::SubjectId).eq(id_value(self.backend, subject_id.0)))
            .to_owned();
        let rows = query_all(conn, &select).await?;
        rows.iter().map(read_value).collect()
    }

    async fn load_values_for_definition<C: ConnectionTrait>(
        &self,
        conn: &C,
        definition_id: DefinitionId,
        kind: SubjectKind,
    ) -> CatalogResult<Vec<AttributeValue>> {
        let select = value_select()
            .and_where(
                Expr::col(PartlabValues::DefinitionId)
                    .eq(id_value(self.backend, definition_id.0)),
            )
            .and_where(Expr::col(PartlabValues::SubjectKind).eq(kind.as_i16() as i64))
            .to_owned();
        let rows = query_all(conn, &select).await?;
        rows.iter().map(read_value).collect()
    }

    /// Validate a whole value batch and turn it into insertable rows.
    /// Performs every check before the caller writes anything: definition
    /// existence, scope admission, typed-value validation, and batch-level
    /// duplicate definitions.
    async fn prepare_value_rows<C: ConnectionTrait>(
        &self,
        conn: &C,
        subject_id: SubjectId,
        kind: SubjectKind,
        writes: &[ValueWrite],
        now: i64,
    ) -> CatalogResult<Vec<AttributeValue>> {
        let mut seen: HashSet<DefinitionId> = HashSet::new();
        let mut rows = Vec::with_capacity(writes.len());
        for write in writes {
            if !seen.insert(write.definition_id) {
                return Err(CatalogError::invalid(
                    "value batch references the same definition twice",
                ));
            }
            let definition = self.fetch_definition(conn, write.definition_id).await?;
            if !definition.scope.accepts(kind) {
                return Err(CatalogError::invalid(format!(
                    "attribute '{}' is not applicable to {kind:?} subjects",
                    definition.name
                )));
            }
            definition.validate_value(&write.value)?;
            let payload = write.value.normalize()?;
            rows.push(AttributeValue {
                value_id: ValueId(Id::new()),
                definition_id: write.definition_id,
                subject_id,
                subject_kind: kind,
                normalized_value: payload.normalized_value,
                normalized_min: payload.normalized_min,
                normalized_max: payload.normalized_max,
                prefix: payload.prefix,
                string_value: payload.string_value,
                created_at: now,
                updated_at: now,
            });
        }
        Ok(rows)
    }

    async fn insert_value_row<C: ConnectionTrait>(
        &self,
        conn: &C,
        row: &AttributeValue,
    ) -> CatalogResult<()> {
        let insert = Query::insert()
            .into_table(PartlabValues::Table)
            .columns([
                PartlabValues::ValueId,
                PartlabValues::DefinitionId,
                PartlabValues::SubjectId,
                PartlabValues::SubjectKind,
                PartlabValues::NormalizedValue,
                PartlabValues::NormalizedMin,
                PartlabValues::NormalizedMax,
                PartlabValues::Prefix,
                PartlabValues::StringValue,
                PartlabValues::CreatedAt,
                PartlabValues::UpdatedAt,
            ])
            .values_panic([
                id_value(self.backend, row.value_id.0).into(),
                id_value(self.backend, row.definition_id.0).into(),
                id_value(self.backend, row.subject_id.0).into(),
                (row.subject_kind.as_i16() as i64).into(),
                row.normalized_value.map(|value| value.to_string()).into(),
                row.normalized_min.map(|value| value.to_string()).into(),
                row.normalized_max.map(|value| value.to_string()).into(),
                row.prefix.symbol().into(),
                row.string_value.clone().into(),
                row.created_at.into(),
                row.updated_at.into(),
            ])
            .to_owned();
        exec(conn, &insert).await
    }

    async fn insert_definition_row<C: ConnectionTrait>(
        &self,
        conn: &C,
        definition: &AttributeDefinition,
    ) -> CatalogResult<()> {
        let insert = Query::insert()
            .into_table(PartlabDefinitions::Table)
            .columns([
                PartlabDefinitions::DefinitionId,
                PartlabDefinitions::CategoryId,
                PartlabDefinitions::Name,
                PartlabDefinitions::DisplayNameJson,
                PartlabDefinitions::Unit,
                PartlabDefinitions::DataType,
                PartlabDefinitions::Scope,
                PartlabDefinitions::IsFilterable,
                PartlabDefinitions::IsRequired,
                PartlabDefinitions::IsLabel,
                PartlabDefinitions::AllowedPrefixes,
                PartlabDefinitions::AllowedValues,
                PartlabDefinitions::SortOrder,
                PartlabDefinitions::CreatedAt,
                PartlabDefinitions::UpdatedAt,
            ])
            .values_panic([
                id_value(self.backend, definition.definition_id.0).into(),
                id_value(self.backend, definition.category_id.0).into(),
                definition.name.clone().into(),
                to_json_text(&definition.display_name)?.into(),
                definition.unit.clone().into(),
                (definition.data_type.as_i16() as i64).into(),
                (definition.scope.as_i16() as i64).into(),
                definition.is_filterable.into(),
                definition.is_required.into(),
                definition.is_label.into(),
                to_json_text(&definition.allowed_prefixes)?.into(),
                to_json_text(&definition.allowed_values)?.into(),
                (definition.sort_order as i64).into(),
                definition.created_at.into(),
                definition.updated_at.into(),
            ])
            .to_owned();
        exec(conn, &insert).await
    }

    async fn update_definition_row<C: ConnectionTrait>(
        &self,
        conn: &C,
        definition: &AttributeDefinition,
    ) -> CatalogResult<()> {
        let update = Query::update()
            .table(PartlabDefinitions::Table)
            .values([
                (PartlabDefinitions::Name, definition.name.clone().into()),
                (
                    PartlabDefinitions::DisplayNameJson,
                    to_json_text(&definition.display_name)?.into(),
                ),
                (PartlabDefinitions::Unit, definition.unit.clone().into()),
                (
                    PartlabDefinitions::DataType,
                    (definition.data_type.as_i16() as i64).into(),
                ),
                (
                    PartlabDefinitions::Scope,
                    (definition.scope.as_i16() as i64).into(),
                ),
                (
                    PartlabDefinitions::IsFilterable,
                    definition.is_filterable.into(),
                ),
                (
                    PartlabDefinitions::IsRequired,
                    definition.is_required.into(),
                ),
                (PartlabDefinitions::IsLabel, definition.is_label.into()),
                (
                    PartlabDefinitions::AllowedPrefixes,
                    to_json_text(&definition.allowed_prefixes)?.into(),
                ),
                (
                    PartlabDefinitions::AllowedValues,
                    to_json_text(&definition.allowed_values)?.into(),
                ),
                (
                    PartlabDefinitions::SortOrder,
                    (definition.sort_order as i64).into(),
                ),
                (PartlabDefinitions::UpdatedAt, definition.updated_at.into()),
            ])
            .and_where(
                Expr::col(PartlabDefinitions::DefinitionId)
                    .eq(id_value(self.backend, definition.definition_id.0)),
            )
            .to_owned();
        exec(conn, &update).await
    }

    async fn insert_subject_row<C: ConnectionTrait>(
        &self,
        conn: &C,
        subject: &Subject,
    ) -> CatalogResult<()> {
        let insert = Query::insert()
            .into_table(PartlabSubjects::Table)
            .columns([
                PartlabSubjects::SubjectId,
                PartlabSubjects::SubjectKind,
                PartlabSubjects::CategoryId,
                PartlabSubjects::NameJson,
                PartlabSubjects::Slug,
                PartlabSubjects::PackageName,
                PartlabSubjects::CreatedAt,
                PartlabSubjects::UpdatedAt,
            ])
            .values_panic([
                id_value(self.backend, subject.subject_id.0).into(),
                (subject.kind.as_i16() as i64).into(),
                id_value(self.backend, subject.category_id.0).into(),
                to_json_text(&subject.name)?.into(),
                subject.slug.clone().into(),
                subject.package_name.clone().into(),
                subject.created_at.into(),
                subject.updated_at.into(),
            ])
            .to_owned();
        exec(conn, &insert).await
    }
}

#[async_trait]
impl HierarchyApi for CatalogStore {
    async fn create_category(
        &self,
        ctx: &ActorContext,
        input: CreateCategoryInput,
    ) -> CatalogResult<CategoryId> {
        if input.name.trim().is_empty() {
            return Err(CatalogError::invalid("category name must not be empty"));
        }
        let level = match input.parent_id {
            Some(parent_id) => {
                let parent = self.fetch_category(&self.conn, parent_id).await?;
                if parent.level >= MAX_CATEGORY_LEVEL {
                    return Err(CatalogError::invalid(format!(
                        "category tree is limited to {} levels",
                        MAX_CATEGORY_LEVEL + 1
                    )));
                }
                parent.level + 1
            }
            None => 0,
        };
        let now = now_micros();
        let category = Category {
            category_id: CategoryId(Id::new()),
            parent_id: input.parent_id,
            level,
            name: input.name,
            sort_order: input.sort_order,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };
        let insert = Query::insert()
            .into_table(PartlabCategories::Table)
            .columns([
                PartlabCategories::CategoryId,
                PartlabCategories::ParentId,
                PartlabCategories::Level,
                PartlabCategories::Name,
                PartlabCategories::SortOrder,
                PartlabCategories::IsActive,
                PartlabCategories::CreatedAt,
                PartlabCategories::UpdatedAt,
            ])
            .values_panic([
                id_value(self.backend, category.category_id.0).into(),
                opt_id_value(self.backend, category.parent_id.map(|id| id.0)).into(),
                (category.level as i64).into(),
                category.name.clone().into(),
                (category.sort_order as i64).into(),
                category.is_active.into(),
                category.created_at.into(),
                category.updated_at.into(),
            ])
            .to_owned();
        exec(&self.conn, &insert).await?;
        self.emit_audit(
            ctx,
            AUDIT_CATEGORY,
            category.category_id.0,
            None,
            audit_json(&category),
        );
        Ok(category.category_id)
    }

    async fn update_category(
        &self,
        ctx: &ActorContext,
        category_id: CategoryId,
        patch: CategoryPatch,
    ) -> CatalogResult<()> {
        let tx = self.conn.begin().await?;
        let existing = self.fetch_category(&tx, category_id).await?;
        let mut updated = existing.clone();
        if let Some(name) = patch.name {
            if name.trim().is_empty() {
                return Err(CatalogError::invalid("category name must not be empty"));
            }
            updated.name = name;
        }
        if let Some(sort_order) = patch.sort_order {
            updated.sort_order = sort_order;
        }
        if let Some(is_active) = patch.is_active {
            updated.is_active = is_active;
        }

        // Re-parenting runs its cycle and depth validation inside this same
        // transaction so a concurrent move of the subtree cannot slip
        // between check and write.
        if let Some(new_parent) = patch.parent_id {
            if new_parent != existing.parent_id {
                let subtree = self.collect_subtree(&tx, category_id, true).await?;
                let new_level = match new_parent {
                    Some(parent_id) => {
                        if subtree.iter().any(|(id, _)| *id == parent_id) {
                            return Err(CatalogError::invalid(
                                "cannot move a category under itself or its descendants",
                            ));
                        }
                        let parent = self.fetch_category(&tx, parent_id).await?;
                        parent.level + 1
                    }
                    None => 0,
                };
                let delta = new_level - existing.level;
                let deepest = subtree
                    .iter()
                    .map(|(_, level)| *level)
                    .max()
                    .unwrap_or(existing.level);
                if deepest + delta > MAX_CATEGORY_LEVEL {
                    return Err(CatalogError::invalid(format!(
                        "move would exceed the {}-level category limit",
                        MAX_CATEGORY_LEVEL + 1
                    )));
                }
                for (descendant_id, level) in &subtree {
                    if *descendant_id == category_id {
                        continue;
                    }
                    let relevel = Query::update()
                        .table(PartlabCategories::Table)
                        .values([(PartlabCategories::Level, ((level + delta) as i64).into())])
                        .and_where(
                            Expr::col(PartlabCategories::CategoryId)
                                .eq(id_value(self.backend, descendant_id.0)),
                        )
                        .to_owned();
                    exec(&tx, &relevel).await?;
                }
                updated.parent_id = new_parent;
                updated.level = new_level;
            }
        }

        updated.updated_at = now_micros();
        let update = Query::update()
            .table(PartlabCategories::Table)
            .values([
                (
                    PartlabCategories::ParentId,
                    opt_id_value(self.backend, updated.parent_id.map(|id| id.0)).into(),
                ),
                (PartlabCategories::Level, (updated.level as i64).into()),
                (PartlabCategories::Name, updated.name.clone().into()),
                (
                    PartlabCategories::SortOrder,
                    (updated.sort_order as i64).into(),
                ),
                (PartlabCategories::IsActive, updated.is_active.into()),
                (PartlabCategories::UpdatedAt, updated.updated_at.into()),
            ])
            .and_where(
                Expr::col(PartlabCategories::CategoryId)
                    .eq(id_value(self.backend, category_id.0)),
            )
            .to_owned();
        exec(&tx, &update).await?;
        tx.commit().await?;
        self.emit_audit(
            ctx,
            AUDIT_CATEGORY,
            category_id.0,
            audit_json(&existing),
            audit_json(&updated),
        );
        Ok(())
    }

    async fn delete_category(
        &self,
        ctx: &ActorContext,
        category_id: CategoryId,
    ) -> CatalogResult<()> {
        let tx = self.conn.begin().await?;
        let existing = self.fetch_category(&tx, category_id).await?;

        let child = Query::select()
            .from(PartlabCategories::Table)
            .column(PartlabCategories::CategoryId)
            .and_where(
                Expr::col(PartlabCategories::ParentId).eq(id_value(self.backend, category_id.0)),
            )
            .limit(1)
            .to_owned();
        if query_one(&tx, &child).await?.is_some() {
            return Err(CatalogError::conflict("category still has child categories"));
        }

        let subject = Query::select()
            .from(PartlabSubjects::Table)
            .column(PartlabSubjects::SubjectId)
            .and_where(
                Expr::col(PartlabSubjects::CategoryId).eq(id_value(self.backend, category_id.0)),
            )
            .limit(1)
            .to_owned();
        if query_one(&tx, &subject).await?.is_some() {
            return Err(CatalogError::conflict("category still has subjects"));
        }

        let definitions = self
            .load_definitions_for_categories(&tx, &[category_id])
            .await?;
        for definition in &definitions {
            if self
                .definition_has_values(&tx, definition.definition_id)
                .await?
            {
                return Err(CatalogError::conflict(format!(
                    "definition '{}' still has attached values",
                    definition.name
                )));
            }
        }

        let drop_definitions = Query::delete()
            .from_table(PartlabDefinitions::Table)
            .and_where(
                Expr::col(PartlabDefinitions::CategoryId)
                    .eq(id_value(self.backend, category_id.0)),
            )
            .to_owned();
        exec(&tx, &drop_definitions).await?;

        let drop_category = Query::delete()
            .from_table(PartlabCategories::Table)
            .and_where(
                Expr::col(PartlabCategories::CategoryId)
                    .eq(id_value(self.backend, category_id.0)),
            )
            .to_owned();
        exec(&tx, &drop_category).await?;
        tx.commit().await?;
        self.emit_audit(
            ctx,
            AUDIT_CATEGORY,
            category_id.0,
            audit_json(&existing),
            None,
        );
        Ok(())
    }

    async fn get_category(&self, category_id: CategoryId) -> CatalogResult<Category> {
        self.fetch_category(&self.conn, category_id).await
    }

    async fn list_children(&self, category_id: CategoryId) -> CatalogResult<Vec<Category>> {
        self.fetch_category(&self.conn, category_id).await?;
        let select = Query::select()
            .from(PartlabCategories::Table)
            .columns([
                PartlabCategories::CategoryId,
                PartlabCategories::ParentId,
                PartlabCategories::Level,
                PartlabCategories::Name,
                PartlabCategories::SortOrder,
                PartlabCategories::IsActive,
                PartlabCategories::CreatedAt,
                PartlabCategories::UpdatedAt,
            ])
            .and_where(
                Expr::col(PartlabCategories::ParentId).eq(id_value(self.backend, category_id.0)),
            )
            .order_by(PartlabCategories::SortOrder, Order::Asc)
            .order_by(PartlabCategories::Name, Order::Asc)
            .to_owned();
        let rows = query_all(&self.conn, &select).await?;
        rows.iter().map(read_category).collect()
    }

    async fn ancestor_chain(&self, category_id: CategoryId) -> CatalogResult<Vec<CategoryId>> {
        self.walk_ancestors(&self.conn, category_id).await
    }

    async fn descendant_ids(
        &self,
        category_id: CategoryId,
    ) -> CatalogResult<HashSet<CategoryId>> {
        let subtree = self.collect_subtree(&self.conn, category_id, false).await?;
        Ok(subtree.into_iter().map(|(id, _)| id).collect())
    }

    async fn would_create_cycle(
        &self,
        category_id: CategoryId,
        proposed_parent_id: CategoryId,
    ) -> CatalogResult<bool> {
        let subtree = self.collect_subtree(&self.conn, category_id, true).await?;
        Ok(subtree.iter().any(|(id, _)| *id == proposed_parent_id))
    }
}

#[async_trait]
impl DefinitionApi for CatalogStore {
    async fn create_definition(
        &self,
        ctx: &ActorContext,
        input: CreateDefinitionInput,
    ) -> CatalogResult<DefinitionId> {
        self.fetch_category(&self.conn, input.category_id).await?;
        let now = now_micros();
        let definition = AttributeDefinition {
            definition_id: DefinitionId(Id::new()),
            category_id: input.category_id,
            name: input.name,
            display_name: input.display_name,
            unit: input.unit,
            data_type: input.data_type,
            scope: input.scope,
            is_filterable: input.is_filterable,
            is_required: input.is_required,
            is_label: input.is_label,
            allowed_prefixes: input.allowed_prefixes,
            allowed_values: input.allowed_values,
            sort_order: input.sort_order,
            created_at: now,
            updated_at: now,
        };
        definition.validate_shape()?;
        // No pre-check on (category, name): the unique index decides, and a
        // violation arrives here as a Conflict.
        self.insert_definition_row(&self.conn, &definition).await?;
        self.emit_audit(
            ctx,
            AUDIT_DEFINITION,
            definition.definition_id.0,
            None,
            audit_json(&definition),
        );
        Ok(definition.definition_id)
    }

    async fn update_definition(
        &self,
        ctx: &ActorContext,
        definition_id: DefinitionId,
        patch: DefinitionPatch,
    ) -> CatalogResult<()> {
        let tx = self.conn.begin().await?;
        let existing = self.fetch_definition(&tx, definition_id).await?;
        let mut updated = existing.clone();
        if let Some(name) = patch.name {
            updated.name = name;
        }
        if let Some(display_name) = patch.display_name {
            updated.display_name = display_name;
        }
        if let Some(unit) = patch.unit {
            updated.unit = unit;
        }
        if let Some(data_type) = patch.data_type {
            updated.data_type = data_type;
        }
        if let Some(scope) = patch.scope {
            updated.scope = scope;
        }
        if let Some(is_filterable) = patch.is_filterable {
            updated.is_filterable = is_filterable;
        }
        if let Some(is_required) = patch.is_required {
            updated.is_required = is_required;
        }
        if let Some(is_label) = patch.is_label {
            updated.is_label = is_label;
        }
        if let Some(allowed_prefixes) = patch.allowed_prefixes {
            updated.allowed_prefixes = allowed_prefixes;
        }
        if let Some(allowed_values) = patch.allowed_values {
            updated.allowed_values = allowed_values;
        }
        if let Some(sort_order) = patch.sort_order {
            updated.sort_order = sort_order;
        }
        updated.validate_shape()?;
        if (updated.data_type != existing.data_type || updated.scope != existing.scope)
            && self.definition_has_values(&tx, definition_id).await?
        {
            return Err(CatalogError::conflict(
                "definition has attached values; data type and scope cannot change",
            ));
        }
        updated.updated_at = now_micros();
        self.update_definition_row(&tx, &updated).await?;
        tx.commit().await?;
        self.emit_audit(
            ctx,
            AUDIT_DEFINITION,
            definition_id.0,
            audit_json(&existing),
            audit_json(&updated),
        );
        Ok(())
    }

    async fn delete_definition(
        &self,
        ctx: &ActorContext,
        definition_id: DefinitionId,
    ) -> CatalogResult<()> {
        let tx = self.conn.begin().await?;
        let existing = self.fetch_definition(&tx, definition_id).await?;
        if self.definition_has_values(&tx, definition_id).await? {
            return Err(CatalogError::conflict(
                "definition still has attached values",
            ));
        }
        let delete = Query::delete()
            .from_table(PartlabDefinitions::Table)
            .and_where(
                Expr::col(PartlabDefinitions::DefinitionId)
                    .eq(id_value(self.backend, definition_id.0)),
            )
            .to_owned();
        exec(&tx, &delete).await?;
        tx.commit().await?;
        self.emit_audit(
            ctx,
            AUDIT_DEFINITION,
            definition_id.0,
            audit_json(&existing),
            None,
        );
        Ok(())
    }

    async fn get_definition(
        &self,
        definition_id: DefinitionId,
    ) -> CatalogResult<AttributeDefinition> {
        self.fetch_definition(&self.conn, definition_id).await
    }

    async fn list_definitions(
        &self,
        category_id: CategoryId,
        options: ListDefinitionsOptions,
    ) -> CatalogResult<Vec<AttributeDefinition>> {
        let chain = if options.include_inherited {
            self.walk_ancestors(&self.conn, category_id).await?
        } else {
            self.fetch_category(&self.conn, category_id).await?;
            vec![category_id]
        };
        let mut definitions = self
            .load_definitions_for_categories(&self.conn, &chain)
            .await?;
        if let Some(kind) = options.scope {
            definitions.retain(|definition| definition.scope.accepts(kind));
        }
        definitions.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(definitions)
    }
}

#[async_trait]
impl SubjectApi for CatalogStore {
    async fn create_subject(
        &self,
        ctx: &ActorContext,
        input: CreateSubjectInput,
        values: Vec<ValueWrite>,
    ) -> CatalogResult<SubjectId> {
        let category = self.fetch_category(&self.conn, input.category_id).await?;
        if !category.is_active {
            return Err(CatalogError::invalid("category is not active"));
        }
        if input.slug.trim().is_empty() {
            return Err(CatalogError::invalid("subject slug must not be empty"));
        }
        if input.name.is_blank() {
            let chain = self.walk_ancestors(&self.conn, input.category_id).await?;
            let definitions = self
                .load_definitions_for_categories(&self.conn, &chain)
                .await?;
            let has_label = definitions
                .iter()
                .any(|definition| definition.is_label && definition.scope.accepts(input.kind));
            if !has_label {
                return Err(CatalogError::invalid(
                    "a subject without a name needs at least one label attribute in its category tree",
                ));
            }
        }
        let now = now_micros();
        let subject = Subject {
            subject_id: SubjectId(Id::new()),
            kind: input.kind,
            category_id: input.category_id,
            name: input.name,
            slug: input.slug,
            package_name: input.package_name,
            created_at: now,
            updated_at: now,
        };
        let rows = self
            .prepare_value_rows(&self.conn, subject.subject_id, subject.kind, &values, now)
            .await?;
        let tx = self.conn.begin().await?;
        self.insert_subject_row(&tx, &subject).await?;
        for row in &rows {
            self.insert_value_row(&tx, row).await?;
        }
        tx.commit().await?;
        self.emit_audit(
            ctx,
            AUDIT_SUBJECT,
            subject.subject_id.0,
            None,
            audit_json(&subject),
        );
        if !rows.is_empty() {
            self.emit_audit(
                ctx,
                AUDIT_VALUES,
                subject.subject_id.0,
                None,
                audit_json(&rows),
            );
        }
        Ok(subject.subject_id)
    }

    async fn get_subject(&self, subject_id: SubjectId) -> CatalogResult<Subject> {
        self.fetch_subject(&self.conn, subject_id).await
    }

    async fn delete_subject(
        &self,
        ctx: &ActorContext,
        subject_id: SubjectId,
    ) -> CatalogResult<()> {
        let tx = self.conn.begin().await?;
        let existing = self.fetch_subject(&tx, subject_id).await?;
        let drop_values = Query::delete()
            .from_table(PartlabValues::Table)
            .and_where(Expr::col(PartlabValues::SubjectId).eq(id_value(self.backend, subject_id.0)))
            .to_owned();
        exec(&tx, &drop_values).await?;
        let drop_subject = Query::delete()
            .from_table(PartlabSubjects::Table)
            .and_where(
                Expr::col(PartlabSubjects::SubjectId).eq(id_value(self.backend, subject_id.0)),
            )
            .to_owned();
        exec(&tx, &drop_subject).await?;
        tx.commit().await?;
        self.emit_audit(ctx, AUDIT_SUBJECT, subject_id.0, audit_json(&existing), None);
        Ok(())
    }
}

#[async_trait]
impl ValueApi for CatalogStore {
    async fn set_values(
        &self,
        ctx: &ActorContext,
        subject_id: SubjectId,
        values: Vec<ValueWrite>,
    ) -> CatalogResult<()> {
        let subject = self.fetch_subject(&self.conn, subject_id).await?;
        let now = now_micros();
        // Validate the whole batch before touching storage; one bad entry
        // aborts everything.
        let rows = self
            .prepare_value_rows(&self.conn, subject_id, subject.kind, &values, now)
            .await?;
        let before = self.load_values(&self.conn, subject_id).await?;
        let tx = self.conn.begin().await?;
        let drop_values = Query::delete()
            .from_table(PartlabValues::Table)
            .and_where(Expr::col(PartlabValues::SubjectId).eq(id_value(self.backend, subject_id.0)))
            .to_owned();
        exec(&tx, &drop_values).await?;
        for row in &rows {
            self.insert_value_row(&tx, row).await?;
        }
        tx.commit().await?;
        self.emit_audit(
            ctx,
            AUDIT_VALUES,
            subject_id.0,
            audit_json(&before),
            audit_json(&rows),
        );
        Ok(())
    }

    async fn get_values(
        &self,
        subject_id: SubjectId,
    ) -> CatalogResult<Vec<ValueWithDefinition>> {
        self.fetch_subject(&self.conn, subject_id).await?;
        let values = self.load_values(&self.conn, subject_id).await?;
        if values.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<SeaValue> = values
            .iter()
            .map(|value| id_value(self.backend, value.definition_id.0))
            .collect();
        let select = definition_select()
            .and_where(Expr::col(PartlabDefinitions::DefinitionId).is_in(ids))
            .to_owned();
        let rows = query_all(&self.conn, &select).await?;
        let mut definitions: HashMap<DefinitionId, AttributeDefinition> = HashMap::new();
        for row in &rows {
            let definition = read_definition(row)?;
            definitions.insert(definition.definition_id, definition);
        }
        let mut paired = Vec::with_capacity(values.len());
        for value in values {
            let definition = definitions
                .get(&value.definition_id)
                .cloned()
                .ok_or_else(|| {
                    CatalogError::storage("value references a missing definition")
                })?;
            paired.push(ValueWithDefinition { definition, value });
        }
        paired.sort_by(|a, b| {
            a.definition
                .sort_order
                .cmp(&b.definition.sort_order)
                .then_with(|| a.definition.name.cmp(&b.definition.name))
        });
        Ok(paired)
    }
}

#[async_trait]
impl SearchApi for CatalogStore {
    async fn search(
        &self,
        kind: SubjectKind,
        category_id: Option<CategoryId>,
        clauses: Vec<FilterClause>,
    ) -> CatalogResult<Vec<SubjectId>> {
        // Compile first: every clause must reference an existing, filterable
        // definition with a legal operator/operand shape before any
        // candidate work starts.
        for clause in &clauses {
            let definition = self.fetch_definition(&self.conn, clause.definition_id).await?;
            validate_clause(&definition, clause)?;
        }

        let mut candidates: Option<HashSet<SubjectId>> = match category_id {
            Some(category_id) => {
                let categories = self.descendant_ids(category_id).await?;
                Some(self.subjects_in_categories(kind, &categories).await?)
            }
            None => None,
        };

        for clause in &clauses {
            let rows = self
                .load_values_for_definition(&self.conn, clause.definition_id, kind)
                .await?;
            let mut matched: HashSet<SubjectId> = HashSet::new();
            for row in &rows {
                if clause_matches(clause, row)? {
                    matched.insert(row.subject_id);
                }
            }
            candidates = Some(match candidates.take() {
                Some(existing) => existing.intersection(&matched).copied().collect(),
                None => matched,
            });
            if let Some(current) = &candidates {
                if current.is_empty() {
                    return Ok(Vec::new());
                }
            }
        }

        let mut results: Vec<SubjectId> = match candidates {
            Some(ids) => ids.into_iter().collect(),
            None => {
                let select = Query::select()
                    .from(PartlabSubjects::Table)
                    .column(PartlabSubjects::SubjectId)
                    .and_where(
                        Expr::col(PartlabSubjects::SubjectKind).eq(kind.as_i16() as i64),
                    )
                    .to_owned();
                let rows = query_all(&self.conn, &select).await?;
                rows.iter()
                    .map(|row| Ok(SubjectId(read_id(row, PartlabSubjects::SubjectId)?)))
                    .collect::<CatalogResult<Vec<_>>>()?
            }
        };
        results.sort_by(|a, b| a.0.as_bytes().cmp(&b.0.as_bytes()));
        Ok(results)
    }
}

impl CatalogStore {
    async fn subjects_in_categories(
        &self,
        kind: SubjectKind,
        categories: &HashSet<CategoryId>,
    ) -> CatalogResult<HashSet<SubjectId>> {
        if categories.is_empty() {
            return Ok(HashSet::new());
        }
        let ids: Vec<SeaValue> = categories
            .iter()
            .map(|id| id_value(self.backend, id.0))
            .collect();
        let select = Query::select()
            .from(PartlabSubjects::Table)
            .column(PartlabSubjects::SubjectId)
            .and_where(Expr::col(PartlabSubjects::CategoryId).is_in(ids))
            .and_where(Expr::col(PartlabSubjects::SubjectKind).eq(kind.as_i16() as i64))
            .to_owned();
        let rows = query_all(&self.conn, &select).await?;
        rows.iter()
            .map(|row| Ok(SubjectId(read_id(row, PartlabSubjects::SubjectId)?)))
            .collect()
    }
}

#[async_trait]
impl DisplayApi for CatalogStore {
    async fn display_name(&self, subject_id: SubjectId, locale: &str) -> CatalogResult<String> {
        let subject = self.fetch_subject(&self.conn, subject_id).await?;
        let paired = self.get_values(subject_id).await?;
        let tuples: Vec<(AttributeDefinition, AttributeValue)> = paired
            .into_iter()
            .map(|entry| (entry.definition, entry.value))
            .collect();
        compose_display_name(&subject, locale, &tuples)
    }
}

fn definition_select() -> sea_query::SelectStatement {
    Query::select()
        .from(PartlabDefinitions::Table)
        .columns([
            PartlabDefinitions::DefinitionId,
            PartlabDefinitions::CategoryId,
            PartlabDefinitions::Name,
            PartlabDefinitions::DisplayNameJson,
            PartlabDefinitions::Unit,
            PartlabDefinitions::DataType,
            PartlabDefinitions::Scope,
            PartlabDefinitions::IsFilterable,
            PartlabDefinitions::IsRequired,
            PartlabDefinitions::IsLabel,
            PartlabDefinitions::AllowedPrefixes,
            PartlabDefinitions::AllowedValues,
            PartlabDefinitions::SortOrder,
            PartlabDefinitions::CreatedAt,
            PartlabDefinitions::UpdatedAt,
        ])
        .to_owned()
}

fn value_select() -> sea_query::SelectStatement {
    Query::select()
        .from(PartlabValues::Table)
        .columns([
            PartlabValues::ValueId,
            PartlabValues::DefinitionId,
            PartlabValues::SubjectId,
            PartlabValues::SubjectKind,
            PartlabValues::NormalizedValue,
            PartlabValues::NormalizedMin,
            PartlabValues::NormalizedMax,
            PartlabValues::Prefix,
            PartlabValues::StringValue,
            PartlabValues::CreatedAt,
            PartlabValues::UpdatedAt,
        ])
        .to_owned()
}

fn read_category(row: &QueryResult) -> CatalogResult<Category> {
    Ok(Category {
        category_id: CategoryId(read_id(row, PartlabCategories::CategoryId)?),
        parent_id: read_opt_id(row, PartlabCategories::ParentId)?.map(CategoryId),
        level: row.try_get("", &col_name(PartlabCategories::Level))?,
        name: row.try_get("", &col_name(PartlabCategories::Name))?,
        sort_order: row.try_get("", &col_name(PartlabCategories::SortOrder))?,
        is_active: row.try_get("", &col_name(PartlabCategories::IsActive))?,
        created_at: row.try_get("", &col_name(PartlabCategories::CreatedAt))?,
        updated_at: row.try_get("", &col_name(PartlabCategories::UpdatedAt))?,
    })
}

fn read_definition(row: &QueryResult) -> CatalogResult<AttributeDefinition> {
    let data_type_raw: i16 = row.try_get("", &col_name(PartlabDefinitions::DataType))?;
    let scope_raw: i16 = row.try_get("", &col_name(PartlabDefinitions::Scope))?;
    let data_type = DataType::from_i16(data_type_raw)
        .ok_or_else(|| CatalogError::storage("unknown data type code"))?;
    let scope =
        Scope::from_i16(scope_raw).ok_or_else(|| CatalogError::storage("unknown scope code"))?;
    let display_name: LocalizedText =
        from_json_text(row.try_get("", &col_name(PartlabDefinitions::DisplayNameJson))?)?;
    let allowed_prefixes: Vec<SiPrefix> =
        from_json_text(row.try_get("", &col_name(PartlabDefinitions::AllowedPrefixes))?)?;
    let allowed_values: Vec<String> =
        from_json_text(row.try_get("", &col_name(PartlabDefinitions::AllowedValues))?)?;
    Ok(AttributeDefinition {
        definition_id: DefinitionId(read_id(row, PartlabDefinitions::DefinitionId)?),
        category_id: CategoryId(read_id(row, PartlabDefinitions::CategoryId)?),
        name: row.try_get("", &col_name(PartlabDefinitions::Name))?,
        display_name,
        unit: row.try_get("", &col_name(PartlabDefinitions::Unit))?,
        data_type,
        scope,
        is_filterable: row.try_get("", &col_name(PartlabDefinitions::IsFilterable))?,
        is_required: row.try_get("", &col_name(PartlabDefinitions::IsRequired))?,
        is_label: row.try_get("", &col_name(PartlabDefinitions::IsLabel))?,
        allowed_prefixes,
        allowed_values,
        sort_order: row.try_get("", &col_name(PartlabDefinitions::SortOrder))?,
        created_at: row.try_get("", &col_name(PartlabDefinitions::CreatedAt))?,
        updated_at: row.try_get("", &col_name(PartlabDefinitions::UpdatedAt))?,
    })
}

fn read_subject(row: &QueryResult) -> CatalogResult<Subject> {
    let kind_raw: i16 = row.try_get("", &col_name(PartlabSubjects::SubjectKind))?;
    let kind = SubjectKind::from_i16(kind_raw)
        .ok_or_else(|| CatalogError::storage("unknown subject kind code"))?;
    let name: LocalizedText =
        from_json_text(row.try_get("", &col_name(PartlabSubjects::NameJson))?)?;
    Ok(Subject {
        subject_id: SubjectId(read_id(row, PartlabSubjects::SubjectId)?),
        kind,
        category_id: CategoryId(read_id(row, PartlabSubjects::CategoryId)?),
        name,
        slug: row.try_get("", &col_name(PartlabSubjects::Slug))?,
        package_name: row.try_get("", &col_name(PartlabSubjects::PackageName))?,
        created_at: row.try_get("", &col_name(PartlabSubjects::CreatedAt))?,
        updated_at: row.try_get("", &col_name(PartlabSubjects::UpdatedAt))?,
    })
}

fn read_value(row: &QueryResult) -> CatalogResult<AttributeValue> {
    let kind_raw: i16 = row.try_get("", &col_name(PartlabValues::SubjectKind))?;
    let subject_kind = SubjectKind::from_i16(kind_raw)
        .ok_or_else(|| CatalogError::storage("unknown subject kind code"))?;
    let prefix_raw: String = row.try_get("", &col_name(PartlabValues::Prefix))?;
    Ok(AttributeValue {
        value_id: ValueId(read_id(row, PartlabValues::ValueId)?),
        definition_id: DefinitionId(read_id(row, PartlabValues::DefinitionId)?),
        subject_id: SubjectId(read_id(row, PartlabValues::SubjectId)?),
        subject_kind,
        normalized_value: read_decimal(row, PartlabValues::NormalizedValue)?,
        normalized_min: read_decimal(row, PartlabValues::NormalizedMin)?,
        normalized_max: read_decimal(row, PartlabValues::NormalizedMax)?,
        // Stored symbols survive prefix-whitelist changes; degrade unknown
        // ones to the base factor instead of failing the read.
        prefix: SiPrefix::from_symbol_lossy(&prefix_raw),
        string_value: row.try_get("", &col_name(PartlabValues::StringValue))?,
        created_at: row.try_get("", &col_name(PartlabValues::CreatedAt))?,
        updated_at: row.try_get("", &col_name(PartlabValues::UpdatedAt))?,
    })
}

fn read_decimal(row: &QueryResult, column: impl sea_query::Iden) -> CatalogResult<Option<Decimal>> {
    let raw: Option<String> = row.try_get("", &col_name(column))?;
    raw.map(|value| {
        value
            .parse::<Decimal>()
            .map_err(|err| CatalogError::storage(format!("invalid stored decimal: {err}")))
    })
    .transpose()
}

fn to_json_text<T: Serialize>(value: &T) -> CatalogResult<String> {
    serde_json::to_string(value).map_err(|err| CatalogError::storage(err.to_string()))
}

fn from_json_text<T: serde::de::DeserializeOwned>(raw: String) -> CatalogResult<T> {
    serde_json::from_str(&raw)
        .map_err(|err| CatalogError::storage(format!("invalid stored json: {err}")))
}

fn audit_json<T: Serialize>(value: &T) -> Option<JsonValue> {
    match serde_json::to_value(value) {
        Ok(json) => Some(json),
        Err(err) => {
            log::warn!("audit payload serialization failed: {err}");
            None
        }
    }
}

fn id_value(backend: DatabaseBackend, id: Id) -> SeaValue {
    match backend {
        DatabaseBackend::Postgres => SeaValue::from(Uuid::from_bytes(id.as_bytes())),
        DatabaseBackend::MySql => SeaValue::from(id.as_vec()),
        _ => SeaValue::from(id.to_uuid_string()),
    }
}

fn none_id_value(backend: DatabaseBackend) -> SeaValue {
    match backend {
        DatabaseBackend::Postgres => SeaValue::Uuid(None),
        DatabaseBackend::MySql => SeaValue::Bytes(None),
        _ => SeaValue::String(None),
    }
}

fn opt_id_value(backend: DatabaseBackend, id: Option<Id>) -> SeaValue {
    match id {
        Some(id) => id_value(backend, id),
        None => none_id_value(backend),
    }
}

fn bytes_to_id(bytes: Vec<u8>) -> Option<Id> {
    if bytes.len() == 16 {
        let mut buf = [0u8; 16];
        buf.copy_from_slice(&bytes);
        Some(Id::from_bytes(buf))
    } else {
        None
    }
}

fn read_id(row: &QueryResult, column: impl sea_query::Iden) -> CatalogResult<Id> {
    let name = col_name(column);
    if let Ok(value) = row.try_get::<String>("", &name) {
        return Id::from_uuid_str(&value);
    }
    if let Ok(value) = row.try_get::<Uuid>("", &name) {
        return Ok(Id::from_bytes(*value.as_bytes()));
    }
    if let Ok(value) = row.try_get::<Vec<u8>>("", &name) {
        return bytes_to_id(value).ok_or_else(|| CatalogError::storage("invalid id length"));
    }
    Err(CatalogError::storage("unsupported id format"))
}

fn read_opt_id(row: &QueryResult, column: impl sea_query::Iden) -> CatalogResult<Option<Id>> {
    let name = col_name(column);
    if let Ok(value) = row.try_get::<Option<String>>("", &name) {
        return value.map(|value| Id::from_uuid_str(&value)).transpose();
    }
    if let Ok(value) = row.try_get::<Option<Uuid>>("", &name) {
        return Ok(value.map(|value| Id::from_bytes(*value.as_bytes())));
    }
    if let Ok(value) = row.try_get::<Option<Vec<u8>>>("", &name) {
        return Ok(value.and_then(bytes_to_id));
    }
    Ok(None)
}

fn col_name(column: impl sea_query::Iden) -> String {
    column.to_string()
}

fn build_stmt<S: QueryStatementWriter>(
    backend: DatabaseBackend,
    stmt: &S,
) -> (String, sea_query::Values) {
    match backend {
        DatabaseBackend::Sqlite => stmt.build(SqliteQueryBuilder),
        DatabaseBackend::Postgres => stmt.build(PostgresQueryBuilder),
        DatabaseBackend::MySql => stmt.build(MysqlQueryBuilder),
        _ => stmt.build(SqliteQueryBuilder),
    }
}

async fn exec<C, S>(conn: &C, stmt: &S) -> CatalogResult<()>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    conn.execute(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(())
}

async fn query_all<C, S>(conn: &C, stmt: &S) -> CatalogResult<Vec<QueryResult>>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    let rows = conn
        .query_all(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(rows)
}

async fn query_one<C, S>(conn: &C, stmt: &S) -> CatalogResult<Option<QueryResult>>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    let row = conn
        .query_one(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(row)
}

fn build_connection_url(config: &CatalogConfig, base_dir: &Path) -> CatalogResult<String> {
    match &config.database {
        crate::config::DatabaseConfig::Sqlite { .. } => {
            let path = config.sqlite_path(base_dir)?;
            Ok(format!("sqlite://{}?mode=rwc", path.display()))
        }
        crate::config::DatabaseConfig::Postgres { url }
        | crate::config::DatabaseConfig::Mysql { url } => Ok(url.clone()),
    }
}
