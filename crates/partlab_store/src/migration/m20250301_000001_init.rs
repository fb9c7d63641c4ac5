use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

use crate::db::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();

        manager
            .create_table(
                Table::create()
                    .table(PartlabCategories::Table)
                    .if_not_exists()
                    .col(id_col(backend, PartlabCategories::CategoryId, false))
                    .col(id_col(backend, PartlabCategories::ParentId, true))
                    .col(
                        ColumnDef::new(PartlabCategories::Level)
                            .small_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PartlabCategories::Name).string().not_null())
                    .col(
                        ColumnDef::new(PartlabCategories::SortOrder)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PartlabCategories::IsActive)
                            .boolean()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PartlabCategories::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PartlabCategories::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk_partlab_categories")
                            .col(PartlabCategories::CategoryId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_partlab_categories_parent")
                    .table(PartlabCategories::Table)
                    .col(PartlabCategories::ParentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PartlabDefinitions::Table)
                    .if_not_exists()
                    .col(id_col(backend, PartlabDefinitions::DefinitionId, false))
                    .col(id_col(backend, PartlabDefinitions::CategoryId, false))
                    .col(ColumnDef::new(PartlabDefinitions::Name).string().not_null())
                    .col(
                        ColumnDef::new(PartlabDefinitions::DisplayNameJson)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PartlabDefinitions::Unit).string())
                    .col(
                        ColumnDef::new(PartlabDefinitions::DataType)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PartlabDefinitions::Scope)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PartlabDefinitions::IsFilterable)
                            .boolean()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PartlabDefinitions::IsRequired)
                            .boolean()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PartlabDefinitions::IsLabel)
                            .boolean()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PartlabDefinitions::AllowedPrefixes)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PartlabDefinitions::AllowedValues)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PartlabDefinitions::SortOrder)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PartlabDefinitions::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PartlabDefinitions::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk_partlab_definitions")
                            .col(PartlabDefinitions::DefinitionId),
                    )
                    .to_owned(),
            )
            .await?;

        // The registry never pre-checks (category, name); this index is what
        // turns a duplicate insert into a Conflict.
        manager
            .create_index(
                Index::create()
                    .name("ux_partlab_definitions_category_name")
                    .table(PartlabDefinitions::Table)
                    .col(PartlabDefinitions::CategoryId)
                    .col(PartlabDefinitions::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PartlabSubjects::Table)
                    .if_not_exists()
                    .col(id_col(backend, PartlabSubjects::SubjectId, false))
                    .col(
                        ColumnDef::new(PartlabSubjects::SubjectKind)
                            .small_integer()
                            .not_null(),
                    )
                    .col(id_col(backend, PartlabSubjects::CategoryId, false))
                    .col(
                        ColumnDef::new(PartlabSubjects::NameJson)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PartlabSubjects::Slug).string().not_null())
                    .col(ColumnDef::new(PartlabSubjects::PackageName).string())
                    .col(
                        ColumnDef::new(PartlabSubjects::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PartlabSubjects::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk_partlab_subjects")
                            .col(PartlabSubjects::SubjectId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_partlab_subjects_slug")
                    .table(PartlabSubjects::Table)
                    .col(PartlabSubjects::Slug)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_partlab_subjects_category_kind")
                    .table(PartlabSubjects::Table)
                    .col(PartlabSubjects::CategoryId)
                    .col(PartlabSubjects::SubjectKind)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PartlabValues::Table)
                    .if_not_exists()
                    .col(id_col(backend, PartlabValues::ValueId, false))
                    .col(id_col(backend, PartlabValues::DefinitionId, false))
                    .col(id_col(backend, PartlabValues::SubjectId, false))
                    .col(
                        ColumnDef::new(PartlabValues::SubjectKind)
                            .small_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PartlabValues::NormalizedValue).string())
                    .col(ColumnDef::new(PartlabValues::NormalizedMin).string())
                    .col(ColumnDef::new(PartlabValues::NormalizedMax).string())
                    .col(ColumnDef::new(PartlabValues::Prefix).string().not_null())
                    .col(ColumnDef::new(PartlabValues::StringValue).text())
                    .col(
                        ColumnDef::new(PartlabValues::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PartlabValues::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk_partlab_values")
                            .col(PartlabValues::ValueId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_partlab_values_definition_subject")
                    .table(PartlabValues::Table)
                    .col(PartlabValues::DefinitionId)
                    .col(PartlabValues::SubjectId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_partlab_values_subject")
                    .table(PartlabValues::Table)
                    .col(PartlabValues::SubjectId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_partlab_values_definition_kind")
                    .table(PartlabValues::Table)
                    .col(PartlabValues::DefinitionId)
                    .col(PartlabValues::SubjectKind)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PartlabValues::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PartlabSubjects::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PartlabDefinitions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PartlabCategories::Table).to_owned())
            .await?;
        Ok(())
    }
}

fn id_col(backend: DatabaseBackend, col: impl Iden + 'static, nullable: bool) -> ColumnDef {
    let mut col_def = ColumnDef::new(col);
    match backend {
        DatabaseBackend::Postgres => {
            col_def.uuid();
        }
        DatabaseBackend::MySql => {
            col_def.binary_len(16);
        }
        DatabaseBackend::Sqlite => {
            col_def.string_len(36);
        }
        _ => {
            col_def.string_len(36);
        }
    }
    if nullable {
        col_def.null();
    } else {
        col_def.not_null();
    }
    col_def.to_owned()
}
