use sea_orm::sea_query;
use sea_orm_migration::prelude::Iden;

#[derive(Iden, Clone, Copy)]
pub enum PartlabCategories {
    Table,
    CategoryId,
    ParentId,
    Level,
    Name,
    SortOrder,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden, Clone, Copy)]
pub enum PartlabDefinitions {
    Table,
    DefinitionId,
    CategoryId,
    Name,
    DisplayNameJson,
    Unit,
    DataType,
    Scope,
    IsFilterable,
    IsRequired,
    IsLabel,
    AllowedPrefixes,
    AllowedValues,
    SortOrder,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden, Clone, Copy)]
pub enum PartlabSubjects {
    Table,
    SubjectId,
    SubjectKind,
    CategoryId,
    NameJson,
    Slug,
    PackageName,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden, Clone, Copy)]
pub enum PartlabValues {
    Table,
    ValueId,
    DefinitionId,
    SubjectId,
    SubjectKind,
    NormalizedValue,
    NormalizedMin,
    NormalizedMax,
    Prefix,
    StringValue,
    CreatedAt,
    UpdatedAt,
}
