use partlab_store::{
    ActorContext, AttrValue, CatalogConfig, CatalogError, CatalogResult, CatalogStore, CategoryId,
    CreateCategoryInput, CreateDefinitionInput, CreateSubjectInput, DataType, DefinitionApi,
    DefinitionId, DisplayApi, FilterClause, FilterOperand, FilterOperator, HierarchyApi, Id,
    LocalizedText, Scope, SearchApi, SiPrefix, SubjectApi, SubjectKind, UserId, ValueWrite,
};
use rust_decimal::Decimal;
use tempfile::tempdir;

fn actor() -> ActorContext {
    ActorContext {
        user_id: UserId(Id::new()),
        role: "admin".to_string(),
    }
}

async fn open_store(base: &std::path::Path) -> CatalogResult<CatalogStore> {
    let config = CatalogConfig::default_sqlite(base.join("partlab.sqlite").to_string_lossy());
    CatalogStore::connect(&config, base).await
}

async fn make_category(
    store: &CatalogStore,
    ctx: &ActorContext,
    name: &str,
    parent_id: Option<CategoryId>,
) -> CatalogResult<CategoryId> {
    store
        .create_category(
            ctx,
            CreateCategoryInput {
                name: name.to_string(),
                parent_id,
                sort_order: 0,
                is_active: true,
            },
        )
        .await
}

struct DefinitionSpec<'a> {
    name: &'a str,
    unit: Option<&'a str>,
    data_type: DataType,
    is_label: bool,
    allowed_prefixes: Vec<SiPrefix>,
    sort_order: i32,
}

async fn make_definition(
    store: &CatalogStore,
    ctx: &ActorContext,
    category_id: CategoryId,
    spec: DefinitionSpec<'_>,
) -> CatalogResult<DefinitionId> {
    store
        .create_definition(
            ctx,
            CreateDefinitionInput {
                category_id,
                name: spec.name.to_string(),
                display_name: LocalizedText::single("en", spec.name),
                unit: spec.unit.map(str::to_string),
                data_type: spec.data_type,
                scope: Scope::Both,
                is_filterable: true,
                is_required: spec.is_label,
                is_label: spec.is_label,
                allowed_prefixes: spec.allowed_prefixes,
                allowed_values: Vec::new(),
                sort_order: spec.sort_order,
            },
        )
        .await
}

/// The worked resistor scenario: an inherited non-label boolean, two label
/// decimals, a component entered in kilo-ohms, and the base-unit filter that
/// must find it.
#[tokio::test]
async fn resistor_scenario_composes_and_filters() -> CatalogResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open_store(dir.path()).await?;
    let ctx = actor();
    let passive = make_category(&store, &ctx, "Passive Components", None).await?;
    let resistors = make_category(&store, &ctx, "Resistors", Some(passive)).await?;

    let through_hole = make_definition(
        &store,
        &ctx,
        passive,
        DefinitionSpec {
            name: "throughHole",
            unit: None,
            data_type: DataType::Bool,
            is_label: false,
            allowed_prefixes: Vec::new(),
            sort_order: 10,
        },
    )
    .await?;
    let resistance = make_definition(
        &store,
        &ctx,
        resistors,
        DefinitionSpec {
            name: "resistance",
            unit: Some("Ω"),
            data_type: DataType::Decimal,
            is_label: true,
            allowed_prefixes: vec![SiPrefix::Kilo, SiPrefix::Base],
            sort_order: 0,
        },
    )
    .await?;
    let power = make_definition(
        &store,
        &ctx,
        resistors,
        DefinitionSpec {
            name: "power",
            unit: Some("W"),
            data_type: DataType::Decimal,
            is_label: true,
            allowed_prefixes: Vec::new(),
            sort_order: 1,
        },
    )
    .await?;

    let component = store
        .create_subject(
            &ctx,
            CreateSubjectInput {
                kind: SubjectKind::Component,
                category_id: resistors,
                name: LocalizedText::new(),
                slug: "resistor-4k7-0w25".to_string(),
                package_name: None,
            },
            vec![
                ValueWrite {
                    definition_id: resistance,
                    value: AttrValue::Decimal {
                        value: Decimal::new(47, 1),
                        prefix: SiPrefix::Kilo,
                    },
                },
                ValueWrite {
                    definition_id: power,
                    value: AttrValue::Decimal {
                        value: Decimal::new(25, 2),
                        prefix: SiPrefix::Base,
                    },
                },
                ValueWrite {
                    definition_id: through_hole,
                    value: AttrValue::Bool(true),
                },
            ],
        )
        .await?;

    assert_eq!(
        store.display_name(component, "en").await?,
        "4.70kΩ / 0.25W"
    );

    let hits = store
        .search(
            SubjectKind::Component,
            Some(passive),
            vec![FilterClause {
                definition_id: resistance,
                operator: FilterOperator::Between,
                value: Some(FilterOperand::Number(Decimal::from(1000))),
                value_to: Some(FilterOperand::Number(Decimal::from(10_000))),
            }],
        )
        .await?;
    assert_eq!(hits, vec![component]);
    Ok(())
}

#[tokio::test]
async fn unnamed_subjects_need_a_label_attribute_in_the_tree() -> CatalogResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open_store(dir.path()).await?;
    let ctx = actor();
    let bare = make_category(&store, &ctx, "Bare", None).await?;

    let err = store
        .create_subject(
            &ctx,
            CreateSubjectInput {
                kind: SubjectKind::Component,
                category_id: bare,
                name: LocalizedText::new(),
                slug: "nameless".to_string(),
                package_name: None,
            },
            Vec::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::InvalidInput { .. }));

    // The same call succeeds once an ancestor contributes a label attribute.
    let child = make_category(&store, &ctx, "Child", Some(bare)).await?;
    make_definition(
        &store,
        &ctx,
        bare,
        DefinitionSpec {
            name: "voltage",
            unit: Some("V"),
            data_type: DataType::Decimal,
            is_label: true,
            allowed_prefixes: Vec::new(),
            sort_order: 0,
        },
    )
    .await?;
    store
        .create_subject(
            &ctx,
            CreateSubjectInput {
                kind: SubjectKind::Component,
                category_id: child,
                name: LocalizedText::new(),
                slug: "nameless".to_string(),
                package_name: None,
            },
            Vec::new(),
        )
        .await?;
    Ok(())
}

#[tokio::test]
async fn explicit_name_and_package_frame_the_labels() -> CatalogResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open_store(dir.path()).await?;
    let ctx = actor();
    let resistors = make_category(&store, &ctx, "Resistors", None).await?;
    let resistance = make_definition(
        &store,
        &ctx,
        resistors,
        DefinitionSpec {
            name: "resistance",
            unit: Some("Ω"),
            data_type: DataType::Decimal,
            is_label: true,
            allowed_prefixes: Vec::new(),
            sort_order: 0,
        },
    )
    .await?;

    let component = store
        .create_subject(
            &ctx,
            CreateSubjectInput {
                kind: SubjectKind::Component,
                category_id: resistors,
                name: LocalizedText::single("en", "CF series"),
                slug: "cf-330".to_string(),
                package_name: Some("0805".to_string()),
            },
            vec![ValueWrite {
                definition_id: resistance,
                value: AttrValue::Decimal {
                    value: Decimal::from(330),
                    prefix: SiPrefix::Base,
                },
            }],
        )
        .await?;

    assert_eq!(
        store.display_name(component, "en").await?,
        "CF series / 330.00Ω / 0805"
    );
    Ok(())
}

#[tokio::test]
async fn slug_is_the_last_resort() -> CatalogResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open_store(dir.path()).await?;
    let ctx = actor();
    let resistors = make_category(&store, &ctx, "Resistors", None).await?;
    make_definition(
        &store,
        &ctx,
        resistors,
        DefinitionSpec {
            name: "resistance",
            unit: Some("Ω"),
            data_type: DataType::Decimal,
            is_label: true,
            allowed_prefixes: Vec::new(),
            sort_order: 0,
        },
    )
    .await?;

    // Label definitions exist, but the subject carries no values yet.
    let component = store
        .create_subject(
            &ctx,
            CreateSubjectInput {
                kind: SubjectKind::Component,
                category_id: resistors,
                name: LocalizedText::new(),
                slug: "mystery-part".to_string(),
                package_name: None,
            },
            Vec::new(),
        )
        .await?;
    assert_eq!(store.display_name(component, "en").await?, "mystery-part");
    Ok(())
}

#[tokio::test]
async fn duplicate_slug_is_a_conflict() -> CatalogResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open_store(dir.path()).await?;
    let ctx = actor();
    let resistors = make_category(&store, &ctx, "Resistors", None).await?;

    let subject = CreateSubjectInput {
        kind: SubjectKind::Component,
        category_id: resistors,
        name: LocalizedText::single("en", "Twin"),
        slug: "twin".to_string(),
        package_name: None,
    };
    store.create_subject(&ctx, subject.clone(), Vec::new()).await?;
    let err = store
        .create_subject(&ctx, subject, Vec::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Conflict { .. }));
    Ok(())
}

#[tokio::test]
async fn locale_resolution_prefers_the_requested_locale() -> CatalogResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open_store(dir.path()).await?;
    let ctx = actor();
    let resistors = make_category(&store, &ctx, "Resistors", None).await?;

    let mut name = LocalizedText::single("en", "Resistor");
    name.0.insert("de".to_string(), "Widerstand".to_string());
    let component = store
        .create_subject(
            &ctx,
            CreateSubjectInput {
                kind: SubjectKind::Component,
                category_id: resistors,
                name,
                slug: "bilingual".to_string(),
                package_name: None,
            },
            Vec::new(),
        )
        .await?;

    assert_eq!(store.display_name(component, "de").await?, "Widerstand");
    assert_eq!(store.display_name(component, "en").await?, "Resistor");
    // Unknown locale falls back to English.
    assert_eq!(store.display_name(component, "fr").await?, "Resistor");
    Ok(())
}
