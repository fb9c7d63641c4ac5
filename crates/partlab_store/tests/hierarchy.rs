use partlab_store::{
    ActorContext, CatalogConfig, CatalogError, CatalogResult, CatalogStore, CategoryId,
    CategoryPatch, CreateCategoryInput, CreateDefinitionInput, CreateSubjectInput, DataType,
    DefinitionApi, HierarchyApi, Id, LocalizedText, Scope, SubjectApi, SubjectKind, UserId,
};
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

fn category(name: &str, parent_id: Option<CategoryId>) -> CreateCategoryInput {
    CreateCategoryInput {
        name: name.to_string(),
        parent_id,
        sort_order: 0,
        is_active: true,
    }
}

#[tokio::test]
async fn ancestor_chain_runs_self_to_root() -> CatalogResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open_store(dir.path()).await?;
    let ctx = actor();
    let root = store.create_category(&ctx, category("Passive", None)).await?;
    let child = store
        .create_category(&ctx, category("Resistors", Some(root)))
        .await?;
    let grandchild = store
        .create_category(&ctx, category("Metal Film", Some(child)))
        .await?;

    let chain = store.ancestor_chain(grandchild).await?;
    assert_eq!(chain, vec![grandchild, child, root]);

    assert_eq!(store.get_category(root).await?.level, 0);
    assert_eq!(store.get_category(child).await?.level, 1);
    assert_eq!(store.get_category(grandchild).await?.level, 2);
    Ok(())
}

#[tokio::test]
async fn ancestor_chain_rejects_unknown_category() -> CatalogResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open_store(dir.path()).await?;
    let err = store
        .ancestor_chain(CategoryId(Id::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { .. }));
    Ok(())
}

#[tokio::test]
async fn category_depth_is_capped_at_five_levels() -> CatalogResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open_store(dir.path()).await?;
    let ctx = actor();
    let mut parent = store.create_category(&ctx, category("level0", None)).await?;
    for name in ["level1", "level2", "level3", "level4"] {
        parent = store.create_category(&ctx, category(name, Some(parent))).await?;
    }
    let err = store
        .create_category(&ctx, category("level5", Some(parent)))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::InvalidInput { .. }));
    Ok(())
}

#[tokio::test]
async fn descendant_ids_skips_inactive_subtrees() -> CatalogResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open_store(dir.path()).await?;
    let ctx = actor();
    let root = store.create_category(&ctx, category("Passive", None)).await?;
    let active = store
        .create_category(&ctx, category("Resistors", Some(root)))
        .await?;
    let inactive = store
        .create_category(
            &ctx,
            CreateCategoryInput {
                name: "Legacy".to_string(),
                parent_id: Some(root),
                sort_order: 0,
                is_active: false,
            },
        )
        .await?;
    let under_inactive = store
        .create_category(&ctx, category("Carbon", Some(inactive)))
        .await?;

    let descendants = store.descendant_ids(root).await?;
    assert!(descendants.contains(&root));
    assert!(descendants.contains(&active));
    assert!(!descendants.contains(&inactive));
    assert!(!descendants.contains(&under_inactive));
    Ok(())
}

#[tokio::test]
async fn cycle_guard_sees_through_inactive_categories() -> CatalogResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open_store(dir.path()).await?;
    let ctx = actor();
    let root = store.create_category(&ctx, category("Passive", None)).await?;
    let inactive = store
        .create_category(
            &ctx,
            CreateCategoryInput {
                name: "Legacy".to_string(),
                parent_id: Some(root),
                sort_order: 0,
                is_active: false,
            },
        )
        .await?;
    assert!(store.would_create_cycle(root, inactive).await?);
    assert!(store.would_create_cycle(root, root).await?);
    Ok(())
}

#[tokio::test]
async fn reparenting_into_own_subtree_is_rejected() -> CatalogResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open_store(dir.path()).await?;
    let ctx = actor();
    let root = store.create_category(&ctx, category("Passive", None)).await?;
    let child = store
        .create_category(&ctx, category("Resistors", Some(root)))
        .await?;
    let grandchild = store
        .create_category(&ctx, category("Metal Film", Some(child)))
        .await?;

    assert!(store.would_create_cycle(root, grandchild).await?);
    assert!(!store.would_create_cycle(grandchild, root).await?);

    let err = store
        .update_category(
            &ctx,
            root,
            CategoryPatch {
                parent_id: Some(Some(grandchild)),
                ..CategoryPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::InvalidInput { .. }));

    // Nothing moved.
    assert_eq!(store.get_category(root).await?.parent_id, None);
    Ok(())
}

#[tokio::test]
async fn reparenting_relevels_the_whole_subtree() -> CatalogResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open_store(dir.path()).await?;
    let ctx = actor();
    let root = store.create_category(&ctx, category("Passive", None)).await?;
    let branch = store
        .create_category(&ctx, category("Resistors", Some(root)))
        .await?;
    let leaf = store
        .create_category(&ctx, category("Metal Film", Some(branch)))
        .await?;

    store
        .update_category(
            &ctx,
            branch,
            CategoryPatch {
                parent_id: Some(None),
                ..CategoryPatch::default()
            },
        )
        .await?;

    assert_eq!(store.get_category(branch).await?.level, 0);
    assert_eq!(store.get_category(branch).await?.parent_id, None);
    assert_eq!(store.get_category(leaf).await?.level, 1);
    Ok(())
}

#[tokio::test]
async fn reparenting_past_the_depth_limit_is_rejected() -> CatalogResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open_store(dir.path()).await?;
    let ctx = actor();
    let mut deep = store.create_category(&ctx, category("level0", None)).await?;
    for name in ["level1", "level2", "level3"] {
        deep = store.create_category(&ctx, category(name, Some(deep))).await?;
    }
    // Two-level subtree that would land on level 4 + 1.
    let movable = store.create_category(&ctx, category("movable", None)).await?;
    store
        .create_category(&ctx, category("movable-child", Some(movable)))
        .await?;

    let err = store
        .update_category(
            &ctx,
            movable,
            CategoryPatch {
                parent_id: Some(Some(deep)),
                ..CategoryPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::InvalidInput { .. }));
    Ok(())
}

#[tokio::test]
async fn delete_category_is_guarded_by_dependents() -> CatalogResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open_store(dir.path()).await?;
    let ctx = actor();
    let root = store.create_category(&ctx, category("Passive", None)).await?;
    let child = store
        .create_category(&ctx, category("Resistors", Some(root)))
        .await?;

    let err = store.delete_category(&ctx, root).await.unwrap_err();
    assert!(matches!(err, CatalogError::Conflict { .. }));

    store
        .create_subject(
            &ctx,
            CreateSubjectInput {
                kind: SubjectKind::Component,
                category_id: child,
                name: LocalizedText::single("en", "Some resistor"),
                slug: "some-resistor".to_string(),
                package_name: None,
            },
            Vec::new(),
        )
        .await?;
    let err = store.delete_category(&ctx, child).await.unwrap_err();
    assert!(matches!(err, CatalogError::Conflict { .. }));
    Ok(())
}

#[tokio::test]
async fn delete_category_drops_value_free_definitions() -> CatalogResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open_store(dir.path()).await?;
    let ctx = actor();
    let lone = store.create_category(&ctx, category("Obsolete", None)).await?;
    let definition_id = store
        .create_definition(
            &ctx,
            CreateDefinitionInput {
                category_id: lone,
                name: "voltage".to_string(),
                display_name: LocalizedText::single("en", "Voltage"),
                unit: Some("V".to_string()),
                data_type: DataType::Decimal,
                scope: Scope::Both,
                is_filterable: true,
                is_required: false,
                is_label: false,
                allowed_prefixes: Vec::new(),
                allowed_values: Vec::new(),
                sort_order: 0,
            },
        )
        .await?;

    store.delete_category(&ctx, lone).await?;
    let err = store.get_definition(definition_id).await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { .. }));
    let err = store.get_category(lone).await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { .. }));
    Ok(())
}
