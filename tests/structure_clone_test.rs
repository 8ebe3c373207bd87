//! Structure clone tests
//!
//! Cloning between containers: remapped references, ordering, dropped and
//! detached content, and rollback when an integrity violation is found.

use std::collections::HashSet;

use anyhow::Result;
use assessment::cloning::StructureCloner;
use assessment::database::entities::*;
use assessment::database::test_utils::setup_test_db;
use assessment::errors::CloneError;
use assessment::services::*;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

async fn template(db: &DatabaseConnection, name: &str) -> Result<containers::Model> {
    let service = ContainerService::new(db.clone());
    Ok(service
        .create_template(CreateTemplate {
            name: name.to_string(),
            description: None,
        })
        .await?)
}

struct SampleStructure {
    category: categories::Model,
    topic: topics::Model,
    factor: factors::Model,
    content: contents::Model,
}

/// One category with a topic, a factor under that topic and a content
/// item hanging off all three.
async fn sample_structure(db: &DatabaseConnection, container_id: i32) -> Result<SampleStructure> {
    let category = CategoryService::new(db.clone())
        .create(
            container_id,
            CreateCategory {
                name: "Governance".to_string(),
                description: Some("<p>Board <strong>oversight</strong></p>".to_string()),
                display_order: None,
            },
        )
        .await?;
    let topic = TopicService::new(db.clone())
        .create(
            container_id,
            CreateTopic {
                category_id: Some(category.id),
                name: "Policies".to_string(),
                description: None,
                display_order: None,
            },
        )
        .await?;
    let factor = FactorService::new(db.clone())
        .create(
            container_id,
            CreateFactor {
                category_id: None,
                topic_id: Some(topic.id),
                name: "Policy review".to_string(),
                description: None,
                display_order: None,
            },
        )
        .await?;
    let content = ContentService::new(db.clone())
        .create(
            container_id,
            CreateContent {
                category_id: category.id,
                topic_id: Some(topic.id),
                factor_id: Some(factor.id),
                name: "Review cadence".to_string(),
                question: Some("How often are policies reviewed?".to_string()),
                answer_type: Some("select".to_string()),
                answer_options: Some(serde_json::json!(["Yearly", "Quarterly"])),
                is_required: Some(true),
                weight: Some(3),
                reference_code: Some("GOV-01".to_string()),
                ..Default::default()
            },
        )
        .await?;

    Ok(SampleStructure {
        category,
        topic,
        factor,
        content,
    })
}

async fn category_count(db: &DatabaseConnection, container_id: i32) -> Result<u64> {
    Ok(categories::Entity::find()
        .filter(categories::Column::ContainerId.eq(container_id))
        .count(db)
        .await?)
}

#[tokio::test]
async fn test_clone_remaps_every_level() -> Result<()> {
    let db = setup_test_db().await?;
    let source = template(&db, "Source").await?;
    let destination = template(&db, "Destination").await?;
    let sample = sample_structure(&db, source.id).await?;

    let summary = StructureCloner::new(db.clone())
        .clone_structure(source.id, destination.id)
        .await?;

    assert_eq!(summary.source_container_id, source.id);
    assert_eq!(summary.destination_container_id, destination.id);
    assert_eq!(summary.categories_cloned, 1);
    assert_eq!(summary.topics_cloned, 1);
    assert_eq!(summary.factors_cloned, 1);
    assert_eq!(summary.contents_cloned, 1);
    assert!(summary.dropped_contents.is_empty());
    assert!(summary.detached_references.is_empty());

    let new_category = summary.mappings.categories[&sample.category.id];
    let new_topic = summary.mappings.topics[&sample.topic.id];
    let new_factor = summary.mappings.factors[&sample.factor.id];
    assert_ne!(new_category, sample.category.id);

    let topic = topics::Entity::find_by_id(new_topic).one(&db).await?.unwrap();
    assert_eq!(topic.container_id, destination.id);
    assert_eq!(topic.category_id, Some(new_category));

    let factor = factors::Entity::find_by_id(new_factor).one(&db).await?.unwrap();
    assert_eq!(factor.container_id, destination.id);
    assert_eq!(factor.category_id, Some(new_category));
    assert_eq!(factor.topic_id, Some(new_topic));

    let content = contents::Entity::find()
        .filter(contents::Column::ContainerId.eq(destination.id))
        .one(&db)
        .await?
        .unwrap();
    assert_eq!(content.category_id, new_category);
    assert_eq!(content.topic_id, Some(new_topic));
    assert_eq!(content.factor_id, Some(new_factor));
    assert_eq!(content.question, sample.content.question);
    assert_eq!(content.answer_type, "select");
    assert_eq!(content.answer_options, sample.content.answer_options);
    assert!(content.is_required);
    assert_eq!(content.weight, Some(3));
    assert_eq!(content.reference_code.as_deref(), Some("GOV-01"));

    let category = categories::Entity::find_by_id(new_category).one(&db).await?.unwrap();
    assert_eq!(category.description, sample.category.description);

    Ok(())
}

#[tokio::test]
async fn test_clone_two_categories_with_one_branch() -> Result<()> {
    let db = setup_test_db().await?;
    let source = template(&db, "T").await?;
    let destination = template(&db, "T2").await?;

    let categories = CategoryService::new(db.clone());
    let a = categories
        .create(
            source.id,
            CreateCategory {
                name: "A".to_string(),
                description: None,
                display_order: None,
            },
        )
        .await?;
    let b = categories
        .create(
            source.id,
            CreateCategory {
                name: "B".to_string(),
                description: None,
                display_order: None,
            },
        )
        .await?;
    let t1 = TopicService::new(db.clone())
        .create(
            source.id,
            CreateTopic {
                category_id: Some(a.id),
                name: "T1".to_string(),
                description: None,
                display_order: None,
            },
        )
        .await?;
    let f1 = FactorService::new(db.clone())
        .create(
            source.id,
            CreateFactor {
                category_id: None,
                topic_id: Some(t1.id),
                name: "F1".to_string(),
                description: None,
                display_order: None,
            },
        )
        .await?;
    ContentService::new(db.clone())
        .create(
            source.id,
            CreateContent {
                category_id: a.id,
                topic_id: Some(t1.id),
                factor_id: Some(f1.id),
                name: "C1".to_string(),
                ..Default::default()
            },
        )
        .await?;

    let summary = StructureCloner::new(db.clone())
        .clone_structure(source.id, destination.id)
        .await?;

    assert_eq!(summary.categories_cloned, 2);
    assert_eq!(summary.topics_cloned, 1);
    assert_eq!(summary.factors_cloned, 1);
    assert_eq!(summary.contents_cloned, 1);

    let a2 = summary.mappings.categories[&a.id];
    let b2 = summary.mappings.categories[&b.id];
    let t1_2 = summary.mappings.topics[&t1.id];
    let f1_2 = summary.mappings.factors[&f1.id];

    let topic = topics::Entity::find_by_id(t1_2).one(&db).await?.unwrap();
    assert_eq!(topic.category_id, Some(a2));
    let factor = factors::Entity::find_by_id(f1_2).one(&db).await?.unwrap();
    assert_eq!(factor.topic_id, Some(t1_2));
    assert_eq!(factor.category_id, Some(a2));

    let c1 = contents::Entity::find()
        .filter(contents::Column::ContainerId.eq(destination.id))
        .one(&db)
        .await?
        .unwrap();
    assert_eq!(c1.name, "C1");
    assert_eq!(c1.category_id, a2);
    assert_eq!(c1.topic_id, Some(t1_2));
    assert_eq!(c1.factor_id, Some(f1_2));
    assert_ne!(c1.category_id, a.id);
    assert_ne!(c1.topic_id, Some(t1.id));
    assert_ne!(c1.factor_id, Some(f1.id));

    // B' is copied without children.
    let under_b2 = topics::Entity::find()
        .filter(topics::Column::CategoryId.eq(b2))
        .count(&db)
        .await?
        + factors::Entity::find()
            .filter(factors::Column::CategoryId.eq(b2))
            .count(&db)
            .await?
        + contents::Entity::find()
            .filter(contents::Column::CategoryId.eq(b2))
            .count(&db)
            .await?;
    assert_eq!(under_b2, 0);
    assert_eq!(category_count(&db, destination.id).await?, 2);

    Ok(())
}

#[tokio::test]
async fn test_clone_factor_directly_under_category() -> Result<()> {
    let db = setup_test_db().await?;
    let source = template(&db, "Source").await?;
    let destination = template(&db, "Destination").await?;

    let category = CategoryService::new(db.clone())
        .create(
            source.id,
            CreateCategory {
                name: "Operations".to_string(),
                description: None,
                display_order: None,
            },
        )
        .await?;
    let factor = FactorService::new(db.clone())
        .create(
            source.id,
            CreateFactor {
                category_id: Some(category.id),
                topic_id: None,
                name: "Staffing".to_string(),
                description: None,
                display_order: None,
            },
        )
        .await?;
    ContentService::new(db.clone())
        .create(
            source.id,
            CreateContent {
                category_id: category.id,
                factor_id: Some(factor.id),
                name: "Headcount".to_string(),
                ..Default::default()
            },
        )
        .await?;

    let summary = StructureCloner::new(db.clone())
        .clone_structure(source.id, destination.id)
        .await?;

    assert_eq!(summary.topics_cloned, 0);
    assert_eq!(summary.factors_cloned, 1);
    assert!(summary.detached_references.is_empty());

    let new_category = summary.mappings.categories[&category.id];
    let new_factor = summary.mappings.factors[&factor.id];

    let copy = factors::Entity::find_by_id(new_factor).one(&db).await?.unwrap();
    assert_eq!(copy.container_id, destination.id);
    assert_eq!(copy.category_id, Some(new_category));
    assert_eq!(copy.topic_id, None);

    let content = contents::Entity::find()
        .filter(contents::Column::ContainerId.eq(destination.id))
        .one(&db)
        .await?
        .unwrap();
    assert_eq!(content.category_id, new_category);
    assert_eq!(content.topic_id, None);
    assert_eq!(content.factor_id, Some(new_factor));

    Ok(())
}

/// Every row id in the container, tagged by level.
async fn row_ids(db: &DatabaseConnection, container_id: i32) -> Result<HashSet<(Level, i32)>> {
    let mut ids = HashSet::new();
    for row in categories::Entity::find()
        .filter(categories::Column::ContainerId.eq(container_id))
        .all(db)
        .await?
    {
        ids.insert((Level::Category, row.id));
    }
    for row in topics::Entity::find()
        .filter(topics::Column::ContainerId.eq(container_id))
        .all(db)
        .await?
    {
        ids.insert((Level::Topic, row.id));
    }
    for row in factors::Entity::find()
        .filter(factors::Column::ContainerId.eq(container_id))
        .all(db)
        .await?
    {
        ids.insert((Level::Factor, row.id));
    }
    for row in contents::Entity::find()
        .filter(contents::Column::ContainerId.eq(container_id))
        .all(db)
        .await?
    {
        ids.insert((Level::Content, row.id));
    }
    Ok(ids)
}

#[tokio::test]
async fn test_clones_into_two_destinations_share_no_ids() -> Result<()> {
    let db = setup_test_db().await?;
    let source = template(&db, "Source").await?;
    let first = template(&db, "First").await?;
    let second = template(&db, "Second").await?;
    sample_structure(&db, source.id).await?;

    let cloner = StructureCloner::new(db.clone());
    cloner.clone_structure(source.id, first.id).await?;
    cloner.clone_structure(source.id, second.id).await?;

    let first_ids = row_ids(&db, first.id).await?;
    let second_ids = row_ids(&db, second.id).await?;
    let source_ids = row_ids(&db, source.id).await?;

    assert_eq!(first_ids.len(), 4);
    assert_eq!(second_ids.len(), 4);
    assert!(first_ids.is_disjoint(&second_ids));
    assert!(first_ids.is_disjoint(&source_ids));
    assert!(second_ids.is_disjoint(&source_ids));

    Ok(())
}

#[tokio::test]
async fn test_clone_leaves_source_untouched() -> Result<()> {
    let db = setup_test_db().await?;
    let source = template(&db, "Source").await?;
    let destination = template(&db, "Destination").await?;
    let sample = sample_structure(&db, source.id).await?;

    StructureCloner::new(db.clone())
        .clone_structure(source.id, destination.id)
        .await?;

    let content = contents::Entity::find_by_id(sample.content.id).one(&db).await?.unwrap();
    assert_eq!(content.container_id, source.id);
    assert_eq!(content.category_id, sample.category.id);
    assert_eq!(content.topic_id, Some(sample.topic.id));
    assert_eq!(content.factor_id, Some(sample.factor.id));
    assert_eq!(category_count(&db, source.id).await?, 1);

    Ok(())
}

#[tokio::test]
async fn test_clone_preserves_display_order() -> Result<()> {
    let db = setup_test_db().await?;
    let source = template(&db, "Source").await?;
    let destination = template(&db, "Destination").await?;

    let service = CategoryService::new(db.clone());
    for (name, order) in [("Third", 30), ("First", 10), ("Second", 20)] {
        service
            .create(
                source.id,
                CreateCategory {
                    name: name.to_string(),
                    description: None,
                    display_order: Some(order),
                },
            )
            .await?;
    }

    StructureCloner::new(db.clone())
        .clone_structure(source.id, destination.id)
        .await?;

    let cloned = categories::Entity::find()
        .filter(categories::Column::ContainerId.eq(destination.id))
        .order_by_asc(categories::Column::DisplayOrder)
        .all(&db)
        .await?;
    let names: Vec<_> = cloned.iter().map(|c| c.name.as_str()).collect();
    let orders: Vec<_> = cloned.iter().map(|c| c.display_order).collect();
    assert_eq!(names, vec!["First", "Second", "Third"]);
    assert_eq!(orders, vec![10, 20, 30]);

    Ok(())
}

#[tokio::test]
async fn test_clone_of_empty_container() -> Result<()> {
    let db = setup_test_db().await?;
    let source = template(&db, "Empty").await?;
    let destination = template(&db, "Destination").await?;

    let summary = StructureCloner::new(db.clone())
        .clone_structure(source.id, destination.id)
        .await?;

    assert_eq!(summary.categories_cloned, 0);
    assert_eq!(summary.contents_cloned, 0);
    assert!(summary.mappings.categories.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_clone_twice_appends_a_second_copy() -> Result<()> {
    let db = setup_test_db().await?;
    let source = template(&db, "Source").await?;
    let destination = template(&db, "Destination").await?;
    sample_structure(&db, source.id).await?;

    let cloner = StructureCloner::new(db.clone());
    let first = cloner.clone_structure(source.id, destination.id).await?;
    let second = cloner.clone_structure(source.id, destination.id).await?;

    assert_ne!(first.mappings.categories, second.mappings.categories);
    assert_eq!(category_count(&db, destination.id).await?, 2);

    Ok(())
}

#[tokio::test]
async fn test_factor_with_foreign_topic_rolls_back() -> Result<()> {
    let db = setup_test_db().await?;
    let source = template(&db, "Source").await?;
    let other = template(&db, "Other").await?;
    let destination = template(&db, "Destination").await?;
    sample_structure(&db, source.id).await?;
    let foreign = sample_structure(&db, other.id).await?;

    // Written directly: the services refuse cross-container parents.
    let now = Utc::now();
    let broken = factors::ActiveModel {
        container_id: Set(source.id),
        category_id: Set(None),
        topic_id: Set(Some(foreign.topic.id)),
        name: Set("Stray factor".to_string()),
        description: Set(None),
        display_order: Set(99),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&db)
    .await?;

    let err = StructureCloner::new(db.clone())
        .clone_structure(source.id, destination.id)
        .await
        .unwrap_err();

    match &err {
        CloneError::Integrity {
            level, source_id, ..
        } => {
            assert_eq!(*level, Level::Factor);
            assert_eq!(*source_id, broken.id);
        }
        other => panic!("expected integrity error, got {:?}", other),
    }
    assert_eq!(err.location(), Some((Level::Factor, broken.id)));
    assert!(err.to_string().contains(&format!("topic {}", foreign.topic.id)));

    // Categories and topics were inserted before the failure and must be gone.
    assert_eq!(category_count(&db, destination.id).await?, 0);
    let topics = topics::Entity::find()
        .filter(topics::Column::ContainerId.eq(destination.id))
        .count(&db)
        .await?;
    assert_eq!(topics, 0);
    let factors = factors::Entity::find()
        .filter(factors::Column::ContainerId.eq(destination.id))
        .count(&db)
        .await?;
    assert_eq!(factors, 0);
    let contents = contents::Entity::find()
        .filter(contents::Column::ContainerId.eq(destination.id))
        .count(&db)
        .await?;
    assert_eq!(contents, 0);

    Ok(())
}

#[tokio::test]
async fn test_content_with_foreign_category_is_dropped() -> Result<()> {
    let db = setup_test_db().await?;
    let source = template(&db, "Source").await?;
    let other = template(&db, "Other").await?;
    let destination = template(&db, "Destination").await?;
    sample_structure(&db, source.id).await?;
    let foreign = sample_structure(&db, other.id).await?;

    let now = Utc::now();
    let stray = contents::ActiveModel {
        container_id: Set(source.id),
        category_id: Set(foreign.category.id),
        topic_id: Set(None),
        factor_id: Set(None),
        name: Set("Stray content".to_string()),
        answer_type: Set("text".to_string()),
        is_required: Set(false),
        display_order: Set(50),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&db)
    .await?;

    let summary = StructureCloner::new(db.clone())
        .clone_structure(source.id, destination.id)
        .await?;

    assert_eq!(summary.contents_cloned, 1);
    assert_eq!(summary.dropped_contents.len(), 1);
    assert_eq!(summary.dropped_contents[0].source_id, stray.id);
    assert_eq!(
        summary.dropped_contents[0].reason,
        format!("category {} was not cloned", foreign.category.id)
    );

    Ok(())
}

#[tokio::test]
async fn test_content_with_foreign_topic_is_detached() -> Result<()> {
    let db = setup_test_db().await?;
    let source = template(&db, "Source").await?;
    let other = template(&db, "Other").await?;
    let destination = template(&db, "Destination").await?;
    let sample = sample_structure(&db, source.id).await?;
    let foreign = sample_structure(&db, other.id).await?;

    let now = Utc::now();
    let loose = contents::ActiveModel {
        container_id: Set(source.id),
        category_id: Set(sample.category.id),
        topic_id: Set(Some(foreign.topic.id)),
        factor_id: Set(None),
        name: Set("Loose content".to_string()),
        answer_type: Set("text".to_string()),
        is_required: Set(false),
        display_order: Set(60),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&db)
    .await?;

    let summary = StructureCloner::new(db.clone())
        .clone_structure(source.id, destination.id)
        .await?;

    assert_eq!(summary.contents_cloned, 2);
    assert!(summary.dropped_contents.is_empty());
    assert_eq!(summary.detached_references.len(), 1);
    let detached = &summary.detached_references[0];
    assert_eq!(detached.source_id, loose.id);
    assert_eq!(detached.field, "topic_id");
    assert_eq!(detached.missing_id, foreign.topic.id);

    let copy = contents::Entity::find()
        .filter(contents::Column::ContainerId.eq(destination.id))
        .filter(contents::Column::Name.eq("Loose content"))
        .one(&db)
        .await?
        .unwrap();
    assert_eq!(copy.topic_id, None);
    assert_eq!(copy.category_id, summary.mappings.categories[&sample.category.id]);

    Ok(())
}

#[tokio::test]
async fn test_clone_precondition_errors() -> Result<()> {
    let db = setup_test_db().await?;
    let source = template(&db, "Source").await?;
    let cloner = StructureCloner::new(db.clone());

    let err = cloner.clone_structure(source.id, source.id).await.unwrap_err();
    assert!(matches!(err, CloneError::SameContainer(id) if id == source.id));
    assert!(err.is_client_error());

    let err = cloner.clone_structure(source.id, 9999).await.unwrap_err();
    assert!(matches!(err, CloneError::DestinationNotFound(9999)));
    assert!(err.is_not_found());

    let err = cloner.clone_structure(9999, source.id).await.unwrap_err();
    assert!(matches!(err, CloneError::SourceNotFound(9999)));

    Ok(())
}

#[tokio::test]
async fn test_summary_serializes_camel_case() -> Result<()> {
    let db = setup_test_db().await?;
    let source = template(&db, "Source").await?;
    let destination = template(&db, "Destination").await?;
    let sample = sample_structure(&db, source.id).await?;

    let summary = StructureCloner::new(db.clone())
        .clone_structure(source.id, destination.id)
        .await?;
    let json = serde_json::to_value(&summary)?;

    assert_eq!(json["categoriesCloned"], 1);
    assert_eq!(json["destinationContainerId"], destination.id);
    assert!(json["mappings"]["categories"][sample.category.id.to_string()].is_number());

    Ok(())
}
