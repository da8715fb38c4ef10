mod common;

use std::collections::BTreeSet;

use common::{association_count, draft, setup_test_db};
use mediatag_db::{MediaRepository, MediaStore, TagRepository};

#[tokio::test]
async fn test_create_is_idempotent_by_name() {
    let db = setup_test_db().await;
    let tags = TagRepository::new(db.pool.clone());

    let first = tags.create("football").await.unwrap();
    assert_eq!(first.rows_affected, 1);
    assert!(first.created());

    let second = tags.create("football").await.unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.rows_affected, 0);

    assert_eq!(tags.find_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_find_by_name_substring() {
    let db = setup_test_db().await;
    let tags = TagRepository::new(db.pool.clone());

    for name in ["Football", "basketball", "sport", "100%_real"] {
        tags.create(name).await.unwrap();
    }

    let balls: BTreeSet<String> = tags
        .find_by_name_substring("BALL")
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(
        balls,
        BTreeSet::from(["basketball".to_string(), "Football".to_string()])
    );

    // wildcards are matched literally
    let literal = tags.find_by_name_substring("%_").await.unwrap();
    assert_eq!(literal.len(), 1);
    assert_eq!(literal[0].name, "100%_real");

    let all = tags.find_by_name_substring("   ").await.unwrap();
    assert_eq!(all.len(), 4);
}

#[tokio::test]
async fn test_find_by_id_and_delete() {
    let db = setup_test_db().await;
    let tags = TagRepository::new(db.pool.clone());

    let outcome = tags.create("sport").await.unwrap();
    let tag = tags.find_by_id(outcome.id).await.unwrap().unwrap();
    assert_eq!(tag.name, "sport");

    assert!(tags.delete(outcome.id).await.unwrap());
    assert!(tags.find_by_id(outcome.id).await.unwrap().is_none());
    assert!(!tags.delete(outcome.id).await.unwrap());
}

#[tokio::test]
async fn test_delete_cascades_to_associations() {
    let db = setup_test_db().await;
    let tags = TagRepository::new(db.pool.clone());
    let media = MediaRepository::new(db.pool.clone());

    let football = tags.create("football").await.unwrap().id;
    let sport = tags.create("sport").await.unwrap().id;
    let media_id = media
        .create_with_tags(draft("baseball"), &[football, sport])
        .await
        .unwrap();

    assert!(tags.delete(football).await.unwrap());

    assert_eq!(association_count(&db.pool, media_id).await, 1);
    let projection = media.find_by_id(media_id).await.unwrap().unwrap();
    assert_eq!(projection.tag_names, vec!["sport".to_string()]);
}
