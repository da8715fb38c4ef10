mod common;

use std::collections::BTreeSet;

use common::{association_count, count_rows, draft, setup_test_db};
use mediatag_db::{MediaRepository, MediaStore, MediaStoreError, TagAssociationError, TagRepository};

fn name_set(names: &[String]) -> BTreeSet<&str> {
    names.iter().map(String::as_str).collect()
}

#[tokio::test]
async fn test_baseball_scenario() {
    let db = setup_test_db().await;
    let tags = TagRepository::new(db.pool.clone());
    let media = MediaRepository::new(db.pool.clone());

    assert_eq!(tags.create("football").await.unwrap().id, 1);
    assert_eq!(tags.create("sport").await.unwrap().id, 2);

    let id = media
        .create_with_tags(draft("baseball"), &[1, 2])
        .await
        .unwrap();
    assert_eq!(id, 1);

    let found = media.find_by_tag(1).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "baseball");
    assert_eq!(
        name_set(&found[0].tag_names),
        BTreeSet::from(["football", "sport"])
    );

    // same create again: rejected, nothing new written
    let again = media.create_with_tags(draft("baseball"), &[1, 2]).await;
    assert!(matches!(again, Err(MediaStoreError::AlreadyExists(ref n)) if n == "baseball"));
    assert_eq!(count_rows(&db.pool, "media").await, 1);
    assert_eq!(count_rows(&db.pool, "media_tags").await, 2);

    // unknown tag: media row stays, no associations committed
    let missing = media.create_with_tags(draft("hockey"), &[1, 999]).await;
    let hockey_id = match missing {
        Err(MediaStoreError::DbOperation {
            media_id,
            source: TagAssociationError::MissingTags { requested, found },
        }) => {
            assert_eq!((requested, found), (2, 1));
            media_id
        }
        other => panic!("expected missing tags, got {:?}", other),
    };
    assert_eq!(association_count(&db.pool, hockey_id).await, 0);
    assert_eq!(count_rows(&db.pool, "media").await, 2);
    assert_eq!(media.find_by_tag(1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_find_by_tag_without_associations_is_empty() {
    let db = setup_test_db().await;
    let tags = TagRepository::new(db.pool.clone());
    let media = MediaRepository::new(db.pool.clone());

    let lonely = tags.create("lonely").await.unwrap().id;
    assert!(media.find_by_tag(lonely).await.unwrap().is_empty());
    assert!(media.find_by_tag(12345).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_find_by_tag_returns_each_media_with_full_tag_set() {
    let db = setup_test_db().await;
    let tags = TagRepository::new(db.pool.clone());
    let media = MediaRepository::new(db.pool.clone());

    let sport = tags.create("sport").await.unwrap().id;
    let ball = tags.create("ball").await.unwrap().id;
    let water = tags.create("water").await.unwrap().id;

    media
        .create_with_tags(draft("soccer"), &[sport, ball])
        .await
        .unwrap();
    media
        .create_with_tags(draft("swimming"), &[sport, water])
        .await
        .unwrap();
    media
        .create_with_tags(draft("tennis"), &[sport, ball, ball])
        .await
        .unwrap();
    media
        .create_with_tags(draft("lake"), &[water])
        .await
        .unwrap();

    let by_sport = media.find_by_tag(sport).await.unwrap();
    assert_eq!(by_sport.len(), 3);
    for projection in &by_sport {
        let unique: BTreeSet<_> = projection.tag_names.iter().collect();
        assert_eq!(unique.len(), projection.tag_names.len());
    }

    let tennis = by_sport.iter().find(|m| m.name == "tennis").unwrap();
    assert_eq!(name_set(&tennis.tag_names), BTreeSet::from(["ball", "sport"]));

    let swimming = by_sport.iter().find(|m| m.name == "swimming").unwrap();
    assert_eq!(
        name_set(&swimming.tag_names),
        BTreeSet::from(["sport", "water"])
    );

    let by_water: BTreeSet<String> = media
        .find_by_tag(water)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.name)
        .collect();
    assert_eq!(
        by_water,
        BTreeSet::from(["lake".to_string(), "swimming".to_string()])
    );
}

#[tokio::test]
async fn test_find_by_tag_skips_dangling_association() {
    let db = setup_test_db().await;
    let tags = TagRepository::new(db.pool.clone());
    let media = MediaRepository::new(db.pool.clone());

    let sport = tags.create("sport").await.unwrap().id;
    let real = media
        .create_with_tags(draft("marathon"), &[sport])
        .await
        .unwrap();

    // an association whose media row is gone
    sqlx::query("ALTER TABLE media_tags DROP CONSTRAINT media_tags_media_id_fkey")
        .execute(&db.pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO media_tags (media_id, tag_id) VALUES ($1, $2)")
        .bind(9999_i64)
        .bind(sport)
        .execute(&db.pool)
        .await
        .unwrap();
    assert_eq!(association_count(&db.pool, 9999).await, 1);

    let found = media.find_by_tag(sport).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, real);
    assert_eq!(found[0].name, "marathon");
    assert_eq!(found[0].tag_names, vec!["sport".to_string()]);
}

#[tokio::test]
async fn test_find_all_and_find_by_id_include_untagged_media() {
    let db = setup_test_db().await;
    let tags = TagRepository::new(db.pool.clone());
    let media = MediaRepository::new(db.pool.clone());

    let sport = tags.create("sport").await.unwrap().id;
    let tagged = media
        .create_with_tags(draft("rugby"), &[sport])
        .await
        .unwrap();
    let _ = media.create_with_tags(draft("orphan"), &[sport, 404]).await;

    let all = media.find_all().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, tagged);
    assert_eq!(all[0].tag_names, vec!["sport".to_string()]);
    assert_eq!(all[1].name, "orphan");
    assert!(all[1].tag_names.is_empty());

    let rugby = media.find_by_id(tagged).await.unwrap().unwrap();
    assert_eq!(rugby.file_url, "http://localhost:9000/media/rugby.jpg");
    assert_eq!(rugby.description.as_deref(), Some("test upload"));
    assert!(media.find_by_id(9999).await.unwrap().is_none());
}

#[tokio::test]
async fn test_record_and_associations_round_trip() {
    let db = setup_test_db().await;
    let tags = TagRepository::new(db.pool.clone());
    let media = MediaRepository::new(db.pool.clone());

    let sport = tags.create("sport").await.unwrap().id;
    let ball = tags.create("ball").await.unwrap().id;
    let id = media
        .create_with_tags(draft("cricket"), &[ball, sport, ball])
        .await
        .unwrap();

    let record = media.find_record(id).await.unwrap().unwrap();
    assert_eq!(record.name, "cricket");
    assert_eq!(record.file_size, 1024);
    assert_eq!(record.file_url, "http://localhost:9000/media/cricket.jpg");
    assert!(record.updated_at >= record.created_at);

    let associations = media.associations(id).await.unwrap();
    let tag_ids: Vec<i64> = associations.iter().map(|a| a.tag_id).collect();
    let mut expected = vec![sport, ball];
    expected.sort_unstable();
    assert_eq!(tag_ids, expected);
    assert!(associations.iter().all(|a| a.media_id == id));

    assert!(media.find_record(id + 100).await.unwrap().is_none());
    assert!(media.associations(id + 100).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_name_exists() {
    let db = setup_test_db().await;
    let tags = TagRepository::new(db.pool.clone());
    let media = MediaRepository::new(db.pool.clone());

    let sport = tags.create("sport").await.unwrap().id;
    assert!(!media.name_exists("golf").await.unwrap());
    media
        .create_with_tags(draft("golf"), &[sport])
        .await
        .unwrap();
    assert!(media.name_exists("golf").await.unwrap());
    assert!(!media.name_exists("Golf").await.unwrap());
}

#[tokio::test]
async fn test_concurrent_creates_of_same_name_yield_one_row() {
    let db = setup_test_db().await;
    let tags = TagRepository::new(db.pool.clone());
    let media = MediaRepository::new(db.pool.clone());

    let sport = tags.create("sport").await.unwrap().id;

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let media = media.clone();
            tokio::spawn(async move { media.create_with_tags(draft("relay"), &[sport]).await })
        })
        .collect();

    let mut created = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(MediaStoreError::AlreadyExists(_)) => rejected += 1,
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(rejected, 4);
    assert_eq!(count_rows(&db.pool, "media").await, 1);
    assert_eq!(count_rows(&db.pool, "media_tags").await, 1);
}
