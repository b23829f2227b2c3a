//! File-backed store tests: durability across reopen and write contention.

use chrono::{Duration, Utc};
use ipacl_store::actors::ActorId;
use ipacl_store::config::DatabaseConfig;
use ipacl_store::db::{BlockOptions, BlockStatus, Database, ListFilter};
use ipacl_store::error::AclError;

fn file_config(dir: &tempfile::TempDir) -> DatabaseConfig {
    DatabaseConfig {
        path: dir.path().join("blocks.db").display().to_string(),
        ..DatabaseConfig::default()
    }
}

#[tokio::test]
async fn blocks_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = file_config(&dir);

    let created = {
        let db = Database::open(&config).await.unwrap();
        let record = db
            .blocks()
            .block(
                "203.0.113.10",
                BlockOptions::default()
                    .reason("credential stuffing")
                    .created_by(ActorId::new("ops"))
                    .expires_in(Duration::hours(2)),
            )
            .await
            .unwrap();
        db.close().await;
        record
    };

    let db = Database::open(&config).await.unwrap();
    let found = db.blocks().find("203.0.113.10").await.unwrap().unwrap();
    assert_eq!(found, created);
    assert!(db.blocks().is_blocked("203.0.113.10", None).await.unwrap());
    assert_eq!(db.blocks().count(BlockStatus::Active, None).await.unwrap(), 1);
}

#[tokio::test]
async fn concurrent_blocks_on_file_store_yield_one_winner() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(&file_config(&dir)).await.unwrap();

    let mut tasks = Vec::new();
    for _ in 0..12 {
        let db = db.clone();
        tasks.push(tokio::spawn(async move {
            db.blocks()
                .block("2001:db8::42", BlockOptions::default())
                .await
        }));
    }

    let mut created = 0;
    let mut duplicates = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => created += 1,
            Err(AclError::DuplicateBlock(_)) => duplicates += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(duplicates, 11);
    assert_eq!(db.blocks().list(ListFilter::default()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn expired_records_stay_until_swept_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = file_config(&dir);
    let t = Utc::now() - Duration::hours(1);

    {
        let db = Database::open(&config).await.unwrap();
        db.blocks()
            .block_at(
                "192.0.2.200",
                BlockOptions::default().expires_at(t + Duration::minutes(5)),
                t,
            )
            .await
            .unwrap();
        db.close().await;
    }

    let db = Database::open(&config).await.unwrap();
    let repo = db.blocks();
    assert!(!repo.is_blocked("192.0.2.200", None).await.unwrap());
    assert!(repo.find("192.0.2.200").await.unwrap().is_some());
    assert_eq!(repo.sweep_expired(None).await.unwrap(), 1);
    assert!(repo.find("192.0.2.200").await.unwrap().is_none());
}
