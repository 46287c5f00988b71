use std::time::Duration;

use chrono::Utc;
use common::BlobId;
use store::images::spawn_eviction_task;

use crate::common::{env, sample_test};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

#[tokio::test]
async fn uploaded_image_reads_back() {
    let env = env(Duration::ZERO).await;
    let data = b"\xff\xd8\xff\xe0 jpeg bytes".to_vec();

    let id = env.images.save_image(&data).await.unwrap();
    assert!(id.is_remote());
    assert_eq!(env.bucket.len(), 1);
    assert!(env.images.local().is_empty().await.unwrap());

    assert_eq!(env.images.get_image(Some(&id)).await.unwrap(), Some(data));
}

#[tokio::test]
async fn bucket_outage_falls_back_to_local() {
    let env = env(Duration::ZERO).await;
    let data = vec![7_u8; 4096];

    env.bucket.set_down(true);
    let id = env.images.save_image(&data).await.unwrap();
    assert!(matches!(id, BlobId::Local(_)));
    assert!(id.to_string().starts_with("idb-"));

    env.bucket.set_down(false);
    assert_eq!(env.images.get_image(Some(&id)).await.unwrap(), Some(data));
    assert_eq!(env.bucket.len(), 0);
}

#[tokio::test]
async fn image_ids_survive_a_record_round_trip() {
    let env = env(Duration::ZERO).await;

    let remote_bytes = b"remote".to_vec();
    let remote_id = env.images.save_image(&remote_bytes).await.unwrap();
    env.bucket.set_down(true);
    let local_bytes = b"local".to_vec();
    let local_id = env.images.save_image(&local_bytes).await.unwrap();

    let mut input = sample_test(1, "2024-03-02");
    input.cases[0].case_damage.image_id = Some(local_id);
    input.cases[0].product_failures[0].image_id = Some(remote_id);
    env.records.add_test(input).await.unwrap();

    env.bucket.set_down(false);
    let stored = env.records.get_test_by_id(1).await.unwrap();
    let case = &stored.cases[0];
    assert_eq!(
        env.images
            .get_image(case.case_damage.image_id.as_ref())
            .await
            .unwrap(),
        Some(local_bytes)
    );
    assert_eq!(
        env.images
            .get_image(case.product_failures[0].image_id.as_ref())
            .await
            .unwrap(),
        Some(remote_bytes)
    );
    assert_eq!(
        env.images
            .get_image(case.product_failures[1].image_id.as_ref())
            .await
            .unwrap(),
        None
    );
}

#[tokio::test]
async fn eviction_task_drops_expired_local_images() {
    let env = env(Duration::ZERO).await;
    let local = env.images.local().clone();
    let stale = local
        .insert_at(b"stale", Utc::now().timestamp_millis() - 31 * DAY_MS)
        .await
        .unwrap();

    env.bucket.set_down(true);
    let fresh = env.images.save_image(b"fresh").await.unwrap();

    let handle = spawn_eviction_task(
        local.clone(),
        Duration::from_secs(30 * 24 * 60 * 60),
        Duration::from_secs(3600),
    );
    let mut evicted = false;
    for _ in 0..100 {
        if local.get(stale).await.unwrap().is_none() {
            evicted = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    handle.stop().await;

    assert!(evicted);
    assert_eq!(
        env.images.get_image(Some(&fresh)).await.unwrap(),
        Some(b"fresh".to_vec())
    );
}
