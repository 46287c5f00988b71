use std::time::Duration;

use sea_orm::{EntityTrait, PaginatorTrait};
use store::Source;
use store::entity::{product_failure, test, test_case};

use crate::common::{env, sample_test};

#[tokio::test]
async fn added_test_reads_back_identically() {
    let env = env(Duration::ZERO).await;
    let input = sample_test(1_700_000_000_001, "2024-03-02");

    let confirmed = env.records.add_test(input.clone()).await.unwrap();
    assert_eq!(confirmed, input);

    assert_eq!(env.records.get_test_by_id(input.id).await, Some(input.clone()));

    let loaded = env.records.load().await;
    assert_eq!(loaded.source, Source::Remote);
    assert_eq!(loaded.database.tests, vec![input]);
}

#[tokio::test]
async fn rows_are_split_across_three_tables() {
    let env = env(Duration::ZERO).await;
    env.records
        .add_test(sample_test(1, "2024-03-02"))
        .await
        .unwrap();

    assert_eq!(test::Entity::find().count(&env.remote_db).await.unwrap(), 1);
    assert_eq!(test_case::Entity::find().count(&env.remote_db).await.unwrap(), 2);
    assert_eq!(
        product_failure::Entity::find().count(&env.remote_db).await.unwrap(),
        2
    );

    let row = test::Entity::find_by_id(1_i64)
        .one(&env.remote_db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.recommendations.as_deref(), Some(""));
    assert_eq!(row.transport_method.as_deref(), Some("truck"));
}

#[tokio::test]
async fn tests_come_back_newest_first() {
    let env = env(Duration::ZERO).await;
    for (id, date) in [(1, "2024-01-10"), (2, "2024-05-01"), (3, "2023-12-31")] {
        env.records.add_test(sample_test(id, date)).await.unwrap();
    }

    let ids: Vec<i64> = env
        .records
        .get_database()
        .await
        .tests
        .iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(ids, vec![2, 1, 3]);
}

#[tokio::test]
async fn delete_removes_cases_and_failures() {
    let env = env(Duration::ZERO).await;
    env.records.add_test(sample_test(1, "2024-01-10")).await.unwrap();
    env.records.add_test(sample_test(2, "2024-01-11")).await.unwrap();

    env.records.delete_test(1).await.unwrap();

    assert_eq!(env.records.get_test_by_id(1).await, None);
    assert_eq!(test_case::Entity::find().count(&env.remote_db).await.unwrap(), 2);
    assert_eq!(
        product_failure::Entity::find().count(&env.remote_db).await.unwrap(),
        2
    );

    env.records.delete_test(1).await.unwrap();
    assert_eq!(env.records.get_database().await.tests.len(), 1);
}

#[tokio::test]
async fn outage_serves_last_snapshot() {
    let env = env(Duration::ZERO).await;
    env.records.add_test(sample_test(1, "2024-01-10")).await.unwrap();
    env.records.add_test(sample_test(2, "2024-02-10")).await.unwrap();
    let online = env.records.get_database().await;

    env.remote.set_down(true);
    let restarted = env.reopen_records(Duration::from_secs(60));
    let loaded = restarted.load().await;

    assert_eq!(loaded.source, Source::Snapshot);
    assert_eq!(loaded.database, online);
    assert_eq!(restarted.get_test_by_id(2).await, online.find(2).cloned());
}

#[tokio::test]
async fn fresh_cache_skips_the_remote() {
    let env = env(Duration::from_secs(60)).await;
    env.records.add_test(sample_test(1, "2024-01-10")).await.unwrap();
    assert_eq!(env.records.load().await.source, Source::Remote);

    env.remote.set_down(true);
    let loaded = env.records.load().await;
    assert_eq!(loaded.source, Source::Cache);
    assert_eq!(loaded.database.tests.len(), 1);
}

#[tokio::test]
async fn write_invalidates_fresh_cache() {
    let env = env(Duration::from_secs(60)).await;
    assert!(env.records.get_database().await.tests.is_empty());

    env.records.add_test(sample_test(1, "2024-01-10")).await.unwrap();
    let loaded = env.records.load().await;
    assert_eq!(loaded.source, Source::Remote);
    assert_eq!(loaded.database.tests.len(), 1);
}

#[tokio::test]
async fn failed_add_is_kept_locally_and_retried() {
    let env = env(Duration::ZERO).await;
    let input = sample_test(7, "2024-06-01");

    env.remote.set_down(true);
    assert!(env.records.add_test(input.clone()).await.is_err());
    assert!(env.records.add_test(input.clone()).await.is_err());

    let loaded = env.records.load().await;
    assert_eq!(loaded.source, Source::Snapshot);
    assert_eq!(loaded.database.tests, vec![input.clone()]);

    env.remote.set_down(false);
    env.records.add_test(input.clone()).await.unwrap();
    assert_eq!(env.records.get_test_by_id(7).await, Some(input));
}

#[tokio::test]
async fn failed_delete_drops_local_copy() {
    let env = env(Duration::ZERO).await;
    env.records.add_test(sample_test(1, "2024-01-10")).await.unwrap();
    env.records.add_test(sample_test(2, "2024-01-11")).await.unwrap();
    env.records.get_database().await;

    env.remote.set_down(true);
    assert!(env.records.delete_test(1).await.is_err());

    let ids: Vec<i64> = env.records.get_database().await.tests.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![2]);

    env.remote.set_down(false);
    assert!(env.records.get_test_by_id(1).await.is_some());
}
