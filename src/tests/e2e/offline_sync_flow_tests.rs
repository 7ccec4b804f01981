use crate::modules::offline_sync::application::errors::SyncError;
use crate::modules::offline_sync::application::sync_coordinator::{SyncCoordinator, SyncSettings};
use crate::modules::offline_sync::core::merge::ConflictPolicy;
use crate::modules::offline_sync::core::outbox_entry::OutboxKind;
use crate::modules::products::core::listing::{ListQuery, SortOrder};
use crate::modules::products::core::product::{Product, ProductPatch};
use crate::shared::infrastructure::key_value_store::in_memory::InMemoryKeyValueStore;
use crate::tests::fixtures::products::ProductInputBuilder;
use crate::tests::fixtures::remote::InProcessProductRemote;
use std::sync::Arc;

fn client(remote: &Arc<InProcessProductRemote>) -> SyncCoordinator<InProcessProductRemote> {
    SyncCoordinator::new(
        remote.clone(),
        Arc::new(InMemoryKeyValueStore::new()),
        SyncSettings::default(),
    )
}

fn without_ids(products: Vec<Product>) -> Vec<(String, i32, Option<String>)> {
    products
        .into_iter()
        .map(|p| (p.name, p.quantity, p.expiry_date.map(|d| d.to_string())))
        .collect()
}

#[tokio::test]
async fn milk_survives_a_disconnect_and_reaches_the_server() {
    let remote = Arc::new(InProcessProductRemote::new());
    let coordinator = client(&remote);

    let milk = coordinator
        .create(ProductInputBuilder::new().build())
        .await
        .unwrap();
    assert!(milk.id > 0);

    remote.go_offline();
    let patch = ProductPatch {
        quantity: Some(5),
        ..ProductPatch::default()
    };
    let local = coordinator.update(milk.id, patch).await.unwrap();
    assert_eq!(local.quantity, 5);
    let pending = coordinator.pending().await;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].kind, OutboxKind::Update);

    remote.go_online();
    coordinator.connectivity_changed(true).await.unwrap();

    assert_eq!(remote.stored().await[0].quantity, 5);
    assert!(coordinator.pending().await.is_empty());
}

#[tokio::test]
async fn an_invalid_expiry_date_is_rejected_before_anything_changes() {
    let remote = Arc::new(InProcessProductRemote::new());
    let coordinator = client(&remote);

    let result = coordinator
        .create(
            ProductInputBuilder::new()
                .expiry_date(Some("invalid-date-format".into()))
                .build(),
        )
        .await;

    assert_eq!(
        result,
        Err(SyncError::Validation(vec![
            "Expiry date must be in the format yyyy-MM-dd (e.g., 2024-12-31)".to_string()
        ]))
    );
    assert!(coordinator.pending().await.is_empty());
    assert!(coordinator.cached().await.is_empty());
    assert!(remote.stored().await.is_empty());
}

#[tokio::test]
async fn the_expiry_date_reads_back_as_the_same_literal() {
    let remote = Arc::new(InProcessProductRemote::new());
    let coordinator = client(&remote);

    let created = coordinator
        .create(ProductInputBuilder::new().build())
        .await
        .unwrap();
    let read = coordinator.get(created.id).await.unwrap();

    let json = serde_json::to_value(&read).unwrap();
    assert_eq!(json["expiry_date"], "2024-12-31");
}

#[tokio::test]
async fn an_offline_session_replays_to_the_same_server_state_as_an_online_one() {
    let online_remote = Arc::new(InProcessProductRemote::new());
    let offline_remote = Arc::new(InProcessProductRemote::new());
    let online = client(&online_remote);
    let offline = client(&offline_remote);

    let seed = ProductInputBuilder::new().name("Rice").unit("kg").build();
    let rice_online = online.create(seed.clone()).await.unwrap();
    let rice_offline = offline.create(seed).await.unwrap();
    offline_remote.go_offline();

    for (coordinator, rice_id) in [(&online, rice_online.id), (&offline, rice_offline.id)] {
        let milk = coordinator
            .create(ProductInputBuilder::new().build())
            .await
            .unwrap();
        let eggs = coordinator
            .create(ProductInputBuilder::new().name("Eggs").unit("szt").expiry_date(None).build())
            .await
            .unwrap();
        coordinator
            .update(
                milk.id,
                ProductPatch {
                    quantity: Some(4),
                    ..ProductPatch::default()
                },
            )
            .await
            .unwrap();
        coordinator
            .update(
                rice_id,
                ProductPatch {
                    name: Some("Brown rice".into()),
                    ..ProductPatch::default()
                },
            )
            .await
            .unwrap();
        coordinator.delete(eggs.id).await;
    }
    // Eggs never left the device, so only Milk and the two edits are queued.
    assert_eq!(offline.pending().await.len(), 3);

    offline_remote.go_online();
    let report = offline.connectivity_changed(true).await.unwrap();

    assert!(report.is_clean());
    assert_eq!(
        without_ids(offline_remote.stored().await),
        without_ids(online_remote.stored().await)
    );
}

#[tokio::test]
async fn two_concurrent_replays_never_duplicate_a_create() {
    let remote = Arc::new(InProcessProductRemote::new());
    let coordinator = client(&remote);
    remote.go_offline();
    for _ in 0..3 {
        coordinator
            .create(ProductInputBuilder::new().build())
            .await
            .unwrap();
    }
    remote.go_online();
    remote.set_delay_ms(20);

    let (first, second) = tokio::join!(coordinator.sync_pending(), coordinator.sync_pending());
    let third = coordinator.sync_pending().await.unwrap();

    assert!(first.is_none() || second.is_none());
    assert_eq!(third.replayed, 0);
    assert_eq!(remote.stored().await.len(), 3);
    assert_eq!(remote.mutation_count(), 3);
}

#[tokio::test]
async fn merging_keeps_offline_records_and_pending_edits_under_either_policy() {
    for policy in [ConflictPolicy::ServerWins, ConflictPolicy::LocalWins] {
        let remote = Arc::new(InProcessProductRemote::new());
        let coordinator = SyncCoordinator::new(
            remote.clone(),
            Arc::new(InMemoryKeyValueStore::new()),
            SyncSettings {
                conflict_policy: policy,
                ..SyncSettings::default()
            },
        );
        let rice = coordinator
            .create(ProductInputBuilder::new().name("Rice").build())
            .await
            .unwrap();
        remote.go_offline();
        coordinator
            .update(
                rice.id,
                ProductPatch {
                    quantity: Some(9),
                    ..ProductPatch::default()
                },
            )
            .await
            .unwrap();
        let placeholder = coordinator
            .create(ProductInputBuilder::new().build())
            .await
            .unwrap();

        // The server comes back but the outbox has not been replayed yet.
        remote.go_online();
        coordinator.list(&ListQuery::default()).await;

        let cached = coordinator.cached().await;
        let rice_local = cached.iter().find(|r| r.id() == rice.id).unwrap();
        assert_eq!(rice_local.product.quantity, 9, "{policy}");
        assert!(cached.iter().any(|r| r.id() == placeholder.id), "{policy}");
    }
}

#[tokio::test]
async fn products_without_a_date_sort_last_ascending_and_first_descending() {
    let remote = Arc::new(InProcessProductRemote::new());
    let coordinator = client(&remote);
    for expiry in [Some("2025-03-01"), None, Some("2024-01-15")] {
        coordinator
            .create(
                ProductInputBuilder::new()
                    .expiry_date(expiry.map(str::to_string))
                    .build(),
            )
            .await
            .unwrap();
    }

    let ascending = coordinator.list(&ListQuery::default()).await;
    let descending = coordinator
        .list(&ListQuery {
            sort_order: SortOrder::Desc,
            ..ListQuery::default()
        })
        .await;

    let ids = |products: &[Product]| products.iter().map(|p| p.id).collect::<Vec<_>>();
    assert_eq!(ids(&ascending), vec![3, 1, 2]);
    assert_eq!(ids(&descending), vec![2, 1, 3]);
}
