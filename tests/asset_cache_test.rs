use explore_ngin::{
    config::{AssetDescriptor, Category},
    data_structures::scene_graph::SceneAsset,
    error::AssetError,
    resources::{AssetCache, AssetEvent, AssetId, LoadStatus},
};

use crate::common::test_utils::{ManualLoader, Pending, box_model};

mod common;

fn descriptor(id: u32) -> AssetDescriptor {
    AssetDescriptor {
        id: AssetId(id),
        name: format!("asset-{}", id),
        description: String::new(),
        url: format!("models/{}.gltf", id),
        format: Default::default(),
        category: Category::Item,
    }
}

fn cache(ids: &[u32]) -> (AssetCache<AssetDescriptor, SceneAsset>, Pending<SceneAsset>) {
    let (loader, pending) = ManualLoader::new(|asset: &AssetDescriptor| asset.id);
    let mut cache = AssetCache::new("model", loader);
    for id in ids {
        cache.register(AssetId(*id), descriptor(*id)).unwrap();
    }
    (cache, pending)
}

#[test]
fn concurrent_requests_load_once_and_notify_everyone_once() {
    let (mut cache, pending) = cache(&[4]);
    let mut tickets: Vec<_> = (0..3).map(|_| cache.request(AssetId(4)).unwrap()).collect();

    assert_eq!(pending.load_count(4), 1);
    assert_eq!(cache.status(AssetId(4)), Some(LoadStatus::Loading));
    assert!(cache.poll().is_empty());
    assert!(tickets.iter_mut().all(|ticket| ticket.try_resolve().is_none()));

    pending.complete(4, box_model(1.0, &[]));
    assert_eq!(cache.poll(), vec![AssetEvent::Loaded(AssetId(4))]);
    assert_eq!(cache.status(AssetId(4)), Some(LoadStatus::Loaded));
    assert!(cache.get(AssetId(4)).is_some());

    for ticket in tickets.iter_mut() {
        assert_eq!(ticket.try_resolve(), Some(Ok(AssetId(4))));
        assert_eq!(ticket.try_resolve(), None);
        assert!(ticket.is_resolved());
    }
    assert_eq!(pending.load_count(4), 1);
}

#[test]
fn requesting_a_loaded_asset_resolves_without_reloading() {
    let (mut cache, pending) = cache(&[1]);
    let _first = cache.request(AssetId(1)).unwrap();
    pending.complete(1, box_model(1.0, &[]));
    cache.poll();

    let mut late = cache.request(AssetId(1)).unwrap();
    assert_eq!(late.try_resolve(), Some(Ok(AssetId(1))));
    // a late subscriber still gets an event to react to
    assert_eq!(cache.poll(), vec![AssetEvent::Loaded(AssetId(1))]);
    assert!(cache.poll().is_empty());
    assert_eq!(pending.load_count(1), 1);
}

#[test]
fn failed_load_is_reported_and_can_be_retried() {
    let (mut cache, pending) = cache(&[2]);
    let mut ticket = cache.request(AssetId(2)).unwrap();
    pending.fail(2, "404");

    let events = cache.poll();
    assert!(matches!(
        events.as_slice(),
        [AssetEvent::Failed(AssetId(2), AssetError::LoadFailed { .. })]
    ));
    assert!(matches!(ticket.try_resolve(), Some(Err(AssetError::LoadFailed { .. }))));
    assert_eq!(cache.status(AssetId(2)), Some(LoadStatus::Unloaded));
    assert!(cache.get(AssetId(2)).is_none());

    let mut retry = cache.request(AssetId(2)).unwrap();
    assert_eq!(pending.load_count(2), 2);
    pending.complete(2, box_model(1.0, &[]));
    assert_eq!(cache.poll(), vec![AssetEvent::Loaded(AssetId(2))]);
    assert_eq!(retry.try_resolve(), Some(Ok(AssetId(2))));
}

#[test]
fn dropped_tickets_do_not_block_completion() {
    let (mut cache, pending) = cache(&[3]);
    drop(cache.request(AssetId(3)).unwrap());
    let mut kept = cache.request(AssetId(3)).unwrap();
    pending.complete(3, box_model(1.0, &[]));

    assert_eq!(cache.poll(), vec![AssetEvent::Loaded(AssetId(3))]);
    assert_eq!(kept.try_resolve(), Some(Ok(AssetId(3))));
}

#[test]
fn unknown_and_duplicate_ids_are_rejected() {
    let (mut cache, pending) = cache(&[1]);
    assert_eq!(cache.request(AssetId(9)).unwrap_err(), AssetError::Unknown(AssetId(9)));
    assert_eq!(
        cache.register(AssetId(1), descriptor(1)).unwrap_err(),
        AssetError::Duplicate(AssetId(1))
    );
    assert!(pending.calls().is_empty());
    assert_eq!(cache.source(AssetId(1)).map(|asset| asset.url.as_str()), Some("models/1.gltf"));
}

#[test]
fn completions_of_different_assets_are_independent() {
    let (mut cache, pending) = cache(&[1, 2]);
    let mut first = cache.request(AssetId(1)).unwrap();
    let mut second = cache.request(AssetId(2)).unwrap();
    assert_eq!(cache.pending(), 2);

    pending.complete(2, box_model(2.0, &[]));
    assert_eq!(cache.poll(), vec![AssetEvent::Loaded(AssetId(2))]);
    assert_eq!(first.try_resolve(), None);
    assert_eq!(second.try_resolve(), Some(Ok(AssetId(2))));
    assert_eq!(cache.pending(), 1);
}
