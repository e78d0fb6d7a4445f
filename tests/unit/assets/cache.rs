use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::*;

const TRIANGLE: &str = r#"{ "primitives": [ { "positions": [[0,0,0],[1,0,0],[0,1,0]] } ] }"#;

fn temp_dir(tag: &str) -> PathBuf {
    let d = std::env::temp_dir().join(format!(
        "dressing_room_cache_{tag}_{}",
        std::process::id()
    ));
    std::fs::create_dir_all(&d).unwrap();
    d
}

/// Resolves every id to `<root>/<category>_<key>.json`, slowly.
struct SlowResolver {
    root: PathBuf,
    delay: Duration,
    calls: AtomicUsize,
}

impl SlowResolver {
    fn path(root: &Path, id: &AssetId) -> PathBuf {
        root.join(format!("{}_{}.json", id.category(), id.key()))
    }
}

impl AssetResolver for SlowResolver {
    fn resolve_asset_path(&self, id: &AssetId) -> RoomResult<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        Ok(Self::path(&self.root, id))
    }
}

#[test]
fn concurrent_loads_collapse_to_one() {
    let root = temp_dir("collapse");
    let id = AssetId::body("日常").unwrap();
    std::fs::write(SlowResolver::path(&root, &id), TRIANGLE).unwrap();

    let resolver = Arc::new(SlowResolver {
        root: root.clone(),
        delay: Duration::from_millis(50),
        calls: AtomicUsize::new(0),
    });
    let cache = Arc::new(AssetCache::new(resolver.clone()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let id = id.clone();
            std::thread::spawn(move || cache.load(&id).unwrap())
        })
        .collect();
    let assets: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(cache.load_count(&id), 1);
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    assert!(assets.iter().all(|a| Arc::ptr_eq(a, &assets[0])));
    assert_eq!(cache.len(), 1);

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn failures_are_not_cached() {
    let root = temp_dir("retry");
    let id = AssetId::garment("古装", "A").unwrap();
    let cache = AssetCache::new(Arc::new(SlowResolver {
        root: root.clone(),
        delay: Duration::ZERO,
        calls: AtomicUsize::new(0),
    }));

    let err = cache.load(&id).unwrap_err();
    assert!(matches!(err, RoomError::AssetLoad(_)));
    assert!(err.is_retryable());
    assert!(cache.get(&id).is_none());
    assert!(cache.is_empty());

    std::fs::write(SlowResolver::path(&root, &id), TRIANGLE).unwrap();
    let asset = cache.load(&id).unwrap();
    assert_eq!(asset.id, id);
    assert_eq!(cache.load_count(&id), 2);

    cache.load(&id).unwrap();
    assert_eq!(cache.load_count(&id), 2);

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn load_pair_loads_both() {
    let root = temp_dir("pair");
    let body = AssetId::body("晚宴").unwrap();
    let garment = AssetId::garment("晚宴", "D").unwrap();
    std::fs::write(SlowResolver::path(&root, &body), TRIANGLE).unwrap();

    let cache = AssetCache::new(Arc::new(SlowResolver {
        root: root.clone(),
        delay: Duration::ZERO,
        calls: AtomicUsize::new(0),
    }));
    let (b, g) = cache.load_pair(&body, &garment);
    assert!(b.is_ok());
    assert!(g.is_err());

    let _ = std::fs::remove_dir_all(&root);
}
