use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::engine::{Engine, EngineError};

/// Background task that rewrites the WAL once enough commits pile up.
pub async fn run_compactor(engine: Arc<Engine>, threshold: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(30));
    loop {
        interval.tick().await;
        if let Err(e) = compact_if_needed(&engine, threshold).await {
            warn!("WAL compaction failed: {e}");
        }
    }
}

/// Compact when at least `threshold` appends landed since the last
/// compaction. Returns whether a compaction ran.
pub async fn compact_if_needed(engine: &Engine, threshold: u64) -> Result<bool, EngineError> {
    let appends = engine.wal_appends_since_compact().await;
    if threshold == 0 || appends < threshold {
        debug!("compactor skip: {appends} appends since last compaction");
        return Ok(false);
    }
    engine.compact_wal().await?;
    metrics::counter!(crate::observability::WAL_COMPACTIONS_TOTAL).increment(1);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{NewGuest, RoomFilter};
    use crate::notify::NotifyHub;
    use std::path::PathBuf;
    use ulid::Ulid;

    fn test_wal_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("innkeep_test_compactor");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let _ = std::fs::remove_file(&path);
        path
    }

    fn guest(n: usize) -> NewGuest {
        NewGuest {
            id: Ulid::new(),
            first_name: format!("Guest{n}"),
            last_name: "Test".into(),
            email: format!("guest{n}@example.com"),
            phone: "555-0100".into(),
            address: None,
            id_number: None,
        }
    }

    #[tokio::test]
    async fn compacts_only_past_threshold() {
        let path = test_wal_path("threshold.wal");
        let engine = Engine::new(path.clone(), Arc::new(NotifyHub::new())).unwrap();

        for n in 0..3 {
            engine.create_guest(guest(n)).await.unwrap();
        }
        assert!(!compact_if_needed(&engine, 5).await.unwrap());
        assert_eq!(engine.wal_appends_since_compact().await, 3);

        for n in 3..6 {
            engine.create_guest(guest(n)).await.unwrap();
        }
        assert!(compact_if_needed(&engine, 5).await.unwrap());
        assert_eq!(engine.wal_appends_since_compact().await, 0);
        engine.shutdown().await.unwrap();
        drop(engine);

        let reopened = Engine::new(path, Arc::new(NotifyHub::new())).unwrap();
        assert_eq!(reopened.list_guests().len(), 6);
        assert!(reopened.list_rooms(&RoomFilter::default()).await.is_empty());
    }

    #[tokio::test]
    async fn zero_threshold_disables_compaction() {
        let path = test_wal_path("disabled.wal");
        let engine = Engine::new(path, Arc::new(NotifyHub::new())).unwrap();
        engine.create_guest(guest(0)).await.unwrap();
        assert!(!compact_if_needed(&engine, 0).await.unwrap());
    }
}
