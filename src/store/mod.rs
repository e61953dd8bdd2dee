use std::io::ErrorKind;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::AppError;

pub const ROUTES: &str = "routes";
pub const POSITIONS: &str = "positions";
pub const NOTIFICATIONS: &str = "notifications";
pub const DELIVERIES: &str = "deliveries";
pub const USERS: &str = "users";

/// Whole-document JSON persistence, one file per collection. Writers
/// serialize per collection by holding their write lock across mutate + save.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Falls back to the default when the file is absent, unreadable, or
    /// malformed; a bad file stays on disk until the next successful save.
    pub async fn load<T, F>(&self, name: &str, default: F) -> T
    where
        T: DeserializeOwned,
        F: FnOnce() -> T,
    {
        let path = self.path_for(name);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(collection = name, "no persisted file; starting empty");
                return default();
            }
            Err(err) => {
                warn!(collection = name, error = %err, "failed to read collection; using default");
                return default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                warn!(collection = name, error = %err, "malformed collection file; using default");
                default()
            }
        }
    }

    /// Staged as a temp file next to the target and renamed into place;
    /// never written in place.
    pub async fn save<T: Serialize>(&self, name: &str, value: &T) -> Result<(), AppError> {
        let path = self.path_for(name);
        let json = serde_json::to_string_pretty(value)
            .map_err(|err| AppError::Storage(format!("serialize {name}: {err}")))?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|err| AppError::Storage(format!("create {}: {err}", self.dir.display())))?;

        let tmp = self
            .dir
            .join(format!(".{name}.json.tmp.{}", std::process::id()));
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|err| AppError::Storage(format!("write {name}: {err}")))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|err| AppError::Storage(format!("replace {name}: {err}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::JsonStore;
    use crate::models::route::RouteBook;

    fn scratch_store() -> (JsonStore, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("careline-store-{}", Uuid::new_v4()));
        (JsonStore::new(&dir), dir)
    }

    #[tokio::test]
    async fn missing_file_loads_default() {
        let (store, _dir) = scratch_store();
        let book: RouteBook = store.load("routes", RouteBook::default).await;
        assert!(book.drivers.is_empty());
        assert!(book.routes.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let (store, dir) = scratch_store();
        let book: RouteBook = serde_json::from_value(serde_json::json!({
            "drivers": [{"id": "D1", "name": "Dana"}],
            "routes": [{"id": "R1", "driver_id": "D1", "stops": []}]
        }))
        .unwrap();

        store.save("routes", &book).await.unwrap();
        let loaded: RouteBook = store.load("routes", RouteBook::default).await;
        assert_eq!(loaded.drivers.len(), 1);
        assert_eq!(loaded.routes[0].id, "R1");

        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn malformed_file_loads_default_and_is_left_in_place() {
        let (store, dir) = scratch_store();
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("routes.json");
        std::fs::write(&path, "{not json").unwrap();

        let book: RouteBook = store.load("routes", RouteBook::default).await;
        assert!(book.routes.is_empty());

        // Loading must not rewrite the bad file; only a save may.
        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw, "{not json");

        store.save("routes", &RouteBook::default()).await.unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"routes\""));

        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn empty_file_counts_as_malformed() {
        let (store, dir) = scratch_store();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("routes.json"), "").unwrap();

        let book: RouteBook = store.load("routes", RouteBook::default).await;
        assert!(book.routes.is_empty());

        std::fs::remove_dir_all(dir).ok();
    }
}
