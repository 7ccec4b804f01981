use crate::shared::infrastructure::key_value_store::{KeyValueStore, StoreError};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// One `<key>.json` file per record under a data directory.
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| backend(&dir, e))?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::Backend(format!("invalid storage key {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

fn backend(path: &Path, error: std::io::Error) -> StoreError {
    StoreError::Backend(format!("{}: {error}", path.display()))
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(backend(&path, e)),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        if let Err(e) = tokio::fs::write(&tmp, value).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(match e.kind() {
                ErrorKind::StorageFull => StoreError::QuotaExceeded {
                    key: key.to_string(),
                },
                _ => backend(&tmp, e),
            });
        }
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| backend(&path, e))
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(backend(&path, e)),
        }
    }
}

#[cfg(test)]
mod file_key_value_store_tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn it_should_survive_reopening_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileKeyValueStore::open(dir.path()).await.unwrap();
            store
                .set("products_offline", r#"[{"id":-1}]"#.to_string())
                .await
                .unwrap();
        }

        let reopened = FileKeyValueStore::open(dir.path()).await.unwrap();
        assert_eq!(
            reopened.get("products_offline").await.unwrap().as_deref(),
            Some(r#"[{"id":-1}]"#)
        );
        assert!(dir.path().join("products_offline.json").exists());
        assert!(!dir.path().join("products_offline.json.tmp").exists());
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_treat_missing_records_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::open(dir.path().join("nested")).await.unwrap();

        assert_eq!(store.get("sync_queue").await.unwrap(), None);
        store.remove("sync_queue").await.unwrap();
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_remove_the_record_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::open(dir.path()).await.unwrap();
        store.set("sync_queue", "[]".to_string()).await.unwrap();

        store.remove("sync_queue").await.unwrap();

        assert!(!dir.path().join("sync_queue.json").exists());
    }

    #[rstest]
    #[case("")]
    #[case("../escape")]
    #[case("with space")]
    #[tokio::test]
    async fn it_should_reject_keys_that_are_not_plain_names(#[case] key: &str) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::open(dir.path()).await.unwrap();

        assert!(matches!(
            store.set(key, "[]".to_string()).await,
            Err(StoreError::Backend(_))
        ));
    }
}
