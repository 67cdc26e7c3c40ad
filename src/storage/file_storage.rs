use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::storage::StorageError;
use crate::traits::KeyValueStorage;

/// A storage that keeps every key in its own file, inside a folder
#[derive(Clone, Debug, PartialEq)]
pub struct FileStorage {
    backing_folder: PathBuf,
}

impl FileStorage {
    /// Use `folder` as a backing folder. It will be created on the first write if needed
    pub fn new(folder: &Path) -> Self {
        Self {
            backing_folder: PathBuf::from(folder),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.backing_folder
    }

    /// Get the path to the file that backs `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        let mut file_name = sanitize_filename::sanitize(key);
        if file_name.is_empty() {
            file_name = String::from("_");
        }
        file_name.push_str(".json");
        self.backing_folder.join(file_name)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io { path: PathBuf::from(path), source }
}

#[async_trait]
impl KeyValueStorage for FileStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error(&path, err)),
        }
    }

    async fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.backing_folder).await
            .map_err(|err| io_error(&self.backing_folder, err))?;

        // Write aside, then move, so that an interrupted write never leaves a truncated file
        let path = self.path_for(key);
        let temp_path = path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, value).await
            .map_err(|err| io_error(&temp_path, err))?;
        tokio::fs::rename(&temp_path, &path).await
            .map_err(|err| io_error(&path, err))?;
        log::debug!("Saved {} bytes to {:?}", value.len(), path);
        Ok(())
    }

    async fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_error(&path, err)),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_sanitized() {
        let storage = FileStorage::new(Path::new("some_folder"));
        assert_eq!(storage.path_for("tasks"), PathBuf::from("some_folder/tasks.json"));
        assert_eq!(storage.path_for("../tasks").parent(), Some(Path::new("some_folder")));
        assert_eq!(storage.path_for("/").parent(), Some(Path::new("some_folder")));
        assert_eq!(storage.path_for("tasks.corrupt"), PathBuf::from("some_folder/tasks.corrupt.json"));
    }

    #[tokio::test]
    async fn serde_file_storage() {
        let folder = std::env::temp_dir().join(format!("daybook_file_storage_{}", uuid::Uuid::new_v4()));
        let mut storage = FileStorage::new(&folder);

        assert_eq!(storage.get_item("tasks").await.unwrap(), None);
        storage.set_item("tasks", r#"{"version":2,"tasks":{}}"#).await.unwrap();

        let reopened = FileStorage::new(&folder);
        assert_eq!(reopened.get_item("tasks").await.unwrap(), Some(r#"{"version":2,"tasks":{}}"#.to_string()));

        storage.remove_item("tasks").await.unwrap();
        storage.remove_item("tasks").await.unwrap();
        assert_eq!(reopened.get_item("tasks").await.unwrap(), None);

        let _ = std::fs::remove_dir_all(&folder);
    }
}
