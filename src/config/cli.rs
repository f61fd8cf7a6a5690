use crate::core::Storage;
use crate::utils::error::Result;
use std::fs;
use std::path::Path;

/// Writes output files under a base directory on the local disk.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }

    /// Creates the base directory if it is missing. Called once before the first query.
    pub fn ensure_base_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.base_path)?;
        Ok(())
    }
}

impl Storage for LocalStorage {
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        // fs::write 會截斷既有檔案
        fs::write(full_path, data)?;
        Ok(())
    }

    fn location(&self) -> &str {
        &self.base_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_file_overwrites_existing() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());

        storage.write_file("example.com_unique.csv", b"old contents that are longer").await.unwrap();
        storage.write_file("example.com_unique.csv", b"new").await.unwrap();

        let written = fs::read(temp_dir.path().join("example.com_unique.csv")).unwrap();
        assert_eq!(written, b"new");
    }

    #[test]
    fn test_ensure_base_dir_creates_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("results").join("2016");
        let storage = LocalStorage::new(nested.to_str().unwrap().to_string());

        storage.ensure_base_dir().unwrap();
        assert!(nested.is_dir());
        // 再次呼叫不應失敗
        storage.ensure_base_dir().unwrap();
    }
}
