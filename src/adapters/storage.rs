use crate::domain::ports::{InputStream, Storage};
use crate::utils::error::{ConversionError, Result};
use std::path::{Path, PathBuf};

/// Files on the local disk, relative to `base_path` unless absolute.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        Path::new(&self.base_path).join(path)
    }
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new(".".to_string())
    }
}

impl Storage for LocalStorage {
    async fn open_file(&self, path: &str) -> Result<Box<dyn InputStream>> {
        let full_path = self.resolve(path);
        let file = tokio::fs::File::open(&full_path)
            .await
            .map_err(|e| ConversionError::InputUnreadableError {
                path: full_path.display().to_string(),
                reason: e.to_string(),
            })?;
        // Rows are read synchronously by the batch core.
        Ok(Box::new(file.into_std().await))
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path);

        if let Some(parent) = full_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        tokio::fs::write(full_path, data).await?;
        Ok(())
    }
}
