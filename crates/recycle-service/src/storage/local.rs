//! 本地文件系统照片存储

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::warn;

use super::PhotoStorage;
use crate::error::{CoreError, Result};

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// 本地文件系统存储
///
/// 文件落在 `{root_dir}/{category}/{id}.{ext}`，
/// 返回的 URL 为 `{base_url}/{category}/{id}.{ext}`
pub struct LocalPhotoStorage {
    root_dir: PathBuf,
    base_url: String,
}

impl LocalPhotoStorage {
    pub fn new(root_dir: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root_dir: root_dir.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn validate_extension(extension: &str) -> Result<()> {
        let ext = extension.to_ascii_lowercase();
        if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(CoreError::Validation(format!(
                "不支持的图片格式: {extension}"
            )));
        }
        Ok(())
    }

    /// 从 URL 还原相对路径，防止越出存储根目录
    fn relative_path_from_url(&self, url: &str) -> Option<PathBuf> {
        let rel = url.strip_prefix(&self.base_url)?.trim_start_matches('/');
        if rel.is_empty() || rel.contains("..") {
            return None;
        }
        Some(PathBuf::from(rel))
    }
}

#[async_trait]
impl PhotoStorage for LocalPhotoStorage {
    async fn store(
        &self,
        category: &str,
        id: &str,
        extension: &str,
        bytes: &[u8],
    ) -> Result<String> {
        Self::validate_extension(extension)?;
        if bytes.is_empty() {
            return Err(CoreError::Validation("照片内容为空".to_string()));
        }

        let dir = self.root_dir.join(category);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| CoreError::Storage(format!("创建存储目录失败: {e}")))?;

        let filename = format!("{}.{}", id, extension.to_ascii_lowercase());
        let path = dir.join(&filename);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| CoreError::Storage(format!("写入照片失败: {e}")))?;

        Ok(format!("{}/{}/{}", self.base_url, category, filename))
    }

    async fn delete(&self, url: &str) -> Result<()> {
        let Some(rel) = self.relative_path_from_url(url) else {
            warn!(url, "无法识别的照片 URL，跳过删除");
            return Ok(());
        };

        let path = self.root_dir.join(rel);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CoreError::Storage(format!("删除照片失败: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_extension() {
        assert!(LocalPhotoStorage::validate_extension("jpg").is_ok());
        assert!(LocalPhotoStorage::validate_extension("PNG").is_ok());
        assert!(LocalPhotoStorage::validate_extension("exe").is_err());
    }

    #[test]
    fn test_relative_path_from_url() {
        let storage = LocalPhotoStorage::new("/tmp/photos", "http://localhost:8080/photos");

        let rel = storage
            .relative_path_from_url("http://localhost:8080/photos/deliveries/d-1.jpg")
            .unwrap();
        assert_eq!(rel, PathBuf::from("deliveries/d-1.jpg"));

        assert!(
            storage
                .relative_path_from_url("http://other-host/photos/x.jpg")
                .is_none()
        );
        assert!(
            storage
                .relative_path_from_url("http://localhost:8080/photos/../etc/passwd")
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_store_and_delete_round_trip() {
        let dir = std::env::temp_dir().join(format!("photo-store-{}", uuid::Uuid::new_v4()));
        let storage = LocalPhotoStorage::new(&dir, "http://localhost:8080/photos");

        let url = storage
            .store("deliveries", "d-1", "jpg", b"fake-image-bytes")
            .await
            .unwrap();
        assert_eq!(url, "http://localhost:8080/photos/deliveries/d-1.jpg");
        assert!(dir.join("deliveries/d-1.jpg").exists());

        storage.delete(&url).await.unwrap();
        assert!(!dir.join("deliveries/d-1.jpg").exists());

        // 重复删除静默成功
        storage.delete(&url).await.unwrap();

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
