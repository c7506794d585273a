//! 照片存储模块
//!
//! 投递凭证和用户头像的二进制存储抽象，默认实现为本地文件系统

pub mod local;

use async_trait::async_trait;

use crate::error::Result;

pub use local::LocalPhotoStorage;

/// 照片存储接口
///
/// 实现负责持久化二进制内容并返回可访问的 URL
#[async_trait]
pub trait PhotoStorage: Send + Sync {
    /// 存储照片，返回访问 URL
    ///
    /// `category` 为业务分类（deliveries/avatars），`id` 为关联实体 ID
    async fn store(&self, category: &str, id: &str, extension: &str, bytes: &[u8])
        -> Result<String>;

    /// 删除照片（URL 不存在时静默成功）
    async fn delete(&self, url: &str) -> Result<()>;
}
