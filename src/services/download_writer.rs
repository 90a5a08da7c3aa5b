//! 下载文件写入服务 - 业务能力层
//!
//! 只负责"把收到的文件内容落盘"，不关心流程

use crate::error::{AppError, AppResult};
use crate::models::DownloadFormat;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 下载文件写入服务
///
/// 文件名固定（`math_problems.pdf` / `math_problems.docx`），同名文件直接覆盖
#[derive(Debug, Clone)]
pub struct DownloadWriter {
    output_dir: PathBuf,
}

impl DownloadWriter {
    /// 创建写入服务
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// 指定格式对应的目标路径
    pub fn target_path(&self, format: DownloadFormat) -> PathBuf {
        self.output_dir.join(format.file_name())
    }

    /// 写入文件
    ///
    /// # 返回
    /// 返回写入的文件路径
    pub async fn write(&self, format: DownloadFormat, bytes: &[u8]) -> AppResult<PathBuf> {
        let path = self.target_path(format);
        debug!("写入 {} 文件: {} ({} 字节)", format, path.display(), bytes.len());

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| AppError::file_write_failed(self.output_dir.display().to_string(), e))?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;

        Ok(path)
    }
}
