use crate::models::job::ProblemJob;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从 TOML 文件加载数据并转换为 ProblemJob 对象
pub async fn load_toml_to_problem_job(toml_file_path: &Path) -> Result<ProblemJob> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let job: ProblemJob = toml::from_str(&content)
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))?;

    if job.problem_text.trim().is_empty() {
        anyhow::bail!("任务 {} 的 problem_text 为空", toml_file_path.display());
    }

    Ok(job.with_file_path(toml_file_path.to_string_lossy().to_string()))
}

/// 从文件夹中加载所有 TOML 文件并转换为 ProblemJob 对象列表
///
/// 按文件名排序；无法解析的文件记录警告后跳过
pub async fn load_all_toml_files(folder_path: &str) -> Result<Vec<ProblemJob>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut toml_files = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml_files.push(path);
        }
    }
    toml_files.sort();

    let mut jobs = Vec::new();
    for path in toml_files {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_toml_to_problem_job(&path).await {
            Ok(job) => jobs.push(job),
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {:#}", path.display(), e);
            }
        }
    }

    Ok(jobs)
}
