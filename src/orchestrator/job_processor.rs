//! 单个任务处理器 - 编排层
//!
//! ## 职责
//!
//! 一个 TOML 任务走完整条流程：
//!
//! 1. **解析**：例题 → `/analyze`
//! 2. **生成**：按任务参数 → `/generate`
//! 3. **汇总**：把解析卡片和生成卡片写入 `problems.txt`
//! 4. **下载**：按任务指定的格式逐个下载，单个格式失败不影响其余格式
//!
//! 每个任务使用独立的 [`Session`] 和输出子目录

use crate::config::Config;
use crate::models::ProblemJob;
use crate::services::{DownloadWriter, ProblemApi};
use crate::view::{AnalysisView, GeneratedView};
use crate::workflow::Session;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// 汇总文本文件名
pub const SUMMARY_FILE_NAME: &str = "problems.txt";

/// 单个任务的处理结果
#[derive(Debug, Default)]
pub struct JobOutcome {
    /// 生成的类题数量
    pub problem_count: usize,
    /// 已保存的文件（含汇总文本）
    pub saved: Vec<PathBuf>,
    /// 下载失败的格式数
    pub failed_downloads: usize,
}

/// 任务输出目录
pub fn job_output_dir(config: &Config, job: &ProblemJob) -> PathBuf {
    Path::new(&config.output_dir).join(job.dir_name())
}

/// 处理单个任务
///
/// # 参数
/// - `api`: 后端 API
/// - `job`: 任务数据
/// - `job_index`: 任务编号（用于日志）
/// - `config`: 配置
///
/// # 返回
/// 解析或生成失败时返回错误；下载失败只计数
pub async fn process_job<A: ProblemApi>(
    api: A,
    job: &ProblemJob,
    job_index: usize,
    config: &Config,
) -> Result<JobOutcome> {
    let output_dir = job_output_dir(config, job);
    let session = Session::new(api, DownloadWriter::new(&output_dir));
    let settings = job.settings();

    info!("[任务 {}] ▶ {} ({})", job_index, job.name, settings.difficulty);

    let analysis = session
        .analyze(&job.problem_text)
        .await
        .with_context(|| format!("[任务 {}] 解析失败", job_index))?
        .applied()
        .with_context(|| format!("[任务 {}] 解析结果被丢弃", job_index))?;

    let set = session
        .generate(&settings)
        .await
        .with_context(|| format!("[任务 {}] 生成失败", job_index))?
        .applied()
        .with_context(|| format!("[任务 {}] 生成结果被丢弃", job_index))?;

    let mut outcome = JobOutcome {
        problem_count: set.items().len(),
        ..Default::default()
    };

    let summary = format!(
        "{}\n\n{}\n",
        AnalysisView::new(&analysis),
        GeneratedView::new(&set, Some(&analysis), &settings)
    );
    let summary_path = output_dir.join(SUMMARY_FILE_NAME);
    tokio::fs::create_dir_all(&output_dir)
        .await
        .with_context(|| format!("无法创建输出目录: {}", output_dir.display()))?;
    tokio::fs::write(&summary_path, summary)
        .await
        .with_context(|| format!("无法写入汇总文件: {}", summary_path.display()))?;
    outcome.saved.push(summary_path);

    for format in &job.formats {
        match session.download(*format).await {
            Ok(Some(path)) => outcome.saved.push(path),
            Ok(None) => warn!("[任务 {}] 没有可下载的生成结果", job_index),
            Err(e) => {
                error!(
                    "[任务 {}] {}",
                    job_index,
                    e.alert_message(format.operation())
                );
                outcome.failed_downloads += 1;
            }
        }
    }

    info!(
        "[任务 {}] ✓ 完成: {} 道类题, 保存 {} 个文件",
        job_index,
        outcome.problem_count,
        outcome.saved.len()
    );

    Ok(outcome)
}
