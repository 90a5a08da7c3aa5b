//! 批量任务处理器 - 编排层
//!
//! ## 职责
//!
//! 1. **批量加载**：扫描任务目录下的所有 TOML 文件（`Vec<ProblemJob>`）
//! 2. **并发控制**：使用 Semaphore 限制并发数量
//! 3. **分批处理**：每批完成后再开始下一批
//! 4. **全局统计**：汇总所有任务的处理结果并写入日志文件
//!
//! 单个任务的细节委托给 [`job_processor`]

use crate::clients::ApiClient;
use crate::config::Config;
use crate::models::ProblemJob;
use crate::orchestrator::job_processor;
use crate::services::ProblemApi;
use crate::utils::logging;
use anyhow::Result;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// 批量处理应用
pub struct App<A> {
    config: Config,
    api: A,
}

impl App<ApiClient> {
    /// 使用真实后端初始化
    pub fn initialize(config: Config) -> Result<Self> {
        let api = ApiClient::new(&config)?;
        Ok(Self::with_api(config, api))
    }
}

impl<A> App<A>
where
    A: ProblemApi + Clone + 'static,
{
    pub fn with_api(config: Config, api: A) -> Self {
        Self { config, api }
    }

    /// 运行批量处理
    pub async fn run(&self) -> Result<ProcessingStats> {
        logging::init_log_file(&self.config.output_log_file)?;
        logging::log_startup(self.config.max_concurrent_jobs);

        let jobs = self.load_jobs().await?;
        if jobs.is_empty() {
            warn!("⚠️ 没有找到待处理的TOML文件，程序结束");
            return Ok(ProcessingStats::default());
        }

        logging::log_jobs_loaded(jobs.len(), self.config.max_concurrent_jobs);

        let stats = self.process_all_jobs(jobs).await?;

        logging::print_final_stats(
            stats.success,
            stats.failed,
            stats.total,
            &self.config.output_log_file,
        );
        logging::append_log_line(
            &self.config.output_log_file,
            &format!("合计: 成功 {}/{}, 失败 {}", stats.success, stats.total, stats.failed),
        )?;

        Ok(stats)
    }

    async fn load_jobs(&self) -> Result<Vec<ProblemJob>> {
        info!("📁 正在扫描待处理的任务: {}", self.config.jobs_folder);
        crate::models::load_all_toml_files(&self.config.jobs_folder).await
    }

    async fn process_all_jobs(&self, jobs: Vec<ProblemJob>) -> Result<ProcessingStats> {
        let batch_size = self.config.max_concurrent_jobs.max(1);
        let semaphore = Arc::new(Semaphore::new(batch_size));
        let total = jobs.len();
        let total_batches = total.div_ceil(batch_size);
        let mut stats = ProcessingStats {
            total,
            ..Default::default()
        };

        for (batch_idx, batch_jobs) in jobs.chunks(batch_size).enumerate() {
            let batch_start = batch_idx * batch_size;
            let batch_num = batch_idx + 1;

            logging::log_batch_start(
                batch_num,
                total_batches,
                batch_start + 1,
                batch_start + batch_jobs.len(),
                total,
            );

            let batch_result = self
                .process_batch(batch_jobs, batch_start, semaphore.clone())
                .await?;

            stats.success += batch_result.success;
            stats.failed += batch_result.failed;

            logging::log_batch_complete(
                batch_num,
                batch_result.success,
                batch_result.success + batch_result.failed,
            );
        }

        Ok(stats)
    }

    async fn process_batch(
        &self,
        batch_jobs: &[ProblemJob],
        batch_start: usize,
        semaphore: Arc<Semaphore>,
    ) -> Result<BatchResult> {
        let mut job_indices = Vec::new();
        let mut handles = Vec::new();

        for (idx, job) in batch_jobs.iter().enumerate() {
            let job_index = batch_start + idx + 1;
            let permit = semaphore.clone().acquire_owned().await?;
            let api = self.api.clone();
            let job = job.clone();
            let config = self.config.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                let result = job_processor::process_job(api, &job, job_index, &config).await;
                let line = match &result {
                    Ok(outcome) if outcome.failed_downloads == 0 => {
                        format!("✓ {} - {} 道类题", job.name, outcome.problem_count)
                    }
                    Ok(outcome) => format!(
                        "△ {} - {} 道类题, {} 个文件下载失败",
                        job.name, outcome.problem_count, outcome.failed_downloads
                    ),
                    Err(e) => {
                        error!("[任务 {}] ❌ 处理过程中发生错误: {:#}", job_index, e);
                        format!("✗ {} - {:#}", job.name, e)
                    }
                };
                if let Err(e) = logging::append_log_line(&config.output_log_file, &line) {
                    warn!("[任务 {}] 无法写入日志文件: {}", job_index, e);
                }
                result.is_ok()
            });
            job_indices.push(job_index);
            handles.push(handle);
        }

        // 等待本批所有任务完成
        let mut result = BatchResult::default();
        for (job_index, joined) in job_indices.into_iter().zip(join_all(handles).await) {
            match joined {
                Ok(true) => result.success += 1,
                Ok(false) => result.failed += 1,
                Err(e) => {
                    error!("[任务 {}] 任务执行失败: {}", job_index, e);
                    result.failed += 1;
                }
            }
        }

        Ok(result)
    }
}

/// 处理统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingStats {
    pub success: usize,
    pub failed: usize,
    pub total: usize,
}

/// 批次处理结果
#[derive(Debug, Default)]
struct BatchResult {
    success: usize,
    failed: usize,
}
