//! 请求编排 - 流程层
//!
//! 核心职责：定义"一次会话"里四种请求的前置条件、请求体和结果落地
//!
//! - analyze：校验 → POST /analyze → 写入解析结果
//! - generate：需要解析结果 → POST /generate → 整体替换生成结果
//! - download：需要生成结果 → POST /download/* → 保存文件
//!
//! 状态只通过 [`Store`] 的 ticket 修改，迟到的旧响应不会覆盖新状态

use crate::clients::ApiClient;
use crate::config::Config;
use crate::error::{AppError, AppResult, ValidationError};
use crate::models::{
    AnalysisResult, AnalyzeRequest, DownloadFormat, DownloadRequest, GenerateRequest,
    GeneratedSet, GenerationSettings, Operation,
};
use crate::services::{DownloadWriter, ProblemApi};
use crate::store::{Action, ApplyOutcome, Store};
use crate::utils::logging::truncate_text;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// 一次请求的落地结果
#[derive(Debug, Clone, PartialEq)]
pub enum Completion<T> {
    /// 结果已写入状态
    Applied(T),
    /// 期间有更新的同类请求，本次结果被丢弃
    Superseded,
}

impl<T> Completion<T> {
    pub fn applied(self) -> Option<T> {
        match self {
            Completion::Applied(value) => Some(value),
            Completion::Superseded => None,
        }
    }
}

/// 请求编排会话
///
/// 所有操作只需要 `&self`，可以并发调用；锁不会跨 await 持有
pub struct Session<A: ProblemApi> {
    api: A,
    writer: DownloadWriter,
    store: Mutex<Store>,
}

impl Session<ApiClient> {
    /// 按配置创建连接真实后端的会话
    pub fn from_config(config: &Config) -> AppResult<Self> {
        Ok(Self::new(
            ApiClient::new(config)?,
            DownloadWriter::new(&config.output_dir),
        ))
    }
}

impl<A: ProblemApi> Session<A> {
    pub fn new(api: A, writer: DownloadWriter) -> Self {
        Self {
            api,
            writer,
            store: Mutex::new(Store::new()),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn writer(&self) -> &DownloadWriter {
        &self.writer
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 当前状态快照
    pub fn snapshot(&self) -> Store {
        self.lock().clone()
    }

    /// 更新生成参数
    pub fn set_settings(&self, settings: GenerationSettings) {
        self.lock().apply(Action::SetSettings(settings));
    }

    /// 解析例题
    ///
    /// 文本去掉首尾空白后为空时直接返回校验错误，不发请求
    pub async fn analyze(&self, problem_text: &str) -> AppResult<Completion<AnalysisResult>> {
        let submitted = problem_text.trim();
        if submitted.is_empty() {
            return Err(ValidationError::EmptyProblemText.into());
        }

        let ticket = self.lock().begin(Operation::Analyze);
        info!("🔍 解析例题: {}", truncate_text(submitted, 40));

        let request = AnalyzeRequest {
            problem_text: submitted.to_string(),
        };
        let result = self.api.analyze(&request).await.and_then(|response| {
            if response.succeeded() {
                Ok(AnalysisResult::from_response(response, submitted))
            } else {
                let message = response
                    .error
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| "解析結果を取得できませんでした".to_string());
                Err(AppError::rejected(Operation::Analyze, message))
            }
        });

        match result {
            Ok(analysis) => {
                let outcome = self
                    .lock()
                    .apply(Action::AnalyzeSucceeded(ticket, analysis.clone()));
                if outcome == ApplyOutcome::Stale {
                    debug!("丢弃过期的解析结果 (ticket {})", ticket.generation);
                    return Ok(Completion::Superseded);
                }
                info!(
                    "✓ 解析完成: 学年 {} / 単元 {}",
                    analysis.grade.as_deref().unwrap_or("-"),
                    analysis.unit.as_deref().unwrap_or("-")
                );
                Ok(Completion::Applied(analysis))
            }
            Err(e) => {
                self.lock().apply(Action::AnalyzeFailed(ticket));
                warn!("解析失败: {}", e);
                Err(e)
            }
        }
    }

    /// 生成类题
    ///
    /// 没有解析结果时返回校验错误，不发请求
    pub async fn generate(
        &self,
        settings: &GenerationSettings,
    ) -> AppResult<Completion<GeneratedSet>> {
        let (ticket, request) = {
            let mut store = self.lock();
            let analysis = store
                .analysis()
                .cloned()
                .ok_or(ValidationError::MissingAnalysis)?;
            store.apply(Action::SetSettings(settings.clone()));
            let request = GenerateRequest::new(&analysis, settings);
            (store.begin(Operation::Generate), request)
        };

        info!(
            "🧮 生成类题: {} / {} 問",
            request.difficulty, request.count
        );
        debug!("生成请求原题: {}", truncate_text(&request.original_problem, 80));

        let result = self.api.generate(&request).await.and_then(|response| {
            // 没有 success 字段时视为成功
            if response.explicitly_failed() {
                let message = response
                    .error
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| Operation::Generate.failure_message().to_string());
                Err(AppError::rejected(Operation::Generate, message))
            } else {
                Ok(response.set)
            }
        });

        match result {
            Ok(set) => {
                let outcome = self
                    .lock()
                    .apply(Action::GenerateSucceeded(ticket, set.clone()));
                if outcome == ApplyOutcome::Stale {
                    debug!("丢弃过期的生成结果 (ticket {})", ticket.generation);
                    return Ok(Completion::Superseded);
                }
                info!("✓ 生成完成: {} 道类题", set.items().len());
                Ok(Completion::Applied(set))
            }
            Err(e) => {
                self.lock().apply(Action::GenerateFailed(ticket));
                warn!("生成失败: {}", e);
                Err(e)
            }
        }
    }

    /// 下载生成结果
    ///
    /// # 返回
    /// - 没有生成结果时返回 `Ok(None)`，不发请求
    /// - 成功时返回保存的文件路径
    pub async fn download(&self, format: DownloadFormat) -> AppResult<Option<PathBuf>> {
        let Some(request) = self.lock().generated().map(DownloadRequest::from) else {
            debug!("没有生成结果，跳过 {} 下载", format);
            return Ok(None);
        };

        info!("📥 下载 {} ...", format);
        let bytes = self.api.download(format, &request).await.map_err(|e| {
            warn!("{} 下载失败: {}", format, e);
            e
        })?;
        let path = self.writer.write(format, &bytes).await?;
        info!("✓ 已保存: {}", path.display());

        Ok(Some(path))
    }
}
