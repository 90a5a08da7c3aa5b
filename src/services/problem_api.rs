//! 后端 API 能力 - 业务能力层
//!
//! 只描述"能向后端发哪几种请求"，不关心流程和状态

use crate::error::AppResult;
use crate::models::{
    AnalyzeRequest, AnalyzeResponse, DownloadFormat, DownloadRequest, GenerateRequest,
    GenerateResponse,
};
use async_trait::async_trait;

/// 后端 API
///
/// 实现方负责：
/// - HTTP 状态码非 2xx 时返回 [`crate::error::ApiError::BadStatus`]
/// - 响应体解析失败时返回 [`crate::error::ApiError::JsonParseFailed`]
///
/// 响应体中的 `success` 标记由调用方（[`crate::workflow::Session`]）判断
#[async_trait]
pub trait ProblemApi: Send + Sync {
    /// POST /analyze
    async fn analyze(&self, request: &AnalyzeRequest) -> AppResult<AnalyzeResponse>;

    /// POST /generate
    async fn generate(&self, request: &GenerateRequest) -> AppResult<GenerateResponse>;

    /// POST /download/pdf 或 /download/word，返回文件内容
    async fn download(&self, format: DownloadFormat, request: &DownloadRequest)
        -> AppResult<Vec<u8>>;
}
