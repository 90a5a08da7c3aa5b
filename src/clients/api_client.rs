//! 后端 API 客户端
//!
//! 封装与类题生成后端之间的全部 HTTP 调用（JSON POST）

use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult};
use crate::models::{
    AnalyzeRequest, AnalyzeResponse, DownloadFormat, DownloadRequest, GenerateRequest,
    GenerateResponse, Operation,
};
use crate::services::ProblemApi;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

/// 后端 API 客户端
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// 根据配置创建客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(ApiError::ClientInit)?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, operation: Operation) -> String {
        format!("{}{}", self.base_url, operation.endpoint())
    }

    /// 发送 POST 请求，只检查 HTTP 状态码
    async fn post<B: Serialize + ?Sized>(&self, operation: Operation, body: &B) -> AppResult<Response> {
        let url = self.url(operation);
        debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::request_failed(operation, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("{} 返回 HTTP {}", operation.endpoint(), status.as_u16());
            return Err(AppError::bad_status(operation, status.as_u16()));
        }

        Ok(response)
    }

    /// 发送 POST 请求并解析 JSON 响应
    async fn post_json<B, T>(&self, operation: Operation, body: &B) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let bytes = self
            .post(operation, body)
            .await?
            .bytes()
            .await
            .map_err(|e| AppError::request_failed(operation, e))?;

        debug!("{} 响应 {} 字节", operation.endpoint(), bytes.len());

        serde_json::from_slice(&bytes).map_err(|e| AppError::json_parse_failed(operation, e))
    }
}

#[async_trait]
impl ProblemApi for ApiClient {
    async fn analyze(&self, request: &AnalyzeRequest) -> AppResult<AnalyzeResponse> {
        self.post_json(Operation::Analyze, request).await
    }

    async fn generate(&self, request: &GenerateRequest) -> AppResult<GenerateResponse> {
        self.post_json(Operation::Generate, request).await
    }

    async fn download(
        &self,
        format: DownloadFormat,
        request: &DownloadRequest,
    ) -> AppResult<Vec<u8>> {
        let operation = format.operation();
        let bytes = self
            .post(operation, request)
            .await?
            .bytes()
            .await
            .map_err(|e| AppError::request_failed(operation, e))?;

        Ok(bytes.to_vec())
    }
}
