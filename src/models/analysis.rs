use super::lenient::{is_truthy, scalar_string};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `/analyze` 请求体
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyzeRequest {
    pub problem_text: String,
}

/// `/analyze` 响应体
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AnalyzeResponse {
    /// 成功标志，按真值判断
    #[serde(default)]
    pub success: Option<Value>,
    #[serde(default)]
    pub analysis: Option<AnalysisPayload>,
    /// 服务端回显的原题
    #[serde(default, deserialize_with = "scalar_string")]
    pub original_problem: Option<String>,
    #[serde(default)]
    pub raw_response: Option<Value>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub error: Option<String>,
}

impl AnalyzeResponse {
    /// `success` 为真值时成功；缺失、`null`、`0`、空字符串均视为失败
    pub fn succeeded(&self) -> bool {
        self.success.as_ref().is_some_and(is_truthy)
    }
}

/// 响应中的 `analysis` 字段
///
/// 结构化服务端返回对象；只返回 LLM 原文的服务端返回字符串
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AnalysisPayload {
    Fields(AnalysisFields),
    Text(String),
}

/// 结构化的解析字段
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AnalysisFields {
    #[serde(default, deserialize_with = "scalar_string")]
    pub grade: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub difficulty: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub original_problem: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub problem_text: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 解析结果
///
/// 每次解析成功生成一份，直到下一次解析成功前保持不变
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AnalysisResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub original_problem: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_text: Option<String>,
    /// 诊断用的原始响应
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<Value>,
    /// 服务端返回的其他字段，生成请求时原样回传
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnalysisResult {
    /// 由成功的响应构建解析结果
    ///
    /// `original_problem` 依次取：服务端解析字段 → 响应回显 → 提交的文本
    pub fn from_response(response: AnalyzeResponse, submitted: &str) -> Self {
        let fields = match response.analysis {
            Some(AnalysisPayload::Fields(fields)) => fields,
            Some(AnalysisPayload::Text(text)) => AnalysisFields {
                summary: non_empty(Some(text)),
                ..Default::default()
            },
            None => AnalysisFields::default(),
        };

        let original_problem = non_empty(fields.original_problem)
            .or_else(|| non_empty(response.original_problem))
            .unwrap_or_else(|| submitted.trim().to_string());

        Self {
            grade: fields.grade,
            unit: fields.unit,
            difficulty: fields.difficulty,
            summary: fields.summary,
            original_problem,
            problem_text: fields.problem_text,
            raw_response: response.raw_response,
            extra: fields.extra,
        }
    }

    /// 生成时回传的题目文本：`problem_text` 优先，否则 `original_problem`
    pub fn resend_text(&self) -> &str {
        match self.problem_text.as_deref() {
            Some(text) if !text.is_empty() => text,
            _ => &self.original_problem,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
