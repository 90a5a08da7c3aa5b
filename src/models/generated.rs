use super::lenient::{is_truthy, scalar_string, text_field};
use super::{AnalysisResult, Difficulty};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 生成参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSettings {
    pub difficulty: Difficulty,
    pub count: u32,
    pub solution_hint: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            count: 3,
            solution_hint: String::new(),
        }
    }
}

impl GenerationSettings {
    /// 发送时的题目数量，0 视为 1
    pub fn effective_count(&self) -> u32 {
        if self.count == 0 {
            1
        } else {
            self.count
        }
    }
}

/// 解析表单中的题目数量输入
///
/// 取开头的数字部分；不是正整数时回退为 3
pub fn parse_count_input(input: &str) -> u32 {
    let digits: String = input
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    match digits.parse::<u32>() {
        Ok(n) if n > 0 => n,
        _ => 3,
    }
}

/// `/generate` 请求体
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub analysis: AnalysisResult,
    pub original_problem: String,
    pub difficulty: Difficulty,
    pub count: u32,
    pub solution_hint: String,
    pub analysis_summary: String,
}

impl GenerateRequest {
    /// 由解析结果与生成参数构建请求
    pub fn new(analysis: &AnalysisResult, settings: &GenerationSettings) -> Self {
        Self {
            original_problem: analysis.resend_text().to_string(),
            analysis_summary: analysis.summary.clone().unwrap_or_default(),
            analysis: analysis.clone(),
            difficulty: settings.difficulty,
            count: settings.effective_count(),
            solution_hint: settings.solution_hint.clone(),
        }
    }
}

/// `/generate` 响应体
#[derive(Debug, Clone, Deserialize, Default)]
pub struct GenerateResponse {
    #[serde(default)]
    pub success: Option<Value>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub set: GeneratedSet,
}

impl GenerateResponse {
    /// 带有 `success` 且为假值（`false`、`0`、空字符串）
    ///
    /// 缺失或 `null` 不算失败
    pub fn explicitly_failed(&self) -> bool {
        self.success.as_ref().is_some_and(|flag| !is_truthy(flag))
    }
}

/// 生成的类题集合
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GeneratedSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problems: Option<ProblemList>,
    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub problems_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// 响应中的 `problems` 字段
///
/// 正常是题目对象列表；部分服务端直接返回整段文本
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ProblemList {
    Items(Vec<GeneratedProblem>),
    Text(String),
    Other(Value),
}

/// 单道类题
///
/// 字段从 `raw` 宽松读取（数字、布尔值转文本）；
/// 序列化时原样写回 `raw`，为 `Null` 时按字段生成对象
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(try_from = "Value", into = "Value")]
pub struct GeneratedProblem {
    pub title: Option<String>,
    pub problem: Option<String>,
    pub answer: Option<String>,
    pub explanation: Option<String>,
    /// 服务端返回的原始对象
    pub raw: Value,
}

impl TryFrom<Value> for GeneratedProblem {
    type Error = String;

    fn try_from(raw: Value) -> Result<Self, Self::Error> {
        let (title, problem, answer, explanation) = match &raw {
            Value::Object(map) => (
                text_field(map, "title"),
                text_field(map, "problem"),
                text_field(map, "answer"),
                text_field(map, "explanation"),
            ),
            other => return Err(format!("题目应为对象: {}", other)),
        };
        Ok(Self {
            title,
            problem,
            answer,
            explanation,
            raw,
        })
    }
}

impl From<GeneratedProblem> for Value {
    fn from(problem: GeneratedProblem) -> Self {
        if !problem.raw.is_null() {
            return problem.raw;
        }
        fields_object([
            ("title", problem.title),
            ("problem", problem.problem),
            ("answer", problem.answer),
            ("explanation", problem.explanation),
        ])
    }
}

/// 生成结果的元数据
///
/// 与 [`GeneratedProblem`] 相同：字段宽松读取，`raw` 原样写回。
/// 不是对象时字段全部为空
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(from = "Value", into = "Value")]
pub struct Metadata {
    pub grade: Option<String>,
    pub unit: Option<String>,
    pub difficulty: Option<String>,
    pub notes: Option<String>,
    /// 服务端返回的原始对象
    pub raw: Value,
}

impl From<Value> for Metadata {
    fn from(raw: Value) -> Self {
        let (grade, unit, difficulty, notes) = match &raw {
            Value::Object(map) => (
                text_field(map, "grade"),
                text_field(map, "unit"),
                text_field(map, "difficulty"),
                text_field(map, "notes"),
            ),
            _ => Default::default(),
        };
        Self {
            grade,
            unit,
            difficulty,
            notes,
            raw,
        }
    }
}

impl From<Metadata> for Value {
    fn from(metadata: Metadata) -> Self {
        if !metadata.raw.is_null() {
            return metadata.raw;
        }
        fields_object([
            ("grade", metadata.grade),
            ("unit", metadata.unit),
            ("difficulty", metadata.difficulty),
            ("notes", metadata.notes),
        ])
    }
}

fn fields_object<const N: usize>(fields: [(&str, Option<String>); N]) -> Value {
    let map: Map<String, Value> = fields
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key.to_string(), Value::String(v))))
        .collect();
    Value::Object(map)
}

impl GeneratedSet {
    /// 结构化的题目列表（没有时为空）
    pub fn items(&self) -> &[GeneratedProblem] {
        match &self.problems {
            Some(ProblemList::Items(items)) => items,
            _ => &[],
        }
    }

    /// 无结构化题目时显示的整段文本
    ///
    /// `problems_text` 优先，其次是字符串形式的 `problems`
    pub fn fallback_text(&self) -> Option<&str> {
        if let Some(text) = self.problems_text.as_deref().filter(|t| !t.is_empty()) {
            return Some(text);
        }
        match &self.problems {
            Some(ProblemList::Text(text)) if !text.is_empty() => Some(text),
            _ => None,
        }
    }

    pub fn metadata_field(&self, pick: impl Fn(&Metadata) -> Option<&String>) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| pick(m))
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// `/download/*` 请求体
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DownloadRequest {
    pub problems: ProblemList,
    pub problems_text: String,
    pub metadata: Metadata,
}

impl From<&GeneratedSet> for DownloadRequest {
    fn from(set: &GeneratedSet) -> Self {
        Self {
            problems: set
                .problems
                .clone()
                .unwrap_or_else(|| ProblemList::Items(Vec::new())),
            problems_text: set.problems_text.clone().unwrap_or_default(),
            metadata: set.metadata.clone().unwrap_or_default(),
        }
    }
}
