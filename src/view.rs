//! 终端展示
//!
//! 把解析结果和生成结果整理成卡片式文本，所有自由文本字段都经过 [`crate::render`]

use crate::models::{AnalysisResult, GeneratedSet, GenerationSettings};
use crate::render::{render_optional, RenderedText};
use std::fmt;

const UNKNOWN: &str = "不明";
const EMPTY_OUTPUT: &str = "出力がありません";

/// 解析结果卡片
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisView {
    pub grade: String,
    pub unit: String,
    pub difficulty: String,
    /// 解析メモ
    pub summary: Option<RenderedText>,
    /// 服务端原始响应（格式化后的 JSON），`{:#}` 时显示
    pub raw_response: Option<String>,
}

impl AnalysisView {
    pub fn new(analysis: &AnalysisResult) -> Self {
        Self {
            grade: or_unknown(analysis.grade.as_deref()),
            unit: or_unknown(analysis.unit.as_deref()),
            difficulty: or_unknown(analysis.difficulty.as_deref()),
            summary: render_optional(analysis.summary.as_deref()),
            raw_response: analysis
                .raw_response
                .as_ref()
                .filter(|v| !v.is_null())
                .and_then(|v| serde_json::to_string_pretty(v).ok()),
        }
    }
}

impl fmt::Display for AnalysisView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "【解析結果】")?;
        writeln!(f, "学年: {}", self.grade)?;
        writeln!(f, "単元: {}", self.unit)?;
        write!(f, "難易度: {}", self.difficulty)?;
        if let Some(summary) = &self.summary {
            write!(f, "\n\n解析メモ\n{}", indent(&summary.to_plain_text()))?;
        }
        if f.alternate() {
            if let Some(raw) = &self.raw_response {
                write!(f, "\n\nサーバー応答\n{}", indent(raw))?;
            }
        }
        Ok(())
    }
}

/// 单道类题
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemBlock {
    /// `問題{n}` 或 `問題{n}：{title}`
    pub heading: String,
    pub problem: Option<RenderedText>,
    pub answer: Option<RenderedText>,
    pub explanation: Option<RenderedText>,
}

/// 生成结果的主体
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedBody {
    Problems(Vec<ProblemBlock>),
    /// 没有结构化题目时原样显示的文本
    Fallback(String),
}

/// 生成结果卡片
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedView {
    pub grade: String,
    pub unit: String,
    pub difficulty: String,
    pub notes: Option<RenderedText>,
    pub body: GeneratedBody,
}

impl GeneratedView {
    /// # 参数
    /// - `set`: 生成结果
    /// - `analysis`: 学年、単元在 metadata 缺失时的来源
    /// - `settings`: 难度在 metadata 缺失时使用所选难度
    pub fn new(
        set: &GeneratedSet,
        analysis: Option<&AnalysisResult>,
        settings: &GenerationSettings,
    ) -> Self {
        let grade = set
            .metadata_field(|m| m.grade.as_ref())
            .or_else(|| analysis.and_then(|a| a.grade.as_deref()));
        let unit = set
            .metadata_field(|m| m.unit.as_ref())
            .or_else(|| analysis.and_then(|a| a.unit.as_deref()));
        let difficulty = set
            .metadata_field(|m| m.difficulty.as_ref())
            .unwrap_or(settings.difficulty.label());
        let notes = render_optional(set.metadata.as_ref().and_then(|m| m.notes.as_deref()));

        let body = if set.items().is_empty() {
            GeneratedBody::Fallback(set.fallback_text().unwrap_or(EMPTY_OUTPUT).to_string())
        } else {
            GeneratedBody::Problems(
                set.items()
                    .iter()
                    .enumerate()
                    .map(|(idx, problem)| ProblemBlock {
                        heading: match problem.title.as_deref().filter(|t| !t.is_empty()) {
                            Some(title) => format!("問題{}：{}", idx + 1, title),
                            None => format!("問題{}", idx + 1),
                        },
                        problem: render_optional(problem.problem.as_deref()),
                        answer: render_optional(problem.answer.as_deref()),
                        explanation: render_optional(problem.explanation.as_deref()),
                    })
                    .collect(),
            )
        };

        Self {
            grade: or_unknown(grade),
            unit: or_unknown(unit),
            difficulty: difficulty.to_string(),
            notes,
            body,
        }
    }

    pub fn problems(&self) -> &[ProblemBlock] {
        match &self.body {
            GeneratedBody::Problems(blocks) => blocks,
            GeneratedBody::Fallback(_) => &[],
        }
    }
}

impl fmt::Display for GeneratedView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "【生成結果】")?;
        writeln!(f, "学年: {}", self.grade)?;
        writeln!(f, "単元: {}", self.unit)?;
        write!(f, "生成難易度: {}", self.difficulty)?;
        if let Some(notes) = &self.notes {
            write!(f, "\n\n{}", notes)?;
        }

        match &self.body {
            GeneratedBody::Fallback(text) => write!(f, "\n\n{}", text)?,
            GeneratedBody::Problems(blocks) => {
                for block in blocks {
                    write!(f, "\n\n{}", block)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for ProblemBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "■ {}", self.heading)?;
        if let Some(problem) = &self.problem {
            write!(f, "\n{}", indent(&problem.to_plain_text()))?;
        }
        if let Some(answer) = &self.answer {
            write!(f, "\n\n  解答\n{}", indent(&answer.to_plain_text()))?;
        }
        if let Some(explanation) = &self.explanation {
            write!(f, "\n\n  解説\n{}", indent(&explanation.to_plain_text()))?;
        }
        Ok(())
    }
}

fn or_unknown(value: Option<&str>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or(UNKNOWN)
        .to_string()
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("    {}", line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
