use super::{Difficulty, GenerationSettings};
use serde::{Deserialize, Serialize};

/// 下载格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadFormat {
    Pdf,
    Word,
}

impl DownloadFormat {
    /// 保存时的固定文件名
    pub fn file_name(self) -> &'static str {
        match self {
            DownloadFormat::Pdf => "math_problems.pdf",
            DownloadFormat::Word => "math_problems.docx",
        }
    }

    pub fn operation(self) -> super::Operation {
        match self {
            DownloadFormat::Pdf => super::Operation::DownloadPdf,
            DownloadFormat::Word => super::Operation::DownloadWord,
        }
    }
}

impl std::fmt::Display for DownloadFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DownloadFormat::Pdf => write!(f, "PDF"),
            DownloadFormat::Word => write!(f, "Word"),
        }
    }
}

/// 批量处理中的一个任务（对应一个 TOML 文件）
///
/// ```toml
/// name = "二次方程式"
/// problem_text = "x^2+x+1=0 を解け"
/// difficulty = "Level 2 (標準)"
/// count = 3
/// solution_hint = "平方完成で"
/// formats = ["pdf", "word"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemJob {
    pub name: String,
    pub problem_text: String,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub solution_hint: Option<String>,
    #[serde(default = "default_formats")]
    pub formats: Vec<DownloadFormat>,
    #[serde(skip_serializing, skip_deserializing)]
    pub file_path: Option<String>,
}

fn default_formats() -> Vec<DownloadFormat> {
    vec![DownloadFormat::Pdf]
}

impl ProblemJob {
    /// 任务的生成参数，未指定的项使用默认值
    pub fn settings(&self) -> GenerationSettings {
        let default = GenerationSettings::default();
        GenerationSettings {
            difficulty: self.difficulty.unwrap_or(default.difficulty),
            count: self.count.unwrap_or(default.count),
            solution_hint: self.solution_hint.clone().unwrap_or_default(),
        }
    }

    /// 用于输出子目录的安全名称
    pub fn dir_name(&self) -> String {
        let cleaned: String = self
            .name
            .trim()
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect();
        if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
            "job".to_string()
        } else {
            cleaned
        }
    }

    pub fn with_file_path(mut self, file_path: String) -> Self {
        self.file_path = Some(file_path);
        self
    }
}
