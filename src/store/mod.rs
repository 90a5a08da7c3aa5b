//! 状态容器 - 显式状态机
//!
//! ```text
//! idle → analyzing → analyzed → generating → generated
//! ```
//!
//! 每次请求开始时领取一个 [`Ticket`]（按操作递增的代号）。完成时只有最新的
//! ticket 能修改状态或清除进行中标记，旧请求的迟到响应一律丢弃

use crate::models::{AnalysisResult, GeneratedSet, GenerationSettings, Operation};

/// 请求代号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub operation: Operation,
    pub generation: u64,
}

/// 派生出的界面阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Analyzing,
    Analyzed,
    Generating,
    Generated,
}

/// 状态迁移
#[derive(Debug, Clone)]
pub enum Action {
    SetSettings(GenerationSettings),
    AnalyzeSucceeded(Ticket, AnalysisResult),
    AnalyzeFailed(Ticket),
    GenerateSucceeded(Ticket, GeneratedSet),
    GenerateFailed(Ticket),
}

/// 迁移结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// 已有更新的同类请求，本次结果被丢弃
    Stale,
}

#[derive(Debug, Clone, Default)]
struct OpTracker {
    issued: u64,
    in_flight: Option<u64>,
}

impl OpTracker {
    fn begin(&mut self) -> u64 {
        self.issued += 1;
        self.in_flight = Some(self.issued);
        self.issued
    }

    fn is_current(&self, generation: u64) -> bool {
        self.issued == generation
    }

    fn finish(&mut self, generation: u64) {
        if self.in_flight == Some(generation) {
            self.in_flight = None;
        }
    }
}

/// 客户端全部状态
#[derive(Debug, Clone, Default)]
pub struct Store {
    settings: GenerationSettings,
    analysis: Option<AnalysisResult>,
    generated: Option<GeneratedSet>,
    analyze_op: OpTracker,
    generate_op: OpTracker,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        self.analysis.as_ref()
    }

    pub fn generated(&self) -> Option<&GeneratedSet> {
        self.generated.as_ref()
    }

    pub fn is_analyzing(&self) -> bool {
        self.analyze_op.in_flight.is_some()
    }

    pub fn is_generating(&self) -> bool {
        self.generate_op.in_flight.is_some()
    }

    /// 开始一次解析或生成请求
    ///
    /// 下载不修改状态，不需要 ticket
    pub fn begin(&mut self, operation: Operation) -> Ticket {
        let generation = match operation {
            Operation::Analyze => self.analyze_op.begin(),
            Operation::Generate => self.generate_op.begin(),
            Operation::DownloadPdf | Operation::DownloadWord => 0,
        };
        Ticket {
            operation,
            generation,
        }
    }

    /// 应用一次状态迁移
    pub fn apply(&mut self, action: Action) -> ApplyOutcome {
        match action {
            Action::SetSettings(settings) => {
                self.settings = settings;
                ApplyOutcome::Applied
            }
            Action::AnalyzeSucceeded(ticket, result) => {
                self.analyze_op.finish(ticket.generation);
                if !self.analyze_op.is_current(ticket.generation) {
                    return ApplyOutcome::Stale;
                }
                self.analysis = Some(result);
                ApplyOutcome::Applied
            }
            Action::AnalyzeFailed(ticket) => {
                self.analyze_op.finish(ticket.generation);
                self.outcome_for(self.analyze_op.is_current(ticket.generation))
            }
            Action::GenerateSucceeded(ticket, set) => {
                self.generate_op.finish(ticket.generation);
                if !self.generate_op.is_current(ticket.generation) {
                    return ApplyOutcome::Stale;
                }
                self.generated = Some(set);
                ApplyOutcome::Applied
            }
            Action::GenerateFailed(ticket) => {
                self.generate_op.finish(ticket.generation);
                self.outcome_for(self.generate_op.is_current(ticket.generation))
            }
        }
    }

    fn outcome_for(&self, current: bool) -> ApplyOutcome {
        if current {
            ApplyOutcome::Applied
        } else {
            ApplyOutcome::Stale
        }
    }

    /// 当前阶段（进行中的请求优先）
    pub fn phase(&self) -> Phase {
        if self.is_generating() {
            Phase::Generating
        } else if self.is_analyzing() {
            Phase::Analyzing
        } else if self.generated.is_some() {
            Phase::Generated
        } else if self.analysis.is_some() {
            Phase::Analyzed
        } else {
            Phase::Idle
        }
    }

    /// 解析按钮是否可用
    pub fn can_analyze(&self, problem_text: &str) -> bool {
        !self.is_analyzing() && !problem_text.trim().is_empty()
    }

    /// 生成按钮是否可用
    pub fn can_generate(&self) -> bool {
        !self.is_generating() && self.analysis.is_some()
    }

    /// 下载按钮是否显示
    pub fn can_download(&self) -> bool {
        self.generated.is_some()
    }

    pub fn analyze_label(&self) -> &'static str {
        if self.is_analyzing() {
            "解析中..."
        } else {
            "例題を解析"
        }
    }

    pub fn generate_label(&self) -> &'static str {
        if self.is_generating() {
            "生成中..."
        } else {
            "類題を生成"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis(grade: &str) -> AnalysisResult {
        AnalysisResult {
            grade: Some(grade.to_string()),
            original_problem: "x^2=1".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_phase_transitions() {
        let mut store = Store::new();
        assert_eq!(store.phase(), Phase::Idle);
        assert!(!store.can_generate());

        let ticket = store.begin(Operation::Analyze);
        assert_eq!(store.phase(), Phase::Analyzing);
        assert_eq!(store.analyze_label(), "解析中...");

        assert_eq!(
            store.apply(Action::AnalyzeSucceeded(ticket, analysis("中3"))),
            ApplyOutcome::Applied
        );
        assert_eq!(store.phase(), Phase::Analyzed);
        assert_eq!(store.analyze_label(), "例題を解析");
        assert!(store.can_generate());

        let ticket = store.begin(Operation::Generate);
        assert_eq!(store.phase(), Phase::Generating);
        assert_eq!(store.generate_label(), "生成中...");
        store.apply(Action::GenerateSucceeded(ticket, GeneratedSet::default()));
        assert_eq!(store.phase(), Phase::Generated);
        assert!(store.can_download());
    }

    #[test]
    fn test_failure_keeps_previous_result() {
        let mut store = Store::new();
        let first = store.begin(Operation::Analyze);
        store.apply(Action::AnalyzeSucceeded(first, analysis("中2")));

        let second = store.begin(Operation::Analyze);
        assert_eq!(store.apply(Action::AnalyzeFailed(second)), ApplyOutcome::Applied);
        assert_eq!(store.analysis().unwrap().grade.as_deref(), Some("中2"));
        assert!(!store.is_analyzing());
    }

    #[test]
    fn test_stale_response_discarded() {
        let mut store = Store::new();
        let older = store.begin(Operation::Analyze);
        let newer = store.begin(Operation::Analyze);

        assert_eq!(
            store.apply(Action::AnalyzeSucceeded(newer, analysis("数I"))),
            ApplyOutcome::Applied
        );
        assert_eq!(
            store.apply(Action::AnalyzeSucceeded(older, analysis("中1"))),
            ApplyOutcome::Stale
        );
        assert_eq!(store.analysis().unwrap().grade.as_deref(), Some("数I"));
    }

    #[test]
    fn test_stale_failure_does_not_clear_newer_flag() {
        let mut store = Store::new();
        let older = store.begin(Operation::Generate);
        let _newer = store.begin(Operation::Generate);

        assert_eq!(store.apply(Action::GenerateFailed(older)), ApplyOutcome::Stale);
        assert!(store.is_generating());
    }

    #[test]
    fn test_can_analyze_requires_text() {
        let store = Store::new();
        assert!(!store.can_analyze("   "));
        assert!(store.can_analyze("x+1=2"));
    }
}
