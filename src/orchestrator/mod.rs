//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量任务处理器
//! - 批量加载任务（Vec<ProblemJob>）
//! - 控制并发数量（Semaphore）
//! - 输出全局统计信息和日志文件
//!
//! ### `job_processor` - 单个任务处理器
//! - 为任务创建独立的 Session
//! - analyze → generate → 汇总 → 下载
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<ProblemJob>)
//!     ↓
//! job_processor (处理单个 ProblemJob)
//!     ↓
//! workflow::Session (请求编排 + 状态)
//!     ↓
//! services (能力层：ProblemApi / DownloadWriter)
//!     ↓
//! clients (HTTP：ApiClient)
//! ```

pub mod batch_processor;
pub mod job_processor;

pub use batch_processor::{App, ProcessingStats};
pub use job_processor::{process_job, JobOutcome};
