//! # Math Problem Client
//!
//! 例题解析 + 类题生成的客户端：把例题发给后端解析，按难度生成类题，
//! 并把结果渲染成终端文本或下载为 PDF / Word
//!
//! ## 架构设计
//!
//! ### ① HTTP 层（Clients）
//! - `clients/` - `ApiClient`，向后端四个接口发 JSON POST
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `ProblemApi` - 后端能力（可替换为测试用实现）
//! - `DownloadWriter` - 下载文件落盘能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - `Session`，四种请求的前置条件与结果落地
//! - `store/` - 显式状态机，ticket 丢弃过期响应
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量任务，管理并发
//! - `orchestrator/job_processor` - 单个任务 analyze → generate → download
//!
//! ### 展示
//! - `render/` - 数学文本渲染（纯函数）
//! - `view` - 解析卡片与生成卡片
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod render;
pub mod services;
pub mod store;
pub mod utils;
pub mod view;
pub mod workflow;

// 重新导出常用类型
pub use clients::ApiClient;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{Difficulty, DownloadFormat, GenerationSettings, Operation, ProblemJob};
pub use orchestrator::{process_job, App};
pub use render::{render, RenderedText};
pub use services::{DownloadWriter, ProblemApi};
pub use store::{Phase, Store};
pub use view::{AnalysisView, GeneratedView};
pub use workflow::{Completion, Session};
