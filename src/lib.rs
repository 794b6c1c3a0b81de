//! # Similar Question GPT
//!
//! 国家试题图片 → 文字识别 → 领域判定 → 相似题检索 → 解析与新题生成
//!
//! ## 架构设计
//!
//! 与题目提交工具保持同样的分层：
//!
//! ### ① 模型层（Models）
//! - `models/` - 参考题库、上传图片、流程输出等数据结构
//! - `models::loaders` - CSV 参考题库加载（列名规范化 + 必需列校验）
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `LlmService` - 兼容 OpenAI API 的 LLM 调用能力（含超时、重试）
//! - `RetrievalPolicy` - 候选题筛选策略（按领域过滤 / 不过滤）
//! - `prompts` - 四个阶段的固定提示词
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一次交互"的完整流程
//! - `InteractionCtx` - 日志上下文
//! - `ExamPipeline` - 识别 → 判定 → 检索 → 解析，严格顺序执行
//!
//! ### ④ 应用层（App）
//! - `app` - 初始化（凭据 + 题库）与单次运行
//! - `render` - 终端输出
//!
//! ## 模块结构

pub mod app;
pub mod config;
pub mod error;
pub mod models;
pub mod render;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::AppContext;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{PipelineReport, ReferenceQuestionRecord, ReferenceTable, UploadedImage};
pub use services::{CompletionRequest, LanguageModel, LlmService, RetrievalPolicy};
pub use workflow::{ExamPipeline, PipelineStage, StageObserver, Step};
