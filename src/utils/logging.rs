//! 日志工具模块
//!
//! 初始化 tracing 以及日志格式化的辅助函数

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 初始化日志
///
/// 输出到 stderr，stdout 只留给结果。`RUST_LOG` 优先。
pub fn init(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("similar_question_gpt={}", default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("日志初始化失败: {}", e))?;

    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 国家试题相似题检索");
    info!(
        "启动时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("🤖 模型: {} ({})", config.llm_model_name, config.llm_api_base_url);
    info!("📋 检索策略: {}", config.retrieval);
    info!("📁 参考题库: {}", config.reference_csv.display());
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
///
/// # 返回
/// 返回截断后的文本（换行替换为空格）
pub fn truncate_text(text: &str, max_len: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() > max_len {
        flat.chars().take(max_len).collect::<String>() + "..."
    } else {
        flat
    }
}
