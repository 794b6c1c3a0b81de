use std::path::PathBuf;

use async_openai::error::OpenAIError;
use thiserror::Error;

use crate::workflow::Step;

/// 应用程序错误类型
///
/// 所有错误都在这里汇总，由宿主（CLI）决定如何呈现给用户
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置 / 凭据错误
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// 参考题库错误
    #[error(transparent)]
    Table(#[from] TableError),
    /// 上传图片错误
    #[error(transparent)]
    Image(#[from] ImageError),
    /// 流程执行错误
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 未提供 API 密钥（环境变量和 secrets 文件都没有）
    #[error("OPENAI_API_KEY が設定されていません。（secrets: {}）", secrets_path.display())]
    MissingCredential { secrets_path: PathBuf },

    /// secrets 文件读取失败
    #[error("secrets ファイルを読み込めません ({}): {source}", path.display())]
    SecretsReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// secrets 文件不是合法的 TOML
    #[error("secrets ファイルの形式が不正です ({}): {source}", path.display())]
    SecretsParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// 配置值无法解析
    #[error("設定値 {name} が不正です: '{value}' ({expected})")]
    InvalidValue {
        name: String,
        value: String,
        expected: String,
    },
}

/// 参考题库（CSV）错误
#[derive(Debug, Error)]
pub enum TableError {
    /// 文件打开失败
    #[error("参照CSVを開けません ({}): {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// 解析失败（表头或某一行）
    #[error("参照CSVの解析に失敗しました (行 {line}): {source}")]
    ParseFailed {
        line: u64,
        #[source]
        source: csv::Error,
    },

    /// 缺少必需列
    #[error("CSVに必要な列がありません: {}", missing.join(", "))]
    MissingRequiredColumns { missing: Vec<String> },
}

/// 图片错误
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("画像を読み込めません ({}): {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("画像データが空です")]
    Empty,

    /// 只支持 PNG / JPEG
    #[error("対応していない画像形式です（PNG / JPEG のみ）")]
    UnsupportedFormat,
}

/// LLM 调用错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// 请求构建失败
    #[error("リクエストの構築に失敗しました: {0}")]
    RequestBuildFailed(#[source] OpenAIError),

    /// API 调用失败
    #[error("LLM API 呼び出しに失敗しました (モデル: {model}): {source}")]
    ApiCallFailed {
        model: String,
        #[source]
        source: OpenAIError,
    },

    /// 请求超时
    #[error("LLM API がタイムアウトしました (モデル: {model}, {secs}秒)")]
    Timeout { model: String, secs: u64 },

    /// 返回内容为空
    #[error("LLM の応答が空です (モデル: {model})")]
    EmptyContent { model: String },
}

impl LlmError {
    /// 传输错误、限流、服务端错误、超时、空响应可以重试；
    /// 请求本身有问题（构建失败、密钥无效等 4xx）重试也不会成功
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::RequestBuildFailed(_) => false,
            LlmError::ApiCallFailed { source, .. } => is_transient(source),
            LlmError::Timeout { .. } | LlmError::EmptyContent { .. } => true,
        }
    }
}

/// 判断 API 错误是否是暂时性的
///
/// 客户端不暴露 HTTP 状态码：5xx 的响应体只保留原文，`type` 和 `code` 都为空；
/// 4xx 会解析出 OpenAI 的错误对象
fn is_transient(error: &OpenAIError) -> bool {
    match error {
        OpenAIError::Reqwest(_) => true,
        OpenAIError::ApiError(api) => {
            let kind = api.r#type.as_deref();
            let code = api.code.as_deref();
            if kind == Some("insufficient_quota") || code == Some("insufficient_quota") {
                return false;
            }
            match (kind, code) {
                (None, None) => true,
                (Some("server_error"), _) => true,
                (_, Some("rate_limit_exceeded")) => true,
                (Some("requests" | "tokens" | "rate_limit_error"), _) => true,
                _ => false,
            }
        }
        _ => false,
    }
}

/// 流程错误：带上失败的步骤，方便用户定位
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("[{}] {source}", step.label())]
    StageFailed {
        step: Step,
        #[source]
        source: LlmError,
    },
}

impl PipelineError {
    /// 失败发生在哪一步
    pub fn step(&self) -> Step {
        match self {
            PipelineError::StageFailed { step, .. } => *step,
        }
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
