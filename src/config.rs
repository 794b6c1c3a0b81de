use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::services::{RetrievalPolicy, TranscriptionVariant};

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 参考题库 CSV 路径
    pub reference_csv: PathBuf,
    /// secrets 文件路径（TOML，含 OPENAI_API_KEY）
    pub secrets_file: PathBuf,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 配置 ---
    /// 直接指定的 API 密钥，优先于 secrets 文件
    pub llm_api_key: Option<String>,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    /// 失败后的最大重试次数（不含第一次）
    pub llm_max_retries: u32,
    /// 第一次重试前的等待时间，之后每次翻倍
    pub llm_retry_backoff_ms: u64,
    /// 单次请求超时
    pub llm_timeout_secs: u64,
    // --- 流程配置 ---
    pub retrieval: RetrievalPolicy,
    pub transcription: TranscriptionVariant,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reference_csv: PathBuf::from("sample.csv"),
            secrets_file: PathBuf::from(".streamlit/secrets.toml"),
            verbose_logging: false,
            llm_api_key: None,
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-2024-11-20".to_string(),
            llm_max_retries: 2,
            llm_retry_backoff_ms: 500,
            llm_timeout_secs: 120,
            retrieval: RetrievalPolicy::default(),
            transcription: TranscriptionVariant::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();

        let retrieval_kind = std::env::var("RETRIEVAL_POLICY").ok();
        let candidate_limit = std::env::var("CANDIDATE_LIMIT").ok().and_then(|v| v.parse().ok());
        let retrieval = retrieval_from_env(retrieval_kind.as_deref(), candidate_limit, default.retrieval);

        let include_answer = std::env::var("INCLUDE_ANSWER").ok().and_then(|v| v.parse().ok()).unwrap_or(false);

        Self {
            reference_csv: std::env::var("REFERENCE_CSV").map(PathBuf::from).unwrap_or(default.reference_csv),
            secrets_file: std::env::var("SECRETS_FILE").map(PathBuf::from).unwrap_or(default.secrets_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            llm_api_key: std::env::var("OPENAI_API_KEY").ok().or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            llm_max_retries: std::env::var("LLM_MAX_RETRIES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_max_retries),
            llm_retry_backoff_ms: std::env::var("LLM_RETRY_BACKOFF_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_retry_backoff_ms),
            llm_timeout_secs: std::env::var("LLM_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_timeout_secs),
            retrieval,
            transcription: TranscriptionVariant::from_include_answer(include_answer),
        }
    }

    /// 解析 API 密钥
    ///
    /// 顺序：配置里直接给的值（命令行 / 环境变量）→ secrets 文件。
    /// 空字符串视为未设置。secrets 文件不存在不算错误，只是没有密钥。
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        if let Some(key) = self.llm_api_key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            debug!("使用配置中的 API 密钥");
            return Ok(key.to_string());
        }

        if let Some(secrets) = Secrets::load(&self.secrets_file)? {
            if let Some(key) = secrets.openai_api_key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
                debug!("使用 secrets 文件中的 API 密钥: {}", self.secrets_file.display());
                return Ok(key.to_string());
            }
        }

        Err(ConfigError::MissingCredential {
            secrets_path: self.secrets_file.clone(),
        })
    }
}

/// `RETRIEVAL_POLICY` 无法识别时回退到默认策略，并给出警告
fn retrieval_from_env(kind: Option<&str>, limit: Option<usize>, default: RetrievalPolicy) -> RetrievalPolicy {
    match kind {
        Some(kind) => RetrievalPolicy::from_parts(kind, limit).unwrap_or_else(|e| {
            warn!("⚠️ RETRIEVAL_POLICY 无效，使用默认策略 {}: {}", default, e);
            default.with_limit(limit)
        }),
        None => default.with_limit(limit),
    }
}

/// secrets 文件内容
#[derive(Debug, Default, Deserialize)]
struct Secrets {
    #[serde(rename = "OPENAI_API_KEY")]
    openai_api_key: Option<String>,
}

impl Secrets {
    fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::SecretsReadFailed {
            path: path.to_path_buf(),
            source,
        })?;

        let secrets = toml::from_str(&content).map_err(|source| ConfigError::SecretsParseFailed {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Some(secrets))
    }
}
