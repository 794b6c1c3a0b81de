//! LLM 服务 - 业务能力层
//!
//! 只负责"调用模型拿到文本"，不关心流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 每次请求有超时，失败后按指数退避重试

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        ChatCompletionRequestUserMessageContent, ChatCompletionRequestUserMessageContentPart,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs, ImageDetail, ImageUrl,
    },
    Client,
};
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::LlmError;

/// 用户消息内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserContent {
    Text(String),
    /// `data:<mime>;base64,...` 形式的图片
    Image { data_url: String },
}

/// 一次补全请求：系统提示词 + 用户内容 + 输出上限
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_content: UserContent,
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn text(system_prompt: impl Into<String>, user: impl Into<String>, max_tokens: Option<u32>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_content: UserContent::Text(user.into()),
            max_tokens,
        }
    }

    pub fn image(system_prompt: impl Into<String>, data_url: impl Into<String>, max_tokens: Option<u32>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_content: UserContent::Image {
                data_url: data_url.into(),
            },
            max_tokens,
        }
    }
}

/// 语言模型能力
///
/// 流程层只依赖这个 trait，测试时可以换成脚本化的实现
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// 返回去除首尾空白后的文本
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;
}

/// LLM 服务
///
/// 职责：
/// - 把 `CompletionRequest` 转成 chat completion 请求
/// - 超时与重试
/// - 不关心是第几个阶段
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
    timeout: Duration,
    max_retries: u32,
    retry_backoff: Duration,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config, api_key: &str) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(&config.llm_api_base_url);

        // 重试由 `complete` 统一负责，关闭客户端内置的限流重试
        let no_backoff = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build();

        Self {
            client: Client::with_config(openai_config).with_backoff(no_backoff),
            model_name: config.llm_model_name.clone(),
            timeout: Duration::from_secs(config.llm_timeout_secs),
            max_retries: config.llm_max_retries,
            retry_backoff: Duration::from_millis(config.llm_retry_backoff_ms),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    fn build_request(&self, request: &CompletionRequest) -> Result<CreateChatCompletionRequest, LlmError> {
        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(request.system_prompt.as_str())
            .build()
            .map_err(LlmError::RequestBuildFailed)?;

        // 构建用户消息内容（图片走 Vision API）
        let user_msg = match &request.user_content {
            UserContent::Text(text) => ChatCompletionRequestUserMessageArgs::default()
                .content(text.as_str())
                .build()
                .map_err(LlmError::RequestBuildFailed)?,
            UserContent::Image { data_url } => {
                let parts = vec![ChatCompletionRequestUserMessageContentPart::ImageUrl(
                    ChatCompletionRequestMessageContentPartImage {
                        image_url: ImageUrl {
                            url: data_url.clone(),
                            detail: Some(ImageDetail::Auto),
                        },
                    },
                )];
                ChatCompletionRequestUserMessageArgs::default()
                    .content(ChatCompletionRequestUserMessageContent::Array(parts))
                    .build()
                    .map_err(LlmError::RequestBuildFailed)?
            }
        };

        let messages = vec![
            ChatCompletionRequestMessage::System(system_msg),
            ChatCompletionRequestMessage::User(user_msg),
        ];

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(&self.model_name).messages(messages);
        if let Some(max_tokens) = request.max_tokens {
            #[allow(deprecated)]
            builder.max_tokens(max_tokens);
        }

        builder.build().map_err(LlmError::RequestBuildFailed)
    }

    /// 单次调用，不重试
    async fn send_once(&self, request: CreateChatCompletionRequest) -> Result<String, LlmError> {
        let response = tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| LlmError::Timeout {
                model: self.model_name.clone(),
                secs: self.timeout.as_secs(),
            })?
            .map_err(|source| LlmError::ApiCallFailed {
                model: self.model_name.clone(),
                source,
            })?;

        // 提取响应内容
        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| LlmError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        Ok(content)
    }
}

#[async_trait]
impl LanguageModel for LlmService {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        debug!(
            "调用 LLM API，模型: {}，系统提示词长度: {} 字符",
            self.model_name,
            request.system_prompt.chars().count()
        );

        let chat_request = self.build_request(&request)?;

        let mut attempt = 0;
        loop {
            match self.send_once(chat_request.clone()).await {
                Ok(content) => {
                    debug!("LLM API 调用成功，返回 {} 字符", content.chars().count());
                    return Ok(content);
                }
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let wait = backoff_delay(self.retry_backoff, attempt);
                    attempt += 1;
                    warn!(
                        "LLM API 调用失败: {}，{:?} 后第 {}/{} 次重试",
                        e, wait, attempt, self.max_retries
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(e) => {
                    warn!("LLM API 调用失败: {}", e);
                    return Err(e);
                }
            }
        }
    }
}

/// 第 `attempt` 次失败后的等待时间：base * 2^attempt
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}
