//! 应用层
//!
//! 初始化（凭据 + 参考题库）只做一次，结果以类型化的 `AppResult` 返回，
//! 由宿主决定如何呈现失败；之后每次上传图片跑一次流程。

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::error::AppResult;
use crate::models::{load_reference_table, PipelineReport, ReferenceTable, UploadedImage};
use crate::services::{LanguageModel, LlmService};
use crate::workflow::{ExamPipeline, InteractionCtx, StageObserver};

/// 初始化完成后的应用上下文
///
/// 题库加载后只读，可以在多次交互之间共享
pub struct AppContext {
    config: Config,
    api_key: String,
    table: Arc<ReferenceTable>,
}

impl AppContext {
    /// 初始化应用
    ///
    /// 先检查凭据，再加载题库；任何一步失败都不会发出模型调用
    pub fn initialize(config: Config) -> AppResult<Self> {
        let api_key = config.resolve_api_key()?;
        info!("✓ API 密钥已就绪");

        let table = load_reference_table(&config.reference_csv, config.retrieval.table_schema())?;

        Ok(Self {
            config,
            api_key,
            table: Arc::new(table),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn table(&self) -> Arc<ReferenceTable> {
        Arc::clone(&self.table)
    }

    /// 按配置创建 LLM 服务
    pub fn llm_service(&self) -> LlmService {
        LlmService::new(&self.config, &self.api_key)
    }

    /// 用给定的模型处理一张图片
    pub async fn run_interaction(
        &self,
        model: &dyn LanguageModel,
        image: &UploadedImage,
        observer: &mut dyn StageObserver,
    ) -> AppResult<PipelineReport> {
        let ctx = InteractionCtx::new(image.name());

        let pipeline = ExamPipeline::new(model, &self.table, self.config.retrieval)
            .with_transcription(self.config.transcription);

        Ok(pipeline.run(image, &ctx, observer).await?)
    }

    /// 读取图片文件并用配置中的模型处理
    pub async fn run_image(&self, path: &Path, observer: &mut dyn StageObserver) -> AppResult<PipelineReport> {
        let image = UploadedImage::from_path(path).await?;
        let service = self.llm_service();
        info!("🤖 使用模型: {}", service.model_name());

        self.run_interaction(&service, &image, observer).await
    }
}
