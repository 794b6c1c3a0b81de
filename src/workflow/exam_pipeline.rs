//! 一次交互的处理流程 - 流程层
//!
//! 核心职责：定义"一张题目图片"的完整处理流程
//!
//! 流程顺序（严格顺序，不可跳过、不可调换）：
//! 1. 图片 → 识别题目文字
//! 2. 题目文字 → 推定出题领域
//! 3. 领域 + 参考题库 → 模型挑出相似题
//! 4. 题目 + 相似题 → 解析与新题

use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::{LlmError, PipelineError};
use crate::models::{format_candidates, PipelineReport, ReferenceTable, UploadedImage};
use crate::services::prompts::{self, TranscriptionVariant};
use crate::services::{CompletionRequest, LanguageModel, RetrievalPolicy};
use crate::utils::logging::truncate_text;
use crate::workflow::interaction_ctx::InteractionCtx;
use crate::workflow::stage::{PipelineStage, StageObserver, Step};

/// 题目处理流程
///
/// - 编排四次模型调用
/// - 不持有任何资源，题库只读借用
/// - 只依赖 `LanguageModel` 能力
pub struct ExamPipeline<'a> {
    model: &'a dyn LanguageModel,
    table: &'a ReferenceTable,
    policy: RetrievalPolicy,
    transcription: TranscriptionVariant,
}

impl<'a> ExamPipeline<'a> {
    pub fn new(model: &'a dyn LanguageModel, table: &'a ReferenceTable, policy: RetrievalPolicy) -> Self {
        Self {
            model,
            table,
            policy,
            transcription: TranscriptionVariant::default(),
        }
    }

    pub fn with_transcription(mut self, variant: TranscriptionVariant) -> Self {
        self.transcription = variant;
        self
    }

    pub async fn run(
        &self,
        image: &UploadedImage,
        ctx: &InteractionCtx,
        observer: &mut dyn StageObserver,
    ) -> Result<PipelineReport, PipelineError> {
        let mut stage = PipelineStage::Idle;
        advance(&mut stage, PipelineStage::ImageReceived, observer);
        info!(
            "{} 📷 收到图片: {} ({}, {} 字节)",
            ctx,
            image.name(),
            image.format(),
            image.len()
        );

        // ========== 步骤 1: 识别 ==========
        let transcription = self
            .step(ctx, Step::Transcription, &mut stage, observer, self.transcribe(image))
            .await?;

        // ========== 步骤 2: 领域判定 ==========
        let domain = self
            .step(ctx, Step::Classification, &mut stage, observer, self.classify(&transcription))
            .await?;

        // ========== 步骤 3: 相似题检索 ==========
        let candidates = self.policy.select(self.table, &domain);
        let candidate_rows: Vec<usize> = candidates.iter().map(|r| r.row).collect();
        info!(
            "{} 📋 策略 {}，领域「{}」，候选 {} / {} 题",
            ctx,
            self.policy,
            domain,
            candidates.len(),
            self.table.len()
        );
        if candidates.is_empty() {
            warn!("{} ⚠️ 没有候选题，仍交给模型处理", ctx);
        }
        let candidate_text = format_candidates(&candidates, !self.policy.filters_by_domain());

        let similar_questions = self
            .step(
                ctx,
                Step::Retrieval,
                &mut stage,
                observer,
                self.retrieve(&transcription, &domain, &candidate_text),
            )
            .await?;

        let listed = count_enumerated_items(&similar_questions);
        if listed != prompts::SIMILAR_COUNT {
            debug!(
                "{} 相似题输出看起来有 {} 项（期望 {}），按原样使用",
                ctx,
                listed,
                prompts::SIMILAR_COUNT
            );
        }

        // ========== 步骤 4: 解析与新题 ==========
        let explanation = self
            .step(
                ctx,
                Step::Explanation,
                &mut stage,
                observer,
                self.explain(&transcription, &similar_questions),
            )
            .await?;

        info!("{} ✅ 处理完成", ctx);

        Ok(PipelineReport {
            image_name: image.name().to_string(),
            transcription,
            domain,
            candidate_rows,
            similar_questions,
            explanation,
        })
    }

    /// 执行一个步骤：检查状态、通知观察者、失败时打上步骤标签
    async fn step<F>(
        &self,
        ctx: &InteractionCtx,
        step: Step,
        stage: &mut PipelineStage,
        observer: &mut dyn StageObserver,
        call: F,
    ) -> Result<String, PipelineError>
    where
        F: std::future::Future<Output = Result<String, LlmError>>,
    {
        debug_assert_eq!(*stage, step.requires());

        info!("{} 🔍 {}", ctx, step.busy_message());
        observer.on_step_started(step);

        match call.await {
            Ok(output) => {
                info!("{} ✓ {}: {}", ctx, step.label(), truncate_text(&output, 60));
                observer.on_step_finished(step, &output);
                advance(stage, step.completes(), observer);
                Ok(output)
            }
            Err(source) => {
                let error = PipelineError::StageFailed { step, source };
                warn!("{} ❌ {}", ctx, error);
                observer.on_failed(&error);
                Err(error)
            }
        }
    }

    async fn transcribe(&self, image: &UploadedImage) -> Result<String, LlmError> {
        let request = CompletionRequest::image(
            prompts::transcribe_system(self.transcription),
            image.to_data_url(),
            prompts::TRANSCRIBE_MAX_TOKENS,
        );
        self.model.complete(request).await
    }

    async fn classify(&self, transcription: &str) -> Result<String, LlmError> {
        let request = CompletionRequest::text(
            prompts::classify_system(),
            transcription,
            prompts::CLASSIFY_MAX_TOKENS,
        );
        self.model.complete(request).await
    }

    async fn retrieve(&self, transcription: &str, domain: &str, candidates: &str) -> Result<String, LlmError> {
        let system = if self.policy.filters_by_domain() {
            prompts::retrieve_filtered_system(candidates)
        } else {
            prompts::retrieve_unfiltered_system(domain, candidates)
        };
        let request = CompletionRequest::text(system, transcription, prompts::RETRIEVE_MAX_TOKENS);
        self.model.complete(request).await
    }

    async fn explain(&self, transcription: &str, similar_questions: &str) -> Result<String, LlmError> {
        let request = CompletionRequest::text(
            prompts::explain_system(),
            prompts::explain_user(transcription, similar_questions),
            prompts::EXPLAIN_MAX_TOKENS,
        );
        self.model.complete(request).await
    }
}

fn advance(stage: &mut PipelineStage, to: PipelineStage, observer: &mut dyn StageObserver) {
    debug_assert_eq!(stage.next(), Some(to));
    *stage = to;
    observer.on_stage(to);
}

/// 粗略统计模型输出中以编号开头的行数（1. / 1) / １． 等）
fn count_enumerated_items(text: &str) -> usize {
    match Regex::new(r"(?m)^\s*(?:\*\*)?\s*(?:問\s*)?[0-9０-９]+\s*[\.．、)）:：]") {
        Ok(re) => re.find_iter(text).count(),
        Err(_) => 0,
    }
}
