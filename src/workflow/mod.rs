pub mod exam_pipeline;
pub mod interaction_ctx;
pub mod stage;

pub use exam_pipeline::ExamPipeline;
pub use interaction_ctx::InteractionCtx;
pub use stage::{NoopObserver, PipelineStage, StageObserver, Step};
