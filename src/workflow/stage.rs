//! 交互状态机
//!
//! Idle → ImageReceived → Transcribed → DomainPredicted → SimilarSelected → Explained
//!
//! 只能前进，任何一步失败即终止

use std::fmt;

use crate::error::PipelineError;

/// 一次交互所处的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineStage {
    Idle,
    ImageReceived,
    Transcribed,
    DomainPredicted,
    SimilarSelected,
    Explained,
}

impl PipelineStage {
    /// 下一个状态；`Explained` 是终点
    pub fn next(self) -> Option<Self> {
        match self {
            PipelineStage::Idle => Some(PipelineStage::ImageReceived),
            PipelineStage::ImageReceived => Some(PipelineStage::Transcribed),
            PipelineStage::Transcribed => Some(PipelineStage::DomainPredicted),
            PipelineStage::DomainPredicted => Some(PipelineStage::SimilarSelected),
            PipelineStage::SimilarSelected => Some(PipelineStage::Explained),
            PipelineStage::Explained => None,
        }
    }
}

/// 需要调用模型的四个步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Transcription,
    Classification,
    Retrieval,
    Explanation,
}

impl Step {
    pub const ALL: [Step; 4] = [
        Step::Transcription,
        Step::Classification,
        Step::Retrieval,
        Step::Explanation,
    ];

    /// 用户可见的步骤名
    pub fn label(self) -> &'static str {
        match self {
            Step::Transcription => "問題文の読み取り",
            Step::Classification => "出題領域の推定",
            Step::Retrieval => "類似問題の抽出",
            Step::Explanation => "解説と類題の生成",
        }
    }

    /// 执行中提示
    pub fn busy_message(self) -> &'static str {
        match self {
            Step::Transcription => "GPTが問題文を読み取り中...",
            Step::Classification => "GPTが出題領域を判定中...",
            Step::Retrieval => "GPTがcsv内から類似問題10題を抽出中...",
            Step::Explanation => "GPTが解説と新作類題を生成中...",
        }
    }

    /// 该步骤开始前必须处于的状态
    pub fn requires(self) -> PipelineStage {
        match self {
            Step::Transcription => PipelineStage::ImageReceived,
            Step::Classification => PipelineStage::Transcribed,
            Step::Retrieval => PipelineStage::DomainPredicted,
            Step::Explanation => PipelineStage::SimilarSelected,
        }
    }

    /// 该步骤完成后到达的状态
    pub fn completes(self) -> PipelineStage {
        match self {
            Step::Transcription => PipelineStage::Transcribed,
            Step::Classification => PipelineStage::DomainPredicted,
            Step::Retrieval => PipelineStage::SimilarSelected,
            Step::Explanation => PipelineStage::Explained,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 进度回调
///
/// 宿主用它显示忙碌提示和逐步输出；默认实现什么都不做
pub trait StageObserver: Send {
    fn on_stage(&mut self, _stage: PipelineStage) {}
    fn on_step_started(&mut self, _step: Step) {}
    fn on_step_finished(&mut self, _step: Step, _output: &str) {}
    fn on_failed(&mut self, _error: &PipelineError) {}
}

/// 不需要进度显示时使用
#[derive(Debug, Default)]
pub struct NoopObserver;

impl StageObserver for NoopObserver {}
