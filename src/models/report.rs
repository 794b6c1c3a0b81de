use serde::Serialize;

/// 一次交互的全部输出
///
/// 各阶段输出都是模型返回的原始文本（已去除首尾空白），不做结构校验
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    /// 图片文件名
    pub image_name: String,
    /// 阶段 1：识别出的题目
    pub transcription: String,
    /// 阶段 2：推定领域
    pub domain: String,
    /// 阶段 3 交给模型的候选题行号（从 0 开始）
    pub candidate_rows: Vec<usize>,
    /// 阶段 3：模型选出的相似题
    pub similar_questions: String,
    /// 阶段 4：解析与新题
    pub explanation: String,
}
