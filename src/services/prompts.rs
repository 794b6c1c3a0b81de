//! 四个阶段的固定提示词
//!
//! 面向日本歯科国家試験，提示词保持日语

/// 每次让模型选出的相似题数量
pub const SIMILAR_COUNT: usize = 10;
/// 每次生成的新题数量
pub const NEW_QUESTION_COUNT: usize = 3;

/// 各阶段的输出 token 上限（`None` 为模型默认）
pub const TRANSCRIBE_MAX_TOKENS: Option<u32> = Some(1000);
pub const CLASSIFY_MAX_TOKENS: Option<u32> = None;
pub const RETRIEVE_MAX_TOKENS: Option<u32> = Some(2000);
pub const EXPLAIN_MAX_TOKENS: Option<u32> = Some(2000);

/// 识别阶段的变体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TranscriptionVariant {
    /// 只识别题干和选项
    #[default]
    StemAndChoices,
    /// 同时识别正确答案（图片上印有答案时）
    WithAnswer,
}

impl TranscriptionVariant {
    pub fn from_include_answer(include_answer: bool) -> Self {
        if include_answer {
            TranscriptionVariant::WithAnswer
        } else {
            TranscriptionVariant::StemAndChoices
        }
    }
}

pub fn transcribe_system(variant: TranscriptionVariant) -> String {
    match variant {
        TranscriptionVariant::StemAndChoices => {
            "あなたは国家試験OCRエンジンです。画像から問題文・選択肢を正確に抽出してください。".to_string()
        }
        TranscriptionVariant::WithAnswer => {
            "あなたは国家試験OCRエンジンです。画像から問題文・選択肢・正解を正確に抽出してください。\
             正解が画像に記載されていない場合は「正解：不明」と記載してください。"
                .to_string()
        }
    }
}

pub fn classify_system() -> String {
    "この問題は歯科のどの出題領域（例：歯内療法、解剖、理工、生理など）に属しますか？1語で答えてください。"
        .to_string()
}

/// 按领域过滤后的候选列表
pub fn retrieve_filtered_system(candidates: &str) -> String {
    format!(
        "以下の国家試験問題リストの中から、次の問題に意味的に最も近い{}問を選んでください。\n\n{}",
        SIMILAR_COUNT, candidates
    )
}

/// 未过滤的候选列表：让模型自己考虑推定领域
pub fn retrieve_unfiltered_system(domain: &str, candidates: &str) -> String {
    format!(
        "以下の国家試験問題リストの中から、まず出題領域「{}」に該当する問題に絞り込み、\
         その中から次の問題に意味的に最も近い{}問を選んでください。\
         該当する問題が少ない場合は近い領域の問題から補ってください。\n\n{}",
        domain, SIMILAR_COUNT, candidates
    )
}

pub fn explain_system() -> String {
    format!(
        "あなたは歯科国家試験の教育AIです。抽出された問題と類似{}問から、正解・解説・理由を記述し、\
         さらに新作類題を{}問生成してください。各類題には正解と解説を付けてください。",
        SIMILAR_COUNT, NEW_QUESTION_COUNT
    )
}

pub fn explain_user(transcription: &str, similar_questions: &str) -> String {
    format!(
        "【未知の問題】\n{}\n\n【類似問題】\n{}",
        transcription, similar_questions
    )
}
