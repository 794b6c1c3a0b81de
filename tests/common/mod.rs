#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use similar_question_gpt::error::LlmError;
use similar_question_gpt::models::{ReferenceQuestionRecord, ReferenceTable, UploadedImage};
use similar_question_gpt::services::{CompletionRequest, LanguageModel};

pub const HEADER: &str = "領域,設問,選択肢a,選択肢b,選択肢c,選択肢d,選択肢e,正解";

/// 按顺序返回预设结果，并记录每次请求
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Result<String, LlmError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// 四个阶段都成功
    pub fn happy(domain: &str) -> Self {
        Self::new(vec![
            Ok("問1 上顎第一大臼歯の根数はどれか。\na. 1 b. 2 c. 3 d. 4 e. 5".to_string()),
            Ok(domain.to_string()),
            Ok("1. 類似問題A\n2. 類似問題B".to_string()),
            Ok("正解は c。\n【類題1】…".to_string()),
        ])
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("(no more replies)".to_string()))
    }
}

pub fn empty_reply() -> LlmError {
    LlmError::EmptyContent {
        model: "scripted".to_string(),
    }
}

pub fn record(row: usize, domain: &str, stem: &str) -> ReferenceQuestionRecord {
    ReferenceQuestionRecord {
        row,
        domain: domain.to_string(),
        stem: stem.to_string(),
        choices: ["1", "2", "3", "4", "5"].map(String::from),
        answer: "c".to_string(),
    }
}

pub fn table(domains: &[&str]) -> ReferenceTable {
    ReferenceTable::new(
        domains
            .iter()
            .enumerate()
            .map(|(row, domain)| record(row, domain, &format!("設問{}", row + 1)))
            .collect(),
    )
}

pub fn png() -> UploadedImage {
    UploadedImage::from_bytes("question.png", b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR".to_vec()).unwrap()
}
