//! 参考题库数据结构

use serde::Serialize;

/// 领域列
pub const COL_DOMAIN: &str = "領域";
/// 题干列
pub const COL_STEM: &str = "設問";
/// 五个选项列（a–e）
pub const COL_CHOICES: [&str; 5] = ["選択肢a", "選択肢b", "選択肢c", "選択肢d", "選択肢e"];
/// 正确答案列
pub const COL_ANSWER: &str = "正解";

/// 选项标签
pub const CHOICE_LABELS: [char; 5] = ['a', 'b', 'c', 'd', 'e'];

/// 参考题库中的一道题
///
/// 身份 = 在表中的行位置（`row`，从 0 开始）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceQuestionRecord {
    pub row: usize,
    pub domain: String,
    pub stem: String,
    pub choices: [String; 5],
    pub answer: String,
}

impl ReferenceQuestionRecord {
    /// 显示用的题号（从 1 开始）
    pub fn number(&self) -> usize {
        self.row + 1
    }

    /// 格式化为提示词中的一项
    ///
    /// ```text
    /// 3. 題文
    /// a. …
    /// e. …
    /// ```
    pub fn to_prompt_item(&self, with_domain: bool) -> String {
        let mut item = if with_domain && !self.domain.is_empty() {
            format!("{}. 【{}】{}", self.number(), self.domain, self.stem)
        } else {
            format!("{}. {}", self.number(), self.stem)
        };

        for (label, choice) in CHOICE_LABELS.iter().zip(self.choices.iter()) {
            item.push_str(&format!("\n{}. {}", label, choice));
        }
        item
    }
}

/// 参考题库
///
/// 加载后只读，多次交互之间共享
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    records: Vec<ReferenceQuestionRecord>,
}

impl ReferenceTable {
    pub fn new(records: Vec<ReferenceQuestionRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ReferenceQuestionRecord] {
        &self.records
    }

    pub fn get(&self, row: usize) -> Option<&ReferenceQuestionRecord> {
        self.records.get(row)
    }
}

/// 把候选题拼成提示词中的列表，题与题之间空一行
pub fn format_candidates(candidates: &[&ReferenceQuestionRecord], with_domain: bool) -> String {
    candidates
        .iter()
        .map(|record| record.to_prompt_item(with_domain))
        .collect::<Vec<_>>()
        .join("\n\n")
}
