//! 候选题筛选 - 业务能力层
//!
//! 只决定"把哪些参考题交给模型挑相似题"，相似度本身由模型判断

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::models::{ReferenceQuestionRecord, ReferenceTable, TableSchema};

/// 按领域过滤时的默认候选上限
pub const DEFAULT_FILTERED_LIMIT: usize = 20;

/// 候选题筛选策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalPolicy {
    /// 领域字段包含推定领域（子串匹配，区分大小写），按表顺序取前 `limit` 条
    Filtered { limit: usize },
    /// 不按领域过滤，整表（或前 `limit` 条）交给模型，由模型自己考虑领域
    Unfiltered { limit: Option<usize> },
}

impl Default for RetrievalPolicy {
    fn default() -> Self {
        RetrievalPolicy::Filtered {
            limit: DEFAULT_FILTERED_LIMIT,
        }
    }
}

impl RetrievalPolicy {
    /// 由策略名和可选上限构建
    pub fn from_parts(kind: &str, limit: Option<usize>) -> Result<Self, ConfigError> {
        let policy: RetrievalPolicy = kind.parse()?;
        Ok(policy.with_limit(limit))
    }

    /// 替换上限；`None` 时保持原样
    pub fn with_limit(self, limit: Option<usize>) -> Self {
        match (self, limit) {
            (RetrievalPolicy::Filtered { .. }, Some(limit)) => RetrievalPolicy::Filtered { limit },
            (RetrievalPolicy::Unfiltered { .. }, Some(limit)) => RetrievalPolicy::Unfiltered { limit: Some(limit) },
            (policy, None) => policy,
        }
    }

    pub fn filters_by_domain(&self) -> bool {
        matches!(self, RetrievalPolicy::Filtered { .. })
    }

    /// 该策略对参考题库的列要求
    pub fn table_schema(&self) -> TableSchema {
        TableSchema {
            require_domain: self.filters_by_domain(),
        }
    }

    /// 选出候选题，保持表中顺序
    pub fn select<'a>(&self, table: &'a ReferenceTable, domain: &str) -> Vec<&'a ReferenceQuestionRecord> {
        match *self {
            RetrievalPolicy::Filtered { limit } => table
                .records()
                .iter()
                .filter(|record| record.domain.contains(domain))
                .take(limit)
                .collect(),
            RetrievalPolicy::Unfiltered { limit } => table
                .records()
                .iter()
                .take(limit.unwrap_or(usize::MAX))
                .collect(),
        }
    }
}

impl FromStr for RetrievalPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "filtered" => Ok(RetrievalPolicy::default()),
            "unfiltered" => Ok(RetrievalPolicy::Unfiltered { limit: None }),
            _ => Err(ConfigError::InvalidValue {
                name: "RETRIEVAL_POLICY".to_string(),
                value: s.to_string(),
                expected: "filtered | unfiltered".to_string(),
            }),
        }
    }
}

impl fmt::Display for RetrievalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrievalPolicy::Filtered { limit } => write!(f, "filtered(上限 {})", limit),
            RetrievalPolicy::Unfiltered { limit: Some(limit) } => write!(f, "unfiltered(上限 {})", limit),
            RetrievalPolicy::Unfiltered { limit: None } => write!(f, "unfiltered(全件)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(domains: &[&str]) -> ReferenceTable {
        ReferenceTable::new(
            domains
                .iter()
                .enumerate()
                .map(|(row, domain)| ReferenceQuestionRecord {
                    row,
                    domain: domain.to_string(),
                    stem: format!("Q{}", row + 1),
                    choices: ["a", "b", "c", "d", "e"].map(String::from),
                    answer: "a".to_string(),
                })
                .collect(),
        )
    }

    fn rows(selected: &[&ReferenceQuestionRecord]) -> Vec<usize> {
        selected.iter().map(|r| r.row).collect()
    }

    #[test]
    fn test_filtered_picks_matching_row() {
        let table = table(&["Physiology", "Anatomy", "Pharmacology"]);
        let policy = RetrievalPolicy::Filtered { limit: 20 };

        assert_eq!(rows(&policy.select(&table, "Anatomy")), vec![1]);
    }

    #[test]
    fn test_filtered_is_substring_and_case_sensitive() {
        let table = table(&["口腔解剖", "解剖学", "anatomy", "生理"]);
        let policy = RetrievalPolicy::Filtered { limit: 20 };

        assert_eq!(rows(&policy.select(&table, "解剖")), vec![0, 1]);
        assert!(policy.select(&table, "Anatomy").is_empty());
    }

    #[test]
    fn test_filtered_truncates_in_table_order() {
        let domains = vec!["理工"; 60];
        let table = table(&domains);

        let selected = RetrievalPolicy::Filtered { limit: 50 }.select(&table, "理工");
        assert_eq!(selected.len(), 50);
        assert_eq!(rows(&selected), (0..50).collect::<Vec<_>>());

        let selected = RetrievalPolicy::default().select(&table, "理工");
        assert_eq!(selected.len(), DEFAULT_FILTERED_LIMIT);
    }

    #[test]
    fn test_filtered_result_is_subset_of_matches() {
        let table = table(&["歯内療法", "解剖", "歯周", "歯内", "理工", "歯内療法学"]);
        let policy = RetrievalPolicy::Filtered { limit: 2 };

        for label in ["歯内", "歯", "解剖", "存在しない", ""] {
            let selected = policy.select(&table, label);
            assert!(selected.len() <= 2);
            assert!(selected.iter().all(|r| r.domain.contains(label)));
        }
    }

    #[test]
    fn test_unfiltered_ignores_domain() {
        let table = table(&["a", "b", "c", "d"]);

        let all = RetrievalPolicy::Unfiltered { limit: None };
        assert_eq!(rows(&all.select(&table, "zzz")), vec![0, 1, 2, 3]);
        assert_eq!(rows(&all.select(&table, "a")), vec![0, 1, 2, 3]);

        let prefix = RetrievalPolicy::Unfiltered { limit: Some(2) };
        assert_eq!(rows(&prefix.select(&table, "d")), vec![0, 1]);
    }

    #[test]
    fn test_parse_policy() {
        assert_eq!(
            RetrievalPolicy::from_parts("Filtered", Some(50)).unwrap(),
            RetrievalPolicy::Filtered { limit: 50 }
        );
        assert_eq!(
            RetrievalPolicy::from_parts("unfiltered", None).unwrap(),
            RetrievalPolicy::Unfiltered { limit: None }
        );
        assert!(RetrievalPolicy::from_parts("fuzzy", None).is_err());
    }

    #[test]
    fn test_schema_follows_policy() {
        assert!(RetrievalPolicy::default().table_schema().require_domain);
        assert!(!RetrievalPolicy::Unfiltered { limit: None }.table_schema().require_domain);
    }
}
