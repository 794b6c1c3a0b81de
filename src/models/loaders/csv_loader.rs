use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

use crate::error::TableError;
use crate::models::reference::{
    ReferenceQuestionRecord, ReferenceTable, COL_ANSWER, COL_CHOICES, COL_DOMAIN, COL_STEM,
};

/// 参考题库需要的列
///
/// 按领域过滤时必须有「領域」列；不过滤时该列可有可无
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    pub require_domain: bool,
}

impl Default for TableSchema {
    fn default() -> Self {
        Self { require_domain: true }
    }
}

impl TableSchema {
    /// 必需列，顺序即报错时的列出顺序
    pub fn required_columns(&self) -> Vec<&'static str> {
        let mut columns = Vec::with_capacity(8);
        if self.require_domain {
            columns.push(COL_DOMAIN);
        }
        columns.push(COL_STEM);
        columns.extend(COL_CHOICES);
        columns.push(COL_ANSWER);
        columns
    }
}

/// 列名规范化：去掉首尾空白、引号（含全角）和 BOM
pub fn normalize_header(raw: &str) -> String {
    raw.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, '"' | '\'' | '“' | '”' | '‘' | '’' | '\u{feff}')
    })
    .to_string()
}

/// 从 CSV 文件加载参考题库
pub fn load_reference_table(path: &Path, schema: TableSchema) -> Result<ReferenceTable, TableError> {
    info!("📁 正在加载参考题库: {}", path.display());

    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|source| TableError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;

    let table = read_records(reader, schema)?;
    info!("✓ 成功加载 {} 道参考题", table.len());
    Ok(table)
}

/// 从任意 reader 读取参考题库
pub fn read_reference_table<R: Read>(source: R, schema: TableSchema) -> Result<ReferenceTable, TableError> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(source);

    read_records(reader, schema)
}

/// 每个字段在原始表头中的位置
struct ColumnIndex {
    domain: Option<usize>,
    stem: usize,
    choices: [usize; 5],
    answer: usize,
}

fn read_records<R: Read>(mut reader: csv::Reader<R>, schema: TableSchema) -> Result<ReferenceTable, TableError> {
    let headers: Vec<String> = reader
        .headers()
        .map_err(|source| TableError::ParseFailed { line: 1, source })?
        .iter()
        .map(normalize_header)
        .collect();

    debug!("CSV 列: {:?}", headers);

    let index = resolve_columns(&headers, schema)?;

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result.map_err(|source| TableError::ParseFailed {
            line: source.position().map(|p| p.line()).unwrap_or(0),
            source,
        })?;

        // 字段不足时按空字符串处理
        let cell = |i: usize| record.get(i).unwrap_or("").trim().to_string();

        records.push(ReferenceQuestionRecord {
            row,
            domain: index.domain.map(&cell).unwrap_or_default(),
            stem: cell(index.stem),
            choices: index.choices.map(&cell),
            answer: cell(index.answer),
        });
    }

    Ok(ReferenceTable::new(records))
}

fn resolve_columns(headers: &[String], schema: TableSchema) -> Result<ColumnIndex, TableError> {
    let position = |name: &str| headers.iter().position(|h| h == name);

    let missing: Vec<String> = schema
        .required_columns()
        .into_iter()
        .filter(|name| position(*name).is_none())
        .map(str::to_string)
        .collect();

    if !missing.is_empty() {
        return Err(TableError::MissingRequiredColumns { missing });
    }

    // 上面已经确认必需列都存在
    let required = |name: &str| position(name).ok_or_else(|| TableError::MissingRequiredColumns {
        missing: vec![name.to_string()],
    });

    Ok(ColumnIndex {
        domain: position(COL_DOMAIN),
        stem: required(COL_STEM)?,
        choices: [
            required(COL_CHOICES[0])?,
            required(COL_CHOICES[1])?,
            required(COL_CHOICES[2])?,
            required(COL_CHOICES[3])?,
            required(COL_CHOICES[4])?,
        ],
        answer: required(COL_ANSWER)?,
    })
}
