//! 终端输出
//!
//! 把各阶段结果按页面原来的板块输出；忙碌提示和错误写到 stderr

use std::io::{self, Write};

use crate::error::AppError;
use crate::workflow::{StageObserver, Step};

pub const TITLE: &str = "国家試験 類似検索＋新作類題生成（GPT検索のみ）";

/// 单个步骤的输出板块
pub fn section(step: Step, output: &str) -> String {
    match step {
        Step::Transcription => format!("### 抽出された問題文\n{}\n", output),
        Step::Classification => format!("出題領域の推定: {}\n", output),
        Step::Retrieval => format!("### 類似問題（GPTが10問選出）\n{}\n", output),
        Step::Explanation => format!("### GPTによる解説と類題\n{}\n", output),
    }
}

/// 页面标题和本次上传的信息
pub fn header(image_name: &str) -> String {
    format!(
        "# {}\n\nアップロード画像: {}\n生成日時: {}\n",
        TITLE,
        image_name,
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    )
}

/// 致命错误的提示
pub fn render_fatal(error: &AppError) -> String {
    format!("⛔ {}", error)
}

/// 逐步输出到终端的观察者
///
/// `show_sections` 为 false 时只显示忙碌提示（例如 `--json` 模式）
pub struct TerminalObserver<O: Write + Send, E: Write + Send> {
    out: O,
    err: E,
    show_sections: bool,
}

impl TerminalObserver<io::Stdout, io::Stderr> {
    pub fn stdio(show_sections: bool) -> Self {
        Self::new(io::stdout(), io::stderr(), show_sections)
    }
}

impl<O: Write + Send, E: Write + Send> TerminalObserver<O, E> {
    pub fn new(out: O, err: E, show_sections: bool) -> Self {
        Self {
            out,
            err,
            show_sections,
        }
    }

    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }
}

// 终端写入失败时没有更好的去处，直接忽略
impl<O: Write + Send, E: Write + Send> StageObserver for TerminalObserver<O, E> {
    fn on_step_started(&mut self, step: Step) {
        let _ = writeln!(self.err, "⏳ {}", step.busy_message());
    }

    fn on_step_finished(&mut self, step: Step, output: &str) {
        if self.show_sections {
            let _ = writeln!(self.out, "{}", section(step, output));
            let _ = self.out.flush();
        }
    }
}
