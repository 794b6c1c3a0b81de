use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use similar_question_gpt::render::{self, TerminalObserver};
use similar_question_gpt::services::{RetrievalPolicy, TranscriptionVariant};
use similar_question_gpt::utils::logging;
use similar_question_gpt::{AppContext, Config};

/// 国家試験の問題画像から類似問題を検索し、解説と新作類題を生成する
#[derive(Debug, Parser)]
#[command(name = "similar_question_gpt", version, about = render::TITLE)]
struct Cli {
    /// 問題画像（PNG / JPEG）
    image: PathBuf,

    /// 参照CSV（既定: sample.csv）
    #[arg(long)]
    csv: Option<PathBuf>,

    /// secrets ファイル（既定: .streamlit/secrets.toml）
    #[arg(long)]
    secrets: Option<PathBuf>,

    /// 候補の絞り込み方法
    #[arg(long, value_parser = ["filtered", "unfiltered"])]
    policy: Option<String>,

    /// 候補の上限件数
    #[arg(long)]
    limit: Option<usize>,

    /// モデル名
    #[arg(long)]
    model: Option<String>,

    /// 正解も読み取る
    #[arg(long)]
    include_answer: bool,

    /// 結果を JSON で出力する
    #[arg(long)]
    json: bool,

    /// 詳細ログ
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// 命令行参数覆盖环境变量配置
    fn apply(&self, mut config: Config) -> Result<Config> {
        if let Some(csv) = &self.csv {
            config.reference_csv = csv.clone();
        }
        if let Some(secrets) = &self.secrets {
            config.secrets_file = secrets.clone();
        }
        if let Some(model) = &self.model {
            config.llm_model_name = model.clone();
        }
        config.retrieval = match &self.policy {
            Some(kind) => RetrievalPolicy::from_parts(kind, self.limit)?,
            None => config.retrieval.with_limit(self.limit),
        };
        if self.include_answer {
            config.transcription = TranscriptionVariant::WithAnswer;
        }
        config.verbose_logging |= self.verbose;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // 加载配置
    let config = cli.apply(Config::from_env())?;

    // 初始化日志
    logging::init(config.verbose_logging)?;
    logging::log_startup(&config);

    // 初始化：凭据 + 题库，失败直接提示并退出
    let app = match AppContext::initialize(config) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("{}", render::render_fatal(&e));
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut observer = TerminalObserver::stdio(!cli.json);
    if !cli.json {
        println!("{}", render::header(&cli.image.display().to_string()));
    }

    match app.run_image(&cli.image, &mut observer).await {
        Ok(report) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("{}", render::render_fatal(&e));
            Ok(ExitCode::FAILURE)
        }
    }
}
