use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use math_problem_client::{
    logger, render, AnalysisView, App, Completion, Config, Difficulty, DownloadFormat,
    GeneratedView, GenerationSettings, Operation, Session,
};
use std::io::Read;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "math-problem-client")]
#[command(version)]
#[command(about = "例題を解析し、類題を生成するクライアント")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 配置文件（TOML），环境变量优先于文件
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 显示详细日志（含服务端原始响应）
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Pdf,
    Word,
}

impl From<FormatArg> for DownloadFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Pdf => DownloadFormat::Pdf,
            FormatArg::Word => DownloadFormat::Word,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// 解析例题并显示解析结果
    Analyze {
        /// 例题文本（省略时读取 --file 或 stdin）
        problem: Option<String>,

        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// 解析例题后生成类题
    Generate {
        /// 例题文本（省略时读取 --file 或 stdin）
        problem: Option<String>,

        #[arg(short, long)]
        file: Option<PathBuf>,

        /// 难度：1-5、L2、"Level 2 (標準)"、標準 等
        #[arg(short, long, default_value = "3")]
        difficulty: Difficulty,

        /// 生成数量
        #[arg(short = 'n', long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..=10))]
        count: u32,

        /// 解法提示
        #[arg(long, default_value = "")]
        hint: String,

        /// 生成后下载的格式（可重复）
        #[arg(long = "download", value_enum)]
        downloads: Vec<FormatArg>,

        /// 下载目录（覆盖配置）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 渲染数学文本（省略时读取 stdin）
    Render { text: Option<String> },

    /// 批量处理任务目录中的 TOML 文件
    Batch {
        /// 任务目录（覆盖配置）
        #[arg(long)]
        jobs: Option<String>,

        /// 最大并发数（覆盖配置）
        #[arg(long)]
        concurrency: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    config.verbose_logging |= cli.verbose;
    logger::init(config.verbose_logging);

    match cli.command {
        Commands::Analyze { problem, file } => {
            let text = read_input(problem, file)?;
            let session = Session::from_config(&config)?;
            let analysis = session
                .analyze(&text)
                .await
                .map_err(|e| anyhow!(e.alert_message(Operation::Analyze)))?;
            if let Completion::Applied(analysis) = analysis {
                print_analysis(&AnalysisView::new(&analysis), config.verbose_logging);
            }
        }
        Commands::Generate {
            problem,
            file,
            difficulty,
            count,
            hint,
            downloads,
            output,
        } => {
            let text = read_input(problem, file)?;
            if let Some(output) = output {
                config.output_dir = output.to_string_lossy().to_string();
            }
            let session = Session::from_config(&config)?;
            let settings = GenerationSettings {
                difficulty,
                count,
                solution_hint: hint,
            };
            session.set_settings(settings.clone());

            let analysis = session
                .analyze(&text)
                .await
                .map_err(|e| anyhow!(e.alert_message(Operation::Analyze)))?
                .applied()
                .context("解析结果被丢弃")?;
            print_analysis(&AnalysisView::new(&analysis), config.verbose_logging);
            println!();

            let set = session
                .generate(&settings)
                .await
                .map_err(|e| anyhow!(e.alert_message(Operation::Generate)))?
                .applied()
                .context("生成结果被丢弃")?;
            println!("{}", GeneratedView::new(&set, Some(&analysis), &settings));

            for format in downloads.into_iter().map(DownloadFormat::from) {
                match session.download(format).await {
                    Ok(Some(path)) => info!("✓ {} を保存しました: {}", format, path.display()),
                    Ok(None) => {}
                    Err(e) => eprintln!("{}", e.alert_message(format.operation())),
                }
            }
        }
        Commands::Render { text } => {
            let raw = match text {
                Some(text) => text,
                None => read_stdin()?,
            };
            if let Some(rendered) = render(&raw) {
                println!("{}", rendered);
            }
        }
        Commands::Batch { jobs, concurrency } => {
            if let Some(jobs) = jobs {
                config.jobs_folder = jobs;
            }
            if let Some(concurrency) = concurrency {
                config.max_concurrent_jobs = concurrency;
            }
            let config = config.validated()?;
            let stats = App::initialize(config)?.run().await?;
            if stats.failed > 0 {
                return Err(anyhow!("{} 个任务处理失败", stats.failed));
            }
        }
    }

    Ok(())
}

fn print_analysis(view: &AnalysisView, verbose: bool) {
    if verbose {
        println!("{:#}", view);
    } else {
        println!("{}", view);
    }
}

/// 例题输入：参数 → 文件 → stdin
fn read_input(problem: Option<String>, file: Option<PathBuf>) -> Result<String> {
    if let Some(problem) = problem {
        return Ok(problem);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(&path)
            .with_context(|| format!("无法读取文件: {}", path.display()));
    }
    read_stdin()
}

fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("无法读取标准输入")?;
    Ok(buf)
}
