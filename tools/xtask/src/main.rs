//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与表达式检查命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `expr-check`: 检查表达式用例文件（解析、求值、期望结果）

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Deserialize;
use tagexpr::{JsonEnv, ParserConfig, TagExpr, Value};
use tracing::{debug, info};
use walkdir::WalkDir;
use xshell::{Shell, cmd};

#[derive(Parser)]
#[command(name = "xtask", about = "tagexpr 开发辅助工具")]
struct Cli {
    /// 输出调试日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 运行 fmt、clippy、test 门禁检查
    CheckAll,

    /// 检查表达式用例文件
    ///
    /// 不带路径时检查 fixtures/expr/ 下所有 .json 文件
    ExprCheck {
        /// 用例文件或目录
        path: Option<PathBuf>,

        /// 解析器配置文件（JSON）
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = real_main(cli.command) {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn real_main(command: Command) -> anyhow::Result<()> {
    match command {
        Command::CheckAll => check_all(),
        Command::ExprCheck { path, config } => expr_check(path.as_deref(), config.as_deref()),
    }
}

fn check_all() -> anyhow::Result<()> {
    let sh = Shell::new()?;

    eprintln!("\n==> cargo fmt --all -- --check");
    cmd!(sh, "cargo fmt --all -- --check").run()?;

    eprintln!("\n==> cargo clippy --workspace --all-targets");
    cmd!(sh, "cargo clippy --workspace --all-targets").run()?;

    eprintln!("\n==> cargo test --workspace");
    cmd!(sh, "cargo test --workspace").run()?;

    Ok(())
}

//=============================================================================
// expr-check 命令实现
//=============================================================================

/// 默认用例目录（相对于 workspace root）
const DEFAULT_FIXTURES_DIR: &str = "fixtures/expr";

/// 用例文件
#[derive(Debug, Deserialize)]
struct Fixture {
    cases: Vec<FixtureCase>,
}

/// 单个用例
#[derive(Debug, Deserialize)]
struct FixtureCase {
    /// 表达式文本
    expr: String,

    /// 宿主对象；缺省时只检查解析
    #[serde(default)]
    host: Option<serde_json::Value>,

    /// 当前字段
    #[serde(default)]
    field: Option<String>,

    /// 期望的求值结果（JSON 标量）
    #[serde(default)]
    expect: Option<serde_json::Value>,

    /// 是否期望解析或求值失败
    #[serde(default)]
    fails: bool,
}

/// 检查结果汇总
#[derive(Default)]
struct CheckSummary {
    files_checked: usize,
    passed: usize,
    failures: Vec<String>,
}

fn expr_check(path: Option<&Path>, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = match config_path {
        Some(p) => {
            let text = std::fs::read_to_string(p)?;
            ParserConfig::from_json_str(&text)?
        }
        None => ParserConfig::default(),
    };
    debug!(?config, "解析器配置");

    let root = path.unwrap_or(Path::new(DEFAULT_FIXTURES_DIR));
    if !root.exists() {
        anyhow::bail!(
            "路径不存在: {}\n请在 workspace 根目录运行，或指定用例路径",
            root.display()
        );
    }

    let files = collect_fixture_files(root)?;
    if files.is_empty() {
        eprintln!("未找到用例文件（.json）");
        return Ok(());
    }

    info!("检查 {} 个用例文件", files.len());

    let mut summary = CheckSummary::default();
    for file in &files {
        check_fixture_file(file, &config, &mut summary)?;
    }

    print_summary(&summary);

    if !summary.failures.is_empty() {
        anyhow::bail!("表达式检查发现 {} 个失败用例", summary.failures.len());
    }
    Ok(())
}

/// 收集所有 .json 用例文件
fn collect_fixture_files(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

fn check_fixture_file(
    file: &Path,
    config: &ParserConfig,
    summary: &mut CheckSummary,
) -> anyhow::Result<()> {
    let file_id = file.display().to_string();
    summary.files_checked += 1;

    let text = std::fs::read_to_string(file)?;
    let fixture: Fixture = match serde_json::from_str(&text) {
        Ok(f) => f,
        Err(e) => {
            summary.failures.push(format!("{}: 用例文件格式错误 - {}", file_id, e));
            return Ok(());
        }
    };

    for (index, case) in fixture.cases.iter().enumerate() {
        debug!(file = %file_id, index, expr = %case.expr, "检查用例");
        match check_case(case, config) {
            Ok(()) => summary.passed += 1,
            Err(reason) => summary
                .failures
                .push(format!("{}#{} `{}`: {}", file_id, index, case.expr, reason)),
        }
    }
    Ok(())
}

/// 检查单个用例，失败时返回原因
fn check_case(case: &FixtureCase, config: &ParserConfig) -> Result<(), String> {
    let expr = match TagExpr::parse_with_config(&case.expr, config) {
        Ok(expr) => expr,
        Err(_) if case.fails => return Ok(()),
        Err(e) => return Err(e.to_string()),
    };

    let Some(host) = &case.host else {
        return if case.fails {
            Err("期望失败，但解析成功".to_string())
        } else {
            Ok(())
        };
    };

    let mut env = JsonEnv::new(host);
    if let Some(field) = &case.field {
        env = env.with_current(field);
    }

    let value = match expr.run(&env) {
        Ok(value) => value,
        Err(_) if case.fails => return Ok(()),
        Err(e) => return Err(e.to_string()),
    };
    if case.fails {
        return Err(format!("期望失败，但求值得到 {}", value));
    }

    match &case.expect {
        Some(expect) if Value::from_json(expect).as_ref() != Some(&value) => {
            Err(format!("期望 {}，实际 {}", expect, value))
        }
        _ => Ok(()),
    }
}

fn print_summary(summary: &CheckSummary) {
    eprintln!("─────────────────────────────────────────────────────");
    eprintln!(
        "检查完成: {} 个文件, {} 个用例通过",
        summary.files_checked, summary.passed
    );
    eprintln!();

    for failure in &summary.failures {
        eprintln!("[ERROR] {}", failure);
    }

    if summary.failures.is_empty() {
        eprintln!("✅ 检查通过，无错误");
    } else {
        eprintln!("❌ {} 个失败用例", summary.failures.len());
    }
}
