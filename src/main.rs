use anyhow::Result;
use clap::{Parser, Subcommand};
use lian_setup::catalog;
use lian_setup::status::{sweep, StatusClassifier};
use lian_setup::{Config, PackageManager, ProgressSample, Scope};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// 批量安装常用软件
#[derive(Parser)]
#[command(name = "lian-setup")]
#[command(about = "Bulk software installer driving a winget-style package manager")]
#[command(version)]
struct Cli {
    /// 配置文件路径（默认 ~/.config/lian-setup/config.toml）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 检查目录中每个软件的安装状态
    Status,
    /// 安装指定的包；未指定时安装目录中勾选的条目
    Install {
        ids: Vec<String>,
        #[arg(long, value_enum)]
        scope: Option<Scope>,
    },
    /// 显示包元数据
    Info { id: String },
    /// 在源中搜索包
    Search { id: String },
    /// 列出已安装的包
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default()?,
    };
    let pm = PackageManager::from_config(&config);

    match cli.command {
        Commands::Status => run_status(&config, &pm).await?,
        Commands::Install { ids, scope } => {
            let code = run_install(&config, &pm, ids, scope.or(config.scope)).await?;
            if code != 0 {
                std::process::exit(code);
            }
        }
        Commands::Info { id } => {
            let info = pm.show(&id).await;
            if info.is_empty() {
                println!("{}: 无可用信息", id);
            }
            for (key, value) in info.fields() {
                println!("{:<12} {}", key, value);
            }
        }
        Commands::Search { id } => {
            if pm.search(&id).await {
                println!("{}: 可用", id);
            } else {
                println!("{}: 未找到", id);
            }
        }
        Commands::List => {
            for line in pm.list_installed().await {
                println!("{}", line);
            }
        }
    }

    Ok(())
}

async fn run_status(config: &Config, pm: &PackageManager) -> Result<()> {
    let mut records = catalog::load(&config.catalog_path)?;
    let classifier = StatusClassifier::new(pm.runner());

    let (progress_tx, printer) = progress_printer("检查");
    let summary = sweep(&classifier, &mut records, Some(&progress_tx)).await;
    drop(progress_tx);
    let _ = printer.await;

    for record in &records {
        println!(
            "{:<28} {:<32} {:<16} {}",
            record.label(),
            record.package_id,
            record.status.to_string(),
            record.installed_version
        );
    }
    println!("共 {} 个条目", summary.completed);
    Ok(())
}

async fn run_install(
    config: &Config,
    pm: &PackageManager,
    ids: Vec<String>,
    scope: Option<Scope>,
) -> Result<i32> {
    let ids = if ids.is_empty() {
        let records = catalog::load(&config.catalog_path)?;
        catalog::selected(&records)
            .into_iter()
            .map(|r| r.package_id.clone())
            .filter(|id| !id.is_empty())
            .collect()
    } else {
        ids
    };

    if ids.is_empty() {
        println!("没有选择任何软件");
        return Ok(0);
    }

    // Ctrl+C 只阻止后续条目，正在运行的安装会继续到结束
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("收到中断，当前安装结束后停止");
            on_interrupt.cancel();
        }
    });

    let (progress_tx, printer) = progress_printer("安装");
    let result = pm.install_many(&ids, scope, Some(&progress_tx), &cancel).await;
    drop(progress_tx);
    let _ = printer.await;

    match result {
        Ok(outcome) if outcome.failure_count == 0 => {
            println!("✓ 成功安装 {} 个软件", outcome.success_count);
            Ok(0)
        }
        Ok(outcome) => {
            println!(
                "已安装 {}/{}（失败: {}）",
                outcome.success_count,
                ids.len(),
                outcome.failure_count
            );
            for id in &outcome.failed {
                println!("  ✗ {}", id);
            }
            Ok(1)
        }
        Err(e) if e.is_cancelled() => {
            println!("安装已取消（{}）", e);
            Ok(130)
        }
        Err(e) => Err(e.into()),
    }
}

/// 把进度采样逐条打印到 stderr
fn progress_printer(verb: &'static str) -> (mpsc::UnboundedSender<ProgressSample>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<ProgressSample>();
    let handle = tokio::spawn(async move {
        while let Some(sample) = rx.recv().await {
            eprintln!(
                "[{:>3}%] {}/{} {} {}",
                sample.percent(),
                sample.completed,
                sample.total,
                verb,
                sample.label
            );
        }
    });
    (tx, handle)
}
