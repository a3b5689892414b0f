//! # Fruitsort CLI
//!
//! 分拣单元仿真的命令行入口。
//!
//! ```bash
//! # 在虚拟单元上分拣一批对象（实时节拍）
//! fruitsort run --feed orange,apple,stray
//!
//! # 全速仿真固定周期数
//! fruitsort run --feed orange,apple --cycles 2000 --fast
//!
//! # 校验配置文件
//! fruitsort check-config sorter.toml
//! ```
//!
//! 日志级别由 `RUST_LOG` 控制，默认 info。

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use fruitsort_ctrl::{LoopConfig, SortController, SorterConfig, run_with_stop};
use fruitsort_sim::{CellObject, VirtualCell};
use tracing::info;

/// Fruitsort CLI - 分拣单元仿真工具
#[derive(Parser, Debug)]
#[command(name = "fruitsort")]
#[command(about = "Simulated fruit sorting cell", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 在虚拟单元上运行分拣控制循环
    Run {
        /// 配置文件路径（TOML，省略时用内置默认值）
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// 传送带对象序列（逗号分隔：orange/apple/stray）
        #[arg(short, long, default_value = "orange,apple,stray")]
        feed: String,

        /// 最大周期数（省略时运行到 Ctrl+C）
        #[arg(long)]
        cycles: Option<u64>,

        /// 全速执行，不按步长睡眠
        #[arg(long)]
        fast: bool,
    },

    /// 校验配置文件并打印生效值
    CheckConfig {
        /// 配置文件路径
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fruitsort=info".parse()?)
                .add_directive("fruitsort_ctrl=info".parse()?)
                .add_directive("fruitsort_sim=info".parse()?)
                .add_directive("fruitsort_vision=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            config,
            feed,
            cycles,
            fast,
        } => run_cell(config.as_deref(), &feed, cycles, fast),
        Commands::CheckConfig { path } => check_config(&path),
    }
}

/// 解析传送带对象序列
fn parse_feed(feed: &str) -> Result<Vec<CellObject>> {
    feed.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| match name {
            "orange" => Ok(CellObject::orange()),
            "apple" => Ok(CellObject::apple()),
            "stray" => Ok(CellObject::stray()),
            other => bail!("unknown feed object '{other}' (expected orange/apple/stray)"),
        })
        .collect()
}

fn load_config(path: Option<&Path>) -> Result<SorterConfig> {
    match path {
        Some(path) => SorterConfig::load_from_path(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(SorterConfig::default()),
    }
}

fn run_cell(
    config_path: Option<&Path>,
    feed: &str,
    cycles: Option<u64>,
    fast: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let objects = parse_feed(feed)?;

    let mut cell = VirtualCell::new();
    for object in objects {
        cell.feed_object(object);
    }
    let batch = cell.queue_len();

    let loop_config = LoopConfig {
        timestep: config.timing.timestep(),
        max_cycles: cycles,
        realtime: !fast,
    };

    let (mut controller, status_rx) =
        SortController::new(config).context("controller setup failed")?;
    let observer = controller.observer();

    // 状态消息消费线程：发布端关闭后自然退出
    let status_thread = thread::spawn(move || {
        for message in status_rx {
            info!(cycle = message.cycle, state = message.name, "state changed");
        }
    });

    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        eprintln!("\nReceived interrupt signal. Stopping...");
        stop_flag.store(true, Ordering::Release);
    })
    .context("failed to set signal handler")?;

    println!("🍊 Fruit sorting cell: {} object(s) on the conveyor", batch);
    let executed = run_with_stop(&mut controller, &mut cell, &loop_config, &stop)?;

    // 控制器销毁关闭发布端，等消费线程清空队列
    drop(controller);
    let _ = status_thread.join();

    let snapshot = observer.snapshot();
    println!();
    println!("📊 Run finished after {} cycle(s):", executed);
    println!("  Apples:    {}", snapshot.tally.apples);
    println!("  Oranges:   {}", snapshot.tally.oranges);
    println!("  Discards:  {}", snapshot.tally.discards);
    println!("  Remaining: {}", cell.queue_len());
    Ok(())
}

fn check_config(path: &Path) -> Result<()> {
    let config = SorterConfig::load_from_path(path)
        .with_context(|| format!("config rejected: {}", path.display()))?;

    println!("✅ {} is valid", path.display());
    println!("  Timestep:            {} ms", config.timing.timestep_ms);
    println!("  Settle cycles:       {}", config.timing.settle_cycles);
    println!("  Proximity threshold: {}", config.proximity_threshold);
    println!("  Joint speed:         {} rad/s", config.motion.joint_speed);
    println!("  Home tolerance:      {} rad", config.motion.home_tolerance);
    println!("  Class profiles:      {}", config.vision.profiles.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_feed_accepts_known_objects() {
        let objects = parse_feed("orange, apple,stray").unwrap();
        assert_eq!(objects.len(), 3);
        assert_eq!(objects[0], CellObject::orange());
        assert_eq!(objects[2], CellObject::stray());
    }

    #[test]
    fn parse_feed_skips_empty_entries() {
        let objects = parse_feed("orange,,apple,").unwrap();
        assert_eq!(objects.len(), 2);
    }

    #[test]
    fn parse_feed_rejects_unknown_objects() {
        assert!(parse_feed("orange,banana").is_err());
    }
}
