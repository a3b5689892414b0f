//! 控制循环
//!
//! 按固定步长推进仿真单元并执行控制周期。实时模式下用
//! [`spin_sleep`] 睡到步长边界，保证节拍稳定；关闭实时后全速
//! 执行，适合批量仿真与测试。

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use fruitsort_sim::SorterCell;
use spin_sleep::SpinSleeper;
use tracing::{info, warn};

use crate::controller::SortController;
use crate::error::{ConfigError, CtrlError};

/// 控制循环配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopConfig {
    /// 周期步长
    pub timestep: Duration,
    /// 最大周期数（`None` 表示只受停止标志控制）
    pub max_cycles: Option<u64>,
    /// 实时节拍开关
    pub realtime: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            timestep: Duration::from_millis(32),
            max_cycles: None,
            realtime: true,
        }
    }
}

impl LoopConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timestep.is_zero() {
            return Err(ConfigError::Invalid {
                field: "loop.timestep",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// 运行控制循环，直到达到周期上限
pub fn run<C: SorterCell>(
    controller: &mut SortController,
    cell: &mut C,
    config: &LoopConfig,
) -> Result<u64, CtrlError> {
    let stop = AtomicBool::new(false);
    run_with_stop(controller, cell, config, &stop)
}

/// 运行控制循环，直到停止标志置位或达到周期上限
///
/// 每个周期先推进单元仿真一个步长，再执行一个控制周期。
///
/// # 参数
/// - `stop`: 外部停止标志（信号处理器置位后循环在周期边界退出）
///
/// # 返回
/// 实际执行的周期数。
pub fn run_with_stop<C: SorterCell>(
    controller: &mut SortController,
    cell: &mut C,
    config: &LoopConfig,
    stop: &AtomicBool,
) -> Result<u64, CtrlError> {
    config.validate()?;
    controller.initialize(cell)?;

    let sleeper = SpinSleeper::default();
    let mut cycles: u64 = 0;

    info!(
        timestep_ms = config.timestep.as_millis() as u64,
        realtime = config.realtime,
        "control loop started"
    );

    while !stop.load(Ordering::Acquire) {
        if let Some(max) = config.max_cycles {
            if cycles >= max {
                break;
            }
        }

        let cycle_start = Instant::now();
        cell.advance(config.timestep);
        controller.step(cell)?;
        cycles += 1;

        if config.realtime {
            let elapsed = cycle_start.elapsed();
            if elapsed < config.timestep {
                sleeper.sleep(config.timestep - elapsed);
            } else {
                warn!(elapsed_us = elapsed.as_micros() as u64, "cycle overran timestep");
            }
        }
    }

    info!(cycles, state = %controller.state(), "control loop stopped");
    Ok(cycles)
}
