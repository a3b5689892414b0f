//! # Fruitsort 控制层
//!
//! 分拣单元的完整控制逻辑：八状态的分拣状态机、按固定步长执行的
//! 周期控制器与实时控制循环。
//!
//! 分层依赖自下而上：[`fruitsort_sim`] 提供单元接口与仿真实现，
//! [`fruitsort_vision`] 提供颜色分类，本 crate 将两者装配成
//! 可运行的控制器。
//!
//! ## 状态机
//!
//! ```text
//! IdleScan --检测到水果--> Pick --> RotateToDrop --> Drop --> RotateBack --> IdleScan
//!     |
//!     +----未识别对象--> DiscardMove --> DiscardRelease --> DiscardReturn --> IdleScan
//! ```
//!
//! 转移函数本身是纯函数（见 [`transition::evaluate`]），副作用由
//! [`SortController`] 在每个周期统一施加，便于单独测试状态表。
//!
//! ## 使用
//!
//! ```no_run
//! use fruitsort_ctrl::{LoopConfig, SortController, SorterConfig, run};
//! use fruitsort_sim::VirtualCell;
//!
//! # fn main() -> Result<(), fruitsort_ctrl::CtrlError> {
//! let (mut controller, status_rx) = SortController::new(SorterConfig::default())?;
//! std::thread::spawn(move || {
//!     for message in status_rx {
//!         println!("{} -> {}", message.cycle, message.name);
//!     }
//! });
//!
//! let mut cell = VirtualCell::new();
//! run(&mut controller, &mut cell, &LoopConfig::default())?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod controller;
pub mod cooldown;
pub mod error;
pub mod observer;
pub mod runner;
pub mod state;
pub mod status;
pub mod tally;
pub mod transition;

pub use config::{MotionConfig, SorterConfig, TimingConfig};
pub use controller::{CycleReport, SkipReason, SortController};
pub use cooldown::Cooldown;
pub use error::{ConfigError, CtrlError};
pub use observer::{ControllerObserver, ControllerSnapshot};
pub use runner::{LoopConfig, run, run_with_stop};
pub use state::{SortState, state_name};
pub use status::{StateMessage, StatusPublisher, status_channel};
pub use tally::Tally;
pub use transition::{Annotation, CycleInputs, Effect, Pose, Step, evaluate};
