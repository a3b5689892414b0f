//! # Fruitsort 仿真单元抽象层
//!
//! 分拣工作单元（机械臂 + 传感器 + 相机 + 叠加显示）的统一接口抽象。
//!
//! 控制器只依赖 [`SorterCell`] 这一边界，本 crate 提供两个内置后端：
//! - [`VirtualCell`]：一阶运动学虚拟单元，带传送带队列与合成相机
//! - [`ScriptedCell`]：脚本化测试后端，显式注入传感器读数并记录全部指令

use std::time::Duration;

use thiserror::Error;

pub mod frame;
pub mod joint;
pub mod scripted;
pub mod virtual_cell;

pub use frame::Frame;
pub use joint::{ArmJoint, JointVector};
pub use scripted::{CellCommand, ScriptedCell};
pub use virtual_cell::{CellObject, VirtualCell};

/// 仿真层统一错误类型
#[derive(Error, Debug)]
pub enum SimError {
    /// 传感器读数当前不可用（瞬态，下一周期可重试）
    #[error("sensor '{sensor}' unavailable")]
    SensorUnavailable { sensor: &'static str },
    /// 工作单元已断开（致命）
    #[error("cell disconnected")]
    Disconnected,
    /// 指令参数非法（非有限数、速度非正等）
    #[error("invalid command: {0}")]
    InvalidCommand(String),
    /// 帧缓冲构造或尺寸错误
    #[error("frame error: {0}")]
    Frame(String),
}

/// 手爪指令
///
/// `Close` 驱动三指到抓取位置，`Open` 驱动到下限位（完全张开）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GripperCommand {
    Open,
    Close,
}

/// 机械臂执行器接口
pub trait ArmActuator {
    /// 设置单个关节的目标位置（rad）
    fn set_joint_target(&mut self, joint: ArmJoint, target: f64) -> Result<(), SimError>;

    /// 设置全部关节的运动速度（rad/s，必须为正）
    fn set_joint_speed(&mut self, speed: f64) -> Result<(), SimError>;

    /// 下发手爪指令
    fn set_gripper(&mut self, command: GripperCommand) -> Result<(), SimError>;
}

/// 工作单元传感器接口
pub trait CellSensors {
    /// 腕关节（wrist_1）位置反馈（rad）
    fn wrist_position(&mut self) -> Result<f64, SimError>;

    /// 距离传感器原始读数（数值越小对象越近）
    fn proximity(&mut self) -> Result<f64, SimError>;

    /// 抓取当前相机帧（BGRA）
    fn camera_frame(&mut self) -> Result<Frame, SimError>;
}

/// 叠加显示接口
///
/// 检测框标注画在相机画面上；统计横幅显示在仿真窗口角落。
/// 显示是纯输出通道，后端不可用时静默丢弃即可，因此接口不返回错误。
pub trait OverlayDisplay {
    /// 清除全部标注
    fn clear_overlay(&mut self);

    /// 画一个带标签的检测框，标签文本绘制在框左上方 `(x - 2, y - 20)` 处
    fn draw_detection(&mut self, x: i32, y: i32, width: i32, height: i32, label: &str);

    /// 刷新统计横幅
    fn set_banner(&mut self, text: &str);
}

/// 完整工作单元接口（控制器的泛型边界）
///
/// `advance` 推进后端内部物理时间；纯脚本后端保持默认空实现。
pub trait SorterCell: ArmActuator + CellSensors + OverlayDisplay {
    /// 推进仿真时间一个步长
    fn advance(&mut self, dt: Duration) {
        let _ = dt;
    }
}

/// 后端记录的叠加显示事件（无真实屏幕时用于检查与日志）
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayEvent {
    Clear,
    Detection {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        label: String,
    },
    Banner(String),
}
