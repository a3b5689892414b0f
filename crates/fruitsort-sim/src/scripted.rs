//! 脚本化测试后端
//!
//! 传感器读数由测试代码显式注入，全部执行器指令与显示调用被记录下来，
//! 供控制器单元测试断言。字段直接公开，用法与手写 mock 一致。

use crate::{
    ArmActuator, ArmJoint, CellSensors, Frame, GripperCommand, OverlayDisplay, OverlayEvent,
    SimError, SorterCell,
};

/// 记录下来的执行器指令
#[derive(Debug, Clone, PartialEq)]
pub enum CellCommand {
    JointTarget { joint: ArmJoint, target: f64 },
    JointSpeed(f64),
    Gripper(GripperCommand),
}

/// 脚本化工作单元
#[derive(Debug, Default)]
pub struct ScriptedCell {
    /// 腕关节反馈（rad）
    pub wrist: f64,
    /// 距离传感器读数
    pub proximity: f64,
    /// 相机帧，`None` 时读取返回 [`SimError::SensorUnavailable`]
    pub frame: Option<Frame>,
    /// 置为 `true` 后腕关节读取失败（模拟传感器掉线）
    pub wrist_fault: bool,
    /// 置为 `true` 后距离传感器读取失败
    pub proximity_fault: bool,
    /// 全部执行器指令（按下发顺序）
    pub commands: Vec<CellCommand>,
    /// 全部显示事件（按调用顺序）
    pub overlay: Vec<OverlayEvent>,
}

impl ScriptedCell {
    pub fn new() -> Self {
        Self {
            proximity: 1000.0,
            ..Self::default()
        }
    }

    /// 最后一次手爪指令
    pub fn last_gripper(&self) -> Option<GripperCommand> {
        self.commands.iter().rev().find_map(|cmd| match cmd {
            CellCommand::Gripper(g) => Some(*g),
            _ => None,
        })
    }

    /// 某个关节最后一次目标位置
    pub fn last_target(&self, joint: ArmJoint) -> Option<f64> {
        self.commands.iter().rev().find_map(|cmd| match cmd {
            CellCommand::JointTarget { joint: j, target } if *j == joint => Some(*target),
            _ => None,
        })
    }

    /// 清空指令记录（保留传感器脚本）
    pub fn drain_commands(&mut self) -> Vec<CellCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl ArmActuator for ScriptedCell {
    fn set_joint_target(&mut self, joint: ArmJoint, target: f64) -> Result<(), SimError> {
        self.commands.push(CellCommand::JointTarget { joint, target });
        Ok(())
    }

    fn set_joint_speed(&mut self, speed: f64) -> Result<(), SimError> {
        self.commands.push(CellCommand::JointSpeed(speed));
        Ok(())
    }

    fn set_gripper(&mut self, command: GripperCommand) -> Result<(), SimError> {
        self.commands.push(CellCommand::Gripper(command));
        Ok(())
    }
}

impl CellSensors for ScriptedCell {
    fn wrist_position(&mut self) -> Result<f64, SimError> {
        if self.wrist_fault {
            return Err(SimError::SensorUnavailable {
                sensor: "wrist_1_joint_sensor",
            });
        }
        Ok(self.wrist)
    }

    fn proximity(&mut self) -> Result<f64, SimError> {
        if self.proximity_fault {
            return Err(SimError::SensorUnavailable {
                sensor: "distance sensor",
            });
        }
        Ok(self.proximity)
    }

    fn camera_frame(&mut self) -> Result<Frame, SimError> {
        self.frame
            .clone()
            .ok_or(SimError::SensorUnavailable { sensor: "camera" })
    }
}

impl OverlayDisplay for ScriptedCell {
    fn clear_overlay(&mut self) {
        self.overlay.push(OverlayEvent::Clear);
    }

    fn draw_detection(&mut self, x: i32, y: i32, width: i32, height: i32, label: &str) {
        self.overlay.push(OverlayEvent::Detection {
            x,
            y,
            width,
            height,
            label: label.to_string(),
        });
    }

    fn set_banner(&mut self, text: &str) {
        self.overlay.push(OverlayEvent::Banner(text.to_string()));
    }
}

impl SorterCell for ScriptedCell {}
