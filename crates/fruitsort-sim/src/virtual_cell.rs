//! 虚拟工作单元
//!
//! 内置的一阶运动学后端：关节以命令速度向目标位置逼近，传送带队列
//! 依次把对象送到距离传感器前，相机把队首对象渲染为纯色矩形。
//! 没有真实屏幕，叠加显示调用被记录下来供检查。

use std::collections::VecDeque;
use std::time::Duration;

use tracing::trace;

use crate::{
    ArmActuator, ArmJoint, CellSensors, Frame, GripperCommand, JointVector, OverlayDisplay,
    OverlayEvent, SimError, SorterCell,
};

/// 相机帧尺寸（px）
pub const FRAME_WIDTH: usize = 200;
pub const FRAME_HEIGHT: usize = 150;

/// 对象在帧内的渲染位置（帧坐标，位于分类 ROI 内）
const OBJECT_X: usize = 60;
const OBJECT_Y: usize = 25;

/// 距离传感器读数：对象到位 / 无对象
const PROXIMITY_NEAR: f64 = 250.0;
const PROXIMITY_FAR: f64 = 1000.0;

/// 手爪指位置：张开（下限位）/ 闭合
const GRIPPER_OPEN_POSITION: f64 = 0.0;
const GRIPPER_CLOSED_POSITION: f64 = 0.52;

/// 传送带上的一个对象
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellObject {
    /// 渲染颜色（B, G, R）
    pub color_bgr: [u8; 3],
    /// 渲染宽度（px）
    pub width_px: usize,
    /// 渲染高度（px）
    pub height_px: usize,
}

impl CellObject {
    /// 橙子（色相约 13，落在橙色分类区间内）
    pub fn orange() -> Self {
        Self {
            color_bgr: [0, 100, 230],
            width_px: 100,
            height_px: 90,
        }
    }

    /// 青苹果（色相约 60，落在绿色分类区间内）
    pub fn apple() -> Self {
        Self {
            color_bgr: [60, 180, 60],
            width_px: 100,
            height_px: 90,
        }
    }

    /// 无法分类的杂物（蓝色，两个色相区间都不命中）
    pub fn stray() -> Self {
        Self {
            color_bgr: [200, 50, 50],
            width_px: 100,
            height_px: 90,
        }
    }
}

/// 虚拟工作单元
#[derive(Debug)]
pub struct VirtualCell {
    positions: JointVector<f64>,
    targets: JointVector<f64>,
    speed: f64,
    gripper_position: f64,
    conveyor: VecDeque<CellObject>,
    carried: Option<CellObject>,
    overlay: Vec<OverlayEvent>,
    banner: Option<String>,
}

impl VirtualCell {
    /// 创建空单元：关节归零、手爪张开、传送带为空
    ///
    /// 关节速度初始为 0，控制器启动时需要先下发速度指令。
    pub fn new() -> Self {
        Self {
            positions: JointVector::splat(0.0),
            targets: JointVector::splat(0.0),
            speed: 0.0,
            gripper_position: GRIPPER_OPEN_POSITION,
            conveyor: VecDeque::new(),
            carried: None,
            overlay: Vec::new(),
            banner: None,
        }
    }

    /// 往传送带末尾加一个对象
    pub fn feed_object(&mut self, object: CellObject) {
        self.conveyor.push_back(object);
    }

    /// 传送带上待处理的对象数
    pub fn queue_len(&self) -> usize {
        self.conveyor.len()
    }

    /// 手爪当前抓着的对象
    pub fn carried(&self) -> Option<&CellObject> {
        self.carried.as_ref()
    }

    /// 关节当前位置（检查用）
    pub fn joint_position(&self, joint: ArmJoint) -> f64 {
        self.positions[joint]
    }

    /// 手爪指当前位置（检查用）
    pub fn gripper_position(&self) -> f64 {
        self.gripper_position
    }

    /// 全部叠加显示事件（按调用顺序）
    pub fn overlay_events(&self) -> &[OverlayEvent] {
        &self.overlay
    }

    /// 最近一次横幅文本
    pub fn last_banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }
}

impl Default for VirtualCell {
    fn default() -> Self {
        Self::new()
    }
}

impl ArmActuator for VirtualCell {
    fn set_joint_target(&mut self, joint: ArmJoint, target: f64) -> Result<(), SimError> {
        if !target.is_finite() {
            return Err(SimError::InvalidCommand(format!(
                "non-finite target {} for {}",
                target, joint
            )));
        }
        self.targets[joint] = target;
        Ok(())
    }

    fn set_joint_speed(&mut self, speed: f64) -> Result<(), SimError> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(SimError::InvalidCommand(format!(
                "joint speed must be positive, got {}",
                speed
            )));
        }
        self.speed = speed;
        Ok(())
    }

    fn set_gripper(&mut self, command: GripperCommand) -> Result<(), SimError> {
        match command {
            GripperCommand::Close => {
                self.gripper_position = GRIPPER_CLOSED_POSITION;
                // 闭合即抓走传感器前的队首对象
                if self.carried.is_none() {
                    self.carried = self.conveyor.pop_front();
                    if let Some(obj) = &self.carried {
                        trace!(color = ?obj.color_bgr, "gripper grabbed object");
                    }
                }
            },
            GripperCommand::Open => {
                self.gripper_position = GRIPPER_OPEN_POSITION;
                if let Some(obj) = self.carried.take() {
                    trace!(color = ?obj.color_bgr, "gripper released object");
                }
            },
        }
        Ok(())
    }
}

impl CellSensors for VirtualCell {
    fn wrist_position(&mut self) -> Result<f64, SimError> {
        Ok(self.positions[ArmJoint::Wrist1])
    }

    fn proximity(&mut self) -> Result<f64, SimError> {
        if self.conveyor.front().is_some() {
            Ok(PROXIMITY_NEAR)
        } else {
            Ok(PROXIMITY_FAR)
        }
    }

    fn camera_frame(&mut self) -> Result<Frame, SimError> {
        let mut frame = Frame::filled(FRAME_WIDTH, FRAME_HEIGHT, [30, 30, 30]);
        if let Some(obj) = self.conveyor.front() {
            frame.fill_rect(OBJECT_X, OBJECT_Y, obj.width_px, obj.height_px, obj.color_bgr);
        }
        Ok(frame)
    }
}

impl OverlayDisplay for VirtualCell {
    fn clear_overlay(&mut self) {
        self.overlay.push(OverlayEvent::Clear);
    }

    fn draw_detection(&mut self, x: i32, y: i32, width: i32, height: i32, label: &str) {
        trace!(x, y, width, height, label, "overlay detection");
        self.overlay.push(OverlayEvent::Detection {
            x,
            y,
            width,
            height,
            label: label.to_string(),
        });
    }

    fn set_banner(&mut self, text: &str) {
        self.banner = Some(text.to_string());
        self.overlay.push(OverlayEvent::Banner(text.to_string()));
    }
}

impl SorterCell for VirtualCell {
    fn advance(&mut self, dt: Duration) {
        let max_step = self.speed * dt.as_secs_f64();
        if max_step <= 0.0 {
            return;
        }
        for joint in ArmJoint::ALL {
            let delta = self.targets[joint] - self.positions[joint];
            if delta.abs() <= max_step {
                self.positions[joint] = self.targets[joint];
            } else {
                self.positions[joint] += max_step.copysign(delta);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_clamps_motion_to_speed() {
        let mut cell = VirtualCell::new();
        cell.set_joint_speed(2.0).unwrap();
        cell.set_joint_target(ArmJoint::Wrist1, -2.363176).unwrap();
        cell.advance(Duration::from_millis(32));
        let pos = cell.joint_position(ArmJoint::Wrist1);
        assert!((pos - (-0.064)).abs() < 1e-9, "pos = {pos}");
    }

    #[test]
    fn advance_stops_exactly_on_target() {
        let mut cell = VirtualCell::new();
        cell.set_joint_speed(2.0).unwrap();
        cell.set_joint_target(ArmJoint::Elbow, 0.05).unwrap();
        cell.advance(Duration::from_millis(32));
        assert_eq!(cell.joint_position(ArmJoint::Elbow), 0.05);
    }

    #[test]
    fn zero_speed_does_not_move() {
        let mut cell = VirtualCell::new();
        cell.set_joint_target(ArmJoint::Elbow, 1.0).unwrap();
        cell.advance(Duration::from_millis(32));
        assert_eq!(cell.joint_position(ArmJoint::Elbow), 0.0);
    }

    #[test]
    fn rejects_bad_commands() {
        let mut cell = VirtualCell::new();
        assert!(cell.set_joint_speed(0.0).is_err());
        assert!(cell.set_joint_speed(f64::NAN).is_err());
        assert!(cell.set_joint_target(ArmJoint::Elbow, f64::INFINITY).is_err());
    }

    #[test]
    fn close_grabs_head_object() {
        let mut cell = VirtualCell::new();
        cell.feed_object(CellObject::orange());
        cell.feed_object(CellObject::apple());
        assert_eq!(cell.proximity().unwrap(), PROXIMITY_NEAR);

        cell.set_gripper(GripperCommand::Close).unwrap();
        assert!(cell.carried().is_some());
        assert_eq!(cell.queue_len(), 1);

        cell.set_gripper(GripperCommand::Open).unwrap();
        assert!(cell.carried().is_none());
    }

    #[test]
    fn proximity_far_when_conveyor_empty() {
        let mut cell = VirtualCell::new();
        assert_eq!(cell.proximity().unwrap(), PROXIMITY_FAR);
    }

    #[test]
    fn camera_renders_head_object_color() {
        let mut cell = VirtualCell::new();
        cell.feed_object(CellObject::orange());
        let frame = cell.camera_frame().unwrap();
        let px = frame.pixel(OBJECT_X + 10, OBJECT_Y + 10).unwrap();
        assert_eq!([px[0], px[1], px[2]], CellObject::orange().color_bgr);
        // 对象矩形之外是背景色
        let bg = frame.pixel(5, 5).unwrap();
        assert_eq!([bg[0], bg[1], bg[2]], [30, 30, 30]);
    }
}
