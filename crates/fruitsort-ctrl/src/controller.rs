//! 分拣控制器
//!
//! 封装完整的状态机上下文：状态、稳定等待计数、待处理类别、计数、
//! 分类器与发布器。每个仿真周期调用一次 [`SortController::step`]：
//!
//! 1. 读腕关节与距离传感器（不可用则保持状态，跳过本周期逻辑）
//! 2. 稳定等待计数未归零：只递减，跳过状态机
//! 3. 空闲且臂已归位：抓帧分类，合格检测立即画标注
//! 4. 评估转移函数，按序施加副作用
//! 5. 发布状态（去重）、刷新横幅、存快照

use crossbeam_channel::Receiver;
use fruitsort_sim::{ArmJoint, JointVector, SimError, SorterCell};
use fruitsort_vision::{Detection, FruitClass, FruitClassifier, RoiSpec};
use tracing::{debug, info, warn};

use crate::config::SorterConfig;
use crate::cooldown::Cooldown;
use crate::error::{ConfigError, CtrlError};
use crate::observer::{ControllerObserver, ControllerSnapshot};
use crate::state::SortState;
use crate::status::{StateMessage, StatusPublisher, status_channel};
use crate::tally::Tally;
use crate::transition::{Annotation, CycleInputs, Effect, Pose, evaluate};

/// 丢弃提示框（帧坐标，沿用原显示布局）
const DISCARD_MARKER_RECT: (i32, i32, i32, i32) = (50, 50, 100, 50);
const DISCARD_MARKER_LABEL: &str = "Discard";

/// 一个周期被跳过的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// 稳定等待计数未归零
    Cooldown,
    /// 传感器读数不可用（保持状态，下周期重试）
    SensorUnavailable,
}

/// 一个控制周期的执行报告
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// 周期结束时的状态
    pub state: SortState,
    /// 本周期是否发生状态转移
    pub transitioned: bool,
    /// 状态机逻辑被跳过的原因（`None` 表示正常评估）
    pub skipped: Option<SkipReason>,
}

/// 分拣控制器
pub struct SortController {
    config: SorterConfig,
    classifier: FruitClassifier,
    publisher: StatusPublisher,
    observer: ControllerObserver,
    state: SortState,
    cooldown: Cooldown,
    pending: Option<FruitClass>,
    last_detection: Option<Detection>,
    tally: Tally,
    cycle: u64,
}

impl SortController {
    /// 创建控制器
    ///
    /// # 返回
    /// 控制器与状态消息接收端。接收端可交给独立线程消费；丢弃
    /// 接收端后发布自动降级为丢弃并告警。
    ///
    /// # 错误
    /// 配置校验失败时返回 [`CtrlError::Config`]。
    pub fn new(config: SorterConfig) -> Result<(Self, Receiver<StateMessage>), CtrlError> {
        config.validate()?;
        let classifier =
            FruitClassifier::new(config.vision.clone()).map_err(ConfigError::Vision)?;
        let (publisher, status_rx) = status_channel(config.status_depth);

        let controller = Self {
            classifier,
            publisher,
            observer: ControllerObserver::new(),
            state: SortState::IdleScan,
            cooldown: Cooldown::new(),
            pending: None,
            last_detection: None,
            tally: Tally::new(),
            cycle: 0,
            config,
        };
        Ok((controller, status_rx))
    }

    /// 启动前的一次性初始化（下发关节速度）
    pub fn initialize<C: SorterCell>(&self, cell: &mut C) -> Result<(), CtrlError> {
        cell.set_joint_speed(self.config.motion.joint_speed)?;
        Ok(())
    }

    pub fn state(&self) -> SortState {
        self.state
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn cooldown_remaining(&self) -> u32 {
        self.cooldown.remaining()
    }

    pub fn config(&self) -> &SorterConfig {
        &self.config
    }

    /// 快照读取句柄（可克隆后交给其他线程）
    pub fn observer(&self) -> ControllerObserver {
        self.observer.clone()
    }

    /// 执行一个控制周期
    ///
    /// # 错误
    /// 仅致命错误（单元断开、非法指令）会传播；传感器瞬态不可用、
    /// 分类失败、状态队列满都按周期策略就地处理。
    pub fn step<C: SorterCell>(&mut self, cell: &mut C) -> Result<CycleReport, CtrlError> {
        self.cycle += 1;
        let previous = self.state;
        let mut skipped = None;

        match self.read_sensors(cell)? {
            None => skipped = Some(SkipReason::SensorUnavailable),
            Some((wrist, proximity)) => {
                if !self.cooldown.is_ready() {
                    self.cooldown.tick();
                    skipped = Some(SkipReason::Cooldown);
                } else {
                    let detection = self.scan_if_idle(cell, wrist)?;
                    let inputs = CycleInputs {
                        wrist,
                        proximity,
                        detection,
                    };
                    let step = evaluate(self.state, &inputs, self.pending, &self.config);
                    self.apply_effects(&step.effects, cell)?;
                    if step.next != self.state {
                        debug!(from = %self.state, to = %step.next, cycle = self.cycle, "state transition");
                    }
                    self.state = step.next;
                }
            },
        }

        self.publisher.publish(self.state, self.cycle);
        cell.set_banner(&self.tally.banner());
        self.store_snapshot();

        Ok(CycleReport {
            state: self.state,
            transitioned: previous != self.state,
            skipped,
        })
    }

    /// 读取腕关节与距离传感器
    ///
    /// 瞬态不可用或非有限读数返回 `Ok(None)`：本周期保持状态。
    fn read_sensors<C: SorterCell>(&self, cell: &mut C) -> Result<Option<(f64, f64)>, CtrlError> {
        let wrist = match cell.wrist_position() {
            Ok(value) if value.is_finite() => value,
            Ok(value) => {
                warn!(value, "non-finite wrist reading, holding state");
                return Ok(None);
            },
            Err(SimError::SensorUnavailable { sensor }) => {
                warn!(sensor, "sensor unavailable, holding state");
                return Ok(None);
            },
            Err(err) => return Err(err.into()),
        };

        let proximity = match cell.proximity() {
            Ok(value) if value.is_finite() => value,
            Ok(value) => {
                warn!(value, "non-finite proximity reading, holding state");
                return Ok(None);
            },
            Err(SimError::SensorUnavailable { sensor }) => {
                warn!(sensor, "sensor unavailable, holding state");
                return Ok(None);
            },
            Err(err) => return Err(err.into()),
        };

        Ok(Some((wrist, proximity)))
    }

    /// 空闲且臂已归位时抓帧分类
    ///
    /// 每个合格检测立即画标注（与之后的距离判定无关）。相机不可用
    /// 或分类失败按无检测处理，控制循环保持存活。
    fn scan_if_idle<C: SorterCell>(
        &mut self,
        cell: &mut C,
        wrist: f64,
    ) -> Result<Option<Detection>, CtrlError> {
        if self.state != SortState::IdleScan || wrist.abs() > self.config.motion.home_tolerance {
            return Ok(None);
        }

        let frame = match cell.camera_frame() {
            Ok(frame) => frame,
            Err(SimError::SensorUnavailable { sensor }) => {
                warn!(sensor, "camera unavailable, treating as no detection");
                return Ok(None);
            },
            Err(err) => return Err(err.into()),
        };

        let roi = self.classifier.config().roi;
        match self.classifier.classify_with(&frame, |detection| {
            draw_annotation(cell, &Annotation::Detection(*detection), &roi);
        }) {
            Ok(detection) => {
                if detection.is_some() {
                    self.last_detection = detection;
                }
                Ok(detection)
            },
            Err(err) => {
                warn!(error = %err, "classifier failed, treating as no detection");
                Ok(None)
            },
        }
    }

    /// 按序施加副作用
    fn apply_effects<C: SorterCell>(
        &mut self,
        effects: &[Effect],
        cell: &mut C,
    ) -> Result<(), CtrlError> {
        let roi = self.classifier.config().roi;
        for effect in effects {
            match effect {
                Effect::DriveArm { from_index, pose } => {
                    let targets = self.pose_targets(*pose);
                    for joint in ArmJoint::ALL.into_iter().skip(*from_index) {
                        cell.set_joint_target(joint, targets[joint])?;
                    }
                },
                Effect::Gripper(command) => cell.set_gripper(*command)?,
                Effect::EngageCooldown => {
                    self.cooldown.engage(self.config.timing.settle_cycles)
                },
                Effect::CountFruit(class) => {
                    self.pending = Some(*class);
                    self.tally.record_fruit(*class);
                    info!(class = %class, total = self.tally.total(), "fruit picked");
                },
                Effect::CountDiscard => {
                    self.tally.record_discard();
                    info!(total = self.tally.total(), "object discarded");
                },
                Effect::Annotate(annotation) => draw_annotation(cell, annotation, &roi),
                Effect::ClearOverlay => cell.clear_overlay(),
            }
        }
        Ok(())
    }

    fn pose_targets(&self, pose: Pose) -> JointVector<f64> {
        match pose {
            Pose::Home => JointVector::splat(0.0),
            Pose::Drop => JointVector::new(self.config.motion.drop_pose),
            Pose::Discard => JointVector::new(self.config.motion.discard_pose),
        }
    }

    fn store_snapshot(&self) {
        self.observer.store(ControllerSnapshot {
            state: self.state,
            cooldown_remaining: self.cooldown.remaining(),
            tally: self.tally,
            cycle: self.cycle,
            last_detection: self.last_detection,
        });
    }
}

/// 画一条标注（检测框带 ROI 偏移，丢弃框用固定布局）
fn draw_annotation<C: SorterCell>(cell: &mut C, annotation: &Annotation, roi: &RoiSpec) {
    match annotation {
        Annotation::Detection(detection) => {
            cell.clear_overlay();
            cell.draw_detection(
                (detection.bbox.x + roi.x) as i32,
                (detection.bbox.y + roi.y) as i32,
                detection.bbox.width as i32,
                detection.bbox.height as i32,
                detection.class.label(),
            );
        },
        Annotation::DiscardMarker => {
            let (x, y, w, h) = DISCARD_MARKER_RECT;
            cell.clear_overlay();
            cell.draw_detection(x, y, w, h, DISCARD_MARKER_LABEL);
        },
    }
}

#[cfg(test)]
mod tests {
    use fruitsort_sim::{CellCommand, Frame, GripperCommand, OverlayEvent, ScriptedCell};

    use super::*;

    const BACKGROUND_BGR: [u8; 3] = [30, 30, 30];
    const ORANGE_BGR: [u8; 3] = [0, 100, 230];

    fn controller() -> (SortController, Receiver<StateMessage>) {
        SortController::new(SorterConfig::default()).unwrap()
    }

    /// 空场景帧
    fn empty_frame() -> Frame {
        Frame::filled(200, 150, BACKGROUND_BGR)
    }

    /// 默认 ROI 内一个橙色矩形的帧
    fn orange_frame() -> Frame {
        let mut frame = empty_frame();
        frame.fill_rect(45, 20, 100, 90, ORANGE_BGR);
        frame
    }

    #[test]
    fn idle_cycle_publishes_waiting() {
        let (mut controller, rx) = controller();
        let mut cell = ScriptedCell::new();
        cell.frame = Some(empty_frame());

        let report = controller.step(&mut cell).unwrap();
        assert_eq!(report.state, SortState::IdleScan);
        assert!(!report.transitioned);
        assert_eq!(report.skipped, None);

        let message = rx.try_recv().unwrap();
        assert_eq!(message.name, "WAITING");
    }

    #[test]
    fn detection_starts_pick_and_counts_once() {
        let (mut controller, rx) = controller();
        let mut cell = ScriptedCell::new();
        cell.proximity = 250.0;
        cell.frame = Some(orange_frame());

        let report = controller.step(&mut cell).unwrap();
        assert_eq!(report.state, SortState::Pick);
        assert!(report.transitioned);
        assert_eq!(controller.tally().oranges, 1);
        assert_eq!(controller.cooldown_remaining(), 8);
        assert_eq!(cell.last_gripper(), Some(GripperCommand::Close));

        // 检测框标注：ROI 偏移后的帧坐标与类别标签
        assert!(cell.overlay.contains(&OverlayEvent::Detection {
            x: 45,
            y: 20,
            width: 100,
            height: 90,
            label: "Orange".to_string(),
        }));

        let message = rx.try_recv().unwrap();
        assert_eq!(message.name, "PICKING");
    }

    #[test]
    fn cooldown_gates_state_machine_for_settle_cycles() {
        let (mut controller, _rx) = controller();
        let mut cell = ScriptedCell::new();
        cell.proximity = 250.0;
        cell.frame = Some(orange_frame());

        controller.step(&mut cell).unwrap();
        assert_eq!(controller.state(), SortState::Pick);

        // 8 个稳定周期：状态不变，只递减计数
        for expected_remaining in (0..8).rev() {
            let report = controller.step(&mut cell).unwrap();
            assert_eq!(report.skipped, Some(SkipReason::Cooldown));
            assert_eq!(report.state, SortState::Pick);
            assert_eq!(controller.cooldown_remaining(), expected_remaining);
        }

        // 第一个稳定后的周期：无条件转移并下发投放位姿
        let report = controller.step(&mut cell).unwrap();
        assert_eq!(report.state, SortState::RotateToDrop);
        assert_eq!(
            cell.last_target(ArmJoint::Wrist1),
            Some(controller.config().motion.drop_pose[3])
        );
    }

    #[test]
    fn sensor_fault_holds_state_and_issues_no_commands() {
        let (mut controller, _rx) = controller();
        let mut cell = ScriptedCell::new();
        cell.proximity = 250.0;
        cell.frame = Some(orange_frame());
        cell.wrist_fault = true;

        let report = controller.step(&mut cell).unwrap();
        assert_eq!(report.skipped, Some(SkipReason::SensorUnavailable));
        assert_eq!(report.state, SortState::IdleScan);
        assert!(cell.commands.is_empty());

        // 故障恢复后正常继续
        cell.wrist_fault = false;
        let report = controller.step(&mut cell).unwrap();
        assert_eq!(report.state, SortState::Pick);
    }

    #[test]
    fn classifier_failure_is_treated_as_no_detection() {
        let (mut controller, _rx) = controller();
        let mut cell = ScriptedCell::new();
        cell.proximity = 250.0;
        // 帧比 ROI 小：分类器报错，按无检测处理 -> 丢弃分支
        cell.frame = Some(Frame::filled(64, 64, BACKGROUND_BGR));

        let report = controller.step(&mut cell).unwrap();
        assert_eq!(report.state, SortState::DiscardMove);
        assert!(cell.overlay.contains(&OverlayEvent::Detection {
            x: 50,
            y: 50,
            width: 100,
            height: 50,
            label: "Discard".to_string(),
        }));
    }

    #[test]
    fn camera_fault_is_treated_as_no_detection() {
        let (mut controller, _rx) = controller();
        let mut cell = ScriptedCell::new();
        cell.proximity = 250.0;
        // frame = None: 相机不可用，仍按丢弃分支处理
        let report = controller.step(&mut cell).unwrap();
        assert_eq!(report.state, SortState::DiscardMove);
    }

    #[test]
    fn away_from_home_recommands_home_without_scanning() {
        let (mut controller, _rx) = controller();
        let mut cell = ScriptedCell::new();
        cell.wrist = 0.4;
        cell.proximity = 250.0;
        cell.frame = Some(orange_frame());

        let report = controller.step(&mut cell).unwrap();
        assert_eq!(report.state, SortState::IdleScan);
        assert_eq!(cell.last_target(ArmJoint::Wrist1), Some(0.0));
        assert_eq!(cell.last_gripper(), Some(GripperCommand::Open));
        // 未归位不扫描：没有检测框标注
        assert!(
            !cell
                .overlay
                .iter()
                .any(|e| matches!(e, OverlayEvent::Detection { label, .. } if label == "Orange"))
        );
    }

    #[test]
    fn banner_refreshes_every_cycle_including_cooldown() {
        let (mut controller, _rx) = controller();
        let mut cell = ScriptedCell::new();
        cell.proximity = 250.0;
        cell.frame = Some(orange_frame());

        for _ in 0..4 {
            controller.step(&mut cell).unwrap();
        }
        let banners = cell
            .overlay
            .iter()
            .filter(|e| matches!(e, OverlayEvent::Banner(_)))
            .count();
        assert_eq!(banners, 4);
        assert!(cell.overlay.contains(&OverlayEvent::Banner(
            "Apple:   0    Orange:   1    Discard:   0".to_string()
        )));
    }

    #[test]
    fn observer_snapshot_tracks_cycles() {
        let (mut controller, _rx) = controller();
        let observer = controller.observer();
        let mut cell = ScriptedCell::new();
        cell.frame = Some(empty_frame());

        controller.step(&mut cell).unwrap();
        controller.step(&mut cell).unwrap();

        let snapshot = observer.snapshot();
        assert_eq!(snapshot.cycle, 2);
        assert_eq!(snapshot.state, SortState::IdleScan);
        assert_eq!(snapshot.cooldown_remaining, 0);
    }

    #[test]
    fn initialize_commands_joint_speed() {
        let (controller, _rx) = controller();
        let mut cell = ScriptedCell::new();
        controller.initialize(&mut cell).unwrap();
        assert_eq!(cell.commands, vec![CellCommand::JointSpeed(2.0)]);
    }
}
