//! 状态机转移函数
//!
//! [`evaluate`] 是纯函数：`(状态, 周期输入) -> (下一状态, 副作用列表)`，
//! 不做任何 I/O。副作用由控制器按序施加到工作单元上，这样整张状态
//! 转移表可以脱离硬件直接测试。
//!
//! 每个稳定周期恰好评估一次；稳定等待计数未归零的周期不会调用本函数。

use fruitsort_sim::GripperCommand;
use fruitsort_vision::{Detection, FruitClass};
use smallvec::SmallVec;

use crate::config::SorterConfig;
use crate::state::SortState;

/// 目标位姿
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pose {
    /// 全零位（空闲扫描位）
    Home,
    /// 投放位
    Drop,
    /// 丢弃位
    Discard,
}

/// 标注指令
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Annotation {
    /// 分类检测框（ROI 坐标，显示时加 ROI 偏移）
    Detection(Detection),
    /// 丢弃提示框（固定位置）
    DiscardMarker,
}

/// 状态机单步产生的副作用描述
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// 从 `from_index` 号关节起（含）驱动到目标位姿
    DriveArm { from_index: usize, pose: Pose },
    /// 手爪指令
    Gripper(GripperCommand),
    /// 装载稳定等待计数
    EngageCooldown,
    /// 记录一次水果抓取（同时确定后续驱动的起始关节）
    CountFruit(FruitClass),
    /// 记录一次丢弃
    CountDiscard,
    /// 画标注
    Annotate(Annotation),
    /// 清除标注
    ClearOverlay,
}

/// 一次状态机评估的输入
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleInputs {
    /// 腕关节（wrist_1）位置反馈（rad）
    pub wrist: f64,
    /// 距离传感器读数
    pub proximity: f64,
    /// 本周期的分类结果（仅空闲扫描且臂已归位时填写）
    pub detection: Option<Detection>,
}

/// 评估结果
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub next: SortState,
    pub effects: SmallVec<[Effect; 4]>,
}

/// 评估一个状态机周期
///
/// # 参数
/// - `state`: 当前状态
/// - `inputs`: 本周期传感器输入与分类结果
/// - `pending`: 最近一次分类确定的类别（抓取与投放动作从
///   `class.index()` 号关节起驱动）
/// - `config`: 阈值与位姿配置
///
/// # 返回
/// 下一状态与按序施加的副作用。无转移条件满足时返回原状态、空副作用。
pub fn evaluate(
    state: SortState,
    inputs: &CycleInputs,
    pending: Option<FruitClass>,
    config: &SorterConfig,
) -> Step {
    let motion = &config.motion;
    let mut effects: SmallVec<[Effect; 4]> = SmallVec::new();

    let next = match state {
        SortState::IdleScan => {
            if inputs.wrist.abs() > motion.home_tolerance {
                // 臂未归位：回零并张开手爪，本周期不扫描
                effects.push(Effect::DriveArm {
                    from_index: 0,
                    pose: Pose::Home,
                });
                effects.push(Effect::Gripper(GripperCommand::Open));
                SortState::IdleScan
            } else if inputs.proximity < config.proximity_threshold {
                if let Some(detection) = inputs.detection {
                    effects.push(Effect::CountFruit(detection.class));
                    effects.push(Effect::EngageCooldown);
                    effects.push(Effect::Gripper(GripperCommand::Close));
                    SortState::Pick
                } else {
                    // 对象到位但无法分类：清扫到丢弃槽
                    effects.push(Effect::EngageCooldown);
                    effects.push(Effect::Annotate(Annotation::DiscardMarker));
                    effects.push(Effect::Gripper(GripperCommand::Close));
                    SortState::DiscardMove
                }
            } else {
                SortState::IdleScan
            }
        },

        // 无传感条件：首个稳定周期即转移
        SortState::Pick => {
            effects.push(Effect::DriveArm {
                from_index: pending.map_or(0, FruitClass::index),
                pose: Pose::Drop,
            });
            SortState::RotateToDrop
        },

        SortState::RotateToDrop => {
            if inputs.wrist < motion.drop_feedback_threshold {
                effects.push(Effect::EngageCooldown);
                effects.push(Effect::ClearOverlay);
                effects.push(Effect::Gripper(GripperCommand::Open));
                SortState::Drop
            } else {
                SortState::RotateToDrop
            }
        },

        SortState::Drop => {
            effects.push(Effect::DriveArm {
                from_index: pending.map_or(0, FruitClass::index),
                pose: Pose::Home,
            });
            SortState::RotateBack
        },

        SortState::RotateBack => {
            if inputs.wrist > motion.return_threshold {
                SortState::IdleScan
            } else {
                SortState::RotateBack
            }
        },

        SortState::DiscardMove => {
            effects.push(Effect::DriveArm {
                from_index: 0,
                pose: Pose::Discard,
            });
            SortState::DiscardRelease
        },

        SortState::DiscardRelease => {
            if inputs.wrist < motion.discard_release_threshold() {
                effects.push(Effect::Gripper(GripperCommand::Open));
                effects.push(Effect::CountDiscard);
                SortState::DiscardReturn
            } else {
                SortState::DiscardRelease
            }
        },

        SortState::DiscardReturn => {
            // 每个评估周期都重发回零指令，直到腕关节反馈归位
            effects.push(Effect::DriveArm {
                from_index: 0,
                pose: Pose::Home,
            });
            if inputs.wrist.abs() < motion.home_tolerance {
                SortState::IdleScan
            } else {
                SortState::DiscardReturn
            }
        },
    };

    Step { next, effects }
}
