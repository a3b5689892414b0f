//! 控制器配置
//!
//! 位姿、阈值和节拍全部外置为 TOML 配置，默认值取原分拣单元的标定
//! 常量。所有字段带 `serde(default)`，配置文件可以只写需要覆盖的部分。

use std::path::Path;
use std::time::Duration;

use fruitsort_sim::ArmJoint;
use fruitsort_vision::VisionConfig;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 机械臂运动配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// 投放位姿（rad，按关节索引）
    pub drop_pose: [f64; ArmJoint::COUNT],
    /// 丢弃位姿（rad，按关节索引）
    pub discard_pose: [f64; ArmJoint::COUNT],
    /// 关节速度（rad/s）
    pub joint_speed: f64,
    /// 归位判定容差（rad，腕关节反馈绝对值）
    pub home_tolerance: f64,
    /// 投放到位判定：腕关节反馈低于该值（rad）
    pub drop_feedback_threshold: f64,
    /// 返回空闲判定：腕关节反馈高于该值（rad）
    pub return_threshold: f64,
    /// 丢弃释放判定：腕关节低于丢弃位姿腕目标加此裕量（rad）
    pub discard_release_slack: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            drop_pose: [-1.570796, -1.87972, -2.139774, -2.363176, -1.50971],
            discard_pose: [-1.570796, -1.87972, 2.50, -2.363176, -1.50971],
            joint_speed: 2.0,
            home_tolerance: 0.05,
            drop_feedback_threshold: -2.3,
            return_threshold: -0.1,
            discard_release_slack: 0.1,
        }
    }
}

impl MotionConfig {
    /// 丢弃释放的腕关节判定阈值
    pub fn discard_release_threshold(&self) -> f64 {
        self.discard_pose[ArmJoint::Wrist1.index()] + self.discard_release_slack
    }
}

/// 周期与稳定等待配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// 仿真步长（ms）
    pub timestep_ms: u64,
    /// 动作后的稳定等待周期数
    pub settle_cycles: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            timestep_ms: 32,
            settle_cycles: 8,
        }
    }
}

impl TimingConfig {
    pub fn timestep(&self) -> Duration {
        Duration::from_millis(self.timestep_ms)
    }
}

/// 分拣控制器总配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SorterConfig {
    /// 距离传感器判定阈值：读数低于该值视为对象到位
    pub proximity_threshold: f64,
    /// 状态发布队列深度
    pub status_depth: usize,
    pub motion: MotionConfig,
    pub timing: TimingConfig,
    pub vision: VisionConfig,
}

impl Default for SorterConfig {
    fn default() -> Self {
        Self {
            proximity_threshold: 500.0,
            status_depth: 10,
            motion: MotionConfig::default(),
            timing: TimingConfig::default(),
            vision: VisionConfig::default(),
        }
    }
}

impl SorterConfig {
    /// 从 TOML 文件加载并校验
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timing.timestep_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "timing.timestep_ms",
                reason: "must be positive".to_string(),
            });
        }
        if !self.motion.joint_speed.is_finite() || self.motion.joint_speed <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "motion.joint_speed",
                reason: format!("must be positive, got {}", self.motion.joint_speed),
            });
        }
        if !self.motion.home_tolerance.is_finite() || self.motion.home_tolerance <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "motion.home_tolerance",
                reason: format!("must be positive, got {}", self.motion.home_tolerance),
            });
        }
        if !self.proximity_threshold.is_finite() || self.proximity_threshold <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "proximity_threshold",
                reason: format!("must be positive, got {}", self.proximity_threshold),
            });
        }
        if self.status_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "status_depth",
                reason: "must be at least 1".to_string(),
            });
        }
        for (field, pose) in [
            ("motion.drop_pose", &self.motion.drop_pose),
            ("motion.discard_pose", &self.motion.discard_pose),
        ] {
            if pose.iter().any(|v| !v.is_finite()) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("all joint targets must be finite, got {pose:?}"),
                });
            }
        }
        self.vision.validate()?;
        Ok(())
    }
}
