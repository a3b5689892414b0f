//! # Fruitsort 视觉分类层
//!
//! 相机帧的 HSV 颜色分类流水线，纯 CPU 实现：
//! ROI 裁剪 → BGR→HSV 转换 → 按类别区间做二值掩膜 → 闭-开形态学
//! 去噪 → 连通域包围盒 → 宽度阈值筛选。
//!
//! 多个类别按配置顺序评估，后评估类别的合格检测覆盖先前结果
//! （传送带上同一时刻只应有一个对象，重叠色相时以后者为准）。

use std::fmt;

use thiserror::Error;

pub mod blob;
pub mod classifier;
pub mod color;
pub mod config;
pub mod mask;

pub use blob::BoundingBox;
pub use classifier::{Detection, FruitClassifier};
pub use color::HsvImage;
pub use config::{ClassProfile, HsvRange, RoiSpec, VisionConfig};
pub use mask::Mask;

/// 视觉层统一错误类型
#[derive(Error, Debug)]
pub enum VisionError {
    /// 帧比配置的 ROI 小，无法裁剪
    #[error("frame {frame_width}x{frame_height} smaller than ROI {roi:?}")]
    FrameTooSmall {
        frame_width: usize,
        frame_height: usize,
        roi: RoiSpec,
    },
    /// 配置校验失败
    #[error("invalid vision config: {0}")]
    InvalidConfig(String),
}

/// 水果类别
///
/// 索引与原始分类顺序一致：橙子在前、青苹果在后。
/// 抓取动作从 `index()` 号关节开始驱动。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FruitClass {
    Orange,
    Apple,
}

impl FruitClass {
    /// 类别索引（橙子 0，苹果 1）
    pub const fn index(self) -> usize {
        match self {
            FruitClass::Orange => 0,
            FruitClass::Apple => 1,
        }
    }

    /// 标注用标签
    pub const fn label(self) -> &'static str {
        match self {
            FruitClass::Orange => "Orange",
            FruitClass::Apple => "Apple",
        }
    }
}

impl fmt::Display for FruitClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
