//! 视觉配置
//!
//! 色相区间、ROI 和尺寸阈值全部外置，默认值取原始分拣单元的标定结果。

use crate::{FruitClass, VisionError};

/// HSV 闭区间（OpenCV 刻度：H 0..=179，S、V 0..=255）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    /// 判断像素是否落在区间内（上下界均含）
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|i| self.lower[i] <= hsv[i] && hsv[i] <= self.upper[i])
    }
}

/// 一个类别的颜色档案
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassProfile {
    pub class: FruitClass,
    pub range: HsvRange,
}

/// 分类 ROI（帧坐标系）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoiSpec {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

/// 视觉层配置
///
/// 类别档案按序评估，后评估的合格检测覆盖先前结果。
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VisionConfig {
    pub roi: RoiSpec,
    /// 包围盒宽度阈值（px），严格大于才算合格检测
    pub min_width_px: usize,
    pub profiles: Vec<ClassProfile>,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            roi: RoiSpec {
                x: 35,
                y: 0,
                width: 130,
                height: 150,
            },
            min_width_px: 80,
            profiles: vec![
                ClassProfile {
                    class: FruitClass::Orange,
                    range: HsvRange {
                        lower: [10, 135, 135],
                        upper: [32, 255, 255],
                    },
                },
                ClassProfile {
                    class: FruitClass::Apple,
                    range: HsvRange {
                        lower: [30, 50, 50],
                        upper: [90, 255, 255],
                    },
                },
            ],
        }
    }
}

impl VisionConfig {
    /// 校验配置
    ///
    /// # 错误
    /// ROI 为零面积、无类别档案或区间上下界颠倒时返回
    /// [`VisionError::InvalidConfig`]。
    pub fn validate(&self) -> Result<(), VisionError> {
        if self.roi.width == 0 || self.roi.height == 0 {
            return Err(VisionError::InvalidConfig(format!(
                "ROI must have positive area, got {}x{}",
                self.roi.width, self.roi.height
            )));
        }
        if self.profiles.is_empty() {
            return Err(VisionError::InvalidConfig(
                "at least one class profile required".to_string(),
            ));
        }
        for profile in &self.profiles {
            let range = &profile.range;
            for i in 0..3 {
                if range.lower[i] > range.upper[i] {
                    return Err(VisionError::InvalidConfig(format!(
                        "inverted HSV bounds for {}: {:?} > {:?}",
                        profile.class, range.lower, range.upper
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        VisionConfig::default().validate().unwrap();
    }

    #[test]
    fn default_profiles_evaluate_orange_then_apple() {
        let config = VisionConfig::default();
        assert_eq!(config.profiles[0].class, FruitClass::Orange);
        assert_eq!(config.profiles[1].class, FruitClass::Apple);
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let range = HsvRange {
            lower: [10, 135, 135],
            upper: [32, 255, 255],
        };
        assert!(range.contains([10, 135, 135]));
        assert!(range.contains([32, 255, 255]));
        assert!(!range.contains([9, 200, 200]));
        assert!(!range.contains([33, 200, 200]));
        assert!(!range.contains([20, 134, 200]));
    }

    #[test]
    fn validate_rejects_empty_profiles() {
        let config = VisionConfig {
            profiles: Vec::new(),
            ..VisionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_bounds() {
        let mut config = VisionConfig::default();
        config.profiles[0].range.lower = [40, 0, 0];
        config.profiles[0].range.upper = [10, 255, 255];
        assert!(config.validate().is_err());
    }
}
