//! 水果分类器
//!
//! 完整流水线的入口。每个合格检测（宽度超过阈值的连通域）都会回调
//! 一次（显示层为其画标注框），最终分类结果取全部档案按序评估后
//! **最后一个**合格检测。

use fruitsort_sim::Frame;

use crate::{
    BoundingBox, FruitClass, HsvImage, VisionConfig, VisionError,
    blob::bounding_boxes,
    mask::{close_then_open, in_range},
};

/// 形态学结构元半径（5×5 方形核）
const KERNEL_RADIUS: usize = 2;

/// 一次合格检测
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub class: FruitClass,
    /// 包围盒（ROI 坐标系；标注时需加上 ROI 偏移）
    pub bbox: BoundingBox,
}

/// HSV 颜色分类器
#[derive(Debug, Clone)]
pub struct FruitClassifier {
    config: VisionConfig,
}

impl FruitClassifier {
    /// 创建分类器（校验配置）
    pub fn new(config: VisionConfig) -> Result<Self, VisionError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &VisionConfig {
        &self.config
    }

    /// 分类一帧
    ///
    /// 等价于 [`classify_with`](Self::classify_with)，不接收回调。
    pub fn classify(&self, frame: &Frame) -> Result<Option<Detection>, VisionError> {
        self.classify_with(frame, |_| {})
    }

    /// 分类一帧，并对每个合格检测回调一次
    ///
    /// # 参数
    /// - `frame`: 相机帧（BGRA）
    /// - `on_qualifying`: 每个合格检测触发一次，按评估顺序
    ///
    /// # 返回
    /// 最后一个合格检测；没有合格检测时返回 `Ok(None)`。
    ///
    /// # 错误
    /// 帧小于 ROI 时返回 [`VisionError::FrameTooSmall`]。
    pub fn classify_with<F>(
        &self,
        frame: &Frame,
        mut on_qualifying: F,
    ) -> Result<Option<Detection>, VisionError>
    where
        F: FnMut(&Detection),
    {
        let hsv = HsvImage::from_frame_roi(frame, &self.config.roi)?;

        let mut result = None;
        for profile in &self.config.profiles {
            let mask = close_then_open(&in_range(&hsv, &profile.range), KERNEL_RADIUS);
            for bbox in bounding_boxes(&mask) {
                if bbox.width > self.config.min_width_px {
                    let detection = Detection {
                        class: profile.class,
                        bbox,
                    };
                    on_qualifying(&detection);
                    result = Some(detection);
                }
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 颜色取自虚拟单元的对象档案：橙色色相约 13，绿色色相约 60
    const ORANGE_BGR: [u8; 3] = [0, 100, 230];
    const GREEN_BGR: [u8; 3] = [60, 180, 60];
    const BACKGROUND_BGR: [u8; 3] = [30, 30, 30];

    fn classifier() -> FruitClassifier {
        FruitClassifier::new(VisionConfig::default()).unwrap()
    }

    /// 在默认 ROI（x 35..165, y 0..150）内画一个纯色矩形的帧
    fn frame_with_rect(roi_x: usize, roi_y: usize, w: usize, h: usize, bgr: [u8; 3]) -> Frame {
        let mut frame = Frame::filled(200, 150, BACKGROUND_BGR);
        frame.fill_rect(35 + roi_x, roi_y, w, h, bgr);
        frame
    }

    #[test]
    fn wide_orange_rect_is_detected() {
        let frame = frame_with_rect(10, 20, 100, 90, ORANGE_BGR);
        let detection = classifier().classify(&frame).unwrap().unwrap();
        assert_eq!(detection.class, FruitClass::Orange);
        assert_eq!(
            detection.bbox,
            BoundingBox {
                x: 10,
                y: 20,
                width: 100,
                height: 90,
            }
        );
    }

    #[test]
    fn wide_green_rect_is_detected_as_apple() {
        let frame = frame_with_rect(10, 20, 100, 90, GREEN_BGR);
        let detection = classifier().classify(&frame).unwrap().unwrap();
        assert_eq!(detection.class, FruitClass::Apple);
    }

    #[test]
    fn width_threshold_is_strict() {
        // 宽度正好等于阈值：不合格
        let frame = frame_with_rect(10, 20, 80, 60, ORANGE_BGR);
        assert_eq!(classifier().classify(&frame).unwrap(), None);

        // 超出一个像素：合格
        let frame = frame_with_rect(10, 20, 81, 60, ORANGE_BGR);
        assert!(classifier().classify(&frame).unwrap().is_some());
    }

    #[test]
    fn empty_scene_classifies_none() {
        let frame = Frame::filled(200, 150, BACKGROUND_BGR);
        assert_eq!(classifier().classify(&frame).unwrap(), None);
    }

    #[test]
    fn later_profile_overrides_earlier() {
        // 橙色与绿色矩形同帧都合格：苹果档案在后，覆盖橙子结果
        let mut frame = Frame::filled(200, 150, BACKGROUND_BGR);
        frame.fill_rect(40, 5, 90, 40, ORANGE_BGR);
        frame.fill_rect(40, 60, 90, 40, GREEN_BGR);

        let mut seen = Vec::new();
        let detection = classifier()
            .classify_with(&frame, |d| seen.push(d.class))
            .unwrap()
            .unwrap();

        assert_eq!(detection.class, FruitClass::Apple);
        assert_eq!(seen, vec![FruitClass::Orange, FruitClass::Apple]);
    }

    #[test]
    fn frame_smaller_than_roi_is_an_error() {
        let frame = Frame::filled(64, 64, BACKGROUND_BGR);
        assert!(matches!(
            classifier().classify(&frame),
            Err(VisionError::FrameTooSmall { .. })
        ));
    }

    #[test]
    fn narrow_blobs_do_not_qualify() {
        let frame = frame_with_rect(10, 20, 40, 90, ORANGE_BGR);
        let mut calls = 0;
        let result = classifier()
            .classify_with(&frame, |_| calls += 1)
            .unwrap();
        assert_eq!(result, None);
        assert_eq!(calls, 0);
    }
}
