//! BGR→HSV 颜色转换
//!
//! 采用 OpenCV 的 8-bit 约定：H 取值 0..=179（角度减半），S、V 取值
//! 0..=255。分类区间常量沿用该刻度。

use fruitsort_sim::Frame;

use crate::{RoiSpec, VisionError};

/// 把单个 BGR 像素转换为 HSV
///
/// # 返回
/// `[h, s, v]`，H 已减半到 0..=179。
pub fn bgr_to_hsv(bgr: [u8; 3]) -> [u8; 3] {
    let b = bgr[0] as f64;
    let g = bgr[1] as f64;
    let r = bgr[2] as f64;

    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = v - min;

    let s = if v == 0.0 { 0.0 } else { delta / v * 255.0 };

    let h_deg = if delta == 0.0 {
        0.0
    } else if v == r {
        60.0 * (g - b) / delta
    } else if v == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    let h_deg = if h_deg < 0.0 { h_deg + 360.0 } else { h_deg };

    // 角度减半后四舍五入；359.x° 会落到 180，按红色环回到 0
    let mut h = (h_deg / 2.0).round() as u32;
    if h >= 180 {
        h = 0;
    }

    [h as u8, s.round() as u8, v as u8]
}

/// ROI 裁剪后的 HSV 图像
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HsvImage {
    width: usize,
    height: usize,
    pixels: Vec<[u8; 3]>,
}

impl HsvImage {
    /// 从相机帧裁剪 ROI 并转换到 HSV
    ///
    /// # 错误
    /// ROI 超出帧边界时返回 [`VisionError::FrameTooSmall`]。
    pub fn from_frame_roi(frame: &Frame, roi: &RoiSpec) -> Result<Self, VisionError> {
        if roi.x + roi.width > frame.width() || roi.y + roi.height > frame.height() {
            return Err(VisionError::FrameTooSmall {
                frame_width: frame.width(),
                frame_height: frame.height(),
                roi: *roi,
            });
        }

        let mut pixels = Vec::with_capacity(roi.width * roi.height);
        for y in roi.y..roi.y + roi.height {
            for x in roi.x..roi.x + roi.width {
                // ROI 已校验在帧内
                let px = frame.pixel(x, y).unwrap_or([0, 0, 0, 0]);
                pixels.push(bgr_to_hsv([px[0], px[1], px[2]]));
            }
        }

        Ok(Self {
            width: roi.width,
            height: roi.height,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// 读取 ROI 坐标系下的 HSV 像素
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y * self.width + x])
    }
}
