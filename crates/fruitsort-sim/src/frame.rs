//! BGRA 图像帧
//!
//! 相机输出的原始帧缓冲：4 字节/像素（B、G、R、A），行优先存储。
//! 虚拟相机通过 [`Frame::fill_rect`] 渲染合成画面。

use crate::SimError;

/// 每像素字节数（BGRA）
pub const BYTES_PER_PIXEL: usize = 4;

/// BGRA8 图像帧
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Frame {
    /// 从原始缓冲创建帧
    ///
    /// # 错误
    /// 缓冲长度不等于 `width * height * 4` 时返回 [`SimError::Frame`]。
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self, SimError> {
        let expected = width * height * BYTES_PER_PIXEL;
        if data.len() != expected {
            return Err(SimError::Frame(format!(
                "buffer length {} does not match {}x{} BGRA frame (expected {})",
                data.len(),
                width,
                height,
                expected
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// 创建纯色帧（Alpha 固定为 255）
    pub fn filled(width: usize, height: usize, bgr: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width * height * BYTES_PER_PIXEL);
        for _ in 0..width * height {
            data.extend_from_slice(&[bgr[0], bgr[1], bgr[2], 255]);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// 原始 BGRA 缓冲
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// 读取单个像素，越界返回 `None`
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y * self.width + x) * BYTES_PER_PIXEL;
        let mut px = [0u8; 4];
        px.copy_from_slice(&self.data[offset..offset + BYTES_PER_PIXEL]);
        Some(px)
    }

    /// 填充矩形区域（越出帧边界的部分被裁掉）
    pub fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, bgr: [u8; 3]) {
        let x_end = (x + w).min(self.width);
        let y_end = (y + h).min(self.height);
        for row in y.min(self.height)..y_end {
            for col in x.min(self.width)..x_end {
                let offset = (row * self.width + col) * BYTES_PER_PIXEL;
                self.data[offset] = bgr[0];
                self.data[offset + 1] = bgr[1];
                self.data[offset + 2] = bgr[2];
                self.data[offset + 3] = 255;
            }
        }
    }
}
