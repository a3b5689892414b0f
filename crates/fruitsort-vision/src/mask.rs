//! 二值掩膜与形态学运算
//!
//! 掩膜由 [`in_range`] 生成，之后做一次闭运算再一次开运算
//! （与原始流水线的 MORPH_CLOSE、MORPH_OPEN 顺序一致）：
//! 闭运算填补对象内部的小洞，开运算去掉孤立噪点。
//! 结构元为全 1 方形核，半径 2 对应 5×5。

use crate::{HsvImage, HsvRange};

/// 二值掩膜（ROI 坐标系）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: usize,
    height: usize,
    data: Vec<bool>,
}

impl Mask {
    /// 全 0 掩膜
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![false; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// 读取像素，越界返回 `false`
    pub fn get(&self, x: usize, y: usize) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.data[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = value;
        }
    }

    /// 置位像素数（测试用）
    pub fn count_set(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }
}

/// 按 HSV 区间生成二值掩膜（上下界均为闭区间）
pub fn in_range(image: &HsvImage, range: &HsvRange) -> Mask {
    let mut mask = Mask::new(image.width(), image.height());
    for y in 0..image.height() {
        for x in 0..image.width() {
            if let Some(hsv) = image.pixel(x, y) {
                mask.set(x, y, range.contains(hsv));
            }
        }
    }
    mask
}

/// 腐蚀：邻域内存在 0 则输出 0
///
/// 边界外视为 1（与 OpenCV 腐蚀的默认边界一致，边缘不会被整圈啃掉）。
pub fn erode(mask: &Mask, radius: usize) -> Mask {
    let mut out = Mask::new(mask.width(), mask.height());
    let r = radius as isize;
    for y in 0..mask.height() {
        for x in 0..mask.width() {
            let mut keep = true;
            'kernel: for dy in -r..=r {
                for dx in -r..=r {
                    let nx = x as isize + dx;
                    let ny = y as isize + dy;
                    if nx < 0
                        || ny < 0
                        || nx >= mask.width() as isize
                        || ny >= mask.height() as isize
                    {
                        continue; // 边界外视为 1
                    }
                    if !mask.get(nx as usize, ny as usize) {
                        keep = false;
                        break 'kernel;
                    }
                }
            }
            out.set(x, y, keep);
        }
    }
    out
}

/// 膨胀：邻域内存在 1 则输出 1（边界外视为 0）
pub fn dilate(mask: &Mask, radius: usize) -> Mask {
    let mut out = Mask::new(mask.width(), mask.height());
    let r = radius as isize;
    for y in 0..mask.height() {
        for x in 0..mask.width() {
            let mut hit = false;
            'kernel: for dy in -r..=r {
                for dx in -r..=r {
                    let nx = x as isize + dx;
                    let ny = y as isize + dy;
                    if nx < 0
                        || ny < 0
                        || nx >= mask.width() as isize
                        || ny >= mask.height() as isize
                    {
                        continue;
                    }
                    if mask.get(nx as usize, ny as usize) {
                        hit = true;
                        break 'kernel;
                    }
                }
            }
            out.set(x, y, hit);
        }
    }
    out
}

/// 先闭后开
pub fn close_then_open(mask: &Mask, radius: usize) -> Mask {
    let closed = erode(&dilate(mask, radius), radius);
    dilate(&erode(&closed, radius), radius)
}
