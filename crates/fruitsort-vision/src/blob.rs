//! 连通域包围盒
//!
//! 对二值掩膜做 8 连通域搜索，按栅格扫描发现顺序输出每个连通域的
//! 轴对齐包围盒。替代外部轮廓检测：形态学去噪之后，连通域与外轮廓
//! 的包围盒一致。

use std::collections::VecDeque;

use crate::Mask;

/// 轴对齐包围盒（ROI 坐标系，像素单位）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

/// 提取掩膜中所有连通域的包围盒
///
/// # 返回
/// 按连通域在栅格扫描中的首次发现顺序排列。
pub fn bounding_boxes(mask: &Mask) -> Vec<BoundingBox> {
    let width = mask.width();
    let height = mask.height();
    let mut visited = vec![false; width * height];
    let mut boxes = Vec::new();
    let mut queue = VecDeque::new();

    for start_y in 0..height {
        for start_x in 0..width {
            if !mask.get(start_x, start_y) || visited[start_y * width + start_x] {
                continue;
            }

            // 新连通域：BFS 泛洪并累积包围盒
            let (mut min_x, mut max_x) = (start_x, start_x);
            let (mut min_y, mut max_y) = (start_y, start_y);
            visited[start_y * width + start_x] = true;
            queue.push_back((start_x, start_y));

            while let Some((x, y)) = queue.pop_front() {
                min_x = min_x.min(x);
                max_x = max_x.max(x);
                min_y = min_y.min(y);
                max_y = max_y.max(y);

                for dy in -1isize..=1 {
                    for dx in -1isize..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let nx = x as isize + dx;
                        let ny = y as isize + dy;
                        if nx < 0 || ny < 0 || nx >= width as isize || ny >= height as isize {
                            continue;
                        }
                        let (nx, ny) = (nx as usize, ny as usize);
                        if mask.get(nx, ny) && !visited[ny * width + nx] {
                            visited[ny * width + nx] = true;
                            queue.push_back((nx, ny));
                        }
                    }
                }
            }

            boxes.push(BoundingBox {
                x: min_x,
                y: min_y,
                width: max_x - min_x + 1,
                height: max_y - min_y + 1,
            });
        }
    }

    boxes
}
