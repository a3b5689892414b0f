//! 分拣计数
//!
//! 每次完整处理（抓取或丢弃）恰好计一次，横幅文本每周期刷新一次。

use fruitsort_vision::FruitClass;

/// 分拣计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub apples: u32,
    pub oranges: u32,
    pub discards: u32,
}

impl Tally {
    pub const fn new() -> Self {
        Self {
            apples: 0,
            oranges: 0,
            discards: 0,
        }
    }

    /// 记录一次水果抓取
    pub fn record_fruit(&mut self, class: FruitClass) {
        match class {
            FruitClass::Orange => self.oranges += 1,
            FruitClass::Apple => self.apples += 1,
        }
    }

    /// 记录一次丢弃
    pub fn record_discard(&mut self) {
        self.discards += 1;
    }

    /// 已处理对象总数
    pub const fn total(&self) -> u32 {
        self.apples + self.oranges + self.discards
    }

    /// 仿真窗口横幅文本（宽度 3 右对齐，与原单元的标签格式一致）
    pub fn banner(&self) -> String {
        format!(
            "Apple: {:3}    Orange: {:3}    Discard: {:3}",
            self.apples, self.oranges, self.discards
        )
    }
}
