//! 稳定等待计数器
//!
//! 下发需要时间完成的动作（抓取、松爪）后装载固定周期数，
//! 计数未归零前整个状态机逻辑跳过，每周期只递减。
//! 计数只会被装载或递减，永不为负。

/// 稳定等待计数器
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cooldown {
    remaining: u32,
}

impl Cooldown {
    pub const fn new() -> Self {
        Self { remaining: 0 }
    }

    /// 装载等待周期数
    pub fn engage(&mut self, cycles: u32) {
        self.remaining = cycles;
    }

    /// 递减一个周期（已归零时保持为零）
    pub fn tick(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    /// 是否已稳定（计数归零）
    pub const fn is_ready(self) -> bool {
        self.remaining == 0
    }

    pub const fn remaining(self) -> u32 {
        self.remaining
    }
}
