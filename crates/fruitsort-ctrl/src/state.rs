//! 控制器状态定义
//!
//! 八个状态组成两条回路：抓取-投放（0→1→2→3→4→0）和
//! 丢弃清扫（0→5→6→7→0）。状态码用于对外发布，名称沿用
//! 原分拣单元的状态话题。

use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// 分拣状态机的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum SortState {
    /// 空闲扫描：臂归位，等待对象进入并分类
    IdleScan = 0,
    /// 已抓取，准备移向投放位
    Pick = 1,
    /// 旋转到投放位（等腕关节反馈到位）
    RotateToDrop = 2,
    /// 投放：松爪
    Drop = 3,
    /// 旋转回空闲位
    RotateBack = 4,
    /// 丢弃清扫：移向丢弃槽
    DiscardMove = 5,
    /// 丢弃释放：到位后松爪
    DiscardRelease = 6,
    /// 丢弃后返回空闲位
    DiscardReturn = 7,
}

impl SortState {
    /// 对外发布的状态码
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// 对外发布的状态名
    pub const fn name(self) -> &'static str {
        match self {
            SortState::IdleScan => "WAITING",
            SortState::Pick => "PICKING",
            SortState::RotateToDrop => "ROTATING",
            SortState::Drop => "DROPPING",
            SortState::RotateBack => "ROTATE_BACK",
            SortState::DiscardMove => "DISCARD_MOVE",
            SortState::DiscardRelease => "DISCARD_RELEASE",
            SortState::DiscardReturn => "DISCARD_RETURN",
        }
    }
}

impl fmt::Display for SortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 状态码对应的发布名
///
/// # 返回
/// 未定义的状态码返回 `"UNKNOWN"`。
pub fn state_name(code: u8) -> &'static str {
    match SortState::try_from(code) {
        Ok(state) => state.name(),
        Err(_) => "UNKNOWN",
    }
}
