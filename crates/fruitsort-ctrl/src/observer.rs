//! 控制器状态快照
//!
//! 周期结束时整体替换快照（ArcSwap），任意线程可以无锁读取最新
//! 状态、计数与冷却进度，不打扰控制循环。

use std::sync::Arc;

use arc_swap::ArcSwap;
use fruitsort_vision::Detection;

use crate::state::SortState;
use crate::tally::Tally;

/// 一个周期结束时的控制器快照
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSnapshot {
    pub state: SortState,
    pub cooldown_remaining: u32,
    pub tally: Tally,
    /// 已执行的周期数
    pub cycle: u64,
    /// 最近一次合格分类
    pub last_detection: Option<Detection>,
}

impl Default for ControllerSnapshot {
    fn default() -> Self {
        Self {
            state: SortState::IdleScan,
            cooldown_remaining: 0,
            tally: Tally::new(),
            cycle: 0,
            last_detection: None,
        }
    }
}

/// 可克隆的快照读取句柄
///
/// # 示例
///
/// ```
/// use fruitsort_ctrl::ControllerObserver;
///
/// let observer = ControllerObserver::new();
/// let snapshot = observer.snapshot();
/// assert_eq!(snapshot.cycle, 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ControllerObserver {
    inner: Arc<ArcSwap<ControllerSnapshot>>,
}

impl ControllerObserver {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(ControllerSnapshot::default())),
        }
    }

    /// 读取最新快照（无锁）
    pub fn snapshot(&self) -> Arc<ControllerSnapshot> {
        self.inner.load_full()
    }

    /// 整体替换快照（控制循环每周期调用一次）
    pub(crate) fn store(&self, snapshot: ControllerSnapshot) {
        self.inner.store(Arc::new(snapshot));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_then_load() {
        let observer = ControllerObserver::new();
        let mut snapshot = ControllerSnapshot::default();
        snapshot.state = SortState::Pick;
        snapshot.cycle = 42;
        observer.store(snapshot.clone());
        assert_eq!(*observer.snapshot(), snapshot);
    }

    #[test]
    fn clones_share_the_same_snapshot() {
        let observer = ControllerObserver::new();
        let reader = observer.clone();

        let mut snapshot = ControllerSnapshot::default();
        snapshot.tally.record_discard();
        observer.store(snapshot);

        assert_eq!(reader.snapshot().tally.discards, 1);
    }
}
