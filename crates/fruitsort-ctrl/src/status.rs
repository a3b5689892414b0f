//! 状态发布
//!
//! 把状态变化发到有界队列上（默认深度 10，对齐原状态话题的
//! queue_size）。连续相同状态去重；队列满或接收端关闭时丢弃本条并
//! 告警，绝不阻塞控制循环。

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use tracing::warn;

use crate::state::SortState;

/// 一条状态消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateMessage {
    /// 状态码（0..=7）
    pub code: u8,
    /// 状态名（未知码为 "UNKNOWN"，见 [`crate::state_name`]）
    pub name: &'static str,
    /// 发布时的周期号
    pub cycle: u64,
}

/// 创建状态通道
///
/// # 返回
/// 发布端与接收端。接收端可克隆分发，关闭后发布端自动降级为丢弃。
pub fn status_channel(depth: usize) -> (StatusPublisher, Receiver<StateMessage>) {
    let (tx, rx) = bounded(depth);
    (
        StatusPublisher {
            tx,
            last_published: None,
            dropped: 0,
        },
        rx,
    )
}

/// 去重状态发布器
#[derive(Debug)]
pub struct StatusPublisher {
    tx: Sender<StateMessage>,
    last_published: Option<SortState>,
    dropped: u64,
}

impl StatusPublisher {
    /// 发布状态（仅变化时）
    ///
    /// 与上一次发布相同的状态不产生消息。发送失败只计数并告警：
    /// 去重基于状态本身而非投递结果，失败的变化不会在下周期重发。
    pub fn publish(&mut self, state: SortState, cycle: u64) {
        if self.last_published == Some(state) {
            return;
        }
        self.last_published = Some(state);

        let message = StateMessage {
            code: state.code(),
            name: state.name(),
            cycle,
        };
        match self.tx.try_send(message) {
            Ok(()) => {},
            Err(TrySendError::Full(message)) => {
                self.dropped += 1;
                warn!(
                    state = message.name,
                    dropped = self.dropped,
                    "status queue full, dropping message"
                );
            },
            Err(TrySendError::Disconnected(message)) => {
                self.dropped += 1;
                warn!(state = message.name, "status receiver gone, dropping message");
            },
        }
    }

    /// 因队列满或接收端关闭而丢弃的消息数
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// 最近一次发布的状态
    pub fn last_published(&self) -> Option<SortState> {
        self.last_published
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consecutive_identical_states_deduplicate() {
        let (mut publisher, rx) = status_channel(10);
        for (state, cycle) in [
            (SortState::IdleScan, 1),
            (SortState::IdleScan, 2),
            (SortState::Pick, 3),
            (SortState::Pick, 4),
            (SortState::Pick, 5),
        ] {
            publisher.publish(state, cycle);
        }

        let messages: Vec<StateMessage> = rx.try_iter().collect();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].name, "WAITING");
        assert_eq!(messages[0].cycle, 1);
        assert_eq!(messages[1].name, "PICKING");
        assert_eq!(messages[1].cycle, 3);
    }

    #[test]
    fn revisited_state_publishes_again() {
        let (mut publisher, rx) = status_channel(10);
        publisher.publish(SortState::IdleScan, 1);
        publisher.publish(SortState::Pick, 2);
        publisher.publish(SortState::IdleScan, 3);

        let names: Vec<&str> = rx.try_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["WAITING", "PICKING", "WAITING"]);
    }

    #[test]
    fn full_queue_drops_without_blocking() {
        let (mut publisher, rx) = status_channel(1);
        publisher.publish(SortState::IdleScan, 1);
        publisher.publish(SortState::Pick, 2); // 队列已满，丢弃
        publisher.publish(SortState::RotateToDrop, 3); // 同样丢弃

        assert_eq!(publisher.dropped(), 2);
        let messages: Vec<StateMessage> = rx.try_iter().collect();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].name, "WAITING");

        // 去重基于状态：丢弃不影响后续变化的发布
        publisher.publish(SortState::Drop, 4);
        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn disconnected_receiver_does_not_panic() {
        let (mut publisher, rx) = status_channel(4);
        drop(rx);
        publisher.publish(SortState::IdleScan, 1);
        publisher.publish(SortState::Pick, 2);
        assert_eq!(publisher.dropped(), 2);
    }

    #[test]
    fn message_carries_code_and_name() {
        let (mut publisher, rx) = status_channel(4);
        publisher.publish(SortState::DiscardRelease, 7);
        let message = rx.try_recv().unwrap();
        assert_eq!(message.code, 6);
        assert_eq!(message.name, "DISCARD_RELEASE");
        assert_eq!(message.cycle, 7);
    }
}
