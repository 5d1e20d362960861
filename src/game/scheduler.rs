use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use super::clock::Millis;
use super::deck::CardId;

/// 延迟任务句柄，可用于取消。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(pub u64);

/// 会话中所有延迟执行的副作用。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum DeferredEffect {
    /// 预览结束，正式开始计时。
    BeginPlay,
    /// 宽容模式下把配错的两张牌扣回去。
    CloseMismatched { card_ids: Vec<CardId> },
    /// “顿悟”结束：把当时未翻开的牌重新盖上并继续游戏。
    EndEpiphany { closed: Vec<CardId> },
}

#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub handle: TaskHandle,
    pub due_at: Millis,
    pub generation: u64,
    pub effect: DeferredEffect,
    seq: u64,
}

impl PartialEq for ScheduledTask {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl Eq for ScheduledTask {}

impl PartialOrd for ScheduledTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledTask {
    // BinaryHeap 是大顶堆，反转比较得到最早到期、最先登记的任务
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due_at
            .cmp(&self.due_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug, Default)]
pub struct Scheduler {
    heap: BinaryHeap<ScheduledTask>,
    seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, effect: DeferredEffect, due_at: Millis, generation: u64) -> TaskHandle {
        self.seq += 1;
        let handle = TaskHandle(self.seq);
        log::debug!(target: "scheduler", "scheduled {:?} at {} as {:?}", effect, due_at, handle);
        self.heap.push(ScheduledTask {
            handle,
            due_at,
            generation,
            effect,
            seq: self.seq,
        });
        handle
    }

    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.heap.len();
        self.heap.retain(|task| task.handle != handle);
        before != self.heap.len()
    }

    pub fn cancel_all(&mut self) {
        if !self.heap.is_empty() {
            log::debug!(target: "scheduler", "cancelled {} pending task(s)", self.heap.len());
        }
        self.heap.clear();
    }

    /// 取出一个已到期的任务，没有到期任务时返回 `None`。
    pub fn pop_due(&mut self, now: Millis) -> Option<ScheduledTask> {
        if self.heap.peek()?.due_at > now {
            return None;
        }
        self.heap.pop()
    }

    pub fn next_due(&self) -> Option<Millis> {
        self.heap.peek().map(|task| task.due_at)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tasks_fire_by_due_time_then_registration_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(DeferredEffect::EndEpiphany { closed: vec![] }, 5_000, 0);
        scheduler.schedule(DeferredEffect::CloseMismatched { card_ids: vec![1, 2] }, 1_000, 0);
        scheduler.schedule(DeferredEffect::BeginPlay, 1_000, 0);

        assert!(scheduler.pop_due(999).is_none());

        let first = scheduler.pop_due(1_000).expect("first task due");
        assert!(matches!(first.effect, DeferredEffect::CloseMismatched { .. }));
        let second = scheduler.pop_due(1_000).expect("second task due");
        assert_eq!(second.effect, DeferredEffect::BeginPlay);
        assert!(scheduler.pop_due(4_999).is_none());
        assert_eq!(scheduler.next_due(), Some(5_000));
    }

    #[test]
    fn cancelled_tasks_never_fire() {
        let mut scheduler = Scheduler::new();
        let handle = scheduler.schedule(DeferredEffect::BeginPlay, 10, 0);
        scheduler.schedule(DeferredEffect::BeginPlay, 20, 0);

        assert!(scheduler.cancel(handle));
        assert!(!scheduler.cancel(handle), "second cancel finds nothing");
        assert_eq!(scheduler.len(), 1);

        scheduler.cancel_all();
        assert!(scheduler.pop_due(u64::MAX).is_none());
        assert!(scheduler.is_empty());
    }
}
