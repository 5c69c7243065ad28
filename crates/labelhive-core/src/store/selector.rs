//! The next-task selection algorithm.
//!
//! A task is eligible for a worker when it has collected fewer than
//! `quota` submissions overall and this worker has not answered it yet.
//! Among eligible tasks the one with the lowest identifier wins, which
//! makes selection deterministic and cheap to test. `None` means the
//! worker has exhausted the marketplace; callers report "no tasks
//! available", never an error.

use crate::domain::{TaskId, WorkerId};

use super::state::MarketState;

/// Pure read over the task table and submission ledger.
pub(crate) fn next_task_for(state: &MarketState, worker_id: WorkerId) -> Option<TaskId> {
    // tasks is a BTreeMap, so this scans in ascending id order.
    state.tasks.keys().copied().find(|&task_id| {
        state.submission_count(task_id) < state.quota
            && !state.submission_index.contains(&(worker_id, task_id))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Address, OptionId, TaskDraft};
    use chrono::Utc;

    fn draft() -> TaskDraft {
        TaskDraft::new(1_000_000, "sig").with_image("https://img.example/a.jpg")
    }

    fn state_with_tasks(quota: u32, n: usize) -> (MarketState, WorkerId) {
        let now = Utc::now();
        let mut state = MarketState::new(quota);
        let (requester, _) = state.get_or_create_requester(Address::new("req"), now);
        for _ in 0..n {
            state.insert_task(requester, &draft(), now);
        }
        let (worker, _) = state.get_or_create_worker(Address::new("wrk"), now);
        (state, worker)
    }

    fn first_option(state: &MarketState, task_id: TaskId) -> OptionId {
        state.options_by_task[&task_id][0]
    }

    #[test]
    fn picks_lowest_task_id_first() {
        let (state, worker) = state_with_tasks(100, 3);
        assert_eq!(next_task_for(&state, worker), Some(TaskId::new(1)));
    }

    #[test]
    fn skips_tasks_the_worker_already_answered() {
        let (mut state, worker) = state_with_tasks(100, 3);
        let now = Utc::now();

        let t1 = TaskId::new(1);
        let opt = first_option(&state, t1);
        state.apply_submission(worker, t1, opt, 10, now);

        assert_eq!(next_task_for(&state, worker), Some(TaskId::new(2)));
    }

    #[test]
    fn skips_tasks_at_quota_for_everyone() {
        let (mut state, worker) = state_with_tasks(2, 2);
        let now = Utc::now();

        // Two other workers fill task 1 to its quota.
        let t1 = TaskId::new(1);
        let opt = first_option(&state, t1);
        for name in ["wrk-a", "wrk-b"] {
            let (other, _) = state.get_or_create_worker(Address::new(name), now);
            state.apply_submission(other, t1, opt, 10, now);
        }

        assert_eq!(next_task_for(&state, worker), Some(TaskId::new(2)));
    }

    #[test]
    fn returns_none_when_nothing_is_left() {
        let (mut state, worker) = state_with_tasks(100, 2);
        let now = Utc::now();

        for id in [TaskId::new(1), TaskId::new(2)] {
            let opt = first_option(&state, id);
            state.apply_submission(worker, id, opt, 10, now);
        }

        assert_eq!(next_task_for(&state, worker), None);
    }

    #[test]
    fn empty_marketplace_yields_none() {
        let (state, worker) = state_with_tasks(100, 0);
        assert_eq!(next_task_for(&state, worker), None);
    }
}
