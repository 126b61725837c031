// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local schedule table: delays, intervals, one-shot times and cron entries.
//!
//! The scheduler never sleeps or calls anything itself. The agent asks for
//! `due` entries on each pass of its wait loop, runs them, then calls
//! `complete` so recurring entries are re-armed and one-shots removed.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use wl_core::{CronError, CronExpr, EntryId};

use crate::callback::{Callback, Task};

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("scheduled time {at_ms} is not after now ({now_ms})")]
    NotInFuture { at_ms: u64, now_ms: u64 },

    #[error("interval must be greater than zero")]
    ZeroInterval,

    #[error(transparent)]
    InvalidCron(#[from] CronError),

    #[error("cron expression {0} has no upcoming occurrence")]
    NoOccurrence(String),

    #[error("a task tagged {0:?} is already scheduled")]
    DuplicateTag(String),

    #[error("no interval, delay or time given")]
    MissingTrigger,

    #[error("scheduled time is out of range")]
    OutOfRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Delay,
    Interval,
    Cron,
    /// One-shot at a wall-clock time
    Normal,
}

wl_core::simple_display! {
    EntryKind {
        Delay => "delay",
        Interval => "interval",
        Cron => "cron",
        Normal => "normal",
    }
}

#[derive(Debug, Clone)]
pub struct ScheduleEntry {
    pub id: EntryId,
    pub kind: EntryKind,
    pub label: String,
    /// Epoch milliseconds
    pub next_run_ms: u64,
    pub callback: Callback,
    pub args: Vec<Value>,
    pub interval: Option<Duration>,
    pub cron: Option<CronExpr>,
    pub tag: Option<String>,
}

impl ScheduleEntry {
    pub fn is_recurring(&self) -> bool {
        matches!(self.kind, EntryKind::Interval | EntryKind::Cron)
    }
}

#[derive(Debug, Default)]
pub struct Scheduler {
    entries: Vec<ScheduleEntry>,
    next_due_ms: Option<u64>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run once, `delay` from now.
    pub fn delay(
        &mut self,
        now_ms: u64,
        delay: Duration,
        task: Task,
    ) -> Result<EntryId, ScheduleError> {
        let at = offset_ms(now_ms, delay).ok_or(ScheduleError::OutOfRange)?;
        self.insert(EntryKind::Delay, at, task, None, None)
    }

    /// Run every `every`, first at now + `every`.
    pub fn interval(
        &mut self,
        now_ms: u64,
        every: Duration,
        task: Task,
    ) -> Result<EntryId, ScheduleError> {
        if every.is_zero() {
            return Err(ScheduleError::ZeroInterval);
        }
        let first = offset_ms(now_ms, every).ok_or(ScheduleError::OutOfRange)?;
        self.insert(EntryKind::Interval, first, task, Some(every), None)
    }

    /// Run once at `at_ms`, which must be strictly in the future.
    pub fn schedule(
        &mut self,
        now_ms: u64,
        at_ms: u64,
        task: Task,
    ) -> Result<EntryId, ScheduleError> {
        if at_ms <= now_ms {
            return Err(ScheduleError::NotInFuture { at_ms, now_ms });
        }
        self.insert(EntryKind::Normal, at_ms, task, None, None)
    }

    /// Run on every occurrence of a cron expression (local time).
    pub fn cron(&mut self, now_ms: u64, expr: &str, task: Task) -> Result<EntryId, ScheduleError> {
        let cron = CronExpr::parse(expr)?;
        let next = next_cron_ms(&cron, now_ms)
            .ok_or_else(|| ScheduleError::NoOccurrence(cron.to_string()))?;
        self.insert(EntryKind::Cron, next, task, None, Some(cron))
    }

    fn insert(
        &mut self,
        kind: EntryKind,
        next_run_ms: u64,
        task: Task,
        interval: Option<Duration>,
        cron: Option<CronExpr>,
    ) -> Result<EntryId, ScheduleError> {
        if let Some(tag) = &task.tag {
            if let Some(pos) = self.entries.iter().position(|e| e.tag.as_ref() == Some(tag)) {
                if !task.overwrite {
                    tracing::debug!(%tag, "task already scheduled with tag, skipping");
                    return Err(ScheduleError::DuplicateTag(tag.clone()));
                }
                let old = self.entries.remove(pos);
                tracing::debug!(%tag, replaced = %old.id, "overwriting tagged task");
            }
        }

        let id = EntryId::new();
        let label = task.label.unwrap_or_else(|| task.callback.label());
        tracing::debug!(entry = %id, %kind, %label, next_run_ms, "scheduled");
        self.entries.push(ScheduleEntry {
            id: id.clone(),
            kind,
            label,
            next_run_ms,
            callback: task.callback,
            args: task.args,
            interval,
            cron,
            tag: task.tag,
        });
        self.refresh_next();
        Ok(id)
    }

    pub fn cancel(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.refresh_next();
        self.entries.len() != before
    }

    pub fn cancel_tag(&mut self, tag: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.tag.as_deref() != Some(tag));
        self.refresh_next();
        self.entries.len() != before
    }

    pub fn get(&self, id: &str) -> Option<&ScheduleEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids of entries due at `now_ms`, earliest first.
    pub fn due(&self, now_ms: u64) -> Vec<EntryId> {
        let mut due: Vec<&ScheduleEntry> =
            self.entries.iter().filter(|e| e.next_run_ms <= now_ms).collect();
        due.sort_by_key(|e| e.next_run_ms);
        due.into_iter().map(|e| e.id.clone()).collect()
    }

    /// Re-arm or remove an entry after it fired at `fired_ms`.
    ///
    /// Intervals advance from the firing time, so slow callbacks shift the
    /// cadence. A cron entry with no further occurrence is removed.
    pub fn complete(&mut self, id: &str, fired_ms: u64) {
        let Some(pos) = self.entries.iter().position(|e| e.id == id) else {
            return;
        };
        let entry = &mut self.entries[pos];
        let next = match (entry.kind, entry.interval, &entry.cron) {
            (EntryKind::Interval, Some(every), _) => offset_ms(fired_ms, every),
            (EntryKind::Cron, _, Some(cron)) => next_cron_ms(cron, fired_ms),
            _ => None,
        };
        match next {
            Some(next) => entry.next_run_ms = next,
            None => {
                let removed = self.entries.remove(pos);
                tracing::debug!(
                    entry = %removed.id,
                    kind = %removed.kind,
                    "schedule entry finished"
                );
            }
        }
        self.refresh_next();
    }

    /// Earliest pending run time, kept as a hint for the wait loop.
    pub fn next_due_ms(&self) -> Option<u64> {
        self.next_due_ms
    }

    fn refresh_next(&mut self) {
        self.next_due_ms = self.entries.iter().map(|e| e.next_run_ms).min();
    }
}

fn next_cron_ms(cron: &CronExpr, now_ms: u64) -> Option<u64> {
    let next = cron.next_after_epoch(i64::try_from(now_ms / 1000).ok()?)?;
    u64::try_from(next).ok()?.checked_mul(1000)
}

/// `now_ms + d`, or `None` when it does not fit in epoch milliseconds.
fn offset_ms(now_ms: u64, d: Duration) -> Option<u64> {
    u64::try_from(d.as_millis()).ok().and_then(|ms| now_ms.checked_add(ms))
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
