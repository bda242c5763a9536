//! The save state machine and the daily master-refresh rule.
//!
//! Nothing here touches the network or a clock; the engine feeds it events
//! and acts on the answers.

use crate::error::SyncError;
use chrono::{DateTime, Duration, TimeZone, Utc};
use common::jobs::SyncState;
use log::debug;

/// Handed out when a save starts. Carries the mutation revision it captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveTicket {
    revision: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveCompletion {
    /// No mutation happened while the save was in flight; dirty may be cleared.
    pub clean: bool,
    /// Another save must follow.
    pub reschedule: bool,
}

#[derive(Debug, Default)]
pub struct SyncScheduler {
    state: SyncState,
    revision: u64,
    missed: bool,
}

impl SyncScheduler {
    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn note_mutation(&mut self) {
        self.revision += 1;
    }

    /// Starts a save unless one is running or auth recovery is under way.
    /// A refused request is remembered so completion schedules a follow-up.
    pub fn begin_save(&mut self) -> Option<SaveTicket> {
        match self.state {
            SyncState::Saving | SyncState::AuthRetry => {
                debug!("Save requested while {:?}; deferring", self.state);
                self.missed = true;
                None
            }
            SyncState::Idle | SyncState::Offline => {
                self.state = SyncState::Saving;
                Some(SaveTicket {
                    revision: self.revision,
                })
            }
        }
    }

    /// Starts a write that must not be deferred (backups, flushing before a
    /// session switch). Only a running save holds it back; the caller waits
    /// for that save to finish and asks again.
    pub fn begin_exclusive(&mut self) -> Option<SaveTicket> {
        if self.state == SyncState::Saving {
            return None;
        }
        self.state = SyncState::Saving;
        Some(SaveTicket {
            revision: self.revision,
        })
    }

    pub fn finish_ok(&mut self, ticket: SaveTicket) -> SaveCompletion {
        self.state = SyncState::Idle;
        let clean = ticket.revision == self.revision;
        let reschedule = !clean || std::mem::take(&mut self.missed);
        SaveCompletion { clean, reschedule }
    }

    /// Moves to the state matching the failure and returns it.
    pub fn finish_err(&mut self, err: &SyncError) -> SyncState {
        self.missed = false;
        self.state = match err {
            SyncError::NetworkUnavailable(_) => SyncState::Offline,
            SyncError::AuthExpired => SyncState::AuthRetry,
            _ => SyncState::Idle,
        };
        self.state
    }

    /// Leaves `AuthRetry`. Other states belong to a save that is still
    /// running and are left alone.
    pub fn auth_recovered(&mut self) {
        if self.state == SyncState::AuthRetry {
            self.state = SyncState::Idle;
        }
    }

    pub fn auth_failed(&mut self) {
        if self.state == SyncState::AuthRetry {
            self.missed = false;
            self.state = SyncState::Idle;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// The most recent `hour`:00 local time at or before `now`: today's if it
/// has passed, otherwise yesterday's.
pub fn sync_threshold<Tz: TimeZone>(now: &DateTime<Tz>, hour: u32) -> Option<DateTime<Tz>> {
    let today = now.date_naive().and_hms_opt(hour.min(23), 0, 0)?;
    let threshold = now.timezone().from_local_datetime(&today).earliest()?;
    if *now >= threshold {
        Some(threshold)
    } else {
        Some(threshold - Duration::days(1))
    }
}

/// Whether master data must be fetched again.
pub fn master_refresh_due<Tz: TimeZone>(
    now: &DateTime<Tz>,
    last_sync: Option<DateTime<Utc>>,
    has_users: bool,
    hour: u32,
) -> bool {
    if !has_users {
        return true;
    }
    match (last_sync, sync_threshold(now, hour)) {
        (Some(last), Some(threshold)) => last < threshold,
        _ => true,
    }
}
