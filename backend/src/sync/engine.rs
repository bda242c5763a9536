//! The inspection engine.
//!
//! Holds the active session and everything cached alongside it, applies user
//! actions to it, and keeps the remote store and the local store in step.
//! Session mutations run synchronously under the state lock; remote calls
//! are made with the lock released and their results are dropped when the
//! session they belong to has been closed in the meantime.

use crate::config::Config;
use crate::error::{Result, SyncError};
use crate::remote::{AuthProvider, RemoteStore};
use crate::store::{self, LocalStore, StoreWriter};
use crate::sync::debounce::Debouncer;
use crate::sync::scheduler::{master_refresh_due, SyncScheduler};
use chrono::{DateTime, Local, Utc};
use common::jobs::{Notification, SyncState};
use common::model::{
    Asset, HolderStats, RawRecord, RelationTag, RemoteFile, Session, TradeLogEntry, TradeLogGroup,
    UserDirectory,
};
use common::reconcile::trade_log::{aggregate, unseen_entries};
use common::reconcile::{build_assets, merge_master, partition, preserve_local_inspection};
use common::requests::{LogAssetChangeRequest, SessionSummary};
use common::schema::AliasRegistry;
use futures_util::future::try_join3;
use log::{debug, error, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::pin::pin;
use std::sync::Arc;
use tokio::sync::{mpsc, Notify, RwLock};

const INSPECTION_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const BACKUP_STAMP_FORMAT: &str = "%Y-%m-%dT%H%M";

/// What a master refresh read and changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MasterRefreshReport {
    pub users: usize,
    pub assets: usize,
    pub trade: usize,
    pub trade_appended: usize,
    pub inserted: usize,
    pub updated: usize,
}

#[derive(Default)]
struct EngineState {
    session: Session,
    users: UserDirectory,
    user_records: Vec<RawRecord>,
    trade_logs: Vec<RawRecord>,
    global_trade_logs: Vec<RawRecord>,
    master_files: Vec<RemoteFile>,
    session_files: Vec<RemoteFile>,
    authenticated: bool,
    scheduler: SyncScheduler,
    last_saved_at: Option<DateTime<Local>>,
    notification: Option<Notification>,
    generation: u64,
}

impl EngineState {
    /// Detaches in-flight remote results from whatever session comes next.
    fn next_generation(&mut self) {
        self.generation += 1;
        self.scheduler.reset();
    }
}

pub struct InspectionEngine {
    config: Config,
    registry: AliasRegistry,
    remote: Arc<dyn RemoteStore>,
    auth: Arc<dyn AuthProvider>,
    store: StoreWriter,
    state: RwLock<EngineState>,
    debouncer: Debouncer,
    /// Signalled whenever a session write finishes or the scheduler is reset.
    save_idle: Notify,
}

/// Why the session sheet is being written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    /// Debounced or explicit save; skipped when nothing is dirty or a save
    /// is already running.
    Save,
    /// Unsaved edits must reach their file before another session replaces
    /// them.
    Flush,
    /// Written whatever the dirty flag says, ahead of a backup copy.
    Backup,
}

enum SessionWrite {
    Written {
        file: RemoteFile,
        records: Vec<RawRecord>,
    },
    /// Nothing to write, or the session closed while the write was in flight.
    Skipped,
    /// Another write holds the scheduler.
    Busy,
}

fn retag_trade(mut records: Vec<RawRecord>) -> Vec<RawRecord> {
    for record in &mut records {
        record.relation = RelationTag::Trade;
    }
    records
}

impl InspectionEngine {
    /// Builds the engine from whatever the local store still holds, so a
    /// restart resumes the last session without touching the network.
    pub fn new(
        config: Config,
        remote: Arc<dyn RemoteStore>,
        auth: Arc<dyn AuthProvider>,
        local: LocalStore,
        save_tx: mpsc::Sender<()>,
    ) -> Self {
        let registry = config.alias_registry();
        let token: Option<String> = local.get(store::ACCESS_TOKEN);
        remote.set_token(token.clone());

        let user_records: Vec<RawRecord> = local.get(store::CACHED_USERS).unwrap_or_default();
        let mut session = Session::new(
            local.get(store::CURRENT_SESSION_FILE),
            local.get(store::CACHED_ASSETS).unwrap_or_default(),
            local.get(store::CACHED_SCANNED_IDS).unwrap_or_default(),
        );
        session.dirty = local.get(store::HAS_PENDING_SYNC).unwrap_or(false);
        session.last_master_sync = local.get(store::LAST_MASTER_SYNC);

        let state = EngineState {
            session,
            users: UserDirectory::from_records(&registry, &user_records),
            user_records,
            trade_logs: local.get(store::CACHED_TRADE_LOGS).unwrap_or_default(),
            global_trade_logs: local.get(store::CACHED_GLOBAL_TRADE_LOGS).unwrap_or_default(),
            authenticated: token.is_some(),
            ..EngineState::default()
        };
        let debouncer = Debouncer::new(config.debounce(), save_tx);

        Self {
            config,
            registry,
            remote,
            auth,
            store: StoreWriter::spawn(local),
            state: RwLock::new(state),
            debouncer,
            save_idle: Notify::new(),
        }
    }

    fn persist<T: Serialize + ?Sized>(&self, key: &'static str, value: &T) {
        self.store.set(key, value);
    }

    fn persist_session(&self, session: &Session) {
        self.persist(store::CACHED_ASSETS, &session.assets);
        self.persist(store::CACHED_SCANNED_IDS, &session.scanned_ids);
        self.persist(store::HAS_PENDING_SYNC, &session.dirty);
        match &session.file {
            Some(file) => self.persist(store::CURRENT_SESSION_FILE, file),
            None => self.store.remove(store::CURRENT_SESSION_FILE),
        }
    }

    fn required<'a>(value: &'a str, what: &str) -> Result<&'a str> {
        if value.is_empty() {
            Err(SyncError::ConfigurationMissing(what.to_string()))
        } else {
            Ok(value)
        }
    }

    async fn notify(&self, notification: Notification) {
        self.state.write().await.notification = Some(notification);
    }

    /// Waits until everything queued for the local store is on disk.
    pub async fn flush_local(&self) {
        self.store.flush().await;
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.authenticated
    }

    /// Re-arms the save timer when the last run ended with unsaved changes.
    pub async fn resume_pending(&self) {
        let state = self.state.read().await;
        if state.authenticated
            && state.session.dirty
            && state.session.file.is_some()
            && !self.debouncer.is_armed()
        {
            info!("Unsaved changes found from the previous run; scheduling a save");
            self.debouncer.arm();
        }
    }

    // ---- authentication -------------------------------------------------

    pub async fn sign_in(&self, token: String) -> Result<()> {
        self.remote.set_token(Some(token.clone()));
        self.persist(store::ACCESS_TOKEN, &token);
        self.state.write().await.authenticated = true;
        info!("Signed in");
        self.initialize_data().await?;
        self.resume_pending().await;
        Ok(())
    }

    pub async fn sign_out(&self) {
        if self.debouncer.cancel() {
            debug!("Pending save dropped");
        }
        self.remote.set_token(None);
        self.store.clear();
        {
            let mut state = self.state.write().await;
            let generation = state.generation;
            *state = EngineState {
                generation,
                ..EngineState::default()
            };
            state.next_generation();
        }
        self.save_idle.notify_waiters();
        info!("Signed out");
    }

    /// One silent credential refresh. On failure the credential is purged
    /// and the engine stays signed out until the user signs in again.
    async fn recover_auth(&self) -> bool {
        warn!("Credential expired; attempting silent refresh");
        match self.auth.refresh().await {
            Ok(token) => {
                self.remote.set_token(Some(token.clone()));
                self.persist(store::ACCESS_TOKEN, &token);
                let mut state = self.state.write().await;
                state.scheduler.auth_recovered();
                state.notification = Some(Notification::info("Connection re-established"));
                info!("Silent refresh succeeded");
                true
            }
            Err(e) => {
                error!("Silent refresh failed: {}", e);
                self.remote.set_token(None);
                self.store.remove(store::ACCESS_TOKEN);
                let mut state = self.state.write().await;
                state.authenticated = false;
                state.scheduler.auth_failed();
                state.notification = Some(Notification::error(
                    "Session expired; please sign in again",
                ));
                false
            }
        }
    }

    /// Turns an action failure into the user-facing notification, recovering
    /// the credential first when it expired.
    pub async fn handle_error(&self, err: &SyncError) -> Notification {
        let notification = match err {
            SyncError::AuthExpired => {
                if self.is_authenticated().await && self.recover_auth().await {
                    Notification::info("Connection re-established; please try again")
                } else {
                    Notification::error("Session expired; please sign in again")
                }
            }
            err if err.is_network() => {
                Notification::error("Network unavailable; changes are kept on this device")
            }
            other => Notification::error(other.to_string()),
        };
        warn!("Action failed: {}", err);
        self.notify(notification.clone()).await;
        notification
    }

    // ---- bootstrap and file lists ---------------------------------------

    /// Lists master and session files and loads the global movement log,
    /// all at once. The first failure aborts the whole bootstrap.
    pub async fn initialize_data(&self) -> Result<()> {
        let master_folder = Self::required(&self.config.master_folder_id, "master folder id")?;
        let (masters, sessions, global) = try_join3(
            self.remote.list_files(master_folder),
            self.list_session_files(),
            self.fetch_global_trade_logs(),
        )
        .await?;
        info!(
            "Found {} masters and {} existing sessions",
            masters.len(),
            sessions.len()
        );

        let mut state = self.state.write().await;
        state.master_files = masters;
        state.session_files = sessions;
        if !global.is_empty() {
            self.persist(store::CACHED_GLOBAL_TRADE_LOGS, &global);
            state.global_trade_logs = global;
        }
        Ok(())
    }

    async fn list_session_files(&self) -> Result<Vec<RemoteFile>> {
        let folder = Self::required(&self.config.backup_folder_id, "backup folder id")?;
        let mut files = self.remote.list_files(folder).await?;
        files.retain(|f| f.name != self.config.trade_log_file_name);
        Ok(files)
    }

    pub async fn master_files(&self) -> Vec<RemoteFile> {
        self.state.read().await.master_files.clone()
    }

    pub async fn session_files(&self) -> Vec<RemoteFile> {
        self.state.read().await.session_files.clone()
    }

    async fn latest_master(&self) -> Result<Option<RemoteFile>> {
        let folder = Self::required(&self.config.master_folder_id, "master folder id")?;
        let mut files = self.remote.list_files(folder).await?;
        files.sort_by(|a, b| b.modified_time.cmp(&a.modified_time));
        Ok(files.into_iter().next())
    }

    // ---- session lifecycle ----------------------------------------------

    /// Creates a session file from the live assets of a master file and
    /// loads it.
    pub async fn start_session(&self, master_id: &str, session_name: &str) -> Result<RemoteFile> {
        self.flush_current(None).await?;
        let parts = partition(self.remote.fetch_tabular_data(master_id).await?);
        let users = if parts.users.is_empty() {
            self.state.read().await.users.clone()
        } else {
            UserDirectory::from_records(&self.registry, &parts.users)
        };
        let assets = build_assets(&self.registry, &parts.assets, &users);
        info!("Master {} has {} live assets", master_id, assets.len());
        if assets.is_empty() {
            return Err(SyncError::NoDataFound(format!(
                "no assets in master file {master_id}"
            )));
        }
        if !parts.users.is_empty() {
            let mut state = self.state.write().await;
            state.users = users;
            self.persist(store::CACHED_USERS, &parts.users);
            state.user_records = parts.users;
        }

        let rows: Vec<RawRecord> = assets.iter().map(|a| a.to_record(&self.registry)).collect();
        let file = self.remote.create_file(session_name, &rows).await?;
        self.state.write().await.session_files.insert(0, file.clone());
        self.load_session(file.clone()).await?;
        Ok(file)
    }

    /// Binds `file` as the current session and reads it.
    ///
    /// Unsaved edits of another session are written to their own file first;
    /// if that fails the switch is refused. Reloading the current file keeps
    /// the local inspection fields, which are never older than the remote
    /// copy.
    pub async fn load_session(&self, file: RemoteFile) -> Result<()> {
        self.flush_current(Some(&file.id)).await?;
        let parts = partition(self.remote.fetch_tabular_data(&file.id).await?);
        {
            let mut guard = self.state.write().await;
            let state = &mut *guard;
            if !parts.users.is_empty() {
                state.users = UserDirectory::from_records(&self.registry, &parts.users);
                state.user_records = parts.users;
                self.persist(store::CACHED_USERS, &state.user_records);
            }
            let assets = build_assets(&self.registry, &parts.assets, &state.users);
            let same_file = state.session.file.as_ref().is_some_and(|f| f.id == file.id);

            if same_file {
                debug!("Reloading {} over the local copy", file.name);
                let merged = preserve_local_inspection(assets, &state.session.assets);
                state.session.replace_assets(merged);
                state.session.file = Some(file.clone());
            } else {
                let last_master_sync = state.session.last_master_sync;
                state.session = Session::new(Some(file.clone()), assets, Vec::new());
                state.session.last_master_sync = last_master_sync;
                state.next_generation();
                self.save_idle.notify_waiters();
            }
            state.trade_logs = parts.trade;
            self.persist(store::CACHED_TRADE_LOGS, &state.trade_logs);
            self.persist_session(&state.session);
            info!(
                "Loaded session \"{}\" with {} assets",
                file.name,
                state.session.assets.len()
            );
        }

        if let Err(e) = self.check_and_sync_master().await {
            self.handle_error(&e).await;
        }
        self.refresh_global_trade_logs().await;
        Ok(())
    }

    // ---- master refresh -------------------------------------------------

    /// Refreshes master data when the daily window has passed or no users
    /// are known yet. Returns whether a refresh ran.
    pub async fn check_and_sync_master(&self) -> Result<bool> {
        let (authenticated, last_sync, has_users) = {
            let state = self.state.read().await;
            (
                state.authenticated,
                state.session.last_master_sync,
                !state.users.is_empty(),
            )
        };
        if !authenticated {
            return Ok(false);
        }
        if !master_refresh_due(&Local::now(), last_sync, has_users, self.config.master_sync_hour) {
            debug!("Master sync not needed (last {:?})", last_sync);
            return Ok(false);
        }
        info!(
            "Master sync {} (last {:?})",
            if has_users { "required" } else { "initial" },
            last_sync
        );
        self.refresh_master().await.map(|_| true)
    }

    /// Pulls the latest master file: replaces users, forwards its movement
    /// rows to the global log and merges its assets into the session.
    pub async fn refresh_master(&self) -> Result<MasterRefreshReport> {
        let pending = {
            let state = self.state.read().await;
            state.session.file.is_some() && state.session.dirty
        };
        if pending {
            self.save_in_background().await;
        }

        let Some(master) = self.latest_master().await? else {
            info!("No master file available");
            return Ok(MasterRefreshReport::default());
        };
        let parts = partition(self.remote.fetch_tabular_data(&master.id).await?);
        let mut report = MasterRefreshReport {
            users: parts.users.len(),
            assets: parts.assets.len(),
            trade: parts.trade.len(),
            ..MasterRefreshReport::default()
        };
        self.notify(Notification::info(format!(
            "Master read: {} users, {} assets, {} movements",
            report.users, report.assets, report.trade
        )))
        .await;

        if !parts.trade.is_empty() {
            report.trade_appended = self.sync_master_trade_to_global(&parts.trade).await?;
        }

        let changed = {
            let mut guard = self.state.write().await;
            let state = &mut *guard;
            if !parts.users.is_empty() {
                state.users = UserDirectory::from_records(&self.registry, &parts.users);
                state.user_records = parts.users;
                self.persist(store::CACHED_USERS, &state.user_records);
            }
            state.trade_logs.clear();
            self.persist(store::CACHED_TRADE_LOGS, &state.trade_logs);

            let mut changed = false;
            if state.session.file.is_some() && !parts.assets.is_empty() {
                let outcome = merge_master(
                    &self.registry,
                    &state.session.assets,
                    &parts.assets,
                    &state.users,
                );
                report.inserted = outcome.inserted;
                report.updated = outcome.updated;
                if outcome.changed() {
                    state.session.replace_assets(outcome.assets);
                    state.session.dirty = true;
                    state.scheduler.note_mutation();
                    changed = true;
                }
            }

            let now = Utc::now();
            state.session.last_master_sync = Some(now);
            self.persist(store::LAST_MASTER_SYNC, &now);
            self.persist_session(&state.session);
            changed
        };

        self.refresh_global_trade_logs().await;
        if changed {
            self.save_in_background().await;
        }
        self.notify(Notification::success("Master data synchronized"))
            .await;
        info!("Master refresh finished: {:?}", report);
        Ok(report)
    }

    // ---- global movement log --------------------------------------------

    async fn trade_log_file(&self) -> Result<Option<(RemoteFile, Vec<RawRecord>)>> {
        let folder = Self::required(&self.config.backup_folder_id, "backup folder id")?;
        let file = self
            .remote
            .list_files(folder)
            .await?
            .into_iter()
            .find(|f| f.name == self.config.trade_log_file_name);
        match file {
            Some(file) => {
                let records = retag_trade(self.remote.fetch_tabular_data(&file.id).await?);
                Ok(Some((file, records)))
            }
            None => Ok(None),
        }
    }

    async fn fetch_global_trade_logs(&self) -> Result<Vec<RawRecord>> {
        Ok(self
            .trade_log_file()
            .await?
            .map(|(_, records)| records)
            .unwrap_or_default())
    }

    /// Appends `entries` to the global log, creating the file on first use.
    async fn write_trade_entries(
        &self,
        target: Option<(RemoteFile, Vec<RawRecord>)>,
        entries: &[TradeLogEntry],
    ) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let (file_id, header, with_header) = match target {
            Some((file, existing)) => match existing.first() {
                Some(first) => (file.id, first.headers().to_vec(), false),
                None => (file.id, TradeLogEntry::canonical_header(), true),
            },
            None => {
                let file = self
                    .remote
                    .create_file(&self.config.trade_log_file_name, &[])
                    .await?;
                (file.id, TradeLogEntry::canonical_header(), true)
            }
        };
        let mut rows = Vec::with_capacity(entries.len() + 1);
        if with_header {
            rows.push(header.clone());
        }
        rows.extend(entries.iter().map(|e| e.to_row(&self.registry, &header)));
        self.remote.append_rows(&file_id, rows).await
    }

    async fn sync_master_trade_to_global(&self, master_trade: &[RawRecord]) -> Result<usize> {
        let target = self.trade_log_file().await?;
        let existing = target.as_ref().map(|(_, r)| r.as_slice()).unwrap_or_default();
        let fresh = unseen_entries(&self.registry, existing, master_trade);
        info!("{} of {} master movements are new", fresh.len(), master_trade.len());
        self.write_trade_entries(target, &fresh).await?;
        Ok(fresh.len())
    }

    /// Reloads the global log. Failures are logged and the cache kept.
    pub async fn refresh_global_trade_logs(&self) {
        match self.fetch_global_trade_logs().await {
            Ok(logs) if !logs.is_empty() => {
                self.persist(store::CACHED_GLOBAL_TRADE_LOGS, &logs);
                let count = logs.len();
                self.state.write().await.global_trade_logs = logs;
                debug!("Global trade log refreshed: {} rows", count);
            }
            Ok(_) => warn!("Global trade log is empty"),
            Err(e) => error!("Failed to fetch global trade logs: {}", e),
        }
    }

    /// Records that `asset_number` moved to a new holder today.
    pub async fn log_asset_change(&self, req: LogAssetChangeRequest) -> Result<TradeLogEntry> {
        let entry = TradeLogEntry {
            date: Local::now().format("%Y-%m-%d").to_string(),
            asset_number: req.asset_number,
            holder_id: req.holder_id,
            prior_holder_id: req.prior_holder_id,
            note: req.note,
        };
        let target = self.trade_log_file().await?;
        self.write_trade_entries(target, std::slice::from_ref(&entry))
            .await?;

        let mut state = self.state.write().await;
        state.global_trade_logs.push(entry.to_record());
        self.persist(store::CACHED_GLOBAL_TRADE_LOGS, &state.global_trade_logs);
        info!("Global trade log appended for {}", entry.asset_number);
        Ok(entry)
    }

    pub async fn trade_logs(
        &self,
        query: Option<&str>,
        limit: Option<usize>,
    ) -> Vec<TradeLogGroup> {
        let state = self.state.read().await;
        let mut records = state.global_trade_logs.clone();
        records.extend(state.trade_logs.iter().cloned());
        aggregate(
            &self.registry,
            &records,
            &state.users,
            query,
            limit.unwrap_or(self.config.reference_limit),
        )
    }

    // ---- session mutations ----------------------------------------------

    /// Applies `change` under the state lock. A change that reports `true`
    /// is a write-triggering mutation and arms the save timer.
    async fn mutate(&self, change: impl FnOnce(&mut Session) -> bool) -> bool {
        let changed = {
            let mut state = self.state.write().await;
            let changed = change(&mut state.session);
            if changed {
                state.scheduler.note_mutation();
                self.persist_session(&state.session);
            }
            changed
        };
        if changed {
            self.debouncer.arm();
        }
        changed
    }

    async fn asset(&self, asset_number: &str) -> Option<Asset> {
        self.state.read().await.session.asset(asset_number).cloned()
    }

    pub async fn scan(&self, asset_number: &str) -> Option<Asset> {
        let now = Local::now().format(INSPECTION_TIME_FORMAT).to_string();
        if !self.mutate(|s| s.scan(asset_number, now)).await {
            return None;
        }
        self.asset(asset_number).await
    }

    pub async fn cancel_check(&self, asset_number: &str) -> Option<Asset> {
        if !self.mutate(|s| s.cancel_check(asset_number)).await {
            return None;
        }
        self.asset(asset_number).await
    }

    pub async fn set_note(&self, asset_number: &str, note: String) -> Option<Asset> {
        if !self.mutate(|s| s.set_note(asset_number, note)).await {
            return None;
        }
        self.asset(asset_number).await
    }

    pub async fn clear_scanned(&self) {
        let mut state = self.state.write().await;
        state.session.clear_scanned();
        self.persist(store::CACHED_SCANNED_IDS, &state.session.scanned_ids);
    }

    // ---- persistence ----------------------------------------------------

    /// Writes the session sheet under a scheduler ticket. A write result that
    /// arrives after the session was closed is dropped.
    async fn write_session(&self, mode: WriteMode) -> Result<SessionWrite> {
        let (ticket, file, records, generation) = {
            let mut guard = self.state.write().await;
            let state = &mut *guard;
            if !state.authenticated {
                return Err(SyncError::Unauthenticated);
            }
            let Some(file) = state.session.file.clone() else {
                return Ok(SessionWrite::Skipped);
            };
            if mode != WriteMode::Backup && !state.session.dirty {
                return Ok(SessionWrite::Skipped);
            }
            let ticket = match mode {
                WriteMode::Save => state.scheduler.begin_save(),
                WriteMode::Flush | WriteMode::Backup => state.scheduler.begin_exclusive(),
            };
            let Some(ticket) = ticket else {
                return Ok(SessionWrite::Busy);
            };
            (
                ticket,
                file,
                state.session.asset_records(&self.registry),
                state.generation,
            )
        };

        let result = self.remote.write_tabular_data(&file.id, &records).await;

        let mut guard = self.state.write().await;
        let state = &mut *guard;
        if state.generation != generation {
            debug!("Discarding write result for a closed session");
            return Ok(SessionWrite::Skipped);
        }
        match result {
            Ok(()) => {
                let done = state.scheduler.finish_ok(ticket);
                let saved_at = Local::now();
                state.last_saved_at = Some(saved_at);
                if done.clean {
                    state.session.dirty = false;
                    self.persist(store::HAS_PENDING_SYNC, &false);
                }
                info!(
                    "Session sheet written at {} ({} rows, {:?})",
                    saved_at.format("%H:%M:%S"),
                    records.len(),
                    mode
                );
                drop(guard);
                self.save_idle.notify_waiters();
                if done.reschedule {
                    debug!("Changes arrived during the write; scheduling a save");
                    self.debouncer.arm();
                }
                Ok(SessionWrite::Written { file, records })
            }
            Err(err) => {
                let next = state.scheduler.finish_err(&err);
                drop(guard);
                self.save_idle.notify_waiters();
                warn!("Session write failed ({:?}): {}", next, err);
                Err(err)
            }
        }
    }

    /// Like [`Self::write_session`], but waits for a running save instead of
    /// giving up.
    async fn write_session_exclusive(&self, mode: WriteMode) -> Result<SessionWrite> {
        loop {
            // Registered before the attempt so a save finishing in between
            // still wakes us.
            let mut idle = pin!(self.save_idle.notified());
            idle.as_mut().enable();
            match self.write_session(mode).await? {
                SessionWrite::Busy => {
                    debug!("{:?} waiting for the running save", mode);
                    idle.await;
                }
                outcome => return Ok(outcome),
            }
        }
    }

    /// Writes unsaved edits of the current session unless it is `keep`.
    async fn flush_current(&self, keep: Option<&str>) -> Result<()> {
        loop {
            let pending = {
                let state = self.state.read().await;
                state.authenticated
                    && state.session.dirty
                    && state
                        .session
                        .file
                        .as_ref()
                        .is_some_and(|f| Some(f.id.as_str()) != keep)
            };
            if !pending {
                return Ok(());
            }
            info!("Writing unsaved edits before switching sessions");
            if let SessionWrite::Skipped = self.write_session_exclusive(WriteMode::Flush).await? {
                return Ok(());
            }
        }
    }

    /// Writes the session when it has unsaved changes. `Ok(false)` means
    /// nothing was written: no session, nothing dirty, a save already in
    /// flight, or the session closed before the write returned.
    pub async fn save(&self) -> Result<bool> {
        Ok(matches!(
            self.write_session(WriteMode::Save).await?,
            SessionWrite::Written { .. }
        ))
    }

    /// Debounced save entry point. Failures never propagate; they move the
    /// scheduler and surface as notifications.
    pub async fn save_in_background(&self) {
        match self.save().await {
            Ok(_) => {}
            Err(SyncError::AuthExpired) => {
                if self.recover_auth().await {
                    self.debouncer.arm();
                }
            }
            Err(SyncError::NetworkUnavailable(e)) => {
                info!("Offline; change kept for the next save ({})", e);
                self.notify(Notification::error(
                    "Network unavailable; changes are kept on this device",
                ))
                .await;
            }
            Err(SyncError::Unauthenticated) => debug!("Not signed in; save skipped"),
            Err(e) => {
                error!("Save failed: {}", e);
                self.notify(Notification::error(format!("Save failed: {e}")))
                    .await;
            }
        }
    }

    /// Writes the session as it is, then copies it to
    /// `<name>_BK_<timestamp>` in the backup folder. The write takes its turn
    /// with background saves, so an older snapshot never lands after a newer
    /// one.
    pub async fn backup_and_save(&self) -> Result<RemoteFile> {
        let SessionWrite::Written { file, records } =
            self.write_session_exclusive(WriteMode::Backup).await?
        else {
            return Err(SyncError::NoDataFound("no session loaded".to_string()));
        };
        let name = format!("{}_BK_{}", file.name, Utc::now().format(BACKUP_STAMP_FORMAT));
        let backup = self.remote.create_file(&name, &records).await?;
        info!("Backup \"{}\" created and session sheet updated", name);
        self.notify(Notification::success(format!("Backup {name} created")))
            .await;
        Ok(backup)
    }

    // ---- queries --------------------------------------------------------

    pub async fn summary(&self) -> SessionSummary {
        let state = self.state.read().await;
        SessionSummary {
            authenticated: state.authenticated,
            file: state.session.file.clone(),
            progress: state.session.progress(),
            departments: state.session.departments(),
            scanned_count: state.session.scanned_ids.len(),
            dirty: state.session.dirty,
            sync_state: state.scheduler.state(),
            last_saved_at: state
                .last_saved_at
                .map(|t| t.format("%H:%M:%S").to_string()),
            last_master_sync: state.session.last_master_sync.map(|t| t.to_rfc3339()),
            notification: state.notification.clone(),
        }
    }

    pub async fn sync_state(&self) -> SyncState {
        self.state.read().await.scheduler.state()
    }

    pub async fn assets(&self, department: Option<&str>, query: Option<&str>) -> Vec<Asset> {
        let state = self.state.read().await;
        state
            .session
            .filtered_assets(department, query)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn scanned_assets(&self, query: Option<&str>) -> Vec<Asset> {
        let state = self.state.read().await;
        state
            .session
            .scanned_assets(query)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn holder_stats(&self) -> BTreeMap<String, HolderStats> {
        self.state.read().await.session.holder_stats()
    }
}
