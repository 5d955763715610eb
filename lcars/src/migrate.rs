//! Atomic progress migration between season-level and episode-level ids.

use std::collections::BTreeMap;
use std::sync::Arc;

use lcars_core::{Catalog, Clock, KvStore};
use lcars_types::{
    EpisodeId, Event, EventSink, LcarsError, MigrationRecord, MigrationReport, MigrationState,
    MigrationTransaction, ProgressVersion, SeasonId,
};

const TX_PREFIX: &str = "migration_transaction_";

/// Rewrites the persisted viewing-progress list between representations.
///
/// Every public operation returns a [`MigrationReport`]; migrations never
/// raise to their caller. Individual id conversion problems are collected in
/// the report and the offending input preserved verbatim. A corrupt
/// persisted state is replaced with defaults under a logged warning.
pub struct MigrationEngine {
    store: Arc<dyn KvStore>,
    catalog: Arc<dyn Catalog>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink>,
}

impl MigrationEngine {
    /// Fixed key the progress list is persisted under.
    pub const PROGRESS_KEY: &'static str = "viewing_progress";
    /// Fixed key the migration-state singleton is persisted under.
    pub const STATE_KEY: &'static str = "migration_state";

    /// An engine over the given store and catalog.
    #[must_use]
    pub fn new(
        store: Arc<dyn KvStore>,
        catalog: Arc<dyn Catalog>,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            store,
            catalog,
            clock,
            sink,
        }
    }

    fn tx_key(id: u64) -> String {
        format!("{TX_PREFIX}{id}")
    }

    /// The persisted migration state; corrupt or missing state yields
    /// defaults (season-level, no history).
    pub async fn state(&self) -> MigrationState {
        match self.store.get(Self::STATE_KEY).await {
            Ok(Some(raw)) => serde_json::from_slice(&raw).unwrap_or_else(|err| {
                tracing::warn!(
                    target: "lcars::migrate",
                    %err,
                    "corrupt migration state; falling back to defaults"
                );
                MigrationState::default()
            }),
            Ok(None) => MigrationState::default(),
            Err(err) => {
                tracing::warn!(
                    target: "lcars::migrate",
                    %err,
                    "unreadable migration state; falling back to defaults"
                );
                MigrationState::default()
            }
        }
    }

    /// The persisted progress list; corrupt or missing data yields an empty
    /// list under a logged warning.
    pub async fn progress(&self) -> Vec<String> {
        match self.store.get(Self::PROGRESS_KEY).await {
            Ok(Some(raw)) => serde_json::from_slice(&raw).unwrap_or_else(|err| {
                tracing::warn!(
                    target: "lcars::migrate",
                    %err,
                    "corrupt progress list; treating as empty"
                );
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(err) => {
                tracing::warn!(
                    target: "lcars::migrate",
                    %err,
                    "unreadable progress list; treating as empty"
                );
                Vec::new()
            }
        }
    }

    /// Open transactions left behind by interrupted migrations, for manual
    /// retry.
    pub async fn open_transactions(&self) -> Vec<MigrationTransaction> {
        let Ok(keys) = self.store.list_keys(TX_PREFIX).await else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for key in keys {
            if let Ok(Some(raw)) = self.store.get(&key).await
                && let Ok(tx) = serde_json::from_slice::<MigrationTransaction>(&raw)
            {
                out.push(tx);
            }
        }
        out
    }

    /// Rewrite season-level progress to episode-level.
    ///
    /// Season ids with catalog data expand to the full episode list; ids the
    /// catalog does not know are preserved verbatim with a warning, as are
    /// non-season ids (movies, specials).
    pub async fn migrate_to_episode_level(&self) -> MigrationReport {
        let original = self.progress().await;
        let mut report = MigrationReport::default();

        let mut out: Vec<String> = Vec::new();
        for item in &original {
            if EpisodeId::parse(item).is_ok() {
                out.push(item.clone());
                report.preserved += 1;
                continue;
            }
            match SeasonId::parse(item) {
                Ok(season) => {
                    let episodes = self
                        .catalog
                        .episodes_of_season(season.series(), season.season());
                    if episodes.is_empty() {
                        report
                            .warnings
                            .push(format!("no catalog data for {item}; preserved verbatim"));
                        out.push(item.clone());
                        report.preserved += 1;
                    } else {
                        out.extend(episodes.iter().map(|e| e.id.to_string()));
                        report.converted += 1;
                    }
                }
                Err(_) => {
                    out.push(item.clone());
                    report.preserved += 1;
                }
            }
        }
        dedup_in_place(&mut out);

        self.commit(
            original,
            out,
            ProgressVersion::EpisodeLevel,
            true,
            report,
        )
        .await
    }

    /// Coalesce episode-level progress back to season-level.
    ///
    /// A season id is emitted only when every episode of that season is
    /// present; a partial season is dropped, which is lossy and clears
    /// `can_rollback`. Non-episode ids are preserved in place.
    pub async fn rollback_to_season_level(&self) -> MigrationReport {
        let original = self.progress().await;
        let mut report = MigrationReport::default();

        // Group episode ids by season, keeping input order for everything.
        let mut groups: BTreeMap<String, Vec<EpisodeId>> = BTreeMap::new();
        for item in &original {
            if let Ok(id) = EpisodeId::parse(item) {
                groups
                    .entry(id.season_id().to_string())
                    .or_default()
                    .push(id);
            }
        }

        let mut lossless = true;
        let mut out: Vec<String> = Vec::new();
        let mut emitted: std::collections::HashSet<String> = std::collections::HashSet::new();
        for item in &original {
            let Ok(id) = EpisodeId::parse(item) else {
                out.push(item.clone());
                report.preserved += 1;
                continue;
            };
            let season_key = id.season_id().to_string();
            if !emitted.insert(season_key.clone()) {
                continue;
            }
            let members = &groups[&season_key];
            let expected = self
                .catalog
                .episodes_of_season(id.series(), id.season())
                .len();
            let complete = expected > 0
                && members
                    .iter()
                    .map(ToString::to_string)
                    .collect::<std::collections::HashSet<_>>()
                    .len()
                    == expected;
            if complete {
                out.push(season_key);
                report.converted += 1;
            } else {
                report.dropped += members.len();
                lossless = false;
                report.warnings.push(format!(
                    "partial season {season_key}: dropped {} episode(s) on rollback",
                    members.len()
                ));
            }
        }
        dedup_in_place(&mut out);

        self.commit(
            original,
            out,
            ProgressVersion::SeasonLevel,
            lossless,
            report,
        )
        .await
    }

    /// Restore the snapshot of an open transaction and record the rollback.
    pub async fn abort_transaction(&self, tx_id: u64) -> MigrationReport {
        let mut report = MigrationReport::default();
        let key = Self::tx_key(tx_id);
        let tx: MigrationTransaction = match self.store.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_slice(&raw) {
                Ok(tx) => tx,
                Err(err) => {
                    report.errors.push(format!("corrupt transaction {tx_id}: {err}"));
                    return report;
                }
            },
            Ok(None) => {
                report.errors.push(format!("no open transaction {tx_id}"));
                return report;
            }
            Err(err) => {
                report.errors.push(err.to_string());
                return report;
            }
        };

        if let Err(err) = self.set_progress(&tx.snapshot).await {
            report.errors.push(err.to_string());
            return report;
        }
        let mut state = self.state().await;
        state.open_transaction = None;
        if let Err(err) = self.set_state(&state).await {
            report.errors.push(err.to_string());
            return report;
        }
        let _ = self.store.remove(&key).await;
        self.sink
            .emit(&Event::MigrationRolledBack { transaction: tx_id });
        report.success = true;
        report.progress = tx.snapshot;
        report.can_rollback = state.rollback_available;
        report
    }

    async fn set_progress(&self, progress: &[String]) -> Result<(), LcarsError> {
        let bytes =
            serde_json::to_vec(progress).map_err(|e| LcarsError::Storage(e.to_string()))?;
        self.store.set(Self::PROGRESS_KEY, bytes).await
    }

    async fn set_state(&self, state: &MigrationState) -> Result<(), LcarsError> {
        let bytes = serde_json::to_vec(state).map_err(|e| LcarsError::Storage(e.to_string()))?;
        self.store.set(Self::STATE_KEY, bytes).await
    }

    /// Run the transactional tail of a migration: persist the transaction,
    /// write the new progress, update the state singleton, clean up the
    /// transaction key. A storage failure leaves the transaction behind for
    /// manual retry and reports `success = false`.
    async fn commit(
        &self,
        original: Vec<String>,
        result: Vec<String>,
        target: ProgressVersion,
        lossless: bool,
        mut report: MigrationReport,
    ) -> MigrationReport {
        let now = self.clock.now_utc();
        let tx = MigrationTransaction {
            id: now.timestamp_millis().unsigned_abs(),
            started_at: now,
            snapshot: original.clone(),
            target,
            completed: false,
        };
        let tx_bytes = match serde_json::to_vec(&tx) {
            Ok(bytes) => bytes,
            Err(err) => {
                report.errors.push(err.to_string());
                return report;
            }
        };
        if let Err(err) = self.store.set(&Self::tx_key(tx.id), tx_bytes).await {
            report.errors.push(err.to_string());
            return report;
        }
        self.sink.emit(&Event::MigrationStarted { transaction: tx.id });

        let mut state = self.state().await;
        state.open_transaction = Some(tx.id);
        if let Err(err) = self.set_state(&state).await {
            report.errors.push(err.to_string());
            return report;
        }

        if let Err(err) = self.set_progress(&result).await {
            // Aborted: the persisted transaction remains for manual retry.
            report.errors.push(err.to_string());
            return report;
        }

        let record = MigrationRecord {
            from: state.current_version,
            to: target,
            at: now,
            item_count: result.len(),
        };
        state.current_version = target;
        state.last_migrated = Some(now);
        state.history.push(record.clone());
        state.open_transaction = None;
        match target {
            ProgressVersion::EpisodeLevel => {
                state.rollback_available = true;
                state.rollback_snapshot = Some(original);
            }
            ProgressVersion::SeasonLevel => {
                state.rollback_available = false;
                state.rollback_snapshot = None;
            }
        }
        if let Err(err) = self.set_state(&state).await {
            report.errors.push(err.to_string());
            return report;
        }
        let _ = self.store.remove(&Self::tx_key(tx.id)).await;

        self.sink.emit(&Event::MigrationCompleted { record });
        report.success = true;
        report.progress = result;
        report.can_rollback = match target {
            ProgressVersion::EpisodeLevel => state.rollback_available,
            ProgressVersion::SeasonLevel => lossless,
        };
        report
    }
}

fn dedup_in_place(items: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    items.retain(|item| seen.insert(item.clone()));
}
