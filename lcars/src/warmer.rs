//! Speculative cache warming.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use lcars_core::{Catalog, Clock};
use lcars_middleware::RequestCache;
use lcars_types::{
    EpisodeId, Event, EventSink, JobId, JobKind, JobSpec, WarmerConfig, WarmingStats,
    WarmingStrategy,
};

use crate::queue::JobQueue;

/// One warming request.
#[derive(Debug, Clone)]
pub enum WarmRequest {
    /// Series and season premieres across the catalog.
    Popular,
    /// The next few episodes after the most recently watched one.
    RecentlyWatched {
        /// The episode just watched.
        after: EpisodeId,
    },
    /// The next few episodes in series order from the current position.
    Sequential {
        /// The current position.
        after: EpisodeId,
    },
    /// The leading episodes of an era's first series.
    EraBased {
        /// Era id from the catalog.
        era: String,
    },
    /// Explicitly announced new content.
    NewContent {
        /// The new episode ids.
        ids: Vec<EpisodeId>,
    },
    /// A single manually requested episode.
    Manual {
        /// The episode to warm.
        id: EpisodeId,
    },
}

impl WarmRequest {
    /// The strategy tag recorded on jobs produced by this request.
    #[must_use]
    pub const fn strategy(&self) -> WarmingStrategy {
        match self {
            Self::Popular => WarmingStrategy::PopularEpisodes,
            Self::RecentlyWatched { .. } => WarmingStrategy::RecentlyWatched,
            Self::Sequential { .. } => WarmingStrategy::SequentialPrediction,
            Self::EraBased { .. } => WarmingStrategy::EraBased,
            Self::NewContent { .. } => WarmingStrategy::NewContent,
            Self::Manual { .. } => WarmingStrategy::Manual,
        }
    }
}

struct WarmState {
    last_wave: Option<DateTime<Utc>>,
    stats: WarmingStats,
}

/// Plans speculative enrichment and enqueues cache-warm jobs.
///
/// Waves are throttled by a minimum interval; a wave arriving early is
/// skipped and enqueues nothing. Episodes already queued for warming are
/// skipped via the queue's duplicate rejection.
pub struct CacheWarmer {
    catalog: Arc<dyn Catalog>,
    queue: JobQueue,
    cfg: WarmerConfig,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink>,
    cache: Option<Arc<RequestCache>>,
    state: Mutex<WarmState>,
}

impl CacheWarmer {
    /// A warmer enqueuing into `queue` from `catalog`.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn Catalog>,
        queue: JobQueue,
        cfg: WarmerConfig,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            catalog,
            queue,
            cfg,
            clock,
            sink,
            cache: None,
            state: Mutex::new(WarmState {
                last_wave: None,
                stats: WarmingStats::default(),
            }),
        }
    }

    /// Attach the request cache so statistics can report hit rates.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<RequestCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    fn lock_state(&self) -> MutexGuard<'_, WarmState> {
        self.state.lock().expect("mutex poisoned")
    }

    /// Run one warming wave. Returns the ids of the jobs actually enqueued;
    /// an empty result means the wave was throttled or every target was
    /// already queued.
    pub fn warm(&self, request: &WarmRequest) -> Vec<JobId> {
        let now = self.clock.now_utc();
        {
            let mut state = self.lock_state();
            if let Some(last) = state.last_wave
                && now.signed_duration_since(last)
                    < chrono::Duration::from_std(self.cfg.min_interval)
                        .unwrap_or_else(|_| chrono::Duration::seconds(60))
            {
                tracing::debug!(
                    target: "lcars::warmer",
                    strategy = request.strategy().as_str(),
                    "warming wave throttled by minimum interval"
                );
                return Vec::new();
            }
            state.last_wave = Some(now);
        }

        let strategy = request.strategy();
        let priority = self.cfg.default_priority + strategy.priority_delta();
        let mut enqueued = Vec::new();
        for target in self.targets(request) {
            match self
                .queue
                .add_job(JobSpec::cache_warm(target, priority, strategy))
            {
                Ok(id) => enqueued.push(id),
                // Already queued for warming; the uniqueness invariant holds.
                Err(_) => {}
            }
        }

        let stats = {
            let mut state = self.lock_state();
            state.stats.total += enqueued.len() as u64;
            *state.stats.per_strategy.entry(strategy).or_insert(0) += enqueued.len() as u64;
            state.stats.last_warmed_at = Some(now);
            state.stats.clone()
        };
        self.sink.emit(&Event::WarmingStatsUpdated { stats });
        enqueued
    }

    fn targets(&self, request: &WarmRequest) -> Vec<EpisodeId> {
        match request {
            WarmRequest::Popular => {
                let mut out = Vec::new();
                for series in self.catalog.series() {
                    for season in 1..=series.seasons {
                        if let Some(premiere) =
                            self.catalog.episodes_of_season(&series.id, season).first()
                        {
                            out.push(premiere.id.clone());
                        }
                    }
                }
                out
            }
            WarmRequest::RecentlyWatched { after } | WarmRequest::Sequential { after } => self
                .catalog
                .episodes_after(after, self.cfg.lookahead)
                .into_iter()
                .map(|e| e.id)
                .collect(),
            WarmRequest::EraBased { era } => {
                let Some(era) = self.catalog.eras().into_iter().find(|e| &e.id == era) else {
                    return Vec::new();
                };
                let Some(series) = era.series.first() else {
                    return Vec::new();
                };
                let mut out = Vec::new();
                let mut season = 1;
                while out.len() < self.cfg.era_lead {
                    let episodes = self.catalog.episodes_of_season(series, season);
                    if episodes.is_empty() {
                        break;
                    }
                    for entry in episodes {
                        if out.len() < self.cfg.era_lead {
                            out.push(entry.id);
                        }
                    }
                    season += 1;
                }
                out
            }
            WarmRequest::NewContent { ids } => ids.clone(),
            WarmRequest::Manual { id } => vec![id.clone()],
        }
    }

    /// Feed queue events back into the warming statistics. Callers wire this
    /// from their event sink; only cache-warm jobs are counted.
    pub fn observe(&self, event: &Event) {
        let (job, succeeded) = match event {
            Event::JobCompleted { job } => (job, true),
            Event::JobFailed { job } => (job, false),
            _ => return,
        };
        if job.kind != JobKind::CacheWarm {
            return;
        }
        let mut state = self.lock_state();
        if succeeded {
            state.stats.successful += 1;
        } else {
            state.stats.failed += 1;
        }
        let duration_ms = job
            .updated_at
            .signed_duration_since(job.created_at)
            .num_milliseconds()
            .max(0) as f64;
        let finished = (state.stats.successful + state.stats.failed) as f64;
        state.stats.avg_duration_ms += (duration_ms - state.stats.avg_duration_ms) / finished;
    }

    /// Current statistics, including the cache hit rate when a cache is
    /// attached.
    pub async fn stats(&self) -> WarmingStats {
        let mut stats = self.lock_state().stats.clone();
        if let Some(cache) = &self.cache {
            stats.cache_hit_rate = cache.stats().await.hit_rate;
        }
        stats
    }
}
