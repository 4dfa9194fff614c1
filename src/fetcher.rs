//! Meso fetcher pipeline
//!
//! ```text
//! LoadingStats → ComputingRanges → DetectingCandidates ─┬→ NothingToDo
//!                                                        └→ RenderingScript → Done
//! (any hard error) → Failed
//! ```
//!
//! One shot, no retries. The drop store connection is released before the
//! script is rendered.

use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, Instrument};

use crate::config::FetcherConfig;
use crate::detector::MissingEntryDetector;
use crate::logging::TimingSpan;
use crate::meso::compute_all_ranges;
use crate::script::{ScriptSummary, ScriptWriter};
use crate::storage::repository::{DropDataRepo, MonsterStatsRepo};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    LoadingStats,
    ComputingRanges,
    DetectingCandidates,
    RenderingScript,
    NothingToDo,
    Done,
    Failed,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunStage::LoadingStats => "loading stats",
            RunStage::ComputingRanges => "computing ranges",
            RunStage::DetectingCandidates => "detecting candidates",
            RunStage::RenderingScript => "rendering script",
            RunStage::NothingToDo => "nothing to do",
            RunStage::Done => "done",
            RunStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Monster stat catalog unavailable: {0}")]
    CatalogUnavailable(#[source] BoxError),
    #[error("drop_data query failed: {0}")]
    StoreQueryFailed(#[source] BoxError),
    #[error("Failed to write meso script: {0}")]
    ScriptWrite(#[from] std::io::Error),
}

impl FetchError {
    /// Stage the run was in when it failed
    pub fn stage(&self) -> RunStage {
        match self {
            FetchError::CatalogUnavailable(_) => RunStage::LoadingStats,
            FetchError::StoreQueryFailed(_) => RunStage::DetectingCandidates,
            FetchError::ScriptWrite(_) => RunStage::RenderingScript,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    ScriptWritten(ScriptSummary),
    /// Every eligible monster already has a meso drop; no file generated
    UpToDate,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub monsters_loaded: usize,
    pub ranges_computed: usize,
    pub candidates: usize,
    pub unknown_ids: usize,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn terminal_stage(&self) -> RunStage {
        match self.outcome {
            RunOutcome::ScriptWritten(_) => RunStage::Done,
            RunOutcome::UpToDate => RunStage::NothingToDo,
        }
    }
}

pub struct MesoFetcher {
    config: FetcherConfig,
    stats: Box<dyn MonsterStatsRepo>,
    drops: Box<dyn DropDataRepo>,
}

impl MesoFetcher {
    pub fn new(
        config: FetcherConfig,
        stats: Box<dyn MonsterStatsRepo>,
        drops: Box<dyn DropDataRepo>,
    ) -> Self {
        Self { config, stats, drops }
    }

    /// Run the whole pipeline once
    pub async fn run(&self) -> Result<RunReport, FetchError> {
        let result = self.run_stages().await;
        if let Err(e) = &result {
            error!("Meso fetch failed while {}: {}", e.stage(), e);
            debug!("stage -> {}", RunStage::Failed);
        }
        result
    }

    async fn run_stages(&self) -> Result<RunReport, FetchError> {
        let started = Instant::now();

        enter(RunStage::LoadingStats);
        let mob_stats = {
            let timing = TimingSpan::new("load_stats");
            self.stats
                .get_all()
                .instrument(timing.span().clone())
                .await
                .map_err(FetchError::CatalogUnavailable)?
        };
        if mob_stats.is_empty() {
            // Every dropper would be filtered as unknown and the run would look up to date
            return Err(FetchError::CatalogUnavailable("stat catalog is empty".into()));
        }
        info!("Loaded stats for {} monsters", mob_stats.len());

        enter(RunStage::ComputingRanges);
        let ranges = {
            let _timing = TimingSpan::new("compute_ranges");
            compute_all_ranges(&mob_stats)
        };
        info!("Calculated meso ranges for {} monsters", ranges.len());

        enter(RunStage::DetectingCandidates);
        let detector =
            MissingEntryDetector::new(self.config.minimum_item_count, self.config.currency_item_id);
        let detection = {
            let timing = TimingSpan::new("detect_candidates");
            let detection = detector
                .detect(self.drops.as_ref(), &ranges)
                .instrument(timing.span().clone())
                .await;
            self.drops.close().await;
            detection.map_err(FetchError::StoreQueryFailed)?
        };

        let outcome = if detection.is_empty() {
            enter(RunStage::NothingToDo);
            info!("The DB is already up-to-date, no file generated");
            RunOutcome::UpToDate
        } else {
            enter(RunStage::RenderingScript);
            let _timing = TimingSpan::new("render_script");
            let writer = ScriptWriter::from_config(&self.config);
            if let Some(zone) = &writer.exclusion {
                let excluded: Vec<_> =
                    detection.candidates.iter().filter(|id| zone.contains(**id)).collect();
                if !excluded.is_empty() {
                    debug!("Candidates in the excluded zone, removed again by the DELETE: {:?}", excluded);
                }
            }
            match writer.write_script(&self.config.output_path, &detection.candidates, &ranges)? {
                Some(summary) => {
                    enter(RunStage::Done);
                    RunOutcome::ScriptWritten(summary)
                }
                None => {
                    enter(RunStage::NothingToDo);
                    RunOutcome::UpToDate
                }
            }
        };

        Ok(RunReport {
            outcome,
            monsters_loaded: mob_stats.len(),
            ranges_computed: ranges.len(),
            candidates: detection.candidates.len(),
            unknown_ids: detection.unknown.len(),
            elapsed: started.elapsed(),
        })
    }
}

fn enter(stage: RunStage) {
    debug!("stage -> {}", stage);
}
