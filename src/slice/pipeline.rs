//! Slice pipeline orchestration.
//!
//! A run moves through `Init -> Processing -> Done`, or ends in `Failed`:
//!
//! - **Init**: locate and decode the sheet, load the atlas (atlas strategy),
//!   create the output directory
//! - **Processing**: resolve, extract and write every cell, mission by mission
//! - **Done**: report how many of the expected thumbnails were written
//!
//! Missing atlas frames and uncroppable atlas rectangles skip their cell with a
//! warning. Everything else is fatal.

use image::RgbaImage;
use rayon::prelude::*;
use std::time::Instant;
use thiserror::Error;

use crate::atlas::{AtlasError, ReferenceMeta};
use crate::cell::{mission_cells, CellId, CELL_COUNT, MISSION_COUNT, VARIANT_COUNT};
use crate::extract::{extract, ExtractError};
use crate::output::{OutputError, ThumbnailWriter};
use crate::region::{AtlasResolver, GridResolver, RegionResolver, Strategy};
use crate::slice::context::SliceContext;
use crate::slice::progress::{ProgressEvent, ProgressReporter};
use crate::slice::result::{CellOutcome, CellResult, SkipReason, SliceReport};
use crate::source::{resolve_source, SourceError, SourceOrigin};

/// Fatal error during a run
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SliceError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Atlas(#[from] AtlasError),
    #[error(transparent)]
    Output(#[from] OutputError),
    /// Grid geometry produced an uncroppable rectangle
    #[error("grid cell {cell}: {source}")]
    Geometry {
        cell: CellId,
        #[source]
        source: ExtractError,
    },
    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Run lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    Processing,
    Done,
    Failed,
}

/// Orchestrates one slicing run.
pub struct SlicePipeline<'a> {
    context: SliceContext,
    reporter: &'a dyn ProgressReporter,
    state: RunState,
}

impl<'a> SlicePipeline<'a> {
    pub fn new(context: SliceContext, reporter: &'a dyn ProgressReporter) -> Self {
        Self { context, reporter, state: RunState::Init }
    }

    pub fn context(&self) -> &SliceContext {
        &self.context
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run the pipeline once.
    ///
    /// Fatal errors are reported to the progress reporter before being returned.
    pub fn run(&mut self) -> Result<SliceReport, SliceError> {
        self.state = RunState::Init;
        match self.execute() {
            Ok(report) => {
                self.state = RunState::Done;
                Ok(report)
            }
            Err(e) => {
                self.state = RunState::Failed;
                self.reporter.report(ProgressEvent::Error { message: e.to_string() });
                Err(e)
            }
        }
    }

    fn execute(&mut self) -> Result<SliceReport, SliceError> {
        let start = Instant::now();

        let primary = self.context.sprite_path();
        let fallback = self.context.fallback_path();
        let source = resolve_source(&primary, &fallback)?;
        if source.origin == SourceOrigin::CopiedFromFallback {
            self.reporter.report(ProgressEvent::SourceCopied {
                from: fallback.clone(),
                to: primary.clone(),
            });
        }

        let resolver = build_resolver(&self.context, self.reporter)?;
        let writer = ThumbnailWriter::new(self.context.out_dir())
            .with_quality(self.context.config().slice.quality);
        writer.prepare()?;

        self.state = RunState::Processing;
        let (width, height) = source.image.dimensions();
        self.reporter.report(ProgressEvent::RunStarted {
            strategy: resolver.strategy(),
            source: source.path.clone(),
            width,
            height,
            total_cells: CELL_COUNT,
        });

        let cells = slice_cells(
            &source.image,
            resolver.as_ref(),
            &writer,
            self.reporter,
            self.context.jobs(),
        )?;

        let report = SliceReport {
            cells,
            strategy: resolver.strategy(),
            out_dir: writer.out_dir().to_path_buf(),
            source_origin: source.origin,
            duration: start.elapsed(),
        };

        self.reporter.report(ProgressEvent::RunCompleted {
            written: report.written_count(),
            expected: report.expected_count(),
            out_dir: report.out_dir.clone(),
            duration_ms: report.duration.as_millis() as u64,
        });

        Ok(report)
    }
}

/// Build the resolver the context asks for.
///
/// For the atlas strategy this loads the metadata and reports any problems
/// found in it as warnings.
pub fn build_resolver(
    context: &SliceContext,
    reporter: &dyn ProgressReporter,
) -> Result<Box<dyn RegionResolver>, SliceError> {
    match context.strategy() {
        Strategy::Grid => Ok(Box::new(GridResolver::new())),
        Strategy::Atlas => {
            let path = context.atlas_path();
            let meta =
                ReferenceMeta::load(&path, context.config().atlas.allow_implicit_reference)?;

            if !meta.has_reference_size() {
                reporter.report(ProgressEvent::Warning {
                    message: format!(
                        "atlas {} has no reference size; assuming it matches the sheet",
                        path.display()
                    ),
                });
            }
            for problem in meta.validate() {
                reporter.report(ProgressEvent::Warning { message: format!("atlas {}", problem) });
            }
            let unknown = meta.unknown_keys();
            if !unknown.is_empty() {
                reporter.report(ProgressEvent::Warning {
                    message: format!("ignoring unknown atlas frames: {}", unknown.join(", ")),
                });
            }

            let thumb_size = context.config().thumb_size();
            Ok(Box::new(AtlasResolver::new(meta).with_target_size(Some(thumb_size))))
        }
    }
}

/// Shared inputs for processing cells.
#[derive(Clone, Copy)]
struct CellJob<'a> {
    source: &'a RgbaImage,
    resolver: &'a dyn RegionResolver,
    writer: &'a ThumbnailWriter,
    reporter: &'a dyn ProgressReporter,
}

/// Slice every cell of an already decoded sheet.
///
/// With `jobs > 1` missions are processed on a thread pool of that size. The
/// output directory must already exist. Results are always returned in
/// enumeration order.
pub fn slice_cells(
    source: &RgbaImage,
    resolver: &dyn RegionResolver,
    writer: &ThumbnailWriter,
    reporter: &dyn ProgressReporter,
    jobs: usize,
) -> Result<Vec<CellResult>, SliceError> {
    let job = CellJob { source, resolver, writer, reporter };

    let missions: Vec<Vec<CellResult>> = if jobs <= 1 {
        (1..=MISSION_COUNT)
            .map(|mission_id| slice_mission(job, mission_id))
            .collect::<Result<Vec<_>, SliceError>>()?
    } else {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
        pool.install(|| {
            (1..=MISSION_COUNT)
                .into_par_iter()
                .map(|mission_id| slice_mission(job, mission_id))
                .collect::<Result<Vec<_>, SliceError>>()
        })?
    };

    Ok(missions.into_iter().flatten().collect())
}

fn slice_mission(job: CellJob<'_>, mission_id: u32) -> Result<Vec<CellResult>, SliceError> {
    let mut results = Vec::with_capacity(VARIANT_COUNT as usize);

    for cell in mission_cells(mission_id) {
        let outcome = slice_cell(job, cell)?;
        match &outcome {
            CellOutcome::Written(path) => {
                if job.reporter.is_verbose() {
                    job.reporter.report(ProgressEvent::CellWritten { cell, path: path.clone() })
                }
            }
            CellOutcome::Skipped(reason) => {
                job.reporter.report(ProgressEvent::CellSkipped { cell, reason: reason.clone() })
            }
        }
        results.push(CellResult { cell, outcome });
    }

    let written = results.iter().filter(|r| r.outcome.is_written()).count();
    job.reporter.report(ProgressEvent::MissionCompleted { mission_id, written });
    Ok(results)
}

fn slice_cell(job: CellJob<'_>, cell: CellId) -> Result<CellOutcome, SliceError> {
    let (width, height) = job.source.dimensions();

    let Some(rect) = job.resolver.resolve_rect(cell, width, height) else {
        return Ok(CellOutcome::Skipped(SkipReason::MissingEntry { key: cell.frame_key() }));
    };

    let image = match extract(job.source, rect, job.resolver.target_size()) {
        Ok(image) => image,
        Err(e) => {
            return match job.resolver.strategy() {
                Strategy::Atlas => Ok(CellOutcome::Skipped(SkipReason::InvalidRect(e))),
                Strategy::Grid => Err(SliceError::Geometry { cell, source: e }),
            };
        }
    };

    let path = job.writer.write(&image, cell.mission_id, cell.variant)?;
    Ok(CellOutcome::Written(path))
}
