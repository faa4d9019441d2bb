//! End-to-end tests for slicing runs
//!
//! Each test builds a throwaway project tree (sheet, atlas, config) and runs
//! the full pipeline against it.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use image::{Rgba, RgbaImage};
use serde_json::json;
use sha2::{Digest, Sha256};
use tempfile::TempDir;

use thumbslice::cell::{all_cells, CellId, Variant, CELL_COUNT, MISSION_COUNT, VARIANT_COUNT};
use thumbslice::config::SlicerConfig;
use thumbslice::output::thumbnail_filename;
use thumbslice::region::Strategy;
use thumbslice::slice::{
    ConsoleProgress, NullProgress, RunState, SkipReason, SliceContext, SliceError,
    SlicePipeline,
};
use thumbslice::source::{SourceError, SourceOrigin};

// ============================================================================
// Test Utilities
// ============================================================================

/// Writer that keeps console output in a shared buffer.
#[derive(Clone, Default)]
struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl CaptureWriter {
    fn new() -> Self {
        Self::default()
    }

    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

const CELL_W: u32 = 10;
const CELL_H: u32 = 6;

/// Sheet with one flat color per cell.
fn make_sheet(cell_w: u32, cell_h: u32) -> RgbaImage {
    RgbaImage::from_fn(cell_w * VARIANT_COUNT, cell_h * MISSION_COUNT, |x, y| {
        Rgba([((y / cell_h) * 17) as u8, ((x / cell_w) * 63) as u8, 90, 255])
    })
}

/// Write a sheet as PNG bytes; the loader detects the format from content.
fn write_sheet(path: &Path, sheet: &RgbaImage) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    sheet.save_with_format(path, image::ImageFormat::Png).unwrap();
}

/// Atlas JSON authored at `scale` times the sheet resolution.
fn atlas_json(scale: u32, skip: &[&str]) -> serde_json::Value {
    let (fw, fh) = (CELL_W * scale, CELL_H * scale);
    let frames: BTreeMap<String, serde_json::Value> = all_cells()
        .filter(|c| !skip.contains(&c.frame_key().as_str()))
        .map(|c| {
            (c.frame_key(), json!({ "x": c.column() * fw, "y": c.row() * fh, "w": fw, "h": fh }))
        })
        .collect();
    json!({
        "meta": { "width": fw * VARIANT_COUNT, "height": fh * MISSION_COUNT },
        "frames": frames,
    })
}

fn write_atlas(path: &Path, atlas: &serde_json::Value) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_string_pretty(atlas).unwrap()).unwrap();
}

/// Project with the sheet at the primary path and a 2x atlas.
fn atlas_project(skip: &[&str]) -> (TempDir, SliceContext) {
    let temp = TempDir::new().unwrap();
    let mut config = SlicerConfig::default();
    config.slice.thumb_size = [20, 12];
    let ctx = SliceContext::new(config, temp.path().to_path_buf());

    write_sheet(&ctx.sprite_path(), &make_sheet(CELL_W, CELL_H));
    write_atlas(&ctx.atlas_path(), &atlas_json(2, skip));
    (temp, ctx)
}

fn hash_dir(dir: &Path) -> BTreeMap<String, String> {
    let mut hashes = BTreeMap::new();
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        let digest = Sha256::digest(fs::read(&path).unwrap());
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        hashes.insert(path.file_name().unwrap().to_string_lossy().into_owned(), hex);
    }
    hashes
}

fn expected_filenames() -> Vec<String> {
    let mut names: Vec<String> =
        all_cells().map(|c| thumbnail_filename(c.mission_id, c.variant)).collect();
    names.sort();
    names
}

// ============================================================================
// Atlas Mode
// ============================================================================

#[test]
fn test_atlas_run_writes_all_thumbnails() {
    let (_temp, ctx) = atlas_project(&[]);
    let out_dir = ctx.out_dir();

    let reporter = NullProgress::new();
    let mut pipeline = SlicePipeline::new(ctx, &reporter);
    let report = pipeline.run().unwrap();

    assert_eq!(pipeline.state(), RunState::Done);
    assert_eq!(report.written_count(), CELL_COUNT);
    assert!(report.is_complete());

    let names: Vec<String> = hash_dir(&out_dir).into_keys().collect();
    assert_eq!(names, expected_filenames());
    assert!(out_dir.join("1.webp").exists());
    assert!(out_dir.join("1_fail.webp").exists());
    assert!(!out_dir.join("1_bronze.webp").exists());

    for path in report.written_paths() {
        let thumb = image::open(path).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (20, 12), "{}", path.display());
    }
}

#[test]
fn test_atlas_thumbnail_content_matches_cell() {
    let (_temp, ctx) = atlas_project(&[]);
    let out_dir = ctx.out_dir();
    let reporter = NullProgress::new();
    SlicePipeline::new(ctx, &reporter).run().unwrap();

    // Row 8, column 3: flat color, lossy encoding keeps it close
    let thumb = image::open(out_dir.join("9_gold.webp")).unwrap().to_rgba8();
    let px = thumb.get_pixel(10, 6);
    assert!((px[0] as i32 - 8 * 17).abs() <= 8, "red channel {}", px[0]);
    assert!((px[1] as i32 - 3 * 63).abs() <= 8, "green channel {}", px[1]);
}

#[test]
fn test_missing_atlas_key_skips_one_cell() {
    let (_temp, ctx) = atlas_project(&["9_silver"]);
    let out_dir = ctx.out_dir();

    let capture = CaptureWriter::new();
    let reporter = ConsoleProgress::with_output(capture.clone()).with_colors(false);
    let report = SlicePipeline::new(ctx, &reporter).run().unwrap();

    assert_eq!(report.written_count(), CELL_COUNT - 1);
    let skipped = report.skipped();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].0, CellId::new(9, Variant::Silver).unwrap());
    assert!(!out_dir.join("9_silver.webp").exists());
    assert_eq!(hash_dir(&out_dir).len(), CELL_COUNT - 1);

    let text = capture.contents();
    let warnings: Vec<&str> = text.lines().filter(|l| l.contains("[warn]")).collect();
    assert_eq!(warnings.len(), 1, "{}", text);
    assert!(warnings[0].contains("9_silver"));
    assert!(text.contains("59/60"));
}

#[test]
fn test_null_and_empty_atlas_entries_are_skipped() {
    let (_temp, ctx) = atlas_project(&[]);
    let out_dir = ctx.out_dir();

    let mut atlas = atlas_json(2, &[]);
    atlas["frames"]["1_fail"] = serde_json::Value::Null;
    atlas["frames"]["4_bronze"] = json!({});
    write_atlas(&ctx.atlas_path(), &atlas);

    let capture = CaptureWriter::new();
    let reporter = ConsoleProgress::with_output(capture.clone()).with_colors(false);
    let report = SlicePipeline::new(ctx, &reporter).run().unwrap();

    assert_eq!(report.written_count(), CELL_COUNT - 2);
    let skipped: Vec<CellId> = report.skipped().into_iter().map(|(cell, _)| cell).collect();
    assert_eq!(
        skipped,
        vec![CellId::new(1, Variant::Fail).unwrap(), CellId::new(4, Variant::Bronze).unwrap()]
    );
    assert_eq!(hash_dir(&out_dir).len(), CELL_COUNT - 2);

    let text = capture.contents();
    let warnings: Vec<&str> = text.lines().filter(|l| l.contains("[warn]")).collect();
    assert_eq!(warnings.len(), 2, "{}", text);
    assert!(warnings[0].contains("1_fail"));
    assert!(warnings[1].contains("4_bronze"));
}

#[test]
fn test_frame_left_of_sheet_is_skipped_not_shrunk() {
    let (_temp, ctx) = atlas_project(&[]);
    let out_dir = ctx.out_dir();

    let mut atlas = atlas_json(1, &[]);
    atlas["frames"]["1_fail"] = json!({ "x": -20, "y": 0, "w": 30, "h": 6 });
    write_atlas(&ctx.atlas_path(), &atlas);

    let reporter = NullProgress::new();
    let report = SlicePipeline::new(ctx, &reporter).run().unwrap();

    assert_eq!(report.written_count(), CELL_COUNT - 1);
    let skipped = report.skipped();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].0, CellId::new(1, Variant::Fail).unwrap());
    assert!(matches!(skipped[0].1, SkipReason::InvalidRect(_)));
    assert!(!out_dir.join("1_fail.webp").exists());
}

#[test]
fn test_rerun_is_byte_identical() {
    let (_temp, ctx) = atlas_project(&[]);
    let out_dir = ctx.out_dir();
    let reporter = NullProgress::new();

    SlicePipeline::new(ctx.clone(), &reporter).run().unwrap();
    let first = hash_dir(&out_dir);
    SlicePipeline::new(ctx, &reporter).run().unwrap();
    let second = hash_dir(&out_dir);

    assert_eq!(first.len(), CELL_COUNT);
    assert_eq!(first, second);
}

#[test]
fn test_missing_reference_size_is_fatal_by_default() {
    let (_temp, ctx) = atlas_project(&[]);
    let mut atlas = atlas_json(1, &[]);
    atlas.as_object_mut().unwrap().remove("meta");
    write_atlas(&ctx.atlas_path(), &atlas);

    let reporter = NullProgress::new();
    let mut pipeline = SlicePipeline::new(ctx, &reporter);
    let err = pipeline.run().unwrap_err();
    assert!(matches!(err, SliceError::Atlas(_)));
    assert_eq!(pipeline.state(), RunState::Failed);
}

#[test]
fn test_implicit_reference_size_when_allowed() {
    let temp = TempDir::new().unwrap();
    let mut config = SlicerConfig::default();
    config.atlas.allow_implicit_reference = true;
    config.slice.thumb_size = [CELL_W, CELL_H];
    let ctx = SliceContext::new(config, temp.path().to_path_buf());

    write_sheet(&ctx.sprite_path(), &make_sheet(CELL_W, CELL_H));
    let mut atlas = atlas_json(1, &[]);
    atlas.as_object_mut().unwrap().remove("meta");
    write_atlas(&ctx.atlas_path(), &atlas);

    let capture = CaptureWriter::new();
    let reporter = ConsoleProgress::with_output(capture.clone());
    let report = SlicePipeline::new(ctx, &reporter).run().unwrap();

    assert!(report.is_complete());
    assert!(capture.contents().contains("no reference size"));
}

// ============================================================================
// Grid Mode
// ============================================================================

#[test]
fn test_grid_run_keeps_native_cell_sizes() {
    let temp = TempDir::new().unwrap();
    let mut config = SlicerConfig::default();
    config.slice.strategy = Strategy::Grid;
    let ctx = SliceContext::new(config, temp.path().to_path_buf());

    // 403 / 4 and 151 / 15 are both fractional
    let sheet = RgbaImage::from_pixel(403, 151, Rgba([40, 80, 120, 255]));
    write_sheet(&ctx.sprite_path(), &sheet);
    let out_dir = ctx.out_dir();

    let reporter = NullProgress::new();
    let report = SlicePipeline::new(ctx, &reporter).run().unwrap();
    assert!(report.is_complete());
    assert_eq!(report.strategy, Strategy::Grid);

    let row_width: u32 = Variant::ALL
        .iter()
        .map(|v| image::open(out_dir.join(thumbnail_filename(1, *v))).unwrap().width())
        .sum();
    assert_eq!(row_width, 403);

    let column_height: u32 = (1..=MISSION_COUNT)
        .map(|m| image::open(out_dir.join(thumbnail_filename(m, Variant::Gold))).unwrap().height())
        .sum();
    assert_eq!(column_height, 151);
}

#[test]
fn test_grid_run_does_not_need_atlas() {
    let temp = TempDir::new().unwrap();
    let mut config = SlicerConfig::default();
    config.slice.strategy = Strategy::Grid;
    config.slice.jobs = 3;
    let ctx = SliceContext::new(config, temp.path().to_path_buf());
    write_sheet(&ctx.sprite_path(), &make_sheet(CELL_W, CELL_H));
    assert!(!ctx.atlas_path().exists());

    let reporter = NullProgress::new();
    let report = SlicePipeline::new(ctx, &reporter).run().unwrap();
    assert_eq!(report.written_count(), CELL_COUNT);
}

// ============================================================================
// Source Resolution
// ============================================================================

#[test]
fn test_fallback_sheet_is_copied_and_used() {
    let temp = TempDir::new().unwrap();
    let mut config = SlicerConfig::default();
    config.slice.strategy = Strategy::Grid;
    let ctx = SliceContext::new(config, temp.path().to_path_buf());
    write_sheet(&ctx.fallback_path(), &make_sheet(CELL_W, CELL_H));
    let primary: PathBuf = ctx.sprite_path();
    assert!(!primary.exists());

    let capture = CaptureWriter::new();
    let reporter = ConsoleProgress::with_output(capture.clone());
    let report = SlicePipeline::new(ctx.clone(), &reporter).run().unwrap();

    assert_eq!(report.source_origin, SourceOrigin::CopiedFromFallback);
    assert!(primary.exists());
    assert!(capture.contents().contains("Copied sprite sheet"));

    // Second run finds the materialized primary
    let report = SlicePipeline::new(ctx, &NullProgress::new()).run().unwrap();
    assert_eq!(report.source_origin, SourceOrigin::Primary);
}

#[test]
fn test_no_sheet_anywhere_fails_before_writing() {
    let temp = TempDir::new().unwrap();
    let ctx = SliceContext::new(SlicerConfig::default(), temp.path().to_path_buf());
    let out_dir = ctx.out_dir();

    let capture = CaptureWriter::new();
    let reporter = ConsoleProgress::with_output(capture.clone());
    let mut pipeline = SlicePipeline::new(ctx, &reporter);
    let err = pipeline.run().unwrap_err();

    match err {
        SliceError::Source(SourceError::NotFound { primary, fallback }) => {
            assert!(primary.ends_with("public/mission_results_sprite.webp"));
            assert!(fallback.ends_with("src/data/mission_results_sprite.webp"));
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
    assert_eq!(pipeline.state(), RunState::Failed);
    assert!(!out_dir.exists());
    assert!(capture.contents().contains("[error]"));
}
