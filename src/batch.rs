//! Pre-rendering the whole catalog to `<out>/<id>.svg`, the images the static
//! score panel links to.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::export::ensure_svg_namespaces;
use crate::gabc::{extract_source, gabc_document};
use crate::models::ChantRecord;
use crate::render::{render_score, NotationEngine};

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub out_dir: PathBuf,
    /// Only the first `limit` records are processed.
    pub limit: Option<usize>,
    pub width_px: u32,
    /// Number of chants rendered at the same time.
    pub workers: usize,
}

/// What happened to one chant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChantOutcome {
    Generated(PathBuf),
    /// The image was already there and was left untouched.
    Skipped(PathBuf),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    pub chant_id: i64,
    pub incipit: String,
    pub reason: String,
}

/// Tally of a batch run. Failures keep the order in which they completed.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub generated: usize,
    pub skipped: usize,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn errors(&self) -> usize {
        self.failures.len()
    }

    fn record(&mut self, record: &ChantRecord, outcome: ChantOutcome) {
        match outcome {
            ChantOutcome::Generated(_) => self.generated += 1,
            ChantOutcome::Skipped(_) => self.skipped += 1,
            ChantOutcome::Failed(reason) => self.failures.push(BatchFailure {
                chant_id: record.id,
                incipit: record.incipit.clone(),
                reason,
            }),
        }
    }
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("failed to create output directory {path}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub fn image_path(out_dir: &Path, chant_id: i64) -> PathBuf {
    out_dir.join(format!("{chant_id}.svg"))
}

/// Render one chant's header and raw score. Chants without notation fail
/// before the existing-file check.
pub fn render_chant(
    record: &ChantRecord,
    engine: &dyn NotationEngine,
    out_dir: &Path,
    width_px: u32,
) -> ChantOutcome {
    let source = extract_source(record.gabc.as_deref());
    if source.is_empty() {
        return ChantOutcome::Failed("missing or invalid GABC score data".to_string());
    }

    let path = image_path(out_dir, record.id);
    if path.exists() {
        debug!(id = record.id, "image already exists");
        return ChantOutcome::Skipped(path);
    }

    let document = gabc_document(record, &source);
    let svg = match render_score(engine, &document, width_px) {
        Ok(svg) => svg,
        Err(err) => return ChantOutcome::Failed(err.to_string()),
    };
    match fs::write(&path, ensure_svg_namespaces(&svg)) {
        Ok(()) => ChantOutcome::Generated(path),
        Err(err) => ChantOutcome::Failed(format!("failed to write {}: {err}", path.display())),
    }
}

/// Render every record (or the first `limit`) on a pool of worker threads.
/// `progress` sees each chant as it completes, with the running count.
pub fn generate_images<F>(
    records: &[ChantRecord],
    engine: &dyn NotationEngine,
    options: &BatchOptions,
    mut progress: F,
) -> Result<BatchReport, BatchError>
where
    F: FnMut(usize, &ChantRecord, &ChantOutcome),
{
    let records = match options.limit {
        Some(limit) => &records[..limit.min(records.len())],
        None => records,
    };
    fs::create_dir_all(&options.out_dir).map_err(|source| BatchError::OutputDir {
        path: options.out_dir.clone(),
        source,
    })?;

    let workers = options.workers.clamp(1, records.len().max(1));
    info!(
        chants = records.len(),
        workers,
        out = %options.out_dir.display(),
        "generating score images"
    );

    let next = AtomicUsize::new(0);
    let (sender, receiver) = mpsc::channel();
    let mut report = BatchReport::default();

    thread::scope(|scope| {
        for _ in 0..workers {
            let sender = sender.clone();
            let next = &next;
            scope.spawn(move || loop {
                let index = next.fetch_add(1, Ordering::Relaxed);
                let Some(record) = records.get(index) else {
                    break;
                };
                let outcome = render_chant(record, engine, &options.out_dir, options.width_px);
                if sender.send((index, outcome)).is_err() {
                    break;
                }
            });
        }
        drop(sender);

        for (done, (index, outcome)) in receiver.iter().enumerate() {
            let Some(record) = records.get(index) else {
                continue;
            };
            if let ChantOutcome::Failed(reason) = &outcome {
                warn!(id = record.id, reason = %reason, "score image failed");
            }
            progress(done + 1, record, &outcome);
            report.record(record, outcome);
        }
    });

    info!(
        generated = report.generated,
        skipped = report.skipped,
        errors = report.errors(),
        "score images done"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{RenderError, ScoreLayout};

    struct EchoEngine;

    impl NotationEngine for EchoEngine {
        fn layout(&self, source: &str) -> Result<ScoreLayout, RenderError> {
            Ok(ScoreLayout::in_memory(source))
        }

        fn wrap_lines(&self, layout: ScoreLayout, _width_px: u32) -> Result<String, RenderError> {
            Ok(format!("<svg>{}</svg>", layout.source()))
        }
    }

    fn chant(id: i64, gabc: Option<&str>) -> ChantRecord {
        ChantRecord {
            id,
            incipit: format!("Chant {id}"),
            gabc: gabc.map(str::to_string),
            ..ChantRecord::default()
        }
    }

    #[test]
    fn missing_source_fails_even_when_image_exists() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(image_path(dir.path(), 7), "<svg/>").unwrap();
        let outcome = render_chant(&chant(7, None), &EchoEngine, dir.path(), 600);
        assert!(matches!(outcome, ChantOutcome::Failed(_)));
    }

    #[test]
    fn rendered_image_carries_header_and_namespace() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = render_chant(&chant(8, Some("(c4) A(f)")), &EchoEngine, dir.path(), 600);
        let path = image_path(dir.path(), 8);
        assert_eq!(outcome, ChantOutcome::Generated(path.clone()));

        let svg = fs::read_to_string(path).unwrap();
        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
        assert!(svg.contains("name:Chant 8;\n%%\n(c4) A(f)"));
    }

    #[test]
    fn report_counts_each_outcome() {
        let mut report = BatchReport::default();
        let record = chant(1, None);
        report.record(&record, ChantOutcome::Generated(PathBuf::from("1.svg")));
        report.record(&record, ChantOutcome::Skipped(PathBuf::from("1.svg")));
        report.record(&record, ChantOutcome::Failed("boom".to_string()));
        assert_eq!((report.generated, report.skipped, report.errors()), (1, 1, 1));
        assert_eq!(report.failures[0].reason, "boom");
    }
}
