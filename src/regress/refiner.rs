//! The render, compare, adjust loop.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::renderer::file_uri;
use super::{HtmlRenderer, ImageComparator, RefineOptions, RefinementState};
use crate::error::{Error, Result};

/// Report file name inside the output directory.
pub const REPORT_FILE: &str = "regression.json";

/// Something that can (re)write the markup at a given text scale.
pub trait MarkupTarget {
    /// Synthesize and persist markup at `text_scale`, returning the path of
    /// the HTML document.
    fn render_markup(&mut self, text_scale: f64) -> Result<PathBuf>;
}

/// A reference bitmap for one page, with its pixel size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceImage {
    /// Page the bitmap shows (1-indexed)
    pub page: u32,
    /// Image file
    pub path: PathBuf,
    /// Pixel width
    pub width: u32,
    /// Pixel height
    pub height: u32,
}

impl ReferenceImage {
    /// Read the pixel size of the reference for `page`.
    pub fn open<P: AsRef<Path>>(page: u32, path: P) -> Result<Self> {
        let path = path.as_ref();
        let (width, height) = image::image_dimensions(path)?;
        Ok(Self {
            page,
            path: path.to_path_buf(),
            width,
            height,
        })
    }
}

/// Outcome of comparing one page in one iteration. Never modified after it
/// is recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionResult {
    /// Iteration number (1-indexed)
    pub iteration: u32,

    /// Page number (1-indexed)
    pub page: u32,

    /// Text scale the markup was synthesized with
    pub text_scale: f64,

    /// Score in `0..=1`, NaN (written as `null`) when skipped
    pub diff_score: f64,

    /// Rendered screenshot
    pub screenshot_path: Option<PathBuf>,

    /// Difference heat map
    pub diff_image_path: Option<PathBuf>,
}

impl RegressionResult {
    fn skipped(iteration: u32, page: u32, text_scale: f64) -> Self {
        Self {
            iteration,
            page,
            text_scale,
            diff_score: f64::NAN,
            screenshot_path: None,
            diff_image_path: None,
        }
    }

    /// Whether a comparison produced a score.
    pub fn is_scored(&self) -> bool {
        !self.diff_score.is_nan()
    }
}

/// Why the loop stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The iteration budget ran out
    MaxIterations,
    /// There was nothing to compare against
    NoReferences,
    /// No renderer is configured
    RendererUnavailable,
    /// The comparison backend is missing
    ComparatorUnavailable,
    /// An iteration finished without a single successful comparison
    NoComparisons,
}

/// Everything a refinement run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefinementReport {
    /// Per-page results in the order they were recorded
    pub history: Vec<RegressionResult>,

    /// Scale with the lowest mean score
    pub best_scale: f64,

    /// Lowest mean score, `None` when nothing was scored
    pub best_score: Option<f64>,

    /// Iterations that synthesized markup
    pub iterations: u32,

    /// Scale of the markup left on disk, `None` when nothing was written
    pub final_scale: Option<f64>,

    /// Why the loop stopped
    pub termination: Termination,
}

impl RefinementReport {
    /// Mean score of every scored result in one iteration.
    pub fn iteration_score(&self, iteration: u32) -> Option<f64> {
        let scores: Vec<f64> = self
            .history
            .iter()
            .filter(|r| r.iteration == iteration && r.is_scored())
            .map(|r| r.diff_score)
            .collect();
        if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        }
    }

    /// Write the report as pretty JSON.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Per-iteration tallies.
#[derive(Default)]
struct IterationOutcome {
    sum: f64,
    scored: u32,
    renderer_missing: bool,
    comparator_missing: bool,
}

/// Searches for the text scale whose rendering best matches the
/// reference bitmaps.
///
/// Each iteration re-synthesizes the markup through a [`MarkupTarget`],
/// renders every referenced page at the size of its reference and scores
/// the difference. Artifacts land in `iteration_<i>/page_<n>.png` and
/// `iteration_<i>/page_<n>_diff.png` under the output directory; directories
/// from an earlier run are removed first.
pub struct TemplateRefiner<'a> {
    renderer: &'a dyn HtmlRenderer,
    comparator: &'a dyn ImageComparator,
    references: Vec<ReferenceImage>,
    output_dir: PathBuf,
    options: RefineOptions,
}

impl<'a> TemplateRefiner<'a> {
    /// Create a refiner with default options.
    pub fn new(
        renderer: &'a dyn HtmlRenderer,
        comparator: &'a dyn ImageComparator,
        references: Vec<ReferenceImage>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            renderer,
            comparator,
            references,
            output_dir: output_dir.into(),
            options: RefineOptions::default(),
        }
    }

    /// Set loop options.
    pub fn with_options(mut self, options: RefineOptions) -> Self {
        self.options = options;
        self
    }

    /// Loop options in use.
    pub fn options(&self) -> &RefineOptions {
        &self.options
    }

    /// Run the loop against `target`.
    ///
    /// Errors from the target abort the run. Missing collaborators end it
    /// early with the matching [`Termination`].
    pub fn run<T: MarkupTarget + ?Sized>(&self, target: &mut T) -> Result<RefinementReport> {
        let mut state = RefinementState::new(&self.options);
        let mut history = Vec::new();
        let mut last_scale = None;
        let mut iterations = 0;
        let mut termination = Termination::MaxIterations;

        if self.references.is_empty() {
            log::warn!("No reference images; skipping refinement");
            return Ok(RefinementReport {
                history,
                best_scale: state.best_scale,
                best_score: None,
                iterations,
                final_scale: None,
                termination: Termination::NoReferences,
            });
        }

        self.clear_iterations();
        log::info!(
            "Refining text scale against {} reference(s) with {}",
            self.references.len(),
            self.renderer.name()
        );
        for iteration in 1..=self.options.max_iterations {
            let scale = state.current_scale;
            log::info!("Refinement iteration {} (scale={:.3})", iteration, scale);

            let html = target.render_markup(scale)?;
            last_scale = Some(scale);
            iterations = iteration;

            let outcome = self.run_iteration(iteration, scale, &html, &mut history)?;

            if outcome.comparator_missing {
                termination = Termination::ComparatorUnavailable;
                break;
            }
            if outcome.scored == 0 {
                log::info!("No comparisons performed; stopping refinement");
                termination = if outcome.renderer_missing {
                    Termination::RendererUnavailable
                } else {
                    Termination::NoComparisons
                };
                break;
            }

            let mean = outcome.sum / outcome.scored as f64;
            log::info!("Iteration {} mean diff: {:.4}", iteration, mean);
            state = state.advance(mean, &self.options);

            if outcome.renderer_missing {
                termination = Termination::RendererUnavailable;
                break;
            }
        }

        let mut final_scale = last_scale;
        if state.has_score() && last_scale != Some(state.best_scale) {
            log::info!("Rendering final output with best scale {:.3}", state.best_scale);
            target.render_markup(state.best_scale)?;
            final_scale = Some(state.best_scale);
        }

        Ok(RefinementReport {
            history,
            best_scale: state.best_scale,
            best_score: state.has_score().then_some(state.best_score),
            iterations,
            final_scale,
            termination,
        })
    }

    /// Remove `iteration_<n>` directories left by an earlier run.
    fn clear_iterations(&self) {
        let Ok(entries) = fs::read_dir(&self.output_dir) else {
            return;
        };
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(index) = name.to_str().and_then(|n| n.strip_prefix("iteration_")) else {
                continue;
            };
            if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
                continue;
            }
            if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            match fs::remove_dir_all(entry.path()) {
                Ok(()) => log::debug!("Removed stale {}", entry.path().display()),
                Err(e) => log::warn!("Could not remove {}: {}", entry.path().display(), e),
            }
        }
    }

    fn run_iteration(
        &self,
        iteration: u32,
        scale: f64,
        html: &Path,
        history: &mut Vec<RegressionResult>,
    ) -> Result<IterationOutcome> {
        let dir = self.output_dir.join(format!("iteration_{}", iteration));
        fs::create_dir_all(&dir)?;

        let mut outcome = IterationOutcome::default();
        for reference in &self.references {
            let page = reference.page;
            let screenshot = dir.join(format!("page_{}.png", page));
            let diff = dir.join(format!("page_{}_diff.png", page));
            let uri = file_uri(html, Some(&format!("page-{}", page)));

            let rendered = match self.renderer.render(
                &uri,
                &screenshot,
                reference.width,
                reference.height,
            ) {
                Ok(Some(path)) => path,
                Ok(None) => {
                    log::warn!("Skipping regression comparison (rendering unavailable)");
                    outcome.renderer_missing = true;
                    history.push(RegressionResult::skipped(iteration, page, scale));
                    continue;
                }
                Err(e) if e.is_dependency_unavailable() => {
                    log::warn!("Skipping regression comparison: {}", e);
                    outcome.renderer_missing = true;
                    history.push(RegressionResult::skipped(iteration, page, scale));
                    continue;
                }
                Err(e) => {
                    log::warn!("Rendering page {} failed: {}", page, e);
                    history.push(RegressionResult::skipped(iteration, page, scale));
                    continue;
                }
            };

            match self.comparator.compare(&reference.path, &rendered, &diff) {
                Ok(score) if score.is_finite() => {
                    log::debug!("Page {} diff {:.4}", page, score);
                    outcome.sum += score;
                    outcome.scored += 1;
                    history.push(RegressionResult {
                        iteration,
                        page,
                        text_scale: scale,
                        diff_score: score,
                        screenshot_path: Some(rendered),
                        diff_image_path: Some(diff),
                    });
                }
                Ok(score) => {
                    log::warn!("Comparator returned {} for page {}", score, page);
                    history.push(RegressionResult {
                        screenshot_path: Some(rendered),
                        ..RegressionResult::skipped(iteration, page, scale)
                    });
                }
                Err(e) if e.is_dependency_unavailable() => {
                    log::warn!("Visual regression skipped: {}", e);
                    outcome.comparator_missing = true;
                    history.push(RegressionResult {
                        screenshot_path: Some(rendered),
                        ..RegressionResult::skipped(iteration, page, scale)
                    });
                    break;
                }
                Err(e) => {
                    log::warn!("Comparing page {} failed: {}", page, e);
                    history.push(RegressionResult {
                        screenshot_path: Some(rendered),
                        ..RegressionResult::skipped(iteration, page, scale)
                    });
                }
            }
        }

        Ok(outcome)
    }
}
