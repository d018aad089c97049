//! Visual regression refinement.
//!
//! A [`TemplateRefiner`] repeatedly re-synthesizes markup at different text
//! scales, renders it with an [`HtmlRenderer`], scores the result against
//! reference bitmaps with an [`ImageComparator`] and keeps the scale with the
//! lowest difference.

mod compare;
mod options;
mod refiner;
mod renderer;
mod state;

pub use compare::{ImageComparator, PixelComparator};
pub use options::RefineOptions;
pub use refiner::{
    MarkupTarget, ReferenceImage, RefinementReport, RegressionResult, TemplateRefiner,
    Termination, REPORT_FILE,
};
pub use renderer::{file_uri, ChromiumRenderer, HtmlRenderer, UnavailableRenderer, CHROME_ENV};
pub use state::{Direction, RefinementState};
