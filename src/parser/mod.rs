//! Extraction: PDF pages to the Layout Model.
//!
//! A [`PdfBackend`] parses pages into raw text lines, painted paths and
//! images; the [`Extractor`] turns those into positioned primitives. Page
//! backgrounds come from a separate [`PageRasterizer`].

mod assets;
#[cfg(feature = "lopdf-backend")]
mod backend;
mod extractor;
mod font;
#[cfg(feature = "lopdf-backend")]
mod interpreter;
mod lines;
mod options;
mod path;
mod raster;
mod raw;

pub use assets::{resolve_extension, AssetStore};
#[cfg(feature = "lopdf-backend")]
pub use backend::{parse_pdf_date, LopdfBackend};
pub use extractor::{text_run, Extractor};
pub use font::parse_font_name;
pub use lines::{segment_lines, Glyph};
pub use options::{ErrorMode, ExtractOptions};
pub use path::{drawing_elements, subpath_bounds};
pub use raster::{PageRasterizer, PdftoppmRasterizer, UnavailableRasterizer};
pub use raw::{
    PathOp, PdfBackend, Point, RawChar, RawColor, RawDrawing, RawImage, RawPage, RawRect,
    RawTextLine,
};

use std::path::Path;

use crate::error::Result;

/// Open the default PDF backend for a file.
///
/// Non-PDF input fails with [`crate::Error::UnknownFormat`]. Without the
/// `lopdf-backend` feature every call fails with
/// [`crate::Error::DependencyUnavailable`].
pub fn open_backend<P: AsRef<Path>>(path: P) -> Result<Box<dyn PdfBackend>> {
    let path = path.as_ref();
    crate::detect::pdf_version_from_path(path)?;

    #[cfg(feature = "lopdf-backend")]
    {
        Ok(Box::new(LopdfBackend::load_file(path)?))
    }

    #[cfg(not(feature = "lopdf-backend"))]
    {
        Err(crate::error::Error::DependencyUnavailable(
            "built without the lopdf-backend feature".to_string(),
        ))
    }
}
