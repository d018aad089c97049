//! Whole-page raster renders.
//!
//! Backgrounds are produced by an external rasterizer. The default one
//! shells out to poppler's `pdftoppm`.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};
use crate::process;

/// Renders a single PDF page to a PNG file.
pub trait PageRasterizer {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Whether the rasterizer can run at all.
    fn is_available(&self) -> bool;

    /// Render page `page` (1-based) of `pdf` at `dpi` into `output`.
    fn render_page(&self, pdf: &Path, page: u32, dpi: u32, output: &Path) -> Result<()>;
}

/// Rasterizer backed by the `pdftoppm` command-line tool.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    binary: Option<PathBuf>,
}

impl PdftoppmRasterizer {
    /// Locate `pdftoppm` in `PATH`.
    pub fn new() -> Self {
        Self {
            binary: process::find_in_path("pdftoppm"),
        }
    }

    /// Use an explicit binary.
    pub fn with_binary(binary: impl AsRef<Path>) -> Self {
        Self {
            binary: process::resolve_program(binary.as_ref()),
        }
    }
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PageRasterizer for PdftoppmRasterizer {
    fn name(&self) -> &str {
        "pdftoppm"
    }

    fn is_available(&self) -> bool {
        self.binary.is_some()
    }

    fn render_page(&self, pdf: &Path, page: u32, dpi: u32, output: &Path) -> Result<()> {
        let binary = self
            .binary
            .as_ref()
            .ok_or_else(|| Error::DependencyUnavailable("pdftoppm not found in PATH".to_string()))?;

        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // pdftoppm appends ".png" to the output root itself.
        let root = output.with_extension("");
        let mut cmd = Command::new(binary);
        cmd.arg("-png")
            .arg("-singlefile")
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-f")
            .arg(page.to_string())
            .arg("-l")
            .arg(page.to_string())
            .arg(pdf)
            .arg(&root);
        process::run(cmd, "pdftoppm")?;

        let produced = root.with_extension("png");
        if produced != output {
            std::fs::rename(&produced, output)?;
        }
        if !output.is_file() {
            return Err(Error::Render(format!(
                "pdftoppm produced no image for page {}",
                page
            )));
        }
        Ok(())
    }
}

/// Rasterizer for environments without any rendering tool.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableRasterizer;

impl PageRasterizer for UnavailableRasterizer {
    fn name(&self) -> &str {
        "none"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn render_page(&self, _pdf: &Path, _page: u32, _dpi: u32, _output: &Path) -> Result<()> {
        Err(Error::DependencyUnavailable(
            "no page rasterizer configured".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_rasterizer() {
        let rasterizer = UnavailableRasterizer;
        assert!(!rasterizer.is_available());
        let err = rasterizer
            .render_page(Path::new("a.pdf"), 1, 144, Path::new("out.png"))
            .unwrap_err();
        assert!(err.is_dependency_unavailable());
    }

    #[test]
    fn test_missing_binary() {
        let rasterizer = PdftoppmRasterizer::with_binary("/no/such/pdftoppm");
        assert!(!rasterizer.is_available());
        let err = rasterizer
            .render_page(Path::new("a.pdf"), 1, 144, Path::new("out.png"))
            .unwrap_err();
        assert!(err.is_dependency_unavailable());
    }

    #[cfg(unix)]
    #[test]
    fn test_stub_pdftoppm_writes_output() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let stub = dir.path().join("pdftoppm");
        std::fs::write(
            &stub,
            "#!/bin/sh\nfor last; do :; done\nprintf '\\211PNG' > \"$last.png\"\n",
        )
        .unwrap();
        let mut perms = std::fs::metadata(&stub).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&stub, perms).unwrap();

        let rasterizer = PdftoppmRasterizer::with_binary(&stub);
        let output = dir.path().join("assets").join("page_1.png");
        rasterizer
            .render_page(Path::new("in.pdf"), 1, 144, &output)
            .unwrap();
        assert!(output.is_file());
    }
}
