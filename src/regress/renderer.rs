//! HTML to bitmap rendering.
//!
//! The default renderer drives a headless Chromium with `--screenshot`.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, OnceLock};

use tempfile::TempDir;

use crate::error::{Error, Result};
use crate::process;

/// Binary names tried when no Chromium path is configured.
const CHROME_CANDIDATES: &[&str] = &[
    "google-chrome-stable",
    "google-chrome",
    "chromium",
    "chromium-browser",
    "chrome",
];

/// Environment variable naming a Chromium binary.
pub const CHROME_ENV: &str = "CHROME_BIN";

/// Smallest viewport edge ever requested.
const MIN_VIEWPORT: u32 = 10;

/// Renders an HTML document to a bitmap.
pub trait HtmlRenderer {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Render `uri` into a PNG at `output`, `width` x `height` pixels.
    ///
    /// `Ok(None)` means no renderer is configured; callers skip the
    /// comparison instead of failing.
    fn render(&self, uri: &str, output: &Path, width: u32, height: u32)
        -> Result<Option<PathBuf>>;
}

/// A renderer that is never available.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableRenderer;

impl HtmlRenderer for UnavailableRenderer {
    fn name(&self) -> &str {
        "none"
    }

    fn render(&self, _uri: &str, _output: &Path, _width: u32, _height: u32) -> Result<Option<PathBuf>> {
        Ok(None)
    }
}

/// Headless mode flag flavors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeadlessMode {
    New,
    Legacy,
}

/// Headless Chromium/Chrome screenshot renderer.
///
/// The browser profile lives in a temporary directory shared by clones and
/// removed when the last clone is dropped.
#[derive(Debug, Clone)]
pub struct ChromiumRenderer {
    binary: Option<PathBuf>,
    device_scale_factor: f64,
    virtual_time_budget_ms: u32,
    profile: Arc<OnceLock<TempDir>>,
}

impl ChromiumRenderer {
    /// Locate Chromium via `CHROME_BIN` or `PATH`.
    pub fn new() -> Self {
        let binary = std::env::var_os(CHROME_ENV)
            .and_then(|p| process::resolve_program(Path::new(&p)))
            .or_else(|| process::find_first(CHROME_CANDIDATES));
        Self {
            binary,
            device_scale_factor: 1.0,
            virtual_time_budget_ms: 2000,
            profile: Arc::new(OnceLock::new()),
        }
    }

    /// Use an explicit binary.
    pub fn with_binary(mut self, binary: impl AsRef<Path>) -> Self {
        self.binary = process::resolve_program(binary.as_ref());
        self
    }

    /// Output pixels per CSS pixel. Non-positive values are ignored.
    pub fn with_device_scale_factor(mut self, factor: f64) -> Self {
        if factor.is_finite() && factor > 0.0 {
            self.device_scale_factor = factor;
        }
        self
    }

    /// Virtual time Chromium waits before the screenshot.
    pub fn with_virtual_time_budget(mut self, millis: u32) -> Self {
        self.virtual_time_budget_ms = millis;
        self
    }

    /// The resolved binary, if any.
    pub fn binary(&self) -> Option<&Path> {
        self.binary.as_deref()
    }

    /// Profile directory, created on first use.
    fn profile_dir(&self) -> Result<&Path> {
        if let Some(dir) = self.profile.get() {
            return Ok(dir.path());
        }
        let dir = tempfile::Builder::new()
            .prefix("pdfhtml-chromium-")
            .tempdir()?;
        log::debug!("Chromium profile at {}", dir.path().display());
        Ok(self.profile.get_or_init(|| dir).path())
    }

    /// CSS viewport for a target bitmap size.
    fn viewport(&self, width: u32, height: u32) -> (u32, u32) {
        let css = |px: u32| {
            ((px as f64 / self.device_scale_factor).round() as u32).max(MIN_VIEWPORT)
        };
        (css(width), css(height))
    }

    fn args(
        &self,
        headless: HeadlessMode,
        profile_dir: &Path,
        viewport: (u32, u32),
        output: &Path,
        uri: &str,
    ) -> Vec<String> {
        let headless_flag = match headless {
            HeadlessMode::New => "--headless=new",
            HeadlessMode::Legacy => "--headless",
        };
        vec![
            headless_flag.to_string(),
            "--disable-gpu".to_string(),
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--hide-scrollbars".to_string(),
            format!("--window-size={},{}", viewport.0, viewport.1),
            format!("--force-device-scale-factor={}", self.device_scale_factor),
            format!("--virtual-time-budget={}", self.virtual_time_budget_ms),
            "--allow-file-access-from-files".to_string(),
            "--disable-background-networking".to_string(),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            "--disable-component-update".to_string(),
            "--disable-sync".to_string(),
            format!("--user-data-dir={}", profile_dir.display()),
            format!("--screenshot={}", output.display()),
            uri.to_string(),
        ]
    }

    fn run(&self, binary: &Path, args: Vec<String>, output: &Path) -> Result<()> {
        // Stale screenshots must not pass for fresh ones
        let _ = fs::remove_file(output);

        let mut cmd = Command::new(binary);
        cmd.args(args);
        process::run(cmd, "chromium")?;

        if output.is_file() {
            Ok(())
        } else {
            Err(Error::Render(format!(
                "chromium wrote no screenshot to {}",
                output.display()
            )))
        }
    }
}

impl Default for ChromiumRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlRenderer for ChromiumRenderer {
    fn name(&self) -> &str {
        "chromium"
    }

    fn render(&self, uri: &str, output: &Path, width: u32, height: u32) -> Result<Option<PathBuf>> {
        let Some(binary) = self.binary.as_deref() else {
            return Ok(None);
        };

        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        let profile_dir = self.profile_dir()?;

        let viewport = self.viewport(width, height);
        let args = self.args(HeadlessMode::New, profile_dir, viewport, output, uri);
        match self.run(binary, args, output) {
            Ok(()) => Ok(Some(output.to_path_buf())),
            Err(Error::Render(reason)) => {
                // Older builds only know the legacy flag
                log::debug!("Retrying with legacy headless mode: {}", reason);
                let args = self.args(HeadlessMode::Legacy, profile_dir, viewport, output, uri);
                self.run(binary, args, output)?;
                Ok(Some(output.to_path_buf()))
            }
            Err(e) => Err(e),
        }
    }
}

/// `file://` URI for a local path, with an optional fragment.
pub fn file_uri(path: &Path, fragment: Option<&str>) -> String {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut uri = String::from("file://");
    for component in absolute.components() {
        match component {
            Component::Prefix(prefix) => {
                uri.push('/');
                uri.push_str(&prefix.as_os_str().to_string_lossy());
            }
            Component::RootDir => {}
            Component::Normal(part) => {
                uri.push('/');
                uri.push_str(&encode_segment(&part.to_string_lossy()));
            }
            Component::CurDir => {}
            Component::ParentDir => uri.push_str("/.."),
        }
    }

    if let Some(fragment) = fragment {
        uri.push('#');
        uri.push_str(fragment);
    }
    uri
}

fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_renderer() {
        let renderer = UnavailableRenderer;
        let result = renderer
            .render("file:///x.html", Path::new("/tmp/out.png"), 100, 100)
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let renderer = ChromiumRenderer::new().with_binary("/no/such/dir/chrome");
        assert!(renderer.binary().is_none());
        let result = renderer
            .render("file:///x.html", Path::new("/tmp/out.png"), 100, 100)
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_viewport_uses_scale_and_floor() {
        let renderer = ChromiumRenderer::new().with_device_scale_factor(2.0);
        assert_eq!(renderer.viewport(400, 600), (200, 300));
        assert_eq!(renderer.viewport(4, 6), (10, 10));
    }

    #[test]
    fn test_args_carry_viewport_and_target() {
        let renderer = ChromiumRenderer::new();
        let args = renderer.args(
            HeadlessMode::New,
            Path::new("/tmp/profile"),
            (200, 300),
            Path::new("/tmp/shot.png"),
            "file:///tmp/index.html#page-1",
        );
        assert_eq!(args[0], "--headless=new");
        assert!(args.contains(&"--window-size=200,300".to_string()));
        assert!(args.contains(&"--screenshot=/tmp/shot.png".to_string()));
        assert!(args.contains(&"--hide-scrollbars".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("file:///tmp/index.html#page-1"));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_uri() {
        assert_eq!(
            file_uri(Path::new("/tmp/my out/index.html"), Some("page-2")),
            "file:///tmp/my%20out/index.html#page-2"
        );
        assert_eq!(file_uri(Path::new("/a/b.html"), None), "file:///a/b.html");
    }

    #[cfg(unix)]
    #[test]
    fn test_stub_chromium_screenshot() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let stub = dir.path().join("chrome");
        fs::write(
            &stub,
            "#!/bin/sh\nfor arg; do case \"$arg\" in --screenshot=*) printf 'png' > \"${arg#--screenshot=}\";; esac; done\n",
        )
        .unwrap();
        fs::set_permissions(&stub, fs::Permissions::from_mode(0o755)).unwrap();

        let output = dir.path().join("shots").join("page_1.png");
        let renderer = ChromiumRenderer::new().with_binary(&stub);
        let rendered = renderer
            .render("file:///tmp/index.html#page-1", &output, 200, 300)
            .unwrap();
        assert_eq!(rendered, Some(output.clone()));
        assert!(output.is_file());
    }

    #[cfg(unix)]
    #[test]
    fn test_profile_dir_is_reused_and_removed() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let stub = dir.path().join("chrome");
        let log = dir.path().join("profiles.txt");
        fs::write(
            &stub,
            format!(
                "#!/bin/sh\nfor arg; do case \"$arg\" in --user-data-dir=*) echo \"${{arg#--user-data-dir=}}\" >> {};; --screenshot=*) printf 'png' > \"${{arg#--screenshot=}}\";; esac; done\n",
                log.display()
            ),
        )
        .unwrap();
        fs::set_permissions(&stub, fs::Permissions::from_mode(0o755)).unwrap();

        let renderer = ChromiumRenderer::new().with_binary(&stub);
        let copy = renderer.clone();
        renderer
            .render("file:///x.html", &dir.path().join("a.png"), 50, 50)
            .unwrap();
        copy.render("file:///x.html", &dir.path().join("b.png"), 50, 50)
            .unwrap();

        let used = fs::read_to_string(&log).unwrap();
        let profiles: Vec<&str> = used.lines().collect();
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0], profiles[1]);
        let profile = PathBuf::from(profiles[0]);
        assert!(profile.is_dir());

        drop(renderer);
        assert!(profile.is_dir());
        drop(copy);
        assert!(!profile.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_stub_without_screenshot_fails() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let stub = dir.path().join("chrome");
        fs::write(&stub, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&stub, fs::Permissions::from_mode(0o755)).unwrap();

        let renderer = ChromiumRenderer::new().with_binary(&stub);
        let err = renderer
            .render("file:///x.html", &dir.path().join("out.png"), 50, 50)
            .unwrap_err();
        assert!(matches!(err, Error::Render(_)));
    }
}
