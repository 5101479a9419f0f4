use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::candidates;
use crate::config::Config;
use crate::icon::{self, IconImage};

/// Extract the display icon from an in-memory PE image.
///
/// Returns `None` whenever no usable icon can be produced; callers fall back
/// to a default icon.
///
/// # Example
///
/// ```rust,no_run
/// use exe_icon::icon::IconImage;
/// use exe_icon::pipeline::extract_icon_from_bytes;
///
/// let bytes = std::fs::read("Game.exe").unwrap();
/// match extract_icon_from_bytes(&bytes) {
///     Some(IconImage::Png(png)) => println!("embedded PNG, {} bytes", png.len()),
///     Some(IconImage::Bitmap(bmp)) => println!("decoded {}x{}", bmp.width, bmp.height),
///     None => println!("no icon"),
/// }
/// ```
pub fn extract_icon_from_bytes(buf: &[u8]) -> Option<IconImage> {
    let resource = icon::resolve_icon_bytes(buf)?;
    let image = icon::decode(resource.bytes, Some(&resource.entry));
    if image.is_none() {
        log::debug!(
            "icon frame {} ({}x{}, {}bpp) could not be decoded",
            resource.entry.id,
            resource.entry.width,
            resource.entry.height,
            resource.entry.bit_count
        );
    }
    image
}

/// Read `exe_path` once and extract its display icon.
///
/// An unreadable file is treated like a file without an icon.
pub fn extract_exe_icon(exe_path: &Path) -> Option<IconImage> {
    let buf = read_exe(exe_path)?;
    extract_icon_from_bytes(&buf)
}

/// Return the chosen icon frame only if it is an embedded PNG (no DIB decode).
pub fn extract_exe_icon_png(exe_path: &Path) -> Option<Vec<u8>> {
    let buf = read_exe(exe_path)?;
    let resource = icon::resolve_icon_bytes(&buf)?;
    icon::is_png(resource.bytes).then(|| resource.bytes.to_vec())
}

fn read_exe(exe_path: &Path) -> Option<Vec<u8>> {
    match std::fs::read(exe_path) {
        Ok(buf) => Some(buf),
        Err(e) => {
            log::debug!("Failed to read {}: {e}", exe_path.display());
            None
        }
    }
}

/// Resolve an input path to an executable.
///
/// Files are used as-is. Directories are searched (non-recursively) for the
/// most likely game executable, using `game_name` and the directory name as hints.
pub fn resolve_exe(path: &Path, game_name: Option<&str>) -> Option<PathBuf> {
    if path.is_dir() {
        candidates::find_best_exe_path(path, game_name)
    } else if path.is_file() {
        Some(path.to_path_buf())
    } else {
        None
    }
}

/// Keep the input paths that exist (files or directories).
pub fn collect_inputs(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut inputs = Vec::new();
    for path in paths {
        if path.is_file() || path.is_dir() {
            inputs.push(path.clone());
        } else {
            log::warn!("Path does not exist: {}", path.display());
        }
    }
    inputs
}

/// The result of processing one input path.
#[derive(Debug, Default)]
pub struct ProcessResult {
    /// The input path (file or game folder).
    pub path: PathBuf,
    /// The executable the icon was taken from.
    pub exe_path: Option<PathBuf>,
    /// `"png"` or `"bitmap"` when an icon was found.
    pub kind: Option<&'static str>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Where the PNG was (or, in dry-run mode, would be) written.
    pub output_path: Option<PathBuf>,
    /// Whether a file was actually written.
    pub written: bool,
    pub data_url: Option<String>,
    pub error: Option<String>,
}

/// Resolve, extract and write the icon for a single input path.
///
/// Never fails: problems are reported through [`ProcessResult::error`].
///
/// # Example
///
/// ```rust,no_run
/// use exe_icon::config::Config;
/// use exe_icon::pipeline::process_path;
/// use std::path::Path;
///
/// let config = Config::default();
/// let result = process_path(Path::new("C:/Games/CoolGame"), Some("Cool Game"), &config);
/// if let Some(ref out) = result.output_path {
///     println!("icon: {}", out.display());
/// }
/// ```
pub fn process_path(path: &Path, game_name: Option<&str>, config: &Config) -> ProcessResult {
    let mut result = ProcessResult {
        path: path.to_path_buf(),
        ..Default::default()
    };

    let Some(exe_path) = resolve_exe(path, game_name) else {
        result.error = Some("No executable found".to_string());
        return result;
    };
    result.exe_path = Some(exe_path.clone());

    let Some(image) = extract_exe_icon(&exe_path) else {
        result.error = Some("No usable icon".to_string());
        return result;
    };
    result.kind = Some(image.kind());
    if let Some((width, height)) = image.dimensions() {
        result.width = Some(width);
        result.height = Some(height);
    }

    if config.output.embed_data_url {
        match image.to_data_url() {
            Ok(url) => result.data_url = Some(url),
            Err(e) => log::warn!("Failed to build data URL for {}: {e}", exe_path.display()),
        }
    }

    let output_path = config.icon_output_path(&exe_path);
    result.output_path = Some(output_path.clone());

    if config.output.dry_run {
        return result;
    }
    if output_path.exists() && !config.output.overwrite {
        log::info!("  Skipping existing {}", output_path.display());
        return result;
    }

    match write_icon(&image, &output_path) {
        Ok(()) => result.written = true,
        Err(e) => result.error = Some(format!("{e:#}")),
    }

    result
}

/// Write `image` as a PNG file, creating the parent directory if needed.
pub fn write_icon(image: &IconImage, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).context("Failed to create output directory")?;
    }
    let png = image.to_png()?;
    std::fs::write(output_path, png).context("Failed to write icon file")?;
    log::debug!("Icon written: {}", output_path.display());
    Ok(())
}
