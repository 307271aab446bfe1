use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::ShareError;
use crate::models::Format;

/// Writes `<format>-<eventId>.png` into `dir`, creating it if needed.
pub fn save_png(dir: &Path, format: Format, event_id: &str, png: &[u8]) -> Result<PathBuf, ShareError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format.file_name(event_id));
    fs::write(&path, png)?;
    info!(path = %path.display(), bytes = png.len(), "saved image");
    Ok(path)
}
