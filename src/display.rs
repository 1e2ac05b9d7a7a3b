//! Rendering helpers for the original/compressed comparison
//!
//! Everything here is pure string formatting over a `SessionState`, so any
//! front end (the bundled CLI included) can reuse it.

use crate::asset::{CompressedAsset, ImageAsset};
use crate::constants::{COMPRESSED_PREFIX, ORIGINAL_PREFIX, RATIO_PREFIX, WARNING_PREFIX};
use crate::session::SessionState;

const COLUMN_WIDTH: usize = 32;

/// Formats a KiB value the way sizes are shown to the user.
pub fn format_kib(size_kib: f64) -> String {
    format!("{:.2} KB", size_kib)
}

/// Size reduction as a percentage (positive means smaller, negative larger).
pub fn reduction_ratio(original_kib: f64, compressed_kib: f64) -> f64 {
    if original_kib <= 0.0 {
        return 0.0;
    }
    ((original_kib - compressed_kib) / original_kib) * 100.0
}

fn original_lines(original: &ImageAsset) -> Vec<String> {
    vec![
        "Original Image".to_string(),
        format!("Name: {}", original.name),
        format!("Size: {}", format_kib(original.size_kib)),
        format!("Dimensions: {} x {}", original.width, original.height),
    ]
}

fn compressed_lines(compressed: &CompressedAsset) -> Vec<String> {
    vec![
        "Compressed Image".to_string(),
        format!("Download: {}", compressed.download_url),
        format!("Size: {}", format_kib(compressed.size_kib)),
        format!("Dimensions: {} x {}", compressed.width, compressed.height),
    ]
}

fn side_by_side(left: &[String], right: &[String]) -> Vec<String> {
    let rows = left.len().max(right.len());
    (0..rows)
        .map(|i| {
            let l = left.get(i).map(String::as_str).unwrap_or("");
            let r = right.get(i).map(String::as_str).unwrap_or("");
            format!("{:<width$} | {}", l, r, width = COLUMN_WIDTH)
                .trim_end()
                .to_string()
        })
        .collect()
}

/// Renders the current state as a block of lines.
pub fn render_state(state: &SessionState) -> String {
    match state {
        SessionState::Idle => "No image selected".to_string(),
        SessionState::Busy => "Compressing image...".to_string(),
        SessionState::Ready {
            original,
            compressed,
        } => {
            let mut lines = side_by_side(&original_lines(original), &compressed_lines(compressed));
            lines.push(String::new());
            lines.push(format!(
                "{} {} -> {}",
                ORIGINAL_PREFIX,
                format_kib(original.size_kib),
                format_kib(compressed.size_kib)
            ));
            let ratio = reduction_ratio(original.size_kib, compressed.size_kib);
            if ratio >= 0.0 {
                lines.push(format!("{} Reduced by {:.1}%", RATIO_PREFIX, ratio));
            } else {
                lines.push(format!(
                    "{} {} Grew by {:.1}%",
                    COMPRESSED_PREFIX,
                    WARNING_PREFIX,
                    ratio.abs()
                ));
            }
            lines.join("\n")
        }
        SessionState::Failed { original, reason } => {
            let mut lines = original_lines(original);
            lines.push(String::new());
            lines.push(format!("Upload failed: {}", reason));
            lines.join("\n")
        }
    }
}
