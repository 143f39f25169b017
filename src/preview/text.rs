use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

use unicode_width::UnicodeWidthChar;

use super::Dimensions;

pub const BINARY_PLACEHOLDER: &str = "<binary content>";

/// Read at most `limit` bytes from the start of a file.
pub fn read_head(path: &Path, limit: usize) -> io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(limit.min(64 * 1024));
    File::open(path)?.take(limit as u64).read_to_end(&mut buf)?;
    Ok(buf)
}

/// Lines of a text file clipped to the preview window, or the binary
/// placeholder if the content isn't UTF-8.
pub fn text_lines(content: &[u8], dim: Dimensions) -> Vec<String> {
    let text = match std::str::from_utf8(content) {
        Ok(text) => text,
        // A multi-byte character cut off by the read limit still counts as text.
        Err(e) if e.error_len().is_none() => {
            std::str::from_utf8(&content[..e.valid_up_to()]).unwrap_or_default()
        }
        Err(_) => return vec![BINARY_PLACEHOLDER.to_string()],
    };

    text.split('\n')
        .take(dim.height)
        .map(|line| clip(&line.trim_end_matches('\r').replace('\t', "    "), dim.width))
        .collect()
}

/// Entry names of a directory, directories first, clipped to the preview window.
pub fn directory_lines(path: &Path, dim: Dimensions) -> io::Result<Vec<String>> {
    let mut entries: Vec<(bool, String)> = fs::read_dir(path)?
        .filter_map(|entry| entry.ok())
        .map(|entry| {
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            let mut name = entry.file_name().to_string_lossy().to_string();
            if is_dir {
                name.push('/');
            }
            (is_dir, name)
        })
        .collect();
    entries.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then_with(|| a.1.to_lowercase().cmp(&b.1.to_lowercase()))
    });

    Ok(entries
        .into_iter()
        .take(dim.height)
        .map(|(_, name)| clip(&name, dim.width))
        .collect())
}

/// Truncate to at most `width` terminal columns.
pub fn clip(s: &str, width: usize) -> String {
    let mut used = 0;
    let mut out = String::new();
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        out.push(c);
    }
    out
}
