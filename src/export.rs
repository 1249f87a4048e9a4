//! Saving chants to disk, fetching the published score image and copying to
//! the terminal clipboard.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use base64::Engine as _;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::gabc::{export_file_stem, gabc_document};
use crate::links::score_image_url;
use crate::models::ChantRecord;
use crate::render::BackgroundEvent;

const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";
const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("score image request failed")]
    Http(#[from] reqwest::Error),
    #[error("score image service returned {0}")]
    Status(reqwest::StatusCode),
    #[error("clipboard unavailable")]
    Clipboard(#[source] io::Error),
}

fn write_file(path: &Path, contents: &str) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ExportError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, contents).map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the header plus processed body to `<dir>/<stem>.gabc`.
pub fn save_gabc(dir: &Path, record: &ChantRecord, processed: &str) -> Result<PathBuf, ExportError> {
    let path = dir.join(format!("{}.gabc", export_file_stem(&record.incipit)));
    write_file(&path, &gabc_document(record, processed))?;
    info!(id = record.id, path = %path.display(), "saved gabc");
    Ok(path)
}

/// Write an SVG document to `<dir>/<stem>.svg`, adding the namespaces
/// standalone viewers need.
pub fn save_svg(dir: &Path, record: &ChantRecord, svg: &str) -> Result<PathBuf, ExportError> {
    let path = dir.join(format!("{}.svg", export_file_stem(&record.incipit)));
    write_file(&path, &ensure_svg_namespaces(svg))?;
    info!(id = record.id, path = %path.display(), "saved svg");
    Ok(path)
}

/// Cache file for the latest live render of a chant.
pub fn write_render_cache(cache_dir: &Path, chant_id: i64, svg: &str) -> Result<PathBuf, ExportError> {
    let path = cache_dir.join(format!("chant-{chant_id}.svg"));
    write_file(&path, &ensure_svg_namespaces(svg))?;
    debug!(path = %path.display(), "cached live render");
    Ok(path)
}

/// Add `xmlns` and `xmlns:xlink` to the root `<svg>` element when absent.
pub fn ensure_svg_namespaces(svg: &str) -> String {
    let Some(start) = svg.find("<svg") else {
        return svg.to_string();
    };
    let Some(tag_len) = svg[start..].find('>') else {
        return svg.to_string();
    };
    let open_tag = &svg[start..start + tag_len];

    let mut additions = String::new();
    if !open_tag.contains("xmlns=") {
        additions.push_str(&format!(" xmlns=\"{SVG_NAMESPACE}\""));
    }
    if !open_tag.contains("xmlns:xlink=") {
        additions.push_str(&format!(" xmlns:xlink=\"{XLINK_NAMESPACE}\""));
    }
    if additions.is_empty() {
        return svg.to_string();
    }

    let insert_at = start + "<svg".len();
    let mut fixed = String::with_capacity(svg.len() + additions.len());
    fixed.push_str(&svg[..insert_at]);
    fixed.push_str(&additions);
    fixed.push_str(&svg[insert_at..]);
    fixed
}

/// Download the published score for `chant_id`.
pub fn fetch_remote_svg(chant_id: i64) -> Result<String, ExportError> {
    let url = score_image_url(chant_id);
    debug!(%url, "fetching score image");
    let client = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()?;
    let response = client.get(&url).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(ExportError::Status(status));
    }
    Ok(response.text()?)
}

/// Fetch on a worker thread and report through `events`.
pub fn spawn_svg_fetch(chant_id: i64, events: Sender<BackgroundEvent>) {
    thread::spawn(move || {
        let result = fetch_remote_svg(chant_id);
        if let Err(err) = &result {
            warn!(chant_id, error = %err, "score image fetch failed");
        }
        let _ = events.send(BackgroundEvent::SvgFetched { chant_id, result });
    });
}

/// OSC 52 "set clipboard" escape sequence for `text`.
pub fn osc52_sequence(text: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());
    format!("\x1b]52;c;{encoded}\x07")
}

/// Ask the terminal to place `text` on the system clipboard.
pub fn copy_to_clipboard<W: Write>(out: &mut W, text: &str) -> Result<(), ExportError> {
    out.write_all(osc52_sequence(text).as_bytes())
        .and_then(|()| out.flush())
        .map_err(ExportError::Clipboard)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ChantRecord {
        ChantRecord {
            id: 12,
            incipit: "Ave Maria".to_string(),
            office_part: "an".to_string(),
            mode: "1".to_string(),
            ..ChantRecord::default()
        }
    }

    #[test]
    fn saves_gabc_document_under_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_gabc(dir.path(), &record(), "(c4) A(f)").unwrap();
        assert_eq!(path, dir.path().join("Ave_Maria.gabc"));
        let written = fs::read_to_string(path).unwrap();
        assert!(written.starts_with("name:Ave Maria;\n"));
        assert!(written.ends_with("%%\n(c4) A(f)"));
    }

    #[test]
    fn saves_svg_with_namespaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_svg(dir.path(), &record(), "<svg width=\"10\"></svg>").unwrap();
        let written = fs::read_to_string(path).unwrap();
        assert!(written.contains(SVG_NAMESPACE));
        assert!(written.contains(XLINK_NAMESPACE));
    }

    #[test]
    fn namespaces_are_not_duplicated() {
        let svg = format!("<?xml version=\"1.0\"?>\n<svg xmlns=\"{SVG_NAMESPACE}\"><g/></svg>");
        let fixed = ensure_svg_namespaces(&svg);
        assert_eq!(fixed.matches("xmlns=").count(), 1);
        assert_eq!(fixed.matches("xmlns:xlink=").count(), 1);
        assert!(fixed.starts_with("<?xml version=\"1.0\"?>\n<svg xmlns:xlink="));
    }

    #[test]
    fn non_svg_text_is_untouched() {
        assert_eq!(ensure_svg_namespaces("not an image"), "not an image");
    }

    #[test]
    fn cache_file_is_named_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_render_cache(&dir.path().join("cache"), 5, "<svg/>").unwrap();
        assert_eq!(path, dir.path().join("cache").join("chant-5.svg"));
        assert!(path.exists());
    }

    #[test]
    fn osc52_wraps_base64_payload() {
        assert_eq!(osc52_sequence("hi"), "\x1b]52;c;aGk=\x07");
        let mut out = Vec::new();
        copy_to_clipboard(&mut out, "hi").unwrap();
        assert_eq!(out, b"\x1b]52;c;aGk=\x07");
    }
}
