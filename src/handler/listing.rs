//! Media index page
//!
//! `GET /` lists every video file under the root, recursively, as links that
//! can be pasted into a player.

use hyper::Response;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::fmt::Write;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::ServeError;
use crate::http::{build_html_response, ResponseBody};

/// Extensions shown in the index (compared lowercase)
pub const MEDIA_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi", "mov", "wmv", "flv", "webm"];

/// Characters escaped inside one URL path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// A listed media file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaEntry {
    /// Path relative to the root, `/`-separated
    pub name: String,
    pub size: u64,
}

/// Render the index of `root`
pub async fn serve_listing(root: &Path, is_head: bool) -> Result<Response<ResponseBody>, ServeError> {
    let root = root.to_path_buf();
    let entries = tokio::task::spawn_blocking(move || collect_media(&root))
        .await
        .map_err(io::Error::other)??;
    Ok(build_html_response(render_listing(&entries), is_head))
}

/// Walk `root` and return media files sorted by relative path
///
/// Unreadable entries are skipped. Symlinked directories are not descended,
/// symlinked files are listed only if their target is a regular file inside
/// the root.
pub fn collect_media(root: &Path) -> io::Result<Vec<MediaEntry>> {
    let canonical_root = root.canonicalize()?;
    let mut entries = Vec::new();
    let mut pending: Vec<PathBuf> = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let Ok(read_dir) = std::fs::read_dir(&dir) else {
            continue;
        };
        for dir_entry in read_dir.flatten() {
            let path = dir_entry.path();
            let Ok(file_type) = dir_entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                pending.push(path);
                continue;
            }
            if !is_media_file(&path) {
                continue;
            }
            let Ok(target) = path.canonicalize() else {
                continue;
            };
            if !target.starts_with(&canonical_root) {
                continue;
            }
            let Ok(metadata) = std::fs::metadata(&target) else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            if let Some(name) = relative_name(root, &path) {
                entries.push(MediaEntry {
                    name,
                    size: metadata.len(),
                });
            }
        }
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

fn is_media_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| MEDIA_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

fn relative_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

/// Render the HTML page
pub fn render_listing(entries: &[MediaEntry]) -> String {
    let mut items = String::new();
    for entry in entries {
        let href: Vec<String> = entry
            .name
            .split('/')
            .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
            .collect();
        #[allow(clippy::cast_precision_loss)]
        let size_mb = entry.size as f64 / 1024.0 / 1024.0;
        let _ = write!(
            items,
            "        <li>\n            <a href=\"/{}\" class=\"video-file\">{}</a>\n            <span class=\"file-size\"> ({size_mb:.2} MB)</span>\n        </li>\n",
            escape_html(&href.join("/")),
            escape_html(&entry.name),
        );
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Video Streaming Server</title>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 40px; }}
        h1 {{ color: #333; }}
        .file-list {{ list-style: none; padding: 0; }}
        .file-list li {{ margin: 10px 0; }}
        .file-list a {{ text-decoration: none; color: #007bff; font-size: 16px; }}
        .file-list a:hover {{ text-decoration: underline; }}
        .video-file {{ font-weight: bold; }}
        .file-size {{ color: #666; font-size: 14px; }}
    </style>
</head>
<body>
    <h1>Available Videos</h1>
    <ul class="file-list">
{items}    </ul>
    <p style="color: #666; font-size: 14px; margin-top: 30px;">
        Copy the video URL and paste it into VLC: Media &gt; Open Network Stream
    </p>
</body>
</html>"#
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
