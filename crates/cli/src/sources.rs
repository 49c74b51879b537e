//! Source file discovery and text extraction for `ragpack create`.

use anyhow::{Context, Result};
use ragpack::SourceDocument;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Content type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Markdown,
    PlainText,
}

impl ContentType {
    /// Detect content type from file extension. Unsupported files yield `None`.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("md") | Some("markdown") => Some(Self::Markdown),
            Some("txt") | Some("text") => Some(Self::PlainText),
            _ => None,
        }
    }
}

/// Collect documents from files and directories.
///
/// Directories are walked recursively; hidden entries and files that are not
/// `.txt` or `.md` are skipped. Output order is sorted by path so the same
/// inputs always produce the same pack.
pub fn collect_documents(paths: &[PathBuf], keep_raw: bool) -> Result<Vec<SourceDocument>> {
    // (file, display name); walked files are named relative to their root so
    // same-named files in different directories stay distinct.
    let mut files: Vec<(PathBuf, String)> = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push((path.clone(), file_label(path)));
        } else if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(false)
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()))
                .filter_map(|e| e.ok())
            {
                let entry_path = entry.path();
                if entry_path.is_file() && ContentType::from_path(entry_path).is_some() {
                    let name = relative_label(path, entry_path);
                    files.push((entry_path.to_path_buf(), name));
                }
            }
        } else {
            anyhow::bail!("Source path does not exist: {}", path.display());
        }
    }

    files.sort();
    files.dedup_by(|a, b| a.0 == b.0);

    let mut documents = Vec::with_capacity(files.len());
    for (file, name) in &files {
        if let Some(document) = read_document(file, name, keep_raw)? {
            documents.push(document);
        }
    }

    tracing::info!(
        "Collected {} documents from {} paths",
        documents.len(),
        paths.len()
    );
    Ok(documents)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn relative_label(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(relative) => relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => file_label(path),
    }
}

/// Read one file; `None` for unsupported, binary or empty files.
fn read_document(path: &Path, name: &str, keep_raw: bool) -> Result<Option<SourceDocument>> {
    let Some(content_type) = ContentType::from_path(path) else {
        tracing::warn!("Skipping unsupported file: {}", path.display());
        return Ok(None);
    };

    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let raw = match String::from_utf8(bytes.clone()) {
        Ok(text) if is_likely_text(&text) => text,
        _ => {
            tracing::warn!("Skipping likely binary file: {}", path.display());
            return Ok(None);
        }
    };

    let text = match content_type {
        ContentType::Markdown => clean_markdown(&raw),
        ContentType::PlainText => raw.trim().to_string(),
    };
    if text.is_empty() {
        tracing::warn!("Skipping empty file: {}", path.display());
        return Ok(None);
    }

    tracing::debug!("Read {} ({} bytes)", path.display(), bytes.len());

    let document = SourceDocument::text(name, text);
    Ok(Some(if keep_raw {
        document.with_raw(bytes)
    } else {
        document
    }))
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

/// Clean markdown by removing excess formatting.
fn clean_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for line in text.lines() {
        // Remove markdown headers
        let trimmed = line.trim_start_matches('#').trim();

        // Skip horizontal rules and code fences
        if trimmed.starts_with("---") || trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            continue;
        }

        if !trimmed.is_empty() {
            result.push_str(trimmed);
            result.push('\n');
        }
    }

    result.trim().to_string()
}

/// Check if text is likely text (not binary).
fn is_likely_text(data: &str) -> bool {
    !data.contains('\0')
}
