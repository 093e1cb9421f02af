//! Hardcoded image list maintenance.
//!
//! The gallery page carries a literal image list between two marker
//! comments. `update_image_list` rescans the image directory and rewrites
//! that block in place. The new text goes to a temporary file next to the
//! target which then replaces it, so a failed run never leaves a partial
//! write behind.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use log::{debug, info};
use regex::{NoExpand, Regex};

pub const BEGIN_MARKER: &str = "// photowall:images:begin";
pub const END_MARKER: &str = "// photowall:images:end";

/// Recognised image extensions (compared case-insensitively).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Marker-delimited block, non-greedy so only the first block is replaced.
static LIST_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?s){}.*?{}",
        regex::escape(BEGIN_MARKER),
        regex::escape(END_MARKER)
    ))
    .unwrap()
});

/// Outcome of a successful rewrite.
#[derive(Debug)]
pub struct UpdateReport {
    pub images: Vec<String>,
    pub source: PathBuf,
}

/// Whether a file name carries a recognised image extension.
pub fn is_image_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(e)))
}

/// Image file names in `dir`, in directory enumeration order.
pub fn scan_images(dir: &Path) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read image directory {}", dir.display()))?;
    let mut images = Vec::new();
    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_image_name(&name) {
            images.push(name);
        } else {
            debug!("manifest: skipping {name}");
        }
    }
    Ok(images)
}

/// Render the list block, markers included.
pub fn render_block(images: &[String]) -> String {
    let items: Vec<String> = images
        .iter()
        .map(|name| format!("  '{}'", name.replace('\\', "\\\\").replace('\'', "\\'")))
        .collect();
    format!(
        "{BEGIN_MARKER}\nconst images = [\n{}\n];\n{END_MARKER}",
        items.join(",\n")
    )
}

/// Replace the marker block in `source`. Errors when no block exists.
pub fn replace_block(source: &str, images: &[String]) -> Result<String> {
    if !LIST_BLOCK_RE.is_match(source) {
        anyhow::bail!("image list markers `{BEGIN_MARKER}` … `{END_MARKER}` not found");
    }
    let block = render_block(images);
    Ok(LIST_BLOCK_RE
        .replace(source, NoExpand(&block))
        .into_owned())
}

/// Rescan `dir` and rewrite the list block in `source_file`.
pub fn update_image_list(dir: &Path, source_file: &Path) -> Result<UpdateReport> {
    let images = scan_images(dir)?;
    info!("manifest: {} image(s) in {}", images.len(), dir.display());

    let source = std::fs::read_to_string(source_file)
        .with_context(|| format!("failed to read {}", source_file.display()))?;
    let updated = replace_block(&source, &images)
        .with_context(|| format!("cannot update {}", source_file.display()))?;

    write_atomic(source_file, &updated)?;
    Ok(UpdateReport {
        images,
        source: source_file.to_path_buf(),
    })
}

fn write_atomic(target: &Path, text: &str) -> Result<()> {
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temporary file in {}", parent.display()))?;
    tmp.write_all(text.as_bytes())
        .with_context(|| format!("failed to write {}", tmp.path().display()))?;
    tmp.persist(target)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to write {}", target.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_name_filter() {
        assert!(is_image_name("x.png"));
        assert!(is_image_name("Z.JPEG"));
        assert!(is_image_name("a.b.webp"));
        assert!(!is_image_name("y.txt"));
        assert!(!is_image_name("webp"));
        assert!(!is_image_name(".gitkeep"));
    }

    #[test]
    fn render_block_format() {
        let block = render_block(&["1.webp".into(), "2.webp".into()]);
        assert_eq!(
            block,
            "// photowall:images:begin\nconst images = [\n  '1.webp',\n  '2.webp'\n];\n// photowall:images:end"
        );
    }

    #[test]
    fn render_block_escapes_quotes() {
        let block = render_block(&["it's.png".into()]);
        assert!(block.contains(r"'it\'s.png'"));
    }

    #[test]
    fn replace_keeps_surrounding_text() {
        let src = "let a = 1;\n// photowall:images:begin\nconst images = [\n  'old.png'\n];\n// photowall:images:end\nrun();\n";
        let out = replace_block(src, &["new.png".into()]).unwrap();
        assert!(out.starts_with("let a = 1;\n"));
        assert!(out.ends_with("\nrun();\n"));
        assert!(out.contains("'new.png'"));
        assert!(!out.contains("old.png"));
    }

    #[test]
    fn replace_with_dollar_in_name_is_literal() {
        let src = "// photowall:images:begin\n// photowall:images:end";
        let out = replace_block(src, &["$1.png".into()]).unwrap();
        assert!(out.contains("'$1.png'"));
    }

    #[test]
    fn replace_without_markers_fails() {
        assert!(replace_block("const images = [];", &[]).is_err());
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn missing_source_fails_without_creating_it() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("1.png"), b"").unwrap();
        let source = dir.path().join("script.js");

        assert!(update_image_list(dir.path(), &source).is_err());
        assert!(!source.exists());
        assert_eq!(dir_entries(dir.path()), ["1.png"]);
    }

    #[test]
    fn unreadable_source_leaves_target_untouched() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the script should be cannot be read as text.
        let source = dir.path().join("script.js");
        std::fs::create_dir(&source).unwrap();

        assert!(update_image_list(dir.path(), &source).is_err());
        assert!(source.is_dir());
        assert_eq!(dir_entries(dir.path()), ["script.js"]);
    }

    #[test]
    fn atomic_write_into_missing_directory_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("gone").join("script.js");
        assert!(write_atomic(&target, "const images = [];").is_err());
        assert!(!target.exists());
        assert!(dir_entries(dir.path()).is_empty());
    }

    #[test]
    fn empty_list_renders_empty_array() {
        let block = render_block(&[]);
        assert!(block.contains("const images = [\n\n];"));
    }
}
