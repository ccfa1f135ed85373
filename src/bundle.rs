//! CVAT-ready bundle: one ZIP combining the image tree and label tree.
//!
//! Entries are stored uncompressed (the bulk is already-compressed
//! JPEG data) at forward-slash relative paths, images relative to the
//! image root and labels relative to the label root, so the annotation
//! tool pairs them by matching base name on import.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::LitterprepError;

/// Extensions recognized as bundle-worthy image files.
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "tif", "tiff"];

const LABEL_EXTENSION: &str = "txt";

/// Writes the bundle ZIP.
///
/// Entry order is sorted by archive path, so repeated runs over the
/// same trees produce byte-identical listings.
pub fn write_bundle(
    bundle_path: &Path,
    image_root: &Path,
    label_root: &Path,
) -> Result<usize, LitterprepError> {
    let mut entries = collect_entries(image_root, &IMAGE_EXTENSIONS)?;
    entries.extend(collect_entries(label_root, &[LABEL_EXTENSION])?);
    entries.sort_by(|a, b| a.archive_path.cmp(&b.archive_path));

    let file = File::create(bundle_path).map_err(LitterprepError::Io)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    for entry in &entries {
        zip.start_file(&entry.archive_path, options)
            .map_err(|source| LitterprepError::BundleWrite {
                path: bundle_path.to_path_buf(),
                source,
            })?;
        let mut src = File::open(&entry.disk_path).map_err(LitterprepError::Io)?;
        io::copy(&mut src, &mut zip).map_err(LitterprepError::Io)?;
    }

    zip.finish().map_err(|source| LitterprepError::BundleWrite {
        path: bundle_path.to_path_buf(),
        source,
    })?;

    Ok(entries.len())
}

struct BundleEntry {
    disk_path: PathBuf,
    archive_path: String,
}

fn collect_entries(root: &Path, extensions: &[&str]) -> Result<Vec<BundleEntry>, LitterprepError> {
    let mut entries = Vec::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|source| LitterprepError::Traversal {
            path: root.to_path_buf(),
            message: source.to_string(),
        })?;

        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
            entries.push(BundleEntry {
                disk_path: entry.path().to_path_buf(),
                archive_path: rel.to_string_lossy().replace('\\', "/"),
            });
        }
    }

    Ok(entries)
}

fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    allowed
        .iter()
        .any(|allowed_ext| ext.eq_ignore_ascii_case(allowed_ext))
}
