//! The annotation converter: COCO document in, YOLO label tree out.
//!
//! The pipeline is deliberately two-pass. Pass one resolves every
//! image record to a file that actually exists under the image root
//! (exact relative path first, then a base-name fallback at the root)
//! and aborts listing the missing files if any record cannot be
//! resolved. Pass two walks the annotations and writes label files.
//! A late-discovered missing image therefore never leaves a partially
//! written label tree behind.
//!
//! Per-annotation problems (unknown image id, malformed bbox,
//! undecodable image when dimensions must be probed) skip the single
//! record and are tallied in the [`ConvertReport`].

mod report;

pub use report::{ConvertReport, RecordOutcome, SkipReason};

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::bbox::{BBox, Pixel};
use crate::classes::classify;
use crate::coco::{read_coco_json, CocoDocument};
use crate::error::LitterprepError;
use crate::paths::{base_name, normalize_rel_path};

/// How many unresolved paths the missing-files diagnostic lists.
const MISSING_SAMPLE_LIMIT: usize = 20;

/// Explicit configuration for a conversion run. No process-wide state.
#[derive(Clone, Debug)]
pub struct ConvertOptions {
    /// The COCO annotation document.
    pub annotations: PathBuf,
    /// Root directory holding the actual image files.
    pub image_root: PathBuf,
    /// Root directory label files are written under, mirroring the
    /// image tree.
    pub label_root: PathBuf,
}

/// Runs the full conversion.
///
/// # Errors
/// Fatal per the abort taxonomy: unreadable/unparseable document,
/// empty image list, or any image unresolvable on disk. All of these
/// fire before the first label file is written.
pub fn run_convert(opts: &ConvertOptions) -> Result<ConvertReport, LitterprepError> {
    let doc = read_coco_json(&opts.annotations)?;

    if doc.images.is_empty() {
        return Err(LitterprepError::EmptyImageList {
            path: opts.annotations.clone(),
        });
    }

    let resolved = resolve_image_paths(&doc, &opts.image_root)?;
    let labels = build_label_lines(&doc, &resolved, &opts.image_root);

    for (rel, lines) in &labels.by_image {
        let out_path = opts.label_root.join(rel).with_extension("txt");
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(LitterprepError::Io)?;
        }
        // Existing label files are overwritten; the document is the
        // source of truth for this run.
        fs::write(&out_path, lines.join("\n")).map_err(LitterprepError::Io)?;
    }

    let mut report = labels.report;
    report.images_total = doc.images.len();
    report.images_labeled = labels.by_image.len();
    Ok(report)
}

/// Image records resolved to paths that exist under the root.
///
/// Values are the (possibly basename-rewritten) relative paths along
/// with dimensions taken from the document when present.
struct ResolvedImages {
    rel_by_id: BTreeMap<i64, String>,
    dims_by_id: BTreeMap<i64, (u32, u32)>,
}

fn resolve_image_paths(
    doc: &CocoDocument,
    image_root: &Path,
) -> Result<ResolvedImages, LitterprepError> {
    let mut rel_by_id = BTreeMap::new();
    let mut dims_by_id = BTreeMap::new();
    let mut missing = Vec::new();

    for image in &doc.images {
        let rel = normalize_rel_path(&image.file_name);

        let rel = if image_root.join(&rel).is_file() {
            rel
        } else {
            // Base-name fallback: flat exports lose batch folders.
            let base = base_name(&rel).to_string();
            if image_root.join(&base).is_file() {
                base
            } else {
                missing.push(image_root.join(&rel).display().to_string());
                continue;
            }
        };

        // Only trust document dimensions when both are present and
        // positive; anything else gets probed from disk on demand.
        if let (Some(w), Some(h)) = (image.width, image.height) {
            if w > 0 && h > 0 {
                dims_by_id.insert(image.id, (w, h));
            }
        }

        rel_by_id.insert(image.id, rel);
    }

    if !missing.is_empty() {
        let count = missing.len();
        missing.truncate(MISSING_SAMPLE_LIMIT);
        return Err(LitterprepError::MissingImages {
            count,
            sample: missing,
        });
    }

    Ok(ResolvedImages {
        rel_by_id,
        dims_by_id,
    })
}

struct LabelLines {
    /// Relative image path -> label lines, in annotation encounter order.
    by_image: BTreeMap<String, Vec<String>>,
    report: ConvertReport,
}

fn build_label_lines(
    doc: &CocoDocument,
    resolved: &ResolvedImages,
    image_root: &Path,
) -> LabelLines {
    let name_by_category: BTreeMap<i64, &str> = doc
        .categories
        .iter()
        .map(|c| (c.id, c.name.as_str()))
        .collect();

    let mut dims_cache = resolved.dims_by_id.clone();
    let mut by_image: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut report = ConvertReport::default();

    for ann in &doc.annotations {
        let outcome = convert_one(
            ann,
            resolved,
            &name_by_category,
            image_root,
            &mut dims_cache,
            &mut by_image,
        );
        report.record(outcome);
    }

    LabelLines { by_image, report }
}

fn convert_one(
    ann: &crate::coco::CocoAnnotation,
    resolved: &ResolvedImages,
    name_by_category: &BTreeMap<i64, &str>,
    image_root: &Path,
    dims_cache: &mut BTreeMap<i64, (u32, u32)>,
    by_image: &mut BTreeMap<String, Vec<String>>,
) -> RecordOutcome {
    let Some(rel) = resolved.rel_by_id.get(&ann.image_id) else {
        return RecordOutcome::Skipped(SkipReason::UnknownImage);
    };

    let Some([x, y, w, h]) = ann.bbox_xywh() else {
        return RecordOutcome::Skipped(SkipReason::InvalidBBox);
    };

    // Numeric strings in the document can smuggle in NaN/inf.
    let bbox: BBox<Pixel> = BBox::from_xywh(x, y, w, h);
    if !bbox.is_finite() {
        return RecordOutcome::Skipped(SkipReason::InvalidBBox);
    }

    // Resolve dimensions: document first, then a one-time disk probe
    // cached for later annotations on the same image. A failed probe is
    // not cached; each annotation retries independently.
    let (img_w, img_h) = match dims_cache.get(&ann.image_id) {
        Some(&dims) => dims,
        None => match probe_dimensions(&image_root.join(rel)) {
            Some(dims) => {
                dims_cache.insert(ann.image_id, dims);
                dims
            }
            None => return RecordOutcome::Skipped(SkipReason::UnresolvedDimensions),
        },
    };

    let class = classify(
        ann.category_id
            .and_then(|id| name_by_category.get(&id).copied())
            .unwrap_or(""),
    );

    let (cx, cy, nw, nh) = bbox
        .to_normalized(f64::from(img_w), f64::from(img_h))
        .to_cxcywh();

    // Out-of-range values pass through unclamped; `check` reports them.
    by_image.entry(rel.clone()).or_default().push(format!(
        "{} {:.6} {:.6} {:.6} {:.6}",
        class.index(),
        cx,
        cy,
        nw,
        nh
    ));

    RecordOutcome::Converted
}

pub(crate) fn probe_dimensions(path: &Path) -> Option<(u32, u32)> {
    let size = imagesize::size(path).ok()?;
    let width = u32::try_from(size.width).ok()?;
    let height = u32::try_from(size.height).ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    Some((width, height))
}
