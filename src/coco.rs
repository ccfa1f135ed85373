//! COCO-style annotation document reader.
//!
//! Only the detection-relevant parts of the document are modelled:
//! `images`, `annotations`, and `categories`. Width/height are optional
//! on image records because hand-uploaded documents frequently omit
//! them; the converter probes the file on disk in that case.
//!
//! Parsing is permissive about extras (segmentation, licenses, info
//! blocks are ignored). Boxes are kept as raw JSON at parse time and
//! coerced per annotation, so one malformed bbox never fails the whole
//! document.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use crate::error::LitterprepError;

/// A detection annotation document: images, annotations, categories.
#[derive(Debug, Deserialize)]
pub struct CocoDocument {
    #[serde(default)]
    pub images: Vec<CocoImage>,

    #[serde(default)]
    pub annotations: Vec<CocoAnnotation>,

    #[serde(default)]
    pub categories: Vec<CocoCategory>,
}

/// An image record. Dimensions may be absent.
#[derive(Debug, Deserialize)]
pub struct CocoImage {
    pub id: i64,
    pub file_name: String,

    #[serde(default)]
    pub width: Option<u32>,

    #[serde(default)]
    pub height: Option<u32>,
}

/// A category record. Read-only reference data.
#[derive(Debug, Deserialize)]
pub struct CocoCategory {
    pub id: i64,
    pub name: String,
}

/// An annotation record.
///
/// `bbox` is nominally `[x, y, width, height]` in absolute pixels with
/// top-left origin, but uploaded documents contain enough garbage that
/// it is kept as raw JSON here; the converter coerces it per record and
/// skips (rather than aborts) when a single box is malformed.
#[derive(Debug, Deserialize)]
pub struct CocoAnnotation {
    pub image_id: i64,

    #[serde(default)]
    pub category_id: Option<i64>,

    #[serde(default)]
    pub bbox: Option<serde_json::Value>,
}

impl CocoAnnotation {
    /// Coerces the raw bbox into `[x, y, w, h]`.
    ///
    /// Accepts an array of exactly four values, each either a number or
    /// a numeric string. Returns `None` for anything else; the caller
    /// records the skip.
    pub fn bbox_xywh(&self) -> Option<[f64; 4]> {
        let values = self.bbox.as_ref()?.as_array()?;
        if values.len() != 4 {
            return None;
        }

        let mut out = [0.0f64; 4];
        for (slot, value) in out.iter_mut().zip(values) {
            *slot = match value {
                serde_json::Value::Number(n) => n.as_f64()?,
                serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
                _ => return None,
            };
        }
        Some(out)
    }
}

/// Reads an annotation document from a COCO JSON file.
///
/// # Errors
/// `AnnotationsRead` if the file cannot be opened, `AnnotationsParse`
/// if it is not valid JSON of the expected shape. Both are fatal to a
/// conversion run and carry distinct exit codes.
pub fn read_coco_json(path: &Path) -> Result<CocoDocument, LitterprepError> {
    let file = File::open(path).map_err(|source| LitterprepError::AnnotationsRead {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| LitterprepError::AnnotationsParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads an annotation document from a JSON string.
///
/// Useful for testing without file I/O.
pub fn from_coco_str(json: &str) -> Result<CocoDocument, serde_json::Error> {
    serde_json::from_str(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "info": {"description": "litter upload"},
            "images": [
                {"id": 1, "file_name": "batch_1\\000001.jpg", "width": 640, "height": 480},
                {"id": 2, "file_name": "batch_2/000007.jpg"}
            ],
            "categories": [
                {"id": 5, "name": "Drink can", "supercategory": "metal"}
            ],
            "annotations": [
                {"id": 9, "image_id": 1, "category_id": 5, "bbox": [10.0, 20.0, 30.0, 40.0], "area": 1200.0, "iscrowd": 0},
                {"id": 10, "image_id": 2, "category_id": 5}
            ]
        }"#
    }

    #[test]
    fn parses_detection_fields_and_ignores_extras() {
        let doc = from_coco_str(sample_json()).expect("parse failed");

        assert_eq!(doc.images.len(), 2);
        assert_eq!(doc.categories.len(), 1);
        assert_eq!(doc.annotations.len(), 2);

        assert_eq!(doc.images[0].width, Some(640));
        assert_eq!(doc.images[1].width, None);
        assert_eq!(doc.images[1].height, None);

        assert_eq!(doc.categories[0].name, "Drink can");

        assert_eq!(
            doc.annotations[0].bbox_xywh(),
            Some([10.0, 20.0, 30.0, 40.0])
        );
        assert_eq!(doc.annotations[1].bbox_xywh(), None);
    }

    #[test]
    fn missing_collections_default_to_empty() {
        let doc = from_coco_str("{}").expect("parse failed");
        assert!(doc.images.is_empty());
        assert!(doc.annotations.is_empty());
        assert!(doc.categories.is_empty());
    }

    #[test]
    fn bbox_coercion_accepts_numeric_strings() {
        let doc = from_coco_str(
            r#"{"annotations": [{"image_id": 1, "bbox": ["10", 20, "30.5", 40]}]}"#,
        )
        .expect("parse failed");
        assert_eq!(
            doc.annotations[0].bbox_xywh(),
            Some([10.0, 20.0, 30.5, 40.0])
        );
    }

    #[test]
    fn malformed_bboxes_coerce_to_none() {
        let doc = from_coco_str(
            r#"{"annotations": [
                {"image_id": 1, "bbox": [1.0, 2.0]},
                {"image_id": 2, "bbox": "not a box"},
                {"image_id": 3, "bbox": [1, 2, 3, null]}
            ]}"#,
        )
        .expect("parse failed");
        for ann in &doc.annotations {
            assert_eq!(ann.bbox_xywh(), None);
        }
    }

    #[test]
    fn read_missing_file_is_annotations_read_error() {
        let err = read_coco_json(Path::new("does/not/exist.json")).unwrap_err();
        assert!(matches!(err, LitterprepError::AnnotationsRead { .. }));
        assert_eq!(err.exit_code(), 2);
    }
}
