//! Conversion report types for the COCO-to-YOLO pipeline.
//!
//! Every annotation either produces a label line or is skipped for a
//! tagged reason. The report aggregates those outcomes so a run ends
//! with an exact accounting instead of silently swallowed records.

use serde::Serialize;
use std::fmt;

/// Why a single annotation was dropped instead of converted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The annotation references an image id absent from the document.
    UnknownImage,
    /// The bbox field is missing or not coercible to `[x, y, w, h]`.
    InvalidBBox,
    /// Image dimensions were absent from the document and the file on
    /// disk could not be probed.
    UnresolvedDimensions,
}

impl SkipReason {
    fn describe(self) -> &'static str {
        match self {
            SkipReason::UnknownImage => "unknown image id",
            SkipReason::InvalidBBox => "missing or malformed bbox",
            SkipReason::UnresolvedDimensions => "unresolvable image dimensions",
        }
    }
}

/// Outcome of converting one annotation record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RecordOutcome {
    Converted,
    Skipped(SkipReason),
}

/// Summary of a whole conversion run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ConvertReport {
    /// Images listed in the document.
    pub images_total: usize,
    /// Images that received at least one label line.
    pub images_labeled: usize,
    /// Label lines written across all label files.
    pub lines_written: usize,
    /// Annotations skipped because of an unknown image id.
    pub skipped_unknown_image: usize,
    /// Annotations skipped because of a missing/malformed bbox.
    pub skipped_invalid_bbox: usize,
    /// Annotations skipped because dimensions never resolved.
    pub skipped_unresolved_dimensions: usize,
}

impl ConvertReport {
    /// Record the outcome of one annotation.
    pub fn record(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Converted => self.lines_written += 1,
            RecordOutcome::Skipped(reason) => match reason {
                SkipReason::UnknownImage => self.skipped_unknown_image += 1,
                SkipReason::InvalidBBox => self.skipped_invalid_bbox += 1,
                SkipReason::UnresolvedDimensions => self.skipped_unresolved_dimensions += 1,
            },
        }
    }

    /// Total annotations skipped, across all reasons.
    pub fn skipped_total(&self) -> usize {
        self.skipped_unknown_image + self.skipped_invalid_bbox + self.skipped_unresolved_dimensions
    }
}

impl fmt::Display for ConvertReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Prepared label lines for {} of {} image(s) ({} line(s) written).",
            self.images_labeled, self.images_total, self.lines_written
        )?;

        let skipped = self.skipped_total();
        if skipped > 0 {
            writeln!(f, "Skipped {} annotation(s):", skipped)?;
            let breakdown = [
                (SkipReason::UnknownImage, self.skipped_unknown_image),
                (SkipReason::InvalidBBox, self.skipped_invalid_bbox),
                (
                    SkipReason::UnresolvedDimensions,
                    self.skipped_unresolved_dimensions,
                ),
            ];
            for (reason, count) in breakdown {
                if count > 0 {
                    writeln!(f, "  - {}: {}", reason.describe(), count)?;
                }
            }
        }

        Ok(())
    }
}
