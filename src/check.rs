//! Label spot-checking for a split dataset.
//!
//! Samples a handful of images from `images/<split>`, probes each
//! image's dimensions, parses the sibling label file, and reports
//! anything off: an undecodable image, a missing label file, an
//! unparseable line, a class index outside the `data.yaml` names list,
//! or normalized coordinates outside [0,1]. Nothing is rendered; this
//! is the textual counterpart of eyeballing boxes drawn on the image.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

use crate::classes::read_class_names;
use crate::convert::probe_dimensions;
use crate::error::LitterprepError;

/// Configuration for a check run.
#[derive(Clone, Debug)]
pub struct CheckOptions {
    /// Dataset root produced by the split step (holds `data.yaml`,
    /// `images/`, `labels/`).
    pub dataset: PathBuf,
    /// Which split to sample from.
    pub split: String,
    /// How many images to sample.
    pub samples: usize,
    /// Sampling seed.
    pub seed: u64,
}

/// One problem discovered while checking.
#[derive(Clone, Debug, Serialize)]
pub struct CheckFinding {
    pub image: String,
    pub message: String,
}

/// One sampled image: its probed dimensions and label line count.
#[derive(Clone, Debug, Serialize)]
pub struct CheckedImage {
    pub image: String,
    /// `None` when the file could not be decoded.
    pub dimensions: Option<(u32, u32)>,
    pub lines: usize,
}

/// Outcome of a check run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct CheckReport {
    pub images_checked: usize,
    pub lines_checked: usize,
    pub checked: Vec<CheckedImage>,
    pub findings: Vec<CheckFinding>,
}

impl CheckReport {
    fn add(&mut self, image: &str, message: impl Into<String>) {
        self.findings.push(CheckFinding {
            image: image.to_string(),
            message: message.into(),
        });
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Checked {} image(s), {} label line(s).",
            self.images_checked, self.lines_checked
        )?;
        for img in &self.checked {
            match img.dimensions {
                Some((w, h)) => writeln!(f, "  {} ({}x{}): {} line(s)", img.image, w, h, img.lines)?,
                None => writeln!(f, "  {} (undecodable): {} line(s)", img.image, img.lines)?,
            }
        }
        if self.findings.is_empty() {
            writeln!(f, "No findings.")?;
        } else {
            writeln!(f, "Findings ({}):", self.findings.len())?;
            for finding in &self.findings {
                writeln!(f, "  - {}: {}", finding.image, finding.message)?;
            }
        }
        Ok(())
    }
}

/// Runs the check.
pub fn run_check(opts: &CheckOptions) -> Result<CheckReport, LitterprepError> {
    let names = read_class_names(&opts.dataset.join("data.yaml"))?;

    let images_dir = opts.dataset.join("images").join(&opts.split);
    let labels_dir = opts.dataset.join("labels").join(&opts.split);

    let mut image_names: Vec<String> = fs::read_dir(&images_dir)
        .map_err(LitterprepError::Io)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    image_names.sort();

    let mut rng = StdRng::seed_from_u64(opts.seed);
    image_names.shuffle(&mut rng);
    image_names.truncate(opts.samples);

    let mut report = CheckReport::default();

    for image_name in &image_names {
        report.images_checked += 1;

        let dimensions = probe_dimensions(&images_dir.join(image_name));
        if dimensions.is_none() {
            report.add(image_name, "image file could not be decoded");
        }

        let label_path = labels_dir.join(Path::new(image_name).with_extension("txt"));
        let content = match fs::read_to_string(&label_path) {
            Ok(content) => content,
            Err(_) => {
                report.add(image_name, "label file is missing");
                report.checked.push(CheckedImage {
                    image: image_name.clone(),
                    dimensions,
                    lines: 0,
                });
                continue;
            }
        };

        let mut lines = 0;
        for (line_idx, line) in content.lines().enumerate() {
            let line_num = line_idx + 1;
            match parse_label_line(line) {
                Ok(None) => {}
                Ok(Some(row)) => {
                    report.lines_checked += 1;
                    lines += 1;
                    if row.class_id >= names.len() {
                        report.add(
                            image_name,
                            format!(
                                "line {}: class {} out of range for {} class(es)",
                                line_num,
                                row.class_id,
                                names.len()
                            ),
                        );
                    }
                    for (field, value) in
                        [("cx", row.cx), ("cy", row.cy), ("w", row.w), ("h", row.h)]
                    {
                        if !(0.0..=1.0).contains(&value) {
                            report.add(
                                image_name,
                                format!("line {}: {} = {} outside [0, 1]", line_num, field, value),
                            );
                        }
                    }
                }
                Err(message) => {
                    report.add(image_name, format!("line {}: {}", line_num, message));
                }
            }
        }

        report.checked.push(CheckedImage {
            image: image_name.clone(),
            dimensions,
            lines,
        });
    }

    Ok(report)
}

struct LabelRow {
    class_id: usize,
    cx: f64,
    cy: f64,
    w: f64,
    h: f64,
}

/// Parses one YOLO label line. Empty lines yield `Ok(None)`.
fn parse_label_line(line: &str) -> Result<Option<LabelRow>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    // Take at most 6 tokens so a pathological line cannot allocate unbounded memory.
    let tokens: Vec<&str> = trimmed.split_whitespace().take(6).collect();
    if tokens.len() != 5 {
        return Err(format!("expected 5 tokens, found {}", tokens.len()));
    }

    let class_id = tokens[0]
        .parse::<usize>()
        .map_err(|_| format!("invalid class index '{}'", tokens[0]))?;

    let mut floats = [0.0f64; 4];
    for (slot, token) in floats.iter_mut().zip(&tokens[1..]) {
        *slot = token
            .parse::<f64>()
            .map_err(|_| format!("invalid coordinate '{token}'"))?;
    }

    Ok(Some(LabelRow {
        class_id,
        cx: floats[0],
        cy: floats[1],
        w: floats[2],
        h: floats[3],
    }))
}
