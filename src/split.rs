//! Train/val/test partitioning of an exported images+labels tree.
//!
//! The input is an annotation-tool export: batch folders holding image
//! files with a same-stem `.txt` label beside each. Pairs are shuffled
//! with a seeded RNG, partitioned by ratio, and copied into the
//! `images/<split>` + `labels/<split>` layout YOLO training expects,
//! with file names prefixed by their batch folder so flattening cannot
//! collide. A `data.yaml` is written last.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use walkdir::WalkDir;

use crate::bundle::IMAGE_EXTENSIONS;
use crate::classes::{read_class_names, CoarseClass};
use crate::error::LitterprepError;

const SPLIT_NAMES: [&str; 3] = ["train", "val", "test"];

/// Configuration for a split run.
#[derive(Clone, Debug)]
pub struct SplitOptions {
    /// Source tree containing image/label pairs (e.g. `obj_train_data`).
    pub source: PathBuf,
    /// Output root; recreated from scratch on every run.
    pub output: PathBuf,
    /// Fraction of pairs for training.
    pub train_ratio: f64,
    /// Fraction of pairs for validation; the remainder becomes test.
    pub val_ratio: f64,
    /// Shuffle seed, so splits are reproducible.
    pub seed: u64,
    /// Optional class-name list for `data.yaml`; defaults to the
    /// coarse litter taxonomy.
    pub names_file: Option<PathBuf>,
}

/// Counts from a completed split.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SplitReport {
    pub pairs_total: usize,
    pub train: usize,
    pub val: usize,
    pub test: usize,
}

impl fmt::Display for SplitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Split {} pair(s): {} train, {} val, {} test.",
            self.pairs_total, self.train, self.val, self.test
        )
    }
}

#[derive(Serialize)]
struct DataYaml {
    path: String,
    train: String,
    val: String,
    test: String,
    nc: usize,
    names: Vec<String>,
}

/// Runs the split.
pub fn run_split(opts: &SplitOptions) -> Result<SplitReport, LitterprepError> {
    validate_ratios(opts.train_ratio, opts.val_ratio)?;

    let mut pairs = collect_pairs(&opts.source)?;
    if pairs.is_empty() {
        return Err(LitterprepError::NoPairsFound {
            path: opts.source.clone(),
        });
    }

    // Start clean so stale files from a previous split cannot leak in.
    if opts.output.exists() {
        fs::remove_dir_all(&opts.output).map_err(LitterprepError::Io)?;
    }
    for split in SPLIT_NAMES {
        fs::create_dir_all(opts.output.join("images").join(split)).map_err(LitterprepError::Io)?;
        fs::create_dir_all(opts.output.join("labels").join(split)).map_err(LitterprepError::Io)?;
    }

    let mut rng = StdRng::seed_from_u64(opts.seed);
    pairs.shuffle(&mut rng);

    let total = pairs.len();
    let train_count = (total as f64 * opts.train_ratio) as usize;
    let val_count = (total as f64 * opts.val_ratio) as usize;

    let (train_pairs, rest) = pairs.split_at(train_count);
    let (val_pairs, test_pairs) = rest.split_at(val_count.min(rest.len()));

    copy_pairs(train_pairs, &opts.source, &opts.output, "train")?;
    copy_pairs(val_pairs, &opts.source, &opts.output, "val")?;
    copy_pairs(test_pairs, &opts.source, &opts.output, "test")?;

    write_data_yaml(opts)?;

    Ok(SplitReport {
        pairs_total: total,
        train: train_pairs.len(),
        val: val_pairs.len(),
        test: test_pairs.len(),
    })
}

fn validate_ratios(train: f64, val: f64) -> Result<(), LitterprepError> {
    if !(train > 0.0 && train <= 1.0) {
        return Err(LitterprepError::InvalidSplitRatios {
            message: format!("train ratio {train} must be in (0, 1]"),
        });
    }
    if !(0.0..=1.0).contains(&val) {
        return Err(LitterprepError::InvalidSplitRatios {
            message: format!("val ratio {val} must be in [0, 1]"),
        });
    }
    if train + val > 1.0 {
        return Err(LitterprepError::InvalidSplitRatios {
            message: format!("train + val = {} exceeds 1", train + val),
        });
    }
    Ok(())
}

/// An image file and its sibling label file.
#[derive(Clone, Debug)]
struct Pair {
    image: PathBuf,
    label: PathBuf,
}

fn collect_pairs(source: &Path) -> Result<Vec<Pair>, LitterprepError> {
    let mut pairs = Vec::new();

    for entry in WalkDir::new(source).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|source_err| LitterprepError::Traversal {
            path: source.to_path_buf(),
            message: source_err.to_string(),
        })?;

        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| IMAGE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
            .unwrap_or(false);
        if !is_image {
            continue;
        }

        // Unlabeled images are left out of the split entirely.
        let label = path.with_extension("txt");
        if label.is_file() {
            pairs.push(Pair {
                image: path.to_path_buf(),
                label,
            });
        }
    }

    Ok(pairs)
}

fn copy_pairs(
    pairs: &[Pair],
    source: &Path,
    output: &Path,
    split: &str,
) -> Result<(), LitterprepError> {
    for pair in pairs {
        let new_name = prefixed_name(&pair.image, source);
        let stem = Path::new(&new_name)
            .with_extension("txt")
            .to_string_lossy()
            .into_owned();

        fs::copy(
            &pair.image,
            output.join("images").join(split).join(&new_name),
        )
        .map_err(LitterprepError::Io)?;
        fs::copy(&pair.label, output.join("labels").join(split).join(stem))
            .map_err(LitterprepError::Io)?;
    }
    Ok(())
}

/// `batch_1/0001.jpg` becomes `batch_1_0001.jpg`; files directly under
/// the source root keep their own name.
fn prefixed_name(image: &Path, source: &Path) -> String {
    let file_name = image
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let batch = image
        .parent()
        .filter(|parent| *parent != source)
        .and_then(|parent| parent.file_name())
        .map(|n| n.to_string_lossy().into_owned());

    match batch {
        Some(batch) => format!("{batch}_{file_name}"),
        None => file_name,
    }
}

fn write_data_yaml(opts: &SplitOptions) -> Result<(), LitterprepError> {
    let names = match &opts.names_file {
        Some(path) => read_class_names(path)?,
        None => CoarseClass::ALL
            .iter()
            .map(|class| class.name().to_string())
            .collect(),
    };

    // Absolute dataset path so the training config works from any cwd.
    let abs_output = fs::canonicalize(&opts.output).map_err(LitterprepError::Io)?;

    let data = DataYaml {
        path: abs_output.to_string_lossy().into_owned(),
        train: "images/train".to_string(),
        val: "images/val".to_string(),
        test: "images/test".to_string(),
        nc: names.len(),
        names,
    };

    let yaml = serde_yaml::to_string(&data).map_err(|source| LitterprepError::DataYamlWrite {
        path: opts.output.join("data.yaml"),
        source,
    })?;
    fs::write(opts.output.join("data.yaml"), yaml).map_err(LitterprepError::Io)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_pair(root: &Path, rel_image: &str) {
        let image = root.join(rel_image);
        if let Some(parent) = image.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&image, b"img").expect("write image");
        fs::write(image.with_extension("txt"), b"0 0.5 0.5 0.1 0.1").expect("write label");
    }

    fn default_opts(temp: &Path) -> SplitOptions {
        SplitOptions {
            source: temp.join("export"),
            output: temp.join("processed"),
            train_ratio: 0.7,
            val_ratio: 0.2,
            seed: 42,
            names_file: None,
        }
    }

    fn split_listing(output: &Path, split: &str) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(output.join("images").join(split))
            .expect("read split dir")
            .map(|e| e.expect("dir entry").file_name().to_string_lossy().into())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn ratio_arithmetic_floors_train_and_val() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let opts = default_opts(temp.path());
        for i in 0..10 {
            write_pair(&opts.source, &format!("batch_1/{i:04}.jpg"));
        }

        let report = run_split(&opts).expect("split");
        assert_eq!(report.pairs_total, 10);
        assert_eq!(report.train, 7);
        assert_eq!(report.val, 2);
        assert_eq!(report.test, 1);
    }

    #[test]
    fn split_is_deterministic_under_a_fixed_seed() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let opts = default_opts(temp.path());
        for i in 0..8 {
            write_pair(&opts.source, &format!("batch_1/{i:04}.jpg"));
        }

        run_split(&opts).expect("first split");
        let first = split_listing(&opts.output, "train");

        run_split(&opts).expect("second split");
        let second = split_listing(&opts.output, "train");

        assert_eq!(first, second);
    }

    #[test]
    fn copies_are_batch_prefixed_with_matching_labels() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let mut opts = default_opts(temp.path());
        opts.train_ratio = 1.0;
        opts.val_ratio = 0.0;
        write_pair(&opts.source, "batch_1/0001.jpg");
        write_pair(&opts.source, "batch_2/0001.jpg");

        let report = run_split(&opts).expect("split");
        assert_eq!(report.train, 2);

        let images = split_listing(&opts.output, "train");
        assert_eq!(images, vec!["batch_1_0001.jpg", "batch_2_0001.jpg"]);
        assert!(opts
            .output
            .join("labels/train/batch_1_0001.txt")
            .is_file());
    }

    #[test]
    fn unlabeled_images_are_ignored() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let mut opts = default_opts(temp.path());
        opts.train_ratio = 1.0;
        opts.val_ratio = 0.0;
        write_pair(&opts.source, "batch_1/labeled.jpg");
        let orphan = opts.source.join("batch_1/orphan.jpg");
        fs::write(&orphan, b"img").expect("write orphan");

        let report = run_split(&opts).expect("split");
        assert_eq!(report.pairs_total, 1);
    }

    #[test]
    fn empty_source_is_fatal() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let opts = default_opts(temp.path());
        fs::create_dir_all(&opts.source).expect("create source");

        let err = run_split(&opts).unwrap_err();
        assert!(matches!(err, LitterprepError::NoPairsFound { .. }));
    }

    #[test]
    fn bad_ratios_are_rejected() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let mut opts = default_opts(temp.path());
        write_pair(&opts.source, "batch_1/0001.jpg");

        opts.train_ratio = 0.9;
        opts.val_ratio = 0.3;
        let err = run_split(&opts).unwrap_err();
        assert!(matches!(err, LitterprepError::InvalidSplitRatios { .. }));

        opts.train_ratio = 0.0;
        opts.val_ratio = 0.2;
        let err = run_split(&opts).unwrap_err();
        assert!(matches!(err, LitterprepError::InvalidSplitRatios { .. }));
    }

    #[test]
    fn data_yaml_defaults_to_the_coarse_taxonomy() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let opts = default_opts(temp.path());
        write_pair(&opts.source, "batch_1/0001.jpg");

        run_split(&opts).expect("split");

        let yaml = fs::read_to_string(opts.output.join("data.yaml")).expect("read data.yaml");
        assert!(yaml.contains("nc: 8"));
        assert!(yaml.contains("plastic"));
        assert!(yaml.contains("unlabeled_litter"));
        assert!(yaml.contains("train: images/train"));
    }

    #[test]
    fn data_yaml_uses_a_provided_names_file() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let mut opts = default_opts(temp.path());
        write_pair(&opts.source, "batch_1/0001.jpg");

        let names_path = temp.path().join("obj.names");
        fs::write(&names_path, "litter\nnot_litter\n").expect("write names");
        opts.names_file = Some(names_path);

        run_split(&opts).expect("split");

        let yaml = fs::read_to_string(opts.output.join("data.yaml")).expect("read data.yaml");
        assert!(yaml.contains("nc: 2"));
        assert!(yaml.contains("litter"));
    }

    #[test]
    fn rerun_replaces_previous_output() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let mut opts = default_opts(temp.path());
        opts.train_ratio = 1.0;
        opts.val_ratio = 0.0;
        write_pair(&opts.source, "batch_1/0001.jpg");

        run_split(&opts).expect("first split");
        let stale = opts.output.join("images/train/stale.jpg");
        fs::write(&stale, b"stale").expect("write stale file");

        run_split(&opts).expect("second split");
        assert!(!stale.exists());
    }
}
