//! Coarse litter classes and the category-name mapping.
//!
//! Source datasets carry dozens of fine-grained category names
//! ("Clear plastic bottle", "Corrugated carton", ...). Training uses a
//! coarse 8-class grouping. The mapping is a total function: an exact
//! name table is consulted first, then lower-cased substring heuristics
//! in a fixed priority order, and finally the trash catch-all. Every
//! name resolves to some class; mapping never fails.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::LitterprepError;

/// One of the coarse output classes, in label-index order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CoarseClass {
    Plastic,
    Cigarette,
    Metal,
    Carton,
    Paper,
    BioWaste,
    UnlabeledLitter,
    Trash,
}

impl CoarseClass {
    /// All classes in label-index order.
    pub const ALL: [CoarseClass; 8] = [
        CoarseClass::Plastic,
        CoarseClass::Cigarette,
        CoarseClass::Metal,
        CoarseClass::Carton,
        CoarseClass::Paper,
        CoarseClass::BioWaste,
        CoarseClass::UnlabeledLitter,
        CoarseClass::Trash,
    ];

    /// Zero-based label index written into YOLO label lines.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Display name used in class-name lists.
    pub fn name(self) -> &'static str {
        match self {
            CoarseClass::Plastic => "plastic",
            CoarseClass::Cigarette => "cigarette",
            CoarseClass::Metal => "metal",
            CoarseClass::Carton => "carton",
            CoarseClass::Paper => "paper",
            CoarseClass::BioWaste => "bio_waste",
            CoarseClass::UnlabeledLitter => "unlabeled_litter",
            CoarseClass::Trash => "trash",
        }
    }
}

/// Maps a source category name to its coarse class.
///
/// Total and deterministic. Exact table first, then substring
/// heuristics in priority order, then the catch-all. The heuristic
/// order matters: "Reusable carrier bag" resolves via the plastic
/// rule (first match), not the paper rule, even though both mention
/// "bag".
pub fn classify(name: &str) -> CoarseClass {
    if let Some(class) = exact_class(name) {
        return class;
    }
    heuristic_class(&name.to_lowercase())
}

/// Fixed name table for the reference litter taxonomy.
///
/// Each name appears exactly once. The upstream table listed a few
/// plastic names twice; caps/lids made of plastic are grouped under
/// Plastic here, while their metal counterparts stay under Metal.
fn exact_class(name: &str) -> Option<CoarseClass> {
    use CoarseClass::*;
    let class = match name {
        // plastic family
        "Other plastic bottle"
        | "Clear plastic bottle"
        | "Plastic bottle cap"
        | "Other plastic"
        | "Other plastic cup"
        | "Other plastic container"
        | "Plastic lid"
        | "Plastic glooves"
        | "Plastic utensils"
        | "Other plastic wrapper"
        | "Plastic film"
        | "Garbage bag"
        | "Single-use carrier bag"
        | "Polypropylene bag"
        | "Crisp packet"
        | "Disposable plastic cup"
        | "Foam cup"
        | "Disposable food container"
        | "Foam food container"
        | "Spread tub"
        | "Tupperware"
        | "Plastic straw" => Plastic,

        "Cigarette" => Cigarette,

        "Aluminium foil" | "Aluminium blister pack" | "Carded blister pack" | "Battery"
        | "Food Can" | "Drink can" | "Pop tab" | "Scrap metal" | "Metal bottle cap"
        | "Metal lid" => Metal,

        "Other carton" | "Drink carton" | "Corrugated carton" | "Meal carton" | "Pizza box"
        | "Egg carton" => Carton,

        "Magazine paper" | "Tissues" | "Wrapping paper" | "Normal paper" | "Paper bag"
        | "Plastified paper bag" | "Paper cup" | "Paper straw" | "Toilet tube" => Paper,

        "Food waste" => BioWaste,

        "Unlabeled litter" => UnlabeledLitter,

        "Broken glass" | "Glass bottle" | "Glass jar" | "Glass cup" | "Shoe"
        | "Squeezable tube" | "Styrofoam piece" | "Aerosol" => Trash,

        _ => return None,
    };
    Some(class)
}

/// Substring fallback for names outside the fixed table. Rules are
/// tested in order; the first match wins.
fn heuristic_class(lower: &str) -> CoarseClass {
    const METAL_KEYWORDS: [&str; 7] = [
        "aluminium",
        "aluminum",
        "metal",
        "can",
        "battery",
        "pop tab",
        "scrap",
    ];
    const PAPER_KEYWORDS: [&str; 5] = ["paper", "magazine", "tissue", "wrap", "straw"];

    if ["plastic", "bag", "film", "tupperware", "cup"]
        .iter()
        .any(|k| lower.contains(k))
    {
        CoarseClass::Plastic
    } else if lower.contains("cig") {
        CoarseClass::Cigarette
    } else if METAL_KEYWORDS.iter().any(|k| lower.contains(k)) {
        CoarseClass::Metal
    } else if ["carton", "pizza", "egg"].iter().any(|k| lower.contains(k)) {
        CoarseClass::Carton
    } else if PAPER_KEYWORDS.iter().any(|k| lower.contains(k)) {
        CoarseClass::Paper
    } else if lower.contains("food") || lower.contains("waste") {
        CoarseClass::BioWaste
    } else if lower.contains("unlabel") {
        CoarseClass::UnlabeledLitter
    } else {
        CoarseClass::Trash
    }
}

/// Writes the coarse class-name list, one name per line.
pub fn write_coarse_names(path: &Path) -> Result<(), LitterprepError> {
    let mut out = String::new();
    for class in CoarseClass::ALL {
        out.push_str(class.name());
        out.push('\n');
    }
    fs::write(path, out).map_err(LitterprepError::Io)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum YamlNames {
    Bare(Vec<String>),
    Keyed { names: Vec<String> },
}

/// Reads an ordered class-name list.
///
/// Accepts either a plain text file (one name per line, blanks
/// skipped) or a YAML file carrying a `names:` sequence (or a bare
/// sequence), so both `obj.names` and `data.yaml` style configs work.
pub fn read_class_names(path: &Path) -> Result<Vec<String>, LitterprepError> {
    let data = fs::read_to_string(path).map_err(LitterprepError::Io)?;

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
        .unwrap_or(false);

    let names = if is_yaml {
        let parsed: YamlNames =
            serde_yaml::from_str(&data).map_err(|source| LitterprepError::ClassNamesParse {
                path: path.to_path_buf(),
                source,
            })?;
        match parsed {
            YamlNames::Bare(names) | YamlNames::Keyed { names } => names,
        }
    } else {
        data.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    };

    if names.is_empty() {
        return Err(LitterprepError::ClassNamesInvalid {
            path: path.to_path_buf(),
            message: "no class names found".to_string(),
        });
    }

    Ok(names)
}
