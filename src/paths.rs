//! Cross-platform normalization of annotation file paths.
//!
//! Litter datasets get annotated on whatever machine is handy, so the
//! `file_name` fields in an uploaded document may carry Windows
//! backslashes, `./` prefixes, drive letters (`C:/...`), or WSL mount
//! fragments (`mnt/c/...`). Normalization reduces all of these to a
//! forward-slash path relative to the image root.

/// Normalizes a recorded image path to a root-relative forward-slash path.
///
/// Prefix stripping runs to a fixed point, so the function is
/// idempotent: normalizing an already-normalized path returns it
/// unchanged.
pub fn normalize_rel_path(raw: &str) -> String {
    let mut s = raw.replace('\\', "/");

    loop {
        let before = s.clone();

        while let Some(rest) = s.strip_prefix("./") {
            s = rest.to_string();
        }

        // Strip a leading drive prefix like "C:/".
        let bytes = s.as_bytes();
        if bytes.len() > 2 && bytes[1] == b':' && bytes[2] == b'/' && bytes[0].is_ascii_alphabetic()
        {
            s = s[3..].trim_start_matches('/').to_string();
        }

        // Strip a leading WSL-style mount fragment: "mnt/<drive>/rest" -> "rest".
        if let Some(rest) = strip_mount_fragment(&s) {
            s = rest;
        }

        if s == before {
            return s;
        }
    }
}

fn strip_mount_fragment(s: &str) -> Option<String> {
    let parts: Vec<&str> = s.split('/').collect();
    if parts.len() > 2 && parts[0].eq_ignore_ascii_case("mnt") {
        Some(parts[2..].join("/"))
    } else {
        None
    }
}

/// The file's base name (final path segment).
pub fn base_name(rel: &str) -> &str {
    rel.rsplit('/').next().unwrap_or(rel)
}
