//! Media reference classification.
//!
//! Purely syntactic: nothing here touches the filesystem or the network.

use std::path::Path;

/// A media reference, as classified by [`is_local_path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaRef<'a> {
    LocalPath(&'a Path),
    RemoteUrl(&'a str),
}

impl<'a> MediaRef<'a> {
    #[must_use]
    pub fn classify(raw: &'a str) -> Self {
        if is_local_path(Some(raw)) {
            Self::LocalPath(Path::new(raw))
        } else {
            Self::RemoteUrl(raw)
        }
    }
}

/// Whether `value` looks like a local filesystem path rather than a URL.
///
/// Anything containing `:` that does not start with `http` counts as local,
/// so non-http schemes (`ftp://`, `s3://`) and strings like `foo:bar` are
/// classified local too.
#[must_use]
pub fn is_local_path(value: Option<&str>) -> bool {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return false;
    };

    value.starts_with('/')
        || value.starts_with("./")
        || value.starts_with("../")
        || has_drive_prefix(value)
        || (value.contains(':') && !value.starts_with("http"))
}

/// `C:\...`
fn has_drive_prefix(value: &str) -> bool {
    matches!(value.as_bytes(), [letter, b':', b'\\', ..] if letter.is_ascii_alphabetic())
}

/// Last path component of `raw`, or `raw` itself when it has none.
#[must_use]
pub fn file_name(raw: &str) -> &str {
    Path::new(raw)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(raw)
}
