use std::path::Path;

use crate::common::MAX_EXTENSION_LEN;

pub trait PathExt {
    fn ext_lower(&self) -> String;
}

impl PathExt for Path {
    fn ext_lower(&self) -> String {
        self.extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase())
            .unwrap_or_default()
    }
}

/// Lower-cased extension of a client supplied filename, if it is short and plain
/// enough to reuse on disk.
pub fn safe_extension(filename: &str) -> Option<String> {
    // Only the final component counts; clients may send paths.
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let ext = Path::new(base).ext_lower();
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_short_alphanumeric_extensions() {
        assert_eq!(safe_extension("Shop Photo.JPG").as_deref(), Some("jpg"));
        assert_eq!(safe_extension("scan.tar.gz").as_deref(), Some("gz"));
        assert_eq!(safe_extension(r"C:\Users\me\a.png").as_deref(), Some("png"));
    }

    #[test]
    fn drops_unusable_extensions() {
        assert_eq!(safe_extension("README"), None);
        assert_eq!(safe_extension("a.verylongext"), None);
        assert_eq!(safe_extension("a.p-g"), None);
        assert_eq!(safe_extension(".hidden"), None);
    }
}
