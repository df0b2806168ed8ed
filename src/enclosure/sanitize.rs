/// Replacement inserted for every character a strict filesystem rejects
const SEPARATOR: &str = " - ";

/// How titles are made safe for use as filenames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SanitizeMode {
    /// Replace characters that Windows filesystems reject
    Strict,
    /// Leave titles untouched
    #[default]
    Permissive,
}

impl SanitizeMode {
    /// The mode matching the platform this binary was built for
    pub fn for_host() -> Self {
        if cfg!(windows) {
            Self::Strict
        } else {
            Self::Permissive
        }
    }
}

/// Check if a character is rejected by strict filesystems
fn is_reserved_char(c: char) -> bool {
    matches!(c, '\\' | '/' | ':' | '*' | '<' | '>' | '|' | '"')
}

/// Make a title usable as a filename component
///
/// Only reserved characters are touched; there is no length limit and no
/// Unicode normalization.
pub fn sanitize_title(title: &str, mode: SanitizeMode) -> String {
    match mode {
        SanitizeMode::Permissive => title.to_string(),
        SanitizeMode::Strict => {
            let mut result = String::with_capacity(title.len());
            for c in title.chars() {
                if is_reserved_char(c) {
                    result.push_str(SEPARATOR);
                } else {
                    result.push(c);
                }
            }
            result
        }
    }
}
