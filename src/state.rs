use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

/// Why an enclosure is not downloaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The existing file is at least as large as the declared length
    Complete { existing: u64, declared: u64 },
    /// The file exists but the feed's declared length is not a number
    UnverifiableLength { declared: String },
    /// The file exists but its size could not be read
    Unreadable { error: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Complete { .. } => write!(f, "already exists and appears to be intact"),
            SkipReason::UnverifiableLength { declared } => {
                write!(f, "already exists, declared length {declared:?} cannot be verified")
            }
            SkipReason::Unreadable { error } => write!(f, "already exists but is unreadable: {error}"),
        }
    }
}

/// What to do with the target file of an enclosure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// No file yet, download it
    Create,
    /// The file is smaller than declared, delete it and download again
    Replace { existing: u64, declared: u64 },
    /// Leave the file alone
    Skip(SkipReason),
}

/// Decide from the size of an existing file and the declared enclosure length
///
/// `existing_size` is `None` when there is no file. The length is only parsed
/// when a file exists; if it is not a base-10 integer the file is left alone,
/// since there is nothing to compare it against.
pub fn decide(existing_size: Option<u64>, declared_length: &str) -> Verdict {
    let Some(existing) = existing_size else {
        return Verdict::Create;
    };

    match declared_length.trim().parse::<u64>() {
        Ok(declared) if existing < declared => Verdict::Replace { existing, declared },
        Ok(declared) => Verdict::Skip(SkipReason::Complete { existing, declared }),
        Err(_) => Verdict::Skip(SkipReason::UnverifiableLength {
            declared: declared_length.to_string(),
        }),
    }
}

/// Judge the target path of an enclosure against its declared length
pub fn judge_target(path: &Path, declared_length: &str) -> Verdict {
    let verdict = match std::fs::metadata(path) {
        Ok(metadata) => decide(Some(metadata.len()), declared_length),
        Err(e) if e.kind() == ErrorKind::NotFound => decide(None, declared_length),
        Err(e) => Verdict::Skip(SkipReason::Unreadable {
            error: e.to_string(),
        }),
    };

    debug!(path = %path.display(), declared_length, ?verdict, "judged target");
    verdict
}
