mod download;
mod filename;
mod sanitize;

pub use download::{DownloadContext, download_enclosure};
pub use filename::{NamingContext, build_filename, padding_width, path_extension};
pub use sanitize::{SanitizeMode, sanitize_title};
