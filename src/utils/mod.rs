pub mod constants;
pub mod string_utils;
pub mod url_utils;

pub use constants::*;
pub use url_utils::{dedup_key, is_valid_url, snapshot_dir_for_url, url_scheme, version_str_from_date};
pub use string_utils::{safe_truncate_chars, truncate_at_word};
