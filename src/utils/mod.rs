pub mod ip;
pub mod url_normalizer;

pub use url_normalizer::{is_valid_alias, is_valid_short_code, normalize_url};
