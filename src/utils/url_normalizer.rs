//! URL 归一化与校验
//!
//! 归一化规则：trim → 无协议时补 https:// → 解析 → 主机名小写
//! （路径和查询串大小写保持原样）→ 去掉 fragment → 非根路径去掉
//! 单个尾部斜杠。纯函数且幂等：normalize(normalize(x)) == normalize(x)。

use url::Url;

use crate::errors::{Result, ShortifyError};

/// 危险协议列表，直接拒绝
const DANGEROUS_PROTOCOLS: &[&str] = &[
    "javascript:",
    "data:",
    "file:",
    "vbscript:",
    "about:",
    "blob:",
];

pub fn normalize_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(ShortifyError::validation("URL cannot be empty"));
    }

    let lower = trimmed.to_lowercase();
    for proto in DANGEROUS_PROTOCOLS {
        if lower.starts_with(proto) {
            return Err(ShortifyError::validation(format!(
                "URL protocol not allowed: {}",
                proto
            )));
        }
    }

    let candidate: std::borrow::Cow<'_, str> =
        if lower.starts_with("http://") || lower.starts_with("https://") {
            std::borrow::Cow::Borrowed(trimmed)
        } else {
            std::borrow::Cow::Owned(format!("https://{}", trimmed))
        };

    // url crate 解析时会将主机名转为小写，路径与查询串不动
    let mut url = Url::parse(&candidate)
        .map_err(|e| ShortifyError::validation(format!("Invalid URL format: {}", e)))?;

    if !url.has_host() {
        return Err(ShortifyError::validation("URL must have a host"));
    }

    url.set_fragment(None);

    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let stripped = path[..path.len() - 1].to_string();
        url.set_path(&stripped);
    }

    Ok(url.to_string())
}

/// 自定义别名格式：字母数字、短横线、下划线，3–50 字符
pub fn is_valid_alias(alias: &str) -> bool {
    (3..=50).contains(&alias.len())
        && alias
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// 重定向路由的短码守卫，非法短码直接 404，不触发缓存与数据库
pub fn is_valid_short_code(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= 64
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_added_when_missing() {
        assert_eq!(
            normalize_url("example.com").unwrap(),
            normalize_url("https://example.com").unwrap()
        );
    }

    #[test]
    fn test_hostname_lowercased_path_case_kept() {
        assert_eq!(
            normalize_url("https://EXAMPLE.com/Path/").unwrap(),
            "https://example.com/Path"
        );
    }

    #[test]
    fn test_trailing_slash_stripped_on_non_root_path() {
        assert_eq!(
            normalize_url("https://example.com/path/").unwrap(),
            "https://example.com/path"
        );
    }

    #[test]
    fn test_fragment_stripped() {
        let normalized = normalize_url("https://x.com/a#frag").unwrap();
        assert!(!normalized.contains('#'));
        assert_eq!(normalized, "https://x.com/a");
    }

    #[test]
    fn test_query_preserved() {
        assert_eq!(
            normalize_url("https://example.com/search?Q=Rust&x=1").unwrap(),
            "https://example.com/search?Q=Rust&x=1"
        );
    }

    #[test]
    fn test_idempotent() {
        let once = normalize_url(" Example.com/a/ ").unwrap();
        let twice = normalize_url(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_rejected() {
        assert!(normalize_url("").is_err());
        assert!(normalize_url("   ").is_err());
    }

    #[test]
    fn test_dangerous_protocols_rejected() {
        assert!(normalize_url("javascript:alert(1)").is_err());
        assert!(normalize_url("data:text/html,hi").is_err());
        assert!(normalize_url("file:///etc/passwd").is_err());
    }

    #[test]
    fn test_alias_validation() {
        assert!(is_valid_alias("promo"));
        assert!(is_valid_alias("my-link_01"));
        assert!(!is_valid_alias("ab"));
        assert!(!is_valid_alias("has space"));
        assert!(!is_valid_alias(&"x".repeat(51)));
    }

    #[test]
    fn test_short_code_guard() {
        assert!(is_valid_short_code("Abc123"));
        assert!(!is_valid_short_code(""));
        assert!(!is_valid_short_code("a/b"));
    }
}
