//! 短码生成
//!
//! 对「目标 URL + 粗粒度时间分量 + 尝试序号」做 SHA-256，取 base64
//! 编码中的字母数字字符截前 8 位。时间分量（unix 分钟）避免同一 URL
//! 短时间内重复输入产生退化碰撞；尝试序号供碰撞重试时扰动输入。
//!
//! 这只是尽力而为的唯一性，不是保证：调用方必须在落库前按短码查重，
//! 碰撞时换 attempt 重新生成。碰撞永远不会覆盖已有行（插入而非 upsert）。

use base64::{Engine as _, engine::general_purpose::STANDARD};
use sha2::{Digest, Sha256};

pub const CODE_LENGTH: usize = 8;

pub fn generate_code(long_url: &str, attempt: u32) -> String {
    let minutes = chrono::Utc::now().timestamp() / 60;
    derive_code(long_url, minutes, attempt)
}

fn derive_code(long_url: &str, time_component: i64, attempt: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(long_url.as_bytes());
    hasher.update(time_component.to_le_bytes());
    hasher.update(attempt.to_le_bytes());
    let digest = hasher.finalize();

    // SHA-256 的 base64 共 43 个有效字符，字母数字不足 8 个的概率
    // 可以忽略，但仍以 '0' 兜底保证定长
    STANDARD
        .encode(digest)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .chain(std::iter::repeat('0'))
        .take(CODE_LENGTH)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_length_and_alphabet() {
        let code = generate_code("https://example.com/some/long/path", 0);
        assert_eq!(code.len(), CODE_LENGTH);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_deterministic_for_fixed_inputs() {
        let a = derive_code("https://example.com", 12345, 0);
        let b = derive_code("https://example.com", 12345, 0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_attempt_perturbs_output() {
        let a = derive_code("https://example.com", 12345, 0);
        let b = derive_code("https://example.com", 12345, 1);
        assert_ne!(a, b);
    }

    #[test]
    fn test_different_urls_differ() {
        let a = derive_code("https://example.com/a", 12345, 0);
        let b = derive_code("https://example.com/b", 12345, 0);
        assert_ne!(a, b);
    }
}
