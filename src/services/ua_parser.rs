//! User-Agent 启发式分类
//!
//! 有序子串规则，最具体的线索先判：Chromium 系浏览器的 UA 都带
//! "chrome"，所以 "edg" / "opr" 必须先于 "chrome"；"safari" 必须
//! 后于 "chrome"；iOS 的 UA 带 "like mac os x"，所以 iOS 线索先于
//! macOS；Android 的 UA 带 "linux"，所以 android 先于 linux。
//! 这是启发式规则表，不是精确解析。

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Desktop,
    Mobile,
    Tablet,
    Unknown,
}

impl DeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Desktop => "desktop",
            DeviceClass::Mobile => "mobile",
            DeviceClass::Tablet => "tablet",
            DeviceClass::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UaInfo {
    pub device: DeviceClass,
    pub browser: &'static str,
    pub os: &'static str,
}

pub fn parse_user_agent(user_agent: &str) -> UaInfo {
    let ua = user_agent.to_lowercase();

    if ua.is_empty() {
        return UaInfo {
            device: DeviceClass::Unknown,
            browser: "unknown",
            os: "unknown",
        };
    }

    // 平板线索后判，iPad 的 UA 同时带 "mobile"
    let device = if ua.contains("ipad") || ua.contains("tablet") {
        DeviceClass::Tablet
    } else if ua.contains("mobile") || ua.contains("iphone") || ua.contains("android") {
        DeviceClass::Mobile
    } else {
        DeviceClass::Desktop
    };

    let browser = if ua.contains("edg") {
        "Edge"
    } else if ua.contains("opr") || ua.contains("opera") {
        "Opera"
    } else if ua.contains("firefox") {
        "Firefox"
    } else if ua.contains("chrome") {
        "Chrome"
    } else if ua.contains("safari") {
        "Safari"
    } else {
        "unknown"
    };

    let os = if ua.contains("android") {
        "Android"
    } else if ua.contains("iphone") || ua.contains("ipad") || ua.contains("ios") {
        "iOS"
    } else if ua.contains("windows") {
        "Windows"
    } else if ua.contains("mac os") {
        "macOS"
    } else if ua.contains("linux") {
        "Linux"
    } else {
        "unknown"
    };

    UaInfo {
        device,
        browser,
        os,
    }
}

/// QR 扫码来源的启发式判定
///
/// UA 明确自报扫码器，或「无 Referer 且 UA 不属于三大桌面浏览器」
/// （相机应用通常不带 Referer 且 UA 泛化）。已知存在误报与漏报。
pub fn is_probable_qr_scan(user_agent: &str, referrer: Option<&str>) -> bool {
    let ua = user_agent.to_lowercase();

    if ua.contains("qrcode") || ua.contains("qr-code") || ua.contains("scanner") {
        return true;
    }

    let has_referrer = referrer.is_some_and(|r| !r.is_empty());
    if has_referrer {
        return false;
    }

    let major_browser =
        ua.contains("chrome") || ua.contains("firefox") || ua.contains("safari");
    !major_browser
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_WIN: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const EDGE_WIN: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
    const FIREFOX_LINUX: &str =
        "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";
    const CHROME_ANDROID: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";
    const SAFARI_IPAD: &str = "Mozilla/5.0 (iPad; CPU OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";

    #[test]
    fn test_edge_not_misclassified_as_chrome() {
        assert_eq!(parse_user_agent(EDGE_WIN).browser, "Edge");
    }

    #[test]
    fn test_chrome_on_windows() {
        let info = parse_user_agent(CHROME_WIN);
        assert_eq!(info.browser, "Chrome");
        assert_eq!(info.os, "Windows");
        assert_eq!(info.device, DeviceClass::Desktop);
    }

    #[test]
    fn test_iphone_is_mobile_ios_safari() {
        let info = parse_user_agent(SAFARI_IPHONE);
        assert_eq!(info.device, DeviceClass::Mobile);
        assert_eq!(info.os, "iOS");
        assert_eq!(info.browser, "Safari");
    }

    #[test]
    fn test_ipad_is_tablet() {
        assert_eq!(parse_user_agent(SAFARI_IPAD).device, DeviceClass::Tablet);
    }

    #[test]
    fn test_android_chrome_is_mobile_android() {
        let info = parse_user_agent(CHROME_ANDROID);
        assert_eq!(info.device, DeviceClass::Mobile);
        assert_eq!(info.os, "Android");
        assert_eq!(info.browser, "Chrome");
    }

    #[test]
    fn test_firefox_linux() {
        let info = parse_user_agent(FIREFOX_LINUX);
        assert_eq!(info.browser, "Firefox");
        assert_eq!(info.os, "Linux");
    }

    #[test]
    fn test_empty_ua_unknown() {
        let info = parse_user_agent("");
        assert_eq!(info.device, DeviceClass::Unknown);
        assert_eq!(info.browser, "unknown");
    }

    #[test]
    fn test_qr_explicit_scanner() {
        assert!(is_probable_qr_scan("SomeApp QRCode/1.0", Some("https://a.com")));
    }

    #[test]
    fn test_qr_no_referrer_generic_ua() {
        assert!(is_probable_qr_scan("Dalvik/2.1.0 (Linux; U; Android 14)", None));
    }

    #[test]
    fn test_qr_not_flagged_for_browser_with_referrer() {
        assert!(!is_probable_qr_scan(CHROME_WIN, Some("https://example.com")));
    }

    #[test]
    fn test_qr_not_flagged_for_browser_without_referrer() {
        assert!(!is_probable_qr_scan(CHROME_WIN, None));
    }
}
