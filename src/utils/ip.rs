//! 客户端 IP 提取

use std::net::{IpAddr, SocketAddr};

use actix_web::HttpRequest;

/// 提取客户端 IP
///
/// 依赖 actix 的 ConnectionInfo（Forwarded / X-Forwarded-For / peer addr），
/// peer addr 可能带端口，剥掉。
pub fn extract_client_ip(req: &HttpRequest) -> Option<String> {
    let conn_info = req.connection_info();
    conn_info.realip_remote_addr().map(|addr| {
        if let Ok(socket_addr) = addr.parse::<SocketAddr>() {
            socket_addr.ip().to_string()
        } else {
            addr.to_string()
        }
    })
}

/// 检查 IP 是否为私有地址或 localhost（此类地址不做 GeoIP 查询）
pub fn is_private_or_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback(),
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || (v6.segments()[0] & 0xfe00) == 0xfc00 // fc00::/7 (ULA)
                || (v6.segments()[0] & 0xffc0) == 0xfe80 // fe80::/10 (link-local)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_ranges() {
        assert!(is_private_or_local(&"127.0.0.1".parse().unwrap()));
        assert!(is_private_or_local(&"192.168.1.10".parse().unwrap()));
        assert!(is_private_or_local(&"10.0.0.3".parse().unwrap()));
        assert!(is_private_or_local(&"::1".parse().unwrap()));
        assert!(is_private_or_local(&"fe80::1".parse().unwrap()));
        assert!(!is_private_or_local(&"8.8.8.8".parse().unwrap()));
    }
}
