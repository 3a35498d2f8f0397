//! 共享测试工具和辅助函数

#![allow(dead_code)]

use serde_json::{Value, json};
use wiremock::MockServer;

use domain_provisioner_provider::{CloudflareProvider, SendgridProvider};

/// 跳过测试的宏（当环境变量缺失时）
#[macro_export]
macro_rules! skip_if_no_credentials {
    ($($var:expr),+) => {
        $(
            if std::env::var($var).is_err() {
                eprintln!("跳过测试: 缺少环境变量 {}", $var);
                return;
            }
        )+
    };
}

/// 断言 `Result` 为 `Ok`，并解包返回内部值（失败则直接让测试失败）。
#[macro_export]
macro_rules! require_ok {
    ($expr:expr $(,)?) => {{
        let res = $expr;
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
        let Ok(val) = res else {
            return;
        };
        val
    }};
    ($expr:expr, $($msg:tt)+) => {{
        let res = $expr;
        assert!(
            res.is_ok(),
            "{}: {res:?}",
            format_args!($($msg)+)
        );
        let Ok(val) = res else {
            return;
        };
        val
    }};
}

/// 断言 `Option` 为 `Some`，并解包返回内部值
#[macro_export]
macro_rules! require_some {
    ($expr:expr, $($msg:tt)+) => {{
        let opt = $expr;
        assert!(opt.is_some(), "{}", format_args!($($msg)+));
        let Some(val) = opt else {
            return;
        };
        val
    }};
}

/// Cloudflare 成功响应信封
pub fn cf_ok(result: Value) -> Value {
    json!({ "success": true, "errors": [], "messages": [], "result": result })
}

/// Cloudflare 分页成功响应信封
pub fn cf_page(result: Value, page: u32, per_page: u32, total_count: u32) -> Value {
    json!({
        "success": true,
        "errors": [],
        "messages": [],
        "result": result,
        "result_info": { "page": page, "per_page": per_page, "total_count": total_count }
    })
}

/// Cloudflare 失败响应信封
pub fn cf_err(code: i64, message: &str) -> Value {
    json!({
        "success": false,
        "errors": [{ "code": code, "message": message }],
        "messages": [],
        "result": null
    })
}

pub fn cf_record(id: &str, name: &str, content: &str) -> Value {
    json!({
        "id": id,
        "type": "CNAME",
        "name": name,
        "content": content,
        "proxied": true,
        "ttl": 1,
        "modified_on": "2024-05-01T12:00:00Z"
    })
}

/// 指向 mock server 的 Cloudflare 客户端（token 认证）
pub fn cloudflare_on(server: &MockServer) -> CloudflareProvider {
    CloudflareProvider::with_api_token("test-token".to_string())
        .expect("http client")
        .with_base_url(&server.uri())
}

/// 指向 mock server 的 SendGrid 客户端
pub fn sendgrid_on(server: &MockServer) -> SendgridProvider {
    SendgridProvider::new("SG.test".to_string())
        .expect("http client")
        .with_base_url(&server.uri())
}

/// SendGrid 域名认证响应
pub fn sg_domain(id: u64, domain: &str, valid: bool) -> Value {
    json!({
        "id": id,
        "user_id": 7,
        "subdomain": "em123",
        "domain": domain,
        "username": "gerald",
        "default": true,
        "automatic_security": true,
        "valid": valid,
        "dns": {
            "mail_cname": {
                "valid": valid,
                "type": "cname",
                "host": format!("em123.{domain}"),
                "data": "u7.wl.sendgrid.net"
            },
            "dkim1": {
                "valid": valid,
                "type": "cname",
                "host": format!("s1._domainkey.{domain}"),
                "data": "s1.domainkey.u7.wl.sendgrid.net"
            },
            "dkim2": {
                "valid": valid,
                "type": "cname",
                "host": format!("s2._domainkey.{domain}"),
                "data": "s2.domainkey.u7.wl.sendgrid.net"
            }
        }
    })
}
