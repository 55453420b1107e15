//! SSRF guard for schema URLs.
//!
//! Rules are independent and all must pass:
//! - scheme is `https`, or exactly `http` when HTTP is allowed
//! - `file`, `ftp`, `gopher`, `ldap`, `dict` and `data` are always denied
//! - localhost and loopback hosts are denied when `block_localhost` is set
//! - private, link-local and unique-local ranges are denied when
//!   `block_private_networks` is set
//! - with an allow-list, the host must equal or be a subdomain of an entry
//! - a path containing `..` is denied

use crate::config::SecurityConfig;
use crate::error::{SecurityViolation, ViolationKind};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use url::{Host, Url};

const DENIED_SCHEMES: &[&str] = &["file", "ftp", "gopher", "ldap", "dict", "data"];

const LOCALHOST_NAMES: &[&str] = &["localhost", "localhost.localdomain", "ip6-localhost"];

/// Resolve `url` against `base_url`, falling back to the raw string.
pub fn resolve_url(url: &str, base_url: Option<&str>) -> String {
    base_url
        .and_then(|base| Url::parse(base).ok())
        .and_then(|base| base.join(url).ok())
        .map(String::from)
        .unwrap_or_else(|| url.to_string())
}

/// Validate a schema URL against the SSRF policy.
///
/// # Returns
///
/// * `Ok(Url)` - The parsed URL, safe to fetch
/// * `Err(SecurityViolation)` - With kind [`ViolationKind::UrlRejected`]
pub fn validate_url(raw: &str, config: &SecurityConfig) -> Result<Url, SecurityViolation> {
    let reject = |message: String| {
        SecurityViolation::new(ViolationKind::UrlRejected, message).with_offending(raw)
    };

    let url = Url::parse(raw.trim()).map_err(|e| reject(format!("invalid URL: {}", e)))?;

    let scheme = url.scheme();
    if DENIED_SCHEMES.contains(&scheme) {
        return Err(reject(format!("scheme '{}' is not allowed", scheme)));
    }
    let scheme_allowed = scheme == "https" || (config.allow_http && scheme == "http");
    if !scheme_allowed {
        return Err(reject(if scheme == "http" {
            "plain HTTP is not allowed".to_string()
        } else {
            format!("scheme '{}' is not allowed", scheme)
        }));
    }

    if has_traversal(raw) {
        return Err(reject("path traversal ('..') is not allowed".to_string()));
    }

    let host = url
        .host()
        .ok_or_else(|| reject("URL has no host".to_string()))?;

    match host {
        Host::Domain(domain) => {
            let domain = domain.trim_end_matches('.').to_lowercase();
            if config.block_localhost && is_localhost_name(&domain) {
                return Err(reject(format!("localhost host '{}' is not allowed", domain)));
            }
            if let Some(allowlist) = config.normalized_allowlist() {
                if !allowlist.iter().any(|entry| host_matches(&domain, entry)) {
                    return Err(reject(format!(
                        "host '{}' is not in the domain allow-list",
                        domain
                    )));
                }
            }
        }
        Host::Ipv4(addr) => {
            check_ip(IpAddr::V4(addr), config).map_err(reject)?;
            check_ip_allowlist(&addr.to_string(), config).map_err(reject)?;
        }
        Host::Ipv6(addr) => {
            check_ip(IpAddr::V6(addr), config).map_err(reject)?;
            check_ip_allowlist(&addr.to_string(), config).map_err(reject)?;
        }
    }

    Ok(url)
}

fn has_traversal(raw: &str) -> bool {
    let lowered = raw.to_lowercase();
    // The parser normalizes dot segments away, so inspect the raw text.
    lowered.contains("..")
        || lowered.contains("%2e%2e")
        || lowered.contains(".%2e")
        || lowered.contains("%2e.")
}

fn is_localhost_name(domain: &str) -> bool {
    LOCALHOST_NAMES.contains(&domain) || domain.ends_with(".localhost")
}

fn host_matches(host: &str, entry: &str) -> bool {
    host == entry
        || host
            .strip_suffix(entry)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

fn check_ip_allowlist(host: &str, config: &SecurityConfig) -> Result<(), String> {
    match config.normalized_allowlist() {
        Some(allowlist) if !allowlist.iter().any(|entry| entry == host) => Err(format!(
            "host '{}' is not in the domain allow-list",
            host
        )),
        _ => Ok(()),
    }
}

fn check_ip(addr: IpAddr, config: &SecurityConfig) -> Result<(), String> {
    let addr = match addr {
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => IpAddr::V4(v4),
            None => IpAddr::V6(v6),
        },
        v4 => v4,
    };

    if config.block_localhost && is_loopback(&addr) {
        return Err(format!("loopback address '{}' is not allowed", addr));
    }
    if config.block_private_networks && is_private(&addr) {
        return Err(format!("private network address '{}' is not allowed", addr));
    }
    Ok(())
}

fn is_loopback(addr: &IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => v4.is_loopback() || v4.is_unspecified(),
        IpAddr::V6(v6) => v6.is_loopback() || v6.is_unspecified(),
    }
}

fn is_private(addr: &IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => is_private_v4(v4),
        IpAddr::V6(v6) => is_private_v6(v6),
    }
}

/// 10/8, 172.16/12, 192.168/16 and 169.254/16.
fn is_private_v4(addr: &Ipv4Addr) -> bool {
    addr.is_private() || addr.is_link_local()
}

/// fc00::/7 unique-local and fe80::/10 link-local.
fn is_private_v6(addr: &Ipv6Addr) -> bool {
    let first = addr.segments()[0];
    (first & 0xfe00) == 0xfc00 || (first & 0xffc0) == 0xfe80
}
