//! Outbound URI checks
//!
//! Before the pipeline contacts a submitted URI it makes sure the target is not an
//! internal service: private and loopback addresses, internal hostnames, and
//! hostnames that resolve to such addresses are refused.

use std::net::{IpAddr, Ipv6Addr};
use tokio::net::lookup_host;

/// Check that `url` may be fetched by the service.
///
/// * `allow_private_ips` - skip the private-address checks (local development)
/// * `allowlist` - when set, the host must equal one of these domains or be a subdomain of one
pub async fn validate_outbound_uri(
    url: &str,
    allow_private_ips: bool,
    allowlist: Option<&[String]>,
) -> Result<(), String> {
    let parsed = reqwest::Url::parse(url).map_err(|e| format!("Invalid URL format: {}", e))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err("URL must use http or https".to_string());
    }

    let host = match parsed.host() {
        Some(url_host) => url_host.to_string(),
        None => return Err("URL must have a host".to_string()),
    };
    let host = host.trim_start_matches('[').trim_end_matches(']').to_lowercase();

    if let Some(allowed_domains) = allowlist {
        let is_allowed = allowed_domains.iter().any(|allowed| {
            let allowed = allowed.to_lowercase();
            host == allowed || host.ends_with(&format!(".{}", allowed))
        });

        if !is_allowed {
            return Err(format!("Host '{}' is not in the upload allowlist", host));
        }
    }

    if allow_private_ips {
        return Ok(());
    }

    if let Ok(ip) = host.parse::<IpAddr>() {
        if is_private_ip(&ip) {
            return Err("Private/internal IP addresses are not allowed".to_string());
        }
        return Ok(());
    }

    if host == "localhost"
        || host.ends_with(".localhost")
        || host.ends_with(".local")
        || host.ends_with(".internal")
        || host.ends_with(".corp")
    {
        return Err("Localhost and internal hostnames are not allowed".to_string());
    }

    // Resolve now so a hostname pointing at an internal address is caught too.
    let port = parsed.port_or_known_default().unwrap_or(80);
    match lookup_host((host.as_str(), port)).await {
        Ok(addrs) => {
            for addr in addrs {
                if is_private_ip(&addr.ip()) {
                    return Err(format!(
                        "Host resolves to private/internal IP address: {}",
                        addr.ip()
                    ));
                }
            }
        }
        Err(e) => {
            // The availability check reports unreachable hosts.
            tracing::warn!(host = %host, error = %e, "Failed to resolve host for outbound URI check");
        }
    }

    Ok(())
}

/// True for loopback, private, link-local, multicast, and unspecified addresses.
pub fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            let octets = ipv4.octets();
            octets[0] == 10
                || (octets[0] == 172 && (16..=31).contains(&octets[1]))
                || (octets[0] == 192 && octets[1] == 168)
                || octets[0] == 127
                || (octets[0] == 169 && octets[1] == 254)
                || (224..=239).contains(&octets[0])
                || octets[0] == 0
        }
        IpAddr::V6(ipv6) => {
            if let Some(mapped) = ipv6.to_ipv4_mapped() {
                return is_private_ip(&IpAddr::V4(mapped));
            }
            ipv6.is_loopback()
                || ipv6.is_unspecified()
                || ipv6.is_multicast()
                || is_ipv6_link_local(ipv6)
                || is_ipv6_unique_local(ipv6)
        }
    }
}

// fe80::/10
fn is_ipv6_link_local(ip: &Ipv6Addr) -> bool {
    ip.segments()[0] & 0xffc0 == 0xfe80
}

// fc00::/7
fn is_ipv6_unique_local(ip: &Ipv6Addr) -> bool {
    ip.segments()[0] & 0xfe00 == 0xfc00
}
