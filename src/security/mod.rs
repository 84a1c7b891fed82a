//! Request hardening: payload inspection, per-address request limits,
//! response security headers.

pub mod middleware;
pub mod rate_limit;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::LazyLock;

use rand::Rng;
use regex::RegexSet;

/// Largest JSON body accepted on API mutations.
pub const MAX_JSON_BYTES: usize = 10_000;

static SUSPICIOUS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?is)<script.*?>.*?</script>",
        r"(?i)javascript:",
        r"(?i)on\w+\s*=",
        r"(?i)union\s+select",
        r"(?i)drop\s+table",
        r"\.\./\.\.",
    ])
    .expect("valid payload patterns")
});

/// Random token of `bytes` bytes, hex encoded.
pub fn generate_secure_token(bytes: usize) -> String {
    let mut rng = rand::rng();
    let buf: Vec<u8> = (0..bytes).map(|_| rng.random()).collect();
    hex::encode(buf)
}

/// Reject oversized bodies and ones carrying script, SQL-injection or
/// path-traversal markers.
pub fn is_safe_payload(body: &[u8]) -> bool {
    if body.len() > MAX_JSON_BYTES {
        return false;
    }
    let text = String::from_utf8_lossy(body);
    !SUSPICIOUS.is_match(&text)
}

/// Address string used to key per-client limits.
pub fn client_address(peer: Option<SocketAddr>) -> String {
    peer.map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
        .to_string()
}
