use std::net::{SocketAddr, ToSocketAddrs};
use std::num::ParseIntError;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, thiserror::Error)]
pub enum HostPortError {
    #[error("Invalid PORT '{value}': {source}")]
    InvalidPort { value: String, source: ParseIntError },
    #[error("HOST '{0}' doesn't resolve to a socket address")]
    UnresolvableHost(String),
}

/// Gets the host:port to listen on from the env vars HOST and PORT.
/// Unset or empty env vars fall back to `127.0.0.1:8000`.
pub fn get_api_base_url() -> Result<SocketAddr, HostPortError> {
    parse_host_port(std::env::var("HOST").ok(), std::env::var("PORT").ok())
}

/// Builds a socket address from optional host and port strings.
/// The host may be an IP literal or a name such as `localhost`.
pub fn parse_host_port(host: Option<String>, port: Option<String>) -> Result<SocketAddr, HostPortError> {
    let non_blank = |v: Option<String>| v.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let host = non_blank(host).unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = match non_blank(port) {
        Some(value) => value
            .parse::<u16>()
            .map_err(|source| HostPortError::InvalidPort { value, source })?,
        None => DEFAULT_PORT,
    };

    if let Ok(ip) = host.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, port));
    }
    let resolved = (host.as_str(), port).to_socket_addrs().ok().and_then(|mut addrs| addrs.next());
    resolved.ok_or(HostPortError::UnresolvableHost(host))
}
