//! `value_parser` functions for arguments clap cannot check on its own.

use std::fs::File;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

/// Longest DNS name accepted for `--host`.
const MAX_HOSTNAME_LEN: usize = 253;

/// A port in 1..=65535.
pub fn validate_port(value: &str) -> Result<u16, String> {
    match value.parse::<u16>() {
        Ok(0) => Err("port 0 is not allowed; use 1-65535".to_string()),
        Ok(port) => Ok(port),
        Err(_) => Err(format!("'{}' is not a port number (1-65535)", value)),
    }
}

/// An existing, readable regular file.
pub fn validate_config_file_path(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if !path.is_file() {
        return Err(format!("configuration file '{}' does not exist or is not a file", value));
    }
    File::open(&path)
        .map(|_| path)
        .map_err(|e| format!("cannot read configuration file '{}': {}", value, e))
}

/// An IP address or a plausible host name, trimmed.
pub fn validate_host_address(value: &str) -> Result<String, String> {
    let host = value.trim();
    if host.is_empty() {
        return Err("host address cannot be empty".to_string());
    }
    if host.parse::<IpAddr>().is_ok() {
        return Ok(host.to_string());
    }
    if host.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(format!(
            "'{}' is not an IPv4 address like {}",
            value,
            Ipv4Addr::LOCALHOST
        ));
    }
    if host.len() > MAX_HOSTNAME_LEN {
        return Err(format!("host name longer than {} characters", MAX_HOSTNAME_LEN));
    }
    if let Some(bad) = host
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '.'))
    {
        return Err(format!("host name cannot contain '{}'", bad));
    }
    Ok(host.to_string())
}
