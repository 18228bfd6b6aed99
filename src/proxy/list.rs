//! Proxy list file parsing

use crate::ConfigError;
use std::collections::HashSet;
use std::path::Path;

/// Parses a line-oriented proxy list
///
/// One proxy per line, either `host:port`, `user:pass@host:port` or a full
/// URL with a scheme. Blank lines and `#` comments are skipped, duplicates
/// keep their first position, and bare entries get an `http://` prefix.
pub fn parse_proxy_list(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut proxies = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let proxy = if line.contains("://") {
            line.to_string()
        } else {
            format!("http://{}", line)
        };

        if seen.insert(proxy.clone()) {
            proxies.push(proxy);
        }
    }

    proxies
}

/// Loads the proxy list from disk
///
/// An empty list is an error: no worker could ever make a request.
pub fn load_proxy_list(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::ProxyList(format!("Failed to read {}: {}", path.display(), e))
    })?;

    let proxies = parse_proxy_list(&content);
    if proxies.is_empty() {
        return Err(ConfigError::ProxyList(format!(
            "No proxies found in {}",
            path.display()
        )));
    }

    tracing::info!("Loaded {} proxies from {}", proxies.len(), path.display());
    Ok(proxies)
}
