use reqwest::Proxy;

use crate::error::DownloadError;

/// Proxy configuration types
#[derive(Debug, Clone, PartialEq, Eq, Copy, Default)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum ProxyType {
    /// HTTP proxy
    #[default]
    Http,
    /// HTTPS proxy
    Https,
    /// SOCKS5 proxy
    Socks5,
}

impl ProxyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProxyType::Http => "http",
            ProxyType::Https => "https",
            ProxyType::Socks5 => "socks5",
        }
    }
}

impl std::str::FromStr for ProxyType {
    type Err = DownloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(ProxyType::Http),
            "https" => Ok(ProxyType::Https),
            "socks5" => Ok(ProxyType::Socks5),
            other => Err(DownloadError::ProxyConfiguration {
                reason: format!("unknown proxy type `{other}`"),
            }),
        }
    }
}

/// Proxy configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Proxy server URL (e.g., "http://proxy.example.com:8080")
    pub url: String,
    /// Type of proxy (HTTP, HTTPS, SOCKS5)
    pub proxy_type: ProxyType,
}

/// Build a reqwest Proxy object from our proxy configuration
pub fn build_proxy_from_config(config: &ProxyConfig) -> Result<Proxy, DownloadError> {
    let proxy_url = &config.url;
    let invalid = |kind: &str, e: reqwest::Error| DownloadError::ProxyConfiguration {
        reason: format!("invalid {kind} proxy URL: {e}"),
    };

    match config.proxy_type {
        ProxyType::Http => Proxy::http(proxy_url).map_err(|e| invalid("HTTP", e)),
        ProxyType::Https => Proxy::https(proxy_url).map_err(|e| invalid("HTTPS", e)),
        ProxyType::Socks5 => {
            // Make sure URL starts with socks5:// or socks5h://
            let url = if proxy_url.starts_with("socks5://") || proxy_url.starts_with("socks5h://") {
                proxy_url.to_string()
            } else {
                format!("socks5://{proxy_url}")
            };

            Proxy::all(&url).map_err(|e| invalid("SOCKS5", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxy_type_round_trips_through_str() {
        for ty in [ProxyType::Http, ProxyType::Https, ProxyType::Socks5] {
            assert_eq!(ty.as_str().parse::<ProxyType>().unwrap(), ty);
        }
        assert!("ftp".parse::<ProxyType>().is_err());
    }

    #[test]
    fn builds_http_proxy() {
        let config = ProxyConfig {
            url: "http://127.0.0.1:3128".to_string(),
            proxy_type: ProxyType::Http,
        };
        assert!(build_proxy_from_config(&config).is_ok());
    }
}
