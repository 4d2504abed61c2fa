use std::time::Duration;

pub const DEFAULT_BOUNDARY_SOURCE: &str = "data/districts.geojson";
pub const DEFAULT_BOUNDARY_REFRESH_SECS: u64 = 3600; // re-fetch hourly
pub const DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS: u64 = 3;
pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_STATIC_DIR: &str = "client/dist";

/// Where the boundary dataset comes from: an upstream URL or a local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundarySource {
    Url(String),
    File(String),
}

impl BoundarySource {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if raw.starts_with("http://") || raw.starts_with("https://") {
            Some(Self::Url(raw.to_owned()))
        } else {
            Some(Self::File(raw.to_owned()))
        }
    }
}

impl std::fmt::Display for BoundarySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::File(path) => f.write_str(path),
        }
    }
}

pub fn boundary_source() -> BoundarySource {
    std::env::var("BOUNDARY_SOURCE")
        .ok()
        .and_then(|value| BoundarySource::parse(&value))
        .unwrap_or_else(|| BoundarySource::File(DEFAULT_BOUNDARY_SOURCE.to_owned()))
}

pub fn boundary_refresh_interval() -> Duration {
    std::env::var("BOUNDARY_REFRESH_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_BOUNDARY_REFRESH_SECS))
}

pub fn upstream_http_timeout() -> Duration {
    std::env::var("UPSTREAM_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS))
}

pub fn upstream_connect_timeout() -> Duration {
    std::env::var("UPSTREAM_CONNECT_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS))
}

pub fn server_port() -> u16 {
    std::env::var("SERVER_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_SERVER_PORT)
}

pub fn static_dir() -> String {
    std::env::var("STATIC_DIR")
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_STATIC_DIR.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_source_defaults_to_bundled_file() {
        temp_env::with_var_unset("BOUNDARY_SOURCE", || {
            assert_eq!(
                boundary_source(),
                BoundarySource::File(DEFAULT_BOUNDARY_SOURCE.to_owned())
            );
        });
    }

    #[test]
    fn boundary_source_detects_urls() {
        temp_env::with_var(
            "BOUNDARY_SOURCE",
            Some("https://example.org/districts.geojson"),
            || {
                assert_eq!(
                    boundary_source(),
                    BoundarySource::Url("https://example.org/districts.geojson".to_owned())
                );
            },
        );
        temp_env::with_var("BOUNDARY_SOURCE", Some("   "), || {
            assert_eq!(
                boundary_source(),
                BoundarySource::File(DEFAULT_BOUNDARY_SOURCE.to_owned())
            );
        });
    }

    #[test]
    fn refresh_interval_rejects_zero_and_garbage() {
        temp_env::with_var("BOUNDARY_REFRESH_SECS", Some("0"), || {
            assert_eq!(boundary_refresh_interval(), Duration::from_secs(3600));
        });
        temp_env::with_var("BOUNDARY_REFRESH_SECS", Some("soon"), || {
            assert_eq!(boundary_refresh_interval(), Duration::from_secs(3600));
        });
        temp_env::with_var("BOUNDARY_REFRESH_SECS", Some("120"), || {
            assert_eq!(boundary_refresh_interval(), Duration::from_secs(120));
        });
    }

    #[test]
    fn upstream_timeouts_fall_back_to_defaults() {
        temp_env::with_vars(
            [
                ("UPSTREAM_HTTP_TIMEOUT_SECS", Some("-1")),
                ("UPSTREAM_CONNECT_TIMEOUT_SECS", Some("7")),
            ],
            || {
                assert_eq!(upstream_http_timeout(), Duration::from_secs(10));
                assert_eq!(upstream_connect_timeout(), Duration::from_secs(7));
            },
        );
    }

    #[test]
    fn port_and_static_dir_overrides() {
        temp_env::with_vars(
            [("SERVER_PORT", Some("8080")), ("STATIC_DIR", Some("public"))],
            || {
                assert_eq!(server_port(), 8080);
                assert_eq!(static_dir(), "public");
            },
        );
        temp_env::with_vars_unset(["SERVER_PORT", "STATIC_DIR"], || {
            assert_eq!(server_port(), 3000);
            assert_eq!(static_dir(), "client/dist");
        });
    }
}
