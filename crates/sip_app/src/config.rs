//! API base URL resolution.

use anyhow::{Context, Result};
use url::Url;

pub(crate) const API_URL_ENV: &str = "SIP_API_URL";
pub(crate) const LOCAL_API_URL: &str = "http://localhost:8000/api";
pub(crate) const PRODUCTION_API_URL: &str = "https://myapp-backend-api.azurewebsites.net/api";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ApiSource {
    Flag,
    Environment,
    Host,
    Default,
}

/// Picks the API base: explicit flag, then `SIP_API_URL`, then a rule on the
/// host name the wizard is served from, then the production API.
pub(crate) fn resolve_api_base(
    flag: Option<&str>,
    env: Option<&str>,
    host: Option<&str>,
) -> Result<(Url, ApiSource)> {
    fn non_empty(value: Option<&str>) -> Option<&str> {
        value.map(str::trim).filter(|v| !v.is_empty())
    }

    let (raw, source) = if let Some(url) = non_empty(flag) {
        (url.to_string(), ApiSource::Flag)
    } else if let Some(url) = non_empty(env) {
        (url.to_string(), ApiSource::Environment)
    } else if let Some(url) = non_empty(host).and_then(url_for_host) {
        (url.to_string(), ApiSource::Host)
    } else {
        (PRODUCTION_API_URL.to_string(), ApiSource::Default)
    };

    let url = Url::parse(&raw).with_context(|| format!("invalid API base URL {raw:?}"))?;
    Ok((url, source))
}

fn url_for_host(host: &str) -> Option<&'static str> {
    let host = host.split(':').next().unwrap_or(host).to_ascii_lowercase();
    match host.as_str() {
        "localhost" | "127.0.0.1" => Some(LOCAL_API_URL),
        other if other.ends_with("azurewebsites.net") => Some(PRODUCTION_API_URL),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_wins_over_everything() {
        let (url, source) = resolve_api_base(
            Some("http://planner.test/api"),
            Some("http://env.test/api"),
            Some("localhost"),
        )
        .unwrap();
        assert_eq!(url.as_str(), "http://planner.test/api");
        assert_eq!(source, ApiSource::Flag);
    }

    #[test]
    fn environment_beats_host_rule() {
        let (url, source) =
            resolve_api_base(None, Some("http://env.test/api"), Some("localhost")).unwrap();
        assert_eq!(url.as_str(), "http://env.test/api");
        assert_eq!(source, ApiSource::Environment);
    }

    #[test]
    fn host_rules_map_local_and_azure() {
        let (local, _) = resolve_api_base(None, None, Some("127.0.0.1:3000")).unwrap();
        assert_eq!(local.as_str(), LOCAL_API_URL);

        let (azure, source) = resolve_api_base(None, Some("  "), Some("sifura.azurewebsites.net")).unwrap();
        assert_eq!(azure.as_str(), PRODUCTION_API_URL);
        assert_eq!(source, ApiSource::Host);
    }

    #[test]
    fn unknown_host_falls_back_to_production() {
        let (url, source) = resolve_api_base(None, None, Some("example.org")).unwrap();
        assert_eq!(url.as_str(), PRODUCTION_API_URL);
        assert_eq!(source, ApiSource::Default);
    }

    #[test]
    fn malformed_url_is_an_error() {
        assert!(resolve_api_base(Some("not a url"), None, None).is_err());
    }
}
