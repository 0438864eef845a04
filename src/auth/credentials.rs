// Endpoint credential resolution

use base64::{engine::general_purpose::STANDARD, Engine as _};
use url::Url;

use super::types::ResolvedEndpoint;

/// Split embedded `user:pass@` credentials out of the configured endpoint.
///
/// When both a username and a password are present the URL is rewritten
/// without them and a `Basic` header value is derived. A malformed URL, or
/// one without a complete credential pair, is returned unchanged.
pub fn resolve_endpoint(raw: &str) -> ResolvedEndpoint {
    let unchanged = || ResolvedEndpoint {
        base_url: raw.to_string(),
        static_auth: None,
    };

    let mut parsed = match Url::parse(raw) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!(error = %e, "Endpoint is not a valid URL, using it verbatim");
            return unchanged();
        }
    };

    let username = percent_decode(parsed.username());
    let password = parsed.password().map(percent_decode);

    let password = match password {
        Some(p) if !username.is_empty() && !p.is_empty() => p,
        _ => return unchanged(),
    };

    // Cannot-be-a-base URLs (mailto: etc.) refuse user-info changes
    if parsed.set_username("").is_err() || parsed.set_password(None).is_err() {
        return unchanged();
    }

    tracing::info!("Using basic auth credentials embedded in the API URL");

    ResolvedEndpoint {
        base_url: trim_root_slash(raw, parsed.as_str()),
        static_auth: Some(basic_auth_header(&username, &password)),
    }
}

/// Build a `Basic` Authorization header value
pub fn basic_auth_header(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
}

/// `Url` always serialises an empty path as `/`; drop it unless the input had one
fn trim_root_slash(raw: &str, rewritten: &str) -> String {
    if rewritten.ends_with('/') && !raw.ends_with('/') {
        rewritten.trim_end_matches('/').to_string()
    } else {
        rewritten.to_string()
    }
}

fn percent_decode(s: &str) -> String {
    urlencoding::decode(s)
        .map(|v| v.into_owned())
        .unwrap_or_else(|_| s.to_string())
}
