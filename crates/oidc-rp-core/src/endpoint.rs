//! URL policy for issuers and provider endpoints.

use url::{Host, Url};

/// Check that `raw` is an acceptable issuer identifier.
///
/// An issuer must be an absolute `https` URL without query, fragment or
/// credentials. With `require_https == false`, or when the host is a
/// loopback address, plain `http` is also accepted.
pub(crate) fn check_issuer(raw: &str, require_https: bool) -> Result<Url, String> {
    let url = check_endpoint(raw, require_https)?;
    if url.query().is_some() {
        return Err("issuer must not contain a query".into());
    }
    if url.fragment().is_some() {
        return Err("issuer must not contain a fragment".into());
    }
    Ok(url)
}

/// Check that `raw` is an absolute http(s) URL that satisfies the https policy.
pub(crate) fn check_endpoint(raw: &str, require_https: bool) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| format!("not a valid URL: {e}"))?;

    if !url.username().is_empty() || url.password().is_some() {
        return Err("URL must not contain credentials".into());
    }

    match url.scheme() {
        "https" => Ok(url),
        "http" if !require_https || is_loopback(&url) => Ok(url),
        "http" => Err("URL must use https".into()),
        other => Err(format!("unsupported URL scheme '{other}'")),
    }
}

fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}
