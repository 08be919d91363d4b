use std::{net::IpAddr, str::FromStr};

use actix_web::HttpRequest;
use log::{debug, trace};
use regex::Regex;

use crate::config::ServerOptions;

/// Resolves the client IP for a request. Proxy headers are only consulted when the deployment has opted in via
/// [`ServerOptions`], since anyone can send them; otherwise the connection's peer address is used.
///
/// `X-Forwarded-For` takes precedence over `Forwarded`. For multi-hop chains ("client, proxy1, proxy2") the first
/// entry is the client.
pub fn get_remote_ip(req: &HttpRequest, opts: &ServerOptions) -> Option<IpAddr> {
    let mut result = None;
    if opts.use_x_forwarded_for {
        trace!("Checking X-Forwarded-For header");
        result = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|chain| chain.split(',').next())
            .and_then(|s| IpAddr::from_str(s.trim()).ok());
        if let Some(ip) = result {
            debug!("Using X-Forwarded-For header for remote address: {ip}");
        }
    }
    if opts.use_forwarded && result.is_none() {
        trace!("Checking Forwarded header");
        let re = Regex::new(r#"for=(?P<ip>[^;]+)"#).unwrap();
        result = req
            .headers()
            .get("Forwarded")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| re.captures(v))
            .and_then(|caps| caps.name("ip"))
            .map(|m| m.as_str().trim_matches('"'))
            .and_then(|s| IpAddr::from_str(s).ok());
        if let Some(ip) = result {
            debug!("Using Forwarded header for remote address: {ip}");
        }
    }
    result.or_else(|| {
        let peer_addr = req.connection_info().peer_addr().map(|a| a.to_string());
        trace!("Using Peer address for remote address: {:?}", peer_addr);
        peer_addr.and_then(|s| IpAddr::from_str(&s).ok())
    })
}

#[cfg(test)]
mod test {
    use actix_web::test::TestRequest;

    use super::*;

    fn opts(use_x_forwarded_for: bool, use_forwarded: bool) -> ServerOptions {
        ServerOptions { use_x_forwarded_for, use_forwarded }
    }

    #[test]
    fn forwarded_header_is_parsed_when_enabled() {
        let req = TestRequest::default().insert_header(("Forwarded", "for=192.0.2.60;proto=http")).to_http_request();
        let ip = get_remote_ip(&req, &opts(false, true));
        assert_eq!(ip, Some(IpAddr::from_str("192.0.2.60").unwrap()));
    }

    #[test]
    fn x_forwarded_for_takes_the_first_hop() {
        let req = TestRequest::default()
            .insert_header(("X-Forwarded-For", "198.51.100.17, 203.0.113.9"))
            .insert_header(("Forwarded", "for=192.0.2.60"))
            .to_http_request();
        let ip = get_remote_ip(&req, &opts(true, true));
        assert_eq!(ip, Some(IpAddr::from_str("198.51.100.17").unwrap()));
    }

    #[test]
    fn quoted_forwarded_entries_are_accepted() {
        let req = TestRequest::default().insert_header(("Forwarded", r#"for="203.0.113.9""#)).to_http_request();
        assert_eq!(get_remote_ip(&req, &opts(false, true)), Some(IpAddr::from_str("203.0.113.9").unwrap()));
    }

    #[test]
    fn proxy_headers_are_ignored_unless_enabled() {
        let req = TestRequest::default().insert_header(("X-Forwarded-For", "198.51.100.17")).to_http_request();
        // No trusted headers and no real peer on a synthetic request
        assert_eq!(get_remote_ip(&req, &opts(false, false)), None);
    }
}
