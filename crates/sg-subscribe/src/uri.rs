//! Minimal `scheme://host[:port][/path][?query]` model.
//!
//! Used for subscription/rule locations and for the authority part of
//! share links. It is intentionally looser than RFC 3986: no userinfo,
//! fragments stay wherever they appear.

use crate::model::{Result, SubsError};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Uri {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    /// Starts with `/` when present.
    pub path: String,
    /// Starts with `?` when present.
    pub query: String,
}

impl Uri {
    /// Parses `uri`. An empty string yields an all-empty value.
    pub fn parse(uri: &str) -> Result<Self> {
        if uri.is_empty() {
            return Ok(Self::default());
        }

        let invalid = || SubsError::InvalidUri(format!("URI doesn't have a valid scheme, {uri}"));
        let colon = uri.find(':').ok_or_else(invalid)?;
        let after = &uri[colon..];
        if colon == 0 || after.len() <= 3 || !after.starts_with("://") {
            return Err(invalid());
        }
        let scheme = uri[..colon].to_ascii_lowercase();
        let rest = &uri[colon + 3..];

        let query_start = rest.find('?').unwrap_or(rest.len());
        let path_start = rest[..query_start].find('/');
        let authority = &rest[..path_start.unwrap_or(query_start)];

        let (host, port) = split_authority(authority).map_err(|e| {
            SubsError::InvalidUri(format!("{e}, {uri}"))
        })?;
        let port = match port {
            Some(p) => p,
            None => default_port(&scheme),
        };

        Ok(Self {
            host: host.to_string(),
            port,
            path: path_start
                .map(|p| rest[p..query_start].to_string())
                .unwrap_or_default(),
            query: rest[query_start..].to_string(),
            scheme,
        })
    }

    /// Decoded `key=value` pairs of the query, in order.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        query_pairs(&self.query)
    }

    pub fn query_value(&self, key: &str) -> Option<String> {
        self.query_pairs()
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scheme.is_empty() {
            return Ok(());
        }
        write!(f, "{}://", self.scheme)?;
        if self.host.contains(':') {
            write!(f, "[{}]", self.host)?;
        } else {
            f.write_str(&self.host)?;
        }
        if self.port != 0 && self.port != default_port(&self.scheme) {
            write!(f, ":{}", self.port)?;
        }
        write!(f, "{}{}", self.path, self.query)
    }
}

fn default_port(scheme: &str) -> u16 {
    match scheme {
        "http" => 80,
        "https" => 443,
        _ => 0,
    }
}

/// Splits `host[:port]` / `[v6]:port`. `Ok((host, None))` when no port is given.
fn split_authority(authority: &str) -> std::result::Result<(&str, Option<u16>), String> {
    let (host, port) = if let Some(stripped) = authority.strip_prefix('[') {
        let close = stripped
            .find(']')
            .ok_or_else(|| "missing ']' in host".to_string())?;
        let tail = &stripped[close + 1..];
        let port = match tail.strip_prefix(':') {
            Some(p) => p,
            None if tail.is_empty() => "",
            None => return Err(format!("unexpected '{tail}' after host")),
        };
        (&stripped[..close], port)
    } else {
        match authority.split_once(':') {
            Some((h, p)) => (h, p),
            None => (authority, ""),
        }
    };
    if port.is_empty() {
        return Ok((host, None));
    }
    let port = port
        .parse::<u16>()
        .map_err(|_| format!("invalid port '{port}'"))?;
    // ":0" behaves like no port at all
    Ok((host, (port != 0).then_some(port)))
}

/// Parses `?a=1&b=%2F` (leading `?` optional) into decoded pairs.
pub fn query_pairs(query: &str) -> Vec<(String, String)> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|p| !p.is_empty())
        .map(|p| {
            let (k, v) = p.split_once('=').unwrap_or((p, ""));
            (percent_decode(k), percent_decode(v))
        })
        .collect()
}

pub(crate) fn percent_decode(s: &str) -> String {
    urlencoding::decode(s)
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| s.to_string())
}
