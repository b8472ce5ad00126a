//! Share-link decoders.
//!
//! A subscription blob is either a plain list of `scheme://…` links or the
//! same list wrapped in base64. Every link is dispatched by scheme to a
//! [`ProxyDecoder`] which turns it into a [`ProxyRecord`] in Clash field
//! layout. The registry is static; decoders hold no state.

use crate::model::{ProxyRecord, Result, SubsError};
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use tracing::{debug, trace};

pub mod ss;
pub mod ssr;
pub mod trojan;
pub mod vmess;

pub trait ProxyDecoder: Send + Sync {
    /// Lower-case scheme token this decoder handles (`ss`, `vmess`, …).
    fn scheme(&self) -> &'static str;

    /// Decodes the part of the link after `scheme://`.
    fn decode_config(&self, content: &str) -> Result<ProxyRecord>;
}

static DECODERS: [&dyn ProxyDecoder; 4] = [
    &ss::ShadowsocksDecoder,
    &ssr::ShadowsocksRDecoder,
    &vmess::VmessDecoder,
    &trojan::TrojanDecoder,
];

/// Schemes with a registered decoder.
pub fn supported_schemes() -> impl Iterator<Item = &'static str> {
    DECODERS.iter().map(|d| d.scheme())
}

pub fn decoder_for(scheme: &str) -> Result<&'static dyn ProxyDecoder> {
    DECODERS
        .iter()
        .copied()
        .find(|d| d.scheme() == scheme)
        .ok_or_else(|| SubsError::UnsupportedProtocol(scheme.to_string()))
}

/// Decodes a whole subscription blob into records, in link order.
pub fn decode(blob: &str) -> Result<Vec<ProxyRecord>> {
    let trimmed = blob.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let text = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        decode_base64_str(trimmed)?
    };

    let mut records = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        records.push(decode_link(line)?);
    }
    debug!(count = records.len(), "decoded subscription links");
    Ok(records)
}

/// Decodes a single `scheme://…` link.
pub fn decode_link(link: &str) -> Result<ProxyRecord> {
    let (scheme, remainder) = strip(link)?;
    let decoder = decoder_for(&scheme)?;
    let record = decoder.decode_config(remainder)?;
    trace!(scheme = %scheme, name = %record.name, "decoded link");
    Ok(record)
}

/// Splits `scheme://rest` into the lower-cased scheme and `rest`.
pub fn strip(link: &str) -> Result<(String, &str)> {
    match link.trim().split_once("://") {
        Some((scheme, rest)) if !scheme.is_empty() => Ok((scheme.to_ascii_lowercase(), rest)),
        _ => Err(SubsError::InvalidUri(format!("not a share link: {link}"))),
    }
}

const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_decode_padding_mode(DecodePaddingMode::Indifferent)
    .with_decode_allow_trailing_bits(true);

const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// Decodes standard or URL-safe base64, with or without padding.
/// Embedded whitespace (line-wrapped blobs) is ignored.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let normalized: String = data
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    STANDARD_LENIENT
        .decode(normalized.as_bytes())
        .map_err(|e| SubsError::Decode(format!("base64: {e}")))
}

/// [`decode_base64`] followed by UTF-8 validation.
pub fn decode_base64_str(data: &str) -> Result<String> {
    let bytes = decode_base64(data)?;
    String::from_utf8(bytes).map_err(|e| SubsError::Decode(format!("utf-8: {e}")))
}

/// Splits `main#fragment`, percent-decoding the fragment.
pub(crate) fn split_fragment(content: &str) -> (&str, Option<String>) {
    match content.rfind('#') {
        Some(idx) => (
            &content[..idx],
            Some(crate::uri::percent_decode(&content[idx + 1..])).filter(|n| !n.is_empty()),
        ),
        None => (content, None),
    }
}

/// Parses `host:port`, accepting `[v6]:port`.
pub(crate) fn split_host_port(s: &str) -> Result<(String, u16)> {
    let (host, port) = s
        .rsplit_once(':')
        .ok_or_else(|| SubsError::Decode(format!("missing port in '{s}'")))?;
    let port = port
        .parse::<u16>()
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| SubsError::Decode(format!("invalid port in '{s}'")))?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return Err(SubsError::Decode(format!("missing host in '{s}'")));
    }
    Ok((host.to_string(), port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_variants() {
        assert_eq!(decode_base64("dGVzdA==").unwrap(), b"test");
        assert_eq!(decode_base64("dGVzdA").unwrap(), b"test");
        assert_eq!(decode_base64("dGVz\ndA==\n").unwrap(), b"test");
        // '>>>' encodes to "Pj4-" in the URL-safe alphabet
        assert_eq!(decode_base64("Pj4-").unwrap(), b">>>");
        assert!(matches!(decode_base64("@@@@"), Err(SubsError::Decode(_))));
    }

    #[test]
    fn strip_lowercases_scheme() {
        let (scheme, rest) = strip("VMESS://abc").unwrap();
        assert_eq!(scheme, "vmess");
        assert_eq!(rest, "abc");
        assert!(matches!(strip("no-scheme"), Err(SubsError::InvalidUri(_))));
    }

    #[test]
    fn unknown_scheme_is_unsupported() {
        let err = decode("hysteria://host:443#x").unwrap_err();
        assert!(matches!(err, SubsError::UnsupportedProtocol(ref s) if s == "hysteria"));
    }

    #[test]
    fn registry_lists_all_schemes() {
        let schemes: Vec<_> = supported_schemes().collect();
        assert_eq!(schemes, vec!["ss", "ssr", "vmess", "trojan"]);
        for s in schemes {
            assert_eq!(decoder_for(s).unwrap().scheme(), s);
        }
    }

    #[test]
    fn empty_blob_has_no_records() {
        assert!(decode("   \n").unwrap().is_empty());
    }

    #[test]
    fn host_port_split() {
        assert_eq!(split_host_port("a.b:443").unwrap(), ("a.b".into(), 443));
        assert_eq!(split_host_port("[::1]:80").unwrap(), ("::1".into(), 80));
        assert!(split_host_port("a.b").is_err());
        assert!(split_host_port("a.b:0").is_err());
        assert!(split_host_port(":80").is_err());
    }

    #[test]
    fn fragment_is_decoded() {
        let (main, name) = split_fragment("x@y:1#HK%2001");
        assert_eq!(main, "x@y:1");
        assert_eq!(name.as_deref(), Some("HK 01"));
        assert_eq!(split_fragment("x#").1, None);
    }
}
