//! `ssr://` links.
//!
//! Payload is `b64(host:port:protocol:method:obfs:b64(password)/?params)`
//! where every param value (`remarks`, `obfsparam`, `protoparam`, `group`)
//! is base64 as well.

use super::{decode_base64_str, split_host_port, ProxyDecoder};
use crate::model::{ProxyRecord, Result, SubsError};
use crate::uri::query_pairs;

pub struct ShadowsocksRDecoder;

impl ProxyDecoder for ShadowsocksRDecoder {
    fn scheme(&self) -> &'static str {
        "ssr"
    }

    fn decode_config(&self, content: &str) -> Result<ProxyRecord> {
        let decoded = decode_base64_str(content.trim())?;
        let (main, params) = match decoded.split_once('?') {
            Some((main, params)) => (main.trim_end_matches('/'), params),
            None => (decoded.trim_end_matches('/'), ""),
        };

        // host may be an IPv6 literal, so peel fields off the right
        let mut fields = main.rsplitn(6, ':');
        let mut next = |what: &str| {
            fields
                .next()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| SubsError::Decode(format!("ssr: missing {what}")))
        };
        let password = decode_base64_str(next("password")?)?;
        let obfs = next("obfs")?;
        let cipher = next("method")?;
        let protocol = next("protocol")?;
        let port = next("port")?;
        let host = next("host")?;
        let (server, port) = split_host_port(&format!("{host}:{port}"))?;

        let mut remarks = None;
        let mut obfs_param = None;
        let mut proto_param = None;
        for (key, value) in query_pairs(params) {
            let slot = match key.as_str() {
                "remarks" => &mut remarks,
                "obfsparam" => &mut obfs_param,
                "protoparam" => &mut proto_param,
                _ => continue,
            };
            *slot = Some(decode_base64_str(&value)?);
        }

        let name = remarks
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| format!("{server}:{port}"));
        let mut record = ProxyRecord::new(name, "ssr")
            .with("server", server)
            .with("port", port)
            .with("cipher", cipher)
            .with("password", password)
            .with("protocol", protocol)
            .with("obfs", obfs);
        record.set_opt("protocol-param", proto_param.as_deref());
        record.set_opt("obfs-param", obfs_param.as_deref());
        record.set("udp", true);
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine as _;
    use serde_yaml::Value;

    fn b64(s: &str) -> String {
        URL_SAFE_NO_PAD.encode(s)
    }

    #[test]
    fn full_link() {
        let body = format!(
            "hk.example.com:8989:auth_aes128_md5:aes-256-cfb:tls1.2_ticket_auth:{}/?obfsparam={}&protoparam={}&remarks={}&group={}",
            b64("secret"),
            b64("cdn.example.com"),
            b64("32:abc"),
            b64("HK01 Netflix"),
            b64("grp"),
        );
        let r = ShadowsocksRDecoder.decode_config(&b64(&body)).unwrap();
        assert_eq!(r.name, "HK01 Netflix");
        assert_eq!(r.kind(), Some("ssr"));
        let s = |k: &str| r.get(k).and_then(Value::as_str).map(str::to_string);
        assert_eq!(s("server").as_deref(), Some("hk.example.com"));
        assert_eq!(r.get("port").and_then(Value::as_u64), Some(8989));
        assert_eq!(s("cipher").as_deref(), Some("aes-256-cfb"));
        assert_eq!(s("password").as_deref(), Some("secret"));
        assert_eq!(s("protocol").as_deref(), Some("auth_aes128_md5"));
        assert_eq!(s("obfs").as_deref(), Some("tls1.2_ticket_auth"));
        assert_eq!(s("protocol-param").as_deref(), Some("32:abc"));
        assert_eq!(s("obfs-param").as_deref(), Some("cdn.example.com"));
    }

    #[test]
    fn minimal_link_without_params() {
        let body = format!("10.0.0.2:443:origin:none:plain:{}", b64("pw"));
        let r = ShadowsocksRDecoder.decode_config(&b64(&body)).unwrap();
        assert_eq!(r.name, "10.0.0.2:443");
        assert!(r.get("obfs-param").is_none());
    }

    #[test]
    fn truncated_payload() {
        let err = ShadowsocksRDecoder
            .decode_config(&b64("host:443:origin"))
            .unwrap_err();
        assert!(matches!(err, SubsError::Decode(_)));
    }
}
