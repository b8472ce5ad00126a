//! `trojan://password@host:port?sni=…&type=ws&path=…#tag`

use super::{split_fragment, ProxyDecoder};
use crate::model::{ProxyRecord, Result, SubsError};
use crate::uri::{percent_decode, Uri};
use serde_yaml::{Mapping, Value};

pub struct TrojanDecoder;

impl ProxyDecoder for TrojanDecoder {
    fn scheme(&self) -> &'static str {
        "trojan"
    }

    fn decode_config(&self, content: &str) -> Result<ProxyRecord> {
        let (main, tag) = split_fragment(content);
        let (password, rest) = main
            .rsplit_once('@')
            .ok_or_else(|| SubsError::Decode("trojan: missing password".into()))?;
        let password = percent_decode(password);
        if password.is_empty() {
            return Err(SubsError::Decode("trojan: empty password".into()));
        }

        let uri = Uri::parse(&format!("trojan://{rest}"))?;
        if uri.host.is_empty() || uri.port == 0 {
            return Err(SubsError::Decode(format!("trojan: missing host or port in '{rest}'")));
        }
        let params = uri.query_pairs();
        let param = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
                .filter(|v| !v.is_empty())
        };

        let name = tag.unwrap_or_else(|| format!("{}:{}", uri.host, uri.port));
        let mut record = ProxyRecord::new(name, "trojan")
            .with("server", uri.host.as_str())
            .with("port", uri.port)
            .with("password", password)
            .with("udp", true);
        record.set_opt("sni", param("sni").or_else(|| param("peer")));
        if matches!(param("allowInsecure"), Some("1" | "true")) {
            record.set("skip-cert-verify", true);
        }
        if let Some(alpn) = param("alpn") {
            record.set(
                "alpn",
                Value::Sequence(alpn.split(',').map(|a| Value::from(a.trim())).collect()),
            );
        }

        match param("type").unwrap_or("tcp") {
            "ws" => {
                let mut opts = Mapping::new();
                opts.insert(Value::from("path"), Value::from(param("path").unwrap_or("/")));
                if let Some(host) = param("host") {
                    let mut headers = Mapping::new();
                    headers.insert(Value::from("Host"), Value::from(host));
                    opts.insert(Value::from("headers"), Value::from(headers));
                }
                record.set("network", "ws");
                record.set("ws-opts", opts);
            }
            "grpc" => {
                let mut opts = Mapping::new();
                opts.insert(
                    Value::from("grpc-service-name"),
                    Value::from(param("serviceName").unwrap_or_default()),
                );
                record.set("network", "grpc");
                record.set("grpc-opts", opts);
            }
            "tcp" | "original" => {}
            other => {
                return Err(SubsError::UnsupportedProtocol(format!(
                    "trojan transport {other}"
                )))
            }
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_link() {
        let r = TrojanDecoder
            .decode_config("p%40ss@jp.example.com:443?sni=cdn.example.com&allowInsecure=1#JP%2003")
            .unwrap();
        assert_eq!(r.name, "JP 03");
        assert_eq!(r.kind(), Some("trojan"));
        assert_eq!(r.get("server").and_then(Value::as_str), Some("jp.example.com"));
        assert_eq!(r.get("port").and_then(Value::as_u64), Some(443));
        assert_eq!(r.get("password").and_then(Value::as_str), Some("p@ss"));
        assert_eq!(r.get("sni").and_then(Value::as_str), Some("cdn.example.com"));
        assert_eq!(r.get("skip-cert-verify").and_then(Value::as_bool), Some(true));
    }

    #[test]
    fn websocket_transport() {
        let r = TrojanDecoder
            .decode_config("pw@h.example:8443/?type=ws&path=%2Ftj&host=h.example&alpn=h2,http/1.1")
            .unwrap();
        assert_eq!(r.name, "h.example:8443");
        assert_eq!(r.get("network").and_then(Value::as_str), Some("ws"));
        let ws = r.get("ws-opts").unwrap();
        assert_eq!(ws.get("path").and_then(Value::as_str), Some("/tj"));
        let alpn: Vec<_> = r
            .get("alpn")
            .and_then(Value::as_sequence)
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(alpn, vec!["h2", "http/1.1"]);
    }

    #[test]
    fn missing_port_is_rejected() {
        let err = TrojanDecoder.decode_config("pw@host#x").unwrap_err();
        assert!(matches!(err, SubsError::Decode(_)));
    }

    #[test]
    fn missing_password_is_rejected() {
        let err = TrojanDecoder.decode_config("host:443").unwrap_err();
        assert!(matches!(err, SubsError::Decode(_)));
    }
}
