//! `vmess://` links in the v2rayN layout: base64 of a JSON object with
//! `ps, add, port, id, aid, scy, net, type, host, path, tls, sni`.

use super::{decode_base64, ProxyDecoder};
use crate::model::{ProxyRecord, Result, SubsError};
use serde_json::Value as JsonValue;
use serde_yaml::{Mapping, Value};

pub struct VmessDecoder;

impl ProxyDecoder for VmessDecoder {
    fn scheme(&self) -> &'static str {
        "vmess"
    }

    fn decode_config(&self, content: &str) -> Result<ProxyRecord> {
        let raw = decode_base64(content.trim())?;
        let json: JsonValue = serde_json::from_slice(&raw)
            .map_err(|e| SubsError::Decode(format!("vmess: {e}")))?;
        let obj = json
            .as_object()
            .ok_or_else(|| SubsError::Decode("vmess: payload is not an object".into()))?;
        let field = |key: &str| obj.get(key).and_then(json_string).filter(|s| !s.is_empty());
        let required = |key: &str| {
            field(key).ok_or_else(|| SubsError::Decode(format!("vmess: missing field '{key}'")))
        };

        let server = required("add")?;
        let port = required("port")?
            .parse::<u16>()
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| SubsError::Decode("vmess: invalid port".into()))?;
        let uuid = required("id")?;
        let alter_id = field("aid")
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(0);
        let name = field("ps").unwrap_or_else(|| format!("{server}:{port}"));
        let host = field("host");
        let path = field("path");

        let mut record = ProxyRecord::new(name, "vmess")
            .with("server", server)
            .with("port", port)
            .with("uuid", uuid)
            .with("alterId", alter_id)
            .with("cipher", field("scy").unwrap_or_else(|| "auto".into()))
            .with("udp", true);

        if field("tls").as_deref() == Some("tls") {
            record.set("tls", true);
            record.set_opt("servername", field("sni").or_else(|| host.clone()).as_deref());
        }

        match field("net").as_deref().unwrap_or("tcp") {
            "ws" => {
                let mut opts = Mapping::new();
                opts.insert(
                    Value::from("path"),
                    Value::from(path.as_deref().unwrap_or("/")),
                );
                if let Some(host) = host.as_deref() {
                    let mut headers = Mapping::new();
                    headers.insert(Value::from("Host"), Value::from(host));
                    opts.insert(Value::from("headers"), Value::from(headers));
                }
                record.set("network", "ws");
                record.set("ws-opts", opts);
            }
            "h2" => {
                let mut opts = Mapping::new();
                if let Some(host) = host.as_deref() {
                    opts.insert(
                        Value::from("host"),
                        Value::Sequence(host.split(',').map(|h| Value::from(h.trim())).collect()),
                    );
                }
                opts.insert(
                    Value::from("path"),
                    Value::from(path.as_deref().unwrap_or("/")),
                );
                record.set("network", "h2");
                record.set("h2-opts", opts);
            }
            "grpc" => {
                let mut opts = Mapping::new();
                opts.insert(
                    Value::from("grpc-service-name"),
                    Value::from(path.as_deref().unwrap_or_default()),
                );
                record.set("network", "grpc");
                record.set("grpc-opts", opts);
            }
            "tcp" => {}
            other => {
                return Err(SubsError::UnsupportedProtocol(format!(
                    "vmess transport {other}"
                )))
            }
        }
        Ok(record)
    }
}

/// v2rayN writes numbers as either strings or integers.
fn json_string(v: &JsonValue) -> Option<String> {
    match v {
        JsonValue::String(s) => Some(s.trim().to_string()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;

    fn link(json: &str) -> String {
        STANDARD.encode(json)
    }

    #[test]
    fn ws_tls_node() {
        let payload = link(
            r#"{"v":"2","ps":"US 02","add":"us.example.com","port":"443","id":"b831381d-6324-4d53-ad4f-8cda48b30811","aid":0,"net":"ws","type":"none","host":"cdn.example.com","path":"/ray","tls":"tls"}"#,
        );
        let r = VmessDecoder.decode_config(&payload).unwrap();
        assert_eq!(r.name, "US 02");
        assert_eq!(r.kind(), Some("vmess"));
        assert_eq!(r.get("port").and_then(Value::as_u64), Some(443));
        assert_eq!(r.get("alterId").and_then(Value::as_u64), Some(0));
        assert_eq!(r.get("cipher").and_then(Value::as_str), Some("auto"));
        assert_eq!(r.get("tls").and_then(Value::as_bool), Some(true));
        assert_eq!(
            r.get("servername").and_then(Value::as_str),
            Some("cdn.example.com")
        );
        let ws = r.get("ws-opts").unwrap();
        assert_eq!(ws.get("path").and_then(Value::as_str), Some("/ray"));
        assert_eq!(
            ws.get("headers")
                .and_then(|h| h.get("Host"))
                .and_then(Value::as_str),
            Some("cdn.example.com")
        );
    }

    #[test]
    fn numeric_port_and_plain_tcp() {
        let payload = link(r#"{"ps":"","add":"1.1.1.1","port":10086,"id":"u","aid":"64"}"#);
        let r = VmessDecoder.decode_config(&payload).unwrap();
        assert_eq!(r.name, "1.1.1.1:10086");
        assert_eq!(r.get("alterId").and_then(Value::as_u64), Some(64));
        assert!(r.get("network").is_none());
        assert!(r.get("tls").is_none());
    }

    #[test]
    fn grpc_service_name_from_path() {
        let payload =
            link(r#"{"ps":"g","add":"h","port":"443","id":"u","net":"grpc","path":"svc","tls":"tls","sni":"s.example"}"#);
        let r = VmessDecoder.decode_config(&payload).unwrap();
        assert_eq!(r.get("network").and_then(Value::as_str), Some("grpc"));
        assert_eq!(
            r.get("grpc-opts")
                .and_then(|o| o.get("grpc-service-name"))
                .and_then(Value::as_str),
            Some("svc")
        );
        assert_eq!(r.get("servername").and_then(Value::as_str), Some("s.example"));
    }

    #[test]
    fn missing_uuid() {
        let payload = link(r#"{"ps":"x","add":"h","port":"443"}"#);
        let err = VmessDecoder.decode_config(&payload).unwrap_err();
        assert!(matches!(err, SubsError::Decode(ref m) if m.contains("'id'")));
    }

    #[test]
    fn not_json() {
        let err = VmessDecoder.decode_config(&link("hello")).unwrap_err();
        assert!(matches!(err, SubsError::Decode(_)));
    }
}
