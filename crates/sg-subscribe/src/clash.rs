//! Subscriptions that already are Clash configuration files.

use crate::model::{ProxyRecord, Result, SubsError};
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Deserialize)]
struct ClashDoc {
    #[serde(default, alias = "Proxy")]
    proxies: Vec<serde_yaml::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionFormat {
    /// Share links, plain or base64-wrapped.
    Links,
    /// YAML document with a top-level `proxies` (or legacy `Proxy`) list.
    Clash,
}

impl SubscriptionFormat {
    pub fn detect(text: &str) -> Self {
        let is_clash = text.lines().any(|line| {
            ["proxies:", "Proxy:"]
                .iter()
                .any(|key| line.starts_with(key))
        });
        if is_clash {
            Self::Clash
        } else {
            Self::Links
        }
    }
}

/// Passes the `proxies` entries through as records, in document order.
pub fn parse(yaml: &str) -> Result<Vec<ProxyRecord>> {
    let doc: ClashDoc =
        serde_yaml::from_str(yaml).map_err(|e| SubsError::Decode(format!("clash yaml: {e}")))?;
    let mut records = Vec::with_capacity(doc.proxies.len());
    for v in doc.proxies {
        let serde_yaml::Value::Mapping(map) = v else {
            warn!("skipping non-mapping proxies entry");
            continue;
        };
        let record = ProxyRecord::from_mapping(map)?;
        if record.kind().map_or(true, str::is_empty) {
            return Err(SubsError::MissingKey(format!("type of proxy '{}'", record.name)));
        }
        records.push(record);
    }
    debug!(count = records.len(), "parsed clash proxies");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_format() {
        assert_eq!(
            SubscriptionFormat::detect("port: 7890\nproxies:\n  - {name: a, type: ss}\n"),
            SubscriptionFormat::Clash
        );
        assert_eq!(
            SubscriptionFormat::detect("ss://YWVzLTEyOC1nY206cHc@h:1#a\n"),
            SubscriptionFormat::Links
        );
        assert_eq!(
            SubscriptionFormat::detect("c3M6Ly9hYmM="),
            SubscriptionFormat::Links
        );
    }

    #[test]
    fn passes_proxies_through() {
        let yaml = r#"
proxies:
  - { name: "HK01", type: ss, server: 1.2.3.4, port: 8388, cipher: aes-128-gcm, password: pw }
  - name: US01
    type: trojan
    server: us.example.com
    port: 443
    password: x
"#;
        let records = parse(yaml).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "HK01");
        assert_eq!(records[1].kind(), Some("trojan"));
        assert_eq!(
            records[1].get("server").and_then(serde_yaml::Value::as_str),
            Some("us.example.com")
        );
    }

    #[test]
    fn legacy_proxy_key() {
        let records = parse("Proxy:\n  - {name: a, type: vmess}\n").unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn entry_without_type_is_rejected() {
        let err = parse("proxies:\n  - {name: a}\n").unwrap_err();
        assert!(matches!(err, SubsError::MissingKey(_)));
    }
}
