//! `ss://` links: SIP002 and the legacy fully-encoded form.
//!
//! - SIP002: `ss://b64(method:password)@host:port/?plugin=…#tag`
//!   (userinfo may also be percent-encoded plain text)
//! - legacy: `ss://b64(method:password@host:port)#tag`

use super::{decode_base64_str, split_fragment, split_host_port, ProxyDecoder};
use crate::model::{ProxyRecord, Result, SubsError};
use crate::uri::{percent_decode, query_pairs};
use serde_yaml::{Mapping, Value};

pub struct ShadowsocksDecoder;

impl ProxyDecoder for ShadowsocksDecoder {
    fn scheme(&self) -> &'static str {
        "ss"
    }

    fn decode_config(&self, content: &str) -> Result<ProxyRecord> {
        let (main, tag) = split_fragment(content);
        let (main, query) = main.split_once('?').unwrap_or((main, ""));
        let main = main.trim_end_matches('/');

        let (userinfo, hostport) = match main.rsplit_once('@') {
            Some((userinfo, hostport)) => (decode_userinfo(userinfo)?, hostport.to_string()),
            None => {
                let decoded = decode_base64_str(main)?;
                let (userinfo, hostport) = decoded
                    .rsplit_once('@')
                    .ok_or_else(|| SubsError::Decode("ss: missing '@' in legacy link".into()))?;
                (userinfo.to_string(), hostport.to_string())
            }
        };

        let (cipher, password) = userinfo
            .split_once(':')
            .ok_or_else(|| SubsError::Decode("ss: userinfo is not method:password".into()))?;
        let (server, port) = split_host_port(&hostport)?;
        let name = tag.unwrap_or_else(|| format!("{server}:{port}"));

        let mut record = ProxyRecord::new(name, "ss")
            .with("server", server)
            .with("port", port)
            .with("cipher", cipher)
            .with("password", password)
            .with("udp", true);

        let plugin = query_pairs(query)
            .into_iter()
            .find(|(k, _)| k == "plugin")
            .map(|(_, v)| v);
        if let Some((plugin, opts)) = plugin.as_deref().map(parse_plugin).transpose()?.flatten() {
            record.set("plugin", plugin);
            record.set("plugin-opts", opts);
        }
        Ok(record)
    }
}

fn decode_userinfo(userinfo: &str) -> Result<String> {
    let plain = percent_decode(userinfo);
    if plain.contains(':') {
        return Ok(plain);
    }
    decode_base64_str(&plain)
}

/// `obfs-local;obfs=http;obfs-host=example.com` → (`obfs`, {mode, host}).
fn parse_plugin(spec: &str) -> Result<Option<(&'static str, Mapping)>> {
    let mut parts = spec.split(';');
    let plugin = parts.next().unwrap_or_default().trim();
    let opts: Vec<(&str, &str)> = parts
        .map(|p| p.split_once('=').unwrap_or((p, "")))
        .collect();
    let opt = |key: &str| {
        opts.iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
            .filter(|v| !v.is_empty())
    };

    let mut map = Mapping::new();
    match plugin {
        "" => return Ok(None),
        "obfs-local" | "simple-obfs" => {
            let mode = opt("obfs").ok_or_else(|| {
                SubsError::Decode(format!("ss: obfs plugin without mode: {spec}"))
            })?;
            map.insert(Value::from("mode"), Value::from(mode));
            if let Some(host) = opt("obfs-host") {
                map.insert(Value::from("host"), Value::from(host));
            }
            Ok(Some(("obfs", map)))
        }
        "v2ray-plugin" => {
            map.insert(
                Value::from("mode"),
                Value::from(opt("mode").unwrap_or("websocket")),
            );
            if let Some(host) = opt("host") {
                map.insert(Value::from("host"), Value::from(host));
            }
            if let Some(path) = opt("path") {
                map.insert(Value::from("path"), Value::from(path));
            }
            let tls = opts.iter().any(|(k, _)| *k == "tls");
            map.insert(Value::from("tls"), Value::from(tls));
            Ok(Some(("v2ray-plugin", map)))
        }
        other => Err(SubsError::UnsupportedProtocol(format!("ss plugin {other}"))),
    }
}
