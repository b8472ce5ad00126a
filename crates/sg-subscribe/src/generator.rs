//! Wraps an [`OutputDocument`] into the file a Clash client loads.

use crate::document::OutputDocument;
use crate::model::{Result, SubsError};
use serde_yaml::{Mapping, Value};
use sg_config::defaults::GENERATED_PLACEHOLDER;
use tracing::{debug, trace};

/// Pre-0.19 Clash key names and their current spelling.
const LEGACY_KEYS: [(&str, &str); 3] = [
    ("Proxy", "proxies"),
    ("Proxy Group", "proxy-groups"),
    ("Rule", "rules"),
];

/// Full Clash configuration: `template` (any general settings), with the
/// generated proxies and groups added and `rules` replacing the template's
/// rules when given.
pub fn clash_config(
    doc: &OutputDocument,
    template: Option<Value>,
    rules: Option<Vec<String>>,
) -> Result<Value> {
    let mut root = match template {
        None | Some(Value::Null) => Mapping::new(),
        Some(Value::Mapping(m)) => rename_legacy_keys(m),
        Some(_) => {
            return Err(SubsError::InvalidValue(
                "template must be a YAML mapping".into(),
            ))
        }
    };

    let proxies = sequence_entry(&mut root, "proxies")?;
    proxies.extend(doc.proxies.iter().cloned().map(Value::Mapping));

    let generated: Vec<Value> = doc
        .group_name
        .iter()
        .map(|n| Value::from(n.as_str()))
        .collect();
    let groups = sequence_entry(&mut root, "proxy-groups")?;
    for group in groups.iter_mut() {
        expand_placeholder(group, &generated);
    }
    for group in &doc.groups {
        let value = serde_yaml::to_value(group)
            .map_err(|e| SubsError::InvalidValue(format!("proxy group: {e}")))?;
        groups.push(value);
    }

    if let Some(rules) = rules {
        debug!(count = rules.len(), "replacing template rules");
        root.insert(
            Value::from("rules"),
            Value::Sequence(rules.into_iter().map(Value::from).collect()),
        );
    }
    Ok(Value::Mapping(root))
}

/// Proxy-provider payload: only the `proxies` list.
pub fn provider_file(doc: &OutputDocument) -> Value {
    let mut root = Mapping::new();
    root.insert(
        Value::from("proxies"),
        Value::Sequence(doc.proxies.iter().cloned().map(Value::Mapping).collect()),
    );
    Value::Mapping(root)
}

/// Reads rule lines from a YAML document: either a bare list or a mapping
/// with `rules` (or legacy `Rule`).
pub fn parse_rules(text: &str) -> Result<Vec<String>> {
    let value: Value =
        serde_yaml::from_str(text).map_err(|e| SubsError::Decode(format!("rules yaml: {e}")))?;
    let list = match &value {
        Value::Sequence(seq) => seq,
        Value::Mapping(map) => {
            let key = search_key(map, &["rules", "Rule"])?;
            map.get(key)
                .and_then(Value::as_sequence)
                .ok_or_else(|| SubsError::InvalidValue(format!("'{key}' must be a list")))?
        }
        _ => return Err(SubsError::MissingKey("rules".into())),
    };
    list.iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| SubsError::InvalidValue(format!("rule must be a string: {v:?}")))
        })
        .collect()
}

/// First of `keys` present in `map`.
pub fn search_key<'k>(map: &Mapping, keys: &[&'k str]) -> Result<&'k str> {
    keys.iter()
        .copied()
        .find(|k| map.contains_key(*k))
        .ok_or_else(|| {
            SubsError::MissingKey(format!(
                "unable to find the required key \"{}\"",
                keys.first().copied().unwrap_or_default()
            ))
        })
}

fn rename_legacy_keys(map: Mapping) -> Mapping {
    map.into_iter()
        .map(|(k, v)| {
            let renamed = k.as_str().and_then(|name| {
                LEGACY_KEYS
                    .iter()
                    .find(|(old, _)| *old == name)
                    .map(|(old, new)| {
                        trace!(from = old, to = new, "renaming legacy key");
                        Value::from(*new)
                    })
            });
            (renamed.unwrap_or(k), v)
        })
        .collect()
}

fn sequence_entry<'m>(root: &'m mut Mapping, key: &str) -> Result<&'m mut Vec<Value>> {
    let entry = root
        .entry(Value::from(key))
        .or_insert_with(|| Value::Sequence(Vec::new()));
    if entry.is_null() {
        *entry = Value::Sequence(Vec::new());
    }
    entry
        .as_sequence_mut()
        .ok_or_else(|| SubsError::InvalidValue(format!("template '{key}' must be a list")))
}

fn expand_placeholder(group: &mut Value, generated: &[Value]) {
    let Some(members) = group.get_mut("proxies").and_then(Value::as_sequence_mut) else {
        return;
    };
    if !members.iter().any(|m| m.as_str() == Some(GENERATED_PLACEHOLDER)) {
        return;
    }
    let expanded = members
        .drain(..)
        .flat_map(|m| {
            if m.as_str() == Some(GENERATED_PLACEHOLDER) {
                generated.to_vec()
            } else {
                vec![m]
            }
        })
        .collect();
    *members = expanded;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::create_proxy_group;
    use sg_config::ProxyGroupType;

    fn doc() -> OutputDocument {
        let mut hk = create_proxy_group("G-HK", ProxyGroupType::UrlTest, "http://t", 300);
        hk.proxies.push("HK01".into());
        let mut proxy = Mapping::new();
        proxy.insert("name".into(), "HK01".into());
        proxy.insert("type".into(), "ss".into());
        OutputDocument {
            groups: vec![hk],
            proxies: vec![proxy],
            group_name: vec!["G-HK".into()],
        }
    }

    #[test]
    fn template_keys_are_renamed_and_placeholder_expanded() {
        let template: Value = serde_yaml::from_str(
            r#"
port: 7890
Proxy:
  - { name: manual, type: socks5, server: 127.0.0.1, port: 1080 }
Proxy Group:
  - { name: PROXY, type: select, proxies: [manual, GENERATED, DIRECT] }
Rule:
  - MATCH,PROXY
"#,
        )
        .unwrap();
        let out = clash_config(&doc(), Some(template), None).unwrap();
        assert_eq!(out["port"].as_u64(), Some(7890));
        assert!(out.get("Proxy").is_none());
        let names: Vec<_> = out["proxies"]
            .as_sequence()
            .unwrap()
            .iter()
            .filter_map(|p| p["name"].as_str())
            .collect();
        assert_eq!(names, vec!["manual", "HK01"]);
        let select: Vec<_> = out["proxy-groups"][0]["proxies"]
            .as_sequence()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(select, vec!["manual", "G-HK", "DIRECT"]);
        assert_eq!(out["proxy-groups"][1]["name"].as_str(), Some("G-HK"));
        assert_eq!(out["rules"][0].as_str(), Some("MATCH,PROXY"));
    }

    #[test]
    fn rules_override_template() {
        let out = clash_config(&doc(), None, Some(vec!["MATCH,DIRECT".into()])).unwrap();
        assert_eq!(out["rules"][0].as_str(), Some("MATCH,DIRECT"));
        assert_eq!(out["proxy-groups"][0]["type"].as_str(), Some("url-test"));
    }

    #[test]
    fn scalar_template_is_invalid() {
        let err = clash_config(&doc(), Some(Value::from("x")), None).unwrap_err();
        assert!(matches!(err, SubsError::InvalidValue(_)));
    }

    #[test]
    fn provider_file_has_only_proxies() {
        let v = provider_file(&doc());
        assert_eq!(v.as_mapping().unwrap().len(), 1);
        assert_eq!(v["proxies"][0]["name"].as_str(), Some("HK01"));
    }

    #[test]
    fn rules_from_list_or_mapping() {
        assert_eq!(parse_rules("- MATCH,DIRECT\n").unwrap(), vec!["MATCH,DIRECT"]);
        assert_eq!(
            parse_rules("Rule:\n  - DOMAIN-SUFFIX,google.com,PROXY\n").unwrap(),
            vec!["DOMAIN-SUFFIX,google.com,PROXY"]
        );
        assert!(matches!(
            parse_rules("port: 1\n"),
            Err(SubsError::MissingKey(_))
        ));
    }
}
