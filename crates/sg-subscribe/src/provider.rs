//! `proxy-providers` entries for the provider generator.

use crate::model::{Result, SubsError};
use serde::Serialize;
use sg_config::ProviderType;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthCheck {
    pub enable: bool,
    pub url: String,
    pub interval: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderGroup {
    #[serde(rename = "type")]
    pub kind: ProviderType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub path: String,
    #[serde(rename = "health-check")]
    pub health_check: HealthCheck,
}

/// An `http` provider needs the URL the client will poll; `file` ignores it.
pub fn create_provider_group(
    kind: ProviderType,
    path: &str,
    url: &str,
    hc_enable: bool,
    hc_url: &str,
    hc_interval: u32,
) -> Result<ProviderGroup> {
    let url = match kind {
        ProviderType::Http if url.trim().is_empty() => {
            return Err(SubsError::MissingKey(
                "provider type http must be used with a valid url".into(),
            ))
        }
        ProviderType::Http => Some(url.trim().to_string()),
        ProviderType::File => None,
    };
    Ok(ProviderGroup {
        kind,
        url,
        path: path.to_string(),
        health_check: HealthCheck {
            enable: hc_enable,
            url: hc_url.to_string(),
            interval: hc_interval,
        },
    })
}
