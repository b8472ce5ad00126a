use anyhow::{Context, Result};
use serde_yaml::Value;
use std::io::Write;
use tracing::info;

/// `-` means stdout.
pub const STDOUT: &str = "-";

pub fn header() -> String {
    format!(
        "# Generated by subgen {} at {}\n",
        env!("CARGO_PKG_VERSION"),
        chrono::Local::now().format("%c")
    )
}

pub fn render(value: &Value) -> Result<String> {
    let body = serde_yaml::to_string(value).context("serializing yaml")?;
    Ok(header() + &body)
}

pub fn write_yaml(value: &Value, dest: &str) -> Result<()> {
    let text = render(value)?;
    if dest == STDOUT {
        let mut out = std::io::stdout().lock();
        out.write_all(text.as_bytes()).context("writing to stdout")?;
        return out.flush().context("flushing stdout");
    }
    info!(file = dest, "writing yaml");
    std::fs::write(dest, text).with_context(|| format!("unable to write file {dest}"))
}
