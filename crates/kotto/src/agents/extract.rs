//! Structured data extraction from a raw string

use anyhow::Result;
use kotto_agent::{Arguments, CapabilityRegistry, Signal};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::sync::OnceCell;

const CLASS: &str = "Extract";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Data {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// The first argument is the text to extract from; without it the text is
/// read from stdin on first use
pub fn registry(args: &[String]) -> Result<CapabilityRegistry> {
    let raw = Arc::new(match args.first() {
        Some(text) => OnceCell::new_with(Some(text.clone())),
        None => OnceCell::new(),
    });

    let registry = CapabilityRegistry::builder()
        .method(CLASS, "getRawString", move |_args: Arguments| {
            let raw = raw.clone();
            async move {
                let text = raw.get_or_try_init(read_stdin).await?;
                Ok(text.clone())
            }
        })
        .method(CLASS, "setData", |args: Arguments| async move {
            let (data,): (Data,) = args.parse()?;
            let value = serde_json::to_value(data).map_err(Signal::fatal)?;
            Err::<(), _>(Signal::exit(value))
        })
        .build()?;
    Ok(registry)
}

async fn read_stdin() -> Result<String, Signal> {
    let mut text = String::new();
    tokio::io::stdin()
        .read_to_string(&mut text)
        .await
        .map_err(Signal::interrupt)?;
    if text.trim().is_empty() {
        return Err(Signal::interrupt("no text to extract from, pass it after `--` or on stdin"));
    }
    Ok(text)
}
