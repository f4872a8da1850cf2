//! Runtime messages exchanged with the popup.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FlickerError, FlickerResult};

/// Shown instead of a hostname the page could not report.
pub const SITE_LABEL_FALLBACK: &str = "This site";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Message {
    GetHostname,
    ToggleSite { enabled: bool },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Hostname { hostname: String },
}

impl Message {
    pub fn decode(value: &Value) -> FlickerResult<Self> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| FlickerError::message("missing \"type\""))?;
        serde_json::from_value(value.clone())
            .map_err(|e| FlickerError::message(format!("{kind}: {e}")))
    }
}

pub fn site_label(hostname: Option<&str>) -> &str {
    match hostname {
        Some(h) if !h.is_empty() => h,
        _ => SITE_LABEL_FALLBACK,
    }
}
