//! Core types for the URL to HTML node

use crate::{
    DEFAULT_TIMEOUT_MS, DEFAULT_USER_AGENT, DEFAULT_VIEWPORT_HEIGHT, DEFAULT_VIEWPORT_WIDTH,
    DEFAULT_WAIT_FOR_TIMEOUT_MS,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;

/// Page lifecycle event the renderer waits for before capturing HTML
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum WaitTill {
    /// `load` event fired
    #[default]
    Load,
    /// `DOMContentLoaded` event fired
    #[serde(rename = "domcontentloaded")]
    DomContentLoaded,
    /// No network connections for at least 500 ms
    #[serde(rename = "networkidle0")]
    NetworkIdle0,
}

impl WaitTill {
    /// All variants in the order they are offered to users
    pub const ALL: [WaitTill; 3] = [
        WaitTill::Load,
        WaitTill::DomContentLoaded,
        WaitTill::NetworkIdle0,
    ];

    /// Wire value sent to the conversion API
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitTill::Load => "load",
            WaitTill::DomContentLoaded => "domcontentloaded",
            WaitTill::NetworkIdle0 => "networkidle0",
        }
    }

    /// Human readable label
    pub fn display_name(&self) -> &'static str {
        match self {
            WaitTill::Load => "Load",
            WaitTill::DomContentLoaded => "DOM Content Loaded",
            WaitTill::NetworkIdle0 => "Network Idle",
        }
    }
}

impl FromStr for WaitTill {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "load" => Ok(WaitTill::Load),
            "domcontentloaded" => Ok(WaitTill::DomContentLoaded),
            "networkidle0" => Ok(WaitTill::NetworkIdle0),
            _ => Err(format!(
                "'{s}' is not one of load, domcontentloaded, networkidle0"
            )),
        }
    }
}

impl std::fmt::Display for WaitTill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request body sent to the `url-to-html` endpoint
///
/// Every field is always serialized, including those left at their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ConversionRequest {
    /// The URL to render (required)
    pub url: String,

    /// When to consider the page loaded
    #[serde(default)]
    pub wait_till: WaitTill,

    /// Maximum time to wait for page load in milliseconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Width of the browser viewport in pixels
    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    /// Height of the browser viewport in pixels
    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,

    /// Additional time to wait after page load in milliseconds
    #[serde(default = "default_wait_for_timeout")]
    pub wait_for_timeout: u64,

    /// User agent string the renderer presents
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_viewport_width() -> u32 {
    DEFAULT_VIEWPORT_WIDTH
}

fn default_viewport_height() -> u32 {
    DEFAULT_VIEWPORT_HEIGHT
}

fn default_wait_for_timeout() -> u64 {
    DEFAULT_WAIT_FOR_TIMEOUT_MS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl ConversionRequest {
    /// Create a request for the given URL with every option at its default
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            wait_till: WaitTill::default(),
            timeout: DEFAULT_TIMEOUT_MS,
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            wait_for_timeout: DEFAULT_WAIT_FOR_TIMEOUT_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Set the load event to wait for
    pub fn wait_till(mut self, wait_till: WaitTill) -> Self {
        self.wait_till = wait_till;
        self
    }

    /// Set the page load timeout in milliseconds
    pub fn timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout = timeout_ms;
        self
    }

    /// Set the viewport size in pixels
    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set the extra wait after load in milliseconds
    pub fn wait_for_timeout(mut self, wait_ms: u64) -> Self {
        self.wait_for_timeout = wait_ms;
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Link from an output item back to the input item that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairedItem {
    pub item: usize,
}

/// One entry of the node's output list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeExecutionData {
    /// Response payload, or `{"error": message}` for a recorded failure
    pub json: Value,

    #[serde(rename = "pairedItem")]
    pub paired_item: PairedItem,
}

impl NodeExecutionData {
    /// Wrap a successful API response
    pub fn success(index: usize, response: Value) -> Self {
        Self {
            json: response,
            paired_item: PairedItem { item: index },
        }
    }

    /// Record a failure as data
    pub fn error(index: usize, message: impl Into<String>) -> Self {
        Self {
            json: json!({ "error": message.into() }),
            paired_item: PairedItem { item: index },
        }
    }

    /// Error message if this item records a failure
    pub fn error_message(&self) -> Option<&str> {
        self.json.get("error").and_then(Value::as_str)
    }
}
