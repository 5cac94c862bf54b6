//! Per-item parameter resolution
//!
//! The host exposes node parameters as loosely typed JSON keyed by
//! `(name, item index)`. [`resolve_request`] turns them into a typed
//! [`ConversionRequest`], filling in defaults for absent options.

use crate::error::ParameterError;
use crate::types::{ConversionRequest, WaitTill};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::str::FromStr;

/// Parameter names understood by the node
pub mod names {
    pub const URL: &str = "url";
    pub const WAIT_TILL: &str = "wait_till";
    pub const TIMEOUT: &str = "timeout";
    pub const VIEWPORT_WIDTH: &str = "viewport_width";
    pub const VIEWPORT_HEIGHT: &str = "viewport_height";
    pub const WAIT_FOR_TIMEOUT: &str = "wait_for_timeout";
    pub const USER_AGENT: &str = "user_agent";
}

/// Source of node parameter values
///
/// Returns `None` when the parameter is not set for the item, in which case
/// the node falls back to the parameter's default.
pub trait ParameterResolver: Send + Sync {
    fn parameter(&self, name: &str, index: usize) -> Option<Value>;
}

impl<F> ParameterResolver for F
where
    F: Fn(&str, usize) -> Option<Value> + Send + Sync,
{
    fn parameter(&self, name: &str, index: usize) -> Option<Value> {
        self(name, index)
    }
}

/// Build the request for item `index`
pub fn resolve_request<R>(resolver: &R, index: usize) -> Result<ConversionRequest, ParameterError>
where
    R: ParameterResolver + ?Sized,
{
    let url = match resolver.parameter(names::URL, index) {
        Some(value) => as_string(names::URL, value)?,
        None => return Err(ParameterError::Missing { name: names::URL }),
    };

    let mut request = ConversionRequest::new(url);

    if let Some(value) = resolver.parameter(names::WAIT_TILL, index) {
        let raw = as_string(names::WAIT_TILL, value)?;
        request.wait_till = WaitTill::from_str(&raw).map_err(ParameterError::InvalidWaitTill)?;
    }
    if let Some(value) = resolver.parameter(names::TIMEOUT, index) {
        request.timeout = as_u64(names::TIMEOUT, &value)?;
    }
    if let Some(value) = resolver.parameter(names::VIEWPORT_WIDTH, index) {
        request.viewport_width = as_u32(names::VIEWPORT_WIDTH, &value)?;
    }
    if let Some(value) = resolver.parameter(names::VIEWPORT_HEIGHT, index) {
        request.viewport_height = as_u32(names::VIEWPORT_HEIGHT, &value)?;
    }
    if let Some(value) = resolver.parameter(names::WAIT_FOR_TIMEOUT, index) {
        request.wait_for_timeout = as_u64(names::WAIT_FOR_TIMEOUT, &value)?;
    }
    if let Some(value) = resolver.parameter(names::USER_AGENT, index) {
        request.user_agent = as_string(names::USER_AGENT, value)?;
    }

    Ok(request)
}

fn as_string(name: &'static str, value: Value) -> Result<String, ParameterError> {
    match value {
        Value::String(s) => Ok(s),
        _ => Err(ParameterError::Invalid {
            name,
            expected: "a string",
        }),
    }
}

fn as_u64(name: &'static str, value: &Value) -> Result<u64, ParameterError> {
    let invalid = ParameterError::Invalid {
        name,
        expected: "a non-negative integer",
    };
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    // Hosts that store numbers as floats send `30000.0`
    match value.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f < u64::MAX as f64 => Ok(f as u64),
        _ => Err(invalid),
    }
}

fn as_u32(name: &'static str, value: &Value) -> Result<u32, ParameterError> {
    let n = as_u64(name, value)?;
    u32::try_from(n).map_err(|_| ParameterError::Invalid {
        name,
        expected: "an integer no larger than 4294967295",
    })
}

/// In-memory parameters: node-level values plus per-item overrides
#[derive(Debug, Clone, Default)]
pub struct StaticParameters {
    node: HashMap<String, Value>,
    items: HashMap<usize, Map<String, Value>>,
}

impl StaticParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value used for every item
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.node.insert(name.into(), value.into());
        self
    }

    /// Set a value for one item only
    pub fn set_for_item(
        mut self,
        index: usize,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.items
            .entry(index)
            .or_default()
            .insert(name.into(), value.into());
        self
    }

    /// One item per URL, each overriding `url`
    pub fn with_urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for (index, url) in urls.into_iter().enumerate() {
            self = self.set_for_item(index, names::URL, url.into());
        }
        self
    }
}

impl ParameterResolver for StaticParameters {
    fn parameter(&self, name: &str, index: usize) -> Option<Value> {
        self.items
            .get(&index)
            .and_then(|overrides| overrides.get(name))
            .or_else(|| self.node.get(name))
            .cloned()
    }
}
