//! The URL to HTML node and its per-item call loop

use crate::client::{AuthenticatedHttpClient, JsonRequest};
use crate::error::{ConversionError, NodeOperationError, TransportError};
use crate::params::{resolve_request, ParameterResolver};
use crate::types::{ConversionRequest, NodeExecutionData, WaitTill};
use crate::{
    CREDENTIAL_NAME, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_MS, DEFAULT_USER_AGENT,
    DEFAULT_VIEWPORT_HEIGHT, DEFAULT_VIEWPORT_WIDTH, DEFAULT_WAIT_FOR_TIMEOUT_MS, ENDPOINT_PATH,
    NODE_DESCRIPTION, NODE_DISPLAY_NAME, NODE_TYPE,
};
use schemars::schema_for;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};
use url::Url;

/// Identity of the node instance running inside a workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    /// Instance name shown in the workflow
    pub name: String,
    /// Node type name
    pub node_type: String,
}

impl Default for NodeIdentity {
    fn default() -> Self {
        Self {
            name: NODE_DISPLAY_NAME.to_string(),
            node_type: NODE_TYPE.to_string(),
        }
    }
}

/// Everything the host supplies for one execution
pub struct ExecutionContext<'a> {
    /// Input items; only their count and order matter to this node
    pub items: &'a [Value],
    pub parameters: &'a dyn ParameterResolver,
    pub continue_on_fail: bool,
    pub node: NodeIdentity,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(items: &'a [Value], parameters: &'a dyn ParameterResolver) -> Self {
        Self {
            items,
            parameters,
            continue_on_fail: false,
            node: NodeIdentity::default(),
        }
    }

    /// Record failures as data instead of aborting
    pub fn continue_on_fail(mut self, enabled: bool) -> Self {
        self.continue_on_fail = enabled;
        self
    }

    pub fn node(mut self, node: NodeIdentity) -> Self {
        self.node = node;
        self
    }
}

/// Builder for configuring the node
#[derive(Debug, Clone)]
pub struct UrlToHtmlBuilder<C> {
    client: C,
    base_url: Option<String>,
    credential: Option<String>,
}

impl<C: AuthenticatedHttpClient> UrlToHtmlBuilder<C> {
    /// Override the API base URL (default `https://pdfmunk.com/api/v1`)
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Override the credential profile name (default `urlToHtmlApi`)
    pub fn credential(mut self, name: impl Into<String>) -> Self {
        self.credential = Some(name.into());
        self
    }

    /// Build the node
    ///
    /// Fails if the base URL is not an absolute http(s) URL.
    pub fn build(self) -> Result<UrlToHtml<C>, TransportError> {
        let base = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let endpoint = endpoint_url(base)?;

        Ok(UrlToHtml {
            client: self.client,
            endpoint,
            credential: self
                .credential
                .unwrap_or_else(|| CREDENTIAL_NAME.to_string()),
        })
    }
}

/// Join the endpoint path onto `base`, keeping any path prefix it carries
fn endpoint_url(base: &str) -> Result<Url, TransportError> {
    let mut base = Url::parse(base)
        .map_err(|e| TransportError::new(format!("Invalid base URL '{base}': {e}")))?;
    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(TransportError::new(
            "Invalid base URL: must start with http:// or https://",
        ));
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(ENDPOINT_PATH.trim_start_matches('/'))
        .map_err(|e| TransportError::new(format!("Invalid endpoint URL: {e}")))
}

/// The URL to HTML node
#[derive(Debug, Clone)]
pub struct UrlToHtml<C> {
    client: C,
    endpoint: Url,
    credential: String,
}

impl<C: AuthenticatedHttpClient> UrlToHtml<C> {
    /// Create a node builder around a transport
    pub fn builder(client: C) -> UrlToHtmlBuilder<C> {
        UrlToHtmlBuilder {
            client,
            base_url: None,
            credential: None,
        }
    }

    /// Create a node talking to the public API
    pub fn new(client: C) -> Result<Self, TransportError> {
        Self::builder(client).build()
    }

    /// Transport the node posts through
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Full URL requests are posted to
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Node description consumed by the host UI
    pub fn description(&self) -> NodeDescription {
        NodeDescription::new()
    }

    /// Input schema as JSON
    pub fn input_schema(&self) -> Value {
        let schema = schema_for!(ConversionRequest);
        serde_json::to_value(schema).unwrap_or_default()
    }

    /// Convert a single request
    pub async fn convert(&self, request: &ConversionRequest) -> Result<Value, TransportError> {
        let body = serde_json::to_value(request)
            .map_err(|e| TransportError::new(format!("Failed to encode request body: {e}")))?;
        let http_request = JsonRequest::new(self.endpoint.clone(), body);
        self.client.post(&self.credential, http_request).await
    }

    async fn process_item<R>(&self, parameters: &R, index: usize) -> Result<Value, ConversionError>
    where
        R: ParameterResolver + ?Sized,
    {
        let request = resolve_request(parameters, index)?;
        debug!(item = index, url = %request.url, wait_till = %request.wait_till, "Converting URL");
        Ok(self.convert(&request).await?)
    }

    /// Run the node over every input item
    ///
    /// Items are processed in order, one call at a time. With
    /// continue-on-fail the output has one entry per input item; without it
    /// the first failure aborts the run and nothing is returned.
    #[instrument(skip_all, fields(node = %ctx.node.name, items = ctx.items.len()))]
    pub async fn execute(
        &self,
        ctx: &ExecutionContext<'_>,
    ) -> Result<Vec<NodeExecutionData>, NodeOperationError> {
        let mut output = Vec::with_capacity(ctx.items.len());

        for index in 0..ctx.items.len() {
            match self.process_item(ctx.parameters, index).await {
                Ok(response) => output.push(NodeExecutionData::success(index, response)),
                Err(err) if ctx.continue_on_fail => {
                    warn!(item = index, error = %err, "Item failed, continuing");
                    output.push(NodeExecutionData::error(index, err.to_string()));
                }
                Err(err) => {
                    return Err(NodeOperationError {
                        node: ctx.node.name.clone(),
                        node_type: ctx.node.node_type.clone(),
                        item: index,
                        source: err,
                    });
                }
            }
        }

        Ok(output)
    }
}

/// Option of an `options` property
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyOption {
    pub name: String,
    pub value: String,
}

/// One configurable parameter as shown in the host UI
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeProperty {
    pub display_name: &'static str,
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub default: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
    pub description: &'static str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<PropertyOption>,
}

/// Credential profile the node requires
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CredentialRequirement {
    pub name: &'static str,
    pub required: bool,
}

/// Defaults the host applies to every request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDefaults {
    #[serde(rename = "baseURL")]
    pub base_url: &'static str,
    pub headers: Value,
}

/// Declarative description of the node for host UI generation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescription {
    pub display_name: &'static str,
    pub name: &'static str,
    pub group: Vec<&'static str>,
    pub version: u32,
    pub subtitle: &'static str,
    pub description: &'static str,
    pub defaults: Value,
    pub inputs: Vec<&'static str>,
    pub outputs: Vec<&'static str>,
    pub credentials: Vec<CredentialRequirement>,
    pub request_defaults: RequestDefaults,
    pub properties: Vec<NodeProperty>,
}

impl NodeDescription {
    fn new() -> Self {
        Self {
            display_name: NODE_DISPLAY_NAME,
            name: NODE_TYPE,
            group: vec!["transform"],
            version: 1,
            subtitle: "={{$parameter[\"url\"]}}",
            description: NODE_DESCRIPTION,
            defaults: json!({ "name": NODE_DISPLAY_NAME }),
            inputs: vec!["main"],
            outputs: vec!["main"],
            credentials: vec![CredentialRequirement {
                name: CREDENTIAL_NAME,
                required: true,
            }],
            request_defaults: RequestDefaults {
                base_url: DEFAULT_BASE_URL,
                headers: json!({
                    "Accept": "application/json",
                    "Content-Type": "application/json"
                }),
            },
            properties: properties(),
        }
    }

    /// Look up a property by parameter name
    pub fn property(&self, name: &str) -> Option<&NodeProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}

fn properties() -> Vec<NodeProperty> {
    let number = |display_name, name, default: u64, description| NodeProperty {
        display_name,
        name,
        kind: "number",
        default: json!(default),
        placeholder: None,
        description,
        required: false,
        options: Vec::new(),
    };

    vec![
        NodeProperty {
            display_name: "URL",
            name: "url",
            kind: "string",
            default: json!(""),
            placeholder: Some("https://example.com"),
            description: "The URL to extract HTML from",
            required: true,
            options: Vec::new(),
        },
        NodeProperty {
            display_name: "Wait Till",
            name: "wait_till",
            kind: "options",
            default: json!(WaitTill::default().as_str()),
            placeholder: None,
            description: "When to consider the page loaded",
            required: false,
            options: WaitTill::ALL
                .iter()
                .map(|w| PropertyOption {
                    name: w.display_name().to_string(),
                    value: w.as_str().to_string(),
                })
                .collect(),
        },
        number(
            "Timeout(ms)",
            "timeout",
            DEFAULT_TIMEOUT_MS,
            "Maximum time to wait for page load in milliseconds",
        ),
        number(
            "Viewport Width",
            "viewport_width",
            u64::from(DEFAULT_VIEWPORT_WIDTH),
            "Width of the browser viewport in pixels",
        ),
        number(
            "Viewport Height",
            "viewport_height",
            u64::from(DEFAULT_VIEWPORT_HEIGHT),
            "Height of the browser viewport in pixels",
        ),
        number(
            "Wait For Timeout(ms)",
            "wait_for_timeout",
            DEFAULT_WAIT_FOR_TIMEOUT_MS,
            "Additional time to wait after page load in milliseconds",
        ),
        NodeProperty {
            display_name: "User Agent",
            name: "user_agent",
            kind: "string",
            default: json!(DEFAULT_USER_AGENT),
            placeholder: None,
            description: "User agent string to use for the request",
            required: false,
            options: Vec::new(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct NoopClient;

    #[async_trait]
    impl AuthenticatedHttpClient for NoopClient {
        async fn post(&self, _: &str, _: JsonRequest) -> Result<Value, TransportError> {
            Ok(json!({}))
        }
    }

    #[test]
    fn test_default_endpoint() {
        let node = UrlToHtml::new(NoopClient).unwrap();
        assert_eq!(
            node.endpoint().as_str(),
            "https://pdfmunk.com/api/v1/url-to-html"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        assert_eq!(
            endpoint_url("http://127.0.0.1:8080").unwrap().as_str(),
            "http://127.0.0.1:8080/url-to-html"
        );
        assert_eq!(
            endpoint_url("https://proxy.test/pdfmunk/api/v1/").unwrap().as_str(),
            "https://proxy.test/pdfmunk/api/v1/url-to-html"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(endpoint_url("not a url").is_err());
        assert!(endpoint_url("ftp://pdfmunk.com/api/v1").is_err());
        assert!(UrlToHtml::builder(NoopClient)
            .base_url("ftp://example.com")
            .build()
            .is_err());
    }

    #[test]
    fn test_description() {
        let node = UrlToHtml::new(NoopClient).unwrap();
        let desc = node.description();

        assert_eq!(desc.name, "urlToHtml");
        assert_eq!(desc.display_name, "URL To HTML");
        assert_eq!(desc.credentials[0].name, "urlToHtmlApi");
        assert!(desc.credentials[0].required);
        assert_eq!(desc.properties.len(), 7);

        let url = desc.property("url").unwrap();
        assert!(url.required);
        assert_eq!(url.placeholder, Some("https://example.com"));

        let wait_till = desc.property("wait_till").unwrap();
        assert_eq!(wait_till.default, json!("load"));
        let values: Vec<_> = wait_till.options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, ["load", "domcontentloaded", "networkidle0"]);

        assert_eq!(desc.property("timeout").unwrap().default, json!(30000));
        assert_eq!(desc.property("viewport_width").unwrap().default, json!(1280));
        assert_eq!(desc.property("viewport_height").unwrap().default, json!(720));
        assert_eq!(desc.property("wait_for_timeout").unwrap().default, json!(2000));
    }

    #[test]
    fn test_description_serialization() {
        let value = serde_json::to_value(NodeDescription::new()).unwrap();
        assert_eq!(value["displayName"], "URL To HTML");
        assert_eq!(value["requestDefaults"]["baseURL"], "https://pdfmunk.com/api/v1");
        assert_eq!(value["properties"][0]["type"], "string");
        assert_eq!(value["properties"][0]["required"], true);
        // required: false is omitted
        assert!(value["properties"][1].get("required").is_none());
    }

    #[test]
    fn test_input_schema() {
        let node = UrlToHtml::new(NoopClient).unwrap();
        let schema = node.input_schema();
        let props = &schema["properties"];
        for name in [
            "url",
            "wait_till",
            "timeout",
            "viewport_width",
            "viewport_height",
            "wait_for_timeout",
            "user_agent",
        ] {
            assert!(props.get(name).is_some(), "missing {name}");
        }
        assert_eq!(schema["required"], json!(["url"]));
    }

    #[tokio::test]
    async fn test_empty_input_produces_empty_output() {
        let node = UrlToHtml::new(NoopClient).unwrap();
        let params = crate::params::StaticParameters::new();
        let ctx = ExecutionContext::new(&[], &params);
        assert!(node.execute(&ctx).await.unwrap().is_empty());
    }
}
