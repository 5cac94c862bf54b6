//! URL to HTML - workflow node for the PDFMunk rendering API
//!
//! The node takes a URL and browser rendering options for each input item,
//! asks the remote service to render the page, and returns the service's
//! JSON response as workflow data.
//!
//! ## Host interfaces
//!
//! The surrounding workflow host supplies:
//! - input items and a [`ParameterResolver`] keyed by `(name, item index)`
//! - an [`AuthenticatedHttpClient`] that injects credentials for a named profile
//! - a continue-on-fail flag and the node's [`NodeIdentity`]
//!
//! [`HttpClient`] and [`StaticParameters`] are ready-made implementations for
//! running the node outside a host.

pub mod client;
mod error;
mod node;
pub mod params;
mod types;

pub use client::{AuthenticatedHttpClient, Credential, HttpClient, HttpClientBuilder, JsonRequest};
pub use error::{ConversionError, NodeOperationError, ParameterError, TransportError};
pub use node::{
    CredentialRequirement, ExecutionContext, NodeDescription, NodeIdentity, NodeProperty,
    PropertyOption, RequestDefaults, UrlToHtml, UrlToHtmlBuilder,
};
pub use params::{resolve_request, ParameterResolver, StaticParameters};
pub use types::{ConversionRequest, NodeExecutionData, PairedItem, WaitTill};

/// Base URL of the conversion API
pub const DEFAULT_BASE_URL: &str = "https://pdfmunk.com/api/v1";

/// Conversion endpoint, relative to the base URL
pub const ENDPOINT_PATH: &str = "/url-to-html";

/// Credential profile the node authenticates with
pub const CREDENTIAL_NAME: &str = "urlToHtmlApi";

/// Node type name
pub const NODE_TYPE: &str = "urlToHtml";

/// Node display name
pub const NODE_DISPLAY_NAME: &str = "URL To HTML";

/// Node description shown in the host UI
pub const NODE_DESCRIPTION: &str = "Extract HTML content from URLs/websites";

/// User agent the renderer presents unless overridden
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// User-Agent of the HTTP client talking to the API
pub const CLIENT_USER_AGENT: &str = concat!("urltohtml/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1280;
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 720;
pub const DEFAULT_WAIT_FOR_TIMEOUT_MS: u64 = 2_000;

/// Extended documentation (llmtxt)
pub const NODE_LLMTXT: &str = r#"# URL To HTML

Renders a web page in a headless browser via the PDFMunk API and returns the HTML.

## Parameters
- `url` (required): The URL to extract HTML from
- `wait_till` (optional): load | domcontentloaded | networkidle0 (default: load)
- `timeout` (optional): Maximum time to wait for page load in ms (default: 30000)
- `viewport_width` (optional): Browser viewport width in px (default: 1280)
- `viewport_height` (optional): Browser viewport height in px (default: 720)
- `wait_for_timeout` (optional): Extra wait after load in ms (default: 2000)
- `user_agent` (optional): User agent string for the page request

## Output
One item per input item:
- success: `{"json": <API response>, "pairedItem": {"item": i}}`
- failure with continue-on-fail: `{"json": {"error": "<message>"}, "pairedItem": {"item": i}}`

Without continue-on-fail the first failure aborts the run.

## Authentication
The API key is sent in the `CLIENT-API-KEY` header.
"#;
