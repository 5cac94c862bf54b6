//! URL to HTML CLI - run the node from the command line

use clap::{Parser, Subcommand};
use serde_json::Value;
use std::io::{self, Write};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use urltohtml::{
    ExecutionContext, HttpClient, NodeExecutionData, StaticParameters, UrlToHtml, WaitTill,
    DEFAULT_BASE_URL, DEFAULT_TIMEOUT_MS, DEFAULT_USER_AGENT, DEFAULT_VIEWPORT_HEIGHT,
    DEFAULT_VIEWPORT_WIDTH, DEFAULT_WAIT_FOR_TIMEOUT_MS, NODE_LLMTXT,
};

/// URL to HTML - render web pages to HTML through the PDFMunk API
#[derive(Parser, Debug)]
#[command(name = "urltohtml")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Print full help with examples (llmtxt)
    #[arg(long)]
    llmtxt: bool,

    /// Enable debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert one or more URLs, one item per URL
    Convert(ConvertArgs),
    /// Print the node description as JSON
    Describe,
    /// Print the JSON schema of the conversion request
    Schema,
}

#[derive(clap::Args, Debug)]
struct ConvertArgs {
    /// URLs to render
    #[arg(required = true)]
    urls: Vec<String>,

    /// When to consider the page loaded
    #[arg(long, default_value_t = WaitTill::Load, value_parser = parse_wait_till)]
    wait_till: WaitTill,

    /// Maximum time to wait for page load in milliseconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout: u64,

    /// Width of the browser viewport in pixels
    #[arg(long, default_value_t = DEFAULT_VIEWPORT_WIDTH)]
    viewport_width: u32,

    /// Height of the browser viewport in pixels
    #[arg(long, default_value_t = DEFAULT_VIEWPORT_HEIGHT)]
    viewport_height: u32,

    /// Additional time to wait after page load in milliseconds
    #[arg(long, default_value_t = DEFAULT_WAIT_FOR_TIMEOUT_MS)]
    wait_for_timeout: u64,

    /// User agent the renderer presents
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    /// API key for the conversion service
    #[arg(long, env = "URLTOHTML_API_KEY", hide_env_values = true)]
    api_key: String,

    /// API base URL
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Client-side deadline per call in seconds
    #[arg(long)]
    client_timeout: Option<u64>,

    /// Record failures as output items instead of aborting
    #[arg(long)]
    continue_on_fail: bool,
}

fn parse_wait_till(s: &str) -> Result<WaitTill, String> {
    s.parse()
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    // Handle --llmtxt flag
    if cli.llmtxt {
        writeln_safe(NODE_LLMTXT);
        std::process::exit(0);
    }

    match cli.command {
        Some(Commands::Convert(args)) => run_convert(args).await,
        Some(Commands::Describe) => {
            let description = describe_node();
            print_json(&description);
        }
        Some(Commands::Schema) => match UrlToHtml::new(offline_client()) {
            Ok(node) => print_json(&node.input_schema()),
            Err(e) => fail(&e.to_string()),
        },
        None => {
            eprintln!("Usage: urltohtml convert <URL>...");
            eprintln!("   or: urltohtml describe");
            eprintln!("   or: urltohtml --help");
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "urltohtml=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Client without credentials, for subcommands that never call the API
fn offline_client() -> HttpClient {
    HttpClient::builder()
        .build()
        .unwrap_or_else(|e| fail(&e.to_string()))
}

fn describe_node() -> Value {
    match UrlToHtml::new(offline_client()) {
        Ok(node) => serde_json::to_value(node.description()).unwrap_or_default(),
        Err(e) => fail(&e.to_string()),
    }
}

/// Parameters for the convert subcommand: shared options plus one URL per item
fn build_parameters(args: &ConvertArgs) -> StaticParameters {
    StaticParameters::new()
        .set("wait_till", args.wait_till.as_str())
        .set("timeout", args.timeout)
        .set("viewport_width", args.viewport_width)
        .set("viewport_height", args.viewport_height)
        .set("wait_for_timeout", args.wait_for_timeout)
        .set("user_agent", args.user_agent.as_str())
        .with_urls(args.urls.iter().cloned())
}

async fn run_convert(args: ConvertArgs) {
    let mut builder = HttpClient::builder().api_key(args.api_key.clone());
    if let Some(secs) = args.client_timeout {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    let client = builder.build().unwrap_or_else(|e| fail(&e.to_string()));

    let node = UrlToHtml::builder(client)
        .base_url(args.base_url.clone())
        .build()
        .unwrap_or_else(|e| fail(&e.to_string()));

    let params = build_parameters(&args);
    let items: Vec<Value> = args
        .urls
        .iter()
        .map(|url| serde_json::json!({ "url": url }))
        .collect();
    let ctx = ExecutionContext::new(&items, &params).continue_on_fail(args.continue_on_fail);

    match node.execute(&ctx).await {
        Ok(output) => print_output(&output),
        Err(e) => fail(&e.to_string()),
    }
}

fn print_output(output: &[NodeExecutionData]) {
    print_json(&output);
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    let json = serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        eprintln!("Error serializing output: {}", e);
        std::process::exit(1);
    });
    writeln_safe(&json);
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

/// Write to stdout, exit silently on broken pipe
fn writeln_safe(s: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", s) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        eprintln!("Error writing to stdout: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use urltohtml::{resolve_request, ConversionRequest};

    fn parse(args: &[&str]) -> ConvertArgs {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Some(Commands::Convert(args)) => args,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_convert_defaults() {
        let args = parse(&["urltohtml", "convert", "https://a.test", "--api-key", "k"]);
        let params = build_parameters(&args);

        assert_eq!(
            resolve_request(&params, 0).unwrap(),
            ConversionRequest::new("https://a.test")
        );
        assert!(!args.continue_on_fail);
        assert_eq!(args.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_convert_options() {
        let args = parse(&[
            "urltohtml",
            "convert",
            "https://a.test",
            "https://b.test",
            "--api-key",
            "k",
            "--wait-till",
            "networkidle0",
            "--timeout",
            "1000",
            "--viewport-width",
            "800",
            "--viewport-height",
            "600",
            "--wait-for-timeout",
            "0",
            "--user-agent",
            "X",
            "--continue-on-fail",
        ]);
        let params = build_parameters(&args);

        let second = resolve_request(&params, 1).unwrap();
        assert_eq!(
            second,
            ConversionRequest::new("https://b.test")
                .wait_till(WaitTill::NetworkIdle0)
                .timeout(1000)
                .viewport(800, 600)
                .wait_for_timeout(0)
                .user_agent("X")
        );
        assert!(args.continue_on_fail);
    }

    #[test]
    fn test_convert_rejects_unknown_wait_till() {
        let result = Cli::try_parse_from([
            "urltohtml",
            "convert",
            "https://a.test",
            "--api-key",
            "k",
            "--wait-till",
            "idle",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_describe_output() {
        let description = describe_node();
        assert_eq!(description["name"], "urlToHtml");
        assert_eq!(description["properties"].as_array().unwrap().len(), 7);
    }
}
