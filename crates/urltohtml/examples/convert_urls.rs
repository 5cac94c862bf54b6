//! Example: Render a few URLs through the live API
//!
//! Run with: URLTOHTML_API_KEY=... cargo run -p urltohtml --example convert_urls

use serde_json::{json, Value};
use urltohtml::{ExecutionContext, HttpClient, StaticParameters, UrlToHtml};

const URLS: &[&str] = &[
    "https://example.com",
    "https://httpbin.org/html",
    "not-a-url",
];

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("urltohtml=debug")
        .init();

    let Ok(api_key) = std::env::var("URLTOHTML_API_KEY") else {
        eprintln!("Set URLTOHTML_API_KEY to run this example");
        std::process::exit(1);
    };

    let client = match HttpClient::builder().api_key(api_key).build() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    let node = match UrlToHtml::new(client) {
        Ok(node) => node,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let params = StaticParameters::new()
        .set("wait_till", "networkidle0")
        .with_urls(URLS.iter().copied());
    let items: Vec<Value> = URLS.iter().map(|url| json!({ "url": url })).collect();
    // The last URL is rejected by the API; keep going and show the error item
    let ctx = ExecutionContext::new(&items, &params).continue_on_fail(true);

    match node.execute(&ctx).await {
        Ok(output) => {
            for item in output {
                let url = URLS[item.paired_item.item];
                match item.error_message() {
                    Some(err) => println!("[FAIL] {url}: {err}"),
                    None => {
                        let html_len = item
                            .json
                            .get("html")
                            .and_then(Value::as_str)
                            .map(str::len)
                            .unwrap_or(0);
                        println!("[OK]   {url}: {html_len} bytes of HTML");
                    }
                }
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
