//! `hyperaction` entry point.
//!
//! Composition root: parses flags, wires observability, builds the HTTP
//! transport configuration, and runs one command. Responses are printed to
//! stdout as JSON (documents and links in CoreJSON form). An error response
//! from the API prints its decoded body the same way and exits with status 1.

use std::process::ExitCode;
use std::sync::Arc;

use action_client::Client;
use anyhow::Context;
use clap::Parser;
use http_transport::{
    Authentication, CsrfConfig, HttpTransportConfig, PreparedRequest, RequestObserver,
    ResponseHead,
};
use hypermedia::{lookup_link, parse_params, ActionError, KeyPath, Node};

mod args;
mod telemetry;

use args::{Args, Command};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    let telemetry = telemetry::init(args.log_format, args.otlp_endpoint.as_deref())?;

    let result = run(&args).await;
    telemetry.shutdown();
    result
}

async fn run(args: &Args) -> anyhow::Result<ExitCode> {
    let client = Client::with_http(transport_config(args)?)
        .context("failed to initialise the HTTP transport")?;

    match execute(&client, &args.command).await {
        Ok(node) => {
            print_node(&node)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(ActionError::ErrorMessage { title, content }) => {
            eprintln!("{title}");
            print_node(&content)?;
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(anyhow::Error::new(err).context(err_context(&args.command))),
    }
}

async fn execute(client: &Client, command: &Command) -> Result<Node, ActionError> {
    match command {
        Command::Get { url } => client.get(url).await,
        Command::Action {
            schema_url,
            keys,
            params,
        } => {
            let schema = client.get(schema_url).await?;
            let keys: KeyPath = keys.parse().unwrap_or_else(|never| match never {});
            let link = lookup_link(&schema, &keys)?;
            let params = parse_params(
                link,
                params
                    .iter()
                    .map(|(name, value)| (name.as_str(), value.as_str())),
            )?;
            tracing::info!(%keys, params = params.len(), "Invoking link");
            client.action(&schema, &keys, &params).await
        }
    }
}

fn err_context(command: &Command) -> String {
    match command {
        Command::Get { url } => format!("GET {url} failed"),
        Command::Action { keys, .. } => format!("action {keys} failed"),
    }
}

fn transport_config(args: &Args) -> anyhow::Result<HttpTransportConfig> {
    let mut config = HttpTransportConfig::default();
    for (name, value) in &args.headers {
        config = config.with_header(name, value)?;
    }

    if let Some(base_url) = &args.base_url {
        config = config.with_base_url(base_url)?;
    }

    if let Some(token) = &args.token {
        config = config.with_authentication(Authentication::Token {
            scheme: args.token_scheme.clone(),
            token: token.clone(),
        });
    } else if let Some(basic) = &args.basic {
        let (username, password) = basic
            .split_once(':')
            .context("--basic expects USER:PASSWORD")?;
        config = config.with_authentication(Authentication::Basic {
            username: username.to_owned(),
            password: password.to_owned(),
        });
    }

    if let Some(token) = &args.csrf_token {
        config = config.with_csrf(CsrfConfig::new(token.clone()));
    }

    if args.verbose {
        config = config.with_observer(Arc::new(StatusLinePrinter));
    }
    Ok(config)
}

fn print_node(node: &Node) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(node)?);
    Ok(())
}

/// Echoes `> METHOD url` and `< status` lines to stderr.
struct StatusLinePrinter;

impl RequestObserver for StatusLinePrinter {
    fn on_request_built(&self, request: &PreparedRequest) {
        eprintln!("> {} {}", request.method, request.url);
    }

    fn on_response_received(&self, response: &ResponseHead) {
        eprintln!("< {} ({})", response.status_line(), response.url);
    }
}
