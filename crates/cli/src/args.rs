use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "hyperaction")]
#[command(about = "Browse and invoke hypermedia APIs from the command line")]
#[command(version)]
pub struct Args {
    /// Base URL that relative link URLs are resolved against
    #[arg(long, env = "HYPERACTION_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Extra request header as `Name: value` (repeatable; repeated names keep every value)
    #[arg(short = 'H', long = "header", env = "HYPERACTION_HEADER", global = true, value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Token sent as `Authorization: <scheme> <token>`
    #[arg(long, env = "HYPERACTION_TOKEN", global = true, conflicts_with = "basic")]
    pub token: Option<String>,

    /// Authorization scheme used with --token
    #[arg(long, env = "HYPERACTION_TOKEN_SCHEME", global = true, default_value = "Bearer")]
    pub token_scheme: String,

    /// Basic credentials as `username:password`
    #[arg(long, env = "HYPERACTION_BASIC", global = true, value_name = "USER:PASSWORD")]
    pub basic: Option<String>,

    /// CSRF token for session-authenticated APIs
    #[arg(long, env = "HYPERACTION_CSRF_TOKEN", global = true)]
    pub csrf_token: Option<String>,

    /// Print request and response status lines to stderr
    #[arg(short, long, env = "HYPERACTION_VERBOSE", global = true)]
    pub verbose: bool,

    /// Log output format
    #[arg(long, value_enum, env = "HYPERACTION_LOG_FORMAT", global = true, default_value_t = LogFormat::Human)]
    pub log_format: LogFormat,

    /// OTLP collector endpoint; spans are exported when set
    #[arg(long, env = "HYPERACTION_OTLP_ENDPOINT", global = true)]
    pub otlp_endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch a URL and print the decoded response
    Get {
        url: String,
    },

    /// Fetch a schema, then invoke the link at a dotted key path
    Action {
        /// URL of the schema document
        schema_url: String,

        /// Dotted key path to the link, e.g. `users.list`
        keys: String,

        /// Parameter as `name=value`, converted by the field's declared type (repeatable)
        #[arg(short = 'p', long = "param", value_name = "NAME=VALUE", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Human,
    Json,
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.to_owned(), value.to_owned()))
        .ok_or_else(|| format!("expected NAME=VALUE, got {raw:?}"))
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    raw.split_once(':')
        .map(|(name, value)| (name.trim().to_owned(), value.trim().to_owned()))
        .ok_or_else(|| format!("expected 'Name: value', got {raw:?}"))
}
