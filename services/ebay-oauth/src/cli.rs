//! Command-line parsing
//!
//! `ebay-oauth [--config PATH] <command> [ARG]`, kept dependency-free like the
//! rest of the binary's flag handling.

use anyhow::{Result, bail};

pub const USAGE: &str = "\
usage: ebay-oauth [--config PATH] <command>

commands:
  run                   ensure a valid access token (refresh or full authorization)
  url [STATE]           print the consent URL to open in a browser
  complete REDIRECT_URL finish authorization from the URL eBay redirected to
  token                 print a valid access token, refreshing if needed
  headers               print API request headers
  status                show what is stored
  clear                 delete stored tokens and authorization code";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run,
    Url { state: Option<String> },
    Complete { redirect_url: String },
    Token,
    Headers,
    Status,
    Clear,
}

impl Command {
    /// Whether the command needs client settings, not just the token store.
    pub fn needs_client(&self) -> bool {
        !matches!(self, Command::Status | Command::Clear)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Args {
    pub config_path: Option<String>,
    pub command: Command,
}

/// Parse arguments, excluding the program name.
pub fn parse(args: &[String]) -> Result<Args> {
    let mut config_path = None;
    let mut positional = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => match iter.next() {
                Some(path) => config_path = Some(path.clone()),
                None => bail!("--config needs a path\n\n{USAGE}"),
            },
            "-h" | "--help" => bail!("{USAGE}"),
            _ => positional.push(arg.as_str()),
        }
    }

    let command = match positional.as_slice() {
        ["run"] => Command::Run,
        ["url"] => Command::Url { state: None },
        ["url", state] => Command::Url {
            state: Some((*state).to_owned()),
        },
        ["complete", redirect_url] => Command::Complete {
            redirect_url: (*redirect_url).to_owned(),
        },
        ["token"] => Command::Token,
        ["headers"] => Command::Headers,
        ["status"] => Command::Status,
        ["clear"] => Command::Clear,
        [] => bail!("missing command\n\n{USAGE}"),
        other => bail!("unrecognized command: {}\n\n{USAGE}", other.join(" ")),
    };

    Ok(Args {
        config_path,
        command,
    })
}
