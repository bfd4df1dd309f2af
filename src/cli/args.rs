use std::ffi::OsString;
use clap::error::ErrorKind;
use clap::Parser;
use crate::cli::response::{self, Outcome};

/// Extract the main article of a web page as JSON.
#[derive(Debug, Parser)]
#[command(name = "clean-news", version)]
struct Cli {
    /// Page to fetch; `host.docker.internal` is rewritten to 127.0.0.1
    url: Option<String>,
}

/// Parses the command line into the optional URL.
///
/// Anything clap rejects comes back as a ready-to-print [`Outcome`]: help and
/// version text with exit code 0, every other error in the argument-error
/// JSON shape with exit code 1.
pub fn parse_args<I, T>(args: I) -> Result<Option<String>, Outcome>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => Ok(cli.url),
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            Err(Outcome {
                line: err.to_string().trim_end().to_string(),
                exit_code: 0,
            })
        }
        Err(err) => {
            let rendered = err.to_string();
            let message = rendered
                .lines()
                .next()
                .unwrap_or_default()
                .trim_start_matches("error: ");
            Err(response::argument_error(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn failed(outcome: Outcome) -> Value {
        assert_eq!(outcome.exit_code, 1);
        let value: Value = serde_json::from_str(&outcome.line).unwrap();
        assert_eq!(value["status"], "failed");
        value
    }

    #[test]
    fn single_positional_is_the_url() {
        let url = parse_args(["clean-news", "https://example.com/a"]).unwrap();
        assert_eq!(url.as_deref(), Some("https://example.com/a"));
    }

    #[test]
    fn no_positional_is_none() {
        assert_eq!(parse_args(["clean-news"]).unwrap(), None);
    }

    #[test]
    fn extra_positional_is_an_argument_error() {
        let value = failed(parse_args(["clean-news", "a", "b"]).unwrap_err());
        assert!(value["error"].as_str().unwrap().contains("unexpected argument"));
    }

    #[test]
    fn unknown_flag_is_an_argument_error() {
        let value = failed(parse_args(["clean-news", "--bogus"]).unwrap_err());
        assert!(value["error"].as_str().unwrap().contains("--bogus"));
    }

    #[test]
    fn help_exits_cleanly() {
        let outcome = parse_args(["clean-news", "--help"]).unwrap_err();
        assert_eq!(outcome.exit_code, 0);
        assert!(outcome.line.contains("Usage"));
    }
}
