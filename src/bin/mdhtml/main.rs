mod config;
mod error;
mod gen;
mod render_html;

use std::process::ExitCode;

use clap::{arg, Command};
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::gen::proc_gen;

fn main() -> ExitCode {
    let matches = cli().get_matches();

    // --verbose enables DEBUG level, otherwise use RUST_LOG or default to WARN.
    // Logs go to stderr so that stdout only carries html.
    let filter = if matches.get_flag("verbose") {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match proc_gen(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

pub(crate) fn cli() -> Command {
    Command::new("mdhtml")
        .version("0.1")
        .about("Convert a markdown file into html")
        .arg(arg!(<MARKDOWN_FILE_PATH> "Specify the path of the markdown file."))
        .arg(
            arg!(-o --output <OUTPUT_HTML_PATH> "Specify the path of the output html file, print to stdout if not set.")
                .required(false),
        )
        .arg(arg!(-s --standalone "Wrap the html in a complete page."))
        .arg(
            arg!(-c --"config-path" <CONFIG_PATH> "Specify path of the config file for standalone pages, it's optional.")
                .required(false),
        )
        .arg(arg!(--verbose "Print debug logs to stderr."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli() {
        cli().debug_assert();

        let m = cli().get_matches_from(vec!["mdhtml", "-s", "-c", "cfg.json", "a.md"]);
        assert!(m.get_flag("standalone"));
        assert!(!m.get_flag("verbose"));
        assert_eq!(m.get_one::<String>("config-path").map(String::as_str), Some("cfg.json"));
        assert_eq!(m.get_one::<String>("MARKDOWN_FILE_PATH").map(String::as_str), Some("a.md"));
        assert_eq!(m.get_one::<String>("output"), None);

        assert!(cli().try_get_matches_from(vec!["mdhtml"]).is_err());
    }

    #[test]
    fn test_cli_option_values() {
        let m = cli().get_matches_from(vec!["mdhtml", "a.md", "-o", "out.html"]);
        assert_eq!(m.get_one::<String>("output").map(String::as_str), Some("out.html"));

        // a flag given without its value is an error, not a fallback to stdout
        assert!(cli().try_get_matches_from(vec!["mdhtml", "a.md", "-o"]).is_err());
        assert!(cli().try_get_matches_from(vec!["mdhtml", "-s", "a.md", "-c"]).is_err());
    }
}
