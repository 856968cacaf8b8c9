use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use clap::ArgMatches;
use tracing::{debug, info, warn};

use crate::{config::Config, error::Error, render_html::RenderHtml};

pub(crate) fn proc_gen(matches: &ArgMatches) -> Result<(), Error> {
    // read markdown file path from cli
    let md_path = matches
        .get_one::<String>("MARKDOWN_FILE_PATH")
        .map(String::as_str)
        .unwrap_or_default();

    let input = fs::read_to_string(md_path).map_err(|source| Error::Read {
        path: md_path.to_string(),
        source,
    })?;
    debug!(path = md_path, bytes = input.len(), "read markdown file");

    // start to convert the markdown into html
    let body = mdhtml::to_html(&input);
    let config_path = matches.get_one::<String>("config-path");
    let html = if matches.get_flag("standalone") {
        let cfg = match config_path {
            Some(path) => Config::read(path)?,
            None => Config::default(),
        };
        let title = page_title(&cfg, md_path);
        RenderHtml::new()?.exec(&cfg, &title, &body)?
    } else {
        if config_path.is_some() {
            warn!("the config file only applies to standalone pages, ignored");
        }
        body
    };

    // output the html
    match matches.get_one::<String>("output") {
        Some(path) => {
            File::options()
                .write(true)
                .truncate(true)
                .create(true)
                .open(path)
                .and_then(|mut out| out.write_all(html.as_bytes()))
                .map_err(|source| Error::Write {
                    path: path.to_string(),
                    source,
                })?;
            info!(path = path.as_str(), bytes = html.len(), "wrote html file");
        }
        None => io::stdout()
            .write_all(html.as_bytes())
            .map_err(|source| Error::Write {
                path: "<stdout>".to_string(),
                source,
            })?,
    }
    Ok(())
}

// The configured title, or the name of the markdown file without extension.
fn page_title(cfg: &Config, md_path: &str) -> String {
    if !cfg.title.is_empty() {
        return cfg.title.clone();
    }
    Path::new(md_path)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "mdhtml".to_string())
}
