use std::{fs::File, io::Read};

use serde::{Deserialize, Serialize};

use crate::error::Error;

// Settings of the standalone html page, read from a json file.
#[derive(Default, Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Config {
    pub css_href: String,
    pub title: String,
    pub article_class: String,
    // inserted verbatim at the end of <head>
    pub custom_html_head: String,
}

impl Config {
    pub(crate) fn read(path: &str) -> Result<Config, Error> {
        let mut buf = String::new();
        File::open(path)
            .and_then(|mut f| f.read_to_string(&mut buf))
            .map_err(|source| Error::Read {
                path: path.to_string(),
                source,
            })?;

        serde_json::from_str(&buf).map_err(|source| Error::Config {
            path: path.to_string(),
            source,
        })
    }
}
