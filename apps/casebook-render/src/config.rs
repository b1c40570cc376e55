//! Configuration for casebook rendering

use serde::Deserialize;
use std::env;
use thiserror::Error;

use crate::render::FootnoteMarks;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    pub render: RenderConfig,
    pub pagination: PaginationConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RenderConfig {
    /// `id` of the element holding the annotatable content
    pub content_id: String,
    /// `id` of the element the laid-out content goes into
    pub output_id: String,
    /// Class of the `<select>` used to jump between pages
    pub page_selector_class: String,
    pub footnote_marks: FootnoteMarks,
    /// Ignore the page's pagination flag and always lay out flat
    #[serde(default)]
    pub force_flat: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaginationConfig {
    pub chars_per_page: usize,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

impl Default for Config {
    fn default() -> Self {
        Config {
            render: RenderConfig {
                content_id: "print-source".to_string(),
                output_id: "print-output".to_string(),
                page_selector_class: "page-selector".to_string(),
                footnote_marks: FootnoteMarks::Asterisks,
                force_flat: false,
            },
            pagination: PaginationConfig {
                chars_per_page: 3000,
            },
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Config::default().render
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any variable source; unset or blank variables keep defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let footnote_marks = match var("CASEBOOK_FOOTNOTE_MARKS") {
            Some(value) => value.parse().map_err(|reason| ConfigError::InvalidValue {
                name: "CASEBOOK_FOOTNOTE_MARKS",
                value: value.clone(),
                reason,
            })?,
            None => defaults.render.footnote_marks,
        };

        let chars_per_page = match var("CASEBOOK_CHARS_PER_PAGE") {
            Some(value) => match value.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: "CASEBOOK_CHARS_PER_PAGE",
                        value,
                        reason: "expected a positive integer".to_string(),
                    })
                }
            },
            None => defaults.pagination.chars_per_page,
        };

        Ok(Config {
            render: RenderConfig {
                content_id: var("CASEBOOK_CONTENT_ID").unwrap_or(defaults.render.content_id),
                output_id: var("CASEBOOK_OUTPUT_ID").unwrap_or(defaults.render.output_id),
                page_selector_class: var("CASEBOOK_PAGE_SELECTOR")
                    .unwrap_or(defaults.render.page_selector_class),
                footnote_marks,
                force_flat: defaults.render.force_flat,
            },
            pagination: PaginationConfig { chars_per_page },
        })
    }
}
