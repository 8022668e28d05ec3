//! Loading raw piece dimensions from disk.
//!
//! Two layouts are accepted. JSON:
//!
//! ```text
//! { "widths": [800, 400], "heights": [600, 300] }
//! ```
//!
//! or plain assignment lines, which may span several lines and carry `#`
//! comments:
//!
//! ```text
//! widths = [800, 400]
//! heights = [600,
//!            300]
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Dimensions {
    pub widths: Vec<u32>,
    pub heights: Vec<u32>,
}

pub fn load(path: &Path) -> Result<Dimensions> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::Input(format!("cannot read {}: {e}", path.display())))?;
    parse(&text)
}

pub fn parse(text: &str) -> Result<Dimensions> {
    if text.trim_start().starts_with('{') {
        return serde_json::from_str(text).map_err(|e| Error::Input(format!("invalid JSON: {e}")));
    }

    let body: String = text
        .lines()
        .map(|line| line.split('#').next().unwrap_or(""))
        .collect::<Vec<_>>()
        .join(" ");

    Ok(Dimensions {
        widths: parse_list(&body, "widths")?,
        heights: parse_list(&body, "heights")?,
    })
}

/// Finds `name = [a, b, ...]` in `body` and parses the bracketed values.
fn parse_list(body: &str, name: &str) -> Result<Vec<u32>> {
    for (idx, _) in body.match_indices(name) {
        let preceded_by_ident = body[..idx]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric() || c == '_');
        if preceded_by_ident {
            continue;
        }

        let Some(rest) = body[idx + name.len()..].trim_start().strip_prefix('=') else {
            continue;
        };
        let Some(rest) = rest.trim_start().strip_prefix('[') else {
            return Err(Error::Input(format!("expected '[' after '{name} ='")));
        };
        let Some(end) = rest.find(']') else {
            return Err(Error::Input(format!("unterminated list for '{name}'")));
        };

        return rest[..end]
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| {
                v.parse::<u32>()
                    .map_err(|_| Error::Input(format!("invalid value '{v}' in '{name}'")))
            })
            .collect();
    }

    Err(Error::Input(format!("missing '{name} = [...]'")))
}
