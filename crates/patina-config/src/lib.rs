//! Interpreter options.
//!
//! Every historically compat-flag-gated behavior is an explicit switch here
//! with its default documented on the field. Options load from `patina.toml`
//! (working directory first, then the platform config dir); unknown fields
//! are ignored so configs can carry keys for newer versions.

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::info;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Options {
    /// Columns per tab stop.
    pub tabstop: usize,
    /// Columns per shift (`<`/`>`) unit.
    pub shiftwidth: usize,
    /// Round shifts to the nearest shiftwidth boundary instead of adding.
    pub shift_round: bool,
    /// Insert spaces instead of tabs when building indent.
    pub expand_tab: bool,
    /// Report "N lines ..." messages only above this many affected lines.
    pub report: usize,
    /// Reject zero-width delete/yank/change ranges with a bell (strict-Vi
    /// compatibility). Default off: empty ranges are quietly no-ops.
    pub strict_empty_region: bool,
    /// Promote an end-exclusive char-wise motion that lands in column 0 to
    /// line-wise (retracting one line) when the start sits at or before the
    /// first non-blank. Default on, matching historical behavior.
    pub promote_charwise: bool,
    /// Exclusive selection: a char-wise visual range drops its final
    /// position unless already at end-of-line.
    pub selection_exclusive: bool,
    /// Two spaces after sentence-ending punctuation when joining.
    pub join_sentence_space: bool,
    /// Line-wise change keeps the leading indent of the first line.
    pub autoindent: bool,
    /// Allow the cursor (and block edges) past end-of-line.
    pub virtual_edit: bool,
    /// Join strips the second line's leader when both lines carry the same
    /// one of these.
    pub comment_leaders: Vec<String>,
    /// Mirror '*'/'+' through the external clipboard service. When off (or
    /// the service is absent) those names fall back to the unnamed register.
    pub clipboard: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            tabstop: 8,
            shiftwidth: 8,
            shift_round: false,
            expand_tab: false,
            report: 2,
            strict_empty_region: false,
            promote_charwise: true,
            selection_exclusive: false,
            join_sentence_space: false,
            autoindent: false,
            virtual_edit: false,
            comment_leaders: ["//", "#", "*", "--"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            clipboard: false,
        }
    }
}

impl Options {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Effective shift unit; a zero shiftwidth falls back to tabstop.
    pub fn shift_unit(&self) -> usize {
        if self.shiftwidth == 0 {
            self.tabstop.max(1)
        } else {
            self.shiftwidth
        }
    }
}

/// Config path following platform conventions: working-directory
/// `patina.toml` first, then the platform config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("patina.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("patina").join("patina.toml");
    }
    PathBuf::from("patina.toml")
}

/// Load options, falling back to defaults when the file is missing or does
/// not parse. A parse failure is logged, not fatal.
pub fn load_from(path: Option<PathBuf>) -> Options {
    let path = path.unwrap_or_else(discover);
    match fs::read_to_string(&path) {
        Ok(content) => match Options::from_toml_str(&content) {
            Ok(opts) => {
                info!(target: "config", path = %path.display(), "options_loaded");
                opts
            }
            Err(err) => {
                info!(target: "config", path = %path.display(), %err, "options_parse_failed_using_defaults");
                Options::default()
            }
        },
        Err(_) => Options::default(),
    }
}
