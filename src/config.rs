//! Interpreter settings, their presets, and the optional `nbf.toml` file.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use cross_xdg::BaseDirs;

use crate::tape::{CellMode, EdgePolicy, DEFAULT_CAPACITY};
use crate::token::BracketPolicy;

/// Deepest loop nesting the executor will recurse into.
pub const DEFAULT_MAX_NESTING: usize = 1_000;

/// Largest `max_nesting` the config file may ask for.
pub const MAX_NESTING_CEILING: usize = 10_000;

/// Which cell a loop checks before each repetition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopTest {
    /// The cell under the pointer at the moment of the check.
    #[default]
    Pointer,
    /// The cell the pointer was on when the loop was entered, for every check.
    EntryCell,
}

/// What `,` does when the input source has nothing left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EofPolicy {
    /// Fail with [`Error::EmptyInput`](crate::Error::EmptyInput).
    #[default]
    Error,
    /// Store 0 in the current cell.
    Zero,
    /// Leave the current cell as it is.
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub capacity: usize,
    pub cells: CellMode,
    pub loop_test: LoopTest,
    pub edge: EdgePolicy,
    pub brackets: BracketPolicy,
    pub on_eof: EofPolicy,
    /// Treat `[a][b]` as one loop with body `ab`, as a depth-only token stream reads it.
    pub merge_adjacent_loops: bool,
    pub max_nesting: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            cells: CellMode::Byte,
            loop_test: LoopTest::Pointer,
            edge: EdgePolicy::Clamp,
            brackets: BracketPolicy::Strict,
            on_eof: EofPolicy::Error,
            merge_adjacent_loops: false,
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }
}

impl Config {
    /// Reproduces the historical lenient behavior: unbounded cells, loop test
    /// pinned to the entry cell, one-past-the-end pointer, unchecked brackets,
    /// zero on missing input, and merged adjacent loops.
    ///
    /// One divergence remains. A loop that closes at the very end of its
    /// parent's body is still run; the historical engine skipped it, so
    /// `+[>+++[>+<-]]` never finished there.
    pub fn legacy() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            cells: CellMode::Unbounded,
            loop_test: LoopTest::EntryCell,
            edge: EdgePolicy::Overhang,
            brackets: BracketPolicy::Lenient,
            on_eof: EofPolicy::Zero,
            merge_adjacent_loops: true,
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Load from `$NBF_CONFIG`, or `nbf.toml` in the XDG config home, falling
    /// back to defaults when neither can be read.
    pub fn load() -> Self {
        match config_path() {
            Some(path) => match fs::read_to_string(&path) {
                Ok(content) => {
                    log::debug!("loading interpreter config from {}", path.display());
                    Self::from_toml_str(&content)
                }
                Err(e) => {
                    log::debug!("no config at {} ({e}); using defaults", path.display());
                    Self::default()
                }
            },
            None => Self::default(),
        }
    }

    /// Parse the `[interpreter]` section of a small TOML document.
    ///
    /// Only flat `key = value` pairs are understood. Unknown keys and values
    /// that do not parse are logged and skipped.
    pub fn from_toml_str(content: &str) -> Self {
        let map = interpreter_section(content);

        let mut cfg = match map.get("preset").map(String::as_str) {
            Some("legacy") => Self::legacy(),
            Some("default") | None => Self::default(),
            Some(other) => {
                log::warn!("config: unknown preset '{other}', using default");
                Self::default()
            }
        };

        for (key, value) in &map {
            let applied = match key.as_str() {
                "preset" => true,
                "capacity" => value.parse().map(|v| cfg.capacity = v).is_ok(),
                "max_nesting" => value
                    .parse()
                    .ok()
                    .filter(|&v| v <= MAX_NESTING_CEILING)
                    .map(|v| cfg.max_nesting = v)
                    .is_some(),
                "merge_adjacent_loops" => value.parse().map(|v| cfg.merge_adjacent_loops = v).is_ok(),
                "cells" => parse_cells(value).map(|v| cfg.cells = v).is_some(),
                "loop_test" => parse_loop_test(value).map(|v| cfg.loop_test = v).is_some(),
                "edge" => parse_edge(value).map(|v| cfg.edge = v).is_some(),
                "brackets" => parse_brackets(value).map(|v| cfg.brackets = v).is_some(),
                "on_eof" => parse_eof(value).map(|v| cfg.on_eof = v).is_some(),
                _ => {
                    log::warn!("config: ignoring unknown key '{key}'");
                    continue;
                }
            };
            if !applied {
                log::warn!("config: ignoring bad value '{value}' for '{key}'");
            }
        }

        cfg
    }
}

pub fn parse_cells(value: &str) -> Option<CellMode> {
    match value.trim().to_ascii_lowercase().as_str() {
        "byte" | "u8" => Some(CellMode::Byte),
        "unbounded" | "i64" => Some(CellMode::Unbounded),
        _ => None,
    }
}

pub fn parse_loop_test(value: &str) -> Option<LoopTest> {
    match value.trim().to_ascii_lowercase().as_str() {
        "pointer" => Some(LoopTest::Pointer),
        "entry" | "entry_cell" => Some(LoopTest::EntryCell),
        _ => None,
    }
}

pub fn parse_edge(value: &str) -> Option<EdgePolicy> {
    match value.trim().to_ascii_lowercase().as_str() {
        "clamp" => Some(EdgePolicy::Clamp),
        "error" => Some(EdgePolicy::Error),
        "overhang" => Some(EdgePolicy::Overhang),
        _ => None,
    }
}

pub fn parse_brackets(value: &str) -> Option<BracketPolicy> {
    match value.trim().to_ascii_lowercase().as_str() {
        "strict" => Some(BracketPolicy::Strict),
        "lenient" => Some(BracketPolicy::Lenient),
        _ => None,
    }
}

pub fn parse_eof(value: &str) -> Option<EofPolicy> {
    match value.trim().to_ascii_lowercase().as_str() {
        "error" => Some(EofPolicy::Error),
        "zero" => Some(EofPolicy::Zero),
        "unchanged" => Some(EofPolicy::Unchanged),
        _ => None,
    }
}

fn config_path() -> Option<PathBuf> {
    if let Ok(explicit) = env::var("NBF_CONFIG") {
        return Some(PathBuf::from(explicit));
    }

    // On Linux: resolves to /home/<user>/.config
    // On Windows: resolves to C:\Users\<user>\.config
    // On macOS: resolves to /Users/<user>/.config
    let base_dirs = BaseDirs::new().ok()?;
    let mut path = PathBuf::from(base_dirs.config_home());
    path.push("nbf.toml");
    Some(path)
}

/// Collect `key = value` pairs under `[interpreter]`, quotes stripped.
fn interpreter_section(content: &str) -> HashMap<String, String> {
    let mut in_section = false;
    let mut map = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') { continue; }
        if line.starts_with('[') && line.ends_with(']') {
            in_section = &line[1..line.len() - 1] == "interpreter";
            continue;
        }
        if !in_section { continue; }
        if let Some(eq) = line.find('=') {
            let key = line[..eq].trim().to_string();
            let val_raw = line[eq + 1..].trim();
            let val = if val_raw.starts_with('"') && val_raw.ends_with('"') && val_raw.len() >= 2 {
                val_raw[1..val_raw.len() - 1].to_string()
            } else { val_raw.to_string() };
            map.insert(key, val);
        }
    }
    map
}
