//! Command-line interface for opende.
//!
//! Positional `<category> <action> [setting] [value]`; the registry does all
//! validation, this module only decides which entry point to call.

use clap::{CommandFactory, Parser};

/// opende - desktop preferences for the compositor, panel and input devices
#[derive(Parser, Debug)]
#[command(name = "opende")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Examples:\n  opende status\n  opende effects enable shadows\n  opende effects set transparency 85\n  opende panel set position bottom\n  sudo opende input set mouse-accel low\n  opende config")]
pub struct Cli {
    /// Category (input, effects, panel), `status` for everything, or `config` for the menu
    #[arg(value_name = "CATEGORY")]
    pub target: Option<String>,

    /// enable, disable, set or status
    #[arg(value_name = "ACTION")]
    pub action: Option<String>,

    /// Setting name within the category
    #[arg(value_name = "SETTING")]
    pub setting: Option<String>,

    /// New value for `set`
    #[arg(value_name = "VALUE", allow_hyphen_values = true)]
    pub value: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,

    /// Disable coloured output
    #[arg(long)]
    pub no_color: bool,

    /// Debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// What the caller asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Usage,
    Menu,
    StatusAll,
    Dispatch {
        category: String,
        action: String,
        setting: Option<String>,
        value: Option<String>,
    },
}

impl Cli {
    pub fn invocation(&self) -> Invocation {
        let Some(target) = self.target.as_deref() else {
            return Invocation::Usage;
        };

        match (target, self.action.as_deref()) {
            ("config", _) => Invocation::Menu,
            ("status", None) => Invocation::StatusAll,
            // `status effects` reads the same as `effects status`
            ("status", Some(category)) => Invocation::Dispatch {
                category: category.to_string(),
                action: "status".to_string(),
                setting: self.setting.clone(),
                value: None,
            },
            (category, action) => Invocation::Dispatch {
                category: category.to_string(),
                action: action.unwrap_or("status").to_string(),
                setting: self.setting.clone(),
                value: self.value.clone(),
            },
        }
    }

    pub fn usage() -> String {
        Self::command().render_help().to_string()
    }
}
