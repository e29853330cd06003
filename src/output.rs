//! Console rendering of registry outcomes: tagged text lines or JSON

use console::{style, StyledObject};
use std::io::{self, IsTerminal, Write};

use crate::registry::{Outcome, Report, Row, Section};

/// Decided once at startup and passed down
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputStyle {
    pub color: bool,
    pub json: bool,
}

impl OutputStyle {
    pub fn detect(no_color: bool, json: bool) -> Self {
        let color = !no_color && !json && io::stdout().is_terminal();
        console::set_colors_enabled(color);
        console::set_colors_enabled_stderr(color);
        Self { color, json }
    }

    fn paint(&self, text: StyledObject<&str>) -> String {
        text.force_styling(self.color).to_string()
    }

    pub fn info(&self, out: &mut impl Write, msg: &str) -> io::Result<()> {
        writeln!(out, "{} {msg}", self.paint(style("[INFO]").blue()))
    }

    pub fn ok(&self, out: &mut impl Write, msg: &str) -> io::Result<()> {
        writeln!(out, "{} {msg}", self.paint(style("[OK]").green()))
    }

    pub fn error(&self, out: &mut impl Write, msg: &str) -> io::Result<()> {
        writeln!(out, "{} {msg}", self.paint(style("[ERROR]").red()))
    }

    pub fn header(&self, out: &mut impl Write, title: &str) -> io::Result<()> {
        writeln!(out, "{}", self.paint(style(title).bold()))
    }

    /// `  [ON]  Shadows: enabled`
    pub fn setting(&self, out: &mut impl Write, row: &Row) -> io::Result<()> {
        let marker = if row.value.is_active() {
            self.paint(style("[ON] ").green())
        } else {
            self.paint(style("[OFF]").dim())
        };
        writeln!(out, "  {marker} {}: {}", row.label, row.value)
    }

    fn section(&self, out: &mut impl Write, section: &Section) -> io::Result<()> {
        self.header(out, section.title)?;
        for row in &section.rows {
            self.setting(out, row)?;
        }
        Ok(())
    }
}

/// Write `outcome` the way the style asks for
pub fn render(out: &mut impl Write, style: OutputStyle, outcome: &Outcome) -> io::Result<()> {
    if style.json {
        serde_json::to_writer_pretty(&mut *out, outcome).map_err(io::Error::other)?;
        return writeln!(out);
    }

    match &outcome.report {
        Report::Value { setting, value } => writeln!(out, "{}: {value}", setting.descriptor().label),
        Report::Status { sections } => {
            for (i, section) in sections.iter().enumerate() {
                if i > 0 {
                    writeln!(out)?;
                }
                style.section(out, section)?;
            }
            Ok(())
        }
        Report::Applied { message } => style.ok(out, message),
        Report::Failed { message, available } => {
            style.error(out, message)?;
            if !available.is_empty() {
                style.info(out, &format!("Available settings: {}", available.join(", ")))?;
            }
            Ok(())
        }
    }
}
