//! Interactive settings menu (`opende config`)
//!
//! Every choice is routed through the registry; failures are printed inline
//! and the loop carries on. EOF or `0` leaves the current screen.

use std::io::{self, BufRead, Write};
use tracing::debug;

use crate::output::{render, OutputStyle};
use crate::registry::{settings_in, Registry, SettingKind};
use crate::types::Category;

pub struct Menu<'r, 'a> {
    registry: &'r Registry<'a>,
    style: OutputStyle,
}

impl<'r, 'a> Menu<'r, 'a> {
    pub fn new(registry: &'r Registry<'a>, style: OutputStyle) -> Self {
        // JSON makes no sense in an interactive session
        Self {
            registry,
            style: OutputStyle { json: false, ..style },
        }
    }

    pub fn run(&self, input: &mut impl BufRead, out: &mut impl Write) -> io::Result<()> {
        loop {
            writeln!(out)?;
            self.style.header(out, "OpenDE Settings")?;
            for (i, category) in Category::ALL.iter().enumerate() {
                writeln!(out, "  {}) {}", i + 1, category.title())?;
            }
            writeln!(out, "  0) Exit")?;

            let Some(choice) = prompt(input, out, "Choice: ")? else {
                return Ok(());
            };
            match choice.as_str() {
                "0" | "q" => return Ok(()),
                other => match pick(other, Category::ALL.len()) {
                    Some(i) => self.category_screen(Category::ALL[i], input, out)?,
                    None => self.style.error(out, &format!("invalid choice '{other}'"))?,
                },
            }
        }
    }

    /// Returns when the user goes back or input ends
    fn category_screen(&self, category: Category, input: &mut impl BufRead, out: &mut impl Write) -> io::Result<()> {
        debug!(category = category.name(), "Opened menu screen");
        let descriptors: Vec<_> = settings_in(category).collect();

        loop {
            let section = self.registry.section(category);
            writeln!(out)?;
            self.style.header(out, section.title)?;
            for (i, row) in section.rows.iter().enumerate() {
                write!(out, "{:>3})", i + 1)?;
                self.style.setting(out, row)?;
            }
            writeln!(out, "  0) Back")?;

            let Some(choice) = prompt(input, out, "Choice: ")? else {
                return Ok(());
            };
            if choice == "0" || choice == "b" {
                return Ok(());
            }
            let Some(i) = pick(&choice, descriptors.len()) else {
                self.style.error(out, &format!("invalid choice '{choice}'"))?;
                continue;
            };

            let desc = descriptors[i];
            let outcome = match desc.kind {
                SettingKind::Percentage | SettingKind::Choice(_) => {
                    let label = format!("New {} ({}): ", desc.name, desc.kind.expected());
                    let Some(value) = prompt(input, out, &label)? else {
                        return Ok(());
                    };
                    if value.is_empty() {
                        continue;
                    }
                    self.registry.dispatch(category.name(), "set", Some(desc.name), Some(&value))
                }
                SettingKind::Toggle | SettingKind::Daemon | SettingKind::Composite => {
                    let action = if section.rows[i].value.is_active() { "disable" } else { "enable" };
                    self.registry.dispatch(category.name(), action, Some(desc.name), None)
                }
            };
            render(out, self.style, &outcome)?;
        }
    }
}

/// Print `label`, read one trimmed line; `None` on EOF
fn prompt(input: &mut impl BufRead, out: &mut impl Write, label: &str) -> io::Result<Option<String>> {
    write!(out, "{label}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// 1-based menu number to index
fn pick(choice: &str, len: usize) -> Option<usize> {
    match choice.parse::<usize>() {
        Ok(n) if (1..=len).contains(&n) => Some(n - 1),
        _ => None,
    }
}
