//! Input devices: an Xorg `InputClass` snippet this tool manages, plus live
//! libinput properties reported by `xinput`.
//!
//! The snippet lives in the system Xorg config directory, so writes need
//! root. There is no daemon to notify; the X server reads the snippet at
//! its next start.

use std::process::Command;
use tracing::{debug, info};

use super::{display, unsupported, wrong_value, AppContext, BackendAdapter, SettingValue};
use crate::codec::{self, BoolTokens, Dialect, LineKey, TypedValue, ValueShape};
use crate::config::Access;
use crate::constants::{daemons, keys, xinput};
use crate::error::SettingsResult;
use crate::registry::Setting;
use crate::types::{Backend, DisplayValue};

/// Seed for the managed snippet. Every managed option has a line here, set to
/// the libinput default; the first write overlays live device values.
pub const SNIPPET_TEMPLATE: &str = r#"# Managed by opende. Options in this file are rewritten in place.
Section "InputClass"
    Identifier "opende touchpad"
    MatchIsTouchpad "on"
    Driver "libinput"
    Option "NaturalScrolling" "false"
    Option "Tapping" "false"
EndSection

Section "InputClass"
    Identifier "opende pointer"
    MatchIsPointer "on"
    Driver "libinput"
    Option "AccelProfile" "adaptive"
    Option "AccelSpeed" "0.00"
EndSection
"#;

const NATURAL_SCROLLING: LineKey = LineKey::new(
    keys::NATURAL_SCROLLING,
    Dialect::XorgOption,
    ValueShape::Boolean(BoolTokens::Word),
);
const TAPPING: LineKey = LineKey::new(keys::TAPPING, Dialect::XorgOption, ValueShape::Boolean(BoolTokens::Word));
const ACCEL_PROFILE: LineKey = LineKey::new(keys::ACCEL_PROFILE, Dialect::XorgOption, ValueShape::Text);
const ACCEL_SPEED: LineKey = LineKey::new(keys::ACCEL_SPEED, Dialect::XorgOption, ValueShape::Text);

/// Mouse acceleration presets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccelLevel {
    Off,
    Low,
    Medium,
    High,
}

impl AccelLevel {
    pub const NAMES: &'static [&'static str] = &["off", "low", "medium", "high"];

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "off" => Some(AccelLevel::Off),
            "low" => Some(AccelLevel::Low),
            "medium" => Some(AccelLevel::Medium),
            "high" => Some(AccelLevel::High),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AccelLevel::Off => "off",
            AccelLevel::Low => "low",
            AccelLevel::Medium => "medium",
            AccelLevel::High => "high",
        }
    }

    fn profile(self) -> &'static str {
        match self {
            AccelLevel::Off => "flat",
            _ => "adaptive",
        }
    }

    fn speed(self) -> f64 {
        match self {
            AccelLevel::Off | AccelLevel::Medium => 0.0,
            AccelLevel::Low => -0.5,
            AccelLevel::High => 0.5,
        }
    }

    /// Nearest preset for a profile and a libinput speed in [-1, 1]
    fn classify(flat: bool, speed: f64) -> Self {
        if flat {
            AccelLevel::Off
        } else if speed < -0.25 {
            AccelLevel::Low
        } else if speed < 0.25 {
            AccelLevel::Medium
        } else {
            AccelLevel::High
        }
    }
}

/// Live device property lookup
pub trait DeviceProbe {
    /// Value of the first device exposing property `name`
    fn property(&self, name: &str) -> Option<String>;
}

/// `xinput list-props` over every device
#[derive(Debug, Default, Clone, Copy)]
pub struct XinputProbe;

impl XinputProbe {
    fn run(args: &[&str]) -> Option<String> {
        let output = Command::new(daemons::XINPUT).args(args).output().ok()?;
        if !output.status.success() {
            debug!(?args, status = %output.status, "xinput query failed");
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Parse one `list-props` line: `\tName (281):\tvalue`
fn parse_prop_line<'l>(line: &'l str, name: &str) -> Option<&'l str> {
    let rest = line.trim_start().strip_prefix(name)?.trim_start();
    if !(rest.starts_with('(') || rest.starts_with(':')) {
        return None;
    }
    let (_, value) = rest.split_once(':')?;
    Some(value.trim())
}

impl DeviceProbe for XinputProbe {
    fn property(&self, name: &str) -> Option<String> {
        let ids = Self::run(&["list", "--id-only"])?;
        ids.lines().map(str::trim).filter(|id| !id.is_empty()).find_map(|id| {
            let props = Self::run(&["list-props", id])?;
            props
                .lines()
                .find_map(|line| parse_prop_line(line, name))
                .map(str::to_string)
        })
    }
}

fn device_flag(raw: &str) -> Option<bool> {
    match raw.trim() {
        "1" => Some(true),
        "0" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputBackend;

impl InputBackend {
    fn snippet_value(ctx: &AppContext<'_>, key: &LineKey) -> SettingsResult<Option<TypedValue>> {
        let path = ctx.locator.resolve(Backend::Input, Access::Read)?;
        Ok(codec::read_file(ctx.store(), &path, key))
    }

    fn toggle(ctx: &AppContext<'_>, key: &LineKey, property: &str) -> SettingsResult<DisplayValue> {
        if let Some(value) = Self::snippet_value(ctx, key)? {
            return Ok(display(Some(value)));
        }
        Ok(ctx
            .devices
            .property(property)
            .and_then(|raw| device_flag(&raw))
            .map(DisplayValue::Toggle)
            .unwrap_or(DisplayValue::Default))
    }

    fn accel(ctx: &AppContext<'_>) -> SettingsResult<DisplayValue> {
        let profile = Self::snippet_value(ctx, &ACCEL_PROFILE)?;
        let speed = Self::snippet_value(ctx, &ACCEL_SPEED)?;
        if let (Some(TypedValue::Text(profile)), Some(TypedValue::Text(speed))) = (profile, speed) {
            if let Ok(speed) = speed.parse::<f64>() {
                let level = AccelLevel::classify(profile == "flat", speed);
                return Ok(DisplayValue::Text(level.name().to_string()));
            }
        }

        Ok(match Self::device_accel(ctx) {
            Some((flat, speed)) => DisplayValue::Text(AccelLevel::classify(flat, speed).name().to_string()),
            None => DisplayValue::Default,
        })
    }

    /// Live (flat profile, speed) of the pointer, if any device reports a speed
    fn device_accel(ctx: &AppContext<'_>) -> Option<(bool, f64)> {
        let speed = ctx
            .devices
            .property(xinput::ACCEL_SPEED)
            .and_then(|raw| raw.trim().parse::<f64>().ok())?;
        // libinput reports the enabled profiles as "adaptive, flat[, custom]"
        let flat = ctx
            .devices
            .property(xinput::ACCEL_PROFILE)
            .map(|raw| raw.split(',').nth(1).map(str::trim) == Some("1"))
            .unwrap_or(false);
        Some((flat, speed))
    }

    /// Current device values for every setting except `skip`, so a freshly
    /// seeded snippet keeps what the devices already do
    fn live_values(ctx: &AppContext<'_>, skip: Setting) -> Vec<(LineKey, TypedValue)> {
        let mut values = Vec::new();
        for (setting, key, property) in [
            (Setting::NaturalScrolling, NATURAL_SCROLLING, xinput::NATURAL_SCROLLING),
            (Setting::TapToClick, TAPPING, xinput::TAPPING),
        ] {
            if setting == skip {
                continue;
            }
            if let Some(on) = ctx.devices.property(property).and_then(|raw| device_flag(&raw)) {
                values.push((key, TypedValue::Bool(on)));
            }
        }
        if skip != Setting::MouseAccel {
            if let Some((flat, speed)) = Self::device_accel(ctx) {
                let profile = if flat { "flat" } else { "adaptive" };
                values.push((ACCEL_PROFILE, TypedValue::Text(profile.to_string())));
                values.push((ACCEL_SPEED, TypedValue::Text(format!("{speed:.2}"))));
            }
        }
        values
    }
}

impl BackendAdapter for InputBackend {
    fn backend(&self) -> Backend {
        Backend::Input
    }

    fn get(&self, ctx: &AppContext<'_>, setting: Setting) -> SettingsResult<DisplayValue> {
        match setting {
            Setting::NaturalScrolling => Self::toggle(ctx, &NATURAL_SCROLLING, xinput::NATURAL_SCROLLING),
            Setting::TapToClick => Self::toggle(ctx, &TAPPING, xinput::TAPPING),
            Setting::MouseAccel => Self::accel(ctx),
            other => Err(unsupported(other)),
        }
    }

    fn set(&self, ctx: &AppContext<'_>, setting: Setting, value: &SettingValue) -> SettingsResult<()> {
        let updates = match (setting, value) {
            (Setting::NaturalScrolling, SettingValue::Toggle(b)) => {
                vec![(NATURAL_SCROLLING, TypedValue::Bool(*b))]
            }
            (Setting::TapToClick, SettingValue::Toggle(b)) => vec![(TAPPING, TypedValue::Bool(*b))],
            (Setting::MouseAccel, SettingValue::Choice(name)) => {
                let level = AccelLevel::parse(name).ok_or_else(|| wrong_value(setting, value))?;
                vec![
                    (ACCEL_PROFILE, TypedValue::Text(level.profile().to_string())),
                    (ACCEL_SPEED, TypedValue::Text(format!("{:.2}", level.speed()))),
                ]
            }
            (Setting::NaturalScrolling | Setting::TapToClick | Setting::MouseAccel, other) => {
                return Err(wrong_value(setting, other));
            }
            (other, _) => return Err(unsupported(other)),
        };

        let target = ctx.locator.file_spec(Backend::Input)?.target;
        let seeding = !ctx.store().exists(&target);
        let updates = if seeding {
            let mut all = Self::live_values(ctx, setting);
            debug!(carried = all.len(), "Seeding input snippet from live device values");
            all.extend(updates);
            all
        } else {
            updates
        };

        let path = ctx.locator.resolve(Backend::Input, Access::Write)?;
        codec::write_file(ctx.store(), &path, &updates)?;
        info!(setting = setting.name(), path = %path.display(), "Updated input snippet; applies at next X session");
        Ok(())
    }
}
