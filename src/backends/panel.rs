//! Panel (tint2): `key = value` file with `0|1` booleans, reloaded live
//! with SIGUSR1.

use tracing::info;

use super::{display, unsupported, wrong_value, AppContext, BackendAdapter, SettingValue};
use crate::codec::{self, BoolTokens, Dialect, LineKey, TypedValue, ValueShape};
use crate::config::Access;
use crate::constants::keys;
use crate::error::{SettingsError, SettingsResult};
use crate::process::ReloadStrategy;
use crate::registry::Setting;
use crate::types::{Backend, DisplayValue};

/// Panel edges this tool can place tint2 on
pub const POSITIONS: &[&str] = &["bottom", "top"];

const POSITION: LineKey = LineKey::new(
    keys::PANEL_POSITION,
    Dialect::Assignment,
    ValueShape::Enumerated {
        vocabulary: POSITIONS,
        template: "{} center horizontal",
    },
);
const AUTOHIDE: LineKey = LineKey::new(keys::AUTOHIDE, Dialect::Assignment, ValueShape::Boolean(BoolTokens::Digit));
const PANEL_ITEMS: LineKey = LineKey::new(keys::PANEL_ITEMS, Dialect::Assignment, ValueShape::Flag(keys::SYSTRAY_ITEM));

#[derive(Debug, Clone, Copy, Default)]
pub struct PanelBackend;

impl PanelBackend {
    fn line_key(setting: Setting) -> Option<LineKey> {
        match setting {
            Setting::Position => Some(POSITION),
            Setting::Autohide => Some(AUTOHIDE),
            Setting::Systray => Some(PANEL_ITEMS),
            _ => None,
        }
    }
}

impl BackendAdapter for PanelBackend {
    fn backend(&self) -> Backend {
        Backend::Panel
    }

    fn get(&self, ctx: &AppContext<'_>, setting: Setting) -> SettingsResult<DisplayValue> {
        let key = Self::line_key(setting).ok_or_else(|| unsupported(setting))?;
        let path = ctx.locator.resolve(Backend::Panel, Access::Read)?;
        Ok(display(codec::read_file(ctx.store(), &path, &key)))
    }

    fn set(&self, ctx: &AppContext<'_>, setting: Setting, value: &SettingValue) -> SettingsResult<()> {
        // panel_items is a string of item letters; toggling one is left to the user
        if setting == Setting::Systray {
            let spec = ctx.locator.file_spec(Backend::Panel)?;
            return Err(SettingsError::NotSupported {
                setting: setting.name(),
                action: "set",
                hint: format!(
                    "edit {} manually: add or remove '{}' in the 'panel_items' line",
                    spec.target.display(),
                    keys::SYSTRAY_ITEM
                ),
            });
        }

        let key = Self::line_key(setting).ok_or_else(|| unsupported(setting))?;
        let typed = match (key.shape, value) {
            (ValueShape::Boolean(_), SettingValue::Toggle(b)) => TypedValue::Bool(*b),
            (ValueShape::Enumerated { vocabulary, .. }, SettingValue::Choice(word))
                if vocabulary.contains(&word.as_str()) =>
            {
                TypedValue::Word(word.clone())
            }
            (_, other) => return Err(wrong_value(setting, other)),
        };

        let path = ctx.locator.resolve(Backend::Panel, Access::Write)?;
        codec::write_file(ctx.store(), &path, &[(key, typed)])?;
        info!(setting = setting.name(), path = %path.display(), "Updated panel config");

        ctx.supervisor
            .reload(&ctx.config.panel.binary, ReloadStrategy::Signal, &[])
    }
}
