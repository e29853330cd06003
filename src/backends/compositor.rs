//! Compositor (picom): libconfig-style `key = value` file, no reload signal,
//! so config changes are applied by restarting a running compositor.

use tracing::info;

use super::{display, unsupported, wrong_value, AppContext, BackendAdapter, SettingValue};
use crate::codec::{self, BoolTokens, Dialect, LineKey, TypedValue, ValueShape};
use crate::config::Access;
use crate::error::SettingsResult;
use crate::process::ReloadStrategy;
use crate::registry::Setting;
use crate::constants::keys;
use crate::types::{Backend, DisplayValue};

const SHADOW: LineKey = LineKey::new(keys::SHADOW, Dialect::Assignment, ValueShape::Boolean(BoolTokens::Word));
const FADING: LineKey = LineKey::new(keys::FADING, Dialect::Assignment, ValueShape::Boolean(BoolTokens::Word));
const INACTIVE_OPACITY: LineKey = LineKey::new(keys::INACTIVE_OPACITY, Dialect::Assignment, ValueShape::Percentage);

#[derive(Debug, Clone, Copy, Default)]
pub struct CompositorBackend;

impl CompositorBackend {
    fn line_key(setting: Setting) -> Option<LineKey> {
        match setting {
            Setting::Shadows => Some(SHADOW),
            Setting::Animations => Some(FADING),
            Setting::Transparency => Some(INACTIVE_OPACITY),
            _ => None,
        }
    }

    fn binary<'c>(ctx: &'c AppContext<'_>) -> &'c str {
        &ctx.config.compositor.binary
    }

    /// `-b --config <path>`: the user copy if present, else the system template
    fn launch_args(ctx: &AppContext<'_>) -> SettingsResult<Vec<String>> {
        let path = ctx.locator.resolve(Backend::Compositor, Access::Read)?;
        Ok(vec![
            "-b".to_string(),
            "--config".to_string(),
            path.display().to_string(),
        ])
    }

    fn start(&self, ctx: &AppContext<'_>) -> SettingsResult<()> {
        let args = Self::launch_args(ctx)?;
        ctx.supervisor.start(Self::binary(ctx), &args)
    }

    fn stop(&self, ctx: &AppContext<'_>) -> SettingsResult<()> {
        ctx.supervisor.stop(Self::binary(ctx))
    }
}

impl BackendAdapter for CompositorBackend {
    fn backend(&self) -> Backend {
        Backend::Compositor
    }

    fn get(&self, ctx: &AppContext<'_>, setting: Setting) -> SettingsResult<DisplayValue> {
        if setting == Setting::Compositor {
            return Ok(DisplayValue::Daemon(ctx.supervisor.is_running(Self::binary(ctx))));
        }
        let key = Self::line_key(setting).ok_or_else(|| unsupported(setting))?;
        let path = ctx.locator.resolve(Backend::Compositor, Access::Read)?;
        Ok(display(codec::read_file(ctx.store(), &path, &key)))
    }

    fn set(&self, ctx: &AppContext<'_>, setting: Setting, value: &SettingValue) -> SettingsResult<()> {
        if setting == Setting::Compositor {
            return match value {
                SettingValue::Toggle(true) => self.start(ctx),
                SettingValue::Toggle(false) => self.stop(ctx),
                other => Err(wrong_value(setting, other)),
            };
        }

        let key = Self::line_key(setting).ok_or_else(|| unsupported(setting))?;
        let typed = match (key.shape, value) {
            (ValueShape::Boolean(_), SettingValue::Toggle(b)) => TypedValue::Bool(*b),
            (ValueShape::Percentage, SettingValue::Percent(p)) => TypedValue::Percent((*p).min(100)),
            (_, other) => return Err(wrong_value(setting, other)),
        };

        let path = ctx.locator.resolve(Backend::Compositor, Access::Write)?;
        codec::write_file(ctx.store(), &path, &[(key, typed)])?;
        info!(setting = setting.name(), path = %path.display(), "Updated compositor config");

        let args = Self::launch_args(ctx)?;
        ctx.supervisor
            .reload(Self::binary(ctx), ReloadStrategy::Restart, &args)
    }
}
