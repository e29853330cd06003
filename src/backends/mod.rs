//! Backend adapters: typed get/set per setting for each managed component
//!
//! Each adapter binds its fixed settings to the locator, the line codec and
//! the supervisor, and owns its backend's reload rule.

pub mod compositor;
pub mod input;
pub mod panel;

use std::path::PathBuf;

use crate::codec::TypedValue;
use crate::config::{AppConfig, ConfigLocator, ConfigStore};
use crate::error::{SettingsError, SettingsResult};
use crate::process::{ProcessControl, Supervisor};
use crate::registry::Setting;
use crate::types::{Backend, DisplayValue};

pub use compositor::CompositorBackend;
pub use input::{DeviceProbe, InputBackend, XinputProbe};
pub use panel::PanelBackend;

/// Shared collaborators for one invocation
pub struct AppContext<'a> {
    pub config: &'a AppConfig,
    pub locator: ConfigLocator<'a>,
    pub supervisor: Supervisor<'a>,
    pub devices: &'a dyn DeviceProbe,
}

impl<'a> AppContext<'a> {
    pub fn new(
        config: &'a AppConfig,
        store: &'a dyn ConfigStore,
        processes: &'a dyn ProcessControl,
        devices: &'a dyn DeviceProbe,
        config_root: Option<PathBuf>,
    ) -> Self {
        Self {
            config,
            locator: ConfigLocator::new(store, config, config_root),
            supervisor: Supervisor::new(processes, config.reload_settle()),
            devices,
        }
    }

    pub fn store(&self) -> &'a dyn ConfigStore {
        self.locator.store()
    }
}

/// Caller value after it has been parsed against a setting's kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Toggle(bool),
    Percent(u8),
    Choice(String),
}

pub trait BackendAdapter {
    fn backend(&self) -> Backend;

    /// Current value; a missing key is `Unknown`, never an error
    fn get(&self, ctx: &AppContext<'_>, setting: Setting) -> SettingsResult<DisplayValue>;

    /// Validate, write and reload if the daemon is running
    fn set(&self, ctx: &AppContext<'_>, setting: Setting, value: &SettingValue) -> SettingsResult<()>;
}

/// Adapter that owns `backend`
pub fn adapter_for(backend: Backend) -> &'static dyn BackendAdapter {
    match backend {
        Backend::Compositor => &CompositorBackend,
        Backend::Panel => &PanelBackend,
        Backend::Input => &InputBackend,
    }
}

fn display(value: Option<TypedValue>) -> DisplayValue {
    match value {
        Some(TypedValue::Bool(b)) => DisplayValue::Toggle(b),
        Some(TypedValue::Percent(p)) => DisplayValue::Percent(p),
        Some(TypedValue::Word(w)) | Some(TypedValue::Text(w)) => DisplayValue::Text(w),
        None => DisplayValue::Unknown,
    }
}

fn wrong_value(setting: Setting, value: &SettingValue) -> SettingsError {
    SettingsError::InvalidValue {
        setting: setting.name(),
        value: format!("{value:?}"),
        expected: setting.descriptor().kind.expected(),
    }
}

fn unsupported(setting: Setting) -> SettingsError {
    SettingsError::NotSupported {
        setting: setting.name(),
        action: "set",
        hint: format!("{} is not managed by this backend", setting.name()),
    }
}
