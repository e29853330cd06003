//! Settings registry and request dispatch
//!
//! Maps (category, setting name) onto a typed descriptor, validates caller
//! arguments before any backend is touched, and turns backend results into
//! a structured `Outcome` with an exit code.

use serde::Serialize;
use tracing::{debug, warn};

use crate::backends::input::AccelLevel;
use crate::backends::panel::POSITIONS;
use crate::backends::{adapter_for, AppContext, SettingValue};
use crate::constants::{effects, exit};
use crate::error::{SettingsError, SettingsResult};
use crate::types::{Category, DisplayValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Setting {
    NaturalScrolling,
    TapToClick,
    MouseAccel,
    Compositor,
    Shadows,
    Transparency,
    Animations,
    Position,
    Autohide,
    Systray,
}

/// Value shape as seen by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    Toggle,
    /// 0-100, clamped
    Percentage,
    Choice(&'static [&'static str]),
    /// Presence of the backend daemon
    Daemon,
    /// Read-only composite field
    Composite,
}

impl SettingKind {
    pub fn expected(self) -> String {
        match self {
            SettingKind::Toggle | SettingKind::Daemon | SettingKind::Composite => {
                "enabled or disabled".to_string()
            }
            SettingKind::Percentage => "a number from 0 to 100".to_string(),
            SettingKind::Choice(words) => words.join(", "),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SettingDescriptor {
    pub setting: Setting,
    pub category: Category,
    pub name: &'static str,
    pub label: &'static str,
    pub kind: SettingKind,
}

const fn descriptor(
    setting: Setting,
    category: Category,
    name: &'static str,
    label: &'static str,
    kind: SettingKind,
) -> SettingDescriptor {
    SettingDescriptor { setting, category, name, label, kind }
}

/// Every setting, grouped by category in display order
pub static SETTINGS: [SettingDescriptor; 10] = [
    descriptor(Setting::NaturalScrolling, Category::Input, "natural-scrolling", "Natural scrolling", SettingKind::Toggle),
    descriptor(Setting::TapToClick, Category::Input, "tap-to-click", "Tap-to-click", SettingKind::Toggle),
    descriptor(Setting::MouseAccel, Category::Input, "mouse-accel", "Mouse acceleration", SettingKind::Choice(AccelLevel::NAMES)),
    descriptor(Setting::Compositor, Category::Effects, "compositor", "Compositor", SettingKind::Daemon),
    descriptor(Setting::Shadows, Category::Effects, "shadows", "Shadows", SettingKind::Toggle),
    descriptor(Setting::Transparency, Category::Effects, "transparency", "Transparency", SettingKind::Percentage),
    descriptor(Setting::Animations, Category::Effects, "animations", "Animations", SettingKind::Toggle),
    descriptor(Setting::Position, Category::Panel, "position", "Position", SettingKind::Choice(POSITIONS)),
    descriptor(Setting::Autohide, Category::Panel, "autohide", "Autohide", SettingKind::Toggle),
    descriptor(Setting::Systray, Category::Panel, "systray", "Systray", SettingKind::Composite),
];

impl Setting {
    pub fn descriptor(self) -> &'static SettingDescriptor {
        // SETTINGS is laid out in declaration order
        &SETTINGS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.descriptor().name
    }
}

pub fn settings_in(category: Category) -> impl Iterator<Item = &'static SettingDescriptor> {
    SETTINGS.iter().filter(move |d| d.category == category)
}

pub fn lookup(category: Category, name: &str) -> SettingsResult<&'static SettingDescriptor> {
    settings_in(category)
        .find(|d| d.name == name)
        .ok_or_else(|| SettingsError::UnknownSetting {
            category: category.name(),
            name: name.to_string(),
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Enable,
    Disable,
    Set,
    Status,
}

impl Action {
    pub fn parse(name: &str) -> SettingsResult<Self> {
        match name {
            "enable" => Ok(Action::Enable),
            "disable" => Ok(Action::Disable),
            "set" => Ok(Action::Set),
            "status" => Ok(Action::Status),
            other => Err(SettingsError::UnknownAction(other.to_string())),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Action::Enable => "enable",
            Action::Disable => "disable",
            Action::Set => "set",
            Action::Status => "status",
        }
    }
}

/// Parse a boolean the way users type it
pub fn parse_toggle(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "enabled" | "enable" | "on" | "true" | "yes" | "1" => Some(true),
        "disabled" | "disable" | "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Parse `raw` against a setting's kind. Percentages are clamped, not rejected.
pub fn parse_value(desc: &SettingDescriptor, raw: &str) -> SettingsResult<SettingValue> {
    let invalid = || SettingsError::InvalidValue {
        setting: desc.name,
        value: raw.to_string(),
        expected: desc.kind.expected(),
    };

    match desc.kind {
        SettingKind::Toggle | SettingKind::Daemon | SettingKind::Composite => {
            parse_toggle(raw).map(SettingValue::Toggle).ok_or_else(invalid)
        }
        SettingKind::Percentage => {
            let number: f64 = raw
                .trim()
                .trim_end_matches('%')
                .trim()
                .parse()
                .map_err(|_| invalid())?;
            if number.is_nan() {
                return Err(invalid());
            }
            Ok(SettingValue::Percent(number.round().clamp(0.0, 100.0) as u8))
        }
        SettingKind::Choice(words) => {
            let word = raw.trim().to_ascii_lowercase();
            if words.contains(&word.as_str()) {
                Ok(SettingValue::Choice(word))
            } else {
                Err(invalid())
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Row {
    pub setting: Setting,
    pub label: &'static str,
    pub value: DisplayValue,
}

#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub category: Category,
    pub title: &'static str,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Report {
    Value { setting: Setting, value: DisplayValue },
    Status { sections: Vec<Section> },
    Applied { message: String },
    Failed {
        message: String,
        /// Settings the caller could have meant
        #[serde(skip_serializing_if = "Vec::is_empty")]
        available: Vec<&'static str>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub exit_code: i32,
    pub report: Report,
}

impl Outcome {
    fn ok(report: Report) -> Self {
        Self { exit_code: exit::SUCCESS, report }
    }

    fn failed(err: SettingsError) -> Self {
        warn!(error = %err, "Request failed");
        let available: Vec<&'static str> = match &err {
            SettingsError::UnknownSetting { category, .. } => Category::parse(category)
                .map(|c| settings_in(c).map(|d| d.name).collect())
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        Self {
            exit_code: err.exit_code(),
            report: Report::Failed {
                message: err.to_string(),
                available,
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == exit::SUCCESS
    }
}

/// Front door used by the command line and the menu
pub struct Registry<'a> {
    ctx: &'a AppContext<'a>,
}

impl<'a> Registry<'a> {
    pub fn new(ctx: &'a AppContext<'a>) -> Self {
        Self { ctx }
    }

    /// Handle `<category> <action> [setting] [value]`
    pub fn dispatch(&self, category: &str, action: &str, setting: Option<&str>, value: Option<&str>) -> Outcome {
        debug!(category, action, ?setting, ?value, "Dispatching request");
        self.try_dispatch(category, action, setting, value)
            .unwrap_or_else(Outcome::failed)
    }

    fn try_dispatch(
        &self,
        category: &str,
        action: &str,
        setting: Option<&str>,
        value: Option<&str>,
    ) -> SettingsResult<Outcome> {
        let category = Category::parse(category)
            .ok_or_else(|| SettingsError::UnknownCategory(category.to_string()))?;
        let action = Action::parse(action)?;
        let desc = setting.map(|name| lookup(category, name)).transpose()?;

        match (action, desc) {
            (Action::Status, None) => Ok(Outcome::ok(Report::Status {
                sections: vec![self.section(category)],
            })),
            (Action::Status, Some(desc)) => Ok(Outcome::ok(Report::Value {
                setting: desc.setting,
                value: self.get(desc.setting)?,
            })),
            (Action::Enable | Action::Disable, None) => Err(SettingsError::MissingArgument("setting")),
            (Action::Enable | Action::Disable, Some(desc)) => {
                let value = self.toggle_value(desc, action == Action::Enable)?;
                self.apply(desc, action, &value)
            }
            (Action::Set, None) => Err(SettingsError::MissingArgument("setting")),
            (Action::Set, Some(desc)) => {
                let raw = value.ok_or(SettingsError::MissingArgument("value"))?;
                let value = parse_value(desc, raw)?;
                self.apply(desc, action, &value)
            }
        }
    }

    /// Status of every setting in every category
    pub fn status_all(&self) -> Outcome {
        Outcome::ok(Report::Status {
            sections: Category::ALL.iter().map(|c| self.section(*c)).collect(),
        })
    }

    pub fn get(&self, setting: Setting) -> SettingsResult<DisplayValue> {
        let adapter = adapter_for(setting.descriptor().category.backend());
        debug!(setting = setting.name(), backend = adapter.backend().name(), "Reading setting");
        adapter.get(self.ctx, setting)
    }

    /// All settings of one category; unreadable values show as unknown
    pub fn section(&self, category: Category) -> Section {
        let rows = settings_in(category)
            .map(|desc| Row {
                setting: desc.setting,
                label: desc.label,
                value: self.get(desc.setting).unwrap_or_else(|e| {
                    warn!(setting = desc.name, error = %e, "Could not read setting");
                    DisplayValue::Unknown
                }),
            })
            .collect();
        Section {
            category,
            title: category.title(),
            rows,
        }
    }

    fn toggle_value(&self, desc: &SettingDescriptor, enable: bool) -> SettingsResult<SettingValue> {
        match desc.kind {
            SettingKind::Toggle | SettingKind::Daemon | SettingKind::Composite => Ok(SettingValue::Toggle(enable)),
            SettingKind::Percentage => Ok(SettingValue::Percent(if enable {
                self.ctx.config.transparency_enabled()
            } else {
                effects::TRANSPARENCY_DISABLED_PERCENT
            })),
            SettingKind::Choice(_) => Err(SettingsError::NotSupported {
                setting: desc.name,
                action: if enable { "enable" } else { "disable" },
                hint: format!("use 'set {} <{}>'", desc.name, desc.kind.expected().replace(", ", "|")),
            }),
        }
    }

    fn apply(&self, desc: &SettingDescriptor, action: Action, value: &SettingValue) -> SettingsResult<Outcome> {
        debug!(setting = desc.name, action = action.name(), ?value, "Applying setting");
        adapter_for(desc.category.backend())
            .set(self.ctx, desc.setting, value)
            .map_err(|e| match e {
                // Adapters refuse a setting; the verb is the caller's
                SettingsError::NotSupported { setting, hint, .. } => SettingsError::NotSupported {
                    setting,
                    action: action.name(),
                    hint,
                },
                other => other,
            })?;
        Ok(Outcome::ok(Report::Applied {
            message: applied_message(desc, value),
        }))
    }
}

fn applied_message(desc: &SettingDescriptor, value: &SettingValue) -> String {
    match value {
        SettingValue::Toggle(on) if desc.kind == SettingKind::Daemon => {
            format!("{} {}", desc.label, if *on { "started" } else { "stopped" })
        }
        SettingValue::Toggle(on) => {
            format!("{} {}", desc.label, if *on { "enabled" } else { "disabled" })
        }
        SettingValue::Percent(p) => format!("{} set to {p}%", desc.label),
        SettingValue::Choice(word) => format!("{} set to '{word}'", desc.label),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::testing::{context, test_config, FakeDevices};
    use crate::config::store::MemoryStore;
    use crate::process::FakeProcesses;

    const USER_CONF: &str = "/home/u/.config/opende/picom.conf";
    const PICOM: &str = "shadow = false\nfading = true\ninactive-opacity = 0.90\n";

    fn applied(outcome: &Outcome) -> &str {
        match &outcome.report {
            Report::Applied { message } => message,
            other => panic!("expected Applied, got {other:?}"),
        }
    }

    #[test]
    fn test_descriptor_table_is_consistent() {
        for desc in SETTINGS.iter() {
            assert_eq!(desc.setting.descriptor().name, desc.name);
            assert_eq!(lookup(desc.category, desc.name).unwrap().setting, desc.setting);
        }
        assert_eq!(settings_in(Category::Effects).count(), 4);
        assert_eq!(settings_in(Category::Input).count(), 3);
        assert_eq!(settings_in(Category::Panel).count(), 3);
    }

    #[test]
    fn test_unknown_setting_exits_2_without_touching_files() {
        let config = test_config();
        let store = MemoryStore::new().with_file(USER_CONF, PICOM);
        let procs = FakeProcesses::new().installed("picom").running("picom");
        let devices = FakeDevices::default();
        let ctx = context(&config, &store, &procs, &devices);

        let outcome = Registry::new(&ctx).dispatch("effects", "enable", Some("bogus"), None);
        assert_eq!(outcome.exit_code, 2);
        match outcome.report {
            Report::Failed { available, .. } => {
                assert_eq!(available, vec!["compositor", "shadows", "transparency", "animations"]);
            }
            other => panic!("unexpected report {other:?}"),
        }
        assert_eq!(store.write_count(), 0);
        assert!(procs.calls().is_empty());
    }

    #[test]
    fn test_unknown_category_and_action_exit_2() {
        let config = test_config();
        let store = MemoryStore::new();
        let procs = FakeProcesses::new();
        let devices = FakeDevices::default();
        let ctx = context(&config, &store, &procs, &devices);
        let registry = Registry::new(&ctx);

        assert_eq!(registry.dispatch("sound", "status", None, None).exit_code, 2);
        assert_eq!(registry.dispatch("effects", "toggle", Some("shadows"), None).exit_code, 2);
    }

    #[test]
    fn test_missing_arguments_are_reported_first() {
        let config = test_config();
        let store = MemoryStore::new().with_file(USER_CONF, PICOM);
        let procs = FakeProcesses::new();
        let devices = FakeDevices::default();
        let ctx = context(&config, &store, &procs, &devices);
        let registry = Registry::new(&ctx);

        assert_eq!(registry.dispatch("effects", "enable", None, None).exit_code, 2);
        assert_eq!(registry.dispatch("effects", "set", Some("transparency"), None).exit_code, 2);
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_set_shadows_enabled_end_to_end() {
        let config = test_config();
        let store = MemoryStore::new().with_file(USER_CONF, PICOM);
        let procs = FakeProcesses::new().installed("picom").running("picom");
        let devices = FakeDevices::default();
        let ctx = context(&config, &store, &procs, &devices);
        let registry = Registry::new(&ctx);

        let outcome = registry.dispatch("effects", "set", Some("shadows"), Some("enabled"));
        assert!(outcome.is_success());
        assert_eq!(applied(&outcome), "Shadows enabled");
        assert!(store.contents(USER_CONF).unwrap().starts_with("shadow = true\n"));

        let status = registry.dispatch("effects", "status", Some("shadows"), None);
        match status.report {
            Report::Value { value, .. } => assert_eq!(value.to_string(), "enabled"),
            other => panic!("unexpected report {other:?}"),
        }
        assert_eq!(procs.count("launch"), 1);
        assert_eq!(procs.count("terminate"), 1);
    }

    #[test]
    fn test_transparency_clamps() {
        let config = test_config();
        let store = MemoryStore::new().with_file(USER_CONF, PICOM);
        let procs = FakeProcesses::new();
        let devices = FakeDevices::default();
        let ctx = context(&config, &store, &procs, &devices);
        let registry = Registry::new(&ctx);

        let low = registry.dispatch("effects", "set", Some("transparency"), Some("-5"));
        assert_eq!(applied(&low), "Transparency set to 0%");
        assert!(store.contents(USER_CONF).unwrap().contains("inactive-opacity = 0.00\n"));

        let high = registry.dispatch("effects", "set", Some("transparency"), Some("150"));
        assert_eq!(applied(&high), "Transparency set to 100%");
        assert_eq!(registry.get(Setting::Transparency).unwrap(), DisplayValue::Percent(100));

        let bad = registry.dispatch("effects", "set", Some("transparency"), Some("lots"));
        assert_eq!(bad.exit_code, 1);
    }

    #[test]
    fn test_enable_disable_transparency_use_presets() {
        let config = test_config();
        let store = MemoryStore::new().with_file(USER_CONF, PICOM);
        let procs = FakeProcesses::new();
        let devices = FakeDevices::default();
        let ctx = context(&config, &store, &procs, &devices);
        let registry = Registry::new(&ctx);

        registry.dispatch("effects", "disable", Some("transparency"), None);
        assert_eq!(registry.get(Setting::Transparency).unwrap(), DisplayValue::Percent(100));
        registry.dispatch("effects", "enable", Some("transparency"), None);
        assert_eq!(registry.get(Setting::Transparency).unwrap(), DisplayValue::Percent(90));
    }

    #[test]
    fn test_choice_settings_reject_enable() {
        let config = test_config();
        let store = MemoryStore::new();
        let procs = FakeProcesses::new();
        let devices = FakeDevices::default();
        let ctx = context(&config, &store, &procs, &devices);

        let outcome = Registry::new(&ctx).dispatch("panel", "enable", Some("position"), None);
        assert_eq!(outcome.exit_code, 1);
        match outcome.report {
            Report::Failed { message, .. } => assert!(message.contains("set position <bottom|top>")),
            other => panic!("unexpected report {other:?}"),
        }
    }

    #[test]
    fn test_systray_refusal_names_the_invoked_action() {
        let config = test_config();
        let store = MemoryStore::new().with_file("/home/u/.config/tint2/tint2rc", "panel_items = LTSC\n");
        let procs = FakeProcesses::new();
        let devices = FakeDevices::default();
        let ctx = context(&config, &store, &procs, &devices);
        let registry = Registry::new(&ctx);

        for (action, value) in [("enable", None), ("disable", None), ("set", Some("off"))] {
            let outcome = registry.dispatch("panel", action, Some("systray"), value);
            assert_eq!(outcome.exit_code, 1);
            match outcome.report {
                Report::Failed { message, .. } => {
                    assert!(message.starts_with(&format!("systray does not support '{action}'")), "{message}");
                }
                other => panic!("unexpected report {other:?}"),
            }
        }
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_compositor_disable_stops_running_daemon() {
        let config = test_config();
        let store = MemoryStore::new();
        let procs = FakeProcesses::new().installed("picom").running("picom");
        let devices = FakeDevices::default();
        let ctx = context(&config, &store, &procs, &devices);

        let outcome = Registry::new(&ctx).dispatch("effects", "disable", Some("compositor"), None);
        assert_eq!(applied(&outcome), "Compositor stopped");
        assert_eq!(procs.calls(), vec!["terminate picom"]);
    }

    #[test]
    fn test_compositor_enable_starts_daemon() {
        let config = test_config();
        let store = MemoryStore::new();
        let procs = FakeProcesses::new().installed("picom");
        let devices = FakeDevices::default();
        let ctx = context(&config, &store, &procs, &devices);
        let registry = Registry::new(&ctx);

        let outcome = registry.dispatch("effects", "enable", Some("compositor"), None);
        assert_eq!(applied(&outcome), "Compositor started");
        let outcome = registry.dispatch("effects", "enable", Some("compositor"), None);
        assert!(outcome.is_success());
        assert_eq!(procs.count("launch"), 1);
    }

    #[test]
    fn test_status_aggregates_every_setting() {
        let config = test_config();
        let store = MemoryStore::new().with_file(USER_CONF, PICOM);
        let procs = FakeProcesses::new();
        let devices = FakeDevices::default();
        let ctx = context(&config, &store, &procs, &devices);
        let registry = Registry::new(&ctx);

        let outcome = registry.status_all();
        let Report::Status { sections } = outcome.report else {
            panic!("expected status report");
        };
        assert_eq!(sections.len(), 3);
        let effects = &sections[1];
        assert_eq!(effects.category, Category::Effects);
        let values: Vec<String> = effects.rows.iter().map(|r| r.value.to_string()).collect();
        assert_eq!(values, vec!["stopped", "disabled", "90%", "enabled"]);
        assert!(sections[2].rows.iter().all(|r| r.value == DisplayValue::Unknown));
    }

    #[test]
    fn test_parse_value_shapes() {
        let transparency = Setting::Transparency.descriptor();
        assert_eq!(parse_value(transparency, "75%").unwrap(), SettingValue::Percent(75));
        assert_eq!(parse_value(transparency, "12.6").unwrap(), SettingValue::Percent(13));

        let position = Setting::Position.descriptor();
        assert_eq!(parse_value(position, "Top").unwrap(), SettingValue::Choice("top".into()));
        assert!(parse_value(position, "left").is_err());

        let shadows = Setting::Shadows.descriptor();
        assert_eq!(parse_value(shadows, "off").unwrap(), SettingValue::Toggle(false));
        assert!(parse_value(shadows, "maybe").is_err());
    }

    #[test]
    fn test_report_serializes_for_json_output() {
        let outcome = Outcome::ok(Report::Value {
            setting: Setting::TapToClick,
            value: DisplayValue::Toggle(true),
        });
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["exit_code"], 0);
        assert_eq!(json["report"]["type"], "value");
        assert_eq!(json["report"]["setting"], "tap-to-click");
        assert_eq!(json["report"]["value"]["kind"], "toggle");
        assert_eq!(json["report"]["value"]["value"], true);
    }
}
