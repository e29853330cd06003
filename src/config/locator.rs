//! Resolves the config file that governs each backend
//!
//! Reads prefer the writable copy, then the system template. Writes make
//! sure the writable copy exists first, seeding it from the template.
//! Resolved paths are cached for the lifetime of the locator (one invocation).

use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::backends::input::SNIPPET_TEMPLATE;
use crate::config::app::AppConfig;
use crate::config::store::ConfigStore;
use crate::constants::paths;
use crate::error::{SettingsError, SettingsResult};
use crate::types::Backend;

/// Where the initial contents of a writable config come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Template {
    /// System-provided file, copied if it exists
    File(PathBuf),
    /// Contents compiled into the tool
    Builtin(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFileSpec {
    pub backend: Backend,
    /// File this tool reads and rewrites
    pub target: PathBuf,
    pub template: Template,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Status query; the system template is an acceptable source
    Read,
    /// Mutation; the writable copy must exist afterwards
    Write,
}

/// Result of seeding a missing writable copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seeded {
    CopiedTemplate,
    WroteBuiltin,
    /// No template on this system; the writable copy stays absent
    NoTemplate,
}

pub struct ConfigLocator<'a> {
    store: &'a dyn ConfigStore,
    config: &'a AppConfig,
    config_root: Option<PathBuf>,
    cache: RefCell<HashMap<Backend, PathBuf>>,
}

impl<'a> ConfigLocator<'a> {
    pub fn new(store: &'a dyn ConfigStore, config: &'a AppConfig, config_root: Option<PathBuf>) -> Self {
        Self {
            store,
            config,
            config_root,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &'a dyn ConfigStore {
        self.store
    }

    fn user_root(&self) -> SettingsResult<&Path> {
        self.config_root
            .as_deref()
            .ok_or_else(|| SettingsError::ConfigUnavailable {
                reason: "cannot determine the user config directory (is HOME set?)".to_string(),
            })
    }

    pub fn file_spec(&self, backend: Backend) -> SettingsResult<ConfigFileSpec> {
        let spec = match backend {
            Backend::Compositor => ConfigFileSpec {
                backend,
                target: self
                    .user_root()?
                    .join(paths::APP_DIR)
                    .join(paths::COMPOSITOR_FILENAME),
                template: Template::File(self.config.compositor.template.clone()),
            },
            Backend::Panel => ConfigFileSpec {
                backend,
                target: self
                    .user_root()?
                    .join(paths::PANEL_DIR)
                    .join(paths::PANEL_FILENAME),
                template: Template::File(self.config.panel.template.clone()),
            },
            Backend::Input => ConfigFileSpec {
                backend,
                target: self.config.input.snippet.clone(),
                template: Template::Builtin(SNIPPET_TEMPLATE),
            },
        };
        Ok(spec)
    }

    pub fn resolve(&self, backend: Backend, access: Access) -> SettingsResult<PathBuf> {
        if let Some(path) = self.cache.borrow().get(&backend) {
            return Ok(path.clone());
        }

        let spec = self.file_spec(backend)?;
        if self.store.exists(&spec.target) {
            self.remember(backend, &spec.target);
            return Ok(spec.target);
        }

        match access {
            Access::Read => Ok(match &spec.template {
                Template::File(template) if self.store.exists(template) => {
                    debug!(backend = backend.name(), path = %template.display(), "Reading system template");
                    template.clone()
                }
                _ => spec.target,
            }),
            Access::Write => self.provision(&spec),
        }
    }

    /// Create the writable copy's directory and seed it. Seeding is best-effort:
    /// a missing or unreadable template leaves the file absent and later reads
    /// report "unknown".
    fn provision(&self, spec: &ConfigFileSpec) -> SettingsResult<PathBuf> {
        if let Some(parent) = spec.target.parent() {
            self.store
                .create_dir_all(parent)
                .map_err(|e| SettingsError::from_io(parent.to_path_buf(), e))?;
        }

        match self.seed(spec) {
            Ok(seeded) => {
                info!(backend = spec.backend.name(), path = %spec.target.display(), ?seeded, "Provisioned config file");
            }
            Err(e) => {
                warn!(backend = spec.backend.name(), path = %spec.target.display(), error = %e, "Could not seed config file, continuing");
            }
        }

        self.remember(spec.backend, &spec.target);
        Ok(spec.target.clone())
    }

    pub fn seed(&self, spec: &ConfigFileSpec) -> io::Result<Seeded> {
        match &spec.template {
            Template::File(template) => {
                if !self.store.exists(template) {
                    return Ok(Seeded::NoTemplate);
                }
                self.store.copy(template, &spec.target)?;
                Ok(Seeded::CopiedTemplate)
            }
            Template::Builtin(contents) => {
                self.store.write(&spec.target, contents)?;
                Ok(Seeded::WroteBuiltin)
            }
        }
    }

    fn remember(&self, backend: Backend, path: &Path) {
        self.cache.borrow_mut().insert(backend, path.to_path_buf());
    }
}
