//! Host environment checks for Switchboard applications.
//!
//! The plugin looks up the external executables other plugins shell out to
//! and reports the missing ones through the diagnostics broadcast, with the
//! package that provides each of them on common distributions. It also
//! answers `executable_path` lookups and exposes the parsed `/etc/os-release`.
use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use switchboard_core::plugin_system::version::VersionRange;
use switchboard_core::{
    MethodTable, MissingSystemDependencies, Plugin, PluginError, Priority, Registry, SystemDependency,
};

pub const PLUGIN_NAME: &str = "core-environment-check";
pub const ENVIRONMENT_INTERFACE: &str = "environment";
/// `first_success` method: `String` executable name → `PathBuf`
pub const EXECUTABLE_PATH_METHOD: &str = "executable_path";
/// `first` method: `()` → [`OsInfo`]
pub const OS_INFO_METHOD: &str = "os_info";

const OS_RELEASE_PATH: &str = "/etc/os-release";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct OsInfo {
    pub id: Option<String>,          // e.g., "ubuntu", "fedora"
    pub name: Option<String>,        // e.g., "Ubuntu", "Fedora Linux"
    pub version_id: Option<String>,  // e.g., "22.04"
    pub pretty_name: Option<String>, // e.g., "Ubuntu 22.04.3 LTS"
}

/// An executable some feature needs, and where to get it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ExecutableRequirement {
    pub name: String,
    pub description: String,
    /// Distribution id (as in os-release `ID`) → package name
    #[serde(default)]
    pub packages: BTreeMap<String, String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl ExecutableRequirement {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            packages: BTreeMap::new(),
            url: None,
        }
    }

    pub fn with_package(mut self, distribution: &str, package: &str) -> Self {
        self.packages.insert(distribution.to_string(), package.to_string());
        self
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }

    fn to_system_dependency(&self) -> SystemDependency {
        let mut dependency = SystemDependency::new(&self.description);
        for (distribution, package) in &self.packages {
            dependency = dependency.with_package(distribution, package);
        }
        match &self.url {
            Some(url) => dependency.with_url(url),
            None => dependency,
        }
    }
}

fn default_requirements() -> Vec<ExecutableRequirement> {
    vec![
        ExecutableRequirement::new("git", "Version control for project sync")
            .with_package("debian", "git")
            .with_package("fedora", "git")
            .with_package("arch", "git"),
        ExecutableRequirement::new("ffmpeg", "Audio and video transcoding")
            .with_package("debian", "ffmpeg")
            .with_package("fedora", "ffmpeg-free")
            .with_package("arch", "ffmpeg")
            .with_url("https://ffmpeg.org"),
        ExecutableRequirement::new("7z", "Extraction of 7-Zip archives")
            .with_package("debian", "p7zip-full")
            .with_package("fedora", "p7zip")
            .with_package("arch", "p7zip"),
    ]
}

pub struct EnvironmentCheckPlugin {
    requirements: Vec<ExecutableRequirement>,
    /// Overrides `PATH` for lookups
    search_path: Option<OsString>,
    os_release_path: PathBuf,
}

impl Default for EnvironmentCheckPlugin {
    fn default() -> Self {
        Self {
            requirements: default_requirements(),
            search_path: None,
            os_release_path: PathBuf::from(OS_RELEASE_PATH),
        }
    }
}

impl EnvironmentCheckPlugin {
    pub fn new(requirements: Vec<ExecutableRequirement>) -> Self {
        Self {
            requirements,
            ..Self::default()
        }
    }

    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    pub fn with_os_release_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.os_release_path = path.into();
        self
    }

    pub fn requirements(&self) -> &[ExecutableRequirement] {
        &self.requirements
    }

    /// First directory of the search path containing an executable `name`.
    pub fn find_executable(&self, name: &str) -> Option<PathBuf> {
        let search_path = match &self.search_path {
            Some(path) => path.clone(),
            None => std::env::var_os("PATH")?,
        };
        std::env::split_paths(&search_path)
            .map(|dir| dir.join(name))
            .find(|candidate| is_executable(candidate))
    }

    pub fn os_info(&self) -> OsInfo {
        read_os_info(&self.os_release_path)
    }
}

impl Plugin for EnvironmentCheckPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn priority(&self) -> Priority {
        Priority::HIGH
    }

    fn interfaces(&self) -> Vec<String> {
        vec![ENVIRONMENT_INTERFACE.to_string()]
    }

    fn compatible_api_versions(&self) -> Vec<VersionRange> {
        const COMPATIBLE_API_REQ: &str = "^0.1";
        match VersionRange::from_str(COMPATIBLE_API_REQ) {
            Ok(vr) => vec![vr],
            Err(e) => {
                log::error!(
                    "Failed to parse API version requirement ('{}'): {}",
                    COMPATIBLE_API_REQ,
                    e
                );
                vec![]
            }
        }
    }

    fn register_methods(self: Arc<Self>, methods: &mut MethodTable) {
        let plugin = Arc::clone(&self);
        methods.register(EXECUTABLE_PATH_METHOD, move |_: &Registry, name: &mut String| {
            Ok(plugin.find_executable(name))
        });
        let plugin = self;
        methods.register(OS_INFO_METHOD, move |_: &Registry, _: &mut ()| Ok(Some(plugin.os_info())));
    }

    fn on_init(&self, _registry: &Registry) -> Result<(), PluginError> {
        let os_info = self.os_info();
        info!(
            "Initializing {} on {}",
            PLUGIN_NAME,
            os_info.pretty_name.as_deref().unwrap_or("an unknown distribution")
        );
        Ok(())
    }

    fn report_missing_system_dependencies(&self, out: &mut MissingSystemDependencies) -> Result<(), PluginError> {
        for requirement in &self.requirements {
            match self.find_executable(&requirement.name) {
                Some(path) => debug!("Found '{}' at {}", requirement.name, path.display()),
                None => {
                    warn!("Executable '{}' not found: {}", requirement.name, requirement.description);
                    out.report(&requirement.name, requirement.to_system_dependency());
                }
            }
        }
        Ok(())
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).is_ok_and(|metadata| metadata.is_file() && metadata.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|metadata| metadata.is_file())
}

/// Parse an os-release file. Unreadable files and malformed lines are
/// logged and yield empty fields.
pub fn read_os_info(file_path: &Path) -> OsInfo {
    let file = match fs::File::open(file_path) {
        Ok(file) => file,
        Err(e) => {
            warn!(
                "Could not open {}: {}. Proceeding with default OS info.",
                file_path.display(),
                e
            );
            return OsInfo::default();
        }
    };

    let mut vars = HashMap::new();
    for line_result in BufReader::new(file).lines() {
        let line = match line_result {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to read line from {}: {}", file_path.display(), e);
                continue;
            }
        };
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        match line.split_once('=') {
            Some((key, value)) => {
                vars.insert(key.trim().to_string(), value.trim().trim_matches('"').to_string());
            }
            None => warn!("Ignoring malformed line in {}: {}", file_path.display(), line),
        }
    }

    OsInfo {
        id: vars.get("ID").cloned(),
        name: vars.get("NAME").cloned(),
        version_id: vars.get("VERSION_ID").cloned(),
        pretty_name: vars.get("PRETTY_NAME").cloned(),
    }
}
