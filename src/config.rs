//! Codec options and persistent settings.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::{IndexType, IterOrder};
use crate::util::{Error, Result};

/// Version of the remote store's REST protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ServerVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// First version accepting fixed-length UTF-8 strings.
    pub const FIXED_UTF8: Self = Self::new(0, 8, 5);

    /// Newest protocol level this crate knows about.
    pub const LATEST: Self = Self::new(0, 9, 0);

    /// Read the `"version"` key of a domain response.
    pub fn from_domain_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        value
            .get("version")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::parse("domain response has no 'version' string"))?
            .parse()
    }

    pub fn supports_fixed_utf8(&self) -> bool {
        *self >= Self::FIXED_UTF8
    }
}

impl Default for ServerVersion {
    fn default() -> Self {
        Self::LATEST
    }
}

impl FromStr for ServerVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.trim().split('.');
        let mut next = |name: &str| -> Result<u32> {
            match parts.next() {
                Some(p) => p
                    .parse()
                    .map_err(|_| Error::parse(format!("bad {name} component in version '{s}'"))),
                None => Ok(0),
            }
        };
        let version = Self::new(next("major")?, next("minor")?, next("patch")?);
        if parts.next().is_some() {
            return Err(Error::parse(format!("too many components in version '{s}'")));
        }
        Ok(version)
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Options that change how descriptors are encoded for a given server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodecOptions {
    pub server_version: ServerVersion,
}

impl CodecOptions {
    pub fn for_server(server_version: ServerVersion) -> Self {
        Self { server_version }
    }
}

/// Settings that persist between CLI sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server_version: String,
    /// `"name"` or `"creation"`
    pub link_order: String,
    /// `"increasing"` or `"decreasing"`
    pub iteration: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_version: ServerVersion::LATEST.to_string(),
            link_order: "name".into(),
            iteration: "increasing".into(),
        }
    }
}

impl Settings {
    /// Settings file location under the user config directory.
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("h5rest");
            p.push("settings.json");
            p
        })
    }

    /// Load from the default location, falling back to defaults.
    pub fn load() -> Self {
        Self::path()
            .and_then(|p| Self::load_from(&p).ok())
            .unwrap_or_default()
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Save to the default location (best-effort).
    pub fn save(&self) {
        if let Some(path) = Self::path() {
            if let Err(e) = self.save_to(&path) {
                tracing::debug!("failed to save settings to {}: {}", path.display(), e);
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Codec options derived from the stored server version.
    pub fn codec_options(&self) -> Result<CodecOptions> {
        Ok(CodecOptions::for_server(self.server_version.parse()?))
    }

    pub fn index_type(&self) -> Result<IndexType> {
        match self.link_order.as_str() {
            "name" => Ok(IndexType::Name),
            "creation" => Ok(IndexType::CreationOrder),
            other => Err(Error::invalid(format!("unknown link order '{other}'"))),
        }
    }

    pub fn iter_order(&self) -> Result<IterOrder> {
        match self.iteration.as_str() {
            "increasing" => Ok(IterOrder::Increasing),
            "decreasing" => Ok(IterOrder::Decreasing),
            other => Err(Error::invalid(format!("unknown iteration order '{other}'"))),
        }
    }
}
