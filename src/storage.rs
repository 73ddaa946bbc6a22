use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::models::{Catalog, ServerConfig};

pub const APP_NAME: &str = "do-my-job";

/// Per-server JSON files under one config directory.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<home>/.config/do-my-job`, or the same path relative to the working directory
    /// when no home directory can be found.
    pub fn default_dir() -> PathBuf {
        match dirs::home_dir() {
            Some(home) => home.join(".config").join(APP_NAME),
            None => Path::new(".config").join(APP_NAME),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, server_name: &str) -> Result<PathBuf, ConfigError> {
        // Separators are rejected, so the name is a single path component.
        if server_name.trim().is_empty()
            || server_name.contains(['/', '\\'])
            || server_name == "."
            || server_name == ".."
        {
            return Err(ConfigError::InvalidServerName(server_name.to_string()));
        }
        Ok(self.dir.join(format!("{server_name}.json")))
    }

    pub fn load(&self, server_name: &str) -> Result<ServerConfig, ConfigError> {
        let path = self.path_for(server_name)?;

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ServerConfig::default()),
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
    }

    pub fn save(&self, server_name: &str, config: &ServerConfig) -> Result<(), ConfigError> {
        let path = self.path_for(server_name)?;
        self.ensure_dir()?;

        let content = serde_json::to_string_pretty(config).map_err(ConfigError::Serialize)?;
        write_private(&path, &content).map_err(|source| ConfigError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(server = server_name, path = %path.display(), "saved server config");
        Ok(())
    }

    /// Removes the saved file. Returns `false` when there was nothing to remove.
    pub fn delete(&self, server_name: &str) -> Result<bool, ConfigError> {
        let path = self.path_for(server_name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(ConfigError::Remove { path, source }),
        }
    }

    fn ensure_dir(&self) -> Result<(), ConfigError> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }
        builder
            .create(&self.dir)
            .map_err(|source| ConfigError::CreateDir {
                path: self.dir.clone(),
                source,
            })
    }
}

/// Writes `content` over `path`, readable by the owner only on unix.
fn write_private(path: &Path, content: &str) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    // The mode above only applies to new files.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(content.as_bytes())
}

/// Reads the script catalog. A missing file is an empty catalog.
pub fn load_catalog(path: &Path) -> Result<Catalog, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!(
                path = %path.display(),
                "script catalog not found, starting with no scripts"
            );
            return Ok(Catalog::default());
        }
        Err(source) => {
            return Err(ConfigError::ReadCatalog {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let mut catalog: Catalog =
        toml::from_str(&content).map_err(|source| ConfigError::ParseCatalog {
            path: path.to_path_buf(),
            source,
        })?;
    for script in &mut catalog.scripts {
        for option in &mut script.selects {
            option.apply_default();
        }
    }
    Ok(catalog)
}
