// ============================================================
// Layer 5 — Client Configuration
// ============================================================
// Finds and parses the Perkeep client configuration so the
// HTTP client knows which server to talk to and how to log in.
//
// Lookup order for the config directory:
//   1. $CAMLI_CONFIG_DIR, if set
//   2. Windows: ~/AppData/Roaming/Camlistore
//   3. elsewhere: ~/.config/camlistore
//
// Expected file: <dir>/client-config.json
//
//   {
//     "servers": {
//       "home": {
//         "server":  "https://blobs.example.net:3179",
//         "auth":    "userpass:alice:s3cret",
//         "default": true
//       }
//     }
//   }
//
// The first server marked "default", in file order, is used.
//
// Reference: serde documentation (derive)
//            Rust Book §9 (Error Handling)

use std::{
    env,
    ffi::OsString,
    fmt,
    fs,
    path::{Path, PathBuf},
};

use serde::{
    de::{MapAccess, Visitor},
    Deserialize, Deserializer, Serialize,
};
use thiserror::Error;

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "CAMLI_CONFIG_DIR";

pub const CLIENT_CONFIG_FILE: &str = "client-config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot determine the home directory")]
    NoHomeDir,

    #[error("cannot read client config '{path}': {source}")]
    Read {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse client config '{path}': {source}")]
    Parse {
        path:   PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no default server found in client config")]
    NoDefaultServer,

    #[error("unknown auth method '{0}'")]
    UnknownAuthMethod(String),

    #[error("malformed auth setting, expected 'userpass:<user>:<password>'")]
    MalformedAuth,
}

// ─── ClientConfig ─────────────────────────────────────────────────────────────
/// Contents of client-config.json. Fields we do not use are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientConfig {
    /// (name, server) pairs in the order the file lists them
    #[serde(default, deserialize_with = "servers_in_file_order")]
    pub servers: Vec<(String, ServerConfig)>,
}

impl ClientConfig {
    /// Read client-config.json from `dir`.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CLIENT_CONFIG_FILE);

        let json = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

        let config = serde_json::from_str(&json)
            .map_err(|source| ConfigError::Parse { path: path.clone(), source })?;

        tracing::debug!("Read client config from '{}'", path.display());
        Ok(config)
    }

    /// Read client-config.json from the discovered config directory.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(&config_dir()?)
    }

    /// The first server flagged as default.
    pub fn default_server(&self) -> Result<&ServerConfig, ConfigError> {
        self.servers
            .iter()
            .map(|(_, server)| server)
            .find(|s| s.default)
            .ok_or(ConfigError::NoDefaultServer)
    }
}

/// Read the "servers" object without losing its key order.
fn servers_in_file_order<'de, D>(deserializer: D) -> Result<Vec<(String, ServerConfig)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ServersVisitor;

    impl<'de> Visitor<'de> for ServersVisitor {
        type Value = Vec<(String, ServerConfig)>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a map from server name to server settings")
        }

        fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut servers = Vec::new();
            while let Some(entry) = access.next_entry()? {
                servers.push(entry);
            }
            Ok(servers)
        }
    }

    deserializer.deserialize_map(ServersVisitor)
}

// ─── ServerConfig ─────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL, e.g. https://localhost:3179
    pub server: String,

    /// "<method>:<user>:<password>"
    #[serde(default)]
    pub auth: String,

    #[serde(default)]
    pub default: bool,
}

impl ServerConfig {
    pub fn credentials(&self) -> Result<Auth, ConfigError> {
        Auth::parse(&self.auth)
    }
}

// ─── Auth ─────────────────────────────────────────────────────────────────────
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    UserPass { user: String, password: String },
}

impl Auth {
    /// Parse an auth setting. Only `userpass` is supported. The
    /// password is everything after the second colon.
    pub fn parse(setting: &str) -> Result<Self, ConfigError> {
        let mut parts = setting.splitn(3, ':');

        let method = parts.next().unwrap_or_default();
        if method != "userpass" {
            return Err(ConfigError::UnknownAuthMethod(method.to_string()));
        }

        match (parts.next(), parts.next()) {
            (Some(user), Some(password)) => Ok(Self::UserPass {
                user:     user.to_string(),
                password: password.to_string(),
            }),
            _ => Err(ConfigError::MalformedAuth),
        }
    }
}

// Keep passwords out of logs
impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserPass { user, .. } => f
                .debug_struct("UserPass")
                .field("user", user)
                .field("password", &"***")
                .finish(),
        }
    }
}

// ─── Config directory discovery ───────────────────────────────────────────────
/// Where client-config.json lives on this machine.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    resolve_config_dir(env::var_os(CONFIG_DIR_ENV), dirs::home_dir())
}

fn resolve_config_dir(
    env_dir: Option<OsString>,
    home:    Option<PathBuf>,
) -> Result<PathBuf, ConfigError> {
    if let Some(dir) = env_dir {
        return Ok(PathBuf::from(dir));
    }

    let home = home.ok_or(ConfigError::NoHomeDir)?;
    if cfg!(windows) {
        Ok(home.join("AppData").join("Roaming").join("Camlistore"))
    } else {
        Ok(home.join(".config").join("camlistore"))
    }
}
