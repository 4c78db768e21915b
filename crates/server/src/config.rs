//! CLI-facing server configuration: wraps the library's tunables with the
//! handful of fields that only make sense at the binary level.

use outland::ServerConfig as CoreConfig;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub core: CoreConfig,
    pub max_teams: u8,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            core: CoreConfig::default(),
            max_teams: 4,
        }
    }
}
