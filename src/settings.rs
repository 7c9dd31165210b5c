use anyhow::Result;
use serde::Deserialize;

use crate::conversation::DEFAULT_CONTEXT_EXPIRY_MINUTES;

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DataSettings {
    pub menu_file: String,
    /// Optional JSON list of keyword sets replacing the built-in intents.
    pub intents_file: Option<String>,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            menu_file: "data/menu_data.json".to_string(),
            intents_file: None,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ConversationSettings {
    pub expiry_minutes: i64,
    pub order_id_prefix: String,
    pub shop_name: String,
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            expiry_minutes: DEFAULT_CONTEXT_EXPIRY_MINUTES,
            order_id_prefix: "KC".to_string(),
            shop_name: "Mata Kopian".to_string(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub data: DataSettings,
    pub conversation: ConversationSettings,
}

impl Settings {
    /// Reads `<name>.toml` (optional) and `APP_*` environment overrides,
    /// e.g. `APP_SERVER__PORT=9000` sets `server.port`.
    pub fn load(name: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(name).required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize::<Settings>()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::{const_mutex, Mutex};

    // Environment variables are process-wide.
    static ENV_LOCK: Mutex<()> = const_mutex(());

    #[test]
    fn test_defaults_when_file_missing() {
        let _guard = ENV_LOCK.lock();
        let settings = Settings::load("does-not-exist/Config").unwrap();
        assert_eq!(settings.conversation.expiry_minutes, 30);
        assert_eq!(settings.conversation.order_id_prefix, "KC");
        assert_eq!(settings.data.menu_file, "data/menu_data.json");
        assert!(settings.data.intents_file.is_none());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let _guard = ENV_LOCK.lock();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Config.toml");
        std::fs::write(
            &path,
            "[server]\nport = 9100\n\n[conversation]\nshop_name = \"Kopi Kita\"\n",
        )
        .unwrap();
        let name = dir.path().join("Config");
        let settings = Settings::load(name.to_str().unwrap()).unwrap();
        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.conversation.shop_name, "Kopi Kita");
        assert_eq!(settings.conversation.expiry_minutes, 30);
    }

    #[test]
    fn test_environment_overrides_file() {
        let _guard = ENV_LOCK.lock();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Config.toml"),
            "[conversation]\norder_id_prefix = \"KC\"\n",
        )
        .unwrap();
        std::env::set_var("APP_CONVERSATION__ORDER_ID_PREFIX", "MK");
        let name = dir.path().join("Config");
        let settings = Settings::load(name.to_str().unwrap());
        std::env::remove_var("APP_CONVERSATION__ORDER_ID_PREFIX");

        assert_eq!(settings.unwrap().conversation.order_id_prefix, "MK");
    }
}
