//! Dictionary service configuration / 词典服务配置
//!
//! Read from `config.json` in the working directory; written with defaults
//! when missing. Every section may be omitted / 各节均可省略

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::search::compiler::{CompileOptions, ExcludeStyle, ExpandStyle};

/// Application configuration / 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration / 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration / 数据库配置
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Search configuration / 搜索配置
    #[serde(default)]
    pub search: SearchConfig,
    /// Client configuration / 客户端配置
    #[serde(default)]
    pub client: ClientConfig,
}

/// Server configuration / 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address / 服务器监听地址
    pub host: String,
    /// Server port / 服务器端口
    pub port: u16,
}

/// Database configuration / 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Data directory path / 数据目录路径
    pub data_dir: String,
    /// Dictionary database file (relative to data_dir) / 词典数据库文件
    pub db_file: String,
    /// Pool size / 连接池大小
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// Search configuration / 搜索配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Response cache TTL in seconds / 响应缓存过期时间（秒）
    pub cache_ttl_secs: u64,
    /// Maximum cached responses / 最大缓存条数
    pub cache_capacity: usize,
    /// Timeout per store query in seconds / 单次查询超时（秒）
    pub store_timeout_secs: u64,
    /// Rows loaded per search, best rank first; 0 disables the cap / 单次搜索加载行数上限
    #[serde(default = "default_max_match_rows")]
    pub max_match_rows: u32,
    #[serde(default)]
    pub expand_style: ExpandStyle,
    #[serde(default)]
    pub exclude_style: ExcludeStyle,
}

/// Client configuration / 客户端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API base URL / API 基础 URL
    pub base_url: String,
    /// Minimum interval between searches in milliseconds / 搜索最小间隔（毫秒）
    pub min_interval_ms: u64,
    /// Request timeout in seconds / 请求超时（秒）
    pub timeout_secs: u64,
}

fn default_max_connections() -> u32 { 4 }

fn default_max_match_rows() -> u32 { 5_000 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8787,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            db_file: "dict.db".to_string(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 60 * 60 * 24 * 6, // 6 天
            cache_capacity: 10_000,
            store_timeout_secs: 8,
            max_match_rows: default_max_match_rows(),
            expand_style: ExpandStyle::default(),
            exclude_style: ExcludeStyle::default(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8787".to_string(),
            min_interval_ms: 1000,
            timeout_secs: 8,
        }
    }
}

impl SearchConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs.max(1))
    }

    pub fn match_limit(&self) -> Option<u32> {
        Some(self.max_match_rows).filter(|n| *n > 0)
    }

    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            expand: self.expand_style,
            exclude: self.exclude_style,
        }
    }
}

impl ClientConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl AppConfig {
    /// Get the full database URL / 获取完整的数据库URL
    pub fn get_database_url(&self) -> String {
        let db_path = Path::new(&self.database.data_dir).join(&self.database.db_file);
        format!("sqlite:{}?mode=rwc", db_path.to_string_lossy())
    }

    /// Get the full data directory path / 获取完整的数据目录路径
    pub fn get_data_dir(&self) -> PathBuf {
        PathBuf::from(&self.database.data_dir)
    }

    /// Get the server bind address / 获取服务器绑定地址
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Get the config file path / 获取配置文件路径
fn get_config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("config.json")
}

/// Load configuration from file, or create default if not exists / 加载配置文件，不存在则创建默认配置
pub fn load_config() -> Result<AppConfig, String> {
    load_config_from(&get_config_path())
}

/// Load configuration from a specific path / 从指定路径加载配置
pub fn load_config_from(config_path: &Path) -> Result<AppConfig, String> {
    if config_path.exists() {
        // Load existing config / 加载现有配置
        let content = std::fs::read_to_string(config_path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;

        tracing::info!("Loaded configuration from {:?}", config_path);
        Ok(config)
    } else {
        // Create default config / 创建默认配置
        let config = AppConfig::default();
        save_config_to(&config, config_path)?;
        tracing::info!("Created default configuration at {:?}", config_path);
        Ok(config)
    }
}

/// Save configuration to file / 保存配置到文件
fn save_config_to(config: &AppConfig, config_path: &Path) -> Result<(), String> {
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;

    std::fs::write(config_path, content)
        .map_err(|e| format!("Failed to write config file: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = load_config_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.search.cache_ttl_secs, 518_400);
        assert_eq!(config.search.store_timeout(), Duration::from_secs(8));
        assert_eq!(config.client.min_interval(), Duration::from_millis(1000));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"server": {"host": "127.0.0.1", "port": 9000},
                "search": {"cache_ttl_secs": 60, "cache_capacity": 10, "store_timeout_secs": 5, "expand_style": "prefix_only"}}"#,
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.get_bind_address(), "127.0.0.1:9000");
        assert_eq!(config.search.compile_options().expand, ExpandStyle::PrefixOnly);
        assert_eq!(config.search.compile_options().exclude, ExcludeStyle::Exact);
        assert_eq!(config.database.db_file, "dict.db");
        assert_eq!(config.search.match_limit(), Some(5_000));
    }

    #[test]
    fn test_zero_match_rows_disables_cap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"search": {"cache_ttl_secs": 60, "cache_capacity": 10, "store_timeout_secs": 5, "max_match_rows": 0}}"#,
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.search.match_limit(), None);
    }

    #[test]
    fn test_database_url() {
        let config = AppConfig::default();
        assert!(config.get_database_url().starts_with("sqlite:"));
        assert!(config.get_database_url().ends_with("dict.db?mode=rwc"));
    }
}
