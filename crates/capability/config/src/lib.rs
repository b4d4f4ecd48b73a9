//! 应用运行配置加载。

use std::env;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// topic 前缀中的服务名（如 profilux_mqtt）。
    pub service_name: String,
    pub imap_server: String,
    pub imap_port: u16,
    pub imap_user: String,
    pub imap_password: String,
    pub imap_mailbox: String,
    /// 识别为测量报告的邮件主题。
    pub report_subject: String,
    pub poll_interval_seconds: u64,
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub mqtt_username: String,
    pub mqtt_password: String,
    pub mqtt_client_id: String,
    pub store_account: String,
    pub store_access_key: String,
    pub store_container: String,
}

impl AppConfig {
    /// 从环境变量读取配置。必填项缺失即启动失败，不进入轮询。
    pub fn from_env() -> Result<Self, ConfigError> {
        let service_name = read_required("REEF_SERVICE_NAME")?;
        let imap_server = read_required("REEF_IMAP_SERVER")?;
        let imap_port = read_u16_with_default("REEF_IMAP_PORT", 993)?;
        let imap_user = read_required("REEF_IMAP_USER")?;
        let imap_password = read_required("REEF_IMAP_PASSWORD")?;
        let imap_mailbox = env::var("REEF_IMAP_MAILBOX").unwrap_or_else(|_| "INBOX".to_string());
        let report_subject =
            env::var("REEF_REPORT_SUBJECT").unwrap_or_else(|_| "Profilux-Value".to_string());
        let poll_interval_seconds = read_u64_with_default("REEF_POLL_INTERVAL_SECONDS", 60)?;
        let mqtt_host = read_required("REEF_MQTT_HOST")?;
        let mqtt_port = read_u16("REEF_MQTT_PORT")?;
        let mqtt_username = read_required("REEF_MQTT_USERNAME")?;
        let mqtt_password = read_required("REEF_MQTT_PASSWORD")?;
        let mqtt_client_id = env::var("REEF_MQTT_CLIENT_ID")
            .unwrap_or_else(|_| format!("{}_service", service_name));
        let store_account = read_required("REEF_STORE_ACCOUNT")?;
        let store_access_key = read_required("REEF_STORE_ACCESS_KEY")?;
        let store_container = read_required("REEF_STORE_CONTAINER")?;

        Ok(Self {
            service_name,
            imap_server,
            imap_port,
            imap_user,
            imap_password,
            imap_mailbox,
            report_subject,
            poll_interval_seconds,
            mqtt_host,
            mqtt_port,
            mqtt_username,
            mqtt_password,
            mqtt_client_id,
            store_account,
            store_access_key,
            store_container,
        })
    }
}

/// 读取必填环境变量。
fn read_required(key: &str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(key.to_string())),
    }
}

/// 读取必填 u16 类型环境变量。
fn read_u16(key: &str) -> Result<u16, ConfigError> {
    let value = env::var(key).map_err(|_| ConfigError::Missing(key.to_string()))?;
    value
        .parse::<u16>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u16_with_default(key: &str, default: u16) -> Result<u16, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u16>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}
