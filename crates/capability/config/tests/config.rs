use reef_config::{AppConfig, ConfigError};

#[test]
fn load_config_from_env() {
    // Rust 2024 中 set_var 需要显式标注 unsafe（测试进程内可控）。
    // 先在变量缺失时断言启动失败，再补全后断言默认值生效；
    // 两步放在同一个测试内，避免并行测试之间的环境串扰。
    unsafe {
        std::env::remove_var("REEF_SERVICE_NAME");
        std::env::set_var("REEF_IMAP_SERVER", "imap.example.org");
        std::env::set_var("REEF_IMAP_USER", "reef");
        std::env::set_var("REEF_IMAP_PASSWORD", "secret");
        std::env::set_var("REEF_MQTT_HOST", "127.0.0.1");
        std::env::set_var("REEF_MQTT_PORT", "1883");
        std::env::set_var("REEF_MQTT_USERNAME", "mqtt");
        std::env::set_var("REEF_MQTT_PASSWORD", "mqtt-secret");
        std::env::set_var("REEF_STORE_ACCOUNT", "reefstore");
        std::env::set_var("REEF_STORE_ACCESS_KEY", "store-key");
        std::env::set_var("REEF_STORE_CONTAINER", "reports");
    }

    let missing = AppConfig::from_env().expect_err("service name absent");
    assert!(matches!(missing, ConfigError::Missing(key) if key == "REEF_SERVICE_NAME"));

    unsafe {
        std::env::set_var("REEF_SERVICE_NAME", "profilux_mqtt");
    }

    let config = AppConfig::from_env().expect("config");
    assert_eq!(config.service_name, "profilux_mqtt");
    assert_eq!(config.imap_port, 993);
    assert_eq!(config.imap_mailbox, "INBOX");
    assert_eq!(config.report_subject, "Profilux-Value");
    assert_eq!(config.poll_interval_seconds, 60);
    assert_eq!(config.mqtt_port, 1883);
    assert_eq!(config.mqtt_client_id, "profilux_mqtt_service");

    unsafe {
        std::env::set_var("REEF_MQTT_PORT", "not-a-port");
    }
    let invalid = AppConfig::from_env().expect_err("port not numeric");
    assert!(matches!(invalid, ConfigError::Invalid(key, _) if key == "REEF_MQTT_PORT"));
}
