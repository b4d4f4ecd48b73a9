//! 邮件测量报告 → MQTT/对象存储 桥接服务入口。

use reef_archive::{ArchiveSink, AzureArchiveConfig, connect_azure};
use reef_config::AppConfig;
use reef_mailbox::{ImapMailbox, ImapMailboxConfig};
use reef_pipeline::{Poller, PollerConfig};
use reef_publish::{BatchPublisher, MqttPublisher, MqttPublisherConfig, TopicBuilder};
use reef_telemetry::init_tracing;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 从环境变量加载运行配置；必填项缺失即启动失败
    let config = AppConfig::from_env()?;
    // 初始化结构化日志
    init_tracing();

    // 三个外部协作方客户端在启动期一次性构造，引用传入轮询器，
    // 生命周期与进程一致（不再使用进程级全局句柄）。
    let mailbox = Arc::new(
        ImapMailbox::connect(ImapMailboxConfig {
            server: config.imap_server.clone(),
            port: config.imap_port,
            username: config.imap_user.clone(),
            password: config.imap_password.clone(),
            mailbox: config.imap_mailbox.clone(),
        })
        .await?,
    );
    info!(server = %config.imap_server, mailbox = %config.imap_mailbox, "imap_ready");

    let (publisher, _mqtt_eventloop) = MqttPublisher::connect(MqttPublisherConfig {
        host: config.mqtt_host.clone(),
        port: config.mqtt_port,
        username: config.mqtt_username.clone(),
        password: config.mqtt_password.clone(),
        client_id: config.mqtt_client_id.clone(),
    });
    info!(host = %config.mqtt_host, port = config.mqtt_port, client_id = %config.mqtt_client_id, "mqtt_ready");

    let store = connect_azure(&AzureArchiveConfig {
        account: config.store_account.clone(),
        access_key: config.store_access_key.clone(),
        container: config.store_container.clone(),
    })?;
    info!(container = %config.store_container, "archive_ready");

    let poller = Poller::new(
        mailbox,
        TopicBuilder::new(config.service_name.clone()),
        BatchPublisher::new(Arc::new(publisher)),
        ArchiveSink::new(store),
        PollerConfig {
            report_subject: config.report_subject.clone(),
            poll_interval: Duration::from_secs(config.poll_interval_seconds),
        },
    );

    // 停机信号：Ctrl-C 置位 watch 通道，轮询器在周期间隙检查后干净退出。
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let poller_task = tokio::spawn(poller.run(shutdown_rx));

    tokio::signal::ctrl_c().await?;
    info!("shutdown_requested");
    let _ = shutdown_tx.send(true);
    poller_task.await?;
    Ok(())
}
