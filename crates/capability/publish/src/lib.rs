use async_trait::async_trait;
use domain::{Batch, Envelope, Measurement};
use reef_telemetry::record_message_published;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{info, warn};

/// 发布链路错误。
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("broker not connected")]
    NotConnected,
    #[error("broker error: {0}")]
    Broker(String),
    #[error("payload error: {0}")]
    Payload(String),
}

/// topic 与 Envelope 构造器。纯函数，无 I/O，不会失败。
#[derive(Debug, Clone)]
pub struct TopicBuilder {
    service_name: String,
}

impl TopicBuilder {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    /// 由一条测量记录构造 (topic, envelope)。
    ///
    /// topic 形如 `/<service>/<type 小写>[/<index>][/<subtype 小写>]`；
    /// index 仅在存在且非零时追加，subtype 仅在存在且非空时追加。
    pub fn build(&self, record: &Measurement, date_time: &str) -> (String, Envelope) {
        let mut topic = format!("/{}/{}", self.service_name, record.kind.to_lowercase());
        if let Some(index) = record.index {
            if index != 0 {
                topic.push_str(&format!("/{index}"));
            }
        }
        if let Some(subtype) = record.subtype.as_deref() {
            if !subtype.is_empty() {
                topic.push_str(&format!("/{}", subtype.to_lowercase()));
            }
        }
        let envelope = Envelope {
            value: record.value,
            date_time: date_time.to_string(),
            unit: record.unit.clone(),
        };
        (topic, envelope)
    }

    /// 将整封报告的记录合并为一个批次；同 topic 后写覆盖先写。
    pub fn build_batch(&self, records: &[Measurement], date_time: &str) -> Batch {
        let mut batch = Batch::new();
        for record in records {
            let (topic, envelope) = self.build(record, date_time);
            batch.insert(topic, envelope);
        }
        batch
    }
}

/// 消息总线发布抽象。
#[async_trait]
pub trait BrokerPublisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), PublishError>;
}

/// MQTT 发布器配置。
#[derive(Debug, Clone)]
pub struct MqttPublisherConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// 进程级固定的客户端标识。
    pub client_id: String,
}

/// MQTT 发布器。
///
/// 事件循环在独立后台任务中运行（保活与入站流控）；主流程只在发布前
/// 检查连接标志，逐条发布不等待确认（QoS 0 即发即弃）。
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
    connected: Arc<AtomicBool>,
}

impl MqttPublisher {
    pub fn connect(config: MqttPublisherConfig) -> (Self, tokio::task::JoinHandle<()>) {
        let mut options = MqttOptions::new(config.client_id, config.host, config.port);
        options.set_keep_alive(Duration::from_secs(30));
        options.set_credentials(config.username, config.password);
        let (client, mut eventloop) = AsyncClient::new(options, 10);
        let connected = Arc::new(AtomicBool::new(false));
        let flag = connected.clone();
        let handle = tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!(target: "reef.publish", "mqtt_connected");
                        flag.store(true, Ordering::Relaxed);
                    }
                    Ok(_) => {}
                    Err(err) => {
                        flag.store(false, Ordering::Relaxed);
                        warn!(target: "reef.publish", "mqtt eventloop error: {}", err);
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });
        (Self { client, connected }, handle)
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl BrokerPublisher for MqttPublisher {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        if !self.is_connected() {
            return Err(PublishError::NotConnected);
        }
        self.client
            .publish(topic, QoS::AtMostOnce, false, payload)
            .await
            .map_err(|err| PublishError::Broker(err.to_string()))
    }
}

/// 批量发布器：将一个批次逐条编码并发布。
#[derive(Clone)]
pub struct BatchPublisher {
    broker: Arc<dyn BrokerPublisher>,
}

impl BatchPublisher {
    pub fn new(broker: Arc<dyn BrokerPublisher>) -> Self {
        Self { broker }
    }

    /// 发布一个批次的全部条目，返回发布条数。
    ///
    /// 任一条目失败（含连接未建立）即放弃批次剩余部分并整体报错，
    /// 由调用方保留报告等待下一周期重试。
    pub async fn publish_batch(&self, batch: &Batch) -> Result<usize, PublishError> {
        let mut published = 0usize;
        for (topic, envelope) in batch {
            let payload = serde_json::to_vec(envelope)
                .map_err(|err| PublishError::Payload(err.to_string()))?;
            self.broker.publish(topic, payload).await?;
            record_message_published();
            info!(
                target: "reef.publish",
                topic = %topic,
                value = envelope.value,
                "measurement_published"
            );
            published += 1;
        }
        Ok(published)
    }
}
