//! 批次归档：整批 Envelope 序列化为单个对象写入对象存储。

use domain::Batch;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

/// 归档错误。
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("store error: {0}")]
    Store(String),
    #[error("payload error: {0}")]
    Payload(String),
}

/// Azure Blob 归档目标配置。
#[derive(Debug, Clone)]
pub struct AzureArchiveConfig {
    pub account: String,
    pub access_key: String,
    pub container: String,
}

/// 构造 Azure Blob 后端；凭据或容器名非法即启动失败。
pub fn connect_azure(config: &AzureArchiveConfig) -> Result<Arc<dyn ObjectStore>, ArchiveError> {
    let store = MicrosoftAzureBuilder::new()
        .with_account(&config.account)
        .with_access_key(&config.access_key)
        .with_container_name(&config.container)
        .build()
        .map_err(|err| ArchiveError::Store(err.to_string()))?;
    Ok(Arc::new(store))
}

/// 归档落地器。
///
/// 对象键按落地时刻的 Unix 秒生成；批次串行处理，秒级粒度足够，
/// 撞键时直接覆盖。
#[derive(Clone)]
pub struct ArchiveSink {
    store: Arc<dyn ObjectStore>,
}

impl ArchiveSink {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// 将整个批次写成一个 JSON blob，返回对象键。
    pub async fn archive(&self, batch: &Batch) -> Result<String, ArchiveError> {
        let payload =
            serde_json::to_vec(batch).map_err(|err| ArchiveError::Payload(err.to_string()))?;
        let key = format!("{}.txt", now_epoch_secs());
        self.store
            .put(&Path::from(key.as_str()), PutPayload::from(payload))
            .await
            .map_err(|err| ArchiveError::Store(err.to_string()))?;
        info!(target: "reef.archive", key = %key, entries = batch.len(), "batch_archived");
        Ok(key)
    }
}

fn now_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Envelope;
    use object_store::memory::InMemory;

    #[tokio::test]
    async fn archive_writes_single_json_blob() {
        let store = Arc::new(InMemory::new());
        let sink = ArchiveSink::new(store.clone());
        let mut batch = Batch::new();
        batch.insert(
            "/profilux_mqtt/kh".to_string(),
            Envelope {
                value: 8.0,
                date_time: "Tue, 25 May 2023 16:00:00 +0000".to_string(),
                unit: "dKH".to_string(),
            },
        );

        let key = sink.archive(&batch).await.expect("archived");
        assert!(key.ends_with(".txt"));
        assert!(
            key.trim_end_matches(".txt")
                .chars()
                .all(|ch| ch.is_ascii_digit())
        );

        let stored = store
            .get(&Path::from(key.as_str()))
            .await
            .expect("blob")
            .bytes()
            .await
            .expect("bytes");
        let decoded: Batch = serde_json::from_slice(&stored).expect("json");
        assert_eq!(decoded, batch);
    }

    #[tokio::test]
    async fn empty_batch_archives_as_empty_object() {
        let store = Arc::new(InMemory::new());
        let sink = ArchiveSink::new(store.clone());

        let key = sink.archive(&Batch::new()).await.expect("archived");

        let stored = store
            .get(&Path::from(key.as_str()))
            .await
            .expect("blob")
            .bytes()
            .await
            .expect("bytes");
        assert_eq!(stored.as_ref(), b"{}");
    }
}
