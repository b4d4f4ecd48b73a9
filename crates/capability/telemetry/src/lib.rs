//! 追踪与轮询指标。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 基础指标快照。
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub reports_listed: u64,
    pub reports_consumed: u64,
    pub reports_skipped: u64,
    pub reports_retained: u64,
    pub records_extracted: u64,
    pub messages_published: u64,
    pub publish_failures: u64,
    pub archives_written: u64,
    pub archive_failures: u64,
    pub cycles_completed: u64,
}

/// 基础指标。
pub struct TelemetryMetrics {
    reports_listed: AtomicU64,
    reports_consumed: AtomicU64,
    reports_skipped: AtomicU64,
    reports_retained: AtomicU64,
    records_extracted: AtomicU64,
    messages_published: AtomicU64,
    publish_failures: AtomicU64,
    archives_written: AtomicU64,
    archive_failures: AtomicU64,
    cycles_completed: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            reports_listed: AtomicU64::new(0),
            reports_consumed: AtomicU64::new(0),
            reports_skipped: AtomicU64::new(0),
            reports_retained: AtomicU64::new(0),
            records_extracted: AtomicU64::new(0),
            messages_published: AtomicU64::new(0),
            publish_failures: AtomicU64::new(0),
            archives_written: AtomicU64::new(0),
            archive_failures: AtomicU64::new(0),
            cycles_completed: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            reports_listed: self.reports_listed.load(Ordering::Relaxed),
            reports_consumed: self.reports_consumed.load(Ordering::Relaxed),
            reports_skipped: self.reports_skipped.load(Ordering::Relaxed),
            reports_retained: self.reports_retained.load(Ordering::Relaxed),
            records_extracted: self.records_extracted.load(Ordering::Relaxed),
            messages_published: self.messages_published.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
            archives_written: self.archives_written.load(Ordering::Relaxed),
            archive_failures: self.archive_failures.load(Ordering::Relaxed),
            cycles_completed: self.cycles_completed.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的轮询周期 cycle_id。
pub fn new_cycle_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// 记录一次列举到的报告数量。
pub fn record_reports_listed(count: u64) {
    metrics().reports_listed.fetch_add(count, Ordering::Relaxed);
}

/// 记录报告消费（发布完成并标记删除）次数。
pub fn record_report_consumed() {
    metrics().reports_consumed.fetch_add(1, Ordering::Relaxed);
}

/// 记录非报告邮件跳过次数（主题不匹配或无法解码）。
pub fn record_report_skipped() {
    metrics().reports_skipped.fetch_add(1, Ordering::Relaxed);
}

/// 记录报告保留重试次数（发布失败等原因未消费）。
pub fn record_report_retained() {
    metrics().reports_retained.fetch_add(1, Ordering::Relaxed);
}

/// 记录解析出的测量记录数量。
pub fn record_records_extracted(count: u64) {
    metrics().records_extracted.fetch_add(count, Ordering::Relaxed);
}

/// 记录成功发布的消息次数。
pub fn record_message_published() {
    metrics().messages_published.fetch_add(1, Ordering::Relaxed);
}

/// 记录批次发布失败次数。
pub fn record_publish_failure() {
    metrics().publish_failures.fetch_add(1, Ordering::Relaxed);
}

/// 记录归档 blob 写入成功次数。
pub fn record_archive_written() {
    metrics().archives_written.fetch_add(1, Ordering::Relaxed);
}

/// 记录归档写入失败次数。
pub fn record_archive_failure() {
    metrics().archive_failures.fetch_add(1, Ordering::Relaxed);
}

/// 记录完成的轮询周期次数。
pub fn record_cycle_completed() {
    metrics().cycles_completed.fetch_add(1, Ordering::Relaxed);
}
