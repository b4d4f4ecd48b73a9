//! 邮箱轮询流水线：列举 → 拉取 → 解析 → 发布 → 归档 → 消费。

use reef_archive::ArchiveSink;
use reef_extract::parse_measurements;
use reef_mailbox::{Mailbox, MailboxError, decode_report};
use reef_publish::{BatchPublisher, TopicBuilder};
use reef_telemetry::{
    new_cycle_id, record_archive_failure, record_archive_written, record_cycle_completed,
    record_publish_failure, record_records_extracted, record_report_consumed,
    record_report_retained, record_report_skipped, record_reports_listed,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{Instrument, info, info_span, warn};

/// 轮询参数。
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// 识别为测量报告的邮件主题，完全匹配。
    pub report_subject: String,
    /// 两次轮询之间的固定休眠（非自适应退避）。
    pub poll_interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            report_subject: "Profilux-Value".to_string(),
            poll_interval: Duration::from_secs(60),
        }
    }
}

/// 单个报告的处理结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// 已发布并标记删除（归档尽力而为）。
    Consumed,
    /// 非本系统的报告：永久跳过，不删除也不重试。
    Skipped,
    /// 发布失败：留在邮箱，下一周期整单重试。
    Retained,
}

/// 一个轮询周期的统计。
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleStats {
    pub listed: usize,
    pub consumed: usize,
    pub skipped: usize,
    pub retained: usize,
}

/// 邮箱轮询器：单控制流顺序驱动周期内的全部状态迁移。
pub struct Poller {
    mailbox: Arc<dyn Mailbox>,
    builder: TopicBuilder,
    publisher: BatchPublisher,
    sink: ArchiveSink,
    config: PollerConfig,
}

impl Poller {
    pub fn new(
        mailbox: Arc<dyn Mailbox>,
        builder: TopicBuilder,
        publisher: BatchPublisher,
        sink: ArchiveSink,
        config: PollerConfig,
    ) -> Self {
        Self {
            mailbox,
            builder,
            publisher,
            sink,
            config,
        }
    }

    /// 无限轮询；仅在停机信号置位后于周期间隙退出。
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                break;
            }
            let span = info_span!("cycle", cycle_id = %new_cycle_id());
            match self.cycle().instrument(span).await {
                Ok(stats) => {
                    info!(
                        target: "reef.pipeline",
                        listed = stats.listed,
                        consumed = stats.consumed,
                        skipped = stats.skipped,
                        retained = stats.retained,
                        "cycle_completed"
                    );
                }
                Err(err) => {
                    warn!(target: "reef.pipeline", error = %err, "cycle_failed");
                }
            }
            record_cycle_completed();
            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!(target: "reef.pipeline", "poller_stopped");
    }

    /// 执行一个完整周期：Listing → 逐报告处理 → 压缩邮箱。
    pub async fn cycle(&self) -> Result<CycleStats, MailboxError> {
        let uids = self.mailbox.list().await?;
        record_reports_listed(uids.len() as u64);
        let mut stats = CycleStats {
            listed: uids.len(),
            ..CycleStats::default()
        };
        for uid in uids {
            // 单报告失败只影响该报告，绝不中断外层循环。
            match self.process_report(uid).await {
                Ok(ReportOutcome::Consumed) => stats.consumed += 1,
                Ok(ReportOutcome::Skipped) => stats.skipped += 1,
                Ok(ReportOutcome::Retained) => stats.retained += 1,
                Err(err) => {
                    stats.retained += 1;
                    record_report_retained();
                    warn!(target: "reef.pipeline", uid = uid, error = %err, "report_mailbox_error");
                }
            }
        }
        self.mailbox.expunge().await?;
        Ok(stats)
    }

    /// 处理单个报告：Fetching → Parsing → Publishing → Archiving → Consuming。
    async fn process_report(&self, uid: u32) -> Result<ReportOutcome, MailboxError> {
        let raw = self.mailbox.fetch(uid).await?;

        let Some(report) = decode_report(&raw.raw) else {
            record_report_skipped();
            warn!(target: "reef.pipeline", uid = uid, "report_decode_failed");
            return Ok(ReportOutcome::Skipped);
        };
        if report.subject != self.config.report_subject {
            record_report_skipped();
            info!(
                target: "reef.pipeline",
                uid = uid,
                subject = %report.subject,
                "report_subject_mismatch"
            );
            return Ok(ReportOutcome::Skipped);
        }

        let records = parse_measurements(&report.body);
        record_records_extracted(records.len() as u64);
        let batch = self.builder.build_batch(&records, &report.date_time);

        match self.publisher.publish_batch(&batch).await {
            Ok(published) => {
                info!(
                    target: "reef.pipeline",
                    uid = uid,
                    records = records.len(),
                    published = published,
                    "report_published"
                );
            }
            Err(err) => {
                // 整批放弃；报告留在邮箱，下一周期重新解析（廉价且幂等）。
                record_publish_failure();
                record_report_retained();
                warn!(target: "reef.pipeline", uid = uid, error = %err, "report_publish_failed");
                return Ok(ReportOutcome::Retained);
            }
        }

        // 归档失败不阻塞消费：发布副作用已经发生，重复发布比缺一份归档更糟。
        match self.sink.archive(&batch).await {
            Ok(_) => record_archive_written(),
            Err(err) => {
                record_archive_failure();
                warn!(target: "reef.pipeline", uid = uid, error = %err, "archive_failed");
            }
        }

        self.mailbox.mark_deleted(uid).await?;
        record_report_consumed();
        Ok(ReportOutcome::Consumed)
    }
}
