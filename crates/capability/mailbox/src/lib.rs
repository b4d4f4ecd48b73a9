//! 邮箱接入：报告列举/拉取/删除/压缩，以及报文解码。

pub mod imap;
pub mod report;

pub use imap::{ImapMailbox, ImapMailboxConfig};
pub use report::decode_report;

use async_trait::async_trait;
use domain::RawReport;

/// 邮箱访问错误。
#[derive(Debug, thiserror::Error)]
pub enum MailboxError {
    #[error("connect error: {0}")]
    Connect(String),
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// 邮箱抽象：邮箱本身即队列，消费即删除。
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// 列举当前存在的全部报告 UID（无"上次检查"游标，已消费的报告已被删除）。
    async fn list(&self) -> Result<Vec<u32>, MailboxError>;
    /// 拉取完整报文（peek，不改变已读状态）。
    async fn fetch(&self, uid: u32) -> Result<RawReport, MailboxError>;
    /// 标记删除；物理清除由 expunge 完成。
    async fn mark_deleted(&self, uid: u32) -> Result<(), MailboxError>;
    /// 压缩邮箱：物理清除所有已标记删除的报文。
    async fn expunge(&self) -> Result<(), MailboxError>;
}
