//! IMAPS 邮箱客户端。

use crate::{Mailbox, MailboxError};
use async_trait::async_trait;
use domain::RawReport;
use futures::TryStreamExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::warn;

type ImapSession = async_imap::Session<async_native_tls::TlsStream<TcpStream>>;

/// IMAP 邮箱配置。
#[derive(Debug, Clone)]
pub struct ImapMailboxConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub mailbox: String,
}

/// 基于 IMAPS 的邮箱客户端。
///
/// 会话缓存在互斥锁内；协议错误时丢弃会话，下一次调用重新登录，
/// 连接级故障只影响当前周期，不影响进程存活。
pub struct ImapMailbox {
    config: ImapMailboxConfig,
    session: Mutex<Option<ImapSession>>,
}

impl ImapMailbox {
    /// 建立首个会话；启动期失败直接上抛，不进入轮询。
    pub async fn connect(config: ImapMailboxConfig) -> Result<Self, MailboxError> {
        let session = open_session(&config).await?;
        Ok(Self {
            config,
            session: Mutex::new(Some(session)),
        })
    }

    async fn ensure_session<'a>(
        &self,
        slot: &'a mut Option<ImapSession>,
    ) -> Result<&'a mut ImapSession, MailboxError> {
        if slot.is_none() {
            warn!(target: "reef.mailbox", server = %self.config.server, "imap_session_reopen");
            *slot = Some(open_session(&self.config).await?);
        }
        match slot.as_mut() {
            Some(session) => Ok(session),
            None => Err(MailboxError::Protocol("session unavailable".to_string())),
        }
    }
}

async fn open_session(config: &ImapMailboxConfig) -> Result<ImapSession, MailboxError> {
    let tcp = TcpStream::connect((config.server.as_str(), config.port))
        .await
        .map_err(|err| MailboxError::Connect(err.to_string()))?;
    let stream = async_native_tls::TlsConnector::new()
        .connect(&config.server, tcp)
        .await
        .map_err(|err| MailboxError::Connect(err.to_string()))?;
    let client = async_imap::Client::new(stream);
    let mut session = client
        .login(&config.username, &config.password)
        .await
        .map_err(|(err, _client)| MailboxError::Connect(err.to_string()))?;
    session
        .select(&config.mailbox)
        .await
        .map_err(|err| MailboxError::Protocol(err.to_string()))?;
    Ok(session)
}

#[async_trait]
impl Mailbox for ImapMailbox {
    async fn list(&self) -> Result<Vec<u32>, MailboxError> {
        let mut guard = self.session.lock().await;
        let session = self.ensure_session(&mut guard).await?;
        // 每次列举前重新 SELECT，刷新邮箱视图（新报告在两次轮询之间到达）。
        let result = async {
            session.select(&self.config.mailbox).await?;
            session.uid_search("ALL").await
        }
        .await;
        match result {
            Ok(uids) => {
                let mut uids: Vec<u32> = uids.into_iter().collect();
                uids.sort_unstable();
                Ok(uids)
            }
            Err(err) => {
                *guard = None;
                Err(MailboxError::Protocol(err.to_string()))
            }
        }
    }

    async fn fetch(&self, uid: u32) -> Result<RawReport, MailboxError> {
        let mut guard = self.session.lock().await;
        let session = self.ensure_session(&mut guard).await?;
        let query = uid.to_string();
        let result = async {
            let stream = session.uid_fetch(&query, "(BODY.PEEK[])").await?;
            let fetches: Vec<_> = stream.try_collect().await?;
            Ok::<_, async_imap::error::Error>(fetches)
        }
        .await;
        match result {
            Ok(fetches) => {
                let Some(body) = fetches.iter().find_map(|fetch| fetch.body()) else {
                    return Err(MailboxError::Protocol(format!(
                        "uid {uid}: fetch response has no body"
                    )));
                };
                Ok(RawReport {
                    uid,
                    raw: body.to_vec(),
                })
            }
            Err(err) => {
                *guard = None;
                Err(MailboxError::Protocol(err.to_string()))
            }
        }
    }

    async fn mark_deleted(&self, uid: u32) -> Result<(), MailboxError> {
        let mut guard = self.session.lock().await;
        let session = self.ensure_session(&mut guard).await?;
        let query = uid.to_string();
        let result = async {
            let updates = session.uid_store(&query, "+FLAGS (\\Deleted)").await?;
            let _flags: Vec<_> = updates.try_collect().await?;
            Ok::<_, async_imap::error::Error>(())
        }
        .await;
        match result {
            Ok(()) => Ok(()),
            Err(err) => {
                *guard = None;
                Err(MailboxError::Protocol(err.to_string()))
            }
        }
    }

    async fn expunge(&self) -> Result<(), MailboxError> {
        let mut guard = self.session.lock().await;
        let session = self.ensure_session(&mut guard).await?;
        let result = async {
            let purged = session.expunge().await?;
            let _seqs: Vec<_> = purged.try_collect().await?;
            Ok::<_, async_imap::error::Error>(())
        }
        .await;
        match result {
            Ok(()) => Ok(()),
            Err(err) => {
                *guard = None;
                Err(MailboxError::Protocol(err.to_string()))
            }
        }
    }
}
