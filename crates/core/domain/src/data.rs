use std::collections::BTreeMap;

/// 邮箱中的一封原始报告（未解码）。
#[derive(Debug, Clone)]
pub struct RawReport {
    /// 邮箱分配的消息标识（IMAP UID）。
    pub uid: u32,
    /// 完整的 RFC 822 报文字节。
    pub raw: Vec<u8>,
}

/// 解码后的报告内容。
#[derive(Debug, Clone)]
pub struct ReportMessage {
    pub subject: String,
    /// 原始 Date 头字符串，按原样透传，不重新解析。
    pub date_time: String,
    pub body: String,
}

/// 解析得到的一条测量记录。
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// 规范化后的测量类型（经别名表映射）。
    pub kind: String,
    /// 标签尾部的数字序号；标签不以数字结尾时为 None。
    pub index: Option<u32>,
    /// 探头子通道，保留字段；行解析不会产生。
    pub subtype: Option<String>,
    pub value: f64,
    /// 单位符号；缺失时为空字符串。
    pub unit: String,
}

/// 发布与归档共用的消息载荷。
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Envelope {
    pub value: f64,
    pub date_time: String,
    pub unit: String,
}

/// 一封报告派生的 topic → Envelope 集合；同 topic 后写覆盖先写。
pub type Batch = BTreeMap<String, Envelope>;
