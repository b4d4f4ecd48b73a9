//! 报文解码：原始 RFC 822 字节 → 报告内容。

use domain::ReportMessage;
use mail_parser::MessageParser;

/// 解码一封报告：主题、原始 Date 头与首个文本正文。
///
/// 多段（multipart）报文取第一个文本载荷。Date 头按原始字符串透传
/// （仅去首尾空白），不做时间解析。无法解析或没有文本正文时返回
/// None，由调用方按非报告邮件处理。
pub fn decode_report(raw: &[u8]) -> Option<ReportMessage> {
    let message = MessageParser::default().parse(raw)?;
    let subject = message.subject().unwrap_or_default().to_string();
    let date_time = message
        .header_raw("Date")
        .map(|value| value.trim().to_string())
        .unwrap_or_default();
    let body = message.body_text(0)?.into_owned();
    Some(ReportMessage {
        subject,
        date_time,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_plain_report() {
        let raw = b"Subject: Profilux-Value\r\n\
            Date: Tue, 25 May 2023 16:00:00 +0000\r\n\
            From: controller@reef.local\r\n\
            \r\n\
            Temperatur 1 : 25.5C\r\n";

        let report = decode_report(raw).expect("decoded");
        assert_eq!(report.subject, "Profilux-Value");
        // Date 必须原样透传，不经重新格式化。
        assert_eq!(report.date_time, "Tue, 25 May 2023 16:00:00 +0000");
        assert!(report.body.contains("Temperatur 1 : 25.5C"));
    }

    #[test]
    fn multipart_takes_first_text_payload() {
        let raw = b"Subject: Profilux-Value\r\n\
            Date: Tue, 25 May 2023 16:00:00 +0000\r\n\
            MIME-Version: 1.0\r\n\
            Content-Type: multipart/alternative; boundary=\"b1\"\r\n\
            \r\n\
            --b1\r\n\
            Content-Type: text/plain; charset=utf-8\r\n\
            \r\n\
            KH Director : 8.0dKH\r\n\
            --b1\r\n\
            Content-Type: text/html\r\n\
            \r\n\
            <p>KH Director : 8.0dKH</p>\r\n\
            --b1--\r\n";

        let report = decode_report(raw).expect("decoded");
        assert!(report.body.contains("KH Director : 8.0dKH"));
        assert!(!report.body.contains("<p>"));
    }

    #[test]
    fn empty_input_is_not_a_report() {
        assert!(decode_report(b"").is_none());
    }
}
