//! 报告正文解析：自由文本测量行 → 类型化测量记录。

use domain::Measurement;
use regex::Regex;
use std::sync::OnceLock;

/// 测量行模式：可选前导空白、标签（词字符/空格/连字符）、冒号、
/// 十进制数值、可选紧随其后的纯字母单位。
fn line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*([\w\s-]+?)\s*:\s*([\d.]+)([A-Za-z]*)").expect("measurement line pattern")
    })
}

/// 将报告正文解析为测量记录序列。
///
/// 逐行匹配；不满足模式的行（表头、空行、残缺行）静默跳过，这里是
/// 过滤而不是校验。数值段无法按 f64 解析时同样只丢弃该行，绝不中断整批。
pub fn parse_measurements(content: &str) -> Vec<Measurement> {
    let mut records = Vec::new();
    for line in content.lines() {
        let Some(captures) = line_pattern().captures(line) else {
            continue;
        };
        let Ok(value) = captures[2].parse::<f64>() else {
            continue;
        };
        let (kind, index) = split_trailing_index(&captures[1]);
        records.push(Measurement {
            kind: canonical_kind(kind).to_string(),
            index,
            subtype: None,
            value,
            unit: captures[3].to_string(),
        });
    }
    records
}

/// 固定别名表：厂商标签 → 规范短码；未知标签去空白后原样透传。
fn canonical_kind(label: &str) -> &str {
    match label {
        "pH-Wert" => "pH",
        "KH Director" => "KH",
        other => other,
    }
}

/// 标签尾部的连续数字作为序号，其余部分（右侧去空白）作为类型；
/// 夹在标签中间的数字保留在类型里。
fn split_trailing_index(label: &str) -> (&str, Option<u32>) {
    let digits = label
        .chars()
        .rev()
        .take_while(|ch| ch.is_ascii_digit())
        .count();
    if digits == 0 {
        return (label.trim_end(), None);
    }
    let split = label.len() - digits;
    match label[split..].parse::<u32>() {
        Ok(index) => (label[..split].trim_end(), Some(index)),
        // 数字串超出 u32 范围：不视为序号，整体留在类型里。
        Err(_) => (label.trim_end(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_report_lines_into_records() {
        let content = "\
        Temperatur 1 : 25.5C
        pH-Wert 1 : 7.94pH
        KH Director : 8.0dKH";

        let records = parse_measurements(content);
        assert_eq!(
            records,
            vec![
                Measurement {
                    kind: "Temperatur".to_string(),
                    index: Some(1),
                    subtype: None,
                    value: 25.5,
                    unit: "C".to_string(),
                },
                Measurement {
                    kind: "pH".to_string(),
                    index: Some(1),
                    subtype: None,
                    value: 7.94,
                    unit: "pH".to_string(),
                },
                Measurement {
                    kind: "KH".to_string(),
                    index: None,
                    subtype: None,
                    value: 8.0,
                    unit: "dKH".to_string(),
                },
            ]
        );
    }

    #[test]
    fn skips_lines_without_numeric_value() {
        let content = "\
        Ihr ProfiLux hat folgende Werte gemessen:

        Temperatur 1 : 25.5C
        Hinweis: bitte Sensor kalibrieren";

        let records = parse_measurements(content);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, "Temperatur");
    }

    #[test]
    fn value_parse_failure_drops_only_that_line() {
        // "25.05.2023" 通过行模式但不是合法 f64，只丢这一行。
        let content = "\
        Datum : 25.05.2023
        KH Director : 8.0dKH";

        let records = parse_measurements(content);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, "KH");
    }

    #[test]
    fn embedded_digits_stay_in_kind() {
        let records = parse_measurements("T1emp : 1.5");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, "T1emp");
        assert_eq!(records[0].index, None);
    }

    #[test]
    fn trailing_zero_index_is_kept_on_record() {
        let records = parse_measurements("Redox 0 : 210.0mV");
        assert_eq!(records[0].kind, "Redox");
        assert_eq!(records[0].index, Some(0));
    }

    #[test]
    fn missing_unit_yields_empty_string() {
        let records = parse_measurements("Leitwert 2 : 50.1");
        assert_eq!(records[0].unit, "");
        assert_eq!(records[0].index, Some(2));
        assert_eq!(records[0].value, 50.1);
    }

    #[test]
    fn never_panics_on_arbitrary_text() {
        let records = parse_measurements(":::\n: 1\n----\n\u{6c34}\u{65cf} : 1.2.3.4\n");
        assert!(records.is_empty());
    }
}
