//! Message rendering. Pure functions; the caller supplies the local time to stamp.

use chrono::NaiveDateTime;

use super::models::{AlertEvent, AlertKind, ParseMode, Severity};
use crate::alerting::PingOutcome;

/// One probed interface in a ping report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingReportLine {
    pub interface: String,
    pub outcome: PingOutcome,
}

/// Escapes the characters legacy Telegram Markdown treats as entity delimiters.
/// Only honoured outside an entity, so escaped text must not sit inside `*...*`.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '[' | ']' | '`') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn traffic_drop(
    device: &str,
    interface: &str,
    rx_bps: f64,
    tx_bps: f64,
    now: NaiveDateTime,
) -> AlertEvent {
    let text = format!(
        "⚠️ *TRAFFIC DROP ALERT* ⚠️\n\n\
         📡 *Router:* {} ({})\n\
         📉 Traffic < 1 Mbps\n\
         ⬇️ {:.2} Mbps | ⬆️ {:.2} Mbps\n\
         🕒 {}",
        escape_markdown(device),
        escape_markdown(interface),
        rx_bps / 1_000_000.0,
        tx_bps / 1_000_000.0,
        now.format("%H:%M"),
    );

    AlertEvent {
        kind: AlertKind::TrafficDrop,
        severity: Severity::Warning,
        text,
        parse_mode: ParseMode::Markdown,
    }
}

fn report_line(line: &PingReportLine) -> String {
    let name = escape_markdown(&line.interface);
    match line.outcome {
        PingOutcome::Error => format!("❌ {name}: Error Exec"),
        PingOutcome::TotalLoss => format!("🔴 {name}: RTO (100% Loss)"),
        PingOutcome::PartialLoss(loss) => format!("⚠️ {name}: Loss {loss}%"),
        PingOutcome::HighLatency(rtt) => format!("🐢 {name}: High Latency {rtt}ms"),
        PingOutcome::Healthy(rtt) => format!("✅ {name}: {rtt}ms"),
    }
}

/// Consolidated reachability report for one device.
pub fn ping_report(
    device: &str,
    target: &str,
    lines: &[PingReportLine],
    now: NaiveDateTime,
) -> AlertEvent {
    let has_issue = lines.iter().any(|l| l.outcome.is_issue());
    let header = if has_issue {
        "⚠️ *PING CHECK ALERT / ISSUES* ⚠️"
    } else {
        "✅ *ROUTINE PING CHECK* ✅"
    };
    let detail = lines.iter().map(report_line).collect::<Vec<_>>().join("\n");

    let text = format!(
        "{header}\n\n\
         📡 *Router:* {}\n\
         🎯 *Target:* {}\n\n\
         {detail}\n\n\
         🕒 {}",
        escape_markdown(device),
        escape_markdown(target),
        now.format("%d %b %H:%M"),
    );

    AlertEvent {
        kind: AlertKind::PingReport,
        severity: Severity::Warning,
        text,
        parse_mode: ParseMode::Markdown,
    }
}

pub fn device_disconnected(device: &str, error: &str, now: NaiveDateTime) -> AlertEvent {
    let text = format!(
        "🚨 <b>CRITICAL: ROUTER DISCONNECTED</b> 🚨\n\n\
         📡 <b>Router:</b> {}\n\
         ❌ <b>Status:</b> CONNECTION LOST / DROP\n\
         📝 <b>Error:</b> {}\n\n\
         🕒 {}",
        escape_html(device),
        escape_html(error),
        now.format("%d %b %H:%M"),
    );

    AlertEvent {
        kind: AlertKind::DeviceDisconnected,
        severity: Severity::Critical,
        text,
        parse_mode: ParseMode::Html,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 0)
            .unwrap()
    }

    #[test]
    fn test_traffic_drop_message() {
        let event = traffic_drop("core_01", "ether1", 500_000.0, 2_000_000.0, at());
        assert_eq!(
            event.text,
            "⚠️ *TRAFFIC DROP ALERT* ⚠️\n\n📡 *Router:* core\\_01 (ether1)\n📉 Traffic < 1 Mbps\n⬇️ 0.50 Mbps | ⬆️ 2.00 Mbps\n🕒 09:05"
        );
        assert_eq!(event.parse_mode, ParseMode::Markdown);
        assert_eq!(event.severity, Severity::Warning);
    }

    #[test]
    fn test_traffic_drop_keeps_names_outside_bold() {
        let event = traffic_drop("core*01", "vlan_10", 0.0, 0.0, at());
        assert!(event.text.contains("📡 *Router:* core\\*01 (vlan\\_10)\n"));
        // Only the two labels open bold spans; the escaped `*` in the name does not.
        let unescaped = event.text.replace("\\*", "");
        assert_eq!(unescaped.matches('*').count(), 4);
    }

    #[test]
    fn test_ping_report_lines_and_header() {
        let lines = vec![
            PingReportLine { interface: "ether1".into(), outcome: PingOutcome::Healthy(12) },
            PingReportLine { interface: "ether2".into(), outcome: PingOutcome::Error },
            PingReportLine { interface: "ether3".into(), outcome: PingOutcome::TotalLoss },
            PingReportLine { interface: "ether4".into(), outcome: PingOutcome::PartialLoss(33) },
            PingReportLine { interface: "ether5".into(), outcome: PingOutcome::HighLatency(250) },
        ];
        let event = ping_report("olt-1", "1.1.1.1", &lines, at());

        assert!(event.text.starts_with("⚠️ *PING CHECK ALERT / ISSUES* ⚠️\n\n"));
        assert!(event.text.contains("🎯 *Target:* 1.1.1.1"));
        assert!(event.text.contains(
            "✅ ether1: 12ms\n❌ ether2: Error Exec\n🔴 ether3: RTO (100% Loss)\n⚠️ ether4: Loss 33%\n🐢 ether5: High Latency 250ms"
        ));
        assert!(event.text.ends_with("🕒 07 Mar 09:05"));
    }

    #[test]
    fn test_routine_header_without_issues() {
        let lines = vec![PingReportLine {
            interface: "sfp1".into(),
            outcome: PingOutcome::HighLatency(300),
        }];
        let event = ping_report("olt-1", "1.1.1.1", &lines, at());
        assert!(event.text.starts_with("✅ *ROUTINE PING CHECK* ✅"));
    }

    #[test]
    fn test_disconnect_alert_escapes_html() {
        let event = device_disconnected("a<b>&c", "dial tcp: i/o timeout", at());
        assert_eq!(event.parse_mode, ParseMode::Html);
        assert_eq!(event.severity, Severity::Critical);
        assert!(event.text.contains("📡 <b>Router:</b> a&lt;b&gt;&amp;c\n"));
        assert!(event.text.contains("CONNECTION LOST / DROP"));
        assert!(event.text.contains("📝 <b>Error:</b> dial tcp: i/o timeout"));
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("a_b*c[d]`e"), "a\\_b\\*c\\[d\\]\\`e");
        assert_eq!(escape_markdown("plain"), "plain");
    }
}
