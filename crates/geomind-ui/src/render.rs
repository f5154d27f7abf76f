//! Plain-text rendering of transcript entries.

use chrono::{DateTime, Local, TimeZone};
use geomind_ai::{GroundingChunk, Message};

const CHIP_TITLE_MAX: usize = 40;

/// `HH:MM` in `tz`, or an empty string for an out-of-range timestamp.
pub fn format_time<Tz: TimeZone>(timestamp_ms: i64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    DateTime::from_timestamp_millis(timestamp_ms)
        .map(|utc| utc.with_timezone(tz).format("%H:%M").to_string())
        .unwrap_or_default()
}

fn truncate(title: &str) -> String {
    if title.chars().count() <= CHIP_TITLE_MAX {
        return title.to_string();
    }
    let mut short: String = title.chars().take(CHIP_TITLE_MAX - 1).collect();
    short.push('…');
    short
}

pub fn render_chip(chunk: &GroundingChunk) -> String {
    let kind = match chunk {
        GroundingChunk::Web { .. } => "web",
        GroundingChunk::Maps { .. } => "map",
    };
    format!("[{}] {} <{}>", kind, truncate(chunk.title()), chunk.uri())
}

pub fn render_message_in<Tz: TimeZone>(message: &Message, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let author = if message.is_user() { "You" } else { "GeoMind" };
    let time = format_time(message.timestamp, tz);
    let mut out = if message.is_error {
        format!("{} {} ! {}", author, time, message.text)
    } else {
        format!("{} {} > {}", author, time, message.text)
    };

    // Citations only ever accompany model replies
    if !message.is_user() {
        for chunk in message.sources() {
            out.push_str("\n    ");
            out.push_str(&render_chip(chunk));
        }
    }
    out
}

/// Render with the local clock.
pub fn render_message(message: &Message) -> String {
    render_message_in(message, &Local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use geomind_ai::ChatReply;

    // 2024-03-09 14:05:00 UTC
    const TS: i64 = 1_709_993_100_000;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(TS, &Utc), "14:05");
        assert_eq!(format_time(i64::MAX, &Utc), "");
    }

    #[test]
    fn test_user_message() {
        let mut msg = Message::user("coffee near me");
        msg.timestamp = TS;
        assert_eq!(render_message_in(&msg, &Utc), "You 14:05 > coffee near me");
    }

    #[test]
    fn test_error_message_is_marked() {
        let mut msg = Message::error("Sorry");
        msg.timestamp = TS;
        assert_eq!(render_message_in(&msg, &Utc), "GeoMind 14:05 ! Sorry");
    }

    #[test]
    fn test_reply_with_sources() {
        let mut msg = Message::model(ChatReply {
            text: "Two options.".into(),
            grounding_chunks: Some(vec![
                GroundingChunk::Maps {
                    uri: "https://maps.google.com/?cid=1".into(),
                    title: "Blue Bottle".into(),
                    place_id: None,
                },
                GroundingChunk::Web {
                    uri: "https://example.com".into(),
                    title: "A very long article title about the best coffee in the city".into(),
                },
            ]),
        });
        msg.timestamp = TS;

        let rendered = render_message_in(&msg, &Utc);
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "GeoMind 14:05 > Two options.");
        assert_eq!(
            lines[1],
            "    [map] Blue Bottle <https://maps.google.com/?cid=1>"
        );
        assert!(lines[2].starts_with("    [web] A very long article title"));
        assert!(lines[2].contains('…'));
    }
}
