use crate::Result;
use crate::core::formats::SubtitleFormat;
use crate::core::model::{CodecHint, Event, Track, sanitize_text};
use log::warn;
use regex::Regex;

/// SubRip (.srt) format parsing and serialization.
///
/// Output uses CRLF line endings; the format manager prepends the UTF-8
/// BOM expected by most players.
pub struct SrtFormat;

impl SubtitleFormat for SrtFormat {
    fn parse(&self, content: &str) -> Result<Track> {
        // Trailing position tags (X1:... or WebVTT-ish coordinates) after
        // the end time are tolerated and ignored.
        let time_regex = Regex::new(
            r"(\d{2}):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d{2}):(\d{2}):(\d{2})[,.](\d{3})",
        )
        .expect("valid SRT time regex");

        let normalized = content.replace("\r\n", "\n");
        let mut track = Track::new(CodecHint::Srt);

        for block in normalized.split("\n\n") {
            if block.trim().is_empty() {
                continue;
            }
            let lines: Vec<&str> = block.lines().collect();

            // Locate the time line; the index header above it is ignored
            // on read and renumbered on write.
            let Some(time_pos) = lines.iter().position(|l| time_regex.is_match(l)) else {
                warn!("skipping SRT block without time line: {:?}", lines.first());
                continue;
            };
            let caps = time_regex.captures(lines[time_pos]).unwrap();
            let (Some(start_ms), Some(end_ms)) = (parse_time(&caps, 1), parse_time(&caps, 5))
            else {
                warn!("skipping SRT block with unparsable time values");
                continue;
            };

            let text = sanitize_text(&lines[(time_pos + 1)..].join("\n"));
            if text.trim().is_empty() {
                warn!("skipping empty SRT block at {} ms", start_ms);
                continue;
            }

            track
                .events
                .push(Event::new(track.events.len() + 1, start_ms, end_ms, text));
        }

        track.normalize();
        Ok(track)
    }

    fn serialize(&self, track: &Track) -> Result<String> {
        let mut output = String::new();
        for (i, event) in track.events.iter().enumerate() {
            output.push_str(&format!("{}\r\n", i + 1));
            output.push_str(&format!(
                "{} --> {}\r\n",
                format_timestamp(event.start_ms),
                format_timestamp(event.end_ms)
            ));
            output.push_str(&event.text.replace('\n', "\r\n"));
            output.push_str("\r\n\r\n");
        }
        Ok(output)
    }

    fn detect(&self, content: &str) -> bool {
        let time_pattern =
            Regex::new(r"\d{2}:\d{2}:\d{2}[,.]\d{3}\s*-->\s*\d{2}:\d{2}:\d{2}[,.]\d{3}").unwrap();
        !content.trim_start().starts_with("WEBVTT") && time_pattern.is_match(content)
    }

    fn format_name(&self) -> &'static str {
        "SRT"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["srt"]
    }

    fn writes_bom(&self) -> bool {
        true
    }
}

fn parse_time(caps: &regex::Captures, start_group: usize) -> Option<u32> {
    let hours: u32 = caps[start_group].parse().ok()?;
    let minutes: u32 = caps[start_group + 1].parse().ok()?;
    let seconds: u32 = caps[start_group + 2].parse().ok()?;
    let millis: u32 = caps[start_group + 3].parse().ok()?;
    Some(hours * 3_600_000 + minutes * 60_000 + seconds * 1000 + millis)
}

fn format_timestamp(total_ms: u32) -> String {
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let seconds = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}
