use crate::Result;
use crate::core::formats::SubtitleFormat;
use crate::core::model::{CodecHint, Event, FormatAttrs, Track, VttCueAttrs, sanitize_text};
use crate::error::BisubError;
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

/// WebVTT (.vtt) format parsing and serialization.
///
/// NOTE/STYLE/REGION blocks are preserved across a round-trip but ignored
/// by the aligner; cue identifiers and settings ride in each event's
/// passthrough attributes. VTT output is UTF-8 without BOM.
pub struct VttFormat;

static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:(\d{2,}):)?(\d{2}):(\d{2})\.(\d{3})\s*-->\s*(?:(\d{2,}):)?(\d{2}):(\d{2})\.(\d{3})(.*)")
        .unwrap()
});

impl SubtitleFormat for VttFormat {
    fn parse(&self, content: &str) -> Result<Track> {
        let normalized = content.trim_start_matches('\u{FEFF}').replace("\r\n", "\n");
        if !normalized.trim_start().starts_with("WEBVTT") {
            return Err(BisubError::subtitle_format(
                self.format_name(),
                "missing WEBVTT header",
            ));
        }

        let mut track = Track::new(CodecHint::Vtt);

        for block in normalized.split("\n\n") {
            let block = block.trim_matches('\n');
            if block.is_empty() || block.starts_with("WEBVTT") {
                continue;
            }
            if block.starts_with("NOTE") || block.starts_with("STYLE") || block.starts_with("REGION")
            {
                track.vtt_headers.push(block.to_string());
                continue;
            }

            let lines: Vec<&str> = block.lines().collect();
            let (identifier, time_line_idx) = if TIME_RE.is_match(lines[0]) {
                (None, 0)
            } else if lines.len() > 1 && TIME_RE.is_match(lines[1]) {
                (Some(lines[0].to_string()), 1)
            } else {
                warn!("skipping VTT block without time line: {:?}", lines.first());
                continue;
            };

            let caps = TIME_RE.captures(lines[time_line_idx]).unwrap();
            let (Some(start_ms), Some(end_ms)) = (parse_time(&caps, 1), parse_time(&caps, 5))
            else {
                warn!("skipping VTT cue with unparsable time values");
                continue;
            };
            let settings = caps.get(9).map(|m| m.as_str().trim().to_string()).unwrap_or_default();

            let text = sanitize_text(&lines[(time_line_idx + 1)..].join("\n"));
            if text.trim().is_empty() {
                warn!("skipping empty VTT cue at {} ms", start_ms);
                continue;
            }

            track.events.push(Event {
                index: track.events.len() + 1,
                start_ms,
                end_ms,
                text,
                style_ref: None,
                attrs: FormatAttrs::Vtt(VttCueAttrs {
                    identifier,
                    settings,
                }),
            });
        }

        track.normalize();
        Ok(track)
    }

    fn serialize(&self, track: &Track) -> Result<String> {
        let mut out = String::from("WEBVTT\n\n");
        for header in &track.vtt_headers {
            out.push_str(header);
            out.push_str("\n\n");
        }
        for event in &track.events {
            let mut settings = String::new();
            if let FormatAttrs::Vtt(attrs) = &event.attrs {
                if let Some(id) = &attrs.identifier {
                    out.push_str(id);
                    out.push('\n');
                }
                if !attrs.settings.is_empty() {
                    settings = format!(" {}", attrs.settings);
                }
            }
            out.push_str(&format!(
                "{} --> {}{}\n",
                format_timestamp(event.start_ms),
                format_timestamp(event.end_ms),
                settings
            ));
            out.push_str(&event.text);
            out.push_str("\n\n");
        }
        Ok(out)
    }

    fn detect(&self, content: &str) -> bool {
        content
            .trim_start_matches('\u{FEFF}')
            .trim_start()
            .starts_with("WEBVTT")
    }

    fn format_name(&self) -> &'static str {
        "VTT"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["vtt"]
    }
}

fn parse_time(caps: &regex::Captures, start_group: usize) -> Option<u32> {
    let hours: u32 = caps
        .get(start_group)
        .map(|m| m.as_str().parse().ok())
        .unwrap_or(Some(0))?;
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
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}
