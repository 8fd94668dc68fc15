use crate::Result;
use crate::core::formats::SubtitleFormat;
use crate::core::model::{AssEventAttrs, AssStyle, CodecHint, Event, FormatAttrs, Track, sanitize_text};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

/// ASS/SSA format parsing and serialization.
///
/// Only `Dialogue:` lines become events. `Comment:` lines and `[Script
/// Info]`/style sections are preserved in place for round-trip; override
/// tags stay inside each event's passthrough attributes and are re-emitted
/// verbatim when the event is copied unchanged.
pub struct AssFormat;

/// Canonical V4+ event field order, used when a file omits its `Format:`
/// line and always used on write.
const EVENT_FIELDS: &[&str] = &[
    "layer", "start", "end", "style", "name", "marginl", "marginr", "marginv", "effect", "text",
];

static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+):(\d{2}):(\d{2})[.:](\d{2,3})$").unwrap());
static OVERRIDE_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[^}]*\}").unwrap());

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    ScriptInfo,
    Styles,
    Events,
    Other,
}

impl SubtitleFormat for AssFormat {
    fn parse(&self, content: &str) -> Result<Track> {
        let mut track = Track::new(CodecHint::Ass);
        let mut section = Section::Other;
        let mut style_fields: Vec<String> = Vec::new();
        let mut event_fields: Vec<String> =
            EVENT_FIELDS.iter().map(|s| s.to_string()).collect();

        for line in content.replace("\r\n", "\n").lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with(';') {
                continue;
            }

            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                let name = trimmed[1..trimmed.len() - 1].to_lowercase();
                section = if name == "script info" {
                    Section::ScriptInfo
                } else if name.contains("styles") {
                    Section::Styles
                } else if name == "events" {
                    Section::Events
                } else {
                    Section::Other
                };
                continue;
            }

            match section {
                Section::ScriptInfo => {
                    if let Some((key, value)) = trimmed.split_once(':') {
                        track
                            .script_info
                            .push((key.trim().to_string(), value.trim().to_string()));
                    }
                }
                Section::Styles => {
                    if let Some(rest) = strip_prefix_ci(trimmed, "format:") {
                        style_fields = rest.split(',').map(|f| f.trim().to_lowercase()).collect();
                    } else if strip_prefix_ci(trimmed, "style:").is_some() {
                        if let Some(style) = parse_style_line(trimmed, &style_fields) {
                            track.styles.push(style);
                        } else {
                            warn!("skipping malformed ASS style line");
                        }
                    }
                }
                Section::Events => {
                    if let Some(rest) = strip_prefix_ci(trimmed, "format:") {
                        event_fields = rest.split(',').map(|f| f.trim().to_lowercase()).collect();
                    } else if strip_prefix_ci(trimmed, "comment:").is_some() {
                        track.comments.push((track.events.len(), trimmed.to_string()));
                    } else if let Some(rest) = strip_prefix_ci(trimmed, "dialogue:") {
                        match parse_dialogue(rest, &event_fields, track.events.len() + 1) {
                            Some(event) => track.events.push(event),
                            None => warn!("skipping malformed ASS dialogue line"),
                        }
                    }
                }
                Section::Other => {}
            }
        }

        track.normalize();
        Ok(track)
    }

    fn serialize(&self, track: &Track) -> Result<String> {
        let mut out = String::new();

        out.push_str("[Script Info]\n");
        if track.script_info.is_empty() {
            out.push_str("ScriptType: v4.00+\n");
        } else {
            for (key, value) in &track.script_info {
                out.push_str(&format!("{}: {}\n", key, value));
            }
        }
        out.push('\n');

        out.push_str("[V4+ Styles]\n");
        out.push_str(
            "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n",
        );
        if track.styles.is_empty() {
            out.push_str(
                "Style: Default,Arial,24,&H00FFFFFF,&H000000FF,&H00000000,&H00000000,0,0,0,0,100,100,0,0,1,2,0,2,10,10,10,1\n",
            );
        } else {
            for style in &track.styles {
                out.push_str(&style.raw);
                out.push('\n');
            }
        }
        out.push('\n');

        out.push_str("[Events]\n");
        out.push_str("Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n");

        let mut comment_iter = track.comments.iter().peekable();
        for (pos, event) in track.events.iter().enumerate() {
            while let Some((at, raw)) = comment_iter.peek() {
                if *at <= pos {
                    out.push_str(raw);
                    out.push('\n');
                    comment_iter.next();
                } else {
                    break;
                }
            }
            out.push_str(&serialize_dialogue(event));
            out.push('\n');
        }
        for (_, raw) in comment_iter {
            out.push_str(raw);
            out.push('\n');
        }

        Ok(out)
    }

    fn detect(&self, content: &str) -> bool {
        content.contains("[Script Info]") || content.contains("Dialogue:")
    }

    fn format_name(&self) -> &'static str {
        "ASS"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["ass", "ssa"]
    }

    fn writes_bom(&self) -> bool {
        true
    }
}

fn strip_prefix_ci<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(line[prefix.len()..].trim_start())
    } else {
        None
    }
}

fn parse_style_line(line: &str, fields: &[String]) -> Option<AssStyle> {
    let rest = strip_prefix_ci(line, "style:")?;
    let values: Vec<&str> = rest.split(',').map(|v| v.trim()).collect();

    let index_of = |name: &str| fields.iter().position(|f| f == name);
    // Fall back to the canonical positions when no Format line was seen.
    let name_idx = index_of("name").unwrap_or(0);
    let font_idx = index_of("fontname").unwrap_or(1);
    let size_idx = index_of("fontsize").unwrap_or(2);

    let name = values.get(name_idx)?.to_string();
    if name.is_empty() {
        return None;
    }
    Some(AssStyle {
        name,
        raw: line.to_string(),
        font_name: values.get(font_idx).map(|s| s.to_string()),
        font_size: values.get(size_idx).and_then(|s| s.parse().ok()),
    })
}

fn parse_dialogue(rest: &str, fields: &[String], index: usize) -> Option<Event> {
    // Text is the last field and may itself contain commas.
    let values: Vec<&str> = rest.splitn(fields.len(), ',').collect();
    if values.len() < fields.len() {
        return None;
    }

    let field = |name: &str| -> &str {
        fields
            .iter()
            .position(|f| f == name)
            .and_then(|i| values.get(i))
            .map(|v| *v)
            .unwrap_or("")
    };

    let start_ms = parse_ass_time(field("start").trim())?;
    let end_ms = parse_ass_time(field("end").trim())?;
    let raw_text = field("text").to_string();
    let style = field("style").trim().to_string();

    let attrs = AssEventAttrs {
        layer: field("layer").trim().to_string(),
        name: field("name").trim().to_string(),
        margin_l: field("marginl").trim().to_string(),
        margin_r: field("marginr").trim().to_string(),
        margin_v: field("marginv").trim().to_string(),
        effect: field("effect").trim().to_string(),
        raw_text: raw_text.clone(),
    };

    Some(Event {
        index,
        start_ms,
        end_ms,
        text: strip_ass_markup(&raw_text),
        style_ref: if style.is_empty() { None } else { Some(style) },
        attrs: FormatAttrs::Ass(attrs),
    })
}

/// Parse `H:MM:SS.cc` (centiseconds) or `H:MM:SS.mmm` (milliseconds).
fn parse_ass_time(s: &str) -> Option<u32> {
    let caps = TIME_RE.captures(s)?;
    let hours: u32 = caps[1].parse().ok()?;
    let minutes: u32 = caps[2].parse().ok()?;
    let seconds: u32 = caps[3].parse().ok()?;
    let frac = &caps[4];
    let millis: u32 = if frac.len() == 2 {
        frac.parse::<u32>().ok()? * 10
    } else {
        frac.parse().ok()?
    };
    Some(hours * 3_600_000 + minutes * 60_000 + seconds * 1000 + millis)
}

/// Strip `{\...}` override blocks and resolve ASS line breaks.
fn strip_ass_markup(raw: &str) -> String {
    let without_tags = OVERRIDE_TAG_RE.replace_all(raw, "");
    sanitize_text(
        &without_tags
            .replace("\\N", "\n")
            .replace("\\n", "\n")
            .replace("\\h", " "),
    )
}

fn format_ass_time(total_ms: u32) -> String {
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let seconds = (total_ms % 60_000) / 1000;
    let centis = (total_ms % 1000) / 10;
    format!("{}:{:02}:{:02}.{:02}", hours, minutes, seconds, centis)
}

fn serialize_dialogue(event: &Event) -> String {
    let start = format_ass_time(event.start_ms);
    let end = format_ass_time(event.end_ms);
    let style = event.style_ref.as_deref().unwrap_or("Default");

    match &event.attrs {
        FormatAttrs::Ass(attrs) => format!(
            "Dialogue: {},{},{},{},{},{},{},{},{},{}",
            or_zero(&attrs.layer),
            start,
            end,
            style,
            attrs.name,
            or_zero(&attrs.margin_l),
            or_zero(&attrs.margin_r),
            or_zero(&attrs.margin_v),
            attrs.effect,
            attrs.raw_text
        ),
        _ => format!(
            "Dialogue: 0,{},{},{},,0,0,0,,{}",
            start,
            end,
            style,
            event.text.replace('\n', "\\N")
        ),
    }
}

fn or_zero(field: &str) -> &str {
    if field.is_empty() { "0" } else { field }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_ASS: &str = "\
[Script Info]
Title: Sample
ScriptType: v4.00+

[V4+ Styles]
Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding
Style: Default,Arial,20,&H00FFFFFF,&H000000FF,&H00000000,&H00000000,0,0,0,0,100,100,0,0,1,2,0,2,10,10,10,1

[Events]
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
Dialogue: 0,0:00:01.50,0:00:03.00,Default,,0,0,0,,{\\an8}Hello, world
Comment: 0,0:00:03.00,0:00:04.00,Default,,0,0,0,,editor note
Dialogue: 0,0:00:05.00,0:00:08.25,Default,,0,0,0,,Second line\\Nwith break
";

    #[test]
    fn test_ass_parsing_basic() {
        let format = AssFormat;
        let track = format.parse(SAMPLE_ASS).unwrap();

        assert_eq!(track.events.len(), 2);
        assert_eq!(track.events[0].start_ms, 1500);
        assert_eq!(track.events[0].end_ms, 3000);
        assert_eq!(track.events[0].text, "Hello, world");
        assert_eq!(track.events[0].style_ref.as_deref(), Some("Default"));
        assert_eq!(track.events[1].text, "Second line\nwith break");
        assert_eq!(track.events[1].end_ms, 8250);
    }

    #[test]
    fn test_ass_preserves_override_tags_in_attrs() {
        let format = AssFormat;
        let track = format.parse(SAMPLE_ASS).unwrap();
        match &track.events[0].attrs {
            FormatAttrs::Ass(attrs) => assert_eq!(attrs.raw_text, "{\\an8}Hello, world"),
            other => panic!("expected ASS attrs, got {:?}", other),
        }
    }

    #[test]
    fn test_ass_comments_not_events() {
        let format = AssFormat;
        let track = format.parse(SAMPLE_ASS).unwrap();
        assert_eq!(track.comments.len(), 1);
        assert_eq!(track.comments[0].0, 1);
        assert!(track.comments[0].1.starts_with("Comment:"));
    }

    #[test]
    fn test_ass_styles_and_script_info() {
        let format = AssFormat;
        let track = format.parse(SAMPLE_ASS).unwrap();
        assert_eq!(track.styles.len(), 1);
        assert_eq!(track.styles[0].name, "Default");
        assert_eq!(track.styles[0].font_name.as_deref(), Some("Arial"));
        assert_eq!(track.styles[0].font_size, Some(20));
        assert!(
            track
                .script_info
                .iter()
                .any(|(k, v)| k == "Title" && v == "Sample")
        );
    }

    #[test]
    fn test_ass_roundtrip() {
        let format = AssFormat;
        let track = format.parse(SAMPLE_ASS).unwrap();
        let serialized = format.serialize(&track).unwrap();
        let reparsed = format.parse(&serialized).unwrap();

        assert_eq!(track.events.len(), reparsed.events.len());
        for (o, r) in track.events.iter().zip(reparsed.events.iter()) {
            assert_eq!(o.start_ms, r.start_ms);
            assert_eq!(o.end_ms, r.end_ms);
            assert_eq!(o.text, r.text);
            assert_eq!(o.style_ref, r.style_ref);
        }
        // Comments and override tags survive verbatim
        assert!(serialized.contains("editor note"));
        assert!(serialized.contains("{\\an8}Hello, world"));
    }

    #[test]
    fn test_ass_millisecond_times_accepted() {
        let format = AssFormat;
        let content = "[Events]\nFormat: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\nDialogue: 0,0:00:01.234,0:00:02.567,Default,,0,0,0,,ms times\n";
        let track = format.parse(content).unwrap();
        assert_eq!(track.events[0].start_ms, 1234);
        assert_eq!(track.events[0].end_ms, 2567);
    }

    #[test]
    fn test_ass_custom_format_line_order() {
        let format = AssFormat;
        let content = "[Events]\nFormat: Start, End, Style, Text\nDialogue: 0:00:01.00,0:00:02.00,Top,reordered fields\n";
        let track = format.parse(content).unwrap();
        assert_eq!(track.events.len(), 1);
        assert_eq!(track.events[0].text, "reordered fields");
        assert_eq!(track.events[0].style_ref.as_deref(), Some("Top"));
    }

    #[test]
    fn test_ass_malformed_dialogue_skipped() {
        let format = AssFormat;
        let content = "[Events]\nFormat: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\nDialogue: 0,bogus,0:00:02.00,Default,,0,0,0,,bad\nDialogue: 0,0:00:03.00,0:00:04.00,Default,,0,0,0,,good\n";
        let track = format.parse(content).unwrap();
        assert_eq!(track.events.len(), 1);
        assert_eq!(track.events[0].text, "good");
    }

    #[test]
    fn test_ass_text_with_commas() {
        let format = AssFormat;
        let content = "[Events]\nFormat: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\nDialogue: 0,0:00:01.00,0:00:02.00,Default,,0,0,0,,one, two, three\n";
        let track = format.parse(content).unwrap();
        assert_eq!(track.events[0].text, "one, two, three");
    }

    #[test]
    fn test_ass_detection() {
        let format = AssFormat;
        assert!(format.detect(SAMPLE_ASS));
        assert!(format.detect("Dialogue: 0,0:00:01.00,0:00:02.00,Default,,0,0,0,,x"));
        assert!(!format.detect("1\n00:00:01,000 --> 00:00:02,000\nplain srt"));
    }
}
