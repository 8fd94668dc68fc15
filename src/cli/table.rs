//! Table formatting for the track inspection command.

use tabled::settings::{Alignment, Modify, Style, object::Rows};
use tabled::{Table, Tabled};

/// One row of the `bisub tracks` listing.
#[derive(Tabled)]
pub struct TrackDisplayRow {
    /// Container stream index
    #[tabled(rename = "Stream")]
    pub index: usize,

    /// Subtitle codec
    #[tabled(rename = "Codec")]
    pub codec: String,

    /// Container language tag (or "-")
    #[tabled(rename = "Tag")]
    pub language_tag: String,

    /// Stream title (or empty)
    #[tabled(rename = "Title")]
    pub title: String,

    /// Event count after extraction
    #[tabled(rename = "Events")]
    pub events: String,

    /// Classifier verdict
    #[tabled(rename = "Detected")]
    pub detected: String,

    /// Scorer total for the target language
    #[tabled(rename = "Score")]
    pub score: String,

    /// Role assigned by the scorer
    #[tabled(rename = "Role")]
    pub role: String,
}

/// Render the track listing with the shared table styling.
pub fn create_tracks_table(rows: Vec<TrackDisplayRow>) -> String {
    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::left()));
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_renders_rows() {
        let rows = vec![TrackDisplayRow {
            index: 2,
            codec: "srt".into(),
            language_tag: "chi".into(),
            title: "Simplified".into(),
            events: "812".into(),
            detected: "zh-Hans".into(),
            score: "87.5".into(),
            role: "main".into(),
        }];
        let rendered = create_tracks_table(rows);
        assert!(rendered.contains("Stream"));
        assert!(rendered.contains("zh-Hans"));
        assert!(rendered.contains("87.5"));
    }
}
