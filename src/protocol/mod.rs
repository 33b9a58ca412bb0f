//! i3bar protocol: status blocks written to stdout, click events read from stdin
//!
//! The bar starts by writing a header, then an endless JSON array whose
//! elements are status lines (arrays of blocks). When `click_events` is
//! enabled, i3bar writes an endless array of click event objects back on our
//! stdin, one per line.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::theme::Color;

/// Text interpretation for a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Markup {
    /// Pango markup (`<span size="xx-small">`)
    Pango,
}

fn is_false(v: &bool) -> bool {
    !*v
}

/// One i3bar block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub full_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(skip_serializing_if = "is_false")]
    pub urgent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markup: Option<Markup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub separator: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub separator_block_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl Segment {
    /// Plain text block
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            full_text: text.into(),
            color: None,
            urgent: false,
            markup: None,
            separator: None,
            separator_block_width: None,
            name: None,
            instance: None,
        }
    }

    /// Block whose text is pango markup
    pub fn pango(markup: impl Into<String>) -> Self {
        Self {
            markup: Some(Markup::Pango),
            ..Self::text(markup)
        }
    }

    /// A very small space, used between glued parts of a group
    pub fn spacer() -> Self {
        Self::pango("<span size=\"xx-small\"> </span>")
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn urgent(mut self, urgent: bool) -> Self {
        self.urgent = urgent;
        self
    }
}

/// What a widget displays: one or more blocks
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Output {
    segments: Vec<Segment>,
}

impl Output {
    /// Single plain text block
    pub fn text(text: impl Into<String>) -> Self {
        Self::from(Segment::text(text))
    }

    /// Group of blocks
    pub fn group(segments: impl IntoIterator<Item = Segment>) -> Self {
        Self {
            segments: segments.into_iter().collect(),
        }
    }

    pub fn append(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    /// Apply a color to every block that does not have one yet
    pub fn color(mut self, color: Color) -> Self {
        for segment in &mut self.segments {
            segment.color.get_or_insert(color);
        }
        self
    }

    /// Mark every block urgent
    pub fn urgent(mut self, urgent: bool) -> Self {
        for segment in &mut self.segments {
            segment.urgent = urgent;
        }
        self
    }

    /// Join the blocks visually: no separator and no gap between them.
    /// The last block keeps the bar's default separator.
    pub fn glue(mut self) -> Self {
        let last = self.segments.len().saturating_sub(1);
        for segment in &mut self.segments[..last] {
            segment.separator = Some(false);
            segment.separator_block_width = Some(0);
        }
        self
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Blocks labelled for click routing: `name` is the widget id and
    /// `instance` the block index within this output.
    pub fn tagged(&self, name: &str) -> Vec<Segment> {
        self.segments
            .iter()
            .enumerate()
            .map(|(i, segment)| Segment {
                name: Some(name.to_string()),
                instance: Some(i.to_string()),
                ..segment.clone()
            })
            .collect()
    }
}

impl From<Segment> for Output {
    fn from(segment: Segment) -> Self {
        Self {
            segments: vec![segment],
        }
    }
}

/// Protocol header, the first line on stdout
#[derive(Debug, Clone, Serialize)]
pub struct Header {
    pub version: u32,
    pub click_events: bool,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            version: 1,
            click_events: true,
        }
    }
}

/// Writes the header and status lines to i3bar
pub struct StatusWriter<W: Write> {
    writer: W,
}

impl<W: Write> StatusWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write the header and open the endless status array
    pub fn write_header(&mut self, header: &Header) -> crate::error::Result<()> {
        let json = serde_json::to_string(header)?;
        writeln!(self.writer, "{}", json).map_err(crate::error::BarError::Output)?;
        writeln!(self.writer, "[").map_err(crate::error::BarError::Output)?;
        self.writer.flush().map_err(crate::error::BarError::Output)
    }

    /// Write one status line
    pub fn write_line(&mut self, blocks: &[Segment]) -> crate::error::Result<()> {
        let json = serde_json::to_string(blocks)?;
        writeln!(self.writer, "{},", json).map_err(crate::error::BarError::Output)?;
        self.writer.flush().map_err(crate::error::BarError::Output)
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// A click reported by i3bar
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClickEvent {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub instance: Option<String>,
    /// X11 button number: 1 left, 2 middle, 3 right, 4/5 scroll
    pub button: u8,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default)]
    pub modifiers: Vec<String>,
}

/// Decode one line of the click event stream.
///
/// Returns `None` for lines carrying no event (the opening `[` or blank lines).
pub fn parse_click_line(line: &str) -> Option<Result<ClickEvent, serde_json::Error>> {
    let trimmed = line
        .trim()
        .trim_start_matches('[')
        .trim_start_matches(',')
        .trim_end_matches(',')
        .trim();

    if trimmed.is_empty() {
        return None;
    }

    Some(serde_json::from_str(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_serialization_skips_defaults() {
        let json = serde_json::to_string(&Segment::text("hi")).unwrap();
        assert_eq!(json, r#"{"full_text":"hi"}"#);
    }

    #[test]
    fn test_segment_serialization_full() {
        let segment = Segment::pango("<b>x</b>")
            .color(Color::rgb(255, 0, 0))
            .urgent(true);
        let value = serde_json::to_value(&segment).unwrap();
        assert_eq!(value["color"], "#ff0000");
        assert_eq!(value["urgent"], true);
        assert_eq!(value["markup"], "pango");
    }

    #[test]
    fn test_glue_keeps_last_separator() {
        let out = Output::group([Segment::text("a"), Segment::text("b"), Segment::text("c")]).glue();
        let segments = out.segments();
        assert_eq!(segments[0].separator, Some(false));
        assert_eq!(segments[0].separator_block_width, Some(0));
        assert_eq!(segments[1].separator, Some(false));
        assert_eq!(segments[2].separator, None);
    }

    #[test]
    fn test_glue_empty_output() {
        let out = Output::default().glue();
        assert!(out.is_empty());
    }

    #[test]
    fn test_output_color_keeps_existing() {
        let accent = Color::rgb(1, 2, 3);
        let red = Color::rgb(255, 0, 0);
        let out = Output::group([Segment::text("icon").color(accent), Segment::text("x")]).color(red);
        assert_eq!(out.segments()[0].color, Some(accent));
        assert_eq!(out.segments()[1].color, Some(red));
    }

    #[test]
    fn test_tagged_sets_name_and_instance() {
        let out = Output::group([Segment::text("a"), Segment::text("b")]);
        let tagged = out.tagged("github");
        assert_eq!(tagged[1].name.as_deref(), Some("github"));
        assert_eq!(tagged[1].instance.as_deref(), Some("1"));
    }

    #[test]
    fn test_writer_framing() {
        let mut writer = StatusWriter::new(Vec::new());
        writer.write_header(&Header::default()).unwrap();
        writer.write_line(&[Segment::text("one")]).unwrap();
        writer.write_line(&[]).unwrap();

        let written = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines[0], r#"{"version":1,"click_events":true}"#);
        assert_eq!(lines[1], "[");
        assert_eq!(lines[2], r#"[{"full_text":"one"}],"#);
        assert_eq!(lines[3], "[],");
    }

    #[test]
    fn test_parse_click_lines() {
        assert!(parse_click_line("[").is_none());
        assert!(parse_click_line("   ").is_none());

        let first = parse_click_line(r#"{"name":"clock","instance":"0","button":1,"x":10,"y":5}"#)
            .unwrap()
            .unwrap();
        assert_eq!(first.name.as_deref(), Some("clock"));
        assert_eq!(first.button, 1);

        let next = parse_click_line(r#",{"name":"github","button":3}"#)
            .unwrap()
            .unwrap();
        assert_eq!(next.name.as_deref(), Some("github"));
        assert!(next.instance.is_none());

        assert!(parse_click_line("{not json").unwrap().is_err());
    }
}
