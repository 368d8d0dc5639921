use crossterm::style::{Attribute, Color, ContentStyle, StyledContent};
use fiberui_core::{
    PropValue,
    memory::{HostNodeKind, MemoryHost, NodeId},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Tags laid out inline; every other tag starts a new line.
const INLINE_TAGS: &[&str] = &["span", "b", "strong", "em", "i", "u", "code", "button"];

/// Represents a fully resolved frame ready to be drawn to the terminal.
#[derive(Debug, Default, Clone)]
pub struct RenderFrame {
    lines: Vec<RenderLine>,
}

impl RenderFrame {
    /// Pushes a new line with the provided indentation level.
    pub fn push_line(&mut self, indent: usize) -> &mut RenderLine {
        self.lines.push(RenderLine::new(indent));
        let last = self.lines.len() - 1;
        &mut self.lines[last]
    }

    /// Returns the set of lines recorded in this frame.
    #[must_use]
    pub fn lines(&self) -> &[RenderLine] {
        &self.lines
    }

    /// The frame as unstyled text, one string per line.
    #[must_use]
    pub fn plain_lines(&self) -> Vec<String> {
        self.lines.iter().map(RenderLine::plain).collect()
    }

    fn last_line(&mut self, indent: usize) -> &mut RenderLine {
        if self.lines.is_empty() {
            return self.push_line(indent);
        }
        let last = self.lines.len() - 1;
        &mut self.lines[last]
    }

    fn truncate(&mut self, width: usize) {
        for line in &mut self.lines {
            line.truncate(width);
        }
    }
}

/// Representation of a single line in the terminal output.
#[derive(Debug, Default, Clone)]
pub struct RenderLine {
    segments: Vec<RenderSegment>,
}

impl RenderLine {
    fn new(indent: usize) -> Self {
        let mut segments = Vec::new();
        if indent > 0 {
            segments.push(RenderSegment::plain(" ".repeat(indent * 2)));
        }
        Self { segments }
    }

    /// Pushes a new segment onto the line.
    pub fn push(&mut self, segment: RenderSegment) {
        self.segments.push(segment);
    }

    /// Returns the list of segments contained in this line.
    #[must_use]
    pub fn segments(&self) -> &[RenderSegment] {
        &self.segments
    }

    /// Display width in terminal cells.
    #[must_use]
    pub fn width(&self) -> usize {
        self.segments
            .iter()
            .map(|segment| segment.content.width())
            .sum()
    }

    /// Concatenated segment text.
    #[must_use]
    pub fn plain(&self) -> String {
        self.segments
            .iter()
            .map(RenderSegment::content)
            .collect()
    }

    /// Cuts the line down to `width` cells, never splitting a wide character.
    fn truncate(&mut self, width: usize) {
        let mut used = 0;
        let mut keep = self.segments.len();
        for (index, segment) in self.segments.iter_mut().enumerate() {
            let segment_width = segment.content.width();
            if used + segment_width <= width {
                used += segment_width;
                continue;
            }
            let mut cut = 0;
            for (offset, ch) in segment.content.char_indices() {
                let ch_width = ch.width().unwrap_or(0);
                if used + ch_width > width {
                    break;
                }
                used += ch_width;
                cut = offset + ch.len_utf8();
            }
            segment.content.truncate(cut);
            keep = index + 1;
            break;
        }
        self.segments.truncate(keep);
        self.segments.retain(|segment| !segment.content.is_empty());
    }
}

/// Atomic piece of content rendered on a line.
#[derive(Debug, Clone)]
pub struct RenderSegment {
    content: String,
    style: ContentStyle,
}

impl RenderSegment {
    /// Creates a plain (unstyled) segment.
    pub fn plain(content: impl Into<String>) -> Self {
        Self::styled(content, ContentStyle::new())
    }

    /// Creates a segment with custom styling.
    pub fn styled(content: impl Into<String>, style: ContentStyle) -> Self {
        Self {
            content: content.into(),
            style,
        }
    }

    /// Borrows the raw text stored in this segment.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// The style applied when printing.
    #[must_use]
    pub const fn style(&self) -> &ContentStyle {
        &self.style
    }

    /// Converts this segment into a [`StyledContent`] for printing through crossterm.
    #[must_use]
    pub fn as_styled_content(&self) -> StyledContent<String> {
        self.style.apply(self.content.clone())
    }
}

/// Lays out a [`MemoryHost`] node tree as terminal lines.
///
/// Inline tags and text nodes continue the current line. Block tags end it, so
/// their content starts on a fresh line, indented one level per nested block.
/// `h1`–`h3` are bold, `li` gets a bullet and `button` is bracketed. The
/// `bold`, `italic`, `underline` and `color` attributes style a subtree.
#[derive(Debug, Default, Clone, Copy)]
pub struct Renderer {
    width: Option<usize>,
}

/// Walk state shared by one render.
struct Cursor {
    frame: RenderFrame,
    line_open: bool,
}

impl Renderer {
    /// Creates a renderer that never truncates.
    #[must_use]
    pub const fn new() -> Self {
        Self { width: None }
    }

    /// Truncates every line to `width` cells.
    #[must_use]
    pub const fn with_width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    /// Renders the children of `container` into a [`RenderFrame`].
    #[must_use]
    pub fn render(&self, host: &MemoryHost, container: NodeId) -> RenderFrame {
        let mut cursor = Cursor {
            frame: RenderFrame::default(),
            line_open: false,
        };
        for &child in host.children(container) {
            Self::render_node(host, child, 0, ContentStyle::new(), &mut cursor);
        }
        let mut frame = cursor.frame;
        if let Some(width) = self.width {
            frame.truncate(width);
        }
        frame
    }

    fn render_node(
        host: &MemoryHost,
        id: NodeId,
        indent: usize,
        inherited: ContentStyle,
        cursor: &mut Cursor,
    ) {
        let Some(node) = host.node(id) else {
            return;
        };
        let tag = match node.kind() {
            HostNodeKind::Text => {
                let text = node.text().unwrap_or_default();
                if !text.is_empty() {
                    Self::inline_line(cursor, indent).push(RenderSegment::styled(text, inherited));
                }
                return;
            }
            HostNodeKind::Element(tag) => tag.as_str(),
        };

        let style = style_for(tag, node.attributes(), inherited);
        let inline = INLINE_TAGS.contains(&tag);
        if !inline {
            cursor.line_open = false;
        }

        match tag {
            "li" => Self::inline_line(cursor, indent).push(RenderSegment::plain("• ")),
            "button" => Self::inline_line(cursor, indent).push(RenderSegment::styled("[", style)),
            _ => {}
        }
        for &child in node.children() {
            let child_indent = if is_block(host, child) { indent + 1 } else { indent };
            Self::render_node(host, child, child_indent, style, cursor);
        }
        if tag == "button" {
            Self::inline_line(cursor, indent).push(RenderSegment::styled("]", style));
        }

        if !inline {
            cursor.line_open = false;
        }
    }

    fn inline_line(cursor: &mut Cursor, indent: usize) -> &mut RenderLine {
        if cursor.line_open {
            return cursor.frame.last_line(indent);
        }
        cursor.line_open = true;
        cursor.frame.push_line(indent)
    }
}

fn is_block(host: &MemoryHost, id: NodeId) -> bool {
    host.node(id)
        .and_then(|node| node.tag())
        .is_some_and(|tag| !INLINE_TAGS.contains(&tag))
}

fn style_for<'a>(
    tag: &str,
    attributes: impl Iterator<Item = (&'a str, &'a PropValue)>,
    inherited: ContentStyle,
) -> ContentStyle {
    let mut style = inherited;
    match tag {
        "h1" | "h2" | "h3" | "b" | "strong" => style.attributes.set(Attribute::Bold),
        "em" | "i" => style.attributes.set(Attribute::Italic),
        "u" => style.attributes.set(Attribute::Underlined),
        _ => {}
    }
    for (name, value) in attributes {
        let enabled = value.as_bool() == Some(true);
        match name {
            "bold" if enabled => style.attributes.set(Attribute::Bold),
            "italic" if enabled => style.attributes.set(Attribute::Italic),
            "underline" if enabled => style.attributes.set(Attribute::Underlined),
            "color" => match value.as_str().map(Color::try_from) {
                Some(Ok(color)) => style.foreground_color = Some(color),
                _ => tracing::debug!(tag, ?value, "ignoring unknown color"),
            },
            _ => {}
        }
    }
    style
}

#[cfg(test)]
mod tests {
    use fiberui_core::{Engine, Props, children, element};

    use super::*;

    fn rendered(tree: fiberui_core::Element, renderer: Renderer) -> RenderFrame {
        let mut host = MemoryHost::new();
        let container = host.create_container("app");
        let mut engine = Engine::new(host);
        engine.render(tree, container);
        engine.flush().unwrap();
        renderer.render(engine.host(), container)
    }

    #[test]
    fn blocks_nest_and_inline_content_flows() {
        let tree = element(
            "div",
            Props::new(),
            children![
                element("h1", Props::new(), children!["Title"]),
                element(
                    "p",
                    Props::new(),
                    children!["Hello ", element("b", Props::new(), children!["world"]), "!"]
                ),
                element(
                    "ul",
                    Props::new(),
                    children![element("li", Props::new(), children!["one"])]
                ),
                element("button", Props::new(), children!["ok"]),
            ],
        );

        let frame = rendered(tree, Renderer::new());

        assert_eq!(
            frame.plain_lines(),
            vec!["  Title", "  Hello world!", "    • one", "[ok]"]
        );
    }

    #[test]
    fn headings_and_attributes_set_styles() {
        let tree = element(
            "div",
            Props::new(),
            children![
                element("h2", Props::new(), children!["big"]),
                element(
                    "span",
                    Props::new().with("color", "red").with("underline", true),
                    children!["warn"]
                ),
            ],
        );

        let frame = rendered(tree, Renderer::new());
        let heading = &frame.lines()[0].segments()[1];
        let warning = frame.lines()[1]
            .segments()
            .iter()
            .find(|segment| segment.content() == "warn")
            .unwrap();

        assert!(heading.style().attributes.has(Attribute::Bold));
        assert_eq!(warning.style().foreground_color, Some(Color::Red));
        assert!(warning.style().attributes.has(Attribute::Underlined));
    }

    #[test]
    fn lines_are_cut_at_the_terminal_width() {
        let tree = element("p", Props::new(), children!["abc", "日本語"]);

        let frame = rendered(tree, Renderer::new().with_width(6));

        assert_eq!(frame.plain_lines(), vec!["abc日"]);
        assert!(frame.lines()[0].width() <= 6);
    }
}
