use crossterm::style::{Attribute, Color, ContentStyle};
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

const RULE_WIDTH: usize = 50;

/// Turns markdown into terminal text. Unstyled output is plain text with the
/// same layout, which keeps piped output and tests readable.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownRenderer {
    styled: bool,
}

impl MarkdownRenderer {
    pub fn new(styled: bool) -> Self {
        Self { styled }
    }

    pub fn render(&self, markdown: &str) -> String {
        let mut writer = Writer::new(self.styled);
        for event in Parser::new_ext(markdown, Options::ENABLE_STRIKETHROUGH) {
            writer.event(event);
        }
        writer.finish()
    }
}

struct Writer {
    styled: bool,
    out: String,
    lists: Vec<Option<u64>>,
    heading: Option<HeadingLevel>,
    code_block: bool,
    quote_depth: usize,
    bold: u32,
    italic: u32,
    strike: u32,
    link: Option<String>,
}

impl Writer {
    fn new(styled: bool) -> Self {
        Self {
            styled,
            out: String::new(),
            lists: Vec::new(),
            heading: None,
            code_block: false,
            quote_depth: 0,
            bold: 0,
            italic: 0,
            strike: 0,
            link: None,
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if self.code_block {
                    self.code_lines(&text);
                } else {
                    self.text(&text, self.inline_style());
                }
            }
            Event::Code(code) => {
                let mut style = self.inline_style();
                style.foreground_color = Some(Color::Cyan);
                self.text(&code, style);
            }
            Event::Html(html) | Event::InlineHtml(html) => self.text(&html, ContentStyle::new()),
            Event::SoftBreak => self.text(" ", ContentStyle::new()),
            Event::HardBreak => self.newline(),
            Event::Rule => {
                self.newline();
                self.styled_str(&"─".repeat(RULE_WIDTH), dim());
                self.blank_line();
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.blank_line();
                self.heading = Some(level);
            }
            Tag::CodeBlock(kind) => {
                self.newline();
                let lang = match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => format!("┌─ {lang}"),
                    _ => "┌─".to_string(),
                };
                self.styled_str(&lang, dim());
                self.out.push('\n');
                self.code_block = true;
            }
            Tag::List(start) => {
                self.newline();
                self.lists.push(start);
            }
            Tag::Item => {
                self.newline();
                self.quote_prefix();
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let bullet = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let bullet = format!("{n}. ");
                        *n += 1;
                        bullet
                    }
                    _ => "• ".to_string(),
                };
                self.out.push_str(&indent);
                self.styled_str(&bullet, bold_colored(Color::Yellow));
            }
            Tag::BlockQuote { .. } => {
                self.newline();
                self.quote_depth += 1;
            }
            Tag::Emphasis => self.italic += 1,
            Tag::Strong => self.bold += 1,
            Tag::Strikethrough => self.strike += 1,
            Tag::Link { dest_url, .. } => self.link = Some(dest_url.to_string()),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                if self.lists.is_empty() {
                    self.blank_line();
                } else {
                    self.newline();
                }
            }
            TagEnd::Heading { .. } => {
                if self.heading == Some(HeadingLevel::H1) {
                    self.newline();
                    self.styled_str(&"═".repeat(RULE_WIDTH), bold_colored(Color::Magenta));
                }
                self.heading = None;
                self.blank_line();
            }
            TagEnd::CodeBlock => {
                self.code_block = false;
                self.newline();
                self.styled_str("└─", dim());
                self.blank_line();
            }
            TagEnd::List { .. } => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank_line();
                }
            }
            TagEnd::Item => self.newline(),
            TagEnd::BlockQuote { .. } => {
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.blank_line();
            }
            TagEnd::Emphasis => self.italic = self.italic.saturating_sub(1),
            TagEnd::Strong => self.bold = self.bold.saturating_sub(1),
            TagEnd::Strikethrough => self.strike = self.strike.saturating_sub(1),
            TagEnd::Link => {
                if let Some(url) = self.link.take() {
                    self.styled_str(&format!(" ({url})"), dim());
                }
            }
            _ => {}
        }
    }

    fn inline_style(&self) -> ContentStyle {
        let mut style = ContentStyle::new();
        match self.heading {
            Some(HeadingLevel::H1) | Some(HeadingLevel::H2) => {
                style = bold_colored(Color::Magenta);
            }
            Some(_) => style.attributes.set(Attribute::Bold),
            None => {}
        }
        if self.bold > 0 {
            style.attributes.set(Attribute::Bold);
        }
        if self.italic > 0 || self.quote_depth > 0 {
            style.attributes.set(Attribute::Italic);
        }
        if self.strike > 0 {
            style.attributes.set(Attribute::CrossedOut);
        }
        if self.link.is_some() {
            style.attributes.set(Attribute::Underlined);
            style.foreground_color = Some(Color::Blue);
        }
        style
    }

    fn text(&mut self, text: &str, style: ContentStyle) {
        if self.at_line_start() {
            self.quote_prefix();
        }
        self.styled_str(text, style);
    }

    fn code_lines(&mut self, text: &str) {
        for line in text.lines() {
            self.styled_str("│ ", dim());
            let mut style = ContentStyle::new();
            style.foreground_color = Some(Color::Green);
            self.styled_str(line, style);
            self.out.push('\n');
        }
    }

    fn quote_prefix(&mut self) {
        if self.quote_depth > 0 {
            self.styled_str(&"▌ ".repeat(self.quote_depth), dim());
        }
    }

    fn styled_str(&mut self, text: &str, style: ContentStyle) {
        if self.styled {
            self.out.push_str(&style.apply(text).to_string());
        } else {
            self.out.push_str(text);
        }
    }

    fn at_line_start(&self) -> bool {
        self.out.is_empty() || self.out.ends_with('\n')
    }

    fn newline(&mut self) {
        if !self.at_line_start() {
            self.out.push('\n');
        }
    }

    fn blank_line(&mut self) {
        self.newline();
        if !self.out.is_empty() && !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }

    fn finish(self) -> String {
        let mut out = self.out.trim_end().to_string();
        out.push('\n');
        out
    }
}

fn dim() -> ContentStyle {
    let mut style = ContentStyle::new();
    style.foreground_color = Some(Color::DarkGrey);
    style
}

fn bold_colored(color: Color) -> ContentStyle {
    let mut style = ContentStyle::new();
    style.foreground_color = Some(color);
    style.attributes.set(Attribute::Bold);
    style
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(markdown: &str) -> String {
        MarkdownRenderer::new(false).render(markdown)
    }

    #[test]
    fn test_document_layout() {
        let doc = "## 🛠️ Purpose of the Function\nReverses a string.\n\n\
                   ## ⚡ Performance Analysis\n- **Time:** O(n)\n- **Space:** O(n)\n\n\
                   ## 💻 Final Code\n```python\n\
                   def reverse(s: str) -> str:\n    return s[::-1]\n```";

        let rendered = plain(doc);
        assert_eq!(
            rendered,
            "🛠️ Purpose of the Function\n\n\
             Reverses a string.\n\n\
             ⚡ Performance Analysis\n\n\
             • Time: O(n)\n\
             • Space: O(n)\n\n\
             💻 Final Code\n\n\
             ┌─ python\n\
             │ def reverse(s: str) -> str:\n\
             │     return s[::-1]\n\
             └─\n"
        );
    }

    #[test]
    fn test_ordered_and_nested_lists() {
        let rendered = plain("1. first\n2. second\n   - inner\n3. third\n");
        assert_eq!(rendered, "1. first\n2. second\n  • inner\n3. third\n");
    }

    #[test]
    fn test_inline_elements() {
        let rendered =
            plain("Use `len()` on *each* [doc](https://example.com).\n\n---\n\n> quoted");
        assert!(rendered.starts_with("Use len() on each doc (https://example.com).\n\n"));
        assert!(rendered.contains(&"─".repeat(RULE_WIDTH)));
        assert!(rendered.ends_with("▌ quoted\n"));
    }

    #[test]
    fn test_h1_is_underlined() {
        let rendered = plain("# Title\nbody");
        assert_eq!(rendered, format!("Title\n{}\n\nbody\n", "═".repeat(RULE_WIDTH)));
    }

    #[test]
    fn test_styled_output_carries_escape_codes() {
        let rendered = MarkdownRenderer::new(true).render("## Final Code\n**bold**");
        assert!(rendered.contains('\u{1b}'));
        assert!(rendered.contains("Final Code"));
        assert!(rendered.contains("bold"));
    }
}
