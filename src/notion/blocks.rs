//! Conversion from markdown to Notion block and rich-text objects.
//!
//! Every markdown construct is mapped explicitly onto a block type the
//! Notion API accepts. Shapes Notion has no equivalent for (raw HTML,
//! footnotes, math) are logged and dropped instead of being forwarded.

use log::warn;
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use serde::Serialize;

/// Notion rejects text objects longer than this many characters
pub const MAX_TEXT_LENGTH: usize = 2000;

/// Longest block list or rich-text array one request may carry
pub const MAX_ARRAY_LENGTH: usize = 100;

/// Levels of `children` allowed below a top-level block in one request
pub const MAX_NESTING_DEPTH: usize = 2;

/// Code languages the Notion API accepts
const NOTION_LANGUAGES: &[&str] = &[
    "abap", "arduino", "bash", "basic", "c", "clojure", "coffeescript", "c++", "c#", "css",
    "dart", "diff", "docker", "elixir", "elm", "erlang", "flow", "fortran", "f#", "gherkin",
    "glsl", "go", "graphql", "groovy", "haskell", "html", "java", "javascript", "json", "julia",
    "kotlin", "latex", "less", "lisp", "livescript", "lua", "makefile", "markdown", "markup",
    "matlab", "mermaid", "nix", "objective-c", "ocaml", "pascal", "perl", "php", "plain text",
    "powershell", "prolog", "protobuf", "python", "r", "reason", "ruby", "rust", "sass",
    "scala", "scheme", "scss", "shell", "sql", "swift", "typescript", "vb.net", "verilog",
    "vhdl", "visual basic", "webassembly", "xml", "yaml",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Annotations {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub strikethrough: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub code: bool,
}

impl Annotations {
    fn is_plain(&self) -> bool {
        *self == Annotations::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Text {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
}

/// A single styled run of text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RichText {
    Text {
        text: Text,
        #[serde(skip_serializing_if = "Annotations::is_plain")]
        annotations: Annotations,
    },
}

impl RichText {
    pub fn plain(content: impl Into<String>) -> Self {
        RichText::Text {
            text: Text {
                content: content.into(),
                link: None,
            },
            annotations: Annotations::default(),
        }
    }

    pub fn content(&self) -> &str {
        match self {
            RichText::Text { text, .. } => &text.content,
        }
    }

    pub fn annotations(&self) -> &Annotations {
        match self {
            RichText::Text { annotations, .. } => annotations,
        }
    }

    pub fn link(&self) -> Option<&str> {
        match self {
            RichText::Text { text, .. } => text.link.as_ref().map(|link| link.url.as_str()),
        }
    }
}

/// Plain text split into runs that fit Notion's length limit
pub fn plain_text(content: &str) -> Vec<RichText> {
    let mut runs = Vec::new();
    push_run(&mut runs, content, &Annotations::default(), None);
    truncate_runs(&mut runs);
    runs
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextContent {
    pub rich_text: Vec<RichText>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToDoContent {
    pub rich_text: Vec<RichText>,
    pub checked: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeContent {
    pub rich_text: Vec<RichText>,
    pub language: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Empty {}

/// A Notion block as accepted by the page creation endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph {
        paragraph: TextContent,
    },
    #[serde(rename = "heading_1")]
    Heading1 {
        heading_1: TextContent,
    },
    #[serde(rename = "heading_2")]
    Heading2 {
        heading_2: TextContent,
    },
    #[serde(rename = "heading_3")]
    Heading3 {
        heading_3: TextContent,
    },
    BulletedListItem {
        bulleted_list_item: TextContent,
    },
    NumberedListItem {
        numbered_list_item: TextContent,
    },
    ToDo {
        to_do: ToDoContent,
    },
    Quote {
        quote: TextContent,
    },
    Code {
        code: CodeContent,
    },
    Divider {
        divider: Empty,
    },
}

impl Block {
    /// Rich text of the block, empty for dividers
    pub fn rich_text(&self) -> &[RichText] {
        match self {
            Block::Paragraph { paragraph: c }
            | Block::Heading1 { heading_1: c }
            | Block::Heading2 { heading_2: c }
            | Block::Heading3 { heading_3: c }
            | Block::BulletedListItem {
                bulleted_list_item: c,
            }
            | Block::NumberedListItem {
                numbered_list_item: c,
            }
            | Block::Quote { quote: c } => &c.rich_text,
            Block::ToDo { to_do } => &to_do.rich_text,
            Block::Code { code } => &code.rich_text,
            Block::Divider { .. } => &[],
        }
    }

    pub fn children(&self) -> &[Block] {
        match self {
            Block::Paragraph { paragraph: c }
            | Block::Heading1 { heading_1: c }
            | Block::Heading2 { heading_2: c }
            | Block::Heading3 { heading_3: c }
            | Block::BulletedListItem {
                bulleted_list_item: c,
            }
            | Block::NumberedListItem {
                numbered_list_item: c,
            }
            | Block::Quote { quote: c } => &c.children,
            Block::ToDo { to_do } => &to_do.children,
            Block::Code { .. } | Block::Divider { .. } => &[],
        }
    }

    fn parts_mut(&mut self) -> (Option<&mut Vec<RichText>>, Option<&mut Vec<Block>>) {
        match self {
            Block::Paragraph { paragraph: c }
            | Block::Heading1 { heading_1: c }
            | Block::Heading2 { heading_2: c }
            | Block::Heading3 { heading_3: c }
            | Block::BulletedListItem {
                bulleted_list_item: c,
            }
            | Block::NumberedListItem {
                numbered_list_item: c,
            }
            | Block::Quote { quote: c } => (Some(&mut c.rich_text), Some(&mut c.children)),
            Block::ToDo { to_do } => (Some(&mut to_do.rich_text), Some(&mut to_do.children)),
            Block::Code { code } => (Some(&mut code.rich_text), None),
            Block::Divider { .. } => (None, None),
        }
    }

    /// Concatenated text content, handy for logging and assertions
    pub fn text(&self) -> String {
        self.rich_text().iter().map(RichText::content).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Paragraph,
    Heading(u8),
    Item { ordered: bool },
    ToDo { checked: bool },
    Quote,
    Code,
}

#[derive(Debug)]
struct OpenBlock {
    kind: Kind,
    rich_text: Vec<RichText>,
    children: Vec<Block>,
    language: String,
}

impl OpenBlock {
    fn new(kind: Kind) -> Self {
        OpenBlock {
            kind,
            rich_text: Vec::new(),
            children: Vec::new(),
            language: String::new(),
        }
    }

    fn is_container(&self) -> bool {
        matches!(self.kind, Kind::Item { .. } | Kind::ToDo { .. } | Kind::Quote)
    }

    fn into_block(self) -> Block {
        let content = TextContent {
            rich_text: self.rich_text,
            children: self.children,
        };
        match self.kind {
            Kind::Paragraph => Block::Paragraph { paragraph: content },
            Kind::Heading(1) => Block::Heading1 { heading_1: content },
            Kind::Heading(2) => Block::Heading2 { heading_2: content },
            Kind::Heading(_) => Block::Heading3 { heading_3: content },
            Kind::Item { ordered: true } => Block::NumberedListItem {
                numbered_list_item: content,
            },
            Kind::Item { ordered: false } => Block::BulletedListItem {
                bulleted_list_item: content,
            },
            Kind::ToDo { checked } => Block::ToDo {
                to_do: ToDoContent {
                    rich_text: content.rich_text,
                    checked,
                    children: content.children,
                },
            },
            Kind::Quote => Block::Quote { quote: content },
            Kind::Code => {
                let mut rich_text = content.rich_text;
                if let Some(RichText::Text { text, .. }) = rich_text.last_mut() {
                    let trimmed = text.content.trim_end_matches('\n').len();
                    text.content.truncate(trimmed);
                }
                Block::Code {
                    code: CodeContent {
                        rich_text,
                        language: if self.language.is_empty() {
                            "plain text".to_string()
                        } else {
                            self.language
                        },
                    },
                }
            }
        }
    }
}

#[derive(Debug, Default)]
struct Converter {
    blocks: Vec<Block>,
    open: Vec<OpenBlock>,
    lists: Vec<bool>,
    /// Whether each open markdown paragraph pushed its own block
    paragraphs: Vec<bool>,
    annotations: Annotations,
    link: Option<String>,
}

impl Converter {
    fn convert(mut self, markdown: &str) -> Vec<Block> {
        let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
        for event in Parser::new_ext(markdown, options) {
            self.handle(event);
        }
        while !self.open.is_empty() {
            self.close();
        }
        self.blocks
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => {
                let mut annotations = self.annotations.clone();
                annotations.code = true;
                let link = self.link.clone();
                push_run(&mut self.current().rich_text, &code, &annotations, link);
            }
            Event::SoftBreak | Event::HardBreak => self.text("\n"),
            Event::Rule => self.emit(Block::Divider { divider: Empty {} }),
            Event::TaskListMarker(checked) => {
                if let Some(top) = self.open.last_mut() {
                    if matches!(top.kind, Kind::Item { .. }) {
                        top.kind = Kind::ToDo { checked };
                    }
                }
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                warn!("Dropping unsupported HTML in markdown: {}", html.trim());
            }
            other => warn!("Dropping unsupported markdown element: {:?}", other),
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                let reuse = self
                    .open
                    .last()
                    .map(|top| {
                        top.is_container() && top.rich_text.is_empty() && top.children.is_empty()
                    })
                    .unwrap_or(false);
                if !reuse {
                    self.open.push(OpenBlock::new(Kind::Paragraph));
                }
                self.paragraphs.push(!reuse);
            }
            Tag::Heading { level, .. } => {
                let level = match level {
                    HeadingLevel::H1 => 1,
                    HeadingLevel::H2 => 2,
                    _ => 3,
                };
                self.open.push(OpenBlock::new(Kind::Heading(level)));
            }
            Tag::BlockQuote { .. } => self.open.push(OpenBlock::new(Kind::Quote)),
            Tag::CodeBlock(kind) => {
                let mut block = OpenBlock::new(Kind::Code);
                if let CodeBlockKind::Fenced(info) = kind {
                    block.language = notion_language(&info).to_string();
                }
                self.open.push(block);
            }
            Tag::List(start) => self.lists.push(start.is_some()),
            Tag::Item => {
                let ordered = self.lists.last().copied().unwrap_or(false);
                self.open.push(OpenBlock::new(Kind::Item { ordered }));
            }
            Tag::Emphasis => self.annotations.italic = true,
            Tag::Strong => self.annotations.bold = true,
            Tag::Strikethrough => self.annotations.strikethrough = true,
            Tag::Link { dest_url, .. } | Tag::Image { dest_url, .. } => {
                self.link = Some(dest_url.to_string());
            }
            Tag::HtmlBlock => {}
            other => warn!("Unsupported markdown block {:?}, keeping its text", other),
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                if self.paragraphs.pop().unwrap_or(false) {
                    self.close();
                }
            }
            TagEnd::Heading { .. }
            | TagEnd::BlockQuote { .. }
            | TagEnd::CodeBlock
            | TagEnd::Item => self.close(),
            TagEnd::List { .. } => {
                self.lists.pop();
            }
            TagEnd::Emphasis => self.annotations.italic = false,
            TagEnd::Strong => self.annotations.bold = false,
            TagEnd::Strikethrough => self.annotations.strikethrough = false,
            TagEnd::Link | TagEnd::Image => self.link = None,
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        let annotations = self.annotations.clone();
        let link = self.link.clone();
        push_run(&mut self.current().rich_text, text, &annotations, link);
    }

    /// The block receiving inline content, opening a paragraph if needed
    fn current(&mut self) -> &mut OpenBlock {
        if self.open.is_empty() {
            self.open.push(OpenBlock::new(Kind::Paragraph));
        }
        let last = self.open.len() - 1;
        &mut self.open[last]
    }

    fn close(&mut self) {
        if let Some(open) = self.open.pop() {
            let block = open.into_block();
            self.emit(block);
        }
    }

    fn emit(&mut self, block: Block) {
        match self.open.last_mut() {
            Some(parent) if parent.is_container() => parent.children.push(block),
            // Paragraphs and headings cannot hold children; close them first
            Some(_) => {
                self.close();
                self.emit(block);
            }
            None => self.blocks.push(block),
        }
    }
}

/// Append a run, merging it into the previous run when styles match
fn push_run(runs: &mut Vec<RichText>, content: &str, annotations: &Annotations, link: Option<String>) {
    if content.is_empty() {
        return;
    }

    let mut rest = content;
    if let Some(RichText::Text {
        text,
        annotations: previous,
    }) = runs.last_mut()
    {
        let same_link = text.link.as_ref().map(|l| l.url.as_str()) == link.as_deref();
        if previous == annotations && same_link {
            let room = MAX_TEXT_LENGTH.saturating_sub(text.content.chars().count());
            let (head, tail) = split_at_chars(rest, room);
            text.content.push_str(head);
            rest = tail;
        }
    }

    while !rest.is_empty() {
        let (head, tail) = split_at_chars(rest, MAX_TEXT_LENGTH);
        runs.push(RichText::Text {
            text: Text {
                content: head.to_string(),
                link: link.clone().map(|url| Link { url }),
            },
            annotations: annotations.clone(),
        });
        rest = tail;
    }
}

/// Map a fence info string onto a language Notion accepts
fn notion_language(info: &str) -> &'static str {
    let name = info
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();
    let alias = match name.as_str() {
        "" | "text" | "txt" | "plain" | "plaintext" => "plain text",
        "py" | "python3" => "python",
        "js" | "jsx" | "node" => "javascript",
        "ts" | "tsx" => "typescript",
        "rs" => "rust",
        "sh" | "zsh" | "console" => "shell",
        "ps1" | "pwsh" => "powershell",
        "rb" => "ruby",
        "yml" => "yaml",
        "md" => "markdown",
        "cpp" | "cxx" | "cc" | "hpp" => "c++",
        "cs" | "csharp" => "c#",
        "fs" | "fsharp" => "f#",
        "kt" | "kts" => "kotlin",
        "golang" => "go",
        "dockerfile" => "docker",
        "make" => "makefile",
        "objc" => "objective-c",
        "tex" => "latex",
        "htm" | "xhtml" => "html",
        "proto" => "protobuf",
        "wasm" => "webassembly",
        "vb" => "visual basic",
        other => other,
    };

    NOTION_LANGUAGES
        .iter()
        .find(|language| **language == alias)
        .copied()
        .unwrap_or_else(|| {
            warn!("Unknown code language {:?}, using plain text", name);
            "plain text"
        })
}

/// Drop rich-text runs past the per-array limit
fn truncate_runs(runs: &mut Vec<RichText>) {
    if runs.len() > MAX_ARRAY_LENGTH {
        warn!(
            "Dropping {} rich text runs beyond the limit of {}",
            runs.len() - MAX_ARRAY_LENGTH,
            MAX_ARRAY_LENGTH
        );
        runs.truncate(MAX_ARRAY_LENGTH);
    }
}

/// Clamp a block tree to what a single page creation request accepts
///
/// Children below `MAX_NESTING_DEPTH` are hoisted to follow their parent,
/// and every array is cut at `MAX_ARRAY_LENGTH`.
fn fit_request_limits(blocks: Vec<Block>, depth: usize) -> Vec<Block> {
    let mut fitted = Vec::with_capacity(blocks.len());
    for mut block in blocks {
        let (rich_text, children) = block.parts_mut();
        if let Some(rich_text) = rich_text {
            truncate_runs(rich_text);
        }
        let hoisted = match children {
            Some(children) if depth >= MAX_NESTING_DEPTH && !children.is_empty() => {
                warn!(
                    "Flattening {} blocks nested deeper than {} levels",
                    children.len(),
                    MAX_NESTING_DEPTH
                );
                std::mem::take(children)
            }
            Some(children) => {
                let nested = std::mem::take(children);
                *children = fit_request_limits(nested, depth + 1);
                Vec::new()
            }
            None => Vec::new(),
        };
        fitted.push(block);
        fitted.extend(fit_request_limits(hoisted, depth));
    }

    if fitted.len() > MAX_ARRAY_LENGTH {
        warn!(
            "Dropping {} blocks beyond the limit of {}",
            fitted.len() - MAX_ARRAY_LENGTH,
            MAX_ARRAY_LENGTH
        );
        fitted.truncate(MAX_ARRAY_LENGTH);
    }
    fitted
}

fn split_at_chars(s: &str, count: usize) -> (&str, &str) {
    match s.char_indices().nth(count) {
        Some((index, _)) => s.split_at(index),
        None => (s, ""),
    }
}

/// Convert a markdown document into Notion blocks that fit one request
pub fn markdown_to_blocks(markdown: &str) -> Vec<Block> {
    fit_request_limits(Converter::default().convert(markdown), 0)
}

/// Convert inline markdown into rich text for a property value
///
/// Paragraph boundaries become newlines; block structure is flattened.
pub fn markdown_to_rich_text(markdown: &str) -> Vec<RichText> {
    let mut runs = Vec::new();
    for (index, block) in markdown_to_blocks(markdown).into_iter().enumerate() {
        if index > 0 {
            push_run(&mut runs, "\n", &Annotations::default(), None);
        }
        flatten_into(&mut runs, &block);
    }
    truncate_runs(&mut runs);
    runs
}

fn flatten_into(runs: &mut Vec<RichText>, block: &Block) {
    for run in block.rich_text() {
        push_run(
            runs,
            run.content(),
            run.annotations(),
            run.link().map(str::to_string),
        );
    }
    for child in block.children() {
        push_run(runs, "\n", &Annotations::default(), None);
        flatten_into(runs, child);
    }
}
