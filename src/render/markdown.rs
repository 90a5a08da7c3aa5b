//! markdown + `$` 公式 → 块结构
//!
//! 基于 pulldown-cmark 的事件流，用一个帧栈把事件折叠成 [`Block`] / [`Inline`] 树

use super::{Block, Formula, Inline};
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag};
use std::mem;

/// 解析清洗后的文本
pub fn parse(text: &str) -> Vec<Block> {
    let mut builder = Builder::new();
    for event in Parser::new_ext(text, Options::ENABLE_MATH) {
        builder.event(event);
    }
    builder.finish()
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FrameKind {
    Root,
    Paragraph,
    Heading(u8),
    Quote,
    List(Option<u64>),
    Item,
    CodeBlock,
    Strong,
    Emphasis,
    /// 不单独建模的容器（链接、图片、表格等），内容并入父级
    Passthrough,
}

impl FrameKind {
    fn is_block(self) -> bool {
        matches!(
            self,
            FrameKind::Paragraph
                | FrameKind::Heading(_)
                | FrameKind::Quote
                | FrameKind::List(_)
                | FrameKind::CodeBlock
        )
    }
}

struct Frame {
    kind: FrameKind,
    blocks: Vec<Block>,
    inlines: Vec<Inline>,
    items: Vec<Vec<Block>>,
    code: String,
}

impl Frame {
    fn new(kind: FrameKind) -> Self {
        Self {
            kind,
            blocks: Vec::new(),
            inlines: Vec::new(),
            items: Vec::new(),
            code: String::new(),
        }
    }

    /// 紧凑列表项中的文本没有段落包裹，遇到块级元素前先收成段落
    fn flush_inlines(&mut self) {
        if !self.inlines.is_empty() {
            let inlines = mem::take(&mut self.inlines);
            self.blocks.push(Block::Paragraph(inlines));
        }
    }
}

struct Builder {
    stack: Vec<Frame>,
}

impl Builder {
    fn new() -> Self {
        Self {
            stack: vec![Frame::new(FrameKind::Root)],
        }
    }

    fn top(&mut self) -> &mut Frame {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn push_inline(&mut self, inline: Inline) {
        self.top().inlines.push(inline);
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.open(tag),
            Event::End(_) => self.close(),
            Event::Text(text) => {
                let top = self.top();
                if top.kind == FrameKind::CodeBlock {
                    top.code.push_str(&text);
                } else {
                    top.inlines.push(Inline::Text(text.into_string()));
                }
            }
            Event::Code(code) => self.push_inline(Inline::Code(code.into_string())),
            Event::InlineMath(source) => self.push_inline(Inline::Math(Formula::new(&source, false))),
            Event::DisplayMath(source) => self.push_inline(Inline::Math(Formula::new(&source, true))),
            Event::Html(html) | Event::InlineHtml(html) => {
                self.push_inline(Inline::Text(html.into_string()))
            }
            Event::FootnoteReference(name) => {
                self.push_inline(Inline::Text(format!("[^{}]", name)))
            }
            Event::SoftBreak => self.push_inline(Inline::SoftBreak),
            Event::HardBreak => self.push_inline(Inline::HardBreak),
            Event::Rule => {
                let top = self.top();
                top.flush_inlines();
                top.blocks.push(Block::Rule);
            }
            Event::TaskListMarker(done) => {
                let marker = if done { "[x] " } else { "[ ] " };
                self.push_inline(Inline::Text(marker.to_string()))
            }
            #[allow(unreachable_patterns)]
            _ => {}
        }
    }

    fn open(&mut self, tag: Tag<'_>) {
        let kind = match tag {
            Tag::Paragraph => FrameKind::Paragraph,
            Tag::Heading { level, .. } => FrameKind::Heading(heading_level(level)),
            Tag::BlockQuote(_) => FrameKind::Quote,
            Tag::CodeBlock(_) => FrameKind::CodeBlock,
            Tag::List(start) => FrameKind::List(start),
            Tag::Item => FrameKind::Item,
            Tag::Emphasis => FrameKind::Emphasis,
            Tag::Strong => FrameKind::Strong,
            _ => FrameKind::Passthrough,
        };
        if kind.is_block() {
            self.top().flush_inlines();
        }
        self.stack.push(Frame::new(kind));
    }

    fn close(&mut self) {
        if self.stack.len() <= 1 {
            return;
        }
        let Some(mut frame) = self.stack.pop() else {
            return;
        };
        let parent = self.top();

        match frame.kind {
            FrameKind::Paragraph => parent.blocks.push(Block::Paragraph(frame.inlines)),
            FrameKind::Heading(level) => parent.blocks.push(Block::Heading {
                level,
                content: frame.inlines,
            }),
            FrameKind::Quote => {
                frame.flush_inlines();
                parent.blocks.push(Block::Quote(frame.blocks));
            }
            FrameKind::CodeBlock => parent.blocks.push(Block::Code(frame.code)),
            FrameKind::List(start) => parent.blocks.push(Block::List {
                start,
                items: frame.items,
            }),
            FrameKind::Item => {
                frame.flush_inlines();
                parent.items.push(frame.blocks);
            }
            FrameKind::Strong => parent.inlines.push(Inline::Strong(frame.inlines)),
            FrameKind::Emphasis => parent.inlines.push(Inline::Emphasis(frame.inlines)),
            FrameKind::Passthrough => {
                parent.blocks.extend(frame.blocks);
                parent.inlines.extend(frame.inlines);
            }
            FrameKind::Root => {}
        }
    }

    fn finish(mut self) -> Vec<Block> {
        while self.stack.len() > 1 {
            self.close();
        }
        let root = self.top();
        root.flush_inlines();
        mem::take(&mut root.blocks)
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
