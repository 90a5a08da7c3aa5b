//! 数学文本渲染
//!
//! `render(raw)` 是纯函数：清洗 → markdown + 公式解析 → 可显示的块结构。
//! 空输入或清洗后只剩空白时不产生任何输出

pub mod markdown;
pub mod sanitize;
pub mod tex;

pub use sanitize::sanitize;
pub use tex::typeset;

/// 渲染结果
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedText {
    blocks: Vec<Block>,
}

/// 块级元素
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Vec<Inline>),
    Heading { level: u8, content: Vec<Inline> },
    List {
        start: Option<u64>,
        items: Vec<Vec<Block>>,
    },
    Quote(Vec<Block>),
    Code(String),
    Rule,
}

/// 行内元素
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(String),
    Code(String),
    Strong(Vec<Inline>),
    Emphasis(Vec<Inline>),
    Math(Formula),
    SoftBreak,
    HardBreak,
}

/// 公式：源码 + 排版结果
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    pub source: String,
    pub typeset: String,
    /// `$$…$$` 独立公式
    pub display: bool,
}

impl Formula {
    pub fn new(source: &str, display: bool) -> Self {
        Self {
            source: source.to_string(),
            typeset: typeset(source),
            display,
        }
    }
}

/// 渲染数学文本
///
/// # 返回
/// 输入为空、或清洗后只剩空白时返回 `None`
pub fn render(raw: &str) -> Option<RenderedText> {
    if raw.is_empty() {
        return None;
    }
    let sanitized = sanitize(raw);
    if sanitized.trim().is_empty() {
        return None;
    }
    Some(RenderedText {
        blocks: markdown::parse(&sanitized),
    })
}

/// 渲染可选字段
pub fn render_optional(raw: Option<&str>) -> Option<RenderedText> {
    raw.and_then(render)
}

impl RenderedText {
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// 所有公式（按出现顺序）
    pub fn formulas(&self) -> Vec<&Formula> {
        let mut found = Vec::new();
        collect_block_formulas(&self.blocks, &mut found);
        found
    }

    /// 终端显示用的纯文本
    pub fn to_plain_text(&self) -> String {
        blocks_to_text(&self.blocks)
    }
}

impl std::fmt::Display for RenderedText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_plain_text())
    }
}

fn collect_block_formulas<'a>(blocks: &'a [Block], found: &mut Vec<&'a Formula>) {
    for block in blocks {
        match block {
            Block::Paragraph(inlines) | Block::Heading { content: inlines, .. } => {
                collect_inline_formulas(inlines, found)
            }
            Block::List { items, .. } => {
                for item in items {
                    collect_block_formulas(item, found);
                }
            }
            Block::Quote(inner) => collect_block_formulas(inner, found),
            Block::Code(_) | Block::Rule => {}
        }
    }
}

fn collect_inline_formulas<'a>(inlines: &'a [Inline], found: &mut Vec<&'a Formula>) {
    for inline in inlines {
        match inline {
            Inline::Math(formula) => found.push(formula),
            Inline::Strong(inner) | Inline::Emphasis(inner) => collect_inline_formulas(inner, found),
            _ => {}
        }
    }
}

// ========== 纯文本输出 ==========

fn blocks_to_text(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(block_to_text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn block_to_text(block: &Block) -> String {
    match block {
        Block::Paragraph(inlines) => inlines_to_text(inlines),
        Block::Heading { level, content } => {
            let marker = if *level <= 2 { "■" } else { "□" };
            format!("{} {}", marker, inlines_to_text(content))
        }
        Block::List { start, items } => items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                let marker = match start {
                    Some(n) => format!("{}. ", n + idx as u64),
                    None => "・".to_string(),
                };
                let body = item
                    .iter()
                    .map(block_to_text)
                    .collect::<Vec<_>>()
                    .join("\n");
                hanging_indent(&marker, &body)
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Block::Quote(inner) => prefix_lines(&blocks_to_text(inner), "> "),
        Block::Code(code) => prefix_lines(code.trim_end_matches('\n'), "    "),
        Block::Rule => "─".repeat(20),
    }
}

fn inlines_to_text(inlines: &[Inline]) -> String {
    let mut out = String::new();
    write_inlines(inlines, &mut out);
    out.trim_matches('\n').to_string()
}

fn write_inlines(inlines: &[Inline], out: &mut String) {
    for inline in inlines {
        match inline {
            Inline::Text(text) => out.push_str(text),
            Inline::Code(code) => {
                out.push('`');
                out.push_str(code);
                out.push('`');
            }
            Inline::Strong(inner) | Inline::Emphasis(inner) => write_inlines(inner, out),
            Inline::Math(formula) if formula.display => {
                ensure_line_start(out);
                out.push_str(&prefix_lines(&formula.typeset, "    "));
                out.push('\n');
            }
            Inline::Math(formula) => out.push_str(&formula.typeset),
            Inline::SoftBreak | Inline::HardBreak => ensure_line_start(out),
        }
    }
}

fn ensure_line_start(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

fn prefix_lines(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{}{}", prefix, line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn hanging_indent(marker: &str, body: &str) -> String {
    let pad = " ".repeat(marker.chars().count().max(2));
    body.lines()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                format!("{}{}", marker, line)
            } else {
                format!("{}{}", pad, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_blank_render_nothing() {
        assert_eq!(render(""), None);
        assert_eq!(render("   \n\t "), None);
        assert_eq!(render("\\[\\]"), None);
        assert_eq!(render_optional(None), None);
        // 重复渲染结果相同
        assert_eq!(render("  "), render("  "));
    }

    #[test]
    fn test_inline_formula_text() {
        let rendered = render("解は \\(x=\\pm 3\\) です").unwrap();
        assert_eq!(rendered.to_plain_text(), "解は x=±3 です");
        assert_eq!(rendered.formulas().len(), 1);
        assert_eq!(rendered.formulas()[0].source, "x=\\pm 3");
    }

    #[test]
    fn test_yen_formula() {
        let rendered = render("$¥frac{1}{2}$").unwrap();
        assert_eq!(rendered.to_plain_text(), "1/2");
    }

    #[test]
    fn test_display_formula_on_own_line() {
        let rendered = render("次の式を計算せよ。\n$$x^2-1$$\n答えを書け。").unwrap();
        assert_eq!(
            rendered.to_plain_text(),
            "次の式を計算せよ。\n    x²-1\n答えを書け。"
        );
    }

    #[test]
    fn test_blocks_joined() {
        let rendered = render("## 方針\r\n\r\n1. 因数分解する\r\n2. $x$ を求める").unwrap();
        assert_eq!(
            rendered.to_plain_text(),
            "■ 方針\n\n1. 因数分解する\n2. x を求める"
        );
    }

    #[test]
    fn test_display_delimiters_leave_plain_text() {
        let rendered = render("\\[x+1\\]").unwrap();
        assert_eq!(rendered.to_plain_text(), "x+1");
        assert!(rendered.formulas().is_empty());
    }
}
