//! 数学文本预处理
//!
//! 把用日元符号代替反斜杠、使用 `\(…\)` / `\[…\]` 定界符、换行符混杂的输入
//! 统一成 markdown + `$` 公式记法

use regex::Regex;
use std::sync::OnceLock;

fn line_ending_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\r\n?").expect("静态正则表达式"))
}

/// 清洗原始文本
///
/// 替换顺序固定：
/// 1. `¥` / `￥` → `\`
/// 2. `\(` / `\)` → `$`
/// 3. 删除 `\[` / `\]`
/// 4. CRLF / CR → LF
pub fn sanitize(raw: &str) -> String {
    let escaped = raw.replace(|c: char| c == '¥' || c == '￥', "\\");
    let delimited = escaped
        .replace("\\(", "$")
        .replace("\\)", "$")
        .replace("\\[", "")
        .replace("\\]", "");
    line_ending_regex().replace_all(&delimited, "\n").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yen_signs_become_backslash() {
        assert_eq!(sanitize("¥frac{1}{2}"), "\\frac{1}{2}");
        assert_eq!(sanitize("￥alpha + ¥beta"), "\\alpha + \\beta");
        assert_eq!(sanitize("¥¥￥"), "\\\\\\");
    }

    #[test]
    fn test_inline_delimiters_rewritten() {
        assert_eq!(sanitize("解は \\(x=2\\) です"), "解は $x=2$ です");
        // 日元符号写的定界符同样处理
        assert_eq!(sanitize("¥(x^2¥)"), "$x^2$");
    }

    #[test]
    fn test_display_delimiters_removed() {
        assert_eq!(sanitize("前 \\[x^2+1\\] 後"), "前 x^2+1 後");
        assert_eq!(sanitize("\\[\\]"), "");
    }

    #[test]
    fn test_line_endings_normalized() {
        assert_eq!(sanitize("a\r\nb\rc\nd"), "a\nb\nc\nd");
    }

    #[test]
    fn test_plain_text_untouched() {
        let text = "二次方程式 x^2+x+1=0 を解け";
        assert_eq!(sanitize(text), text);
    }
}
