//! TeX 子集排版
//!
//! 把 `$…$` 里的公式转换成终端可以直接显示的 Unicode 文本：
//! 上下标、分数、根号、希腊字母、关系符与箭头、函数名、`\text{}`、
//! `\mathbb`、重音符号、`\left`/`\right`、环境（`cases` 等）
//!
//! 与 TeX 相同，数学模式中源文本的空白会被忽略

use phf::{phf_map, phf_set};

static SYMBOLS: phf::Map<&'static str, &'static str> = phf_map! {
    // 希腊字母
    "alpha" => "α", "beta" => "β", "gamma" => "γ", "delta" => "δ",
    "epsilon" => "ϵ", "varepsilon" => "ε", "zeta" => "ζ", "eta" => "η",
    "theta" => "θ", "vartheta" => "ϑ", "iota" => "ι", "kappa" => "κ",
    "lambda" => "λ", "mu" => "μ", "nu" => "ν", "xi" => "ξ", "pi" => "π",
    "varpi" => "ϖ", "rho" => "ρ", "varrho" => "ϱ", "sigma" => "σ",
    "varsigma" => "ς", "tau" => "τ", "upsilon" => "υ", "phi" => "ϕ",
    "varphi" => "φ", "chi" => "χ", "psi" => "ψ", "omega" => "ω",
    "Gamma" => "Γ", "Delta" => "Δ", "Theta" => "Θ", "Lambda" => "Λ",
    "Xi" => "Ξ", "Pi" => "Π", "Sigma" => "Σ", "Upsilon" => "Υ",
    "Phi" => "Φ", "Psi" => "Ψ", "Omega" => "Ω",
    // 运算符
    "times" => "×", "div" => "÷", "pm" => "±", "mp" => "∓", "cdot" => "·",
    "ast" => "∗", "star" => "⋆", "circ" => "∘", "bullet" => "•",
    "cap" => "∩", "cup" => "∪", "setminus" => "∖", "oplus" => "⊕",
    "otimes" => "⊗", "land" => "∧", "lor" => "∨", "wedge" => "∧",
    "vee" => "∨", "neg" => "¬", "lnot" => "¬",
    // 关系符
    "le" => "≤", "leq" => "≤", "leqq" => "≦", "leqslant" => "⩽",
    "ge" => "≥", "geq" => "≥", "geqq" => "≧", "geqslant" => "⩾",
    "ne" => "≠", "neq" => "≠", "approx" => "≈", "equiv" => "≡",
    "sim" => "∼", "simeq" => "≃", "cong" => "≅", "propto" => "∝",
    "parallel" => "∥", "perp" => "⊥", "in" => "∈", "notin" => "∉",
    "ni" => "∋", "subset" => "⊂", "subseteq" => "⊆", "supset" => "⊃",
    "supseteq" => "⊇", "mid" => "∣", "ll" => "≪", "gg" => "≫",
    // 箭头
    "to" => "→", "rightarrow" => "→", "leftarrow" => "←", "gets" => "←",
    "Rightarrow" => "⇒", "Leftarrow" => "⇐", "Leftrightarrow" => "⇔",
    "leftrightarrow" => "↔", "iff" => "⇔", "implies" => "⇒",
    "mapsto" => "↦", "uparrow" => "↑", "downarrow" => "↓",
    "longrightarrow" => "⟶", "Longrightarrow" => "⟹",
    // 其他
    "infty" => "∞", "partial" => "∂", "nabla" => "∇", "forall" => "∀",
    "exists" => "∃", "emptyset" => "∅", "varnothing" => "∅",
    "angle" => "∠", "triangle" => "△", "square" => "□", "therefore" => "∴",
    "because" => "∵", "cdots" => "⋯", "ldots" => "…", "dots" => "…",
    "vdots" => "⋮", "ddots" => "⋱", "prime" => "′", "degree" => "°",
    "sum" => "∑", "prod" => "∏", "int" => "∫", "iint" => "∬", "oint" => "∮",
    "langle" => "⟨", "rangle" => "⟩", "lfloor" => "⌊", "rfloor" => "⌋",
    "lceil" => "⌈", "rceil" => "⌉", "lbrace" => "{", "rbrace" => "}",
    "backslash" => "\\", "hbar" => "ℏ", "ell" => "ℓ", "|" => "‖",
    "{" => "{", "}" => "}", "%" => "%", "$" => "$", "#" => "#", "&" => "&", "_" => "_",
};

static FUNCTIONS: phf::Set<&'static str> = phf_set! {
    "sin", "cos", "tan", "cot", "sec", "csc", "arcsin", "arccos", "arctan",
    "sinh", "cosh", "tanh", "log", "ln", "lg", "exp", "lim", "limsup",
    "liminf", "max", "min", "sup", "inf", "det", "gcd", "deg", "dim",
    "ker", "arg", "Pr",
};

static SUPERSCRIPTS: phf::Map<char, char> = phf_map! {
    '0' => '⁰', '1' => '¹', '2' => '²', '3' => '³', '4' => '⁴',
    '5' => '⁵', '6' => '⁶', '7' => '⁷', '8' => '⁸', '9' => '⁹',
    '+' => '⁺', '-' => '⁻', '−' => '⁻', '=' => '⁼', '(' => '⁽', ')' => '⁾',
    'a' => 'ᵃ', 'b' => 'ᵇ', 'c' => 'ᶜ', 'd' => 'ᵈ', 'e' => 'ᵉ', 'f' => 'ᶠ',
    'g' => 'ᵍ', 'h' => 'ʰ', 'i' => 'ⁱ', 'j' => 'ʲ', 'k' => 'ᵏ', 'l' => 'ˡ',
    'm' => 'ᵐ', 'n' => 'ⁿ', 'o' => 'ᵒ', 'p' => 'ᵖ', 'r' => 'ʳ', 's' => 'ˢ',
    't' => 'ᵗ', 'u' => 'ᵘ', 'v' => 'ᵛ', 'w' => 'ʷ', 'x' => 'ˣ', 'y' => 'ʸ',
    'z' => 'ᶻ',
    '′' => '′', '∘' => '°',
};

static SUBSCRIPTS: phf::Map<char, char> = phf_map! {
    '0' => '₀', '1' => '₁', '2' => '₂', '3' => '₃', '4' => '₄',
    '5' => '₅', '6' => '₆', '7' => '₇', '8' => '₈', '9' => '₉',
    '+' => '₊', '-' => '₋', '−' => '₋', '=' => '₌', '(' => '₍', ')' => '₎',
    'a' => 'ₐ', 'e' => 'ₑ', 'h' => 'ₕ', 'i' => 'ᵢ', 'j' => 'ⱼ', 'k' => 'ₖ',
    'l' => 'ₗ', 'm' => 'ₘ', 'n' => 'ₙ', 'o' => 'ₒ', 'p' => 'ₚ', 'r' => 'ᵣ',
    's' => 'ₛ', 't' => 'ₜ', 'u' => 'ᵤ', 'v' => 'ᵥ', 'x' => 'ₓ',
};

#[derive(Clone, Copy)]
enum Script {
    Super,
    Sub,
}

/// 排版一个公式
pub fn typeset(source: &str) -> String {
    let mut typesetter = Typesetter {
        chars: source.chars().collect(),
        pos: 0,
    };
    let raw = typesetter.sequence(None);
    tidy(&raw)
}

struct Typesetter {
    chars: Vec<char>,
    pos: usize,
}

impl Typesetter {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_spaces(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn peek_non_space(&self) -> Option<char> {
        self.chars[self.pos..]
            .iter()
            .copied()
            .find(|c| !c.is_whitespace())
    }

    /// 排版到 `close` 为止（不含），`None` 表示到结尾
    fn sequence(&mut self, close: Option<char>) -> String {
        let mut out = String::new();
        while let Some(c) = self.bump() {
            if Some(c) == close {
                break;
            }
            match c {
                '{' => out.push_str(&self.sequence(Some('}'))),
                '}' | '&' => {}
                '^' => {
                    let arg = self.argument();
                    out.push_str(&script(&arg, Script::Super));
                }
                '_' => {
                    let arg = self.argument();
                    out.push_str(&script(&arg, Script::Sub));
                }
                '\\' => out.push_str(&self.command()),
                '\'' => out.push('′'),
                '~' => out.push(' '),
                c if c.is_whitespace() => {}
                c => out.push(c),
            }
        }
        out
    }

    /// 读取一个参数：`{…}`、一个命令或一个字符
    fn argument(&mut self) -> String {
        self.skip_spaces();
        match self.bump() {
            Some('{') => self.sequence(Some('}')),
            Some('\\') => self.command(),
            Some(c) => c.to_string(),
            None => String::new(),
        }
    }

    /// 原样读取 `{…}` 中的文本（用于 `\text`）
    fn raw_argument(&mut self) -> String {
        self.skip_spaces();
        if self.peek() != Some('{') {
            return self.bump().map(String::from).unwrap_or_default();
        }
        self.pos += 1;

        let mut depth = 1;
        let mut out = String::new();
        while let Some(c) = self.bump() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            out.push(c);
        }
        out
    }

    fn command_name(&mut self) -> String {
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() => {
                let mut name = String::new();
                while let Some(c) = self.peek().filter(char::is_ascii_alphabetic) {
                    name.push(c);
                    self.pos += 1;
                }
                name
            }
            Some(c) => {
                self.pos += 1;
                c.to_string()
            }
            None => String::new(),
        }
    }

    fn command(&mut self) -> String {
        let name = self.command_name();
        match name.as_str() {
            "" => String::new(),
            "frac" | "dfrac" | "tfrac" | "cfrac" => {
                let numerator = self.argument();
                let denominator = self.argument();
                format!("{}/{}", wrap(&numerator), wrap(&denominator))
            }
            "sqrt" => {
                let index = if self.peek_non_space() == Some('[') {
                    self.skip_spaces();
                    self.pos += 1;
                    Some(self.sequence(Some(']')))
                } else {
                    None
                };
                let radicand = self.argument();
                let index = index
                    .map(|i| script(&i, Script::Super))
                    .unwrap_or_default();
                format!("{}√{}", index, wrap(&radicand))
            }
            "text" | "textrm" | "textbf" | "textit" | "mbox" => self.raw_argument(),
            "mathrm" | "mathbf" | "mathit" | "mathsf" | "mathtt" | "boldsymbol"
            | "operatorname" => self.argument(),
            "mathbb" => self.argument().chars().map(double_struck).collect(),
            "left" | "right" | "middle" | "big" | "Big" | "bigg" | "Bigg" | "bigl" | "bigr"
            | "Bigl" | "Bigr" => self.delimiter(),
            "overline" | "overrightarrow" | "vec" | "hat" | "bar" | "dot" | "ddot" | "tilde" => {
                let mark = match name.as_str() {
                    "overline" => '\u{0305}',
                    "overrightarrow" | "vec" => '\u{20D7}',
                    "hat" => '\u{0302}',
                    "bar" => '\u{0304}',
                    "dot" => '\u{0307}',
                    "ddot" => '\u{0308}',
                    _ => '\u{0303}',
                };
                let base = self.argument();
                base.chars().flat_map(|c| [c, mark]).collect()
            }
            "not" => {
                let next = self.argument();
                match next.as_str() {
                    "=" => "≠".to_string(),
                    "∈" => "∉".to_string(),
                    _ => format!("{}\u{0338}", next),
                }
            }
            "begin" | "end" => {
                let env = self.raw_argument();
                if name == "begin" && matches!(env.as_str(), "array" | "tabular") {
                    self.raw_argument();
                }
                String::new()
            }
            "\\" | "newline" | "cr" => "\n".to_string(),
            "," | ":" | ">" | ";" | " " | "quad" | "qquad" | "enspace" | "thinspace" => {
                " ".to_string()
            }
            "!" | "displaystyle" | "textstyle" | "scriptstyle" | "limits" | "nolimits" => {
                String::new()
            }
            "pmod" => format!(" (mod {})", self.argument()),
            "bmod" | "mod" => " mod ".to_string(),
            name if FUNCTIONS.contains(name) => {
                let needs_space = self
                    .peek_non_space()
                    .is_some_and(|c| c.is_alphanumeric() || c == '\\');
                if needs_space {
                    format!("{} ", name)
                } else {
                    name.to_string()
                }
            }
            name => SYMBOLS
                .get(name)
                .map(|s| s.to_string())
                .unwrap_or_else(|| format!("\\{}", name)),
        }
    }

    /// `\left` 等后面的定界符；`.` 表示空
    fn delimiter(&mut self) -> String {
        self.skip_spaces();
        match self.bump() {
            Some('.') | None => String::new(),
            Some('\\') => self.command(),
            Some(c) => c.to_string(),
        }
    }
}

/// 上下标：全部字符都有对应的 Unicode 形式时直接转换，否则用 `^(…)`
fn script(arg: &str, kind: Script) -> String {
    if arg.is_empty() {
        return String::new();
    }
    let (table, marker) = match kind {
        Script::Super => (&SUPERSCRIPTS, '^'),
        Script::Sub => (&SUBSCRIPTS, '_'),
    };

    let mapped: Option<String> = arg.chars().map(|c| table.get(&c).copied()).collect();
    match mapped {
        Some(s) => s,
        None if arg.chars().count() == 1 => format!("{}{}", marker, arg),
        None => format!("{}({})", marker, arg),
    }
}

/// 复合表达式加括号
fn wrap(expr: &str) -> String {
    if expr.chars().all(|c| c.is_alphanumeric() || c == '.') {
        expr.to_string()
    } else {
        format!("({})", expr)
    }
}

fn double_struck(c: char) -> char {
    match c {
        'R' => 'ℝ',
        'N' => 'ℕ',
        'Z' => 'ℤ',
        'Q' => 'ℚ',
        'C' => 'ℂ',
        'P' => 'ℙ',
        'H' => 'ℍ',
        other => other,
    }
}

/// 合并连续空格并去掉每行首尾空白
fn tidy(raw: &str) -> String {
    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_superscripts() {
        assert_eq!(typeset("x^2+x+1=0"), "x²+x+1=0");
        assert_eq!(typeset("x^{10}"), "x¹⁰");
        assert_eq!(typeset("a^n"), "aⁿ");
        assert_eq!(typeset("e^{i\\pi}"), "e^(iπ)");
        assert_eq!(typeset("90^\\circ"), "90°");
    }

    #[test]
    fn test_subscripts() {
        assert_eq!(typeset("x_{n+1} = 2x_n"), "xₙ₊₁=2xₙ");
        assert_eq!(typeset("\\log_2 8"), "log₂8");
    }

    #[test]
    fn test_fractions() {
        assert_eq!(typeset("\\frac{1}{2}"), "1/2");
        assert_eq!(typeset("\\frac{x+1}{2}"), "(x+1)/2");
        assert_eq!(typeset("\\dfrac{\\pi}{3}"), "π/3");
        assert_eq!(typeset("\\frac12"), "1/2");
    }

    #[test]
    fn test_radicals() {
        assert_eq!(typeset("\\sqrt{x^2+1}"), "√(x²+1)");
        assert_eq!(typeset("\\sqrt{2}"), "√2");
        assert_eq!(typeset("\\sqrt[3]{8}"), "³√8");
    }

    #[test]
    fn test_symbols_and_spacing() {
        assert_eq!(typeset("\\alpha + \\beta"), "α+β");
        assert_eq!(typeset("a \\neq b"), "a≠b");
        assert_eq!(typeset("x \\geqq 3"), "x≧3");
        assert_eq!(typeset("x=\\pm 3"), "x=±3");
        assert_eq!(typeset("\\{1,2\\}"), "{1,2}");
        assert_eq!(typeset("f'(x)"), "f′(x)");
    }

    #[test]
    fn test_functions() {
        assert_eq!(typeset("\\sin\\theta"), "sin θ");
        assert_eq!(typeset("\\sin x"), "sin x");
        assert_eq!(typeset("\\cos(x)"), "cos(x)");
    }

    #[test]
    fn test_text_and_fonts() {
        assert_eq!(typeset("\\text{cm}^2"), "cm²");
        assert_eq!(typeset("3\\text{ cm}"), "3 cm");
        assert_eq!(typeset("\\mathbb{R}"), "ℝ");
        assert_eq!(typeset("\\vec{a}"), "a\u{20D7}");
    }

    #[test]
    fn test_delimiters_and_environments() {
        assert_eq!(typeset("\\left(x+1\\right)^2"), "(x+1)²");
        assert_eq!(typeset("\\left. f \\right|"), "f|");
        assert_eq!(
            typeset("\\begin{cases} x+y=3 \\\\ x-y=1 \\end{cases}"),
            "x+y=3\nx-y=1"
        );
    }

    #[test]
    fn test_unknown_command_kept() {
        assert_eq!(typeset("\\foo"), "\\foo");
    }

    #[test]
    fn test_deterministic() {
        let source = "\\frac{-b \\pm \\sqrt{b^2-4ac}}{2a}";
        assert_eq!(typeset(source), typeset(source));
        assert_eq!(typeset(source), "(-b±√(b²-4ac))/2a");
    }
}
