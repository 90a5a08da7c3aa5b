use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 生成难度（五档固定标签）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Difficulty {
    /// 基礎
    Level1,
    /// 標準
    Level2,
    /// 応用
    #[default]
    Level3,
    /// 発展
    Level4,
    /// 最難関
    Level5,
}

impl Difficulty {
    /// 全部难度，按从易到难排列
    pub const ALL: [Difficulty; 5] = [
        Difficulty::Level1,
        Difficulty::Level2,
        Difficulty::Level3,
        Difficulty::Level4,
        Difficulty::Level5,
    ];

    /// 难度等级（1-5）
    pub fn level(self) -> u8 {
        match self {
            Difficulty::Level1 => 1,
            Difficulty::Level2 => 2,
            Difficulty::Level3 => 3,
            Difficulty::Level4 => 4,
            Difficulty::Level5 => 5,
        }
    }

    /// 发送给服务端的完整标签
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Level1 => "Level 1 (基礎)",
            Difficulty::Level2 => "Level 2 (標準)",
            Difficulty::Level3 => "Level 3 (応用)",
            Difficulty::Level4 => "Level 4 (発展)",
            Difficulty::Level5 => "Level 5 (最難関)",
        }
    }

    /// 从等级解析
    pub fn from_level(level: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.level() == level)
    }

    /// 宽松解析：完整标签、`3`、`L3`、`Level 3`、`応用`
    pub fn find(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some(d) = Self::ALL.into_iter().find(|d| d.label() == s) {
            return Some(d);
        }

        let lower = s.to_lowercase();
        let digits = lower
            .trim_start_matches("level")
            .trim_start_matches('l')
            .trim();
        if let Ok(level) = digits.parse::<u8>() {
            return Self::from_level(level);
        }

        Self::ALL
            .into_iter()
            .find(|d| d.label().contains(&format!("({})", s)))
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::find(s).ok_or_else(|| format!("未知の難易度: {}", s))
    }
}

impl Serialize for Difficulty {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::find(&raw).ok_or_else(|| serde::de::Error::custom(format!("未知の難易度: {}", raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_variants() {
        assert_eq!(Difficulty::find("Level 2 (標準)"), Some(Difficulty::Level2));
        assert_eq!(Difficulty::find("4"), Some(Difficulty::Level4));
        assert_eq!(Difficulty::find("L5"), Some(Difficulty::Level5));
        assert_eq!(Difficulty::find("level 1"), Some(Difficulty::Level1));
        assert_eq!(Difficulty::find("応用"), Some(Difficulty::Level3));
        assert_eq!(Difficulty::find("6"), None);
        assert_eq!(Difficulty::find("難しい"), None);
    }

    #[test]
    fn test_serializes_as_label() {
        let json = serde_json::to_string(&Difficulty::Level5).unwrap();
        assert_eq!(json, "\"Level 5 (最難関)\"");
        assert_eq!(Difficulty::default(), Difficulty::Level3);
    }
}
