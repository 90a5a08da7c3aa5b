//! 宽松的字段解析
//!
//! 服务端由 LLM 生成内容，文本字段常以数字或布尔值出现，
//! 成功标志也不一定是布尔值

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// 把标量转为显示用文本：null 为 `None`，数字和布尔值转字符串
///
/// 数组与对象按 JSON 文本显示
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// `deserialize_with` 用：任意 JSON 值 → `Option<String>`
pub fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(scalar_text))
}

/// 成功标志的真值判断
///
/// `false`、`null`、`0`、空字符串为假，其余为真
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// 取对象中的文本字段
pub(crate) fn text_field(map: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(scalar_text)
}
