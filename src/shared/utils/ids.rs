use nanoid::nanoid;
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

/// ホームID用のnanoIdを生成する
///
/// # 特性
/// - 文字セット: A-Za-z0-9_- (64文字)
/// - 長さ: 21文字
pub fn generate_home_id() -> String {
    nanoid!()
}

/// アイテム・請求書・収入などの要素IDを生成する
///
/// ホーム内で再利用されないよう、UUID v4 を使う。
pub fn generate_item_id() -> String {
    Uuid::new_v4().to_string()
}

/// nanoIdが有効な形式かどうかを検証する
///
/// # 検証条件
/// - 長さが21文字
/// - URL-safe文字（A-Za-z0-9_-）のみを含む
pub fn is_valid_nanoid(id: &str) -> bool {
    id.len() == 21
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// 文字列または数値のIDを文字列として読み込む
///
/// 古いドキュメントではタイムスタンプ由来の数値IDが使われている。
pub fn deserialize_flexible_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Text(text) => Ok(text),
        RawId::Integer(number) => Ok(number.to_string()),
        RawId::Float(number) if number.fract() == 0.0 => Ok(format!("{number:.0}")),
        RawId::Float(number) => Ok(number.to_string()),
    }
}
