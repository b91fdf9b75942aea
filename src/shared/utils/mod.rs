/// ID生成
pub mod ids;

use crate::shared::errors::{AppError, AppResult};
use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer};

pub use ids::{deserialize_flexible_id, generate_home_id, generate_item_id, is_valid_nanoid};

/// 日付文字列を解析する
///
/// `YYYY-MM-DD` に加えて、古いドキュメントに残っているRFC3339形式も受け付け、
/// その場合は日付部分のみを使う。
///
/// # 戻り値
/// 解析した日付、または失敗時はバリデーションエラー
pub fn parse_flexible_date(date_str: &str) -> AppResult<NaiveDate> {
    let trimmed = date_str.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return validate_year(date);
    }

    if let Ok(datetime) = DateTime::parse_from_rfc3339(trimmed) {
        return validate_year(datetime.date_naive());
    }

    Err(AppError::validation(format!(
        "日付はYYYY-MM-DD形式で入力してください: {trimmed}"
    )))
}

/// serde用: 柔軟な形式の日付を読み込む
pub fn deserialize_flexible_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_flexible_date(&raw).map_err(|e| serde::de::Error::custom(e.details()))
}

/// serde用: 日時を読み込む（日付のみの場合はその日のUTC 0時とみなす）
pub fn deserialize_flexible_datetime<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw.trim()) {
        return Ok(datetime.with_timezone(&Utc));
    }

    let date = parse_flexible_date(&raw).map_err(|e| serde::de::Error::custom(e.details()))?;
    Ok(date.and_time(NaiveTime::MIN).and_utc())
}

fn validate_year(date: NaiveDate) -> AppResult<NaiveDate> {
    if !(1900..=2100).contains(&date.year()) {
        return Err(AppError::validation(
            "日付は1900年から2100年の間で入力してください",
        ));
    }
    Ok(date)
}

/// 指定した月数だけ日付を進める
///
/// 月末は丸められる（1月31日 + 1か月 = 2月の末日）。
pub fn add_months(date: NaiveDate, months: u32) -> AppResult<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| AppError::validation("日付の計算が範囲外です"))
}

/// 金額のバリデーション
///
/// # バリデーション規則
/// - 有限の正の数値であること
/// - 10桁以内であること
pub fn validate_amount(amount: f64, field_name: &str) -> AppResult<()> {
    if !amount.is_finite() {
        return Err(AppError::validation(format!("{field_name}が無効な数値です")));
    }

    if amount <= 0.0 {
        return Err(AppError::validation(format!(
            "{field_name}は正の数値で入力してください"
        )));
    }

    if amount >= 10_000_000_000.0 {
        return Err(AppError::validation(format!(
            "{field_name}は10桁以内で入力してください"
        )));
    }

    Ok(())
}

/// 0以上の金額のバリデーション（予算額・貯蓄残高など）
pub fn validate_non_negative_amount(amount: f64, field_name: &str) -> AppResult<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(AppError::validation(format!(
            "{field_name}は0以上の数値で入力してください"
        )));
    }
    Ok(())
}

/// 文字列の長さバリデーション
pub fn validate_text_length(text: &str, max_length: usize, field_name: &str) -> AppResult<()> {
    let char_count = text.chars().count();
    if char_count > max_length {
        return Err(AppError::validation(format!(
            "{field_name}は{max_length}文字以内で入力してください（現在: {char_count}文字）"
        )));
    }
    Ok(())
}

/// 必須フィールドのバリデーション
pub fn validate_required_field(text: &str, field_name: &str) -> AppResult<()> {
    if text.trim().is_empty() {
        return Err(AppError::validation(format!("{field_name}は必須項目です")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flexible_date() {
        assert_eq!(
            parse_flexible_date("2024-01-15").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert_eq!(
            parse_flexible_date("2024-01-15T10:30:00.000Z").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert!(parse_flexible_date("15/01/2024").is_err());
        assert!(parse_flexible_date("1800-01-01").is_err());
    }

    #[test]
    fn test_deserialize_flexible_datetime() {
        #[derive(Deserialize)]
        struct Paid {
            #[serde(deserialize_with = "deserialize_flexible_datetime")]
            at: DateTime<Utc>,
        }

        let full: Paid = serde_json::from_str(r#"{"at":"2024-03-01T12:00:00+02:00"}"#).unwrap();
        assert_eq!(full.at.to_rfc3339(), "2024-03-01T10:00:00+00:00");

        let date_only: Paid = serde_json::from_str(r#"{"at":"2024-03-01"}"#).unwrap();
        assert_eq!(date_only.at.to_rfc3339(), "2024-03-01T00:00:00+00:00");
    }

    #[test]
    fn test_add_months_clamps_month_end() {
        let jan_31 = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(
            add_months(jan_31, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );

        let leap_day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(
            add_months(leap_day, 12).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(120.5, "金額").is_ok());
        assert!(validate_amount(0.0, "金額").is_err());
        assert!(validate_amount(-3.0, "金額").is_err());
        assert!(validate_amount(f64::NAN, "金額").is_err());
        assert!(validate_amount(10_000_000_000.0, "金額").is_err());
    }

    #[test]
    fn test_validate_non_negative_amount() {
        assert!(validate_non_negative_amount(0.0, "予算").is_ok());
        assert!(validate_non_negative_amount(-0.01, "予算").is_err());
    }

    #[test]
    fn test_validate_required_field() {
        assert!(validate_required_field("牛乳", "テキスト").is_ok());
        let err = validate_required_field("   ", "テキスト").unwrap_err();
        assert_eq!(err.user_message(), "テキストは必須項目です");
    }

    #[test]
    fn test_validate_text_length() {
        assert!(validate_text_length("あいう", 3, "名前").is_ok());
        assert!(validate_text_length("あいうえ", 3, "名前").is_err());
    }
}
