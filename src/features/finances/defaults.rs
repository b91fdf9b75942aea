use super::models::{ExpenseCategory, FinanceSettings, Finances};
use once_cell::sync::Lazy;
use regex::Regex;

/// 未知のカテゴリに使う色
pub const FALLBACK_COLOR: &str = "#9e9e9e";

/// 未知のカテゴリに使うアイコン
pub const FALLBACK_ICON: &str = "fa-tag";

/// 通貨が指定されない場合の既定値
pub const DEFAULT_CURRENCY: &str = "₪";

/// ホーム作成時に用意される支出カテゴリ（名前, 色, アイコン）
pub static DEFAULT_EXPENSE_CATEGORIES: Lazy<Vec<(&'static str, &'static str, &'static str)>> =
    Lazy::new(|| {
        vec![
            ("housing", "#4e79a7", "fa-house"),
            ("utilities", "#f28e2b", "fa-bolt"),
            ("food", "#e15759", "fa-utensils"),
            ("transportation", "#76b7b2", "fa-car"),
            ("health", "#59a14f", "fa-heart-pulse"),
            ("entertainment", "#edc948", "fa-film"),
            ("education", "#b07aa1", "fa-graduation-cap"),
            ("insurance", "#ff9da7", "fa-shield"),
            ("other", "#9c755f", "fa-ellipsis"),
        ]
    });

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").unwrap_or_else(|_| unreachable!())
});

/// 既定カテゴリ一式を作成する
pub fn default_expense_categories() -> Vec<ExpenseCategory> {
    DEFAULT_EXPENSE_CATEGORIES
        .iter()
        .map(|(name, color, icon)| ExpenseCategory {
            name: name.to_string(),
            budget_amount: 0.0,
            color: color.to_string(),
            icon: icon.to_string(),
        })
        .collect()
}

/// カテゴリ名に対応する既定の色とアイコン（未知の名前は灰色のタグ）
pub fn default_style_for(name: &str) -> (&'static str, &'static str) {
    DEFAULT_EXPENSE_CATEGORIES
        .iter()
        .find(|(default_name, _, _)| default_name.eq_ignore_ascii_case(name.trim()))
        .map(|(_, color, icon)| (*color, *icon))
        .unwrap_or((FALLBACK_COLOR, FALLBACK_ICON))
}

/// 空の家計データ（既定カテゴリ入り）
pub fn empty_finances(currency: &str) -> Finances {
    Finances {
        expected_bills: Vec::new(),
        paid_bills: Vec::new(),
        income: Vec::new(),
        savings_goals: Vec::new(),
        expense_categories: default_expense_categories(),
        finance_settings: FinanceSettings {
            currency: currency.to_string(),
        },
    }
}

/// `#rgb` または `#rrggbb` 形式かどうか
pub fn is_hex_color(value: &str) -> bool {
    HEX_COLOR.is_match(value)
}
