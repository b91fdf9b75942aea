use crate::features::lists::models::SHARED_ASSIGNEE;
use crate::shared::utils::{
    deserialize_flexible_date, deserialize_flexible_datetime, deserialize_flexible_id,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// 繰り返しの頻度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Monthly,
    Yearly,
}

impl Frequency {
    /// 次回までの月数
    pub fn months(&self) -> u32 {
        match self {
            Frequency::Monthly => 1,
            Frequency::Yearly => 12,
        }
    }
}

/// 繰り返し設定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recurrence {
    pub frequency: Frequency,
}

/// 支払い予定の請求書
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedBill {
    #[serde(deserialize_with = "deserialize_flexible_id")]
    pub id: String,
    pub text: String,
    pub amount: f64,
    #[serde(deserialize_with = "deserialize_flexible_date")]
    pub due_date: NaiveDate,
    #[serde(default = "default_bill_category")]
    pub category: String,
    #[serde(default)]
    pub is_urgent: bool,
    #[serde(default = "default_assignee")]
    pub assigned_to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring: Option<Recurrence>,
}

/// 支払い済みの請求書
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaidBill {
    #[serde(deserialize_with = "deserialize_flexible_id")]
    pub id: String,
    pub text: String,
    pub amount: f64,
    #[serde(deserialize_with = "deserialize_flexible_datetime")]
    pub date_paid: DateTime<Utc>,
    #[serde(default = "default_bill_category")]
    pub category: String,
    #[serde(default = "default_assignee")]
    pub assigned_to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// 収入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Income {
    #[serde(deserialize_with = "deserialize_flexible_id")]
    pub id: String,
    pub text: String,
    pub amount: f64,
    #[serde(deserialize_with = "deserialize_flexible_date")]
    pub date: NaiveDate,
    #[serde(default = "default_assignee")]
    pub assigned_to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring: Option<Recurrence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// 貯蓄目標
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsGoal {
    #[serde(deserialize_with = "deserialize_flexible_id")]
    pub id: String,
    pub name: String,
    pub target_amount: f64,
    #[serde(default)]
    pub current_amount: f64,
}

/// 支出カテゴリ（予算）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseCategory {
    pub name: String,
    pub budget_amount: f64,
    pub color: String,
    pub icon: String,
}

/// 家計設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinanceSettings {
    pub currency: String,
}

/// ホームに埋め込まれる家計データ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finances {
    pub expected_bills: Vec<ExpectedBill>,
    pub paid_bills: Vec<PaidBill>,
    pub income: Vec<Income>,
    pub savings_goals: Vec<SavingsGoal>,
    pub expense_categories: Vec<ExpenseCategory>,
    pub finance_settings: FinanceSettings,
}

pub(crate) fn default_bill_category() -> String {
    "other".to_string()
}

fn default_assignee() -> String {
    SHARED_ASSIGNEE.to_string()
}

/// 請求書作成用DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBillDto {
    pub text: String,
    pub amount: f64,
    pub due_date: String,
    pub category: Option<String>,
    pub is_urgent: Option<bool>,
    pub assigned_to: Option<String>,
    pub comment: Option<String>,
    pub recurring: Option<Recurrence>,
}

/// 請求書更新用DTO
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBillDto {
    pub text: Option<String>,
    pub amount: Option<f64>,
    pub due_date: Option<String>,
    pub category: Option<String>,
    pub is_urgent: Option<bool>,
    pub assigned_to: Option<String>,
    pub comment: Option<String>,
    /// 繰り返し設定を外す場合は `clearRecurring: true`
    pub recurring: Option<Recurrence>,
    #[serde(default)]
    pub clear_recurring: bool,
}

/// 収入作成用DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIncomeDto {
    pub text: String,
    pub amount: f64,
    pub date: String,
    pub assigned_to: Option<String>,
    pub recurring: Option<Recurrence>,
    pub comment: Option<String>,
}

/// 収入更新用DTO
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIncomeDto {
    pub text: Option<String>,
    pub amount: Option<f64>,
    pub date: Option<String>,
    pub assigned_to: Option<String>,
    pub recurring: Option<Recurrence>,
    #[serde(default)]
    pub clear_recurring: bool,
    pub comment: Option<String>,
}

/// 貯蓄目標作成用DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSavingsGoalDto {
    pub name: String,
    pub target_amount: f64,
    pub current_amount: Option<f64>,
}

/// 貯蓄目標更新用DTO
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSavingsGoalDto {
    pub name: Option<String>,
    pub target_amount: Option<f64>,
    pub current_amount: Option<f64>,
}

/// 貯蓄目標への入金（負の値は引き出し）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositDto {
    pub amount: f64,
}

/// 支出カテゴリ作成用DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseCategoryDto {
    pub name: String,
    pub budget_amount: Option<f64>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// 支出カテゴリ更新用DTO
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExpenseCategoryDto {
    pub budget_amount: Option<f64>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// 家計設定更新用DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateFinanceSettingsDto {
    pub currency: String,
}
