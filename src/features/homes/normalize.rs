use super::models::{Home, User, DEFAULT_COLOR_CLASS, DEFAULT_ICON_CLASS};
use crate::features::finances::defaults::{default_expense_categories, default_style_for};
use crate::features::finances::models::{
    ExpectedBill, ExpenseCategory, FinanceSettings, Finances, Income, PaidBill, SavingsGoal,
};
use crate::features::lists::models::{Item, GENERAL_CATEGORY};
use crate::features::templates::models::Template;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 保存済みドキュメントをそのまま読み込んだ形（すべて省略可能）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHome {
    pub id: Option<String>,
    pub name: Option<String>,
    pub icon_class: Option<String>,
    pub color_class: Option<String>,
    pub users: Option<Vec<User>>,
    pub shopping_list: Option<Vec<Item>>,
    pub tasks_list: Option<Vec<Item>>,
    pub archived_items: Option<Vec<Item>>,
    pub templates: Option<Vec<Template>>,
    pub list_categories: Option<Vec<String>>,
    pub finances: Option<RawFinances>,
    pub created_at: Option<DateTime<Utc>>,
}

/// 家計データの生の形
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFinances {
    pub expected_bills: Option<Vec<ExpectedBill>>,
    pub paid_bills: Option<Vec<PaidBill>>,
    pub income: Option<Vec<Income>>,
    pub savings_goals: Option<Vec<SavingsGoal>>,
    pub expense_categories: Option<Vec<RawExpenseCategory>>,
    pub finance_settings: Option<RawFinanceSettings>,
}

/// 色やアイコンが欠けている可能性のある支出カテゴリ
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawExpenseCategory {
    pub name: String,
    pub budget_amount: Option<f64>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFinanceSettings {
    pub currency: Option<String>,
}

/// フィールドの値がどこから来たか
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// ドキュメントに存在した
    Present,
    /// 既定値で補われた
    Defaulted,
}

/// 正規化の結果報告
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizationReport {
    pub fields: Vec<(&'static str, Provenance)>,
}

impl NormalizationReport {
    fn record(&mut self, field: &'static str, provenance: Provenance) {
        self.fields.push((field, provenance));
    }

    fn track<T>(&mut self, field: &'static str, value: Option<T>, default: impl FnOnce() -> T) -> T {
        match value {
            Some(value) => {
                self.record(field, Provenance::Present);
                value
            }
            None => {
                self.record(field, Provenance::Defaulted);
                default()
            }
        }
    }

    /// 既定値で補われたフィールド名
    pub fn defaulted(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields
            .iter()
            .filter(|(_, provenance)| *provenance == Provenance::Defaulted)
            .map(|(field, _)| *field)
    }

    pub fn is_complete(&self) -> bool {
        self.defaulted().next().is_none()
    }
}

/// 保存済みドキュメントを完全な集約に正規化する
///
/// 欠けているフィールドは既定値で補う。結果を再度正規化しても変化しない。
pub fn normalize_home(raw: RawHome, default_currency: &str) -> (Home, NormalizationReport) {
    let mut report = NormalizationReport::default();

    let id = report.track("id", raw.id, String::new);
    let name = report.track("name", raw.name, String::new);
    let icon_class = report.track("iconClass", non_empty(raw.icon_class), || {
        DEFAULT_ICON_CLASS.to_string()
    });
    let color_class = report.track("colorClass", non_empty(raw.color_class), || {
        DEFAULT_COLOR_CLASS.to_string()
    });
    let users = report.track("users", raw.users, Vec::new);
    let users = normalize_users(users, &mut report);
    let shopping_list = report.track("shoppingList", raw.shopping_list, Vec::new);
    let tasks_list = report.track("tasksList", raw.tasks_list, Vec::new);
    let archived_items = report.track("archivedItems", raw.archived_items, Vec::new);
    let templates = report.track("templates", raw.templates, Vec::new);
    let list_categories = report.track("listCategories", raw.list_categories, Vec::new);
    let list_categories = normalize_list_categories(list_categories, &mut report);
    let finances = normalize_finances(raw.finances, default_currency, &mut report);

    let home = Home {
        id,
        name,
        icon_class,
        color_class,
        users,
        shopping_list,
        tasks_list,
        archived_items,
        templates,
        list_categories,
        finances,
        created_at: raw.created_at,
    };

    for field in report.defaulted() {
        log::debug!("ホーム {} のフィールド {} を既定値で補いました", home.id, field);
    }

    (home, report)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// 空の名前と重複を除き、管理者がいなければ先頭のユーザーを管理者にする
fn normalize_users(users: Vec<User>, report: &mut NormalizationReport) -> Vec<User> {
    let mut normalized: Vec<User> = Vec::with_capacity(users.len());
    for user in users {
        if user.name.trim().is_empty() || normalized.iter().any(|u| u.has_name(&user.name)) {
            report.record("users[].name", Provenance::Defaulted);
            continue;
        }
        normalized.push(user);
    }

    if !normalized.iter().any(|u| u.is_admin) {
        if let Some(first) = normalized.first_mut() {
            first.is_admin = true;
            report.record("users[].isAdmin", Provenance::Defaulted);
        }
    }

    normalized
}

fn normalize_list_categories(
    categories: Vec<String>,
    report: &mut NormalizationReport,
) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(categories.len() + 1);
    if !categories.iter().any(|c| c == GENERAL_CATEGORY) {
        normalized.push(GENERAL_CATEGORY.to_string());
        report.record("listCategories[general]", Provenance::Defaulted);
    }
    for category in categories {
        if !normalized.contains(&category) {
            normalized.push(category);
        }
    }
    normalized
}

fn normalize_finances(
    raw: Option<RawFinances>,
    default_currency: &str,
    report: &mut NormalizationReport,
) -> Finances {
    let raw = report.track("finances", raw, RawFinances::default);

    let expected_bills = report.track("finances.expectedBills", raw.expected_bills, Vec::new);
    let paid_bills = report.track("finances.paidBills", raw.paid_bills, Vec::new);
    let income = report.track("finances.income", raw.income, Vec::new);
    let savings_goals = report.track("finances.savingsGoals", raw.savings_goals, Vec::new);

    let expense_categories = match raw.expense_categories {
        Some(categories) if !categories.is_empty() => {
            report.record("finances.expenseCategories", Provenance::Present);
            categories
                .into_iter()
                .map(|category| backfill_category(category, report))
                .collect()
        }
        _ => {
            report.record("finances.expenseCategories", Provenance::Defaulted);
            default_expense_categories()
        }
    };

    let currency = report.track(
        "finances.financeSettings.currency",
        non_empty(raw.finance_settings.and_then(|settings| settings.currency)),
        || default_currency.to_string(),
    );

    Finances {
        expected_bills,
        paid_bills,
        income,
        savings_goals,
        expense_categories,
        finance_settings: FinanceSettings { currency },
    }
}

fn backfill_category(raw: RawExpenseCategory, report: &mut NormalizationReport) -> ExpenseCategory {
    let (default_color, default_icon) = default_style_for(&raw.name);
    let color = report.track("expenseCategories[].color", non_empty(raw.color), || {
        default_color.to_string()
    });
    let icon = report.track("expenseCategories[].icon", non_empty(raw.icon), || {
        default_icon.to_string()
    });
    let budget_amount = report.track(
        "expenseCategories[].budgetAmount",
        raw.budget_amount.filter(|amount| amount.is_finite() && *amount >= 0.0),
        || 0.0,
    );

    ExpenseCategory {
        name: raw.name,
        budget_amount,
        color,
        icon,
    }
}

/// 完全な集約を生の形に戻す（再正規化や保存前の検証に使う）
impl From<Home> for RawHome {
    fn from(home: Home) -> Self {
        let finances = home.finances;
        RawHome {
            id: Some(home.id),
            name: Some(home.name),
            icon_class: Some(home.icon_class),
            color_class: Some(home.color_class),
            users: Some(home.users),
            shopping_list: Some(home.shopping_list),
            tasks_list: Some(home.tasks_list),
            archived_items: Some(home.archived_items),
            templates: Some(home.templates),
            list_categories: Some(home.list_categories),
            finances: Some(RawFinances {
                expected_bills: Some(finances.expected_bills),
                paid_bills: Some(finances.paid_bills),
                income: Some(finances.income),
                savings_goals: Some(finances.savings_goals),
                expense_categories: Some(
                    finances
                        .expense_categories
                        .into_iter()
                        .map(|c| RawExpenseCategory {
                            name: c.name,
                            budget_amount: Some(c.budget_amount),
                            color: Some(c.color),
                            icon: Some(c.icon),
                        })
                        .collect(),
                ),
                finance_settings: Some(RawFinanceSettings {
                    currency: Some(finances.finance_settings.currency),
                }),
            }),
            created_at: home.created_at,
        }
    }
}
