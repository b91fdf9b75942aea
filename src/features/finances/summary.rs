//! 月次の家計集計

use crate::features::homes::models::Home;
use crate::features::lists::models::SHARED_ASSIGNEE;
use crate::shared::errors::{AppError, AppResult};
use chrono::{Datelike, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// メンバーごとの月次集計
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSummary {
    pub name: String,
    pub income: f64,
    pub expenses: f64,
    pub net: f64,
}

/// カテゴリごとの予算消化状況
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetStatus {
    pub category: String,
    pub budget: f64,
    pub spent: f64,
    pub remaining: f64,
    pub over_budget: bool,
}

/// 月次集計
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub year: i32,
    pub month: u32,
    pub currency: String,
    pub members: Vec<MemberSummary>,
    pub total_income: f64,
    pub total_expenses: f64,
    pub net: f64,
    pub budgets: Vec<BudgetStatus>,
}

/// 指定した月の集計を作成する
///
/// 収入は`date`、支出は支払い済み請求書の`datePaid`（指定タイムゾーンでの日付）で月を判定する。
/// メンバーはユーザーの順に並び、その後に`shared`、それ以外の担当者名が続く。
pub fn monthly_summary(home: &Home, year: i32, month: u32, timezone: Tz) -> AppResult<MonthlySummary> {
    if !(1..=12).contains(&month) {
        return Err(AppError::validation(format!("月は1から12で指定してください: {month}")));
    }
    if !(1900..=2100).contains(&year) {
        return Err(AppError::validation(format!(
            "年は1900から2100で指定してください: {year}"
        )));
    }

    let in_month = |date: NaiveDate| date.year() == year && date.month() == month;
    let finances = &home.finances;

    let mut members: Vec<MemberSummary> = home
        .users
        .iter()
        .map(|user| user.name.clone())
        .chain(std::iter::once(SHARED_ASSIGNEE.to_string()))
        .map(|name| MemberSummary {
            name,
            income: 0.0,
            expenses: 0.0,
            net: 0.0,
        })
        .collect();

    for income in finances.income.iter().filter(|i| in_month(i.date)) {
        member_entry(&mut members, &income.assigned_to).income += income.amount;
    }

    let paid_in_month: Vec<_> = finances
        .paid_bills
        .iter()
        .filter(|bill| in_month(bill.date_paid.with_timezone(&timezone).date_naive()))
        .collect();

    for bill in &paid_in_month {
        member_entry(&mut members, &bill.assigned_to).expenses += bill.amount;
    }

    for member in &mut members {
        member.net = member.income - member.expenses;
    }

    let budgets = finances
        .expense_categories
        .iter()
        .map(|category| {
            let spent: f64 = paid_in_month
                .iter()
                .filter(|bill| bill.category.eq_ignore_ascii_case(&category.name))
                .map(|bill| bill.amount)
                .sum();
            BudgetStatus {
                category: category.name.clone(),
                budget: category.budget_amount,
                spent,
                remaining: category.budget_amount - spent,
                over_budget: category.budget_amount > 0.0 && spent > category.budget_amount,
            }
        })
        .collect();

    let total_income: f64 = members.iter().map(|m| m.income).sum();
    let total_expenses: f64 = members.iter().map(|m| m.expenses).sum();

    Ok(MonthlySummary {
        year,
        month,
        currency: finances.finance_settings.currency.clone(),
        members,
        total_income,
        total_expenses,
        net: total_income - total_expenses,
        budgets,
    })
}

fn member_entry<'a>(members: &'a mut Vec<MemberSummary>, name: &str) -> &'a mut MemberSummary {
    let index = match members.iter().position(|m| m.name.eq_ignore_ascii_case(name)) {
        Some(index) => index,
        None => {
            members.push(MemberSummary {
                name: name.to_string(),
                income: 0.0,
                expenses: 0.0,
                net: 0.0,
            });
            members.len() - 1
        }
    };
    &mut members[index]
}
