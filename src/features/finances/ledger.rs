//! 家計データに対する純粋な変更操作

use super::defaults::{default_style_for, is_hex_color};
use super::models::{
    default_bill_category, CreateBillDto, CreateExpenseCategoryDto, CreateIncomeDto,
    CreateSavingsGoalDto, ExpectedBill, ExpenseCategory, Finances, Income, PaidBill,
    SavingsGoal, UpdateBillDto, UpdateExpenseCategoryDto, UpdateIncomeDto, UpdateSavingsGoalDto,
};
use crate::features::lists::models::SHARED_ASSIGNEE;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::{
    add_months, generate_item_id, parse_flexible_date, validate_amount,
    validate_non_negative_amount, validate_required_field,
};
use chrono::{DateTime, Utc};

fn non_empty_or(value: Option<String>, default: impl FnOnce() -> String) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(default)
}

fn clean_comment(comment: Option<String>) -> Option<String> {
    comment.filter(|c| !c.trim().is_empty())
}

fn find_index<T>(items: &[T], id: &str, key: impl Fn(&T) -> &str, resource: &str) -> AppResult<usize> {
    items
        .iter()
        .position(|item| key(item) == id)
        .ok_or_else(|| AppError::not_found(resource))
}

// ---- 請求書 ----

/// 支払い予定の請求書を追加する
///
/// # 戻り値
/// 追加した請求書のID
pub fn add_bill(finances: &mut Finances, dto: CreateBillDto) -> AppResult<String> {
    validate_required_field(&dto.text, "請求書名")?;
    validate_amount(dto.amount, "金額")?;
    let due_date = parse_flexible_date(&dto.due_date)?;

    let bill = ExpectedBill {
        id: generate_item_id(),
        text: dto.text.trim().to_string(),
        amount: dto.amount,
        due_date,
        category: non_empty_or(dto.category, default_bill_category),
        is_urgent: dto.is_urgent.unwrap_or(false),
        assigned_to: non_empty_or(dto.assigned_to, || SHARED_ASSIGNEE.to_string()),
        comment: clean_comment(dto.comment),
        recurring: dto.recurring,
    };
    let id = bill.id.clone();
    finances.expected_bills.push(bill);
    Ok(id)
}

/// 支払い予定の請求書を更新する
pub fn update_bill(finances: &mut Finances, id: &str, dto: UpdateBillDto) -> AppResult<()> {
    let index = find_index(&finances.expected_bills, id, |b| b.id.as_str(), "請求書")?;

    if let Some(ref text) = dto.text {
        validate_required_field(text, "請求書名")?;
    }
    if let Some(amount) = dto.amount {
        validate_amount(amount, "金額")?;
    }
    let due_date = dto.due_date.as_deref().map(parse_flexible_date).transpose()?;

    let bill = &mut finances.expected_bills[index];
    if let Some(text) = dto.text {
        bill.text = text.trim().to_string();
    }
    if let Some(amount) = dto.amount {
        bill.amount = amount;
    }
    if let Some(due_date) = due_date {
        bill.due_date = due_date;
    }
    if let Some(category) = dto.category.filter(|c| !c.trim().is_empty()) {
        bill.category = category;
    }
    if let Some(is_urgent) = dto.is_urgent {
        bill.is_urgent = is_urgent;
    }
    if let Some(assigned_to) = dto.assigned_to.filter(|a| !a.trim().is_empty()) {
        bill.assigned_to = assigned_to;
    }
    if let Some(comment) = dto.comment {
        bill.comment = clean_comment(Some(comment));
    }
    if dto.clear_recurring {
        bill.recurring = None;
    } else if let Some(recurring) = dto.recurring {
        bill.recurring = Some(recurring);
    }
    Ok(())
}

/// 支払い予定の請求書を削除する
pub fn delete_bill(finances: &mut Finances, id: &str) -> AppResult<ExpectedBill> {
    let index = find_index(&finances.expected_bills, id, |b| b.id.as_str(), "請求書")?;
    Ok(finances.expected_bills.remove(index))
}

/// 請求書を支払い済みにする
///
/// 繰り返し設定がある場合は、次回分を新しいIDで支払い予定に追加する
/// （期日は1か月後または1年後、月末は丸める）。
/// 見つからない場合は何も変更しない。
///
/// # 戻り値
/// 次回分を作成した場合はそのID
pub fn pay_bill(
    finances: &mut Finances,
    id: &str,
    paid_at: DateTime<Utc>,
) -> AppResult<Option<String>> {
    let index = find_index(&finances.expected_bills, id, |b| b.id.as_str(), "請求書")?;

    let next = match finances.expected_bills[index].recurring {
        Some(recurring) => {
            let bill = &finances.expected_bills[index];
            let due_date = add_months(bill.due_date, recurring.frequency.months())?;
            Some(ExpectedBill {
                id: generate_item_id(),
                due_date,
                is_urgent: false,
                ..bill.clone()
            })
        }
        None => None,
    };

    let bill = finances.expected_bills.remove(index);
    finances.paid_bills.push(PaidBill {
        id: bill.id,
        text: bill.text,
        amount: bill.amount,
        date_paid: paid_at,
        category: bill.category,
        assigned_to: bill.assigned_to,
        comment: bill.comment,
    });

    Ok(next.map(|next| {
        let next_id = next.id.clone();
        finances.expected_bills.push(next);
        next_id
    }))
}

/// 支払い済みの請求書を削除する
pub fn delete_paid_bill(finances: &mut Finances, id: &str) -> AppResult<PaidBill> {
    let index = find_index(&finances.paid_bills, id, |b| b.id.as_str(), "支払い済みの請求書")?;
    Ok(finances.paid_bills.remove(index))
}

// ---- 収入 ----

/// 収入を追加する
pub fn add_income(finances: &mut Finances, dto: CreateIncomeDto) -> AppResult<String> {
    validate_required_field(&dto.text, "収入名")?;
    validate_amount(dto.amount, "金額")?;
    let date = parse_flexible_date(&dto.date)?;

    let income = Income {
        id: generate_item_id(),
        text: dto.text.trim().to_string(),
        amount: dto.amount,
        date,
        assigned_to: non_empty_or(dto.assigned_to, || SHARED_ASSIGNEE.to_string()),
        recurring: dto.recurring,
        comment: clean_comment(dto.comment),
    };
    let id = income.id.clone();
    finances.income.push(income);
    Ok(id)
}

/// 収入を更新する
pub fn update_income(finances: &mut Finances, id: &str, dto: UpdateIncomeDto) -> AppResult<()> {
    let index = find_index(&finances.income, id, |i| i.id.as_str(), "収入")?;

    if let Some(ref text) = dto.text {
        validate_required_field(text, "収入名")?;
    }
    if let Some(amount) = dto.amount {
        validate_amount(amount, "金額")?;
    }
    let date = dto.date.as_deref().map(parse_flexible_date).transpose()?;

    let income = &mut finances.income[index];
    if let Some(text) = dto.text {
        income.text = text.trim().to_string();
    }
    if let Some(amount) = dto.amount {
        income.amount = amount;
    }
    if let Some(date) = date {
        income.date = date;
    }
    if let Some(assigned_to) = dto.assigned_to.filter(|a| !a.trim().is_empty()) {
        income.assigned_to = assigned_to;
    }
    if let Some(comment) = dto.comment {
        income.comment = clean_comment(Some(comment));
    }
    if dto.clear_recurring {
        income.recurring = None;
    } else if let Some(recurring) = dto.recurring {
        income.recurring = Some(recurring);
    }
    Ok(())
}

/// 収入を削除する
pub fn delete_income(finances: &mut Finances, id: &str) -> AppResult<Income> {
    let index = find_index(&finances.income, id, |i| i.id.as_str(), "収入")?;
    Ok(finances.income.remove(index))
}

// ---- 貯蓄目標 ----

/// 貯蓄目標を追加する
pub fn add_savings_goal(finances: &mut Finances, dto: CreateSavingsGoalDto) -> AppResult<String> {
    validate_required_field(&dto.name, "目標名")?;
    validate_amount(dto.target_amount, "目標金額")?;
    let current_amount = dto.current_amount.unwrap_or(0.0);
    validate_non_negative_amount(current_amount, "現在の貯蓄額")?;

    let goal = SavingsGoal {
        id: generate_item_id(),
        name: dto.name.trim().to_string(),
        target_amount: dto.target_amount,
        current_amount,
    };
    let id = goal.id.clone();
    finances.savings_goals.push(goal);
    Ok(id)
}

/// 貯蓄目標を更新する
pub fn update_savings_goal(
    finances: &mut Finances,
    id: &str,
    dto: UpdateSavingsGoalDto,
) -> AppResult<()> {
    let index = find_index(&finances.savings_goals, id, |g| g.id.as_str(), "貯蓄目標")?;

    if let Some(ref name) = dto.name {
        validate_required_field(name, "目標名")?;
    }
    if let Some(target_amount) = dto.target_amount {
        validate_amount(target_amount, "目標金額")?;
    }
    if let Some(current_amount) = dto.current_amount {
        validate_non_negative_amount(current_amount, "現在の貯蓄額")?;
    }

    let goal = &mut finances.savings_goals[index];
    if let Some(name) = dto.name {
        goal.name = name.trim().to_string();
    }
    if let Some(target_amount) = dto.target_amount {
        goal.target_amount = target_amount;
    }
    if let Some(current_amount) = dto.current_amount {
        goal.current_amount = current_amount;
    }
    Ok(())
}

/// 貯蓄目標を削除する
pub fn delete_savings_goal(finances: &mut Finances, id: &str) -> AppResult<SavingsGoal> {
    let index = find_index(&finances.savings_goals, id, |g| g.id.as_str(), "貯蓄目標")?;
    Ok(finances.savings_goals.remove(index))
}

/// 貯蓄目標に入金する（負の値は引き出し）
///
/// # 戻り値
/// 入金後の貯蓄額
pub fn deposit(finances: &mut Finances, id: &str, amount: f64) -> AppResult<f64> {
    let index = find_index(&finances.savings_goals, id, |g| g.id.as_str(), "貯蓄目標")?;

    if !amount.is_finite() || amount == 0.0 {
        return Err(AppError::validation("入金額は0以外の数値で入力してください"));
    }

    let goal = &mut finances.savings_goals[index];
    let balance = goal.current_amount + amount;
    if balance < 0.0 {
        return Err(AppError::validation("引き出し額が貯蓄額を超えています"));
    }
    goal.current_amount = balance;
    Ok(balance)
}

// ---- 支出カテゴリ ----

fn category_index(finances: &Finances, name: &str) -> Option<usize> {
    finances
        .expense_categories
        .iter()
        .position(|c| c.name.eq_ignore_ascii_case(name.trim()))
}

fn validate_color(color: &str) -> AppResult<()> {
    if !is_hex_color(color) {
        return Err(AppError::validation(format!(
            "色は#rrggbb形式で入力してください: {color}"
        )));
    }
    Ok(())
}

/// 支出カテゴリを追加する（名前は大文字小文字を区別せず一意）
pub fn add_expense_category(
    finances: &mut Finances,
    dto: CreateExpenseCategoryDto,
) -> AppResult<()> {
    validate_required_field(&dto.name, "カテゴリ名")?;
    if category_index(finances, &dto.name).is_some() {
        return Err(AppError::conflict(format!(
            "カテゴリ「{}」は既に存在します",
            dto.name.trim()
        )));
    }

    let budget_amount = dto.budget_amount.unwrap_or(0.0);
    validate_non_negative_amount(budget_amount, "予算額")?;

    let (default_color, default_icon) = default_style_for(&dto.name);
    let color = non_empty_or(dto.color, || default_color.to_string());
    validate_color(&color)?;

    finances.expense_categories.push(ExpenseCategory {
        name: dto.name.trim().to_string(),
        budget_amount,
        color,
        icon: non_empty_or(dto.icon, || default_icon.to_string()),
    });
    Ok(())
}

/// 支出カテゴリの予算・色・アイコンを更新する
pub fn update_expense_category(
    finances: &mut Finances,
    name: &str,
    dto: UpdateExpenseCategoryDto,
) -> AppResult<()> {
    let index = category_index(finances, name).ok_or_else(|| AppError::not_found("カテゴリ"))?;

    if let Some(budget_amount) = dto.budget_amount {
        validate_non_negative_amount(budget_amount, "予算額")?;
    }
    if let Some(ref color) = dto.color {
        validate_color(color)?;
    }

    let category = &mut finances.expense_categories[index];
    if let Some(budget_amount) = dto.budget_amount {
        category.budget_amount = budget_amount;
    }
    if let Some(color) = dto.color {
        category.color = color;
    }
    if let Some(icon) = dto.icon.filter(|i| !i.trim().is_empty()) {
        category.icon = icon;
    }
    Ok(())
}

/// 支出カテゴリを削除する
pub fn delete_expense_category(finances: &mut Finances, name: &str) -> AppResult<ExpenseCategory> {
    let index = category_index(finances, name).ok_or_else(|| AppError::not_found("カテゴリ"))?;
    Ok(finances.expense_categories.remove(index))
}

/// 通貨記号を設定する
pub fn set_currency(finances: &mut Finances, currency: &str) -> AppResult<()> {
    validate_required_field(currency, "通貨")?;
    finances.finance_settings.currency = currency.trim().to_string();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::finances::defaults::empty_finances;
    use crate::features::finances::models::{Frequency, Recurrence};
    use chrono::NaiveDate;

    fn paid_at() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-14T09:30:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn bill_dto(due_date: &str, recurring: Option<Frequency>) -> CreateBillDto {
        CreateBillDto {
            text: "Rent".to_string(),
            amount: 4500.0,
            due_date: due_date.to_string(),
            category: Some("housing".to_string()),
            is_urgent: Some(true),
            assigned_to: None,
            comment: None,
            recurring: recurring.map(|frequency| Recurrence { frequency }),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_pay_non_recurring_bill() {
        let mut finances = empty_finances("₪");
        let id = add_bill(&mut finances, bill_dto("2024-01-15", None)).unwrap();

        let next = pay_bill(&mut finances, &id, paid_at()).unwrap();

        assert!(next.is_none());
        assert!(finances.expected_bills.is_empty());
        assert_eq!(finances.paid_bills.len(), 1);
        assert_eq!(finances.paid_bills[0].id, id);
        assert_eq!(finances.paid_bills[0].date_paid, paid_at());
    }

    #[test]
    fn test_pay_monthly_bill_schedules_next() {
        let mut finances = empty_finances("₪");
        let id = add_bill(&mut finances, bill_dto("2024-01-15", Some(Frequency::Monthly))).unwrap();

        let next_id = pay_bill(&mut finances, &id, paid_at()).unwrap().unwrap();

        assert_ne!(next_id, id);
        assert_eq!(finances.paid_bills.len(), 1);
        assert_eq!(finances.expected_bills.len(), 1);
        let next = &finances.expected_bills[0];
        assert_eq!(next.id, next_id);
        assert_eq!(next.due_date, date(2024, 2, 15));
        assert!(!next.is_urgent);
        assert_eq!(next.text, "Rent");
        assert!(next.recurring.is_some());
    }

    #[test]
    fn test_pay_yearly_bill() {
        let mut finances = empty_finances("₪");
        let id = add_bill(&mut finances, bill_dto("2024-03-01", Some(Frequency::Yearly))).unwrap();

        pay_bill(&mut finances, &id, paid_at()).unwrap();

        assert_eq!(finances.expected_bills[0].due_date, date(2025, 3, 1));
    }

    #[test]
    fn test_pay_month_end_bill_is_clamped() {
        let mut finances = empty_finances("₪");
        let id = add_bill(&mut finances, bill_dto("2024-01-31", Some(Frequency::Monthly))).unwrap();

        pay_bill(&mut finances, &id, paid_at()).unwrap();

        assert_eq!(finances.expected_bills[0].due_date, date(2024, 2, 29));
    }

    #[test]
    fn test_pay_missing_bill_changes_nothing() {
        let mut finances = empty_finances("₪");
        add_bill(&mut finances, bill_dto("2024-01-15", None)).unwrap();
        let before = finances.clone();

        let result = pay_bill(&mut finances, "missing", paid_at());

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(finances, before);
    }

    #[test]
    fn test_add_bill_validation() {
        let mut finances = empty_finances("₪");
        let mut dto = bill_dto("2024-01-15", None);
        dto.amount = 0.0;
        assert!(add_bill(&mut finances, dto).is_err());

        let dto = bill_dto("15/01/2024", None);
        assert!(add_bill(&mut finances, dto).is_err());
        assert!(finances.expected_bills.is_empty());
    }

    #[test]
    fn test_update_bill_patch() {
        let mut finances = empty_finances("₪");
        let id = add_bill(&mut finances, bill_dto("2024-01-15", Some(Frequency::Monthly))).unwrap();

        update_bill(
            &mut finances,
            &id,
            UpdateBillDto {
                amount: Some(4700.0),
                due_date: Some("2024-01-20".to_string()),
                clear_recurring: true,
                ..UpdateBillDto::default()
            },
        )
        .unwrap();

        let bill = &finances.expected_bills[0];
        assert_eq!(bill.amount, 4700.0);
        assert_eq!(bill.due_date, date(2024, 1, 20));
        assert!(bill.recurring.is_none());
        assert_eq!(bill.text, "Rent");
    }

    #[test]
    fn test_delete_bills() {
        let mut finances = empty_finances("₪");
        let a = add_bill(&mut finances, bill_dto("2024-01-15", None)).unwrap();
        let b = add_bill(&mut finances, bill_dto("2024-01-16", None)).unwrap();
        pay_bill(&mut finances, &b, paid_at()).unwrap();

        delete_bill(&mut finances, &a).unwrap();
        delete_paid_bill(&mut finances, &b).unwrap();

        assert!(finances.expected_bills.is_empty());
        assert!(finances.paid_bills.is_empty());
        assert!(delete_paid_bill(&mut finances, &b).is_err());
    }

    #[test]
    fn test_income_crud() {
        let mut finances = empty_finances("₪");
        let id = add_income(
            &mut finances,
            CreateIncomeDto {
                text: "Salary".to_string(),
                amount: 12000.0,
                date: "2024-01-10".to_string(),
                assigned_to: Some("Dana".to_string()),
                recurring: None,
                comment: Some("".to_string()),
            },
        )
        .unwrap();
        assert!(finances.income[0].comment.is_none());

        update_income(
            &mut finances,
            &id,
            UpdateIncomeDto {
                amount: Some(12500.0),
                ..UpdateIncomeDto::default()
            },
        )
        .unwrap();
        assert_eq!(finances.income[0].amount, 12500.0);
        assert_eq!(finances.income[0].assigned_to, "Dana");

        delete_income(&mut finances, &id).unwrap();
        assert!(finances.income.is_empty());
    }

    #[test]
    fn test_savings_deposit_and_withdrawal() {
        let mut finances = empty_finances("₪");
        let id = add_savings_goal(
            &mut finances,
            CreateSavingsGoalDto {
                name: "Vacation".to_string(),
                target_amount: 5000.0,
                current_amount: None,
            },
        )
        .unwrap();

        assert_eq!(deposit(&mut finances, &id, 800.0).unwrap(), 800.0);
        assert_eq!(deposit(&mut finances, &id, -300.0).unwrap(), 500.0);
        assert!(matches!(
            deposit(&mut finances, &id, -600.0),
            Err(AppError::Validation(_))
        ));
        assert_eq!(finances.savings_goals[0].current_amount, 500.0);
        assert!(deposit(&mut finances, "missing", 1.0).is_err());
    }

    #[test]
    fn test_savings_goal_update_and_delete() {
        let mut finances = empty_finances("₪");
        let id = add_savings_goal(
            &mut finances,
            CreateSavingsGoalDto {
                name: "Car".to_string(),
                target_amount: 30000.0,
                current_amount: Some(1000.0),
            },
        )
        .unwrap();

        let invalid = UpdateSavingsGoalDto {
            target_amount: Some(-1.0),
            ..UpdateSavingsGoalDto::default()
        };
        assert!(update_savings_goal(&mut finances, &id, invalid).is_err());

        let rename = UpdateSavingsGoalDto {
            name: Some("New car".to_string()),
            ..UpdateSavingsGoalDto::default()
        };
        update_savings_goal(&mut finances, &id, rename).unwrap();
        assert_eq!(finances.savings_goals[0].name, "New car");

        delete_savings_goal(&mut finances, &id).unwrap();
        assert!(finances.savings_goals.is_empty());
    }

    #[test]
    fn test_expense_categories() {
        let mut finances = empty_finances("₪");

        let duplicate = CreateExpenseCategoryDto {
            name: "Food".to_string(),
            budget_amount: None,
            color: None,
            icon: None,
        };
        assert!(matches!(
            add_expense_category(&mut finances, duplicate),
            Err(AppError::Conflict(_))
        ));

        let pets = CreateExpenseCategoryDto {
            name: "pets".to_string(),
            budget_amount: Some(300.0),
            color: None,
            icon: None,
        };
        add_expense_category(&mut finances, pets).unwrap();
        let added = finances.expense_categories.last().unwrap();
        assert_eq!(added.icon, "fa-tag");

        let bad_color = UpdateExpenseCategoryDto {
            color: Some("blue".to_string()),
            ..UpdateExpenseCategoryDto::default()
        };
        assert!(update_expense_category(&mut finances, "pets", bad_color).is_err());

        let budget = UpdateExpenseCategoryDto {
            budget_amount: Some(450.0),
            ..UpdateExpenseCategoryDto::default()
        };
        update_expense_category(&mut finances, "PETS", budget).unwrap();
        assert_eq!(finances.expense_categories.last().unwrap().budget_amount, 450.0);

        delete_expense_category(&mut finances, "pets").unwrap();
        assert!(delete_expense_category(&mut finances, "pets").is_err());
    }

    #[test]
    fn test_set_currency() {
        let mut finances = empty_finances("₪");
        set_currency(&mut finances, " $ ").unwrap();
        assert_eq!(finances.finance_settings.currency, "$");
        assert!(set_currency(&mut finances, "").is_err());
    }
}
