use super::ledger;
use super::models::{
    CreateBillDto, CreateExpenseCategoryDto, CreateIncomeDto, CreateSavingsGoalDto, DepositDto,
    UpdateBillDto, UpdateExpenseCategoryDto, UpdateFinanceSettingsDto, UpdateIncomeDto,
    UpdateSavingsGoalDto,
};
use super::summary::{monthly_summary, MonthlySummary};
use crate::features::homes::commands::{get_home, mutate_home};
use crate::features::homes::models::Home;
use crate::shared::errors::AppResult;
use crate::AppState;
use chrono::Utc;

/// 請求書を追加する
pub fn add_bill(state: &AppState, home_id: &str, dto: CreateBillDto) -> AppResult<Home> {
    mutate_home(state, home_id, |home| {
        let id = ledger::add_bill(&mut home.finances, dto)?;
        log::info!("請求書を追加しました: home={}, bill={id}", home.id);
        Ok(())
    })
}

/// 請求書を更新する
pub fn update_bill(
    state: &AppState,
    home_id: &str,
    bill_id: &str,
    dto: UpdateBillDto,
) -> AppResult<Home> {
    mutate_home(state, home_id, |home| {
        ledger::update_bill(&mut home.finances, bill_id, dto)?;
        log::info!("請求書を更新しました: home={}, bill={bill_id}", home.id);
        Ok(())
    })
}

/// 請求書を削除する
pub fn delete_bill(state: &AppState, home_id: &str, bill_id: &str) -> AppResult<Home> {
    mutate_home(state, home_id, |home| {
        ledger::delete_bill(&mut home.finances, bill_id)?;
        log::info!("請求書を削除しました: home={}, bill={bill_id}", home.id);
        Ok(())
    })
}

/// 請求書を現在時刻で支払い済みにする
pub fn pay_bill(state: &AppState, home_id: &str, bill_id: &str) -> AppResult<Home> {
    mutate_home(state, home_id, |home| {
        let next = ledger::pay_bill(&mut home.finances, bill_id, Utc::now())?;
        match next {
            Some(next_id) => log::info!(
                "請求書を支払い済みにしました: home={}, bill={bill_id}, next={next_id}",
                home.id
            ),
            None => log::info!("請求書を支払い済みにしました: home={}, bill={bill_id}", home.id),
        }
        Ok(())
    })
}

/// 支払い済みの請求書を削除する
pub fn delete_paid_bill(state: &AppState, home_id: &str, bill_id: &str) -> AppResult<Home> {
    mutate_home(state, home_id, |home| {
        ledger::delete_paid_bill(&mut home.finances, bill_id)?;
        log::info!("支払い済みの請求書を削除しました: home={}, bill={bill_id}", home.id);
        Ok(())
    })
}

/// 収入を追加する
pub fn add_income(state: &AppState, home_id: &str, dto: CreateIncomeDto) -> AppResult<Home> {
    mutate_home(state, home_id, |home| {
        let id = ledger::add_income(&mut home.finances, dto)?;
        log::info!("収入を追加しました: home={}, income={id}", home.id);
        Ok(())
    })
}

/// 収入を更新する
pub fn update_income(
    state: &AppState,
    home_id: &str,
    income_id: &str,
    dto: UpdateIncomeDto,
) -> AppResult<Home> {
    mutate_home(state, home_id, |home| {
        ledger::update_income(&mut home.finances, income_id, dto)?;
        log::info!("収入を更新しました: home={}, income={income_id}", home.id);
        Ok(())
    })
}

/// 収入を削除する
pub fn delete_income(state: &AppState, home_id: &str, income_id: &str) -> AppResult<Home> {
    mutate_home(state, home_id, |home| {
        ledger::delete_income(&mut home.finances, income_id)?;
        log::info!("収入を削除しました: home={}, income={income_id}", home.id);
        Ok(())
    })
}

/// 貯蓄目標を追加する
pub fn add_savings_goal(
    state: &AppState,
    home_id: &str,
    dto: CreateSavingsGoalDto,
) -> AppResult<Home> {
    mutate_home(state, home_id, |home| {
        let id = ledger::add_savings_goal(&mut home.finances, dto)?;
        log::info!("貯蓄目標を追加しました: home={}, goal={id}", home.id);
        Ok(())
    })
}

/// 貯蓄目標を更新する
pub fn update_savings_goal(
    state: &AppState,
    home_id: &str,
    goal_id: &str,
    dto: UpdateSavingsGoalDto,
) -> AppResult<Home> {
    mutate_home(state, home_id, |home| {
        ledger::update_savings_goal(&mut home.finances, goal_id, dto)?;
        log::info!("貯蓄目標を更新しました: home={}, goal={goal_id}", home.id);
        Ok(())
    })
}

/// 貯蓄目標を削除する
pub fn delete_savings_goal(state: &AppState, home_id: &str, goal_id: &str) -> AppResult<Home> {
    mutate_home(state, home_id, |home| {
        ledger::delete_savings_goal(&mut home.finances, goal_id)?;
        log::info!("貯蓄目標を削除しました: home={}, goal={goal_id}", home.id);
        Ok(())
    })
}

/// 貯蓄目標に入金する
pub fn deposit(state: &AppState, home_id: &str, goal_id: &str, dto: DepositDto) -> AppResult<Home> {
    mutate_home(state, home_id, |home| {
        let balance = ledger::deposit(&mut home.finances, goal_id, dto.amount)?;
        log::info!(
            "貯蓄目標に入金しました: home={}, goal={goal_id}, amount={}, balance={balance}",
            home.id,
            dto.amount
        );
        Ok(())
    })
}

/// 支出カテゴリを追加する
pub fn add_expense_category(
    state: &AppState,
    home_id: &str,
    dto: CreateExpenseCategoryDto,
) -> AppResult<Home> {
    mutate_home(state, home_id, |home| {
        let name = dto.name.trim().to_string();
        ledger::add_expense_category(&mut home.finances, dto)?;
        log::info!("支出カテゴリを追加しました: home={}, category={name}", home.id);
        Ok(())
    })
}

/// 支出カテゴリを更新する
pub fn update_expense_category(
    state: &AppState,
    home_id: &str,
    name: &str,
    dto: UpdateExpenseCategoryDto,
) -> AppResult<Home> {
    mutate_home(state, home_id, |home| {
        ledger::update_expense_category(&mut home.finances, name, dto)?;
        log::info!("支出カテゴリを更新しました: home={}, category={name}", home.id);
        Ok(())
    })
}

/// 支出カテゴリを削除する
pub fn delete_expense_category(state: &AppState, home_id: &str, name: &str) -> AppResult<Home> {
    mutate_home(state, home_id, |home| {
        ledger::delete_expense_category(&mut home.finances, name)?;
        log::info!("支出カテゴリを削除しました: home={}, category={name}", home.id);
        Ok(())
    })
}

/// 家計設定を更新する
pub fn update_settings(
    state: &AppState,
    home_id: &str,
    dto: UpdateFinanceSettingsDto,
) -> AppResult<Home> {
    mutate_home(state, home_id, |home| {
        ledger::set_currency(&mut home.finances, &dto.currency)?;
        log::info!("通貨を変更しました: home={}, currency={}", home.id, dto.currency);
        Ok(())
    })
}

/// 月次集計を取得する（設定のタイムゾーンを使う）
pub fn get_summary(state: &AppState, home_id: &str, year: i32, month: u32) -> AppResult<MonthlySummary> {
    let home = get_home(state, home_id)?;
    monthly_summary(&home, year, month, state.config.timezone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::finances::models::{Frequency, Recurrence};
    use crate::shared::errors::AppError;
    use crate::{create_test_home, test_state};

    #[test]
    fn test_pay_recurring_bill_is_persisted() {
        let state = test_state();
        let home = create_test_home(&state, "Levi");

        let home = add_bill(
            &state,
            &home.id,
            CreateBillDto {
                text: "Internet".to_string(),
                amount: 99.9,
                due_date: "2024-01-15".to_string(),
                category: Some("utilities".to_string()),
                is_urgent: Some(true),
                assigned_to: Some("Dana".to_string()),
                comment: None,
                recurring: Some(Recurrence {
                    frequency: Frequency::Monthly,
                }),
            },
        )
        .unwrap();
        let bill_id = home.finances.expected_bills[0].id.clone();

        let paid = pay_bill(&state, &home.id, &bill_id).unwrap();

        assert_eq!(paid.finances.paid_bills.len(), 1);
        assert_eq!(paid.finances.expected_bills.len(), 1);
        assert_eq!(
            paid.finances.expected_bills[0].due_date.to_string(),
            "2024-02-15"
        );
        assert_eq!(get_home(&state, &home.id).unwrap(), paid);

        let summary = get_summary(&state, &home.id, 2024, 1).unwrap();
        assert_eq!(summary.total_expenses, 0.0);
    }

    #[test]
    fn test_pay_missing_bill_is_not_found() {
        let state = test_state();
        let home = create_test_home(&state, "Levi");
        let result = pay_bill(&state, &home.id, "missing");
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_settings_and_budgets() {
        let state = test_state();
        let home = create_test_home(&state, "Levi");

        let updated = update_settings(
            &state,
            &home.id,
            UpdateFinanceSettingsDto {
                currency: "€".to_string(),
            },
        )
        .unwrap();
        assert_eq!(updated.finances.finance_settings.currency, "€");

        let updated = update_expense_category(
            &state,
            &home.id,
            "food",
            UpdateExpenseCategoryDto {
                budget_amount: Some(2000.0),
                ..UpdateExpenseCategoryDto::default()
            },
        )
        .unwrap();
        let food = updated
            .finances
            .expense_categories
            .iter()
            .find(|c| c.name == "food")
            .unwrap();
        assert_eq!(food.budget_amount, 2000.0);

        let summary = get_summary(&state, &home.id, 2024, 5).unwrap();
        assert_eq!(summary.currency, "€");
    }
}
