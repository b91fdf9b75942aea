/// 家計機能モジュール
///
/// このモジュールはホームに埋め込まれた家計データに関するすべての機能を提供します：
/// - 支払い予定・支払い済みの請求書（繰り返し請求書の次回分作成を含む）
/// - 収入、貯蓄目標、支出カテゴリ（予算）
/// - 月次集計と予算消化状況
pub mod commands;
pub mod defaults;
pub mod ledger;
pub mod models;
pub mod summary;

pub use models::{
    ExpectedBill, ExpenseCategory, FinanceSettings, Finances, Frequency, Income, PaidBill,
    Recurrence, SavingsGoal,
};
pub use summary::{BudgetStatus, MemberSummary, MonthlySummary};
