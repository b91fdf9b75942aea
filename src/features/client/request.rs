//! クライアントが送るホーム変更リクエスト
//!
//! 1つのリクエストから、RESTのルート・確認が必要な削除の種類・
//! ローカルでの楽観的な適用の3つを導出する。

use crate::features::ai::commands::AiTextDto;
use crate::features::finances::ledger;
use crate::features::finances::models::{
    CreateBillDto, CreateExpenseCategoryDto, CreateIncomeDto, CreateSavingsGoalDto, DepositDto,
    UpdateBillDto, UpdateExpenseCategoryDto, UpdateFinanceSettingsDto, UpdateIncomeDto,
    UpdateSavingsGoalDto,
};
use crate::features::homes::models::{Home, UpdateHomeDto};
use crate::features::lists::archive;
use crate::features::lists::engine;
use crate::features::lists::models::{CreateItemDto, GroupItemsDto, ListType, UpdateItemDto};
use crate::features::lists::RemovalKind;
use crate::features::members::models::{AddUserDto, UpdateUserDto};
use crate::features::members::roster;
use crate::features::templates::library;
use crate::features::templates::models::SaveTemplateDto;
use crate::shared::errors::{AppError, AppResult};
use chrono::Utc;
use hyper::Method;
use serde::Serialize;
use serde_json::Value;
use url::Url;

/// 既存ホームに対する変更リクエスト
#[derive(Debug, Clone)]
pub enum HomeRequest {
    UpdateHome(UpdateHomeDto),

    AddUser(AddUserDto),
    UpdateUser { name: String, dto: UpdateUserDto },
    RemoveUser { name: String },

    AddItem { list_type: ListType, dto: CreateItemDto },
    UpdateItem { list_type: ListType, item_id: String, dto: UpdateItemDto },
    ArchiveItem { list_type: ListType, item_id: String },
    DeleteItem { list_type: ListType, item_id: String },
    ClearCompleted { list_type: ListType },
    ClearList { list_type: ListType },
    GroupItems { list_type: ListType, dto: GroupItemsDto },
    UngroupFolder { list_type: ListType, folder_id: String },

    RestoreArchived { item_id: String },
    DeleteArchived { item_id: String },
    ClearArchive,

    SaveTemplate(SaveTemplateDto),
    ApplyTemplate { name: String },
    DeleteTemplate { name: String },

    AddBill(CreateBillDto),
    UpdateBill { id: String, dto: UpdateBillDto },
    DeleteBill { id: String },
    PayBill { id: String },
    DeletePaidBill { id: String },
    AddIncome(CreateIncomeDto),
    UpdateIncome { id: String, dto: UpdateIncomeDto },
    DeleteIncome { id: String },
    AddSavingsGoal(CreateSavingsGoalDto),
    UpdateSavingsGoal { id: String, dto: UpdateSavingsGoalDto },
    DeleteSavingsGoal { id: String },
    Deposit { id: String, dto: DepositDto },
    AddExpenseCategory(CreateExpenseCategoryDto),
    UpdateExpenseCategory { name: String, dto: UpdateExpenseCategoryDto },
    DeleteExpenseCategory { name: String },
    UpdateFinanceSettings(UpdateFinanceSettingsDto),

    TransformRecipe(AiTextDto),
    BreakdownTask(AiTextDto),
}

/// HTTPメソッド・パスセグメント・本文の組
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRoute {
    pub method: Method,
    pub segments: Vec<String>,
    pub query: Option<&'static str>,
    pub body: Option<Value>,
}

impl ApiRoute {
    pub fn new<S: Into<String>>(method: Method, segments: impl IntoIterator<Item = S>) -> Self {
        Self {
            method,
            segments: segments.into_iter().map(Into::into).collect(),
            query: None,
            body: None,
        }
    }

    pub fn with_body<T: Serialize>(mut self, body: &T) -> AppResult<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    fn with_query(mut self, query: &'static str) -> Self {
        self.query = Some(query);
        self
    }

    /// ベースURLにパスセグメントをパーセントエンコードして連結する
    pub fn url(&self, base: &Url) -> AppResult<Url> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::configuration(format!("ベースURLにパスを付けられません: {base}")))?
            .pop_if_empty()
            .extend(&self.segments);
        url.set_query(self.query);
        Ok(url)
    }
}

impl HomeRequest {
    /// ログ用の操作名
    pub fn name(&self) -> &'static str {
        match self {
            HomeRequest::UpdateHome(_) => "update_home",
            HomeRequest::AddUser(_) => "add_user",
            HomeRequest::UpdateUser { .. } => "update_user",
            HomeRequest::RemoveUser { .. } => "remove_user",
            HomeRequest::AddItem { .. } => "add_item",
            HomeRequest::UpdateItem { .. } => "update_item",
            HomeRequest::ArchiveItem { .. } => "archive_item",
            HomeRequest::DeleteItem { .. } => "delete_item",
            HomeRequest::ClearCompleted { .. } => "clear_completed",
            HomeRequest::ClearList { .. } => "clear_list",
            HomeRequest::GroupItems { .. } => "group_items",
            HomeRequest::UngroupFolder { .. } => "ungroup_folder",
            HomeRequest::RestoreArchived { .. } => "restore_archived",
            HomeRequest::DeleteArchived { .. } => "delete_archived",
            HomeRequest::ClearArchive => "clear_archive",
            HomeRequest::SaveTemplate(_) => "save_template",
            HomeRequest::ApplyTemplate { .. } => "apply_template",
            HomeRequest::DeleteTemplate { .. } => "delete_template",
            HomeRequest::AddBill(_) => "add_bill",
            HomeRequest::UpdateBill { .. } => "update_bill",
            HomeRequest::DeleteBill { .. } => "delete_bill",
            HomeRequest::PayBill { .. } => "pay_bill",
            HomeRequest::DeletePaidBill { .. } => "delete_paid_bill",
            HomeRequest::AddIncome(_) => "add_income",
            HomeRequest::UpdateIncome { .. } => "update_income",
            HomeRequest::DeleteIncome { .. } => "delete_income",
            HomeRequest::AddSavingsGoal(_) => "add_savings_goal",
            HomeRequest::UpdateSavingsGoal { .. } => "update_savings_goal",
            HomeRequest::DeleteSavingsGoal { .. } => "delete_savings_goal",
            HomeRequest::Deposit { .. } => "deposit",
            HomeRequest::AddExpenseCategory(_) => "add_expense_category",
            HomeRequest::UpdateExpenseCategory { .. } => "update_expense_category",
            HomeRequest::DeleteExpenseCategory { .. } => "delete_expense_category",
            HomeRequest::UpdateFinanceSettings(_) => "update_finance_settings",
            HomeRequest::TransformRecipe(_) => "transform_recipe",
            HomeRequest::BreakdownTask(_) => "breakdown_task",
        }
    }

    /// 確認が必要かを判定するための削除の種類
    pub fn removal_kind(&self) -> Option<RemovalKind> {
        match self {
            HomeRequest::ArchiveItem { .. } => Some(RemovalKind::Archive),
            HomeRequest::DeleteItem { .. } => Some(RemovalKind::PermanentDelete),
            HomeRequest::ClearCompleted { .. } => Some(RemovalKind::ClearCompleted),
            HomeRequest::ClearList { .. } => Some(RemovalKind::ClearList),
            HomeRequest::DeleteArchived { .. } => Some(RemovalKind::DeleteArchived),
            HomeRequest::ClearArchive => Some(RemovalKind::ClearArchive),
            _ => None,
        }
    }

    /// RESTルートに変換する
    pub fn route(&self, home_id: &str) -> AppResult<ApiRoute> {
        let home = |rest: &[&str]| {
            let mut segments = vec!["homes".to_string(), home_id.to_string()];
            segments.extend(rest.iter().map(|s| s.to_string()));
            segments
        };
        let list = |list_type: &ListType, rest: &[&str]| {
            let mut segments = home(&[list_type.as_str()]);
            segments.extend(rest.iter().map(|s| s.to_string()));
            segments
        };

        let route = match self {
            HomeRequest::UpdateHome(dto) => ApiRoute::new(Method::PUT, home(&[])).with_body(dto)?,

            HomeRequest::AddUser(dto) => ApiRoute::new(Method::POST, home(&["users"])).with_body(dto)?,
            HomeRequest::UpdateUser { name, dto } => {
                ApiRoute::new(Method::PUT, home(&["users", name.as_str()])).with_body(dto)?
            }
            HomeRequest::RemoveUser { name } => ApiRoute::new(Method::DELETE, home(&["users", name.as_str()])),

            HomeRequest::AddItem { list_type, dto } => {
                ApiRoute::new(Method::POST, list(list_type, &[])).with_body(dto)?
            }
            HomeRequest::UpdateItem {
                list_type,
                item_id,
                dto,
            } => ApiRoute::new(Method::PUT, list(list_type, &[item_id.as_str()])).with_body(dto)?,
            HomeRequest::ArchiveItem { list_type, item_id } => {
                ApiRoute::new(Method::DELETE, list(list_type, &[item_id.as_str()]))
            }
            HomeRequest::DeleteItem { list_type, item_id } => {
                ApiRoute::new(Method::DELETE, list(list_type, &[item_id.as_str()])).with_query("permanent=true")
            }
            HomeRequest::ClearCompleted { list_type } => {
                ApiRoute::new(Method::POST, list(list_type, &["clear-completed"]))
            }
            HomeRequest::ClearList { list_type } => {
                ApiRoute::new(Method::DELETE, list(list_type, &["clear"]))
            }
            HomeRequest::GroupItems { list_type, dto } => {
                ApiRoute::new(Method::POST, list(list_type, &["group"])).with_body(dto)?
            }
            HomeRequest::UngroupFolder {
                list_type,
                folder_id,
            } => ApiRoute::new(Method::POST, list(list_type, &[folder_id.as_str(), "ungroup"])),

            HomeRequest::RestoreArchived { item_id } => {
                ApiRoute::new(Method::POST, home(&["archive", item_id.as_str(), "restore"]))
            }
            HomeRequest::DeleteArchived { item_id } => {
                ApiRoute::new(Method::DELETE, home(&["archive", item_id.as_str()]))
            }
            HomeRequest::ClearArchive => ApiRoute::new(Method::DELETE, home(&["archive"])),

            HomeRequest::SaveTemplate(dto) => {
                ApiRoute::new(Method::POST, home(&["templates"])).with_body(dto)?
            }
            HomeRequest::ApplyTemplate { name } => {
                ApiRoute::new(Method::POST, home(&["templates", name.as_str(), "apply"]))
            }
            HomeRequest::DeleteTemplate { name } => {
                ApiRoute::new(Method::DELETE, home(&["templates", name.as_str()]))
            }

            HomeRequest::AddBill(dto) => {
                ApiRoute::new(Method::POST, home(&["finance", "bills"])).with_body(dto)?
            }
            HomeRequest::UpdateBill { id, dto } => {
                ApiRoute::new(Method::PUT, home(&["finance", "bills", id.as_str()])).with_body(dto)?
            }
            HomeRequest::DeleteBill { id } => {
                ApiRoute::new(Method::DELETE, home(&["finance", "bills", id.as_str()]))
            }
            HomeRequest::PayBill { id } => {
                ApiRoute::new(Method::POST, home(&["finance", "bills", id.as_str(), "pay"]))
            }
            HomeRequest::DeletePaidBill { id } => {
                ApiRoute::new(Method::DELETE, home(&["finance", "paid-bills", id.as_str()]))
            }
            HomeRequest::AddIncome(dto) => {
                ApiRoute::new(Method::POST, home(&["finance", "income"])).with_body(dto)?
            }
            HomeRequest::UpdateIncome { id, dto } => {
                ApiRoute::new(Method::PUT, home(&["finance", "income", id.as_str()])).with_body(dto)?
            }
            HomeRequest::DeleteIncome { id } => {
                ApiRoute::new(Method::DELETE, home(&["finance", "income", id.as_str()]))
            }
            HomeRequest::AddSavingsGoal(dto) => {
                ApiRoute::new(Method::POST, home(&["finance", "savings-goals"])).with_body(dto)?
            }
            HomeRequest::UpdateSavingsGoal { id, dto } => {
                ApiRoute::new(Method::PUT, home(&["finance", "savings-goals", id.as_str()])).with_body(dto)?
            }
            HomeRequest::DeleteSavingsGoal { id } => {
                ApiRoute::new(Method::DELETE, home(&["finance", "savings-goals", id.as_str()]))
            }
            HomeRequest::Deposit { id, dto } => ApiRoute::new(
                Method::POST,
                home(&["finance", "savings-goals", id.as_str(), "deposit"]),
            )
            .with_body(dto)?,
            HomeRequest::AddExpenseCategory(dto) => {
                ApiRoute::new(Method::POST, home(&["finance", "budgets"])).with_body(dto)?
            }
            HomeRequest::UpdateExpenseCategory { name, dto } => {
                ApiRoute::new(Method::PUT, home(&["finance", "budgets", name.as_str()])).with_body(dto)?
            }
            HomeRequest::DeleteExpenseCategory { name } => {
                ApiRoute::new(Method::DELETE, home(&["finance", "budgets", name.as_str()]))
            }
            HomeRequest::UpdateFinanceSettings(dto) => {
                ApiRoute::new(Method::PUT, home(&["finance", "settings"])).with_body(dto)?
            }

            HomeRequest::TransformRecipe(dto) => {
                ApiRoute::new(Method::POST, home(&["ai", "transform-recipe"])).with_body(dto)?
            }
            HomeRequest::BreakdownTask(dto) => {
                ApiRoute::new(Method::POST, home(&["ai", "breakdown-task"])).with_body(dto)?
            }
        };
        Ok(route)
    }

    /// サーバーの応答を待たずにローカルのホームへ適用する
    ///
    /// 結果を予測できないAI生成は何もせず `false` を返す。
    pub fn apply_optimistic(&self, home: &mut Home) -> AppResult<bool> {
        match self.clone() {
            HomeRequest::UpdateHome(dto) => {
                dto.validate()?;
                dto.apply(home);
            }

            HomeRequest::AddUser(dto) => roster::add_user(home, &dto)?,
            HomeRequest::UpdateUser { name, dto } => roster::update_user(home, &name, &dto)?,
            HomeRequest::RemoveUser { name } => {
                roster::remove_user(home, &name)?;
            }

            HomeRequest::AddItem { list_type, dto } => {
                engine::add_item(home, list_type, dto)?;
            }
            HomeRequest::UpdateItem {
                list_type,
                item_id,
                dto,
            } => {
                engine::update_item(home, list_type, &item_id, &dto)?;
            }
            HomeRequest::ArchiveItem { list_type, item_id } => {
                archive::archive_item(home, list_type, &item_id)?
            }
            HomeRequest::DeleteItem { list_type, item_id } => {
                engine::delete_item_permanently(home, list_type, &item_id)?;
            }
            HomeRequest::ClearCompleted { list_type } => {
                engine::clear_completed(home, list_type);
            }
            HomeRequest::ClearList { list_type } => {
                engine::clear_list(home, list_type);
            }
            HomeRequest::GroupItems { list_type, dto } => {
                engine::group_items(home, list_type, &dto)?;
            }
            HomeRequest::UngroupFolder {
                list_type,
                folder_id,
            } => engine::ungroup_folder(home, list_type, &folder_id)?,

            HomeRequest::RestoreArchived { item_id } => {
                archive::restore_item(home, &item_id)?;
            }
            HomeRequest::DeleteArchived { item_id } => {
                archive::delete_archived_item(home, &item_id)?;
            }
            HomeRequest::ClearArchive => {
                archive::clear_archive(home);
            }

            HomeRequest::SaveTemplate(dto) => library::save_template(home, dto)?,
            HomeRequest::ApplyTemplate { name } => {
                library::apply_template(home, &name)?;
            }
            HomeRequest::DeleteTemplate { name } => {
                library::delete_template(home, &name)?;
            }

            HomeRequest::AddBill(dto) => {
                ledger::add_bill(&mut home.finances, dto)?;
            }
            HomeRequest::UpdateBill { id, dto } => ledger::update_bill(&mut home.finances, &id, dto)?,
            HomeRequest::DeleteBill { id } => {
                ledger::delete_bill(&mut home.finances, &id)?;
            }
            HomeRequest::PayBill { id } => {
                ledger::pay_bill(&mut home.finances, &id, Utc::now())?;
            }
            HomeRequest::DeletePaidBill { id } => {
                ledger::delete_paid_bill(&mut home.finances, &id)?;
            }
            HomeRequest::AddIncome(dto) => {
                ledger::add_income(&mut home.finances, dto)?;
            }
            HomeRequest::UpdateIncome { id, dto } => {
                ledger::update_income(&mut home.finances, &id, dto)?
            }
            HomeRequest::DeleteIncome { id } => {
                ledger::delete_income(&mut home.finances, &id)?;
            }
            HomeRequest::AddSavingsGoal(dto) => {
                ledger::add_savings_goal(&mut home.finances, dto)?;
            }
            HomeRequest::UpdateSavingsGoal { id, dto } => {
                ledger::update_savings_goal(&mut home.finances, &id, dto)?
            }
            HomeRequest::DeleteSavingsGoal { id } => {
                ledger::delete_savings_goal(&mut home.finances, &id)?;
            }
            HomeRequest::Deposit { id, dto } => {
                ledger::deposit(&mut home.finances, &id, dto.amount)?;
            }
            HomeRequest::AddExpenseCategory(dto) => {
                ledger::add_expense_category(&mut home.finances, dto)?
            }
            HomeRequest::UpdateExpenseCategory { name, dto } => {
                ledger::update_expense_category(&mut home.finances, &name, dto)?
            }
            HomeRequest::DeleteExpenseCategory { name } => {
                ledger::delete_expense_category(&mut home.finances, &name)?;
            }
            HomeRequest::UpdateFinanceSettings(dto) => {
                ledger::set_currency(&mut home.finances, &dto.currency)?
            }

            HomeRequest::TransformRecipe(_) | HomeRequest::BreakdownTask(_) => return Ok(false),
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::homes::normalize::{normalize_home, RawHome};
    use crate::features::lists::models::Item;

    fn base() -> Url {
        Url::parse("http://localhost:8080").unwrap()
    }

    #[test]
    fn test_permanent_delete_route() {
        let request = HomeRequest::DeleteItem {
            list_type: ListType::Tasks,
            item_id: "abc".to_string(),
        };
        let route = request.route("h1").unwrap();

        assert_eq!(route.method, Method::DELETE);
        assert_eq!(
            route.url(&base()).unwrap().as_str(),
            "http://localhost:8080/homes/h1/tasks/abc?permanent=true"
        );
        assert_eq!(request.removal_kind(), Some(RemovalKind::PermanentDelete));
    }

    #[test]
    fn test_names_are_percent_encoded() {
        let request = HomeRequest::ApplyTemplate {
            name: "Weekly shop".to_string(),
        };
        let url = request.route("h1").unwrap().url(&base()).unwrap();
        assert_eq!(url.path(), "/homes/h1/templates/Weekly%20shop/apply");
        assert_eq!(request.removal_kind(), None);
    }

    #[test]
    fn test_base_url_with_prefix() {
        let base = Url::parse("http://example.com/api/").unwrap();
        let url = HomeRequest::ClearArchive.route("h1").unwrap().url(&base).unwrap();
        assert_eq!(url.as_str(), "http://example.com/api/homes/h1/archive");
    }

    #[test]
    fn test_optimistic_archive_moves_item() {
        let (mut home, _) = normalize_home(RawHome::default(), "₪");
        home.shopping_list.push(Item::new("1", "Milk"));

        let applied = HomeRequest::ArchiveItem {
            list_type: ListType::Shopping,
            item_id: "1".to_string(),
        }
        .apply_optimistic(&mut home)
        .unwrap();

        assert!(applied);
        assert!(home.shopping_list.is_empty());
        assert_eq!(home.archived_items[0].original_list, Some(ListType::Shopping));
    }

    #[test]
    fn test_optimistic_update_reaches_nested_item() {
        let (mut home, _) = normalize_home(RawHome::default(), "₪");
        home.tasks_list.push(Item::folder(
            "f",
            "Repairs",
            vec![Item::new("c", "Fix sink")],
        ));

        let applied = HomeRequest::UpdateItem {
            list_type: ListType::Tasks,
            item_id: "c".to_string(),
            dto: UpdateItemDto {
                completed: Some(true),
                ..UpdateItemDto::default()
            },
        }
        .apply_optimistic(&mut home)
        .unwrap();

        assert!(applied);
        assert!(home.tasks_list[0].sub_items[0].completed);

        let missing = HomeRequest::UpdateItem {
            list_type: ListType::Tasks,
            item_id: "ghost".to_string(),
            dto: UpdateItemDto::default(),
        }
        .apply_optimistic(&mut home);
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_ai_requests_are_not_predicted() {
        let (mut home, _) = normalize_home(RawHome::default(), "₪");
        let before = home.clone();

        let applied = HomeRequest::TransformRecipe(AiTextDto {
            text: "Pancakes".to_string(),
        })
        .apply_optimistic(&mut home)
        .unwrap();

        assert!(!applied);
        assert_eq!(home, before);
    }
}
