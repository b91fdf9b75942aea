//! 楽観的更新を伴うクライアント操作
//!
//! 1. 取り消せない操作は確認を取る（拒否されたら何もしない）
//! 2. 読み込み中フラグを立てる
//! 3. ローカルのホームに変更を適用する
//! 4. サーバーへ送信し、成功すれば応答で置き換え、失敗すればスナップショットに戻す

use super::api_client::HomeApi;
use super::notify::{ConfirmationGate, Notification, Notifier};
use super::request::HomeRequest;
use super::store::HomeStore;
use crate::features::ai::commands::AiTextDto;
use crate::features::finances::models::{
    CreateBillDto, CreateExpenseCategoryDto, CreateIncomeDto, CreateSavingsGoalDto, DepositDto,
    UpdateBillDto, UpdateExpenseCategoryDto, UpdateFinanceSettingsDto, UpdateIncomeDto,
    UpdateSavingsGoalDto,
};
use crate::features::finances::summary::MonthlySummary;
use crate::features::homes::models::{Home, UpdateHomeDto};
use crate::features::lists::models::{
    CreateItemDto, GroupItemsDto, Item, ListType, UpdateItemDto,
};
use crate::features::lists::tree;
use crate::features::members::models::{AddUserDto, UpdateUserDto};
use crate::features::templates::models::SaveTemplateDto;
use crate::shared::errors::{AppError, AppResult};
use std::sync::Arc;

/// 操作の結果
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// サーバーが確定したホーム
    Applied(Home),
    /// 確認で取り消された
    Declined,
}

/// 操作に必要な協調オブジェクト一式
#[derive(Clone)]
pub struct ActionContext {
    pub api: Arc<dyn HomeApi>,
    pub store: Arc<HomeStore>,
    pub notifier: Arc<dyn Notifier>,
    pub gate: Arc<dyn ConfirmationGate>,
}

impl ActionContext {
    pub fn new(
        api: Arc<dyn HomeApi>,
        store: Arc<HomeStore>,
        notifier: Arc<dyn Notifier>,
        gate: Arc<dyn ConfirmationGate>,
    ) -> Self {
        Self {
            api,
            store,
            notifier,
            gate,
        }
    }

    /// 変更リクエストを実行する
    pub async fn run(&self, request: HomeRequest) -> AppResult<ActionOutcome> {
        let Some(home_id) = self.store.home_id() else {
            return Err(self.report(request.name(), AppError::validation("ホームが選択されていません")));
        };

        if let Some(kind) = request.removal_kind() {
            if kind.requires_confirmation() && !self.gate.confirm(kind).await {
                log::info!("操作が取り消されました: {}", request.name());
                return Ok(ActionOutcome::Declined);
            }
        }

        let _loading = self.store.begin_loading();

        let (snapshot, predicted) = self
            .store
            .apply(|home| request.apply_optimistic(home))
            .map_err(|e| self.report(request.name(), e))?;
        log::debug!("操作を開始します: {}, optimistic={predicted}", request.name());

        match self.api.execute(&home_id, &request).await {
            Ok(home) => {
                self.store.replace(home.clone())?;
                Ok(ActionOutcome::Applied(home))
            }
            Err(e) => {
                if let Err(rollback_error) = self.store.rollback(snapshot) {
                    log::error!("楽観的更新の取り消しに失敗しました: {}", rollback_error.details());
                }
                Err(self.report(request.name(), e))
            }
        }
    }

    fn report(&self, operation: &str, error: AppError) -> AppError {
        log::warn!("操作に失敗しました: {operation}: {}", error.details());
        self.notifier.notify(Notification::error(error.user_message()));
        error
    }

    /// 現在のホームからアイテムを探す（見つからなければ通知する）
    fn find_item(&self, operation: &str, list_type: ListType, item_id: &str) -> AppResult<Item> {
        let found = match self.store.current() {
            Some(home) => tree::find_by_id(home.list(list_type), item_id)
                .cloned()
                .ok_or_else(|| AppError::not_found("アイテム")),
            None => Err(AppError::validation("ホームが選択されていません")),
        };
        found.map_err(|e| self.report(operation, e))
    }
}

/// 買い物・タスクリスト、アーカイブ、テンプレート、AI補助の操作
#[derive(Clone)]
pub struct ListActions {
    context: ActionContext,
}

impl ListActions {
    pub fn new(context: ActionContext) -> Self {
        Self { context }
    }

    pub async fn add_item(&self, list_type: ListType, dto: CreateItemDto) -> AppResult<ActionOutcome> {
        self.context.run(HomeRequest::AddItem { list_type, dto }).await
    }

    pub async fn update_item(
        &self,
        list_type: ListType,
        item_id: &str,
        dto: UpdateItemDto,
    ) -> AppResult<ActionOutcome> {
        self.context
            .run(HomeRequest::UpdateItem {
                list_type,
                item_id: item_id.to_string(),
                dto,
            })
            .await
    }

    /// 完了状態を反転する（子アイテムにも伝播する）
    pub async fn toggle_completed(&self, list_type: ListType, item_id: &str) -> AppResult<ActionOutcome> {
        let item = self.context.find_item("toggle_completed", list_type, item_id)?;
        let dto = UpdateItemDto {
            completed: Some(!item.completed),
            ..UpdateItemDto::default()
        };
        self.update_item(list_type, item_id, dto).await
    }

    pub async fn toggle_urgent(&self, list_type: ListType, item_id: &str) -> AppResult<ActionOutcome> {
        let item = self.context.find_item("toggle_urgent", list_type, item_id)?;
        let dto = UpdateItemDto {
            is_urgent: Some(!item.is_urgent),
            ..UpdateItemDto::default()
        };
        self.update_item(list_type, item_id, dto).await
    }

    /// アーカイブへ移す（確認なし）
    pub async fn archive_item(&self, list_type: ListType, item_id: &str) -> AppResult<ActionOutcome> {
        self.context
            .run(HomeRequest::ArchiveItem {
                list_type,
                item_id: item_id.to_string(),
            })
            .await
    }

    pub async fn delete_item(&self, list_type: ListType, item_id: &str) -> AppResult<ActionOutcome> {
        self.context
            .run(HomeRequest::DeleteItem {
                list_type,
                item_id: item_id.to_string(),
            })
            .await
    }

    pub async fn clear_completed(&self, list_type: ListType) -> AppResult<ActionOutcome> {
        self.context.run(HomeRequest::ClearCompleted { list_type }).await
    }

    pub async fn clear_list(&self, list_type: ListType) -> AppResult<ActionOutcome> {
        self.context.run(HomeRequest::ClearList { list_type }).await
    }

    pub async fn group_items(
        &self,
        list_type: ListType,
        dragged_id: &str,
        target_id: &str,
        folder_name: &str,
    ) -> AppResult<ActionOutcome> {
        self.context
            .run(HomeRequest::GroupItems {
                list_type,
                dto: GroupItemsDto {
                    dragged_id: dragged_id.to_string(),
                    target_id: target_id.to_string(),
                    folder_name: folder_name.to_string(),
                },
            })
            .await
    }

    pub async fn ungroup_folder(&self, list_type: ListType, folder_id: &str) -> AppResult<ActionOutcome> {
        self.context
            .run(HomeRequest::UngroupFolder {
                list_type,
                folder_id: folder_id.to_string(),
            })
            .await
    }

    pub async fn restore_archived(&self, item_id: &str) -> AppResult<ActionOutcome> {
        self.context
            .run(HomeRequest::RestoreArchived {
                item_id: item_id.to_string(),
            })
            .await
    }

    pub async fn delete_archived(&self, item_id: &str) -> AppResult<ActionOutcome> {
        self.context
            .run(HomeRequest::DeleteArchived {
                item_id: item_id.to_string(),
            })
            .await
    }

    pub async fn clear_archive(&self) -> AppResult<ActionOutcome> {
        self.context.run(HomeRequest::ClearArchive).await
    }

    pub async fn save_template(&self, dto: SaveTemplateDto) -> AppResult<ActionOutcome> {
        self.context.run(HomeRequest::SaveTemplate(dto)).await
    }

    pub async fn apply_template(&self, name: &str) -> AppResult<ActionOutcome> {
        self.context
            .run(HomeRequest::ApplyTemplate {
                name: name.to_string(),
            })
            .await
    }

    pub async fn delete_template(&self, name: &str) -> AppResult<ActionOutcome> {
        self.context
            .run(HomeRequest::DeleteTemplate {
                name: name.to_string(),
            })
            .await
    }

    pub async fn transform_recipe(&self, text: &str) -> AppResult<ActionOutcome> {
        self.context
            .run(HomeRequest::TransformRecipe(AiTextDto {
                text: text.to_string(),
            }))
            .await
    }

    pub async fn breakdown_task(&self, text: &str) -> AppResult<ActionOutcome> {
        self.context
            .run(HomeRequest::BreakdownTask(AiTextDto {
                text: text.to_string(),
            }))
            .await
    }
}

/// 家計の操作
#[derive(Clone)]
pub struct FinanceActions {
    context: ActionContext,
}

impl FinanceActions {
    pub fn new(context: ActionContext) -> Self {
        Self { context }
    }

    pub async fn add_bill(&self, dto: CreateBillDto) -> AppResult<ActionOutcome> {
        self.context.run(HomeRequest::AddBill(dto)).await
    }

    pub async fn update_bill(&self, id: &str, dto: UpdateBillDto) -> AppResult<ActionOutcome> {
        self.context
            .run(HomeRequest::UpdateBill {
                id: id.to_string(),
                dto,
            })
            .await
    }

    pub async fn delete_bill(&self, id: &str) -> AppResult<ActionOutcome> {
        self.context.run(HomeRequest::DeleteBill { id: id.to_string() }).await
    }

    pub async fn pay_bill(&self, id: &str) -> AppResult<ActionOutcome> {
        self.context.run(HomeRequest::PayBill { id: id.to_string() }).await
    }

    pub async fn delete_paid_bill(&self, id: &str) -> AppResult<ActionOutcome> {
        self.context
            .run(HomeRequest::DeletePaidBill { id: id.to_string() })
            .await
    }

    pub async fn add_income(&self, dto: CreateIncomeDto) -> AppResult<ActionOutcome> {
        self.context.run(HomeRequest::AddIncome(dto)).await
    }

    pub async fn update_income(&self, id: &str, dto: UpdateIncomeDto) -> AppResult<ActionOutcome> {
        self.context
            .run(HomeRequest::UpdateIncome {
                id: id.to_string(),
                dto,
            })
            .await
    }

    pub async fn delete_income(&self, id: &str) -> AppResult<ActionOutcome> {
        self.context.run(HomeRequest::DeleteIncome { id: id.to_string() }).await
    }

    pub async fn add_savings_goal(&self, dto: CreateSavingsGoalDto) -> AppResult<ActionOutcome> {
        self.context.run(HomeRequest::AddSavingsGoal(dto)).await
    }

    pub async fn update_savings_goal(
        &self,
        id: &str,
        dto: UpdateSavingsGoalDto,
    ) -> AppResult<ActionOutcome> {
        self.context
            .run(HomeRequest::UpdateSavingsGoal {
                id: id.to_string(),
                dto,
            })
            .await
    }

    pub async fn delete_savings_goal(&self, id: &str) -> AppResult<ActionOutcome> {
        self.context
            .run(HomeRequest::DeleteSavingsGoal { id: id.to_string() })
            .await
    }

    /// 入金（負の金額で引き出し）
    pub async fn deposit(&self, id: &str, amount: f64) -> AppResult<ActionOutcome> {
        self.context
            .run(HomeRequest::Deposit {
                id: id.to_string(),
                dto: DepositDto { amount },
            })
            .await
    }

    pub async fn add_expense_category(&self, dto: CreateExpenseCategoryDto) -> AppResult<ActionOutcome> {
        self.context.run(HomeRequest::AddExpenseCategory(dto)).await
    }

    pub async fn update_expense_category(
        &self,
        name: &str,
        dto: UpdateExpenseCategoryDto,
    ) -> AppResult<ActionOutcome> {
        self.context
            .run(HomeRequest::UpdateExpenseCategory {
                name: name.to_string(),
                dto,
            })
            .await
    }

    pub async fn delete_expense_category(&self, name: &str) -> AppResult<ActionOutcome> {
        self.context
            .run(HomeRequest::DeleteExpenseCategory {
                name: name.to_string(),
            })
            .await
    }

    pub async fn set_currency(&self, currency: &str) -> AppResult<ActionOutcome> {
        self.context
            .run(HomeRequest::UpdateFinanceSettings(UpdateFinanceSettingsDto {
                currency: currency.to_string(),
            }))
            .await
    }

    /// 月次集計を取得する（ホームは変更しない）
    pub async fn monthly_summary(&self, year: i32, month: u32) -> AppResult<MonthlySummary> {
        let context = &self.context;
        let home_id = context
            .store
            .home_id()
            .ok_or_else(|| AppError::validation("ホームが選択されていません"))?;

        let _loading = context.store.begin_loading();
        context
            .api
            .monthly_summary(&home_id, year, month)
            .await
            .map_err(|e| {
                context
                    .notifier
                    .notify(Notification::error(e.user_message()));
                e
            })
    }
}

/// メンバーとホーム設定の操作
#[derive(Clone)]
pub struct MemberActions {
    context: ActionContext,
}

impl MemberActions {
    pub fn new(context: ActionContext) -> Self {
        Self { context }
    }

    pub async fn add_user(&self, name: &str, is_admin: bool) -> AppResult<ActionOutcome> {
        self.context
            .run(HomeRequest::AddUser(AddUserDto {
                name: name.to_string(),
                is_admin,
            }))
            .await
    }

    pub async fn update_user(&self, name: &str, dto: UpdateUserDto) -> AppResult<ActionOutcome> {
        self.context
            .run(HomeRequest::UpdateUser {
                name: name.to_string(),
                dto,
            })
            .await
    }

    pub async fn remove_user(&self, name: &str) -> AppResult<ActionOutcome> {
        self.context
            .run(HomeRequest::RemoveUser {
                name: name.to_string(),
            })
            .await
    }

    pub async fn update_home(&self, dto: UpdateHomeDto) -> AppResult<ActionOutcome> {
        self.context.run(HomeRequest::UpdateHome(dto)).await
    }
}
