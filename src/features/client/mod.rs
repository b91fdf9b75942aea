/// クライアント側の状態管理モジュール
///
/// サーバーが正とするホームをローカルに保持し、楽観的に更新します。
/// 協調オブジェクト（API・通知・確認）はすべてコンストラクタで受け取ります。
pub mod actions;
pub mod api_client;
pub mod display;
pub mod notify;
pub mod persistence;
pub mod request;
pub mod session;
pub mod store;

pub use actions::{ActionContext, ActionOutcome, FinanceActions, ListActions, MemberActions};
pub use api_client::{HomeApi, HttpHomeApi, InProcessHomeApi};
pub use display::{sort_bills, sort_items, SortKey};
pub use notify::{AlwaysConfirm, ConfirmationGate, LogNotifier, Notification, NotificationLevel, Notifier};
pub use persistence::{PersistedState, StateFile};
pub use request::{ApiRoute, HomeRequest};
pub use session::SessionStore;
pub use store::{HomeStore, LoadingGuard, Snapshot};
