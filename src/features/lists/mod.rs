/// リスト機能モジュール
///
/// 買い物リスト・タスクリストの入れ子アイテムに関する機能を提供します：
/// - 木構造の汎用的な再構築（`tree`）
/// - アイテムの追加・更新・削除・グループ化（`engine`）
/// - アーカイブへの移動と復元（`archive`）
pub mod archive;
pub mod commands;
pub mod engine;
pub mod models;
pub mod tree;

pub use archive::RemovalKind;
pub use models::{CreateItemDto, GroupItemsDto, Item, ListType, UpdateItemDto};
