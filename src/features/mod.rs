/// 機能別モジュール
///
/// 各機能モジュールは、その機能に関連するコード（モデル、純粋なドメイン操作、コマンド）
/// を含む自己完結型のユニットです。
pub mod ai;
pub mod client;
pub mod finances;
pub mod homes;
pub mod lists;
pub mod members;
pub mod server;
pub mod templates;
