/// メンバー機能モジュール
///
/// ホームのユーザー追加・更新・削除と、最後のユーザー／管理者の保護を提供します。
pub mod commands;
pub mod models;
pub mod roster;

pub use models::{AddUserDto, UpdateUserDto};
