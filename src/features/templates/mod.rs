/// テンプレート機能モジュール
///
/// よく使うアイテムの組み合わせを名前付きで保存し、リストへ一括追加する機能を提供します。
pub mod commands;
pub mod library;
pub mod models;

pub use models::{SaveTemplateDto, Template, TemplateItem};
