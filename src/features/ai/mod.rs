/// AI補助機能モジュール
///
/// 自由入力のテキスト（レシピ・大きなタスク）を入れ子のアイテムに変換し、
/// 対応するリストへ追加します。
pub mod commands;
pub mod generator;

pub use generator::{
    generator_from_config, AiPrompt, DisabledGenerator, GeneratedNode, HttpItemTreeGenerator,
    ItemTreeGenerator, PromptKind,
};
