/// ホーム機能モジュール
///
/// 世帯の集約（ホーム）の作成・認証・取得・更新と、
/// 保存済みドキュメントの正規化を提供します。
pub mod access_code;
pub mod commands;
pub mod models;
pub mod normalize;
pub mod repository;

pub use models::{CreateHomeDto, Home, LoginDto, UpdateHomeDto, User};
pub use normalize::{normalize_home, NormalizationReport, Provenance, RawHome};
