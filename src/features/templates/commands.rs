use super::library;
use super::models::SaveTemplateDto;
use crate::features::homes::commands::mutate_home;
use crate::features::homes::models::Home;
use crate::shared::errors::AppResult;
use crate::AppState;

/// テンプレートを保存する
pub fn save_template(state: &AppState, home_id: &str, dto: SaveTemplateDto) -> AppResult<Home> {
    mutate_home(state, home_id, |home| {
        let name = dto.name.trim().to_string();
        library::save_template(home, dto)?;
        log::info!("テンプレートを保存しました: home={}, template={name}", home.id);
        Ok(())
    })
}

/// テンプレートを対象リストに適用する
pub fn apply_template(state: &AppState, home_id: &str, name: &str) -> AppResult<Home> {
    mutate_home(state, home_id, |home| {
        let (list_type, count) = library::apply_template(home, name)?;
        log::info!(
            "テンプレートを適用しました: home={}, template={name}, list={list_type}, items={count}",
            home.id
        );
        Ok(())
    })
}

/// テンプレートを削除する
pub fn delete_template(state: &AppState, home_id: &str, name: &str) -> AppResult<Home> {
    mutate_home(state, home_id, |home| {
        library::delete_template(home, name)?;
        log::info!("テンプレートを削除しました: home={}, template={name}", home.id);
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::lists::models::ListType;
    use crate::features::templates::models::TemplateItem;
    use crate::{create_test_home, test_state};

    #[test]
    fn test_save_and_apply_are_persisted() {
        let state = test_state();
        let home = create_test_home(&state, "Levi");

        save_template(
            &state,
            &home.id,
            SaveTemplateDto {
                name: "Weekly".to_string(),
                list_type: ListType::Shopping,
                items: Some(vec![TemplateItem {
                    text: "Milk".to_string(),
                    created_by: "Dana".to_string(),
                }]),
                created_by: None,
            },
        )
        .unwrap();

        let applied = apply_template(&state, &home.id, "weekly").unwrap();
        assert_eq!(applied.shopping_list.len(), 1);
        assert_eq!(applied.shopping_list[0].text, "Milk");

        let deleted = delete_template(&state, &home.id, "Weekly").unwrap();
        assert!(deleted.templates.is_empty());
        assert_eq!(deleted.shopping_list.len(), 1);
    }
}
