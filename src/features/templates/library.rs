//! テンプレートの保存・適用・削除
//!
//! テンプレート名は大文字小文字を区別せずホーム内で一意。

use super::models::{SaveTemplateDto, Template, TemplateItem};
use crate::features::homes::models::Home;
use crate::features::lists::models::{CreateItemDto, ListType};
use crate::shared::errors::{AppError, AppResult};

/// テンプレートを保存する（同名のテンプレートは置き換える）
///
/// アイテムが指定されない場合は、対象リストのルートアイテムのテキストから作成する。
pub fn save_template(home: &mut Home, dto: SaveTemplateDto) -> AppResult<()> {
    dto.validate()?;

    let created_by = dto.created_by.unwrap_or_default();
    let items: Vec<TemplateItem> = match dto.items {
        Some(items) => items
            .into_iter()
            .map(|item| TemplateItem {
                text: item.text.trim().to_string(),
                created_by: if item.created_by.is_empty() {
                    created_by.clone()
                } else {
                    item.created_by
                },
            })
            .collect(),
        None => home
            .list(dto.list_type)
            .iter()
            .map(|item| TemplateItem {
                text: item.text.clone(),
                created_by: created_by.clone(),
            })
            .collect(),
    };

    if items.is_empty() {
        return Err(AppError::validation("テンプレートにはアイテムが1つ以上必要です"));
    }

    let template = Template {
        name: dto.name.trim().to_string(),
        list_type: dto.list_type,
        items,
    };

    match position(home, &template.name) {
        Some(index) => home.templates[index] = template,
        None => home.templates.push(template),
    }
    Ok(())
}

/// テンプレートのアイテムを対象リストの末尾に追加する
///
/// # 戻り値
/// (追加先のリスト, 追加したアイテム数)
pub fn apply_template(home: &mut Home, name: &str) -> AppResult<(ListType, usize)> {
    let index = position(home, name).ok_or_else(|| AppError::not_found("テンプレート"))?;
    let template = home.templates[index].clone();

    let list = home.list_mut(template.list_type);
    for item in &template.items {
        list.push(CreateItemDto::new(item.text.clone()).into_item());
    }
    Ok((template.list_type, template.items.len()))
}

/// テンプレートを削除する
pub fn delete_template(home: &mut Home, name: &str) -> AppResult<Template> {
    let index = position(home, name).ok_or_else(|| AppError::not_found("テンプレート"))?;
    Ok(home.templates.remove(index))
}

fn position(home: &Home, name: &str) -> Option<usize> {
    let wanted = name.trim().to_lowercase();
    home.templates
        .iter()
        .position(|template| template.name.to_lowercase() == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::homes::normalize::{normalize_home, RawHome};
    use crate::features::lists::models::Item;

    fn home() -> Home {
        normalize_home(RawHome::default(), "₪").0
    }

    fn dto(name: &str, list_type: ListType, items: Option<Vec<&str>>) -> SaveTemplateDto {
        SaveTemplateDto {
            name: name.to_string(),
            list_type,
            items: items.map(|texts| {
                texts
                    .into_iter()
                    .map(|text| TemplateItem {
                        text: text.to_string(),
                        created_by: String::new(),
                    })
                    .collect()
            }),
            created_by: Some("Dana".to_string()),
        }
    }

    #[test]
    fn test_save_from_current_list() {
        let mut home = home();
        home.shopping_list.push(Item::new("a", "Milk"));
        home.shopping_list.push(Item::new("b", "Eggs"));

        save_template(&mut home, dto("Weekly", ListType::Shopping, None)).unwrap();

        let template = &home.templates[0];
        assert_eq!(template.items.len(), 2);
        assert_eq!(template.items[1].text, "Eggs");
        assert_eq!(template.items[1].created_by, "Dana");
    }

    #[test]
    fn test_save_replaces_same_name() {
        let mut home = home();
        save_template(&mut home, dto("Weekly", ListType::Shopping, Some(vec!["Milk"]))).unwrap();
        save_template(&mut home, dto("weekly", ListType::Tasks, Some(vec!["Sweep"]))).unwrap();

        assert_eq!(home.templates.len(), 1);
        assert_eq!(home.templates[0].list_type, ListType::Tasks);
    }

    #[test]
    fn test_save_empty_template_is_rejected() {
        let mut home = home();
        let result = save_template(&mut home, dto("Empty", ListType::Tasks, None));
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_apply_adds_fresh_items() {
        let mut home = home();
        save_template(
            &mut home,
            dto("Cleaning", ListType::Tasks, Some(vec!["Sweep", "Mop"])),
        )
        .unwrap();

        assert_eq!(apply_template(&mut home, "cleaning").unwrap(), (ListType::Tasks, 2));
        assert_eq!(apply_template(&mut home, "Cleaning").unwrap(), (ListType::Tasks, 2));

        assert_eq!(home.tasks_list.len(), 4);
        assert_ne!(home.tasks_list[0].id, home.tasks_list[2].id);
        assert!(home.shopping_list.is_empty());
    }

    #[test]
    fn test_delete_template() {
        let mut home = home();
        save_template(&mut home, dto("Weekly", ListType::Shopping, Some(vec!["Milk"]))).unwrap();

        assert_eq!(delete_template(&mut home, "Weekly").unwrap().name, "Weekly");
        assert!(matches!(
            delete_template(&mut home, "Weekly"),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            apply_template(&mut home, "Weekly"),
            Err(AppError::NotFound(_))
        ));
    }
}
