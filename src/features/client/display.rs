//! 表示用の並べ替え
//!
//! 緊急のものを先に、その後は選んだキーで並べる。安定ソートなので同順位は
//! 保存された順序を保ち、元のリストは変更しない。

use crate::features::finances::models::ExpectedBill;
use crate::features::lists::models::Item;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// アイテムの並べ替えキー
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    /// 追加された順
    #[default]
    Manual,
    Text,
    Category,
    AssignedTo,
    /// 未完了を先に
    Completed,
}

fn compare_by(key: SortKey, a: &Item, b: &Item) -> Ordering {
    match key {
        SortKey::Manual => Ordering::Equal,
        SortKey::Text => a.text.to_lowercase().cmp(&b.text.to_lowercase()),
        SortKey::Category => a.category.to_lowercase().cmp(&b.category.to_lowercase()),
        SortKey::AssignedTo => a.assigned_to.to_lowercase().cmp(&b.assigned_to.to_lowercase()),
        SortKey::Completed => a.completed.cmp(&b.completed),
    }
}

/// 表示順に並べた複製を返す（子アイテムも各階層で並べる）
pub fn sort_items(items: &[Item], key: SortKey) -> Vec<Item> {
    let mut sorted: Vec<Item> = items
        .iter()
        .map(|item| Item {
            sub_items: sort_items(&item.sub_items, key),
            ..item.clone()
        })
        .collect();
    sorted.sort_by(|a, b| b.is_urgent.cmp(&a.is_urgent).then_with(|| compare_by(key, a, b)));
    sorted
}

/// 支払い予定を緊急のもの、期日の近いものの順に並べる
pub fn sort_bills(bills: &[ExpectedBill]) -> Vec<&ExpectedBill> {
    let mut sorted: Vec<&ExpectedBill> = bills.iter().collect();
    sorted.sort_by(|a, b| {
        b.is_urgent
            .cmp(&a.is_urgent)
            .then_with(|| a.due_date.cmp(&b.due_date))
    });
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, text: &str, urgent: bool) -> Item {
        Item {
            is_urgent: urgent,
            ..Item::new(id, text)
        }
    }

    fn ids(items: &[Item]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_urgent_first_then_insertion_order() {
        let items = vec![
            item("1", "Milk", false),
            item("2", "Bread", true),
            item("3", "Apples", false),
            item("4", "Eggs", true),
        ];

        let sorted = sort_items(&items, SortKey::Manual);

        assert_eq!(ids(&sorted), vec!["2", "4", "1", "3"]);
        // 元の順序は変わらない
        assert_eq!(ids(&items), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_sort_by_text_is_stable_and_nested() {
        let items = vec![
            Item::folder(
                "f",
                "Dairy",
                vec![item("a", "yogurt", false), item("b", "Butter", false)],
            ),
            item("1", "apples", false),
            item("2", "Apples", false),
        ];

        let sorted = sort_items(&items, SortKey::Text);

        assert_eq!(ids(&sorted), vec!["1", "2", "f"]);
        assert_eq!(ids(&sorted[2].sub_items), vec!["b", "a"]);
    }

    #[test]
    fn test_completed_last() {
        let mut done = item("1", "Milk", false);
        done.completed = true;
        let items = vec![done, item("2", "Eggs", false)];

        let sorted = sort_items(&items, SortKey::Completed);
        assert_eq!(ids(&sorted), vec!["2", "1"]);
    }
}
