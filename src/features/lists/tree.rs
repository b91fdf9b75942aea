//! 入れ子アイテムの木に対する純粋な変換関数
//!
//! すべての操作は `rebuild` の上に組み立てられている。
//! 木は値として受け取り、新しい木を返す（隠れた変更はない）。

use super::models::{Item, UpdateItemDto};
use crate::shared::errors::{AppError, AppResult};

/// 訪問したノードをどう扱うか
#[derive(Debug)]
pub enum Visit {
    /// ノードを残し、子アイテムも訪問する
    Descend(Item),
    /// ノードをそのまま残し、子アイテムは訪問しない
    Keep(Item),
    /// ノードを0個以上のノードで置き換える（置き換え後のノードは訪問しない）
    Splice(Vec<Item>),
}

/// 木を先行順（深さ優先）で訪問しながら再構築する
pub fn rebuild<F>(tree: Vec<Item>, visitor: &mut F) -> Vec<Item>
where
    F: FnMut(Item) -> Visit,
{
    let mut result = Vec::with_capacity(tree.len());
    for item in tree {
        match visitor(item) {
            Visit::Descend(mut node) => {
                let children = std::mem::take(&mut node.sub_items);
                node.sub_items = rebuild(children, visitor);
                result.push(node);
            }
            Visit::Keep(node) => result.push(node),
            Visit::Splice(nodes) => result.extend(nodes),
        }
    }
    result
}

/// IDでノードを探す（読み取り専用）
pub fn find_by_id<'a>(tree: &'a [Item], id: &str) -> Option<&'a Item> {
    for item in tree {
        if item.id == id {
            return Some(item);
        }
        if let Some(found) = find_by_id(&item.sub_items, id) {
            return Some(found);
        }
    }
    None
}

/// 木に含まれるすべてのID（先行順）
pub fn collect_ids(tree: &[Item]) -> Vec<String> {
    let mut ids = Vec::new();
    fn walk(items: &[Item], ids: &mut Vec<String>) {
        for item in items {
            ids.push(item.id.clone());
            walk(&item.sub_items, ids);
        }
    }
    walk(tree, &mut ids);
    ids
}

/// IDで見つけた最初のノードに変更を適用する
///
/// # 戻り値
/// (新しい木, 更新後のノード)。見つからない場合はノードが `None` で木は変わらない。
pub fn update_by_id(tree: Vec<Item>, id: &str, patch: &UpdateItemDto) -> (Vec<Item>, Option<Item>) {
    let mut updated: Option<Item> = None;
    let tree = rebuild(tree, &mut |item| {
        if updated.is_some() {
            Visit::Keep(item)
        } else if item.id == id {
            let node = patch.apply(item);
            updated = Some(node.clone());
            Visit::Keep(node)
        } else {
            Visit::Descend(item)
        }
    });
    (tree, updated)
}

/// IDで見つけたノードを部分木ごと取り除く
///
/// # 戻り値
/// (新しい木, 取り除いた部分木)
pub fn remove_by_id(tree: Vec<Item>, id: &str) -> (Vec<Item>, Option<Item>) {
    let mut removed: Option<Item> = None;
    let tree = rebuild(tree, &mut |item| {
        if removed.is_some() {
            Visit::Keep(item)
        } else if item.id == id {
            removed = Some(item);
            Visit::Splice(Vec::new())
        } else {
            Visit::Descend(item)
        }
    });
    (tree, removed)
}

/// 完了済みのノードをすべての階層から取り除く
///
/// 未完了の親は、子がすべて取り除かれても残る。
pub fn filter_completed(tree: Vec<Item>) -> Vec<Item> {
    rebuild(tree, &mut |item| {
        if item.completed {
            Visit::Splice(Vec::new())
        } else {
            Visit::Descend(item)
        }
    })
}

/// ルートにある2つのアイテムを新しいフォルダにまとめ、末尾に追加する
///
/// `dragged_id == target_id` の場合は何もしない。
pub fn group_items(
    tree: Vec<Item>,
    dragged_id: &str,
    target_id: &str,
    folder_id: String,
    folder_name: &str,
) -> AppResult<Vec<Item>> {
    if dragged_id == target_id {
        return Ok(tree);
    }

    let mut dragged = None;
    let mut target = None;
    let mut rest = Vec::with_capacity(tree.len());
    for item in tree {
        if item.id == dragged_id && dragged.is_none() {
            dragged = Some(item);
        } else if item.id == target_id && target.is_none() {
            target = Some(item);
        } else {
            rest.push(item);
        }
    }

    let (dragged, target) = match (dragged, target) {
        (Some(dragged), Some(target)) => (dragged, target),
        _ => return Err(AppError::not_found("グループ化するアイテム")),
    };

    rest.push(Item::folder(
        folder_id,
        folder_name.trim(),
        vec![target, dragged],
    ));
    Ok(rest)
}

/// フォルダを取り除き、直下の子アイテムを元の位置に展開する
pub fn ungroup_folder(tree: Vec<Item>, folder_id: &str) -> AppResult<Vec<Item>> {
    let mut found = false;
    let tree = rebuild(tree, &mut |item| {
        if found {
            Visit::Keep(item)
        } else if item.id == folder_id && item.is_folder() {
            found = true;
            Visit::Splice(item.sub_items)
        } else {
            Visit::Descend(item)
        }
    });

    if found {
        Ok(tree)
    } else {
        Err(AppError::not_found("フォルダ"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;

    fn item(id: &str, text: &str, completed: bool) -> Item {
        let mut item = Item::new(id, text);
        item.completed = completed;
        item
    }

    /// IDが一意な任意の木
    #[derive(Clone, Debug)]
    struct Tree(Vec<Item>);

    impl Arbitrary for Tree {
        fn arbitrary(g: &mut Gen) -> Self {
            let mut next_id = 0u32;
            Tree(arbitrary_level(g, 3, &mut next_id))
        }
    }

    fn arbitrary_level(g: &mut Gen, depth: usize, next_id: &mut u32) -> Vec<Item> {
        let width = usize::arbitrary(g) % 4;
        let mut level = Vec::with_capacity(width);
        for _ in 0..width {
            *next_id += 1;
            let mut node = item(
                &next_id.to_string(),
                &format!("item {next_id}"),
                bool::arbitrary(g),
            );
            node.is_urgent = bool::arbitrary(g);
            if depth > 0 {
                node.sub_items = arbitrary_level(g, depth - 1, next_id);
            }
            level.push(node);
        }
        level
    }

    fn contains_completed(tree: &[Item]) -> bool {
        tree.iter()
            .any(|item| item.completed || contains_completed(&item.sub_items))
    }

    #[quickcheck]
    fn prop_update_after_remove_is_not_found(tree: Tree, pick: usize) -> bool {
        let ids = collect_ids(&tree.0);
        if ids.is_empty() {
            return true;
        }
        let id = &ids[pick % ids.len()];

        let (removed_tree, removed) = remove_by_id(tree.0, id);
        let patch = UpdateItemDto {
            text: Some("changed".to_string()),
            completed: Some(true),
            ..UpdateItemDto::default()
        };
        let (updated_tree, updated) = update_by_id(removed_tree.clone(), id, &patch);

        removed.is_some() && updated.is_none() && updated_tree == removed_tree
    }

    #[quickcheck]
    fn prop_filter_completed_is_idempotent(tree: Tree) -> bool {
        let once = filter_completed(tree.0);
        let twice = filter_completed(once.clone());
        once == twice && !contains_completed(&once)
    }

    #[quickcheck]
    fn prop_remove_drops_whole_subtree(tree: Tree, pick: usize) -> bool {
        let ids = collect_ids(&tree.0);
        if ids.is_empty() {
            return true;
        }
        let id = ids[pick % ids.len()].clone();
        let before = collect_ids(&tree.0).len();

        let (after_tree, removed) = remove_by_id(tree.0, &id);
        let removed = match removed {
            Some(removed) => removed,
            None => return false,
        };

        collect_ids(&after_tree).len() + removed.node_count() == before
            && find_by_id(&after_tree, &id).is_none()
    }

    #[quickcheck]
    fn prop_group_then_ungroup_restores_items(tree: Tree) -> bool {
        if tree.0.len() < 2 {
            return true;
        }
        let target = tree.0[0].clone();
        let dragged = tree.0[1].clone();

        let grouped = match group_items(tree.0, &dragged.id, &target.id, "folder".into(), "F") {
            Ok(grouped) => grouped,
            Err(_) => return false,
        };
        let restored = match ungroup_folder(grouped, "folder") {
            Ok(restored) => restored,
            Err(_) => return false,
        };

        restored.contains(&target)
            && restored.contains(&dragged)
            && find_by_id(&restored, "folder").is_none()
    }

    #[test]
    fn test_update_by_id_finds_nested_node() {
        let tree = vec![
            item("1", "Milk", false),
            Item::folder("2", "Party", vec![item("3", "Cake", false)]),
        ];
        let patch = UpdateItemDto {
            text: Some("Chocolate cake".to_string()),
            ..UpdateItemDto::default()
        };

        let (tree, updated) = update_by_id(tree, "3", &patch);

        assert_eq!(updated.unwrap().text, "Chocolate cake");
        assert_eq!(find_by_id(&tree, "3").unwrap().text, "Chocolate cake");
        assert_eq!(find_by_id(&tree, "1").unwrap().text, "Milk");
    }

    #[test]
    fn test_update_missing_id_returns_none() {
        let tree = vec![item("1", "Milk", false)];
        let (after, updated) = update_by_id(tree.clone(), "404", &UpdateItemDto::default());
        assert!(updated.is_none());
        assert_eq!(after, tree);
    }

    #[test]
    fn test_filter_completed_milk_and_eggs() {
        let tree = vec![item("1", "Milk", false), item("2", "Eggs", true)];

        let filtered = filter_completed(tree);

        assert_eq!(filtered, vec![item("1", "Milk", false)]);
    }

    #[test]
    fn test_filter_completed_keeps_emptied_parent() {
        let tree = vec![Item::folder(
            "p",
            "Weekend",
            vec![item("c1", "Laundry", true), item("c2", "Dishes", true)],
        )];

        let filtered = filter_completed(tree);

        assert_eq!(filtered.len(), 1);
        assert!(filtered[0].sub_items.is_empty());
    }

    #[test]
    fn test_group_items_breakfast() {
        let tree = vec![item("1", "Milk", false), item("2", "Eggs", true)];

        let grouped = group_items(tree, "2", "1", "f".to_string(), "Breakfast").unwrap();

        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].text, "Breakfast");
        assert_eq!(
            grouped[0].sub_items,
            vec![item("1", "Milk", false), item("2", "Eggs", true)]
        );
    }

    #[test]
    fn test_group_same_item_is_noop() {
        let tree = vec![item("1", "Milk", false), item("2", "Eggs", false)];
        let grouped = group_items(tree.clone(), "1", "1", "f".to_string(), "X").unwrap();
        assert_eq!(grouped, tree);
    }

    #[test]
    fn test_group_requires_top_level_items() {
        let tree = vec![
            item("1", "Milk", false),
            Item::folder("2", "Dairy", vec![item("3", "Cheese", false)]),
        ];
        let result = group_items(tree, "3", "1", "f".to_string(), "X");
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_ungroup_keeps_position() {
        let tree = vec![
            item("1", "Milk", false),
            Item::folder(
                "f",
                "Breakfast",
                vec![item("2", "Eggs", false), item("3", "Toast", false)],
            ),
            item("4", "Soap", false),
        ];

        let ungrouped = ungroup_folder(tree, "f").unwrap();
        let ids: Vec<_> = ungrouped.iter().map(|i| i.id.as_str()).collect();

        assert_eq!(ids, vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_ungroup_nested_folder_stays_in_parent() {
        let tree = vec![Item::folder(
            "outer",
            "House",
            vec![Item::folder("inner", "Kitchen", vec![item("x", "Sink", false)])],
        )];

        let ungrouped = ungroup_folder(tree, "inner").unwrap();

        assert_eq!(ungrouped[0].sub_items, vec![item("x", "Sink", false)]);
    }

    #[test]
    fn test_ungroup_plain_item_is_not_found() {
        let tree = vec![item("1", "Milk", false)];
        assert!(matches!(
            ungroup_folder(tree, "1"),
            Err(AppError::NotFound(_))
        ));
    }
}
