//! ホームのメンバー構成を変更する純粋関数
//!
//! ホームには常に1人以上のユーザーと1人以上の管理者がいる。

use super::models::{validate_user_name, AddUserDto, UpdateUserDto};
use crate::features::homes::models::{Home, User};
use crate::features::lists::models::{Item, SHARED_ASSIGNEE};
use crate::features::lists::tree::{rebuild, Visit};
use crate::shared::errors::{AppError, AppResult};

/// ユーザーを追加する（名前は大文字小文字を区別せず一意）
pub fn add_user(home: &mut Home, dto: &AddUserDto) -> AppResult<()> {
    validate_user_name(&dto.name)?;
    if home.find_user(&dto.name).is_some() {
        return Err(AppError::conflict(format!(
            "ユーザー「{}」は既に存在します",
            dto.name.trim()
        )));
    }
    home.users.push(User::new(dto.name.trim(), dto.is_admin));
    Ok(())
}

/// ユーザー名または管理者フラグを更新する
///
/// 名前を変えた場合は、そのユーザーへの割り当てもすべて新しい名前に付け替える。
pub fn update_user(home: &mut Home, name: &str, dto: &UpdateUserDto) -> AppResult<()> {
    let index = user_index(home, name)?;
    let current = home.users[index].name.clone();

    if let Some(ref new_name) = dto.name {
        validate_user_name(new_name)?;
        let taken = home
            .users
            .iter()
            .enumerate()
            .any(|(i, user)| i != index && user.has_name(new_name));
        if taken {
            return Err(AppError::conflict(format!(
                "ユーザー「{}」は既に存在します",
                new_name.trim()
            )));
        }
    }

    if dto.is_admin == Some(false) && home.users[index].is_admin && home.admin_count() == 1 {
        return Err(AppError::conflict("最後の管理者の権限は外せません"));
    }

    if let Some(is_admin) = dto.is_admin {
        home.users[index].is_admin = is_admin;
    }
    if let Some(ref new_name) = dto.name {
        let new_name = new_name.trim().to_string();
        reassign(home, &current, &new_name);
        home.users[index].name = new_name;
    }
    Ok(())
}

/// ユーザーを削除し、その割り当てを `shared` に戻す
pub fn remove_user(home: &mut Home, name: &str) -> AppResult<User> {
    let index = user_index(home, name)?;

    if home.users.len() == 1 {
        return Err(AppError::conflict("最後のユーザーは削除できません"));
    }
    if home.users[index].is_admin && home.admin_count() == 1 {
        return Err(AppError::conflict("最後の管理者は削除できません"));
    }

    let removed = home.users.remove(index);
    reassign(home, &removed.name, SHARED_ASSIGNEE);
    Ok(removed)
}

fn user_index(home: &Home, name: &str) -> AppResult<usize> {
    home.users
        .iter()
        .position(|user| user.has_name(name))
        .ok_or_else(|| AppError::not_found("ユーザー"))
}

/// 担当者の付け替え（リスト・アーカイブ・家計のすべて）
fn reassign(home: &mut Home, from: &str, to: &str) {
    let mut visitor = |mut item: Item| {
        if item.assigned_to == from {
            item.assigned_to = to.to_string();
        }
        Visit::Descend(item)
    };
    home.shopping_list = rebuild(std::mem::take(&mut home.shopping_list), &mut visitor);
    home.tasks_list = rebuild(std::mem::take(&mut home.tasks_list), &mut visitor);
    home.archived_items = rebuild(std::mem::take(&mut home.archived_items), &mut visitor);

    let finances = &mut home.finances;
    for bill in &mut finances.expected_bills {
        if bill.assigned_to == from {
            bill.assigned_to = to.to_string();
        }
    }
    for bill in &mut finances.paid_bills {
        if bill.assigned_to == from {
            bill.assigned_to = to.to_string();
        }
    }
    for income in &mut finances.income {
        if income.assigned_to == from {
            income.assigned_to = to.to_string();
        }
    }
}
