use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{ApiError, ApiResult};

use super::data::*;
use super::markdown;
use super::tree;

pub const MAX_TEXT_LEN: usize = 100;

/// Trims and bounds user-entered text. Interactive creates and renames go
/// through this; pasted markdown deliberately does not (decoding never
/// rejects input).
fn validate_text(text: &str) -> ApiResult<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("text must not be empty"));
    }
    if trimmed.chars().count() > MAX_TEXT_LEN {
        return Err(ApiError::validation("text is too long"));
    }
    Ok(trimmed.to_string())
}

fn sub_rows_for_goal(connection: &Connection, goal_id: GoalId) -> ApiResult<Vec<SubRow>> {
    let mut statement = connection.prepare(
        "SELECT id, parent_id, kind, text, checked, position FROM sub_items WHERE goal_id = ?1",
    )?;
    let rows = statement.query_map(params![goal_id], |row| {
        Ok(SubRow {
            id: row.get(0)?,
            parent_id: row.get(1)?,
            kind: SubKind::parse(&row.get::<_, String>(2)?),
            text: row.get(3)?,
            checked: row.get(4)?,
            position: row.get(5)?,
        })
    })?;

    let mut sub_rows = Vec::new();
    for row in rows {
        sub_rows.push(row?);
    }
    Ok(sub_rows)
}

fn sub_tree_for_goal(connection: &Connection, goal_id: GoalId) -> ApiResult<Vec<SubItem>> {
    let rows = sub_rows_for_goal(connection, goal_id)?;
    Ok(tree::build_sub_tree(&rows, None))
}

/// Goals for one week, sorted by position (insertion order breaks ties), each
/// with its full sub-tree materialized. An unknown week is an empty list, not
/// an error.
pub fn goals_for_week(connection: &Connection, user_id: i64, week_key: &str) -> ApiResult<Vec<Goal>> {
    let mut statement = connection.prepare(
        "SELECT id, text, checked FROM goals
         WHERE user_id = ?1 AND week_key = ?2
         ORDER BY position ASC, id ASC",
    )?;
    let rows = statement.query_map(params![user_id, week_key], |row| {
        Ok((
            row.get::<_, GoalId>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, bool>(2)?,
        ))
    })?;

    let mut bare = Vec::new();
    for row in rows {
        bare.push(row?);
    }

    let mut goals = Vec::new();
    for (id, text, checked) in bare {
        goals.push(Goal {
            id,
            text,
            checked,
            subs: sub_tree_for_goal(connection, id)?,
        });
    }
    Ok(goals)
}

/// Single goal with its sub-tree; NotFound covers both unknown ids and goals
/// owned by someone else.
pub fn get_goal(connection: &Connection, user_id: i64, id: GoalId) -> ApiResult<Goal> {
    let bare = connection
        .query_row(
            "SELECT text, checked FROM goals WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?)),
        )
        .optional()?;

    match bare {
        Some((text, checked)) => Ok(Goal {
            id,
            text,
            checked,
            subs: sub_tree_for_goal(connection, id)?,
        }),
        None => Err(ApiError::NotFound),
    }
}

fn goal_count_for_week(connection: &Connection, user_id: i64, week_key: &str) -> ApiResult<i64> {
    let count = connection.query_row(
        "SELECT COUNT(*) FROM goals WHERE user_id = ?1 AND week_key = ?2",
        params![user_id, week_key],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn add_goal(
    connection: &Connection,
    user_id: i64,
    week_key: &str,
    text: &str,
) -> ApiResult<Goal> {
    let text = validate_text(text)?;
    if crate::week::parse_week_key(week_key).is_none() {
        return Err(ApiError::validation("week key must be a YYYY-MM-DD date"));
    }

    let position = goal_count_for_week(connection, user_id, week_key)?;
    connection.execute(
        "INSERT INTO goals (user_id, week_key, text, checked, position) VALUES (?1, ?2, ?3, 0, ?4)",
        params![user_id, week_key, text, position],
    )?;

    Ok(Goal {
        id: connection.last_insert_rowid(),
        text,
        checked: false,
        subs: Vec::new(),
    })
}

/// Partial update: rename and/or set checked. Renaming to the current text is
/// a no-op and executes no UPDATE.
pub fn update_goal(
    connection: &Connection,
    user_id: i64,
    id: GoalId,
    update: &UpdateRequest,
) -> ApiResult<Goal> {
    let current = connection
        .query_row(
            "SELECT text, checked FROM goals WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?)),
        )
        .optional()?
        .ok_or(ApiError::NotFound)?;

    if let Some(text) = &update.text {
        let text = validate_text(text)?;
        if text != current.0 {
            connection.execute(
                "UPDATE goals SET text = ?1 WHERE id = ?2",
                params![text, id],
            )?;
        }
    }
    if let Some(checked) = update.checked {
        if checked != current.1 {
            connection.execute(
                "UPDATE goals SET checked = ?1 WHERE id = ?2",
                params![checked, id],
            )?;
        }
    }

    get_goal(connection, user_id, id)
}

/// Flips a goal's checked state.
pub fn toggle_goal(connection: &Connection, user_id: i64, id: GoalId) -> ApiResult<Goal> {
    let current = get_goal(connection, user_id, id)?;
    update_goal(
        connection,
        user_id,
        id,
        &UpdateRequest {
            text: None,
            checked: Some(!current.checked),
        },
    )
}

/// Deletes a goal and its entire sub-item tree. Positions of the remaining
/// goals are left untouched.
pub fn delete_goal(connection: &Connection, user_id: i64, id: GoalId) -> ApiResult<()> {
    let affected = connection.execute(
        "DELETE FROM goals WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    if affected == 0 {
        return Err(ApiError::NotFound);
    }
    connection.execute("DELETE FROM sub_items WHERE goal_id = ?1", params![id])?;
    Ok(())
}

/// Appends a sub-item under `parent_sub_id`, or directly under the goal when
/// no parent is given. The parent must belong to the same goal.
pub fn add_sub_item(
    connection: &Connection,
    user_id: i64,
    goal_id: GoalId,
    text: &str,
    kind: SubKind,
    parent_sub_id: Option<SubId>,
) -> ApiResult<SubItem> {
    let text = validate_text(text)?;

    let owned: Option<i64> = connection
        .query_row(
            "SELECT id FROM goals WHERE id = ?1 AND user_id = ?2",
            params![goal_id, user_id],
            |row| row.get(0),
        )
        .optional()?;
    if owned.is_none() {
        return Err(ApiError::NotFound);
    }

    let position: i64 = match parent_sub_id {
        Some(parent_id) => {
            let parent_goal: Option<GoalId> = connection
                .query_row(
                    "SELECT goal_id FROM sub_items WHERE id = ?1",
                    params![parent_id],
                    |row| row.get(0),
                )
                .optional()?;
            if parent_goal != Some(goal_id) {
                return Err(ApiError::NotFound);
            }
            connection.query_row(
                "SELECT COUNT(*) FROM sub_items WHERE parent_id = ?1",
                params![parent_id],
                |row| row.get(0),
            )?
        }
        None => connection.query_row(
            "SELECT COUNT(*) FROM sub_items WHERE goal_id = ?1 AND parent_id IS NULL",
            params![goal_id],
            |row| row.get(0),
        )?,
    };

    connection.execute(
        "INSERT INTO sub_items (goal_id, parent_id, kind, text, checked, position)
         VALUES (?1, ?2, ?3, ?4, 0, ?5)",
        params![goal_id, parent_sub_id, kind.as_str(), text, position],
    )?;

    Ok(SubItem {
        id: connection.last_insert_rowid(),
        text,
        kind,
        checked: false,
        subs: Vec::new(),
    })
}

/// Resolves a sub-item through its goal's owner; a foreign or unknown id is
/// NotFound either way.
fn owned_sub(
    connection: &Connection,
    user_id: i64,
    sub_id: SubId,
) -> ApiResult<(GoalId, String, SubKind, bool)> {
    connection
        .query_row(
            "SELECT s.goal_id, s.text, s.kind, s.checked
             FROM sub_items s JOIN goals g ON g.id = s.goal_id
             WHERE s.id = ?1 AND g.user_id = ?2",
            params![sub_id, user_id],
            |row| {
                Ok((
                    row.get::<_, GoalId>(0)?,
                    row.get::<_, String>(1)?,
                    SubKind::parse(&row.get::<_, String>(2)?),
                    row.get::<_, bool>(3)?,
                ))
            },
        )
        .optional()?
        .ok_or(ApiError::NotFound)
}

pub fn update_sub_item(
    connection: &Connection,
    user_id: i64,
    sub_id: SubId,
    update: &UpdateRequest,
) -> ApiResult<SubItem> {
    let (goal_id, current_text, _, current_checked) = owned_sub(connection, user_id, sub_id)?;

    if let Some(text) = &update.text {
        let text = validate_text(text)?;
        if text != current_text {
            connection.execute(
                "UPDATE sub_items SET text = ?1 WHERE id = ?2",
                params![text, sub_id],
            )?;
        }
    }
    if let Some(checked) = update.checked {
        if checked != current_checked {
            connection.execute(
                "UPDATE sub_items SET checked = ?1 WHERE id = ?2",
                params![checked, sub_id],
            )?;
        }
    }

    let forest = sub_tree_for_goal(connection, goal_id)?;
    tree::find_sub(&forest, sub_id)
        .cloned()
        .ok_or(ApiError::NotFound)
}

/// Flips a sub-item's checked state.
pub fn toggle_sub_item(connection: &Connection, user_id: i64, sub_id: SubId) -> ApiResult<SubItem> {
    let (_, _, _, checked) = owned_sub(connection, user_id, sub_id)?;
    update_sub_item(
        connection,
        user_id,
        sub_id,
        &UpdateRequest {
            text: None,
            checked: Some(!checked),
        },
    )
}

fn collect_subtree_ids(connection: &Connection, sub_id: SubId, ids: &mut Vec<SubId>) -> ApiResult<()> {
    ids.push(sub_id);
    let mut statement = connection.prepare("SELECT id FROM sub_items WHERE parent_id = ?1")?;
    let children = statement.query_map(params![sub_id], |row| row.get::<_, SubId>(0))?;

    let mut child_ids = Vec::new();
    for child in children {
        child_ids.push(child?);
    }
    for child_id in child_ids {
        collect_subtree_ids(connection, child_id, ids)?;
    }
    Ok(())
}

/// Deletes a sub-item and every descendant. Sibling positions are not
/// renumbered; ordering stays stable through the (position, id) sort.
pub fn delete_sub_item(connection: &Connection, user_id: i64, sub_id: SubId) -> ApiResult<()> {
    owned_sub(connection, user_id, sub_id)?;

    let mut ids = Vec::new();
    collect_subtree_ids(connection, sub_id, &mut ids)?;
    for id in ids {
        connection.execute("DELETE FROM sub_items WHERE id = ?1", params![id])?;
    }
    Ok(())
}

fn insert_pasted_subs(
    connection: &Connection,
    goal_id: GoalId,
    parent_id: Option<SubId>,
    subs: &[PastedSub],
) -> ApiResult<()> {
    for (position, sub) in subs.iter().enumerate() {
        connection.execute(
            "INSERT INTO sub_items (goal_id, parent_id, kind, text, checked, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                goal_id,
                parent_id,
                sub.kind.as_str(),
                sub.text,
                sub.checked,
                position as i64
            ],
        )?;
        let id = connection.last_insert_rowid();
        insert_pasted_subs(connection, goal_id, Some(id), &sub.subs)?;
    }
    Ok(())
}

/// Parses pasted markdown and appends the decoded goals after the week's
/// existing ones, assigning fresh ids throughout. Zero decoded goals inserts
/// nothing and reports `Empty`.
pub fn import_goals(
    connection: &Connection,
    user_id: i64,
    week_key: &str,
    markdown_text: &str,
) -> ApiResult<(ImportStatus, Vec<Goal>)> {
    if crate::week::parse_week_key(week_key).is_none() {
        return Err(ApiError::validation("week key must be a YYYY-MM-DD date"));
    }

    let pasted = markdown::decode(markdown_text);
    if pasted.is_empty() {
        return Ok((ImportStatus::Empty, goals_for_week(connection, user_id, week_key)?));
    }

    let existing = goal_count_for_week(connection, user_id, week_key)?;
    for (i, goal) in pasted.iter().enumerate() {
        connection.execute(
            "INSERT INTO goals (user_id, week_key, text, checked, position) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![user_id, week_key, goal.text, goal.checked, existing + i as i64],
        )?;
        let goal_id = connection.last_insert_rowid();
        insert_pasted_subs(connection, goal_id, None, &goal.subs)?;
    }

    Ok((ImportStatus::Ok, goals_for_week(connection, user_id, week_key)?))
}

/// Renders the week's forest as clipboard markdown.
pub fn export_week(connection: &Connection, user_id: i64, week_key: &str) -> ApiResult<String> {
    let monday = crate::week::parse_week_key(week_key)
        .ok_or_else(|| ApiError::validation("week key must be a YYYY-MM-DD date"))?;
    let goals = goals_for_week(connection, user_id, week_key)?;
    Ok(markdown::encode_week(monday, &goals))
}
