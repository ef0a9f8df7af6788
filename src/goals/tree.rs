//! Pure operations over the sub-item forest. A parent exclusively owns its
//! children, so a recursive walk over the `subs` vectors covers every node.

use super::data::{SubId, SubItem, SubRow};

/// Materializes the children of `parent_id` (`None` = direct children of the
/// goal) from flat rows. Siblings are ordered by position; equal positions
/// fall back to insertion order via the id.
pub fn build_sub_tree(rows: &[SubRow], parent_id: Option<SubId>) -> Vec<SubItem> {
    let mut children: Vec<&SubRow> = rows.iter().filter(|r| r.parent_id == parent_id).collect();
    children.sort_by_key(|r| (r.position, r.id));
    children
        .into_iter()
        .map(|r| SubItem {
            id: r.id,
            text: r.text.clone(),
            kind: r.kind,
            checked: r.checked,
            subs: build_sub_tree(rows, Some(r.id)),
        })
        .collect()
}

/// Depth-first search for a node anywhere in the forest; returns the first
/// match.
pub fn find_sub(subs: &[SubItem], id: SubId) -> Option<&SubItem> {
    for sub in subs {
        if sub.id == id {
            return Some(sub);
        }
        if let Some(found) = find_sub(&sub.subs, id) {
            return Some(found);
        }
    }
    None
}
