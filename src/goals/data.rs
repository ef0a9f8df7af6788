use serde::{Deserialize, Serialize};

pub type GoalId = i64;
pub type SubId = i64;

/// Sub-items are either checkboxes or plain list entries. The kind is fixed
/// at creation and never changes afterwards.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubKind {
    Checkbox,
    List,
}

impl SubKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SubKind::Checkbox => "checkbox",
            SubKind::List => "list",
        }
    }

    /// Unknown stored values fall back to checkbox, the creation default.
    pub fn parse(value: &str) -> SubKind {
        match value {
            "list" => SubKind::List,
            _ => SubKind::Checkbox,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SubItem {
    pub id: SubId,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: SubKind,
    pub checked: bool,
    pub subs: Vec<SubItem>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Goal {
    pub id: GoalId,
    pub text: String,
    pub checked: bool,
    pub subs: Vec<SubItem>,
}

/// Flat persistence row for a sub-item; the nested tree is rebuilt from these
/// by `tree::build_sub_tree`.
#[derive(Debug, Clone)]
pub struct SubRow {
    pub id: SubId,
    pub parent_id: Option<SubId>,
    pub kind: SubKind,
    pub text: String,
    pub checked: bool,
    pub position: i64,
}

/// Goal decoded from pasted markdown. Ids are assigned on persistence, order
/// is the order of appearance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PastedGoal {
    pub text: String,
    pub checked: bool,
    pub subs: Vec<PastedSub>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PastedSub {
    pub text: String,
    pub kind: SubKind,
    pub checked: bool,
    pub subs: Vec<PastedSub>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateGoalRequest {
    pub text: String,
    pub week_key: String,
}

/// Partial update shared by goals and sub-items; absent fields are left
/// untouched.
#[derive(Deserialize, Debug)]
pub struct UpdateRequest {
    pub text: Option<String>,
    pub checked: Option<bool>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubRequest {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: Option<SubKind>,
    pub parent_sub_id: Option<SubId>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    pub week_key: String,
    pub markdown: String,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    Ok,
    Empty,
}

#[derive(Serialize, Debug)]
pub struct ImportResponse {
    pub status: ImportStatus,
    pub goals: Vec<Goal>,
}

#[derive(Serialize, Debug)]
pub struct OkResponse {
    pub ok: bool,
}
