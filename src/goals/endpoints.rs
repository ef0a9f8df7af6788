use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{delete, get, patch, post, State};

use crate::auth::data::AuthUser;
use crate::data::DBConnection;
use crate::error::ApiResult;
use crate::week;

use super::data::*;
use super::helpers;

/// Explicit week key wins; otherwise the key is derived from the offset
/// relative to the current week (0 = this week).
fn resolve_week_key(week_key: Option<String>, offset: Option<i64>) -> String {
    match week_key.filter(|key| !key.is_empty()) {
        Some(key) => key,
        None => week::week_key(offset.unwrap_or(0)),
    }
}

#[get("/?<week_key>&<offset>")]
pub fn list_goals(
    user: AuthUser,
    week_key: Option<String>,
    offset: Option<i64>,
    db_connection: &State<DBConnection>,
) -> ApiResult<Json<Vec<Goal>>> {
    let connection = db_connection.lock()?;
    let key = resolve_week_key(week_key, offset);
    Ok(Json(helpers::goals_for_week(&connection, user.id, &key)?))
}

#[post("/", format = "json", data = "<request>")]
pub fn create_goal(
    user: AuthUser,
    request: Json<CreateGoalRequest>,
    db_connection: &State<DBConnection>,
) -> ApiResult<(Status, Json<Goal>)> {
    let connection = db_connection.lock()?;
    let goal = helpers::add_goal(&connection, user.id, &request.week_key, &request.text)?;
    Ok((Status::Created, Json(goal)))
}

#[patch("/<id>", format = "json", data = "<request>")]
pub fn update_goal(
    user: AuthUser,
    id: GoalId,
    request: Json<UpdateRequest>,
    db_connection: &State<DBConnection>,
) -> ApiResult<Json<Goal>> {
    let connection = db_connection.lock()?;
    Ok(Json(helpers::update_goal(
        &connection,
        user.id,
        id,
        &request,
    )?))
}

#[post("/<id>/toggle")]
pub fn toggle_goal(
    user: AuthUser,
    id: GoalId,
    db_connection: &State<DBConnection>,
) -> ApiResult<Json<Goal>> {
    let connection = db_connection.lock()?;
    Ok(Json(helpers::toggle_goal(&connection, user.id, id)?))
}

#[delete("/<id>")]
pub fn delete_goal(
    user: AuthUser,
    id: GoalId,
    db_connection: &State<DBConnection>,
) -> ApiResult<Json<OkResponse>> {
    let connection = db_connection.lock()?;
    helpers::delete_goal(&connection, user.id, id)?;
    Ok(Json(OkResponse { ok: true }))
}

#[post("/<goal_id>/subs", format = "json", data = "<request>")]
pub fn create_sub_item(
    user: AuthUser,
    goal_id: GoalId,
    request: Json<CreateSubRequest>,
    db_connection: &State<DBConnection>,
) -> ApiResult<(Status, Json<SubItem>)> {
    let connection = db_connection.lock()?;
    let sub = helpers::add_sub_item(
        &connection,
        user.id,
        goal_id,
        &request.text,
        request.kind.unwrap_or(SubKind::Checkbox),
        request.parent_sub_id,
    )?;
    Ok((Status::Created, Json(sub)))
}

#[patch("/subs/<id>", format = "json", data = "<request>")]
pub fn update_sub_item(
    user: AuthUser,
    id: SubId,
    request: Json<UpdateRequest>,
    db_connection: &State<DBConnection>,
) -> ApiResult<Json<SubItem>> {
    let connection = db_connection.lock()?;
    Ok(Json(helpers::update_sub_item(
        &connection,
        user.id,
        id,
        &request,
    )?))
}

#[post("/subs/<id>/toggle")]
pub fn toggle_sub_item(
    user: AuthUser,
    id: SubId,
    db_connection: &State<DBConnection>,
) -> ApiResult<Json<SubItem>> {
    let connection = db_connection.lock()?;
    Ok(Json(helpers::toggle_sub_item(&connection, user.id, id)?))
}

#[delete("/subs/<id>")]
pub fn delete_sub_item(
    user: AuthUser,
    id: SubId,
    db_connection: &State<DBConnection>,
) -> ApiResult<Json<OkResponse>> {
    let connection = db_connection.lock()?;
    helpers::delete_sub_item(&connection, user.id, id)?;
    Ok(Json(OkResponse { ok: true }))
}

#[get("/export?<week_key>&<offset>")]
pub fn export_goals(
    user: AuthUser,
    week_key: Option<String>,
    offset: Option<i64>,
    db_connection: &State<DBConnection>,
) -> ApiResult<String> {
    let connection = db_connection.lock()?;
    let key = resolve_week_key(week_key, offset);
    helpers::export_week(&connection, user.id, &key)
}

#[post("/import", format = "json", data = "<request>")]
pub fn import_goals(
    user: AuthUser,
    request: Json<ImportRequest>,
    db_connection: &State<DBConnection>,
) -> ApiResult<Json<ImportResponse>> {
    let connection = db_connection.lock()?;
    let (status, goals) =
        helpers::import_goals(&connection, user.id, &request.week_key, &request.markdown)?;
    Ok(Json(ImportResponse { status, goals }))
}

#[cfg(test)]
mod tests {
    use rocket::http::{ContentType, Status};
    use serde_json::Value;

    use crate::test_support::{authed, register_user, test_client};

    const WEEK: &str = "2025-01-06";

    #[test]
    fn goal_lifecycle_over_http() {
        let client = test_client();
        let token = register_user(&client, "alice", "password1");

        let response = authed(client.post("/api/goals"), &token)
            .header(ContentType::JSON)
            .body(format!(r#"{{"text":"Finish report","weekKey":"{}"}}"#, WEEK))
            .dispatch();
        assert_eq!(response.status(), Status::Created);
        let goal: Value = response.into_json().unwrap();
        assert_eq!(goal["text"], "Finish report");
        assert_eq!(goal["checked"], false);
        let goal_id = goal["id"].as_i64().unwrap();

        let response = authed(
            client.patch(format!("/api/goals/{}", goal_id)),
            &token,
        )
        .header(ContentType::JSON)
        .body(r#"{"checked":true}"#)
        .dispatch();
        assert_eq!(response.status(), Status::Ok);
        let patched: Value = response.into_json().unwrap();
        assert_eq!(patched["checked"], true);

        let response = authed(
            client.post(format!("/api/goals/{}/toggle", goal_id)),
            &token,
        )
        .dispatch();
        assert_eq!(response.status(), Status::Ok);
        let toggled: Value = response.into_json().unwrap();
        assert_eq!(toggled["checked"], false);

        let response = authed(
            client.get(format!("/api/goals?week_key={}", WEEK)),
            &token,
        )
        .dispatch();
        let listed: Value = response.into_json().unwrap();
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let response = authed(
            client.delete(format!("/api/goals/{}", goal_id)),
            &token,
        )
        .dispatch();
        assert_eq!(response.status(), Status::Ok);

        let response = authed(
            client.delete(format!("/api/goals/{}", goal_id)),
            &token,
        )
        .dispatch();
        assert_eq!(response.status(), Status::NotFound);
    }

    #[test]
    fn sub_items_nest_over_http() {
        let client = test_client();
        let token = register_user(&client, "alice", "password1");

        let goal: Value = authed(client.post("/api/goals"), &token)
            .header(ContentType::JSON)
            .body(format!(r#"{{"text":"Read book","weekKey":"{}"}}"#, WEEK))
            .dispatch()
            .into_json()
            .unwrap();
        let goal_id = goal["id"].as_i64().unwrap();

        let chapter: Value = authed(
            client.post(format!("/api/goals/{}/subs", goal_id)),
            &token,
        )
        .header(ContentType::JSON)
        .body(r#"{"text":"Chapter 1"}"#)
        .dispatch()
        .into_json()
        .unwrap();
        assert_eq!(chapter["type"], "checkbox");
        let chapter_id = chapter["id"].as_i64().unwrap();

        let notes: Value = authed(
            client.post(format!("/api/goals/{}/subs", goal_id)),
            &token,
        )
        .header(ContentType::JSON)
        .body(format!(
            r#"{{"text":"Notes","type":"list","parentSubId":{}}}"#,
            chapter_id
        ))
        .dispatch()
        .into_json()
        .unwrap();
        assert_eq!(notes["type"], "list");

        let response = authed(
            client.post(format!("/api/goals/subs/{}/toggle", chapter_id)),
            &token,
        )
        .dispatch();
        assert_eq!(response.status(), Status::Ok);
        let toggled: Value = response.into_json().unwrap();
        assert_eq!(toggled["checked"], true);
        assert_eq!(toggled["subs"][0]["text"], "Notes");

        let listed: Value = authed(
            client.get(format!("/api/goals?week_key={}", WEEK)),
            &token,
        )
        .dispatch()
        .into_json()
        .unwrap();
        let subs = listed[0]["subs"].as_array().unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0]["subs"][0]["text"], "Notes");

        let response = authed(
            client.delete(format!("/api/goals/subs/{}", chapter_id)),
            &token,
        )
        .dispatch();
        assert_eq!(response.status(), Status::Ok);

        let listed: Value = authed(
            client.get(format!("/api/goals?week_key={}", WEEK)),
            &token,
        )
        .dispatch()
        .into_json()
        .unwrap();
        assert!(listed[0]["subs"].as_array().unwrap().is_empty());
    }

    #[test]
    fn users_cannot_touch_each_others_goals() {
        let client = test_client();
        let alice = register_user(&client, "alice", "password1");
        let mallory = register_user(&client, "mallory", "password2");

        let goal: Value = authed(client.post("/api/goals"), &alice)
            .header(ContentType::JSON)
            .body(format!(r#"{{"text":"secret","weekKey":"{}"}}"#, WEEK))
            .dispatch()
            .into_json()
            .unwrap();
        let goal_id = goal["id"].as_i64().unwrap();

        let response = authed(
            client.patch(format!("/api/goals/{}", goal_id)),
            &mallory,
        )
        .header(ContentType::JSON)
        .body(r#"{"checked":true}"#)
        .dispatch();
        assert_eq!(response.status(), Status::NotFound);

        let listed: Value = authed(
            client.get(format!("/api/goals?week_key={}", WEEK)),
            &mallory,
        )
        .dispatch()
        .into_json()
        .unwrap();
        assert!(listed.as_array().unwrap().is_empty());
    }

    #[test]
    fn goals_require_authentication() {
        let client = test_client();
        let response = client.get("/api/goals?week_key=2025-01-06").dispatch();
        assert_eq!(response.status(), Status::Unauthorized);
        let body: Value = response.into_json().unwrap();
        assert_eq!(body["error"], "Unauthorized");
    }

    #[test]
    fn import_and_export_round_trip_over_http() {
        let client = test_client();
        let token = register_user(&client, "alice", "password1");

        let response = authed(client.post("/api/goals/import"), &token)
            .header(ContentType::JSON)
            .body(format!(
                r#"{{"weekKey":"{}","markdown":"- [ ] Read book\n  - [x] Chapter 1\n  - Outline\n"}}"#,
                WEEK
            ))
            .dispatch();
        assert_eq!(response.status(), Status::Ok);
        let imported: Value = response.into_json().unwrap();
        assert_eq!(imported["status"], "ok");
        assert_eq!(imported["goals"][0]["subs"][0]["checked"], true);

        let response = authed(
            client.get(format!("/api/goals/export?week_key={}", WEEK)),
            &token,
        )
        .dispatch();
        assert_eq!(response.status(), Status::Ok);
        let exported = response.into_string().unwrap();
        assert!(exported.contains("- [ ] Read book\n  - [x] Chapter 1\n  - Outline\n"));

        let response = authed(client.post("/api/goals/import"), &token)
            .header(ContentType::JSON)
            .body(format!(
                r#"{{"weekKey":"{}","markdown":"nothing to see"}}"#,
                WEEK
            ))
            .dispatch();
        let empty: Value = response.into_json().unwrap();
        assert_eq!(empty["status"], "empty");
        assert_eq!(empty["goals"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn validation_errors_are_bad_requests() {
        let client = test_client();
        let token = register_user(&client, "alice", "password1");

        let response = authed(client.post("/api/goals"), &token)
            .header(ContentType::JSON)
            .body(format!(r#"{{"text":"   ","weekKey":"{}"}}"#, WEEK))
            .dispatch();
        assert_eq!(response.status(), Status::BadRequest);
        let body: Value = response.into_json().unwrap();
        assert_eq!(body["error"], "text must not be empty");

        let response = authed(
            client.get("/api/goals/export?week_key=garbage"),
            &token,
        )
        .dispatch();
        assert_eq!(response.status(), Status::BadRequest);
    }
}
