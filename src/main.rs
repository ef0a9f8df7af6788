use rusqlite::Connection;

use std::error::Error;
use std::sync::{Arc, Mutex};

mod auth;
mod data;
mod error;
mod goals;
mod week;

#[macro_use]
extern crate rocket;

use rocket::serde::json::Json;
use rocket::{Build, Rocket};

use data::DBConnection;
use error::ErrorBody;

#[catch(400)]
fn bad_request() -> Json<ErrorBody> {
    Json(ErrorBody {
        error: "bad request".to_string(),
    })
}

#[catch(401)]
fn unauthorized() -> Json<ErrorBody> {
    Json(ErrorBody {
        error: "Unauthorized".to_string(),
    })
}

#[catch(404)]
fn not_found() -> Json<ErrorBody> {
    Json(ErrorBody {
        error: "not found".to_string(),
    })
}

#[catch(422)]
fn unprocessable() -> Json<ErrorBody> {
    Json(ErrorBody {
        error: "malformed request body".to_string(),
    })
}

#[catch(500)]
fn internal_error() -> Json<ErrorBody> {
    Json(ErrorBody {
        error: "internal server error".to_string(),
    })
}

pub fn rocket_for(connection: DBConnection) -> Rocket<Build> {
    rocket::build()
        .manage(connection)
        .mount(
            "/api/auth",
            routes![
                auth::endpoints::register,
                auth::endpoints::login,
                auth::endpoints::me,
                auth::endpoints::logout,
            ],
        )
        .mount(
            "/api/goals",
            routes![
                goals::endpoints::list_goals,
                goals::endpoints::create_goal,
                goals::endpoints::update_goal,
                goals::endpoints::toggle_goal,
                goals::endpoints::delete_goal,
                goals::endpoints::create_sub_item,
                goals::endpoints::update_sub_item,
                goals::endpoints::toggle_sub_item,
                goals::endpoints::delete_sub_item,
                goals::endpoints::export_goals,
                goals::endpoints::import_goals,
            ],
        )
        .register(
            "/",
            catchers![
                bad_request,
                unauthorized,
                not_found,
                unprocessable,
                internal_error
            ],
        )
}

#[rocket::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let db_path =
        std::env::var("GOALTRACKER_DB").unwrap_or_else(|_| "goaltracker.db".to_string());
    let connection = Connection::open(db_path)?;

    data::init_schema(&connection)?;
    auth::helpers::purge_expired_sessions(&connection)?;

    let connection: DBConnection = Arc::new(Mutex::new(connection));

    rocket_for(connection).launch().await?;

    Ok(())
}
