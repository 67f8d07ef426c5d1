//! Tournament sign-up for teams.

use actix_web::{http::StatusCode, post, web, HttpResponse, Responder};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{db::registration_repo, registration::RegistrationError};

#[derive(Deserialize)]
pub struct RegistrationReq {
    pub actor_id: Uuid,
    pub team_id: Uuid,
    pub tournament_id: Uuid,
}

pub fn status_for(e: &RegistrationError) -> StatusCode {
    match e {
        RegistrationError::UnknownTeam { .. } | RegistrationError::UnknownTournament { .. } => {
            StatusCode::NOT_FOUND
        }
        RegistrationError::NotAuthorized { .. } => StatusCode::FORBIDDEN,
        RegistrationError::AlreadyRegistered
        | RegistrationError::ClanAlreadyRegistered { .. }
        | RegistrationError::NotEnoughPlayers { .. } => StatusCode::CONFLICT,
    }
}

fn respond(
    result: anyhow::Result<Result<(), RegistrationError>>,
    done: &'static str,
) -> HttpResponse {
    match result {
        Ok(Ok(())) => HttpResponse::Ok().body(done),
        Ok(Err(e)) => {
            log::warn!("registration refused: {e}");
            let mut body = serde_json::to_value(&e).unwrap_or_else(|_| serde_json::json!({}));
            if let Some(obj) = body.as_object_mut() {
                obj.insert("message".into(), e.to_string().into());
            }
            HttpResponse::build(status_for(&e)).json(body)
        }
        Err(e) => {
            log::error!("registration failed: {e:?}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// POST /api/tournaments/register
#[post("/tournaments/register")]
pub async fn register(info: web::Json<RegistrationReq>, db: web::Data<PgPool>) -> impl Responder {
    let res =
        registration_repo::register(db.get_ref(), info.actor_id, info.team_id, info.tournament_id)
            .await;
    respond(res, "registered")
}

/// POST /api/tournaments/withdraw
#[post("/tournaments/withdraw")]
pub async fn withdraw(info: web::Json<RegistrationReq>, db: web::Data<PgPool>) -> impl Responder {
    let res =
        registration_repo::withdraw(db.get_ref(), info.actor_id, info.team_id, info.tournament_id)
            .await;
    respond(res, "withdrawn")
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(register).service(withdraw);
}
