//! Membership actions and roster views.

use actix_web::{get, http::StatusCode, post, web, HttpResponse, Responder};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    config::settings,
    db::membership_repo,
    membership::{view, Intent, MembershipError, Target},
    metrics,
};

//////////////////////////////////////////////////
// Requests
//////////////////////////////////////////////////

#[derive(Deserialize)]
pub struct ActionReq {
    /// Player performing the action; identity is established upstream.
    pub actor_id: Uuid,
    pub intent: Intent,
}

//////////////////////////////////////////////////
// Error mapping
//////////////////////////////////////////////////

pub fn status_for(e: &MembershipError) -> StatusCode {
    match e {
        MembershipError::UnknownPlayer { .. }
        | MembershipError::UnknownTeam { .. }
        | MembershipError::UnknownClan { .. } => StatusCode::NOT_FOUND,
        MembershipError::NotAuthorized { .. } => StatusCode::FORBIDDEN,
        MembershipError::NotAMember { .. } | MembershipError::NotPending { .. } => {
            StatusCode::BAD_REQUEST
        }
        MembershipError::NeedsClanMembership { .. }
        | MembershipError::AlreadyMember { .. }
        | MembershipError::HasDependentTeams { .. }
        | MembershipError::InOtherClan { .. } => StatusCode::CONFLICT,
    }
}

/// JSON body: the serialized error plus a human-readable `message`.
pub fn error_response(e: &MembershipError) -> HttpResponse {
    let mut body = serde_json::to_value(e).unwrap_or_else(|_| serde_json::json!({}));
    if let Some(obj) = body.as_object_mut() {
        obj.insert("message".into(), e.to_string().into());
    }
    HttpResponse::build(status_for(e)).json(body)
}

//////////////////////////////////////////////////
// Handlers
//////////////////////////////////////////////////

/// POST /api/membership
#[post("/membership")]
pub async fn act(info: web::Json<ActionReq>, db: web::Data<PgPool>) -> impl Responder {
    let ActionReq { actor_id, intent } = info.into_inner();
    let action = intent.name();

    match membership_repo::execute(db.get_ref(), actor_id, &intent, &settings().policy()).await {
        Ok(Ok(outcome)) => {
            metrics::record_intent(action, "ok");
            HttpResponse::Ok().json(outcome)
        }
        Ok(Err(e)) => {
            log::warn!("{action} by {actor_id} refused: {e}");
            metrics::record_intent(action, e.tag());
            error_response(&e)
        }
        Err(e) => {
            log::error!("{action} by {actor_id} failed: {e:?}");
            metrics::record_intent(action, "failed");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// GET /api/teams/{team_id}
#[get("/teams/{team_id}")]
pub async fn team(path: web::Path<Uuid>, db: web::Data<PgPool>) -> impl Responder {
    roster(db.get_ref(), Target::Team(path.into_inner())).await
}

/// GET /api/clans/{clan_id}
#[get("/clans/{clan_id}")]
pub async fn clan(path: web::Path<Uuid>, db: web::Data<PgPool>) -> impl Responder {
    roster(db.get_ref(), Target::Clan(path.into_inner())).await
}

async fn roster(db: &PgPool, target: Target) -> HttpResponse {
    let league = match membership_repo::snapshot(db).await {
        Ok(l) => l,
        Err(e) => {
            log::error!("loading roster of {target} failed: {e:?}");
            return HttpResponse::InternalServerError().finish();
        }
    };
    match view::roster(&league, target) {
        Some(r) => HttpResponse::Ok().json(r),
        None => HttpResponse::NotFound().body("not found"),
    }
}

/// GET /api/players/{player_id}
#[get("/players/{player_id}")]
pub async fn player(path: web::Path<Uuid>, db: web::Data<PgPool>) -> impl Responder {
    let pid = path.into_inner();
    let league = match membership_repo::snapshot(db.get_ref()).await {
        Ok(l) => l,
        Err(e) => {
            log::error!("loading memberships of {pid} failed: {e:?}");
            return HttpResponse::InternalServerError().finish();
        }
    };
    match view::player_memberships(&league, pid) {
        Some(m) => HttpResponse::Ok().json(m),
        None => HttpResponse::NotFound().body("not found"),
    }
}

//////////////////////////////////////////////////
// Mount
//////////////////////////////////////////////////
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(act)
        .service(team)
        .service(clan)
        .service(player);
}
