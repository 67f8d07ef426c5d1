use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, FromRow)]
pub struct PlayerRow {
    pub id: Uuid,
    pub nickname: String,
}

#[derive(Debug, FromRow)]
pub struct ClanRow {
    pub id: Uuid,
    pub name: String,
    pub leader_id: Option<Uuid>,
}

#[derive(Debug, FromRow)]
pub struct TeamRow {
    pub id: Uuid,
    pub name: String,
    pub clan_id: Option<Uuid>,
    pub clan_pending_id: Option<Uuid>,
    pub leader_id: Option<Uuid>,
}

/// One member or pending edge; `group_id` is a team or clan id.
#[derive(Debug, FromRow)]
pub struct EdgeRow {
    pub group_id: Uuid,
    pub player_id: Uuid,
}

#[derive(Debug, FromRow)]
pub struct TournamentRow {
    pub id: Uuid,
    pub name: String,
    pub team_player_count: i16,
}
