use anyhow::anyhow;
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use serde::Serialize;

use crate::{
    AppState, Db, Error, Result,
    catalog::{self, ActorDetail, Sidebar},
};

#[derive(Serialize)]
struct ActorPage {
    actor: ActorDetail,
    #[serde(flatten)]
    sidebar: Sidebar,
}

async fn detail(State(db): State<Db>, Path(slug): Path<String>) -> Result<Json<ActorPage>> {
    let actor = catalog::actor_detail(&db, &slug)
        .await?
        .ok_or_else(|| Error::not_found(anyhow!("no actor named {slug:?}")))?;
    let sidebar = catalog::sidebar(&db).await?;

    Ok(Json(ActorPage { actor, sidebar }))
}

pub(super) fn routes() -> Router<AppState> {
    Router::new().route("/actor/{slug}", get(detail))
}
