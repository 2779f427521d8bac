use anyhow::anyhow;
use axum::{
    Json, Router,
    extract::{Path, Query, RawQuery, State},
    routing::get,
};
use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Db, Error, Result,
    catalog::{self, FilterCriteria, MovieDetail, Sidebar},
    client_ip::ClientIp,
    metrics::SEARCH_QUERIES,
    models::{Movie, RatingStar},
    rating,
    review::{self, ReviewNode},
};

#[derive(Serialize)]
struct MovieListPage {
    movies: Vec<Movie>,
    #[serde(flatten)]
    sidebar: Sidebar,
}

#[derive(Serialize)]
struct MovieDetailPage {
    movie: MovieDetail,
    reviews: Vec<ReviewNode>,
    /// Choices for the rating form.
    star_form: Vec<RatingStar>,
    /// The star value this client already gave the movie.
    user_stars: Option<i64>,
    #[serde(flatten)]
    sidebar: Sidebar,
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

#[derive(Serialize)]
struct SearchPage {
    movies: Vec<Movie>,
    q: String,
}

async fn list(State(db): State<Db>) -> Result<Json<MovieListPage>> {
    let movies = catalog::list_published(&db).await?;
    let sidebar = catalog::sidebar(&db).await?;

    Ok(Json(MovieListPage { movies, sidebar }))
}

async fn filter(State(db): State<Db>, RawQuery(query): RawQuery) -> Result<Json<MovieListPage>> {
    let criteria = FilterCriteria::from_query(query.as_deref()).map_err(Error::bad_request)?;

    let movies = catalog::filter(&db, &criteria).await?;
    let sidebar = catalog::sidebar(&db).await?;

    Ok(Json(MovieListPage { movies, sidebar }))
}

async fn detail(
    ClientIp(ip): ClientIp,
    State(db): State<Db>,
    Path(slug): Path<String>,
) -> Result<Json<MovieDetailPage>> {
    let movie = catalog::published_by_slug(&db, &slug)
        .await?
        .ok_or_else(|| Error::not_found(anyhow!("no movie with slug {slug:?}")))?;

    let user_stars = rating::user_stars(&db, &ip, movie.id).await?;
    let reviews = review::thread(&db, movie.id).await?;
    let star_form = rating::stars(&db).await?;
    let movie = catalog::movie_detail(&db, movie).await?;
    let sidebar = catalog::sidebar(&db).await?;

    Ok(Json(MovieDetailPage {
        movie,
        reviews,
        star_form,
        user_stars,
        sidebar,
    }))
}

async fn search(
    State(db): State<Db>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchPage>> {
    counter!(SEARCH_QUERIES).increment(1);
    let movies = catalog::search(&db, &params.q).await?;

    Ok(Json(SearchPage {
        movies,
        q: params.q,
    }))
}

#[rustfmt::skip]
pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/",             get(list))
        .route("/filter",       get(filter))
        .route("/search",       get(search))
        .route("/movie/{slug}", get(detail))
}
