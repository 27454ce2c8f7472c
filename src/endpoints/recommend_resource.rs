use actix_web::{get, post, web, HttpResponse};
use hashbrown::HashMap;
use log::warn;

use uuid::Builder;

use crate::io::{MovieId, Rating};
use crate::knn;
use crate::state::SharedHandlesAndConfig;

#[derive(Debug, Deserialize)]
pub struct RatingsPayload {
    movie_ratings: std::collections::HashMap<MovieId, Rating>,
}

#[derive(Debug, Serialize)]
pub struct RecommendedMovies {
    recommended_movies: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SessionQueryParams {
    session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RateQueryParams {
    session_id: String,
    movie_id: MovieId,
    rating: Rating,
}

#[derive(Debug, Serialize)]
pub struct SessionRatings {
    movie_ratings: Vec<(MovieId, Rating)>,
}

// Visitors can carry multiple session_id values during a visit, so the raw
// session_id string is hashed into a fixed width key for the rating store.
fn session_key(session_id: &str) -> u128 {
    let session_id_digest = md5::compute(session_id);
    Builder::from_bytes(session_id_digest.0).build().as_u128()
}

fn recommend_titles(
    data: &SharedHandlesAndConfig,
    ratings: &HashMap<MovieId, Rating>,
) -> Vec<String> {
    let recommendations = knn::recommend(
        data.knn_index.as_ref(),
        ratings,
        data.neighborhood_size_k,
        data.num_items_to_recommend,
    );

    recommendations
        .into_sorted_vec()
        .iter()
        .filter_map(|scored| match data.catalog.title_by_id(&scored.id) {
            Some(title) => Some(title.to_string()),
            None => {
                warn!("no movie title found for movie_id {}", scored.id);
                None
            }
        })
        .collect()
}

// Stateless variant: the caller sends its complete rating set in one request.
#[post("/v1/recommend")]
pub async fn v1_recommend(
    data: web::Data<SharedHandlesAndConfig>,
    payload: web::Json<RatingsPayload>,
) -> HttpResponse {
    let ratings: HashMap<MovieId, Rating> =
        payload.into_inner().movie_ratings.into_iter().collect();

    let recommended_movies = recommend_titles(&data, &ratings);

    HttpResponse::Ok().json(RecommendedMovies { recommended_movies })
}

// Session variant: recommends over the ratings stored for this session.
#[get("/v1/recommend")]
pub async fn v1_recommend_session(
    data: web::Data<SharedHandlesAndConfig>,
    query: web::Query<SessionQueryParams>,
) -> HttpResponse {
    let session_id = session_key(&query.session_id);
    let ratings: HashMap<MovieId, Rating> = data
        .rating_store
        .get_ratings(&session_id)
        .into_iter()
        .collect();

    let recommended_movies = recommend_titles(&data, &ratings);

    HttpResponse::Ok().json(RecommendedMovies { recommended_movies })
}

#[get("/v1/rate")]
pub async fn v1_rate(
    data: web::Data<SharedHandlesAndConfig>,
    query: web::Query<RateQueryParams>,
) -> HttpResponse {
    let session_id = session_key(&query.session_id);
    let movie_ratings = data
        .rating_store
        .upsert_rating(&session_id, query.movie_id, query.rating);

    HttpResponse::Ok().json(SessionRatings { movie_ratings })
}

#[get("/v1/clear")]
pub async fn v1_clear(
    data: web::Data<SharedHandlesAndConfig>,
    query: web::Query<SessionQueryParams>,
) -> HttpResponse {
    let session_id = session_key(&query.session_id);
    data.rating_store.clear_ratings(&session_id);

    HttpResponse::Ok().json(SessionRatings {
        movie_ratings: Vec::new(),
    })
}
