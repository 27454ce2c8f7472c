use actix_web::{get, web, HttpResponse};

use crate::io::MovieId;
use crate::state::SharedHandlesAndConfig;

#[derive(Debug, Serialize)]
pub struct MovieIdResponse {
    movieid: MovieId,
}

#[derive(Debug, Serialize)]
pub struct MovieTitleResponse {
    title: String,
}

#[derive(Debug, Serialize)]
pub struct NotFoundResponse {
    detail: String,
}

fn movie_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(NotFoundResponse {
        detail: "Movie not found".to_string(),
    })
}

#[get("/v1/movies/by_name/{movie_name}")]
pub async fn movie_by_name(
    data: web::Data<SharedHandlesAndConfig>,
    path: web::Path<String>,
) -> HttpResponse {
    let movie_name = path.into_inner();
    match data.catalog.id_by_title(&movie_name) {
        Some(movieid) => HttpResponse::Ok().json(MovieIdResponse { movieid }),
        None => movie_not_found(),
    }
}

#[get("/v1/movies/by_id/{movie_id}")]
pub async fn movie_by_id(
    data: web::Data<SharedHandlesAndConfig>,
    path: web::Path<MovieId>,
) -> HttpResponse {
    let movie_id = path.into_inner();
    match data.catalog.title_by_id(&movie_id) {
        Some(title) => HttpResponse::Ok().json(MovieTitleResponse {
            title: title.to_string(),
        }),
        None => movie_not_found(),
    }
}
