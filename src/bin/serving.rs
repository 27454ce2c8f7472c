extern crate reelknn;

use sessions::RocksDBRatingStore;

use actix_web::{
    http::ContentEncoding, middleware, web, App, HttpRequest, HttpResponse, HttpServer,
};
use actix_web_prom::PrometheusMetrics;

use actix_web::http::header;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use reelknn::catalog::MovieCatalog;
use reelknn::config::AppConfig;
use reelknn::endpoints::index_resource::internal;
use reelknn::endpoints::movie_resource::{movie_by_id, movie_by_name};
use reelknn::endpoints::recommend_resource::{
    v1_clear, v1_rate, v1_recommend, v1_recommend_session,
};
use reelknn::knn::matrix_index::MatrixIndex;
use reelknn::sessions;
use reelknn::state::SharedHandlesAndConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config_path = std::env::args().nth(1).unwrap_or_default();
    let config = AppConfig::new(config_path);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log.level))
        .init();

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    let neighborhood_size_k = config.model.neighborhood_size_k;
    let num_items_to_recommend = config.model.num_items_to_recommend;
    let max_neighbors_per_item = config.model.max_neighbors_per_item;
    let qty_workers = config.server.num_workers;

    let catalog = Arc::new(
        MovieCatalog::new_from_csv(&config.data.catalog_path).unwrap_or_else(|error| {
            panic!(
                "Could not load movie catalog {}: {:#}",
                &config.data.catalog_path, error
            )
        }),
    );

    let model_path = Path::new(&config.data.model_path);
    let knn_index = if model_path.extension().map_or(false, |ext| ext == "bin") {
        // By default we use a model dump that is trained offline.
        Arc::new(MatrixIndex::new(
            &config.data.model_path,
            max_neighbors_per_item,
        ))
    } else if model_path.is_file() {
        // The following line creates an index directly from a similarity triple file.
        Arc::new(MatrixIndex::new_from_csv(
            &config.data.model_path,
            max_neighbors_per_item,
        ))
    } else {
        panic!(
            "Model file does not exist: {}",
            &config.data.model_path
        )
    };

    println!("start db");
    let session_ttl = Duration::from_secs(30 * 60);
    let db = Arc::new(RocksDBRatingStore::new("./ratings.db", session_ttl));

    println!("start metrics");
    let prometheus = PrometheusMetrics::new("api", Some("/internal/prometheus"), None);

    println!("Done. start httpd at http://{}", &bind_address);
    HttpServer::new(move || {
        let handles_and_config = SharedHandlesAndConfig {
            rating_store: db.clone(),
            knn_index: knn_index.clone(),
            catalog: catalog.clone(),
            neighborhood_size_k,
            num_items_to_recommend,
            qty_workers,
            db_compaction_ttl_in_secs: session_ttl.as_secs() as usize,
        };

        App::new()
            .wrap(middleware::Compress::new(ContentEncoding::Identity))
            .wrap(middleware::Logger::default())
            .wrap(prometheus.clone())
            .wrap(
                middleware::DefaultHeaders::new()
                    .header("Cache-Control", "no-cache, no-store, must-revalidate")
                    .header("Pragma", "no-cache")
                    .header("Expires", "0"),
            )
            .data(handles_and_config)
            .service(v1_recommend)
            .service(v1_recommend_session)
            .service(v1_rate)
            .service(v1_clear)
            .service(movie_by_name)
            .service(movie_by_id)
            .service(internal)
            .service(web::resource("/").route(web::get().to(|_req: HttpRequest| {
                HttpResponse::Found()
                    .header(header::LOCATION, "/internal")
                    .finish()
            })))
    })
    .workers(config.server.num_workers)
    .bind(&bind_address)
    .unwrap_or_else(|_| panic!("Could not bind server to address {}", &bind_address))
    .run()
    .await
}
