extern crate sys_info;

use actix_web::{get, web, HttpResponse};
use chrono::Utc;

use crate::state::SharedHandlesAndConfig;
use web::Data;

#[get("/internal")]
pub async fn internal(config: Data<SharedHandlesAndConfig>) -> HttpResponse {
    let mut html = "<html>reelknn: item-based kNN movie recommendations.<br />".to_string();

    let model_stats = &config.knn_index.model_stats;
    html.push_str("<h3>Similarity model</h3>");
    html.push_str("Loaded: ");
    html.push_str(&*model_stats.descriptive_name);
    html.push_str("<br />Qty Movies: ");
    html.push_str(&*model_stats.qty_movies.to_string());
    html.push_str("<br />Qty Similarity Pairs: ");
    html.push_str(&*model_stats.qty_similarity_pairs.to_string());
    html.push_str("<br />Similarity Range: [");
    html.push_str(&format!("{:.4}", model_stats.min_similarity));
    html.push_str(", ");
    html.push_str(&format!("{:.4}", model_stats.max_similarity));
    html.push_str("]<br />Trained At: ");
    html.push_str(&model_stats.trained_at.to_string());
    html.push_str("<br />Age (hours): ");

    let age_hours = (Utc::now().naive_utc() - model_stats.trained_at).num_hours();

    html.push_str(&*age_hours.to_string());

    html.push_str("<h3>Catalog</h3>");
    html.push_str("Qty movies with titles: ");
    html.push_str(&*config.catalog.qty_movies().to_string());

    html.push_str("<h3>Models</h3>");
    html.push_str("hyperparameters");
    html.push_str("<br />k : ");
    html.push_str(&config.neighborhood_size_k.to_string());
    html.push_str(" (neighbor fan-out per rated movie)");
    html.push_str("<br />Qty items to recommend: ");
    html.push_str(&config.num_items_to_recommend.to_string());
    html.push_str("<br /><a href=\"/v1/recommend?session_id=144\">v1 session endpoint of our model</a>");
    html.push_str("<h3>Machine instance</h3>");
    html.push_str("<br />Qty CPU's detected: ");
    html.push_str(&*sys_info::cpu_num().unwrap_or(0).to_string());
    html.push_str("<br />Qty actix workers set: ");
    html.push_str(&config.qty_workers.to_string());
    html.push_str("<br />CPU speed: ");
    html.push_str(&*sys_info::cpu_speed().unwrap_or(0).to_string());
    html.push_str("MHz");
    html.push_str("<br />Active processes on instance: ");
    html.push_str(&*sys_info::proc_total().unwrap_or(0).to_string());
    html.push_str("<h3>Rating store</h3>");
    html.push_str("<br />Compaction TTL: ");
    html.push_str(&*config.db_compaction_ttl_in_secs.to_string());
    html.push_str(" seconds");
    html.push_str("<h3>Metrics</h3>");
    html.push_str("<a href=\"/internal/prometheus\">prometheus</a>");
    html.push_str("</html>");

    HttpResponse::Ok().body(html)
}
