use std::sync::Arc;

use crate::catalog::MovieCatalog;
use crate::knn::matrix_index::MatrixIndex;
use crate::sessions::RocksDBRatingStore;

/// Read-only handles and knobs shared by every actix worker.
pub struct SharedHandlesAndConfig {
    pub rating_store: Arc<RocksDBRatingStore>,
    pub knn_index: Arc<MatrixIndex>,
    pub catalog: Arc<MovieCatalog>,
    pub neighborhood_size_k: usize,
    pub num_items_to_recommend: usize,
    pub qty_workers: usize,
    pub db_compaction_ttl_in_secs: usize,
}
