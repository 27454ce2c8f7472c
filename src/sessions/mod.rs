use rocksdb::{DB, Options};
use bincode;
use std::time::{Duration, SystemTime};
use crate::io::{MovieId, Rating};

/// Stores the evolving set of movie ratings for each interactive session.
/// Entries expire through RocksDB compaction TTL and an idle cutoff on read.
pub struct RocksDBRatingStore {
    rocks_db: DB,
    max_session_idle_duration_in_seconds: u64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct DBValue {
    movie_ratings: Vec<(MovieId, Rating)>,
    epoch_secs: u64,
}

impl RocksDBRatingStore {
    pub fn new(database_file: &str, ttl: Duration) -> Self {
        let mut options = Options::default();
        options.create_if_missing(true);
        options.optimize_for_point_lookup(5000);
        options.set_allow_mmap_reads(true);
        options.set_allow_mmap_writes(true);

        let rocks_db =
            DB::open_with_ttl(
                &options,
                database_file,
                ttl,
            )
                .unwrap();

        Self { rocks_db, max_session_idle_duration_in_seconds: 60 * 20 }
    }

    pub fn get_ratings(&self, session_id: &u128) -> Vec<(MovieId, Rating)> {
        let serialized_session_id =
            bincode::serialize(&session_id).unwrap();

        let bytes = self.rocks_db.get(&serialized_session_id).unwrap();

        let movie_ratings: Vec<(MovieId, Rating)> = match bytes {
            Some(bytes) => {
                let payload: DBValue = bincode::deserialize(&bytes).unwrap();
                let now = self.get_seconds_since_epoch();
                let seconds_since_last_event = now - payload.epoch_secs;
                if seconds_since_last_event <= self.max_session_idle_duration_in_seconds {
                    payload.movie_ratings
                } else {
                    Vec::new()
                }
            }
            None => Vec::new(),
        };
        movie_ratings
    }

    /// Replaces the rating if the movie was rated before in this session.
    pub fn upsert_rating(&self, session_id: &u128, movie_id: MovieId, rating: Rating) -> Vec<(MovieId, Rating)> {
        let mut movie_ratings = self.get_ratings(session_id);
        match movie_ratings.iter_mut().find(|(rated_movie, _)| *rated_movie == movie_id) {
            Some(entry) => entry.1 = rating,
            None => movie_ratings.push((movie_id, rating)),
        }
        self.update_ratings(session_id, &movie_ratings);
        movie_ratings
    }

    pub fn update_ratings(&self, session_id: &u128, movie_ratings: &[(MovieId, Rating)]) {
        let serialized_session_id =
            bincode::serialize(session_id).unwrap();
        let now = self.get_seconds_since_epoch();
        let payload = DBValue {
            movie_ratings: Vec::from(movie_ratings),
            epoch_secs: now,
        };
        let bytes = bincode::serialize(&payload).unwrap();

        let _ = self.rocks_db.put(&serialized_session_id, &bytes).unwrap();
    }

    pub fn clear_ratings(&self, session_id: &u128) {
        let serialized_session_id =
            bincode::serialize(session_id).unwrap();
        self.rocks_db.delete(&serialized_session_id).unwrap();
    }

    fn get_seconds_since_epoch(&self) -> u64 {
        SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap().as_secs()
    }
}
