use std::cmp::Ordering;
use std::fs::File;
use std::io::BufReader;
use std::time::{Instant, SystemTime};

use chrono::NaiveDateTime;
use dary_heap::OctonaryHeap;
use hashbrown::HashMap;
use rayon::prelude::*;

use crate::io::{read_similarity_triples, MovieId};
use crate::knn::similarity::ItemSimilarity;

pub struct ModelStats {
    pub descriptive_name: String,
    pub qty_movies: usize,
    pub qty_similarity_pairs: usize,
    pub min_similarity: f64,
    pub max_similarity: f64,
    pub trained_at: NaiveDateTime,
}

/// Dense item-item similarity matrix with per-movie neighbor tables.
///
/// The neighbor tables are computed once at load time, ordered by descending
/// similarity with the movie's inner index as tie-breaker, and bounded to
/// `max_neighbors_per_item` entries. All lookups afterwards are read-only.
pub struct MatrixIndex {
    pub(crate) movie_to_inner: HashMap<MovieId, usize>,
    pub(crate) inner_to_movie: Vec<MovieId>,
    pub(crate) similarities: Vec<Vec<f64>>,
    pub(crate) neighbors_ordered: Vec<Vec<usize>>,
    pub model_stats: ModelStats,
}

#[derive(PartialEq, Debug)]
struct NeighborSim {
    inner: usize,
    similarity: f64,
}

impl NeighborSim {
    fn new(inner: usize, similarity: f64) -> Self {
        NeighborSim { inner, similarity }
    }
}

impl Eq for NeighborSim {}

impl Ord for NeighborSim {
    fn cmp(&self, other: &Self) -> Ordering {
        // reverse order by similarity, ties resolved on the inner index
        match self.similarity.partial_cmp(&other.similarity) {
            Some(Ordering::Less) => Ordering::Greater,
            Some(Ordering::Greater) => Ordering::Less,
            _ => self.inner.cmp(&other.inner),
        }
    }
}

impl PartialOrd for NeighborSim {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Deserialize)]
struct MatrixDumpSchema {
    inner_to_movie: Vec<u64>,
    similarities: Vec<Vec<f64>>,
    trained_at_epoch_secs: i64,
}

impl MatrixIndex {
    /// Loads a whitespace separated `movie_a movie_b similarity` triple file.
    pub fn new_from_csv(model_path: &str, max_neighbors_per_item: usize) -> Self {
        let start_time = Instant::now();
        println!("reading similarity triples {}", &model_path);
        let triples = read_similarity_triples(model_path);
        println!(
            "reading similarity triples:{} micros",
            start_time.elapsed().as_micros()
        );

        let mut movie_ids: Vec<MovieId> = triples
            .iter()
            .flat_map(|(movie_a, movie_b, _)| [*movie_a, *movie_b])
            .collect();
        movie_ids.sort_unstable();
        movie_ids.dedup();

        let movie_to_inner: HashMap<MovieId, usize> = movie_ids
            .iter()
            .enumerate()
            .map(|(inner, movie_id)| (*movie_id, inner))
            .collect();

        let mut similarities = vec![vec![0.0; movie_ids.len()]; movie_ids.len()];
        for (movie_a, movie_b, similarity) in triples.iter() {
            let inner_a = movie_to_inner[movie_a];
            let inner_b = movie_to_inner[movie_b];
            similarities[inner_a][inner_b] = *similarity;
            similarities[inner_b][inner_a] = *similarity;
        }

        let trained_at = file_modification_time(model_path);

        Self::from_dense(
            movie_ids,
            similarities,
            max_neighbors_per_item,
            model_path,
            trained_at,
        )
    }

    /// Loads the bincode dump written by the offline trainer.
    pub fn new(model_path: &str, max_neighbors_per_item: usize) -> Self {
        let start_time = Instant::now();
        println!("reading model dump {}", &model_path);
        let file = File::open(model_path)
            .unwrap_or_else(|io_error| panic!("Could not open {}: {}", model_path, io_error));
        let dump: MatrixDumpSchema = bincode::deserialize_from(BufReader::new(file))
            .unwrap_or_else(|decode_error| {
                panic!("Malformed model dump {}: {}", model_path, decode_error)
            });
        println!(
            "reading model dump:{} micros",
            start_time.elapsed().as_micros()
        );

        Self::from_dense(
            dump.inner_to_movie,
            dump.similarities,
            max_neighbors_per_item,
            model_path,
            NaiveDateTime::from_timestamp(dump.trained_at_epoch_secs, 0),
        )
    }

    pub fn from_dense(
        inner_to_movie: Vec<MovieId>,
        similarities: Vec<Vec<f64>>,
        max_neighbors_per_item: usize,
        descriptive_name: &str,
        trained_at: NaiveDateTime,
    ) -> Self {
        let qty_movies = inner_to_movie.len();
        if similarities.len() != qty_movies
            || similarities.iter().any(|row| row.len() != qty_movies)
        {
            panic!(
                "Similarity matrix of {} is not square over {} movies",
                descriptive_name, qty_movies
            );
        }

        let movie_to_inner: HashMap<MovieId, usize> = inner_to_movie
            .iter()
            .enumerate()
            .map(|(inner, movie_id)| (*movie_id, inner))
            .collect();
        if movie_to_inner.len() != qty_movies {
            panic!("Duplicate movie ids in model {}", descriptive_name);
        }

        let start_time = Instant::now();
        println!("prepare neighbor tables");
        let neighbors_ordered = prepare_neighbor_tables(&similarities, max_neighbors_per_item);
        println!(
            "prepare neighbor tables:{} micros",
            start_time.elapsed().as_micros()
        );

        let mut qty_similarity_pairs = 0_usize;
        let mut min_similarity = f64::MAX;
        let mut max_similarity = f64::MIN;
        for row in 0..qty_movies {
            for col in row + 1..qty_movies {
                let similarity = similarities[row][col];
                if similarity != 0.0 {
                    qty_similarity_pairs += 1;
                    min_similarity = min_similarity.min(similarity);
                    max_similarity = max_similarity.max(similarity);
                }
            }
        }
        if qty_similarity_pairs == 0 {
            min_similarity = 0.0;
            max_similarity = 0.0;
        }

        let model_stats = ModelStats {
            descriptive_name: descriptive_name.to_string(),
            qty_movies,
            qty_similarity_pairs,
            min_similarity,
            max_similarity,
            trained_at,
        };

        println!("Loaded {}", model_stats.descriptive_name);
        println!("\tMovies: {}", model_stats.qty_movies);
        println!("\tSimilarity pairs: {}", model_stats.qty_similarity_pairs);
        println!(
            "\tSimilarity range: [{:.4}, {:.4}]",
            model_stats.min_similarity, model_stats.max_similarity
        );
        println!("\tTrained at: {}", model_stats.trained_at);

        MatrixIndex {
            movie_to_inner,
            inner_to_movie,
            similarities,
            neighbors_ordered,
            model_stats,
        }
    }
}

/// For every movie, the inner indices of all other movies with a nonzero
/// similarity, ordered by descending similarity and bounded to
/// `max_neighbors_per_item` entries.
pub fn prepare_neighbor_tables(
    similarities: &[Vec<f64>],
    max_neighbors_per_item: usize,
) -> Vec<Vec<usize>> {
    similarities
        .par_iter()
        .enumerate()
        .map(|(inner, row)| {
            let mut closest_neighbors = OctonaryHeap::<NeighborSim>::with_capacity(
                max_neighbors_per_item.min(row.len()),
            );
            for (neighbor, similarity) in row.iter().enumerate() {
                if neighbor == inner || *similarity == 0.0 {
                    continue;
                }
                let scored_neighbor = NeighborSim::new(neighbor, *similarity);
                if closest_neighbors.len() < max_neighbors_per_item {
                    closest_neighbors.push(scored_neighbor);
                } else {
                    match closest_neighbors.peek_mut() {
                        Some(mut bottom) => {
                            if scored_neighbor < *bottom {
                                *bottom = scored_neighbor;
                            }
                        }
                        None => break, // max_neighbors_per_item is 0
                    }
                }
            }
            closest_neighbors
                .into_sorted_vec()
                .into_iter()
                .map(|scored_neighbor| scored_neighbor.inner)
                .collect()
        })
        .collect()
}

fn file_modification_time(path: &str) -> NaiveDateTime {
    let epoch_secs = std::fs::metadata(path)
        .and_then(|metadata| metadata.modified())
        .ok()
        .and_then(|modified| modified.duration_since(SystemTime::UNIX_EPOCH).ok())
        .map(|duration| duration.as_secs())
        .unwrap_or(0);
    NaiveDateTime::from_timestamp(epoch_secs as i64, 0)
}

impl ItemSimilarity for MatrixIndex {
    fn to_inner(&self, movie_id: &MovieId) -> Option<usize> {
        self.movie_to_inner.get(movie_id).copied()
    }

    fn to_raw(&self, inner: usize) -> MovieId {
        self.inner_to_movie[inner]
    }

    fn neighbors(&self, inner: usize, k: usize) -> &[usize] {
        let ordered = &self.neighbors_ordered[inner];
        &ordered[..k.min(ordered.len())]
    }

    fn similarity(&self, inner_a: usize, inner_b: usize) -> f64 {
        self.similarities[inner_a][inner_b]
    }
}

#[cfg(test)]
mod matrix_index_test {
    use std::io::Write;

    use float_cmp::approx_eq;

    use super::*;

    #[test]
    fn should_order_and_bound_neighbor_tables() {
        let similarities = vec![
            vec![0.0, 0.3, 0.9, 0.0, -0.2],
            vec![0.3, 0.0, 0.1, 0.0, 0.0],
            vec![0.9, 0.1, 0.0, 0.4, 0.0],
            vec![0.0, 0.0, 0.4, 0.0, 0.0],
            vec![-0.2, 0.0, 0.0, 0.0, 0.0],
        ];

        let tables = prepare_neighbor_tables(&similarities, 500);

        // descending similarity, zero entries and the movie itself excluded
        assert_eq!(vec![2, 1, 4], tables[0]);
        assert_eq!(vec![0, 2], tables[1]);
        assert_eq!(vec![0, 3, 1], tables[2]);
        assert_eq!(vec![2], tables[3]);
        assert_eq!(vec![0], tables[4]);

        let bounded = prepare_neighbor_tables(&similarities, 2);
        assert_eq!(vec![2, 1], bounded[0]);
        assert_eq!(vec![0, 3], bounded[2]);
    }

    #[test]
    fn should_break_similarity_ties_on_inner_index() {
        let similarities = vec![
            vec![0.0, 0.5, 0.5, 0.5],
            vec![0.5, 0.0, 0.0, 0.0],
            vec![0.5, 0.0, 0.0, 0.0],
            vec![0.5, 0.0, 0.0, 0.0],
        ];

        let tables = prepare_neighbor_tables(&similarities, 2);

        assert_eq!(vec![1, 2], tables[0]);
    }

    #[test]
    fn should_resolve_ids_in_both_directions() {
        let index = MatrixIndex::from_dense(
            vec![10, 20, 30],
            vec![
                vec![0.0, 0.8, 0.0],
                vec![0.8, 0.0, 0.2],
                vec![0.0, 0.2, 0.0],
            ],
            500,
            "simple unittest",
            NaiveDateTime::from_timestamp(1, 0),
        );

        assert_eq!(Some(1), index.to_inner(&20));
        assert_eq!(None, index.to_inner(&999));
        assert_eq!(30, index.to_raw(2));
        assert!(approx_eq!(f64, 0.8, index.similarity(0, 1), ulps = 2));
        assert_eq!(&[1_usize] as &[usize], index.neighbors(0, 5));

        assert_eq!(3, index.model_stats.qty_movies);
        assert_eq!(2, index.model_stats.qty_similarity_pairs);
    }

    #[test]
    fn should_load_triples_from_file() {
        let triples_path = std::env::temp_dir().join(format!(
            "reelknn-model-test-{}.txt",
            std::process::id()
        ));
        let mut file = File::create(&triples_path).unwrap();
        writeln!(file, "MovieA MovieB Similarity").unwrap();
        writeln!(file, "10 20 0.8").unwrap();
        writeln!(file, "10 30 0.5").unwrap();
        writeln!(file, "20 30 -0.1").unwrap();
        drop(file);

        let index = MatrixIndex::new_from_csv(triples_path.to_str().unwrap(), 500);
        std::fs::remove_file(&triples_path).unwrap();

        assert_eq!(3, index.model_stats.qty_movies);
        assert_eq!(3, index.model_stats.qty_similarity_pairs);
        assert!(approx_eq!(f64, -0.1, index.model_stats.min_similarity, ulps = 2));
        assert!(approx_eq!(f64, 0.8, index.model_stats.max_similarity, ulps = 2));

        // inner indices are assigned in ascending movie id order
        let inner_10 = index.to_inner(&10).unwrap();
        let inner_20 = index.to_inner(&20).unwrap();
        assert!(approx_eq!(f64, 0.8, index.similarity(inner_10, inner_20), ulps = 2));
        assert!(approx_eq!(f64, 0.8, index.similarity(inner_20, inner_10), ulps = 2));
        assert_eq!(vec![inner_20, index.to_inner(&30).unwrap()], index.neighbors(inner_10, 5).to_vec());
    }
}
