use std::cmp::Ordering;
use std::collections::BinaryHeap;

use hashbrown::HashMap;
use log::warn;

use crate::io::{MovieId, Rating};
use crate::knn::similarity::ItemSimilarity;

pub mod matrix_index;
pub mod similarity;

#[derive(PartialEq, Debug)]
pub struct MovieScore {
    pub id: MovieId,
    pub score: f64,
}

impl MovieScore {
    fn new(id: MovieId, score: f64) -> Self {
        MovieScore { id, score }
    }
}

impl Eq for MovieScore {}

impl Ord for MovieScore {
    fn cmp(&self, other: &Self) -> Ordering {
        // reverse order by score
        match self.score.partial_cmp(&other.score) {
            Some(Ordering::Less) => Ordering::Greater,
            Some(Ordering::Greater) => Ordering::Less,
            _ => Ordering::Equal,
        }
    }
}

impl PartialOrd for MovieScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Aggregates the trained neighborhoods of all rated movies into a ranked
/// top-`how_many` list of unrated candidates.
///
/// Every candidate score is the similarity-weighted mean of the user's ratings
/// over its contributing neighbors. Candidates whose similarity weights cancel
/// out to exactly zero cannot be normalized and are dropped. Rated movies that
/// the model has never seen are skipped with a warning, they never fail the
/// call. The order of equally scored candidates is unspecified.
pub fn recommend<M: ItemSimilarity>(
    index: &M,
    ratings: &HashMap<MovieId, Rating>,
    k: usize,
    how_many: usize,
) -> BinaryHeap<MovieScore> {
    let mut accumulators: HashMap<MovieId, (f64, f64)> = HashMap::with_capacity(ratings.len() * k);

    for (movie_id, rating) in ratings.iter() {
        let inner = match index.to_inner(movie_id) {
            Some(inner) => inner,
            None => {
                warn!("movie_id {} absent from model vocabulary, skipped", movie_id);
                continue;
            }
        };

        for neighbor in index.neighbors(inner, k) {
            let neighbor_id = index.to_raw(*neighbor);
            if ratings.contains_key(&neighbor_id) {
                // candidates are movies the user has not rated yet
                continue;
            }
            let sim_score = index.similarity(inner, *neighbor);
            let (weighted_sum, sim_sum) = accumulators.entry(neighbor_id).or_insert((0.0, 0.0));
            *weighted_sum += sim_score * rating;
            *sim_sum += sim_score;
        }
    }

    let mut top_movies: BinaryHeap<MovieScore> = BinaryHeap::with_capacity(how_many);
    if how_many == 0 {
        return top_movies;
    }

    for (movie_id, (weighted_sum, sim_sum)) in accumulators.into_iter() {
        if sim_sum == 0.0 {
            continue;
        }
        let scored_movie = MovieScore::new(movie_id, weighted_sum / sim_sum);

        if top_movies.len() < how_many {
            top_movies.push(scored_movie);
        } else {
            let mut bottom = top_movies.peek_mut().unwrap();
            if scored_movie.score > bottom.score {
                *bottom = scored_movie;
            }
        }
    }

    top_movies
}

#[cfg(test)]
mod recommend_test {
    use chrono::NaiveDateTime;
    use float_cmp::approx_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use crate::knn::matrix_index::MatrixIndex;

    use super::*;

    fn test_index(inner_to_movie: Vec<MovieId>, similarities: Vec<Vec<f64>>) -> MatrixIndex {
        MatrixIndex::from_dense(
            inner_to_movie,
            similarities,
            500,
            "simple unittest",
            NaiveDateTime::from_timestamp(1, 0),
        )
    }

    fn ranked(recommendations: BinaryHeap<MovieScore>) -> Vec<(MovieId, f64)> {
        recommendations
            .into_sorted_vec()
            .iter()
            .map(|scored| (scored.id, scored.score))
            .collect()
    }

    #[test]
    fn should_score_neighbors_of_a_single_rated_movie() {
        // movie 10 has neighbors 20 (sim 0.8) and 30 (sim 0.5), movie 40 is unrelated
        let index = test_index(
            vec![10, 20, 30, 40],
            vec![
                vec![0.0, 0.8, 0.5, 0.0],
                vec![0.8, 0.0, 0.0, 0.0],
                vec![0.5, 0.0, 0.0, 0.0],
                vec![0.0, 0.0, 0.0, 0.0],
            ],
        );

        let mut ratings = HashMap::new();
        ratings.insert(10, 4.0);

        let results = ranked(recommend(&index, &ratings, 2, 2));

        // a candidate with a single contributing neighbor normalizes to the rating itself
        assert_eq!(2, results.len());
        for (movie_id, score) in &results {
            assert!(*movie_id == 20 || *movie_id == 30);
            assert!(approx_eq!(f64, 4.0, *score, ulps = 2));
        }
    }

    #[test]
    fn should_compute_weighted_mean_over_two_contributors() {
        // candidate 30 receives sim 0.6 from movie 10 (rated 5) and sim 0.4 from movie 20 (rated 2)
        let index = test_index(
            vec![10, 20, 30],
            vec![
                vec![0.0, 0.0, 0.6],
                vec![0.0, 0.0, 0.4],
                vec![0.6, 0.4, 0.0],
            ],
        );

        let mut ratings = HashMap::new();
        ratings.insert(10, 5.0);
        ratings.insert(20, 2.0);

        let results = ranked(recommend(&index, &ratings, 5, 5));

        // weighted sum 0.6*5 + 0.4*2 = 3.8, similarity sum 1.0
        assert_eq!(1, results.len());
        assert_eq!(30, results[0].0);
        assert!(approx_eq!(f64, 3.8, results[0].1, ulps = 2));
    }

    #[test]
    fn should_rank_candidates_by_descending_score() {
        let index = test_index(
            vec![10, 20, 30, 40],
            vec![
                vec![0.0, 0.8, 0.5, 0.0],
                vec![0.8, 0.0, 0.0, 0.0],
                vec![0.5, 0.0, 0.0, 0.9],
                vec![0.0, 0.0, 0.9, 0.0],
            ],
        );

        let mut ratings = HashMap::new();
        ratings.insert(10, 4.0);
        ratings.insert(40, 2.0);

        let results = ranked(recommend(&index, &ratings, 3, 3));

        // 20 scores 4.0, 30 scores (0.5*4 + 0.9*2) / 1.4 = 2.714..
        assert_eq!(2, results.len());
        assert_eq!(20, results[0].0);
        assert_eq!(30, results[1].0);
        assert!(results[0].1 > results[1].1);
    }

    #[test]
    fn should_return_nothing_for_empty_ratings() {
        let index = test_index(vec![10, 20], vec![vec![0.0, 0.7], vec![0.7, 0.0]]);

        let ratings = HashMap::new();

        let recommendations = recommend(&index, &ratings, 5, 5);

        assert!(recommendations.is_empty());
    }

    #[test]
    fn should_skip_movies_unknown_to_the_model() {
        let index = test_index(vec![10, 20], vec![vec![0.0, 0.7], vec![0.7, 0.0]]);

        let mut ratings = HashMap::new();
        ratings.insert(999, 5.0);
        ratings.insert(888, 1.0);

        // only unresolvable movies: empty result, no panic
        let recommendations = recommend(&index, &ratings, 5, 5);
        assert!(recommendations.is_empty());

        // an unresolvable movie next to a resolvable one is ignored
        ratings.insert(10, 4.0);
        let results = ranked(recommend(&index, &ratings, 5, 5));
        assert_eq!(1, results.len());
        assert_eq!(20, results[0].0);
        assert!(approx_eq!(f64, 4.0, results[0].1, ulps = 2));
    }

    #[test]
    fn should_drop_candidates_with_zero_similarity_weight() {
        // movie 30 gets sim 0.5 from movie 10 and sim -0.5 from movie 20, weights cancel out
        let index = test_index(
            vec![10, 20, 30],
            vec![
                vec![0.0, 0.0, 0.5],
                vec![0.0, 0.0, -0.5],
                vec![0.5, -0.5, 0.0],
            ],
        );

        let mut ratings = HashMap::new();
        ratings.insert(10, 3.0);
        ratings.insert(20, 2.0);

        let recommendations = recommend(&index, &ratings, 5, 5);

        assert!(recommendations.is_empty());
    }

    #[test]
    fn should_bound_results_and_exclude_rated_movies() {
        let mut rng = StdRng::seed_from_u64(42);
        let qty_movies = 30_usize;
        let inner_to_movie: Vec<MovieId> = (0..qty_movies as u64).map(|id| 100 + id).collect();

        let mut similarities = vec![vec![0.0; qty_movies]; qty_movies];
        for row in 0..qty_movies {
            for col in row + 1..qty_movies {
                let sim: f64 = rng.gen_range(-1.0..1.0);
                similarities[row][col] = sim;
                similarities[col][row] = sim;
            }
        }
        let index = test_index(inner_to_movie, similarities);

        let mut ratings = HashMap::new();
        for movie_id in [100_u64, 105, 110, 115] {
            ratings.insert(movie_id, rng.gen_range(1.0..5.0_f64));
        }

        let how_many = 5;
        let results = ranked(recommend(&index, &ratings, 10, how_many));

        assert!(results.len() <= how_many);
        for window in results.windows(2) {
            assert!(window[0].1 >= window[1].1);
        }
        let mut seen: Vec<MovieId> = results.iter().map(|(movie_id, _)| *movie_id).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), results.len());
        for (movie_id, _) in &results {
            assert!(!ratings.contains_key(movie_id));
        }
    }

    #[test]
    fn should_be_idempotent_over_an_unmodified_index() {
        let index = test_index(
            vec![10, 20, 30, 40],
            vec![
                vec![0.0, 0.8, 0.5, 0.2],
                vec![0.8, 0.0, 0.3, 0.0],
                vec![0.5, 0.3, 0.0, 0.9],
                vec![0.2, 0.0, 0.9, 0.0],
            ],
        );

        let mut ratings = HashMap::new();
        ratings.insert(10, 4.0);
        ratings.insert(30, 1.5);

        let first = ranked(recommend(&index, &ratings, 3, 3));
        let second = ranked(recommend(&index, &ratings, 3, 3));

        assert_eq!(first, second);
    }

    #[test]
    fn handle_reverse_ordering_moviescore() {
        let largest = MovieScore::new(123, 5000 as f64);
        let middle = MovieScore::new(234, 100 as f64);
        let smallest = MovieScore::new(543, 1 as f64);
        let movies = vec![largest, smallest, middle];

        let how_many = 2;
        let mut top_movies: BinaryHeap<MovieScore> = BinaryHeap::with_capacity(how_many);

        for moviescore in movies.into_iter() {
            if top_movies.len() < how_many {
                top_movies.push(moviescore);
            } else {
                let mut reverse_top = top_movies.peek_mut().unwrap();
                if moviescore.score > reverse_top.score {
                    // ordering is reverse thus, movie score is larger than the reverse top.
                    *reverse_top = moviescore;
                }
            }
        }
        // the results are the top `how_many` in reverse order
        assert_eq!(234, top_movies.pop().unwrap().id);
        assert_eq!(123, top_movies.pop().unwrap().id);
    }

    #[test]
    fn handle_vector_sort_ordering_moviescore() {
        let largest = MovieScore::new(123, 5000 as f64);
        let middle = MovieScore::new(234, 100 as f64);
        let smallest = MovieScore::new(543, 1 as f64);

        let mut recommendations: BinaryHeap<MovieScore> = BinaryHeap::new();
        recommendations.push(largest);
        recommendations.push(smallest);
        recommendations.push(middle);

        let recommended_movies: Vec<MovieId> = recommendations
            .into_sorted_vec()
            .iter()
            .map(|scored| scored.id)
            .collect();
        let expected_movies: Vec<MovieId> = vec![123, 234, 543];
        assert_eq!(expected_movies, recommended_movies);
    }
}
