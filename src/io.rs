use rayon::iter::ParallelBridge;
use rayon::prelude::ParallelIterator;
use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

pub type MovieId = u64;
pub type Rating = f64;
pub type Similarity = f64;

/// Reads a trained similarity dump with one `movie_a movie_b similarity` triple
/// per line, whitespace separated, first line being a header.
pub fn read_similarity_triples(model_path: &str) -> Vec<(MovieId, MovieId, Similarity)> {
    let mut line_iterator = create_buffered_line_reader(model_path).unwrap();
    line_iterator.next(); // skip header
    let triples = line_iterator.par_bridge().filter_map(move |result| {
        if let Ok(rawline) = result {
            let parts = rawline.split_whitespace().take(3).collect::<Vec<_>>();
            let (movie_a, movie_b, similarity) = (
                parts.get(0).unwrap().parse::<MovieId>().unwrap(),
                parts.get(1).unwrap().parse::<MovieId>().unwrap(),
                parts.get(2).unwrap().parse::<Similarity>().unwrap(),
            );
            Some((movie_a, movie_b, similarity))
        } else {
            None
        }
    });
    triples.collect()
}

fn create_buffered_line_reader<P>(filename: P) -> io::Result<io::Lines<io::BufReader<File>>>
where
    P: AsRef<Path>,
{
    let file = File::open(filename)?;
    Ok(io::BufReader::new(file).lines())
}
