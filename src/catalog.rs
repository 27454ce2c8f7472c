use anyhow::{anyhow, Context};
use hashbrown::HashMap;

use crate::io::MovieId;

/// In-memory movie catalog mapping external movie ids to display titles and
/// back. Loaded once at startup from a `movieid,title,genre` csv file.
pub struct MovieCatalog {
    title_to_id: HashMap<String, MovieId>,
    id_to_title: HashMap<MovieId, String>,
}

impl MovieCatalog {
    pub fn new_from_csv(catalog_path: &str) -> anyhow::Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(catalog_path)
            .with_context(|| format!("Could not open movie catalog {}", catalog_path))?;

        let mut title_to_id = HashMap::new();
        let mut id_to_title = HashMap::new();

        for (row, result) in reader.records().enumerate() {
            let record = result.with_context(|| format!("Malformed catalog row {}", row))?;
            let movie_id: MovieId = record
                .get(0)
                .ok_or_else(|| anyhow!("Missing movieid in catalog row {}", row))?
                .trim()
                .parse()
                .with_context(|| format!("Unparseable movieid in catalog row {}", row))?;
            let title = record
                .get(1)
                .ok_or_else(|| anyhow!("Missing title in catalog row {}", row))?
                .trim()
                .to_string();

            title_to_id.insert(title.clone(), movie_id);
            id_to_title.insert(movie_id, title);
        }

        Ok(MovieCatalog {
            title_to_id,
            id_to_title,
        })
    }

    pub fn id_by_title(&self, title: &str) -> Option<MovieId> {
        self.title_to_id.get(title).copied()
    }

    pub fn title_by_id(&self, movie_id: &MovieId) -> Option<&str> {
        self.id_to_title.get(movie_id).map(|title| title.as_str())
    }

    pub fn qty_movies(&self) -> usize {
        self.id_to_title.len()
    }
}

#[cfg(test)]
mod catalog_test {
    use std::fs::File;
    use std::io::Write;

    use super::*;

    #[test]
    fn should_resolve_titles_in_both_directions() {
        let catalog_path = std::env::temp_dir().join(format!(
            "reelknn-catalog-test-{}.csv",
            std::process::id()
        ));
        let mut file = File::create(&catalog_path).unwrap();
        writeln!(file, "movieid,title,genre").unwrap();
        writeln!(file, "1,Toy Story (1995),Animation").unwrap();
        writeln!(file, "32,Twelve Monkeys (1995),Sci-Fi").unwrap();
        drop(file);

        let catalog = MovieCatalog::new_from_csv(catalog_path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&catalog_path).unwrap();

        assert_eq!(2, catalog.qty_movies());
        assert_eq!(Some(32), catalog.id_by_title("Twelve Monkeys (1995)"));
        assert_eq!(Some("Toy Story (1995)"), catalog.title_by_id(&1));
        assert_eq!(None, catalog.id_by_title("Unknown Movie"));
        assert_eq!(None, catalog.title_by_id(&999));
    }
}
