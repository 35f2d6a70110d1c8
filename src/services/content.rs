use std::collections::HashMap;

use crate::{
    error::{AppError, AppResult},
    models::{Movie, MovieId, SimilarMovie},
    services::{
        similarity::{cosine_sparse, SparseVector},
        tfidf::TfidfVectorizer,
    },
};

/// Fitted catalog state. Immutable once built.
#[derive(Debug, Clone)]
struct ContentIndex {
    movies: Vec<Movie>,
    embeddings: Vec<SparseVector>,
    /// First catalog position of each movie id
    positions: HashMap<MovieId, usize>,
}

/// Item-item content similarity over TF-IDF vectors of each movie's
/// title, genres and description
#[derive(Debug, Clone)]
pub struct ContentModel {
    max_features: usize,
    index: Option<ContentIndex>,
}

impl ContentModel {
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features,
            index: None,
        }
    }

    pub fn max_features(&self) -> usize {
        self.max_features
    }

    pub fn fit(&mut self, movies: &[Movie]) -> AppResult<()> {
        let texts: Vec<String> = movies.iter().map(Movie::text).collect();
        let mut vectorizer = TfidfVectorizer::new(self.max_features);
        let embeddings = vectorizer.fit_transform(&texts);

        let mut positions = HashMap::with_capacity(movies.len());
        for (position, movie) in movies.iter().enumerate() {
            positions.entry(movie.movie_id).or_insert(position);
        }

        tracing::info!(
            movies = movies.len(),
            vocabulary = vectorizer.vocabulary_len(),
            "Content model fitted"
        );

        self.index = Some(ContentIndex {
            movies: movies.to_vec(),
            embeddings,
            positions,
        });
        Ok(())
    }

    fn index(&self) -> AppResult<&ContentIndex> {
        self.index.as_ref().ok_or(AppError::NotFitted)
    }

    /// The fitted catalog in input order
    pub fn catalog(&self) -> AppResult<&[Movie]> {
        Ok(&self.index()?.movies)
    }

    /// Looks up a catalog record by id
    pub fn movie(&self, movie_id: MovieId) -> AppResult<Option<&Movie>> {
        let index = self.index()?;
        Ok(index
            .positions
            .get(&movie_id)
            .map(|&position| &index.movies[position]))
    }

    /// Returns up to `top_k` movies most similar to `movie_id`, most similar
    /// first. The query movie itself is never included.
    pub fn similar_movies(&self, movie_id: MovieId, top_k: usize) -> AppResult<Vec<SimilarMovie>> {
        let index = self.index()?;
        let &query = index
            .positions
            .get(&movie_id)
            .ok_or(AppError::UnknownItem(movie_id))?;
        let target = &index.embeddings[query];

        let mut scored: Vec<(usize, f64)> = index
            .embeddings
            .iter()
            .enumerate()
            .map(|(position, embedding)| (position, cosine_sparse(target, embedding)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let similar: Vec<SimilarMovie> = scored
            .into_iter()
            .filter(|(position, _)| index.movies[*position].movie_id != movie_id)
            .take(top_k)
            .map(|(position, similarity)| SimilarMovie {
                movie: index.movies[position].clone(),
                similarity,
            })
            .collect();

        tracing::debug!(
            movie_id,
            top_k,
            returned = similar.len(),
            "Similar movies computed"
        );

        Ok(similar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Movie> {
        vec![
            Movie::new(1, "Space Odyssey", "Sci-Fi", "astronauts drift through space"),
            Movie::new(2, "Space Rescue", "Sci-Fi|Action", "astronauts rescue a crew in space"),
            Movie::new(3, "Bank Heist", "Crime", "robbers plan a heist"),
            Movie::new(4, "Quiet Garden", "Drama", ""),
        ]
    }

    fn fitted() -> ContentModel {
        let mut model = ContentModel::new(100);
        model.fit(&catalog()).unwrap();
        model
    }

    #[test]
    fn test_not_fitted() {
        let model = ContentModel::new(100);
        assert!(matches!(model.similar_movies(1, 3), Err(AppError::NotFitted)));
        assert!(matches!(model.catalog(), Err(AppError::NotFitted)));
    }

    #[test]
    fn test_unknown_item() {
        let model = fitted();
        assert!(matches!(
            model.similar_movies(99, 3),
            Err(AppError::UnknownItem(99))
        ));
    }

    #[test]
    fn test_nearest_neighbour_shares_vocabulary() {
        let model = fitted();
        let similar = model.similar_movies(1, 1).unwrap();
        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0].movie.movie_id, 2);
        assert!(similar[0].similarity > 0.0);
    }

    #[test]
    fn test_excludes_query_movie() {
        let model = fitted();
        for movie in catalog() {
            let similar = model.similar_movies(movie.movie_id, 10).unwrap();
            assert_eq!(similar.len(), 3);
            assert!(similar.iter().all(|s| s.movie.movie_id != movie.movie_id));
        }
    }

    #[test]
    fn test_descending_with_catalog_order_ties() {
        let model = fitted();
        let similar = model.similar_movies(3, 10).unwrap();
        assert!(similar.windows(2).all(|w| w[0].similarity >= w[1].similarity));
        // Movies 1, 2 and 4 share nothing with the heist: all tie at zero
        let ids: Vec<MovieId> = similar.iter().map(|s| s.movie.movie_id).collect();
        assert_eq!(ids, vec![1, 2, 4]);
    }

    #[test]
    fn test_top_k_zero_is_empty() {
        assert!(fitted().similar_movies(1, 0).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_ids_resolve_to_first_occurrence() {
        let mut movies = catalog();
        movies.push(Movie::new(1, "Duplicate", "Western", "cowboys"));
        let mut model = ContentModel::new(100);
        model.fit(&movies).unwrap();

        assert_eq!(model.movie(1).unwrap().map(|m| m.title.as_str()), Some("Space Odyssey"));
        let similar = model.similar_movies(1, 10).unwrap();
        assert!(similar.iter().all(|s| s.movie.movie_id != 1));
        assert_eq!(model.catalog().unwrap().len(), 5);
    }

    #[test]
    fn test_single_movie_catalog_has_no_neighbours() {
        let mut model = ContentModel::new(100);
        model.fit(&[Movie::new(1, "Alone", "Drama", "")]).unwrap();
        assert!(model.similar_movies(1, 5).unwrap().is_empty());
    }
}
