use crate::{
    data::DatasetSource,
    error::{AppError, AppResult},
    models::{MovieId, ScoredMovie, SimilarMovie, UserId},
    services::{
        collaborative::{CollaborativeFilter, DEFAULT_MIN_RATING},
        content::ContentModel,
    },
};

/// Default weight of the collaborative score
pub const DEFAULT_ALPHA: f64 = 0.6;

/// Collaborative candidates fetched per requested recommendation
const OVERFETCH_FACTOR: usize = 3;

/// Placeholder score for the non-personalized fallback
const FALLBACK_SCORE: f64 = 1.0;

/// Normalized value for a score set with no spread
const NEUTRAL_SCORE: f64 = 0.5;

const SPREAD_EPSILON: f64 = 1e-8;

/// Outcome of looking up a candidate's nearest content neighbour
#[derive(Debug)]
pub enum ContentAffinity {
    Nearest(f64),
    NoNeighbour,
    Failed(AppError),
}

impl ContentAffinity {
    fn lookup(content: &ContentModel, movie_id: MovieId) -> Self {
        match content.similar_movies(movie_id, 1) {
            Ok(similar) => match similar.first() {
                Some(nearest) => ContentAffinity::Nearest(nearest.similarity),
                None => ContentAffinity::NoNeighbour,
            },
            Err(e) => ContentAffinity::Failed(e),
        }
    }

    /// Affinity used for blending. Lookup failures score 0.0.
    pub fn score(&self) -> f64 {
        match self {
            ContentAffinity::Nearest(similarity) => *similarity,
            ContentAffinity::NoNeighbour | ContentAffinity::Failed(_) => 0.0,
        }
    }
}

/// Rescales `scores` to [0, 1]. A set whose spread is below 1e-8 maps every
/// member to 0.5.
pub fn min_max_normalize(scores: &[f64]) -> Vec<f64> {
    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let spread = max - min;

    if spread.is_nan() || spread < SPREAD_EPSILON {
        return vec![NEUTRAL_SCORE; scores.len()];
    }
    scores.iter().map(|s| (s - min) / spread).collect()
}

/// Blends collaborative and content scores into one ranking
#[derive(Debug, Clone)]
pub struct HybridRecommender {
    alpha: f64,
    collaborative: CollaborativeFilter,
    content: ContentModel,
    fitted: bool,
}

impl HybridRecommender {
    /// `alpha` weighs the collaborative score and must lie in [0, 1]
    pub fn new(alpha: f64, max_features: usize) -> AppResult<Self> {
        if !alpha.is_finite() || !(0.0..=1.0).contains(&alpha) {
            return Err(AppError::InvalidInput(format!(
                "alpha must be within [0, 1], got {}",
                alpha
            )));
        }

        Ok(Self {
            alpha,
            collaborative: CollaborativeFilter::new(),
            content: ContentModel::new(max_features),
            fitted: false,
        })
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    /// Loads the dataset and fits both component models. On error the
    /// previously fitted state is left untouched.
    pub fn fit(&mut self, source: &dyn DatasetSource) -> AppResult<()> {
        tracing::info!(source = %source.name(), "Fitting hybrid recommender");
        let dataset = source.load()?;

        let mut content = ContentModel::new(self.content.max_features());
        content.fit(&dataset.movies)?;
        let mut collaborative = CollaborativeFilter::new();
        collaborative.fit(&dataset.ratings)?;

        self.content = content;
        self.collaborative = collaborative;
        self.fitted = true;
        Ok(())
    }

    fn ensure_fitted(&self) -> AppResult<()> {
        if self.fitted {
            Ok(())
        } else {
            Err(AppError::NotFitted)
        }
    }

    /// Personalized top-`top_k` recommendations, highest score first.
    ///
    /// When the collaborative filter has no candidates for the user, the
    /// first `top_k` catalog movies are returned with a placeholder score.
    pub fn recommend_for_user(&self, user_id: UserId, top_k: usize) -> AppResult<Vec<ScoredMovie>> {
        self.ensure_fitted()?;

        let candidates = self.collaborative.recommend_for_user(
            user_id,
            top_k.saturating_mul(OVERFETCH_FACTOR),
            DEFAULT_MIN_RATING,
        )?;

        if candidates.is_empty() {
            tracing::debug!(user_id, top_k, "No collaborative candidates, using fallback");
            return Ok(self
                .content
                .catalog()?
                .iter()
                .take(top_k)
                .map(|movie| ScoredMovie {
                    movie: movie.clone(),
                    score: FALLBACK_SCORE,
                })
                .collect());
        }

        let cf_scores: Vec<f64> = candidates.iter().map(|(_, score)| *score).collect();
        let content_scores: Vec<f64> = candidates
            .iter()
            .map(|&(movie_id, _)| {
                let affinity = ContentAffinity::lookup(&self.content, movie_id);
                match &affinity {
                    ContentAffinity::Failed(e) => {
                        tracing::warn!(movie_id, error = %e, "Content affinity lookup failed")
                    }
                    ContentAffinity::NoNeighbour => {
                        tracing::warn!(movie_id, "Content affinity has no neighbour")
                    }
                    ContentAffinity::Nearest(_) => {}
                }
                affinity.score()
            })
            .collect();

        let cf_norm = min_max_normalize(&cf_scores);
        let content_norm = min_max_normalize(&content_scores);

        let mut blended: Vec<(MovieId, f64)> = candidates
            .iter()
            .zip(cf_norm.iter().zip(&content_norm))
            .map(|(&(movie_id, _), (cf, content))| {
                (movie_id, self.alpha * cf + (1.0 - self.alpha) * content)
            })
            .collect();

        // Stable: equal scores keep candidate order
        blended.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        blended.truncate(top_k);

        let mut recommendations = Vec::with_capacity(blended.len());
        for (movie_id, score) in blended {
            match self.content.movie(movie_id)? {
                Some(movie) => recommendations.push(ScoredMovie {
                    movie: movie.clone(),
                    score,
                }),
                None => tracing::debug!(movie_id, "Dropping candidate missing from catalog"),
            }
        }

        tracing::debug!(
            user_id,
            top_k,
            candidates = candidates.len(),
            returned = recommendations.len(),
            "Hybrid recommendations computed"
        );

        Ok(recommendations)
    }

    pub fn similar_movies(&self, movie_id: MovieId, top_k: usize) -> AppResult<Vec<SimilarMovie>> {
        self.ensure_fitted()?;
        self.content.similar_movies(movie_id, top_k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::{Dataset, MockDatasetSource},
        models::{Movie, Rating},
    };

    fn dataset() -> Dataset {
        Dataset::new(
            vec![
                Movie::new(10, "Space Odyssey", "Sci-Fi", "astronauts drift through space"),
                Movie::new(20, "Space Rescue", "Sci-Fi|Action", "astronauts rescue a crew"),
                Movie::new(30, "Bank Heist", "Crime", "robbers plan a heist"),
                Movie::new(40, "Heist Night", "Crime|Thriller", "a second heist goes wrong"),
                Movie::new(50, "Quiet Garden", "Drama", ""),
            ],
            vec![
                Rating::new(1, 10, 5.0),
                Rating::new(1, 30, 4.0),
                Rating::new(2, 10, 4.0),
                Rating::new(2, 20, 5.0),
                Rating::new(2, 40, 3.0),
                Rating::new(3, 30, 5.0),
                Rating::new(3, 40, 4.0),
                Rating::new(3, 50, 2.0),
                Rating::new(4, 50, 4.0),
            ],
        )
    }

    fn fitted(data: Dataset) -> HybridRecommender {
        let mut recommender = HybridRecommender::new(DEFAULT_ALPHA, 100).unwrap();
        recommender.fit(&data).unwrap();
        recommender
    }

    #[test]
    fn test_min_max_normalize() {
        assert_eq!(min_max_normalize(&[1.0, 3.0, 2.0]), vec![0.0, 1.0, 0.5]);
    }

    #[test]
    fn test_min_max_normalize_zero_spread() {
        assert_eq!(min_max_normalize(&[2.0, 2.0, 2.0]), vec![0.5, 0.5, 0.5]);
        assert!(min_max_normalize(&[]).is_empty());
    }

    #[test]
    fn test_min_max_normalize_keeps_order() {
        let scores = [0.1, 0.9, 0.4, 0.7];
        let normalized = min_max_normalize(&scores);
        for i in 0..scores.len() {
            for j in 0..scores.len() {
                if scores[i] < scores[j] {
                    assert!(normalized[i] < normalized[j]);
                }
            }
        }
    }

    #[test]
    fn test_rejects_alpha_out_of_range() {
        for alpha in [-0.1, 1.5, f64::NAN] {
            assert!(matches!(
                HybridRecommender::new(alpha, 100),
                Err(AppError::InvalidInput(_))
            ));
        }
        assert!(HybridRecommender::new(0.0, 100).is_ok());
        assert!(HybridRecommender::new(1.0, 100).is_ok());
    }

    #[test]
    fn test_not_fitted() {
        let recommender = HybridRecommender::new(DEFAULT_ALPHA, 100).unwrap();
        assert!(!recommender.is_fitted());
        assert!(matches!(
            recommender.recommend_for_user(1, 5),
            Err(AppError::NotFitted)
        ));
        assert!(matches!(
            recommender.similar_movies(10, 5),
            Err(AppError::NotFitted)
        ));
    }

    #[test]
    fn test_unknown_user_propagates() {
        let recommender = fitted(dataset());
        assert!(matches!(
            recommender.recommend_for_user(999999, 5),
            Err(AppError::UnknownUser(999999))
        ));
    }

    #[test]
    fn test_recommendations_exclude_rated_movies() {
        let data = dataset();
        let recommender = fitted(data.clone());
        for user in [1, 2, 3] {
            let recs = recommender.recommend_for_user(user, 10).unwrap();
            assert!(recs.windows(2).all(|w| w[0].score >= w[1].score));
            for rec in &recs {
                assert!(!data
                    .ratings
                    .iter()
                    .any(|r| r.user_id == user && r.movie_id == rec.movie.movie_id));
            }
        }
    }

    #[test]
    fn test_top_k_zero_is_empty() {
        let recommender = fitted(dataset());
        assert!(recommender.recommend_for_user(1, 0).unwrap().is_empty());
    }

    #[test]
    fn test_cold_start_fallback() {
        // Neither user overlaps the other, so there are no candidates
        let data = Dataset::new(
            dataset().movies,
            vec![Rating::new(1, 10, 5.0), Rating::new(2, 20, 4.0)],
        );
        let recommender = fitted(data);
        let recs = recommender.recommend_for_user(1, 3).unwrap();

        let ids: Vec<MovieId> = recs.iter().map(|r| r.movie.movie_id).collect();
        assert_eq!(ids, vec![10, 20, 30]);
        assert!(recs.iter().all(|r| r.score == FALLBACK_SCORE));
    }

    #[test]
    fn test_blended_score_values() {
        let data = dataset();
        let recommender = fitted(data.clone());
        let recs = recommender.recommend_for_user(1, 10).unwrap();

        let mut cf = CollaborativeFilter::new();
        cf.fit(&data.ratings).unwrap();
        let candidates = cf.recommend_for_user(1, 30, DEFAULT_MIN_RATING).unwrap();
        let mut content = ContentModel::new(100);
        content.fit(&data.movies).unwrap();

        let cf_scores: Vec<f64> = candidates.iter().map(|(_, s)| *s).collect();
        let content_scores: Vec<f64> = candidates
            .iter()
            .map(|(id, _)| content.similar_movies(*id, 1).unwrap()[0].similarity)
            .collect();
        let cf_norm = min_max_normalize(&cf_scores);
        let content_norm = min_max_normalize(&content_scores);

        assert_eq!(recs.len(), candidates.len());
        for (i, (movie_id, _)) in candidates.iter().enumerate() {
            let expected = DEFAULT_ALPHA * cf_norm[i] + (1.0 - DEFAULT_ALPHA) * content_norm[i];
            let rec = recs.iter().find(|r| r.movie.movie_id == *movie_id).unwrap();
            assert!((rec.score - expected).abs() < 1e-12);
        }

        // User 1 gets movies 40, 20 and 50
        let score_of = |id: MovieId| recs.iter().find(|r| r.movie.movie_id == id).unwrap().score;
        assert!((score_of(40) - 1.0).abs() < 1e-9);
        assert!((score_of(20) - 0.7223448076759615).abs() < 1e-9);
        assert!(score_of(50).abs() < 1e-9);
    }

    #[test]
    fn test_alpha_one_follows_collaborative_order() {
        let data = dataset();
        let mut recommender = HybridRecommender::new(1.0, 100).unwrap();
        recommender.fit(&data).unwrap();

        let mut cf = CollaborativeFilter::new();
        cf.fit(&data.ratings).unwrap();
        let cf_ids: Vec<MovieId> = cf
            .recommend_for_user(1, 2, DEFAULT_MIN_RATING)
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();

        let ids: Vec<MovieId> = recommender
            .recommend_for_user(1, 2)
            .unwrap()
            .iter()
            .map(|r| r.movie.movie_id)
            .collect();
        assert_eq!(ids, cf_ids);
    }

    #[test]
    fn test_candidates_missing_from_catalog_are_dropped() {
        let mut data = dataset();
        data.ratings.push(Rating::new(2, 99, 5.0));
        let recommender = fitted(data);
        let recs = recommender.recommend_for_user(1, 10).unwrap();
        assert!(!recs.is_empty());
        assert!(recs.iter().all(|r| r.movie.movie_id != 99));
    }

    #[test]
    fn test_deterministic() {
        let recommender = fitted(dataset());
        let first = recommender.recommend_for_user(3, 5).unwrap();
        for _ in 0..5 {
            assert_eq!(recommender.recommend_for_user(3, 5).unwrap(), first);
        }
    }

    #[test]
    fn test_similar_movies_passthrough() {
        let recommender = fitted(dataset());
        let similar = recommender.similar_movies(30, 1).unwrap();
        assert_eq!(similar[0].movie.movie_id, 40);
    }

    #[test]
    fn test_content_affinity_soft_failure() {
        let mut content = ContentModel::new(100);
        content.fit(&dataset().movies).unwrap();
        let affinity = ContentAffinity::lookup(&content, 99);
        assert!(matches!(affinity, ContentAffinity::Failed(AppError::UnknownItem(99))));
        assert_eq!(affinity.score(), 0.0);
    }

    #[test]
    fn test_fit_loads_source_once() {
        let data = dataset();
        let mut source = MockDatasetSource::new();
        source
            .expect_name()
            .return_const("mock".to_string());
        source
            .expect_load()
            .times(1)
            .returning(move || Ok(data.clone()));

        let mut recommender = HybridRecommender::new(DEFAULT_ALPHA, 100).unwrap();
        recommender.fit(&source).unwrap();
        assert!(recommender.is_fitted());
    }

    #[test]
    fn test_fit_propagates_loader_error() {
        let mut source = MockDatasetSource::new();
        source
            .expect_name()
            .return_const("mock".to_string());
        source
            .expect_load()
            .returning(|| Err(AppError::DataSchema("missing column 'rating'".to_string())));

        let mut recommender = HybridRecommender::new(DEFAULT_ALPHA, 100).unwrap();
        assert!(matches!(
            recommender.fit(&source),
            Err(AppError::DataSchema(_))
        ));
        assert!(!recommender.is_fitted());
    }
}
