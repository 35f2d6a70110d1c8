use crate::{
    error::{AppError, AppResult},
    models::{MovieId, Rating, UserId},
    services::{rating_matrix::RatingMatrix, similarity::cosine_dense},
};

/// Default `min_rating` passed by callers. It is accepted but not applied.
pub const DEFAULT_MIN_RATING: f64 = 3.0;

/// Substituted for a zero similarity mass so the weighted average stays finite
const SIMILARITY_EPSILON: f64 = 1e-8;

/// Marks movies the target user has already rated
const RATED_SCORE: f64 = -1.0;

/// User-based collaborative filter over a dense rating matrix
#[derive(Debug, Clone, Default)]
pub struct CollaborativeFilter {
    matrix: Option<RatingMatrix>,
}

impl CollaborativeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an already-built matrix
    pub fn from_matrix(matrix: RatingMatrix) -> Self {
        Self {
            matrix: Some(matrix),
        }
    }

    /// Builds the rating matrix and index maps
    pub fn fit(&mut self, ratings: &[Rating]) -> AppResult<()> {
        let matrix = RatingMatrix::build(ratings)?;
        tracing::info!(
            users = matrix.n_users(),
            movies = matrix.n_items(),
            ratings = ratings.len(),
            "Collaborative filter fitted"
        );
        self.matrix = Some(matrix);
        Ok(())
    }

    pub fn matrix(&self) -> AppResult<&RatingMatrix> {
        self.matrix.as_ref().ok_or(AppError::NotFitted)
    }

    /// Recommends unrated movies for a user, scored by the similarity-weighted
    /// average of the other users' ratings.
    ///
    /// Returns at most `top_k` (movie, score) pairs, all with a positive score,
    /// in descending score order. Ties keep matrix column order.
    pub fn recommend_for_user(
        &self,
        user_id: UserId,
        top_k: usize,
        _min_rating: f64,
    ) -> AppResult<Vec<(MovieId, f64)>> {
        let matrix = self.matrix()?;
        let row = matrix
            .user_row(user_id)
            .ok_or(AppError::UnknownUser(user_id))?;
        let target = matrix.row(row);

        let mut similarities: Vec<f64> = matrix
            .rows()
            .map(|other| cosine_dense(target, other))
            .collect();
        similarities[row] = 0.0;

        let total: f64 = similarities.iter().sum();
        let denominator = if total == 0.0 { SIMILARITY_EPSILON } else { total };

        let mut weighted = vec![0.0; matrix.n_items()];
        for (u, &similarity) in similarities.iter().enumerate() {
            if similarity == 0.0 {
                continue;
            }
            for (col, &value) in matrix.row(u).iter().enumerate() {
                weighted[col] += similarity * value;
            }
        }

        let mut scored: Vec<(usize, f64)> = weighted
            .into_iter()
            .enumerate()
            .map(|(col, sum)| {
                if target[col] > 0.0 {
                    (col, RATED_SCORE)
                } else {
                    (col, sum / denominator)
                }
            })
            .collect();

        // Stable: equal scores stay in column order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let recommendations: Vec<(MovieId, f64)> = scored
            .into_iter()
            .take(top_k)
            .filter(|(_, score)| *score > 0.0)
            .map(|(col, score)| (matrix.movie_id(col), score))
            .collect();

        tracing::debug!(
            user_id,
            top_k,
            returned = recommendations.len(),
            "Collaborative recommendations computed"
        );

        Ok(recommendations)
    }
}
