use serde::Serialize;

use super::MovieId;

/// Identifier of a user in the ratings table
pub type UserId = i64;

/// One observed (user, movie, rating) triple
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Rating {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    #[serde(rename = "movieId")]
    pub movie_id: MovieId,
    pub rating: f64,
}

impl Rating {
    pub fn new(user_id: UserId, movie_id: MovieId, rating: f64) -> Self {
        Self {
            user_id,
            movie_id,
            rating,
        }
    }

    /// Zero marks an unrated matrix cell, so valid ratings are finite and positive
    pub fn is_valid(&self) -> bool {
        self.rating.is_finite() && self.rating > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_ratings() {
        assert!(Rating::new(1, 1, 0.5).is_valid());
        assert!(Rating::new(1, 1, 5.0).is_valid());
    }

    #[test]
    fn test_reserved_and_non_finite_ratings() {
        assert!(!Rating::new(1, 1, 0.0).is_valid());
        assert!(!Rating::new(1, 1, -1.0).is_valid());
        assert!(!Rating::new(1, 1, f64::NAN).is_valid());
        assert!(!Rating::new(1, 1, f64::INFINITY).is_valid());
    }
}
