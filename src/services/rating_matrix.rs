use std::collections::HashMap;

use crate::{
    error::{AppError, AppResult},
    models::{MovieId, Rating, UserId},
};

/// Dense user × movie rating matrix with stable index mappings.
///
/// Rows and columns are assigned in first-occurrence order of the source
/// ratings. A cell value of 0.0 means "unrated".
#[derive(Debug, Clone, PartialEq)]
pub struct RatingMatrix {
    /// Row-major cell values, `n_users * n_items` long
    values: Vec<f64>,
    n_items: usize,
    user_index: HashMap<UserId, usize>,
    index_user: Vec<UserId>,
    index_item: Vec<MovieId>,
}

impl RatingMatrix {
    /// Builds the matrix from ratings in arbitrary order. Repeated
    /// (user, movie) pairs keep the last value seen.
    pub fn build(ratings: &[Rating]) -> AppResult<Self> {
        let mut user_index: HashMap<UserId, usize> = HashMap::new();
        let mut item_index: HashMap<MovieId, usize> = HashMap::new();
        let mut index_user = Vec::new();
        let mut index_item = Vec::new();

        for rating in ratings {
            if !rating.is_valid() {
                return Err(AppError::DataSchema(format!(
                    "rating {} for user {} and movie {} must be a finite value greater than 0",
                    rating.rating, rating.user_id, rating.movie_id
                )));
            }
            user_index.entry(rating.user_id).or_insert_with(|| {
                index_user.push(rating.user_id);
                index_user.len() - 1
            });
            item_index.entry(rating.movie_id).or_insert_with(|| {
                index_item.push(rating.movie_id);
                index_item.len() - 1
            });
        }

        let n_items = index_item.len();
        let mut values = vec![0.0; index_user.len() * n_items];
        for rating in ratings {
            let row = user_index[&rating.user_id];
            let col = item_index[&rating.movie_id];
            values[row * n_items + col] = rating.rating;
        }

        Ok(Self {
            values,
            n_items,
            user_index,
            index_user,
            index_item,
        })
    }

    /// Builds a matrix directly from dense rows, using row and column
    /// positions as user and movie ids. Short rows are padded with zeros.
    pub fn from_rows(rows: &[Vec<f64>]) -> AppResult<Self> {
        let n_items = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut values = vec![0.0; rows.len() * n_items];

        for (u, row) in rows.iter().enumerate() {
            for (i, &value) in row.iter().enumerate() {
                if value != 0.0 && !Rating::new(u as UserId, i as MovieId, value).is_valid() {
                    return Err(AppError::DataSchema(format!(
                        "cell ({}, {}) holds invalid rating {}",
                        u, i, value
                    )));
                }
                values[u * n_items + i] = value;
            }
        }

        let index_user: Vec<UserId> = (0..rows.len() as UserId).collect();
        let index_item: Vec<MovieId> = (0..n_items as MovieId).collect();

        Ok(Self {
            values,
            n_items,
            user_index: index_user.iter().map(|&u| (u, u as usize)).collect(),
            index_user,
            index_item,
        })
    }

    pub fn n_users(&self) -> usize {
        self.index_user.len()
    }

    pub fn n_items(&self) -> usize {
        self.n_items
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.values[row * self.n_items..(row + 1) * self.n_items]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.n_users()).map(move |r| self.row(r))
    }

    pub fn user_row(&self, user_id: UserId) -> Option<usize> {
        self.user_index.get(&user_id).copied()
    }

    pub fn movie_id(&self, col: usize) -> MovieId {
        self.index_item[col]
    }
}
