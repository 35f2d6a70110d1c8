use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::{MovieId, ScoredMovie, SimilarMovie, UserId},
};

use super::AppState;

const DEFAULT_K: usize = 10;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct TopKQuery {
    #[serde(default = "default_k")]
    pub k: usize,
}

fn default_k() -> usize {
    DEFAULT_K
}

#[derive(Debug, Serialize)]
pub struct RecommendedMovieResponse {
    #[serde(rename = "movieId")]
    pub movie_id: MovieId,
    pub title: String,
    pub genres: String,
    pub score: f64,
}

impl From<&ScoredMovie> for RecommendedMovieResponse {
    fn from(scored: &ScoredMovie) -> Self {
        Self {
            movie_id: scored.movie.movie_id,
            title: scored.movie.title.clone(),
            genres: scored.movie.genres.clone(),
            score: scored.score,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SimilarMovieResponse {
    #[serde(rename = "movieId")]
    pub movie_id: MovieId,
    pub title: String,
    pub genres: String,
    pub similarity: f64,
}

impl From<&SimilarMovie> for SimilarMovieResponse {
    fn from(similar: &SimilarMovie) -> Self {
        Self {
            movie_id: similar.movie.movie_id,
            title: similar.movie.title.clone(),
            genres: similar.movie.genres.clone(),
            similarity: similar.similarity,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub user_id: UserId,
    pub recommendations: Vec<RecommendedMovieResponse>,
}

#[derive(Debug, Serialize)]
pub struct SimilarResponse {
    pub movie_id: MovieId,
    pub similar: Vec<SimilarMovieResponse>,
}

// Handlers

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "CineMatch API is running." }))
}

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Personalized recommendations for a user
pub async fn recommend_user(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    path: Result<Path<UserId>, PathRejection>,
    query: Result<Query<TopKQuery>, QueryRejection>,
) -> AppResult<Json<RecommendationsResponse>> {
    let Path(user_id) = path?;
    let Query(query) = query?;
    tracing::debug!(%request_id, user_id, top_k = query.k, "Recommending for user");

    let recommendations = state.recommender.recommend_for_user(user_id, query.k)?;

    Ok(Json(RecommendationsResponse {
        user_id,
        recommendations: recommendations
            .iter()
            .map(RecommendedMovieResponse::from)
            .collect(),
    }))
}

/// Content-similar movies for a movie
pub async fn similar_movies(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    path: Result<Path<MovieId>, PathRejection>,
    query: Result<Query<TopKQuery>, QueryRejection>,
) -> AppResult<Json<SimilarResponse>> {
    let Path(movie_id) = path?;
    let Query(query) = query?;
    tracing::debug!(%request_id, movie_id, top_k = query.k, "Finding similar movies");

    let similar = state.recommender.similar_movies(movie_id, query.k)?;

    Ok(Json(SimilarResponse {
        movie_id,
        similar: similar.iter().map(SimilarMovieResponse::from).collect(),
    }))
}
