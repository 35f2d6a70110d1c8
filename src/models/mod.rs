mod movie;
mod rating;

pub use movie::{Movie, MovieId, ScoredMovie, SimilarMovie};
pub use rating::{Rating, UserId};
