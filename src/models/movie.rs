use serde::Serialize;

/// Identifier of a movie in both the catalog and the ratings table
pub type MovieId = i64;

/// A catalog entry
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Movie {
    #[serde(rename = "movieId")]
    pub movie_id: MovieId,
    pub title: String,
    /// Pipe-separated genre list, e.g. "Action|Sci-Fi"
    pub genres: String,
    pub description: String,
}

impl Movie {
    pub fn new(
        movie_id: MovieId,
        title: impl Into<String>,
        genres: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            movie_id,
            title: title.into(),
            genres: genres.into(),
            description: description.into(),
        }
    }

    /// Combined text field fed to the content model
    pub fn text(&self) -> String {
        format!("{} {} {}", self.title, self.genres, self.description)
    }
}

/// A movie paired with its blended recommendation score
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScoredMovie {
    #[serde(flatten)]
    pub movie: Movie,
    pub score: f64,
}

/// A movie paired with its content similarity to a query movie
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SimilarMovie {
    #[serde(flatten)]
    pub movie: Movie,
    pub similarity: f64,
}
