use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::{
    error::{AppError, AppResult},
    models::{Movie, Rating},
};

use super::{Dataset, DatasetSource};

const MOVIE_COLUMNS: [&str; 4] = ["movieId", "title", "genres", "description"];
const RATING_COLUMNS: [&str; 3] = ["userId", "movieId", "rating"];

/// Loads the movies and ratings tables from CSV files with a header row
#[derive(Debug, Clone)]
pub struct CsvDatasetSource {
    movies_path: PathBuf,
    ratings_path: PathBuf,
}

impl CsvDatasetSource {
    pub fn new(movies_path: impl Into<PathBuf>, ratings_path: impl Into<PathBuf>) -> Self {
        Self {
            movies_path: movies_path.into(),
            ratings_path: ratings_path.into(),
        }
    }
}

impl DatasetSource for CsvDatasetSource {
    fn load(&self) -> AppResult<Dataset> {
        let movies = read_movies(
            open(&self.movies_path)?,
            &self.movies_path.display().to_string(),
        )?;
        let ratings = read_ratings(
            open(&self.ratings_path)?,
            &self.ratings_path.display().to_string(),
        )?;

        tracing::info!(
            movies = movies.len(),
            ratings = ratings.len(),
            "Loaded dataset from CSV"
        );

        Ok(Dataset::new(movies, ratings))
    }

    fn name(&self) -> String {
        format!(
            "csv({}, {})",
            self.movies_path.display(),
            self.ratings_path.display()
        )
    }
}

fn open(path: &Path) -> AppResult<File> {
    File::open(path).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "Failed to open data file");
        AppError::Io(e)
    })
}

/// Parses a movies table. Empty title, genres and description cells become empty strings.
pub fn read_movies<R: Read>(reader: R, source: &str) -> AppResult<Vec<Movie>> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers = reader.headers().map_err(|e| schema_error(source, e))?.clone();
    let [id_col, title_col, genres_col, description_col] =
        locate_columns(&headers, MOVIE_COLUMNS, source)?;

    let mut movies = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| schema_error(source, e))?;
        let line = line_of(&record);
        movies.push(Movie {
            movie_id: parse_field(&record, id_col, "movieId", source, line)?,
            title: field(&record, title_col).to_string(),
            genres: field(&record, genres_col).to_string(),
            description: field(&record, description_col).to_string(),
        });
    }

    Ok(movies)
}

/// Parses a ratings table, rejecting ratings that would collide with the zero "unrated" marker
pub fn read_ratings<R: Read>(reader: R, source: &str) -> AppResult<Vec<Rating>> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers = reader.headers().map_err(|e| schema_error(source, e))?.clone();
    let [user_col, movie_col, rating_col] = locate_columns(&headers, RATING_COLUMNS, source)?;

    let mut ratings = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| schema_error(source, e))?;
        let line = line_of(&record);
        let rating = Rating {
            user_id: parse_field(&record, user_col, "userId", source, line)?,
            movie_id: parse_field(&record, movie_col, "movieId", source, line)?,
            rating: parse_field(&record, rating_col, "rating", source, line)?,
        };

        if !rating.is_valid() {
            return Err(AppError::DataSchema(format!(
                "{}: line {}: rating {} must be a finite value greater than 0",
                source, line, rating.rating
            )));
        }

        ratings.push(rating);
    }

    Ok(ratings)
}

fn locate_columns<const N: usize>(
    headers: &StringRecord,
    required: [&str; N],
    source: &str,
) -> AppResult<[usize; N]> {
    let mut indices = [0; N];
    for (slot, name) in indices.iter_mut().zip(required) {
        *slot = headers.iter().position(|h| h == name).ok_or_else(|| {
            AppError::DataSchema(format!(
                "{}: missing required column '{}' (found: {:?})",
                source,
                name,
                headers.iter().collect::<Vec<_>>()
            ))
        })?;
    }
    Ok(indices)
}

fn field(record: &StringRecord, index: usize) -> &str {
    record.get(index).unwrap_or("")
}

fn parse_field<T: std::str::FromStr>(
    record: &StringRecord,
    index: usize,
    column: &str,
    source: &str,
    line: u64,
) -> AppResult<T> {
    let raw = field(record, index);
    raw.parse().map_err(|_| {
        AppError::DataSchema(format!(
            "{}: line {}: invalid {} value '{}'",
            source, line, column, raw
        ))
    })
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

fn schema_error(source: &str, e: csv::Error) -> AppError {
    match e.position() {
        Some(pos) => AppError::DataSchema(format!("{}: line {}: {}", source, pos.line(), e)),
        None => AppError::DataSchema(format!("{}: {}", source, e)),
    }
}
