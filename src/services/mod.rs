pub mod collaborative;
pub mod content;
pub mod evaluation;
pub mod hybrid;
pub mod rating_matrix;
pub mod similarity;
pub mod tfidf;

pub use collaborative::CollaborativeFilter;
pub use content::ContentModel;
pub use hybrid::HybridRecommender;
