pub mod article;
pub mod config;
pub mod error;
pub mod flatten;

pub use article::Article;
pub use config::Config;
pub use error::{ArticleError, ConfigError};
pub use flatten::{flatten, FlatMap, FlatValue, FLATTEN_DELIMITER};
