use thiserror::Error;

pub type Result<T> = std::result::Result<T, MetricsError>;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),
    #[error("Malformed item: {0}")]
    MalformedItem(String),
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Cache error: {0}")]
    Cache(String),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid repository: {0}")]
    InvalidRepository(String),
    #[error("Git error: {0}")]
    Git(#[from] Box<gix::open::Error>),
    #[error("Git repository error: {0}")]
    GitRepo(String),
    #[error("Commit error: {0}")]
    Commit(#[from] Box<gix::object::commit::Error>),
    #[error("Object find with conversion error: {0}")]
    ObjectFindConv(#[from] Box<gix::object::find::existing::with_conversion::Error>),
    #[error("Object decode error: {0}")]
    ObjectDecode(#[from] Box<gix::objs::decode::Error>),
    #[error("Git discover error: {0}")]
    GitDiscover(#[from] Box<gix::discover::Error>),
}

impl MetricsError {
    /// Wraps any cache-layer failure so callers see a single condition.
    pub fn cache_unavailable(err: MetricsError) -> Self {
        match err {
            MetricsError::CacheUnavailable(_) => err,
            other => MetricsError::CacheUnavailable(other.to_string()),
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, MetricsError::MalformedItem(_))
    }
}

// Manual From implementations for unboxed to boxed conversions
impl From<gix::open::Error> for MetricsError {
    fn from(err: gix::open::Error) -> Self {
        MetricsError::Git(Box::new(err))
    }
}

impl From<gix::object::commit::Error> for MetricsError {
    fn from(err: gix::object::commit::Error) -> Self {
        MetricsError::Commit(Box::new(err))
    }
}

impl From<gix::object::find::existing::with_conversion::Error> for MetricsError {
    fn from(err: gix::object::find::existing::with_conversion::Error) -> Self {
        MetricsError::ObjectFindConv(Box::new(err))
    }
}

impl From<gix::objs::decode::Error> for MetricsError {
    fn from(err: gix::objs::decode::Error) -> Self {
        MetricsError::ObjectDecode(Box::new(err))
    }
}

impl From<gix::discover::Error> for MetricsError {
    fn from(err: gix::discover::Error) -> Self {
        MetricsError::GitDiscover(Box::new(err))
    }
}
