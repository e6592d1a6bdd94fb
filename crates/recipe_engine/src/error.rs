use std::error::Error;

use crate::normalize::NormalizeError;
use crate::schema::SchemaError;
use crate::store::StoreError;

/// Everything that can go wrong while turning one fetched page into entities.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("structured data rejected")]
    Schema(#[from] SchemaError),
    #[error("site normalization failed")]
    Normalize(#[from] NormalizeError),
    #[error("ambiguous page: {recipes} Recipe and {profiles} ProfilePage objects")]
    AmbiguousPage { recipes: usize, profiles: usize },
    #[error("{type_name} object has no {field}")]
    MissingField {
        type_name: &'static str,
        field: &'static str,
    },
    #[error("store operation failed")]
    Store(#[from] StoreError),
}

impl ProcessError {
    /// Store failures are not about the page and must stop the worker.
    pub fn is_systemic(&self) -> bool {
        matches!(self, ProcessError::Store(_))
    }
}

/// `outer: inner: root` rendering of an error and all of its sources.
pub fn render_error_chain(err: &dyn Error) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_includes_every_source() {
        let err = ProcessError::from(SchemaError::UnknownTypes(vec!["NewsArticle".into()]));
        assert_eq!(
            render_error_chain(&err),
            "structured data rejected: unsupported structured data types: NewsArticle"
        );
    }
}
