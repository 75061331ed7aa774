//! Download attestation models.

use serde::Serialize;

use crate::api::ApiError;

/// Use statement sent when the caller does not write their own
pub const DEFAULT_USE_STATEMENT: &str = "Downloading this data as part of a research project.";

/// Use category sent when the caller does not pick their own
pub const DEFAULT_USE_CATEGORY: &str = "Research";

/// Credentials and usage attestation for downloading media bundles.
///
/// Exactly one of the usage-category forms is required: a non-empty
/// `use_categories` list, or a non-empty `use_category_other`. When both
/// are given the list is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadConfig {
    api_key: String,
    use_statement: String,
    use_categories: Vec<String>,
    use_category_other: Option<String>,
}

impl DownloadConfig {
    pub fn new(
        api_key: impl Into<String>,
        use_statement: impl Into<String>,
        use_categories: Vec<String>,
        use_category_other: Option<String>,
    ) -> Result<Self, ApiError> {
        let use_categories: Vec<String> = use_categories
            .into_iter()
            .filter(|c| !c.is_empty())
            .collect();
        let use_category_other = use_category_other.filter(|c| !c.is_empty());

        if use_categories.is_empty() && use_category_other.is_none() {
            return Err(ApiError::InvalidConfig(
                "Either use_categories or use_category_other must have a value.".to_string(),
            ));
        }

        Ok(Self {
            api_key: api_key.into(),
            use_statement: use_statement.into(),
            use_categories,
            use_category_other,
        })
    }

    /// Attest with a list of standard categories
    pub fn with_categories<I, S>(
        api_key: impl Into<String>,
        use_statement: impl Into<String>,
        categories: I,
    ) -> Result<Self, ApiError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let categories = categories.into_iter().map(Into::into).collect();
        Self::new(api_key, use_statement, categories, None)
    }

    /// Attest with a free-text category
    pub fn with_other_category(
        api_key: impl Into<String>,
        use_statement: impl Into<String>,
        other: impl Into<String>,
    ) -> Result<Self, ApiError> {
        Self::new(api_key, use_statement, Vec::new(), Some(other.into()))
    }

    /// Default research attestation
    pub fn research(api_key: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_categories(api_key, DEFAULT_USE_STATEMENT, [DEFAULT_USE_CATEGORY])
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn use_statement(&self) -> &str {
        &self.use_statement
    }

    pub fn use_categories(&self) -> &[String] {
        &self.use_categories
    }

    pub fn use_category_other(&self) -> Option<&str> {
        self.use_category_other.as_deref()
    }

    /// JSON body of the download-URL exchange
    pub fn request_body(&self) -> DownloadRequestBody<'_> {
        let (use_categories, use_category_other) = if self.use_categories.is_empty() {
            (None, self.use_category_other.as_deref())
        } else {
            (Some(self.use_categories.as_slice()), None)
        };

        DownloadRequestBody {
            use_statement: &self.use_statement,
            agreements_accepted: true,
            use_categories,
            use_category_other,
        }
    }
}

/// Body of `POST /download/{id}`
#[derive(Debug, Serialize, PartialEq)]
pub struct DownloadRequestBody<'a> {
    pub use_statement: &'a str,
    pub agreements_accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_categories: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_category_other: Option<&'a str>,
}
