use super::pattern::PathPattern;
use super::CorsConfigError;
use http::{HeaderName, Method};
use serde::Serialize;
use std::time::Duration;
use url::Url;

/// Default preflight cache lifetime for new rules.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(1800);

/// Either every value is allowed (`*`), or only the listed ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowList<T> {
    Any,
    Only(Vec<T>),
}

impl<T> AllowList<T> {
    pub fn is_any(&self) -> bool {
        matches!(self, AllowList::Any)
    }

    /// Whether any listed value satisfies `pred`; always true for `Any`.
    pub fn allows(&self, pred: impl Fn(&T) -> bool) -> bool {
        match self {
            AllowList::Any => true,
            AllowList::Only(values) => values.iter().any(pred),
        }
    }
}

/// A CORS rule scoped to the paths matched by its pattern.
///
/// New rules start from permissive defaults (any origin, `GET, HEAD, POST`,
/// any header, no credentials, 30 minute max age); the builder methods
/// replace those values.
#[derive(Debug, Clone)]
pub struct CorsRule {
    pattern: PathPattern,
    allowed_origins: AllowList<String>,
    allowed_methods: AllowList<Method>,
    allowed_headers: AllowList<HeaderName>,
    exposed_headers: Vec<HeaderName>,
    allow_credentials: bool,
    max_age: Option<Duration>,
}

impl CorsRule {
    pub fn new(pattern: &str) -> Result<Self, CorsConfigError> {
        Ok(Self {
            pattern: PathPattern::parse(pattern)?,
            allowed_origins: AllowList::Any,
            allowed_methods: AllowList::Only(vec![Method::GET, Method::HEAD, Method::POST]),
            allowed_headers: AllowList::Any,
            exposed_headers: Vec::new(),
            allow_credentials: false,
            max_age: Some(DEFAULT_MAX_AGE),
        })
    }

    /// Replace the allowed origins. A `"*"` entry allows any origin.
    pub fn allowed_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let origins: Vec<String> = origins
            .into_iter()
            .map(|o| normalize_origin(o.as_ref()))
            .collect();
        self.allowed_origins = if origins.iter().any(|o| o == "*") {
            AllowList::Any
        } else {
            AllowList::Only(origins)
        };
        self
    }

    pub fn allowed_methods(mut self, methods: AllowList<Method>) -> Self {
        self.allowed_methods = methods;
        self
    }

    pub fn allowed_headers(mut self, headers: AllowList<HeaderName>) -> Self {
        self.allowed_headers = headers;
        self
    }

    pub fn exposed_headers(mut self, headers: Vec<HeaderName>) -> Self {
        self.exposed_headers = headers;
        self
    }

    pub fn allow_credentials(mut self, allow: bool) -> Self {
        self.allow_credentials = allow;
        self
    }

    /// `None` omits `Access-Control-Max-Age` from preflight responses.
    pub fn max_age(mut self, max_age: Option<Duration>) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn origins(&self) -> &AllowList<String> {
        &self.allowed_origins
    }

    pub fn methods(&self) -> &AllowList<Method> {
        &self.allowed_methods
    }

    pub fn headers(&self) -> &AllowList<HeaderName> {
        &self.allowed_headers
    }

    pub fn exposed(&self) -> &[HeaderName] {
        &self.exposed_headers
    }

    pub fn credentials(&self) -> bool {
        self.allow_credentials
    }

    pub fn max_age_value(&self) -> Option<Duration> {
        self.max_age
    }

    pub fn applies_to(&self, path: &str) -> bool {
        self.pattern.matches(path)
    }

    /// Check that the rule can be emitted as valid CORS headers.
    pub fn validate(&self) -> Result<(), CorsConfigError> {
        if self.allow_credentials && self.allowed_origins.is_any() {
            return Err(CorsConfigError::WildcardOriginWithCredentials);
        }

        if let AllowList::Only(origins) = &self.allowed_origins {
            if origins.is_empty() {
                return Err(CorsConfigError::EmptyOrigins);
            }
            for origin in origins {
                validate_origin(origin)?;
            }
        }

        if let AllowList::Only(methods) = &self.allowed_methods {
            if methods.is_empty() {
                return Err(CorsConfigError::EmptyMethods);
            }
        }

        Ok(())
    }

    /// Whether the request origin is allowed. Browsers send serialized
    /// origins, so the comparison is exact against the normalized list.
    pub fn check_origin(&self, origin: &str) -> bool {
        self.allowed_origins.allows(|allowed| allowed == origin)
    }

    pub fn check_method(&self, method: &Method) -> bool {
        self.allowed_methods.allows(|allowed| allowed == method)
    }

    pub fn summary(&self) -> CorsRuleSummary {
        fn list<T: ToString>(values: &AllowList<T>) -> Vec<String> {
            match values {
                AllowList::Any => vec!["*".to_string()],
                AllowList::Only(values) => values.iter().map(ToString::to_string).collect(),
            }
        }

        CorsRuleSummary {
            path_pattern: self.pattern.to_string(),
            allowed_origins: list(&self.allowed_origins),
            allowed_methods: list(&self.allowed_methods),
            allowed_headers: list(&self.allowed_headers),
            exposed_headers: self.exposed_headers.iter().map(ToString::to_string).collect(),
            allow_credentials: self.allow_credentials,
            max_age_seconds: self.max_age.map(|d| d.as_secs()),
        }
    }
}

/// Serializable view of a rule, used for logging and the admin CLI.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CorsRuleSummary {
    pub path_pattern: String,
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub exposed_headers: Vec<String>,
    pub allow_credentials: bool,
    pub max_age_seconds: Option<u64>,
}

pub(crate) fn normalize_origin(origin: &str) -> String {
    origin.trim().trim_end_matches('/').to_ascii_lowercase()
}

fn validate_origin(origin: &str) -> Result<(), CorsConfigError> {
    let invalid = |reason: &str| CorsConfigError::InvalidOrigin {
        origin: origin.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(origin).map_err(|e| invalid(&e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host"));
    }
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("an origin cannot carry a path, query or fragment"));
    }

    Ok(())
}
