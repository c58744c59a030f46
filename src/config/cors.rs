/// CORS configuration for the single mapping registered at start-up
#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Ant-style path pattern the mapping covers (e.g., "/banque/**")
    pub path_pattern: String,

    /// Allowed origins (use ["*"] for all origins)
    pub allowed_origins: Vec<String>,

    /// Allowed HTTP methods (use ["*"] for all methods)
    pub allowed_methods: Vec<String>,

    /// Allowed request headers (use ["*"] for all headers)
    pub allowed_headers: Vec<String>,

    /// Response headers exposed to scripts
    pub exposed_headers: Vec<String>,

    /// Whether cookies and authorization headers may accompany requests
    pub allow_credentials: bool,

    /// Preflight cache lifetime; 0 leaves Access-Control-Max-Age out
    pub max_age_seconds: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            path_pattern: "/banque/**".to_string(),
            allowed_origins: vec!["http://localhost:3000".to_string()],
            allowed_methods: ["GET", "POST", "PUT", "DELETE"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            allowed_headers: vec!["*".to_string()],
            exposed_headers: Vec::new(),
            allow_credentials: true,
            max_age_seconds: 1800,
        }
    }
}
