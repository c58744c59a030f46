use super::layer::build_cors_layer;
use super::processor::{self, CorsDecision};
use super::rule::{CorsRule, CorsRuleSummary};
use super::CorsConfigError;
use http::{HeaderMap, Method, Uri};
use tower_http::cors::CorsLayer;

/// A registered rule together with the layer that emits its headers.
#[derive(Debug, Clone)]
pub struct CorsMapping {
    rule: CorsRule,
    layer: CorsLayer,
}

impl CorsMapping {
    /// The rule must already be validated; tower-http panics on some invalid combinations.
    pub(crate) fn new(rule: CorsRule) -> Self {
        let layer = build_cors_layer(&rule);
        Self { rule, layer }
    }

    pub fn rule(&self) -> &CorsRule {
        &self.rule
    }

    pub fn layer(&self) -> &CorsLayer {
        &self.layer
    }
}

/// Ordered set of CORS mappings. Built once at start-up, then shared read-only.
#[derive(Debug, Clone, Default)]
pub struct CorsRegistry {
    mappings: Vec<CorsMapping>,
}

impl CorsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `rule` and append it. Earlier mappings win on overlapping paths.
    pub fn add_mapping(&mut self, rule: CorsRule) -> Result<&mut Self, CorsConfigError> {
        rule.validate()?;
        self.mappings.push(CorsMapping::new(rule));
        Ok(self)
    }

    pub fn mappings(&self) -> &[CorsMapping] {
        &self.mappings
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// First mapping whose pattern matches `path`.
    pub fn find(&self, path: &str) -> Option<&CorsMapping> {
        self.mappings
            .iter()
            .find(|mapping| mapping.rule.applies_to(path))
    }

    pub fn evaluate(&self, method: &Method, uri: &Uri, headers: &HeaderMap) -> CorsDecision<'_> {
        match self.find(uri.path()) {
            Some(mapping) => processor::classify(mapping, method, uri, headers),
            None => CorsDecision::Skip,
        }
    }

    pub fn summaries(&self) -> Vec<CorsRuleSummary> {
        self.mappings.iter().map(|m| m.rule.summary()).collect()
    }
}
