use super::rule::{AllowList, CorsRule};
use http::{HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};

/// Build the tower-http layer that emits a rule's CORS headers.
///
/// Wildcard methods and headers are mirrored from the preflight request, so
/// the layer stays valid when credentials are allowed.
pub fn build_cors_layer(rule: &CorsRule) -> CorsLayer {
    let mut layer = CorsLayer::new();

    layer = match rule.origins() {
        AllowList::Any => layer.allow_origin(Any),
        AllowList::Only(origins) => {
            let origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();
            layer.allow_origin(AllowOrigin::list(origins))
        }
    };

    layer = match rule.methods() {
        AllowList::Any => layer.allow_methods(AllowMethods::mirror_request()),
        AllowList::Only(methods) => {
            layer.allow_methods(AllowMethods::list(methods.iter().cloned().collect::<Vec<Method>>()))
        }
    };

    layer = match rule.headers() {
        AllowList::Any => layer.allow_headers(AllowHeaders::mirror_request()),
        AllowList::Only(headers) => layer.allow_headers(AllowHeaders::list(headers.clone())),
    };

    if !rule.exposed().is_empty() {
        layer = layer.expose_headers(rule.exposed().to_vec());
    }

    if rule.credentials() {
        layer = layer.allow_credentials(true);
    }

    if let Some(max_age) = rule.max_age_value() {
        layer = layer.max_age(max_age);
    }

    layer
}
