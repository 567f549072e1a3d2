//! Controller/method resolution: walk the path segments against the registry.

use crate::case::dashes_to_camel_case;
use crate::router::registry::ControllerRegistry;

/// Outcome of resolution: a registry key, a method name, and the positional
/// parameters left over after the controller and method segments are consumed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub controller: String,
    pub method: String,
    pub params: Vec<String>,
}

/// Resolve a (remapped) path against the registry.
///
/// Segments are walked left to right, accumulating a namespace-qualified
/// CamelCase identifier ("admin/top-sales" tries "Admin", then
/// "Admin/TopSales") until the registry knows the identifier. The next
/// segment is the method candidate; it is consumed only when the controller
/// actually exposes it; otherwise it stays in the parameter list and the
/// default method runs. A path that never names a registered controller
/// resolves to the defaults with every original segment kept as a parameter.
pub fn resolve(
    path: &str,
    registry: &ControllerRegistry,
    default_controller: &str,
    default_method: &str,
) -> Resolution {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let mut endpoint = String::new();
    let mut found_at = None;
    for (i, segment) in segments.iter().enumerate() {
        endpoint.push_str(&dashes_to_camel_case(segment));
        if registry.contains(&endpoint) {
            found_at = Some(i);
            break;
        }
        endpoint.push('/');
    }

    match found_at {
        Some(i) => {
            let mut rest: Vec<String> = segments[i + 1..].iter().map(|s| s.to_string()).collect();
            let mut method = default_method.to_string();
            if let Some(candidate) = rest.first() {
                if registry.has_method(&endpoint, candidate) {
                    method = rest.remove(0);
                }
            }
            Resolution {
                controller: endpoint,
                method,
                params: rest,
            }
        }
        None => Resolution {
            controller: default_controller.to_string(),
            method: default_method.to_string(),
            params: segments.iter().map(|s| s.to_string()).collect(),
        },
    }
}
