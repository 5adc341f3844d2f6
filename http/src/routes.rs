use hyper::Method;

/// The proxied surface. Anything that does not parse to a `Route` is not
/// forwarded: the proxy is an allow-list, not a pass-through.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Ping,
    Version,
    Info,
    Nodes,
    NodeInspect,
    Distribution { image: String },
    Service(Crud),
    Task(Crud),
    Network(Crud),
    Secret(Crud),
    Config(Crud),
    Volume(Crud),
}

/// Operations over a resource collection. Parsing only yields the variants
/// the engine actually serves for a given kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Crud {
    Create,
    List,
    Inspect(String),
    Update(String),
    Delete(String),
    Logs(String),
}

/// Matches a request line against the proxied surface, accepting an optional
/// leading API-version segment (`/v1.43/...`) anywhere the engine does.
pub fn parse(method: &Method, path: &str) -> Option<Route> {
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.first().is_some_and(|s| is_version_segment(s)) {
        segments.remove(0);
    }

    use Crud::*;
    match (method.as_str(), segments.as_slice()) {
        ("GET" | "HEAD", ["_ping"]) => Some(Route::Ping),
        ("GET", ["version"]) => Some(Route::Version),
        ("GET", ["info"]) => Some(Route::Info),
        ("GET", ["nodes"]) => Some(Route::Nodes),
        ("GET", ["nodes", _]) => Some(Route::NodeInspect),

        // The image reference may itself contain slashes.
        ("GET", ["distribution", image @ .., "json"]) if !image.is_empty() => {
            Some(Route::Distribution {
                image: image.join("/"),
            })
        }

        ("POST", ["services", "create"]) => Some(Route::Service(Create)),
        ("GET", ["services"]) => Some(Route::Service(List)),
        ("GET", ["services", id]) => Some(Route::Service(Inspect(id.to_string()))),
        ("POST", ["services", id, "update"]) => Some(Route::Service(Update(id.to_string()))),
        ("DELETE", ["services", id]) => Some(Route::Service(Delete(id.to_string()))),
        ("GET", ["services", id, "logs"]) => Some(Route::Service(Logs(id.to_string()))),

        ("GET", ["tasks"]) => Some(Route::Task(List)),
        ("GET", ["tasks", id]) => Some(Route::Task(Inspect(id.to_string()))),
        ("GET", ["tasks", id, "logs"]) => Some(Route::Task(Logs(id.to_string()))),

        ("POST", ["networks", "create"]) => Some(Route::Network(Create)),
        ("GET", ["networks"]) => Some(Route::Network(List)),
        ("GET", ["networks", id]) => Some(Route::Network(Inspect(id.to_string()))),
        ("DELETE", ["networks", id]) => Some(Route::Network(Delete(id.to_string()))),

        ("POST", ["secrets", "create"]) => Some(Route::Secret(Create)),
        ("GET", ["secrets"]) => Some(Route::Secret(List)),
        ("GET", ["secrets", id]) => Some(Route::Secret(Inspect(id.to_string()))),
        ("POST", ["secrets", id, "update"]) => Some(Route::Secret(Update(id.to_string()))),
        ("DELETE", ["secrets", id]) => Some(Route::Secret(Delete(id.to_string()))),

        ("POST", ["configs", "create"]) => Some(Route::Config(Create)),
        ("GET", ["configs"]) => Some(Route::Config(List)),
        ("GET", ["configs", id]) => Some(Route::Config(Inspect(id.to_string()))),
        ("POST", ["configs", id, "update"]) => Some(Route::Config(Update(id.to_string()))),
        ("DELETE", ["configs", id]) => Some(Route::Config(Delete(id.to_string()))),

        ("POST", ["volumes", "create"]) => Some(Route::Volume(Create)),
        ("GET", ["volumes"]) => Some(Route::Volume(List)),
        ("GET", ["volumes", name]) => Some(Route::Volume(Inspect(name.to_string()))),
        ("PUT", ["volumes", name]) => Some(Route::Volume(Update(name.to_string()))),
        ("DELETE", ["volumes", name]) => Some(Route::Volume(Delete(name.to_string()))),

        // Everything under /swarm would leak cluster join tokens; it falls
        // through with the rest of the unrouted surface.
        _ => None,
    }
}

fn is_version_segment(s: &str) -> bool {
    match s.strip_prefix('v') {
        Some(rest) => {
            !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit() || c == '.')
        }
        None => false,
    }
}
