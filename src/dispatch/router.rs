//! Route parsing: `/<service>/<method>`.

use crate::types::{Error, Result};

const PATH_SHAPE: &str = "Path has to be of structure /<servicename>/<servicemethod>";

/// Service and method names taken from a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePath {
    pub service: String,
    pub method: String,
}

impl RoutePath {
    /// Split a path into exactly two segments. A query string and trailing
    /// slashes are ignored; anything else is `InvalidPath`.
    pub fn parse(path: &str) -> Result<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();

        let mut parts: Vec<&str> = path.split('/').collect();
        while parts.len() > 1 && parts.last().map_or(false, |p| p.is_empty()) {
            parts.pop();
        }

        let [root, service, method] = parts.as_slice() else {
            return Err(Error::invalid_path(PATH_SHAPE));
        };
        if !root.is_empty() {
            return Err(Error::invalid_path(PATH_SHAPE));
        }
        if service.trim().is_empty() {
            return Err(Error::invalid_path("Service is required"));
        }
        if method.trim().is_empty() {
            return Err(Error::invalid_path("Method is required"));
        }

        Ok(Self {
            service: service.to_string(),
            method: method.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_paths() {
        let route = RoutePath::parse("/users/find").unwrap();
        assert_eq!(route.service, "users");
        assert_eq!(route.method, "find");

        assert_eq!(RoutePath::parse("/users/find/").unwrap(), route);
        assert_eq!(RoutePath::parse("/users/find?name=ali").unwrap(), route);
    }

    #[test]
    fn test_parse_invalid_paths() {
        for path in ["", "/", "/users", "/users/", "users/find", "/users/find/extra", "/a/b/c/"] {
            assert!(
                matches!(RoutePath::parse(path), Err(Error::InvalidPath(_))),
                "expected InvalidPath for {:?}",
                path
            );
        }
    }

    #[test]
    fn test_blank_segments() {
        let err = RoutePath::parse("// /find").unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)));
        assert_eq!(RoutePath::parse("/ /find").unwrap_err().to_string(), "Service is required");
        assert_eq!(RoutePath::parse("/users/ ").unwrap_err().to_string(), "Method is required");
    }
}
