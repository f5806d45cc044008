use axum::{extract::Request, http::Method};

/// Lets HTML forms reach PUT/PATCH/DELETE routes: a POST whose query string
/// carries `_method=<verb>` is dispatched as that verb. Must wrap the router,
/// since routing has already happened by the time route layers run.
pub fn method_override(mut request: Request) -> Request {
    if request.method() != Method::POST {
        return request;
    }

    let requested = request.uri().query().and_then(|query| {
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == "_method")
            .map(|(_, value)| value.to_ascii_uppercase())
    });

    let method = match requested.as_deref() {
        Some("PUT") => Method::PUT,
        Some("PATCH") => Method::PATCH,
        Some("DELETE") => Method::DELETE,
        _ => return request,
    };

    tracing::debug!("Method override POST -> {} for {}", method, request.uri().path());
    *request.method_mut() = method;
    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(method: Method, uri: &str) -> Request {
        Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
    }

    #[test]
    fn rewrites_post_with_method_parameter() {
        let rewritten = method_override(request(Method::POST, "/listings/1?_method=delete"));
        assert_eq!(rewritten.method(), Method::DELETE);

        let rewritten = method_override(request(Method::POST, "/listings/1?foo=bar&_method=PUT"));
        assert_eq!(rewritten.method(), Method::PUT);
    }

    #[test]
    fn leaves_other_requests_alone() {
        assert_eq!(method_override(request(Method::GET, "/listings?_method=DELETE")).method(), Method::GET);
        assert_eq!(method_override(request(Method::POST, "/listings")).method(), Method::POST);
        assert_eq!(method_override(request(Method::POST, "/listings?_method=TRACE")).method(), Method::POST);
    }
}
