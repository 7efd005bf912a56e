//! Request construction.
//!
//! [`RequestBuilder::build_request`] turns a link and its parameter values
//! into a [`PreparedRequest`]: plain data describing the method, URL, headers,
//! and body. Nothing here touches the network, so every rule about
//! parameters, templates, and encodings can be checked without a server.

use indexmap::IndexMap;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, COOKIE};
use reqwest::Method as HttpMethod;
use serde_json::{Map, Value};

use hypermedia::{ActionError, Encoding, Link, Location, Params};

use crate::config::{ConfigError, HttpTransportConfig};
use crate::encoding::{append_query, encode_pairs, value_text};
use crate::url_template;

// ---------------------------------------------------------------------------
// Prepared requests
// ---------------------------------------------------------------------------

/// Serialised request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// JSON text, sent with `Content-Type: application/json`.
    Json(String),
    /// `k=v&…` text, sent with `Content-Type: application/x-www-form-urlencoded`.
    UrlEncoded(String),
    /// Text parts; the boundary and content type are chosen when sending.
    Multipart(Vec<(String, String)>),
}

/// Whether cookies accompany the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Credentials {
    #[default]
    Omit,
    /// Cookies received from the API are sent back to it.
    SameOrigin,
}

/// A fully built request, ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub method: HttpMethod,
    /// Expanded URL including the query string. Relative if the link URL was.
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<RequestBody>,
    pub credentials: Credentials,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct CsrfHeaders {
    header_name: HeaderName,
    header_value: HeaderValue,
    cookie: String,
}

/// Builds requests with the headers and CSRF settings of one transport
/// configuration, validated once up front.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    headers: HeaderMap,
    csrf: Option<CsrfHeaders>,
}

impl RequestBuilder {
    pub fn new(config: &HttpTransportConfig) -> Result<Self, ConfigError> {
        let mut headers = config.headers.clone();

        if let Some(authentication) = &config.authentication {
            let value = HeaderValue::from_str(&authentication.header_value()).map_err(|_| {
                ConfigError::InvalidHeaderValue {
                    name: AUTHORIZATION.to_string(),
                }
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        let csrf = match &config.csrf {
            Some(csrf) => {
                let header_name = HeaderName::from_bytes(csrf.header_name.as_bytes()).map_err(
                    |_| ConfigError::InvalidHeaderName {
                        name: csrf.header_name.clone(),
                    },
                )?;
                let header_value = HeaderValue::from_str(&csrf.token).map_err(|_| {
                    ConfigError::InvalidHeaderValue {
                        name: csrf.header_name.clone(),
                    }
                })?;
                let cookie = format!("{}={}", csrf.cookie_name, csrf.token);
                HeaderValue::from_str(&cookie).map_err(|_| ConfigError::InvalidHeaderValue {
                    name: COOKIE.to_string(),
                })?;
                Some(CsrfHeaders {
                    header_name,
                    header_value,
                    cookie,
                })
            }
            None => None,
        };

        Ok(Self { headers, csrf })
    }

    /// Builds the request for `link` with `params`.
    ///
    /// Every link field is checked first: a missing required field, or any
    /// parameter that names no field, fails with
    /// [`ActionError::Parameter`] before the URL or body is touched.
    pub fn build_request(
        &self,
        link: &Link,
        params: &Params,
    ) -> Result<PreparedRequest, ActionError> {
        check_params(link, params)?;

        let method = HttpMethod::from_bytes(link.method().to_uppercase().as_bytes())
            .map_err(|_| ActionError::parameter(format!("Invalid HTTP method: {}", link.method())))?;

        let mut query = IndexMap::new();
        let mut path = IndexMap::new();
        let mut body: Option<Value> = None;

        for field in link.fields() {
            let name = field.name().as_str();
            let Some(value) = params.get(name) else {
                continue;
            };
            match field.location() {
                Location::Query => {
                    query.insert(name.to_owned(), value.clone());
                }
                Location::Path => {
                    path.insert(name.to_owned(), value.clone());
                }
                Location::Form => match body.get_or_insert_with(|| Value::Object(Map::new())) {
                    Value::Object(form) => {
                        form.insert(name.to_owned(), value.clone());
                    }
                    _ => {
                        return Err(ActionError::parameter(format!(
                            "Form field \"{name}\" cannot be merged into a non-object body"
                        )))
                    }
                },
                Location::Body => body = Some(value.clone()),
                Location::Unspecified => {}
            }
        }

        let mut headers = self.headers.clone();
        let body = match body {
            Some(value) => Some(encode_body(link.encoding(), value, &mut headers)?),
            None => None,
        };

        let mut cookies = cookie_pairs(&headers);
        let mut credentials = Credentials::Omit;
        if let Some(csrf) = &self.csrf {
            credentials = Credentials::SameOrigin;
            if !link.method().is_csrf_safe() {
                headers.insert(csrf.header_name.clone(), csrf.header_value.clone());
                cookies.push(csrf.cookie.clone());
            }
        }
        if !cookies.is_empty() {
            replace_cookie_header(&mut headers, &cookies)?;
        }

        let url = append_query(&url_template::expand(link.url(), &path), &encode_pairs(&query));

        tracing::debug!(%method, url, "Built request");
        Ok(PreparedRequest {
            method,
            url,
            headers,
            body,
            credentials,
        })
    }
}

fn check_params(link: &Link, params: &Params) -> Result<(), ActionError> {
    for field in link.fields() {
        if field.is_required() && !params.contains_key(field.name().as_str()) {
            return Err(ActionError::parameter(format!(
                "Missing required field: \"{}\"",
                field.name()
            )));
        }
    }

    match params.keys().find(|name| link.field(name).is_none()) {
        Some(unknown) => Err(ActionError::parameter(format!(
            "Unknown parameter: \"{unknown}\""
        ))),
        None => Ok(()),
    }
}

fn encode_body(
    encoding: Encoding,
    value: Value,
    headers: &mut HeaderMap,
) -> Result<RequestBody, ActionError> {
    if encoding == Encoding::Json {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        return Ok(RequestBody::Json(value.to_string()));
    }

    let Value::Object(form) = value else {
        return Err(ActionError::parameter(format!(
            "A {encoding} request body must be an object"
        )));
    };

    match encoding {
        Encoding::Multipart => Ok(RequestBody::Multipart(
            form.iter()
                .map(|(key, value)| (key.clone(), value_text(value)))
                .collect(),
        )),
        _ => {
            headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            );
            Ok(RequestBody::UrlEncoded(encode_pairs(&form)))
        }
    }
}

/// Every `Cookie` header value, in order.
pub(crate) fn cookie_pairs(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(str::to_owned)
        .collect()
}

/// Replaces all `Cookie` headers with a single one joining `pairs`.
pub(crate) fn replace_cookie_header(
    headers: &mut HeaderMap,
    pairs: &[String],
) -> Result<(), ActionError> {
    let value = HeaderValue::from_str(&pairs.join("; "))
        .map_err(|_| ActionError::parameter("Configured Cookie header is not valid text"))?;
    headers.insert(COOKIE, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Authentication, CsrfConfig};
    use crate::encoding::decode_pairs;
    use hypermedia::{ErrorKind, Field, FieldName, Method};
    use serde_json::json;

    fn field(name: &str, location: Location) -> Field {
        Field::new(FieldName::new(name).unwrap()).at(location)
    }

    fn users_link() -> Link {
        Link::new("/users/{id}", Method::get())
            .with_fields(vec![field("id", Location::Path).required(true)])
    }

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map.into_iter().collect(),
            _ => panic!("params must be an object"),
        }
    }

    fn builder() -> RequestBuilder {
        RequestBuilder::new(&HttpTransportConfig::default()).unwrap()
    }

    fn build(link: &Link, value: Value) -> Result<PreparedRequest, ActionError> {
        builder().build_request(link, &params(value))
    }

    #[test]
    fn path_parameters_are_substituted() {
        let request = build(&users_link(), json!({"id": "42"})).unwrap();
        assert_eq!(request.url, "/users/42");
        assert_eq!(request.method, HttpMethod::GET);
        assert!(request.body.is_none());
        assert!(request.headers.is_empty());
        assert_eq!(request.credentials, Credentials::Omit);
    }

    #[test]
    fn missing_required_field_is_a_parameter_error() {
        let err = build(&users_link(), json!({})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parameter);
        assert_eq!(err.to_string(), r#"Missing required field: "id""#);
    }

    #[test]
    fn unknown_parameter_is_a_parameter_error() {
        let err = build(&users_link(), json!({"id": "42", "extra": "x"})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parameter);
        assert_eq!(err.to_string(), r#"Unknown parameter: "extra""#);
    }

    #[test]
    fn missing_field_is_reported_before_unknown_parameters() {
        let err = build(&users_link(), json!({"extra": "x"})).unwrap_err();
        assert_eq!(err.to_string(), r#"Missing required field: "id""#);
    }

    #[test]
    fn optional_fields_may_be_omitted() {
        let link = Link::new("http://api.test/items/", Method::get())
            .with_fields(vec![field("page", Location::Query)]);
        let request = build(&link, json!({})).unwrap();
        assert_eq!(request.url, "http://api.test/items/");
    }

    #[test]
    fn query_parameters_follow_field_order() {
        let link = Link::new("http://api.test/items/#top", Method::get()).with_fields(vec![
            field("search", Location::Query),
            field("page", Location::Query),
        ]);
        let request = build(&link, json!({"page": 2, "search": "a b"})).unwrap();
        assert_eq!(request.url, "http://api.test/items/?search=a%20b&page=2#top");
    }

    #[test]
    fn form_fields_are_sent_as_json_by_default() {
        let link = Link::new("http://api.test/items/", Method::new("post").unwrap())
            .with_fields(vec![
                field("title", Location::Form).required(true),
                field("count", Location::Form),
            ]);
        let request = build(&link, json!({"title": "T", "count": 3})).unwrap();
        assert_eq!(request.method, HttpMethod::POST);
        assert_eq!(
            request.body,
            Some(RequestBody::Json(r#"{"title":"T","count":3}"#.to_owned()))
        );
        assert_eq!(request.headers[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn body_field_replaces_the_whole_body() {
        let link = Link::new("http://api.test/items/", Method::new("put").unwrap())
            .with_fields(vec![field("data", Location::Body)]);
        let request = build(&link, json!({"data": [1, 2]})).unwrap();
        assert_eq!(request.body, Some(RequestBody::Json("[1,2]".to_owned())));
    }

    #[test]
    fn unspecified_locations_are_accepted_but_not_sent() {
        let link = Link::new("http://api.test/", Method::new("post").unwrap())
            .with_fields(vec![field("note", Location::Unspecified)]);
        let request = build(&link, json!({"note": "x"})).unwrap();
        assert_eq!(request.url, "http://api.test/");
        assert!(request.body.is_none());
    }

    #[test]
    fn url_encoded_bodies_decode_to_the_original_pairs() {
        let link = Link::new("http://api.test/login/", Method::new("post").unwrap())
            .with_encoding(Encoding::UrlEncoded)
            .with_fields(vec![
                field("username", Location::Form),
                field("password", Location::Form),
            ]);
        let request = build(
            &link,
            json!({"username": "jo@example.com", "password": "p&ss=w rd/%"}),
        )
        .unwrap();

        let Some(RequestBody::UrlEncoded(body)) = request.body else {
            panic!("expected a url-encoded body");
        };
        assert_eq!(
            decode_pairs(&body),
            [
                ("username".to_owned(), "jo@example.com".to_owned()),
                ("password".to_owned(), "p&ss=w rd/%".to_owned()),
            ]
        );
        assert_eq!(
            request.headers[CONTENT_TYPE],
            "application/x-www-form-urlencoded"
        );
    }

    #[test]
    fn multipart_bodies_have_one_part_per_key() {
        let link = Link::new("http://api.test/upload/", Method::new("post").unwrap())
            .with_encoding(Encoding::Multipart)
            .with_fields(vec![
                field("name", Location::Form),
                field("size", Location::Form),
            ]);
        let request = build(&link, json!({"name": "a.txt", "size": 12})).unwrap();
        assert_eq!(
            request.body,
            Some(RequestBody::Multipart(vec![
                ("name".to_owned(), "a.txt".to_owned()),
                ("size".to_owned(), "12".to_owned()),
            ]))
        );
        assert!(request.headers.get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn form_encodings_need_an_object_body() {
        let link = Link::new("http://api.test/", Method::new("post").unwrap())
            .with_encoding(Encoding::UrlEncoded)
            .with_fields(vec![field("data", Location::Body)]);
        let err = build(&link, json!({"data": "raw"})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parameter);
    }

    #[test]
    fn csrf_headers_are_only_sent_for_unsafe_methods() {
        let config = HttpTransportConfig::default()
            .with_header("Cookie", "sessionid=s1")
            .unwrap()
            .with_csrf(CsrfConfig::new("tok"));
        let builder = RequestBuilder::new(&config).unwrap();

        let get = Link::new("http://api.test/", Method::get());
        let request = builder.build_request(&get, &Params::new()).unwrap();
        assert_eq!(request.credentials, Credentials::SameOrigin);
        assert!(request.headers.get("x-csrftoken").is_none());
        assert_eq!(request.headers[COOKIE], "sessionid=s1");

        let delete = Link::new("http://api.test/", Method::new("delete").unwrap());
        let request = builder.build_request(&delete, &Params::new()).unwrap();
        assert_eq!(request.credentials, Credentials::SameOrigin);
        assert_eq!(request.headers["x-csrftoken"], "tok");
        assert_eq!(request.headers[COOKIE], "sessionid=s1; csrftoken=tok");
    }

    #[test]
    fn repeated_cookie_headers_are_folded_with_the_csrf_cookie() {
        let config = HttpTransportConfig::default()
            .with_header("Cookie", "a=1")
            .unwrap()
            .with_header("Cookie", "b=2")
            .unwrap()
            .with_csrf(CsrfConfig::new("tok"));
        let builder = RequestBuilder::new(&config).unwrap();

        let get = Link::new("http://api.test/", Method::get());
        let request = builder.build_request(&get, &Params::new()).unwrap();
        let cookies: Vec<_> = request.headers.get_all(COOKIE).iter().collect();
        assert_eq!(cookies, ["a=1; b=2"]);

        let patch = Link::new("http://api.test/", Method::new("patch").unwrap());
        let request = builder.build_request(&patch, &Params::new()).unwrap();
        let cookies: Vec<_> = request.headers.get_all(COOKIE).iter().collect();
        assert_eq!(cookies, ["a=1; b=2; csrftoken=tok"]);
    }

    #[test]
    fn default_and_authentication_headers_are_merged() {
        let config = HttpTransportConfig::default()
            .with_header("Accept", "application/coreapi+json")
            .unwrap()
            .with_authentication(Authentication::Token {
                scheme: "Token".into(),
                token: "abc".into(),
            });
        let builder = RequestBuilder::new(&config).unwrap();
        let request = builder
            .build_request(&Link::new("http://api.test/", Method::get()), &Params::new())
            .unwrap();
        assert_eq!(request.headers["accept"], "application/coreapi+json");
        assert_eq!(request.headers[AUTHORIZATION], "Token abc");
    }

    #[test]
    fn invalid_csrf_configuration_is_rejected_up_front() {
        let mut csrf = CsrfConfig::new("tok");
        csrf.header_name = "bad header".into();
        let config = HttpTransportConfig::default().with_csrf(csrf);
        assert!(matches!(
            RequestBuilder::new(&config),
            Err(ConfigError::InvalidHeaderName { .. })
        ));
    }
}
