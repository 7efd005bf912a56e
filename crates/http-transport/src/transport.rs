use std::sync::Arc;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::multipart::Form;
use serde_json::Value;
use tracing::Instrument;
use url::Url;

use hypermedia::{
    negotiate_decoder, ActionError, Codec, DecodeOptions, Link, Node, Params, RequestId,
    Timestamp, Transport,
};

use crate::config::{ConfigError, HttpTransportConfig};
use crate::observer::{RequestObserver, ResponseHead};
use crate::request::{
    cookie_pairs, replace_cookie_header, PreparedRequest, RequestBody, RequestBuilder,
};

const USER_AGENT: &str = concat!("hyperaction/", env!("CARGO_PKG_VERSION"));

/// [`Transport`] for `http` and `https` URLs.
///
/// One instance owns one connection pool. When CSRF protection is configured
/// it also keeps a cookie jar: cookies set by the API (session cookies in
/// particular) are sent back on every later request, joined with the CSRF
/// cookie on unsafe ones.
pub struct HttpTransport {
    client: reqwest::Client,
    cookies: Option<Arc<Jar>>,
    builder: RequestBuilder,
    base_url: Option<Url>,
    observer: Option<Arc<dyn RequestObserver>>,
    schemes: Vec<String>,
}

impl HttpTransport {
    pub fn new(config: HttpTransportConfig) -> Result<Self, ConfigError> {
        let builder = RequestBuilder::new(&config)?;
        let cookies = config.csrf.as_ref().map(|_| Arc::new(Jar::default()));
        let mut client = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(jar) = &cookies {
            client = client.cookie_provider(Arc::clone(jar));
        }
        let client = client.build().map_err(ConfigError::Client)?;

        Ok(Self {
            client,
            cookies,
            builder,
            base_url: config.base_url,
            observer: config.observer,
            schemes: vec!["http".to_owned(), "https".to_owned()],
        })
    }

    /// Builds the request `action` would send for `link`, without sending it.
    pub fn build_request(
        &self,
        link: &Link,
        params: &Params,
    ) -> Result<PreparedRequest, ActionError> {
        self.builder.build_request(link, params)
    }

    fn absolute_url(&self, url: &str) -> Result<Url, ActionError> {
        let invalid = |message: String| ActionError::InvalidUrl {
            url: url.to_owned(),
            message,
        };
        match Url::parse(url) {
            Ok(parsed) => Ok(parsed),
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.base_url {
                Some(base) => base.join(url).map_err(|err| invalid(err.to_string())),
                None => Err(invalid("relative URL and no base URL configured".to_owned())),
            },
            Err(err) => Err(invalid(err.to_string())),
        }
    }

    async fn execute(
        &self,
        link: &Link,
        decoders: &[Arc<dyn Codec>],
        params: &Params,
    ) -> Result<Node, ActionError> {
        let request = self.builder.build_request(link, params)?;
        if let Some(observer) = &self.observer {
            observer.on_request_built(&request);
        }

        let PreparedRequest {
            method,
            url,
            mut headers,
            body,
            ..
        } = request;
        let url = self.absolute_url(&url)?;
        if let Some(jar) = &self.cookies {
            merge_stored_cookies(jar, &url, &mut headers)?;
        }

        let mut outgoing = self.client.request(method, url).headers(headers);
        outgoing = match body {
            Some(RequestBody::Json(text)) | Some(RequestBody::UrlEncoded(text)) => {
                outgoing.body(text)
            }
            Some(RequestBody::Multipart(parts)) => {
                let form = parts
                    .into_iter()
                    .fold(Form::new(), |form, (name, value)| form.text(name, value));
                outgoing.multipart(form)
            }
            None => outgoing,
        };

        tracing::info!("Sending request");
        let response = outgoing.send().await.map_err(ActionError::network)?;

        let reason = response
            .extensions()
            .get::<hyper::ext::ReasonPhrase>()
            .map(|phrase| String::from_utf8_lossy(phrase.as_bytes()).into_owned());
        let head = ResponseHead {
            status: response.status(),
            reason,
            headers: response.headers().clone(),
            url: response.url().to_string(),
            received_at: Timestamp::now(),
        };
        tracing::info!(status = head.status.as_u16(), "Received response");
        if let Some(observer) = &self.observer {
            observer.on_response_received(&head);
        }

        let text = response.text().await.map_err(ActionError::network)?;
        let content = if text.is_empty() {
            Node::Primitive(Value::Null)
        } else {
            let content_type = head
                .headers
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok());
            let decoder = negotiate_decoder(decoders, content_type)?;
            decoder.decode(&text, &DecodeOptions::with_url(&head.url))?
        };

        if !head.is_success() {
            tracing::warn!(status = head.status.as_u16(), "Action returned an error response");
            return Err(ActionError::ErrorMessage {
                title: head.status_line(),
                content,
            });
        }
        Ok(content)
    }
}

/// Puts the jar's cookies for `url` ahead of any explicit `Cookie` values.
/// `reqwest` skips its store for requests that already carry the header.
fn merge_stored_cookies(
    jar: &Jar,
    url: &Url,
    headers: &mut HeaderMap,
) -> Result<(), ActionError> {
    let explicit = cookie_pairs(headers);
    if explicit.is_empty() {
        return Ok(());
    }
    let Some(stored) = jar.cookies(url) else {
        return Ok(());
    };
    let Ok(stored) = stored.to_str() else {
        return Ok(());
    };

    let mut pairs = vec![stored.to_owned()];
    pairs.extend(explicit);
    replace_cookie_header(headers, &pairs)
}

#[async_trait]
impl Transport for HttpTransport {
    fn schemes(&self) -> &[String] {
        &self.schemes
    }

    async fn action(
        &self,
        link: &Link,
        decoders: &[Arc<dyn Codec>],
        params: &Params,
    ) -> Result<Node, ActionError> {
        let request_id = RequestId::new_random();
        let span = tracing::info_span!(
            "http_action",
            %request_id,
            method = %link.method(),
            url = link.url()
        );
        self.execute(link, decoders, params).instrument(span).await
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("schemes", &self.schemes)
            .field("observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}
