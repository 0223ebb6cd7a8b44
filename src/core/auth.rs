use std::collections::HashMap;
use std::time::SystemTime;

use aws_credential_types::Credentials;
use aws_sigv4::http_request::{sign, SignableBody, SignableRequest, SigningSettings};
use aws_sigv4::sign::v4;
use aws_smithy_runtime_api::client::identity::Identity;
use base64::Engine as _;

use crate::core::resolver::Resolver;
use crate::core::transport::PreparedRequest;
use crate::error::AuthError;
use crate::models::collection::Auth;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeyLocation {
    Header,
    Query,
}

/// Signs or decorates an outgoing request. The variant is fixed by the
/// collection's `auth.type` tag when the provider is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthProvider {
    Bearer {
        token: String,
    },
    Basic {
        username: String,
        password: String,
    },
    ApiKey {
        key: String,
        value: String,
        location: ApiKeyLocation,
    },
    SigV4 {
        access_key: String,
        secret_key: String,
        session_token: Option<String>,
        region: String,
        service: String,
    },
}

fn required(auth_type: &str, config: &HashMap<String, String>, key: &str) -> Result<String, AuthError> {
    match config.get(key) {
        Some(value) if !value.is_empty() => Ok(value.clone()),
        _ => Err(AuthError::MissingConfig {
            auth_type: auth_type.to_string(),
            key: key.to_string(),
        }),
    }
}

impl AuthProvider {
    /// Builds a provider with every config value passed through `resolver`.
    pub fn from_auth(auth: &Auth, resolver: &Resolver) -> Result<Self, AuthError> {
        let config: HashMap<String, String> = auth
            .config
            .iter()
            .map(|(k, v)| (k.clone(), resolver.resolve(v)))
            .collect();
        Self::new(&auth.auth_type, &config)
    }

    pub fn new(auth_type: &str, config: &HashMap<String, String>) -> Result<Self, AuthError> {
        let tag = auth_type.to_lowercase();
        match tag.as_str() {
            "bearer" => Ok(AuthProvider::Bearer {
                token: required(&tag, config, "token")?,
            }),
            "basic" => Ok(AuthProvider::Basic {
                username: required(&tag, config, "username")?,
                password: config.get("password").cloned().unwrap_or_default(),
            }),
            "apikey" => {
                let location = match config
                    .get("location")
                    .map(|l| l.to_lowercase())
                    .as_deref()
                {
                    None | Some("") | Some("header") => ApiKeyLocation::Header,
                    Some("query") => ApiKeyLocation::Query,
                    Some(other) => return Err(AuthError::UnsupportedLocation(other.to_string())),
                };
                Ok(AuthProvider::ApiKey {
                    key: required(&tag, config, "key")?,
                    value: required(&tag, config, "value")?,
                    location,
                })
            }
            "aws" | "sigv4" => Ok(AuthProvider::SigV4 {
                access_key: required(&tag, config, "accessKey")?,
                secret_key: required(&tag, config, "secretKey")?,
                session_token: config.get("sessionToken").filter(|t| !t.is_empty()).cloned(),
                region: required(&tag, config, "region")?,
                service: required(&tag, config, "service")?,
            }),
            _ => Err(AuthError::UnsupportedType(auth_type.to_string())),
        }
    }

    pub fn apply(&self, request: &mut PreparedRequest) -> Result<(), AuthError> {
        match self {
            AuthProvider::Bearer { token } => {
                request.set_header("Authorization", format!("Bearer {}", token));
                Ok(())
            }
            AuthProvider::Basic { username, password } => {
                let encoded = base64::engine::general_purpose::STANDARD
                    .encode(format!("{}:{}", username, password).as_bytes());
                request.set_header("Authorization", format!("Basic {}", encoded));
                Ok(())
            }
            AuthProvider::ApiKey {
                key,
                value,
                location,
            } => {
                match location {
                    ApiKeyLocation::Header => request.set_header(key.clone(), value.clone()),
                    ApiKeyLocation::Query => request.set_query_param(key.clone(), value.clone()),
                }
                Ok(())
            }
            AuthProvider::SigV4 {
                access_key,
                secret_key,
                session_token,
                region,
                service,
            } => sign_v4(
                request,
                access_key,
                secret_key,
                session_token.clone(),
                region,
                service,
            ),
        }
    }
}

fn sign_v4(
    request: &mut PreparedRequest,
    access_key: &str,
    secret_key: &str,
    session_token: Option<String>,
    region: &str,
    service: &str,
) -> Result<(), AuthError> {
    let identity: Identity =
        Credentials::new(access_key, secret_key, session_token, None, "nexus").into();
    let signing_params = v4::SigningParams::builder()
        .identity(&identity)
        .region(region)
        .name(service)
        .time(SystemTime::now())
        .settings(SigningSettings::default())
        .build()
        .map_err(|err| AuthError::Signing(err.to_string()))?
        .into();

    let method = request.method.to_uppercase();
    let url = request
        .full_url()
        .map_err(|err| AuthError::Signing(err.to_string()))?;
    let signable = SignableRequest::new(
        &method,
        url.as_str(),
        request
            .headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str())),
        SignableBody::Bytes(&request.body),
    )
    .map_err(|err| AuthError::Signing(err.to_string()))?;

    let (instructions, _signature) = sign(signable, &signing_params)
        .map_err(|err| AuthError::Signing(err.to_string()))?
        .into_parts();

    let mut http_req = http::Request::builder()
        .method(method.as_str())
        .uri(url.as_str());
    for (key, value) in &request.headers {
        http_req = http_req.header(key, value);
    }
    let mut http_req = http_req
        .body(())
        .map_err(|err| AuthError::Signing(err.to_string()))?;
    instructions.apply_to_request_http1x(&mut http_req);

    for (name, value) in http_req.headers() {
        let value = value
            .to_str()
            .map_err(|err| AuthError::InvalidHeader(err.to_string()))?;
        request.set_header(name.as_str(), value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn request() -> PreparedRequest {
        PreparedRequest {
            method: "GET".to_string(),
            url: "https://example.amazonaws.com/items?b=2".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn bearer_sets_authorization() {
        let provider = AuthProvider::new("Bearer", &config(&[("token", "t0k")])).unwrap();
        let mut req = request();
        provider.apply(&mut req).unwrap();
        assert_eq!(req.header("authorization"), Some("Bearer t0k"));
    }

    #[test]
    fn basic_encodes_credentials() {
        let provider =
            AuthProvider::new("basic", &config(&[("username", "u"), ("password", "p")])).unwrap();
        let mut req = request();
        provider.apply(&mut req).unwrap();
        assert_eq!(req.header("Authorization"), Some("Basic dTpw"));
    }

    #[test]
    fn api_key_in_header_or_query() {
        let header = AuthProvider::new("apikey", &config(&[("key", "X-Key"), ("value", "v")])).unwrap();
        let mut req = request();
        header.apply(&mut req).unwrap();
        assert_eq!(req.header("x-key"), Some("v"));

        let query = AuthProvider::new(
            "apikey",
            &config(&[("key", "api_key"), ("value", "v"), ("location", "QUERY")]),
        )
        .unwrap();
        let mut req = request();
        query.apply(&mut req).unwrap();
        assert_eq!(req.query_params, vec![("api_key".to_string(), "v".to_string())]);

        let err = AuthProvider::new(
            "apikey",
            &config(&[("key", "k"), ("value", "v"), ("location", "cookie")]),
        )
        .unwrap_err();
        assert_eq!(err, AuthError::UnsupportedLocation("cookie".to_string()));
    }

    #[test]
    fn sigv4_adds_signature_headers() {
        let provider = AuthProvider::new(
            "aws",
            &config(&[
                ("accessKey", "AKIDEXAMPLE"),
                ("secretKey", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY"),
                ("region", "us-east-1"),
                ("service", "execute-api"),
            ]),
        )
        .unwrap();
        let mut req = request();
        provider.apply(&mut req).unwrap();
        let authorization = req.header("authorization").unwrap();
        assert!(authorization.starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/"));
        assert!(req.header("x-amz-date").is_some());
    }

    #[test]
    fn unknown_type_and_missing_keys() {
        assert_eq!(
            AuthProvider::new("oauth", &HashMap::new()).unwrap_err(),
            AuthError::UnsupportedType("oauth".to_string())
        );
        assert!(matches!(
            AuthProvider::new("bearer", &HashMap::new()),
            Err(AuthError::MissingConfig { .. })
        ));
    }

    #[test]
    fn config_values_are_resolved() {
        let mut resolver = Resolver::new();
        resolver.set_variable("token", "secret");
        let auth = Auth {
            auth_type: "bearer".to_string(),
            config: config(&[("token", "{{token}}")]),
        };
        let provider = AuthProvider::from_auth(&auth, &resolver).unwrap();
        assert_eq!(
            provider,
            AuthProvider::Bearer {
                token: "secret".to_string()
            }
        );
    }
}
