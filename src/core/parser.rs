use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::ConfigError;
use crate::models::collection::Collection;

enum Format {
    Yaml,
    Json,
}

fn format_of(path: &Path) -> Result<Format, ConfigError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "yaml" | "yml" => Ok(Format::Yaml),
        "json" => Ok(Format::Json),
        _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Reads a collection; the format is picked from the file extension.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Collection, ConfigError> {
    let path = path.as_ref();
    let format = format_of(path)?;
    let data = fs::read(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let collection = match format {
        Format::Yaml => parse_yaml(&data)?,
        Format::Json => parse_json(&data)?,
    };
    debug!(
        path = %path.display(),
        collection = %collection.name,
        requests = collection.requests.len(),
        "collection loaded"
    );
    Ok(collection)
}

pub fn parse_yaml(data: &[u8]) -> Result<Collection, ConfigError> {
    Ok(serde_yaml::from_slice(data)?)
}

pub fn parse_json(data: &[u8]) -> Result<Collection, ConfigError> {
    Ok(serde_json::from_slice(data)?)
}

/// Writes pretty JSON or YAML, matching the extension of `path`.
pub fn save_file(collection: &Collection, path: impl AsRef<Path>) -> Result<(), ConfigError> {
    let path = path.as_ref();
    let data = match format_of(path)? {
        Format::Yaml => serde_yaml::to_string(collection)?.into_bytes(),
        Format::Json => serde_json::to_vec_pretty(collection)?,
    };
    fs::write(path, data).map_err(|source| ConfigError::WriteFile {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;

    use super::*;

    const YAML: &str = r#"
name: shop
baseUrl: https://shop.example.com
environment:
  dev:
    baseUrl: http://localhost:8080
    variables:
      userId: "42"
requests:
  - name: login
    method: POST
    url: "{{baseUrl}}/login"
    headers:
      Accept: application/json
    body:
      user: "{{userName}}"
      remember: true
    extract:
      - key: token
        jsonpath: $.token
    tests:
      - status == 200
  - name: profile
    method: GET
    url: "{{baseUrl}}/users/{{userId}}"
    queryParams:
      verbose: "1"
    auth:
      type: bearer
      config:
        token: "{{token}}"
    assertions:
      - time < 500
"#;

    #[test]
    fn parses_yaml_collection() {
        let collection = parse_yaml(YAML.as_bytes()).unwrap();
        assert_eq!(collection.name, "shop");
        assert_eq!(collection.base_url, "https://shop.example.com");
        assert_eq!(
            collection.environment["dev"].variables["userId"],
            "42".to_string()
        );

        let login = &collection.requests[0];
        assert_eq!(login.body, Some(json!({"user": "{{userName}}", "remember": true})));
        assert_eq!(login.extract[0].jsonpath, "$.token");
        assert_eq!(login.tests, vec!["status == 200".to_string()]);

        let profile = collection.request("profile").unwrap();
        assert_eq!(profile.query_params["verbose"], "1");
        let auth = profile.auth.as_ref().unwrap();
        assert_eq!(auth.auth_type, "bearer");
        assert_eq!(profile.assertions, vec!["time < 500".to_string()]);
    }

    #[test]
    fn parse_file_picks_format_by_extension() {
        let mut yaml = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        yaml.write_all(YAML.as_bytes()).unwrap();
        let from_yaml = parse_file(yaml.path()).unwrap();

        let json_file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        save_file(&from_yaml, json_file.path()).unwrap();
        let from_json = parse_file(json_file.path()).unwrap();
        assert_eq!(from_yaml, from_json);

        let text = fs::read_to_string(json_file.path()).unwrap();
        assert!(text.contains("\"baseUrl\""));
        assert!(text.contains("\"queryParams\""));
    }

    #[test]
    fn unsupported_and_missing_files() {
        let toml = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        assert!(matches!(
            parse_file(toml.path()),
            Err(ConfigError::UnsupportedFormat(_))
        ));

        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            parse_file(dir.path().join("absent.yaml")),
            Err(ConfigError::ReadFile { .. })
        ));
    }

    #[test]
    fn malformed_content_is_reported() {
        assert!(matches!(
            parse_json(b"{\"name\": "),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            parse_yaml(b"requests: [unclosed"),
            Err(ConfigError::Yaml(_))
        ));
    }
}
