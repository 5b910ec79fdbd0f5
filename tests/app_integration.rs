use std::fs;
use tracing::info;

// Adds automatic logging to test
mod test_utils {
    use wiremock::matchers::{method, path, path_regex, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub fn table_json(base: &str, rates: &str) -> String {
        format!(
            r#"{{
                "disclaimer": "Usage subject to terms",
                "license": "https://example.com/license",
                "timestamp": 1609459200,
                "base": "{base}",
                "rates": {rates}
            }}"#
        )
    }

    const USD_RATES: &str = r#"{"USD": 1.0, "EUR": 0.9, "GBP": 0.8, "JPY": 103.0}"#;

    /// Upstream that only quotes against USD, like a free plan.
    pub async fn create_mock_server() -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/latest.json"))
            .and(query_param("base", "USD"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(table_json("USD", USD_RATES)),
            )
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/latest.json"))
            .and(query_param("base", "EUR"))
            .respond_with(ResponseTemplate::new(403).set_body_string(
                r#"{"error": true, "status": 403, "message": "not_allowed", "description": "Changing the API base currency is available for Developer, Enterprise and Unlimited plan clients."}"#,
            ))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/historical/2021-01-0[12]\.json$"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(table_json("USD", USD_RATES)),
            )
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/currencies.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"EUR": "Euro", "GBP": "British Pound Sterling", "JPY": "Japanese Yen", "USD": "United States Dollar"}"#,
            ))
            .mount(&mock_server)
            .await;

        mock_server
    }

    pub async fn create_auth_failure_server() -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/latest.json"))
            .respond_with(ResponseTemplate::new(401).set_body_string(
                r#"{"error": true, "status": 401, "message": "invalid_app_id", "description": "Invalid App ID provided."}"#,
            ))
            .mount(&mock_server)
            .await;

        mock_server
    }
}

fn write_config(dir: &tempfile::TempDir, base_url: &str, backend: &str) -> String {
    let config_path = dir.path().join("config.yaml");
    let config_content = format!(
        r#"
        app_id: "test-key"
        base: "EUR"
        provider:
          base_url: {}
        cache:
          backend: {}
        throttle_ms: 0
        data_path: {}
    "#,
        base_url,
        backend,
        dir.path().join("data").display()
    );

    fs::write(&config_path, &config_content).expect("Failed to write config file");
    config_path.to_str().unwrap().to_string()
}

#[test_log::test(tokio::test)]
async fn test_latest_flow_with_mock() {
    let mock_server = test_utils::create_mock_server().await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = write_config(&dir, &mock_server.uri(), "memory");

    let result = oxrates::run_command(
        oxrates::AppCommand::Latest {
            base: None,
            symbols: Some("GBP,JPY".to_string()),
            skip_cache: false,
        },
        Some(&config_path),
    )
    .await;
    assert!(
        result.is_ok(),
        "Latest command failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
async fn test_convert_flow_with_disk_cache() {
    let mock_server = test_utils::create_mock_server().await;

    for decimals in [Some(2), None] {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config_path = write_config(&dir, &mock_server.uri(), "disk");

        let result = oxrates::run_command(
            oxrates::AppCommand::Convert {
                amount: 1500.0,
                from: "EUR".to_string(),
                to: "GBP".to_string(),
                decimals,
            },
            Some(&config_path),
        )
        .await;
        assert!(
            result.is_ok(),
            "Convert command failed with: {:?}",
            result.err()
        );
        assert!(dir.path().join("data").join("cache").exists());
    }
}

#[test_log::test(tokio::test)]
async fn test_timeseries_and_historical_flow_with_mock() {
    let mock_server = test_utils::create_mock_server().await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = write_config(&dir, &mock_server.uri(), "none");

    // Day 3 has no mock and comes back as a 404, which only drops that day.
    let result = oxrates::run_command(
        oxrates::AppCommand::TimeSeries {
            start: "2021-01-01".to_string(),
            end: "2021-01-04".to_string(),
            skip_cache: false,
        },
        Some(&config_path),
    )
    .await;
    assert!(
        result.is_ok(),
        "Time series command failed with: {:?}",
        result.err()
    );

    let result = oxrates::run_command(
        oxrates::AppCommand::Historical {
            date: "2021-01-02".to_string(),
            skip_cache: true,
        },
        Some(&config_path),
    )
    .await;
    assert!(
        result.is_ok(),
        "Historical command failed with: {:?}",
        result.err()
    );

    let result = oxrates::run_command(oxrates::AppCommand::Currencies, Some(&config_path)).await;
    assert!(result.is_ok(), "Currencies command failed: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_invalid_app_id_fails_command() {
    let mock_server = test_utils::create_auth_failure_server().await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = write_config(&dir, &mock_server.uri(), "none");

    let result = oxrates::run_command(oxrates::AppCommand::Currencies, Some(&config_path)).await;

    let err = result.expect_err("Invalid app id should fail");
    info!("Command failed as expected: {err:#}");
    assert!(format!("{err:#}").contains("Invalid App ID provided"));
}

#[test_log::test(tokio::test)]
async fn test_bad_time_series_range_fails_command() {
    let mock_server = test_utils::create_mock_server().await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = write_config(&dir, &mock_server.uri(), "none");

    let result = oxrates::run_command(
        oxrates::AppCommand::TimeSeries {
            start: "2021-01-05".to_string(),
            end: "2021-01-01".to_string(),
            skip_cache: false,
        },
        Some(&config_path),
    )
    .await;
    assert!(result.is_err());
}
