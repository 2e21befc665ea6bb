use fxrates::config::{AppConfig, SourceKind};
use fxrates::currency::{CurrencyCode, RateMap};
use indicatif::ProgressBar;
use std::fs;
use std::path::Path;
use tracing::info;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod test_utils {
    use super::*;

    pub async fn mount_pair(mock_server: &MockServer, base: &str, quote: &str, close: f64) {
        Mock::given(method("GET"))
            .and(path("/cc-api/currencies"))
            .and(query_param("base", base))
            .and(query_param("quote", quote))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(format!(r#"{{"response": [{{"close": {close}}}]}}"#)),
            )
            .mount(mock_server)
            .await;
    }

    pub async fn mount_fallback(mock_server: &MockServer, close: f64) {
        Mock::given(method("GET"))
            .and(path("/cc-api/currencies"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(format!(r#"{{"response": [{{"close": {close}}}]}}"#)),
            )
            .mount(mock_server)
            .await;
    }

    pub fn config_for(mock_server: &MockServer, output: &Path) -> AppConfig {
        let mut config = AppConfig {
            output: output.to_path_buf(),
            currencies: Some(vec![CurrencyCode::EUR, CurrencyCode::USD, CurrencyCode::JPY]),
            ..AppConfig::default()
        };
        config.providers.api.base_url = mock_server.uri();
        config.providers.page.base_url = mock_server.uri();
        config.backoff.initial_delay_ms = 1;
        config.backoff.max_delay_ms = 10;
        config
    }
}

#[test_log::test(tokio::test)]
async fn test_single_pair_rate_from_history_api() {
    let mock_server = MockServer::start().await;
    test_utils::mount_pair(&mock_server, "EUR", "USD", 1.0576).await;

    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let output = temp_dir.path().join("currency-rates.json");
    let config = test_utils::config_for(&mock_server, &output);

    let rate = fxrates::get_rate(&config, CurrencyCode::EUR, CurrencyCode::USD)
        .await
        .expect("Failed to get rate");
    info!(?rate, "Received rate");

    assert_eq!(rate, Some(1.0576));
    assert!(!output.exists(), "Single pair fetch must not write output");
}

#[test_log::test(tokio::test)]
async fn test_whole_universe_is_saved_to_disk() {
    let mock_server = MockServer::start().await;
    test_utils::mount_pair(&mock_server, "EUR", "USD", 1.0576).await;
    test_utils::mount_pair(&mock_server, "USD", "JPY", 151.23).await;
    test_utils::mount_fallback(&mock_server, 2.5).await;

    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let output = temp_dir.path().join("currency-rates.json");
    let config = test_utils::config_for(&mock_server, &output);

    let rates = fxrates::get_all_rates(&config, ProgressBar::hidden())
        .await
        .expect("Batch run failed");

    assert_eq!(rates.len(), 6);
    assert_eq!(rates.get("EUR / USD"), Some(1.0576));
    assert_eq!(rates.get("USD / JPY"), Some(151.23));
    assert_eq!(rates.get("JPY / EUR"), Some(2.5));
    assert!(rates.get("EUR / EUR").is_none());

    let on_disk: RateMap =
        serde_json::from_str(&fs::read_to_string(&output).expect("Output file missing"))
            .expect("Output is not valid JSON");
    assert_eq!(on_disk, rates);
}

#[test_log::test(tokio::test)]
async fn test_rate_limited_pair_is_retried() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cc-api/currencies"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(3)
        .mount(&mock_server)
        .await;
    test_utils::mount_pair(&mock_server, "EUR", "USD", 1.0576).await;

    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let config = test_utils::config_for(&mock_server, &temp_dir.path().join("rates.json"));

    let rate = fxrates::get_rate(&config, CurrencyCode::EUR, CurrencyCode::USD)
        .await
        .expect("Failed to get rate");

    assert_eq!(rate, Some(1.0576));
    let requests = mock_server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 4);
}

#[test_log::test(tokio::test)]
async fn test_unsupported_pair_yields_no_rate_without_retry() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cc-api/currencies"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let config = test_utils::config_for(&mock_server, &temp_dir.path().join("rates.json"));

    let rate = fxrates::get_rate(&config, CurrencyCode::EUR, CurrencyCode::USD)
        .await
        .expect("Failed to get rate");

    assert_eq!(rate, None);
    let requests = mock_server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1);

    assert!("INVALID".parse::<CurrencyCode>().is_err());
}

#[test_log::test(tokio::test)]
async fn test_partial_failures_are_omitted_from_saved_file() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cc-api/currencies"))
        .and(query_param("base", "JPY"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    test_utils::mount_fallback(&mock_server, 1.25).await;

    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let output = temp_dir.path().join("currency-rates.json");
    let config = test_utils::config_for(&mock_server, &output);

    let rates = fxrates::get_all_rates(&config, ProgressBar::hidden())
        .await
        .expect("Batch run failed");

    assert_eq!(rates.len(), 4);
    assert!(rates.get("JPY / USD").is_none());
    assert!(rates.iter().all(|(_, rate)| rate > 0.0));

    let content = fs::read_to_string(&output).expect("Output file missing");
    assert!(!content.contains("JPY / USD"));
}

#[test_log::test(tokio::test)]
async fn test_full_app_flow_with_converter_page_mock() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/currency-converter/en/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><div data-testid="conversion-result">1 GBP = 1.2650 USD</div></body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let output = temp_dir.path().join("currency-rates.json");
    let config_path = temp_dir.path().join("config.yaml");
    let config_content = format!(
        r#"
        source: page
        currencies: [GBP, USD]
        output: {}
        backoff:
          initial_delay_ms: 1
        providers:
          page:
            base_url: {}
    "#,
        output.display(),
        mock_server.uri()
    );
    fs::write(&config_path, &config_content).expect("Failed to write config file");

    let result = fxrates::run_command(
        fxrates::AppCommand::Fetch {
            output: None,
            source: None,
        },
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Fetch command failed with: {:?}",
        result.err()
    );

    let saved = fxrates::store::read_rates(&output).expect("Failed to read saved rates");
    assert_eq!(saved.len(), 2);
    assert_eq!(saved.get("GBP / USD"), Some(1.265));

    let config = AppConfig::load_from_path(&config_path).expect("Failed to load config");
    assert_eq!(config.source, SourceKind::Page);
}
