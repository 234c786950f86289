mod common;

use chrono::{Datelike, Days, Local};
use common::{daily_csv, day, read_export, station, Provider};
use temp_ingester::{IngestError, Ingester};
use wiremock::matchers::any;
use wiremock::{Mock, ResponseTemplate};

async fn london(provider: &Provider) {
    provider.mount_city("London", 51.5073219, -0.1276474).await;
    provider
        .mount_stations(vec![
            station("03772", "London Heathrow Airport", 51.4667, -0.45),
            station("03781", "Kenley Airfield", 51.25, -0.1),
        ])
        .await;
}

async fn manchester(provider: &Provider) {
    provider.mount_city("Manchester", 53.4794892, -2.2451148).await;
    provider
        .mount_stations(vec![
            station("03334", "Manchester Airport", 53.35, -2.2833),
            station("03335", "Woodford", 53.3383, -2.1489),
        ])
        .await;
}

#[tokio::test]
async fn test_default_dates() -> Result<(), IngestError> {
    let provider = Provider::start().await;
    london(&provider).await;
    let today = Local::now().date_naive();
    provider
        .mount_daily(
            "03772",
            daily_csv(day(2009, 6, 1), today + Days::new(1), |d| Some(d.ordinal() as f64 / 10.0)),
        )
        .await;

    let ingester = Ingester::builder("London")
        .config(provider.config())
        .run()
        .await?;

    let yesterday = today - Days::new(1);
    assert_eq!(ingester.start_date(), day(2010, 1, 1));
    assert_eq!(ingester.end_date(), yesterday);
    assert_eq!(ingester.output_path(), provider.output_dir.path().join("London.csv"));

    let rows = read_export(ingester.output_path());
    assert_eq!(rows.len(), ingester.rows());
    assert_eq!(rows.first().map(|r| r.0), Some(day(2010, 1, 1)));
    assert_eq!(rows.last().map(|r| r.0), Some(yesterday - Days::new(1)));
    assert!(rows.iter().all(|(date, value)| *date < yesterday && value.is_some()));
    assert!(rows.windows(2).all(|w| w[0].0.succ_opt() == Some(w[1].0)));
    Ok(())
}

#[tokio::test]
async fn test_explicit_unpadded_dates() -> Result<(), IngestError> {
    let provider = Provider::start().await;
    manchester(&provider).await;
    provider
        .mount_daily("03334", daily_csv(day(2005, 1, 1), day(2022, 1, 1), |_| Some(11.5)))
        .await;

    let ingester = Ingester::builder("Manchester")
        .start_date("2011-3-2")
        .end_date("2020-12-29")
        .config(provider.config())
        .run()
        .await?;

    assert_eq!(ingester.city(), "Manchester");
    assert_eq!(ingester.start_date(), day(2011, 3, 2));
    assert_eq!(ingester.end_date(), day(2020, 12, 29));
    assert!((ingester.coordinates().latitude - 53.4794892).abs() < 1e-9);

    let rows = read_export(ingester.output_path());
    let expected_days = (day(2020, 12, 29) - day(2011, 3, 2)).num_days() as usize;
    assert_eq!(rows.len(), expected_days);
    assert_eq!(rows.first(), Some(&(day(2011, 3, 2), Some(11.5))));
    assert_eq!(rows.last(), Some(&(day(2020, 12, 28), Some(11.5))));
    Ok(())
}

#[tokio::test]
async fn test_gaps_are_forward_filled_in_output() -> Result<(), IngestError> {
    let provider = Provider::start().await;
    manchester(&provider).await;
    // Neither station reports the 1st; the 3rd and 4th are missing everywhere.
    provider
        .mount_daily(
            "03334",
            daily_csv(day(2020, 1, 2), day(2020, 1, 6), |d| match d.day() {
                2 => Some(7.5),
                5 => Some(-0.5),
                _ => None,
            }),
        )
        .await;
    provider.mount_daily_missing("03335").await;

    let ingester = Ingester::builder("Manchester")
        .start_date("2020-01-01")
        .end_date("2020-01-06")
        .config(provider.config())
        .run()
        .await?;

    let content = std::fs::read_to_string(ingester.output_path()).unwrap();
    assert_eq!(
        content.lines().collect::<Vec<_>>(),
        vec![
            "time\ttavg",
            "2020-01-01\t",
            "2020-01-02\t7.5",
            "2020-01-03\t7.5",
            "2020-01-04\t7.5",
            "2020-01-05\t-0.5",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_malformed_date_makes_no_requests() {
    let provider = Provider::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&provider.server)
        .await;

    let err = Ingester::builder("London")
        .start_date("2020/13/40")
        .config(provider.config())
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::InvalidDateFormat(_)));
    assert!(provider.output_files().is_empty());
}

#[tokio::test]
async fn test_unknown_city() {
    let provider = Provider::start().await;
    provider.mount_unknown_city("Atlantis").await;

    let err = Ingester::builder("Atlantis")
        .config(provider.config())
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::LocationNotFound(ref city) if city == "Atlantis"));
    assert!(provider.output_files().is_empty());
}

#[tokio::test]
async fn test_geocoder_down() {
    let provider = Provider::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .mount(&provider.server)
        .await;

    let err = Ingester::builder("London")
        .config(provider.config())
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::ResolverUnavailable(_)));
    assert!(provider.output_files().is_empty());
}

#[tokio::test]
async fn test_fetch_failure_writes_nothing() {
    let provider = Provider::start().await;
    provider.mount_city("London", 51.5073219, -0.1276474).await;
    // No station index mounted: the provider answers 404.

    let err = Ingester::builder("London")
        .start_date("2020-01-01")
        .end_date("2020-02-01")
        .config(provider.config())
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::Fetch(_)));
    assert!(provider.output_files().is_empty());
}

#[tokio::test]
async fn test_inverted_range_writes_header_only() -> Result<(), IngestError> {
    let provider = Provider::start().await;
    london(&provider).await;

    let ingester = Ingester::builder("London")
        .start_date("2020-12-29")
        .end_date("2011-03-02")
        .config(provider.config())
        .run()
        .await?;

    assert_eq!(ingester.rows(), 0);
    assert!(read_export(ingester.output_path()).is_empty());
    Ok(())
}

#[tokio::test]
async fn test_rerun_overwrites_output() -> Result<(), IngestError> {
    let provider = Provider::start().await;
    london(&provider).await;
    provider
        .mount_daily("03772", daily_csv(day(2020, 1, 1), day(2021, 1, 1), |_| Some(1.5)))
        .await;

    let config = provider.config();
    Ingester::builder("London")
        .start_date("2020-01-01")
        .end_date("2020-03-01")
        .config(config.clone())
        .run()
        .await?;
    let second = Ingester::builder("London")
        .start_date("2020-06-01")
        .end_date("2020-06-08")
        .config(config)
        .run()
        .await?;

    assert_eq!(provider.output_files(), vec!["London.csv".to_string()]);
    let rows = read_export(second.output_path());
    assert_eq!(rows.len(), 7);
    assert_eq!(rows[0].0, day(2020, 6, 1));
    Ok(())
}

#[tokio::test]
async fn test_missing_output_dir_is_a_write_error() {
    let provider = Provider::start().await;
    london(&provider).await;
    provider
        .mount_daily("03772", daily_csv(day(2020, 1, 1), day(2020, 2, 1), |_| Some(1.5)))
        .await;

    let missing = provider.output_dir.path().join("missing");
    let config = temp_ingester::IngesterConfig::builder()
        .geocoder_url(provider.server.uri())
        .meteostat_url(provider.server.uri())
        .cache_dir(provider.cache_dir.path())
        .output_dir(&missing)
        .build();

    let err = Ingester::builder("London")
        .start_date("2020-01-01")
        .end_date("2020-01-15")
        .config(config)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::Write(_)));
    assert!(!missing.exists());
    assert!(provider.output_files().is_empty());
}
