#[cfg(test)]
mod tests {
    use crate::api::{FeedLookup, ProviderError, StationSearch, WaqiClient};
    use crate::models::StationSuggestion;
    use mockito::{Matcher, Server};
    use serde_json::json; // For creating JSON bodies easily
    use std::io::Write;
    use std::time::Duration;

    const API_KEY: &str = "test_key";

    fn test_client(base_url: &str) -> WaqiClient {
        WaqiClient::new(API_KEY.to_string(), base_url, Duration::from_secs(5)).unwrap()
    }

    // Base URL of a port nothing listens on
    fn closed_port_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_station_feed_success() {
        let mut server = Server::new_async().await;
        let station = json!({
            "aqi": 42,
            "idx": 1451,
            "city": { "name": "Beijing (北京)", "geo": [39.954592, 116.468117] },
            "iaqi": { "pm25": { "v": 42 } },
            "time": { "s": "2024-05-01 10:00:00", "tz": "+08:00" }
        });
        let mock = server
            .mock("GET", "/feed/beijing/")
            .match_query(Matcher::UrlEncoded("token".into(), API_KEY.into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "status": "ok", "data": station }).to_string())
            .create_async()
            .await;

        let result = test_client(&server.url()).station_feed("beijing").await;

        mock.assert_async().await;
        assert_eq!(result, Ok(FeedLookup::Found(station)));
    }

    #[tokio::test]
    async fn test_station_feed_unknown_station() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/feed/atlantis/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({ "status": "error", "data": "Unknown station" }).to_string())
            .create_async()
            .await;

        let result = test_client(&server.url()).station_feed("atlantis").await;

        assert_eq!(result, Ok(FeedLookup::NotFound(json!("Unknown station"))));
    }

    #[tokio::test]
    async fn test_station_feed_error_without_detail() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/feed/atlantis/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({ "status": "nope" }).to_string())
            .create_async()
            .await;

        let result = test_client(&server.url()).station_feed("atlantis").await;

        assert_eq!(result, Ok(FeedLookup::NotFound(json!("Unknown station"))));
    }

    #[tokio::test]
    async fn test_station_feed_ok_without_data_is_internal() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/feed/beijing/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({ "status": "ok" }).to_string())
            .create_async()
            .await;

        let result = test_client(&server.url()).station_feed("beijing").await;

        assert!(matches!(result, Err(ProviderError::Internal(_))));
    }

    #[tokio::test]
    async fn test_server_error_status_is_unavailable() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/feed/beijing/")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("Internal Server Error")
            .create_async()
            .await;

        let result = test_client(&server.url()).station_feed("beijing").await;

        match result {
            Err(ProviderError::Unavailable(details)) => {
                assert!(details.contains("500"), "unexpected details: {}", details);
                assert!(!details.contains(API_KEY), "token leaked: {}", details);
            },
            other => panic!("expected Unavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_json_body_is_unavailable() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/feed/beijing/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let result = test_client(&server.url()).station_feed("beijing").await;

        assert!(matches!(result, Err(ProviderError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_json_that_is_not_an_envelope_is_internal() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/feed/beijing/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!("just a string").to_string())
            .create_async()
            .await;

        let result = test_client(&server.url()).station_feed("beijing").await;

        assert!(matches!(result, Err(ProviderError::Internal(_))));
    }

    #[tokio::test]
    async fn test_connection_refused_is_unavailable() {
        let client = test_client(&closed_port_url());

        let feed = client.station_feed("beijing").await;
        let search = client.search_stations("beijing").await;

        for result in [feed.map(|_| ()), search.map(|_| ())] {
            match result {
                Err(ProviderError::Unavailable(details)) => {
                    assert!(!details.is_empty());
                    assert!(!details.contains(API_KEY), "token leaked: {}", details);
                },
                other => panic!("expected Unavailable, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_search_stations_maps_entries_in_order() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/search/")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("keyword".into(), "beijing".into()),
                Matcher::UrlEncoded("token".into(), API_KEY.into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "status": "ok",
                    "data": [
                        {
                            "uid": 1451,
                            "aqi": "57",
                            "station": { "name": "Beijing (北京)", "geo": [39.954592, 116.468117] }
                        },
                        {
                            "uid": 3303,
                            "station": { "name": "Dongcheng Tiantan", "geo": [39.886, 116.407] }
                        }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let result = test_client(&server.url()).search_stations("beijing").await;

        mock.assert_async().await;
        assert_eq!(
            result,
            Ok(StationSearch::Found(vec![
                StationSuggestion {
                    station_name: "Beijing (北京)".into(),
                    geo: json!([39.954592, 116.468117]),
                    aqi: json!("57"),
                },
                StationSuggestion {
                    station_name: "Dongcheng Tiantan".into(),
                    geo: json!([39.886, 116.407]),
                    aqi: json!("-"),
                },
            ]))
        );
    }

    #[tokio::test]
    async fn test_search_stations_without_data_is_empty() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/search/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({ "status": "ok" }).to_string())
            .create_async()
            .await;

        let result = test_client(&server.url()).search_stations("nowhere").await;

        assert_eq!(result, Ok(StationSearch::Found(Vec::new())));
    }

    #[tokio::test]
    async fn test_search_stations_error_status() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/search/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({ "status": "error", "data": "Invalid key" }).to_string())
            .create_async()
            .await;

        let result = test_client(&server.url()).search_stations("beijing").await;

        assert_eq!(result, Ok(StationSearch::NotFound));
    }

    #[tokio::test]
    async fn test_search_entry_without_station_is_internal() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/search/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({ "status": "ok", "data": [{ "aqi": "12" }] }).to_string())
            .create_async()
            .await;

        let result = test_client(&server.url()).search_stations("beijing").await;

        assert!(matches!(result, Err(ProviderError::Internal(_))));
    }

    #[tokio::test]
    async fn test_non_string_status_is_not_found() {
        let mut server = Server::new_async().await;
        let _feed = server
            .mock("GET", "/feed/beijing/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({ "status": 1, "data": "x" }).to_string())
            .create_async()
            .await;
        let _search = server
            .mock("GET", "/search/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({ "status": 1, "data": "x" }).to_string())
            .create_async()
            .await;
        let client = test_client(&server.url());

        let feed = client.station_feed("beijing").await;
        let search = client.search_stations("beijing").await;

        assert_eq!(feed, Ok(FeedLookup::NotFound(json!("x"))));
        assert_eq!(search, Ok(StationSearch::NotFound));
    }

    #[tokio::test]
    async fn test_null_data_is_passed_through() {
        let mut server = Server::new_async().await;
        let _ok = server
            .mock("GET", "/feed/beijing/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({ "status": "ok", "data": null }).to_string())
            .create_async()
            .await;
        let _error = server
            .mock("GET", "/feed/atlantis/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({ "status": "error", "data": null }).to_string())
            .create_async()
            .await;
        let client = test_client(&server.url());

        assert_eq!(
            client.station_feed("beijing").await,
            Ok(FeedLookup::Found(serde_json::Value::Null))
        );
        assert_eq!(
            client.station_feed("atlantis").await,
            Ok(FeedLookup::NotFound(serde_json::Value::Null))
        );
    }

    #[tokio::test]
    async fn test_search_with_null_data_is_internal() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/search/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({ "status": "ok", "data": null }).to_string())
            .create_async()
            .await;

        let result = test_client(&server.url()).search_stations("beijing").await;

        assert!(matches!(result, Err(ProviderError::Internal(_))));
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/feed/beijing/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_chunked_body(|w| {
                std::thread::sleep(Duration::from_secs(3));
                w.write_all(br#"{"status":"ok","data":{}}"#)
            })
            .create_async()
            .await;
        let client =
            WaqiClient::new(API_KEY.to_string(), &server.url(), Duration::from_secs(1)).unwrap();

        let result = client.station_feed("beijing").await;

        match result {
            Err(ProviderError::Unavailable(details)) => {
                assert!(details.contains("timed out"), "unexpected details: {}", details);
            },
            other => panic!("expected Unavailable, got {:?}", other),
        }
    }
}
