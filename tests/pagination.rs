//! Pagination and time-window tests.
//!
//! Uses wiremock to serve pages keyed on `page_start`.

use futures::TryStreamExt;
use qintel::{ClientConfig, QiClient, QiError, Resource, TicketQuery};
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn connect(mock_server: &MockServer, config: Option<ClientConfig>) -> QiClient {
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "access_token": "t" })),
        )
        .mount(mock_server)
        .await;

    let config = config
        .unwrap_or_else(|| ClientConfig::new("a@b.c", "pw"))
        .with_base_url(mock_server.uri());
    QiClient::connect(config).await.unwrap()
}

fn page(first_id: u64, count: u64) -> serde_json::Value {
    let items: Vec<_> = (first_id..first_id + count)
        .map(|id| serde_json::json!({ "id": id, "subject": format!("Ticket {id}") }))
        .collect();
    serde_json::Value::Array(items)
}

async fn mount_page(mock_server: &MockServer, resource: &str, page_start: u64, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/{resource}")))
        .and(query_param("page_start", page_start.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_pages_advance_by_record_count() {
    let mock_server = MockServer::start().await;
    let client = connect(&mock_server, None).await;

    mount_page(&mock_server, "drp", 0, page(0, 50)).await;
    mount_page(&mock_server, "drp", 50, page(50, 50)).await;
    mount_page(&mock_server, "drp", 100, page(100, 3)).await;
    mount_page(&mock_server, "drp", 103, page(103, 0)).await;

    let mut pager = client.drp(&TicketQuery::default()).unwrap();
    let mut starts = Vec::new();
    let mut total = 0;
    while let Some(page) = pager.next_page().await.unwrap() {
        starts.push(page.page_start);
        total += page.len();
    }

    assert_eq!(total, 103);
    assert_eq!(starts, vec![0, 50, 100]);
    assert_eq!(pager.requests(), 4);
    assert_eq!(pager.page_start(), 103);
    assert!(pager.is_done());

    // Exhausted pagers stay exhausted without new requests
    assert!(pager.next_page().await.unwrap().is_none());
    assert_eq!(pager.requests(), 4);
}

#[tokio::test]
async fn test_records_come_in_server_order() {
    let mock_server = MockServer::start().await;
    let client = connect(&mock_server, None).await;

    mount_page(&mock_server, "intelligence", 0, page(0, 50)).await;
    mount_page(&mock_server, "intelligence", 50, page(50, 50)).await;
    mount_page(&mock_server, "intelligence", 100, page(100, 3)).await;
    mount_page(&mock_server, "intelligence", 103, page(103, 0)).await;

    let records = client
        .intelligence(&TicketQuery::default())
        .unwrap()
        .collect_all()
        .await
        .unwrap();

    let ids: Vec<u64> = records.iter().filter_map(|r| r.id()).collect();
    assert_eq!(ids, (0..103).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_no_content_ends_pagination() {
    let mock_server = MockServer::start().await;
    let client = connect(&mock_server, None).await;

    mount_page(&mock_server, "service-requests", 0, page(0, 7)).await;
    Mock::given(method("GET"))
        .and(path("/service-requests"))
        .and(query_param("page_start", "7"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let records = client
        .service_requests(&TicketQuery::default())
        .unwrap()
        .collect_all()
        .await
        .unwrap();

    assert_eq!(records.len(), 7);
}

#[tokio::test]
async fn test_next_record_yields_one_by_one() {
    let mock_server = MockServer::start().await;
    let client = connect(&mock_server, None).await;

    mount_page(&mock_server, "drp", 0, page(1, 2)).await;
    mount_page(&mock_server, "drp", 2, page(3, 0)).await;

    let mut pager = client.drp(&TicketQuery::default()).unwrap();
    assert_eq!(pager.next_record().await.unwrap().and_then(|r| r.id()), Some(1));
    assert_eq!(pager.next_record().await.unwrap().and_then(|r| r.id()), Some(2));
    assert!(pager.next_record().await.unwrap().is_none());
}

#[tokio::test]
async fn test_stream_adapter() {
    let mock_server = MockServer::start().await;
    let client = connect(&mock_server, None).await;

    mount_page(&mock_server, "vulnerability-alerts", 0, page(0, 4)).await;
    mount_page(&mock_server, "vulnerability-alerts", 4, page(4, 0)).await;

    let records: Vec<_> = client
        .vulnerability_alerts(&TicketQuery::since("7d"))
        .unwrap()
        .into_stream()
        .try_collect()
        .await
        .unwrap();

    assert_eq!(records.len(), 4);
}

#[tokio::test]
async fn test_pager_is_lazy() {
    let mock_server = MockServer::start().await;
    let client = connect(&mock_server, None).await;

    Mock::given(method("GET"))
        .and(path("/drp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(0, 0)))
        .expect(0)
        .mount(&mock_server)
        .await;

    let pager = client.drp(&TicketQuery::since("1h")).unwrap();
    assert_eq!(pager.requests(), 0);
    drop(pager);
}

#[tokio::test]
async fn test_since_sends_only_since() {
    let mock_server = MockServer::start().await;
    let client = connect(&mock_server, None).await;

    Mock::given(method("GET"))
        .and(path("/drp"))
        .and(query_param("page_start", "0"))
        .and(query_param("status", "open"))
        .and(query_param_is_missing("until"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(0, 0)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let query = TicketQuery::since("30d").param("status", "open");
    client.drp(&query).unwrap().collect_all().await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    let get = requests.iter().find(|r| r.url.path() == "/drp").unwrap();
    let since = get
        .url
        .query_pairs()
        .find(|(k, _)| k == "since")
        .map(|(_, v)| v.into_owned())
        .expect("since parameter");

    // UTC, second precision, no offset suffix
    assert_eq!(since.len(), "2021-04-07T12:30:45".len());
    let parsed = chrono::NaiveDateTime::parse_from_str(&since, "%Y-%m-%dT%H:%M:%S").unwrap();
    let expected = chrono::Utc::now().naive_utc() - chrono::Duration::days(30);
    assert!((parsed - expected).num_seconds().abs() <= 5);
}

#[tokio::test]
async fn test_date_range_sends_normalized_bounds() {
    let mock_server = MockServer::start().await;
    let client = connect(&mock_server, None).await;

    Mock::given(method("GET"))
        .and(path("/intelligence"))
        .and(query_param("since", "2020-10-01T00:00:00"))
        .and(query_param("until", "2021-04-07T08:00:00"))
        .and(query_param("page_start", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(0, 0)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let query = TicketQuery::between("2020-10-01", "2021-04-07T10:00:00+02:00");
    let records = client.intelligence(&query).unwrap().collect_all().await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_conflicting_filters_fail_before_any_request() {
    let mock_server = MockServer::start().await;
    let client = connect(&mock_server, None).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(0, 0)))
        .expect(0)
        .mount(&mock_server)
        .await;

    let query = TicketQuery::since("1h").with_date_range("2020-10-01", "2021-04-07");
    assert!(matches!(client.drp(&query), Err(QiError::Validation(_))));

    let query = TicketQuery::since("1 hour");
    assert!(matches!(
        client.query(Resource::Intelligence, &query),
        Err(QiError::Validation(_))
    ));

    let query = TicketQuery::between("2020-10-01", "next tuesday");
    assert!(matches!(client.drp(&query), Err(QiError::Validation(_))));
}

#[tokio::test]
async fn test_error_mid_pagination_ends_pager() {
    let mock_server = MockServer::start().await;
    let client = connect(&mock_server, None).await;

    mount_page(&mock_server, "drp", 0, page(0, 50)).await;
    Mock::given(method("GET"))
        .and(path("/drp"))
        .and(query_param("page_start", "50"))
        .respond_with(ResponseTemplate::new(400).set_body_string("page_start out of range"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut pager = client.drp(&TicketQuery::default()).unwrap();
    let first = pager.next_page().await.unwrap().unwrap();
    assert_eq!(first.len(), 50);

    let err = pager.next_page().await.unwrap_err();
    match err {
        QiError::Query { path, status, body } => {
            assert_eq!(path, "drp");
            assert_eq!(status, 400);
            assert!(body.contains("page_start out of range"));
        }
        other => panic!("expected query error, got {other:?}"),
    }

    // Not resumable
    assert!(pager.is_done());
    assert!(pager.next_page().await.unwrap().is_none());
}

#[tokio::test]
async fn test_non_array_body_is_parse_error() {
    let mock_server = MockServer::start().await;
    let client = connect(&mock_server, None).await;

    mount_page(&mock_server, "drp", 0, serde_json::json!({ "tickets": [] })).await;

    let err = client
        .drp(&TicketQuery::default())
        .unwrap()
        .collect_all()
        .await
        .unwrap_err();
    assert!(matches!(err, QiError::Parse(_)));
}

#[tokio::test]
async fn test_max_pages_guard_stops_loop() {
    let mock_server = MockServer::start().await;
    let client = connect(&mock_server, Some(ClientConfig::new("a@b.c", "pw").with_max_pages(2))).await;

    // A misbehaving server that never returns an empty page
    Mock::given(method("GET"))
        .and(path("/drp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(0, 10)))
        .expect(2)
        .mount(&mock_server)
        .await;

    let mut pager = client.drp(&TicketQuery::default()).unwrap();
    let mut total = 0;
    while let Some(page) = pager.next_page().await.unwrap() {
        total += page.len();
    }

    assert_eq!(total, 20);
    assert_eq!(pager.requests(), 2);
}
