//! End-to-end downloads against a mock Web-API
//!
//! Every test starts a wiremock server, points the downloader at it and checks
//! the requests made and the files left in a temporary output directory.

mod common;

use common::{
    TEST_API_KEY, TEST_DELAY, assert_file_count, csv_body, csv_row, file_name, output_files,
    partition_rows, test_config, xml_body,
};
use corpno_dl::types::{DateRange, RECORD_COLUMNS, parse_iso_date};
use corpno_dl::writer::read_csv_output;
use corpno_dl::{
    CorpNoDownloader, DecodeError, Error, OutputFormat, OutputWriter, Query, QueryMode,
    QueryOptions,
};
use std::time::Instant;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn date_query(format: OutputFormat) -> Query {
    Query::new(
        QueryMode::ByDate(parse_iso_date("2020-05-07").unwrap()),
        QueryOptions::default(),
        format,
    )
}

fn period_query() -> Query {
    Query::new(
        QueryMode::ByPeriod(DateRange::parse("2020-05-01", "2020-05-31").unwrap()),
        QueryOptions::default(),
        OutputFormat::CsvUtf8,
    )
}

async fn mount_csv_partition(server: &MockServer, partition: u32, count: u32) {
    Mock::given(method("GET"))
        .and(path("/4/diff"))
        .and(query_param("divide", partition.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(csv_body(partition, count, &partition_rows(partition))),
        )
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn date_query_single_partition_writes_utf8_csv() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/4/diff"))
        .and(query_param("id", TEST_API_KEY))
        .and(query_param("type", "02"))
        .and(query_param("from", "2020-05-07"))
        .and(query_param("to", "2020-05-07"))
        .and(query_param("divide", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(csv_body(1, 1, &partition_rows(1))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let downloader = CorpNoDownloader::new(&test_config(&server.uri(), out.path())).unwrap();
    let query = date_query(OutputFormat::CsvUtf8);
    let summary = downloader.download(&query).await.unwrap();

    assert_eq!(summary.partitions_fetched(), 1);
    assert_eq!(summary.records(), 2);
    assert_eq!(summary.last_header.as_ref().unwrap().last_update_date, "2020-05-07");

    let written = &summary.files[0].path;
    assert_eq!(
        file_name(written),
        format!("result_20200507_1_{}.csv", query.argument_hash())
    );

    let text = std::fs::read_to_string(written).unwrap();
    assert!(text.starts_with(&format!("{}\r\n", RECORD_COLUMNS.join(","))));
    assert!(!text.contains("2020-05-07,2,1,1"), "partition header is replaced");

    let (header, records) = read_csv_output(written, OutputFormat::CsvUtf8).unwrap();
    assert_eq!(header.len(), RECORD_COLUMNS.len());
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].corporate_number, "1234567890123");
    assert_eq!(records[0].name, "株式会社第1");
    assert_eq!(records[1].name, "Example Co., Ltd.");
}

#[tokio::test]
async fn period_query_pages_through_every_partition() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    for partition in 1..=3 {
        mount_csv_partition(&server, partition, 3).await;
    }

    let downloader = CorpNoDownloader::new(&test_config(&server.uri(), out.path())).unwrap();
    let query = period_query();

    let started = Instant::now();
    let summary = downloader.download(&query).await.unwrap();

    assert!(started.elapsed() >= TEST_DELAY * 2);
    assert_eq!(summary.partitions_fetched(), 3);
    assert_eq!(summary.partition_count, 3);
    assert_file_count(out.path(), 3);

    let hash = query.argument_hash();
    let names: Vec<String> = output_files(out.path()).iter().map(|p| file_name(p)).collect();
    assert_eq!(
        names,
        vec![
            format!("result_20200501-20200531_1_{hash}.csv"),
            format!("result_20200501-20200531_2_{hash}.csv"),
            format!("result_20200501-20200531_3_{hash}.csv"),
        ]
    );

    let requests = server.received_requests().await.unwrap();
    let divides: Vec<String> = requests
        .iter()
        .filter_map(|r| {
            r.url
                .query_pairs()
                .find(|(k, _)| k == "divide")
                .map(|(_, v)| v.into_owned())
        })
        .collect();
    assert_eq!(divides, vec!["1", "2", "3"]);
}

#[tokio::test]
async fn pinned_partition_makes_one_request() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    mount_csv_partition(&server, 2, 4).await;

    let downloader = CorpNoDownloader::new(&test_config(&server.uri(), out.path())).unwrap();
    let query = period_query().with_partition(2).unwrap();
    let summary = downloader.download(&query).await.unwrap();

    assert_eq!(summary.partitions_fetched(), 1);
    assert_eq!(summary.partition_count, 4);
    assert!(file_name(&summary.files[0].path).starts_with("result_20200501-20200531_2_"));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn server_error_stops_the_run_and_keeps_earlier_files() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    mount_csv_partition(&server, 1, 3).await;
    Mock::given(method("GET"))
        .and(path("/4/diff"))
        .and(query_param("divide", "2"))
        .respond_with(ResponseTemplate::new(500).set_body_string("temporarily unavailable"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/4/diff"))
        .and(query_param("divide", "3"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let downloader = CorpNoDownloader::new(&test_config(&server.uri(), out.path())).unwrap();
    let err = downloader.download(&period_query()).await.unwrap_err();

    match &err {
        Error::Status { status, body } => {
            assert_eq!(*status, 500);
            assert_eq!(body, "temporarily unavailable");
        }
        other => panic!("expected Status, got {other:?}"),
    }
    assert_eq!(err.exit_code(), 1);
    assert_file_count(out.path(), 1);
}

#[tokio::test]
async fn malformed_header_is_a_decode_error() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .and(path("/4/diff"))
        .respond_with(ResponseTemplate::new(200).set_body_string("2020-05-07,2,1\r\n"))
        .mount(&server)
        .await;

    let downloader = CorpNoDownloader::new(&test_config(&server.uri(), out.path())).unwrap();
    let err = downloader
        .download(&date_query(OutputFormat::CsvUtf8))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Decode(_)), "got {err:?}");
    assert_file_count(out.path(), 0);
}

#[tokio::test]
async fn truncated_xml_body_stops_the_run_without_writing() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    let full = xml_body(1, 2, &["Alpha", "Beta"]);
    let cut = &full[..full.find("<name>Beta").unwrap() + "<name>Be".len()];
    Mock::given(method("GET"))
        .and(path("/4/diff"))
        .and(query_param("divide", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(cut))
        .expect(1)
        .mount(&server)
        .await;

    let downloader = CorpNoDownloader::new(&test_config(&server.uri(), out.path())).unwrap();
    let err = downloader
        .download(&date_query(OutputFormat::Xml))
        .await
        .unwrap_err();

    assert!(
        matches!(err, Error::Decode(DecodeError::Truncated { .. })),
        "got {err:?}"
    );
    assert_eq!(err.exit_code(), 1);
    assert_file_count(out.path(), 0);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn truncated_csv_body_stops_the_run_without_writing() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    let body = format!(
        "{}1,1234567890123,01,0,2020-05-07,2020-05-07,\"Alpha, In",
        csv_body(1, 2, &[])
    );
    Mock::given(method("GET"))
        .and(path("/4/diff"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    let downloader = CorpNoDownloader::new(&test_config(&server.uri(), out.path())).unwrap();
    let err = downloader
        .download(&date_query(OutputFormat::CsvUtf8))
        .await
        .unwrap_err();

    assert!(
        matches!(err, Error::Decode(DecodeError::UnterminatedQuote)),
        "got {err:?}"
    );
    assert_file_count(out.path(), 0);
}

#[tokio::test]
async fn xml_field_whitespace_reaches_the_file() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .and(path("/4/diff"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(xml_body(1, 1, &["  Alpha  Co "])),
        )
        .mount(&server)
        .await;

    let downloader = CorpNoDownloader::new(&test_config(&server.uri(), out.path())).unwrap();
    let summary = downloader
        .download(&date_query(OutputFormat::Xml))
        .await
        .unwrap();

    let text = std::fs::read_to_string(&summary.files[0].path).unwrap();
    assert!(text.contains("<name>  Alpha  Co </name>"));
}

#[tokio::test]
async fn shift_jis_response_is_written_as_shift_jis() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    let body = csv_body(1, 1, &[csv_row(1, "1234567890123", "株式会社テスト")]);
    let (encoded, _, _) = encoding_rs::SHIFT_JIS.encode(&body);

    Mock::given(method("GET"))
        .and(path("/4/diff"))
        .and(query_param("type", "01"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(encoded.into_owned()))
        .expect(1)
        .mount(&server)
        .await;

    let downloader = CorpNoDownloader::new(&test_config(&server.uri(), out.path())).unwrap();
    let summary = downloader
        .download(&date_query(OutputFormat::CsvShiftJis))
        .await
        .unwrap();

    let written = &summary.files[0].path;
    let bytes = std::fs::read(written).unwrap();
    assert!(String::from_utf8(bytes.clone()).is_err(), "file is not UTF-8");
    let (text, _, had_errors) = encoding_rs::SHIFT_JIS.decode(&bytes);
    assert!(!had_errors);
    assert!(text.contains("株式会社テスト"));

    let (_, records) = read_csv_output(written, OutputFormat::CsvShiftJis).unwrap();
    assert_eq!(records[0].name, "株式会社テスト");
}

#[tokio::test]
async fn xml_response_is_indented() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .and(path("/4/diff"))
        .and(query_param("type", "12"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(xml_body(1, 1, &["Alpha", "Beta"])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let downloader = CorpNoDownloader::new(&test_config(&server.uri(), out.path())).unwrap();
    let summary = downloader
        .download(&date_query(OutputFormat::Xml))
        .await
        .unwrap();

    let written = &summary.files[0].path;
    assert!(file_name(written).ends_with(".xml"));
    assert_eq!(summary.records(), 2);

    let text = std::fs::read_to_string(written).unwrap();
    assert!(text.starts_with("<?xml"));
    assert!(text.contains("\n   <lastUpdateDate>2020-05-07</lastUpdateDate>"));
    assert!(text.contains("\n      <name>Alpha</name>"));
}

#[tokio::test]
async fn xml_response_can_be_written_as_csv() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .and(path("/4/diff"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(xml_body(1, 1, &["Alpha", "Beta"])),
        )
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), out.path());
    let mut downloader = CorpNoDownloader::new(&config).unwrap();
    downloader.set_writer(OutputWriter::new(out.path()).with_xml_to_csv(true));
    let summary = downloader
        .download(&date_query(OutputFormat::Xml))
        .await
        .unwrap();

    let written = &summary.files[0].path;
    assert!(file_name(written).ends_with(".csv"));
    let (_, records) = read_csv_output(written, OutputFormat::CsvUtf8).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].name, "Beta");
    assert_eq!(records[1].sequence_number, "2");
}

#[tokio::test]
async fn corporate_number_query_uses_num_endpoint() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .and(path("/4/num"))
        .and(query_param("number", "1234567890123"))
        .and(query_param("history", "1"))
        .and(query_param_is_missing("divide"))
        .respond_with(ResponseTemplate::new(200).set_body_string(csv_body(
            1,
            1,
            &[csv_row(1, "1234567890123", "Alpha")],
        )))
        .expect(1)
        .mount(&server)
        .await;

    let options = QueryOptions {
        history: true,
        ..QueryOptions::default()
    };
    let query = Query::new(
        QueryMode::ByNumber("1234567890123".parse().unwrap()),
        options,
        OutputFormat::CsvUtf8,
    );

    let downloader = CorpNoDownloader::new(&test_config(&server.uri(), out.path())).unwrap();
    let summary = downloader.download(&query).await.unwrap();

    assert!(file_name(&summary.files[0].path).starts_with("result_1234567890123_1_"));
}

#[tokio::test]
async fn name_query_sends_search_options() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .and(path("/4/name"))
        .and(query_param("name", "テスト/商事"))
        .and(query_param("mode", "1"))
        .and(query_param("target", "1"))
        .and(query_param("change", "0"))
        .and(query_param("close", "1"))
        .and(query_param("divide", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(csv_body(
            1,
            1,
            &[csv_row(1, "1234567890123", "テスト/商事")],
        )))
        .expect(1)
        .mount(&server)
        .await;

    let query = Query::new(
        QueryMode::ByName("テスト/商事".to_string()),
        QueryOptions::default(),
        OutputFormat::CsvUtf8,
    );

    let downloader = CorpNoDownloader::new(&test_config(&server.uri(), out.path())).unwrap();
    let summary = downloader.download(&query).await.unwrap();

    // Separator in the name must not create a subdirectory.
    assert_eq!(summary.files[0].path.parent(), Some(out.path()));
    assert!(file_name(&summary.files[0].path).starts_with("result_テスト_商事_1_"));
}

#[tokio::test]
async fn missing_output_directory_is_created() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    let nested = out.path().join("a").join("b");
    mount_csv_partition(&server, 1, 1).await;

    let downloader = CorpNoDownloader::new(&test_config(&server.uri(), &nested)).unwrap();
    downloader.download(&period_query()).await.unwrap();

    assert_file_count(&nested, 1);
}
