//! End-to-end flow: appended lines traverse tailer, parsers and emitters.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use logpulse::actors::counter::CounterHandle;
use logpulse::config::PipelineConfig;
use logpulse::pipeline::Pipeline;
use logpulse::sink::InfluxSink;
use logpulse::tailer::FileTailer;

use crate::helpers::{CapturingSink, log_line, wait_until};

fn test_pipeline_config() -> PipelineConfig {
    PipelineConfig {
        queue_capacity: 32,
        parser_workers: 2,
        emitter_workers: 4,
        poll_interval_ms: 20,
        emit_batch_size: 1,
    }
}

fn spawn_file_pipeline(
    path: std::path::PathBuf,
    sink: Arc<CapturingSink>,
    counter: CounterHandle,
) -> Pipeline {
    let config = test_pipeline_config();
    let source = Box::new(FileTailer::new(
        path,
        Duration::from_millis(config.poll_interval_ms),
        counter.clone(),
    ));
    Pipeline::spawn(&config, source, sink, counter)
}

fn teardown(pipeline: &Pipeline) {
    pipeline.source.abort();
    for worker in &pipeline.workers {
        worker.abort();
    }
}

#[tokio::test]
async fn test_appended_lines_all_reach_the_sink() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let counter = CounterHandle::spawn();
    let sink = CapturingSink::shared();

    let pipeline = spawn_file_pipeline(file.path().to_path_buf(), sink.clone(), counter.clone());

    // Let the tailer reach end of file before appending.
    tokio::time::sleep(Duration::from_millis(100)).await;

    for i in 0..50 {
        writeln!(file, "{}", log_line("GET", &format!("/page/{i}"), 200, 1024)).unwrap();
    }
    file.flush().unwrap();

    // Exactly N records must eventually arrive, regardless of worker count.
    wait_until(Duration::from_secs(5), || sink.point_count() == 50).await;

    let mut paths = sink.paths();
    paths.sort();
    let mut expected: Vec<String> = (0..50).map(|i| format!("/page/{i}")).collect();
    expected.sort();
    assert_eq!(paths, expected);

    let totals = counter.totals().await.unwrap();
    assert_eq!(totals.lines_handled, 50);
    assert_eq!(totals.parse_errors, 0);

    teardown(&pipeline);
    counter.shutdown().await;
}

#[tokio::test]
async fn test_historical_lines_are_not_replayed() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "{}", log_line("GET", "/historical", 200, 1)).unwrap();
    file.flush().unwrap();

    let counter = CounterHandle::spawn();
    let sink = CapturingSink::shared();

    let pipeline = spawn_file_pipeline(file.path().to_path_buf(), sink.clone(), counter.clone());

    tokio::time::sleep(Duration::from_millis(100)).await;

    writeln!(file, "{}", log_line("GET", "/fresh", 200, 1)).unwrap();
    file.flush().unwrap();

    wait_until(Duration::from_secs(5), || sink.point_count() == 1).await;
    assert_eq!(sink.paths(), vec!["/fresh".to_string()]);

    teardown(&pipeline);
    counter.shutdown().await;
}

#[tokio::test]
async fn test_full_production_path_writes_to_mock_influx() {
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/write"))
        .and(query_param("db", "nginx"))
        .and(body_string_contains("nginx_log,Path=/checkout"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1..)
        .mount(&mock_server)
        .await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    let counter = CounterHandle::spawn();

    let dsn = format!("{}@user@secret@nginx@s", mock_server.uri());
    let sink = Arc::new(InfluxSink::from_dsn(&dsn).unwrap());

    let config = test_pipeline_config();
    let source = Box::new(FileTailer::new(
        file.path().to_path_buf(),
        Duration::from_millis(config.poll_interval_ms),
        counter.clone(),
    ));
    let pipeline = Pipeline::spawn(&config, source, sink, counter.clone());

    tokio::time::sleep(Duration::from_millis(100)).await;

    writeln!(file, "{}", log_line("POST", "/checkout?step=2", 201, 512)).unwrap();
    file.flush().unwrap();

    // Wait for the write to arrive at the mock server; expectations are
    // verified again on drop.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let requests = mock_server.received_requests().await.unwrap_or_default();
        if !requests.is_empty() {
            break;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("no sink write observed within 5s");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    teardown(&pipeline);
    counter.shutdown().await;
}
