//! Helper functions for integration tests

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use logpulse::sink::{Point, RecordSink};

/// Render one well-formed access-log line.
pub fn log_line(method: &str, target: &str, status: u16, bytes: u64) -> String {
    format!(
        r#"172.0.0.12 - - [04/Mar/2018:13:49:52 +0000] http "{method} {target} HTTP/1.0" {status} {bytes} "-" "KeepAliveClient" "-" 1.005 1.854"#
    )
}

/// A line that fails the structural grammar (two-token request line).
pub fn malformed_line() -> String {
    r#"172.0.0.12 - - [04/Mar/2018:13:49:52 +0000] http "GET /qux" 200 1014 "-" "KeepAliveClient" "-" 0.479 0.479"#
        .to_string()
}

/// Sink capturing every point it receives.
#[derive(Default)]
pub struct CapturingSink {
    points: Mutex<Vec<Point>>,
}

impl CapturingSink {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn point_count(&self) -> usize {
        self.points.lock().unwrap().len()
    }

    pub fn paths(&self) -> Vec<String> {
        self.points
            .lock()
            .unwrap()
            .iter()
            .filter_map(|point| {
                point
                    .tags
                    .iter()
                    .find(|(key, _)| *key == "Path")
                    .map(|(_, value)| value.clone())
            })
            .collect()
    }
}

#[async_trait]
impl RecordSink for CapturingSink {
    async fn write(&self, points: Vec<Point>) -> Result<()> {
        self.points.lock().unwrap().extend(points);
        Ok(())
    }
}

/// Poll until `predicate` holds or the timeout elapses.
pub async fn wait_until<F>(timeout: std::time::Duration, mut predicate: F)
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while !predicate() {
        if tokio::time::Instant::now() >= deadline {
            panic!("condition not reached within {timeout:?}");
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}
