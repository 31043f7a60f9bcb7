use std::sync::Arc;

use reqwest::Client;
use tracing::{debug, trace};

use super::{exposition, MetricsCollector};

/// Ships metric snapshots to a Prometheus push gateway, grouped by job and
/// instance. Delivery is best-effort: a failed push is logged and dropped,
/// it never blocks the driver loop.
#[derive(Debug, Clone)]
pub struct PushClient {
    http: Client,
    url: String,
}

impl PushClient {
    pub fn new(gateway: &str, job: &str, instance: &str) -> Self {
        let base = gateway.trim_end_matches('/');
        Self {
            http: Client::new(),
            url: format!("{base}/metrics/job/{job}/instance/{instance}"),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fires one push of the current snapshot without blocking the caller.
    pub fn spawn_push(&self, metrics: Arc<MetricsCollector>) {
        let client = self.clone();
        tokio::spawn(async move {
            let body = exposition::render(&metrics.snapshot());
            let sent = client
                .http
                .post(&client.url)
                .header("Content-Type", "text/plain; version=0.0.4")
                .body(body)
                .send()
                .await;
            match sent {
                Ok(resp) => trace!(status = %resp.status(), "metrics pushed"),
                Err(err) => debug!(error = %err, "metrics push failed, snapshot dropped"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::extract::State;
    use axum::http::{StatusCode, Uri};
    use axum::Router;
    use parking_lot::Mutex;

    #[test]
    fn url_includes_job_and_instance_groupings() {
        let push = PushClient::new("http://pushgw:9091/", "loadgen-web3-txn", "client-0");
        assert_eq!(
            push.url(),
            "http://pushgw:9091/metrics/job/loadgen-web3-txn/instance/client-0"
        );
    }

    type Captured = Arc<Mutex<Option<(String, String)>>>;

    async fn capture(
        State(seen): State<Captured>,
        uri: Uri,
        body: String,
    ) -> StatusCode {
        *seen.lock() = Some((uri.path().to_owned(), body));
        StatusCode::OK
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn push_delivers_exposition_to_the_grouped_path() {
        let seen: Captured = Arc::new(Mutex::new(None));
        let app = Router::new().fallback(capture).with_state(Arc::clone(&seen));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let metrics = Arc::new(MetricsCollector::new());
        metrics.task_started();
        metrics.record_failure();

        let push = PushClient::new(&format!("http://{addr}"), "loadgen-web3-txn", "client-0");
        push.spawn_push(Arc::clone(&metrics));

        let mut waited = Duration::ZERO;
        loop {
            if seen.lock().is_some() {
                break;
            }
            assert!(waited < Duration::from_secs(5), "push never arrived");
            tokio::time::sleep(Duration::from_millis(10)).await;
            waited += Duration::from_millis(10);
        }

        let (path, body) = seen.lock().take().unwrap();
        assert_eq!(path, "/metrics/job/loadgen-web3-txn/instance/client-0");
        assert!(body.contains("txnerrors 1"));
        assert!(body.contains("txncount 0"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn push_to_unreachable_gateway_does_not_panic() {
        let metrics = Arc::new(MetricsCollector::new());
        // Reserved TEST-NET address, nothing listens there.
        let push = PushClient::new("http://192.0.2.1:1", "loadgen-web3-txn", "client-0");
        push.spawn_push(metrics);
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
