use std::time::Duration;

pub const REPORT_PATH: &str = "stats/report";

#[derive(Debug, thiserror::Error)]
pub enum ReportFetchError {
    #[error("report request to {url} failed: {reason}")]
    Request { url: String, reason: String },
    #[error("report request to {url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("report body from {url} could not be read: {reason}")]
    Body { url: String, reason: String },
}

/// Pulls the final HTML report out of an interactive worker before it stops.
pub trait WorkerReportClient: Send + Sync {
    fn fetch_report(&self, worker_url: &str, timeout: Duration)
        -> Result<String, ReportFetchError>;
}

pub fn report_url(worker_url: &str) -> String {
    format!("{}/{REPORT_PATH}", worker_url.trim_end_matches('/'))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HttpReportClient;

impl WorkerReportClient for HttpReportClient {
    fn fetch_report(
        &self,
        worker_url: &str,
        timeout: Duration,
    ) -> Result<String, ReportFetchError> {
        let url = report_url(worker_url);
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        let response = agent.get(&url).call().map_err(|err| match err {
            ureq::Error::Status(status, _) => ReportFetchError::Status {
                url: url.clone(),
                status,
            },
            other => ReportFetchError::Request {
                url: url.clone(),
                reason: other.to_string(),
            },
        })?;

        let status = response.status();
        if status != 200 {
            return Err(ReportFetchError::Status { url, status });
        }
        response
            .into_string()
            .map_err(|err| ReportFetchError::Body {
                url,
                reason: err.to_string(),
            })
    }
}
