//! Recently processed tests, read back from CircleCI run artifacts
//!
//! Walks pipeline -> workflow -> job -> artifact for the configured branch and
//! collects the test path each successful run selected. The lookback is purely
//! advisory: every failure is logged and turned into "nothing to exclude".

use crate::config::CiSettings;
use crate::domain::SessionLog;
use crate::error::{CiError, CiResult};
use chrono::{DateTime, Duration, Utc};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pipeline {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Workflow {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub job_number: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Artifact {
    pub path: String,
    pub url: String,
}

/// Read-only view of a CI provider's run history.
pub trait PipelineSource {
    /// Pipelines for `branch`, newest first.
    fn pipelines(&self, branch: &str) -> CiResult<Vec<Pipeline>>;
    fn workflows(&self, pipeline_id: &str) -> CiResult<Vec<Workflow>>;
    fn jobs(&self, workflow_id: &str) -> CiResult<Vec<Job>>;
    fn artifacts(&self, job_number: u64) -> CiResult<Vec<Artifact>>;
    fn session_log(&self, url: &str) -> CiResult<SessionLog>;
}

/// CircleCI API v2 client.
pub struct CircleCiClient {
    http: Client,
    api_base: String,
    project_slug: String,
}

impl std::fmt::Debug for CircleCiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircleCiClient")
            .field("api_base", &self.api_base)
            .field("project_slug", &self.project_slug)
            .finish_non_exhaustive()
    }
}

impl CircleCiClient {
    pub fn new(ci: &CiSettings) -> CiResult<Self> {
        let token = ci.token.as_deref().ok_or(CiError::MissingToken)?;

        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(token).map_err(|_| CiError::InvalidToken)?;
        headers.insert("Circle-Token", value);

        let api_base = ci.api_base.trim_end_matches('/').to_string();
        let http = Client::builder()
            .default_headers(headers)
            .timeout(ci.timeout())
            .build()
            .map_err(|source| CiError::Transport { url: api_base.clone(), source })?;

        Ok(Self { http, api_base, project_slug: ci.project_slug.clone() })
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> CiResult<T> {
        let resp = self
            .http
            .get(url)
            .send()
            .map_err(|source| CiError::Transport { url: url.to_string(), source })?;
        if !resp.status().is_success() {
            return Err(CiError::Status { url: url.to_string(), status: resp.status().as_u16() });
        }
        resp.json::<T>().map_err(|source| CiError::Decode { url: url.to_string(), source })
    }
}

impl PipelineSource for CircleCiClient {
    fn pipelines(&self, branch: &str) -> CiResult<Vec<Pipeline>> {
        let url = format!("{}/project/{}/pipeline", self.api_base, self.project_slug);
        let resp = self
            .http
            .get(&url)
            .query(&[("branch", branch)])
            .send()
            .map_err(|source| CiError::Transport { url: url.clone(), source })?;
        if !resp.status().is_success() {
            return Err(CiError::Status { url, status: resp.status().as_u16() });
        }
        let page: Page<Pipeline> =
            resp.json().map_err(|source| CiError::Decode { url: url.clone(), source })?;
        Ok(page.items)
    }

    fn workflows(&self, pipeline_id: &str) -> CiResult<Vec<Workflow>> {
        let url = format!("{}/pipeline/{pipeline_id}/workflow", self.api_base);
        Ok(self.get_json::<Page<Workflow>>(&url)?.items)
    }

    fn jobs(&self, workflow_id: &str) -> CiResult<Vec<Job>> {
        let url = format!("{}/workflow/{workflow_id}/job", self.api_base);
        Ok(self.get_json::<Page<Job>>(&url)?.items)
    }

    fn artifacts(&self, job_number: u64) -> CiResult<Vec<Artifact>> {
        let url = format!("{}/project/{}/{job_number}/artifacts", self.api_base, self.project_slug);
        Ok(self.get_json::<Page<Artifact>>(&url)?.items)
    }

    fn session_log(&self, url: &str) -> CiResult<SessionLog> {
        self.get_json(url)
    }
}

/// Test paths selected by successful runs within the lookback window.
///
/// Never fails: a missing token, an unreachable API or a malformed response
/// all produce an empty list plus a diagnostic.
pub fn fetch_recent_history(ci: &CiSettings, now: DateTime<Utc>) -> Vec<PathBuf> {
    if !ci.enabled {
        tracing::debug!("CI lookback disabled");
        return Vec::new();
    }

    let client = match CircleCiClient::new(ci) {
        Ok(client) => client,
        Err(CiError::MissingToken) => {
            tracing::info!("CIRCLE_API_TOKEN not found - skipping artifact check");
            return Vec::new();
        }
        Err(e) => {
            tracing::warn!("Could not set up CI client: {e}");
            return Vec::new();
        }
    };

    tracing::info!("Checking CircleCI for previous run artifacts...");
    match recent_test_paths(&client, ci, now) {
        Ok(paths) => {
            if paths.is_empty() {
                tracing::info!("No recent successful runs found");
            }
            paths
        }
        Err(e) => {
            tracing::warn!("Could not fetch CircleCI artifacts: {e}");
            Vec::new()
        }
    }
}

/// Walk the run history behind `source`.
///
/// Pipelines are assumed newest-first; the walk stops at the first one older
/// than the lookback window. A failure listing pipelines or parsing a pipeline
/// timestamp aborts the walk. Failures further down only skip that pipeline.
pub fn recent_test_paths(
    source: &impl PipelineSource,
    ci: &CiSettings,
    now: DateTime<Utc>,
) -> CiResult<Vec<PathBuf>> {
    let cutoff = Duration::try_seconds(ci.lookback_secs())
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let pipelines = source.pipelines(&ci.branch)?;
    if pipelines.is_empty() {
        tracing::info!("No previous pipelines found");
        return Ok(Vec::new());
    }

    let mut selected = Vec::new();
    for pipeline in &pipelines {
        if let Some(created_at) = &pipeline.created_at {
            let created = DateTime::parse_from_rfc3339(created_at)
                .map_err(|_| CiError::Timestamp(created_at.clone()))?
                .with_timezone(&Utc);
            if created < cutoff {
                tracing::info!(
                    "Reached pipelines older than {} days, stopping search",
                    ci.lookback_days
                );
                break;
            }
        }

        match selected_test_path(source, ci, pipeline) {
            Ok(Some(path)) => {
                tracing::info!("Excluding recently processed file: {}", path.display());
                selected.push(path);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Skipping pipeline {}: {e}", pipeline.id),
        }
    }

    Ok(selected)
}

fn selected_test_path(
    source: &impl PipelineSource,
    ci: &CiSettings,
    pipeline: &Pipeline,
) -> CiResult<Option<PathBuf>> {
    let workflows = source.workflows(&pipeline.id)?;
    let Some(workflow) = workflows.first().filter(|w| w.status.as_deref() == Some("success"))
    else {
        return Ok(None);
    };

    let jobs = source.jobs(&workflow.id)?;
    let Some(job_number) = jobs
        .iter()
        .find(|job| {
            job.name.as_deref() == Some(ci.job_name.as_str())
                && job.status.as_deref() == Some("success")
        })
        .and_then(|job| job.job_number)
    else {
        return Ok(None);
    };

    let artifacts = source.artifacts(job_number)?;
    let Some(artifact) = artifacts.iter().find(|a| a.path.ends_with(&ci.artifact_suffix)) else {
        return Ok(None);
    };

    // A broken log only loses this run's exclusion.
    match source.session_log(&artifact.url) {
        Ok(log) => Ok(log.test_path().and_then(crate::utils::normalize_entry)),
        Err(e) => {
            tracing::debug!("Unreadable session log {}: {e}", artifact.url);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::net::TcpListener;
    use std::time::Instant;

    #[derive(Default)]
    struct FakeCi {
        pipelines: Vec<Pipeline>,
        fail_pipelines: bool,
        workflows: HashMap<String, Vec<Workflow>>,
        jobs: HashMap<String, Vec<Job>>,
        artifacts: HashMap<u64, Vec<Artifact>>,
        logs: HashMap<String, String>,
        workflow_calls: RefCell<Vec<String>>,
    }

    impl FakeCi {
        /// One fully successful run at `created_at` that selected `test_path`.
        fn add_run(&mut self, n: u64, created_at: &str, test_path: &str) {
            let pipeline_id = format!("p{n}");
            let workflow_id = format!("w{n}");
            let url = format!("https://artifacts.test/{n}/log.json");
            self.pipelines
                .push(Pipeline { id: pipeline_id.clone(), created_at: Some(created_at.into()) });
            self.workflows.insert(
                pipeline_id,
                vec![Workflow { id: workflow_id.clone(), status: Some("success".into()) }],
            );
            self.jobs.insert(
                workflow_id,
                vec![
                    Job {
                        name: Some("lint".into()),
                        status: Some("success".into()),
                        job_number: Some(n * 100),
                    },
                    Job {
                        name: Some("ai-contracts-test".into()),
                        status: Some("success".into()),
                        job_number: Some(n),
                    },
                ],
            );
            self.artifacts.insert(
                n,
                vec![
                    Artifact {
                        path: "tmp/prompt.md".into(),
                        url: "https://artifacts.test/p".into(),
                    },
                    Artifact { path: "tmp/log.json".into(), url: url.clone() },
                ],
            );
            self.logs.insert(
                url,
                format!(r#"{{"status":"finished","selected_files":{{"test_path":"{test_path}"}}}}"#),
            );
        }

        fn status_error(url: &str) -> CiError {
            CiError::Status { url: url.to_string(), status: 404 }
        }
    }

    impl PipelineSource for FakeCi {
        fn pipelines(&self, _branch: &str) -> CiResult<Vec<Pipeline>> {
            if self.fail_pipelines {
                return Err(Self::status_error("pipelines"));
            }
            Ok(self.pipelines.clone())
        }

        fn workflows(&self, pipeline_id: &str) -> CiResult<Vec<Workflow>> {
            self.workflow_calls.borrow_mut().push(pipeline_id.to_string());
            self.workflows.get(pipeline_id).cloned().ok_or_else(|| Self::status_error(pipeline_id))
        }

        fn jobs(&self, workflow_id: &str) -> CiResult<Vec<Job>> {
            self.jobs.get(workflow_id).cloned().ok_or_else(|| Self::status_error(workflow_id))
        }

        fn artifacts(&self, job_number: u64) -> CiResult<Vec<Artifact>> {
            Ok(self.artifacts.get(&job_number).cloned().unwrap_or_default())
        }

        fn session_log(&self, url: &str) -> CiResult<SessionLog> {
            let body = self.logs.get(url).ok_or_else(|| Self::status_error(url))?;
            serde_json::from_str(body)
                .map_err(|_| CiError::Status { url: url.to_string(), status: 500 })
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-03-15T12:00:00Z").unwrap().with_timezone(&Utc)
    }

    #[test]
    fn collects_selected_tests_within_window() {
        let mut ci = FakeCi::default();
        ci.add_run(1, "2025-03-14T09:00:00Z", "test/L1/OptimismPortal.t.sol");
        ci.add_run(2, "2025-03-10T09:00:00.123Z", "test/L2/L2Genesis.t.sol");

        let paths = recent_test_paths(&ci, &CiSettings::default(), now()).unwrap();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("test/L1/OptimismPortal.t.sol"),
                PathBuf::from("test/L2/L2Genesis.t.sol")
            ]
        );
    }

    #[test]
    fn stops_at_first_pipeline_outside_window() {
        let mut ci = FakeCi::default();
        ci.add_run(1, "2025-03-14T09:00:00Z", "test/A.t.sol");
        ci.add_run(2, "2025-02-01T09:00:00Z", "test/B.t.sol");
        ci.add_run(3, "2025-03-13T09:00:00Z", "test/C.t.sol");

        let paths = recent_test_paths(&ci, &CiSettings::default(), now()).unwrap();
        assert_eq!(paths, vec![PathBuf::from("test/A.t.sol")]);
        assert_eq!(*ci.workflow_calls.borrow(), vec!["p1".to_string()]);
    }

    #[test]
    fn skips_failed_workflows_and_jobs() {
        let mut ci = FakeCi::default();
        ci.add_run(1, "2025-03-14T09:00:00Z", "test/A.t.sol");
        ci.add_run(2, "2025-03-13T09:00:00Z", "test/B.t.sol");
        ci.add_run(3, "2025-03-12T09:00:00Z", "test/C.t.sol");
        ci.workflows.get_mut("p1").unwrap()[0].status = Some("failed".into());
        ci.jobs.get_mut("w2").unwrap()[1].status = Some("failed".into());

        let paths = recent_test_paths(&ci, &CiSettings::default(), now()).unwrap();
        assert_eq!(paths, vec![PathBuf::from("test/C.t.sol")]);
    }

    #[test]
    fn per_pipeline_errors_skip_only_that_pipeline() {
        let mut ci = FakeCi::default();
        ci.add_run(1, "2025-03-14T09:00:00Z", "test/A.t.sol");
        ci.add_run(2, "2025-03-13T09:00:00Z", "test/B.t.sol");
        ci.workflows.remove("p1");
        ci.logs.clear();
        ci.add_run(3, "2025-03-12T09:00:00Z", "test/C.t.sol");

        let paths = recent_test_paths(&ci, &CiSettings::default(), now()).unwrap();
        assert_eq!(paths, vec![PathBuf::from("test/C.t.sol")]);
    }

    #[test]
    fn selected_paths_are_normalized_like_static_entries() {
        let mut ci = FakeCi::default();
        ci.add_run(1, "2025-03-14T09:00:00Z", "./test/L1/Foo.t.sol");
        ci.add_run(2, "2025-03-13T09:00:00Z", "./");

        let paths = recent_test_paths(&ci, &CiSettings::default(), now()).unwrap();
        assert_eq!(paths, vec![PathBuf::from("test/L1/Foo.t.sol")]);
    }

    #[test]
    fn pipeline_listing_failure_is_an_error() {
        let ci = FakeCi { fail_pipelines: true, ..FakeCi::default() };
        assert!(recent_test_paths(&ci, &CiSettings::default(), now()).is_err());
    }

    #[test]
    fn malformed_pipeline_timestamp_aborts_walk() {
        let mut ci = FakeCi::default();
        ci.add_run(1, "yesterday", "test/A.t.sol");
        assert!(matches!(
            recent_test_paths(&ci, &CiSettings::default(), now()),
            Err(CiError::Timestamp(_))
        ));
    }

    #[test]
    fn pipeline_without_timestamp_is_still_examined() {
        let mut ci = FakeCi::default();
        ci.add_run(1, "2025-03-14T09:00:00Z", "test/A.t.sol");
        ci.pipelines[0].created_at = None;

        let paths = recent_test_paths(&ci, &CiSettings::default(), now()).unwrap();
        assert_eq!(paths, vec![PathBuf::from("test/A.t.sol")]);
    }

    #[test]
    fn missing_token_degrades_to_empty() {
        let ci = CiSettings { token: None, ..CiSettings::default() };
        assert!(fetch_recent_history(&ci, now()).is_empty());
    }

    #[test]
    fn disabled_lookback_degrades_to_empty() {
        let ci = CiSettings {
            enabled: false,
            token: Some("token".to_string()),
            ..CiSettings::default()
        };
        assert!(fetch_recent_history(&ci, now()).is_empty());
    }

    #[test]
    fn unreachable_api_degrades_to_empty() {
        let ci = CiSettings {
            api_base: "http://127.0.0.1:9".to_string(),
            token: Some("token".to_string()),
            timeout_secs: 1,
            ..CiSettings::default()
        };
        assert!(fetch_recent_history(&ci, now()).is_empty());
    }

    #[test]
    fn silent_api_times_out_to_empty() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        // Accept and hold connections without ever answering.
        std::thread::spawn(move || {
            let mut held = Vec::new();
            for stream in listener.incoming().flatten() {
                held.push(stream);
            }
        });

        let ci = CiSettings {
            api_base: format!("http://{addr}"),
            token: Some("token".to_string()),
            timeout_secs: 1,
            ..CiSettings::default()
        };
        let started = Instant::now();
        assert!(fetch_recent_history(&ci, now()).is_empty());
        assert!(started.elapsed() < std::time::Duration::from_secs(8));
    }
}
