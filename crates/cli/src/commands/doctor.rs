use std::time::Duration;

use plumbline_core::config::{AppConfig, LoadOptions};
use reqwest::Url;
use serde::Serialize;
use tokio::net::TcpStream;

use crate::commands::{CommandResult, EXIT_CONFIG, EXIT_SETUP};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn skipped(name: &'static str, reason: &str) -> Self {
        Self { name, status: CheckStatus::Skipped, details: format!("skipped because {reason}") }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => build_report(Ok(&config)),
        Err(error) => build_report(Err(error.to_string())),
    };
    finish(report, json_output)
}

/// Runs the readiness checks against an already loaded config.
pub fn run_with(config: &AppConfig, json_output: bool) -> CommandResult {
    finish(build_report(Ok(config)), json_output)
}

fn finish(report: DoctorReport, json_output: bool) -> CommandResult {
    let config_failed = report
        .checks
        .iter()
        .any(|check| check.name == "config_validation" && check.status == CheckStatus::Fail);
    let exit_code = match report.overall_status {
        CheckStatus::Pass => 0,
        _ if config_failed => EXIT_CONFIG,
        _ => EXIT_SETUP,
    };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report(config: Result<&AppConfig, String>) -> DoctorReport {
    let mut checks = Vec::new();

    match config {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_attachment_policy(config));
            match parse_endpoint(&config.endpoint.url) {
                Ok((url, host, port)) => {
                    checks.push(DoctorCheck {
                        name: "endpoint_url",
                        status: CheckStatus::Pass,
                        details: format!("{} lead endpoint at `{url}`", url.scheme()),
                    });
                    checks.push(check_endpoint_reachability(&host, port));
                }
                Err(details) => {
                    checks.push(DoctorCheck {
                        name: "endpoint_url",
                        status: CheckStatus::Fail,
                        details,
                    });
                    checks.push(DoctorCheck::skipped(
                        "endpoint_reachability",
                        "the endpoint url is unusable",
                    ));
                }
            }
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error,
            });
            for name in ["attachment_policy", "endpoint_url", "endpoint_reachability"] {
                checks.push(DoctorCheck::skipped(name, "configuration did not load"));
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_attachment_policy(config: &AppConfig) -> DoctorCheck {
    DoctorCheck {
        name: "attachment_policy",
        status: CheckStatus::Pass,
        details: format!(
            "up to {} photos per lead, {} bytes each",
            config.wizard.max_attachments, config.wizard.max_attachment_bytes
        ),
    }
}

fn parse_endpoint(raw: &str) -> Result<(Url, String, u16), String> {
    let url = Url::parse(raw).map_err(|error| format!("`{raw}` is not a valid url: {error}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("`{raw}` must use http or https"));
    }
    let host = url.host_str().ok_or_else(|| format!("`{raw}` has no host"))?.to_string();
    let port = url.port_or_known_default().ok_or_else(|| format!("`{raw}` has no port"))?;
    Ok((url, host, port))
}

fn check_endpoint_reachability(host: &str, port: u16) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "endpoint_reachability",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let result = runtime.block_on(async {
        match tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect((host, port))).await {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(error)) => Err(format!("could not connect to {host}:{port}: {error}")),
            Err(_) => Err(format!(
                "connecting to {host}:{port} timed out after {}s",
                CONNECT_TIMEOUT.as_secs()
            )),
        }
    });

    match result {
        Ok(()) => DoctorCheck {
            name: "endpoint_reachability",
            status: CheckStatus::Pass,
            details: format!("accepted a connection on {host}:{port}"),
        },
        Err(details) => {
            DoctorCheck { name: "endpoint_reachability", status: CheckStatus::Fail, details }
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
