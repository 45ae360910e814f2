use ivrbook_core::config::{AppConfig, LoadOptions};
use ivrbook_notify::WebhookNotifier;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
pub struct DoctorCheck {
    pub name: &'static str,
    pub status: CheckStatus,
    pub details: String,
}

#[derive(Debug, Serialize)]
pub struct DoctorReport {
    pub overall_status: CheckStatus,
    pub summary: String,
    pub checks: Vec<DoctorCheck>,
}

pub fn run(options: &LoadOptions, json_output: bool) -> (bool, String) {
    let report = build_report(options);
    let healthy = report.overall_status == CheckStatus::Pass;

    if json_output {
        let output = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
        return (healthy, output);
    }

    (healthy, render_human(&report))
}

/// Unconfigured webhooks are reported as skipped and do not fail the run.
pub fn build_report(options: &LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options.clone()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_webhook_client(&config));
            checks.push(check_endpoint(
                "summary_webhook",
                config.notify.summary_url.is_some(),
                "summaries",
            ));
            checks.push(check_endpoint(
                "callback_webhook",
                config.notify.callback_url.is_some(),
                "callbacks",
            ));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["webhook_client", "summary_webhook", "callback_webhook"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let any_failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if any_failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if any_failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_webhook_client(config: &AppConfig) -> DoctorCheck {
    match WebhookNotifier::from_config(&config.notify) {
        Ok(_) => DoctorCheck {
            name: "webhook_client",
            status: CheckStatus::Pass,
            details: format!("http client built with {}s timeout", config.notify.timeout_secs),
        },
        Err(error) => DoctorCheck {
            name: "webhook_client",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn check_endpoint(name: &'static str, configured: bool, what: &str) -> DoctorCheck {
    if configured {
        DoctorCheck { name, status: CheckStatus::Pass, details: format!("{what} will be posted") }
    } else {
        DoctorCheck {
            name,
            status: CheckStatus::Skipped,
            details: format!("no endpoint configured, {what} will not be sent"),
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
