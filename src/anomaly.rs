// Pure threshold checks. Output keeps input order; inputs are not validated.

use serde::{Deserialize, Serialize};

const SPIKE_RATIO: f64 = 2.0;
const SPIKE_CRITICAL_RATIO: f64 = 3.0;
const SUCCESS_RATE_WARNING: f64 = 85.0;
const SUCCESS_RATE_CRITICAL: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    UsageSpike,
    SenseFailure,
    // reserved, no detector emits it yet
    WorkspaceInactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Critical,
}

// drill-down target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Subject {
    Workspace { id: String, name: String },
    Market { id: String, name: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    #[serde(rename = "type")]
    pub kind: AnomalyKind,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Subject>,
    pub metric_name: String,
    pub metric_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceUsageSnapshot {
    pub workspace_id: String,
    pub workspace_name: String,
    pub current_tokens: f64,
    #[serde(default)]
    pub avg_tokens_7d: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketOpsSnapshot {
    pub market_id: String,
    pub market_name: String,
    pub success_rate_24h: f64,
}

// no baseline (missing or zero average) means no spike
pub fn detect_usage_spikes(snapshots: &[WorkspaceUsageSnapshot]) -> Vec<Anomaly> {
    snapshots
        .iter()
        .filter_map(|ws| {
            let avg = ws.avg_tokens_7d.filter(|avg| *avg != 0.0)?;
            let ratio = ws.current_tokens / avg;
            (ratio > SPIKE_RATIO).then(|| {
                let severity = if ratio > SPIKE_CRITICAL_RATIO {
                    Severity::Critical
                } else {
                    Severity::Warning
                };
                let increase = ((ratio - 1.0) * 100.0).round();
                let increase = if increase.is_infinite() {
                    "Infinity".to_string()
                } else {
                    format!("{:.0}", increase)
                };

                Anomaly {
                    kind: AnomalyKind::UsageSpike,
                    severity,
                    message: format!("Token spike +{}% vs 7d avg", increase),
                    subject: Some(Subject::Workspace {
                        id: ws.workspace_id.clone(),
                        name: ws.workspace_name.clone(),
                    }),
                    metric_name: "tokens".to_string(),
                    metric_value: ws.current_tokens,
                }
            })
        })
        .collect()
}

pub fn detect_sense_anomalies(snapshots: &[MarketOpsSnapshot]) -> Vec<Anomaly> {
    snapshots
        .iter()
        .filter(|market| market.success_rate_24h < SUCCESS_RATE_WARNING)
        .map(|market| {
            let severity = if market.success_rate_24h < SUCCESS_RATE_CRITICAL {
                Severity::Critical
            } else {
                Severity::Warning
            };

            // ties round up, not to even
            let failure_rate = ((100.0 - market.success_rate_24h) * 10.0).round() / 10.0;

            Anomaly {
                kind: AnomalyKind::SenseFailure,
                severity,
                message: format!(
                    "{} - Job failure rate {:.1}% (last 24h)",
                    market.market_name, failure_rate
                ),
                subject: Some(Subject::Market {
                    id: market.market_id.clone(),
                    name: market.market_name.clone(),
                }),
                metric_name: "success_rate".to_string(),
                metric_value: market.success_rate_24h,
            }
        })
        .collect()
}

// Dashboard view of a detection pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyReport {
    pub headline: String,
    pub critical: usize,
    pub warning: usize,
    pub anomalies: Vec<Anomaly>,
}

impl From<Vec<Anomaly>> for AnomalyReport {
    fn from(anomalies: Vec<Anomaly>) -> Self {
        let critical = anomalies
            .iter()
            .filter(|a| a.severity == Severity::Critical)
            .count();
        let warning = anomalies.len() - critical;

        let headline = match anomalies.len() {
            0 => "All Systems Normal".to_string(),
            1 => "1 Anomaly Detected".to_string(),
            n => format!("{} Anomalies Detected", n),
        };

        Self {
            headline,
            critical,
            warning,
            anomalies,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ws(id: &str, current: f64, avg: Option<f64>) -> WorkspaceUsageSnapshot {
        WorkspaceUsageSnapshot {
            workspace_id: id.to_string(),
            workspace_name: format!("Workspace {}", id),
            current_tokens: current,
            avg_tokens_7d: avg,
        }
    }

    fn market(id: &str, rate: f64) -> MarketOpsSnapshot {
        MarketOpsSnapshot {
            market_id: id.to_string(),
            market_name: format!("Market {}", id),
            success_rate_24h: rate,
        }
    }

    #[test]
    fn spike_threshold_is_exclusive() {
        assert!(detect_usage_spikes(&[ws("a", 2000.0, Some(1000.0))]).is_empty());

        let out = detect_usage_spikes(&[ws("a", 2010.0, Some(1000.0))]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].severity, Severity::Warning);

        let out = detect_usage_spikes(&[ws("a", 3000.0, Some(1000.0))]);
        assert_eq!(out[0].severity, Severity::Warning);

        let out = detect_usage_spikes(&[ws("a", 3010.0, Some(1000.0))]);
        assert_eq!(out[0].severity, Severity::Critical);
    }

    #[test]
    fn spike_message_and_fields() {
        let out = detect_usage_spikes(&[ws("a", 2500.0, Some(1000.0))]);
        let a = &out[0];
        assert_eq!(a.kind, AnomalyKind::UsageSpike);
        assert_eq!(a.severity, Severity::Warning);
        assert_eq!(a.message, "Token spike +150% vs 7d avg");
        assert_eq!(a.metric_name, "tokens");
        assert_eq!(a.metric_value, 2500.0);
        assert_eq!(
            a.subject,
            Some(Subject::Workspace {
                id: "a".to_string(),
                name: "Workspace a".to_string()
            })
        );

        let out = detect_usage_spikes(&[ws("b", 3500.0, Some(1000.0))]);
        assert_eq!(out[0].severity, Severity::Critical);
        assert_eq!(out[0].message, "Token spike +250% vs 7d avg");
    }

    #[test]
    fn no_baseline_no_spike() {
        let input = [
            ws("a", 1_000_000.0, None),
            ws("b", 1_000_000.0, Some(0.0)),
        ];
        assert!(detect_usage_spikes(&input).is_empty());
    }

    #[test]
    fn sense_thresholds() {
        assert!(detect_sense_anomalies(&[market("m", 85.0)]).is_empty());
        assert!(detect_sense_anomalies(&[market("m", 99.0)]).is_empty());

        let out = detect_sense_anomalies(&[market("m", 84.9)]);
        assert_eq!(out[0].severity, Severity::Warning);
        assert_eq!(out[0].message, "Market m - Job failure rate 15.1% (last 24h)");

        let out = detect_sense_anomalies(&[market("m", 50.0)]);
        assert_eq!(out[0].severity, Severity::Warning);

        let out = detect_sense_anomalies(&[market("m", 49.9)]);
        assert_eq!(out[0].severity, Severity::Critical);
        assert_eq!(out[0].message, "Market m - Job failure rate 50.1% (last 24h)");
        assert_eq!(out[0].metric_name, "success_rate");
        assert_eq!(out[0].metric_value, 49.9);
    }

    #[test]
    fn failure_rate_ties_round_up() {
        let cases = [(84.75, "15.3"), (49.75, "50.3"), (60.75, "39.3")];
        for (rate, shown) in cases {
            let out = detect_sense_anomalies(&[market("q", rate)]);
            assert_eq!(
                out[0].message,
                format!("Market q - Job failure rate {}% (last 24h)", shown)
            );
        }
    }

    #[test]
    fn infinite_spike_reads_infinity() {
        let out = detect_usage_spikes(&[ws("tiny", 1000.0, Some(1e-320))]);
        assert_eq!(out[0].severity, Severity::Critical);
        assert_eq!(out[0].message, "Token spike +Infinity% vs 7d avg");
    }

    #[test]
    fn empty_input_and_idempotence() {
        assert!(detect_usage_spikes(&[]).is_empty());
        assert!(detect_sense_anomalies(&[]).is_empty());

        let input = [market("a", 10.0), market("b", 70.0)];
        assert_eq!(detect_sense_anomalies(&input), detect_sense_anomalies(&input));
    }

    #[test]
    fn output_follows_input_order() {
        let input = [market("warn", 80.0), market("ok", 95.0), market("crit", 5.0), market("warn", 80.0)];
        let out = detect_sense_anomalies(&input);
        let severities: Vec<_> = out.iter().map(|a| a.severity).collect();
        assert_eq!(
            severities,
            vec![Severity::Warning, Severity::Critical, Severity::Warning]
        );

        let input = [ws("low", 2100.0, Some(1000.0)), ws("high", 9000.0, Some(1000.0))];
        let out = detect_usage_spikes(&input);
        assert_eq!(out[0].severity, Severity::Warning);
        assert_eq!(out[1].severity, Severity::Critical);
    }

    #[test]
    fn out_of_range_values_pass_through() {
        let out = detect_sense_anomalies(&[market("neg", -10.0)]);
        assert_eq!(out[0].severity, Severity::Critical);
        assert_eq!(out[0].message, "Market neg - Job failure rate 110.0% (last 24h)");

        assert!(detect_sense_anomalies(&[market("nan", f64::NAN)]).is_empty());
        // negative baseline flips the ratio sign
        assert!(detect_usage_spikes(&[ws("neg", 5000.0, Some(-1000.0))]).is_empty());
    }

    #[test]
    fn report_counts_and_headline() {
        assert_eq!(AnomalyReport::from(vec![]).headline, "All Systems Normal");

        let one = AnomalyReport::from(detect_sense_anomalies(&[market("m", 10.0)]));
        assert_eq!(one.headline, "1 Anomaly Detected");
        assert_eq!((one.critical, one.warning), (1, 0));

        let many = AnomalyReport::from(detect_sense_anomalies(&[
            market("a", 10.0),
            market("b", 70.0),
            market("c", 80.0),
        ]));
        assert_eq!(many.headline, "3 Anomalies Detected");
        assert_eq!((many.critical, many.warning), (1, 2));
    }

    #[test]
    fn serializes_for_dashboard() {
        let out = detect_usage_spikes(&[ws("a", 2500.0, Some(1000.0))]);
        let json = serde_json::to_value(&out[0]).unwrap();
        assert_eq!(json["type"], "usage_spike");
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["subject"]["kind"], "workspace");
        assert_eq!(json["subject"]["id"], "a");
        assert_eq!(json["metric_name"], "tokens");
    }

    #[test]
    fn market_snapshot_ignores_extra_columns() {
        let raw = serde_json::json!({
            "market_id": "m1",
            "market_code": "AUS",
            "market_name": "Austin",
            "enabled": true,
            "success_rate_24h": 72.5,
            "recent_runs": []
        });
        let snap: MarketOpsSnapshot = serde_json::from_value(raw).unwrap();
        assert_eq!(snap.market_name, "Austin");
        assert_eq!(snap.success_rate_24h, 72.5);
    }
}
