use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::TrialScoutError;
use crate::fallback;
use crate::providers::{self, ProviderAdapter, ProviderReply};

const MAX_SUBJECT_LEN: usize = 256;
const MAX_PAGE_SIZE: usize = 25;

/// Canonical trial candidate every provider payload is normalized into.
///
/// Records are immutable once produced; the aggregator only filters and
/// reorders the collection. Serialized field names are what the downstream
/// save layer stores, so they stay camelCase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialRecord {
    /// Stable id in the underlying study's native namespace, e.g.
    /// `ct_NCT04184622` or `pubmed_34706925`. Unique within one response.
    pub id: String,
    pub acronym: String,
    pub title: String,
    /// The searched drug name, echoed verbatim.
    pub subject: String,
    pub outcome: String,
    pub summary: String,
    pub visualization_hint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub source_label: String,
    /// Provider-estimated confidence in [0, 1]; absent for registry and
    /// literature data rather than fabricated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// The four upstream sources. Declaration order is the dedup priority: when
/// two providers yield the same record id, the earlier variant wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Registry,
    Literature,
    Generative,
    Offline,
}

impl ProviderId {
    pub const ALL: [ProviderId; 4] = [
        ProviderId::Registry,
        ProviderId::Literature,
        ProviderId::Generative,
        ProviderId::Offline,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderId::Registry => "registry",
            ProviderId::Literature => "literature",
            ProviderId::Generative => "generative",
            ProviderId::Offline => "offline",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderId {
    type Err = TrialScoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "registry" | "ctgov" => Ok(ProviderId::Registry),
            "literature" | "pubmed" => Ok(ProviderId::Literature),
            "generative" | "ai" => Ok(ProviderId::Generative),
            "offline" => Ok(ProviderId::Offline),
            other => Err(TrialScoutError::InvalidArgument(format!(
                "Unknown source \"{other}\". Available: registry, literature, generative, offline"
            ))),
        }
    }
}

/// Per-provider result of one aggregation call. Observability only: a
/// soft-failed or timed-out provider contributes an empty list, never an
/// error to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum ProviderOutcome {
    Succeeded { records: usize },
    SucceededMock { records: usize },
    SoftFailed { reason: String },
    TimedOut,
    Disabled,
}

impl fmt::Display for ProviderOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderOutcome::Succeeded { .. } => f.write_str("succeeded"),
            ProviderOutcome::SucceededMock { .. } => f.write_str("succeeded (mock)"),
            ProviderOutcome::SoftFailed { reason } => write!(f, "soft-failed: {reason}"),
            ProviderOutcome::TimedOut => f.write_str("timed out"),
            ProviderOutcome::Disabled => f.write_str("disabled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationStatus {
    pub registry: ProviderOutcome,
    pub literature: ProviderOutcome,
    pub generative: ProviderOutcome,
    pub offline: ProviderOutcome,
    pub total_records: usize,
    /// True when only the offline dataset produced records, i.e. every live
    /// source came back empty, failed, or timed out.
    pub exhausted: bool,
}

impl AggregationStatus {
    fn all_disabled() -> Self {
        Self {
            registry: ProviderOutcome::Disabled,
            literature: ProviderOutcome::Disabled,
            generative: ProviderOutcome::Disabled,
            offline: ProviderOutcome::Disabled,
            total_records: 0,
            exhausted: false,
        }
    }

    fn set(&mut self, id: ProviderId, outcome: ProviderOutcome) {
        match id {
            ProviderId::Registry => self.registry = outcome,
            ProviderId::Literature => self.literature = outcome,
            ProviderId::Generative => self.generative = outcome,
            ProviderId::Offline => self.offline = outcome,
        }
    }

    pub fn outcome(&self, id: ProviderId) -> &ProviderOutcome {
        match id {
            ProviderId::Registry => &self.registry,
            ProviderId::Literature => &self.literature,
            ProviderId::Generative => &self.generative,
            ProviderId::Offline => &self.offline,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub records: Vec<TrialRecord>,
    pub status: AggregationStatus,
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Upper bound on each provider call; expiry cancels only that provider.
    pub provider_timeout: Duration,
    /// Maximum results requested from the registry and literature sources.
    pub page_size: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(10),
            page_size: 5,
        }
    }
}

fn validate_subject(subject: &str) -> Result<&str, TrialScoutError> {
    let subject = subject.trim();
    if subject.is_empty() {
        return Err(TrialScoutError::InvalidArgument(
            "Search subject is required. Example: trialscout search semaglutide".into(),
        ));
    }
    if subject.len() > MAX_SUBJECT_LEN {
        return Err(TrialScoutError::InvalidArgument(
            "Search subject is too long.".into(),
        ));
    }
    Ok(subject)
}

fn validate_options(options: &SearchOptions) -> Result<(), TrialScoutError> {
    if options.provider_timeout.is_zero() {
        return Err(TrialScoutError::InvalidArgument(
            "Provider timeout must be non-zero.".into(),
        ));
    }
    if options.page_size == 0 || options.page_size > MAX_PAGE_SIZE {
        return Err(TrialScoutError::InvalidArgument(format!(
            "--limit must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    Ok(())
}

/// Queries every enabled provider concurrently and merges the results into
/// one deduplicated, priority-ordered list.
///
/// The only error this returns is argument validation; provider failures and
/// timeouts degrade to empty contributions reported through
/// [`AggregationStatus`]. For a valid subject the record list is never empty:
/// when every enabled source comes back dry, the offline dataset is consulted
/// even if it was not enabled.
pub async fn aggregate(
    subject: &str,
    enabled: &[ProviderId],
    options: &SearchOptions,
) -> Result<SearchOutcome, TrialScoutError> {
    let subject = validate_subject(subject)?;
    validate_options(options)?;

    let enabled: HashSet<ProviderId> = enabled.iter().copied().collect();
    if enabled.is_empty() {
        return Err(TrialScoutError::InvalidArgument(
            "At least one source is required. Available: registry, literature, generative, offline"
                .into(),
        ));
    }

    let adapters = providers::default_adapters(&enabled, options)?;
    aggregate_with(subject, adapters, options).await
}

enum Contribution {
    Reply(ProviderReply),
    SoftFailed(String),
    TimedOut,
}

/// Fan-out, collect, and merge over an explicit adapter set. `subject` must
/// already be validated.
pub(crate) async fn aggregate_with(
    subject: &str,
    adapters: Vec<Box<dyn ProviderAdapter>>,
    options: &SearchOptions,
) -> Result<SearchOutcome, TrialScoutError> {
    let calls = adapters.iter().map(|adapter| {
        let id = adapter.id();
        async move {
            let contribution =
                match tokio::time::timeout(options.provider_timeout, adapter.search(subject)).await
                {
                    Ok(Ok(reply)) => Contribution::Reply(reply),
                    Ok(Err(err)) => {
                        warn!(provider = id.as_str(), "provider soft-failed: {err}");
                        Contribution::SoftFailed(err.to_string())
                    }
                    Err(_) => {
                        warn!(
                            provider = id.as_str(),
                            timeout_ms = options.provider_timeout.as_millis() as u64,
                            "provider timed out"
                        );
                        Contribution::TimedOut
                    }
                };
            (id, contribution)
        }
    });

    // The merge is a barrier: every provider gets to finish or expire before
    // dedup, so a fast source can never shadow a slower higher-priority one.
    let mut contributions = futures::future::join_all(calls).await;
    contributions.sort_by_key(|(id, _)| *id);

    let mut status = AggregationStatus::all_disabled();
    let mut records: Vec<TrialRecord> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut live_records = 0usize;

    for (id, contribution) in contributions {
        match contribution {
            Contribution::Reply(reply) => {
                let count = reply.records.len();
                if id != ProviderId::Offline {
                    live_records += count;
                }
                let outcome = if reply.mock {
                    ProviderOutcome::SucceededMock { records: count }
                } else {
                    ProviderOutcome::Succeeded { records: count }
                };
                status.set(id, outcome);
                for record in reply.records {
                    if seen.insert(record.id.clone()) {
                        records.push(record);
                    }
                }
            }
            Contribution::SoftFailed(reason) => {
                status.set(id, ProviderOutcome::SoftFailed { reason });
            }
            Contribution::TimedOut => status.set(id, ProviderOutcome::TimedOut),
        }
    }

    // Guaranteed response: a valid subject never yields an empty list.
    if records.is_empty() {
        let record = fallback::resolve(subject);
        status.set(ProviderId::Offline, ProviderOutcome::Succeeded { records: 1 });
        records.push(record);
    }

    status.exhausted = live_records == 0;
    status.total_records = records.len();

    Ok(SearchOutcome { records, status })
}
