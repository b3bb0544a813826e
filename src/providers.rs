//! Provider adapters: one per upstream source, sharing a single search
//! capability the aggregator fans out over.
//!
//! An adapter returns `Err` for transport and parse failures; the aggregator
//! records those as soft-fails and they never reach the caller as errors.

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::warn;

use crate::entities::trial::{ProviderId, SearchOptions, TrialRecord};
use crate::error::TrialScoutError;
use crate::fallback;
use crate::sources::ctgov::CtGovClient;
use crate::sources::openai::OpenAiClient;
use crate::sources::pubmed::PubMedClient;
use crate::transform;

#[derive(Debug)]
pub(crate) struct ProviderReply {
    pub records: Vec<TrialRecord>,
    /// True when the records came from the deterministic mock path rather
    /// than a live upstream call.
    pub mock: bool,
}

impl ProviderReply {
    fn live(records: Vec<TrialRecord>) -> Self {
        Self {
            records,
            mock: false,
        }
    }

    fn mocked(records: Vec<TrialRecord>) -> Self {
        Self {
            records,
            mock: true,
        }
    }
}

#[async_trait]
pub(crate) trait ProviderAdapter: Send + Sync {
    fn id(&self) -> ProviderId;

    async fn search(&self, subject: &str) -> Result<ProviderReply, TrialScoutError>;
}

pub(crate) struct RegistryProvider {
    client: CtGovClient,
    page_size: usize,
}

impl RegistryProvider {
    fn new(page_size: usize) -> Result<Self, TrialScoutError> {
        Ok(Self {
            client: CtGovClient::new()?,
            page_size,
        })
    }

    #[cfg(test)]
    pub(crate) fn with_client(client: CtGovClient, page_size: usize) -> Self {
        Self { client, page_size }
    }
}

#[async_trait]
impl ProviderAdapter for RegistryProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Registry
    }

    async fn search(&self, subject: &str) -> Result<ProviderReply, TrialScoutError> {
        let resp = self.client.search_studies(subject, self.page_size).await?;
        Ok(ProviderReply::live(transform::registry::from_search_response(&resp, subject)))
    }
}

pub(crate) struct LiteratureProvider {
    client: PubMedClient,
    page_size: usize,
}

impl LiteratureProvider {
    fn new(page_size: usize) -> Result<Self, TrialScoutError> {
        Ok(Self {
            client: PubMedClient::new()?,
            page_size,
        })
    }

    #[cfg(test)]
    pub(crate) fn with_client(client: PubMedClient, page_size: usize) -> Self {
        Self { client, page_size }
    }
}

#[async_trait]
impl ProviderAdapter for LiteratureProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Literature
    }

    async fn search(&self, subject: &str) -> Result<ProviderReply, TrialScoutError> {
        let term = format!("{subject} clinical trial");
        let pmids = self.client.search_ids(&term, self.page_size).await?;

        // Detail fetches run concurrently; a failed fetch drops that article
        // only, never the whole contribution.
        let details = futures::future::join_all(pmids.iter().map(|pmid| {
            let client = self.client.clone();
            async move { (pmid.clone(), client.fetch_article_xml(pmid).await) }
        }))
        .await;

        let mut records = Vec::new();
        for (pmid, fetched) in details {
            match fetched {
                Ok(xml) => match transform::literature::from_article_xml(&xml, &pmid, subject) {
                    Some(record) => records.push(record),
                    None => warn!(pmid = %pmid, "dropping unmappable PubMed article"),
                },
                Err(err) => {
                    warn!(pmid = %pmid, "dropping PubMed article after detail fetch failure: {err}");
                }
            }
        }
        Ok(ProviderReply::live(records))
    }
}

pub(crate) struct GenerativeProvider {
    client: Option<OpenAiClient>,
    source_hints: Vec<String>,
}

impl GenerativeProvider {
    fn from_env(source_hints: Vec<String>) -> Result<Self, TrialScoutError> {
        Ok(Self {
            client: OpenAiClient::from_env()?,
            source_hints,
        })
    }

    #[cfg(test)]
    pub(crate) fn with_client(client: Option<OpenAiClient>, source_hints: Vec<String>) -> Self {
        Self {
            client,
            source_hints,
        }
    }
}

fn build_prompt(subject: &str, source_hints: &[String]) -> String {
    let source_list = if source_hints.is_empty() {
        "leading cardiology and diabetology journals".to_string()
    } else {
        source_hints.join(", ")
    };

    format!(
        "You are an AI research assistant for clinicians. Provide up to 3 recent clinical trial \
         summaries about \"{subject}\" sourced from {source_list}.\n\
         Respond strictly as JSON with the shape:\n\
         {{\"results\": [{{\"trial_acronym\": \"\", \"trial_full_name\": \"\", \"drug_name\": \"\", \
         \"result\": \"\", \"brief_abstract\": \"\", \"reference_article\": \"\", \
         \"source_label\": \"\", \"confidence\": \"0.85\"}}]}}"
    )
}

#[async_trait]
impl ProviderAdapter for GenerativeProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Generative
    }

    async fn search(&self, subject: &str) -> Result<ProviderReply, TrialScoutError> {
        // No credential configured: the deterministic mock path stands in,
        // reported as a mock success rather than a failure.
        let Some(client) = &self.client else {
            return Ok(ProviderReply::mocked(transform::generative::mock_records(subject)));
        };

        let prompt = build_prompt(subject, &self.source_hints);
        let content = client.complete(&prompt).await?;
        let Some(content) = content else {
            return Err(TrialScoutError::Api {
                api: "openai".to_string(),
                message: "Completion carried no content".to_string(),
            });
        };

        let records = transform::generative::from_model_content(&content, subject).ok_or_else(
            || TrialScoutError::Api {
                api: "openai".to_string(),
                message: "Completion was not the expected JSON shape".to_string(),
            },
        )?;
        Ok(ProviderReply::live(records))
    }
}

pub(crate) struct OfflineProvider;

#[async_trait]
impl ProviderAdapter for OfflineProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Offline
    }

    /// Never performs I/O and never fails; this is the aggregator's
    /// guaranteed non-empty safety net.
    async fn search(&self, subject: &str) -> Result<ProviderReply, TrialScoutError> {
        Ok(ProviderReply::live(vec![fallback::resolve(subject)]))
    }
}

fn source_hints(enabled: &HashSet<ProviderId>) -> Vec<String> {
    let mut hints = Vec::new();
    if enabled.contains(&ProviderId::Registry) {
        hints.push(transform::registry::REGISTRY_LABEL.to_string());
    }
    if enabled.contains(&ProviderId::Literature) {
        hints.push(transform::literature::LITERATURE_LABEL.to_string());
    }
    hints
}

/// Builds the enabled adapters in dedup priority order: registry first,
/// offline last.
pub(crate) fn default_adapters(
    enabled: &HashSet<ProviderId>,
    options: &SearchOptions,
) -> Result<Vec<Box<dyn ProviderAdapter>>, TrialScoutError> {
    let mut adapters: Vec<Box<dyn ProviderAdapter>> = Vec::new();

    if enabled.contains(&ProviderId::Registry) {
        adapters.push(Box::new(RegistryProvider::new(options.page_size)?));
    }
    if enabled.contains(&ProviderId::Literature) {
        adapters.push(Box::new(LiteratureProvider::new(options.page_size)?));
    }
    if enabled.contains(&ProviderId::Generative) {
        adapters.push(Box::new(GenerativeProvider::from_env(source_hints(enabled))?));
    }
    if enabled.contains(&ProviderId::Offline) {
        adapters.push(Box::new(OfflineProvider));
    }

    Ok(adapters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn prompt_includes_subject_and_enabled_source_hints() {
        let prompt = build_prompt(
            "semaglutide",
            &["ClinicalTrials.gov".to_string(), "PubMed".to_string()],
        );
        assert!(prompt.contains("\"semaglutide\""));
        assert!(prompt.contains("ClinicalTrials.gov, PubMed"));
        assert!(prompt.contains("\"results\""));
    }

    #[test]
    fn prompt_defaults_the_source_list_when_no_hints_are_enabled() {
        let prompt = build_prompt("metformin", &[]);
        assert!(prompt.contains("leading cardiology and diabetology journals"));
    }

    #[tokio::test]
    async fn generative_provider_without_credential_serves_mock_records() {
        let provider = GenerativeProvider::with_client(None, Vec::new());
        let reply = provider.search("semaglutide").await.unwrap();

        assert!(reply.mock);
        assert_eq!(reply.records.len(), 2);
        assert!(reply.records.iter().all(|r| r.source_label.ends_with("(mock)")));
    }

    #[tokio::test]
    async fn generative_provider_parses_a_live_completion() {
        let server = MockServer::start().await;
        let content = serde_json::json!({
            "results": [{
                "trial_acronym": "SUSTAIN-6",
                "trial_full_name": "Semaglutide and Cardiovascular Outcomes",
                "result": "26% relative risk reduction in MACE",
                "brief_abstract": "Cardiovascular outcome trial.",
                "reference_article": "https://pubmed.ncbi.nlm.nih.gov/27633186/",
                "confidence": "0.85"
            }]
        })
        .to_string();
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": content}}]
            })))
            .mount(&server)
            .await;

        let client = OpenAiClient::new_for_test(server.uri(), "test-key".into()).unwrap();
        let provider = GenerativeProvider::with_client(Some(client), Vec::new());
        let reply = provider.search("semaglutide").await.unwrap();

        assert!(!reply.mock);
        assert_eq!(reply.records.len(), 1);
        assert_eq!(reply.records[0].acronym, "SUSTAIN-6");
        assert_eq!(reply.records[0].confidence, Some(0.85));
    }

    #[tokio::test]
    async fn generative_provider_reports_unparseable_content_as_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "no structured data here"}}]
            })))
            .mount(&server)
            .await;

        let client = OpenAiClient::new_for_test(server.uri(), "test-key".into()).unwrap();
        let provider = GenerativeProvider::with_client(Some(client), Vec::new());
        let err = provider.search("semaglutide").await.unwrap_err();
        assert!(err.to_string().contains("expected JSON shape"));
    }

    #[tokio::test]
    async fn literature_provider_drops_only_the_failed_detail_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/esearch.fcgi"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "esearchresult": {"idlist": ["1001", "1002"]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/efetch.fcgi"))
            .and(query_param("id", "1001"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<ArticleTitle>A Kept Article</ArticleTitle>"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/efetch.fcgi"))
            .and(query_param("id", "1002"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = PubMedClient::new_for_test(server.uri()).unwrap();
        let provider = LiteratureProvider::with_client(client, 5);
        let reply = provider.search("metformin").await.unwrap();

        assert_eq!(reply.records.len(), 1);
        assert_eq!(reply.records[0].id, "pubmed_1001");
    }

    #[tokio::test]
    async fn registry_provider_maps_studies_to_records() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/studies"))
            .and(query_param("query.term", "semaglutide"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "studies": [{
                    "protocolSection": {
                        "identificationModule": {
                            "nctId": "NCT04184622",
                            "briefTitle": "Semaglutide for Weight Management",
                            "acronym": "SURMOUNT"
                        }
                    }
                }]
            })))
            .mount(&server)
            .await;

        let client = CtGovClient::new_for_test(server.uri()).unwrap();
        let provider = RegistryProvider::with_client(client, 5);
        let reply = provider.search("semaglutide").await.unwrap();

        assert_eq!(reply.records.len(), 1);
        assert_eq!(reply.records[0].id, "ct_NCT04184622");
    }

    #[tokio::test]
    async fn offline_provider_always_returns_exactly_one_record() {
        let reply = OfflineProvider.search("semaglutide").await.unwrap();
        assert_eq!(reply.records.len(), 1);
        assert_eq!(reply.records[0].acronym, "SURMOUNT");

        let unknown = OfflineProvider.search("brand-new-molecule").await.unwrap();
        assert_eq!(unknown.records.len(), 1);
        assert!(!unknown.records[0].acronym.is_empty());
    }
}
