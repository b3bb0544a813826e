use std::borrow::Cow;

use serde::Deserialize;

use crate::error::TrialScoutError;

const PUBMED_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
const PUBMED_API: &str = "pubmed";
const PUBMED_BASE_ENV: &str = "TRIALSCOUT_PUBMED_BASE";

/// Client for the NCBI E-utilities PubMed endpoints.
///
/// The literature lookup is a two-step fetch: `esearch` returns matching
/// PMIDs as JSON, `efetch` returns one article's metadata as XML.
#[derive(Clone)]
pub(crate) struct PubMedClient {
    client: reqwest_middleware::ClientWithMiddleware,
    base: Cow<'static, str>,
}

impl PubMedClient {
    pub(crate) fn new() -> Result<Self, TrialScoutError> {
        Ok(Self {
            client: crate::sources::shared_client()?,
            base: crate::sources::env_base(PUBMED_BASE, PUBMED_BASE_ENV),
        })
    }

    #[cfg(test)]
    pub(crate) fn new_for_test(base: String) -> Result<Self, TrialScoutError> {
        Ok(Self {
            client: crate::sources::shared_client()?,
            base: Cow::Owned(base),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base.as_ref().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub(crate) async fn search_ids(
        &self,
        term: &str,
        retmax: usize,
    ) -> Result<Vec<String>, TrialScoutError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(TrialScoutError::InvalidArgument(
                "Query term is required for a PubMed search".into(),
            ));
        }
        if retmax == 0 || retmax > 50 {
            return Err(TrialScoutError::InvalidArgument(
                "PubMed retmax must be between 1 and 50".into(),
            ));
        }

        let url = self.endpoint("esearch.fcgi");
        let retmax = retmax.to_string();
        let req = self.client.get(&url).query(&[
            ("db", "pubmed"),
            ("term", term),
            ("retmax", retmax.as_str()),
            ("retmode", "json"),
        ]);

        let resp = req.send().await?;
        let status = resp.status();
        let bytes = crate::sources::read_limited_body(resp, PUBMED_API).await?;
        if !status.is_success() {
            let excerpt = crate::sources::body_excerpt(&bytes);
            return Err(TrialScoutError::Api {
                api: PUBMED_API.to_string(),
                message: format!("HTTP {status}: {excerpt}"),
            });
        }

        let parsed: EsearchResponse =
            serde_json::from_slice(&bytes).map_err(|source| TrialScoutError::ApiJson {
                api: PUBMED_API.to_string(),
                source,
            })?;
        Ok(parsed
            .esearchresult
            .map(|result| result.idlist)
            .unwrap_or_default())
    }

    pub(crate) async fn fetch_article_xml(&self, pmid: &str) -> Result<String, TrialScoutError> {
        let pmid = pmid.trim();
        if pmid.is_empty() || pmid.len() > 32 || !pmid.chars().all(|c| c.is_ascii_digit()) {
            return Err(TrialScoutError::InvalidArgument(
                "PMID must be numeric. Example: 34706925".into(),
            ));
        }

        let url = self.endpoint("efetch.fcgi");
        let req = self
            .client
            .get(&url)
            .query(&[("db", "pubmed"), ("id", pmid), ("retmode", "xml")]);

        let resp = req.send().await?;
        let status = resp.status();
        let bytes = crate::sources::read_limited_body(resp, PUBMED_API).await?;
        if !status.is_success() {
            let excerpt = crate::sources::body_excerpt(&bytes);
            return Err(TrialScoutError::Api {
                api: PUBMED_API.to_string(),
                message: format!("HTTP {status}: {excerpt}"),
            });
        }

        Ok(String::from_utf8_lossy(&bytes).to_string())
    }
}

#[derive(Debug, Deserialize)]
struct EsearchResponse {
    esearchresult: Option<EsearchResult>,
}

#[derive(Debug, Deserialize)]
struct EsearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn search_ids_sets_expected_params_and_returns_pmids() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/esearch.fcgi"))
            .and(query_param("db", "pubmed"))
            .and(query_param("term", "semaglutide clinical trial"))
            .and(query_param("retmax", "5"))
            .and(query_param("retmode", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "esearchresult": {"idlist": ["34706925", "33567185"]}
            })))
            .mount(&server)
            .await;

        let client = PubMedClient::new_for_test(server.uri()).unwrap();
        let ids = client
            .search_ids("semaglutide clinical trial", 5)
            .await
            .unwrap();
        assert_eq!(ids, vec!["34706925", "33567185"]);
    }

    #[tokio::test]
    async fn search_ids_treats_missing_result_block_as_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/esearch.fcgi"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let client = PubMedClient::new_for_test(server.uri()).unwrap();
        let ids = client.search_ids("semaglutide", 5).await.unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn fetch_article_xml_returns_the_raw_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/efetch.fcgi"))
            .and(query_param("id", "34706925"))
            .and(query_param("retmode", "xml"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<PubmedArticle><PMID>34706925</PMID></PubmedArticle>"),
            )
            .mount(&server)
            .await;

        let client = PubMedClient::new_for_test(server.uri()).unwrap();
        let xml = client.fetch_article_xml("34706925").await.unwrap();
        assert!(xml.contains("<PMID>34706925</PMID>"));
    }

    #[tokio::test]
    async fn fetch_article_xml_rejects_non_numeric_pmids() {
        let client = PubMedClient::new_for_test("http://127.0.0.1".into()).unwrap();
        let err = client.fetch_article_xml("PMID-123").await.unwrap_err();
        assert!(matches!(err, TrialScoutError::InvalidArgument(_)));
    }
}
