use std::borrow::Cow;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::TrialScoutError;

const CTGOV_BASE: &str = "https://clinicaltrials.gov/api/v2";
const CTGOV_API: &str = "clinicaltrials.gov";
const CTGOV_BASE_ENV: &str = "TRIALSCOUT_CTGOV_BASE";

/// Client for the ClinicalTrials.gov v2 study registry.
#[derive(Clone)]
pub(crate) struct CtGovClient {
    client: reqwest_middleware::ClientWithMiddleware,
    base: Cow<'static, str>,
}

impl CtGovClient {
    pub(crate) fn new() -> Result<Self, TrialScoutError> {
        Ok(Self {
            client: crate::sources::shared_client()?,
            base: crate::sources::env_base(CTGOV_BASE, CTGOV_BASE_ENV),
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

    async fn get_json<T: DeserializeOwned>(
        &self,
        req: reqwest_middleware::RequestBuilder,
    ) -> Result<T, TrialScoutError> {
        let resp = req.send().await?;
        let status = resp.status();
        let bytes = crate::sources::read_limited_body(resp, CTGOV_API).await?;
        if !status.is_success() {
            let excerpt = crate::sources::body_excerpt(&bytes);
            return Err(TrialScoutError::Api {
                api: CTGOV_API.to_string(),
                message: format!("HTTP {status}: {excerpt}"),
            });
        }
        serde_json::from_slice(&bytes).map_err(|source| TrialScoutError::ApiJson {
            api: CTGOV_API.to_string(),
            source,
        })
    }

    pub(crate) async fn search_studies(
        &self,
        term: &str,
        page_size: usize,
    ) -> Result<CtGovSearchResponse, TrialScoutError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(TrialScoutError::InvalidArgument(
                "Query term is required for a registry search".into(),
            ));
        }
        if page_size == 0 || page_size > 50 {
            return Err(TrialScoutError::InvalidArgument(
                "Registry page size must be between 1 and 50".into(),
            ));
        }

        let url = self.endpoint("studies");
        let page_size = page_size.to_string();
        let req = self.client.get(&url).query(&[
            ("query.term", term),
            ("format", "json"),
            ("pageSize", page_size.as_str()),
        ]);
        self.get_json(req).await
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CtGovSearchResponse {
    #[serde(default)]
    pub studies: Vec<CtGovStudy>,
    #[serde(rename = "totalCount")]
    pub total_count: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CtGovStudy {
    #[serde(rename = "protocolSection")]
    pub protocol_section: Option<CtGovProtocolSection>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CtGovProtocolSection {
    #[serde(rename = "identificationModule")]
    pub identification_module: Option<CtGovIdentificationModule>,
    #[serde(rename = "statusModule")]
    pub status_module: Option<CtGovStatusModule>,
    #[serde(rename = "descriptionModule")]
    pub description_module: Option<CtGovDescriptionModule>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CtGovIdentificationModule {
    #[serde(rename = "nctId")]
    pub nct_id: Option<String>,
    #[serde(rename = "briefTitle")]
    pub brief_title: Option<String>,
    pub acronym: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CtGovStatusModule {
    #[serde(rename = "overallStatus")]
    pub overall_status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CtGovDescriptionModule {
    #[serde(rename = "briefSummary")]
    pub brief_summary: Option<String>,
}
