//! The HTTP client behind the directory seam.

use crate::{cache, parse};
use async_trait::async_trait;
use capitolcall_db::DbPool;
use capitolcall_flow::{Directory, DirectoryError};
use capitolcall_types::{Bill, Contributor, ElectionOffice, Legislator, UpcomingBill, Vote};
use std::time::Duration;
use url::Url;

/// How many bills a by-number search may return. Callers pick by digit,
/// so anything past a handful is unusable over the phone.
const BILL_SEARCH_LIMIT: usize = 8;

/// Upstream endpoints and credentials.
#[derive(Debug, Clone)]
pub struct CongressConfig {
    /// Congressional data API (legislators, bills, votes).
    pub congress_base: String,
    pub congress_api_key: String,
    /// Campaign-finance API (entity lookups, contributors, biographies).
    pub influence_base: String,
    pub influence_api_key: String,
    /// Election-office API.
    pub elections_base: String,
    pub elections_api_key: String,
    /// SMS bill-update subscription service. `None` disables subscriptions.
    pub subscriptions_base: Option<String>,
    /// Freshness window for cached zip-code lookups.
    pub zip_cache_hours: i64,
}

impl Default for CongressConfig {
    fn default() -> Self {
        Self {
            congress_base: "https://congress.api.sunlightfoundation.com".to_string(),
            congress_api_key: String::new(),
            influence_base: "https://transparencydata.com/api/1.0".to_string(),
            influence_api_key: String::new(),
            elections_base: "https://elections.api.sunlightfoundation.com".to_string(),
            elections_api_key: String::new(),
            subscriptions_base: None,
            zip_cache_hours: 24,
        }
    }
}

fn upstream(err: impl std::fmt::Display) -> DirectoryError {
    DirectoryError::Upstream(err.to_string())
}

/// Directory implementation over the upstream HTTP APIs, with SQLite
/// caching for zip-code and entity-id lookups.
pub struct CongressClient {
    http: reqwest::Client,
    config: CongressConfig,
    pool: DbPool,
}

impl CongressClient {
    pub fn new(config: CongressConfig, pool: DbPool) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { http, config, pool })
    }

    fn endpoint(
        &self,
        base: &str,
        path: &str,
        api_key: &str,
        params: &[(&str, &str)],
    ) -> Result<Url, DirectoryError> {
        let mut url = Url::parse(&format!("{}/{}", base.trim_end_matches('/'), path))
            .map_err(upstream)?;
        {
            let mut query = url.query_pairs_mut();
            if !api_key.is_empty() {
                query.append_pair("apikey", api_key);
            }
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn congress_endpoint(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Url, DirectoryError> {
        self.endpoint(
            &self.config.congress_base,
            path,
            &self.config.congress_api_key,
            params,
        )
    }

    fn influence_endpoint(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Url, DirectoryError> {
        self.endpoint(
            &self.config.influence_base,
            path,
            &self.config.influence_api_key,
            params,
        )
    }

    async fn get_json(&self, url: Url) -> Result<String, DirectoryError> {
        let path = url.path().to_string();
        let response = self.http.get(url).send().await.map_err(upstream)?;
        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::Upstream(format!("{status} from {path}")));
        }
        response.text().await.map_err(upstream)
    }

    /// Runs a cache operation on the blocking pool.
    async fn with_cache<T, F>(&self, f: F) -> Result<T, DirectoryError>
    where
        T: Send + 'static,
        F: FnOnce(DbPool) -> Result<T, DirectoryError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || f(pool))
            .await
            .map_err(|err| DirectoryError::Cache(err.to_string()))?
    }

    /// The campaign-finance entity id for a CRP candidate id, cached
    /// permanently once resolved.
    async fn entity_id_for(&self, crp_id: &str) -> Result<Option<String>, DirectoryError> {
        let key = crp_id.to_string();
        if let Some(cached) = self
            .with_cache(move |pool| cache::entity_id(&pool, &key))
            .await?
        {
            return Ok(Some(cached));
        }

        let url = self.influence_endpoint(
            "entities/id_lookup.json",
            &[("namespace", "urn:crp:recipient"), ("id", crp_id)],
        )?;
        let body = self.get_json(url).await?;
        let Some(entity_id) = parse::entity_id(&body)? else {
            return Ok(None);
        };

        let key = crp_id.to_string();
        let value = entity_id.clone();
        self.with_cache(move |pool| cache::store_entity_id(&pool, &key, &value))
            .await?;
        Ok(Some(entity_id))
    }
}

#[async_trait]
impl Directory for CongressClient {
    async fn legislators_for_zip(&self, zipcode: &str) -> Result<Vec<Legislator>, DirectoryError> {
        let zip = zipcode.to_string();
        let hours = self.config.zip_cache_hours;
        if let Some(payload) = self
            .with_cache(move |pool| cache::zip_payload(&pool, &zip, hours))
            .await?
        {
            tracing::debug!(zipcode, "zip lookup served from cache");
            return parse::legislators(&payload);
        }

        let url = self.congress_endpoint("legislators/locate", &[("zip", zipcode)])?;
        let body = self.get_json(url).await?;
        let legislators = parse::legislators(&body)?;

        let zip = zipcode.to_string();
        self.with_cache(move |pool| cache::store_zip_payload(&pool, &zip, &body))
            .await?;
        Ok(legislators)
    }

    async fn legislator_by_bioguide(
        &self,
        bioguide_id: &str,
    ) -> Result<Option<Legislator>, DirectoryError> {
        let url = self.congress_endpoint("legislators", &[("bioguide_id", bioguide_id)])?;
        let body = self.get_json(url).await?;
        Ok(parse::legislators(&body)?.into_iter().next())
    }

    async fn legislator_bio(
        &self,
        legislator: &Legislator,
    ) -> Result<Option<String>, DirectoryError> {
        let Some(crp_id) = legislator.crp_id.as_deref() else {
            return Ok(None);
        };
        let Some(entity_id) = self.entity_id_for(crp_id).await? else {
            return Ok(None);
        };
        let url = self.influence_endpoint(&format!("entities/{entity_id}.json"), &[])?;
        let body = self.get_json(url).await?;
        parse::entity_bio(&body)
    }

    async fn top_contributors(
        &self,
        legislator: &Legislator,
    ) -> Result<Vec<Contributor>, DirectoryError> {
        let Some(crp_id) = legislator.crp_id.as_deref() else {
            return Ok(Vec::new());
        };
        let Some(entity_id) = self.entity_id_for(crp_id).await? else {
            return Ok(Vec::new());
        };
        let url = self.influence_endpoint(
            &format!("aggregates/pol/{entity_id}/contributors.json"),
            &[("limit", "5")],
        )?;
        let body = self.get_json(url).await?;
        parse::contributors(&body)
    }

    async fn recent_votes(&self, bioguide_id: &str) -> Result<Vec<Vote>, DirectoryError> {
        let voter_filter = format!("voter_ids.{bioguide_id}__exists");
        let fields = format!("question,result,voter_ids.{bioguide_id}");
        let url = self.congress_endpoint(
            "votes",
            &[
                (voter_filter.as_str(), "true"),
                ("fields", fields.as_str()),
                ("order", "voted_at__desc"),
                ("per_page", "5"),
            ],
        )?;
        let body = self.get_json(url).await?;
        parse::votes(&body, bioguide_id)
    }

    async fn committees(&self, legislator: &Legislator) -> Result<Vec<String>, DirectoryError> {
        let url = self.congress_endpoint(
            "committees",
            &[
                ("member_ids", legislator.bioguide_id.as_str()),
                ("fields", "name,subcommittees"),
                ("per_page", "50"),
            ],
        )?;
        let body = self.get_json(url).await?;
        parse::committees(&body)
    }

    async fn upcoming_bills(&self) -> Result<Vec<UpcomingBill>, DirectoryError> {
        let url = self.congress_endpoint("upcoming_bills", &[("per_page", "9")])?;
        let body = self.get_json(url).await?;
        parse::upcoming_bills(&body)
    }

    async fn bill_search(&self, number: u32) -> Result<Vec<Bill>, DirectoryError> {
        let number = number.to_string();
        let url = self.congress_endpoint(
            "bills",
            &[
                ("number", number.as_str()),
                ("order", "introduced_on__desc"),
                ("per_page", "8"),
            ],
        )?;
        let body = self.get_json(url).await?;
        parse::bills(&body, BILL_SEARCH_LIMIT)
    }

    async fn bill_by_id(&self, bill_id: &str) -> Result<Option<Bill>, DirectoryError> {
        let url = self.congress_endpoint("bills", &[("bill_id", bill_id)])?;
        let body = self.get_json(url).await?;
        parse::first_bill(&body)
    }

    async fn subscribe_to_bill_updates(
        &self,
        phone: &str,
        bill_id: &str,
    ) -> Result<bool, DirectoryError> {
        let Some(base) = self.config.subscriptions_base.as_deref() else {
            tracing::debug!("no subscription service configured");
            return Ok(false);
        };
        let url = Url::parse(&format!("{}/subscriptions", base.trim_end_matches('/')))
            .map_err(upstream)?;
        let response = self
            .http
            .post(url)
            .json(&serde_json::json!({
                "phone": phone,
                "interest_type": "bill",
                "item_id": bill_id,
            }))
            .send()
            .await
            .map_err(upstream)?;
        Ok(response.status().is_success())
    }

    async fn election_offices_for_zip(
        &self,
        zipcode: &str,
    ) -> Result<Vec<ElectionOffice>, DirectoryError> {
        let url = self.endpoint(
            &self.config.elections_base,
            "offices",
            &self.config.elections_api_key,
            &[("zip", zipcode)],
        )?;
        let body = self.get_json(url).await?;
        parse::election_offices(&body)
    }
}
