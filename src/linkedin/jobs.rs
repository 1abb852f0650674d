//! Job postings.

use super::{Elements, LinkedIn};
use crate::client::RequestExt;
use crate::Error;
use serde::{Deserialize, Serialize};

/// A job posting.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    /// Job title.
    pub title: String,
    /// Job description.
    pub description: String,
    /// Where the job is.
    #[serde(default)]
    pub location: JobLocation,
    /// Hiring organization ID.
    #[serde(default, rename = "companyID")]
    pub company_id: String,
    /// e.g. `ENTRY_LEVEL`, `MID_SENIOR_LEVEL`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub experience_level: String,
    /// e.g. `FULL_TIME`, `CONTRACT`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub employment_type: String,
    /// e.g. `REMOTE`, `HYBRID`, `ON_SITE`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub work_remote_type: String,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub seniority_level: String,
    /// Where applicants are sent.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub application_url: String,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub expiration_date: String,
}

/// A job's address. Only `country` is required.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct JobLocation {
    pub country: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub city: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub postal_code: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub region_code: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub address_line_one: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub address_line_two: String,
}

#[derive(Deserialize)]
struct Created {
    id: String,
}

impl LinkedIn {
    /// Creates a job posting and returns its ID.
    #[tracing::instrument(skip(self, job), fields(title = %job.title))]
    pub async fn create_job_posting(&self, job: &JobPosting) -> Result<String, Error> {
        let Created { id } = self
            .api
            .post("jobs")
            .bearer_auth(self.token()?)
            .json(job)
            .send_json()
            .await?;
        tracing::info!(%id, "created job posting");
        Ok(id)
    }

    /// Fetches a job posting.
    #[tracing::instrument(skip(self))]
    pub async fn job_posting(&self, job_id: &str) -> Result<JobPosting, Error> {
        self.api
            .get(&format!("jobs/{}", job_id))
            .bearer_auth(self.token()?)
            .send_json()
            .await
    }

    /// Replaces a job posting.
    #[tracing::instrument(skip(self, job))]
    pub async fn update_job_posting(&self, job_id: &str, job: &JobPosting) -> Result<(), Error> {
        self.api
            .put(&format!("jobs/{}", job_id))
            .bearer_auth(self.token()?)
            .json(job)
            .send_checked()
            .await?;
        Ok(())
    }

    /// Deletes a job posting.
    #[tracing::instrument(skip(self))]
    pub async fn delete_job_posting(&self, job_id: &str) -> Result<(), Error> {
        self.api
            .delete(&format!("jobs/{}", job_id))
            .bearer_auth(self.token()?)
            .send_checked()
            .await?;
        tracing::info!(%job_id, "deleted job posting");
        Ok(())
    }

    /// One page of a company's job postings.
    #[tracing::instrument(skip(self))]
    pub async fn list_job_postings(
        &self,
        company_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<JobPosting>, Error> {
        let page: Elements<JobPosting> = self
            .api
            .get("jobs")
            .bearer_auth(self.token()?)
            .query(&[
                ("companyId", company_id.to_owned()),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
            ])
            .send_json()
            .await?;
        Ok(page.elements)
    }
}

#[cfg(test)]
mod tests {
    use super::{JobLocation, JobPosting};

    #[test]
    fn empty_optional_fields_are_omitted() {
        let job = JobPosting {
            title: "Rustacean".into(),
            description: "crabs".into(),
            location: JobLocation {
                country: "US".into(),
                city: "Portland".into(),
                ..JobLocation::default()
            },
            company_id: "42".into(),
            employment_type: "FULL_TIME".into(),
            ..JobPosting::default()
        };
        assert_eq!(
            serde_json::to_value(&job).unwrap(),
            serde_json::json!({
                "title": "Rustacean",
                "description": "crabs",
                "location": {"country": "US", "city": "Portland"},
                "companyID": "42",
                "employmentType": "FULL_TIME",
            })
        );
    }
}
