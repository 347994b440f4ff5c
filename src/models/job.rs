use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::AppError;
use crate::models::company::Company;
use crate::models::location::Location;
use crate::models::salary::Salary;
use crate::text::{clean_text, contains_term, extract_skills};

/// Adapter-specific notes attached to a job or returned as job details.
pub type ExtraData = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    Freelance,
    Internship,
    Temporary,
    Other,
}

impl JobType {
    /// Classify from search keywords and listing text. The first matching
    /// rule wins; text with no recognised token is `Other`.
    pub fn classify(keywords: &str, description: &str) -> JobType {
        let text = format!("{keywords} {description}").to_lowercase();
        let rules: [(&[&str], JobType); 6] = [
            (
                &["freelance", "freelancer", "gig", "project-based", "per project"],
                JobType::Freelance,
            ),
            (
                &["internship", "intern", "trainee", "apprentice", "apprenticeship"],
                JobType::Internship,
            ),
            (
                &["contract", "contractor", "c2c", "fixed-term", "fixed term"],
                JobType::Contract,
            ),
            (&["temporary", "temp", "seasonal"], JobType::Temporary),
            (&["part-time", "part time", "parttime"], JobType::PartTime),
            (
                &["full-time", "full time", "fulltime", "permanent"],
                JobType::FullTime,
            ),
        ];

        rules
            .iter()
            .find(|(tokens, _)| tokens.iter().any(|t| contains_term(&text, t)))
            .map(|(_, job_type)| *job_type)
            .unwrap_or(JobType::Other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullTime => "full-time",
            JobType::PartTime => "part-time",
            JobType::Contract => "contract",
            JobType::Freelance => "freelance",
            JobType::Internship => "internship",
            JobType::Temporary => "temporary",
            JobType::Other => "other",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Professional field of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobCategory {
    CivilEngineering,
    ItProgramming,
    DigitalMarketing,
    Other,
}

impl JobCategory {
    pub fn classify(title: &str, description: &str) -> JobCategory {
        const CIVIL: &[&str] = &[
            "civil engineer", "structural engineer", "construction engineer", "infrastructure",
            "bridge design", "road design", "building design", "concrete", "steel structure",
            "geotechnical", "surveying", "autocad", "civil 3d", "revit",
            "construction management",
        ];
        const IT: &[&str] = &[
            "developer", "programmer", "software engineer", "software", "full stack", "backend",
            "frontend", "devops", "data scientist", "machine learning", "python", "java",
            "javascript", "react", "angular", "node.js", "database", "api", "cloud", "aws",
            "azure", "rust",
        ];
        const MARKETING: &[&str] = &[
            "digital marketing", "marketing manager", "seo", "sem", "social media",
            "content marketing", "email marketing", "ppc", "analytics", "growth hacker",
            "marketing coordinator", "brand manager",
        ];

        let text = format!("{title} {description}").to_lowercase();
        let hit = |terms: &[&str]| terms.iter().any(|t| contains_term(&text, t));
        if hit(CIVIL) {
            JobCategory::CivilEngineering
        } else if hit(IT) {
            JobCategory::ItProgramming
        } else if hit(MARKETING) {
            JobCategory::DigitalMarketing
        } else {
            JobCategory::Other
        }
    }
}

/// Input for building a [`Job`]. Text fields are cleaned and validated by
/// [`Job::new`].
#[derive(Debug, Clone)]
pub struct NewJob {
    pub title: String,
    pub company: Company,
    pub location: Location,
    pub description: String,
    pub url: String,
    pub source: String,
    pub job_type: JobType,
    pub salary: Option<Salary>,
    pub posted_date: Option<DateTime<Utc>>,
    pub extra_data: ExtraData,
}

/// One normalized listing. Immutable once built; `url` + `source` identify
/// it within a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    title: String,
    company: Company,
    location: Location,
    description: String,
    url: String,
    source: String,
    job_type: JobType,
    category: JobCategory,
    skills: Vec<String>,
    salary: Option<Salary>,
    posted_date: Option<DateTime<Utc>>,
    scraped_date: DateTime<Utc>,
    extra_data: ExtraData,
}

impl Job {
    pub fn new(input: NewJob) -> Result<Job, AppError> {
        let title = clean_text(&input.title);
        let description = clean_text(&input.description);
        let url = input.url.trim().to_string();
        let source = input.source.trim().to_string();

        if title.is_empty() {
            return Err(AppError::InvalidRecord("job title must not be empty".into()));
        }
        if url.is_empty() {
            return Err(AppError::InvalidRecord(format!("job '{title}' has no url")));
        }
        match url::Url::parse(&url) {
            Ok(parsed) if parsed.has_host() => {}
            _ => {
                return Err(AppError::InvalidRecord(format!(
                    "job '{title}' has an invalid url '{url}'"
                )));
            }
        }
        if source.is_empty() {
            return Err(AppError::InvalidRecord(format!("job '{title}' has no source")));
        }

        let category = JobCategory::classify(&title, &description);
        let skills = extract_skills(&description);

        Ok(Job {
            title,
            company: input.company,
            location: input.location,
            description,
            url,
            source,
            job_type: input.job_type,
            category,
            skills,
            salary: input.salary,
            posted_date: input.posted_date,
            scraped_date: Utc::now(),
            extra_data: input.extra_data,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn company(&self) -> &Company {
        &self.company
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn job_type(&self) -> JobType {
        self.job_type
    }

    pub fn category(&self) -> JobCategory {
        self.category
    }

    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    pub fn salary(&self) -> Option<&Salary> {
        self.salary.as_ref()
    }

    pub fn posted_date(&self) -> Option<DateTime<Utc>> {
        self.posted_date
    }

    pub fn scraped_date(&self) -> DateTime<Utc> {
        self.scraped_date
    }

    pub fn extra_data(&self) -> &ExtraData {
        &self.extra_data
    }
}
