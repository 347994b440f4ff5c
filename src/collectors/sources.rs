//! The catalogue of known job sources and their sample-data generators.
//!
//! Every source is described by a [`SourceProfile`]; the generic
//! [`TemplateCollector`](super::template::TemplateCollector) turns a profile
//! into a working collector.

use std::fmt;

use chrono::{TimeDelta, Utc};
use serde::Serialize;
use serde_json::{Value, json};

use crate::collectors::JobDetails;
use crate::error::AppError;
use crate::models::{Company, Currency, ExtraData, JobType, Location, Salary, SalaryPeriod};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// General job boards.
    General,
    /// Boards that only list remote positions.
    Remote,
    /// Freelance and gig marketplaces.
    Freelance,
}

/// Inputs handed to a profile's sample generator.
#[derive(Debug)]
pub struct SampleContext<'a> {
    /// Cleaned search keywords as typed.
    pub keywords: &'a str,
    /// Keywords in title case, for building titles.
    pub title: String,
    pub location: &'a str,
    pub companies: &'a [&'a str],
    /// Number of listings wanted; generators may return fewer.
    pub limit: usize,
}

impl SampleContext<'_> {
    /// The company for entry `i`, falling back to a numbered placeholder.
    pub fn company(&self, i: usize) -> String {
        self.companies
            .get(i)
            .map(|c| (*c).to_string())
            .unwrap_or_else(|| format!("Company {}", i + 1))
    }

    /// The searched location if it names a place, else remote.
    pub fn location_or_remote(&self) -> Location {
        Location::parse(self.location).unwrap_or(Location::Remote)
    }
}

/// One listing before normalization into a [`Job`](crate::models::Job).
#[derive(Debug, Clone)]
pub struct Listing {
    pub title: String,
    pub company: Company,
    pub location: Location,
    pub description: String,
    /// Path appended to the source's base URL.
    pub path: String,
    pub salary: Option<Salary>,
    /// Fixed job type; classified from keywords and description when unset.
    pub job_type: Option<JobType>,
    pub age_days: i64,
    pub extra: ExtraData,
}

impl Listing {
    pub fn new(title: String, company: Company, location: Location, path: String) -> Listing {
        Listing {
            title,
            company,
            location,
            description: String::new(),
            path,
            salary: None,
            job_type: None,
            age_days: 0,
            extra: ExtraData::new(),
        }
    }

    fn described(mut self, description: String) -> Listing {
        self.description = description;
        self
    }

    fn paying(mut self, salary: Salary) -> Listing {
        self.salary = Some(salary);
        self
    }

    fn typed(mut self, job_type: JobType) -> Listing {
        self.job_type = Some(job_type);
        self
    }

    fn aged(mut self, days: usize) -> Listing {
        self.age_days = days as i64;
        self
    }

    fn note(mut self, key: &str, value: Value) -> Listing {
        self.extra.insert(key.to_string(), value);
        self
    }

    /// Posting timestamp derived from `age_days`.
    pub fn posted_date(&self) -> chrono::DateTime<Utc> {
        Utc::now() - TimeDelta::days(self.age_days)
    }
}

pub type Generator = fn(&SampleContext<'_>) -> Result<Vec<Listing>, AppError>;
pub type DetailsFn = fn(&str) -> JobDetails;

/// Static description of one job source.
#[derive(Clone)]
pub struct SourceProfile {
    pub name: &'static str,
    pub base_url: &'static str,
    pub kind: SourceKind,
    /// Lower runs first.
    pub priority: u8,
    /// Cap on jobs per call regardless of the requested limit.
    pub max_per_session: usize,
    pub companies: &'static [&'static str],
    pub generate: Generator,
    pub details: DetailsFn,
}

impl fmt::Debug for SourceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceProfile")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("kind", &self.kind)
            .field("priority", &self.priority)
            .field("max_per_session", &self.max_per_session)
            .finish_non_exhaustive()
    }
}

pub fn catalogue() -> &'static [SourceProfile] {
    &CATALOGUE
}

pub const LINKEDIN: SourceProfile = SourceProfile {
    name: "LinkedIn",
    base_url: "https://www.linkedin.com",
    kind: SourceKind::General,
    priority: 1,
    max_per_session: 50,
    companies: &[],
    generate: numbered_positions,
    details: sample_details,
};

pub const INDEED: SourceProfile = SourceProfile {
    name: "Indeed",
    base_url: "https://www.indeed.com",
    kind: SourceKind::General,
    priority: 2,
    max_per_session: 75,
    companies: &[],
    generate: numbered_positions,
    details: sample_details,
};

pub const UPWORK: SourceProfile = SourceProfile {
    name: "Upwork",
    base_url: "https://www.upwork.com",
    kind: SourceKind::Freelance,
    priority: 3,
    max_per_session: 30,
    companies: &[
        "Tech Startup",
        "Digital Agency",
        "Consulting Firm",
        "E-commerce Company",
        "Small Business",
    ],
    generate: upwork_projects,
    details: upwork_details,
};

pub const REMOTEOK: SourceProfile = SourceProfile {
    name: "RemoteOK",
    base_url: "https://remoteok.com",
    kind: SourceKind::Remote,
    priority: 4,
    max_per_session: 40,
    companies: &[],
    generate: numbered_positions,
    details: sample_details,
};

pub const ANGELLIST: SourceProfile = SourceProfile {
    name: "AngelList",
    base_url: "https://wellfound.com",
    kind: SourceKind::General,
    priority: 5,
    max_per_session: 25,
    companies: &[],
    generate: numbered_positions,
    details: sample_details,
};

pub const WEWORKREMOTELY: SourceProfile = SourceProfile {
    name: "WeWorkRemotely",
    base_url: "https://weworkremotely.com",
    kind: SourceKind::Remote,
    priority: 6,
    max_per_session: 40,
    companies: &[
        "RemoteTech",
        "GlobalDev",
        "DistributedTeam",
        "CloudFirst",
        "RemoteForce",
    ],
    generate: remote_specialists,
    details: remote_details,
};

pub const GLASSDOOR: SourceProfile = SourceProfile {
    name: "Glassdoor",
    base_url: "https://www.glassdoor.com",
    kind: SourceKind::General,
    priority: 7,
    max_per_session: 50,
    companies: &["Microsoft", "Google", "Apple", "Amazon", "Meta"],
    generate: rated_employers,
    details: glassdoor_details,
};

pub const DICE: SourceProfile = SourceProfile {
    name: "Dice",
    base_url: "https://www.dice.com",
    kind: SourceKind::General,
    priority: 8,
    max_per_session: 50,
    companies: &["IBM", "Oracle", "Salesforce", "VMware", "Cisco"],
    generate: tech_roles,
    details: tech_details,
};

pub const MONSTER: SourceProfile = SourceProfile {
    name: "Monster",
    base_url: "https://www.monster.com",
    kind: SourceKind::General,
    priority: 9,
    max_per_session: 50,
    companies: &["Accenture", "Deloitte", "PwC", "EY", "KPMG"],
    generate: consulting_specialists,
    details: plain_details,
};

pub const FIVERR: SourceProfile = SourceProfile {
    name: "Fiverr",
    base_url: "https://www.fiverr.com",
    kind: SourceKind::Freelance,
    priority: 10,
    max_per_session: 30,
    companies: &[],
    generate: buyer_requests,
    details: freelance_details,
};

pub const FREELANCER: SourceProfile = SourceProfile {
    name: "Freelancer",
    base_url: "https://www.freelancer.com",
    kind: SourceKind::Freelance,
    priority: 11,
    max_per_session: 30,
    companies: &[],
    generate: numbered_positions,
    details: freelance_details,
};

pub const STEPSTONE: SourceProfile = SourceProfile {
    name: "StepStone",
    base_url: "https://www.stepstone.de",
    kind: SourceKind::General,
    priority: 12,
    max_per_session: 50,
    companies: &[],
    generate: numbered_positions,
    details: sample_details,
};

pub const REED: SourceProfile = SourceProfile {
    name: "Reed",
    base_url: "https://www.reed.co.uk",
    kind: SourceKind::General,
    priority: 13,
    max_per_session: 50,
    companies: &[],
    generate: numbered_positions,
    details: sample_details,
};

pub const SEEK: SourceProfile = SourceProfile {
    name: "Seek",
    base_url: "https://www.seek.com.au",
    kind: SourceKind::General,
    priority: 14,
    max_per_session: 50,
    companies: &[],
    generate: numbered_positions,
    details: sample_details,
};

static CATALOGUE: [SourceProfile; 14] = [
    LINKEDIN,
    INDEED,
    UPWORK,
    REMOTEOK,
    ANGELLIST,
    WEWORKREMOTELY,
    GLASSDOOR,
    DICE,
    MONSTER,
    FIVERR,
    FREELANCER,
    STEPSTONE,
    REED,
    SEEK,
];

// Generic placeholder postings: "<Keywords> Position N".
fn numbered_positions(ctx: &SampleContext<'_>) -> Result<Vec<Listing>, AppError> {
    (0..ctx.limit.min(3))
        .map(|i| -> Result<Listing, AppError> {
            Ok(Listing::new(
                format!("{} Position {}", ctx.title, i + 1),
                Company::new(&ctx.company(i))?,
                ctx.location_or_remote(),
                format!("/job/sample-{i}"),
            )
            .described(format!("Sample {} opening: {}", ctx.title, ctx.keywords))
            .aged(i)
            .note("sample", json!(true)))
        })
        .collect()
}

fn upwork_projects(ctx: &SampleContext<'_>) -> Result<Vec<Listing>, AppError> {
    let kw = ctx.keywords;
    let projects = [
        (
            format!("{} Website Development", ctx.title),
            "$2000-5000",
            format!("Looking for experienced developer to build {kw} solution"),
        ),
        (
            format!("{} Mobile App", ctx.title),
            "$30-50/hr",
            format!("Need mobile app development with {kw} expertise"),
        ),
        (
            format!("{} Consulting Project", ctx.title),
            "$1500-3000",
            format!("Short-term {kw} consulting engagement"),
        ),
        (
            format!("Full Stack {} Developer", ctx.title),
            "$40-80/hr",
            format!("Long-term {kw} development project"),
        ),
        (
            format!("{} Automation Script", ctx.title),
            "$500-1000",
            format!("Need {kw} automation solution"),
        ),
    ];

    projects
        .into_iter()
        .take(ctx.limit)
        .enumerate()
        .map(|(i, (title, budget, description))| -> Result<Listing, AppError> {
            let mut listing = Listing::new(
                title,
                Company::new(&ctx.company(i))?.with_industry("Freelance Client"),
                Location::Remote,
                format!("/jobs/sample-{i}"),
            )
            .described(description)
            .typed(JobType::Freelance)
            .aged(i)
            .note("sample", json!(true))
            .note("budget", json!(budget))
            .note("keywords", json!(kw));
            if let Some(salary) = Salary::parse(budget) {
                listing = listing.paying(salary.or_period(SalaryPeriod::Project));
            }
            Ok(listing)
        })
        .collect()
}

fn buyer_requests(ctx: &SampleContext<'_>) -> Result<Vec<Listing>, AppError> {
    let kw = ctx.keywords;
    let requests = [
        format!("Need expert {kw} developer"),
        format!("Looking for {kw} specialist"),
        format!("Urgent {kw} project help needed"),
        format!("Professional {kw} service required"),
        format!("Custom {kw} solution wanted"),
    ];
    let budgets = [150.0, 300.0, 500.0, 200.0, 400.0];

    requests
        .into_iter()
        .zip(budgets)
        .take(ctx.limit)
        .enumerate()
        .map(|(i, (title, budget))| -> Result<Listing, AppError> {
            Ok(Listing::new(
                title.clone(),
                Company::new(&format!("Fiverr Buyer {}", i + 1))?,
                Location::Remote,
                format!("/request/sample-{i}"),
            )
            .described(format!("Fiverr buyer request: {title}"))
            .paying(Salary::new(
                budget,
                None,
                Currency::Usd,
                Some(SalaryPeriod::Project),
            )?)
            .typed(JobType::Freelance)
            .aged(i)
            .note("sample", json!(true))
            .note("freelance", json!(true)))
        })
        .collect()
}

fn remote_specialists(ctx: &SampleContext<'_>) -> Result<Vec<Listing>, AppError> {
    (0..ctx.limit.min(ctx.companies.len()))
        .map(|i| -> Result<Listing, AppError> {
            let company = ctx.company(i);
            Ok(Listing::new(
                format!("Remote {} Specialist", ctx.title),
                Company::new(&company)?.with_industry("Technology"),
                Location::Remote,
                format!("/jobs/sample-{i}"),
            )
            .described(format!(
                "Fully remote {} position at {company}. Work from anywhere!",
                ctx.keywords
            ))
            .typed(JobType::FullTime)
            .aged(i))
        })
        .collect()
}

fn rated_employers(ctx: &SampleContext<'_>) -> Result<Vec<Listing>, AppError> {
    let ratings = [4.4, 4.5, 4.3, 4.1, 4.2];
    let title = format!("Senior {} Engineer", ctx.title);

    (0..ctx.limit.min(ctx.companies.len()))
        .map(|i| -> Result<Listing, AppError> {
            let company = ctx.company(i);
            let rating = ratings.get(i).copied().unwrap_or(4.0);
            Ok(Listing::new(
                title.clone(),
                Company::new(&company)?
                    .with_rating(format!("{rating}/5"))
                    .with_description(format!("Glassdoor rating: {rating}/5")),
                Location::place(Some("Seattle"), Some("WA"), Some("USA"))?,
                format!("/job-listing/sample-{i}"),
            )
            .described(format!(
                "Join {company} as a {title}. Highly rated company with great benefits."
            ))
            .paying(Salary::new(
                120_000.0,
                Some(180_000.0),
                Currency::Usd,
                Some(SalaryPeriod::Year),
            )?)
            .aged(i)
            .note("company_rating", json!(rating)))
        })
        .collect()
}

fn tech_roles(ctx: &SampleContext<'_>) -> Result<Vec<Listing>, AppError> {
    let t = &ctx.title;
    let roles = [
        format!("Senior {t} Developer"),
        format!("{t} Software Engineer"),
        format!("Lead {t} Architect"),
        format!("{t} DevOps Engineer"),
        format!("Principal {t} Consultant"),
    ];

    (0..ctx.limit.min(ctx.companies.len()))
        .map(|i| -> Result<Listing, AppError> {
            let company = ctx.company(i);
            Ok(Listing::new(
                roles[i % roles.len()].clone(),
                Company::new(&company)?.with_industry("Technology"),
                Location::place(Some("Austin"), Some("TX"), Some("USA"))?,
                format!("/job/sample-dice-{i}"),
            )
            .described(format!(
                "Full-time technical role at {company} focusing on {}",
                ctx.keywords
            ))
            .paying(Salary::new(
                90_000.0,
                Some(150_000.0),
                Currency::Usd,
                Some(SalaryPeriod::Year),
            )?)
            .aged(i))
        })
        .collect()
}

fn consulting_specialists(ctx: &SampleContext<'_>) -> Result<Vec<Listing>, AppError> {
    (0..ctx.limit.min(ctx.companies.len()))
        .map(|i| -> Result<Listing, AppError> {
            let company = ctx.company(i);
            Ok(Listing::new(
                format!("{} Specialist {}", ctx.title, i + 1),
                Company::new(&company)?,
                Location::place(Some("New York"), Some("NY"), Some("USA"))?,
                format!("/job/sample-{i}"),
            )
            .described(format!(
                "Monster job opportunity: {} at {company}",
                ctx.keywords
            ))
            .aged(i)
            .note("sample", json!(true)))
        })
        .collect()
}

fn details(entries: &[(&str, Value)]) -> JobDetails {
    entries
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

fn sample_details(_url: &str) -> JobDetails {
    details(&[("sample", json!(true))])
}

fn plain_details(_url: &str) -> JobDetails {
    JobDetails::new()
}

fn upwork_details(_url: &str) -> JobDetails {
    details(&[("platform", json!("upwork")), ("freelance", json!(true))])
}

fn freelance_details(_url: &str) -> JobDetails {
    details(&[("freelance", json!(true))])
}

fn remote_details(_url: &str) -> JobDetails {
    details(&[("remote", json!(true))])
}

fn glassdoor_details(_url: &str) -> JobDetails {
    details(&[("company_insights", json!(true))])
}

fn tech_details(_url: &str) -> JobDetails {
    details(&[("tech_focused", json!(true))])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(keywords: &'a str, companies: &'a [&'a str], limit: usize) -> SampleContext<'a> {
        SampleContext {
            keywords,
            title: crate::text::title_case(keywords),
            location: "",
            companies,
            limit,
        }
    }

    #[test]
    fn catalogue_names_and_priorities_are_unique() {
        let profiles = catalogue();
        for (i, a) in profiles.iter().enumerate() {
            for b in &profiles[i + 1..] {
                assert!(!a.name.eq_ignore_ascii_case(b.name));
                assert_ne!(a.priority, b.priority);
            }
            assert!(a.base_url.starts_with("https://"));
            assert!(a.max_per_session > 0);
        }
    }

    #[test]
    fn numbered_positions_caps_at_three() {
        let listings = numbered_positions(&ctx("rust", &[], 10)).unwrap();
        assert_eq!(listings.len(), 3);
        assert_eq!(listings[0].title, "Rust Position 1");
        assert_eq!(listings[2].company.name(), "Company 3");
        assert!(listings.iter().all(|l| l.location.is_remote()));
    }

    #[test]
    fn numbered_positions_use_searched_place() {
        let mut c = ctx("rust", &[], 2);
        c.location = "Berlin, Germany";
        let listings = numbered_positions(&c).unwrap();
        assert_eq!(listings[0].location.city(), Some("Berlin"));
    }

    #[test]
    fn upwork_budgets_become_project_or_hourly_pay() {
        let listings = upwork_projects(&ctx("python", UPWORK.companies, 5)).unwrap();
        assert_eq!(listings.len(), 5);

        let fixed = listings[0].salary.as_ref().unwrap();
        assert_eq!(fixed.min_amount(), 2000.0);
        assert_eq!(fixed.max_amount(), Some(5000.0));
        assert_eq!(fixed.period(), Some(SalaryPeriod::Project));

        let hourly = listings[1].salary.as_ref().unwrap();
        assert_eq!(hourly.period(), Some(SalaryPeriod::Hour));
        assert!(listings.iter().all(|l| l.job_type == Some(JobType::Freelance)));
    }

    #[test]
    fn fiverr_requests_keep_keyword_case() {
        let listings = buyer_requests(&ctx("python", &[], 2)).unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].title, "Need expert python developer");
        assert_eq!(listings[1].salary.as_ref().unwrap().min_amount(), 300.0);
    }

    #[test]
    fn on_site_profiles_carry_places() {
        let dice = tech_roles(&ctx("go", DICE.companies, 5)).unwrap();
        assert_eq!(dice[0].location.city(), Some("Austin"));
        let monster = consulting_specialists(&ctx("go", MONSTER.companies, 5)).unwrap();
        assert_eq!(monster[4].company.name(), "KPMG");
        assert_eq!(monster[4].location.state(), Some("NY"));
    }
}
