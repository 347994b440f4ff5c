use serde::Serialize;

use crate::error::AppError;
use crate::text::clean_text;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Company {
    name: String,
    industry: Option<String>,
    description: Option<String>,
    rating: Option<String>,
}

impl Company {
    pub fn new(name: &str) -> Result<Company, AppError> {
        let name = clean_text(name);
        if name.is_empty() {
            return Err(AppError::InvalidRecord(
                "company name must not be empty".to_string(),
            ));
        }
        Ok(Company {
            name,
            industry: None,
            description: None,
            rating: None,
        })
    }

    pub fn with_industry(mut self, industry: impl Into<String>) -> Company {
        self.industry = Some(industry.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Company {
        self.description = Some(description.into());
        self
    }

    pub fn with_rating(mut self, rating: impl Into<String>) -> Company {
        self.rating = Some(rating.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn industry(&self) -> Option<&str> {
        self.industry.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn rating(&self) -> Option<&str> {
        self.rating.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_required() {
        assert!(Company::new("").is_err());
        assert!(Company::new(" \n ").is_err());
    }

    #[test]
    fn name_is_cleaned() {
        let company = Company::new("  Foo &amp;  Bar ").unwrap().with_rating("4.5/5");
        assert_eq!(company.name(), "Foo & Bar");
        assert_eq!(company.rating(), Some("4.5/5"));
        assert_eq!(company.industry(), None);
    }
}
