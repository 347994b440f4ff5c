use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::AppError;
use crate::text::contains_term;

static HYBRID_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(hybrid|part remote|flexible)\b\s*[-:–(]?\s*").expect("valid regex")
});

const REMOTE_MARKERS: &[&str] = &[
    "remote",
    "remotely",
    "worldwide",
    "anywhere",
    "work from home",
    "wfh",
];
const HYBRID_MARKERS: &[&str] = &["hybrid", "flexible", "part remote"];

/// Where a job is performed: fully remote, or at a place with at least one
/// of city/state/country set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Location {
    Remote,
    Place(Place),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Place {
    city: Option<String>,
    state: Option<String>,
    country: Option<String>,
    hybrid: bool,
}

impl Location {
    pub fn remote() -> Location {
        Location::Remote
    }

    pub fn place(
        city: Option<&str>,
        state: Option<&str>,
        country: Option<&str>,
    ) -> Result<Location, AppError> {
        let part = |s: Option<&str>| {
            s.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };
        let place = Place {
            city: part(city),
            state: part(state),
            country: part(country),
            hybrid: false,
        };
        if place.city.is_none() && place.state.is_none() && place.country.is_none() {
            return Err(AppError::InvalidRecord(
                "location needs a remote flag or at least one of city/state/country".to_string(),
            ));
        }
        Ok(Location::Place(place))
    }

    /// Mark an on-site location as hybrid. Remote locations are unchanged.
    pub fn hybrid(self) -> Location {
        match self {
            Location::Place(place) => Location::Place(Place {
                hybrid: true,
                ..place
            }),
            Location::Remote => Location::Remote,
        }
    }

    /// Parse free-form location text such as `"San Francisco, CA, USA"`,
    /// `"Remote"` or `"Hybrid - Berlin, Germany"`. Empty text yields `None`.
    pub fn parse(text: &str) -> Option<Location> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        let is_remote = has_marker(trimmed, REMOTE_MARKERS);
        let is_hybrid = has_marker(trimmed, HYBRID_MARKERS);
        if is_remote && !is_hybrid {
            return Some(Location::Remote);
        }

        let rest = HYBRID_PREFIX.replace(trimmed, "");
        let parts: Vec<&str> = rest
            .split(',')
            .map(|p| p.trim().trim_end_matches(')').trim())
            .filter(|p| !p.is_empty())
            .collect();

        let location = match parts.as_slice() {
            [] => None,
            [city] => Location::place(Some(*city), None, None).ok(),
            [city, country] => Location::place(Some(*city), None, Some(*country)).ok(),
            [city, state, country] => {
                Location::place(Some(*city), Some(*state), Some(*country)).ok()
            }
            [city, .., country] => Location::place(Some(*city), None, Some(*country)).ok(),
        };

        // "Remote, flexible hours" names no place even though it reads hybrid.
        match location {
            Some(loc) if is_remote && loc.city().is_some_and(|c| has_marker(c, REMOTE_MARKERS)) => {
                Some(Location::Remote)
            }
            Some(loc) if is_hybrid => Some(loc.hybrid()),
            Some(loc) => Some(loc),
            None if is_remote => Some(Location::Remote),
            None => None,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Location::Remote)
    }

    pub fn is_hybrid(&self) -> bool {
        matches!(self, Location::Place(p) if p.hybrid)
    }

    pub fn city(&self) -> Option<&str> {
        self.as_place().and_then(|p| p.city.as_deref())
    }

    pub fn state(&self) -> Option<&str> {
        self.as_place().and_then(|p| p.state.as_deref())
    }

    pub fn country(&self) -> Option<&str> {
        self.as_place().and_then(|p| p.country.as_deref())
    }

    fn as_place(&self) -> Option<&Place> {
        match self {
            Location::Place(place) => Some(place),
            Location::Remote => None,
        }
    }
}

fn has_marker(text: &str, markers: &[&str]) -> bool {
    let lower = text.to_lowercase();
    markers.iter().any(|m| contains_term(&lower, m))
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Remote => f.write_str("Remote"),
            Location::Place(place) => {
                let joined = [&place.city, &place.state, &place.country]
                    .into_iter()
                    .flatten()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                if place.hybrid {
                    write!(f, "Hybrid - {joined}")
                } else {
                    f.write_str(&joined)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn place_requires_a_component() {
        assert!(Location::place(None, None, None).is_err());
        assert!(Location::place(Some("  "), None, Some("")).is_err());
        assert!(Location::place(None, None, Some("USA")).is_ok());
    }

    #[test]
    fn remote_has_no_components() {
        let loc = Location::remote();
        assert!(loc.is_remote());
        assert_eq!(loc.city(), None);
        assert_eq!(loc.state(), None);
        assert_eq!(loc.country(), None);
        assert_eq!(loc.clone().hybrid(), Location::Remote);
    }

    #[test]
    fn parses_remote_markers() {
        assert_eq!(Location::parse("Remote"), Some(Location::Remote));
        assert_eq!(Location::parse("Worldwide (EMEA)"), Some(Location::Remote));
        assert_eq!(Location::parse("   "), None);
    }

    #[test]
    fn parses_place_components() {
        let loc = Location::parse("San Francisco, CA, USA").unwrap();
        assert_eq!(loc.city(), Some("San Francisco"));
        assert_eq!(loc.state(), Some("CA"));
        assert_eq!(loc.country(), Some("USA"));

        let two = Location::parse("London, UK").unwrap();
        assert_eq!(two.city(), Some("London"));
        assert_eq!(two.state(), None);
        assert_eq!(two.country(), Some("UK"));

        let many = Location::parse("Sydney, NSW, 2000, Australia").unwrap();
        assert_eq!(many.city(), Some("Sydney"));
        assert_eq!(many.country(), Some("Australia"));
    }

    #[test]
    fn parses_hybrid_prefix() {
        let loc = Location::parse("Hybrid - Berlin, Germany").unwrap();
        assert!(loc.is_hybrid());
        assert!(!loc.is_remote());
        assert_eq!(loc.city(), Some("Berlin"));
        assert_eq!(loc.to_string(), "Hybrid - Berlin, Germany");
        assert_eq!(Location::parse("Hybrid"), None);
    }

    #[test]
    fn part_remote_reads_as_hybrid() {
        let loc = Location::parse("Part remote - London, UK").unwrap();
        assert!(loc.is_hybrid());
        assert_eq!(loc.city(), Some("London"));
        assert_eq!(loc.country(), Some("UK"));

        let flexible = Location::parse("Flexible: Austin, TX, USA").unwrap();
        assert!(flexible.is_hybrid());
        assert_eq!(flexible.city(), Some("Austin"));

        assert_eq!(Location::parse("Remote, flexible hours"), Some(Location::Remote));
        assert_eq!(Location::parse("Part remote"), Some(Location::Remote));
    }

    #[test]
    fn markers_match_whole_words() {
        let loc = Location::parse("Remoteville, Anywhereshire").unwrap();
        assert!(!loc.is_remote());
        assert_eq!(loc.city(), Some("Remoteville"));
        assert_eq!(loc.country(), Some("Anywhereshire"));
        assert!(!Location::parse("Hybridge, UK").unwrap().is_hybrid());
    }

    #[test]
    fn serializes_with_kind_tag() {
        let loc = Location::place(Some("Austin"), Some("TX"), Some("USA")).unwrap();
        let json = serde_json::to_value(&loc).unwrap();
        assert_eq!(json["kind"], "place");
        assert_eq!(json["city"], "Austin");
        assert_eq!(
            serde_json::to_value(Location::Remote).unwrap()["kind"],
            "remote"
        );
    }
}
