//! US state FIPS code table.
//!
//! Two-digit FIPS codes, postal abbreviations, and full names for the 50 US
//! states + DC, looked up by abbreviation. Filter templates use this to
//! expand `{state}` and `{fips}` placeholders for a region.

use serde::Serialize;

/// One US state (or DC) with its identifying codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UsState {
    /// Two-digit FIPS code (e.g. `"08"`).
    pub fips: &'static str,
    /// Two-letter postal abbreviation (e.g. `"CO"`).
    pub abbr: &'static str,
    /// Full name (e.g. `"Colorado"`).
    pub name: &'static str,
}

const fn state(fips: &'static str, abbr: &'static str, name: &'static str) -> UsState {
    UsState { fips, abbr, name }
}

/// All 50 states + DC, ordered by FIPS code.
pub const US_STATES: &[UsState] = &[
    state("01", "AL", "Alabama"),
    state("02", "AK", "Alaska"),
    state("04", "AZ", "Arizona"),
    state("05", "AR", "Arkansas"),
    state("06", "CA", "California"),
    state("08", "CO", "Colorado"),
    state("09", "CT", "Connecticut"),
    state("10", "DE", "Delaware"),
    state("11", "DC", "District of Columbia"),
    state("12", "FL", "Florida"),
    state("13", "GA", "Georgia"),
    state("15", "HI", "Hawaii"),
    state("16", "ID", "Idaho"),
    state("17", "IL", "Illinois"),
    state("18", "IN", "Indiana"),
    state("19", "IA", "Iowa"),
    state("20", "KS", "Kansas"),
    state("21", "KY", "Kentucky"),
    state("22", "LA", "Louisiana"),
    state("23", "ME", "Maine"),
    state("24", "MD", "Maryland"),
    state("25", "MA", "Massachusetts"),
    state("26", "MI", "Michigan"),
    state("27", "MN", "Minnesota"),
    state("28", "MS", "Mississippi"),
    state("29", "MO", "Missouri"),
    state("30", "MT", "Montana"),
    state("31", "NE", "Nebraska"),
    state("32", "NV", "Nevada"),
    state("33", "NH", "New Hampshire"),
    state("34", "NJ", "New Jersey"),
    state("35", "NM", "New Mexico"),
    state("36", "NY", "New York"),
    state("37", "NC", "North Carolina"),
    state("38", "ND", "North Dakota"),
    state("39", "OH", "Ohio"),
    state("40", "OK", "Oklahoma"),
    state("41", "OR", "Oregon"),
    state("42", "PA", "Pennsylvania"),
    state("44", "RI", "Rhode Island"),
    state("45", "SC", "South Carolina"),
    state("46", "SD", "South Dakota"),
    state("47", "TN", "Tennessee"),
    state("48", "TX", "Texas"),
    state("49", "UT", "Utah"),
    state("50", "VT", "Vermont"),
    state("51", "VA", "Virginia"),
    state("53", "WA", "Washington"),
    state("54", "WV", "West Virginia"),
    state("55", "WI", "Wisconsin"),
    state("56", "WY", "Wyoming"),
];

/// Looks up a state by its two-letter abbreviation (case-insensitive).
#[must_use]
pub fn by_abbr(abbr: &str) -> Option<&'static UsState> {
    let abbr = abbr.trim();
    US_STATES.iter().find(|s| s.abbr.eq_ignore_ascii_case(abbr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covers_fifty_states_and_dc() {
        assert_eq!(US_STATES.len(), 51);
    }

    #[test]
    fn codes_are_unique() {
        let mut fips: Vec<&str> = US_STATES.iter().map(|s| s.fips).collect();
        fips.dedup();
        assert_eq!(fips.len(), US_STATES.len());

        let mut abbrs: Vec<&str> = US_STATES.iter().map(|s| s.abbr).collect();
        abbrs.sort_unstable();
        abbrs.dedup();
        assert_eq!(abbrs.len(), US_STATES.len());
    }

    #[test]
    fn every_state_is_found_by_its_abbreviation() {
        for s in US_STATES {
            assert_eq!(by_abbr(s.abbr), Some(s));
        }
    }

    #[test]
    fn abbr_lookup_ignores_case_and_whitespace() {
        assert_eq!(by_abbr("co").map(|s| s.fips), Some("08"));
        assert_eq!(by_abbr(" Co ").map(|s| s.name), Some("Colorado"));
    }

    #[test]
    fn unknown_codes() {
        assert!(by_abbr("XX").is_none());
        assert!(by_abbr("").is_none());
    }
}
