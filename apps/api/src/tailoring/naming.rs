//! Output-file naming: `Resume_<initials>_<company>_<yymmdd-HHMM>.docx` and
//! the cover-letter equivalent.

use chrono::{DateTime, Local};

/// First non-empty line of the resume text, assumed to be the candidate name.
pub fn candidate_name(resume_text: &str) -> String {
    resume_text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("Candidate")
        .to_string()
}

/// One letter per whitespace-separated word: "Ada Lovelace" -> "AL".
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .collect()
}

/// First two words of the company name joined by `_`, "Unknown" when empty.
pub fn company_short(company: &str) -> String {
    let short = company
        .split_whitespace()
        .take(2)
        .collect::<Vec<_>>()
        .join("_");
    if short.is_empty() {
        "Unknown".to_string()
    } else {
        short
    }
}

fn timestamp_slug(now: DateTime<Local>) -> String {
    now.format("%y%m%d-%H%M").to_string()
}

pub fn resume_filename(candidate: &str, company: &str, now: DateTime<Local>) -> String {
    format!(
        "Resume_{}_{}_{}.docx",
        initials(candidate),
        company_short(company),
        timestamp_slug(now)
    )
}

pub fn cover_letter_filename(candidate: &str, company: &str, now: DateTime<Local>) -> String {
    format!(
        "Cover_Letter_{}_{}_{}.docx",
        initials(candidate),
        company_short(company),
        timestamp_slug(now)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 14, 9, 26, 0).unwrap()
    }

    #[test]
    fn test_candidate_name_skips_leading_blank_lines() {
        assert_eq!(candidate_name("\n\n  Ada Lovelace\nLondon"), "Ada Lovelace");
        assert_eq!(candidate_name(""), "Candidate");
    }

    #[test]
    fn test_initials() {
        assert_eq!(initials("Ada Lovelace"), "AL");
        assert_eq!(initials("Prince"), "P");
        assert_eq!(initials(""), "");
    }

    #[test]
    fn test_company_short_takes_two_words() {
        assert_eq!(company_short("Acme Rocket Skates Inc"), "Acme_Rocket");
        assert_eq!(company_short("Initech"), "Initech");
        assert_eq!(company_short("  "), "Unknown");
    }

    #[test]
    fn test_filenames() {
        assert_eq!(
            resume_filename("Ada Lovelace", "Acme Corp", fixed_now()),
            "Resume_AL_Acme_Corp_250314-0926.docx"
        );
        assert_eq!(
            cover_letter_filename("Ada Lovelace", "Acme Corp", fixed_now()),
            "Cover_Letter_AL_Acme_Corp_250314-0926.docx"
        );
    }
}
