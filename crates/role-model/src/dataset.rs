//! CSV loading for the labeled training set.

use std::collections::HashMap;
use std::path::Path;

use polars::prelude::*;
use tracing::info;

use crate::error::{ModelError, Result};
use crate::normalize::column_name;
use crate::record::{whole_years, ApplicantRecord, LabeledRecord};

/// Columns every dataset must provide, after header normalization.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    "degree",
    "major",
    "cgpa",
    "employed",
    "experience",
    "skills",
    "certifications",
    "industry_preference",
    "job_role",
];

/// Older exports write the industry column without a separator.
const COLUMN_ALIASES: [(&str, &str); 1] = [("industrypreference", "industry_preference")];

/// Reads a CSV dataset with every column as text and builds labeled records.
pub fn load_dataset(path: &Path) -> Result<Vec<LabeledRecord>> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let records = records_from_frame(&df)?;
    info!(path = %path.display(), rows = records.len(), "dataset loaded");
    Ok(records)
}

fn records_from_frame(df: &DataFrame) -> Result<Vec<LabeledRecord>> {
    let mut headers: HashMap<String, String> = HashMap::new();
    for name in df.get_column_names() {
        let normalized = column_name(name.as_str());
        let canonical = COLUMN_ALIASES
            .iter()
            .find(|(alias, _)| *alias == normalized)
            .map(|(_, canonical)| canonical.to_string())
            .unwrap_or(normalized);
        headers.insert(canonical, name.to_string());
    }

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|c| !headers.contains_key(*c))
        .collect();
    if !missing.is_empty() {
        return Err(ModelError::Dataset(format!(
            "missing required columns: {}",
            missing.join(", ")
        )));
    }

    let column = |field: &str| string_column(df, &headers, field);
    let degree = column("degree")?;
    let major = column("major")?;
    let cgpa = column("cgpa")?;
    let employed = column("employed")?;
    let experience = column("experience")?;
    let skills = column("skills")?;
    let certifications = column("certifications")?;
    let industry = column("industry_preference")?;
    let job_role = column("job_role")?;

    let mut records = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let row = i + 1;
        let job_role = job_role.get(i).map(str::trim).unwrap_or_default();
        if job_role.is_empty() {
            return Err(ModelError::Dataset(format!("row {row}: job_role is empty")));
        }

        let record = ApplicantRecord::new(
            degree.get(i).unwrap_or_default(),
            major.get(i).unwrap_or_default(),
            parse_cgpa(row, cgpa.get(i))?,
            parse_experience(row, experience.get(i))?,
            employed.get(i).unwrap_or_default(),
            industry.get(i).unwrap_or_default(),
            skills.get(i).unwrap_or_default(),
            certifications.get(i).unwrap_or_default(),
        );
        records.push(LabeledRecord {
            record,
            job_role: job_role.to_string(),
        });
    }
    Ok(records)
}

fn string_column<'a>(
    df: &'a DataFrame,
    headers: &HashMap<String, String>,
    field: &str,
) -> Result<&'a StringChunked> {
    Ok(df.column(&headers[field])?.str()?)
}

fn parse_cgpa(row: usize, value: Option<&str>) -> Result<f64> {
    let raw = value.map(str::trim).unwrap_or_default();
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| ModelError::Dataset(format!("row {row}: cgpa '{raw}' is not a number")))
}

/// Same rule as request parsing: whole years, `"2.0"` allowed, bounded by
/// [`MAX_EXPERIENCE`](crate::record::MAX_EXPERIENCE).
fn parse_experience(row: usize, value: Option<&str>) -> Result<u32> {
    let raw = value.map(str::trim).unwrap_or_default();
    raw.parse::<f64>().ok().and_then(whole_years).ok_or_else(|| {
        ModelError::Dataset(format!(
            "row {row}: experience '{raw}' is not a whole number of years"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_normalizes_headers_and_values() {
        let file = write_csv(
            "Degree,Major,CGPA,Employed,Experience,Skills,Certifications,IndustryPreference,Job Role\n\
             btech,computer science,8.2,no,2,\"Python, SQL\",AWS,software,Data Analyst\n\
             mba,finance,7,yes,5.0,,,banking,Financial Analyst\n",
        );
        let records = load_dataset(file.path()).unwrap();

        assert_eq!(records.len(), 2);
        let first = &records[0];
        assert_eq!(first.job_role, "Data Analyst");
        assert_eq!(first.record.degree, "Btech");
        assert_eq!(first.record.major, "Computer Science");
        assert_eq!(first.record.skills, vec!["python", "sql"]);
        assert_eq!(first.record.certifications, vec!["aws"]);
        assert_eq!(first.record.industry_preference, "Software");

        let second = &records[1];
        assert_eq!(second.record.experience, 5);
        assert!(second.record.skills.is_empty());
        assert!(second.record.certifications.is_empty());
    }

    #[test]
    fn test_missing_column_is_reported() {
        let file = write_csv("degree,major,cgpa\nbtech,cs,8\n");
        let err = load_dataset(file.path()).unwrap_err();
        match err {
            ModelError::Dataset(msg) => assert!(msg.contains("job_role"), "{msg}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_numeric_cgpa_names_row() {
        let file = write_csv(
            "degree,major,cgpa,employed,experience,skills,certifications,industry_preference,job_role\n\
             btech,cs,8,no,1,python,aws,software,Developer\n\
             btech,cs,abc,no,1,python,aws,software,Developer\n",
        );
        let err = load_dataset(file.path()).unwrap_err();
        match err {
            ModelError::Dataset(msg) => assert!(msg.contains("row 2"), "{msg}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_experience_variants() {
        assert_eq!(parse_experience(1, Some("3")).unwrap(), 3);
        assert_eq!(parse_experience(1, Some(" 4.0 ")).unwrap(), 4);
        assert!(parse_experience(1, Some("2.5")).is_err());
        assert!(parse_experience(1, None).is_err());
        assert!(parse_experience(1, Some("3000000000")).is_err());
    }
}
