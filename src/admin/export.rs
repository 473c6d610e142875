use anyhow::Context;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use super::repo::Entry;
use crate::survey::questions::QUESTION_COUNT;

pub const CSV_FILENAME: &str = "responses.csv";

/// `id,user_id,email,phone,created_at,q1..qN`
pub fn csv_header() -> Vec<String> {
    ["id", "user_id", "email", "phone", "created_at"]
        .into_iter()
        .map(String::from)
        .chain((1..=QUESTION_COUNT).map(|n| format!("q{n}")))
        .collect()
}

pub fn format_timestamp(ts: Option<OffsetDateTime>) -> anyhow::Result<String> {
    ts.map(|t| t.format(&Rfc3339).context("format timestamp"))
        .transpose()
        .map(Option::unwrap_or_default)
}

/// Serialize entries to CSV. Users without a response get blank answer cells.
pub fn write_csv(entries: &[Entry]) -> anyhow::Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(csv_header())?;

    for e in entries {
        let mut record = vec![
            e.response_id.map(|id| id.to_string()).unwrap_or_default(),
            e.user_id.to_string(),
            e.email.clone(),
            e.phone.clone().unwrap_or_default(),
            format_timestamp(e.submitted_at)?,
        ];
        record.extend(
            e.answers
                .iter()
                .cloned()
                .chain(std::iter::repeat(String::new()))
                .take(QUESTION_COUNT),
        );
        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flush csv: {}", e.error()))
}
