use crate::record::{render_value, Record};
use colored::Colorize;

/// First record whose name contains `keyword`, or the empty record.
pub fn find_by_keyword(records: &[Record], keyword: &str) -> Record {
    records
        .iter()
        .find(|rec| rec.name().is_some_and(|name| name.contains(keyword)))
        .cloned()
        .unwrap_or_default()
}

pub fn account_header(account: &Record) -> String {
    let id = account.field("id").map(render_value).unwrap_or_default();
    let name = account.name().unwrap_or_default();
    format!("\nAccount ID: {}: {}", id, name)
}

pub fn connection_line(connected: bool) -> String {
    format!("\nConnected to SyncSketch? {}", connected)
}

pub fn report_error(err: &anyhow::Error) {
    eprintln!("{} {}", "error:".red().bold(), err.to_string().yellow());
}
