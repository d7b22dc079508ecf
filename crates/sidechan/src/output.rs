use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use sidechan_peer::SnmpValue;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ValueOutput<'a> {
    oid: &'a str,
    value: String,
    size: usize,
}

impl<'a> From<&'a SnmpValue> for ValueOutput<'a> {
    fn from(value: &'a SnmpValue) -> Self {
        Self {
            oid: &value.oid,
            value: preview(&value.value),
            size: value.value.len(),
        }
    }
}

/// Print SNMP values. JSON output is one object per line.
pub fn print_values(values: &[SnmpValue], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for value in values {
                print_json(&ValueOutput::from(value));
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["OID", "SIZE", "VALUE"]);
            for value in values {
                table.add_row(vec![
                    value.oid.clone(),
                    value.value.len().to_string(),
                    preview(&value.value),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for value in values {
                println!("{} = {}", value.oid, preview(&value.value));
            }
        }
        OutputFormat::Raw => {
            for value in values {
                print_raw(&value.value);
                print_raw(b"\n");
            }
        }
    }
}

/// Outcome of a typed request or back-channel operation.
#[derive(Serialize, Debug, Default)]
pub struct Report {
    pub operation: &'static str,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
}

pub fn print_report(report: &Report, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"])
                .add_row(vec!["operation", report.operation])
                .add_row(vec!["status", report.status]);
            if let Some(value) = &report.value {
                table.add_row(vec!["value", value.as_str()]);
            }
            if !report.flags.is_empty() {
                table.add_row(vec!["flags".to_string(), report.flags.join(",")]);
            }
            if let Some(size) = report.size {
                table.add_row(vec!["size".to_string(), size.to_string()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let mut line = format!("{} status={}", report.operation, report.status);
            if let Some(value) = &report.value {
                line.push_str(&format!(" value={value}"));
            }
            if !report.flags.is_empty() {
                line.push_str(&format!(" flags={}", report.flags.join(",")));
            }
            if let Some(size) = report.size {
                line.push_str(&format!(" size={size}"));
            }
            println!("{line}");
        }
        OutputFormat::Raw => {
            if let Some(value) = &report.value {
                print_raw(value.as_bytes());
            }
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

pub fn preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}
