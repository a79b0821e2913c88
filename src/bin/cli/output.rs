//! Output formatting for CLI operations.

use serde_json::json;
use zipsession::EntryRecord;

/// Trait for output formatting
pub trait OutputFormatter {
    /// Formats a list of directory records
    fn format_list(&self, records: &[EntryRecord], technical: bool) -> String;
}

/// Human-readable output formatter
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn format_list(&self, records: &[EntryRecord], technical: bool) -> String {
        let mut output = String::new();

        // Header
        if technical {
            output.push_str(&format!(
                "{:>12} {:>12} {:>8} {:>10} {}\n",
                "Size", "Packed", "Method", "CRC", "Name"
            ));
        } else {
            output.push_str(&format!("{:>12} {}\n", "Size", "Name"));
        }
        output.push_str(&"-".repeat(70));
        output.push('\n');

        let mut total_size: u64 = 0;
        let mut file_count = 0;
        let mut dir_count = 0;

        for record in records {
            let size_str = if record.is_directory {
                dir_count += 1;
                String::new()
            } else {
                file_count += 1;
                total_size += record.size;
                humanize_bytes(record.size)
            };

            if technical {
                output.push_str(&format!(
                    "{:>12} {:>12} {:>8} {:>10} {}\n",
                    size_str,
                    humanize_bytes(record.compressed_size),
                    method_name(record.method),
                    format!("{:08X}", record.crc32),
                    record.name
                ));
            } else {
                output.push_str(&format!("{:>12} {}\n", size_str, record.name));
            }
        }

        // Footer
        output.push_str(&"-".repeat(70));
        output.push('\n');
        output.push_str(&format!(
            "{} files, {} directories, {} total\n",
            file_count,
            dir_count,
            humanize_bytes(total_size)
        ));

        output
    }
}

/// JSON output formatter
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_list(&self, records: &[EntryRecord], _technical: bool) -> String {
        let items: Vec<_> = records
            .iter()
            .map(|r| {
                json!({
                    "name": r.name,
                    "size": r.size,
                    "compressed_size": r.compressed_size,
                    "crc32": r.crc32,
                    "method": method_name(r.method),
                    "is_directory": r.is_directory,
                })
            })
            .collect();

        serde_json::to_string_pretty(&items).unwrap_or_else(|_| "[]".to_string())
    }
}

/// Creates the appropriate formatter based on output format
pub fn create_formatter(format: super::OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        super::OutputFormat::Human => Box::new(HumanFormatter),
        super::OutputFormat::Json => Box::new(JsonFormatter),
    }
}

fn method_name(method: u16) -> String {
    match method {
        0 => "Stored".to_string(),
        8 => "Deflate".to_string(),
        other => format!("#{}", other),
    }
}

/// Converts bytes to a human-readable string
pub fn humanize_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
