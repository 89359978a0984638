use time::OffsetDateTime;
use time::macros::format_description;

pub const ORDER_SOURCE: &str = "UNKNOWN";
pub const ORDER_CHANNEL: &str = "QR_ORDER";

// Column C of the worksheet holds the design identifier.
const DESIGN_COLUMN: usize = 2;

/// Linear scan of the ledger rows. A row counts as a match only when it
/// reaches the design column.
pub fn is_design_logged(rows: &[Vec<String>], design: &str) -> bool {
    rows.iter()
        .any(|row| row.get(DESIGN_COLUMN).is_some_and(|cell| cell == design))
}

pub fn order_row(design: &str, timestamp: &str) -> Vec<String> {
    vec![
        ORDER_SOURCE.to_string(),
        ORDER_CHANNEL.to_string(),
        design.to_string(),
        timestamp.to_string(),
    ]
}

/// `YYYY-MM-DD HH:MM:SS`, in the local offset when the platform can
/// determine one.
pub fn order_timestamp() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    now.format(&format)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}
