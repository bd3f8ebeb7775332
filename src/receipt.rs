use chrono::{DateTime, Local, NaiveDate, TimeZone};

use crate::common::{ASSOCIATION_ADDRESS, ASSOCIATION_NAME, PAYMENT_METHOD};
use crate::table::FinancialRecord;

/// Local wall clock as `YYYYMMDDHHMMSS`.
pub fn receipt_number<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format("%Y%m%d%H%M%S").to_string()
}

pub fn next_receipt_number() -> String {
    receipt_number(&Local::now())
}

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// ISO dates read as `DD Mon YYYY`; anything else is shown as stored.
fn display_date(raw: &str) -> String {
    match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
        Ok(date) => date.format("%d %b %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

fn display_amount(amount: Option<f64>) -> String {
    amount.map(|a| a.to_string()).unwrap_or_default()
}

pub fn receipt_subject(record: &FinancialRecord) -> String {
    format!(
        "Payment Received: {} - {}",
        record.receipt_no.as_deref().unwrap_or_default(),
        record.name.as_deref().unwrap_or_default()
    )
}

/// HTML receipt for one stored payment. `generated_on` is printed in the footer.
pub fn render_receipt(record: &FinancialRecord, generated_on: &str) -> String {
    let text = |value: &Option<String>| escape_html(value.as_deref().unwrap_or_default());
    let row = |label: &str, value: &str| {
        format!(
            r#"<tr>
<td style="padding: 10px 0; color: #64748b; font-size: 12px; text-transform: uppercase;">{}</td>
<td style="padding: 10px 0; text-align: right; color: #0f172a; font-weight: bold;">{}</td>
</tr>"#,
            label, value
        )
    };

    let date = escape_html(&display_date(record.date.as_deref().unwrap_or_default()));
    let rows = [
        row("Received From", &text(&record.name)),
        row("Date of Payment", &date),
        row("Payment For", &text(&record.forthe_month)),
        row("Payment Method", PAYMENT_METHOD),
    ]
    .join("\n");

    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; border: 1px solid #e2e8f0; padding: 20px; background-color: #ffffff;">
<div style="text-align: center; padding-bottom: 20px; border-bottom: 2px solid #0f172a;">
<h1 style="color: #0f172a; margin: 0; font-size: 24px;">{name}</h1>
<p style="color: #64748b; margin: 5px 0 0; font-size: 14px;">{address}</p>
<h2 style="color: #b45309; margin: 20px 0 0; text-transform: uppercase; letter-spacing: 2px;">Receipt</h2>
<p style="font-family: monospace; color: #334155; margin: 5px 0; font-weight: bold;">#{receipt_no}</p>
</div>
<div style="padding: 30px 0;">
<table style="width: 100%; border-collapse: collapse;">
{rows}
</table>
<div style="background-color: #f8fafc; border: 1px dashed #e2e8f0; padding: 20px; text-align: center; margin: 20px 0;">
<div style="color: #64748b; font-size: 12px; text-transform: uppercase; letter-spacing: 1px; margin-bottom: 5px;">Amount Paid</div>
<div style="color: #0f172a; font-size: 32px; font-weight: bold;">&#8377;{amount}</div>
</div>
<div style="margin-top: 20px;">
<div style="color: #64748b; font-size: 12px; text-transform: uppercase; font-weight: bold;">Remarks</div>
<div style="color: #334155; font-style: italic; margin-top: 5px;">{remarks}</div>
</div>
</div>
<div style="text-align: center; border-top: 1px solid #e2e8f0; padding-top: 20px; margin-top: 20px;">
<p style="color: #64748b; font-size: 12px; font-style: italic; margin: 0;">This is a <strong style="color: #b45309;">System Generated Receipt</strong>. No signature is required.</p>
<p style="color: #94a3b8; font-size: 10px; margin-top: 5px; font-family: monospace;">Generated on: {generated_on}</p>
</div>
</div>"#,
        name = ASSOCIATION_NAME,
        address = ASSOCIATION_ADDRESS,
        receipt_no = text(&record.receipt_no),
        rows = rows,
        amount = display_amount(record.amount),
        remarks = text(&record.remarks),
        generated_on = escape_html(generated_on),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record() -> FinancialRecord {
        FinancialRecord {
            id: 1,
            name: Some("Tom & Jerry <Traders>".to_string()),
            receipt_no: Some("20240105093000".to_string()),
            date: Some("2024-01-05".to_string()),
            amount: Some(500.0),
            forthe_month: Some("January".to_string()),
            remarks: Some("\"paid\"".to_string()),
        }
    }

    #[test]
    fn receipt_numbers_are_fourteen_digits() {
        let at = Utc.with_ymd_and_hms(2024, 1, 5, 9, 30, 0).unwrap();
        assert_eq!(receipt_number(&at), "20240105093000");

        let next = next_receipt_number();
        assert_eq!(next.len(), 14);
        assert!(next.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn values_are_escaped() {
        let html = render_receipt(&record(), "05/01/2024, 09:30:00");
        assert!(html.contains("Tom &amp; Jerry &lt;Traders&gt;"));
        assert!(html.contains("&quot;paid&quot;"));
        assert!(!html.contains("<Traders>"));
    }

    #[test]
    fn dates_and_amounts_are_formatted() {
        let html = render_receipt(&record(), "now");
        assert!(html.contains("05 Jan 2024"));
        assert!(html.contains("&#8377;500<"));
        assert!(html.contains("#20240105093000"));
        assert!(html.contains(PAYMENT_METHOD));

        assert_eq!(display_date("last week"), "last week");
        assert_eq!(display_amount(Some(250.5)), "250.5");
        assert_eq!(display_amount(None), "");
    }

    #[test]
    fn subject_names_receipt_and_payer() {
        assert_eq!(
            receipt_subject(&record()),
            "Payment Received: 20240105093000 - Tom & Jerry <Traders>"
        );
    }
}
