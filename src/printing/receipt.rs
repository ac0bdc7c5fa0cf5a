//! Renders a stored bill into the 48-column restaurant receipt, either as
//! ESC/POS bytes or as a plain-text preview. Amounts come from the bill
//! row verbatim: a reprint must match the original issuance even if the
//! menu or tax configuration changed since.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use super::escpos::{Align, EscPos};
use crate::services::{billing::BillResponse, orders::OrderLineResponse};

const RECEIPT_WIDTH: usize = 48;
const ITEM_NAME_WIDTH: usize = 20;
const ITEM_HEADER: &str = "Item Name                   Qty    Price    Amount";
const TAX_HEADER: &str = "Tax Type          Taxable Amt    Tax Amt";
const FOOTER: &str = "Thank you for your visit!";

// Bills display in Indian Standard Time regardless of server zone.
const IST_OFFSET_SECS: i64 = 5 * 3600 + 30 * 60;

/// Renders the ESC/POS byte stream for a bill.
pub fn render_escpos(bill: &BillResponse, lines: &[OrderLineResponse]) -> Vec<u8> {
    let (date, time) = ist_date_time(bill.bill_date);

    let mut p = EscPos::new()
        .init()
        .align(Align::Center)
        .font_size(1)
        .bold(true)
        .text(&bill.restaurant_name)
        .newline()
        .font_size(0)
        .bold(false)
        .text(&bill.address)
        .newline()
        .text(&format!("State: {} ({})", bill.state, bill.state_code))
        .newline()
        .text(&format!("Phone: {}", bill.phone))
        .newline()
        .text(&format!("GSTIN: {}", bill.gstin))
        .newline()
        .text(&format!("FSSAI: {}", bill.fssai))
        .newline()
        .align(Align::Left)
        .text(&separator())
        .newline()
        .align(Align::Center)
        .bold(true)
        .text("Tax Invoice")
        .newline()
        .bold(false)
        .align(Align::Left)
        .text(payment_label(&bill.payment_method))
        .newline()
        .text("Place of Supply:")
        .newline()
        .text(&bill.place_of_supply)
        .newline()
        .text(&format!("Date: {}", date))
        .newline()
        .text(&format!("Time: {}", time))
        .newline()
        .text(&format!("Invoice no: {}", bill.invoice_number))
        .newline()
        .text(&separator())
        .newline()
        .text(ITEM_HEADER)
        .newline()
        .text(&separator())
        .newline();

    for line in lines {
        p = p.text(&item_row(line)).newline();
    }

    p = p
        .text(&separator())
        .newline()
        .text(&amount_row("Subtotal", bill.subtotal))
        .newline();

    if bill.tax_rate > Decimal::ZERO {
        p = p.text(&amount_row("Taxes", bill.tax_amount)).newline();
    }

    p = p
        .bold(true)
        .text(&amount_row("Total", bill.total))
        .newline()
        .bold(false)
        .text(&separator())
        .newline();

    if bill.tax_rate > Decimal::ZERO {
        p = p
            .text(TAX_HEADER)
            .newline()
            .text(&separator())
            .newline()
            .text(&gst_row(bill))
            .newline()
            .text(&separator())
            .newline();
    }

    p.align(Align::Center)
        .newline()
        .text(FOOTER)
        .newline()
        .feed(3)
        .cut()
        .build()
}

/// Renders the same layout as plain text for print previews.
pub fn render_text(bill: &BillResponse, lines: &[OrderLineResponse]) -> String {
    let (date, time) = ist_date_time(bill.bill_date);
    let mut out = Vec::new();

    out.push(center(&bill.restaurant_name));
    out.push(center(&bill.address));
    out.push(center(&format!("State: {} ({})", bill.state, bill.state_code)));
    out.push(center(&format!("Phone: {}", bill.phone)));
    out.push(center(&format!("GSTIN: {}", bill.gstin)));
    out.push(center(&format!("FSSAI: {}", bill.fssai)));
    out.push(separator());
    out.push(center("Tax Invoice"));
    out.push(payment_label(&bill.payment_method).to_string());
    out.push("Place of Supply:".to_string());
    out.push(bill.place_of_supply.clone());
    out.push(format!("Date: {}", date));
    out.push(format!("Time: {}", time));
    out.push(format!("Invoice no: {}", bill.invoice_number));
    out.push(separator());
    out.push(ITEM_HEADER.to_string());
    out.push(separator());

    for line in lines {
        out.push(item_row(line));
    }

    out.push(separator());
    out.push(amount_row("Subtotal", bill.subtotal));
    if bill.tax_rate > Decimal::ZERO {
        out.push(amount_row("Taxes", bill.tax_amount));
    }
    out.push(amount_row("Total", bill.total));
    out.push(separator());

    if bill.tax_rate > Decimal::ZERO {
        out.push(TAX_HEADER.to_string());
        out.push(separator());
        out.push(gst_row(bill));
        out.push(separator());
    }

    out.push(String::new());
    out.push(center(FOOTER));
    out.push(String::new());

    out.join("\n")
}

fn ist_date_time(at: DateTime<Utc>) -> (String, String) {
    let local = at + Duration::seconds(IST_OFFSET_SECS);
    let date = local.format("%d/%m/%Y").to_string();
    let time = local.format("%I:%M %p").to_string().to_lowercase();
    (date, time)
}

fn separator() -> String {
    "-".repeat(RECEIPT_WIDTH)
}

fn center(text: &str) -> String {
    let len = text.chars().count();
    if len >= RECEIPT_WIDTH {
        return text.to_string();
    }
    let pad = (RECEIPT_WIDTH - len) / 2;
    format!("{}{}", " ".repeat(pad), text)
}

fn payment_label(method: &str) -> &'static str {
    match method {
        "card" => "Card Sale",
        "digital" => "Digital Sale",
        _ => "Cash Sale",
    }
}

fn item_row(line: &OrderLineResponse) -> String {
    let name: String = line.name.chars().take(ITEM_NAME_WIDTH).collect();
    format!(
        "{:<width$} x{}    {:.2}    {:.2}",
        name,
        line.quantity,
        line.unit_price,
        line.line_total,
        width = ITEM_NAME_WIDTH
    )
}

fn amount_row(label: &str, amount: Decimal) -> String {
    format!("{:<40}{:.2}", label, amount)
}

fn gst_row(bill: &BillResponse) -> String {
    let percent = (bill.tax_rate * Decimal::from(100)).trunc().normalize();
    let gst_label = format!("GST@{}%", percent);
    format!("{:<18}{:.2}      {:.2}", gst_label, bill.subtotal, bill.tax_amount)
}
