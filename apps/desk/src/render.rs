//! Plain-text presentation of the status line and the order snapshot.

use client_core::{SnapshotView, Status};
use shared::domain::Order;

const HEADERS: [&str; 7] = ["#", "ID", "Instrument", "Way", "Price", "Qty", "Executed"];

pub fn render_status(status: &Status) -> Option<String> {
    match status {
        Status::None => None,
        Status::Success(message) => Some(format!("ok: {message}")),
        Status::Error(message) => Some(format!("error: {message}")),
    }
}

pub fn render_snapshot(view: SnapshotView<'_>) -> String {
    match view {
        SnapshotView::NotLoaded => "Order list not loaded.".to_string(),
        SnapshotView::Empty => "No orders found.".to_string(),
        SnapshotView::Unavailable(reason) => format!("Order list unavailable: {reason}"),
        SnapshotView::Orders(orders) => render_table(orders),
    }
}

pub fn render_order(order: &Order) -> String {
    format!(
        "order {id}: {way} {qty} {instrument} @ {price} ({state})",
        id = order.id,
        way = order.way,
        qty = order.qty,
        instrument = order.instrument,
        price = order.price,
        state = if order.is_executed { "executed" } else { "open" },
    )
}

// The leading position column is display only; actions take the ID column.
fn render_table(orders: &[Order]) -> String {
    let rows: Vec<[String; 7]> = orders
        .iter()
        .enumerate()
        .map(|(position, order)| {
            [
                position.to_string(),
                order.id.to_string(),
                order.instrument.clone(),
                order.way.to_string(),
                order.price.to_string(),
                order.qty.to_string(),
                if order.is_executed { "Yes" } else { "No" }.to_string(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(format_row(HEADERS.iter().copied(), &widths));
    for row in &rows {
        lines.push(format_row(row.iter().map(String::as_str), &widths));
    }
    lines.join("\n")
}

fn format_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize; 7]) -> String {
    cells
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}", width = *width))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}
