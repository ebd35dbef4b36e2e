//! Terminal rendering for the one-shot CLI commands

use std::fmt::Write;

use backend_models::{Customer, Order};
use colored::Colorize;

use crate::aggregate::{aggregate_global, DashboardView, FactoryDefinition, StatusCounts};
use crate::hub::connection::ConnectionState;
use crate::notifications::orders::order_events;
use crate::roster::{Machine, RosterSnapshot};
use crate::status::MachineStatus;

/// Status tiles grouped by factory
pub fn render_status(
    roster: &RosterSnapshot,
    factories: &[FactoryDefinition],
    connection: ConnectionState,
) -> String {
    let view = DashboardView::build(roster, factories);
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} hub {} | roster v{} | {}",
        "mokamon".bold(),
        connection.as_str(),
        roster.version,
        render_counts(&aggregate_global(roster))
    );

    for aggregate in &view.factories {
        let _ = writeln!(
            out,
            "\n{} {}",
            aggregate.factory.name.bold(),
            render_counts(&aggregate.counts)
        );
        for machine in roster.machines.iter().filter(|m| aggregate.factory.contains(m)) {
            let _ = writeln!(out, "  {}", render_tile(machine));
        }
    }

    let unassigned: Vec<&Machine> = roster
        .machines
        .iter()
        .filter(|m| !factories.iter().any(|f| f.contains(m)))
        .collect();
    if !unassigned.is_empty() {
        let _ = writeln!(out, "\n{}", "Unassigned".bold());
        for machine in unassigned {
            let _ = writeln!(out, "  {}", render_tile(machine));
        }
    }
    out
}

fn render_tile(machine: &Machine) -> String {
    let status = machine.status;
    let badge = format!("[{}]", status.label()).color(status.color().to_terminal());
    let mut line = format!("{} {} ({})", badge, machine.name, machine.key);
    if let Some(error) = &machine.error {
        let _ = write!(line, " - {}", error.red());
    }
    line
}

fn render_counts(counts: &StatusCounts) -> String {
    MachineStatus::ALL
        .iter()
        .map(|status| {
            format!("{} {}", counts.get(*status), status.label().to_lowercase())
                .color(status.color().to_terminal())
                .to_string()
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Order table with the recent-orders event log on top
pub fn render_orders(orders: &[Order], customers: &[Customer]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "Recent orders".bold());
    for event in order_events(orders, customers) {
        let time = event
            .time
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "  {:<5} {:<16} {:<24} {}",
            event.severity, time, event.source, event.message
        );
    }

    let _ = writeln!(out, "\n{} ({})", "All orders".bold(), orders.len());
    for order in orders {
        let _ = writeln!(
            out,
            "  #{:<6} customer {:<6} {} machines, {} lot(s)",
            order.id,
            order.customer_id,
            order.machine_count(),
            order.lots.len()
        );
    }
    out
}

pub fn render_customers(customers: &[Customer]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", "Customers".bold(), customers.len());
    for customer in customers {
        let _ = writeln!(
            out,
            "  #{:<6} {:<24} {}",
            customer.id,
            customer.name,
            customer.email.as_deref().unwrap_or("-")
        );
    }
    out
}
