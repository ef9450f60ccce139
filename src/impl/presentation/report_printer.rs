use crate::entities::{Anomaly, BudgetSummary, LedgerStats};

use super::utils::{format_amount, format_percentage};

const WRAP_WIDTH: usize = 74;

/// Plain-text transparency report for a single budget.
pub(crate) struct ReportPrinter;

impl ReportPrinter {
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) fn print_report(
        &self,
        summary: &BudgetSummary,
        active_anomalies: &[Anomaly],
        ledger: &LedgerStats,
    ) -> String {
        let mut output = String::new();

        output.push_str(&format!("# {}\n\n", summary.name));

        output.push_str(
            "; --- Summary ------------------------------------------------------------------\n\n",
        );
        self.print_summary(&mut output, summary);
        output.push_str("\n\n");

        output.push_str(
            "; --- Departments --------------------------------------------------------------\n\n",
        );
        self.print_departments(&mut output, summary);
        output.push_str("\n\n");

        output.push_str(
            "; --- Active anomalies ---------------------------------------------------------\n\n",
        );
        self.print_anomalies(&mut output, active_anomalies);
        output.push_str("\n\n");

        output.push_str(
            "; --- Ledger -------------------------------------------------------------------\n\n",
        );
        self.print_ledger(&mut output, ledger);

        output
    }

    fn print_summary(&self, output: &mut String, summary: &BudgetSummary) {
        let c = summary.currency;
        let rows = [
            ("Total budget", format_amount(summary.total_budget, c)),
            ("Spent", format_amount(summary.spent, c)),
            ("Remaining", format_amount(summary.remaining, c)),
            ("Unallocated", format_amount(summary.unallocated, c)),
            ("Utilization", format_percentage(summary.utilization)),
        ];
        for (label, value) in rows {
            output.push_str(&format!("{:20} {:>24}\n", label, value));
        }
    }

    fn print_departments(&self, output: &mut String, summary: &BudgetSummary) {
        if summary.departments.is_empty() {
            output.push_str("(none)\n");
            return;
        }
        let c = summary.currency;
        output.push_str(&format!(
            "{:24} {:>16} {:>16} {:>16}\n",
            "Department", "Allocated", "Spent", "Remaining"
        ));
        let sorted = {
            let mut v: Vec<_> = summary.departments.iter().collect();
            v.sort_by(|a, b| a.name.cmp(&b.name));
            v
        };
        for d in sorted {
            output.push_str(&format!(
                "{:24} {:>16} {:>16} {:>16}\n",
                d.name,
                format_amount(d.allocated, c),
                format_amount(d.spent, c),
                format_amount(d.remaining, c),
            ));
        }
    }

    fn print_anomalies(&self, output: &mut String, anomalies: &[Anomaly]) {
        if anomalies.is_empty() {
            output.push_str("(none)\n");
            return;
        }
        for anomaly in anomalies {
            output.push_str(&format!(
                "[{}] {} ({}, {})\n",
                anomaly.severity.to_string().to_uppercase(),
                anomaly.title,
                anomaly.status,
                anomaly.detected_at.format("%Y-%m-%d %H:%M"),
            ));
            for line in textwrap::wrap(&anomaly.description, WRAP_WIDTH - 4) {
                output.push_str(&format!("    {}\n", line));
            }
        }
    }

    fn print_ledger(&self, output: &mut String, ledger: &LedgerStats) {
        output.push_str(&format!("{:20} {}\n", "Blocks", ledger.total_blocks));
        output.push_str(&format!("{:20} {}\n", "Records", ledger.total_transactions));
        output.push_str(&format!("{:20} {}\n", "Pending", ledger.pending_transactions));
        output.push_str(&format!(
            "{:20} {}\n",
            "Integrity",
            if ledger.is_chain_valid { "verified" } else { "BROKEN" }
        ));
        output.push_str(&format!("{:20} {}\n", "Last block", ledger.last_block_hash));
    }
}
