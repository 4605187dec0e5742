use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use cts_cli::pipeline::RunReport;
use cts_model::{AggregateWarning, DiseaseAggregate, OverallAggregate, TermStatus};

pub fn print_summary(report: &RunReport) {
    println!("Run date: {}", report.today);
    if !report.filters.is_empty() {
        let mut filters = Vec::new();
        if let Some(study_type) = report.filters.study_type {
            filters.push(format!("study type {study_type}"));
        }
        if let Some(sponsor_class) = report.filters.sponsor_class {
            filters.push(format!("sponsor {sponsor_class}"));
        }
        if let Some(date) = report.filters.completed_after {
            filters.push(format!("completed after {date}"));
        }
        println!("Filters: {}", filters.join(", "));
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Term"),
        header_cell("Status"),
        header_cell("Trials"),
        header_cell("Completed"),
        header_cell("With results"),
        header_cell("Mean months"),
        header_cell("Median months"),
        header_cell("Skipped"),
        header_cell("Warnings"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 2..table.column_count() {
        align_column(&mut table, index, CellAlignment::Right);
    }
    align_column(&mut table, 1, CellAlignment::Center);

    for aggregate in &report.terms {
        table.add_row(term_row(aggregate));
    }
    table.add_row(overall_row(&report.overall));
    println!("{table}");

    print_status_table(&report.overall);
    print_failures(report);
}

fn term_row(aggregate: &DiseaseAggregate) -> Vec<Cell> {
    let status = aggregate.term_status();
    if status == TermStatus::Failed {
        return vec![
            Cell::new(&aggregate.term),
            status_cell(status),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            count_cell(aggregate.warnings.len(), Color::Yellow),
        ];
    }
    let stats = &aggregate.duration_stats;
    vec![
        Cell::new(&aggregate.term),
        status_cell(status),
        Cell::new(aggregate.total_trials()),
        rate_cell(aggregate.completion_rate),
        rate_cell(aggregate.results_rate),
        months_cell(stats.count, stats.mean),
        months_cell(stats.count, stats.median),
        count_cell(aggregate.skipped_records, Color::Red),
        count_cell(aggregate.warnings.len(), Color::Yellow),
    ]
}

fn overall_row(overall: &OverallAggregate) -> Vec<Cell> {
    let stats = &overall.duration_stats;
    vec![
        Cell::new("OVERALL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(format!("{}/{} terms", overall.terms_with_trials, overall.terms))
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(overall.total_trials()).add_attribute(Attribute::Bold),
        rate_cell(overall.completion_rate).add_attribute(Attribute::Bold),
        rate_cell(overall.results_rate).add_attribute(Attribute::Bold),
        months_cell(stats.count, stats.mean).add_attribute(Attribute::Bold),
        months_cell(stats.count, stats.median).add_attribute(Attribute::Bold),
        count_cell(overall.skipped_records, Color::Red),
        count_cell(overall.warnings.len(), Color::Yellow),
    ]
}

fn print_status_table(overall: &OverallAggregate) {
    if overall.total_trials() == 0 {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Status"),
        header_cell("Trials"),
        header_cell("Phase"),
        header_cell("Trials"),
    ]);
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);

    let statuses: Vec<_> = overall.status_counts.iter().filter(|(_, n)| **n > 0).collect();
    let phases: Vec<_> = overall.phase_counts.iter().filter(|(_, n)| **n > 0).collect();
    for row in 0..statuses.len().max(phases.len()) {
        let mut cells = Vec::with_capacity(4);
        match statuses.get(row) {
            Some((status, count)) => {
                cells.push(Cell::new(status));
                cells.push(Cell::new(count));
            }
            None => cells.extend([Cell::new(""), Cell::new("")]),
        }
        match phases.get(row) {
            Some((phase, count)) => {
                cells.push(Cell::new(phase));
                cells.push(Cell::new(count));
            }
            None => cells.extend([Cell::new(""), Cell::new("")]),
        }
        table.add_row(cells);
    }
    println!();
    println!(
        "Distinct trials: {} ({} before de-duplication)",
        overall.total_trials(),
        overall.trials_before_dedup
    );
    println!("{table}");
}

fn print_failures(report: &RunReport) {
    if report.cancelled {
        eprintln!("Run cancelled; unfinished terms are reported as failed.");
    }
    let failures: Vec<_> = report
        .terms
        .iter()
        .filter(|aggregate| aggregate.query_failed)
        .collect();
    if failures.is_empty() {
        return;
    }
    eprintln!("Failed terms:");
    for aggregate in failures {
        let reason = aggregate.warnings.iter().find_map(|warning| match warning {
            AggregateWarning::QueryFailed { .. } => Some(warning.to_string()),
            _ => None,
        });
        match reason {
            Some(reason) => eprintln!("- {}: {reason}", aggregate.term),
            None => eprintln!("- {}", aggregate.term),
        }
    }
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn status_cell(status: TermStatus) -> Cell {
    match status {
        TermStatus::Succeeded => Cell::new(status.label()).fg(Color::Green),
        TermStatus::NoTrials => Cell::new(status.label()).fg(Color::Yellow),
        TermStatus::Failed => Cell::new(status.label())
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
    }
}

fn rate_cell(rate: f64) -> Cell {
    Cell::new(format!("{:.1}%", rate * 100.0))
}

/// Duration statistics are meaningless without any durations.
fn months_cell(count: usize, months: f64) -> Cell {
    if count == 0 {
        dim_cell("-")
    } else {
        Cell::new(format!("{months:.1}"))
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
