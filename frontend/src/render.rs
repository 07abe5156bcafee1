//! Allocated-vs-used core-hour chart rendering.

use anyhow::{bail, Result};
use itertools::Itertools as _;
use plotters::prelude::*;

use report_data::{CadencePolicy, MachinePolicies};

use crate::parse::UsageRow;

const CHART_TITLE: &str = "HPC Core Hour Usage";
const FONT_FAMILY: &str = "sans-serif";
/// Width of one bar as a fraction of a row's slot.
const BAR_WIDTH: f64 = 0.3;

#[allow(non_snake_case)]
const fn TITLE_FONT_SIZE((w, h): (u32, u32)) -> u32 {
    let avg = w + h / 2;
    avg / 28
}

/// Draw a green (allocated) and a red (used) bar per row, in row order,
/// onto any plotters backend. Rows that carry a testing-hours figure get
/// a third, yellow bar. Machines on an annual cycle are flagged with `*`
/// in the axis label.
pub fn usage_chart<DB>(backend: DB, rows: &[UsageRow], policies: &MachinePolicies) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    if rows.is_empty() {
        bail!("nothing to visualize: no records");
    }

    let has_testing = rows.iter().any(|row| row.testing_hours.is_some());
    let series_count = if has_testing { 3 } else { 2 };
    let bar_left = move |slot: usize, series: usize| {
        slot as f64 + 0.5 - series_count as f64 * BAR_WIDTH / 2.0 + series as f64 * BAR_WIDTH
    };

    let max_hours = rows
        .iter()
        .map(|row| {
            row.record
                .adjusted_alloc_hours
                .max(row.record.used_core_hours)
                .max(row.testing_hours.unwrap_or(0))
        })
        .max()
        .unwrap_or(1)
        .max(1);
    let labels = rows
        .iter()
        .map(|row| {
            let flag = match policies.policy_for(&row.record.machine) {
                CadencePolicy::Annual { .. } => "*",
                CadencePolicy::Monthly => "",
            };
            format!("{}{} / {}", row.record.machine, flag, row.record.account)
        })
        .collect_vec();

    let drawing_area = backend.into_drawing_area();
    drawing_area.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&drawing_area)
        .caption(
            CHART_TITLE,
            (FONT_FAMILY, TITLE_FONT_SIZE(drawing_area.dim_in_pixel())).into_font(),
        )
        .margin(5)
        .x_label_area_size(80)
        .y_label_area_size(80)
        .build_cartesian_2d(0f64..rows.len() as f64, 0f64..max_hours as f64 * 1.1)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(rows.len() + 1)
        .x_label_formatter(&|x| {
            labels
                .get(x.floor() as usize)
                .cloned()
                .unwrap_or_default()
        })
        .y_desc("Core Hours")
        .label_style((FONT_FAMILY, 12).into_font())
        .draw()?;

    chart
        .draw_series(rows.iter().enumerate().map(|(i, row)| {
            let left = bar_left(i, 0);
            Rectangle::new(
                [(left, 0.0), (left + BAR_WIDTH, row.record.adjusted_alloc_hours as f64)],
                GREEN.filled(),
            )
        }))?
        .label("Allocated Hours")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], GREEN.filled()));

    chart
        .draw_series(rows.iter().enumerate().map(|(i, row)| {
            let left = bar_left(i, 1);
            Rectangle::new(
                [(left, 0.0), (left + BAR_WIDTH, row.record.used_core_hours as f64)],
                RED.filled(),
            )
        }))?
        .label("Used Hours")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], RED.filled()));

    if has_testing {
        chart
            .draw_series(rows.iter().enumerate().map(|(i, row)| {
                let left = bar_left(i, 2);
                Rectangle::new(
                    [(left, 0.0), (left + BAR_WIDTH, row.testing_hours.unwrap_or(0) as f64)],
                    YELLOW.filled(),
                )
            }))?
            .label("Hours from testing")
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], YELLOW.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font((FONT_FAMILY, 14).into_font())
        .draw()?;

    drawing_area.present()?;

    Ok(())
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use report_data::{AccountId, MachineId, UsageRecord};

    fn row(machine: &str, allocated: u64, used: u64, testing: Option<u64>) -> UsageRow {
        UsageRow {
            record: UsageRecord {
                account: AccountId("UFSM0001".into()),
                machine: MachineId(machine.into()),
                period_start: NaiveDate::from_ymd_opt(2021, 10, 1).unwrap(),
                period_end: NaiveDate::from_ymd_opt(2022, 9, 30).unwrap(),
                initial_alloc_hours: None,
                adjusted_alloc_hours: allocated,
                used_core_hours: used,
                fair_share: 0.0,
            },
            testing_hours: testing,
        }
    }

    #[test]
    fn usage_chart__renders_svg_with_both_series() {
        let rows = vec![row("Cheyenne", 650_000, 312_456, None), row("Gaea", 1_200_000, 845_210, None)];
        let policies = MachinePolicies::with_defaults();
        let mut buffer = String::new();
        usage_chart(SVGBackend::with_string(&mut buffer, (800, 600)), &rows, &policies).unwrap();
        assert!(buffer.contains("<svg"));
        assert!(buffer.contains("Allocated Hours"));
        assert!(buffer.contains("Used Hours"));
        // No testing figures anywhere, so no third series either.
        assert!(!buffer.contains("Hours from testing"));
    }

    #[test]
    fn usage_chart__testing_hours_add_a_third_series() {
        let rows = vec![
            row("Cheyenne", 650_000, 312_456, Some(48_210)),
            row("Gaea", 1_200_000, 845_210, None),
        ];
        let policies = MachinePolicies::with_defaults();
        let mut buffer = String::new();
        usage_chart(SVGBackend::with_string(&mut buffer, (800, 600)), &rows, &policies).unwrap();
        assert!(buffer.contains("Hours from testing"));
    }

    #[test]
    fn usage_chart__annual_cycle_machines_are_flagged_in_the_label() {
        let rows = vec![row("Cheyenne", 650_000, 312_456, None), row("Gaea", 1_200_000, 845_210, None)];
        let policies = MachinePolicies::with_defaults();
        let mut buffer = String::new();
        usage_chart(SVGBackend::with_string(&mut buffer, (800, 600)), &rows, &policies).unwrap();
        assert!(buffer.contains("Cheyenne* / UFSM0001"));
        assert!(buffer.contains("Gaea / UFSM0001"));
    }

    #[test]
    fn usage_chart__empty_input_is_an_error() {
        let policies = MachinePolicies::with_defaults();
        let mut buffer = String::new();
        let result = usage_chart(SVGBackend::with_string(&mut buffer, (800, 600)), &[], &policies);
        assert!(result.is_err());
    }
}
