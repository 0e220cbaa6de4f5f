use plotters::prelude::*;

use crate::error::ChartError;
use crate::models::AlertCondition;
use crate::services::market_data::Series;
use crate::services::trendline;

const CHART_SIZE: (u32, u32) = (900, 480);

fn chart_err<E: std::fmt::Display>(e: E) -> ChartError {
    ChartError::Backend(e.to_string())
}

/// Renders a daily close line with the alert's overlay (target level, SMA
/// line, or anchored trend line) to SVG bytes. Callers treat any error as
/// best-effort: log and move on, never touch alert state.
pub fn render_alert_chart(
    ticker: &str,
    series: &Series,
    condition: &AlertCondition,
) -> Result<Vec<u8>, ChartError> {
    if series.is_empty() {
        return Err(ChartError::EmptySeries(ticker.to_string()));
    }

    let closes: Vec<(f64, f64)> = series
        .iter()
        .enumerate()
        .map(|(i, c)| (i as f64, c.close))
        .collect();

    let (overlay, overlay_label) = overlay_points(series, condition);

    let mut y_min = f64::MAX;
    let mut y_max = f64::MIN;
    for &(_, p) in closes.iter().chain(overlay.iter()) {
        y_min = y_min.min(p);
        y_max = y_max.max(p);
    }
    let pad = ((y_max - y_min) * 0.05).max(0.5);
    let (y_min, y_max) = (y_min - pad, y_max + pad);
    let x_max = (series.len() - 1).max(1) as f64;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(ticker, ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(36)
            .y_label_area_size(56)
            .build_cartesian_2d(0f64..x_max, y_min..y_max)
            .map_err(chart_err)?;

        chart
            .configure_mesh()
            .x_labels(8)
            .x_label_formatter(&|x| {
                series
                    .get(x.round() as usize)
                    .map(|c| c.date.format("%m-%d").to_string())
                    .unwrap_or_default()
            })
            .draw()
            .map_err(chart_err)?;

        chart
            .draw_series(LineSeries::new(closes.iter().copied(), &BLUE))
            .map_err(chart_err)?
            .label("close")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], BLUE));

        if !overlay.is_empty() {
            chart
                .draw_series(LineSeries::new(overlay.iter().copied(), &RED))
                .map_err(chart_err)?
                .label(overlay_label)
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], RED));
        }

        chart
            .configure_series_labels()
            .border_style(BLACK)
            .background_style(WHITE.mix(0.8))
            .draw()
            .map_err(chart_err)?;

        root.present().map_err(chart_err)?;
    }

    Ok(svg.into_bytes())
}

fn overlay_points(series: &Series, condition: &AlertCondition) -> (Vec<(f64, f64)>, String) {
    match condition {
        AlertCondition::Price { target_price, .. } => {
            let line = (0..series.len())
                .map(|i| (i as f64, *target_price))
                .collect();
            (line, format!("target {target_price:.2}"))
        }
        AlertCondition::Sma { period, .. } => {
            let period = *period as usize;
            if period == 0 || series.len() < period {
                return (Vec::new(), String::new());
            }
            let closes: Vec<f64> = series.iter().map(|c| c.close).collect();
            let line = (period - 1..closes.len())
                .map(|i| {
                    let window = &closes[i + 1 - period..=i];
                    (i as f64, window.iter().sum::<f64>() / period as f64)
                })
                .collect();
            (line, format!("SMA({period})"))
        }
        AlertCondition::CustomLine {
            date1,
            price1,
            date2,
            price2,
            ..
        } => {
            let line = series
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    (
                        i as f64,
                        trendline::project(*date1, *price1, *date2, *price2, c.date),
                    )
                })
                .collect();
            (line, "trend line".to_string())
        }
    }
}
