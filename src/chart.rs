use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;
use std::path::Path;

use crate::stats::{ApplicantCount, ApplicantYear, YearTotal};

const PIE_SIZE: (u32, u32) = (1100, 800);
const LINE_SIZE: (u32, u32) = (1100, 650);
const HOLE_RATIO: f64 = 0.4;

fn palette_rgb(idx: usize) -> RGBColor {
    let (r, g, b) = Palette99::pick(idx).to_backend_color().rgb;
    RGBColor(r, g, b)
}

fn draw_placeholder(area: &DrawingArea<SVGBackend<'_>, Shift>) -> Result<()> {
    let (width, height) = area.dim_in_pixel();
    area.draw(&Text::new(
        "No data",
        (width as i32 / 2 - 40, height as i32 / 2),
        ("sans-serif", 24).into_font().color(&BLACK.mix(0.6)),
    ))?;
    Ok(())
}

pub fn render_applicant_share(path: &Path, title: &str, counts: &[ApplicantCount]) -> Result<()> {
    let root = SVGBackend::new(path, PIE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let area = root.titled(title, ("sans-serif", 26).into_font())?;

    if counts.is_empty() {
        draw_placeholder(&area)?;
        root.present()
            .with_context(|| format!("Failed to write {:?}", path))?;
        return Ok(());
    }

    let (width, height) = area.dim_in_pixel();
    let center = (width as i32 / 2, height as i32 / 2);
    let radius = f64::from(width.min(height)) * 0.32;

    let sizes: Vec<f64> = counts.iter().map(|c| f64::from(c.count)).collect();
    let colors: Vec<RGBColor> = (0..counts.len()).map(palette_rgb).collect();
    let labels: Vec<String> = counts
        .iter()
        .map(|c| format!("{} ({})", c.applicant, c.count))
        .collect();

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.start_angle(-90.0);
    pie.label_style(("sans-serif", 13).into_font().color(&BLACK));
    area.draw(&pie)?;

    // Punch the hole last so it covers the inner part of every wedge.
    area.draw(&Circle::new(
        center,
        (radius * HOLE_RATIO) as i32,
        WHITE.filled(),
    ))?;

    root.present()
        .with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}

fn year_axis(years: impl Iterator<Item = i32> + Clone) -> Option<std::ops::Range<i32>> {
    let min = years.clone().min()?;
    let max = years.max()?;
    Some(min..max.max(min + 1))
}

fn count_axis(max: u32) -> std::ops::Range<u32> {
    0..(max + max / 10).max(1)
}

pub fn render_cumulative(path: &Path, title: &str, series: &[YearTotal]) -> Result<()> {
    let root = SVGBackend::new(path, LINE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let Some(x_range) = year_axis(series.iter().map(|t| t.year)) else {
        let area = root.titled(title, ("sans-serif", 26).into_font())?;
        draw_placeholder(&area)?;
        root.present()
            .with_context(|| format!("Failed to write {:?}", path))?;
        return Ok(());
    };
    let y_max = series.iter().map(|t| t.cumulative).max().unwrap_or(0);

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 26))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, count_axis(y_max))?;

    chart
        .configure_mesh()
        .x_desc("Year")
        .y_desc("Cumulative Patents")
        .draw()?;

    chart.draw_series(LineSeries::new(
        series.iter().map(|t| (t.year, t.cumulative)),
        &BLUE,
    ))?;
    chart.draw_series(
        series
            .iter()
            .map(|t| Circle::new((t.year, t.cumulative), 3, BLUE.filled())),
    )?;

    root.present()
        .with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}

pub fn render_cumulative_by_applicant(
    path: &Path,
    title: &str,
    rows: &[ApplicantYear],
) -> Result<()> {
    let root = SVGBackend::new(path, LINE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let Some(x_range) = year_axis(rows.iter().map(|r| r.year)) else {
        let area = root.titled(title, ("sans-serif", 26).into_font())?;
        draw_placeholder(&area)?;
        root.present()
            .with_context(|| format!("Failed to write {:?}", path))?;
        return Ok(());
    };
    let y_max = rows.iter().map(|r| r.cumulative).max().unwrap_or(0);

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, count_axis(y_max))?;

    chart
        .configure_mesh()
        .x_desc("Year")
        .y_desc("Cumulative Patents")
        .draw()?;

    for (i, (applicant, points)) in crate::stats::series_by_applicant(rows).into_iter().enumerate() {
        let color = Palette99::pick(i).mix(0.9);
        chart
            .draw_series(LineSeries::new(points, &color))?
            .label(applicant)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(("sans-serif", 12))
        .draw()?;

    root.present()
        .with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}
