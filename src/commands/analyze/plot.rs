use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::info;

use super::report::{CategoryOrder, ordered_categorical_sort};
use crate::model::ReportRecord;

pub static MODEL_DISPLAY_ORDER: [&str; 4] = ["BERT", "SBERT", "Ditto", "SupCon"];
pub static MASKING_DISPLAY_ORDER: [&str; 4] = ["off", "semantic", "syntax", "random"];

static MODEL_COLORS: [RGBColor; 4] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
];

const SINGLE_PLOT_SIZE: (u32, u32) = (600, 400);
const PAIR_PLOT_SIZE: (u32, u32) = (1200, 400);
const LABEL_FONT: (&str, i32) = ("sans-serif", 14);

/// Box plot of F1 by masking condition and model for one encoding.
pub fn save_masking_plot(records: &[ReportRecord], encoding: &str, path: &Path) -> Result<()> {
    let root = SVGBackend::new(path, SINGLE_PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    draw_boxplot_panel(&root, records, encoding, None, true, true)?;
    root.present()?;

    info!(path = %path.display(), encoding, "wrote masking box plot");
    Ok(())
}

/// The sent-pair and attr-pair panels side by side, sharing the y-axis range,
/// with one legend below both.
pub fn save_masking_pair_plot(records: &[ReportRecord], path: &Path) -> Result<()> {
    let root = SVGBackend::new(path, PAIR_PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let (panel_strip, legend_strip) = root.split_vertically((PAIR_PLOT_SIZE.1 - 50) as i32);
    let panels = panel_strip.split_evenly((1, 2));
    draw_boxplot_panel(&panels[0], records, "sent_pair", Some("Sent-pair"), true, false)?;
    draw_boxplot_panel(&panels[1], records, "attr_pair", Some("Attr-pair"), false, false)?;
    draw_shared_legend(&legend_strip)?;
    root.present()?;

    info!(path = %path.display(), "wrote paired masking box plot");
    Ok(())
}

/// F1 samples grouped by (model rank, masking rank) for one encoding, in
/// display order. Errors if a record carries a category outside the rank
/// tables.
pub(super) fn grouped_f1(
    records: &[ReportRecord],
    encoding: &str,
) -> Result<BTreeMap<(usize, usize), Vec<f64>>> {
    let model_order = CategoryOrder::new(&MODEL_DISPLAY_ORDER);
    let masking_order = CategoryOrder::new(&MASKING_DISPLAY_ORDER);

    let selected: Vec<ReportRecord> = records
        .iter()
        .filter(|record| record.encoding == encoding)
        .cloned()
        .collect();
    let keyed = ordered_categorical_sort(selected, |record| {
        Ok((
            model_order.rank(&record.model)?,
            masking_order.rank(&record.masking)?,
        ))
    })?;

    let mut groups: BTreeMap<(usize, usize), Vec<f64>> = BTreeMap::new();
    for (key, record) in keyed {
        groups.entry(key).or_default().push(record.f1);
    }

    Ok(groups)
}

fn draw_boxplot_panel(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    records: &[ReportRecord],
    encoding: &str,
    title: Option<&str>,
    show_y_axis: bool,
    with_legend: bool,
) -> Result<()> {
    let groups = grouped_f1(records, encoding)?;

    let mut builder = ChartBuilder::on(area);
    builder
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(if show_y_axis { 55 } else { 0 });
    if let Some(title) = title {
        builder.caption(title, LABEL_FONT);
    }

    let mut chart =
        builder.build_cartesian_2d(MASKING_DISPLAY_ORDER[..].into_segmented(), 0f32..1f32)?;

    {
        let mut mesh = chart.configure_mesh();
        mesh.disable_x_mesh()
            .disable_y_mesh()
            .x_desc("masking")
            .axis_desc_style(LABEL_FONT)
            .label_style(LABEL_FONT);
        if show_y_axis {
            mesh.y_desc("F1");
        }
        mesh.draw()?;
    }

    for (model_rank, model) in MODEL_DISPLAY_ORDER.iter().enumerate() {
        let color = MODEL_COLORS[model_rank];
        let offset = (model_rank as f64 - 1.5) * 16.0;

        let boxes: Vec<_> = MASKING_DISPLAY_ORDER
            .iter()
            .enumerate()
            .filter_map(|(masking_rank, masking)| {
                groups.get(&(model_rank, masking_rank)).map(|values| {
                    let quartiles = Quartiles::new(values);
                    Boxplot::new_vertical(SegmentValue::CenterOf(masking), &quartiles)
                        .width(12)
                        .offset(offset)
                        .style(color.stroke_width(2))
                })
            })
            .collect();

        if boxes.is_empty() {
            continue;
        }

        let series = chart.draw_series(boxes)?;
        if with_legend {
            series.label(*model).legend(move |(x, y)| {
                Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
            });
        }
    }

    if with_legend {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .label_font(LABEL_FONT)
            .draw()?;
    }

    Ok(())
}

fn draw_shared_legend(area: &DrawingArea<SVGBackend<'_>, Shift>) -> Result<()> {
    let (width, _) = area.dim_in_pixel();
    let entry_width = 110_i32;
    let total_width = entry_width * MODEL_DISPLAY_ORDER.len() as i32;
    let mut x = (width as i32 - total_width) / 2;

    for (model_rank, model) in MODEL_DISPLAY_ORDER.iter().enumerate() {
        let color = MODEL_COLORS[model_rank];
        area.draw(&Rectangle::new([(x, 16), (x + 18, 30)], color.filled()))?;
        area.draw(&Text::new(*model, (x + 24, 16), LABEL_FONT.into_font()))?;
        x += entry_width;
    }

    Ok(())
}
