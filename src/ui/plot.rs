use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::{self, Color32, RichText, Ui};
use egui_plot::{Bar, BarChart, Legend, MarkerShape, Plot, PlotPoint, PlotPoints, Points, Polygon};

use crate::color::CategoricalScale;
use crate::data::model::{Record, Value};
use crate::state::{AppState, ViewKind};
use crate::views::brush::{self, BrushScatter, UMAP_X, UMAP_Y};
use crate::views::charts::{
    embedding_tooltip, format_currency, CategoryDistribution, EmbeddingScatter, Histogram,
    SENIORITY,
};
use crate::views::linked::{LinkedRegionPair, INDUSTRY};

// ---------------------------------------------------------------------------
// Central panel dispatch
// ---------------------------------------------------------------------------

/// Render the active view in the central panel.
pub fn active_view(ui: &mut Ui, state: &mut AppState) {
    let Some(dash) = state.dashboard.as_mut() else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a data folder to load the dashboard  (File → Open folder…)");
        });
        return;
    };

    let kind = state.active_view;
    ui.heading(kind.title());
    ui.separator();

    let shown = match kind {
        ViewKind::Embedding => dash.embedding.as_ref().map(|v| embedding_plot(ui, v)),
        ViewKind::ScaledSalary => dash
            .scaled_salary
            .as_ref()
            .map(|v| histogram_plot(ui, "scaled_salary", "Scaled Mid Salary", v, false)),
        ViewKind::StateIndustries => dash.state_industries.as_mut().map(|v| state_map(ui, v)),
        ViewKind::Umap => dash
            .umap
            .as_mut()
            .map(|v| umap_plot(ui, v, &mut state.brush_origin)),
        ViewKind::SalaryDistribution => dash
            .salary
            .as_ref()
            .map(|v| histogram_plot(ui, "salary_dist", "Salary ($)", v, true)),
        ViewKind::ExperienceLevels => dash
            .experience
            .as_ref()
            .map(|v| distribution_plot(ui, "experience", "Experience", v)),
        ViewKind::WorkTypes => dash
            .work_type
            .as_ref()
            .map(|v| distribution_plot(ui, "work_type", "Work Type", v)),
        ViewKind::Regions => dash
            .region
            .as_ref()
            .map(|v| distribution_plot(ui, "region", "Region", v)),
    };

    if shown.is_none() {
        ui.label(RichText::new("This view's data could not be loaded.").color(Color32::RED));
    }
}

// ---------------------------------------------------------------------------
// Embedding scatter
// ---------------------------------------------------------------------------

fn marker_for(status: &str) -> MarkerShape {
    match status {
        "remote" => MarkerShape::Circle,
        "hybrid" => MarkerShape::Square,
        "on-site" => MarkerShape::Diamond,
        _ => MarkerShape::Cross,
    }
}

fn embedding_plot(ui: &mut Ui, view: &EmbeddingScatter) {
    let response = Plot::new("embedding_plot")
        .legend(Legend::default())
        .x_axis_label("Embedding X")
        .y_axis_label("Embedding Y")
        .show(ui, |plot_ui| {
            for (status, rows) in view.by_status() {
                // one series per (status, seniority) so each gets a single colour
                let mut series: BTreeMap<Value, Vec<[f64; 2]>> = BTreeMap::new();
                for rec in rows {
                    let (Some(x), Some(y)) = (rec.get_f64("x"), rec.get_f64("y")) else {
                        continue;
                    };
                    series
                        .entry(rec.value(SENIORITY).clone())
                        .or_default()
                        .push([x, y]);
                }
                for (seniority, pts) in series {
                    let color = view.scale.color_for(&seniority);
                    plot_ui.points(
                        Points::new(PlotPoints::new(pts))
                            .name(format!("seniority {seniority} · {status}"))
                            .shape(marker_for(&status))
                            .filled(true)
                            .radius(3.0)
                            .color(color),
                    );
                }
            }
        });

    let r = &response.response;
    if let Some(pos) = r.hover_pos() {
        if let Some(i) = nearest_point(&view.points.records, ("x", "y"), &response.transform, pos) {
            r.clone().on_hover_text(embedding_tooltip(&view.points.records[i]));
        }
    }
}

// ---------------------------------------------------------------------------
// Histograms
// ---------------------------------------------------------------------------

fn histogram_plot(ui: &mut Ui, id: &str, x_label: &str, view: &Histogram, currency: bool) {
    let bars: Vec<Bar> = view
        .buckets
        .iter()
        .map(|b| {
            let range = if currency {
                format!("{} – {}", format_currency(b.lo), format_currency(b.hi))
            } else {
                format!("{:.3} – {:.3}", b.lo, b.hi)
            };
            Bar::new((b.lo + b.hi) / 2.0, b.count as f64)
                .width(b.hi - b.lo)
                .fill(view.bar_color(b))
                .name(range)
        })
        .collect();

    ui.label(format!("{} rows binned", view.total()));
    Plot::new(id)
        .x_axis_label(x_label)
        .y_axis_label("Count")
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(
                BarChart::new(bars)
                    .element_formatter(Box::new(|bar, _chart| format!("{}\ncount: {}", bar.name, bar.value))),
            );
        });
}

// ---------------------------------------------------------------------------
// Category distributions
// ---------------------------------------------------------------------------

fn distribution_plot(ui: &mut Ui, id: &str, label: &str, view: &CategoryDistribution) {
    // Largest category on top: bar i sits at y = n - 1 - i.
    let n = view.bars.len();
    let labels: Vec<String> = view.bars.iter().map(|b| b.label.to_string()).collect();
    let bars: Vec<Bar> = view
        .bars
        .iter()
        .enumerate()
        .map(|(i, b)| {
            let avg = b.mean_salary.map(format_currency).unwrap_or_else(|| "–".into());
            Bar::new((n - 1 - i) as f64, b.count as f64)
                .width(0.8)
                .fill(b.color)
                .name(format!("{label}: {}\nAvg Salary: {avg}", b.label))
        })
        .collect();

    Plot::new(id)
        .x_axis_label("Number of Jobs")
        .y_axis_label(label)
        .allow_drag(false)
        .allow_scroll(false)
        .y_axis_formatter(move |mark, _range| category_tick(&labels, (n as f64 - 1.0) - mark.value))
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(
                BarChart::new(bars)
                    .horizontal()
                    .element_formatter(Box::new(|bar, _chart| format!("{}\nCount: {}", bar.name, bar.value))),
            );
        });
}

/// Label for a tick at category slot `slot`; blank between slots.
fn category_tick(labels: &[String], slot: f64) -> String {
    let pos = slot.round();
    if (slot - pos).abs() > 1e-6 || pos < 0.0 {
        return String::new();
    }
    labels.get(pos as usize).cloned().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// State tiles + industry chart
// ---------------------------------------------------------------------------

const TILE_COLUMNS: usize = 8;

fn state_map(ui: &mut Ui, pair: &mut LinkedRegionPair) {
    let mut clicked: Option<Value> = None;
    let selected = pair.selected().cloned();

    egui::Grid::new("state_tiles")
        .spacing([4.0, 4.0])
        .show(ui, |ui: &mut Ui| {
            for (i, region) in pair.map().regions.iter().enumerate() {
                let fill = pair.map().color_of(region);
                let is_selected = selected.as_ref() == Some(&region.id);
                let text_color = if fill.r() < 128 { Color32::WHITE } else { Color32::BLACK };
                let button = egui::Button::new(RichText::new(&region.name).color(text_color))
                    .fill(fill)
                    .stroke(if is_selected {
                        egui::Stroke::new(2.0, Color32::from_rgb(0xff, 0x7f, 0x0e))
                    } else {
                        egui::Stroke::new(1.0, Color32::WHITE)
                    })
                    .min_size(egui::vec2(110.0, 28.0));
                let hover = format!(
                    "State: {}\nMedian Salary: {}\n# Jobs: {}",
                    region.name,
                    region.median_salary.map(format_currency).unwrap_or_else(|| "–".into()),
                    region.n_jobs.map(|n| n.to_string()).unwrap_or_else(|| "–".into()),
                );
                if ui.add(button).on_hover_text(hover).clicked() {
                    clicked = Some(region.id.clone());
                }
                if (i + 1) % TILE_COLUMNS == 0 {
                    ui.end_row();
                }
            }
        });

    if let Some(id) = clicked {
        pair.select(id);
    }

    ui.separator();
    ui.heading("Top Industries in Selected State");
    let counts = pair.industry_counts();
    if counts.is_empty() {
        ui.label("Click a state to see its industries.");
        return;
    }
    ui.label(format!("{} postings", pair.visible_secondary_rows().len()));

    let labels: Vec<String> = counts.iter().map(|c| c.label.to_string()).collect();
    let domain: BTreeSet<Value> = counts.iter().map(|c| c.label.clone()).collect();
    let scale = CategoricalScale::generated(INDUSTRY, &domain);
    let bars: Vec<Bar> = counts
        .iter()
        .enumerate()
        .map(|(i, c)| {
            Bar::new(i as f64, c.count as f64)
                .width(0.8)
                .fill(scale.color_for(&c.label))
                .name(c.label.to_string())
        })
        .collect();

    Plot::new("industry_chart")
        .x_axis_label("Industry")
        .y_axis_label("Job Postings")
        .allow_drag(false)
        .allow_scroll(false)
        .x_axis_formatter(move |mark, _range| category_tick(&labels, mark.value))
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(
                BarChart::new(bars)
                    .element_formatter(Box::new(|bar, _chart| format!("{}\n# Jobs in State: {}", bar.name, bar.value))),
            );
        });
}

// ---------------------------------------------------------------------------
// UMAP scatter with brush
// ---------------------------------------------------------------------------

fn umap_plot(ui: &mut Ui, view: &mut BrushScatter, origin: &mut Option<[f64; 2]>) {
    ui.label("Drag to brush a region; click to clear.");

    // group by colour so each series is a single draw call
    let mut series: BTreeMap<[u8; 4], Vec<[f64; 2]>> = BTreeMap::new();
    for (i, rec) in view.table().records.iter().enumerate() {
        let (Some(x), Some(y)) = (rec.get_f64(UMAP_X), rec.get_f64(UMAP_Y)) else {
            continue;
        };
        series.entry(view.color_at(i).to_array()).or_default().push([x, y]);
    }
    let legend = view.scale.legend_entries();
    let brush_rect = view.brush().map(|b| (b.x, b.y));

    let response = Plot::new("umap_plot")
        .x_axis_label("UMAP Dimension 1")
        .y_axis_label("UMAP Dimension 2")
        .allow_drag(false)
        .allow_boxed_zoom(false)
        .show(ui, |plot_ui| {
            for (rgba, pts) in series {
                let color = Color32::from_rgba_premultiplied(rgba[0], rgba[1], rgba[2], rgba[3]);
                plot_ui.points(
                    Points::new(PlotPoints::new(pts))
                        .radius(3.5)
                        .filled(true)
                        .color(color.gamma_multiply(0.6)),
                );
            }
            if let Some(((x0, x1), (y0, y1))) = brush_rect {
                let corners = vec![[x0, y0], [x1, y0], [x1, y1], [x0, y1]];
                plot_ui.polygon(
                    Polygon::new(PlotPoints::new(corners))
                        .fill_color(Color32::from_rgba_unmultiplied(128, 128, 128, 40))
                        .stroke(egui::Stroke::new(1.0, Color32::GRAY)),
                );
            }
        });

    let to_data = |pos: egui::Pos2| response.transform.value_from_position(pos);
    let r = &response.response;
    if r.drag_started() {
        *origin = r.interact_pointer_pos().map(|p| {
            let v = to_data(p);
            [v.x, v.y]
        });
    }
    if r.dragged() {
        if let (Some(start), Some(p)) = (*origin, r.interact_pointer_pos()) {
            let end = to_data(p);
            view.set_brush((start[0], end.x), (start[1], end.y));
        }
    }
    if r.drag_stopped() {
        *origin = None;
    }
    if r.clicked() {
        view.clear_brush();
    }

    if let Some(pos) = r.hover_pos() {
        if let Some(i) = nearest_point(&view.table().records, (UMAP_X, UMAP_Y), &response.transform, pos) {
            r.clone().on_hover_text(brush::tooltip(&view.table().records[i]));
        }
    }

    ui.horizontal_wrapped(|ui: &mut Ui| {
        ui.strong("Experience Level:");
        for (label, color) in legend {
            ui.label(RichText::new(format!("● {label}")).color(color));
        }
    });
    let brushed = view.brushed_indices().len();
    if view.brush().is_some() {
        ui.label(format!("{brushed} of {} jobs in brush", view.table().len()));
    }
}

/// Index of the record drawn within 8 screen pixels of `pos`, if any.
fn nearest_point(
    records: &[Record],
    (x_field, y_field): (&str, &str),
    transform: &egui_plot::PlotTransform,
    pos: egui::Pos2,
) -> Option<usize> {
    const RADIUS: f32 = 8.0;
    records
        .iter()
        .enumerate()
        .filter_map(|(i, rec)| {
            let (x, y) = (rec.get_f64(x_field)?, rec.get_f64(y_field)?);
            let screen = transform.position_from_point(&PlotPoint::new(x, y));
            let d = screen.distance(pos);
            (d <= RADIUS).then_some((i, d))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_ticks_label_whole_slots_only() {
        let labels = vec!["Tech".to_string(), "Finance".to_string()];
        assert_eq!(category_tick(&labels, 0.0), "Tech");
        assert_eq!(category_tick(&labels, 1.0), "Finance");
        assert_eq!(category_tick(&labels, 0.5), "");
        assert_eq!(category_tick(&labels, 2.0), "");
        assert_eq!(category_tick(&labels, -1.0), "");
    }
}
