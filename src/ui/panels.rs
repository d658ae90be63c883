use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use tabsift::data::filter::{BoolChoice, ColumnFilter};
use tabsift::data::widget::{FilterControl, FilterWidget};

use crate::color::ColorMap;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Right side panel – filter widgets
// ---------------------------------------------------------------------------

/// What a click in the filter panel asks the state to do once the
/// controls are no longer borrowed.
enum PanelAction {
    SelectAll(String),
    SelectNone(String),
    ColorBy(String),
    Reset,
}

/// Render the filter panel into `ui`.
pub fn filter_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    if state.dataset.is_none() {
        ui.label("Open a file to see possible filters.");
        return;
    }

    if let Some(err) = &state.filter_error {
        ui.label(RichText::new(err).color(Color32::RED));
        ui.separator();
    }

    let mut action: Option<PanelAction> = None;
    let mut changed = false;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Colour-by selector (categorical columns only) ----
            let categorical: Vec<String> = state
                .controls
                .iter()
                .filter(|c| matches!(c.widget, FilterWidget::MultiSelect { .. }))
                .map(|c| c.column.clone())
                .collect();
            if !categorical.is_empty() {
                ui.strong("Color by");
                let current = state.color_column.clone().unwrap_or_default();
                egui::ComboBox::from_id_salt("color_by")
                    .selected_text(&current)
                    .show_ui(ui, |ui: &mut Ui| {
                        for col in &categorical {
                            if ui.selectable_label(current == *col, col).clicked() {
                                action = Some(PanelAction::ColorBy(col.clone()));
                            }
                        }
                    });
                ui.separator();
            }

            if ui.small_button("Reset all filters").clicked() {
                action = Some(PanelAction::Reset);
            }
            ui.add_space(4.0);

            // ---- Per-column filter widgets ----
            let color_map = state.color_map.as_ref();
            for control in &mut state.controls {
                let colors = color_map.filter(|cm| cm.column == control.column);
                let (edited, requested) = column_filter(ui, control, colors);
                changed |= edited;
                if requested.is_some() {
                    action = requested;
                }
            }
        });

    match action {
        Some(PanelAction::SelectAll(col)) => state.select_all(&col),
        Some(PanelAction::SelectNone(col)) => state.select_none(&col),
        Some(PanelAction::ColorBy(col)) => state.set_color_column(col),
        Some(PanelAction::Reset) => state.reset_filters(),
        None => {}
    }

    // One recomputation per interaction, not per frame.
    if changed {
        state.refilter();
    }
}

/// Draw the widget for one column inside `ui`. Returns whether the filter
/// value changed, plus any action that needs the whole state.
fn column_filter(
    ui: &mut Ui,
    control: &mut FilterControl,
    colors: Option<&ColorMap>,
) -> (bool, Option<PanelAction>) {
    let mut changed = false;
    let mut action = None;
    let column = control.column.clone();

    match (&control.widget, &mut control.filter) {
        (FilterWidget::MultiSelect { options }, ColumnFilter::Membership(selected)) => {
            // Selected / total among the options still present
            let shown = options.iter().filter(|v| selected.contains(*v)).count();
            let header_text = format!("{column}  ({shown}/{})", options.len());
            egui::CollapsingHeader::new(RichText::new(header_text).strong())
                .id_salt(&column)
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    ui.horizontal(|ui: &mut Ui| {
                        if ui.small_button("All").clicked() {
                            action = Some(PanelAction::SelectAll(column.clone()));
                        }
                        if ui.small_button("None").clicked() {
                            action = Some(PanelAction::SelectNone(column.clone()));
                        }
                    });

                    for val in options {
                        let mut text = RichText::new(val.to_string());
                        if let Some(cm) = colors {
                            text = text.color(cm.color_for(val));
                        }
                        let mut checked = selected.contains(val);
                        if ui.checkbox(&mut checked, text).changed() {
                            if checked {
                                selected.insert(val.clone());
                            } else {
                                selected.remove(val);
                            }
                            changed = true;
                        }
                    }
                });
        }
        (FilterWidget::TriState, ColumnFilter::Boolean(choice)) => {
            ui.strong(format!("Values for {column}:"));
            ui.horizontal(|ui: &mut Ui| {
                for option in [BoolChoice::Both, BoolChoice::True, BoolChoice::False] {
                    changed |= ui
                        .radio_value(choice, option, option.to_string())
                        .changed();
                }
            });
        }
        (FilterWidget::RangeSlider { min, max, step }, ColumnFilter::Range { low, high }) => {
            ui.strong(format!("Values for {column}:"));
            if max > min {
                let (min, max) = (*min, *max);
                changed |= ui
                    .add(egui::Slider::new(low, min..=max).step_by(*step).text("from"))
                    .changed();
                changed |= ui
                    .add(egui::Slider::new(high, min..=max).step_by(*step).text("to"))
                    .changed();
                if *low > *high {
                    std::mem::swap(low, high);
                }
            } else {
                // A single observed value leaves nothing to slide over.
                ui.label(format!("all values = {min}"));
            }
        }
        (FilterWidget::TextInput, ColumnFilter::Pattern(pattern)) => {
            ui.strong(format!("Substring or regex in {column}:"));
            changed |= ui
                .add(egui::TextEdit::singleline(pattern).hint_text("no filter"))
                .changed();
        }
        (widget, filter) => {
            log::error!("Filter {filter:?} does not fit widget {widget:?} for '{column}'");
        }
    }
    ui.add_space(6.0);

    (changed, action)
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Clear cache").clicked() {
                state.clear_cache();
                ui.close_menu();
            }
            if ui.button("Quit").clicked() {
                ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
            }
        });

        ui.menu_button("Settings", |ui: &mut Ui| {
            if ui.button("Load settings…").clicked() {
                open_settings_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(ds), Some(name)) = (&state.dataset, &state.source_name) {
            ui.label(format!(
                "{name}: {} rows, {} visible",
                ds.len(),
                state.view.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open spreadsheet")
        .add_filter("Supported files", &["csv", "xlsx"])
        .add_filter("CSV", &["csv"])
        .add_filter("Excel", &["xlsx"])
        .pick_file();

    if let Some(path) = file {
        if let Err(e) = state.open_path(&path) {
            log::error!("Failed to load file: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

fn open_settings_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Load settings")
        .add_filter("TOML", &["toml"])
        .pick_file();

    if let Some(path) = file {
        match state.load_config(&path) {
            Ok(()) => state.status_message = None,
            Err(e) => {
                log::error!("Failed to load settings: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
