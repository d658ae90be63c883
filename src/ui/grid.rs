use eframe::egui::{self, Align, Color32, Layout, RichText, Ui};
use egui_extras::{Column as GridColumn, TableBuilder};

use tabsift::data::model::{CellValue, ColumnKind};

use crate::state::AppState;

const ROW_HEIGHT: f32 = 20.0;

enum GridAction {
    BeginEdit(usize, usize),
    Commit,
    Cancel,
}

// ---------------------------------------------------------------------------
// Data grid (central panel)
// ---------------------------------------------------------------------------

/// Render the filtered view as an editable table. Double-click a cell to
/// edit it; Enter or clicking elsewhere commits, Escape cancels.
pub fn data_grid(ui: &mut Ui, state: &mut AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Please upload a CSV/EXCEL file  (File → Open…)");
        });
        return;
    }

    ui.heading("Data:");

    let AppState {
        view,
        editing,
        color_map,
        config,
        ..
    } = state;
    let n_rows = view.len();
    let n_cols = view.columns().len();
    let mut action: Option<GridAction> = None;

    egui::ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(Layout::left_to_right(Align::Center))
            .column(GridColumn::auto().at_least(40.0))
            .columns(GridColumn::initial(120.0).at_least(40.0).clip(true), n_cols)
            .min_scrolled_height(0.0)
            .max_scroll_height(config.table_height)
            .header(ROW_HEIGHT, |mut header| {
                header.col(|ui| {
                    ui.strong("#");
                });
                for column in view.columns() {
                    header.col(|ui| {
                        ui.strong(&column.name)
                            .on_hover_text(column.kind.to_string());
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, n_rows, |mut row| {
                    let r = row.index();
                    row.col(|ui| {
                        ui.weak(r.to_string());
                    });

                    for (c, column) in view.columns().iter().enumerate() {
                        row.col(|ui| {
                            if let Some(edit) = editing.as_mut().filter(|e| e.row == r && e.col == c) {
                                let resp = ui.add(
                                    egui::TextEdit::singleline(&mut edit.text)
                                        .desired_width(f32::INFINITY),
                                );
                                if edit.fresh {
                                    resp.request_focus();
                                    edit.fresh = false;
                                }
                                if resp.lost_focus() {
                                    action = if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
                                        Some(GridAction::Cancel)
                                    } else {
                                        Some(GridAction::Commit)
                                    };
                                }
                                return;
                            }

                            let value = &column.values[r];
                            let mut text = match value {
                                CellValue::Null => RichText::new("").weak(),
                                other => RichText::new(other.to_string()),
                            };
                            if column.kind == ColumnKind::Categorical {
                                if let Some(cm) = color_map.as_ref().filter(|cm| cm.column == column.name) {
                                    text = text.color(cm.color_for(value));
                                }
                            }
                            if column.kind == ColumnKind::Numeric {
                                text = text.monospace();
                            }
                            let resp = ui.add(egui::Label::new(text).sense(egui::Sense::click()));
                            if resp.double_clicked() {
                                action = Some(GridAction::BeginEdit(r, c));
                            }
                        });
                    }
                });
            });
    });

    if n_rows == 0 {
        ui.label(RichText::new("No rows match the current filters.").color(Color32::GRAY));
    }

    match action {
        Some(GridAction::BeginEdit(r, c)) => {
            // Clicking another cell commits the one being edited first.
            state.commit_edit();
            state.begin_edit(r, c);
        }
        Some(GridAction::Commit) => state.commit_edit(),
        Some(GridAction::Cancel) => state.editing = None,
        None => {}
    }
}
