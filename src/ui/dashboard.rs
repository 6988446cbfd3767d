use crate::coordinator::Coordinator;
use crate::state::{SortKey, TrackState};
use egui::Ui;

pub fn draw_dashboard(ui: &mut Ui, coordinator: &mut Coordinator) {
    // Error display
    if let Some(err) = &coordinator.state().error_message {
        ui.colored_label(egui::Color32::RED, format!("Error: {}", err));
        ui.add_space(4.0);
    }

    draw_progress(ui, coordinator);

    if coordinator.state().senders.is_empty() {
        if !coordinator.state().scan.is_running() {
            ui.centered_and_justified(|ui| {
                ui.label("No senders yet. Pick a label and click Start Scan.");
            });
        }
        return;
    }

    // Metrics row
    ui.horizontal(|ui| {
        let frame = egui::Frame::default()
            .inner_margin(8.0)
            .corner_radius(4.0)
            .fill(ui.visuals().faint_bg_color);

        frame.show(ui, |ui| {
            ui.vertical(|ui| {
                ui.label("Marketing Emails");
                ui.heading(coordinator.state().total_messages().to_string());
            });
        });

        frame.show(ui, |ui| {
            ui.vertical(|ui| {
                ui.label("Unique Senders");
                ui.heading(coordinator.state().unique_senders().to_string());
            });
        });
    });

    ui.add_space(8.0);
    ui.separator();
    ui.add_space(4.0);

    ui.horizontal(|ui| {
        ui.label("Filter by domain");
        let mut filter = coordinator.state().domain_filter.clone();
        if ui
            .add(egui::TextEdit::singleline(&mut filter).hint_text("example.com"))
            .changed()
        {
            coordinator.set_filter(filter);
        }
    });

    ui.add_space(4.0);
    draw_results_table(ui, coordinator);
}

fn draw_progress(ui: &mut Ui, coordinator: &Coordinator) {
    let state = coordinator.state();

    match &state.scan {
        TrackState::Running { .. } => {
            ui.heading("Scanning...");
            ui.add(
                egui::ProgressBar::new(state.scan.progress_fraction())
                    .text(&state.scan_status),
            );
            ui.add_space(8.0);
        }
        TrackState::Completed | TrackState::Failed(_) => {
            ui.label(&state.scan_status);
            ui.add_space(4.0);
        }
        TrackState::Idle => {}
    }

    match &state.delete {
        TrackState::Running { percent } => {
            ui.heading("Deleting...");
            ui.add(
                egui::ProgressBar::new(state.delete.progress_fraction())
                    .text(format!("{} ({percent}%)", state.delete_status)),
            );
            ui.add_space(8.0);
        }
        TrackState::Completed => {
            ui.label(&state.delete_status);
            ui.add_space(4.0);
        }
        TrackState::Idle | TrackState::Failed(_) => {}
    }
}

fn header_text(coordinator: &Coordinator, key: SortKey) -> String {
    let sort = coordinator.state().sort;
    if sort.key == key {
        format!("{} {}", key.label(), sort.direction.arrow())
    } else {
        key.label().to_string()
    }
}

fn draw_results_table(ui: &mut Ui, coordinator: &mut Coordinator) {
    let deleting = coordinator.state().delete.is_running();
    let mut sort_clicked = None;
    let mut delete_clicked = None;

    {
        let rows = coordinator.visible_rows();
        let current_key = coordinator.state().sort.key;

        egui_extras::TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .column(egui_extras::Column::remainder().at_least(200.0))
            .column(egui_extras::Column::initial(200.0))
            .column(egui_extras::Column::initial(140.0))
            .column(egui_extras::Column::initial(70.0))
            .column(egui_extras::Column::initial(70.0))
            .header(20.0, |mut header| {
                for key in SortKey::ALL {
                    header.col(|ui| {
                        let text = header_text(coordinator, key);
                        if ui.selectable_label(current_key == key, text).clicked() {
                            sort_clicked = Some(key);
                        }
                    });
                }
                header.col(|ui| {
                    ui.strong("");
                });
            })
            .body(|body| {
                body.rows(22.0, rows.len(), |mut row| {
                    let idx = row.index();
                    if let Some(sender) = rows.get(idx) {
                        row.col(|ui| {
                            ui.label(sender.sender);
                        });
                        row.col(|ui| {
                            ui.label(sender.email);
                        });
                        row.col(|ui| {
                            ui.label(sender.domain);
                        });
                        row.col(|ui| {
                            ui.label(sender.count.to_string());
                        });
                        row.col(|ui| {
                            if ui
                                .add_enabled(!deleting, egui::Button::new("Delete"))
                                .clicked()
                            {
                                delete_clicked = Some(sender.sender.to_string());
                            }
                        });
                    }
                });
            });
    }

    if let Some(key) = sort_clicked {
        coordinator.select_sort(key);
    }
    if let Some(sender) = delete_clicked {
        coordinator.request_delete(sender);
    }
}
