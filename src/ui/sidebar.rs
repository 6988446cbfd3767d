use crate::coordinator::Coordinator;
use egui::Ui;

pub fn draw_sidebar(ui: &mut Ui, coordinator: &mut Coordinator, backend_url: &str) {
    let scanning = coordinator.state().scan.is_running();

    ui.heading("Backend");
    ui.add_space(4.0);
    ui.label(egui::RichText::new(backend_url).monospace());

    ui.add_space(8.0);
    ui.separator();
    ui.add_space(4.0);

    ui.heading("Scan");
    ui.add_space(4.0);

    ui.label("Days");
    let mut days = coordinator.state().days.clone();
    if ui
        .add_enabled(!scanning, egui::TextEdit::singleline(&mut days).hint_text("30"))
        .changed()
    {
        coordinator.set_days(days);
    }

    ui.add_space(4.0);
    ui.label("Label");
    let mut label = coordinator.state().label.clone();
    if ui
        .add_enabled(!scanning, egui::TextEdit::singleline(&mut label).hint_text("INBOX"))
        .changed()
    {
        coordinator.set_label(label);
    }

    ui.add_space(8.0);

    if ui
        .add_enabled(!scanning, egui::Button::new("Start Scan"))
        .clicked()
    {
        coordinator.start_scan();
    }

    ui.add_space(8.0);
    ui.separator();
    ui.add_space(4.0);

    ui.horizontal(|ui| {
        if ui
            .add_enabled(coordinator.state().export_enabled, egui::Button::new("Export CSV"))
            .clicked()
        {
            coordinator.export();
        }
        if ui.button("Refresh").clicked() {
            coordinator.refresh();
        }
    });

    if let Some(notice) = &coordinator.state().notice {
        ui.add_space(4.0);
        ui.label(notice);
    }
}
