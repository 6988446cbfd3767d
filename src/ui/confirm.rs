use crate::coordinator::Coordinator;

/// Modal prompt guarding every delete. Nothing is sent unless "Delete" is clicked.
pub fn draw_confirm(ctx: &egui::Context, coordinator: &mut Coordinator) {
    let Some(prompt) = coordinator.confirmation_prompt() else {
        return;
    };

    let mut confirmed = None;
    egui::Window::new("Confirm delete")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label(prompt);
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui
                    .button(egui::RichText::new("Delete").color(egui::Color32::RED))
                    .clicked()
                {
                    confirmed = Some(true);
                }
                if ui.button("Cancel").clicked() {
                    confirmed = Some(false);
                }
            });
        });

    if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        confirmed = Some(false);
    }

    match confirmed {
        Some(true) => {
            coordinator.confirm_delete();
        }
        Some(false) => coordinator.cancel_delete(),
        None => {}
    }
}
