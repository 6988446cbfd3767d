use crate::bridge::BackgroundEvent;
use crate::config::Settings;
use crate::coordinator::Coordinator;
use crate::error::AppError;
use crate::ui::{confirm, dashboard, sidebar};
use std::sync::Arc;

pub struct SenderSweepApp {
    coordinator: Coordinator,
    event_rx: async_channel::Receiver<BackgroundEvent>,
    backend_url: String,
}

impl SenderSweepApp {
    pub fn new(cc: &eframe::CreationContext<'_>, settings: &Settings) -> Result<Self, AppError> {
        let ctx = cc.egui_ctx.clone();
        let bridge = crate::bridge::setup_bridge(settings, Arc::new(move || ctx.request_repaint()))?;

        let mut coordinator = Coordinator::new(bridge.cmd_tx);
        // Show whatever the backend already has from an earlier scan.
        coordinator.refresh();

        Ok(Self {
            coordinator,
            event_rx: bridge.event_rx,
            backend_url: settings.backend_url.to_string(),
        })
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            self.coordinator.apply(event);
        }
    }
}

impl eframe::App for SenderSweepApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();

        let prompting = self.coordinator.confirmation_prompt().is_some();

        egui::SidePanel::left("sidebar")
            .resizable(true)
            .default_width(250.0)
            .show(ctx, |ui| {
                ui.add_enabled_ui(!prompting, |ui| {
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        sidebar::draw_sidebar(ui, &mut self.coordinator, &self.backend_url);
                    });
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_enabled_ui(!prompting, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    dashboard::draw_dashboard(ui, &mut self.coordinator);
                });
            });
        });

        confirm::draw_confirm(ctx, &mut self.coordinator);
    }
}
