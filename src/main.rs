//! Plexus demo application
//!
//! Builds a clustered sample network, embeds the viewer widget, and wires
//! the tooltip plus an event log so every engine event is visible.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use eframe::egui;
use rand::Rng;

use plexus::graph::{EdgeInput, NetworkData, NodeInput};
use plexus::viewer::TooltipSink;
use plexus::{EventKind, NetworkViewer, NodeInfo, ViewerEvent, ViewerOptions};

const CLUSTER_COLORS: [&str; 5] = ["#4c9be8", "#e8744c", "#58b368", "#b15dca", "#e8c04c"];

/// Generates a clustered sample network with weighted edges.
fn sample_network() -> NetworkData {
    let mut rng = rand::rng();
    let mut nodes = Vec::new();
    let mut edges = Vec::new();

    let clusters = 5;
    let per_cluster = 24;
    for cluster in 0..clusters {
        let angle = cluster as f32 / clusters as f32 * std::f32::consts::TAU;
        let center = (angle.cos() * 300.0, angle.sin() * 300.0);
        for i in 0..per_cluster {
            let id = format!("n{cluster}-{i}");
            let mut attributes = HashMap::new();
            attributes.insert(
                "cluster".to_string(),
                serde_json::Value::from(cluster as u64),
            );
            nodes.push(NodeInput {
                label: Some(format!("Node {cluster}.{i}")),
                id,
                x: Some(center.0 + rng.random_range(-120.0..120.0)),
                y: Some(center.1 + rng.random_range(-120.0..120.0)),
                position: None,
                size: Some(rng.random_range(1.0..8.0)),
                color: Some(CLUSTER_COLORS[cluster].to_string()),
                attributes,
            });
        }
        // Dense links inside the cluster, sparse links across.
        for _ in 0..per_cluster * 2 {
            let a = rng.random_range(0..per_cluster);
            let b = rng.random_range(0..per_cluster);
            if a == b {
                continue;
            }
            edges.push(EdgeInput {
                source: format!("n{cluster}-{a}"),
                target: format!("n{cluster}-{b}"),
                weight: Some(rng.random_range(1.0..4.0)),
                color: None,
                attributes: HashMap::new(),
            });
        }
        let other = (cluster + 1) % clusters;
        edges.push(EdgeInput {
            source: format!("n{cluster}-0"),
            target: format!("n{other}-0"),
            weight: Some(4.0),
            color: None,
            attributes: HashMap::new(),
        });
    }

    NetworkData {
        nodes: Some(nodes),
        edges: Some(edges),
    }
}

struct TooltipDisplay {
    text: String,
    pos: egui::Pos2,
}

/// Tooltip collaborator: stores show/hide requests for the app to draw.
struct SharedTooltip(Rc<RefCell<Option<TooltipDisplay>>>);

impl TooltipSink for SharedTooltip {
    fn show(&mut self, _node: &NodeInfo, text: &str, screen_pos: egui::Pos2) {
        *self.0.borrow_mut() = Some(TooltipDisplay {
            text: text.to_string(),
            pos: screen_pos,
        });
    }

    fn hide(&mut self) {
        *self.0.borrow_mut() = None;
    }
}

/// Demo application state.
struct ViewerApp {
    viewer: NetworkViewer,
    event_log: Rc<RefCell<Vec<String>>>,
    tooltip: Rc<RefCell<Option<TooltipDisplay>>>,
}

impl ViewerApp {
    fn new() -> Result<Self, plexus::ViewerError> {
        let mut options = ViewerOptions::default();
        options.tooltip_attributes = vec!["cluster".to_string()];
        options.log = true;

        let mut viewer = NetworkViewer::new(sample_network(), options)?;

        let tooltip = Rc::new(RefCell::new(None));
        viewer.set_tooltip(Box::new(SharedTooltip(Rc::clone(&tooltip))));

        let event_log = Rc::new(RefCell::new(Vec::new()));
        let push = |log: &Rc<RefCell<Vec<String>>>, line: String| {
            let mut log = log.borrow_mut();
            log.push(line);
            if log.len() > 200 {
                log.remove(0);
            }
        };
        {
            let log = Rc::clone(&event_log);
            viewer.on(EventKind::NodeSelect, move |event| {
                if let ViewerEvent::NodeSelect(node) = event {
                    push(&log, format!("select {} ({} links)", node.id, node.links.len()));
                }
            });
        }
        {
            let log = Rc::clone(&event_log);
            viewer.on(EventKind::NodeOver, move |event| {
                if let ViewerEvent::NodeOver(node) = event {
                    push(&log, format!("over {}", node.id));
                }
            });
        }
        {
            let log = Rc::clone(&event_log);
            viewer.on(EventKind::NodeOut, move |event| {
                if let ViewerEvent::NodeOut(node) = event {
                    push(&log, format!("out {}", node.id));
                }
            });
        }
        {
            let log = Rc::clone(&event_log);
            viewer.on(EventKind::Zoom, move |event| {
                if let ViewerEvent::Zoom(info) = event {
                    push(&log, format!("zoom {:.2}x", info.scale));
                }
            });
        }

        Ok(Self {
            viewer,
            event_log,
            tooltip,
        })
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("hud").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Plexus");
                ui.separator();
                let info = self.viewer.transform_info();
                ui.label(format!("Zoom: {:.1}x", info.scale));
                ui.label(format!("Pan: ({:.0}, {:.0})", info.tx, info.ty));
                ui.separator();
                ui.label(format!(
                    "{} nodes / {} edges",
                    self.viewer.graph().node_count(),
                    self.viewer.graph().edge_count()
                ));
                ui.separator();
                if ui.button("Reset zoom").clicked() {
                    let now = ui.input(|i| i.time);
                    self.viewer.reset_zoom(now);
                }
                if ui.button("Highlight bridges").clicked() {
                    let ids: Vec<String> = (0..5).map(|c| format!("n{c}-0")).collect();
                    self.viewer.highlight(&ids);
                }
                if ui.button("Clear highlight").clicked() {
                    self.viewer.highlight::<&str>(&[]);
                }
            });
        });

        egui::SidePanel::right("events")
            .default_width(200.0)
            .show(ctx, |ui| {
                ui.heading("Events");
                ui.separator();
                let log = self.event_log.borrow();
                for line in log.iter().rev().take(24) {
                    ui.label(line);
                }
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.viewer.ui(ui);

            // Draw whatever the tooltip sink last received.
            if let Some(display) = &*self.tooltip.borrow() {
                egui::Area::new(egui::Id::new("node_tooltip"))
                    .fixed_pos(display.pos + egui::vec2(12.0, 12.0))
                    .show(ctx, |ui| {
                        egui::Frame::popup(ui.style()).show(ui, |ui| {
                            ui.label(&display.text);
                        });
                    });
            }
        });
    }
}

/// Application entry point.
fn main() -> Result<(), eframe::Error> {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1100.0, 760.0]),
        renderer: eframe::Renderer::Wgpu,
        ..Default::default()
    };

    eframe::run_native(
        "Plexus",
        options,
        Box::new(|_cc| Ok(Box::new(ViewerApp::new().expect("sample network is valid")))),
    )
}
