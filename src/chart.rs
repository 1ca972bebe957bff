//! Interactive controller for one parcats trace.
//!
//! `ParcatsChart` owns the model, the latest layout and the retained scene.
//! The host forwards trace-local pointer input; everything the outside world
//! needs to hear about leaves through an [`EventSink`].

use std::sync::mpsc::Sender;

use serde::Serialize;

use crate::config::Config;
use crate::interaction::{
    Hit, PointRef, Selection, SelectionKind, Tooltip, band_tooltip, hit_test, path_tooltip,
    select_band, select_path,
};
use crate::ir::{FigureLayout, HoverMode, Model, PathKey};
use crate::layout::{BandRef, TraceView, compute_trace_view};
use crate::reorder::{
    ClickTarget, DragContext, RestyleUpdate, begin_drag, cancel_drag, drag_move, end_drag,
};
use crate::scene::Scene;

/// Pointer position in trace-local pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pointer {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointsEvent {
    pub points: Vec<PointRef>,
    pub pointer: Pointer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ChartEvent {
    Hover(PointsEvent),
    Unhover(PointsEvent),
    Click(PointsEvent),
    ShowTooltip(Tooltip),
    HideTooltip,
    /// The host may animate from the drag pose to the rest layout.
    Settle { duration_ms: u32 },
    Restyle(RestyleUpdate),
}

pub trait EventSink {
    fn emit(&mut self, event: ChartEvent);
}

impl<F: FnMut(ChartEvent)> EventSink for F {
    fn emit(&mut self, event: ChartEvent) {
        self(event)
    }
}

impl EventSink for Sender<ChartEvent> {
    fn emit(&mut self, event: ChartEvent) {
        if self.send(event).is_err() {
            tracing::debug!("event receiver dropped");
        }
    }
}

impl EventSink for Vec<ChartEvent> {
    fn emit(&mut self, event: ChartEvent) {
        self.push(event);
    }
}

#[derive(Debug, Clone, PartialEq)]
struct PressedPath {
    key: PathKey,
    origin: Pointer,
    moved: bool,
}

pub struct ParcatsChart<S: EventSink> {
    model: Model,
    config: Config,
    figure: FigureLayout,
    trace_index: usize,
    view: TraceView,
    scene: Scene,
    drag: Option<DragContext>,
    hover: Option<Selection>,
    pressed_path: Option<PressedPath>,
    sink: S,
}

impl<S: EventSink> ParcatsChart<S> {
    pub fn new(model: Model, config: Config, figure: FigureLayout, trace_index: usize, sink: S) -> Self {
        let view = compute_trace_view(&model, &figure, &config.layout, None);
        let scene = Scene::new(&view);
        Self {
            model,
            config,
            figure,
            trace_index,
            view,
            scene,
            drag: None,
            hover: None,
            pressed_path: None,
            sink,
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn view(&self) -> &TraceView {
        &self.view
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Replaces the model, e.g. after the owner applied a restyle.
    pub fn set_model(&mut self, model: Model) {
        self.abandon_gestures();
        self.model = model;
        self.relayout();
    }

    pub fn set_figure(&mut self, figure: FigureLayout) {
        self.abandon_gestures();
        self.figure = figure;
        self.relayout();
    }

    pub fn relayout(&mut self) {
        let drag_dimension = self.drag.as_ref().map(|d| d.dimension_ind);
        self.view = compute_trace_view(&self.model, &self.figure, &self.config.layout, drag_dimension);
        self.scene.sync(&self.view);
    }

    fn abandon_gestures(&mut self) {
        if let Some(drag) = self.drag.take() {
            cancel_drag(&mut self.model, drag);
        }
        self.pressed_path = None;
        if self.hover.take().is_some() {
            self.scene.clear_emphasis();
            self.scene.sort_paths_by_color();
            self.sink.emit(ChartEvent::HideTooltip);
        }
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        let pointer = Pointer { x, y };
        if let Some(drag) = self.drag.as_mut() {
            drag_move(&mut self.model, &self.view, drag, x, y);
            self.relayout();
            return;
        }
        if let Some(pressed) = self.pressed_path.as_mut() {
            if pressed.origin != pointer {
                pressed.moved = true;
            }
        }

        let paint_order = self.scene.paint_order(&self.view);
        let next = match hit_test(&self.view, &paint_order, x, y) {
            Some(Hit::Band(at)) => select_band(&self.view, at, self.view.hovermode),
            Some(Hit::Path(idx)) => select_path(&self.view, idx, self.view.hovermode),
            None => None,
        };
        let unchanged = match (&self.hover, &next) {
            (Some(current), Some(next)) => current.kind == next.kind,
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return;
        }
        self.exit_hover(pointer);
        if let Some(selection) = next {
            self.enter_hover(selection, pointer);
        }
    }

    pub fn pointer_leave(&mut self) {
        if self.drag.is_some() {
            return;
        }
        self.pressed_path = None;
        self.exit_hover(Pointer { x: -1.0, y: -1.0 });
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        if self.drag.is_some() {
            return;
        }
        if let Some(drag) = begin_drag(&mut self.model, &self.view, &self.config.layout, x, y) {
            self.exit_hover(Pointer { x, y });
            self.drag = Some(drag);
            self.relayout();
            return;
        }
        let paint_order = self.scene.paint_order(&self.view);
        if let Some(Hit::Path(idx)) = hit_test(&self.view, &paint_order, x, y) {
            self.pressed_path = Some(PressedPath {
                key: self.view.paths[idx].key.clone(),
                origin: Pointer { x, y },
                moved: false,
            });
        }
    }

    pub fn pointer_up(&mut self, x: f32, y: f32) {
        let pointer = Pointer { x, y };
        if let Some(mut drag) = self.drag.take() {
            // A release away from the last move still counts as movement.
            if drag.pointer() != (x, y) {
                drag_move(&mut self.model, &self.view, &mut drag, x, y);
            }
            let outcome = end_drag(&mut self.model, drag, self.trace_index, &self.config.layout);
            self.relayout();
            if let Some(target) = outcome.click {
                self.emit_band_click(target, pointer);
            }
            if let Some(restyle) = outcome.restyle {
                self.sink.emit(ChartEvent::Settle {
                    duration_ms: outcome.settle_ms,
                });
                tracing::debug!(patch = ?restyle.to_patch(), "committing reorder");
                self.sink.emit(ChartEvent::Restyle(restyle));
            }
            return;
        }

        let Some(pressed) = self.pressed_path.take() else {
            return;
        };
        if pressed.moved || pressed.origin != pointer || self.view.hovermode == HoverMode::None {
            return;
        }
        let paint_order = self.scene.paint_order(&self.view);
        if let Some(Hit::Path(idx)) = hit_test(&self.view, &paint_order, x, y) {
            if self.view.paths[idx].key == pressed.key {
                let points = Selection {
                    kind: SelectionKind::Path(idx),
                    paths: vec![idx],
                    bands: Vec::new(),
                    category: None,
                }
                .points(&self.view, self.trace_index);
                self.sink.emit(ChartEvent::Click(PointsEvent { points, pointer }));
            }
        }
    }

    /// Aborts an in-flight drag, restoring the pre-drag order.
    pub fn cancel_drag(&mut self) {
        if let Some(drag) = self.drag.take() {
            cancel_drag(&mut self.model, drag);
            self.relayout();
        }
    }

    fn emit_band_click(&mut self, target: ClickTarget, pointer: Pointer) {
        let Some(category) = self.view.find_category(target.dimension_ind, target.category_ind) else {
            return;
        };
        let at = BandRef {
            category,
            band: target.band,
        };
        if let Some(selection) = select_band(&self.view, at, self.view.hovermode) {
            let points = selection.points(&self.view, self.trace_index);
            self.sink.emit(ChartEvent::Click(PointsEvent { points, pointer }));
        }
    }

    fn enter_hover(&mut self, selection: Selection, pointer: Pointer) {
        self.scene.apply_selection(&self.view, &selection);
        let points = selection.points(&self.view, self.trace_index);
        self.sink.emit(ChartEvent::Hover(PointsEvent { points, pointer }));

        let tooltip = match selection.kind {
            SelectionKind::Category(category) => {
                let at = BandRef { category, band: 0 };
                band_tooltip(&self.view, at, &self.config.theme, &self.config.style)
            }
            SelectionKind::Color(at) => band_tooltip(&self.view, at, &self.config.theme, &self.config.style),
            SelectionKind::Path(idx) => path_tooltip(
                &self.view,
                idx,
                pointer.x,
                &self.config.theme,
                &self.config.style,
                &self.config.layout,
            ),
        };
        if let Some(tooltip) = tooltip {
            self.sink.emit(ChartEvent::ShowTooltip(tooltip));
        }
        self.hover = Some(selection);
    }

    fn exit_hover(&mut self, pointer: Pointer) {
        let Some(previous) = self.hover.take() else {
            return;
        };
        self.scene.clear_emphasis();
        self.scene.sort_paths_by_color();
        let points = previous.points(&self.view, self.trace_index);
        self.sink.emit(ChartEvent::Unhover(PointsEvent { points, pointer }));
        self.sink.emit(ChartEvent::HideTooltip);
    }
}
