//! Filter-graph compilation.
//!
//! The builder turns (images, durations, transition policy, overlays) into a
//! small AST and prints it once into ffmpeg `filter_complex` text with
//! deterministic labels. Two backends exist: a chained-xfade graph and a
//! concat (hard-cut) graph; per-boundary safety decides locally which one a
//! boundary uses, and a globally unsafe plan falls back to the concat
//! backend entirely.

use std::path::PathBuf;

use tracing::{debug, warn};

use bcut_models::params::XFADE_SAFETY_MARGIN;
use bcut_models::{
    Alignment, MarkerStyle, MaskScope, OverlayParams, RenderMode, RenderParams, Transition,
};

use crate::concat;
use crate::masks::find_masks;
use crate::overlay::{build_overlays, OverlayPlan};

/// One encoder input.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphInput {
    /// A looped still shown for a fixed duration (`-loop 1 -t d -i path`).
    Still { path: PathBuf, duration_s: f64 },
    /// An ffconcat list document, written into the workdir before running
    /// (`-f concat -safe 0 -i <workdir>/<file_name>`).
    List { file_name: String, contents: String },
}

/// How one segment boundary is rendered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundaryKind {
    Crossfade { duration_s: f64, offset_s: f64 },
    HardCut { marker: MarkerStyle },
}

/// A planned boundary on the output timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boundary {
    /// Boundary index (between segment `index` and `index + 1`).
    pub index: usize,
    /// Landing instant on the output timeline.
    pub at_s: f64,
    pub kind: BoundaryKind,
}

/// A compiled render: inputs, filter-graph text and boundary diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderGraph {
    /// Backend actually in use after the global-fallback check.
    pub mode: RenderMode,
    pub inputs: Vec<GraphInput>,
    /// `filter_complex` text; written to a side file by the runner.
    pub filtergraph: String,
    /// Label to `-map`.
    pub output_label: String,
    pub boundaries: Vec<Boundary>,
    /// Output duration on the composite timeline.
    pub total_s: f64,
}

/// Filter-graph AST. Printed exactly once per render.
#[derive(Debug, Clone)]
pub enum Node {
    /// Raw input stream `[i:v]`.
    Input { index: usize },
    /// Scale-and-pad normalisation plus pixel format, optionally pinning
    /// the frame rate.
    Format {
        child: Box<Node>,
        width: u32,
        height: u32,
        pixel: &'static str,
        fps: Option<u32>,
    },
    /// A linear chain of per-frame filters.
    Chain { child: Box<Node>, filters: Vec<String> },
    /// Hard concatenation of two video streams.
    Concat { first: Box<Node>, second: Box<Node> },
    /// Crossfade between the running composite and the next segment.
    Xfade {
        from: Box<Node>,
        to: Box<Node>,
        transition: Transition,
        duration_s: f64,
        offset_s: f64,
    },
    /// Apply `effects` to the mask-selected region of `child` only:
    /// split, filter one branch, alpha-merge it with the mask and overlay
    /// it back onto the unmodified base.
    WithMask {
        child: Box<Node>,
        effects: Vec<String>,
        mask: Box<Node>,
        invert: bool,
    },
}

/// Single printer for the AST. Labels are assigned in visit order, so the
/// same graph always prints to the same bytes.
pub(crate) struct Printer {
    lines: Vec<String>,
    counter: usize,
}

impl Printer {
    pub(crate) fn new() -> Self {
        Self {
            lines: Vec::new(),
            counter: 0,
        }
    }

    fn fresh(&mut self) -> String {
        let label = format!("f{}", self.counter);
        self.counter += 1;
        label
    }

    pub(crate) fn print(&mut self, node: &Node) -> String {
        match node {
            Node::Input { index } => format!("{index}:v"),
            Node::Format {
                child,
                width,
                height,
                pixel,
                fps,
            } => {
                let input = self.print(child);
                let out = self.fresh();
                let fps_part = fps.map(|f| format!(",fps={f}")).unwrap_or_default();
                self.lines.push(format!(
                    "[{input}]scale={width}:{height}:force_original_aspect_ratio=decrease,\
                     pad={width}:{height}:(ow-iw)/2:(oh-ih)/2{fps_part},format={pixel}[{out}]"
                ));
                out
            }
            Node::Chain { child, filters } => {
                let input = self.print(child);
                if filters.is_empty() {
                    return input;
                }
                let out = self.fresh();
                self.lines
                    .push(format!("[{input}]{}[{out}]", filters.join(",")));
                out
            }
            Node::Concat { first, second } => {
                let a = self.print(first);
                let b = self.print(second);
                let out = self.fresh();
                self.lines
                    .push(format!("[{a}][{b}]concat=n=2:v=1:a=0[{out}]"));
                out
            }
            Node::Xfade {
                from,
                to,
                transition,
                duration_s,
                offset_s,
            } => {
                let a = self.print(from);
                let b = self.print(to);
                let out = self.fresh();
                self.lines.push(format!(
                    "[{a}][{b}]xfade=transition={}:duration={duration_s:.3}:offset={offset_s:.3}[{out}]",
                    transition.as_ffmpeg()
                ));
                out
            }
            Node::WithMask {
                child,
                effects,
                mask,
                invert,
            } => {
                let input = self.print(child);
                let base = self.fresh();
                let branch = self.fresh();
                self.lines
                    .push(format!("[{input}]format=rgba,split=2[{base}][{branch}]"));
                let styled = if effects.is_empty() {
                    branch
                } else {
                    let out = self.fresh();
                    self.lines
                        .push(format!("[{branch}]{}[{out}]", effects.join(",")));
                    out
                };
                let mut mask_label = self.print(mask);
                if *invert {
                    let inverted = self.fresh();
                    self.lines
                        .push(format!("[{mask_label}]negate,format=gray[{inverted}]"));
                    mask_label = inverted;
                }
                let merged = self.fresh();
                self.lines
                    .push(format!("[{styled}][{mask_label}]alphamerge[{merged}]"));
                let out = self.fresh();
                self.lines.push(format!(
                    "[{base}][{merged}]overlay=shortest=1:format=auto[{out}]"
                ));
                out
            }
        }
    }

    pub(crate) fn finish(self) -> String {
        self.lines.join(";\n")
    }
}

/// Decide every boundary and the landing times on the output timeline.
///
/// A boundary is safe for a crossfade iff both adjacent segments last at
/// least `2·x + 0.05` seconds and `x` is not below the minimum effective
/// duration. After a crossfade the composite timeline is shorter than the
/// nominal one, so landing instants track the running composite length.
pub fn plan_boundaries(durations: &[f64], render: &RenderParams) -> (Vec<Boundary>, f64) {
    let mut boundaries = Vec::new();
    if durations.is_empty() {
        return (boundaries, 0.0);
    }

    let x = render.xfade_s;
    let need = 2.0 * x + XFADE_SAFETY_MARGIN;
    let mut run = durations[0];

    for i in 0..durations.len() - 1 {
        let next = durations[i + 1];
        let kind = if render.mode == RenderMode::Crossfade
            && x >= render.xfade_min_s
            && durations[i] >= need
            && next >= need
        {
            let offset_s = match render.align {
                Alignment::End => run - x,
                Alignment::Midpoint => run - x / 2.0,
            };
            BoundaryKind::Crossfade {
                duration_s: x,
                offset_s,
            }
        } else {
            if render.mode == RenderMode::Crossfade {
                debug!(
                    boundary = i,
                    prev = durations[i],
                    next,
                    "boundary unsafe for crossfade, falling back to hard cut"
                );
            }
            BoundaryKind::HardCut {
                marker: if render.mode == RenderMode::Crossfade {
                    render.fallback_marker
                } else {
                    MarkerStyle::None
                },
            }
        };
        boundaries.push(Boundary {
            index: i,
            at_s: run,
            kind,
        });
        run = match kind {
            BoundaryKind::Crossfade { offset_s, .. } => offset_s + next,
            BoundaryKind::HardCut { .. } => run + next,
        };
    }
    (boundaries, run)
}

/// Compile the render graph for a plan.
///
/// `beats` feed the overlay composer. Masks are looked up only when the
/// overlay scope asks for them, and a missing mask set silently degrades
/// the scope.
pub fn build_render_graph(
    images: &[PathBuf],
    durations: &[f64],
    beats: &[f64],
    render: &RenderParams,
    overlay: &OverlayParams,
) -> RenderGraph {
    debug_assert_eq!(images.len(), durations.len());

    let (boundaries, total_s) = plan_boundaries(durations, render);
    let all_unsafe = !boundaries.is_empty()
        && boundaries
            .iter()
            .all(|b| matches!(b.kind, BoundaryKind::HardCut { .. }));

    if render.mode == RenderMode::HardCut || all_unsafe {
        if render.mode == RenderMode::Crossfade {
            warn!("every boundary is unsafe for crossfades, using the hard-cut backend");
        }
        return concat::build_concat_graph(images, durations, beats, render, overlay);
    }

    let masks = if overlay.mask_scope.is_scoped() {
        find_masks(images)
    } else {
        None
    };
    let masked = masks.is_some();

    let mut inputs: Vec<GraphInput> = images
        .iter()
        .zip(durations)
        .map(|(path, &d)| GraphInput::Still {
            path: path.clone(),
            duration_s: d,
        })
        .collect();
    if let Some(mask_paths) = &masks {
        inputs.extend(mask_paths.iter().zip(durations).map(|(path, &d)| {
            GraphInput::Still {
                path: path.clone(),
                duration_s: d,
            }
        }));
    }

    let segment = |i: usize| Node::Format {
        child: Box::new(Node::Input { index: i }),
        width: render.width,
        height: render.height,
        pixel: "yuv420p",
        fps: None,
    };
    let mask_segment = |i: usize| Node::Format {
        child: Box::new(Node::Input {
            index: images.len() + i,
        }),
        width: render.width,
        height: render.height,
        pixel: "gray",
        fps: None,
    };

    let mut main = segment(0);
    let mut mask_chain = masked.then(|| mask_segment(0));

    for boundary in &boundaries {
        let next = boundary.index + 1;
        match boundary.kind {
            BoundaryKind::Crossfade {
                duration_s,
                offset_s,
            } => {
                main = Node::Xfade {
                    from: Box::new(main),
                    to: Box::new(segment(next)),
                    transition: render.transition,
                    duration_s,
                    offset_s,
                };
                mask_chain = mask_chain.map(|chain| Node::Xfade {
                    from: Box::new(chain),
                    to: Box::new(mask_segment(next)),
                    // Masks always dissolve so the selected region tracks
                    // the visual transition.
                    transition: Transition::Fade,
                    duration_s,
                    offset_s,
                });
            }
            BoundaryKind::HardCut { marker } => {
                if let Some(filter) =
                    marker_filter(marker, boundary.at_s, render.fallback_marker_s, overlay)
                {
                    main = Node::Chain {
                        child: Box::new(main),
                        filters: vec![filter],
                    };
                }
                main = Node::Concat {
                    first: Box::new(main),
                    second: Box::new(segment(next)),
                };
                mask_chain = mask_chain.map(|chain| Node::Concat {
                    first: Box::new(chain),
                    second: Box::new(mask_segment(next)),
                });
            }
        }
    }

    let landings: Vec<f64> = boundaries.iter().map(|b| b.at_s).collect();
    let overlays = build_overlays(beats, &landings, total_s, overlay);
    main = compose_overlays(main, overlays, mask_chain, overlay.mask_scope);

    let mut printer = Printer::new();
    let output_label = printer.print(&main);
    RenderGraph {
        mode: RenderMode::Crossfade,
        inputs,
        filtergraph: printer.finish(),
        output_label,
        boundaries,
        total_s,
    }
}

/// Attach overlay effect and draw chains to the composite, scoping the
/// effects through the mask chain when one is available.
pub(crate) fn compose_overlays(
    mut main: Node,
    overlays: OverlayPlan,
    mask_chain: Option<Node>,
    scope: MaskScope,
) -> Node {
    if !overlays.effect_filters.is_empty() {
        main = match (mask_chain, scope) {
            (Some(mask), MaskScope::Foreground | MaskScope::Background) => Node::WithMask {
                child: Box::new(main),
                effects: overlays.effect_filters,
                mask: Box::new(mask),
                invert: scope == MaskScope::Background,
            },
            _ => Node::Chain {
                child: Box::new(main),
                filters: overlays.effect_filters,
            },
        };
    }
    if !overlays.draw_filters.is_empty() {
        main = Node::Chain {
            child: Box::new(main),
            filters: overlays.draw_filters,
        };
    }
    main
}

/// One-frame boundary marker for hard-cut fallbacks.
fn marker_filter(
    style: MarkerStyle,
    at_s: f64,
    duration_s: f64,
    overlay: &OverlayParams,
) -> Option<String> {
    if duration_s <= 0.0 {
        return None;
    }
    let window = format!("enable='between(t,{:.3},{:.3})'", at_s, at_s + duration_s);
    match style {
        MarkerStyle::None => None,
        MarkerStyle::WhitePop => Some(format!(
            "drawbox=x=0:y=0:w=iw:h=ih:color=white@1.0:t=fill:{window}"
        )),
        MarkerStyle::BlackFlash => Some(format!(
            "drawbox=x=0:y=0:w=iw:h=ih:color=black@1.0:t=fill:{window}"
        )),
        MarkerStyle::Pulse => Some(format!(
            "eq=saturation={:.3}:brightness={:.3}:{window}",
            overlay.pulse_saturation, overlay.pulse_brightness
        )),
        MarkerStyle::Bloom => Some(format!(
            "gblur=sigma={:.2}:steps=1:{window}",
            overlay.bloom_sigma
        )),
    }
}
