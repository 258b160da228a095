//! Hard-cut backend: ffconcat input lists plus a single format pass.

use std::path::PathBuf;

use bcut_models::{MaskScope, OverlayParams, RenderMode, RenderParams};

use crate::graph::{compose_overlays, Boundary, BoundaryKind, GraphInput, Node, RenderGraph};
use crate::masks::find_masks;
use crate::overlay::build_overlays;

/// File name of the image list inside the workdir.
pub const IMAGE_LIST_NAME: &str = "list.ffconcat";
/// File name of the mask list inside the workdir.
pub const MASK_LIST_NAME: &str = "masks.ffconcat";

/// Build an ffconcat document: one `file`/`duration` pair per segment.
///
/// The final file is listed a second time because the concat demuxer only
/// honours the last `duration` directive when the entry is followed by
/// another `file` line.
pub fn concat_document(paths: &[PathBuf], durations: &[f64]) -> String {
    let mut doc = String::from("ffconcat version 1.0\n");
    for (path, d) in paths.iter().zip(durations) {
        doc.push_str(&format!("file '{}'\nduration {:.3}\n", path.display(), d));
    }
    if let Some(last) = paths.last() {
        doc.push_str(&format!("file '{}'\n", last.display()));
    }
    doc
}

/// Compile the hard-cut render graph.
///
/// The concat source is a single input stream; one format pass normalises
/// colour space, pixel format, frame rate and geometry, and overlays are
/// composed on top. Boundaries land exactly on the cumulative durations.
pub fn build_concat_graph(
    images: &[PathBuf],
    durations: &[f64],
    beats: &[f64],
    render: &RenderParams,
    overlay: &OverlayParams,
) -> RenderGraph {
    let mut inputs = vec![GraphInput::List {
        file_name: IMAGE_LIST_NAME.to_string(),
        contents: concat_document(images, durations),
    }];

    let masks = if overlay.mask_scope.is_scoped() {
        find_masks(images)
    } else {
        None
    };
    if let Some(mask_paths) = &masks {
        inputs.push(GraphInput::List {
            file_name: MASK_LIST_NAME.to_string(),
            contents: concat_document(mask_paths, durations),
        });
    }

    let mut boundaries = Vec::new();
    let mut run = 0.0;
    for (i, &d) in durations.iter().enumerate() {
        run += d;
        if i + 1 < durations.len() {
            boundaries.push(Boundary {
                index: i,
                at_s: run,
                kind: BoundaryKind::HardCut {
                    marker: bcut_models::MarkerStyle::None,
                },
            });
        }
    }
    let total_s = run;

    let main = Node::Format {
        child: Box::new(Node::Input { index: 0 }),
        width: render.width,
        height: render.height,
        pixel: "yuv420p",
        fps: Some(render.fps),
    };
    let mask_chain = masks.as_ref().map(|_| Node::Format {
        child: Box::new(Node::Input { index: 1 }),
        width: render.width,
        height: render.height,
        pixel: "gray",
        fps: Some(render.fps),
    });

    let landings: Vec<f64> = boundaries.iter().map(|b| b.at_s).collect();
    let overlays = build_overlays(beats, &landings, total_s, overlay);
    let scope = if masks.is_some() {
        overlay.mask_scope
    } else {
        MaskScope::None
    };
    let root = compose_overlays(main, overlays, mask_chain, scope);

    let mut printer = crate::graph::Printer::new();
    let output_label = printer.print(&root);
    RenderGraph {
        mode: RenderMode::HardCut,
        inputs,
        filtergraph: printer.finish(),
        output_label,
        boundaries,
        total_s,
    }
}
