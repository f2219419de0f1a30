//! Per-slice encoding selected by the bake mode.
//!
//! - Diffuse: the diffuse color pass with the renderer's alpha.
//! - Normal: `invert(clamp(n * 0.5 + 0.5))`, blended over the flat normal
//!   color `(0.5, 0.5, 1.0)` by the renderer's alpha. Each arithmetic step
//!   clamps to `[0, 1]`, so the order of operations is part of the format.
//! - Anything else: the combined output, unmodified.

mod composite;

pub use composite::{AlphaSource, CompositeGraph, CompositeNode, MixFactor, PassSource};

use crate::atlas::SliceImage;
use crate::render::{RenderOutput, RenderPasses};
use crate::types::BakeMode;

/// Color of a normal pointing straight at the camera in tangent-space maps.
pub const FLAT_NORMAL_COLOR: [f32; 3] = [0.5, 0.5, 1.0];

/// The transform applied to every slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Diffuse,
    Normal,
    Combined,
}

impl From<BakeMode> for Encoding {
    fn from(mode: BakeMode) -> Self {
        match mode {
            BakeMode::Diffuse => Encoding::Diffuse,
            BakeMode::Normal => Encoding::Normal,
            BakeMode::Other => Encoding::Combined,
        }
    }
}

impl Encoding {
    /// Auxiliary passes the renderer must produce.
    pub fn required_passes(&self) -> RenderPasses {
        RenderPasses {
            diffuse_color: *self == Encoding::Diffuse,
            normal: *self == Encoding::Normal,
        }
    }

    /// The compositing graph realizing this encoding.
    pub fn graph(&self) -> CompositeGraph {
        match self {
            Encoding::Diffuse => CompositeGraph {
                source: PassSource::DiffuseColor,
                nodes: Vec::new(),
                alpha: AlphaSource::RenderAlpha,
            },
            Encoding::Normal => CompositeGraph {
                source: PassSource::Normal,
                nodes: vec![
                    CompositeNode::Multiply {
                        color: [0.5; 3],
                        clamp: true,
                    },
                    CompositeNode::Add {
                        color: [0.5; 3],
                        clamp: true,
                    },
                    CompositeNode::Invert,
                    CompositeNode::Mix {
                        base: FLAT_NORMAL_COLOR,
                        factor: MixFactor::RenderAlpha,
                    },
                ],
                alpha: AlphaSource::Opaque,
            },
            Encoding::Combined => CompositeGraph::passthrough(PassSource::Combined),
        }
    }
}

/// Turns raw renders into slice images.
#[derive(Debug, Clone)]
pub struct SliceEncoder {
    encoding: Encoding,
    graph: CompositeGraph,
    renderer_composites: bool,
}

impl SliceEncoder {
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            graph: encoding.graph(),
            renderer_composites: false,
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn graph(&self) -> &CompositeGraph {
        &self.graph
    }

    /// Record that the renderer applies the graph itself.
    pub fn set_renderer_composites(&mut self, composites: bool) {
        self.renderer_composites = composites;
    }

    /// Whether a render lacks the pass this encoding reads.
    pub fn is_missing_pass(&self, output: &RenderOutput) -> bool {
        !(self.renderer_composites && output.composited.is_some())
            && self.graph.source_image(output).1
    }

    pub fn encode(&self, output: RenderOutput) -> SliceImage {
        if self.renderer_composites {
            if let Some(image) = output.composited {
                return image;
            }
        }
        self.graph.evaluate(&output)
    }
}
