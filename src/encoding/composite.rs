//! The per-pixel encoding as a small compositing graph.
//!
//! A graph reads one render pass, runs its RGB through a chain of nodes and
//! picks an alpha source. Renderers with their own compositor can realize the
//! same graph; otherwise [`CompositeGraph::evaluate`] applies it on the CPU.

use crate::atlas::SliceImage;
use crate::render::RenderOutput;
use log::debug;

/// Render pass a graph reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassSource {
    Combined,
    DiffuseColor,
    Normal,
}

/// Factor input of a mix node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MixFactor {
    /// The renderer's alpha, or 1.0 when no alpha is available.
    RenderAlpha,
    Constant(f32),
}

/// Where the output alpha comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlphaSource {
    /// Alpha channel of the source pass.
    Input,
    /// The renderer's alpha, falling back to the source pass alpha.
    RenderAlpha,
    /// Always 1.0.
    Opaque,
}

/// One RGB operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompositeNode {
    /// Per-channel product with a constant.
    Multiply { color: [f32; 3], clamp: bool },
    /// Per-channel sum with a constant.
    Add { color: [f32; 3], clamp: bool },
    /// `1 - value` per channel.
    Invert,
    /// `base * (1 - f) + value * f`.
    Mix { base: [f32; 3], factor: MixFactor },
}

impl CompositeNode {
    fn apply(&self, rgb: [f32; 3], render_alpha: Option<f32>) -> [f32; 3] {
        match *self {
            CompositeNode::Multiply { color, clamp } => {
                map3(rgb, color, |v, c| clamp_if(v * c, clamp))
            }
            CompositeNode::Add { color, clamp } => map3(rgb, color, |v, c| clamp_if(v + c, clamp)),
            CompositeNode::Invert => rgb.map(|v| 1.0 - v),
            CompositeNode::Mix { base, factor } => {
                let f = match factor {
                    MixFactor::RenderAlpha => render_alpha.unwrap_or(1.0),
                    MixFactor::Constant(f) => f,
                }
                .clamp(0.0, 1.0);
                map3(rgb, base, |v, b| b * (1.0 - f) + v * f)
            }
        }
    }
}

fn map3(a: [f32; 3], b: [f32; 3], f: impl Fn(f32, f32) -> f32) -> [f32; 3] {
    [f(a[0], b[0]), f(a[1], b[1]), f(a[2], b[2])]
}

fn clamp_if(v: f32, clamp: bool) -> f32 {
    if clamp {
        v.clamp(0.0, 1.0)
    } else {
        v
    }
}

/// A source pass, a chain of RGB nodes and an alpha rule.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeGraph {
    pub source: PassSource,
    pub nodes: Vec<CompositeNode>,
    pub alpha: AlphaSource,
}

impl CompositeGraph {
    /// Forward a pass unchanged.
    pub fn passthrough(source: PassSource) -> Self {
        Self {
            source,
            nodes: Vec::new(),
            alpha: AlphaSource::Input,
        }
    }

    /// Run the node chain on one texel's RGB.
    pub fn apply_rgb(&self, rgb: [f32; 3], render_alpha: Option<f32>) -> [f32; 3] {
        self.nodes
            .iter()
            .fold(rgb, |rgb, node| node.apply(rgb, render_alpha))
    }

    /// The pass this graph reads, falling back to the combined output when the
    /// renderer did not produce it.
    pub fn source_image<'a>(&self, output: &'a RenderOutput) -> (&'a SliceImage, bool) {
        let pass = match self.source {
            PassSource::Combined => None,
            PassSource::DiffuseColor => output.diffuse_color.as_ref(),
            PassSource::Normal => output.normal.as_ref(),
        };
        match pass {
            Some(image) => (image, false),
            None => (&output.combined, self.source != PassSource::Combined),
        }
    }

    /// Apply the graph to a render.
    pub fn evaluate(&self, output: &RenderOutput) -> SliceImage {
        let (source, fell_back) = self.source_image(output);
        if fell_back {
            debug!("{:?} pass missing, using combined output", self.source);
        }

        // An alpha buffer that does not line up with the source is ignored.
        let render_alpha = output
            .alpha
            .as_deref()
            .filter(|alpha| alpha.len() == source.texel_count());

        let mut pixels = Vec::with_capacity(source.pixels.len());
        for (i, texel) in source.pixels.chunks(4).enumerate() {
            let channel = |c: usize| texel.get(c).copied().unwrap_or(0.0);
            let alpha_here = render_alpha.and_then(|a| a.get(i).copied());

            let [r, g, b] = self.apply_rgb([channel(0), channel(1), channel(2)], alpha_here);
            let a = match self.alpha {
                AlphaSource::Input => channel(3),
                AlphaSource::RenderAlpha => alpha_here.unwrap_or_else(|| channel(3)),
                AlphaSource::Opaque => 1.0,
            };
            pixels.extend_from_slice(&[r, g, b, a]);
        }

        SliceImage::from_pixels(source.width, source.height, pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiply_add_clamp() {
        let graph = CompositeGraph {
            source: PassSource::Combined,
            nodes: vec![
                CompositeNode::Multiply {
                    color: [2.0, 2.0, 2.0],
                    clamp: true,
                },
                CompositeNode::Add {
                    color: [0.25, 0.25, 0.25],
                    clamp: false,
                },
            ],
            alpha: AlphaSource::Input,
        };

        assert_eq!(graph.apply_rgb([0.25, 0.75, -1.0], None), [0.75, 1.25, 0.25]);
    }

    #[test]
    fn test_mix_factor() {
        let mix = CompositeNode::Mix {
            base: [1.0, 0.0, 0.0],
            factor: MixFactor::RenderAlpha,
        };
        assert_eq!(mix.apply([0.0, 1.0, 0.0], Some(0.25)), [0.75, 0.25, 0.0]);
        assert_eq!(mix.apply([0.0, 1.0, 0.0], None), [0.0, 1.0, 0.0]);

        let constant = CompositeNode::Mix {
            base: [1.0, 1.0, 1.0],
            factor: MixFactor::Constant(0.0),
        };
        assert_eq!(constant.apply([0.0, 0.0, 0.0], Some(1.0)), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_passthrough_evaluate() {
        let combined = SliceImage::filled(2, 1, [0.2, 0.4, 0.6, 0.8]);
        let output = RenderOutput::new(combined.clone());

        let image = CompositeGraph::passthrough(PassSource::Combined).evaluate(&output);
        assert_eq!(image, combined);
    }

    #[test]
    fn test_missing_pass_falls_back() {
        let output = RenderOutput::new(SliceImage::filled(1, 1, [0.1, 0.2, 0.3, 1.0]));
        let graph = CompositeGraph::passthrough(PassSource::DiffuseColor);

        let (_, fell_back) = graph.source_image(&output);
        assert!(fell_back);
        assert_eq!(graph.evaluate(&output).get_pixel(0, 0), [0.1, 0.2, 0.3, 1.0]);
    }

    #[test]
    fn test_render_alpha_source() {
        let mut output = RenderOutput::new(SliceImage::filled(2, 1, [1.0, 1.0, 1.0, 1.0]));
        output.alpha = Some(vec![0.0, 0.5]);

        let graph = CompositeGraph {
            alpha: AlphaSource::RenderAlpha,
            ..CompositeGraph::passthrough(PassSource::Combined)
        };
        let image = graph.evaluate(&output);
        assert_eq!(image.get_pixel(0, 0)[3], 0.0);
        assert_eq!(image.get_pixel(1, 0)[3], 0.5);

        output.alpha = Some(vec![0.0]);
        assert_eq!(graph.evaluate(&output).get_pixel(0, 0)[3], 1.0);
    }
}
