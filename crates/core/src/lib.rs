//! NAView layout of nucleic acid secondary structures.
//!
//! A pair table is split into helices, the helices into a tree of loops, and
//! each loop is drawn as a circle whose closing pairs are spaced to keep
//! neighbouring bases apart. Crowded backbone stretches are pushed out of
//! their circle.

mod arc;
mod config;
mod error;
mod geometry;
mod loops;
mod model;
mod parser;
mod radius;
mod regions;
mod types;

pub use config::{NaviewConfig, PseudoknotPolicy, Radloop};
pub use error::{NaviewError, ParseError, Result};
pub use parser::parse;
pub use types::*;

use model::LayoutContext;

/// Layout engine. Holds only the configuration; every call works on its own
/// fresh state, so one engine can serve any number of layouts.
#[derive(Debug, Clone, Default)]
pub struct Naview {
    config: NaviewConfig,
}

impl Naview {
    pub fn new(config: NaviewConfig) -> Result<Self> {
        config.validate()?;
        Ok(Naview { config })
    }

    pub fn config(&self) -> &NaviewConfig {
        &self.config
    }

    /// Compute coordinates for every base of `pt`.
    pub fn layout(&self, pt: &PairTable) -> Result<Layout> {
        pt.validate()?;

        let mut stripped_pairs = Vec::new();
        let crossings = if pt.is_nested() {
            Vec::new()
        } else {
            pt.crossings()
        };
        let nested;
        let pt = match (crossings.first(), self.config.pseudoknots) {
            (None, _) => pt,
            (Some(&(first, second)), PseudoknotPolicy::Reject) => {
                return Err(NaviewError::Pseudoknot { first, second });
            }
            (Some(_), PseudoknotPolicy::Strip) => {
                let (table, dropped) = pt.strip_crossings();
                log::warn!("removed {} crossing pairs before layout", dropped.len());
                stripped_pairs = dropped;
                nested = table;
                &nested
            }
        };

        let n = pt.len();
        if n == 0 {
            return Ok(Layout {
                stripped_pairs,
                ..Layout::default()
            });
        }
        if n == 1 {
            return Ok(Layout {
                coordinates: vec![self.config.origin],
                stripped_pairs,
                ..Layout::default()
            });
        }

        let mut ctx = LayoutContext::new(pt, &self.config);
        ctx.regions = regions::find_regions(&mut ctx.bases);
        loops::construct_loops(&mut ctx)?;
        let root = loops::find_central_loop(&mut ctx)?;
        ctx.traverse_loops(root)?;

        let mut layout = self.read_out(&ctx)?;
        layout.stripped_pairs = stripped_pairs;
        Ok(layout)
    }

    /// Scale internal coordinates into output space.
    fn to_output(&self, x: f64, y: f64) -> Point {
        let d = self.config.backbone_distance;
        Point {
            x: self.config.origin.x + d * x,
            y: self.config.origin.y + d * y,
        }
    }

    fn read_out(&self, ctx: &LayoutContext) -> Result<Layout> {
        let mut coordinates = Vec::with_capacity(ctx.nbase);
        for (i, b) in ctx.bases.iter().enumerate().skip(1) {
            if !b.is_placed() || !b.x.is_finite() || !b.y.is_finite() {
                return Err(NaviewError::Algorithm(format!(
                    "base {i} was never placed"
                )));
            }
            coordinates.push(self.to_output(b.x, b.y));
        }

        let loops = ctx
            .loops
            .iter()
            .map(|lp| {
                let centroid = self.to_output(lp.x, lp.y);
                LoopSummary {
                    number: lp.number,
                    connections: lp.nconnection(),
                    depth: lp.depth.max(0) as usize,
                    radius: lp.radius,
                    broken: lp
                        .connections
                        .iter()
                        .any(|&c| ctx.connections[c].broken),
                    x: centroid.x,
                    y: centroid.y,
                }
            })
            .collect();

        Ok(Layout {
            coordinates,
            loops,
            root: ctx.root.map(|r| ctx.loops[r].number),
            crossed_loops: ctx.crossed_loops.clone(),
            stripped_pairs: Vec::new(),
        })
    }
}

/// Lay out a 0-indexed partner list with the default configuration.
pub fn layout(pairs: &[Option<usize>]) -> Result<Vec<Point>> {
    let pt = PairTable::from_partners(pairs.to_vec())?;
    Ok(Naview::default().layout(&pt)?.coordinates)
}

/// Lay out dot-bracket notation with `config`.
pub fn layout_structure(input: &str, config: NaviewConfig) -> Result<Layout> {
    let pt = parse(input)?;
    Naview::new(config)?.layout(&pt)
}

/// Main entry point for the bindings: dot-bracket in, JSON `Layout` out.
/// Returns an empty string on any error.
pub fn draw_structure(input: &str) -> String {
    layout_structure(input, NaviewConfig::default())
        .ok()
        .and_then(|l| serde_json::to_string(&l).ok())
        .unwrap_or_default()
}
