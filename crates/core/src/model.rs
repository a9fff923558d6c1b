//! Internal arena model shared by the layout stages.
//!
//! Bases are 1-indexed with a sentinel at index 0 that closes the exterior
//! loop. Regions, loops and connections live in flat vectors and refer to
//! each other by index.

use crate::config::NaviewConfig;
use crate::types::PairTable;

#[derive(Debug, Clone)]
pub(crate) struct Base {
    /// Partner index, 0 when unpaired.
    pub mate: usize,
    pub x: f64,
    pub y: f64,
    /// Set once `x` and `y` hold a real position.
    pub placed: bool,
    /// Set once the owning region has been turned into a connection pair.
    pub extracted: bool,
    pub region: Option<usize>,
}

impl Base {
    pub fn is_placed(&self) -> bool {
        self.placed
    }
}

/// A maximal helix: `start1` pairs with `end2`, `end1` pairs with `start2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Region {
    pub start1: usize,
    pub end1: usize,
    pub start2: usize,
    pub end2: usize,
}

/// One side of a helix as seen from the loop that owns it.
#[derive(Debug, Clone)]
pub(crate) struct Connection {
    /// Loop on the far side of the helix.
    pub loop_id: usize,
    pub region: usize,
    /// Closing pair of the helix on this loop's circle.
    pub start: usize,
    pub end: usize,
    pub xrad: f64,
    pub yrad: f64,
    pub angle: f64,
    /// The backbone between this connection and the next is pushed out of the circle.
    pub extruded: bool,
    pub broken: bool,
}

impl Connection {
    pub fn new(loop_id: usize, region: usize, start: usize, end: usize) -> Self {
        Connection {
            loop_id,
            region,
            start,
            end,
            xrad: 0.0,
            yrad: 0.0,
            angle: 0.0,
            extruded: false,
            broken: false,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Loop {
    /// Connection ids in backbone order.
    pub connections: Vec<usize>,
    pub number: usize,
    pub depth: i32,
    pub mark: bool,
    /// Placement radius, set by radius fitting.
    pub radius: f64,
    /// Radius pinned by a radloop.
    pub fixed_radius: Option<f64>,
    pub x: f64,
    pub y: f64,
}

impl Loop {
    pub fn new(number: usize, fixed_radius: Option<f64>) -> Self {
        Loop {
            connections: Vec::new(),
            number,
            depth: 0,
            mark: false,
            radius: 0.0,
            fixed_radius,
            x: 0.0,
            y: 0.0,
        }
    }

    pub fn nconnection(&self) -> usize {
        self.connections.len()
    }
}

/// All mutable state of one layout call. Built fresh per call and dropped
/// once the coordinates are read out.
pub(crate) struct LayoutContext<'a> {
    pub config: &'a NaviewConfig,
    pub nbase: usize,
    pub bases: Vec<Base>,
    pub regions: Vec<Region>,
    pub loops: Vec<Loop>,
    pub connections: Vec<Connection>,
    pub root: Option<usize>,
    pub crossed_loops: Vec<usize>,
    /// Bisection non-convergence is reported once per call.
    pub bisection_warned: bool,
}

impl<'a> LayoutContext<'a> {
    /// Re-index the pair table to 1..=n behind the sentinel base 0.
    ///
    /// A structure without any pair gets a forced pair between the first and
    /// last base so the loop tree is never empty.
    pub fn new(pt: &PairTable, config: &'a NaviewConfig) -> Self {
        let nbase = pt.len();
        let mut bases: Vec<Base> = (0..=nbase)
            .map(|_| Base {
                mate: 0,
                x: 0.0,
                y: 0.0,
                placed: false,
                extracted: false,
                region: None,
            })
            .collect();
        let mut npairs = 0;
        for (i, &p) in pt.pairs().iter().enumerate() {
            if let Some(j) = p {
                bases[i + 1].mate = j + 1;
                if j > i {
                    npairs += 1;
                }
            }
        }
        if npairs == 0 && nbase >= 2 {
            bases[1].mate = nbase;
            bases[nbase].mate = 1;
        }
        LayoutContext {
            config,
            nbase,
            bases,
            regions: Vec::new(),
            loops: Vec::new(),
            connections: Vec::new(),
            root: None,
            crossed_loops: Vec::new(),
            bisection_warned: false,
        }
    }

    /// Put base `i` at `(x, y)`.
    pub fn place(&mut self, i: usize, x: f64, y: f64) {
        let b = &mut self.bases[i];
        b.x = x;
        b.y = y;
        b.placed = true;
    }

    /// Backbone steps from base `from` forward to base `to`, wrapping through the sentinel.
    pub fn span(&self, from: usize, to: usize) -> usize {
        let m = self.nbase + 1;
        (to + m - from) % m
    }

    /// Base `steps` positions after `i`, wrapping through the sentinel.
    pub fn advance(&self, i: usize, steps: usize) -> usize {
        (i + steps) % (self.nbase + 1)
    }

    /// Base before `i`, wrapping through the sentinel.
    pub fn retreat(&self, i: usize) -> usize {
        if i == 0 {
            self.nbase
        } else {
            i - 1
        }
    }

    pub fn conn(&self, lp: usize, ic: usize) -> &Connection {
        &self.connections[self.loops[lp].connections[ic]]
    }

    pub fn conn_mut(&mut self, lp: usize, ic: usize) -> &mut Connection {
        let id = self.loops[lp].connections[ic];
        &mut self.connections[id]
    }
}
