//! Extruded backbone segments drawn as small regular-polygon arcs.

use std::f64::consts::{PI, TAU};

use crate::error::{algorithm_error, Result};
use crate::model::{Base, LayoutContext};

pub(crate) const MAXITER: usize = 500;
const TOLERANCE: f64 = 1e-4;

/// Center of a regular polygon spanning a chord.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ArcCenter {
    /// Offset of the center from the chord midpoint, along the chord normal.
    pub h: f64,
    /// Angle subtended by one unit side.
    pub theta: f64,
    pub converged: bool,
}

/// Place `n` points between the ends of a chord of length `b` so that all
/// `n + 1` sides have unit length, and return where the polygon's center sits.
///
/// Bisection on `h`. When the iteration budget runs out the result degrades
/// to a flat placement (`h = 0`, `theta = 0`) with `converged` unset.
pub(crate) fn find_center_for_arc(n: usize, b: f64) -> Result<ArcCenter> {
    find_center_for_arc_within(n, b, MAXITER)
}

pub(crate) fn find_center_for_arc_within(n: usize, b: f64, max_iter: usize) -> Result<ArcCenter> {
    let sides = (n + 1) as f64;
    let mut hhi = sides / PI;
    // A unit side needs r >= 0.5, so a short chord starts the bracket where
    // r = 0.5. The epsilon keeps the bracket finite when the chord is exactly
    // n + 1 long.
    let mut hlow = if b < 1.0 {
        (0.25 - b * b / 4.0).max(0.0).sqrt()
    } else {
        -hhi - b / (sides + 0.000001 - b)
    };

    let mut iter = 0;
    loop {
        let h = (hhi + hlow) / 2.0;
        let r = (h * h + b * b / 4.0).sqrt();
        let disc = 1.0 - 0.5 / (r * r);
        if disc.abs() > 1.0 {
            return algorithm_error(format!(
                "unexpected large magnitude discriminant = {disc} (r = {r})"
            ));
        }
        let theta = disc.acos();
        let phi = (h / r).acos();
        let e = theta * sides + 2.0 * phi - TAU;
        if e > 0.0 {
            hlow = h;
        } else {
            hhi = h;
        }
        iter += 1;
        if e.abs() <= TOLERANCE {
            return Ok(ArcCenter {
                h,
                theta,
                converged: true,
            });
        }
        if iter >= max_iter {
            return Ok(ArcCenter {
                h: 0.0,
                theta: 0.0,
                converged: false,
            });
        }
    }
}

impl LayoutContext<'_> {
    /// Fill the bases strictly between `start` and `end` on a unit-sided arc,
    /// or on the straight chord when it is long enough.
    pub(crate) fn construct_circle_segment(&mut self, start: usize, end: usize) -> Result<()> {
        let l = self.span(start, end);
        if l < 2 {
            return Ok(());
        }
        let (sx, sy) = (self.bases[start].x, self.bases[start].y);
        let dx = self.bases[end].x - sx;
        let dy = self.bases[end].y - sy;
        let rr = dx.hypot(dy);

        if rr >= l as f64 {
            for j in 1..l {
                let i = self.advance(start, j);
                let t = j as f64 / l as f64;
                self.place(i, sx + dx * t, sy + dy * t);
            }
            return Ok(());
        }
        if rr < 1e-12 {
            return algorithm_error(format!(
                "segment ends {start} and {end} coincide"
            ));
        }

        let arc = find_center_for_arc(l - 1, rr)?;
        if !arc.converged && !self.bisection_warned {
            log::warn!("iteration failed in find_center_for_arc");
            self.bisection_warned = true;
        }
        let (ux, uy) = (dx / rr, dy / rr);
        let midx = sx + ux * rr / 2.0;
        let midy = sy + uy * rr / 2.0;
        let nrx = midx + arc.h * uy;
        let nry = midy - arc.h * ux;
        let mx = sx - nrx;
        let my = sy - nry;
        let radius = mx.hypot(my);
        let a = my.atan2(mx);
        for j in 1..l {
            let i = self.advance(start, j);
            let aj = a + j as f64 * arc.theta;
            self.place(i, nrx + radius * aj.cos(), nry + radius * aj.sin());
        }
        Ok(())
    }

    /// Draw the backbone between two connections outside the loop circle.
    ///
    /// `astart`/`aend` are the radial angles of the flanking connections and
    /// `start`/`end` the last and first base of the gap. When the arc folds
    /// back into the loop the two outermost bases are pinned next to their
    /// neighbours and the remaining arc is rebuilt, until it clears or only
    /// one base is left.
    pub(crate) fn construct_extruded_segment(
        &mut self,
        astart: f64,
        aend: f64,
        mut start: usize,
        mut end: usize,
    ) -> Result<()> {
        let aend1 = aend;
        let aend2 = if aend < astart { aend + TAU } else { aend };
        let aave = (astart + aend2) / 2.0;
        let mut n = self.span(start, end);
        if n < 2 {
            return Ok(());
        }
        let mut da = aend - astart;
        if da < 0.0 {
            da += TAU;
        }
        if n == 2 {
            return self.construct_circle_segment(start, end);
        }

        let dx = self.bases[end].x - self.bases[start].x;
        let dy = self.bases[end].y - self.bases[start].y;
        let rr = dx.hypot(dy);
        if rr >= 1.5 && da <= PI / 2.0 {
            let (ux, uy) = (dx / rr, dy / rr);
            let nstart = self.advance(start, 1);
            let nend = self.retreat(end);
            let (sx, sy) = (self.bases[start].x, self.bases[start].y);
            let (ex, ey) = (self.bases[end].x, self.bases[end].y);
            self.place(nstart, sx + 0.5 * ux, sy + 0.5 * uy);
            self.place(nend, ex - 0.5 * ux, ey - 0.5 * uy);
            start = nstart;
            end = nend;
            n = self.span(start, end);
        }

        loop {
            self.construct_circle_segment(start, end)?;
            if n < 2 {
                break;
            }
            let nstart = self.advance(start, 1);
            let nend = self.retreat(end);

            let mut collision = false;
            let a1 = angle_between(&self.bases[start], &self.bases[nstart]);
            let mut dac = a1 - astart;
            if dac < 0.0 {
                dac += TAU;
            }
            if dac > PI {
                collision = true;
            }
            let a2 = angle_between(&self.bases[end], &self.bases[nend]);
            dac = aend1 - a2;
            if dac < 0.0 {
                dac += TAU;
            }
            if dac > PI {
                collision = true;
            }
            if !collision {
                break;
            }

            let ac = aave.min(astart + 0.5);
            let (sx, sy) = (self.bases[start].x, self.bases[start].y);
            self.place(nstart, sx + ac.cos(), sy + ac.sin());
            start = nstart;
            let ac = aave.max(aend2 - 0.5);
            let (ex, ey) = (self.bases[end].x, self.bases[end].y);
            self.place(nend, ex + ac.cos(), ey + ac.sin());
            end = nend;
            n = self.span(start, end);
            if n <= 1 {
                break;
            }
        }
        Ok(())
    }
}

/// Polar angle in `[0, 2π)` of the step from `from` to `to`.
fn angle_between(from: &Base, to: &Base) -> f64 {
    let a = (to.y - from.y).atan2(to.x - from.x);
    if a < 0.0 {
        a + TAU
    } else {
        a
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NaviewConfig;
    use crate::parser::parse;

    #[test]
    fn test_square_arc() {
        // two points on a unit chord close a unit square
        let arc = find_center_for_arc(2, 1.0).unwrap();
        assert!(arc.converged);
        assert!((arc.h - 0.5).abs() < 1e-3, "h = {}", arc.h);
        assert!((arc.theta - PI / 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_hexagon_arc() {
        let arc = find_center_for_arc(4, 1.0).unwrap();
        assert!(arc.converged);
        assert!((arc.h - 3f64.sqrt() / 2.0).abs() < 1e-3, "h = {}", arc.h);
        assert!((arc.theta - PI / 3.0).abs() < 1e-3);
    }

    #[test]
    fn test_budget_exhaustion_degrades_to_flat() {
        let arc = find_center_for_arc_within(4, 1.0, 1).unwrap();
        assert!(!arc.converged);
        assert_eq!(arc.h, 0.0);
        assert_eq!(arc.theta, 0.0);
    }

    #[test]
    fn test_short_chord_stays_in_range() {
        // one base between two ends 0.2 apart: an isosceles triangle with
        // unit legs, circumradius 1 / (2 sqrt(0.99)) ~ 0.5025
        let arc = find_center_for_arc(1, 0.2).unwrap();
        assert!(arc.converged);
        let r = (arc.h * arc.h + 0.01).sqrt();
        assert!((r - 0.5 / 0.99f64.sqrt()).abs() < 1e-3, "r = {r}");
        for b in [0.0, 0.05, 0.5, 0.99] {
            for n in 1..6 {
                assert!(find_center_for_arc(n, b).is_ok(), "n = {n}, b = {b}");
            }
        }
    }

    fn unpaired_ctx(cfg: &NaviewConfig, n: usize) -> LayoutContext<'_> {
        let pt = parse(&".".repeat(n)).unwrap();
        LayoutContext::new(&pt, cfg)
    }

    #[test]
    fn test_circle_segment_unit_sides() {
        let cfg = NaviewConfig::default();
        let mut ctx = unpaired_ctx(&cfg, 8);
        ctx.place(1, 0.0, 0.0);
        ctx.place(6, 1.0, 0.0);
        ctx.construct_circle_segment(1, 6).unwrap();
        for i in 1..6 {
            let d = (ctx.bases[i + 1].x - ctx.bases[i].x).hypot(ctx.bases[i + 1].y - ctx.bases[i].y);
            assert!((d - 1.0).abs() < 1e-3, "side {i}: {d}");
        }
        assert!(!ctx.bases[7].is_placed());
    }

    #[test]
    fn test_circle_segment_straight_when_long() {
        let cfg = NaviewConfig::default();
        let mut ctx = unpaired_ctx(&cfg, 8);
        ctx.place(2, 0.0, 0.0);
        ctx.place(5, 4.5, 0.0);
        ctx.construct_circle_segment(2, 5).unwrap();
        assert!((ctx.bases[3].x - 1.5).abs() < 1e-12);
        assert!((ctx.bases[4].x - 3.0).abs() < 1e-12);
        assert_eq!(ctx.bases[4].y, 0.0);
    }

    #[test]
    fn test_extruded_segment_pins_colliding_ends() {
        let cfg = NaviewConfig::default();
        let mut ctx = unpaired_ctx(&cfg, 8);
        ctx.place(1, 0.0, 0.0);
        ctx.place(6, 1.0, 0.0);
        // The unit hexagon arc over this chord leaves base 1 heading to 240
        // degrees, more than half a turn past the flanking direction 4.5 rad.
        let (astart, aend) = (4.5, 5.6);
        ctx.construct_extruded_segment(astart, aend, 1, 6).unwrap();

        let aave = (astart + aend) / 2.0;
        let a = aave.min(astart + 0.5);
        assert_eq!(a, astart + 0.5);
        assert!((ctx.bases[2].x - a.cos()).abs() < 1e-12);
        assert!((ctx.bases[2].y - a.sin()).abs() < 1e-12);
        let a = aave.max(aend - 0.5);
        assert_eq!(a, aend - 0.5);
        assert!((ctx.bases[5].x - (1.0 + a.cos())).abs() < 1e-12);
        assert!((ctx.bases[5].y - a.sin()).abs() < 1e-12);
        for i in 2..6 {
            assert!(ctx.bases[i].is_placed());
            assert!(ctx.bases[i].x.is_finite() && ctx.bases[i].y.is_finite());
        }
    }

    #[test]
    fn test_extruded_segment_keeps_arc_without_collision() {
        let cfg = NaviewConfig::default();
        let mut ctx = unpaired_ctx(&cfg, 8);
        ctx.place(1, 0.0, 0.0);
        ctx.place(6, 1.0, 0.0);
        ctx.construct_extruded_segment(4.0, 5.5, 1, 6).unwrap();
        // first arc step runs from the origin to (-0.5, -sqrt(3)/2)
        assert!((ctx.bases[2].x + 0.5).abs() < 1e-3);
        assert!((ctx.bases[2].y + 3f64.sqrt() / 2.0).abs() < 1e-3);
        for i in 1..6 {
            let d = (ctx.bases[i + 1].x - ctx.bases[i].x).hypot(ctx.bases[i + 1].y - ctx.bases[i].y);
            assert!((d - 1.0).abs() < 1e-3, "side {i}: {d}");
        }
    }
}
