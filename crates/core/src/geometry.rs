use std::f64::consts::{PI, TAU};

use crate::error::{algorithm_error, NaviewError, Result};
use crate::model::LayoutContext;
use crate::radius::determine_radius;

/// Radial direction and polar angle of every connection of `lp`, taken from
/// where its closing pair sits on a unit circle of `nbase + 1` evenly spaced
/// positions.
pub(crate) fn set_connection_geometry(ctx: &mut LayoutContext, lp: usize) {
    let angleinc = TAU / (ctx.nbase + 1) as f64;
    for ic in 0..ctx.loops[lp].nconnection() {
        let cp = ctx.conn_mut(lp, ic);
        let (sa, ea) = (angleinc * cp.start as f64, angleinc * cp.end as f64);
        let (xs, ys) = (-sa.sin(), sa.cos());
        let (xe, ye) = (-ea.sin(), ea.cos());
        let xn = ye - ys;
        let yn = xs - xe;
        let r = xn.hypot(yn);
        cp.xrad = xn / r;
        cp.yrad = yn / r;
        cp.angle = yn.atan2(xn);
        if cp.angle < 0.0 {
            cp.angle += TAU;
        }
    }
}

/// Polar angle in `[0, 2π)` and distance of base `i` around `(xc, yc)`.
fn polar(ctx: &LayoutContext, i: usize, xc: f64, yc: f64) -> (f64, f64) {
    let dx = ctx.bases[i].x - xc;
    let dy = ctx.bases[i].y - yc;
    let mut a = dy.atan2(dx);
    if a < 0.0 {
        a += TAU;
    }
    (a, dx.hypot(dy))
}

/// Two neighbouring connections must be placed as one rigid block when the
/// gap between them is extruded or holds no base at all.
fn connected_connection(ctx: &LayoutContext, lp: usize, ic: usize, jc: usize) -> bool {
    let cp = ctx.conn(lp, ic);
    cp.extruded || cp.end + 1 == ctx.conn(lp, jc).start
}

/// The connection a block is built outwards from: the anchor if the block
/// holds it, otherwise the one halfway from `icstart` to `icend`.
fn find_ic_middle(
    nconn: usize,
    icstart: usize,
    icend: usize,
    icroot: Option<usize>,
) -> Result<usize> {
    let mut count = 0;
    let mut ret = None;
    let mut ic = icstart;
    loop {
        if count > nconn * 2 {
            return algorithm_error("infinite loop detected in find_ic_middle");
        }
        count += 1;
        if icroot == Some(ic) {
            ret = Some(ic);
        }
        let done = ic == icend;
        ic = (ic + 1) % nconn;
        if done {
            break;
        }
    }
    if let Some(ic) = ret {
        return Ok(ic);
    }
    let mut ic = icstart;
    for _ in 1..(count + 1) / 2 {
        ic = (ic + 1) % nconn;
    }
    Ok(ic)
}

impl LayoutContext<'_> {
    /// Lay out every loop, starting from the central loop at the origin.
    ///
    /// Pre-order over the loop tree on an explicit stack: before a child loop
    /// is placed, the helix leading to it is drawn from the connection bases
    /// its parent just fixed.
    pub(crate) fn traverse_loops(&mut self, root: usize) -> Result<()> {
        let mut stack: Vec<(usize, Option<usize>)> = vec![(root, None)];
        while let Some((lp, anchor)) = stack.pop() {
            if let Some(anchor) = anchor {
                self.generate_region(anchor)?;
            }
            let icroot = self.place_loop(lp, anchor)?;
            let conns = &self.loops[lp].connections;
            for (ic, &id) in conns.iter().enumerate().rev() {
                if Some(ic) != icroot {
                    stack.push((self.connections[id].loop_id, Some(id)));
                }
            }
        }
        Ok(())
    }

    /// Draw the helix behind connection `id`, rung by rung along its radial direction.
    pub(crate) fn generate_region(&mut self, id: usize) -> Result<()> {
        let cp = &self.connections[id];
        let rp = self.regions[cp.region];
        let (start, end) = if cp.start == rp.start1 {
            (rp.start1, rp.end1)
        } else {
            (rp.start2, rp.end2)
        };
        if !self.bases[cp.start].is_placed() || !self.bases[cp.end].is_placed() {
            return algorithm_error(format!(
                "bad region passed to generate_region: bases {} and {} have no coordinates",
                cp.start, cp.end
            ));
        }
        let (sx, sy) = (self.bases[cp.start].x, self.bases[cp.start].y);
        let (ex, ey) = (self.bases[cp.end].x, self.bases[cp.end].y);
        let (xrad, yrad) = (cp.xrad, cp.yrad);
        let step = self.config.helix_factor;
        for (l, i) in (start + 1..=end).enumerate() {
            let d = (l + 1) as f64 * step;
            self.place(i, sx + d * xrad, sy + d * yrad);
            let mate = self.bases[i].mate;
            self.place(mate, ex + d * xrad, ey + d * yrad);
        }
        Ok(())
    }

    /// Place the connections and backbone of one loop. Returns the index of
    /// the anchor connection within the loop, if any.
    fn place_loop(&mut self, lp: usize, anchor: Option<usize>) -> Result<Option<usize>> {
        let nconn = self.loops[lp].nconnection();
        if nconn == 0 {
            return algorithm_error(format!(
                "loop {} has no connections",
                self.loops[lp].number
            ));
        }
        set_connection_geometry(self, lp);

        let icroot = match anchor {
            None => None,
            Some(a) => {
                let region = self.connections[a].region;
                let found = (0..nconn).find(|&ic| self.conn(lp, ic).region == region);
                if found.is_none() {
                    return algorithm_error(format!(
                        "loop {} has no connection back to its anchor",
                        self.loops[lp].number
                    ));
                }
                found
            }
        };

        // Every retry extrudes one more gap, so the count is bounded by nconn.
        let mut attempts = 0;
        while !self.place_connections(lp, icroot)? {
            attempts += 1;
            if attempts > nconn {
                return algorithm_error(format!(
                    "loop {} kept crossing after every gap was extruded",
                    self.loops[lp].number
                ));
            }
            log::debug!(
                "loop {}: retrying placement with another extruded gap",
                self.loops[lp].number
            );
        }

        self.set_centroid(lp);
        Ok(icroot)
    }

    /// One placement attempt. Returns `false` when a gap turned out crossed
    /// and was newly marked extruded, meaning the loop must be redone.
    fn place_connections(&mut self, lp: usize, icroot: Option<usize>) -> Result<bool> {
        let nconn = self.loops[lp].nconnection();
        let radius = determine_radius(self, lp);
        log::debug!("loop {}: radius {:.4}", self.loops[lp].number, radius);

        let (mut xc, mut yc) = match icroot {
            None => (0.0, 0.0),
            Some(ic) => {
                let acp = self.conn(lp, ic);
                let (s, e) = (&self.bases[acp.start], &self.bases[acp.end]);
                if !s.is_placed() || !e.is_placed() {
                    return algorithm_error(format!(
                        "anchor of loop {} has no coordinates",
                        self.loops[lp].number
                    ));
                }
                let xo = (s.x + e.x) / 2.0;
                let yo = (s.y + e.y) / 2.0;
                (xo - radius * acp.xrad, yo - radius * acp.yrad)
            }
        };

        // Connections that are too close in angle are built as rigid blocks.
        // Find where the first block begins.
        let mut icstart = icroot.unwrap_or(0);
        let mut count = 0;
        loop {
            let j = if icstart == 0 { nconn - 1 } else { icstart - 1 };
            if !connected_connection(self, lp, j, icstart) {
                break;
            }
            icstart = j;
            count += 1;
            if count > nconn {
                // Everything is connected: break at the widest angular gap.
                let mut maxang = -1.0;
                let mut imaxloop = 0;
                for ic in 0..nconn {
                    let mut ac = self.conn(lp, (ic + 1) % nconn).angle - self.conn(lp, ic).angle;
                    if ac < 0.0 {
                        ac += TAU;
                    }
                    if ac > maxang {
                        maxang = ac;
                        imaxloop = ic;
                    }
                }
                icstart = (imaxloop + 1) % nconn;
                self.conn_mut(lp, imaxloop).broken = true;
                break;
            }
        }

        let icstart1 = icstart;
        loop {
            let mut count = 0;
            let mut icend = icstart;
            let mut rooted = false;
            loop {
                if Some(icend) == icroot {
                    rooted = true;
                }
                let j = (icend + 1) % nconn;
                if !connected_connection(self, lp, icend, j) {
                    break;
                }
                count += 1;
                if count >= nconn {
                    break;
                }
                icend = j;
            }

            let icmiddle = find_ic_middle(nconn, icstart, icend, icroot)?;
            self.place_block(lp, icstart, icmiddle, icend, icroot, xc, yc, radius);

            let icnext = (icend + 1) % nconn;
            if icend != icstart && !(icstart == icstart1 && icnext == icstart1) {
                if let Some((sx, sy)) = self.block_offset(lp, icstart, icend, xc, yc, radius) {
                    if rooted {
                        xc -= sx;
                        yc -= sy;
                    } else {
                        let mut ic = icstart;
                        loop {
                            let (s, e) = {
                                let cp = self.conn(lp, ic);
                                (cp.start, cp.end)
                            };
                            for b in [s, e] {
                                self.bases[b].x += sx;
                                self.bases[b].y += sy;
                            }
                            if ic == icend {
                                break;
                            }
                            ic = (ic + 1) % nconn;
                        }
                    }
                }
            }

            icstart = icnext;
            if icstart == icstart1 {
                break;
            }
        }

        for ic in 0..nconn {
            let jc = (ic + 1) % nconn;
            let (end, cp_angle, extruded) = {
                let cp = self.conn(lp, ic);
                (cp.end, cp.angle, cp.extruded)
            };
            let (next_start, next_angle) = {
                let cpnext = self.conn(lp, jc);
                (cpnext.start, cpnext.angle)
            };

            let (ac, rc) = polar(self, end, xc, yc);
            let (mut acn, rcn) = polar(self, next_start, xc, yc);
            if acn < ac {
                acn += TAU;
            }
            let dan = acn - ac;
            let mut dcp = next_angle - cp_angle;
            if dcp <= 0.0 {
                dcp += TAU;
            }

            if (dan - dcp).abs() > PI {
                let number = self.loops[lp].number;
                if extruded {
                    log::warn!("loop {number} has crossed regions");
                    if self.config.strict_crossings {
                        return Err(NaviewError::CrossedRegions {
                            loop_number: number,
                        });
                    }
                    if self.crossed_loops.last() != Some(&number) {
                        self.crossed_loops.push(number);
                    }
                } else if next_start != end + 1 {
                    self.conn_mut(lp, ic).extruded = true;
                    return Ok(false);
                }
            }

            if extruded {
                self.construct_extruded_segment(cp_angle, next_angle, end, next_start)?;
            } else {
                let n = self.span(end, next_start);
                for j in 1..n {
                    let i = self.advance(end, j);
                    let t = j as f64 / n as f64;
                    let a = ac + t * dan;
                    let rr = rc + (rcn - rc) * t;
                    self.place(i, xc + rr * a.cos(), yc + rr * a.sin());
                }
            }
        }
        Ok(true)
    }

    /// Place the closing pairs of one block, starting on the circle at
    /// `icmiddle` and stepping outwards in both directions with unit spacing.
    #[allow(clippy::too_many_arguments)]
    fn place_block(
        &mut self,
        lp: usize,
        icstart: usize,
        icmiddle: usize,
        icend: usize,
        icroot: Option<usize>,
        xc: f64,
        yc: f64,
        radius: f64,
    ) {
        let nconn = self.loops[lp].nconnection();
        let mut icup = Some(icmiddle);
        let mut icdown = Some(icmiddle);
        let mut direction = 0i32;
        loop {
            let ic = match direction {
                d if d < 0 => icup,
                0 => Some(icmiddle),
                _ => icdown,
            };
            if let Some(ic) = ic.filter(|&ic| Some(ic) != icroot) {
                match direction {
                    0 => self.place_on_circle(lp, ic, xc, yc, radius),
                    d if d < 0 => self.place_before(lp, ic),
                    _ => self.place_after(lp, ic),
                }
            }

            if direction < 0 {
                icdown = match icdown {
                    Some(d) if d == icend => None,
                    Some(d) => Some((d + 1) % nconn),
                    None => None,
                };
                direction = 1;
            } else {
                icup = match icup {
                    Some(u) if u == icstart => None,
                    Some(u) => Some(if u == 0 { nconn - 1 } else { u - 1 }),
                    None => None,
                };
                direction = -1;
            }
            if icup.is_none() && icdown.is_none() {
                break;
            }
        }
    }

    fn place_on_circle(&mut self, lp: usize, ic: usize, xc: f64, yc: f64, radius: f64) {
        let cp = self.conn(lp, ic);
        let half = (0.5 / radius).asin();
        let (start, end, angle) = (cp.start, cp.end, cp.angle);
        let (astart, aend) = (angle - half, angle + half);
        self.place(start, xc + radius * astart.cos(), yc + radius * astart.sin());
        self.place(end, xc + radius * aend.cos(), yc + radius * aend.sin());
    }

    /// Unit (or extruded) step between two connections of a block, and the
    /// direction it runs along.
    fn block_step(&self, lp: usize, ic: usize, jc: usize) -> (f64, f64, f64) {
        let cp = self.conn(lp, ic);
        let cpnext = self.conn(lp, jc);
        let mut ac = (cp.angle + cpnext.angle) / 2.0;
        if cp.angle > cpnext.angle {
            ac -= PI;
        }
        let mut da = cpnext.angle - cp.angle;
        if da < 0.0 {
            da += TAU;
        }
        let rl = match (cp.extruded, da <= PI / 2.0) {
            (true, true) => 2.0,
            (true, false) => 1.5,
            (false, _) => 1.0,
        };
        (ac.cos(), ac.sin(), rl)
    }

    /// Place connection `ic` behind the already placed connection `ic + 1`.
    fn place_before(&mut self, lp: usize, ic: usize) {
        let nconn = self.loops[lp].nconnection();
        let jc = (ic + 1) % nconn;
        let (cnx, cny, rl) = self.block_step(lp, ic, jc);
        let (start, end, xrad, yrad) = {
            let cp = self.conn(lp, ic);
            (cp.start, cp.end, cp.xrad, cp.yrad)
        };
        let next_start = self.conn(lp, jc).start;
        let (nx, ny) = (self.bases[next_start].x, self.bases[next_start].y);
        let (ex, ey) = (nx + rl * cny, ny - rl * cnx);
        self.place(end, ex, ey);
        self.place(start, ex + yrad, ey - xrad);
    }

    /// Place connection `ic` after the already placed connection `ic - 1`.
    fn place_after(&mut self, lp: usize, ic: usize) {
        let nconn = self.loops[lp].nconnection();
        let jc = if ic == 0 { nconn - 1 } else { ic - 1 };
        let (cnx, cny, rl) = self.block_step(lp, jc, ic);
        let prev_end = self.conn(lp, jc).end;
        let (start, end, xrad, yrad) = {
            let cp = self.conn(lp, ic);
            (cp.start, cp.end, cp.xrad, cp.yrad)
        };
        let (px, py) = (self.bases[prev_end].x, self.bases[prev_end].y);
        let (sx, sy) = (px - rl * cny, py + rl * cnx);
        self.place(start, sx, sy);
        self.place(end, sx - yrad, sy + xrad);
    }

    /// Offset that moves the chord of a block so its midpoint sits `radius`
    /// from the loop center. `None` when the center lies on the chord line.
    fn block_offset(
        &self,
        lp: usize,
        icstart: usize,
        icend: usize,
        xc: f64,
        yc: f64,
        radius: f64,
    ) -> Option<(f64, f64)> {
        let first = self.conn(lp, icstart).start;
        let last = self.conn(lp, icend).end;
        let (fx, fy) = (self.bases[first].x, self.bases[first].y);
        let dx = self.bases[last].x - fx;
        let dy = self.bases[last].y - fy;
        let midx = fx + dx / 2.0;
        let midy = fy + dy / 2.0;
        let chord = dx.hypot(dy);
        if chord < 1e-12 {
            return None;
        }
        let (mx, my) = (dx / chord, dy / chord);
        let (vx, vy) = ((xc - midx) / chord, (yc - midy) / chord);
        let dotmv = vx * mx + vy * my;
        let mut nrx = dotmv * mx - vx;
        let mut nry = dotmv * my - vy;
        let rr = nrx.hypot(nry);
        if rr < 1e-12 {
            return None;
        }
        nrx /= rr;
        nry /= rr;

        // which side of the chord the center belongs on
        let (ac, _) = polar(self, first, xc, yc);
        let (mut acn, _) = polar(self, last, xc, yc);
        if acn < ac {
            acn += TAU;
        }
        let sign = if acn - ac > PI { -1.0 } else { 1.0 };
        let nmidx = xc + sign * radius * nrx;
        let nmidy = yc + sign * radius * nry;
        Some((nmidx - midx, nmidy - midy))
    }

    /// Centroid of every base on the loop boundary.
    fn set_centroid(&mut self, lp: usize) {
        let nconn = self.loops[lp].nconnection();
        let (mut sumx, mut sumy, mut count) = (0.0, 0.0, 0usize);
        for ic in 0..nconn {
            let cp = self.conn(lp, ic);
            let next_start = self.conn(lp, (ic + 1) % nconn).start;
            let mut bases = vec![cp.start, cp.end];
            let gap = self.span(cp.end, next_start);
            bases.extend((1..gap).map(|j| self.advance(cp.end, j)));
            for b in bases {
                sumx += self.bases[b].x;
                sumy += self.bases[b].y;
                count += 1;
            }
        }
        let lp = &mut self.loops[lp];
        lp.x = sumx / count as f64;
        lp.y = sumy / count as f64;
    }
}
