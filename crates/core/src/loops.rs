use crate::error::{algorithm_error, Result};
use crate::model::{Connection, LayoutContext, Loop};

/// A suspended walk around one loop's backbone.
struct Frame {
    loop_id: usize,
    ibase: usize,
    i: usize,
    steps: usize,
    /// Region whose interior is being built by the frame above this one.
    pending: Option<(usize, bool)>,
}

impl Frame {
    fn new(loop_id: usize, ibase: usize) -> Self {
        Frame {
            loop_id,
            ibase,
            i: ibase,
            steps: 0,
            pending: None,
        }
    }
}

fn new_loop(ctx: &mut LayoutContext) -> usize {
    let number = ctx.loops.len() + 1;
    let fixed = ctx.config.radloop_for(number);
    ctx.loops.push(Loop::new(number, fixed));
    ctx.loops.len() - 1
}

/// Create the two connections that let `parent` and `child` see each other
/// across `region`. `from_start1` tells which strand the parent walk entered.
fn link(ctx: &mut LayoutContext, parent: usize, child: usize, region: usize, from_start1: bool) {
    let rp = ctx.regions[region];
    let (outer, inner) = if from_start1 {
        ((rp.start1, rp.end2), (rp.start2, rp.end1))
    } else {
        ((rp.start2, rp.end1), (rp.start1, rp.end2))
    };

    let id = ctx.connections.len();
    ctx.connections
        .push(Connection::new(child, region, outer.0, outer.1));
    ctx.loops[parent].connections.push(id);

    ctx.connections
        .push(Connection::new(parent, region, inner.0, inner.1));
    ctx.loops[child].connections.push(id + 1);
}

/// Build the loop tree, starting with the loop that holds the sentinel base.
///
/// Each loop walks its backbone; a region that has not been extracted yet is
/// marked on all four ends and its interior becomes a child loop, built to
/// completion before the parent walk resumes. Runs on an explicit stack so
/// deep nesting does not exhaust the call stack.
pub(crate) fn construct_loops(ctx: &mut LayoutContext) -> Result<()> {
    let max_steps = 2 * (ctx.nbase + 1);
    let root = new_loop(ctx);
    let mut stack: Vec<Frame> = vec![Frame::new(root, 0)];
    let mut returned: Option<usize> = None;

    while let Some(top) = stack.len().checked_sub(1) {
        if let Some((region, from_start1)) = stack[top].pending.take() {
            let Some(child) = returned.take() else {
                return algorithm_error("child loop missing while linking region");
            };
            link(ctx, stack[top].loop_id, child, region, from_start1);
            let i = stack[top].i;
            stack[top].i = ctx.advance(ctx.bases[i].mate, 1);
            if stack[top].i == stack[top].ibase {
                returned = stack.pop().map(|f| f.loop_id);
            }
            continue;
        }

        let frame = &mut stack[top];
        frame.steps += 1;
        if frame.steps > max_steps {
            return algorithm_error(format!(
                "backbone walk of loop {} did not return to base {}",
                ctx.loops[frame.loop_id].number, frame.ibase
            ));
        }

        let i = frame.i;
        let mate = ctx.bases[i].mate;
        let mut next = i;
        if mate != 0 {
            let Some(region) = ctx.bases[i].region else {
                return algorithm_error(format!("paired base {i} has no region"));
            };
            let rp = ctx.regions[region];
            if !ctx.bases[rp.start1].extracted {
                let (from_start1, child_start) = if i == rp.start1 {
                    (true, ctx.advance(rp.end1, 1))
                } else if i == rp.start2 {
                    (false, ctx.advance(rp.end2, 1))
                } else {
                    return algorithm_error(format!(
                        "error detected in construct_loop: i = {i} not found in region table"
                    ));
                };
                for b in [rp.start1, rp.end1, rp.start2, rp.end2] {
                    ctx.bases[b].extracted = true;
                }
                frame.pending = Some((region, from_start1));
                let child = new_loop(ctx);
                stack.push(Frame::new(child, child_start));
                continue;
            }
            next = mate;
        }

        frame.i = ctx.advance(next, 1);
        if frame.i == frame.ibase {
            returned = stack.pop().map(|f| f.loop_id);
        }
    }

    log::debug!(
        "loop tree: {} loops, {} connections",
        ctx.loops.len(),
        ctx.connections.len()
    );
    Ok(())
}

/// Distance from `start` to the nearest leaf loop (one with at most one connection).
///
/// Depth-first over the tree with `mark` guarding against revisiting loops
/// already on the current path.
pub(crate) fn depth(ctx: &mut LayoutContext, start: usize) -> i32 {
    if ctx.loops[start].nconnection() <= 1 {
        return 0;
    }
    // (loop, next connection index, best child depth so far)
    let mut stack: Vec<(usize, usize, Option<i32>)> = vec![(start, 0, None)];
    ctx.loops[start].mark = true;
    let mut result = 0;

    while let Some(top) = stack.len().checked_sub(1) {
        let (lp, ic, _) = stack[top];
        if ic < ctx.loops[lp].nconnection() {
            stack[top].1 += 1;
            let child = ctx.conn(lp, ic).loop_id;
            let d = if ctx.loops[child].nconnection() <= 1 {
                0
            } else if ctx.loops[child].mark {
                -1
            } else {
                ctx.loops[child].mark = true;
                stack.push((child, 0, None));
                continue;
            };
            if d >= 0 {
                let best = &mut stack[top].2;
                *best = Some(best.map_or(d, |b| b.min(d)));
            }
            continue;
        }

        ctx.loops[lp].mark = false;
        let d = stack[top].2.unwrap_or(0) + 1;
        stack.pop();
        match stack.last_mut() {
            Some(parent) => parent.2 = Some(parent.2.map_or(d, |b| b.min(d))),
            None => result = d,
        }
    }
    result
}

/// Pick the loop the layout is anchored on: most connections, ties broken
/// by the larger depth, earlier loops winning exact ties.
pub(crate) fn find_central_loop(ctx: &mut LayoutContext) -> Result<usize> {
    for lp in 0..ctx.loops.len() {
        for l in ctx.loops.iter_mut() {
            l.mark = false;
        }
        ctx.loops[lp].depth = depth(ctx, lp);
    }

    let mut maxconn = 0;
    let mut maxdepth = -1;
    let mut root = None;
    for (id, lp) in ctx.loops.iter().enumerate() {
        let n = lp.nconnection();
        if n > maxconn {
            maxconn = n;
            maxdepth = lp.depth;
            root = Some(id);
        } else if n == maxconn && lp.depth > maxdepth {
            maxdepth = lp.depth;
            root = Some(id);
        }
    }

    let Some(root) = root else {
        return algorithm_error("no loop has any connection");
    };
    log::debug!(
        "central loop {} ({} connections, depth {})",
        ctx.loops[root].number,
        maxconn,
        maxdepth
    );
    ctx.root = Some(root);
    Ok(root)
}
