use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2, TAU};

use crate::model::LayoutContext;

/// Fit the loop radius by least squares over the gaps between connections.
///
/// A gap whose bases would end up closer than `lencut` is marked extruded and
/// the fit is repeated; every pass extrudes one more gap, so this runs at most
/// once per connection. A radloop radius replaces the fitted value but the
/// extrusion marks still come from the fit. Returns the placement radius.
pub(crate) fn determine_radius(ctx: &mut LayoutContext, lp: usize) -> f64 {
    let lencut = ctx.config.lencut;
    let nconn = ctx.loops[lp].nconnection();

    let fitted = loop {
        let mut mindit = 1.0e10;
        let mut imindit = None;
        let mut sumn = 0.0;
        let mut sumd = 0.0;
        for i in 0..nconn {
            let cp = ctx.conn(lp, i);
            let cpnext = ctx.conn(lp, (i + 1) % nconn);
            let steps = ctx.span(cp.end, cpnext.start);
            let mut dt = cpnext.angle - cp.angle;
            if dt <= 0.0 {
                dt += TAU;
            }
            let ci = if !cp.extruded {
                steps as f64
            } else if dt <= FRAC_PI_2 {
                2.0
            } else {
                1.5
            };
            sumn += dt * (1.0 / ci + 1.0);
            sumd += dt * dt / ci;
            let dit = dt / ci;
            if dit < mindit && !cp.extruded && ci > 1.0 {
                mindit = dit;
                imindit = Some(i);
            }
        }
        let radius = (sumn / sumd).max(FRAC_1_SQRT_2);
        match imindit {
            Some(i) if mindit * radius < lencut => {
                ctx.conn_mut(lp, i).extruded = true;
                log::debug!(
                    "loop {}: extruding segment after connection {}",
                    ctx.loops[lp].number,
                    i
                );
            }
            _ => break radius,
        }
    };

    let lp = &mut ctx.loops[lp];
    lp.radius = lp
        .fixed_radius
        .unwrap_or(fitted / ctx.config.radius_reduction_factor);
    lp.radius
}
