use crate::model::{Base, Region};

/// Split the paired bases into maximal helices.
///
/// Scans 5' to 3'; each unmarked paired base opens a region that is extended
/// while the next base pairs with the previous partner's 5' neighbour.
/// Every paired base ends up in exactly one region.
pub(crate) fn find_regions(bases: &mut [Base]) -> Vec<Region> {
    let nbase = bases.len().saturating_sub(1);
    let mut mark = vec![false; nbase + 1];
    let mut regions: Vec<Region> = Vec::new();

    let mut i = 0;
    while i <= nbase {
        let mate = bases[i].mate;
        if mate == 0 || mark[i] {
            i += 1;
            continue;
        }
        let id = regions.len();
        mark[i] = true;
        mark[mate] = true;
        bases[i].region = Some(id);
        bases[mate].region = Some(id);

        let (mut a, mut b) = (i + 1, mate.saturating_sub(1));
        while a < b && bases[a].mate == b {
            mark[a] = true;
            mark[b] = true;
            bases[a].region = Some(id);
            bases[b].region = Some(id);
            a += 1;
            b -= 1;
        }
        regions.push(Region {
            start1: i,
            end1: a - 1,
            start2: b + 1,
            end2: mate,
        });
        i = a;
    }

    log::debug!("found {} regions over {} bases", regions.len(), nbase);
    regions
}
