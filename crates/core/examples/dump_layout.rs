fn main() {
    let structure = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "((..((...))..((...))..))".to_string());
    let pt = naview_core::parse(&structure).unwrap();
    let layout = naview_core::Naview::default().layout(&pt).unwrap();

    println!("=== BASES ===");
    for (i, p) in layout.coordinates.iter().enumerate() {
        let mate = pt.pairs()[i].map_or("-".to_string(), |j| j.to_string());
        println!("base[{}]: x={:.4} y={:.4} mate={}", i, p.x, p.y, mate);
    }
    println!("\n=== LOOPS (root {:?}) ===", layout.root);
    for lp in &layout.loops {
        println!(
            "loop[{}]: connections={} depth={} radius={:.4} broken={} centroid=({:.4}, {:.4})",
            lp.number, lp.connections, lp.depth, lp.radius, lp.broken, lp.x, lp.y
        );
    }
    if !layout.crossed_loops.is_empty() {
        println!("\ncrossed loops: {:?}", layout.crossed_loops);
    }
}
